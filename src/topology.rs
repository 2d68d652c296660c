// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Topology model for plugs of unit, subunits, and function blocks.
//!
//! The model is built by a walk of descriptor queries at the time the unit is attached; plug
//! counts are enumerated per type and direction, then each plug is queried for its type, name,
//! channels, clusters, and connection information. The walk is tolerant against units which
//! decline queries for some of their declared plugs; such plugs are simply absent from the
//! model. The model is immutable after the walk and refreshed only by a full re-walk.

use super::{descriptor::*, *};

/// Data of plug discovered from the unit.
#[derive(Default, Debug, Clone)]
pub struct PlugSpec {
    /// The semantic type of plug.
    pub plug_type: PlugType,
    /// The name of plug.
    pub name: String,
    /// The name of each channel, in order of position in data frame.
    pub channels: Vec<String>,
    /// The clusters of channels. Only available for plugs of isochronous stream.
    pub clusters: Vec<PlugClusterSpec>,
    /// The address of plug which feeds signal to the plug.
    pub input: Option<IoPlugAddr>,
    /// The addresses of plugs to which the plug feeds signal.
    pub outputs: Vec<IoPlugAddr>,
}

/// Cluster of channels in the plug.
#[derive(Default, Debug, Clone)]
pub struct PlugClusterSpec {
    /// The name of cluster.
    pub name: String,
    /// The type of port for the cluster.
    pub port_type: PortType,
    /// The ordered positions of member channels in data frame.
    pub positions: Vec<u8>,
}

/// Plug of unit.
#[derive(Debug, Clone)]
pub struct UnitPlug {
    /// The type of address to the plug.
    pub plug_type: PlugAddrUnitType,
    /// The direction of plug.
    pub direction: PlugDirection,
    /// The numeric identifier of plug.
    pub plug_id: u8,
    /// The discovered data of plug.
    pub spec: PlugSpec,
}

/// Plug of subunit.
#[derive(Debug, Clone)]
pub struct SubunitPlug {
    /// The address of subunit.
    pub subunit: AvcAddrSubunit,
    /// The direction of plug.
    pub direction: PlugDirection,
    /// The numeric identifier of plug.
    pub plug_id: u8,
    /// The discovered data of plug.
    pub spec: PlugSpec,
}

/// Plug of function block in subunit.
#[derive(Debug, Clone)]
pub struct FunctionBlockPlug {
    /// The address of subunit including the function block.
    pub subunit: AvcAddrSubunit,
    /// The type of function block.
    pub func_blk_type: u8,
    /// The numeric identifier of function block.
    pub func_blk_id: u8,
    /// The purpose of function block.
    pub func_blk_purpose: u8,
    /// The direction of plug.
    pub direction: PlugDirection,
    /// The numeric identifier of plug.
    pub plug_id: u8,
    /// The discovered data of plug.
    pub spec: PlugSpec,
}

/// The whole signal topology of the unit.
#[derive(Default, Debug, Clone)]
pub struct UnitTopology {
    /// Plugs of unit for isochronous, external, and asynchronous inputs/outputs.
    pub unit_plugs: Vec<UnitPlug>,
    /// Plugs of subunits.
    pub subunit_plugs: Vec<SubunitPlug>,
    /// Plugs of function blocks in subunits.
    pub func_blk_plugs: Vec<FunctionBlockPlug>,
}

impl UnitTopology {
    /// Build the whole topology model by the walk of descriptor queries.
    pub fn discover<A: AvcTransaction<Error>>(avc: &A, timeout_ms: u32) -> Result<Self, Error> {
        let unit_plugs = Self::discover_unit_plugs(avc, timeout_ms)?;
        let subunit_plugs = Self::discover_subunit_plugs(avc, timeout_ms)?;
        let func_blk_plugs = Self::discover_function_block_plugs(avc, &subunit_plugs, timeout_ms)?;
        Ok(UnitTopology {
            unit_plugs,
            subunit_plugs,
            func_blk_plugs,
        })
    }

    /// Enumerate declared plug counts of unit per type and direction, then query each plug.
    /// The plug which declines its descriptor query is absent from the result.
    pub fn discover_unit_plugs<A: AvcTransaction<Error>>(
        avc: &A,
        timeout_ms: u32,
    ) -> Result<Vec<UnitPlug>, Error> {
        let mut op = PlugInfo::new_for_unit_isoc_ext_plugs();
        avc.status(&AvcAddr::Unit, &mut op, timeout_ms)
            .map_err(from_avc_err)?;

        let (isoc_inputs, isoc_outputs, ext_inputs, ext_outputs) =
            if let PlugInfo::Unit(PlugInfoUnitData::IsocExt(d)) = &op {
                (
                    d.isoc_input_plugs,
                    d.isoc_output_plugs,
                    d.external_input_plugs,
                    d.external_output_plugs,
                )
            } else {
                unreachable!();
            };

        // Not every unit implements the subfunction for asynchronous plugs.
        let mut op = PlugInfo::new_for_unit_async_plugs();
        let (async_inputs, async_outputs) =
            match avc.status(&AvcAddr::Unit, &mut op, timeout_ms) {
                Ok(_) => {
                    if let PlugInfo::Unit(PlugInfoUnitData::Async(d)) = &op {
                        (d.async_input_plugs, d.async_output_plugs)
                    } else {
                        unreachable!();
                    }
                }
                Err(_) => (0, 0),
            };

        let mut plugs = Vec::new();
        [
            (PlugAddrUnitType::Isoc, PlugDirection::Input, isoc_inputs),
            (PlugAddrUnitType::Isoc, PlugDirection::Output, isoc_outputs),
            (PlugAddrUnitType::Ext, PlugDirection::Input, ext_inputs),
            (PlugAddrUnitType::Ext, PlugDirection::Output, ext_outputs),
            (PlugAddrUnitType::Async, PlugDirection::Input, async_inputs),
            (PlugAddrUnitType::Async, PlugDirection::Output, async_outputs),
        ]
        .iter()
        .for_each(|&(plug_type, direction, count)| {
            (0..count).for_each(|plug_id| {
                let addr = PlugAddr::new_for_unit(direction, plug_type, plug_id);
                if let Ok(spec) = read_plug_spec(avc, &addr, false, timeout_ms) {
                    plugs.push(UnitPlug {
                        plug_type,
                        direction,
                        plug_id,
                        spec,
                    });
                }
            });
        });

        Ok(plugs)
    }

    /// Enumerate subunits by paged queries, then query plugs of each subunit. The page which
    /// fails to be queried terminates the enumeration.
    pub fn discover_subunit_plugs<A: AvcTransaction<Error>>(
        avc: &A,
        timeout_ms: u32,
    ) -> Result<Vec<SubunitPlug>, Error> {
        let mut subunits = Vec::new();
        for page in 0..=SubunitInfo::MAXIMUM_PAGE {
            let mut op = SubunitInfo::new(page, 0x07);
            if avc.status(&AvcAddr::Unit, &mut op, timeout_ms).is_err() {
                break;
            }
            if op.entries.is_empty() {
                break;
            }
            op.entries.iter().for_each(|entry| {
                (0..=entry.maximum_id).for_each(|subunit_id| {
                    let subunit = AvcAddrSubunit::new(entry.subunit_type, subunit_id);
                    if !subunits.iter().any(|s| *s == subunit) {
                        subunits.push(subunit);
                    }
                });
            });
        }

        let mut plugs = Vec::new();
        subunits.iter().for_each(|&subunit| {
            let mut op = PlugInfo::new_for_subunit_plugs();
            let addr = AvcAddr::Subunit(subunit);
            let (input_count, output_count) = match avc.status(&addr, &mut op, timeout_ms) {
                Ok(_) => {
                    if let PlugInfo::Subunit(d) = &op {
                        (d.dst_plugs, d.src_plugs)
                    } else {
                        unreachable!();
                    }
                }
                Err(_) => return,
            };

            [
                (PlugDirection::Input, input_count),
                (PlugDirection::Output, output_count),
            ]
            .iter()
            .for_each(|&(direction, count)| {
                (0..count).for_each(|plug_id| {
                    let addr = PlugAddr::new_for_subunit(direction, plug_id);
                    if let Ok(spec) = read_plug_spec(avc, &addr, true, timeout_ms) {
                        plugs.push(SubunitPlug {
                            subunit,
                            direction,
                            plug_id,
                            spec,
                        });
                    }
                });
            });
        });

        Ok(plugs)
    }

    /// Enumerate function blocks of each discovered subunit by paged queries until the empty
    /// page, then query plugs of each function block.
    pub fn discover_function_block_plugs<A: AvcTransaction<Error>>(
        avc: &A,
        subunit_plugs: &[SubunitPlug],
        timeout_ms: u32,
    ) -> Result<Vec<FunctionBlockPlug>, Error> {
        let mut subunits = Vec::new();
        subunit_plugs.iter().for_each(|plug| {
            if !subunits.iter().any(|s| *s == plug.subunit) {
                subunits.push(plug.subunit);
            }
        });

        let mut plugs = Vec::new();
        subunits.iter().for_each(|&subunit| {
            let addr = AvcAddr::Subunit(subunit);

            let mut entries = Vec::new();
            for page in 0..ExtendedSubunitInfo::MAXIMUM_PAGE_COUNT {
                let mut op = ExtendedSubunitInfo::new(page as u8, 0xff);
                if avc.status(&addr, &mut op, timeout_ms).is_err() {
                    break;
                }
                if op.entries.is_empty() {
                    break;
                }
                entries.extend_from_slice(&op.entries);
            }

            entries.iter().for_each(|entry| {
                [
                    (PlugDirection::Input, entry.input_plugs),
                    (PlugDirection::Output, entry.output_plugs),
                ]
                .iter()
                .for_each(|&(direction, count)| {
                    (0..count).for_each(|plug_id| {
                        let addr = PlugAddr::new_for_func_blk(
                            direction,
                            entry.func_blk_type,
                            entry.func_blk_id,
                            plug_id,
                        );
                        if let Ok(spec) = read_plug_spec(avc, &addr, true, timeout_ms) {
                            plugs.push(FunctionBlockPlug {
                                subunit,
                                func_blk_type: entry.func_blk_type,
                                func_blk_id: entry.func_blk_id,
                                func_blk_purpose: entry.func_blk_purpose,
                                direction,
                                plug_id,
                                spec,
                            });
                        }
                    });
                });
            });
        });

        Ok(plugs)
    }
}

fn read_plug_info<A: AvcTransaction<Error>>(
    avc: &A,
    addr: &PlugAddr,
    info: PlugInfoData,
    timeout_ms: u32,
) -> Result<PlugInfoData, Error> {
    let mut op = ExtendedPlugInfo::new(addr, info);
    avc.status(&AvcAddr::Unit, &mut op, timeout_ms)
        .map_err(from_avc_err)?;
    Ok(op.info)
}

/// Query the data of single plug. When addressing plugs of subunit and function block, the
/// connection information in counter direction is queried with tolerance; each of the input
/// and the output query is allowed to fail independently and leaves the record empty.
fn read_plug_spec<A: AvcTransaction<Error>>(
    avc: &A,
    addr: &PlugAddr,
    tolerate_conn_failure: bool,
    timeout_ms: u32,
) -> Result<PlugSpec, Error> {
    let mut spec = PlugSpec::default();

    let info = read_plug_info(avc, addr, PlugInfoData::Type(Default::default()), timeout_ms)?;
    if let PlugInfoData::Type(plug_type) = info {
        spec.plug_type = plug_type;
    } else {
        Err(Error::new(FileError::Io, "Unexpected data for type of plug"))?;
    }

    let info = read_plug_info(avc, addr, PlugInfoData::Name(Default::default()), timeout_ms)?;
    if let PlugInfoData::Name(name) = info {
        spec.name = name;
    } else {
        Err(Error::new(FileError::Io, "Unexpected data for name of plug"))?;
    }

    let info = read_plug_info(avc, addr, PlugInfoData::ChCount(0xff), timeout_ms)?;
    let ch_count = if let PlugInfoData::ChCount(count) = info {
        count
    } else {
        Err(Error::new(
            FileError::Io,
            "Unexpected data for channel count of plug",
        ))?
    };

    // The channel number in the query is 1-based.
    for ch in 0..ch_count {
        let data = ChannelName {
            ch: ch + 1,
            name: Default::default(),
        };
        let info = read_plug_info(avc, addr, PlugInfoData::ChName(data), timeout_ms)?;
        if let PlugInfoData::ChName(d) = info {
            spec.channels.push(d.name);
        } else {
            Err(Error::new(
                FileError::Io,
                "Unexpected data for channel name of plug",
            ))?;
        }
    }

    // Clusters are available for plugs of isochronous stream only.
    if spec.plug_type == PlugType::IsoStream {
        let info = read_plug_info(
            avc,
            addr,
            PlugInfoData::ChPositions(Default::default()),
            timeout_ms,
        )?;
        let clusters = if let PlugInfoData::ChPositions(clusters) = info {
            clusters
        } else {
            Err(Error::new(
                FileError::Io,
                "Unexpected data for channel positions of plug",
            ))?
        };

        for (i, cluster) in clusters.iter().enumerate() {
            let data = ClusterInfo {
                index: (i + 1) as u8,
                ..Default::default()
            };
            let info = read_plug_info(avc, addr, PlugInfoData::ClusterInfo(data), timeout_ms)?;
            if let PlugInfoData::ClusterInfo(d) = info {
                spec.clusters.push(PlugClusterSpec {
                    name: d.name,
                    port_type: d.port_type,
                    positions: cluster.entries.iter().map(|entry| entry.pos).collect(),
                });
            } else {
                Err(Error::new(
                    FileError::Io,
                    "Unexpected data for cluster of plug",
                ))?;
            }
        }
    }

    if tolerate_conn_failure {
        if let Ok(PlugInfoData::Input(data)) =
            read_plug_info(avc, addr, PlugInfoData::Input(Default::default()), timeout_ms)
        {
            spec.input = Some(data);
        }
        if let Ok(PlugInfoData::Outputs(data)) = read_plug_info(
            avc,
            addr,
            PlugInfoData::Outputs(Default::default()),
            timeout_ms,
        ) {
            spec.outputs = data;
        }
    } else {
        match addr.direction {
            PlugDirection::Output => {
                let info = read_plug_info(
                    avc,
                    addr,
                    PlugInfoData::Input(Default::default()),
                    timeout_ms,
                )?;
                if let PlugInfoData::Input(data) = info {
                    spec.input = Some(data);
                }
            }
            PlugDirection::Input => {
                let info = read_plug_info(
                    avc,
                    addr,
                    PlugInfoData::Outputs(Default::default()),
                    timeout_ms,
                )?;
                if let PlugInfoData::Outputs(data) = info {
                    spec.outputs = data;
                }
            }
        }
    }

    Ok(spec)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct TestAvc {
        // Response frames drained in order of transaction.
        resp_frames: RefCell<Vec<Vec<u8>>>,
    }

    impl TestAvc {
        fn push(&self, frame: Vec<u8>) {
            self.resp_frames.borrow_mut().push(frame);
        }
    }

    impl AvcTransaction<Error> for TestAvc {
        fn transaction(&self, _: &[u8], _: u32) -> Result<Vec<u8>, Error> {
            let mut frames = self.resp_frames.borrow_mut();
            if frames.is_empty() {
                Err(Error::new(FileError::Io, "No more response frame"))
            } else {
                Ok(frames.remove(0))
            }
        }
    }

    fn status_resp(opcode: u8, operands: &[u8]) -> Vec<u8> {
        status_resp_to(0xff, opcode, operands)
    }

    fn status_resp_to(addr: u8, opcode: u8, operands: &[u8]) -> Vec<u8> {
        let mut frame = vec![0x0c, addr, opcode];
        frame.extend_from_slice(operands);
        frame
    }

    fn rejected_resp(opcode: u8) -> Vec<u8> {
        vec![0x0a, 0xff, opcode, 0xff, 0xff, 0xff, 0xff, 0xff]
    }

    fn plug_info_resp(addr: &PlugAddr, info: PlugInfoData) -> Vec<u8> {
        // The operands of response have the same layout as the fully populated command.
        let mut op = ExtendedPlugInfo::new(addr, info);
        let mut operands = Vec::new();
        AvcStatus::build_operands(&mut op, &AvcAddr::Unit, &mut operands).unwrap();
        status_resp(0x02, &operands)
    }

    fn push_sync_plug_resps(avc: &TestAvc, addr: &PlugAddr) {
        avc.push(plug_info_resp(addr, PlugInfoData::Type(PlugType::Sync)));
        avc.push(plug_info_resp(addr, PlugInfoData::Name("Sync".to_string())));
        avc.push(plug_info_resp(addr, PlugInfoData::ChCount(1)));
        avc.push(plug_info_resp(
            addr,
            PlugInfoData::ChName(ChannelName {
                ch: 1,
                name: "s".to_string(),
            }),
        ));
        avc.push(plug_info_resp(addr, PlugInfoData::Input(Default::default())));
        avc.push(plug_info_resp(addr, PlugInfoData::Outputs(Vec::new())));
    }

    #[test]
    fn unit_plug_walk_skips_failed_plug() {
        let avc = TestAvc::default();

        // Two isochronous input plugs are declared.
        avc.push(status_resp(0x02, &[0x00, 0x02, 0x00, 0x00, 0x00]));
        // No subfunction for asynchronous plugs.
        avc.push(rejected_resp(0x02));

        // The first plug responds to the whole queries.
        let addr = PlugAddr::new_for_unit(PlugDirection::Input, PlugAddrUnitType::Isoc, 0);
        avc.push(plug_info_resp(&addr, PlugInfoData::Type(PlugType::Sync)));
        avc.push(plug_info_resp(&addr, PlugInfoData::Name("PCR".to_string())));
        avc.push(plug_info_resp(&addr, PlugInfoData::ChCount(1)));
        avc.push(plug_info_resp(
            &addr,
            PlugInfoData::ChName(ChannelName {
                ch: 1,
                name: "c".to_string(),
            }),
        ));
        avc.push(plug_info_resp(&addr, PlugInfoData::Outputs(Vec::new())));

        // The second plug declines its first query.
        avc.push(rejected_resp(0x02));

        let plugs = UnitTopology::discover_unit_plugs(&avc, 100).unwrap();
        assert_eq!(plugs.len(), 1);
        assert_eq!(plugs[0].plug_id, 0);
        assert_eq!(plugs[0].spec.plug_type, PlugType::Sync);
        assert_eq!(plugs[0].spec.name, "PCR");
        assert_eq!(plugs[0].spec.channels, vec!["c".to_string()]);
    }

    #[test]
    fn subunit_plug_walk() {
        let avc = TestAvc::default();

        // Page 0 declares single music subunit, page 1 terminates the enumeration.
        avc.push(status_resp(0x31, &[0x07, 0x60, 0xff, 0xff, 0xff]));
        avc.push(rejected_resp(0x31));

        // The music subunit has one input and one output plug.
        avc.push(status_resp_to(0x60, 0x02, &[0x00, 0x01, 0x01, 0xff, 0xff]));

        let input_addr = PlugAddr::new_for_subunit(PlugDirection::Input, 0);
        push_sync_plug_resps(&avc, &input_addr);

        let output_addr = PlugAddr::new_for_subunit(PlugDirection::Output, 0);
        push_sync_plug_resps(&avc, &output_addr);

        let plugs = UnitTopology::discover_subunit_plugs(&avc, 100).unwrap();
        assert_eq!(plugs.len(), 2);
        assert_eq!(plugs[0].subunit, MUSIC_SUBUNIT_0);
        assert_eq!(plugs[0].direction, PlugDirection::Input);
        assert_eq!(plugs[1].direction, PlugDirection::Output);
        assert_eq!(plugs[0].spec.input.is_some(), true);
    }
}
