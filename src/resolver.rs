// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Resolver for signal sources which are able to feed a destination plug.
//!
//! The resolver probes each candidate by the specific inquiry form of SIGNAL SOURCE command;
//! the candidate which the unit declines is excluded without error. The currently connected
//! source is read distinctly so that the caller marks the active candidate among the feasible
//! ones. The resolver computes the canonical set of sources for sampling clock at the time
//! the unit is attached, and serves arbitrary feasibility queries at runtime.

use super::{descriptor::*, topology::*, *};

/// Candidate of signal source for a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionCandidate {
    /// The address of source plug.
    pub addr: SignalAddr,
    /// Whether the source currently feeds the destination.
    pub active: bool,
}

/// The destination plug of sampling clock; the input plug of music subunit for
/// synchronization.
pub fn detect_sync_destination(topology: &UnitTopology) -> Option<SignalAddr> {
    topology
        .subunit_plugs
        .iter()
        .find(|plug| {
            plug.subunit.subunit_type == AvcSubunitType::Music
                && plug.direction == PlugDirection::Input
                && plug.spec.plug_type == PlugType::Sync
        })
        .map(|plug| {
            SignalAddr::new_for_subunit(
                plug.subunit.subunit_type,
                plug.subunit.subunit_id,
                plug.plug_id,
            )
        })
}

/// Enumerate candidates of signal source for sampling clock, without feasibility probe.
///
/// The internal clock appears as output plugs of music subunit for synchronization, external
/// sources as external input plugs of unit for synchronization, digital or clock signal, and
/// SYT-match as isochronous input plugs of unit for synchronization.
pub fn sync_source_candidates(topology: &UnitTopology) -> Vec<SignalAddr> {
    let mut candidates = Vec::new();

    topology
        .subunit_plugs
        .iter()
        .filter(|plug| {
            plug.subunit.subunit_type == AvcSubunitType::Music
                && plug.direction == PlugDirection::Output
                && plug.spec.plug_type == PlugType::Sync
        })
        .for_each(|plug| {
            candidates.push(SignalAddr::new_for_subunit(
                plug.subunit.subunit_type,
                plug.subunit.subunit_id,
                plug.plug_id,
            ));
        });

    topology
        .unit_plugs
        .iter()
        .filter(|plug| {
            plug.plug_type == PlugAddrUnitType::Ext
                && plug.direction == PlugDirection::Input
                && matches!(
                    plug.spec.plug_type,
                    PlugType::Sync | PlugType::Digital | PlugType::Clock
                )
        })
        .for_each(|plug| {
            candidates.push(SignalAddr::new_for_ext_unit(plug.plug_id));
        });

    topology
        .unit_plugs
        .iter()
        .filter(|plug| {
            plug.plug_type == PlugAddrUnitType::Isoc
                && plug.direction == PlugDirection::Input
                && plug.spec.plug_type == PlugType::Sync
        })
        .for_each(|plug| {
            candidates.push(SignalAddr::new_for_isoc_unit(plug.plug_id));
        });

    candidates
}

/// Probe whether the source is able to feed the destination at all, without changing any
/// connection.
pub fn probe_signal_source<A: AvcTransaction<Error>>(
    avc: &A,
    src: &SignalAddr,
    dst: &SignalAddr,
    timeout_ms: u32,
) -> bool {
    let mut op = SignalSource {
        src: *src,
        dst: *dst,
    };
    avc.specific_inquiry(&AvcAddr::Unit, &mut op, timeout_ms)
        .is_ok()
}

/// Read the source which currently feeds the destination.
pub fn read_signal_source<A: AvcTransaction<Error>>(
    avc: &A,
    dst: &SignalAddr,
    timeout_ms: u32,
) -> Result<SignalAddr, Error> {
    let mut op = SignalSource::new(dst);
    avc.status(&AvcAddr::Unit, &mut op, timeout_ms)
        .map_err(from_avc_err)?;
    Ok(op.src)
}

/// Establish connection from the source to the destination.
pub fn write_signal_source<A: AvcTransaction<Error>>(
    avc: &A,
    src: &SignalAddr,
    dst: &SignalAddr,
    timeout_ms: u32,
) -> Result<(), Error> {
    let mut op = SignalSource {
        src: *src,
        dst: *dst,
    };
    avc.control(&AvcAddr::Unit, &mut op, timeout_ms)
        .map_err(from_avc_err)
}

/// Resolve which of the candidates are able to feed the destination, marking the currently
/// connected one. The candidate which fails the probe is excluded without error.
pub fn resolve_avail_sources<A: AvcTransaction<Error>>(
    avc: &A,
    dst: &SignalAddr,
    candidates: &[SignalAddr],
    timeout_ms: u32,
) -> Result<Vec<ConnectionCandidate>, Error> {
    let current = read_signal_source(avc, dst, timeout_ms).ok();

    let entries = candidates
        .iter()
        .filter(|addr| probe_signal_source(avc, addr, dst, timeout_ms))
        .map(|&addr| ConnectionCandidate {
            addr,
            active: current == Some(addr),
        })
        .collect();

    Ok(entries)
}

/// Compute the canonical set of sources for sampling clock; candidates from the topology,
/// filtered by the feasibility probe against the destination.
pub fn detect_sync_sources<A: AvcTransaction<Error>>(
    avc: &A,
    topology: &UnitTopology,
    dst: &SignalAddr,
    timeout_ms: u32,
) -> Result<Vec<SignalAddr>, Error> {
    let candidates = sync_source_candidates(topology);

    let srcs = candidates
        .into_iter()
        .filter(|addr| probe_signal_source(avc, addr, dst, timeout_ms))
        .collect();

    Ok(srcs)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    fn sync_plug_spec() -> PlugSpec {
        PlugSpec {
            plug_type: PlugType::Sync,
            name: "Sync".to_string(),
            ..Default::default()
        }
    }

    fn test_topology() -> UnitTopology {
        UnitTopology {
            unit_plugs: vec![
                UnitPlug {
                    plug_type: PlugAddrUnitType::Isoc,
                    direction: PlugDirection::Input,
                    plug_id: 1,
                    spec: sync_plug_spec(),
                },
                UnitPlug {
                    plug_type: PlugAddrUnitType::Ext,
                    direction: PlugDirection::Input,
                    plug_id: 2,
                    spec: PlugSpec {
                        plug_type: PlugType::Digital,
                        ..Default::default()
                    },
                },
                // Analog input is not a candidate of sampling clock.
                UnitPlug {
                    plug_type: PlugAddrUnitType::Ext,
                    direction: PlugDirection::Input,
                    plug_id: 3,
                    spec: PlugSpec {
                        plug_type: PlugType::Analog,
                        ..Default::default()
                    },
                },
            ],
            subunit_plugs: vec![
                SubunitPlug {
                    subunit: MUSIC_SUBUNIT_0,
                    direction: PlugDirection::Input,
                    plug_id: 0,
                    spec: sync_plug_spec(),
                },
                SubunitPlug {
                    subunit: MUSIC_SUBUNIT_0,
                    direction: PlugDirection::Output,
                    plug_id: 1,
                    spec: sync_plug_spec(),
                },
            ],
            func_blk_plugs: Vec::new(),
        }
    }

    #[test]
    fn sync_destination_and_candidates() {
        let topology = test_topology();

        let dst = detect_sync_destination(&topology).unwrap();
        assert_eq!(
            dst,
            SignalAddr::new_for_subunit(AvcSubunitType::Music, 0, 0)
        );

        let candidates = sync_source_candidates(&topology);
        assert_eq!(
            candidates,
            vec![
                SignalAddr::new_for_subunit(AvcSubunitType::Music, 0, 1),
                SignalAddr::new_for_ext_unit(2),
                SignalAddr::new_for_isoc_unit(1),
            ]
        );
    }

    #[derive(Default)]
    struct ProbeAvc {
        resp_frames: RefCell<Vec<Vec<u8>>>,
    }

    impl AvcTransaction<Error> for ProbeAvc {
        fn transaction(&self, _: &[u8], _: u32) -> Result<Vec<u8>, Error> {
            let mut frames = self.resp_frames.borrow_mut();
            if frames.is_empty() {
                Err(Error::new(FileError::Io, "No more response frame"))
            } else {
                Ok(frames.remove(0))
            }
        }
    }

    fn inquiry_resp(rcode: u8, src: &SignalAddr, dst: &SignalAddr) -> Vec<u8> {
        let mut op = SignalSource {
            src: *src,
            dst: *dst,
        };
        let mut operands = Vec::new();
        AvcControl::build_operands(&mut op, &AvcAddr::Unit, &mut operands).unwrap();
        let mut frame = vec![rcode, 0xff, 0x1a];
        frame.extend_from_slice(&operands);
        frame
    }

    #[test]
    fn infeasible_candidate_excluded() {
        let topology = test_topology();
        let dst = detect_sync_destination(&topology).unwrap();
        let internal = SignalAddr::new_for_subunit(AvcSubunitType::Music, 0, 1);
        let external = SignalAddr::new_for_ext_unit(2);
        let syt_match = SignalAddr::new_for_isoc_unit(1);

        let avc = ProbeAvc::default();
        avc.resp_frames
            .borrow_mut()
            .push(inquiry_resp(0x0c, &internal, &dst));
        avc.resp_frames
            .borrow_mut()
            .push(inquiry_resp(0x0a, &external, &dst));
        avc.resp_frames
            .borrow_mut()
            .push(inquiry_resp(0x0c, &syt_match, &dst));

        let srcs = detect_sync_sources(&avc, &topology, &dst, 100).unwrap();
        assert_eq!(srcs, vec![internal, syt_match]);
    }
}
