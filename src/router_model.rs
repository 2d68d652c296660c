// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Router and mixer configuration model.
//!
//! The model owns the authoritative list of route entries for the unit. At the time the unit
//! is attached, the entries which the unit currently applies are read and normalized by the
//! rules of the model; when the result differs from what the unit reports, the normalized
//! entries are loaded back so that configuration left by another software does not survive.
//! Any operation is exposed by the label of stereo pair, resolved against the layout computed
//! from the capability profile and the current configuration.

use super::{
    extension::{
        caps_section::*,
        cmd_section,
        cmd_section::{Opcode, RateMode},
        current_config_section::*,
        mixer_section, peak_section, router_section, standalone_section, *,
    },
    profile::*,
    *,
};

/// Stereo pair of channels in source block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcPortPair {
    /// The label of pair.
    pub label: String,
    /// The identifier of source block.
    pub id: SrcBlkId,
    /// The pair of channel numbers in the block.
    pub chs: [u8; 2],
}

/// Stereo pair of channels in destination block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DstPortPair {
    /// The label of pair.
    pub label: String,
    /// The identifier of destination block.
    pub id: DstBlkId,
    /// The pair of channel numbers in the block.
    pub chs: [u8; 2],
}

/// The lists of stereo pairs available as source and destination at the given rate mode.
#[derive(Default, Debug, Clone)]
pub struct RouterLayout {
    /// Available sources.
    pub srcs: Vec<SrcPortPair>,
    /// Available destinations.
    pub dsts: Vec<DstPortPair>,
}

fn pair_label(stem: &str, pair_idx: usize) -> String {
    format!("{}-{}/{}", stem, pair_idx * 2 + 1, pair_idx * 2 + 2)
}

fn adat_channel_count(profile: &DeviceProfile, rate_mode: RateMode) -> u8 {
    let index = match rate_mode {
        RateMode::Low => 0,
        RateMode::Middle => 1,
        RateMode::High => 2,
    };
    profile.adat_channels[index]
}

fn mixer_out_port_count(profile: &DeviceProfile, rate_mode: RateMode) -> u8 {
    let index = match rate_mode {
        RateMode::Low => 0,
        RateMode::Middle => 1,
        RateMode::High => 2,
    };
    profile.mixer_out_ports[index]
}

impl RouterLayout {
    /// Compute stereo pairs for physical ports from the profile.
    pub fn compute_phys_pairs(
        profile: &DeviceProfile,
        rate_mode: RateMode,
    ) -> (Vec<SrcPortPair>, Vec<DstPortPair>) {
        let mut srcs = Vec::new();
        profile.inputs.iter().for_each(|entry| {
            let count = match entry.id {
                SrcBlkId::Adat => adat_channel_count(profile, rate_mode),
                _ => entry.count,
            };
            (0..(count as usize / 2)).for_each(|i| {
                srcs.push(SrcPortPair {
                    label: pair_label(entry.label, i),
                    id: entry.id,
                    chs: [entry.offset + 2 * i as u8, entry.offset + 2 * i as u8 + 1],
                });
            });
        });

        let mut dsts = Vec::new();
        profile.outputs.iter().for_each(|entry| {
            let count = match entry.id {
                DstBlkId::Adat => adat_channel_count(profile, rate_mode),
                _ => entry.count,
            };
            (0..(count as usize / 2)).for_each(|i| {
                dsts.push(DstPortPair {
                    label: pair_label(entry.label, i),
                    id: entry.id,
                    chs: [entry.offset + 2 * i as u8, entry.offset + 2 * i as u8 + 1],
                });
            });
        });

        (srcs, dsts)
    }

    /// Compute stereo pairs for tx/rx streams from the current stream format configuration.
    pub fn compute_stream_pairs(
        tx_entries: &[FormatEntry],
        rx_entries: &[FormatEntry],
    ) -> (Vec<SrcPortPair>, Vec<DstPortPair>) {
        let mut srcs = Vec::new();
        let mut pair_idx = 0;
        rx_entries
            .iter()
            .zip([SrcBlkId::Avs0, SrcBlkId::Avs1].iter())
            .for_each(|(entry, &id)| {
                (0..(entry.pcm_count as usize / 2)).for_each(|i| {
                    srcs.push(SrcPortPair {
                        label: pair_label("stream", pair_idx),
                        id,
                        chs: [2 * i as u8, 2 * i as u8 + 1],
                    });
                    pair_idx += 1;
                });
            });

        let mut dsts = Vec::new();
        let mut pair_idx = 0;
        tx_entries
            .iter()
            .zip([DstBlkId::Avs0, DstBlkId::Avs1].iter())
            .for_each(|(entry, &id)| {
                (0..(entry.pcm_count as usize / 2)).for_each(|i| {
                    dsts.push(DstPortPair {
                        label: pair_label("stream", pair_idx),
                        id,
                        chs: [2 * i as u8, 2 * i as u8 + 1],
                    });
                    pair_idx += 1;
                });
            });

        (srcs, dsts)
    }

    /// Compute stereo pairs for mixer outputs and inputs from capabilities and the profile.
    pub fn compute_mixer_pairs(
        caps: &ExtensionCaps,
        profile: &DeviceProfile,
        rate_mode: RateMode,
    ) -> (Vec<SrcPortPair>, Vec<DstPortPair>) {
        let port_count = std::cmp::min(
            caps.mixer.output_count,
            mixer_out_port_count(profile, rate_mode),
        );

        let srcs = (0..(port_count as usize / 2))
            .map(|i| SrcPortPair {
                label: pair_label("mixer", i),
                id: SrcBlkId::Mixer,
                chs: [2 * i as u8, 2 * i as u8 + 1],
            })
            .collect();

        let mut dsts = Vec::new();
        let mut pair_idx = 0;
        let mut rest = caps.mixer.input_count;
        profile.mixer_in_ports.iter().for_each(|&(id, count)| {
            let count = std::cmp::min(count, rest);
            rest -= count;
            (0..(count as usize / 2)).for_each(|i| {
                dsts.push(DstPortPair {
                    label: pair_label("mixer-in", pair_idx),
                    id,
                    chs: [2 * i as u8, 2 * i as u8 + 1],
                });
                pair_idx += 1;
            });
        });

        (srcs, dsts)
    }

    /// Detect the whole layout available at the given rate mode.
    pub fn detect(
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        profile: &DeviceProfile,
        rate_mode: RateMode,
        timeout_ms: u32,
    ) -> Result<Self, Error> {
        let (mut srcs, mut dsts) = Self::compute_phys_pairs(profile, rate_mode);

        let mut tx_entries = Vec::new();
        let mut rx_entries = Vec::new();
        read_current_stream_format_entries(
            req,
            node,
            sections,
            caps,
            rate_mode,
            (&mut tx_entries, &mut rx_entries),
            timeout_ms,
        )?;
        let (stream_srcs, stream_dsts) = Self::compute_stream_pairs(&tx_entries, &rx_entries);
        srcs.extend_from_slice(&stream_srcs);
        dsts.extend_from_slice(&stream_dsts);

        let (mixer_srcs, mixer_dsts) = Self::compute_mixer_pairs(caps, profile, rate_mode);
        srcs.extend_from_slice(&mixer_srcs);
        dsts.extend_from_slice(&mixer_dsts);

        Ok(RouterLayout { srcs, dsts })
    }

    fn find_src(&self, label: &str) -> Option<&SrcPortPair> {
        self.srcs.iter().find(|pair| pair.label == label)
    }

    fn find_dst(&self, label: &str) -> Option<&DstPortPair> {
        self.dsts.iter().find(|pair| pair.label == label)
    }

    fn src_pair_of(&self, blk: &SrcBlk) -> Option<&SrcPortPair> {
        self.srcs
            .iter()
            .find(|pair| pair.id == blk.id && pair.chs.contains(&blk.ch))
    }

    fn dst_pair_of(&self, blk: &DstBlk) -> Option<&DstPortPair> {
        self.dsts
            .iter()
            .find(|pair| pair.id == blk.id && pair.chs.contains(&blk.ch))
    }

    /// The labels of destination pairs for physical outputs.
    pub fn output_pair_labels(&self) -> Vec<String> {
        self.dsts
            .iter()
            .filter(|pair| {
                !matches!(
                    pair.id,
                    DstBlkId::MixerTx0 | DstBlkId::MixerTx1 | DstBlkId::Avs0 | DstBlkId::Avs1
                )
            })
            .map(|pair| pair.label.clone())
            .collect()
    }

    /// The labels of destination pairs for tx streams.
    pub fn tx_stream_pair_labels(&self) -> Vec<String> {
        self.dsts
            .iter()
            .filter(|pair| matches!(pair.id, DstBlkId::Avs0 | DstBlkId::Avs1))
            .map(|pair| pair.label.clone())
            .collect()
    }

    /// The labels of destination pairs for mixer inputs.
    pub fn mixer_input_pair_labels(&self) -> Vec<String> {
        self.dsts
            .iter()
            .filter(|pair| matches!(pair.id, DstBlkId::MixerTx0 | DstBlkId::MixerTx1))
            .map(|pair| pair.label.clone())
            .collect()
    }

    /// The labels of source pairs for mixer outputs.
    pub fn mixer_output_pair_labels(&self) -> Vec<String> {
        self.srcs
            .iter()
            .filter(|pair| pair.id == SrcBlkId::Mixer)
            .map(|pair| pair.label.clone())
            .collect()
    }

    /// The labels of any source pair.
    pub fn source_pair_labels(&self) -> Vec<String> {
        self.srcs.iter().map(|pair| pair.label.clone()).collect()
    }

    /// The labels of source pairs available to mixer inputs.
    pub fn mixer_source_pair_labels(&self) -> Vec<String> {
        self.srcs
            .iter()
            .filter(|pair| pair.id != SrcBlkId::Mixer)
            .map(|pair| pair.label.clone())
            .collect()
    }
}

/// The authoritative list of route entries.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RouterState {
    /// The entries in the order of the unit.
    pub entries: Vec<RouterEntry>,
}

impl RouterState {
    /// Normalize entries; the entry whose source or destination is out of the layout is
    /// dropped, and a destination channel keeps at most one entry (first wins).
    pub fn normalize(&mut self, layout: &RouterLayout) {
        self.entries
            .retain(|entry| layout.src_pair_of(&entry.src).is_some());
        self.entries
            .retain(|entry| layout.dst_pair_of(&entry.dst).is_some());

        let mut seen = Vec::new();
        self.entries.retain(|entry| {
            if seen.contains(&entry.dst) {
                false
            } else {
                seen.push(entry.dst);
                true
            }
        });
    }

    /// Find indices of entries whose destination matches the labeled pair, ordered by the
    /// pair of source and destination channel.
    pub fn find_route_pairs(
        &self,
        layout: &RouterLayout,
        dst_label: &str,
    ) -> Result<Vec<usize>, Error> {
        let dst = layout.find_dst(dst_label).ok_or_else(|| {
            let msg = format!("Invalid argument for destination pair: {}", dst_label);
            Error::new(FileError::Inval, &msg)
        })?;

        let mut indices: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.dst.id == dst.id && dst.chs.contains(&entry.dst.ch))
            .map(|(i, _)| i)
            .collect();
        indices.sort_by_key(|&i| (self.entries[i].src.ch, self.entries[i].dst.ch));

        Ok(indices)
    }

    /// Point the labeled destination pair to the labeled source pair, or disconnect it.
    ///
    /// When entries for the destination already exist, they are re-pointed channel by channel
    /// (left to left, right to right) keeping their position in the list. Otherwise exactly
    /// two entries pairing the first two channels are appended. The removal for disconnection
    /// proceeds in descending order of index.
    pub fn establish_route(
        &mut self,
        layout: &RouterLayout,
        dst_label: &str,
        src_label: Option<&str>,
    ) -> Result<(), Error> {
        let pairs = self.find_route_pairs(layout, dst_label)?;

        match src_label {
            None => {
                let mut indices = pairs;
                indices.sort_unstable_by(|a, b| b.cmp(a));
                indices.iter().for_each(|&i| {
                    self.entries.remove(i);
                });
            }
            Some(label) => {
                let src = layout
                    .find_src(label)
                    .ok_or_else(|| {
                        let msg = format!("Invalid argument for source pair: {}", label);
                        Error::new(FileError::Inval, &msg)
                    })?
                    .clone();
                // The destination is validated by the call above already.
                let dst = layout.find_dst(dst_label).unwrap().clone();

                if pairs.len() > 0 {
                    pairs.iter().take(2).enumerate().for_each(|(i, &pos)| {
                        self.entries[pos].src = SrcBlk {
                            id: src.id,
                            ch: src.chs[i],
                        };
                    });
                } else {
                    (0..2).for_each(|i| {
                        self.entries.push(RouterEntry {
                            dst: DstBlk {
                                id: dst.id,
                                ch: dst.chs[i],
                            },
                            src: SrcBlk {
                                id: src.id,
                                ch: src.chs[i],
                            },
                            peak: 0,
                        });
                    });
                }
            }
        }

        Ok(())
    }

    /// The label of source pair which feeds the labeled destination pair.
    pub fn route_source(
        &self,
        layout: &RouterLayout,
        dst_label: &str,
    ) -> Result<Option<String>, Error> {
        let pairs = self.find_route_pairs(layout, dst_label)?;

        let label = pairs.iter().find_map(|&i| {
            layout
                .src_pair_of(&self.entries[i].src)
                .map(|pair| pair.label.clone())
        });

        Ok(label)
    }
}

/// Entry of gain for the pair of mixer output and input channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GainEntry {
    /// The channel of mixer output.
    pub dst_ch: u8,
    /// The channel of mixer input.
    pub src_ch: u8,
    /// The linear gain coefficient.
    pub coeff: u32,
}

/// Split the given coefficient total across the pair by the ratio of current values. When the
/// pair is wholly at zero the value is assigned to the addressed channel alone.
pub fn distribute_gain(left: u32, right: u32, val: u32, ch: usize) -> (u32, u32) {
    let total = left as u64 + right as u64;
    if total == 0 {
        if ch == 0 {
            (val, 0)
        } else {
            (0, val)
        }
    } else {
        let l = (val as u64 * left as u64 / total) as u32;
        let r = (val as u64 * right as u64 / total) as u32;
        (l, r)
    }
}

/// Redistribute the pair total by balance in percent; 0.0 is full left, 100.0 is full right.
pub fn distribute_balance(left: u32, right: u32, balance: f64) -> (u32, u32) {
    let total = left as u64 + right as u64;
    let r = ((total as f64) * balance / 100.0) as u64;
    let r = std::cmp::min(r, total);
    ((total - r) as u32, r as u32)
}

/// The balance of the pair in percent, or negative infinity when the pair is wholly at zero.
pub fn balance_of(left: u32, right: u32) -> f64 {
    let total = left as u64 + right as u64;
    if total == 0 {
        f64::NEG_INFINITY
    } else {
        100.0 * (right as f64) / (total as f64)
    }
}

/// Snapshot of peak level per route, keyed by the pair of source and destination labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakSnapshot {
    /// The label of source pair.
    pub src_label: String,
    /// The label of destination pair.
    pub dst_label: String,
    /// The latest peak level.
    pub peak: u16,
}

/// Session model of router and mixer for single unit.
#[derive(Debug)]
pub struct UnitRouter {
    /// The profile of the model.
    pub profile: &'static DeviceProfile,
    /// The mode of sampling transfer frequency in use.
    pub rate_mode: RateMode,
    /// The layout of available pairs.
    pub layout: RouterLayout,
    /// The authoritative route entries.
    pub state: RouterState,
}

impl UnitRouter {
    /// Build the model at the time the unit is attached. The entries read from the unit are
    /// normalized; when the normalized entries differ from what the unit reports, they are
    /// pushed back and loaded so that configuration left by another software is replaced.
    pub fn cache(
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        profile: &'static DeviceProfile,
        rate_mode: RateMode,
        timeout_ms: u32,
    ) -> Result<Self, Error> {
        let layout = RouterLayout::detect(req, node, sections, caps, profile, rate_mode, timeout_ms)?;

        let mut entries = Vec::new();
        read_current_router_entries(
            req,
            node,
            sections,
            caps,
            rate_mode,
            &mut entries,
            timeout_ms,
        )?;

        let mut state = RouterState {
            entries: entries.clone(),
        };
        state.normalize(&layout);

        if state.entries != entries {
            router_section::write_router_whole_entries(
                req,
                node,
                sections,
                caps,
                &state.entries,
                timeout_ms,
            )?;
            cmd_section::initiate(
                req,
                node,
                sections,
                caps,
                Opcode::LoadFromRouter(rate_mode),
                timeout_ms,
            )?;
        }

        Ok(UnitRouter {
            profile,
            rate_mode,
            layout,
            state,
        })
    }

    fn update_route(
        &mut self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        dst_label: &str,
        src_label: Option<&str>,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        self.state.establish_route(&self.layout, dst_label, src_label)?;

        router_section::write_router_whole_entries(
            req,
            node,
            sections,
            caps,
            &self.state.entries,
            timeout_ms,
        )?;
        cmd_section::initiate(
            req,
            node,
            sections,
            caps,
            Opcode::LoadFromRouter(self.rate_mode),
            timeout_ms,
        )
    }

    fn check_scoped_label(labels: &[String], label: &str, scope: &str) -> Result<(), Error> {
        if !labels.iter().any(|l| l == label) {
            let msg = format!("Invalid argument for {} pair: {}", scope, label);
            Err(Error::new(FileError::Inval, &msg))?;
        }
        Ok(())
    }

    fn check_scoped_source(&self, label: Option<&str>, labels: &[String]) -> Result<(), Error> {
        if let Some(label) = label {
            Self::check_scoped_label(labels, label, "source")?;
        }
        Ok(())
    }

    /// Point the pair of physical outputs to the source, or disconnect by `None`.
    pub fn set_output_source(
        &mut self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        target: &str,
        source: Option<&str>,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        Self::check_scoped_label(&self.layout.output_pair_labels(), target, "output")?;
        self.check_scoped_source(source, &self.layout.source_pair_labels())?;
        self.update_route(req, node, sections, caps, target, source, timeout_ms)
    }

    /// The label of source pair which feeds the pair of physical outputs.
    pub fn get_output_source(&self, target: &str) -> Result<Option<String>, Error> {
        Self::check_scoped_label(&self.layout.output_pair_labels(), target, "output")?;
        self.state.route_source(&self.layout, target)
    }

    /// Point the pair of tx stream channels to the source, or disconnect by `None`.
    pub fn set_tx_stream_source(
        &mut self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        target: &str,
        source: Option<&str>,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        Self::check_scoped_label(&self.layout.tx_stream_pair_labels(), target, "tx stream")?;
        self.check_scoped_source(source, &self.layout.source_pair_labels())?;
        self.update_route(req, node, sections, caps, target, source, timeout_ms)
    }

    /// The label of source pair which feeds the pair of tx stream channels.
    pub fn get_tx_stream_source(&self, target: &str) -> Result<Option<String>, Error> {
        Self::check_scoped_label(&self.layout.tx_stream_pair_labels(), target, "tx stream")?;
        self.state.route_source(&self.layout, target)
    }

    /// Point the pair of mixer inputs to the source, or disconnect by `None`.
    pub fn set_mixer_source(
        &mut self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        target: &str,
        source: Option<&str>,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        Self::check_scoped_label(&self.layout.mixer_input_pair_labels(), target, "mixer input")?;
        self.check_scoped_source(source, &self.layout.mixer_source_pair_labels())?;
        self.update_route(req, node, sections, caps, target, source, timeout_ms)
    }

    /// The label of source pair which feeds the pair of mixer inputs.
    pub fn get_mixer_source(&self, target: &str) -> Result<Option<String>, Error> {
        Self::check_scoped_label(&self.layout.mixer_input_pair_labels(), target, "mixer input")?;
        self.state.route_source(&self.layout, target)
    }

    fn mixer_input_base_ch(&self, id: DstBlkId) -> u8 {
        let mut base = 0;
        for &(blk_id, count) in self.profile.mixer_in_ports {
            if blk_id == id {
                break;
            }
            base += count;
        }
        base
    }

    fn read_mixer_gain_entries(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        output: &str,
        input: &str,
        timeout_ms: u32,
    ) -> Result<Vec<GainEntry>, Error> {
        if self.get_mixer_source(input)?.is_none() {
            let msg = format!("Mixer input has no source: {}", input);
            Err(Error::new(FileError::Inval, &msg))?;
        }
        Self::check_scoped_label(&self.layout.mixer_output_pair_labels(), output, "mixer output")?;

        // The output pair addresses channels of mixer source block, the input pair addresses
        // channels in the matrix flattened across mixer input blocks.
        let out_pair = self.layout.find_src(output).unwrap().clone();
        let in_pair = self.layout.find_dst(input).unwrap().clone();
        let in_base = self.mixer_input_base_ch(in_pair.id);

        let mut entries = Vec::new();
        for &dst_ch in out_pair.chs.iter() {
            for &ch in in_pair.chs.iter() {
                let src_ch = in_base + ch;
                let coeff =
                    mixer_section::read_gain_coeff(req, node, sections, caps, dst_ch, src_ch, timeout_ms)?;
                entries.push(GainEntry {
                    dst_ch,
                    src_ch,
                    coeff,
                });
            }
        }

        Ok(entries)
    }

    fn write_mixer_gain_entries(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        entries: &[GainEntry],
        timeout_ms: u32,
    ) -> Result<(), Error> {
        entries.iter().try_for_each(|entry| {
            mixer_section::write_gain_coeff(
                req,
                node,
                sections,
                caps,
                entry.dst_ch,
                entry.src_ch,
                entry.coeff,
                timeout_ms,
            )
        })
    }

    /// Set gain of the pair in dB. The requested value is distributed across the pair of
    /// mixer output channels by the ratio of current values.
    pub fn set_mixer_gain(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        output: &str,
        input: &str,
        ch: usize,
        db: f64,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        if ch > 1 {
            let msg = format!("Invalid argument for channel of stereo pair: {}", ch);
            Err(Error::new(FileError::Inval, &msg))?;
        }

        let mut entries =
            self.read_mixer_gain_entries(req, node, sections, caps, output, input, timeout_ms)?;

        let val = mixer_section::build_coeff_from_db(db);
        let (left, right) =
            distribute_gain(entries[ch].coeff, entries[ch + 2].coeff, val, ch);
        entries[ch].coeff = left;
        entries[ch + 2].coeff = right;

        self.write_mixer_gain_entries(req, node, sections, caps, &entries, timeout_ms)
    }

    /// Get gain of the pair in dB, by the total across the pair of mixer output channels.
    pub fn get_mixer_gain(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        output: &str,
        input: &str,
        ch: usize,
        timeout_ms: u32,
    ) -> Result<f64, Error> {
        if ch > 1 {
            let msg = format!("Invalid argument for channel of stereo pair: {}", ch);
            Err(Error::new(FileError::Inval, &msg))?;
        }

        let entries =
            self.read_mixer_gain_entries(req, node, sections, caps, output, input, timeout_ms)?;

        let total = entries[ch].coeff as u64 + entries[ch + 2].coeff as u64;
        let total = std::cmp::min(total, u32::MAX as u64) as u32;
        Ok(mixer_section::parse_coeff_to_db(total))
    }

    /// Set balance of the pair in percent; 0.0 is full left, 100.0 is full right.
    pub fn set_mixer_balance(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        output: &str,
        input: &str,
        ch: usize,
        balance: f64,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        if ch > 1 {
            let msg = format!("Invalid argument for channel of stereo pair: {}", ch);
            Err(Error::new(FileError::Inval, &msg))?;
        }
        if balance < 0.0 || balance > 100.0 {
            let msg = format!("Invalid argument for balance of stereo pair: {}", balance);
            Err(Error::new(FileError::Inval, &msg))?;
        }

        let mut entries =
            self.read_mixer_gain_entries(req, node, sections, caps, output, input, timeout_ms)?;

        let (left, right) =
            distribute_balance(entries[ch].coeff, entries[ch + 2].coeff, balance);
        entries[ch].coeff = left;
        entries[ch + 2].coeff = right;

        self.write_mixer_gain_entries(req, node, sections, caps, &entries, timeout_ms)
    }

    /// Get balance of the pair in percent. When the pair is wholly at zero the balance is
    /// undefined and negative infinity is returned.
    pub fn get_mixer_balance(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        output: &str,
        input: &str,
        ch: usize,
        timeout_ms: u32,
    ) -> Result<f64, Error> {
        if ch > 1 {
            let msg = format!("Invalid argument for channel of stereo pair: {}", ch);
            Err(Error::new(FileError::Inval, &msg))?;
        }

        let entries =
            self.read_mixer_gain_entries(req, node, sections, caps, output, input, timeout_ms)?;

        Ok(balance_of(entries[ch].coeff, entries[ch + 2].coeff))
    }

    fn storable_categories(
        &self,
        caps: &ExtensionCaps,
    ) -> Result<Vec<ConfigCategory>, Error> {
        let mut categories = Vec::new();
        if self.profile.is_storable(ConfigCategory::StreamConfig)
            && caps.general.stream_format_is_storable
        {
            categories.push(ConfigCategory::StreamConfig);
        }
        if self.profile.is_storable(ConfigCategory::Mixer) && caps.mixer.is_storable {
            categories.push(ConfigCategory::Mixer);
        }
        if self.profile.is_storable(ConfigCategory::Router) && caps.router.is_storable {
            categories.push(ConfigCategory::Router);
        }
        if categories.is_empty() {
            Err(Error::new(
                CtlExtensionError::Cmd,
                "No category of configuration is storable",
            ))?;
        }
        Ok(categories)
    }

    /// Store configurations to on-board flash memory, returning the affected categories.
    pub fn store_to_storage(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        timeout_ms: u32,
    ) -> Result<Vec<ConfigCategory>, Error> {
        let categories = self.storable_categories(caps)?;
        cmd_section::initiate(req, node, sections, caps, Opcode::LoadToStorage, timeout_ms)?;
        Ok(categories)
    }

    /// Load configurations from on-board flash memory, returning the affected categories.
    pub fn load_from_storage(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        timeout_ms: u32,
    ) -> Result<Vec<ConfigCategory>, Error> {
        let categories = self.storable_categories(caps)?;
        cmd_section::initiate(req, node, sections, caps, Opcode::LoadFromStorage, timeout_ms)?;
        Ok(categories)
    }

    /// Fold the latest peak levels into the route entries.
    pub fn refresh_peaks(
        &mut self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        caps: &ExtensionCaps,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        let peaks = peak_section::read_peak_entries(req, node, sections, caps, timeout_ms)?;

        self.state.entries.iter_mut().for_each(|entry| {
            if let Some(peak) = peaks
                .iter()
                .find(|peak| peak.src == entry.src && peak.dst == entry.dst)
            {
                entry.peak = peak.peak;
            }
        });

        Ok(())
    }

    /// Snapshot of peak levels keyed by the labels of source and destination pairs.
    pub fn peak_snapshot(&self) -> Vec<PeakSnapshot> {
        self.state
            .entries
            .iter()
            .filter_map(|entry| {
                let src = self.layout.src_pair_of(&entry.src)?;
                let dst = self.layout.dst_pair_of(&entry.dst)?;
                Some(PeakSnapshot {
                    src_label: src.label.clone(),
                    dst_label: dst.label.clone(),
                    peak: entry.peak,
                })
            })
            .collect()
    }

    /// The name of standalone clock source in use.
    pub fn get_standalone_clock_source(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        timeout_ms: u32,
    ) -> Result<&'static str, Error> {
        let alias =
            standalone_section::read_standalone_clock_source(req, node, sections, timeout_ms)?;
        self.profile
            .clock_source_by_alias(alias)
            .map(|spec| spec.name)
            .ok_or_else(|| {
                let msg = format!("Unexpected alias for clock source: {}", alias);
                Error::new(CtlExtensionError::Standalone, &msg)
            })
    }

    /// Select the standalone clock source by its name.
    pub fn set_standalone_clock_source(
        &self,
        req: &FwReq,
        node: &FwNode,
        sections: &ExtensionSections,
        source: &str,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        let spec = self.profile.clock_source_by_name(source).ok_or_else(|| {
            let msg = format!("Invalid argument for clock source: {}", source);
            Error::new(FileError::Inval, &msg)
        })?;
        standalone_section::write_standalone_clock_source(
            req, node, sections, spec.alias, timeout_ms,
        )
    }

    /// The schema of configurable parameters for the named standalone clock source.
    pub fn standalone_clock_source_params(
        &self,
        source: &str,
    ) -> Result<&'static [ClockSourceParam], Error> {
        self.profile
            .clock_source_by_name(source)
            .map(|spec| spec.params)
            .ok_or_else(|| {
                let msg = format!("Invalid argument for clock source: {}", source);
                Error::new(FileError::Inval, &msg)
            })
    }
}

/// Coalescing task for deferred re-read of topology and route entries.
///
/// A notification handler schedules the task and the dispatcher of the caller drains it
/// outside of the handler; repeated notifications coalesce into at most single re-read in
/// flight, and a notification arriving during the re-read schedules exactly one more.
#[derive(Default, Debug)]
pub struct RescanTask {
    pending: bool,
    in_flight: bool,
}

impl RescanTask {
    /// Mark that re-read is required.
    pub fn schedule(&mut self) {
        self.pending = true;
    }

    /// Take the pending request unless another re-read is in flight.
    pub fn begin(&mut self) -> bool {
        if self.pending && !self.in_flight {
            self.pending = false;
            self.in_flight = true;
            true
        } else {
            false
        }
    }

    /// Finish the re-read in flight.
    pub fn finish(&mut self) {
        self.in_flight = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_layout() -> RouterLayout {
        RouterLayout {
            srcs: vec![
                SrcPortPair {
                    label: "analog-1/2".to_string(),
                    id: SrcBlkId::Ins0,
                    chs: [0, 1],
                },
                SrcPortPair {
                    label: "analog-3/4".to_string(),
                    id: SrcBlkId::Ins0,
                    chs: [2, 3],
                },
                SrcPortPair {
                    label: "stream-1/2".to_string(),
                    id: SrcBlkId::Avs0,
                    chs: [0, 1],
                },
                SrcPortPair {
                    label: "mixer-1/2".to_string(),
                    id: SrcBlkId::Mixer,
                    chs: [0, 1],
                },
            ],
            dsts: vec![
                DstPortPair {
                    label: "analog-1/2".to_string(),
                    id: DstBlkId::Ins0,
                    chs: [0, 1],
                },
                DstPortPair {
                    label: "analog-3/4".to_string(),
                    id: DstBlkId::Ins0,
                    chs: [2, 3],
                },
                DstPortPair {
                    label: "stream-1/2".to_string(),
                    id: DstBlkId::Avs0,
                    chs: [0, 1],
                },
                DstPortPair {
                    label: "mixer-in-1/2".to_string(),
                    id: DstBlkId::MixerTx0,
                    chs: [0, 1],
                },
            ],
        }
    }

    fn assert_unique_destinations(state: &RouterState) {
        state.entries.iter().enumerate().for_each(|(i, entry)| {
            let count = state
                .entries
                .iter()
                .filter(|e| e.dst == entry.dst)
                .count();
            assert_eq!(count, 1, "duplicate destination at {}", i);
        });
    }

    #[test]
    fn route_uniqueness_after_updates() {
        let layout = test_layout();
        let mut state = RouterState::default();

        state
            .establish_route(&layout, "analog-1/2", Some("stream-1/2"))
            .unwrap();
        state
            .establish_route(&layout, "analog-1/2", Some("analog-3/4"))
            .unwrap();
        state
            .establish_route(&layout, "analog-3/4", Some("stream-1/2"))
            .unwrap();
        state
            .establish_route(&layout, "mixer-in-1/2", Some("analog-1/2"))
            .unwrap();

        assert_unique_destinations(&state);
        assert_eq!(
            state.route_source(&layout, "analog-1/2").unwrap(),
            Some("analog-3/4".to_string())
        );
        assert_eq!(
            state.route_source(&layout, "analog-3/4").unwrap(),
            Some("stream-1/2".to_string())
        );
    }

    #[test]
    fn route_removal() {
        let layout = test_layout();
        let mut state = RouterState::default();

        state
            .establish_route(&layout, "analog-1/2", Some("stream-1/2"))
            .unwrap();
        assert_eq!(state.find_route_pairs(&layout, "analog-1/2").unwrap().len(), 2);

        state.establish_route(&layout, "analog-1/2", None).unwrap();
        assert_eq!(state.find_route_pairs(&layout, "analog-1/2").unwrap().len(), 0);
        assert_eq!(state.route_source(&layout, "analog-1/2").unwrap(), None);
    }

    #[test]
    fn route_repoint_keeps_entry_identity() {
        let layout = test_layout();
        let mut state = RouterState::default();

        state
            .establish_route(&layout, "analog-1/2", Some("stream-1/2"))
            .unwrap();
        state
            .establish_route(&layout, "analog-3/4", Some("stream-1/2"))
            .unwrap();
        state
            .establish_route(&layout, "analog-1/2", Some("analog-3/4"))
            .unwrap();

        // The first two entries keep their position and destination.
        assert_eq!(state.entries.len(), 4);
        assert_eq!(state.entries[0].dst, DstBlk { id: DstBlkId::Ins0, ch: 0 });
        assert_eq!(state.entries[0].src, SrcBlk { id: SrcBlkId::Ins0, ch: 2 });
        assert_eq!(state.entries[1].dst, DstBlk { id: DstBlkId::Ins0, ch: 1 });
        assert_eq!(state.entries[1].src, SrcBlk { id: SrcBlkId::Ins0, ch: 3 });
    }

    #[test]
    fn normalize_drops_foreign_and_duplicate_entries() {
        let layout = test_layout();
        let mut state = RouterState {
            entries: vec![
                RouterEntry {
                    dst: DstBlk { id: DstBlkId::Ins0, ch: 0 },
                    src: SrcBlk { id: SrcBlkId::Avs0, ch: 0 },
                    peak: 0,
                },
                // Out of the layout; dropped.
                RouterEntry {
                    dst: DstBlk { id: DstBlkId::Ins1, ch: 0 },
                    src: SrcBlk { id: SrcBlkId::Avs0, ch: 0 },
                    peak: 0,
                },
                // Duplicate destination; dropped.
                RouterEntry {
                    dst: DstBlk { id: DstBlkId::Ins0, ch: 0 },
                    src: SrcBlk { id: SrcBlkId::Ins0, ch: 2 },
                    peak: 0,
                },
                RouterEntry {
                    dst: DstBlk { id: DstBlkId::Ins0, ch: 1 },
                    src: SrcBlk { id: SrcBlkId::Avs0, ch: 1 },
                    peak: 0,
                },
            ],
        };

        state.normalize(&layout);
        assert_eq!(state.entries.len(), 2);
        assert_unique_destinations(&state);
    }

    #[test]
    fn gain_distribution() {
        // Both channels at zero; the value goes wholly to the addressed channel.
        assert_eq!(distribute_gain(0, 0, 100, 0), (100, 0));
        assert_eq!(distribute_gain(0, 0, 100, 1), (0, 100));

        // Existing ratio is kept.
        let (l, r) = distribute_gain(300, 100, 200, 0);
        assert_eq!(l, 150);
        assert_eq!(r, 50);
    }

    #[test]
    fn balance_symmetry() {
        let (l, r) = distribute_balance(300, 100, 0.0);
        assert_eq!(balance_of(l, r), 0.0);

        let (l, r) = distribute_balance(300, 100, 100.0);
        assert_eq!(balance_of(l, r), 100.0);

        let (l, r) = distribute_balance(300, 100, 50.0);
        assert!((balance_of(l, r) - 50.0).abs() < 1.0);

        assert_eq!(balance_of(0, 0), f64::NEG_INFINITY);
    }

    #[test]
    fn rescan_task_single_flight() {
        let mut task = RescanTask::default();

        // Repeated notifications coalesce.
        task.schedule();
        task.schedule();
        assert_eq!(task.begin(), true);
        assert_eq!(task.begin(), false);

        // A notification during the re-read schedules exactly one more.
        task.schedule();
        assert_eq!(task.begin(), false);
        task.finish();
        assert_eq!(task.begin(), true);
        task.finish();
        assert_eq!(task.begin(), false);
    }

    #[test]
    fn phys_pair_computation() {
        let (srcs, dsts) = RouterLayout::compute_phys_pairs(&GENERIC_PROFILE, RateMode::Low);
        assert_eq!(srcs.len(), 4 + 1 + 4);
        assert_eq!(srcs[0].label, "analog-1/2");
        assert_eq!(srcs[4].label, "spdif-1/2");
        assert_eq!(srcs[5].label, "adat-1/2");
        assert_eq!(dsts.len(), 4 + 1 + 4);

        // ADAT channels shrink at high rate.
        let (srcs, _) = RouterLayout::compute_phys_pairs(&GENERIC_PROFILE, RateMode::High);
        assert_eq!(srcs.len(), 4 + 1 + 1);
    }
}
