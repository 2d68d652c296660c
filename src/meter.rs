// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Hardware metering for models with the fixed metering block.
//!
//! The block is a fixed number of quadlets read from the metering base address. The first
//! word carries states of hardware switch and rotary knobs, the last word carries the index
//! of sampling rate and the status of clock synchronization, and the words between carry one
//! detected level per 16 bit half, mapped onto the ordered label list of the profile. The
//! read is a pure decode and mutates no model state.

use super::*;

/// The base address of the metering block.
const METER_OFFSET: u64 = 0xffc700600000;

/// The number of quadlets in the metering block.
pub const METER_QUADLET_COUNT: usize = 21;

/// The sampling rates indexed by the rate field of the metering block.
const SAMPLING_RATES: [u32; 7] = [32000, 44100, 48000, 88200, 96000, 176400, 192000];

/// Snapshot of hardware metering.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MeterState {
    /// The detected levels, in the order of the label list of the profile.
    pub levels: Vec<u16>,
    /// The state of hardware switch.
    pub switch: u8,
    /// The positions of hardware rotary knobs.
    pub rotaries: [u8; 3],
    /// The sampling rate in use.
    pub rate: u32,
    /// Whether sampling clock is synchronized.
    pub sync: bool,
}

/// Decode the metering block against the ordered label list.
pub fn decode_meter_block(labels: &[&str], raw: &[u8]) -> Result<MeterState, Error> {
    if raw.len() < METER_QUADLET_COUNT * 4 {
        let msg = format!("Invalid size of metering block: {}", raw.len());
        Err(Error::new(FileError::Io, &msg))?;
    }
    if labels.len() > (METER_QUADLET_COUNT - 2) * 2 {
        let msg = format!("Invalid count of metering labels: {}", labels.len());
        Err(Error::new(FileError::Inval, &msg))?;
    }

    let mut words = [0u32; METER_QUADLET_COUNT];
    words.iter_mut().enumerate().for_each(|(i, word)| {
        deserialize_u32(word, &raw[(i * 4)..(i * 4 + 4)]);
    });

    let levels = labels
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let word = words[1 + i / 2];
            if i % 2 > 0 {
                (word >> 16) as u16
            } else {
                (word & 0x0000ffff) as u16
            }
        })
        .collect();

    let misc = words[0];
    let switch = ((misc >> 24) & 0xff) as u8;
    let rotaries = [
        ((misc >> 16) & 0xff) as u8,
        ((misc >> 8) & 0xff) as u8,
        (misc & 0xff) as u8,
    ];

    let last = words[METER_QUADLET_COUNT - 1];
    let rate_index = ((last >> 8) & 0x0f) as usize;
    let rate = *SAMPLING_RATES.get(rate_index).ok_or_else(|| {
        let msg = format!("Unexpected index of sampling rate: {}", rate_index);
        Error::new(FileError::Io, &msg)
    })?;
    let sync = last & 0x0f > 0;

    Ok(MeterState {
        levels,
        switch,
        rotaries,
        rate,
        sync,
    })
}

/// Read the metering block from the unit and decode it against the ordered label list.
pub fn read_meter_state(
    req: &FwReq,
    node: &FwNode,
    labels: &[&str],
    timeout_ms: u32,
    state: &mut MeterState,
) -> Result<(), Error> {
    let mut raw = [0u8; METER_QUADLET_COUNT * 4];
    read_block(req, node, METER_OFFSET, &mut raw, timeout_ms)?;
    decode_meter_block(labels, &raw).map(|s| *state = s)
}

impl MeterState {
    /// The detected levels keyed by label.
    pub fn labeled_levels<'a>(&self, labels: &[&'a str]) -> Vec<(&'a str, u16)> {
        labels
            .iter()
            .zip(self.levels.iter())
            .map(|(&label, &level)| (label, level))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::super::profile::detect_profile;

    #[test]
    fn meter_block_decode() {
        let mut raw = [0u8; METER_QUADLET_COUNT * 4];
        // Switch and rotary states.
        raw[0..4].copy_from_slice(&0x01020304u32.to_be_bytes());
        // The first pair of levels; even label in the lower half, odd in the upper.
        raw[4..8].copy_from_slice(&0x00020001u32.to_be_bytes());
        // The last pair of levels.
        raw[76..80].copy_from_slice(&0x00260025u32.to_be_bytes());
        // Sampling rate of 48000 and synchronized clock.
        raw[80..84].copy_from_slice(&0x00000201u32.to_be_bytes());

        let labels = detect_profile(0x000d6c, 0x010071).metering_labels;
        let state = decode_meter_block(labels, &raw).unwrap();

        assert_eq!(state.levels.len(), labels.len());
        assert_eq!(state.levels[0], 0x0001);
        assert_eq!(state.levels[1], 0x0002);
        assert_eq!(state.levels[36], 0x0025);
        assert_eq!(state.levels[37], 0x0026);
        assert_eq!(state.switch, 0x01);
        assert_eq!(state.rotaries, [0x02, 0x03, 0x04]);
        assert_eq!(state.rate, 48000);
        assert_eq!(state.sync, true);

        let labeled = state.labeled_levels(labels);
        assert_eq!(labeled[0], ("analog-in-1", 0x0001));
        assert_eq!(labeled[37], ("aux-out-2", 0x0026));
    }

    #[test]
    fn meter_block_no_sync() {
        let mut raw = [0u8; METER_QUADLET_COUNT * 4];
        // Sampling rate of 96000 without synchronization.
        raw[80..84].copy_from_slice(&0x00000400u32.to_be_bytes());

        let state = decode_meter_block(&["a", "b"], &raw).unwrap();
        assert_eq!(state.rate, 96000);
        assert_eq!(state.sync, false);
    }

    #[test]
    fn meter_block_invalid_rate() {
        let mut raw = [0u8; METER_QUADLET_COUNT * 4];
        raw[80..84].copy_from_slice(&0x00000f00u32.to_be_bytes());

        assert!(decode_meter_block(&[], &raw).is_err());
    }
}
