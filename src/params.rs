// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Write-only parameter block with its cache for models without reliable register read-back.
//!
//! The models receive configuration at a fixed register block but decline read transactions
//! against it. The cache mirrors the block word by word; it is seeded with the defaults of the
//! unit, pushed wholesale at the time the unit is attached, updated on every write, and never
//! read back from the hardware. The cache is owned by single session exclusively.
//!
//! A word of volume carries the left channel in its upper 16 bits and the right channel in
//! its lower 16 bits. Words of balance are seeded per category of stereo pair. The routing of
//! sources into the mixer is a pair of bitmaps; one word for physical sources, one for stream
//! sources, with the bit position computed per kind of source.

use super::*;

/// The base address of the write-only parameter block.
const PARAMS_OFFSET: u64 = 0xffc700700000;

/// The number of quadlets in the parameter block.
pub const CACHE_QUADLET_COUNT: usize = 40;

const PHYS_SOURCE_WORD_INDEX: usize = 36;
const STREAM_SOURCE_WORD_INDEX: usize = 37;
const AUX_VOLUME_WORD_INDEX: usize = 13;
const HEADPHONE_VOLUME_WORD_INDEX: usize = 14;
const OUTPUT_VOLUME_WORD_INDEX: usize = 2;
const AUX_INPUT_GAIN_WORD_INDEX: usize = 26;

/// Cache of the write-only parameter block, one word per quadlet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamsCache(pub [u32; CACHE_QUADLET_COUNT]);

impl Default for ParamsCache {
    fn default() -> Self {
        let mut words = [0u32; CACHE_QUADLET_COUNT];
        // Words of balance per stereo pair of analog, S/PDIF, and ADAT inputs.
        words[16..25].iter_mut().for_each(|word| *word = 0x7ffe8000);
        // Words of gain to auxiliary mixer.
        words[25..36].iter_mut().for_each(|word| *word = 0x80008000);
        // Stream sources into the mixer; the first pair to the first mixer, the second pair
        // to the second.
        words[37] = 0x00000009;
        // Sources of headphone pairs.
        words[38] = 0x00010001;
        Self(words)
    }
}

/// Replace the addressed half of the volume word, preserving the other half. The upper 16
/// bits carry the left channel (0), the lower 16 bits the right channel (1).
pub fn encode_volume(word: u32, ch: usize, value: u16) -> Result<u32, Error> {
    match ch {
        0 => Ok((word & 0x0000ffff) | ((value as u32) << 16)),
        1 => Ok((word & 0xffff0000) | (value as u32)),
        _ => {
            let msg = format!("Invalid argument for channel of stereo pair: {}", ch);
            Err(Error::new(FileError::Inval, &msg))
        }
    }
}

/// Extract the addressed half of the volume word.
pub fn decode_volume(word: u32, ch: usize) -> Result<u16, Error> {
    match ch {
        0 => Ok((word >> 16) as u16),
        1 => Ok((word & 0x0000ffff) as u16),
        _ => {
            let msg = format!("Invalid argument for channel of stereo pair: {}", ch);
            Err(Error::new(FileError::Inval, &msg))
        }
    }
}

/// Stereo pair of inputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputPair {
    Stream01,
    Stream23,
    Analog01,
    Analog23,
    Analog45,
    Analog67,
    Spdif01,
    Adat01,
    Adat23,
    Adat45,
    Adat67,
}

impl InputPair {
    /// The pairs in the order of words in the parameter block.
    pub const ALL: [InputPair; 11] = [
        InputPair::Stream01,
        InputPair::Stream23,
        InputPair::Analog01,
        InputPair::Analog23,
        InputPair::Analog45,
        InputPair::Analog67,
        InputPair::Spdif01,
        InputPair::Adat01,
        InputPair::Adat23,
        InputPair::Adat45,
        InputPair::Adat67,
    ];

    const LABELS: [&'static str; 11] = [
        "stream-1/2",
        "stream-3/4",
        "analog-1/2",
        "analog-3/4",
        "analog-5/6",
        "analog-7/8",
        "spdif-1/2",
        "adat-1/2",
        "adat-3/4",
        "adat-5/6",
        "adat-7/8",
    ];

    pub fn label(&self) -> &'static str {
        Self::LABELS[self.index()]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .position(|l| *l == label)
            .map(|pos| Self::ALL[pos])
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|pair| pair == self).unwrap()
    }

    fn is_stream(&self) -> bool {
        self.index() < 2
    }

    fn is_analog(&self) -> bool {
        let index = self.index();
        index >= 2 && index < 6
    }

    // The words of balance occupy the rows between input gains and gains to auxiliary mixer.
    fn volume_word_index(&self) -> usize {
        let index = self.index();
        if index > 7 {
            index + 8
        } else {
            index
        }
    }

    fn aux_gain_word_index(&self) -> usize {
        AUX_INPUT_GAIN_WORD_INDEX + self.index()
    }
}

/// Stereo pair of physical outputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputPair {
    Analog01,
    Analog23,
}

impl OutputPair {
    pub const ALL: [OutputPair; 2] = [OutputPair::Analog01, OutputPair::Analog23];

    const LABELS: [&'static str; 2] = ["analog-1/2", "analog-3/4"];

    pub fn label(&self) -> &'static str {
        Self::LABELS[self.index()]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .position(|l| *l == label)
            .map(|pos| Self::ALL[pos])
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|pair| pair == self).unwrap()
    }

    fn volume_word_index(&self) -> usize {
        OUTPUT_VOLUME_WORD_INDEX + self.index()
    }
}

/// Stereo pair of headphone outputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeadphonePair {
    Headphone01,
    Headphone23,
}

impl HeadphonePair {
    pub const ALL: [HeadphonePair; 2] = [HeadphonePair::Headphone01, HeadphonePair::Headphone23];

    const LABELS: [&'static str; 2] = ["headphone-1/2", "headphone-3/4"];

    pub fn label(&self) -> &'static str {
        Self::LABELS[self.index()]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .position(|l| *l == label)
            .map(|pos| Self::ALL[pos])
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|pair| pair == self).unwrap()
    }

    fn volume_word_index(&self) -> usize {
        HEADPHONE_VOLUME_WORD_INDEX + self.index()
    }
}

/// Stereo pair of mixer outputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MixerPair {
    Mixer01,
    Mixer23,
}

impl MixerPair {
    pub const ALL: [MixerPair; 2] = [MixerPair::Mixer01, MixerPair::Mixer23];

    const LABELS: [&'static str; 2] = ["mixer-1/2", "mixer-3/4"];

    pub fn label(&self) -> &'static str {
        Self::LABELS[self.index()]
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .position(|l| *l == label)
            .map(|pos| Self::ALL[pos])
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|pair| pair == self).unwrap()
    }
}

/// The position of bit for the pair of mixer and its source in the routing bitmap.
///
/// Stream sources use a 2-bit wide encoding in their own word; the first stream pair at the
/// fixed offset of 2, plus one for the first mixer. Analog sources use four bits per mixer,
/// digital sources a pair of bits per source from position 16.
pub fn mixer_routing_bit(mixer: MixerPair, source: InputPair) -> usize {
    if source.is_stream() {
        let mut pos = if source == InputPair::Stream01 { 2 } else { 0 };
        if mixer == MixerPair::Mixer01 {
            pos += 1;
        }
        pos
    } else if source.is_analog() {
        mixer.index() * 4 + source.index() - 2
    } else {
        16 + (source.index() - 6) * 2 + mixer.index()
    }
}

fn mixer_routing_word_index(source: InputPair) -> usize {
    if source.is_stream() {
        STREAM_SOURCE_WORD_INDEX
    } else {
        PHYS_SOURCE_WORD_INDEX
    }
}

/// Protocol implementation for the write-only parameter block.
#[derive(Default)]
pub struct CachedParamsProtocol;

impl CachedParamsProtocol {
    /// Push the whole cache to the unit; used at the time the unit is attached, with the cache
    /// at its defaults.
    pub fn upload(
        req: &FwReq,
        node: &FwNode,
        cache: &ParamsCache,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        let mut raw = [0u8; CACHE_QUADLET_COUNT * 4];
        cache.0.iter().enumerate().for_each(|(i, word)| {
            serialize_u32(word, &mut raw[(i * 4)..(i * 4 + 4)]);
        });
        write_block(req, node, PARAMS_OFFSET, &mut raw, timeout_ms)
    }

    fn write_word(
        req: &FwReq,
        node: &FwNode,
        cache: &mut ParamsCache,
        index: usize,
        word: u32,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        let mut raw = [0u8; 4];
        serialize_u32(&word, &mut raw);
        write_block(
            req,
            node,
            PARAMS_OFFSET + (index * 4) as u64,
            &mut raw,
            timeout_ms,
        )
        .map(|_| cache.0[index] = word)
    }

    fn update_volume(
        req: &FwReq,
        node: &FwNode,
        cache: &mut ParamsCache,
        index: usize,
        ch: usize,
        value: u16,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        let word = encode_volume(cache.0[index], ch, value)?;
        Self::write_word(req, node, cache, index, word, timeout_ms)
    }

    /// Set gain of single channel in the pair of inputs.
    pub fn set_input_volume(
        req: &FwReq,
        node: &FwNode,
        cache: &mut ParamsCache,
        pair: InputPair,
        ch: usize,
        value: u16,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        Self::update_volume(req, node, cache, pair.volume_word_index(), ch, value, timeout_ms)
    }

    /// Get gain of single channel in the pair of inputs from the cache.
    pub fn input_volume(cache: &ParamsCache, pair: InputPair, ch: usize) -> Result<u16, Error> {
        decode_volume(cache.0[pair.volume_word_index()], ch)
    }

    /// Set volume of single channel in the pair of physical outputs.
    pub fn set_output_volume(
        req: &FwReq,
        node: &FwNode,
        cache: &mut ParamsCache,
        pair: OutputPair,
        ch: usize,
        value: u16,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        Self::update_volume(req, node, cache, pair.volume_word_index(), ch, value, timeout_ms)
    }

    /// Get volume of single channel in the pair of physical outputs from the cache.
    pub fn output_volume(cache: &ParamsCache, pair: OutputPair, ch: usize) -> Result<u16, Error> {
        decode_volume(cache.0[pair.volume_word_index()], ch)
    }

    /// Set volume of single channel in the pair of auxiliary mixer outputs.
    pub fn set_aux_volume(
        req: &FwReq,
        node: &FwNode,
        cache: &mut ParamsCache,
        ch: usize,
        value: u16,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        Self::update_volume(req, node, cache, AUX_VOLUME_WORD_INDEX, ch, value, timeout_ms)
    }

    /// Get volume of single channel in the pair of auxiliary mixer outputs from the cache.
    pub fn aux_volume(cache: &ParamsCache, ch: usize) -> Result<u16, Error> {
        decode_volume(cache.0[AUX_VOLUME_WORD_INDEX], ch)
    }

    /// Set volume of single channel in the pair of headphone outputs.
    pub fn set_headphone_volume(
        req: &FwReq,
        node: &FwNode,
        cache: &mut ParamsCache,
        pair: HeadphonePair,
        ch: usize,
        value: u16,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        Self::update_volume(req, node, cache, pair.volume_word_index(), ch, value, timeout_ms)
    }

    /// Get volume of single channel in the pair of headphone outputs from the cache.
    pub fn headphone_volume(
        cache: &ParamsCache,
        pair: HeadphonePair,
        ch: usize,
    ) -> Result<u16, Error> {
        decode_volume(cache.0[pair.volume_word_index()], ch)
    }

    /// Set gain of single channel in the pair of inputs to the auxiliary mixer.
    pub fn set_aux_input_gain(
        req: &FwReq,
        node: &FwNode,
        cache: &mut ParamsCache,
        pair: InputPair,
        ch: usize,
        value: u16,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        Self::update_volume(req, node, cache, pair.aux_gain_word_index(), ch, value, timeout_ms)
    }

    /// Get gain of single channel in the pair of inputs to the auxiliary mixer from the cache.
    pub fn aux_input_gain(cache: &ParamsCache, pair: InputPair, ch: usize) -> Result<u16, Error> {
        decode_volume(cache.0[pair.aux_gain_word_index()], ch)
    }

    /// Enable or disable the pair of sources into the pair of mixer.
    pub fn set_mixer_routing(
        req: &FwReq,
        node: &FwNode,
        cache: &mut ParamsCache,
        mixer: MixerPair,
        source: InputPair,
        enable: bool,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        let index = mixer_routing_word_index(source);
        let pos = mixer_routing_bit(mixer, source);

        let mut word = cache.0[index];
        if enable {
            word |= 1 << pos;
        } else {
            word &= !(1 << pos);
        }

        Self::write_word(req, node, cache, index, word, timeout_ms)
    }

    /// Whether the pair of sources feeds the pair of mixer, from the cache.
    pub fn mixer_routing(cache: &ParamsCache, mixer: MixerPair, source: InputPair) -> bool {
        let index = mixer_routing_word_index(source);
        let pos = mixer_routing_bit(mixer, source);
        cache.0[index] & (1 << pos) > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn volume_codec_round_trip() {
        [0u16, 0x0001, 0x7fff, 0x8000, 0xffff]
            .iter()
            .for_each(|&value| {
                (0..2).for_each(|ch| {
                    let word = encode_volume(0x5a5aa5a5, ch, value).unwrap();
                    assert_eq!(decode_volume(word, ch).unwrap(), value);

                    // The other half is preserved.
                    let other = 1 - ch;
                    assert_eq!(
                        decode_volume(word, other).unwrap(),
                        decode_volume(0x5a5aa5a5, other).unwrap()
                    );
                });
            });

        assert!(encode_volume(0, 2, 0).is_err());
        assert!(decode_volume(0, 2).is_err());
    }

    #[test]
    fn cache_default_seed() {
        let cache = ParamsCache::default();
        assert_eq!(cache.0[0], 0x00000000);
        assert_eq!(cache.0[15], 0x00000000);
        assert_eq!(cache.0[16], 0x7ffe8000);
        assert_eq!(cache.0[24], 0x7ffe8000);
        assert_eq!(cache.0[25], 0x80008000);
        assert_eq!(cache.0[35], 0x80008000);
        assert_eq!(cache.0[36], 0x00000000);
        assert_eq!(cache.0[37], 0x00000009);
        assert_eq!(cache.0[38], 0x00010001);
        assert_eq!(cache.0[39], 0x00000000);
    }

    #[test]
    fn mixer_routing_bit_positions() {
        // Analog sources.
        assert_eq!(mixer_routing_bit(MixerPair::Mixer01, InputPair::Analog23), 1);
        assert_eq!(mixer_routing_bit(MixerPair::Mixer23, InputPair::Analog23), 5);
        assert_eq!(mixer_routing_bit(MixerPair::Mixer23, InputPair::Analog45), 6);

        // Digital sources.
        assert_eq!(mixer_routing_bit(MixerPair::Mixer01, InputPair::Spdif01), 16);
        assert_eq!(mixer_routing_bit(MixerPair::Mixer23, InputPair::Adat01), 19);
        assert_eq!(mixer_routing_bit(MixerPair::Mixer01, InputPair::Adat67), 24);

        // Stream sources.
        assert_eq!(mixer_routing_bit(MixerPair::Mixer01, InputPair::Stream01), 3);
        assert_eq!(mixer_routing_bit(MixerPair::Mixer23, InputPair::Stream01), 2);
        assert_eq!(mixer_routing_bit(MixerPair::Mixer01, InputPair::Stream23), 1);
        assert_eq!(mixer_routing_bit(MixerPair::Mixer23, InputPair::Stream23), 0);
    }

    #[test]
    fn mixer_routing_defaults() {
        let cache = ParamsCache::default();

        // The seed routes the first stream pair to the first mixer and the second to the
        // second.
        assert_eq!(
            CachedParamsProtocol::mixer_routing(&cache, MixerPair::Mixer01, InputPair::Stream01),
            true
        );
        assert_eq!(
            CachedParamsProtocol::mixer_routing(&cache, MixerPair::Mixer23, InputPair::Stream23),
            true
        );
        assert_eq!(
            CachedParamsProtocol::mixer_routing(&cache, MixerPair::Mixer23, InputPair::Stream01),
            false
        );
        assert_eq!(
            CachedParamsProtocol::mixer_routing(&cache, MixerPair::Mixer01, InputPair::Analog01),
            false
        );
    }

    #[test]
    fn pair_label_tables() {
        assert_eq!(InputPair::from_label("adat-5/6"), Some(InputPair::Adat45));
        assert_eq!(InputPair::Adat45.label(), "adat-5/6");
        assert_eq!(InputPair::from_label("adat-9/10"), None);
        assert_eq!(OutputPair::from_label("analog-3/4"), Some(OutputPair::Analog23));
        assert_eq!(MixerPair::from_label("mixer-1/2"), Some(MixerPair::Mixer01));
        assert_eq!(
            HeadphonePair::from_label("headphone-3/4"),
            Some(HeadphonePair::Headphone23)
        );
    }
}
