// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Control extension in the private register space of the unit.
//!
//! The extension exposes router, mixer, peak metering, and standalone configurations. All of
//! the features are categorized to sections; the offset and size of each section is read from
//! the head of extension space at runtime, and any operation is addressed relative to its
//! section.

pub mod caps_section;
pub mod cmd_section;
pub mod current_config_section;
pub mod mixer_section;
pub mod peak_section;
pub mod router_section;
pub mod standalone_section;

#[doc(hidden)]
mod router_entry;
#[doc(hidden)]
mod stream_format_entry;

use {
    super::*,
    glib::{error::ErrorDomain, Quark},
};

/// Any error of control extension.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CtlExtensionError {
    /// Capability.
    Caps,
    /// Command.
    Cmd,
    /// Mixer.
    Mixer,
    /// Entry of router.
    RouterEntry,
    /// Peak.
    Peak,
    /// Router.
    Router,
    /// Stream format configuration.
    StreamFormat,
    /// Current configurations.
    CurrentConfig,
    /// Stand alone configuration.
    Standalone,
    Invalid(i32),
}

impl std::fmt::Display for CtlExtensionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let msg = match self {
            CtlExtensionError::Caps => "caps",
            CtlExtensionError::Cmd => "command",
            CtlExtensionError::Mixer => "mixer",
            CtlExtensionError::RouterEntry => "router-entry",
            CtlExtensionError::Peak => "peak",
            CtlExtensionError::Router => "router",
            CtlExtensionError::StreamFormat => "stream-format",
            CtlExtensionError::CurrentConfig => "current-config",
            CtlExtensionError::Standalone => "standalone",
            CtlExtensionError::Invalid(_) => "invalid",
        };

        write!(f, "CtlExtensionError::{}", msg)
    }
}

impl ErrorDomain for CtlExtensionError {
    fn domain() -> Quark {
        Quark::from_str("ctl-extension-error-quark")
    }

    fn code(self) -> i32 {
        match self {
            CtlExtensionError::Caps => 0,
            CtlExtensionError::Cmd => 1,
            CtlExtensionError::Mixer => 2,
            CtlExtensionError::RouterEntry => 3,
            CtlExtensionError::Peak => 4,
            CtlExtensionError::Router => 5,
            CtlExtensionError::StreamFormat => 6,
            CtlExtensionError::CurrentConfig => 7,
            CtlExtensionError::Standalone => 8,
            CtlExtensionError::Invalid(v) => v,
        }
    }

    fn from(code: i32) -> Option<Self> {
        let enumeration = match code {
            0 => CtlExtensionError::Caps,
            1 => CtlExtensionError::Cmd,
            2 => CtlExtensionError::Mixer,
            3 => CtlExtensionError::RouterEntry,
            4 => CtlExtensionError::Peak,
            5 => CtlExtensionError::Router,
            6 => CtlExtensionError::StreamFormat,
            7 => CtlExtensionError::CurrentConfig,
            8 => CtlExtensionError::Standalone,
            _ => CtlExtensionError::Invalid(code),
        };
        Some(enumeration)
    }
}

/// The base address of register space of the unit.
const BASE_ADDR: u64 = 0xffffe0000000;

/// The offset of extension space in the register space.
const EXTENSION_OFFSET: u64 = 0x00200000;

/// Section in extension space of the unit.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtensionSection {
    /// The offset of section in extension space.
    pub offset: usize,
    /// The size of section.
    pub size: usize,
}

impl ExtensionSection {
    const SIZE: usize = 8;
}

#[cfg(test)]
fn serialize_extension_section(section: &ExtensionSection, raw: &mut [u8]) -> Result<(), String> {
    assert!(raw.len() >= ExtensionSection::SIZE);

    serialize_u32(&((section.offset / 4) as u32), &mut raw[..4]);
    serialize_u32(&((section.size / 4) as u32), &mut raw[4..8]);

    Ok(())
}

fn deserialize_extension_section(section: &mut ExtensionSection, raw: &[u8]) -> Result<(), String> {
    assert!(raw.len() >= ExtensionSection::SIZE);

    let mut val = 0u32;
    deserialize_u32(&mut val, &raw[..4]);
    section.offset = 4 * val as usize;

    deserialize_u32(&mut val, &raw[4..8]);
    section.size = 4 * val as usize;

    Ok(())
}

/// The set of sections in extension space of the unit.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtensionSections {
    /// Capability.
    pub caps: ExtensionSection,
    /// Command.
    pub cmd: ExtensionSection,
    /// Mixer.
    pub mixer: ExtensionSection,
    /// Peak.
    pub peak: ExtensionSection,
    /// New configuration of router.
    pub new_router: ExtensionSection,
    /// New configuration of stream format.
    pub new_stream_config: ExtensionSection,
    /// Current configurations.
    pub current_config: ExtensionSection,
    /// Stand alone configuration.
    pub standalone: ExtensionSection,
    /// Application specific configurations.
    pub application: ExtensionSection,
}

impl ExtensionSections {
    const SECTION_COUNT: usize = 9;
    const SIZE: usize = ExtensionSection::SIZE * Self::SECTION_COUNT;
}

#[cfg(test)]
fn serialize_extension_sections(
    sections: &ExtensionSections,
    raw: &mut [u8],
) -> Result<(), String> {
    assert!(raw.len() >= ExtensionSections::SIZE);

    serialize_extension_section(&sections.caps, &mut raw[..8])?;
    serialize_extension_section(&sections.cmd, &mut raw[8..16])?;
    serialize_extension_section(&sections.mixer, &mut raw[16..24])?;
    serialize_extension_section(&sections.peak, &mut raw[24..32])?;
    serialize_extension_section(&sections.new_router, &mut raw[32..40])?;
    serialize_extension_section(&sections.new_stream_config, &mut raw[40..48])?;
    serialize_extension_section(&sections.current_config, &mut raw[48..56])?;
    serialize_extension_section(&sections.standalone, &mut raw[56..64])?;
    serialize_extension_section(&sections.application, &mut raw[64..72])?;

    Ok(())
}

fn deserialize_extension_sections(
    sections: &mut ExtensionSections,
    raw: &[u8],
) -> Result<(), String> {
    assert!(raw.len() >= ExtensionSections::SIZE);

    deserialize_extension_section(&mut sections.caps, &raw[..8])?;
    deserialize_extension_section(&mut sections.cmd, &raw[8..16])?;
    deserialize_extension_section(&mut sections.mixer, &raw[16..24])?;
    deserialize_extension_section(&mut sections.peak, &raw[24..32])?;
    deserialize_extension_section(&mut sections.new_router, &raw[32..40])?;
    deserialize_extension_section(&mut sections.new_stream_config, &raw[40..48])?;
    deserialize_extension_section(&mut sections.current_config, &raw[48..56])?;
    deserialize_extension_section(&mut sections.standalone, &raw[56..64])?;
    deserialize_extension_section(&mut sections.application, &raw[64..72])?;

    Ok(())
}

/// Read the layout of sections from the head of extension space.
pub fn read_extension_sections(
    req: &FwReq,
    node: &FwNode,
    sections: &mut ExtensionSections,
    timeout_ms: u32,
) -> Result<(), Error> {
    let mut raw = [0; ExtensionSections::SIZE];
    read_block(
        req,
        node,
        BASE_ADDR + EXTENSION_OFFSET,
        &mut raw,
        timeout_ms,
    )
    .map(|_| deserialize_extension_sections(sections, &raw).unwrap())
}

pub(crate) fn extension_read(
    req: &FwReq,
    node: &FwNode,
    section: &ExtensionSection,
    offset: usize,
    frames: &mut [u8],
    timeout_ms: u32,
) -> Result<(), Error> {
    let addr = BASE_ADDR + EXTENSION_OFFSET + (section.offset + offset) as u64;
    read_block(req, node, addr, frames, timeout_ms)
}

pub(crate) fn extension_write(
    req: &FwReq,
    node: &FwNode,
    section: &ExtensionSection,
    offset: usize,
    frames: &mut [u8],
    timeout_ms: u32,
) -> Result<(), Error> {
    let addr = BASE_ADDR + EXTENSION_OFFSET + (section.offset + offset) as u64;
    write_block(req, node, addr, frames, timeout_ms)
}

/// Identifier of source block.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SrcBlkId {
    Aes,
    Adat,
    Mixer,
    Ins0,
    Ins1,
    ArmAprAudio,
    Avs0,
    Avs1,
    Mute,
    Reserved(u8),
}

impl Default for SrcBlkId {
    fn default() -> Self {
        SrcBlkId::Reserved(0xff)
    }
}

/// Source block in router function.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct SrcBlk {
    pub id: SrcBlkId,
    pub ch: u8,
}

/// Identifier of destination block.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DstBlkId {
    Aes,
    Adat,
    MixerTx0,
    MixerTx1,
    Ins0,
    Ins1,
    ArmApbAudio,
    Avs0,
    Avs1,
    Reserved(u8),
}

impl Default for DstBlkId {
    fn default() -> Self {
        DstBlkId::Reserved(0xff)
    }
}

/// Destination block in router function.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct DstBlk {
    pub id: DstBlkId,
    pub ch: u8,
}

/// Entry of route in router function.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct RouterEntry {
    /// The destination of the route.
    pub dst: DstBlk,
    /// The source of the route.
    pub src: SrcBlk,
    /// The latest peak level detected in the route.
    pub peak: u16,
}

/// Entry of stream format in current configuration.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct FormatEntry {
    /// The number of channels for PCM frame.
    pub pcm_count: u8,
    /// The number of ports for MIDI message.
    pub midi_count: u8,
    /// The name of each channel.
    pub labels: Vec<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn section_layout_serdes() {
        let raw = [
            0x00, 0x00, 0x00, 0x11, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x0f, 0x00, 0x00,
            0x00, 0x0e, 0x00, 0x00, 0x00, 0x0d, 0x00, 0x00, 0x00, 0x0c, 0x00, 0x00, 0x00, 0x0b,
            0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00,
            0x00, 0x07, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x04,
            0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x00,
        ];
        let space = ExtensionSections {
            caps: ExtensionSection {
                offset: 0x44,
                size: 0x40,
            },
            cmd: ExtensionSection {
                offset: 0x3c,
                size: 0x38,
            },
            mixer: ExtensionSection {
                offset: 0x34,
                size: 0x30,
            },
            peak: ExtensionSection {
                offset: 0x2c,
                size: 0x28,
            },
            new_router: ExtensionSection {
                offset: 0x24,
                size: 0x20,
            },
            new_stream_config: ExtensionSection {
                offset: 0x1c,
                size: 0x18,
            },
            current_config: ExtensionSection {
                offset: 0x14,
                size: 0x10,
            },
            standalone: ExtensionSection {
                offset: 0x0c,
                size: 0x08,
            },
            application: ExtensionSection {
                offset: 0x04,
                size: 0x00,
            },
        };

        let mut r = vec![0u8; raw.len()];
        serialize_extension_sections(&space, &mut r).unwrap();
        assert_eq!(&raw[..], &r);

        let mut s = ExtensionSections::default();
        deserialize_extension_sections(&mut s, &raw).unwrap();
        assert_eq!(space, s);
    }
}
