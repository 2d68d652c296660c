// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Capability section in control extension.
//!
//! The section is the runtime half of the capability descriptor; it reports which of router,
//! mixer, and general functions are exposed, mutable, and storable in on-board flash memory.

use super::*;

/// Capability of router function.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct RouterCaps {
    /// Whether router configuration is exposed to owner software.
    pub is_exposed: bool,
    /// Whether router configuration is read only.
    pub is_readonly: bool,
    /// Whether router configuration is storable in on-board flash memory.
    pub is_storable: bool,
    /// The maximum number of entries for router.
    pub maximum_entry_count: u16,
}

impl RouterCaps {
    const SIZE: usize = 4;

    const IS_EXPOSED_FLAG: u32 = 0x00000001;
    const IS_READONLY_FLAG: u32 = 0x00000002;
    const IS_STORABLE_FLAG: u32 = 0x00000004;
    const MAX_ENTRY_COUNT_MASK: u32 = 0xffff0000;
    const MAX_ENTRY_COUNT_SHIFT: usize = 16;
}

#[cfg(test)]
fn serialize_router_caps(caps: &RouterCaps, raw: &mut [u8]) -> Result<(), String> {
    assert!(raw.len() >= RouterCaps::SIZE);

    let mut val = 0u32;
    if caps.is_exposed {
        val |= RouterCaps::IS_EXPOSED_FLAG;
    }
    if caps.is_readonly {
        val |= RouterCaps::IS_READONLY_FLAG;
    }
    if caps.is_storable {
        val |= RouterCaps::IS_STORABLE_FLAG;
    }
    val |= (caps.maximum_entry_count as u32) << RouterCaps::MAX_ENTRY_COUNT_SHIFT;

    serialize_u32(&val, raw);

    Ok(())
}

fn deserialize_router_caps(caps: &mut RouterCaps, raw: &[u8]) -> Result<(), String> {
    assert!(raw.len() >= RouterCaps::SIZE);

    let mut val = 0u32;
    deserialize_u32(&mut val, raw);

    caps.is_exposed = val & RouterCaps::IS_EXPOSED_FLAG > 0;
    caps.is_readonly = val & RouterCaps::IS_READONLY_FLAG > 0;
    caps.is_storable = val & RouterCaps::IS_STORABLE_FLAG > 0;
    caps.maximum_entry_count =
        ((val & RouterCaps::MAX_ENTRY_COUNT_MASK) >> RouterCaps::MAX_ENTRY_COUNT_SHIFT) as u16;

    Ok(())
}

/// Capability of mixer function.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct MixerCaps {
    /// Whether mixer configuration is exposed to owner software.
    pub is_exposed: bool,
    /// Whether mixer configuration is read only.
    pub is_readonly: bool,
    /// Whether mixer configuration is storable in on-board flash memory.
    pub is_storable: bool,
    /// The numeric identifier of input device.
    pub input_device_id: u8,
    /// The numeric identifier of output device.
    pub output_device_id: u8,
    /// The number of input channels.
    pub input_count: u8,
    /// The number of output channels.
    pub output_count: u8,
}

impl MixerCaps {
    const SIZE: usize = 4;

    const IS_EXPOSED_FLAG: u32 = 0x00000001;
    const IS_READONLY_FLAG: u32 = 0x00000002;
    const IS_STORABLE_FLAG: u32 = 0x00000004;

    const INPUT_DEVICE_ID_MASK: u32 = 0x000000f0;
    const OUTPUT_DEVICE_ID_MASK: u32 = 0x00000f00;

    const INPUT_DEVICE_ID_SHIFT: usize = 4;
    const OUTPUT_DEVICE_ID_SHIFT: usize = 8;

    const INPUT_COUNT_MASK: u32 = 0x00ff0000;
    const OUTPUT_COUNT_MASK: u32 = 0xff000000;

    const INPUT_COUNT_SHIFT: usize = 16;
    const OUTPUT_COUNT_SHIFT: usize = 24;
}

#[cfg(test)]
fn serialize_mixer_caps(caps: &MixerCaps, raw: &mut [u8]) -> Result<(), String> {
    assert!(raw.len() >= MixerCaps::SIZE);

    let mut val = 0u32;
    if caps.is_exposed {
        val |= MixerCaps::IS_EXPOSED_FLAG;
    }
    if caps.is_readonly {
        val |= MixerCaps::IS_READONLY_FLAG;
    }
    if caps.is_storable {
        val |= MixerCaps::IS_STORABLE_FLAG;
    }
    val |= (caps.input_device_id as u32) << MixerCaps::INPUT_DEVICE_ID_SHIFT;
    val |= (caps.output_device_id as u32) << MixerCaps::OUTPUT_DEVICE_ID_SHIFT;
    val |= (caps.input_count as u32) << MixerCaps::INPUT_COUNT_SHIFT;
    val |= (caps.output_count as u32) << MixerCaps::OUTPUT_COUNT_SHIFT;

    serialize_u32(&val, raw);

    Ok(())
}

fn deserialize_mixer_caps(caps: &mut MixerCaps, raw: &[u8]) -> Result<(), String> {
    assert!(raw.len() >= MixerCaps::SIZE);

    let mut val = 0u32;
    deserialize_u32(&mut val, raw);

    caps.is_exposed = val & MixerCaps::IS_EXPOSED_FLAG > 0;
    caps.is_readonly = val & MixerCaps::IS_READONLY_FLAG > 0;
    caps.is_storable = val & MixerCaps::IS_STORABLE_FLAG > 0;
    caps.input_device_id =
        ((val & MixerCaps::INPUT_DEVICE_ID_MASK) >> MixerCaps::INPUT_DEVICE_ID_SHIFT) as u8;
    caps.output_device_id =
        ((val & MixerCaps::OUTPUT_DEVICE_ID_MASK) >> MixerCaps::OUTPUT_DEVICE_ID_SHIFT) as u8;
    caps.input_count = ((val & MixerCaps::INPUT_COUNT_MASK) >> MixerCaps::INPUT_COUNT_SHIFT) as u8;
    caps.output_count =
        ((val & MixerCaps::OUTPUT_COUNT_MASK) >> MixerCaps::OUTPUT_COUNT_SHIFT) as u8;

    Ok(())
}

/// Capability of general function.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct GeneralCaps {
    /// Whether stream format configuration is mutable dynamically.
    pub dynamic_stream_format: bool,
    /// Whether on-board flash memory is available.
    pub storage_avail: bool,
    /// Whether peak section is available.
    pub peak_avail: bool,
    /// The maximum number of tx streams.
    pub max_tx_streams: u8,
    /// The maximum number of rx streams.
    pub max_rx_streams: u8,
    /// Whether stream format configuration is storable in on-board flash memory.
    pub stream_format_is_storable: bool,
}

impl GeneralCaps {
    const SIZE: usize = 4;

    const DYNAMIC_STREAM_CONF_FLAG: u32 = 0x00000001;
    const STORAGE_AVAIL_FLAG: u32 = 0x00000002;
    const PEAK_AVAIL_FLAG: u32 = 0x00000004;

    const MAX_TX_STREAMS_MASK: u32 = 0x000000f0;
    const MAX_RX_STREAMS_MASK: u32 = 0x00000f00;

    const MAX_TX_STREAMS_SHIFT: usize = 4;
    const MAX_RX_STREAMS_SHIFT: usize = 8;

    const STREAM_CONF_IS_STORABLE_FLAG: u32 = 0x00001000;
}

#[cfg(test)]
fn serialize_general_caps(caps: &GeneralCaps, raw: &mut [u8]) -> Result<(), String> {
    assert!(raw.len() >= GeneralCaps::SIZE);

    let mut val = 0u32;
    if caps.dynamic_stream_format {
        val |= GeneralCaps::DYNAMIC_STREAM_CONF_FLAG;
    }
    if caps.storage_avail {
        val |= GeneralCaps::STORAGE_AVAIL_FLAG;
    }
    if caps.peak_avail {
        val |= GeneralCaps::PEAK_AVAIL_FLAG;
    }
    val |= (caps.max_tx_streams as u32) << GeneralCaps::MAX_TX_STREAMS_SHIFT;
    val |= (caps.max_rx_streams as u32) << GeneralCaps::MAX_RX_STREAMS_SHIFT;
    if caps.stream_format_is_storable {
        val |= GeneralCaps::STREAM_CONF_IS_STORABLE_FLAG;
    }

    serialize_u32(&val, raw);

    Ok(())
}

fn deserialize_general_caps(caps: &mut GeneralCaps, raw: &[u8]) -> Result<(), String> {
    assert!(raw.len() >= GeneralCaps::SIZE);

    let mut val = 0u32;
    deserialize_u32(&mut val, raw);

    caps.dynamic_stream_format = val & GeneralCaps::DYNAMIC_STREAM_CONF_FLAG > 0;
    caps.storage_avail = val & GeneralCaps::STORAGE_AVAIL_FLAG > 0;
    caps.peak_avail = val & GeneralCaps::PEAK_AVAIL_FLAG > 0;
    caps.max_tx_streams =
        ((val & GeneralCaps::MAX_TX_STREAMS_MASK) >> GeneralCaps::MAX_TX_STREAMS_SHIFT) as u8;
    caps.max_rx_streams =
        ((val & GeneralCaps::MAX_RX_STREAMS_MASK) >> GeneralCaps::MAX_RX_STREAMS_SHIFT) as u8;
    caps.stream_format_is_storable = val & GeneralCaps::STREAM_CONF_IS_STORABLE_FLAG > 0;

    Ok(())
}

/// Capabilities of each function.
#[derive(Default, Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExtensionCaps {
    /// Capabilities for router function.
    pub router: RouterCaps,
    /// Capabilities for mixer function.
    pub mixer: MixerCaps,
    /// Capabilities for general function.
    pub general: GeneralCaps,
}

impl ExtensionCaps {
    const SIZE: usize = RouterCaps::SIZE + MixerCaps::SIZE + GeneralCaps::SIZE;
}

#[cfg(test)]
fn serialize_extension_caps(caps: &ExtensionCaps, raw: &mut [u8]) -> Result<(), String> {
    assert!(raw.len() >= ExtensionCaps::SIZE);

    serialize_router_caps(&caps.router, &mut raw[..4])?;
    serialize_mixer_caps(&caps.mixer, &mut raw[4..8])?;
    serialize_general_caps(&caps.general, &mut raw[8..12])?;

    Ok(())
}

fn deserialize_extension_caps(caps: &mut ExtensionCaps, raw: &[u8]) -> Result<(), String> {
    assert!(raw.len() >= ExtensionCaps::SIZE);

    deserialize_router_caps(&mut caps.router, &raw[..4])?;
    deserialize_mixer_caps(&mut caps.mixer, &raw[4..8])?;
    deserialize_general_caps(&mut caps.general, &raw[8..12])?;

    Ok(())
}

/// Read capabilities from the capability section.
pub fn read_extension_caps(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    timeout_ms: u32,
) -> Result<ExtensionCaps, Error> {
    let mut raw = vec![0; ExtensionCaps::SIZE];
    extension_read(req, node, &sections.caps, 0, &mut raw, timeout_ms)
        .map_err(|e| Error::new(CtlExtensionError::Caps, &e.to_string()))?;

    let mut caps = ExtensionCaps::default();
    deserialize_extension_caps(&mut caps, &raw)
        .map_err(|cause| Error::new(CtlExtensionError::Caps, &cause))?;

    Ok(caps)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn caps_serdes() {
        let raw = [
            0xff, 0x00, 0x00, 0x07, 0x23, 0x12, 0x0c, 0xe7, 0x00, 0x00, 0x1b, 0xa7,
        ];
        let caps = ExtensionCaps {
            router: RouterCaps {
                is_exposed: true,
                is_readonly: true,
                is_storable: true,
                maximum_entry_count: 0xff00,
            },
            mixer: MixerCaps {
                is_exposed: true,
                is_readonly: true,
                is_storable: true,
                input_device_id: 0x0e,
                output_device_id: 0x0c,
                input_count: 0x12,
                output_count: 0x23,
            },
            general: GeneralCaps {
                dynamic_stream_format: true,
                storage_avail: true,
                peak_avail: true,
                max_tx_streams: 0x0a,
                max_rx_streams: 0x0b,
                stream_format_is_storable: true,
            },
        };
        let mut r = vec![0u8; ExtensionCaps::SIZE];
        serialize_extension_caps(&caps, &mut r).unwrap();
        assert_eq!(&raw[..], &r);

        let mut c = ExtensionCaps::default();
        deserialize_extension_caps(&mut c, &raw).unwrap();
        assert_eq!(caps, c);
    }
}
