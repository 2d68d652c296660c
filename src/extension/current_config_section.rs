// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Current configuration section in control extension.
//!
//! The section reports the configurations which the unit actually applies at each mode of
//! sampling transfer frequency, regardless of which software loaded them.

use super::{caps_section::*, cmd_section::*, router_entry::*, stream_format_entry::*, *};

const LOW_ROUTER_CONFIG_OFFSET: usize = 0x0000;
const LOW_STREAM_CONFIG_OFFSET: usize = 0x1000;
const MID_ROUTER_CONFIG_OFFSET: usize = 0x2000;
const MID_STREAM_CONFIG_OFFSET: usize = 0x3000;
const HIGH_ROUTER_CONFIG_OFFSET: usize = 0x4000;
const HIGH_STREAM_CONFIG_OFFSET: usize = 0x5000;

/// Read route entries which the unit currently applies at the given rate mode.
pub fn read_current_router_entries(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    rate_mode: RateMode,
    entries: &mut Vec<RouterEntry>,
    timeout_ms: u32,
) -> Result<(), Error> {
    if !caps.router.is_exposed {
        Err(Error::new(
            CtlExtensionError::CurrentConfig,
            "Router configuration is not exposed",
        ))?;
    }

    let offset = match rate_mode {
        RateMode::Low => LOW_ROUTER_CONFIG_OFFSET,
        RateMode::Middle => MID_ROUTER_CONFIG_OFFSET,
        RateMode::High => HIGH_ROUTER_CONFIG_OFFSET,
    };

    let mut raw = vec![0u8; 4];
    extension_read(
        req,
        node,
        &sections.current_config,
        offset,
        &mut raw,
        timeout_ms,
    )
    .map_err(|e| Error::new(CtlExtensionError::CurrentConfig, &e.to_string()))?;

    let mut val = 0u32;
    deserialize_u32(&mut val, &raw[..4]);

    let entry_count = std::cmp::min(val as usize, caps.router.maximum_entry_count as usize);
    entries.resize_with(entry_count, Default::default);
    raw.resize_with(
        4 + calculate_router_entries_size(entry_count),
        Default::default,
    );

    extension_read(
        req,
        node,
        &sections.current_config,
        offset + 4,
        &mut raw[4..],
        timeout_ms,
    )
    .map_err(|e| Error::new(CtlExtensionError::CurrentConfig, &e.to_string()))?;

    deserialize_router_entries(entries, &raw[4..])
        .map_err(|cause| Error::new(CtlExtensionError::CurrentConfig, &cause))
}

/// Read stream format entries which the unit currently applies at the given rate mode.
pub fn read_current_stream_format_entries(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    rate_mode: RateMode,
    (tx_entries, rx_entries): (&mut Vec<FormatEntry>, &mut Vec<FormatEntry>),
    timeout_ms: u32,
) -> Result<(), Error> {
    let offset = match rate_mode {
        RateMode::Low => LOW_STREAM_CONFIG_OFFSET,
        RateMode::Middle => MID_STREAM_CONFIG_OFFSET,
        RateMode::High => HIGH_STREAM_CONFIG_OFFSET,
    };

    let size = calculate_stream_format_entries_size(
        caps.general.max_tx_streams as usize,
        caps.general.max_rx_streams as usize,
    );
    let mut raw = vec![0u8; size];
    extension_read(
        req,
        node,
        &sections.current_config,
        offset,
        &mut raw,
        timeout_ms,
    )
    .map_err(|e| Error::new(CtlExtensionError::CurrentConfig, &e.to_string()))?;

    deserialize_stream_format_entries((tx_entries, rx_entries), &raw)
        .map_err(|cause| Error::new(CtlExtensionError::CurrentConfig, &cause))
}
