// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! New router section in control extension.
//!
//! The section carries the list of route entries to be loaded by the load command; the first
//! quadlet is the number of entries, followed by one quadlet per entry.

use super::{caps_section::*, router_entry::*, *};

/// Read from new router section and deserialize entries.
pub fn read_router_whole_entries(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    entries: &mut Vec<RouterEntry>,
    timeout_ms: u32,
) -> Result<(), Error> {
    if !caps.router.is_exposed {
        Err(Error::new(
            CtlExtensionError::Router,
            "Router configuration is not exposed",
        ))?
    }

    let size = 4 + calculate_router_entries_size(caps.router.maximum_entry_count as usize);
    let size = std::cmp::min(sections.new_router.size, size);
    let mut raw = vec![0u8; size];

    extension_read(req, node, &sections.new_router, 0, &mut raw, timeout_ms)
        .map_err(|e| Error::new(CtlExtensionError::Router, &e.to_string()))?;

    let mut val = 0u32;
    deserialize_u32(&mut val, &raw[..4]);
    let entry_count = std::cmp::min(val as usize, (raw.len() - 4) / 4);
    entries.resize_with(entry_count, Default::default);

    deserialize_router_entries(entries, &raw[4..])
        .map_err(|cause| Error::new(CtlExtensionError::Router, &cause))
}

/// Serialize entries and write to new router section.
pub fn write_router_whole_entries(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    entries: &[RouterEntry],
    timeout_ms: u32,
) -> Result<(), Error> {
    if !caps.router.is_exposed || caps.router.is_readonly {
        Err(Error::new(
            CtlExtensionError::Router,
            "Router configuration is immutable",
        ))?
    }

    if entries.len() >= caps.router.maximum_entry_count as usize {
        let msg = format!(
            "The number of router entries should be less than {}, but {} given",
            caps.router.maximum_entry_count,
            entries.len(),
        );
        Err(Error::new(CtlExtensionError::Router, &msg))?;
    }

    let size = 4 + calculate_router_entries_size(entries.len());
    let mut raw = vec![0u8; size];

    serialize_u32(&(entries.len() as u32), &mut raw[..4]);
    serialize_router_entries(entries, &mut raw[4..])
        .map_err(|cause| Error::new(CtlExtensionError::Router, &cause))?;

    extension_write(req, node, &sections.new_router, 0, &mut raw, timeout_ms)
}
