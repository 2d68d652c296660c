// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Peak section in control extension.
//!
//! The section mirrors the layout of route entries with the latest peak level detected for
//! each of them. The read is a pure snapshot and mutates nothing in the unit.

use super::{caps_section::*, router_entry::*, *};

/// Read peak entries. The entries follow the layout of route entries.
pub fn read_peak_entries(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    timeout_ms: u32,
) -> Result<Vec<RouterEntry>, Error> {
    if !caps.general.peak_avail {
        Err(Error::new(CtlExtensionError::Peak, "Peak is not available"))?
    }

    let entry_count = std::cmp::min(
        caps.router.maximum_entry_count as usize,
        sections.peak.size / 4,
    );
    let mut entries = vec![RouterEntry::default(); entry_count];

    let mut raw = vec![0u8; calculate_router_entries_size(entry_count)];
    extension_read(req, node, &sections.peak, 0, &mut raw, timeout_ms)
        .map_err(|e| Error::new(CtlExtensionError::Peak, &e.to_string()))?;

    deserialize_router_entries(&mut entries, &raw)
        .map_err(|cause| Error::new(CtlExtensionError::Peak, &cause))
        .map(|_| entries)
}
