// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

use super::*;

impl FormatEntry {
    const SIZE: usize = 268;

    const NAMES_SIZE: usize = 256;
}

// Texts in the register space are aligned to quadlet in the endianness of ARM core of the
// unit; swap bytes per quadlet.
fn swap_quadlet_bytes(raw: &mut [u8]) {
    let mut quadlet = [0; 4];
    (0..(raw.len() / 4)).for_each(|i| {
        let pos = i * 4;
        quadlet.copy_from_slice(&raw[pos..(pos + 4)]);
        quadlet.reverse();
        raw[pos..(pos + 4)].copy_from_slice(&quadlet);
    });
}

#[cfg(test)]
fn build_labels(labels: &[String], len: usize) -> Vec<u8> {
    let mut raw = Vec::with_capacity(len);
    labels.iter().for_each(|label| {
        raw.extend_from_slice(label.as_bytes());
        raw.push(b'\\');
    });
    raw.push(b'\\');
    raw.resize(len, 0x00);
    swap_quadlet_bytes(&mut raw);
    raw
}

fn parse_labels(raw: &[u8]) -> Result<Vec<String>, std::str::Utf8Error> {
    let mut raw = raw.to_vec();
    swap_quadlet_bytes(&mut raw);

    let mut labels = Vec::new();
    raw.split(|&b| b == b'\\')
        .filter(|chunk| chunk.len() > 0 && chunk[0] != 0x00)
        .try_for_each(|chunk| {
            std::str::from_utf8(&chunk).map(|label| labels.push(label.to_string()))
        })?;

    Ok(labels)
}

#[cfg(test)]
fn serialize_stream_format_entry(entry: &FormatEntry, raw: &mut [u8]) -> Result<(), String> {
    assert!(raw.len() >= FormatEntry::SIZE);

    serialize_u32(&(entry.pcm_count as u32), &mut raw[..4]);
    serialize_u32(&(entry.midi_count as u32), &mut raw[4..8]);

    let names = build_labels(&entry.labels, FormatEntry::NAMES_SIZE);
    raw[8..264].copy_from_slice(&names);

    Ok(())
}

fn deserialize_stream_format_entry(entry: &mut FormatEntry, raw: &[u8]) -> Result<(), String> {
    assert!(raw.len() >= FormatEntry::SIZE);

    let mut val = 0u32;
    deserialize_u32(&mut val, &raw[..4]);
    entry.pcm_count = val as u8;

    deserialize_u32(&mut val, &raw[4..8]);
    entry.midi_count = val as u8;

    entry.labels = parse_labels(&raw[8..264]).map_err(|err| err.to_string())?;

    Ok(())
}

pub(crate) fn calculate_stream_format_entries_size(
    tx_entry_count: usize,
    rx_entry_count: usize,
) -> usize {
    8 + (tx_entry_count + rx_entry_count) * FormatEntry::SIZE
}

pub(crate) fn deserialize_stream_format_entries(
    (tx_entries, rx_entries): (&mut Vec<FormatEntry>, &mut Vec<FormatEntry>),
    raw: &[u8],
) -> Result<(), String> {
    let mut val = 0u32;
    deserialize_u32(&mut val, &raw[..4]);
    let tx_entry_count = val as usize;

    deserialize_u32(&mut val, &raw[4..8]);
    let rx_entry_count = val as usize;

    if raw.len() < calculate_stream_format_entries_size(tx_entry_count, rx_entry_count) {
        Err(format!(
            "Size of data is not enough for {} tx and {} rx entries",
            tx_entry_count, rx_entry_count
        ))?;
    }

    tx_entries.resize_with(tx_entry_count, Default::default);
    rx_entries.resize_with(rx_entry_count, Default::default);

    tx_entries
        .iter_mut()
        .chain(rx_entries)
        .enumerate()
        .try_for_each(|(i, entry)| {
            let pos = 8 + i * FormatEntry::SIZE;
            deserialize_stream_format_entry(entry, &raw[pos..(pos + FormatEntry::SIZE)])
        })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stream_format_entry_serdes() {
        let entry = FormatEntry {
            pcm_count: 0x10,
            midi_count: 0x01,
            labels: vec![
                "Analog 1".to_string(),
                "Analog 2".to_string(),
                "SPDIF 1".to_string(),
            ],
        };

        let mut raw = vec![0u8; FormatEntry::SIZE];
        serialize_stream_format_entry(&entry, &mut raw).unwrap();

        let mut e = FormatEntry::default();
        deserialize_stream_format_entry(&mut e, &raw).unwrap();

        assert_eq!(entry, e);
    }
}
