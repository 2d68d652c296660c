// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Mixer section in control extension.
//!
//! The section exposes one saturation bitmap and the matrix of gain coefficients, one quadlet
//! per pair of output and input channel. The coefficient is linear against full scale of
//! 0x80000000; zero is assigned to the floor of -144.0 dB.

use super::{caps_section::*, *};

const SATURATION_OFFSET: usize = 0x00;
const COEFF_OFFSET: usize = 0x04;

/// The minimum value of gain in dB, assigned to the coefficient of zero.
pub const GAIN_MIN_DB: f64 = -144.0;

/// The maximum value of gain coefficient.
pub const GAIN_COEFF_MAX: u32 = 0x7fffffff;

const GAIN_COEFF_SCALE: f64 = 0x80000000u32 as f64;

/// Parse linear gain coefficient to the value in dB.
pub fn parse_coeff_to_db(coeff: u32) -> f64 {
    if coeff == 0 {
        GAIN_MIN_DB
    } else {
        20.0 * ((coeff as f64) / GAIN_COEFF_SCALE).log10()
    }
}

/// Build linear gain coefficient from the value in dB, clamped into the supported range.
pub fn build_coeff_from_db(db: f64) -> u32 {
    if db <= GAIN_MIN_DB {
        0
    } else if db >= 0.0 {
        GAIN_COEFF_MAX
    } else {
        (GAIN_COEFF_SCALE * (10.0f64).powf(db / 20.0)) as u32
    }
}

fn calculate_coeff_offset(
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    dst_ch: u8,
    src_ch: u8,
) -> Result<usize, Error> {
    if dst_ch >= caps.mixer.output_count {
        let msg = format!("Invalid argument for output channel: {}", dst_ch);
        Err(Error::new(FileError::Inval, &msg))?;
    }
    if src_ch >= caps.mixer.input_count {
        let msg = format!("Invalid argument for input channel: {}", src_ch);
        Err(Error::new(FileError::Inval, &msg))?;
    }

    let offset = (dst_ch as usize * caps.mixer.input_count as usize + src_ch as usize) * 4;
    if COEFF_OFFSET + offset + 4 > sections.mixer.size {
        Err(Error::new(
            CtlExtensionError::Mixer,
            "Inconsistency between channels and size of section",
        ))?;
    }

    Ok(COEFF_OFFSET + offset)
}

/// Read the bitmap of saturation, one bit per output channel.
pub fn read_saturation(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    timeout_ms: u32,
) -> Result<Vec<bool>, Error> {
    if !caps.mixer.is_exposed {
        Err(Error::new(
            CtlExtensionError::Mixer,
            "Mixer is not available",
        ))?
    }

    let mut raw = [0; 4];
    extension_read(
        req,
        node,
        &sections.mixer,
        SATURATION_OFFSET,
        &mut raw,
        timeout_ms,
    )
    .map_err(|e| Error::new(CtlExtensionError::Mixer, &e.to_string()))?;

    let mut val = 0u32;
    deserialize_u32(&mut val, &raw);

    let saturations = (0..caps.mixer.output_count)
        .map(|i| val & (1 << i) > 0)
        .collect();

    Ok(saturations)
}

/// Read single gain coefficient for the pair of output and input channel.
pub fn read_gain_coeff(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    dst_ch: u8,
    src_ch: u8,
    timeout_ms: u32,
) -> Result<u32, Error> {
    if !caps.mixer.is_exposed {
        Err(Error::new(
            CtlExtensionError::Mixer,
            "Mixer is not available",
        ))?
    }

    let offset = calculate_coeff_offset(sections, caps, dst_ch, src_ch)?;

    let mut raw = [0; 4];
    extension_read(req, node, &sections.mixer, offset, &mut raw, timeout_ms)
        .map_err(|e| Error::new(CtlExtensionError::Mixer, &e.to_string()))?;

    let mut val = 0u32;
    deserialize_u32(&mut val, &raw);
    Ok(val)
}

/// Write single gain coefficient for the pair of output and input channel.
pub fn write_gain_coeff(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    dst_ch: u8,
    src_ch: u8,
    coeff: u32,
    timeout_ms: u32,
) -> Result<(), Error> {
    if !caps.mixer.is_exposed || caps.mixer.is_readonly {
        Err(Error::new(
            CtlExtensionError::Mixer,
            "Mixer is immutable",
        ))?
    }

    let offset = calculate_coeff_offset(sections, caps, dst_ch, src_ch)?;

    let mut raw = [0; 4];
    serialize_u32(&coeff, &mut raw);
    extension_write(req, node, &sections.mixer, offset, &mut raw, timeout_ms)
        .map_err(|e| Error::new(CtlExtensionError::Mixer, &e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gain_db_round_trip() {
        [-120.0f64, -60.0, -20.0, -6.0, -0.5]
            .iter()
            .for_each(|&db| {
                let coeff = build_coeff_from_db(db);
                let d = parse_coeff_to_db(coeff);
                assert!((db - d).abs() < 0.01);
            });
    }

    #[test]
    fn gain_db_floor() {
        assert_eq!(parse_coeff_to_db(0), GAIN_MIN_DB);
        assert_eq!(build_coeff_from_db(GAIN_MIN_DB), 0);
        assert_eq!(build_coeff_from_db(-200.0), 0);
        assert_eq!(build_coeff_from_db(10.0), GAIN_COEFF_MAX);
    }
}
