// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Standalone section in control extension.
//!
//! The section configures the unit for operation without the bus; the source of sampling clock
//! is expressed by the byte alias defined per model, with parameters per source.

use super::*;

/// Parameter of ADAT input/output.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum AdatParam {
    Normal,
    Smux2,
    Smux4,
    Auto,
}

impl Default for AdatParam {
    fn default() -> Self {
        AdatParam::Auto
    }
}

impl std::fmt::Display for AdatParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            AdatParam::Normal => "normal",
            AdatParam::Smux2 => "S/MUX-2",
            AdatParam::Smux4 => "S/MUX-4",
            AdatParam::Auto => "auto",
        };
        write!(f, "{}", label)
    }
}

/// Mode of word clock input/output.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WordClockMode {
    Normal,
    Low,
    Middle,
    High,
}

impl Default for WordClockMode {
    fn default() -> Self {
        WordClockMode::Normal
    }
}

impl std::fmt::Display for WordClockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WordClockMode::Normal => "normal",
            WordClockMode::Low => "low",
            WordClockMode::Middle => "middle",
            WordClockMode::High => "high",
        };
        write!(f, "{}", label)
    }
}

/// Rate of word clock input/output by numerator and denominator.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct WordClockRate {
    pub numerator: u16,
    pub denominator: u16,
}

impl Default for WordClockRate {
    fn default() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
        }
    }
}

/// Parameter of word clock input/output.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq)]
pub struct WordClockParam {
    pub mode: WordClockMode,
    pub rate: WordClockRate,
}

/// Parameters in standalone section.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct StandaloneParameters {
    /// The byte alias of clock source, defined per model.
    pub clock_source: u8,
    /// Mode of AES input at high rate.
    pub aes_high_rate: bool,
    /// Mode of ADAT input for supported rates.
    pub adat_mode: AdatParam,
    /// Mode of word clock input.
    pub word_clock_param: WordClockParam,
    /// The index of internally generated sampling clock rate.
    pub internal_rate_index: u8,
}

const MIN_SIZE: usize = 20;

const CLOCK_SOURCE_OFFSET: usize = 0x00;

fn serialize_standalone_parameters(
    params: &StandaloneParameters,
    raw: &mut [u8],
) -> Result<(), String> {
    assert!(raw.len() >= MIN_SIZE);

    serialize_u32(&(params.clock_source as u32), &mut raw[..4]);

    serialize_u32(&(params.aes_high_rate as u32), &mut raw[4..8]);

    let val = match params.adat_mode {
        AdatParam::Normal => 0x00u32,
        AdatParam::Smux2 => 0x01,
        AdatParam::Smux4 => 0x02,
        AdatParam::Auto => 0x03,
    };
    serialize_u32(&val, &mut raw[8..12]);

    let mut val = match params.word_clock_param.mode {
        WordClockMode::Normal => 0x00u32,
        WordClockMode::Low => 0x01,
        WordClockMode::Middle => 0x02,
        WordClockMode::High => 0x03,
    };
    if params.word_clock_param.rate.numerator < 1 || params.word_clock_param.rate.denominator < 1 {
        let msg = format!(
            "Invalid parameters for rate of word clock: {} / {}",
            params.word_clock_param.rate.numerator, params.word_clock_param.rate.denominator
        );
        Err(msg)?;
    }
    val |= ((params.word_clock_param.rate.numerator as u32) - 1) << 4;
    val |= ((params.word_clock_param.rate.denominator as u32) - 1) << 16;
    serialize_u32(&val, &mut raw[12..16]);

    serialize_u32(&(params.internal_rate_index as u32), &mut raw[16..20]);

    Ok(())
}

fn deserialize_standalone_parameters(
    params: &mut StandaloneParameters,
    raw: &[u8],
) -> Result<(), String> {
    assert!(raw.len() >= MIN_SIZE);

    let mut val = 0u32;

    deserialize_u32(&mut val, &raw[..4]);
    params.clock_source = val as u8;

    deserialize_u32(&mut val, &raw[4..8]);
    params.aes_high_rate = val > 0;

    deserialize_u32(&mut val, &raw[8..12]);
    params.adat_mode = match val & 0x03 {
        0x01 => AdatParam::Smux2,
        0x02 => AdatParam::Smux4,
        0x03 => AdatParam::Auto,
        _ => AdatParam::Normal,
    };

    deserialize_u32(&mut val, &raw[12..16]);
    params.word_clock_param.mode = match val & 0x03 {
        0x01 => WordClockMode::Low,
        0x02 => WordClockMode::Middle,
        0x03 => WordClockMode::High,
        _ => WordClockMode::Normal,
    };
    params.word_clock_param.rate.numerator = 1 + ((val >> 4) & 0x0fff) as u16;
    params.word_clock_param.rate.denominator = 1 + ((val >> 16) & 0xffff) as u16;

    deserialize_u32(&mut val, &raw[16..20]);
    params.internal_rate_index = val as u8;

    Ok(())
}

/// Read the whole parameters from the standalone section.
pub fn read_standalone_parameters(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    params: &mut StandaloneParameters,
    timeout_ms: u32,
) -> Result<(), Error> {
    let mut raw = vec![0u8; MIN_SIZE];
    extension_read(req, node, &sections.standalone, 0, &mut raw, timeout_ms)
        .map_err(|e| Error::new(CtlExtensionError::Standalone, &e.to_string()))?;

    deserialize_standalone_parameters(params, &raw)
        .map_err(|cause| Error::new(CtlExtensionError::Standalone, &cause))
}

/// Write the whole parameters to the standalone section.
pub fn write_standalone_parameters(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    params: &StandaloneParameters,
    timeout_ms: u32,
) -> Result<(), Error> {
    let mut raw = vec![0u8; MIN_SIZE];
    serialize_standalone_parameters(params, &mut raw)
        .map_err(|cause| Error::new(CtlExtensionError::Standalone, &cause))?;

    extension_write(req, node, &sections.standalone, 0, &mut raw, timeout_ms)
        .map_err(|e| Error::new(CtlExtensionError::Standalone, &e.to_string()))
}

/// Read the byte alias of clock source from the standalone section.
pub fn read_standalone_clock_source(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    timeout_ms: u32,
) -> Result<u8, Error> {
    let mut raw = [0u8; 4];
    extension_read(
        req,
        node,
        &sections.standalone,
        CLOCK_SOURCE_OFFSET,
        &mut raw,
        timeout_ms,
    )
    .map_err(|e| Error::new(CtlExtensionError::Standalone, &e.to_string()))?;

    let mut val = 0u32;
    deserialize_u32(&mut val, &raw);
    Ok(val as u8)
}

/// Write the byte alias of clock source to the standalone section.
pub fn write_standalone_clock_source(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    alias: u8,
    timeout_ms: u32,
) -> Result<(), Error> {
    let mut raw = [0u8; 4];
    serialize_u32(&(alias as u32), &mut raw);
    extension_write(
        req,
        node,
        &sections.standalone,
        CLOCK_SOURCE_OFFSET,
        &mut raw,
        timeout_ms,
    )
    .map_err(|e| Error::new(CtlExtensionError::Standalone, &e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn standalone_params_serdes() {
        let params = StandaloneParameters {
            clock_source: 0x05,
            aes_high_rate: true,
            adat_mode: AdatParam::Smux2,
            word_clock_param: WordClockParam {
                mode: WordClockMode::Middle,
                rate: WordClockRate {
                    numerator: 2,
                    denominator: 3,
                },
            },
            internal_rate_index: 0x04,
        };

        let mut raw = vec![0u8; MIN_SIZE];
        serialize_standalone_parameters(&params, &mut raw).unwrap();
        assert_eq!(
            raw,
            vec![
                0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x00,
                0x02, 0x00, 0x12, 0x00, 0x00, 0x00, 0x04,
            ]
        );

        let mut p = StandaloneParameters::default();
        deserialize_standalone_parameters(&mut p, &raw).unwrap();
        assert_eq!(params, p);
    }
}
