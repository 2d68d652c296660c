// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Command section in control extension.
//!
//! A command is initiated by writing its opcode with execute flag, then completion is detected
//! as clearing of the flag in the same register, followed by a return code.

use super::{caps_section::*, *};

/// Mode of sampling transfer frequency.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RateMode {
    /// Up to 48.0 kHz.
    Low,
    /// Up to 96.0 kHz.
    Middle,
    /// Up to 192.0 kHz.
    High,
}

impl Default for RateMode {
    fn default() -> Self {
        Self::Low
    }
}

impl RateMode {
    const LOW_FLAG: u32 = 0x00010000;
    const MIDDLE_FLAG: u32 = 0x00020000;
    const HIGH_FLAG: u32 = 0x00040000;

    /// Conversion from sampling transfer frequency.
    pub fn from_sampling_transfer_frequency(freq: u32) -> Self {
        match freq {
            0..=48000 => Self::Low,
            48001..=96000 => Self::Middle,
            _ => Self::High,
        }
    }
}

/// Operation code of command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Opcode {
    /// No operation.
    NoOp,
    /// Load router configuration from new router section at given rate.
    LoadFromRouter(RateMode),
    /// Load stream format configuration from new stream format section at given rate.
    LoadFromStreamConfig(RateMode),
    /// Load both router and stream format configurations at given rate.
    LoadFromRouterStreamConfig(RateMode),
    /// Load all configurations from on-board flash memory.
    LoadFromStorage,
    /// Store all configurations to on-board flash memory.
    LoadToStorage,
}

impl Opcode {
    const NOOP_VALUE: u16 = 0x0000;
    const LOAD_FROM_ROUTER_VALUE: u16 = 0x0001;
    const LOAD_FROM_STREAM_CONFIG_VALUE: u16 = 0x0002;
    const LOAD_FROM_ROUTER_STREAM_CONFIG_VALUE: u16 = 0x0003;
    const LOAD_FROM_STORAGE_VALUE: u16 = 0x0004;
    const LOAD_TO_STORAGE_VALUE: u16 = 0x0005;
}

const EXECUTE_FLAG: u32 = 0x80000000;

fn serialize_opcode(code: &Opcode, raw: &mut [u8]) {
    assert!(raw.len() >= 4);

    let mut val = match code {
        Opcode::NoOp => Opcode::NOOP_VALUE as u32,
        Opcode::LoadFromRouter(rate_mode)
        | Opcode::LoadFromStreamConfig(rate_mode)
        | Opcode::LoadFromRouterStreamConfig(rate_mode) => {
            let val = match code {
                Opcode::LoadFromRouter(_) => Opcode::LOAD_FROM_ROUTER_VALUE,
                Opcode::LoadFromStreamConfig(_) => Opcode::LOAD_FROM_STREAM_CONFIG_VALUE,
                Opcode::LoadFromRouterStreamConfig(_) => {
                    Opcode::LOAD_FROM_ROUTER_STREAM_CONFIG_VALUE
                }
                _ => unreachable!(),
            } as u32;

            let flag = match rate_mode {
                RateMode::Low => RateMode::LOW_FLAG,
                RateMode::Middle => RateMode::MIDDLE_FLAG,
                RateMode::High => RateMode::HIGH_FLAG,
            };
            flag | val
        }
        Opcode::LoadFromStorage => Opcode::LOAD_FROM_STORAGE_VALUE as u32,
        Opcode::LoadToStorage => Opcode::LOAD_TO_STORAGE_VALUE as u32,
    };

    val |= EXECUTE_FLAG;

    serialize_u32(&val, raw);
}

const OPCODE_OFFSET: usize = 0x00;
const RETURN_OFFSET: usize = 0x04;

const RETURN_SUCCESS: u32 = 0x00;

fn check_caps(caps: &ExtensionCaps, opcode: &Opcode) -> Result<(), Error> {
    match opcode {
        Opcode::LoadFromRouter(_) => {
            if caps.router.is_readonly {
                Err(Error::new(
                    CtlExtensionError::Cmd,
                    "Router configuration is immutable",
                ))?
            }
        }
        Opcode::LoadFromStreamConfig(_) => {
            if !caps.general.dynamic_stream_format {
                Err(Error::new(
                    CtlExtensionError::Cmd,
                    "Stream format configuration is immutable",
                ))?
            }
        }
        Opcode::LoadFromRouterStreamConfig(_) => {
            if caps.router.is_readonly || !caps.general.dynamic_stream_format {
                Err(Error::new(
                    CtlExtensionError::Cmd,
                    "Any of configuration is immutable",
                ))?
            }
        }
        Opcode::LoadFromStorage | Opcode::LoadToStorage => {
            if !caps.general.storage_avail {
                Err(Error::new(
                    CtlExtensionError::Cmd,
                    "Storage is not available",
                ))?
            }
        }
        Opcode::NoOp => (),
    }

    Ok(())
}

/// Initiate command and wait for its completion. Both the capability of the addressed feature
/// and the return code of the command are checked.
pub fn initiate(
    req: &FwReq,
    node: &FwNode,
    sections: &ExtensionSections,
    caps: &ExtensionCaps,
    opcode: Opcode,
    timeout_ms: u32,
) -> Result<(), Error> {
    check_caps(caps, &opcode)?;

    let mut raw = [0; 4];
    serialize_opcode(&opcode, &mut raw);
    extension_write(
        req,
        node,
        &sections.cmd,
        OPCODE_OFFSET,
        &mut raw,
        timeout_ms,
    )
    .map_err(|e| Error::new(CtlExtensionError::Cmd, &e.to_string()))?;

    let mut count = 0;
    while count < 10 {
        std::thread::sleep(std::time::Duration::from_millis(50));

        extension_read(
            req,
            node,
            &sections.cmd,
            OPCODE_OFFSET,
            &mut raw,
            timeout_ms,
        )
        .map_err(|e| Error::new(CtlExtensionError::Cmd, &e.to_string()))?;

        let mut val = 0u32;
        deserialize_u32(&mut val, &raw);

        if val & EXECUTE_FLAG == 0 {
            extension_read(
                req,
                node,
                &sections.cmd,
                RETURN_OFFSET,
                &mut raw,
                timeout_ms,
            )
            .map_err(|e| Error::new(CtlExtensionError::Cmd, &e.to_string()))?;

            let mut code = 0u32;
            deserialize_u32(&mut code, &raw);
            if code != RETURN_SUCCESS {
                let msg = format!("Fail to execute requested operation: {}", code);
                Err(Error::new(CtlExtensionError::Cmd, &msg))?;
            }
            return Ok(());
        }
        count += 1;
    }

    Err(Error::new(CtlExtensionError::Cmd, "Operation timeout."))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn opcode_encoding() {
        let mut raw = [0u8; 4];

        serialize_opcode(&Opcode::LoadFromRouter(RateMode::Low), &mut raw);
        assert_eq!(raw, [0x80, 0x01, 0x00, 0x01]);

        serialize_opcode(&Opcode::LoadFromRouter(RateMode::High), &mut raw);
        assert_eq!(raw, [0x80, 0x04, 0x00, 0x01]);

        serialize_opcode(&Opcode::LoadToStorage, &mut raw);
        assert_eq!(raw, [0x80, 0x00, 0x00, 0x05]);
    }

    #[test]
    fn rate_mode_from_frequency() {
        assert_eq!(RateMode::from_sampling_transfer_frequency(44100), RateMode::Low);
        assert_eq!(RateMode::from_sampling_transfer_frequency(48000), RateMode::Low);
        assert_eq!(RateMode::from_sampling_transfer_frequency(88200), RateMode::Middle);
        assert_eq!(RateMode::from_sampling_transfer_frequency(192000), RateMode::High);
    }
}
