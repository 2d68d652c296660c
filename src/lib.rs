// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

#![doc = include_str!("../README.md")]

pub mod avc;
pub mod descriptor;
pub mod extension;
pub mod meter;
pub mod params;
pub mod profile;
pub mod resolver;
pub mod router_model;
pub mod topology;

use {
    self::avc::{ccm::*, general::*},
    glib::{prelude::IsA, Error, FileError},
    hinawa::{
        prelude::{FwFcpExt, FwFcpExtManual, FwReqExtManual},
        FwFcp, FwNode, FwReq, FwTcode,
    },
};

/// The implementation of AV/C transaction for the supported units.
///
/// It seems a unique quirk that the status code in response frame for some AV/C commands is
/// against AV/C general specification in control operation.
#[derive(Default, Debug)]
pub struct AudioUnitAvc(pub FwFcp);

impl AvcTransaction<Error> for AudioUnitAvc {
    fn transaction(&self, command_frame: &[u8], timeout_ms: u32) -> Result<Vec<u8>, Error> {
        let mut resp = vec![0; Self::FRAME_SIZE];
        self.0
            .avc_transaction(&command_frame, &mut resp, timeout_ms)
            .map(|_| resp)
    }

    fn control<O: AvcOp + AvcControl>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), AvcTransactionError<Error>> {
        let mut operands = Vec::new();
        AvcControl::build_operands(op, addr, &mut operands)
            .map_err(|err| AvcTransactionError::CmdBuild(err))?;
        let command_frame =
            Self::compose_command_frame(AvcCmdType::Control, addr, O::OPCODE, &operands);
        let response_frame = self
            .transaction(&command_frame, timeout_ms)
            .map_err(|cause| AvcTransactionError::CommunicationFailure(cause))?;
        Self::detect_response_operands(&response_frame, addr, O::OPCODE)
            .and_then(|(rcode, operands)| {
                let expected = match O::OPCODE {
                    InputPlugSignalFormat::OPCODE
                    | OutputPlugSignalFormat::OPCODE
                    | SignalSource::OPCODE => {
                        // NOTE: quirk.
                        rcode == AvcRespCode::Accepted || rcode == AvcRespCode::Reserved(0x00)
                    }
                    _ => rcode == AvcRespCode::Accepted,
                };
                if !expected {
                    Err(AvcRespParseError::UnexpectedStatus)
                } else {
                    AvcControl::parse_operands(op, addr, &operands)
                }
            })
            .map_err(|err| AvcTransactionError::RespParse(err))
    }
}

impl AudioUnitAvc {
    pub fn bind(&self, node: &impl IsA<FwNode>) -> Result<(), Error> {
        self.0.bind(node)
    }

    pub fn control<O: AvcOp + AvcControl>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        AvcTransaction::<Error>::control(self, addr, op, timeout_ms).map_err(from_avc_err)
    }

    pub fn status<O: AvcOp + AvcStatus>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        AvcTransaction::<Error>::status(self, addr, op, timeout_ms).map_err(from_avc_err)
    }

    pub fn specific_inquiry<O: AvcOp + AvcControl>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), Error> {
        AvcTransaction::<Error>::specific_inquiry(self, addr, op, timeout_ms).map_err(from_avc_err)
    }
}

pub(crate) fn from_avc_err(err: AvcTransactionError<Error>) -> Error {
    match err {
        AvcTransactionError::CmdBuild(cause) => Error::new(FileError::Inval, &cause.to_string()),
        AvcTransactionError::CommunicationFailure(cause) => cause,
        AvcTransactionError::RespParse(cause) => Error::new(FileError::Io, &cause.to_string()),
    }
}

pub(crate) fn serialize_u32(val: &u32, raw: &mut [u8]) {
    raw[..4].copy_from_slice(&val.to_be_bytes());
}

pub(crate) fn deserialize_u32(val: &mut u32, raw: &[u8]) {
    let mut quadlet = [0; 4];
    quadlet.copy_from_slice(&raw[..4]);
    *val = u32::from_be_bytes(quadlet);
}

const MAX_FRAME_SIZE: usize = 512;

/// Initiate read transactions against the register space of the unit. The frame should be
/// aligned to quadlet, and is split to the maximum size of block request when needed.
pub(crate) fn read_block(
    req: &FwReq,
    node: &FwNode,
    mut addr: u64,
    mut frames: &mut [u8],
    timeout_ms: u32,
) -> Result<(), Error> {
    while frames.len() > 0 {
        let len = std::cmp::min(frames.len(), MAX_FRAME_SIZE);
        let tcode = if len == 4 {
            FwTcode::ReadQuadletRequest
        } else {
            FwTcode::ReadBlockRequest
        };

        req.transaction_sync(node, tcode, addr, len, &mut frames[0..len], timeout_ms)?;

        addr += len as u64;
        frames = &mut frames[len..];
    }

    Ok(())
}

/// Initiate write transactions against the register space of the unit.
pub(crate) fn write_block(
    req: &FwReq,
    node: &FwNode,
    mut addr: u64,
    mut frames: &mut [u8],
    timeout_ms: u32,
) -> Result<(), Error> {
    while frames.len() > 0 {
        let len = std::cmp::min(frames.len(), MAX_FRAME_SIZE);
        let tcode = if len == 4 {
            FwTcode::WriteQuadletRequest
        } else {
            FwTcode::WriteBlockRequest
        };

        req.transaction_sync(node, tcode, addr, len, &mut frames[0..len], timeout_ms)?;

        addr += len as u64;
        frames = &mut frames[len..];
    }

    Ok(())
}
