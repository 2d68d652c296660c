// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Types for AV/C address and transaction, and AV/C commands described in AV/C general
//! specification.

/// The type of subunit for AV/C address defined by 1394 Trading Association.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AvcSubunitType {
    Monitor,
    Audio,
    Printer,
    Disc,
    Tape,
    Tuner,
    Ca,
    Camera,
    Panel,
    BulletinBoard,
    CameraStorage,
    Music,
    VendorUnique,
    Extended,
    Reserved(u8),
}

impl AvcSubunitType {
    const MONITOR: u8 = 0x00;
    const AUDIO: u8 = 0x01;
    const PRINTER: u8 = 0x02;
    const DISC: u8 = 0x03;
    const TAPE: u8 = 0x04;
    const TUNER: u8 = 0x05;
    const CA: u8 = 0x06;
    const CAMERA: u8 = 0x07;
    const PANEL: u8 = 0x09;
    const BULLETIN_BOARD: u8 = 0x0a;
    const CAMERA_STORAGE: u8 = 0x0b;
    const MUSIC: u8 = 0x0c;
    const VENDOR_UNIQUE: u8 = 0x1c;
    const EXTENDED: u8 = 0x1e;
}

impl From<u8> for AvcSubunitType {
    fn from(val: u8) -> Self {
        match val {
            Self::MONITOR => Self::Monitor,
            Self::AUDIO => Self::Audio,
            Self::PRINTER => Self::Printer,
            Self::DISC => Self::Disc,
            Self::TAPE => Self::Tape,
            Self::TUNER => Self::Tuner,
            Self::CA => Self::Ca,
            Self::CAMERA => Self::Camera,
            Self::PANEL => Self::Panel,
            Self::BULLETIN_BOARD => Self::BulletinBoard,
            Self::CAMERA_STORAGE => Self::CameraStorage,
            Self::MUSIC => Self::Music,
            Self::VENDOR_UNIQUE => Self::VendorUnique,
            Self::EXTENDED => Self::Extended,
            _ => Self::Reserved(val),
        }
    }
}

impl From<&AvcSubunitType> for u8 {
    fn from(subunit_type: &AvcSubunitType) -> Self {
        match subunit_type {
            AvcSubunitType::Monitor => AvcSubunitType::MONITOR,
            AvcSubunitType::Audio => AvcSubunitType::AUDIO,
            AvcSubunitType::Printer => AvcSubunitType::PRINTER,
            AvcSubunitType::Disc => AvcSubunitType::DISC,
            AvcSubunitType::Tape => AvcSubunitType::TAPE,
            AvcSubunitType::Tuner => AvcSubunitType::TUNER,
            AvcSubunitType::Ca => AvcSubunitType::CA,
            AvcSubunitType::Camera => AvcSubunitType::CAMERA,
            AvcSubunitType::Panel => AvcSubunitType::PANEL,
            AvcSubunitType::BulletinBoard => AvcSubunitType::BULLETIN_BOARD,
            AvcSubunitType::CameraStorage => AvcSubunitType::CAMERA_STORAGE,
            AvcSubunitType::Music => AvcSubunitType::MUSIC,
            AvcSubunitType::VendorUnique => AvcSubunitType::VENDOR_UNIQUE,
            AvcSubunitType::Extended => AvcSubunitType::EXTENDED,
            AvcSubunitType::Reserved(value) => *value,
        }
    }
}

impl From<AvcSubunitType> for u8 {
    fn from(subunit_type: AvcSubunitType) -> Self {
        Self::from(&subunit_type)
    }
}

/// The AV/C address of first music subunit for convenience.
pub const MUSIC_SUBUNIT_0: AvcAddrSubunit = AvcAddrSubunit {
    subunit_type: AvcSubunitType::Music,
    subunit_id: 0,
};

/// The data of AV/C address in subunit case.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AvcAddrSubunit {
    pub subunit_type: AvcSubunitType,
    pub subunit_id: u8,
}

impl AvcAddrSubunit {
    pub(crate) const SUBUNIT_TYPE_SHIFT: usize = 3;
    pub(crate) const SUBUNIT_TYPE_MASK: u8 = 0x1f;
    pub(crate) const SUBUNIT_ID_SHIFT: usize = 0;
    pub(crate) const SUBUNIT_ID_MASK: u8 = 0x07;

    pub fn new(subunit_type: AvcSubunitType, mut subunit_id: u8) -> Self {
        subunit_id &= Self::SUBUNIT_ID_MASK;
        AvcAddrSubunit {
            subunit_type,
            subunit_id,
        }
    }
}

impl From<u8> for AvcAddrSubunit {
    fn from(val: u8) -> Self {
        let subunit_type =
            AvcSubunitType::from((val >> Self::SUBUNIT_TYPE_SHIFT) & Self::SUBUNIT_TYPE_MASK);
        let subunit_id = (val >> Self::SUBUNIT_ID_SHIFT) & Self::SUBUNIT_ID_MASK;
        AvcAddrSubunit {
            subunit_type,
            subunit_id,
        }
    }
}

impl From<&AvcAddrSubunit> for u8 {
    fn from(subunit: &AvcAddrSubunit) -> Self {
        let mut val = u8::from(subunit.subunit_type);
        val = (val & AvcAddrSubunit::SUBUNIT_TYPE_MASK) << AvcAddrSubunit::SUBUNIT_TYPE_SHIFT;
        val |= (subunit.subunit_id & AvcAddrSubunit::SUBUNIT_ID_MASK)
            << AvcAddrSubunit::SUBUNIT_ID_SHIFT;
        val
    }
}

impl From<AvcAddrSubunit> for u8 {
    fn from(subunit: AvcAddrSubunit) -> Self {
        Self::from(&subunit)
    }
}

/// For AV/C address in both unit and subunit cases.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AvcAddr {
    Unit,
    Subunit(AvcAddrSubunit),
}

impl AvcAddr {
    pub const UNIT_ADDR: u8 = 0xff;
}

impl From<u8> for AvcAddr {
    fn from(val: u8) -> Self {
        match val {
            Self::UNIT_ADDR => AvcAddr::Unit,
            _ => AvcAddr::Subunit(AvcAddrSubunit::from(val)),
        }
    }
}

impl From<&AvcAddr> for u8 {
    fn from(addr: &AvcAddr) -> Self {
        match addr {
            AvcAddr::Unit => AvcAddr::UNIT_ADDR,
            AvcAddr::Subunit(d) => u8::from(*d),
        }
    }
}

impl From<AvcAddr> for u8 {
    fn from(addr: AvcAddr) -> Self {
        Self::from(&addr)
    }
}

/// The type of command in AV/C transaction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AvcCmdType {
    /// Perform an operation to the addressed target.
    Control,
    /// Check current status of the addressed target.
    Status,
    /// Check whether the addressed target supports a particular Control command including
    /// operands.
    SpecificInquiry,
    /// Schedule notification of a change in the addressed target.
    Notify,
    /// Check whether the addressed target supports a particular Control command just with opcode.
    GeneralInquiry,
    Reserved(u8),
}

impl AvcCmdType {
    const CONTROL: u8 = 0x00;
    const STATUS: u8 = 0x01;
    const SPECIFIC_INQUIRY: u8 = 0x02;
    const NOTIFY: u8 = 0x03;
    const GENERAL_INQUIRY: u8 = 0x04;
}

impl From<u8> for AvcCmdType {
    fn from(val: u8) -> Self {
        match val {
            Self::CONTROL => Self::Control,
            Self::STATUS => Self::Status,
            Self::SPECIFIC_INQUIRY => Self::SpecificInquiry,
            Self::NOTIFY => Self::Notify,
            Self::GENERAL_INQUIRY => Self::GeneralInquiry,
            _ => Self::Reserved(val),
        }
    }
}

impl From<AvcCmdType> for u8 {
    fn from(code: AvcCmdType) -> Self {
        match code {
            AvcCmdType::Control => AvcCmdType::CONTROL,
            AvcCmdType::Status => AvcCmdType::STATUS,
            AvcCmdType::SpecificInquiry => AvcCmdType::SPECIFIC_INQUIRY,
            AvcCmdType::Notify => AvcCmdType::NOTIFY,
            AvcCmdType::GeneralInquiry => AvcCmdType::GENERAL_INQUIRY,
            AvcCmdType::Reserved(val) => val,
        }
    }
}

/// The status of response in AV/C transaction.
#[derive(Debug, Eq, PartialEq)]
pub enum AvcRespCode {
    /// The target does not implement the requested command or the addressed subunit.
    NotImplemented,
    /// The requested CONTROL command has been processed or is scheduled to process.
    Accepted,
    /// The target refused to process the requested command due to some reasons.
    Rejected,
    /// The target is under transition state and can not process the requested STATUS command.
    InTransition,
    /// The target implements the inquired command or returns current status against the
    /// requested STATUS command.
    ImplementedStable,
    /// The actual notification scheduled by the NOTIFY command.
    Changed,
    /// The intermediate response during AV/C deferred transaction.
    Interim,
    Reserved(u8),
}

impl AvcRespCode {
    const NOT_IMPLEMENTED: u8 = 0x08;
    const ACCEPTED: u8 = 0x09;
    const REJECTED: u8 = 0x0a;
    const IN_TRANSITION: u8 = 0x0b;
    const IMPLEMENTED_STABLE: u8 = 0x0c;
    const CHANGED: u8 = 0x0d;
    const INTERIM: u8 = 0x0f;
}

impl From<u8> for AvcRespCode {
    fn from(val: u8) -> Self {
        match val {
            Self::NOT_IMPLEMENTED => Self::NotImplemented,
            Self::ACCEPTED => Self::Accepted,
            Self::REJECTED => Self::Rejected,
            Self::IN_TRANSITION => Self::InTransition,
            Self::IMPLEMENTED_STABLE => Self::ImplementedStable,
            Self::CHANGED => Self::Changed,
            Self::INTERIM => Self::Interim,
            _ => Self::Reserved(val),
        }
    }
}

impl From<AvcRespCode> for u8 {
    fn from(resp: AvcRespCode) -> Self {
        match resp {
            AvcRespCode::NotImplemented => AvcRespCode::NOT_IMPLEMENTED,
            AvcRespCode::Accepted => AvcRespCode::ACCEPTED,
            AvcRespCode::Rejected => AvcRespCode::REJECTED,
            AvcRespCode::InTransition => AvcRespCode::IN_TRANSITION,
            AvcRespCode::ImplementedStable => AvcRespCode::IMPLEMENTED_STABLE,
            AvcRespCode::Changed => AvcRespCode::CHANGED,
            AvcRespCode::Interim => AvcRespCode::INTERIM,
            AvcRespCode::Reserved(val) => val,
        }
    }
}

/// The error to build command frame for AV/C transaction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AvcCmdBuildError {
    /// Invalid address for the operation.
    InvalidAddress,
    /// Fail to prepare operands for the operation.
    InvalidOperands,
}

impl std::fmt::Display for AvcCmdBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAddress => write!(f, "invalid address"),
            Self::InvalidOperands => write!(f, "invalid operands"),
        }
    }
}

/// The error to parse response frame of AV/C transaction.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AvcRespParseError {
    /// The length of response frame is shorter than expected.
    TooShortResp(
        /// The expected length at least.
        usize,
    ),
    /// The status code in response frame is not expected.
    UnexpectedStatus,
    /// Any of operand in response frame is not expected.
    UnexpectedOperands(
        /// The first offset for unexpected operand.
        usize,
    ),
}

impl AvcRespParseError {
    pub(crate) fn add_offset(self, offset: usize) -> Self {
        match self {
            Self::TooShortResp(expected) => Self::TooShortResp(offset + expected),
            Self::UnexpectedOperands(pos) => Self::UnexpectedOperands(offset + pos),
            _ => self,
        }
    }
}

impl std::fmt::Display for AvcRespParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShortResp(expected) => write!(f, "response frame too short {}", expected),
            Self::UnexpectedStatus => write!(f, "unexpected response status"),
            Self::UnexpectedOperands(offset) => {
                write!(f, "unexpected response operands at {}", offset)
            }
        }
    }
}

/// For AV/C operation with opcode.
pub trait AvcOp {
    /// The code to specify operation.
    const OPCODE: u8;
}

/// The AV/C operation supporting control and inquiry command.
pub trait AvcControl {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError>;
    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError>;
}

/// The AV/C operation supporting status command.
pub trait AvcStatus {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError>;
    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError>;
}

/// For error reporting of AV/C transaction.
#[derive(Debug, Clone)]
pub enum AvcTransactionError<T: std::fmt::Display + Clone> {
    /// Fail to build command frame.
    CmdBuild(AvcCmdBuildError),
    /// Fail to initiate and finish AV/C transaction by Function Control Protocol.
    CommunicationFailure(T),
    /// Fail to parse response frame.
    RespParse(AvcRespParseError),
}

impl<T: std::fmt::Display + Clone> std::fmt::Display for AvcTransactionError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CmdBuild(cause) => write!(f, "Fail to build command frame: {}", cause),
            Self::CommunicationFailure(cause) => write!(f, "Fail to communicate: {}", cause),
            Self::RespParse(cause) => write!(f, "Fail to parse response frame: {}", cause),
        }
    }
}

/// For AV/C transaction defined by 1394 Trading Association.
///
/// The transaction is the seam between command construction and Function Control Protocol
/// (FCP) in IEC 61883-1. Any implementation transmits the given command frame and returns the
/// received response frame, which allows to exercise command construction and response parsing
/// without actual hardware.
pub trait AvcTransaction<T: std::fmt::Display + Clone> {
    /// The maximum size of frame in both command and response.
    const FRAME_SIZE: usize = 0x200;

    /// The mask for first byte of response frame to detect status code. The rest bits express
    /// Command/transaction set (CTS) but appears not to be used actually.
    const RESP_CODE_MASK: u8 = 0x0f;

    /// Transmit given command frame and return received response frame.
    ///
    /// When detecting `AvcRespCode::Interim` in received response frame, the implementation is
    /// expected to wait for further response transaction as final result, according to
    /// "deferred transaction" in AV/C general specification.
    fn transaction(&self, command_frame: &[u8], timeout_ms: u32) -> Result<Vec<u8>, T>;

    fn compose_command_frame(
        ctype: AvcCmdType,
        addr: &AvcAddr,
        opcode: u8,
        operands: &[u8],
    ) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.push(ctype.into());
        frame.push(addr.into());
        frame.push(opcode);
        frame.extend_from_slice(operands);
        frame
    }

    fn detect_response_operands<'a>(
        frame: &'a [u8],
        addr: &AvcAddr,
        opcode: u8,
    ) -> Result<(AvcRespCode, &'a [u8]), AvcRespParseError> {
        if frame.len() < 3 {
            Err(AvcRespParseError::TooShortResp(3))
        } else if frame[1] != addr.into() {
            Err(AvcRespParseError::UnexpectedStatus)
        } else if frame[2] != opcode {
            Err(AvcRespParseError::UnexpectedStatus)
        } else {
            let rcode = AvcRespCode::from(frame[0] & Self::RESP_CODE_MASK);
            let operands = &frame[3..];
            Ok((rcode, operands))
        }
    }

    fn control<O: AvcOp + AvcControl>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), AvcTransactionError<T>> {
        let mut operands = Vec::new();
        let command_frame = AvcControl::build_operands(op, addr, &mut operands)
            .map_err(|err| AvcTransactionError::CmdBuild(err))
            .map(|_| Self::compose_command_frame(AvcCmdType::Control, addr, O::OPCODE, &operands))?;
        self.transaction(&command_frame, timeout_ms)
            .map_err(|cause| AvcTransactionError::CommunicationFailure(cause))
            .and_then(|response_frame| {
                Self::detect_response_operands(&response_frame, addr, O::OPCODE)
                    .and_then(|(rcode, operands)| match rcode {
                        AvcRespCode::Accepted => AvcControl::parse_operands(op, addr, &operands),
                        _ => Err(AvcRespParseError::UnexpectedStatus),
                    })
                    .map_err(|err| AvcTransactionError::RespParse(err))
            })
    }

    fn status<O: AvcOp + AvcStatus>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), AvcTransactionError<T>> {
        let mut operands = Vec::new();
        let command_frame = AvcStatus::build_operands(op, addr, &mut operands)
            .map_err(|err| AvcTransactionError::CmdBuild(err))
            .map(|_| Self::compose_command_frame(AvcCmdType::Status, addr, O::OPCODE, &operands))?;
        self.transaction(&command_frame, timeout_ms)
            .map_err(|cause| AvcTransactionError::CommunicationFailure(cause))
            .and_then(|response_frame| {
                Self::detect_response_operands(&response_frame, addr, O::OPCODE)
                    .and_then(|(rcode, operands)| match rcode {
                        AvcRespCode::ImplementedStable => {
                            AvcStatus::parse_operands(op, addr, &operands)
                        }
                        _ => Err(AvcRespParseError::UnexpectedStatus),
                    })
                    .map_err(|err| AvcTransactionError::RespParse(err))
            })
    }

    fn specific_inquiry<O: AvcOp + AvcControl>(
        &self,
        addr: &AvcAddr,
        op: &mut O,
        timeout_ms: u32,
    ) -> Result<(), AvcTransactionError<T>> {
        let mut operands = Vec::new();
        let command_frame = AvcControl::build_operands(op, addr, &mut operands)
            .map_err(|err| AvcTransactionError::CmdBuild(err))
            .map(|_| {
                Self::compose_command_frame(AvcCmdType::SpecificInquiry, addr, O::OPCODE, &operands)
            })?;
        self.transaction(&command_frame, timeout_ms)
            .map_err(|cause| AvcTransactionError::CommunicationFailure(cause))
            .and_then(|response_frame| {
                Self::detect_response_operands(&response_frame, addr, O::OPCODE)
                    .and_then(|(rcode, operands)| match rcode {
                        AvcRespCode::ImplementedStable => {
                            AvcControl::parse_operands(op, addr, &operands)
                        }
                        _ => Err(AvcRespParseError::UnexpectedStatus),
                    })
                    .map_err(|err| AvcTransactionError::RespParse(err))
            })
    }
}

/// AV/C UNIT INFO command.
///
/// Described in clause "9.2 UNIT INFO command".
#[derive(Debug)]
pub struct UnitInfo {
    pub unit_type: AvcSubunitType,
    pub unit_id: u8,
    pub company_id: [u8; 3],
}

impl Default for UnitInfo {
    fn default() -> Self {
        Self {
            unit_type: AvcSubunitType::Reserved(AvcAddrSubunit::SUBUNIT_TYPE_MASK),
            unit_id: AvcAddrSubunit::SUBUNIT_ID_MASK,
            company_id: [0xff; 3],
        }
    }
}

impl UnitInfo {
    const FIRST_OPERAND: u8 = 0x07;

    pub fn new() -> Self {
        Default::default()
    }
}

impl AvcOp for UnitInfo {
    const OPCODE: u8 = 0x30;
}

impl AvcStatus for UnitInfo {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError> {
        if let AvcAddr::Subunit(_) = addr {
            Err(AvcCmdBuildError::InvalidAddress)
        } else {
            operands.push(Self::FIRST_OPERAND);
            operands.extend_from_slice(&[0xff; 4]);
            Ok(())
        }
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < 5 {
            Err(AvcRespParseError::TooShortResp(5))
        } else {
            let unit_type = (operands[1] >> AvcAddrSubunit::SUBUNIT_TYPE_SHIFT)
                & AvcAddrSubunit::SUBUNIT_TYPE_MASK;
            let unit_id =
                (operands[1] >> AvcAddrSubunit::SUBUNIT_ID_SHIFT) & AvcAddrSubunit::SUBUNIT_ID_MASK;

            self.unit_type = AvcSubunitType::from(unit_type);
            self.unit_id = unit_id;
            self.company_id.copy_from_slice(&operands[2..5]);
            Ok(())
        }
    }
}

/// The data for each entry of subunit information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubunitInfoEntry {
    pub subunit_type: AvcSubunitType,
    pub maximum_id: u8,
}

impl SubunitInfoEntry {
    pub fn new(subunit_type: AvcSubunitType, maximum_id: u8) -> Self {
        SubunitInfoEntry {
            subunit_type,
            maximum_id,
        }
    }
}

/// AV/C SUBUNIT INFO command.
///
/// Described in clause "9.3 SUBUNIT INFO command".
#[derive(Debug)]
pub struct SubunitInfo {
    pub page: u8,
    pub extension_code: u8,
    pub entries: Vec<SubunitInfoEntry>,
}

impl SubunitInfo {
    /// The maximum numeric identifier of page.
    pub const MAXIMUM_PAGE: u8 = 0x07;

    const PAGE_SHIFT: usize = 4;
    const PAGE_MASK: u8 = 0x07;
    const EXTENSION_CODE_SHIFT: usize = 0;
    const EXTENSION_CODE_MASK: u8 = 0x07;

    pub fn new(page: u8, extension_code: u8) -> Self {
        SubunitInfo {
            page,
            extension_code,
            entries: Vec::new(),
        }
    }
}

impl AvcOp for SubunitInfo {
    const OPCODE: u8 = 0x31;
}

impl AvcStatus for SubunitInfo {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError> {
        if let AvcAddr::Subunit(_) = addr {
            Err(AvcCmdBuildError::InvalidAddress)
        } else {
            operands.push(
                ((self.page & Self::PAGE_MASK) << Self::PAGE_SHIFT)
                    | ((self.extension_code & Self::EXTENSION_CODE_MASK)
                        << Self::EXTENSION_CODE_SHIFT),
            );
            operands.extend_from_slice(&[0xff; 4]);
            Ok(())
        }
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < 5 {
            Err(AvcRespParseError::TooShortResp(5))
        } else {
            self.page = (operands[0] >> Self::PAGE_SHIFT) & Self::PAGE_MASK;
            self.extension_code =
                (operands[0] >> Self::EXTENSION_CODE_SHIFT) & Self::EXTENSION_CODE_MASK;

            self.entries = operands[1..5]
                .iter()
                .filter(|&operand| *operand != 0xff)
                .map(|operand| {
                    let subunit_type = (operand >> AvcAddrSubunit::SUBUNIT_TYPE_SHIFT)
                        & AvcAddrSubunit::SUBUNIT_TYPE_MASK;
                    let maximum_id = (operand >> AvcAddrSubunit::SUBUNIT_ID_SHIFT)
                        & AvcAddrSubunit::SUBUNIT_ID_MASK;
                    SubunitInfoEntry {
                        subunit_type: AvcSubunitType::from(subunit_type),
                        maximum_id,
                    }
                })
                .collect();

            Ok(())
        }
    }
}

/// The data of unit plugs for isochronous and external inputs/outputs.
#[derive(Debug)]
pub struct PlugInfoUnitIsocExtData {
    pub isoc_input_plugs: u8,
    pub isoc_output_plugs: u8,
    pub external_input_plugs: u8,
    pub external_output_plugs: u8,
}

/// The data of unit plugs for asynchronous inputs/outputs.
#[derive(Debug)]
pub struct PlugInfoUnitAsyncData {
    pub async_input_plugs: u8,
    pub async_output_plugs: u8,
}

/// Plug information for unit.
#[derive(Debug)]
pub enum PlugInfoUnitData {
    IsocExt(PlugInfoUnitIsocExtData),
    Async(PlugInfoUnitAsyncData),
}

/// Plug information for subunit.
#[derive(Debug)]
pub struct PlugInfoSubunitData {
    pub dst_plugs: u8,
    pub src_plugs: u8,
}

/// AV/C PLUG INFO command.
///
/// Described in clause "10.1 PLUG INFO command".
#[derive(Debug)]
pub enum PlugInfo {
    Unit(PlugInfoUnitData),
    Subunit(PlugInfoSubunitData),
}

impl PlugInfo {
    const SUBFUNC_UNIT_ISOC_EXT: u8 = 0x00;
    const SUBFUNC_UNIT_ASYNC: u8 = 0x01;
    const SUBFUNC_SUBUNIT: u8 = 0x00;

    pub fn new_for_unit_isoc_ext_plugs() -> Self {
        PlugInfo::Unit(PlugInfoUnitData::IsocExt(PlugInfoUnitIsocExtData {
            isoc_input_plugs: 0xff,
            isoc_output_plugs: 0xff,
            external_input_plugs: 0xff,
            external_output_plugs: 0xff,
        }))
    }

    pub fn new_for_unit_async_plugs() -> Self {
        PlugInfo::Unit(PlugInfoUnitData::Async(PlugInfoUnitAsyncData {
            async_input_plugs: 0xff,
            async_output_plugs: 0xff,
        }))
    }

    pub fn new_for_subunit_plugs() -> Self {
        PlugInfo::Subunit(PlugInfoSubunitData {
            dst_plugs: 0xff,
            src_plugs: 0xff,
        })
    }
}

impl AvcOp for PlugInfo {
    const OPCODE: u8 = 0x02;
}

impl AvcStatus for PlugInfo {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError> {
        let subfunction = match &self {
            PlugInfo::Unit(u) => {
                if let AvcAddr::Subunit(_) = addr {
                    Err(AvcCmdBuildError::InvalidAddress)?;
                }
                match u {
                    PlugInfoUnitData::IsocExt(_) => Self::SUBFUNC_UNIT_ISOC_EXT,
                    PlugInfoUnitData::Async(_) => Self::SUBFUNC_UNIT_ASYNC,
                }
            }
            PlugInfo::Subunit(_) => {
                if let AvcAddr::Unit = addr {
                    Err(AvcCmdBuildError::InvalidAddress)?;
                }
                Self::SUBFUNC_SUBUNIT
            }
        };
        operands.push(subfunction);
        operands.extend_from_slice(&[0xff; 4]);
        Ok(())
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < 5 {
            Err(AvcRespParseError::TooShortResp(5))?;
        }

        let subfunction = operands[0];
        match self {
            PlugInfo::Unit(u) => match u {
                PlugInfoUnitData::IsocExt(d) => {
                    if subfunction != Self::SUBFUNC_UNIT_ISOC_EXT {
                        Err(AvcRespParseError::UnexpectedOperands(0))?;
                    }
                    d.isoc_input_plugs = operands[1];
                    d.isoc_output_plugs = operands[2];
                    d.external_input_plugs = operands[3];
                    d.external_output_plugs = operands[4];
                }
                PlugInfoUnitData::Async(d) => {
                    if subfunction != Self::SUBFUNC_UNIT_ASYNC {
                        Err(AvcRespParseError::UnexpectedOperands(0))?;
                    }
                    d.async_input_plugs = operands[1];
                    d.async_output_plugs = operands[2];
                }
            },
            PlugInfo::Subunit(s) => {
                if subfunction != Self::SUBFUNC_SUBUNIT {
                    Err(AvcRespParseError::UnexpectedOperands(0))?;
                }
                s.dst_plugs = operands[1];
                s.src_plugs = operands[2];
            }
        }

        Ok(())
    }
}

/// The common data for plug signal format.
#[derive(Debug)]
pub struct PlugSignalFormat {
    pub plug_id: u8,
    pub fmt: u8,
    pub fdf: [u8; 3],
}

impl PlugSignalFormat {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
        for_status: bool,
    ) -> Result<(), AvcCmdBuildError> {
        if *addr == AvcAddr::Unit {
            operands.push(self.plug_id);
            if for_status {
                operands.extend_from_slice(&[0xff; 4]);
            } else {
                operands.push(self.fmt);
                operands.extend_from_slice(&self.fdf);
            }
            Ok(())
        } else {
            Err(AvcCmdBuildError::InvalidAddress)
        }
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() > 4 {
            self.plug_id = operands[0];
            self.fmt = operands[1];
            self.fdf.copy_from_slice(&operands[2..5]);
            Ok(())
        } else {
            Err(AvcRespParseError::TooShortResp(4))
        }
    }
}

impl Default for PlugSignalFormat {
    fn default() -> Self {
        Self {
            plug_id: 0xff,
            fmt: 0xff,
            fdf: [0xff; 3],
        }
    }
}

/// AV/C INPUT PLUG SIGNAL FORMAT command.
///
/// Described in clause "10.10 INPUT PLUG SIGNAL FORMAT command".
#[derive(Debug, Default)]
pub struct InputPlugSignalFormat(pub PlugSignalFormat);

impl InputPlugSignalFormat {
    pub fn new(plug_id: u8) -> Self {
        InputPlugSignalFormat(PlugSignalFormat {
            plug_id,
            ..Default::default()
        })
    }
}

impl AvcOp for InputPlugSignalFormat {
    const OPCODE: u8 = 0x19;
}

impl AvcControl for InputPlugSignalFormat {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError> {
        self.0.build_operands(addr, operands, false)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.0.parse_operands(addr, operands)
    }
}

impl AvcStatus for InputPlugSignalFormat {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError> {
        self.0.build_operands(addr, operands, true)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.0.parse_operands(addr, operands)
    }
}

/// AV/C OUTPUT PLUG SIGNAL FORMAT command.
///
/// Described in clause "10.10 OUTPUT PLUG SIGNAL FORMAT command".
#[derive(Debug, Default)]
pub struct OutputPlugSignalFormat(pub PlugSignalFormat);

impl OutputPlugSignalFormat {
    pub fn new(plug_id: u8) -> Self {
        OutputPlugSignalFormat(PlugSignalFormat {
            plug_id,
            ..Default::default()
        })
    }
}

impl AvcOp for OutputPlugSignalFormat {
    const OPCODE: u8 = 0x18;
}

impl AvcControl for OutputPlugSignalFormat {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError> {
        self.0.build_operands(addr, operands, false)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.0.parse_operands(addr, operands)
    }
}

impl AvcStatus for OutputPlugSignalFormat {
    fn build_operands(
        &mut self,
        addr: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError> {
        self.0.build_operands(addr, operands, true)
    }

    fn parse_operands(&mut self, addr: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        self.0.parse_operands(addr, operands)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn avcaddr_from() {
        assert_eq!(AvcAddr::from(0xff), AvcAddr::Unit);
        assert_eq!(
            AvcAddr::from(0x09),
            AvcAddr::Subunit(AvcAddrSubunit::new(AvcSubunitType::Audio, 0x01))
        );
        assert_eq!(
            AvcAddr::from(0x63),
            AvcAddr::Subunit(AvcAddrSubunit::new(AvcSubunitType::Music, 0x03))
        );
        assert_eq!(
            AvcAddr::from(0x87),
            AvcAddr::Subunit(AvcAddrSubunit::new(AvcSubunitType::Reserved(0x10), 0x07))
        );
    }

    #[test]
    fn unitinfo_operands() {
        let operands = [0x07, 0x60, 0x00, 0x01, 0x02];
        let mut op = UnitInfo::new();
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(op.unit_type, AvcSubunitType::Music);
        assert_eq!(op.unit_id, 0x00);
        assert_eq!(op.company_id, [0x00, 0x01, 0x02]);
    }

    #[test]
    fn subunitinfo_operands() {
        let operands = [0x00, 0x60, 0x08, 0xff, 0xff];
        let mut op = SubunitInfo::new(0, 0);
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        assert_eq!(
            op.entries,
            vec![
                SubunitInfoEntry::new(AvcSubunitType::Music, 0x00),
                SubunitInfoEntry::new(AvcSubunitType::Audio, 0x00),
            ]
        );
    }

    #[test]
    fn pluginfo_operands() {
        let operands = [0x00, 0x02, 0x02, 0x04, 0x05];
        let mut op = PlugInfo::new_for_unit_isoc_ext_plugs();
        AvcStatus::parse_operands(&mut op, &AvcAddr::Unit, &operands).unwrap();
        if let PlugInfo::Unit(PlugInfoUnitData::IsocExt(d)) = &op {
            assert_eq!(d.isoc_input_plugs, 0x02);
            assert_eq!(d.isoc_output_plugs, 0x02);
            assert_eq!(d.external_input_plugs, 0x04);
            assert_eq!(d.external_output_plugs, 0x05);
        } else {
            unreachable!();
        }

        let operands = [0x00, 0x03, 0x02, 0xff, 0xff];
        let mut op = PlugInfo::new_for_subunit_plugs();
        let addr = AvcAddr::Subunit(MUSIC_SUBUNIT_0);
        AvcStatus::parse_operands(&mut op, &addr, &operands).unwrap();
        if let PlugInfo::Subunit(d) = &op {
            assert_eq!(d.dst_plugs, 0x03);
            assert_eq!(d.src_plugs, 0x02);
        } else {
            unreachable!();
        }
    }
}
