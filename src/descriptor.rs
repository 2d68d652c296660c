// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! AV/C extended commands to describe the signal topology of the unit.
//!
//! The module includes structure, enumeration, and trait implementation for the extended plug
//! information and extended subunit information commands. The commands expose plugs of unit,
//! subunits, and function blocks with their type, name, channels, clusters, and connections,
//! and are the building blocks of topology discovery.

use super::avc::general::*;

/// Type of address to plug for unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlugAddrUnitType {
    /// Address to unit for isochronous input/output.
    Isoc,
    /// Address to unit for external input/output.
    Ext,
    /// Address to unit for asynchronous input/output.
    Async,
}

impl PlugAddrUnitType {
    const ISOC: u8 = 0x00;
    const EXT: u8 = 0x01;
    const ASYNC: u8 = 0x02;

    fn from_val(val: u8) -> Result<Self, AvcRespParseError> {
        let unit_type = match val {
            Self::ISOC => Self::Isoc,
            Self::EXT => Self::Ext,
            Self::ASYNC => Self::Async,
            _ => Err(AvcRespParseError::UnexpectedOperands(0))?,
        };
        Ok(unit_type)
    }

    fn to_val(&self) -> u8 {
        match self {
            Self::Isoc => Self::ISOC,
            Self::Ext => Self::EXT,
            Self::Async => Self::ASYNC,
        }
    }
}

impl Default for PlugAddrUnitType {
    fn default() -> Self {
        Self::Isoc
    }
}

/// Address to plug for unit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlugAddrUnit {
    /// The type of unit to address to.
    pub plug_type: PlugAddrUnitType,
    /// The numeric identifier of plug in the unit.
    pub plug_id: u8,
}

impl PlugAddrUnit {
    const LENGTH: usize = 3;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let plug_type = PlugAddrUnitType::from_val(raw[0])?;
        let plug_id = raw[1];

        Ok(Self { plug_type, plug_id })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        [self.plug_type.to_val(), self.plug_id, 0xff]
    }
}

impl Default for PlugAddrUnit {
    fn default() -> Self {
        Self {
            plug_type: Default::default(),
            plug_id: 0xff,
        }
    }
}

/// Address to plug for subunit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PlugAddrSubunit {
    /// The numeric identifier of plug in the subunit.
    pub plug_id: u8,
}

impl PlugAddrSubunit {
    const LENGTH: usize = 3;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        Ok(PlugAddrSubunit { plug_id: raw[0] })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        [self.plug_id, 0xff, 0xff]
    }
}

impl Default for PlugAddrSubunit {
    fn default() -> Self {
        Self { plug_id: 0xff }
    }
}

/// Address to plug for function block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PlugAddrFuncBlk {
    /// The numeric type of function block.
    pub func_blk_type: u8,
    /// The numeric identifier of function block.
    pub func_blk_id: u8,
    /// The numeric identifier of plug in the function block.
    pub plug_id: u8,
}

impl PlugAddrFuncBlk {
    const LENGTH: usize = 3;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        Ok(Self {
            func_blk_type: raw[0],
            func_blk_id: raw[1],
            plug_id: raw[2],
        })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        [self.func_blk_type, self.func_blk_id, self.plug_id]
    }
}

impl Default for PlugAddrFuncBlk {
    fn default() -> Self {
        Self {
            func_blk_type: 0xff,
            func_blk_id: 0xff,
            plug_id: 0xff,
        }
    }
}

/// Mode of address to plug.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlugAddrMode {
    /// Address to unit.
    Unit(PlugAddrUnit),
    /// Address to subunit.
    Subunit(PlugAddrSubunit),
    /// Address to function block.
    FuncBlk(PlugAddrFuncBlk),
}

impl PlugAddrMode {
    const LENGTH: usize = 4;

    const UNIT: u8 = 0x00;
    const SUBUNIT: u8 = 0x01;
    const FUNCBLK: u8 = 0x02;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let mode = match raw[0] {
            Self::UNIT => {
                let data = PlugAddrUnit::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;
                Self::Unit(data)
            }
            Self::SUBUNIT => {
                let data = PlugAddrSubunit::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;
                Self::Subunit(data)
            }
            Self::FUNCBLK => {
                let data = PlugAddrFuncBlk::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;
                Self::FuncBlk(data)
            }
            _ => Err(AvcRespParseError::UnexpectedOperands(0))?,
        };

        Ok(mode)
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        let mut raw = [0; Self::LENGTH];
        match self {
            Self::Unit(d) => {
                raw[0] = Self::UNIT;
                raw[1..].copy_from_slice(&d.to_raw());
            }
            Self::Subunit(d) => {
                raw[0] = Self::SUBUNIT;
                raw[1..].copy_from_slice(&d.to_raw());
            }
            Self::FuncBlk(d) => {
                raw[0] = Self::FUNCBLK;
                raw[1..].copy_from_slice(&d.to_raw());
            }
        }
        raw
    }
}

impl Default for PlugAddrMode {
    fn default() -> Self {
        Self::Unit(Default::default())
    }
}

/// Direction of plug.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlugDirection {
    /// For input plug.
    Input,
    /// For output plug.
    Output,
}

impl PlugDirection {
    const INPUT: u8 = 0x00;
    const OUTPUT: u8 = 0x01;

    fn from_val(val: u8) -> Result<Self, AvcRespParseError> {
        let direction = match val {
            Self::INPUT => Self::Input,
            Self::OUTPUT => Self::Output,
            _ => Err(AvcRespParseError::UnexpectedOperands(0))?,
        };
        Ok(direction)
    }

    fn to_val(&self) -> u8 {
        match self {
            Self::Input => Self::INPUT,
            Self::Output => Self::OUTPUT,
        }
    }
}

impl Default for PlugDirection {
    fn default() -> Self {
        Self::Input
    }
}

/// Address of plug.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PlugAddr {
    /// The direction of plug.
    pub direction: PlugDirection,
    /// The mode to address for the plug.
    pub mode: PlugAddrMode,
}

impl PlugAddr {
    const LENGTH: usize = 5;

    /// Instantiate address structure to plug for unit.
    pub fn new_for_unit(
        direction: PlugDirection,
        plug_type: PlugAddrUnitType,
        plug_id: u8,
    ) -> Self {
        Self {
            direction,
            mode: PlugAddrMode::Unit(PlugAddrUnit { plug_type, plug_id }),
        }
    }

    /// Instantiate address structure to plug for subunit.
    pub fn new_for_subunit(direction: PlugDirection, plug_id: u8) -> Self {
        Self {
            direction,
            mode: PlugAddrMode::Subunit(PlugAddrSubunit { plug_id }),
        }
    }

    /// Instantiate address structure to plug for function block.
    pub fn new_for_func_blk(
        direction: PlugDirection,
        func_blk_type: u8,
        func_blk_id: u8,
        plug_id: u8,
    ) -> Self {
        Self {
            direction,
            mode: PlugAddrMode::FuncBlk(PlugAddrFuncBlk {
                func_blk_type,
                func_blk_id,
                plug_id,
            }),
        }
    }

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let direction = PlugDirection::from_val(raw[0])?;
        let mode = PlugAddrMode::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;

        Ok(Self { direction, mode })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        let mut raw = [0; Self::LENGTH];
        raw[0] = self.direction.to_val();
        raw[1..].copy_from_slice(&self.mode.to_raw());
        raw
    }
}

/// Mode to address to plug for input and output direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum IoPlugAddrMode {
    /// Address to unit.
    Unit(PlugAddrUnit),
    /// Address to subunit.
    Subunit(AvcAddrSubunit, PlugAddrSubunit),
    /// Address to function block.
    FuncBlk(AvcAddrSubunit, PlugAddrFuncBlk),
}

impl IoPlugAddrMode {
    const LENGTH: usize = 6;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let mode = match raw[0] {
            PlugAddrMode::UNIT => {
                let data = PlugAddrUnit::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;
                Self::Unit(data)
            }
            PlugAddrMode::SUBUNIT => {
                let subunit = AvcAddrSubunit {
                    subunit_type: AvcSubunitType::from(raw[1]),
                    subunit_id: raw[2],
                };
                let data = PlugAddrSubunit::from_raw(&raw[3..]).map_err(|err| err.add_offset(3))?;
                Self::Subunit(subunit, data)
            }
            PlugAddrMode::FUNCBLK => {
                let subunit = AvcAddrSubunit {
                    subunit_type: AvcSubunitType::from(raw[1]),
                    subunit_id: raw[2],
                };
                let data = PlugAddrFuncBlk::from_raw(&raw[3..]).map_err(|err| err.add_offset(3))?;
                Self::FuncBlk(subunit, data)
            }
            _ => Err(AvcRespParseError::UnexpectedOperands(0))?,
        };

        Ok(mode)
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        let mut raw = [0xff; Self::LENGTH];
        match self {
            Self::Unit(d) => {
                raw[0] = PlugAddrMode::UNIT;
                raw[1..4].copy_from_slice(&d.to_raw());
            }
            Self::Subunit(s, d) => {
                raw[0] = PlugAddrMode::SUBUNIT;
                raw[1] = s.subunit_type.into();
                raw[2] = s.subunit_id;
                raw[3..6].copy_from_slice(&d.to_raw());
            }
            Self::FuncBlk(s, d) => {
                raw[0] = PlugAddrMode::FUNCBLK;
                raw[1] = s.subunit_type.into();
                raw[2] = s.subunit_id;
                raw[3..6].copy_from_slice(&d.to_raw());
            }
        }
        raw
    }
}

impl Default for IoPlugAddrMode {
    fn default() -> Self {
        Self::Unit(Default::default())
    }
}

/// Address to plug for input and output direction.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct IoPlugAddr {
    /// The direction of plug.
    pub direction: PlugDirection,
    /// The mode to address for the plug.
    pub mode: IoPlugAddrMode,
}

impl IoPlugAddr {
    const LENGTH: usize = 7;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let direction = PlugDirection::from_val(raw[0])?;
        let mode = IoPlugAddrMode::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;

        Ok(Self { direction, mode })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        let mut raw = [0; Self::LENGTH];
        raw[0] = self.direction.to_val();
        raw[1..].copy_from_slice(&self.mode.to_raw());
        raw
    }
}

/// The semantic type of plug.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlugType {
    /// For isochronous stream.
    IsoStream,
    /// For asynchronous stream.
    AsyncStream,
    /// For MIDI messages.
    Midi,
    /// For synchronization signal.
    Sync,
    /// For analog signal.
    Analog,
    /// For digital signal.
    Digital,
    /// For clock signal.
    Clock,
}

impl PlugType {
    const ISO_STREAM: u8 = 0x00;
    const ASYNC_STREAM: u8 = 0x01;
    const MIDI: u8 = 0x02;
    const SYNC: u8 = 0x03;
    const ANALOG: u8 = 0x04;
    const DIGITAL: u8 = 0x05;
    const CLOCK: u8 = 0x06;

    fn from_val(val: u8) -> Result<Self, AvcRespParseError> {
        let plug_type = match val {
            Self::ISO_STREAM => Self::IsoStream,
            Self::ASYNC_STREAM => Self::AsyncStream,
            Self::MIDI => Self::Midi,
            Self::SYNC => Self::Sync,
            Self::ANALOG => Self::Analog,
            Self::DIGITAL => Self::Digital,
            Self::CLOCK => Self::Clock,
            _ => Err(AvcRespParseError::UnexpectedOperands(0))?,
        };
        Ok(plug_type)
    }

    fn to_val(&self) -> u8 {
        match self {
            Self::IsoStream => Self::ISO_STREAM,
            Self::AsyncStream => Self::ASYNC_STREAM,
            Self::Midi => Self::MIDI,
            Self::Sync => Self::SYNC,
            Self::Analog => Self::ANALOG,
            Self::Digital => Self::DIGITAL,
            Self::Clock => Self::CLOCK,
        }
    }
}

impl Default for PlugType {
    fn default() -> Self {
        Self::IsoStream
    }
}

/// Physical location of data channel for multi bit linear audio.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelLocation {
    LeftFront,
    RightFront,
    Center,
    LowFrequencyEffect,
    LeftSurround,
    RightSurround,
    LeftCenter,
    RightCenter,
    Surround,
    SideLeft,
    SideRight,
    Top,
    Bottom,
    LeftFrontEffect,
    RightFrontEffect,
    NoPosition,
}

impl ChannelLocation {
    const L: u8 = 0x01;
    const R: u8 = 0x02;
    const C: u8 = 0x03;
    const LFE: u8 = 0x04;
    const LS: u8 = 0x05;
    const RS: u8 = 0x06;
    const LC: u8 = 0x07;
    const RC: u8 = 0x08;
    const S: u8 = 0x09;
    const SL: u8 = 0x0a;
    const SR: u8 = 0x0b;
    const T: u8 = 0x0c;
    const B: u8 = 0x0d;
    const FEL: u8 = 0x0e;
    const FER: u8 = 0x0f;
    const NO_POSITION: u8 = 0xff;

    fn from_val(val: u8) -> Result<Self, AvcRespParseError> {
        let loc = match val {
            Self::L => Self::LeftFront,
            Self::R => Self::RightFront,
            Self::C => Self::Center,
            Self::LFE => Self::LowFrequencyEffect,
            Self::LS => Self::LeftSurround,
            Self::RS => Self::RightSurround,
            Self::LC => Self::LeftCenter,
            Self::RC => Self::RightCenter,
            Self::S => Self::Surround,
            Self::SL => Self::SideLeft,
            Self::SR => Self::SideRight,
            Self::T => Self::Top,
            Self::B => Self::Bottom,
            Self::FEL => Self::LeftFrontEffect,
            Self::FER => Self::RightFrontEffect,
            Self::NO_POSITION => Self::NoPosition,
            _ => Err(AvcRespParseError::UnexpectedOperands(0))?,
        };
        Ok(loc)
    }

    fn to_val(&self) -> u8 {
        match self {
            Self::LeftFront => Self::L,
            Self::RightFront => Self::R,
            Self::Center => Self::C,
            Self::LowFrequencyEffect => Self::LFE,
            Self::LeftSurround => Self::LS,
            Self::RightSurround => Self::RS,
            Self::LeftCenter => Self::LC,
            Self::RightCenter => Self::RC,
            Self::Surround => Self::S,
            Self::SideLeft => Self::SL,
            Self::SideRight => Self::SR,
            Self::Top => Self::T,
            Self::Bottom => Self::B,
            Self::LeftFrontEffect => Self::FEL,
            Self::RightFrontEffect => Self::FER,
            Self::NoPosition => Self::NO_POSITION,
        }
    }
}

impl Default for ChannelLocation {
    fn default() -> Self {
        Self::NoPosition
    }
}

/// Information about data channel for multi bit linear audio.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ChannelPosition {
    /// The position of channel in data frame.
    pub pos: u8,
    /// The location of channel for playback or capture.
    pub loc: ChannelLocation,
}

impl ChannelPosition {
    const LENGTH: usize = 2;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        let pos = raw[0];
        let loc = ChannelLocation::from_val(raw[1]).map_err(|err| err.add_offset(1))?;

        Ok(Self { pos, loc })
    }

    fn to_raw(&self) -> [u8; Self::LENGTH] {
        [self.pos, self.loc.to_val()]
    }
}

impl Default for ChannelPosition {
    fn default() -> Self {
        Self {
            pos: 0xff,
            loc: Default::default(),
        }
    }
}

/// Cluster with single or multiple data channels.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// The entries of cluster.
    pub entries: Vec<ChannelPosition>,
}

impl Cluster {
    const LENGTH_MIN: usize = 1;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH_MIN {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH_MIN))?;
        }

        let count = raw[0] as usize;

        let mut entries = Vec::with_capacity(count);
        let mut pos = 1;
        while pos + ChannelPosition::LENGTH <= raw.len() {
            let entry = ChannelPosition::from_raw(&raw[pos..]).map_err(|err| err.add_offset(pos))?;
            entries.push(entry);
            pos += ChannelPosition::LENGTH;
        }

        if entries.len() != count {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }

        Ok(Self { entries })
    }

    fn to_raw(&self) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.push(self.entries.len() as u8);
        self.entries.iter().fold(raw, |mut raw, entry| {
            raw.extend_from_slice(&entry.to_raw());
            raw
        })
    }
}

/// Name of data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelName {
    /// The channel in data frame.
    pub ch: u8,
    /// The name of channel.
    pub name: String,
}

impl Default for ChannelName {
    fn default() -> Self {
        Self {
            ch: 0xff,
            name: Default::default(),
        }
    }
}

/// Type of physical port.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PortType {
    Speaker,
    Headphone,
    Microphone,
    Line,
    Spdif,
    Adat,
    Tdif,
    Madi,
    Analog,
    Digital,
    Midi,
    NoType,
}

impl PortType {
    const SPEAKER: u8 = 0x00;
    const HEADPHONE: u8 = 0x01;
    const MICROPHONE: u8 = 0x02;
    const LINE: u8 = 0x03;
    const SPDIF: u8 = 0x04;
    const ADAT: u8 = 0x05;
    const TDIF: u8 = 0x06;
    const MADI: u8 = 0x07;
    const ANALOG: u8 = 0x08;
    const DIGITAL: u8 = 0x09;
    const MIDI: u8 = 0x0a;
    const NO_TYPE: u8 = 0xff;

    fn from_val(val: u8) -> Result<Self, AvcRespParseError> {
        let port_type = match val {
            Self::SPEAKER => Self::Speaker,
            Self::HEADPHONE => Self::Headphone,
            Self::MICROPHONE => Self::Microphone,
            Self::LINE => Self::Line,
            Self::SPDIF => Self::Spdif,
            Self::ADAT => Self::Adat,
            Self::TDIF => Self::Tdif,
            Self::MADI => Self::Madi,
            Self::ANALOG => Self::Analog,
            Self::DIGITAL => Self::Digital,
            Self::MIDI => Self::Midi,
            Self::NO_TYPE => Self::NoType,
            _ => Err(AvcRespParseError::UnexpectedOperands(0))?,
        };
        Ok(port_type)
    }

    fn to_val(&self) -> u8 {
        match self {
            Self::Speaker => Self::SPEAKER,
            Self::Headphone => Self::HEADPHONE,
            Self::Microphone => Self::MICROPHONE,
            Self::Line => Self::LINE,
            Self::Spdif => Self::SPDIF,
            Self::Adat => Self::ADAT,
            Self::Tdif => Self::TDIF,
            Self::Madi => Self::MADI,
            Self::Analog => Self::ANALOG,
            Self::Digital => Self::DIGITAL,
            Self::Midi => Self::MIDI,
            Self::NoType => Self::NO_TYPE,
        }
    }
}

impl Default for PortType {
    fn default() -> Self {
        Self::NoType
    }
}

/// Information about cluster of data channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    /// The index of cluster.
    pub index: u8,
    /// The type of port for the cluster.
    pub port_type: PortType,
    /// The name of cluster.
    pub name: String,
}

impl ClusterInfo {
    const LENGTH_MIN: usize = 3;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH_MIN {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH_MIN))?;
        }

        let index = raw[0];
        let port_type = PortType::from_val(raw[1]).map_err(|err| err.add_offset(1))?;
        let pos = Self::LENGTH_MIN + raw[2] as usize;
        let name = if pos > raw.len() {
            "".to_string()
        } else {
            String::from_utf8(raw[Self::LENGTH_MIN..pos].to_vec()).unwrap_or("".to_string())
        };
        Ok(Self {
            index,
            port_type,
            name,
        })
    }

    fn to_raw(&self) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.push(self.index);
        raw.push(self.port_type.to_val());
        raw.push(self.name.len() as u8);
        raw.append(&mut self.name.clone().into_bytes());
        raw
    }
}

impl Default for ClusterInfo {
    fn default() -> Self {
        Self {
            index: 0xff,
            port_type: Default::default(),
            name: Default::default(),
        }
    }
}

/// Type of information about plug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlugInfoData {
    /// The type of plug.
    Type(PlugType),
    /// The name of plug.
    Name(String),
    /// The number of channels in the plug.
    ChCount(u8),
    /// The position of channels in each cluster in the plug.
    ChPositions(Vec<Cluster>),
    /// The name of channel in the plug.
    ChName(ChannelName),
    /// The plug information as signal source to the plug.
    Input(IoPlugAddr),
    /// The plug information as signal destination from the plug.
    Outputs(Vec<IoPlugAddr>),
    /// The data of each cluster in the plug.
    ClusterInfo(ClusterInfo),
    Reserved(Vec<u8>),
}

impl PlugInfoData {
    const TYPE: u8 = 0x00;
    const NAME: u8 = 0x01;
    const CH_COUNT: u8 = 0x02;
    const CH_POSITIONS: u8 = 0x03;
    const CH_NAME: u8 = 0x04;
    const INPUT: u8 = 0x05;
    const OUTPUTS: u8 = 0x06;
    const CLUSTER_INFO: u8 = 0x07;

    const LENGTH_MIN: usize = 2;

    fn info_type(&self) -> u8 {
        match self {
            Self::Type(_) => Self::TYPE,
            Self::Name(_) => Self::NAME,
            Self::ChCount(_) => Self::CH_COUNT,
            Self::ChPositions(_) => Self::CH_POSITIONS,
            Self::ChName(_) => Self::CH_NAME,
            Self::Input(_) => Self::INPUT,
            Self::Outputs(_) => Self::OUTPUTS,
            Self::ClusterInfo(_) => Self::CLUSTER_INFO,
            Self::Reserved(d) => d[0],
        }
    }

    fn to_raw(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(Self::LENGTH_MIN);
        match self {
            Self::Type(plug_type) => {
                raw.push(Self::TYPE);
                raw.push(plug_type.to_val());
            }
            Self::Name(n) => {
                raw.push(Self::NAME);
                raw.push(n.len() as u8);
                raw.append(&mut n.clone().into_bytes());
            }
            Self::ChCount(c) => {
                raw.push(Self::CH_COUNT);
                raw.push(*c);
            }
            Self::ChPositions(entries) => {
                raw.push(Self::CH_POSITIONS);
                raw.push(entries.len() as u8);
                entries
                    .iter()
                    .for_each(|entry| raw.append(&mut entry.to_raw()));
            }
            Self::ChName(d) => {
                raw.push(Self::CH_NAME);
                raw.push(d.ch);
                raw.push(d.name.len() as u8);
                raw.append(&mut d.name.clone().into_bytes());
            }
            Self::Input(plug_addr) => {
                raw.push(Self::INPUT);
                raw.extend_from_slice(&plug_addr.to_raw());
            }
            Self::Outputs(plug_addrs) => {
                raw.push(Self::OUTPUTS);
                raw.push(plug_addrs.len() as u8);
                plug_addrs
                    .iter()
                    .for_each(|plug_addr| raw.extend_from_slice(&plug_addr.to_raw()));
            }
            Self::ClusterInfo(d) => {
                raw.push(Self::CLUSTER_INFO);
                raw.append(&mut d.to_raw());
            }
            Self::Reserved(d) => raw.extend_from_slice(&d),
        }
        raw
    }

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH_MIN {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH_MIN))?;
        }

        let info = match raw[0] {
            Self::TYPE => {
                let plug_type = PlugType::from_val(raw[1]).map_err(|err| err.add_offset(1))?;
                Self::Type(plug_type)
            }
            Self::NAME => {
                let pos = Self::LENGTH_MIN + raw[1] as usize;
                let name = if pos > raw.len() {
                    "".to_string()
                } else {
                    String::from_utf8(raw[2..pos].to_vec()).unwrap_or("".to_string())
                };
                Self::Name(name)
            }
            Self::CH_COUNT => Self::ChCount(raw[1]),
            Self::CH_POSITIONS => {
                let count = raw[1] as usize;
                let mut entries = Vec::with_capacity(count);
                let mut pos = 2;
                while pos < raw.len() && entries.len() < count {
                    let c = raw[pos] as usize;
                    let size = 1 + 2 * c;
                    if pos + size > raw.len() {
                        Err(AvcRespParseError::TooShortResp(pos + size))?;
                    }
                    let entry = Cluster::from_raw(&raw[pos..(pos + size)])
                        .map_err(|err| err.add_offset(pos))?;
                    entries.push(entry);
                    pos += size;
                }
                Self::ChPositions(entries)
            }
            Self::CH_NAME => {
                let ch = raw[1];
                let pos = 3 + raw[2] as usize;
                let name = if pos > raw.len() {
                    "".to_string()
                } else {
                    String::from_utf8(raw[3..pos].to_vec()).unwrap_or("".to_string())
                };
                Self::ChName(ChannelName { ch, name })
            }
            Self::INPUT => {
                let addr = IoPlugAddr::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;
                Self::Input(addr)
            }
            Self::OUTPUTS => {
                let count = raw[1] as usize;
                let mut entries = Vec::with_capacity(count);
                let mut pos = 2;
                while pos + IoPlugAddr::LENGTH <= raw.len() && entries.len() != count {
                    let entry = IoPlugAddr::from_raw(&raw[pos..(pos + IoPlugAddr::LENGTH)])
                        .map_err(|err| err.add_offset(pos))?;
                    entries.push(entry);
                    pos += IoPlugAddr::LENGTH;
                }
                Self::Outputs(entries)
            }
            Self::CLUSTER_INFO => {
                let info = ClusterInfo::from_raw(&raw[1..]).map_err(|err| err.add_offset(1))?;
                Self::ClusterInfo(info)
            }
            _ => Self::Reserved(raw.to_vec()),
        };

        Ok(info)
    }
}

impl Default for PlugInfoData {
    fn default() -> Self {
        Self::Type(Default::default())
    }
}

/// AV/C command for extended plug information.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPlugInfo {
    /// The address of plug.
    pub addr: PlugAddr,
    /// The type of plug information.
    pub info: PlugInfoData,
}

impl ExtendedPlugInfo {
    const SUBFUNC: u8 = 0xc0;

    /// Instantiate extended plug info structure with parameters.
    pub fn new(addr: &PlugAddr, info: PlugInfoData) -> Self {
        Self { addr: *addr, info }
    }
}

impl AvcOp for ExtendedPlugInfo {
    const OPCODE: u8 = PlugInfo::OPCODE;
}

impl AvcStatus for ExtendedPlugInfo {
    fn build_operands(
        &mut self,
        _: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError> {
        operands.push(Self::SUBFUNC);
        operands.extend_from_slice(&self.addr.to_raw());
        operands.append(&mut self.info.to_raw());
        Ok(())
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() < 8 {
            Err(AvcRespParseError::TooShortResp(8))?;
        }

        if operands[0] != Self::SUBFUNC {
            Err(AvcRespParseError::UnexpectedOperands(0))?;
        }

        let addr = PlugAddr::from_raw(&operands[1..]).map_err(|err| err.add_offset(1))?;
        if addr != self.addr {
            Err(AvcRespParseError::UnexpectedOperands(1))?;
        }

        if self.info.info_type() != operands[6] {
            Err(AvcRespParseError::UnexpectedOperands(6))?;
        }

        self.info = PlugInfoData::from_raw(&operands[6..]).map_err(|err| err.add_offset(6))?;

        Ok(())
    }
}

/// Entry for information about function block in subunit.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtendedSubunitInfoEntry {
    /// The type of function block.
    pub func_blk_type: u8,
    /// The numeric identifier of function block.
    pub func_blk_id: u8,
    /// The purpose of function block.
    pub func_blk_purpose: u8,
    /// The number of input plugs.
    pub input_plugs: u8,
    /// The number of output plugs.
    pub output_plugs: u8,
}

impl ExtendedSubunitInfoEntry {
    const LENGTH: usize = 5;

    fn from_raw(raw: &[u8]) -> Result<Self, AvcRespParseError> {
        if raw.len() < Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))?;
        }

        Ok(Self {
            func_blk_type: raw[0],
            func_blk_id: raw[1],
            func_blk_purpose: raw[2],
            input_plugs: raw[3],
            output_plugs: raw[4],
        })
    }
}

impl Default for ExtendedSubunitInfoEntry {
    fn default() -> Self {
        Self {
            func_blk_type: 0xff,
            func_blk_id: 0xff,
            func_blk_purpose: 0xff,
            input_plugs: 0xff,
            output_plugs: 0xff,
        }
    }
}

/// AV/C command for extended subunit information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedSubunitInfo {
    /// The numeric identifier of page.
    pub page: u8,
    /// The type of function block.
    pub func_blk_type: u8,
    /// The entries for function block information.
    pub entries: Vec<ExtendedSubunitInfoEntry>,
}

impl ExtendedSubunitInfo {
    const LENGTH: usize = 27;

    /// The maximum number of pages for function block enumeration.
    pub const MAXIMUM_PAGE_COUNT: usize = 0xff;

    pub fn new(page: u8, func_blk_type: u8) -> Self {
        Self {
            page,
            func_blk_type,
            ..Default::default()
        }
    }
}

impl Default for ExtendedSubunitInfo {
    fn default() -> Self {
        Self {
            page: 0xff,
            func_blk_type: 0xff,
            entries: Default::default(),
        }
    }
}

impl AvcOp for ExtendedSubunitInfo {
    const OPCODE: u8 = SubunitInfo::OPCODE;
}

impl AvcStatus for ExtendedSubunitInfo {
    fn build_operands(
        &mut self,
        _: &AvcAddr,
        operands: &mut Vec<u8>,
    ) -> Result<(), AvcCmdBuildError> {
        let mut raw = vec![0xff; Self::LENGTH];
        raw[0] = self.page;
        raw[1] = self.func_blk_type;
        operands.extend_from_slice(&raw);
        Ok(())
    }

    fn parse_operands(&mut self, _: &AvcAddr, operands: &[u8]) -> Result<(), AvcRespParseError> {
        if operands.len() != Self::LENGTH {
            Err(AvcRespParseError::TooShortResp(Self::LENGTH))
        } else if self.page != operands[0] {
            Err(AvcRespParseError::UnexpectedOperands(0))
        } else if self.func_blk_type != operands[1] {
            Err(AvcRespParseError::UnexpectedOperands(1))
        } else {
            let mut entries = Vec::new();
            let mut pos = 2;
            while pos + ExtendedSubunitInfoEntry::LENGTH <= operands.len() {
                if operands[pos] != 0xff {
                    let entry = ExtendedSubunitInfoEntry::from_raw(&operands[pos..])
                        .map_err(|err| err.add_offset(pos))?;
                    entries.push(entry);
                }
                pos += ExtendedSubunitInfoEntry::LENGTH;
            }
            self.entries = entries;
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plugaddr_from() {
        let raw = [0x01, 0x00, 0x01, 0x02, 0xff];
        let addr = PlugAddr::from_raw(&raw).unwrap();
        assert_eq!(addr.direction, PlugDirection::Output);
        assert_eq!(
            addr.mode,
            PlugAddrMode::Unit(PlugAddrUnit {
                plug_type: PlugAddrUnitType::Ext,
                plug_id: 0x02,
            })
        );
        assert_eq!(raw, addr.to_raw());

        let raw = [0x00, 0x02, 0x06, 0x03, 0x02];
        let addr = PlugAddr::from_raw(&raw).unwrap();
        assert_eq!(addr.direction, PlugDirection::Input);
        assert_eq!(
            addr.mode,
            PlugAddrMode::FuncBlk(PlugAddrFuncBlk {
                func_blk_type: 0x06,
                func_blk_id: 0x03,
                plug_id: 0x02,
            })
        );
        assert_eq!(raw, addr.to_raw());
    }

    #[test]
    fn ioplugaddr_from() {
        let raw = [0x00, 0x01, 0x0c, 0x00, 0x02, 0xff, 0xff];
        let addr = IoPlugAddr::from_raw(&raw).unwrap();
        assert_eq!(addr.direction, PlugDirection::Input);
        assert_eq!(
            addr.mode,
            IoPlugAddrMode::Subunit(
                AvcAddrSubunit {
                    subunit_type: AvcSubunitType::from(0x0c),
                    subunit_id: 0x00,
                },
                PlugAddrSubunit { plug_id: 0x02 },
            )
        );
    }

    #[test]
    fn pluginfodata_type_from() {
        let raw = [0x00, 0x03];
        let info = PlugInfoData::from_raw(&raw).unwrap();
        assert_eq!(info, PlugInfoData::Type(PlugType::Sync));
        assert_eq!(info.to_raw(), raw.to_vec());
    }

    #[test]
    fn pluginfodata_name_from() {
        let raw = [0x01, 0x04, 0x41, 0x44, 0x41, 0x54];
        let info = PlugInfoData::from_raw(&raw).unwrap();
        assert_eq!(info, PlugInfoData::Name("ADAT".to_string()));
        assert_eq!(info.to_raw(), raw.to_vec());
    }

    #[test]
    fn pluginfodata_positions_from() {
        // Two clusters, each with a stereo pair of channels.
        let raw = [
            0x03, 0x02, 0x02, 0x00, 0x01, 0x01, 0x02, 0x02, 0x02, 0x0a, 0x03, 0x0b,
        ];
        let info = PlugInfoData::from_raw(&raw).unwrap();
        if let PlugInfoData::ChPositions(clusters) = &info {
            assert_eq!(clusters.len(), 2);
            assert_eq!(clusters[0].entries.len(), 2);
            assert_eq!(clusters[0].entries[0].pos, 0x00);
            assert_eq!(clusters[0].entries[0].loc, ChannelLocation::LeftFront);
            assert_eq!(clusters[1].entries[1].pos, 0x03);
            assert_eq!(clusters[1].entries[1].loc, ChannelLocation::SideRight);
        } else {
            unreachable!();
        }
        assert_eq!(info.to_raw(), raw.to_vec());
    }

    #[test]
    fn extendedsubunitinfo_operands() {
        let mut operands = vec![0x00, 0xff];
        operands.extend_from_slice(&[0x81, 0x00, 0x02, 0x01, 0x01]);
        operands.extend_from_slice(&[0x82, 0x01, 0x03, 0x02, 0x02]);
        operands.resize(27, 0xff);

        let mut op = ExtendedSubunitInfo::new(0, 0xff);
        AvcStatus::parse_operands(&mut op, &AvcAddr::Subunit(MUSIC_SUBUNIT_0), &operands).unwrap();
        assert_eq!(op.entries.len(), 2);
        assert_eq!(op.entries[0].func_blk_type, 0x81);
        assert_eq!(op.entries[0].func_blk_id, 0x00);
        assert_eq!(op.entries[0].func_blk_purpose, 0x02);
        assert_eq!(op.entries[0].input_plugs, 0x01);
        assert_eq!(op.entries[0].output_plugs, 0x01);
        assert_eq!(op.entries[1].func_blk_type, 0x82);
    }
}
