// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Capability profiles of supported models.
//!
//! The profile is a static table selected by the pair of vendor and model identifiers at the
//! time the unit is attached; the unknown pair falls back to the generic profile. The profile
//! carries what the unit itself never reports; the list of labels for ports, the arithmetic
//! between indices and register offsets, the aliases for sources of standalone clock, and the
//! categories of configuration which are storable at all.

use super::extension::*;

/// The mechanism to control the unit.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ControlScheme {
    /// Control extension in the private register space.
    CtlExtension,
    /// Write-only parameter block mirrored by the cache owned in software.
    WriteOnlyCache,
}

/// Category of configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ConfigCategory {
    Router,
    Mixer,
    StreamConfig,
}

impl std::fmt::Display for ConfigCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConfigCategory::Router => "router",
            ConfigCategory::Mixer => "mixer",
            ConfigCategory::StreamConfig => "stream-config",
        };
        write!(f, "{}", label)
    }
}

/// Configurable parameter of clock source in standalone section.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ClockSourceParam {
    /// Mode of AES input at high rate.
    AesHighRate,
    /// Mode of ADAT input for supported rates.
    AdatMode,
    /// Mode of word clock input.
    WordClockMode,
    /// Rate of word clock input by numerator and denominator.
    WordClockRate,
    /// Rate of internally generated clock.
    InternalRate,
}

/// Source of standalone clock with its name, byte alias, and configurable parameters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ClockSourceSpec {
    /// The name of source.
    pub name: &'static str,
    /// The byte alias written to the standalone section.
    pub alias: u8,
    /// The schema of configurable parameters for the source.
    pub params: &'static [ClockSourceParam],
}

/// Descriptor for physical input port.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PhysInput {
    /// Identifier of source block.
    pub id: SrcBlkId,
    /// Offset of channel number.
    pub offset: u8,
    /// Count of channel number.
    pub count: u8,
    /// Stem of label for stereo pairs of the port.
    pub label: &'static str,
}

/// Descriptor for physical output port.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PhysOutput {
    /// Identifier of destination block.
    pub id: DstBlkId,
    /// Offset of channel number.
    pub offset: u8,
    /// Count of channel number.
    pub count: u8,
    /// Stem of label for stereo pairs of the port.
    pub label: &'static str,
}

/// Static capability profile per model.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    /// The name of model category.
    pub name: &'static str,
    /// The mechanism to control the unit.
    pub scheme: ControlScheme,
    /// Physical input ports.
    pub inputs: &'static [PhysInput],
    /// Physical output ports.
    pub outputs: &'static [PhysOutput],
    /// Source blocks with fixed position in route entries; e.g. targets for meter display.
    pub fixed: &'static [SrcBlk],
    /// The number of mixer outputs per rate mode.
    pub mixer_out_ports: [u8; 3],
    /// The destination blocks of mixer inputs with their channel count.
    pub mixer_in_ports: &'static [(DstBlkId, u8)],
    /// The number of ADAT channels per rate mode.
    pub adat_channels: [u8; 3],
    /// Sources of standalone clock.
    pub clock_sources: &'static [ClockSourceSpec],
    /// Categories of configuration which the model is able to store at all.
    pub storable: &'static [ConfigCategory],
    /// The ordered labels of hardware metering.
    pub metering_labels: &'static [&'static str],
}

impl DeviceProfile {
    /// Whether the category of configuration is storable in the model.
    pub fn is_storable(&self, category: ConfigCategory) -> bool {
        self.storable.iter().any(|c| *c == category)
    }

    /// Find the spec of clock source by its name.
    pub fn clock_source_by_name(&self, name: &str) -> Option<&ClockSourceSpec> {
        self.clock_sources.iter().find(|spec| spec.name == name)
    }

    /// Find the spec of clock source by its byte alias.
    pub fn clock_source_by_alias(&self, alias: u8) -> Option<&ClockSourceSpec> {
        self.clock_sources.iter().find(|spec| spec.alias == alias)
    }
}

const CLOCK_SOURCES_TCD22XX: &[ClockSourceSpec] = &[
    ClockSourceSpec {
        name: "AES",
        alias: 0x04,
        params: &[ClockSourceParam::AesHighRate],
    },
    ClockSourceSpec {
        name: "ADAT",
        alias: 0x05,
        params: &[ClockSourceParam::AdatMode],
    },
    ClockSourceSpec {
        name: "Word-clock",
        alias: 0x07,
        params: &[ClockSourceParam::WordClockMode, ClockSourceParam::WordClockRate],
    },
    ClockSourceSpec {
        name: "Internal",
        alias: 0x0c,
        params: &[ClockSourceParam::InternalRate],
    },
];

/// The generic profile for units with control extension, used as fall back for the unknown
/// pair of vendor and model identifiers.
pub const GENERIC_PROFILE: DeviceProfile = DeviceProfile {
    name: "generic",
    scheme: ControlScheme::CtlExtension,
    inputs: &[
        PhysInput {
            id: SrcBlkId::Ins0,
            offset: 0,
            count: 8,
            label: "analog",
        },
        PhysInput {
            id: SrcBlkId::Aes,
            offset: 0,
            count: 2,
            label: "spdif",
        },
        PhysInput {
            id: SrcBlkId::Adat,
            offset: 0,
            count: 8,
            label: "adat",
        },
    ],
    outputs: &[
        PhysOutput {
            id: DstBlkId::Ins0,
            offset: 0,
            count: 8,
            label: "analog",
        },
        PhysOutput {
            id: DstBlkId::Aes,
            offset: 0,
            count: 2,
            label: "spdif",
        },
        PhysOutput {
            id: DstBlkId::Adat,
            offset: 0,
            count: 8,
            label: "adat",
        },
    ],
    fixed: &[],
    mixer_out_ports: [16, 16, 8],
    mixer_in_ports: &[(DstBlkId::MixerTx0, 16), (DstBlkId::MixerTx1, 2)],
    adat_channels: [8, 4, 2],
    clock_sources: CLOCK_SOURCES_TCD22XX,
    storable: &[ConfigCategory::Router, ConfigCategory::Mixer],
    metering_labels: &[],
};

const MAUDIO_PROFIRE_PROFILE: DeviceProfile = DeviceProfile {
    name: "profire",
    inputs: &[
        PhysInput {
            id: SrcBlkId::Ins0,
            offset: 0,
            count: 8,
            label: "analog",
        },
        PhysInput {
            id: SrcBlkId::Aes,
            offset: 0,
            count: 2,
            label: "spdif",
        },
        PhysInput {
            id: SrcBlkId::Adat,
            offset: 0,
            count: 8,
            label: "adat-a",
        },
    ],
    outputs: &[
        PhysOutput {
            id: DstBlkId::Ins0,
            offset: 0,
            count: 8,
            label: "analog",
        },
        PhysOutput {
            id: DstBlkId::Aes,
            offset: 0,
            count: 2,
            label: "spdif",
        },
        PhysOutput {
            id: DstBlkId::Adat,
            offset: 0,
            count: 8,
            label: "adat-a",
        },
    ],
    fixed: &[],
    scheme: ControlScheme::CtlExtension,
    mixer_out_ports: [16, 16, 8],
    mixer_in_ports: &[(DstBlkId::MixerTx0, 16), (DstBlkId::MixerTx1, 2)],
    adat_channels: [8, 4, 2],
    clock_sources: CLOCK_SOURCES_TCD22XX,
    storable: &[
        ConfigCategory::Router,
        ConfigCategory::Mixer,
        ConfigCategory::StreamConfig,
    ],
    metering_labels: &[],
};

const FOCUSRITE_SAFFIREPRO_PROFILE: DeviceProfile = DeviceProfile {
    name: "saffirepro",
    inputs: &[
        PhysInput {
            id: SrcBlkId::Ins0,
            offset: 0,
            count: 8,
            label: "analog",
        },
        PhysInput {
            id: SrcBlkId::Aes,
            offset: 0,
            count: 2,
            label: "spdif",
        },
        PhysInput {
            id: SrcBlkId::Adat,
            offset: 0,
            count: 8,
            label: "adat",
        },
    ],
    outputs: &[
        PhysOutput {
            id: DstBlkId::Ins0,
            offset: 0,
            count: 10,
            label: "analog",
        },
        PhysOutput {
            id: DstBlkId::Aes,
            offset: 0,
            count: 2,
            label: "spdif",
        },
    ],
    fixed: &[],
    scheme: ControlScheme::CtlExtension,
    mixer_out_ports: [16, 16, 8],
    mixer_in_ports: &[(DstBlkId::MixerTx0, 16), (DstBlkId::MixerTx1, 2)],
    adat_channels: [8, 4, 2],
    clock_sources: CLOCK_SOURCES_TCD22XX,
    storable: &[ConfigCategory::Router, ConfigCategory::Mixer],
    metering_labels: &[],
};

/// The ordered labels of hardware metering for the write-only models.
const MAUDIO_SPECIAL_METERING_LABELS: &[&str] = &[
    "analog-in-1",
    "analog-in-2",
    "analog-in-3",
    "analog-in-4",
    "analog-in-5",
    "analog-in-6",
    "analog-in-7",
    "analog-in-8",
    "spdif-in-1",
    "spdif-in-2",
    "adat-in-1",
    "adat-in-2",
    "adat-in-3",
    "adat-in-4",
    "adat-in-5",
    "adat-in-6",
    "adat-in-7",
    "adat-in-8",
    "analog-out-1",
    "analog-out-2",
    "analog-out-3",
    "analog-out-4",
    "spdif-out-1",
    "spdif-out-2",
    "adat-out-1",
    "adat-out-2",
    "adat-out-3",
    "adat-out-4",
    "adat-out-5",
    "adat-out-6",
    "adat-out-7",
    "adat-out-8",
    "headphone-out-1",
    "headphone-out-2",
    "headphone-out-3",
    "headphone-out-4",
    "aux-out-1",
    "aux-out-2",
];

const MAUDIO_SPECIAL_PROFILE: DeviceProfile = DeviceProfile {
    name: "maudio-special",
    scheme: ControlScheme::WriteOnlyCache,
    inputs: &[],
    outputs: &[],
    fixed: &[],
    mixer_out_ports: [0, 0, 0],
    mixer_in_ports: &[],
    adat_channels: [8, 4, 2],
    clock_sources: &[],
    storable: &[],
    metering_labels: MAUDIO_SPECIAL_METERING_LABELS,
};

const PROFILE_TABLE: &[((u32, u32), &DeviceProfile)] = &[
    // M-Audio ProFire 2626/610.
    ((0x000d6c, 0x000010), &MAUDIO_PROFIRE_PROFILE),
    ((0x000d6c, 0x000011), &MAUDIO_PROFIRE_PROFILE),
    // Focusrite Saffire Pro 40/24.
    ((0x00130e, 0x000005), &FOCUSRITE_SAFFIREPRO_PROFILE),
    ((0x00130e, 0x000006), &FOCUSRITE_SAFFIREPRO_PROFILE),
    // M-Audio FireWire 1814 and ProjectMix I/O.
    ((0x000d6c, 0x010071), &MAUDIO_SPECIAL_PROFILE),
    ((0x000d6c, 0x010091), &MAUDIO_SPECIAL_PROFILE),
];

/// Resolve the profile by the pair of vendor and model identifiers. The unknown pair falls
/// back to the generic profile.
pub fn detect_profile(vendor_id: u32, model_id: u32) -> &'static DeviceProfile {
    PROFILE_TABLE
        .iter()
        .find(|((v, m), _)| *v == vendor_id && *m == model_id)
        .map(|(_, profile)| *profile)
        .unwrap_or(&GENERIC_PROFILE)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn profile_lookup() {
        let profile = detect_profile(0x000d6c, 0x010071);
        assert_eq!(profile.scheme, ControlScheme::WriteOnlyCache);
        assert_eq!(profile.metering_labels.len(), 38);

        let profile = detect_profile(0x000d6c, 0x000010);
        assert_eq!(profile.scheme, ControlScheme::CtlExtension);
        assert_eq!(profile.is_storable(ConfigCategory::StreamConfig), true);

        let profile = detect_profile(0xffffff, 0xffffff);
        assert_eq!(profile.name, "generic");
        assert_eq!(profile.is_storable(ConfigCategory::Router), true);
        assert_eq!(profile.is_storable(ConfigCategory::StreamConfig), false);
    }

    #[test]
    fn clock_source_lookup() {
        let profile = detect_profile(0xffffff, 0xffffff);
        let spec = profile.clock_source_by_name("Word-clock").unwrap();
        assert_eq!(spec.alias, 0x07);
        assert_eq!(spec.params.len(), 2);
        assert_eq!(profile.clock_source_by_alias(0x0c).unwrap().name, "Internal");
    }
}
