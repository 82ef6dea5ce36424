//! Built-in sweeps shipped with the binary

use std::fmt;
use std::str::FromStr;

use crate::config::{ConfigError, SweepFile};

const STANDARD_YAML: &str = include_str!("../presets/standard.yaml");
const NORMALIZED_INDIRECT_YAML: &str = include_str!("../presets/normalized_indirect.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Ratio redistribution over group size, ratio, and population average
    Standard,
    /// Stratified sampling normalized to a fixed average, swept over floors
    NormalizedIndirect,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Standard, Preset::NormalizedIndirect];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Standard => "standard",
            Preset::NormalizedIndirect => "normalized_indirect",
        }
    }

    fn yaml(self) -> &'static str {
        match self {
            Preset::Standard => STANDARD_YAML,
            Preset::NormalizedIndirect => NORMALIZED_INDIRECT_YAML,
        }
    }

    pub fn sweep_file(self) -> Result<SweepFile, ConfigError> {
        SweepFile::from_yaml(self.yaml())
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == normalized)
            .ok_or_else(|| {
                let known: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
                format!("unknown preset '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}
