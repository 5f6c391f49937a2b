//! Species label set and the species to hearing-range table.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of species the classifier can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    /// White-tailed deer and relatives.
    Deer,
    /// Tree and ground squirrels.
    Squirrel,
    /// Nine-banded armadillo.
    Armadillo,
    /// Virginia opossum.
    Opossum,
    /// Domestic or feral cat.
    Cat,
    /// Domestic dog.
    Dog,
    /// Common raccoon.
    Raccoon,
    /// Cottontail and other rabbits.
    Rabbit,
}

impl Species {
    /// Every species, in table order.
    pub const ALL: [Self; 8] = [
        Self::Deer,
        Self::Squirrel,
        Self::Armadillo,
        Self::Opossum,
        Self::Cat,
        Self::Dog,
        Self::Raccoon,
        Self::Rabbit,
    ];

    /// Display name, identical to the classifier label.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deer => "Deer",
            Self::Squirrel => "Squirrel",
            Self::Armadillo => "Armadillo",
            Self::Opossum => "Opossum",
            Self::Cat => "Cat",
            Self::Dog => "Dog",
            Self::Raccoon => "Raccoon",
            Self::Rabbit => "Rabbit",
        }
    }

    /// Known hearing range of this species.
    pub const fn audio_range(self) -> AudioRange {
        match self {
            Self::Deer => AudioRange::from_bounds(2.0, 5.0),
            Self::Squirrel => AudioRange::from_bounds(0.5, 10.0),
            Self::Armadillo => AudioRange::from_bounds(1.0, 4.0),
            Self::Opossum => AudioRange::from_bounds(0.8, 7.0),
            Self::Cat => AudioRange::from_bounds(48.0, 85.0),
            // Upstream data listed this as 67-45; stored normalized.
            Self::Dog => AudioRange::from_bounds(45.0, 67.0),
            Self::Raccoon => AudioRange::from_bounds(0.3, 8.0),
            Self::Rabbit => AudioRange::from_bounds(5.0, 10.0),
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Species {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|species| species.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::UnknownSpecies {
                label: trimmed.to_string(),
            })
    }
}

/// Closed frequency interval in kHz.
///
/// Text form is `"<min>-<max> kHz"`, e.g. `"2-5 kHz"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioRange {
    min_khz: f32,
    max_khz: f32,
}

impl AudioRange {
    /// Create a range from bounds that are known to be ordered.
    const fn from_bounds(min_khz: f32, max_khz: f32) -> Self {
        Self { min_khz, max_khz }
    }

    /// Create a range, rejecting inverted or non-finite bounds.
    pub fn new(min_khz: f32, max_khz: f32) -> Result<Self> {
        if !min_khz.is_finite() || !max_khz.is_finite() || min_khz < 0.0 {
            return Err(Error::InvalidAudioRange {
                value: format!("{min_khz}-{max_khz}"),
                reason: "bounds must be finite and non-negative".to_string(),
            });
        }
        if min_khz > max_khz {
            return Err(Error::InvalidAudioRange {
                value: format!("{min_khz}-{max_khz}"),
                reason: "minimum exceeds maximum".to_string(),
            });
        }
        Ok(Self { min_khz, max_khz })
    }

    /// Lower bound in kHz.
    pub const fn min_khz(&self) -> f32 {
        self.min_khz
    }

    /// Upper bound in kHz.
    pub const fn max_khz(&self) -> f32 {
        self.max_khz
    }

    /// Centre of the interval in kHz.
    pub fn midpoint_khz(&self) -> f32 {
        (self.min_khz + self.max_khz) / 2.0
    }
}

impl fmt::Display for AudioRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} kHz", self.min_khz, self.max_khz)
    }
}

impl FromStr for AudioRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidAudioRange {
            value: s.to_string(),
            reason: reason.to_string(),
        };

        let body = s.trim();
        let body = body
            .strip_suffix("kHz")
            .or_else(|| body.strip_suffix("khz"))
            .unwrap_or(body)
            .trim();

        let (min, max) = body
            .split_once('-')
            .ok_or_else(|| invalid("expected '<min>-<max>'"))?;
        let min: f32 = min
            .trim()
            .parse()
            .map_err(|_| invalid("lower bound is not a number"))?;
        let max: f32 = max
            .trim()
            .parse()
            .map_err(|_| invalid("upper bound is not a number"))?;

        Self::new(min, max).map_err(|_| invalid("minimum exceeds maximum or bounds are invalid"))
    }
}

impl Serialize for AudioRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AudioRange {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
