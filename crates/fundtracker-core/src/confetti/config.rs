use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An sRGB color parsed from `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn parse_hex(s: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidValue {
            field: "confetti.palette".into(),
            message: format!("'{s}' is not a #rrggbb color"),
        };
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

pub const DEFAULT_PALETTE: [Rgb; 7] = [
    Rgb::new(0xef, 0x44, 0x44),
    Rgb::new(0xf5, 0x9e, 0x0b),
    Rgb::new(0xf9, 0x73, 0x16),
    Rgb::new(0x06, 0xb6, 0xd4),
    Rgb::new(0x10, 0xb9, 0x81),
    Rgb::new(0x8b, 0x5c, 0xf6),
    Rgb::new(0xf4, 0x3f, 0x5e),
];

/// Longest accepted run.
pub const MAX_DURATION_MS: u64 = 60_000;

/// Tunables for one confetti run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfettiConfig {
    /// Wall-clock length of a run in milliseconds.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_min_particles")]
    pub min_particles: usize,
    #[serde(default = "default_max_particles")]
    pub max_particles: usize,
    /// Surface width (in surface units) that yields one particle.
    #[serde(default = "default_width_per_particle")]
    pub width_per_particle: f64,
    /// Added to every particle's vertical velocity each frame.
    #[serde(default = "default_gravity")]
    pub gravity: f64,
    #[serde(default = "default_palette")]
    pub palette: Vec<Rgb>,
}

fn default_duration_ms() -> u64 {
    3000
}
fn default_min_particles() -> usize {
    60
}
fn default_max_particles() -> usize {
    140
}
fn default_width_per_particle() -> f64 {
    8.0
}
fn default_gravity() -> f64 {
    0.08
}
fn default_palette() -> Vec<Rgb> {
    DEFAULT_PALETTE.to_vec()
}

impl Default for ConfettiConfig {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            min_particles: default_min_particles(),
            max_particles: default_max_particles(),
            width_per_particle: default_width_per_particle(),
            gravity: default_gravity(),
            palette: default_palette(),
        }
    }
}

impl ConfettiConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.duration_ms > MAX_DURATION_MS {
            return Err(ValidationError::InvalidValue {
                field: "confetti.duration_ms".into(),
                message: format!("must be at most {MAX_DURATION_MS}"),
            });
        }
        if self.palette.is_empty() {
            return Err(ValidationError::EmptyCollection("confetti.palette".into()));
        }
        if self.min_particles > self.max_particles {
            return Err(ValidationError::InvalidValue {
                field: "confetti.min_particles".into(),
                message: format!(
                    "{} exceeds max_particles ({})",
                    self.min_particles, self.max_particles
                ),
            });
        }
        if !(self.width_per_particle.is_finite() && self.width_per_particle > 0.0) {
            return Err(ValidationError::InvalidValue {
                field: "confetti.width_per_particle".into(),
                message: "must be a positive number".into(),
            });
        }
        if !self.gravity.is_finite() {
            return Err(ValidationError::InvalidValue {
                field: "confetti.gravity".into(),
                message: "must be finite".into(),
            });
        }
        Ok(())
    }

    /// Batch size for a surface of the given width, clamped to the
    /// configured bounds.
    pub fn particle_count(&self, width: f64) -> usize {
        let by_width = (width.max(0.0) / self.width_per_particle).floor();
        let clamped = by_width
            .min(self.max_particles as f64)
            .max(self.min_particles as f64);
        clamped as usize
    }
}
