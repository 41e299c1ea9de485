//! Background removal settings.
//!
//! Settings are read once at startup and passed by value into the components
//! that need them. Nothing here is process-global.

use crate::error::{Error, Result};

/// Environment variable holding the white tolerance (0-255).
pub const ENV_TOLERANCE: &str = "BACKGROUND_REMOVAL_TOLERANCE";
/// Environment variable toggling mask smoothing.
pub const ENV_EDGE_SMOOTHING: &str = "BACKGROUND_REMOVAL_EDGE_SMOOTHING";
/// Environment variable enabling debug diagnostics.
pub const ENV_DEBUG: &str = "DEBUG";

/// Parameters of the near-white classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalConfig {
    /// How far below pure white (255) a channel may fall and still count as background.
    pub tolerance: u8,
    /// Apply one erosion followed by one dilation to the raw mask.
    pub edge_smoothing: bool,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            tolerance: 30,
            edge_smoothing: true,
        }
    }
}

impl RemovalConfig {
    /// Channel values strictly above this are near-white.
    #[must_use]
    pub fn white_threshold(&self) -> u8 {
        255 - self.tolerance
    }
}

/// Pipeline-level settings for the background removal stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    /// Classifier parameters.
    pub removal: RemovalConfig,
    /// Emit extra diagnostics.
    pub debug: bool,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the tolerance is not an integer in `0..=255`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Missing keys fall back to defaults. Boolean flags are true only when the
    /// value equals `"true"` ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the tolerance is not an integer in `0..=255`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RemovalConfig::default();

        let tolerance = match lookup(ENV_TOLERANCE) {
            Some(raw) => match raw.trim().parse::<u8>() {
                Ok(tolerance) => tolerance,
                Err(_) => {
                    return Err(Error::InvalidConfig {
                        name: ENV_TOLERANCE,
                        value: raw,
                    })
                }
            },
            None => defaults.tolerance,
        };

        let flag = |key: &str, default: bool| {
            lookup(key).map_or(default, |v| v.trim().eq_ignore_ascii_case("true"))
        };

        Ok(Self {
            removal: RemovalConfig {
                tolerance,
                edge_smoothing: flag(ENV_EDGE_SMOOTHING, defaults.edge_smoothing),
            },
            debug: flag(ENV_DEBUG, false),
        })
    }
}
