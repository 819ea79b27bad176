// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Volume level scalar.
//!
//! [`Level`] is the single value the UI slider produces. It is stored the same
//! way regardless of whether it ends up on a gain stage or on a media
//! element's native volume.

use core::fmt;

/// A volume level guaranteed to lie in `[0, 1]`.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
pub struct Level(f64);

impl Level {
    /// No audible output.
    pub const SILENT: Self = Self(0.0);
    /// Full level; also the value a gain-based unmute restores.
    pub const FULL: Self = Self(1.0);
    /// Level applied by the "set to 0.2" test control.
    pub const PRESET: Self = Self(0.2);

    /// Creates a level, clamping finite values into `[0, 1]`.
    ///
    /// Returns `None` for NaN, which a range input can produce while its value
    /// is being edited.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_nan() {
            None
        } else {
            Some(Self(value.clamp(0.0, 1.0)))
        }
    }

    /// Parses the string value of a range input.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().and_then(Self::new)
    }

    /// Returns the raw scalar.
    #[inline]
    #[must_use]
    pub const fn get(self) -> f64 {
        self.0
    }

    /// Returns `true` if this level produces no output.
    #[inline]
    #[must_use]
    pub fn is_silent(self) -> bool {
        self.0 <= 0.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::FULL
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({:.2})", self.0)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString as _;

    #[test]
    fn clamps_out_of_range() {
        assert_eq!(Level::new(1.7), Some(Level::FULL));
        assert_eq!(Level::new(-0.3), Some(Level::SILENT));
        assert_eq!(Level::new(f64::INFINITY), Some(Level::FULL));
    }

    #[test]
    fn rejects_nan() {
        assert_eq!(Level::new(f64::NAN), None);
    }

    #[test]
    fn parses_slider_values() {
        assert_eq!(Level::parse("0.2"), Some(Level::PRESET));
        assert_eq!(Level::parse(" 1 "), Some(Level::FULL));
        assert_eq!(Level::parse(""), None);
        assert_eq!(Level::parse("loud"), None);
    }

    #[test]
    fn default_is_full() {
        assert_eq!(Level::default(), Level::FULL);
        assert!(!Level::default().is_silent());
        assert!(Level::SILENT.is_silent());
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Level::PRESET.to_string(), "0.20");
    }
}
