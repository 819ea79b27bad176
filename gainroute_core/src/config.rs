// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page configuration.
//!
//! The page accepts two query-string overrides: a source URI and a flag that
//! skips the primary graph binding so the fallback path can be tested on
//! platforms where the primary binding would succeed.

use alloc::string::{String, ToString as _};

/// Stream played when no `src` parameter is given.
pub const DEFAULT_SOURCE: &str = "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8";

/// Query parameter carrying the URL-encoded source URI.
pub const SOURCE_PARAM: &str = "src";

/// Query parameter that forces the fallback element path when set to `true`.
pub const FORCE_FALLBACK_PARAM: &str = "forceAudioFallback";

/// Configuration for one page session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Source URI for the primary (and, if created, the fallback) element.
    pub source: String,
    /// Skip the primary graph binding and start negotiation at the fallback
    /// element.
    pub force_fallback: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            force_fallback: false,
        }
    }
}

impl RoutingConfig {
    /// Builds a configuration from already-decoded query values.
    ///
    /// An absent or empty `source` selects [`DEFAULT_SOURCE`]. Only the exact
    /// string `"true"` enables `force_fallback`.
    #[must_use]
    pub fn from_query_values(source: Option<&str>, force_fallback: Option<&str>) -> Self {
        let source = match source {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => DEFAULT_SOURCE.to_string(),
        };
        Self {
            source,
            force_fallback: force_fallback == Some("true"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_params() {
        let cfg = RoutingConfig::from_query_values(None, None);
        assert_eq!(cfg, RoutingConfig::default());
        assert_eq!(cfg.source, DEFAULT_SOURCE);
        assert!(!cfg.force_fallback);
    }

    #[test]
    fn empty_source_falls_back_to_default() {
        let cfg = RoutingConfig::from_query_values(Some(""), None);
        assert_eq!(cfg.source, DEFAULT_SOURCE);
    }

    #[test]
    fn explicit_source_is_kept() {
        let cfg = RoutingConfig::from_query_values(Some("https://example.com/a.mp4"), None);
        assert_eq!(cfg.source, "https://example.com/a.mp4");
    }

    #[test]
    fn force_fallback_requires_exact_true() {
        assert!(RoutingConfig::from_query_values(None, Some("true")).force_fallback);
        assert!(!RoutingConfig::from_query_values(None, Some("TRUE")).force_fallback);
        assert!(!RoutingConfig::from_query_values(None, Some("1")).force_fallback);
        assert!(!RoutingConfig::from_query_values(None, Some("")).force_fallback);
    }
}
