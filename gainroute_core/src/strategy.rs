// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing strategies.

use core::fmt;

use crate::platform::EndpointRole;

/// How the level control reaches the audio output.
///
/// Variants are listed in preference order. Exactly one is selected per page
/// session and it never changes afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Level drives a gain stage fed by the primary media element.
    GraphGain,
    /// Level drives a gain stage fed by a hidden fallback element; the primary
    /// element is muted and only provides picture.
    FallbackGraphGain,
    /// Level drives the primary element's native volume. Inert on iOS.
    NativeVolume,
}

impl Strategy {
    /// Returns a short label for status text and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GraphGain => "GraphGain",
            Self::FallbackGraphGain => "FallbackGraphGain",
            Self::NativeVolume => "NativeVolume",
        }
    }

    /// Returns the endpoint whose gain stage carries the level, if the
    /// strategy uses an audio graph.
    #[must_use]
    pub const fn graph_endpoint(self) -> Option<EndpointRole> {
        match self {
            Self::GraphGain => Some(EndpointRole::Primary),
            Self::FallbackGraphGain => Some(EndpointRole::Fallback),
            Self::NativeVolume => None,
        }
    }

    /// Returns `true` if the level is applied through a gain stage.
    #[must_use]
    pub const fn uses_graph(self) -> bool {
        self.graph_endpoint().is_some()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_endpoints() {
        assert_eq!(
            Strategy::GraphGain.graph_endpoint(),
            Some(EndpointRole::Primary)
        );
        assert_eq!(
            Strategy::FallbackGraphGain.graph_endpoint(),
            Some(EndpointRole::Fallback)
        );
        assert!(!Strategy::NativeVolume.uses_graph());
    }
}
