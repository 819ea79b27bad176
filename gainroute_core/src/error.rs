// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Routing failures.
//!
//! Every failure except [`RoutingError::PlaybackRejected`] moves negotiation
//! on to the next strategy. Playback rejection is reported but never changes
//! the selected strategy; the user has to press play again.

use alloc::string::String;
use core::fmt;

use crate::platform::EndpointRole;

/// Errors raised while negotiating or exercising a routing strategy.
///
/// Each variant carries the platform's own description of what went wrong
/// (on the web, the message of the thrown exception).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutingError {
    /// No audio-processing context could be created or resumed. Forces
    /// [`NativeVolume`](crate::strategy::Strategy::NativeVolume).
    ContextUnavailable(String),
    /// The primary element could not be bound to an audio graph.
    GraphBindingFailed(String),
    /// The fallback element could not be created or bound.
    FallbackBindingFailed(String),
    /// Starting playback was refused, typically by an autoplay policy.
    PlaybackRejected(String),
}

impl RoutingError {
    /// Builds the binding error matching the endpoint that failed.
    #[must_use]
    pub fn binding_failed(role: EndpointRole, detail: impl Into<String>) -> Self {
        match role {
            EndpointRole::Primary => Self::GraphBindingFailed(detail.into()),
            EndpointRole::Fallback => Self::FallbackBindingFailed(detail.into()),
        }
    }

    /// Returns the platform-provided description.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::ContextUnavailable(d)
            | Self::GraphBindingFailed(d)
            | Self::FallbackBindingFailed(d)
            | Self::PlaybackRejected(d) => d,
        }
    }

    /// Returns the variant name, for structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ContextUnavailable(_) => "ContextUnavailable",
            Self::GraphBindingFailed(_) => "GraphBindingFailed",
            Self::FallbackBindingFailed(_) => "FallbackBindingFailed",
            Self::PlaybackRejected(_) => "PlaybackRejected",
        }
    }

    /// Returns `true` if negotiation degrades to the next strategy on this
    /// error.
    #[must_use]
    pub const fn degrades(&self) -> bool {
        !matches!(self, Self::PlaybackRejected(_))
    }
}

impl fmt::Display for RoutingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContextUnavailable(d) => write!(f, "audio context unavailable: {d}"),
            Self::GraphBindingFailed(d) => write!(f, "graph binding failed: {d}"),
            Self::FallbackBindingFailed(d) => write!(f, "fallback binding failed: {d}"),
            Self::PlaybackRejected(d) => write!(f, "playback rejected: {d}"),
        }
    }
}

impl core::error::Error for RoutingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString as _;

    #[test]
    fn binding_failure_follows_role() {
        assert_eq!(
            RoutingError::binding_failed(EndpointRole::Primary, "cors"),
            RoutingError::GraphBindingFailed("cors".into())
        );
        assert_eq!(
            RoutingError::binding_failed(EndpointRole::Fallback, "cors"),
            RoutingError::FallbackBindingFailed("cors".into())
        );
    }

    #[test]
    fn playback_rejection_does_not_degrade() {
        assert!(!RoutingError::PlaybackRejected("NotAllowedError".into()).degrades());
        assert!(RoutingError::ContextUnavailable("no ctor".into()).degrades());
    }

    #[test]
    fn display_includes_detail() {
        let err = RoutingError::PlaybackRejected("NotAllowedError".into());
        assert_eq!(err.to_string(), "playback rejected: NotAllowedError");
        assert_eq!(err.detail(), "NotAllowedError");
    }
}
