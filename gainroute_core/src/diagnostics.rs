// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics for the routing controller.
//!
//! This module provides a [`DiagnosticsSink`] trait with one method per kind
//! of state transition. Every method receives a [`DiagnosticSnapshot`] taken
//! at the moment of the transition. All method bodies default to no-ops, so
//! implementing only the events you care about is fine.
//!
//! Sinks are observers: they return `()`, must not block, and must not call
//! back into the controller that owns them.

use core::fmt;

use crate::error::RoutingError;
use crate::level::Level;
use crate::platform::{ContextState, EndpointRole, MediaState};
use crate::strategy::Strategy;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Media element lifecycle events forwarded by the host page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    /// `loadedmetadata`
    Loaded,
    /// `play`
    Play,
    /// `playing`
    Playing,
    /// `pause`
    Pause,
    /// `waiting`
    Waiting,
    /// `stalled`
    Stalled,
    /// `error`
    Error,
}

impl MediaEvent {
    /// All events, in the order a host typically registers listeners.
    pub const ALL: [Self; 7] = [
        Self::Loaded,
        Self::Play,
        Self::Playing,
        Self::Pause,
        Self::Waiting,
        Self::Stalled,
        Self::Error,
    ];

    /// Returns the DOM event type name.
    #[must_use]
    pub const fn dom_name(self) -> &'static str {
        match self {
            Self::Loaded => "loadedmetadata",
            Self::Play => "play",
            Self::Playing => "playing",
            Self::Pause => "pause",
            Self::Waiting => "waiting",
            Self::Stalled => "stalled",
            Self::Error => "error",
        }
    }
}

/// Result of a mute toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MuteState {
    /// Output is silenced (mute flag set, or gain at zero).
    Muted,
    /// Output is audible.
    Unmuted,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of the controller and its endpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiagnosticSnapshot {
    /// Platform timestamp in milliseconds.
    pub timestamp_ms: f64,
    /// Active strategy, or `None` before negotiation settles.
    pub strategy: Option<Strategy>,
    /// Last level applied through the controller.
    pub level: Level,
    /// Current gain of the active gain stage, if any.
    pub gain: Option<f64>,
    /// Primary element state.
    pub primary: MediaState,
    /// Fallback element state, if it was created.
    pub fallback: Option<MediaState>,
    /// Audio-processing context state.
    pub context: ContextState,
}

impl fmt::Display for DiagnosticSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = self.strategy.map_or("none", Strategy::as_str);
        write!(
            f,
            "t={:.1}ms strategy={strategy} level={} ",
            self.timestamp_ms, self.level,
        )?;
        match self.gain {
            Some(gain) => write!(f, "gain={gain:.2} ")?,
            None => f.write_str("gain=- ")?,
        }
        write!(
            f,
            "paused={} muted={} volume={:.2} time={:.2}s ctx={}",
            self.primary.paused,
            self.primary.muted,
            self.primary.volume,
            self.primary.current_time,
            self.context,
        )?;
        if let Some(fb) = &self.fallback {
            write!(
                f,
                " fallback(paused={} muted={} time={:.2}s)",
                fb.paused, fb.muted, fb.current_time,
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DiagnosticsSink trait
// ---------------------------------------------------------------------------

/// Receives diagnostics from a [`VolumeController`](crate::controller::VolumeController).
pub trait DiagnosticsSink {
    /// Called whenever the user-facing status line changes.
    fn on_status(&mut self, message: &str, snapshot: &DiagnosticSnapshot) {
        _ = (message, snapshot);
    }

    /// Called when a negotiation step fails and negotiation moves on.
    fn on_degraded(&mut self, error: &RoutingError, snapshot: &DiagnosticSnapshot) {
        _ = (error, snapshot);
    }

    /// Called once, when negotiation settles on a strategy.
    fn on_strategy_selected(&mut self, strategy: Strategy, snapshot: &DiagnosticSnapshot) {
        _ = (strategy, snapshot);
    }

    /// Called when playback of `role` was refused.
    fn on_playback_rejected(
        &mut self,
        role: EndpointRole,
        error: &RoutingError,
        snapshot: &DiagnosticSnapshot,
    ) {
        _ = (role, error, snapshot);
    }

    /// Called after a level was applied.
    fn on_level_changed(&mut self, level: Level, snapshot: &DiagnosticSnapshot) {
        _ = (level, snapshot);
    }

    /// Called after a mute toggle.
    fn on_mute_toggled(&mut self, state: MuteState, snapshot: &DiagnosticSnapshot) {
        _ = (state, snapshot);
    }

    /// Called for media element lifecycle events.
    fn on_media_event(&mut self, event: MediaEvent, snapshot: &DiagnosticSnapshot) {
        _ = (event, snapshot);
    }

    /// Called by the periodic snapshot timer.
    fn on_periodic(&mut self, snapshot: &DiagnosticSnapshot) {
        _ = snapshot;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`DiagnosticsSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString as _;

    fn sample() -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            timestamp_ms: 1250.0,
            strategy: Some(Strategy::GraphGain),
            level: Level::PRESET,
            gain: Some(0.2),
            primary: MediaState {
                paused: false,
                muted: false,
                volume: 1.0,
                current_time: 3.5,
            },
            fallback: None,
            context: ContextState::Running,
        }
    }

    #[test]
    fn snapshot_display_reports_level_and_strategy() {
        let line = sample().to_string();
        assert!(line.contains("strategy=GraphGain"), "got: {line}");
        assert!(line.contains("level=0.20"), "got: {line}");
        assert!(line.contains("gain=0.20"), "got: {line}");
        assert!(line.contains("ctx=running"), "got: {line}");
        assert!(!line.contains("fallback"), "got: {line}");
    }

    #[test]
    fn snapshot_display_without_strategy() {
        let mut snap = sample();
        snap.strategy = None;
        snap.gain = None;
        snap.fallback = Some(MediaState::default());
        let line = snap.to_string();
        assert!(line.contains("strategy=none"), "got: {line}");
        assert!(line.contains("gain=-"), "got: {line}");
        assert!(line.contains("fallback(paused=true"), "got: {line}");
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        let snap = sample();
        sink.on_status("ready", &snap);
        sink.on_level_changed(Level::PRESET, &snap);
        sink.on_media_event(MediaEvent::Stalled, &snap);
        sink.on_periodic(&snap);
    }

    #[test]
    fn media_event_names() {
        assert_eq!(MediaEvent::Loaded.dom_name(), "loadedmetadata");
        assert_eq!(MediaEvent::ALL.len(), 7);
    }
}
