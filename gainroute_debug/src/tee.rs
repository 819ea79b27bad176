// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fan-out to two sinks.

use gainroute_core::diagnostics::{DiagnosticSnapshot, DiagnosticsSink, MediaEvent, MuteState};
use gainroute_core::error::RoutingError;
use gainroute_core::level::Level;
use gainroute_core::platform::EndpointRole;
use gainroute_core::strategy::Strategy;

/// Forwards every event to `first`, then to `second`.
///
/// Nest to reach more than two sinks.
#[derive(Clone, Debug, Default)]
pub struct TeeSink<A, B> {
    /// Receives each event first.
    pub first: A,
    /// Receives each event second.
    pub second: B,
}

impl<A, B> TeeSink<A, B> {
    /// Combines two sinks.
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: DiagnosticsSink, B: DiagnosticsSink> DiagnosticsSink for TeeSink<A, B> {
    fn on_status(&mut self, message: &str, snapshot: &DiagnosticSnapshot) {
        self.first.on_status(message, snapshot);
        self.second.on_status(message, snapshot);
    }

    fn on_degraded(&mut self, error: &RoutingError, snapshot: &DiagnosticSnapshot) {
        self.first.on_degraded(error, snapshot);
        self.second.on_degraded(error, snapshot);
    }

    fn on_strategy_selected(&mut self, strategy: Strategy, snapshot: &DiagnosticSnapshot) {
        self.first.on_strategy_selected(strategy, snapshot);
        self.second.on_strategy_selected(strategy, snapshot);
    }

    fn on_playback_rejected(
        &mut self,
        role: EndpointRole,
        error: &RoutingError,
        snapshot: &DiagnosticSnapshot,
    ) {
        self.first.on_playback_rejected(role, error, snapshot);
        self.second.on_playback_rejected(role, error, snapshot);
    }

    fn on_level_changed(&mut self, level: Level, snapshot: &DiagnosticSnapshot) {
        self.first.on_level_changed(level, snapshot);
        self.second.on_level_changed(level, snapshot);
    }

    fn on_mute_toggled(&mut self, state: MuteState, snapshot: &DiagnosticSnapshot) {
        self.first.on_mute_toggled(state, snapshot);
        self.second.on_mute_toggled(state, snapshot);
    }

    fn on_media_event(&mut self, event: MediaEvent, snapshot: &DiagnosticSnapshot) {
        self.first.on_media_event(event, snapshot);
        self.second.on_media_event(event, snapshot);
    }

    fn on_periodic(&mut self, snapshot: &DiagnosticSnapshot) {
        self.first.on_periodic(snapshot);
        self.second.on_periodic(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pretty::PrettyPrintSink;
    use crate::recorder::RecorderSink;
    use gainroute_core::platform::{ContextState, MediaState};

    #[test]
    fn both_sides_receive_every_event() {
        let recorder = RecorderSink::new();
        let mut tee = TeeSink::new(recorder.clone(), PrettyPrintSink::with_writer(Vec::new()));
        let snap = DiagnosticSnapshot {
            timestamp_ms: 0.0,
            strategy: None,
            level: Level::FULL,
            gain: None,
            primary: MediaState::default(),
            fallback: None,
            context: ContextState::Unavailable,
        };
        tee.on_status("Negotiating audio routing...", &snap);
        tee.on_level_changed(Level::PRESET, &snap);

        assert_eq!(recorder.len(), 2);
        let text = String::from_utf8(tee.second.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
