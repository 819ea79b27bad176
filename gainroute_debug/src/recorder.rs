// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory event recording.
//!
//! [`RecorderSink`] implements [`DiagnosticsSink`] and appends every event,
//! with its snapshot, to a shared buffer. The controller takes ownership of
//! its sink, so the recorder is a cheap handle: keep one clone, give the
//! other to the controller, and read the events back afterwards.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use gainroute_core::diagnostics::{DiagnosticSnapshot, DiagnosticsSink, MediaEvent, MuteState};
use gainroute_core::error::RoutingError;
use gainroute_core::level::Level;
use gainroute_core::platform::EndpointRole;
use gainroute_core::strategy::Strategy;

// ---------------------------------------------------------------------------
// RecordedEvent
// ---------------------------------------------------------------------------

/// One recorded diagnostics event.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// [`DiagnosticsSink::on_status`]
    Status {
        /// Status line text.
        message: String,
        /// State at the time of the event.
        snapshot: DiagnosticSnapshot,
    },
    /// [`DiagnosticsSink::on_degraded`]
    Degraded {
        /// The failure that moved negotiation on.
        error: RoutingError,
        /// State at the time of the event.
        snapshot: DiagnosticSnapshot,
    },
    /// [`DiagnosticsSink::on_strategy_selected`]
    StrategySelected {
        /// The selected strategy.
        strategy: Strategy,
        /// State at the time of the event.
        snapshot: DiagnosticSnapshot,
    },
    /// [`DiagnosticsSink::on_playback_rejected`]
    PlaybackRejected {
        /// The endpoint whose playback was refused.
        role: EndpointRole,
        /// The refusal.
        error: RoutingError,
        /// State at the time of the event.
        snapshot: DiagnosticSnapshot,
    },
    /// [`DiagnosticsSink::on_level_changed`]
    LevelChanged {
        /// The applied level.
        level: Level,
        /// State at the time of the event.
        snapshot: DiagnosticSnapshot,
    },
    /// [`DiagnosticsSink::on_mute_toggled`]
    MuteToggled {
        /// The state after the toggle.
        state: MuteState,
        /// State at the time of the event.
        snapshot: DiagnosticSnapshot,
    },
    /// [`DiagnosticsSink::on_media_event`]
    Media {
        /// The media element event.
        event: MediaEvent,
        /// State at the time of the event.
        snapshot: DiagnosticSnapshot,
    },
    /// [`DiagnosticsSink::on_periodic`]
    Periodic {
        /// State at the time of the event.
        snapshot: DiagnosticSnapshot,
    },
}

impl RecordedEvent {
    /// Returns the snapshot attached to this event.
    #[must_use]
    pub fn snapshot(&self) -> &DiagnosticSnapshot {
        match self {
            Self::Status { snapshot, .. }
            | Self::Degraded { snapshot, .. }
            | Self::StrategySelected { snapshot, .. }
            | Self::PlaybackRejected { snapshot, .. }
            | Self::LevelChanged { snapshot, .. }
            | Self::MuteToggled { snapshot, .. }
            | Self::Media { snapshot, .. }
            | Self::Periodic { snapshot } => snapshot,
        }
    }

    /// Returns a short name for the event kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Degraded { .. } => "degraded",
            Self::StrategySelected { .. } => "strategy",
            Self::PlaybackRejected { .. } => "rejected",
            Self::LevelChanged { .. } => "level",
            Self::MuteToggled { .. } => "mute",
            Self::Media { .. } => "media",
            Self::Periodic { .. } => "periodic",
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`DiagnosticsSink`] that records events into a shared buffer.
///
/// Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct RecorderSink {
    events: Rc<RefCell<Vec<RecordedEvent>>>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the events recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if called from inside another sink callback on the same buffer.
    #[must_use]
    pub fn events(&self) -> Ref<'_, [RecordedEvent]> {
        Ref::map(self.events.borrow(), Vec::as_slice)
    }

    /// Removes and returns the events recorded so far.
    pub fn take(&self) -> Vec<RecordedEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Returns the number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Returns the status lines, in order.
    #[must_use]
    pub fn statuses(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Status { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the strategies announced, in order. A well-behaved controller
    /// announces at most one.
    #[must_use]
    pub fn strategies(&self) -> Vec<Strategy> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::StrategySelected { strategy, .. } => Some(*strategy),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: RecordedEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl DiagnosticsSink for RecorderSink {
    fn on_status(&mut self, message: &str, snapshot: &DiagnosticSnapshot) {
        self.push(RecordedEvent::Status {
            message: message.to_owned(),
            snapshot: *snapshot,
        });
    }

    fn on_degraded(&mut self, error: &RoutingError, snapshot: &DiagnosticSnapshot) {
        self.push(RecordedEvent::Degraded {
            error: error.clone(),
            snapshot: *snapshot,
        });
    }

    fn on_strategy_selected(&mut self, strategy: Strategy, snapshot: &DiagnosticSnapshot) {
        self.push(RecordedEvent::StrategySelected {
            strategy,
            snapshot: *snapshot,
        });
    }

    fn on_playback_rejected(
        &mut self,
        role: EndpointRole,
        error: &RoutingError,
        snapshot: &DiagnosticSnapshot,
    ) {
        self.push(RecordedEvent::PlaybackRejected {
            role,
            error: error.clone(),
            snapshot: *snapshot,
        });
    }

    fn on_level_changed(&mut self, level: Level, snapshot: &DiagnosticSnapshot) {
        self.push(RecordedEvent::LevelChanged {
            level,
            snapshot: *snapshot,
        });
    }

    fn on_mute_toggled(&mut self, state: MuteState, snapshot: &DiagnosticSnapshot) {
        self.push(RecordedEvent::MuteToggled {
            state,
            snapshot: *snapshot,
        });
    }

    fn on_media_event(&mut self, event: MediaEvent, snapshot: &DiagnosticSnapshot) {
        self.push(RecordedEvent::Media {
            event,
            snapshot: *snapshot,
        });
    }

    fn on_periodic(&mut self, snapshot: &DiagnosticSnapshot) {
        self.push(RecordedEvent::Periodic {
            snapshot: *snapshot,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gainroute_core::platform::{ContextState, MediaState};

    fn snap(timestamp_ms: f64) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            timestamp_ms,
            strategy: None,
            level: Level::FULL,
            gain: None,
            primary: MediaState::default(),
            fallback: None,
            context: ContextState::Suspended,
        }
    }

    #[test]
    fn clones_share_the_buffer() {
        let recorder = RecorderSink::new();
        let mut handle = recorder.clone();
        handle.on_status("Negotiating audio routing...", &snap(1.0));
        handle.on_strategy_selected(Strategy::NativeVolume, &snap(2.0));

        assert_eq!(recorder.len(), 2);
        assert_eq!(recorder.statuses(), ["Negotiating audio routing..."]);
        assert_eq!(recorder.strategies(), [Strategy::NativeVolume]);
        assert_eq!(recorder.events()[1].snapshot().timestamp_ms, 2.0);
    }

    #[test]
    fn take_drains() {
        let mut recorder = RecorderSink::new();
        recorder.on_periodic(&snap(5000.0));
        recorder.on_media_event(MediaEvent::Waiting, &snap(5001.0));

        let events = recorder.take();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), "periodic");
        assert_eq!(events[1].kind(), "media");
        assert!(recorder.is_empty());
    }
}
