// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON output.
//!
//! [`export`] writes a recording from a [`RecorderSink`](super::recorder::RecorderSink)
//! as one JSON array. [`JsonLinesSink`] writes the same objects live, one per
//! line, for piping into `jq` or a log collector.
//!
//! Every object has an `"event"` name, a `"t"` timestamp in milliseconds,
//! event-specific fields, and the full `"snapshot"`.

use std::io::{self, Write};

use serde_json::{Value, json};

use gainroute_core::diagnostics::{DiagnosticSnapshot, DiagnosticsSink, MediaEvent, MuteState};
use gainroute_core::error::RoutingError;
use gainroute_core::level::Level;
use gainroute_core::platform::{EndpointRole, MediaState};
use gainroute_core::strategy::Strategy;

use crate::recorder::RecordedEvent;

/// Exports recorded events as a JSON array.
pub fn export(events: &[RecordedEvent], writer: &mut dyn Write) -> io::Result<()> {
    let values: Vec<Value> = events.iter().map(event_value).collect();
    serde_json::to_writer_pretty(&mut *writer, &values)?;
    writeln!(writer)
}

/// Converts one recorded event to its JSON object.
#[must_use]
pub fn event_value(event: &RecordedEvent) -> Value {
    let snapshot = event.snapshot();
    let mut value = match event {
        RecordedEvent::Status { message, .. } => json!({ "message": message }),
        RecordedEvent::Degraded { error, .. } => error_value(error),
        RecordedEvent::StrategySelected { strategy, .. } => {
            json!({ "strategy": strategy.as_str() })
        }
        RecordedEvent::PlaybackRejected { role, error, .. } => {
            let mut v = error_value(error);
            v["role"] = json!(role.as_str());
            v
        }
        RecordedEvent::LevelChanged { level, .. } => json!({ "level": level.get() }),
        RecordedEvent::MuteToggled { state, .. } => {
            json!({ "muted": *state == MuteState::Muted })
        }
        RecordedEvent::Media { event, .. } => json!({ "type": event.dom_name() }),
        RecordedEvent::Periodic { .. } => json!({}),
    };
    value["event"] = json!(event.kind());
    value["t"] = json!(snapshot.timestamp_ms);
    value["snapshot"] = snapshot_value(snapshot);
    value
}

/// Converts a snapshot to a JSON object.
#[must_use]
pub fn snapshot_value(snapshot: &DiagnosticSnapshot) -> Value {
    json!({
        "strategy": snapshot.strategy.map(Strategy::as_str),
        "level": snapshot.level.get(),
        "gain": snapshot.gain,
        "context": snapshot.context.as_str(),
        "primary": media_value(&snapshot.primary),
        "fallback": snapshot.fallback.as_ref().map(media_value),
    })
}

fn media_value(media: &MediaState) -> Value {
    json!({
        "paused": media.paused,
        "muted": media.muted,
        "volume": media.volume,
        "current_time": media.current_time,
    })
}

fn error_value(error: &RoutingError) -> Value {
    json!({
        "kind": error.kind(),
        "detail": error.detail(),
    })
}

// ---------------------------------------------------------------------------
// JsonLinesSink
// ---------------------------------------------------------------------------

/// A [`DiagnosticsSink`] that writes one JSON object per line.
pub struct JsonLinesSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for JsonLinesSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesSink").finish_non_exhaustive()
    }
}

impl JsonLinesSink {
    /// Creates a sink that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            writer: Box::new(io::stdout()),
        }
    }
}

impl<W: Write> JsonLinesSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, event: &RecordedEvent) {
        if serde_json::to_writer(&mut self.writer, &event_value(event)).is_ok() {
            let _ = writeln!(self.writer);
        }
    }
}

impl<W: Write> DiagnosticsSink for JsonLinesSink<W> {
    fn on_status(&mut self, message: &str, snapshot: &DiagnosticSnapshot) {
        self.write(&RecordedEvent::Status {
            message: message.to_owned(),
            snapshot: *snapshot,
        });
    }

    fn on_degraded(&mut self, error: &RoutingError, snapshot: &DiagnosticSnapshot) {
        self.write(&RecordedEvent::Degraded {
            error: error.clone(),
            snapshot: *snapshot,
        });
    }

    fn on_strategy_selected(&mut self, strategy: Strategy, snapshot: &DiagnosticSnapshot) {
        self.write(&RecordedEvent::StrategySelected {
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
        self.write(&RecordedEvent::PlaybackRejected {
            role,
            error: error.clone(),
            snapshot: *snapshot,
        });
    }

    fn on_level_changed(&mut self, level: Level, snapshot: &DiagnosticSnapshot) {
        self.write(&RecordedEvent::LevelChanged {
            level,
            snapshot: *snapshot,
        });
    }

    fn on_mute_toggled(&mut self, state: MuteState, snapshot: &DiagnosticSnapshot) {
        self.write(&RecordedEvent::MuteToggled {
            state,
            snapshot: *snapshot,
        });
    }

    fn on_media_event(&mut self, event: MediaEvent, snapshot: &DiagnosticSnapshot) {
        self.write(&RecordedEvent::Media {
            event,
            snapshot: *snapshot,
        });
    }

    fn on_periodic(&mut self, snapshot: &DiagnosticSnapshot) {
        self.write(&RecordedEvent::Periodic {
            snapshot: *snapshot,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use gainroute_core::platform::ContextState;

    fn snap() -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            timestamp_ms: 40.0,
            strategy: Some(Strategy::GraphGain),
            level: Level::PRESET,
            gain: Some(0.2),
            primary: MediaState::default(),
            fallback: None,
            context: ContextState::Running,
        }
    }

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_degraded(&RoutingError::ContextUnavailable("blocked".into()), &snap());
        rec.on_strategy_selected(Strategy::GraphGain, &snap());
        rec.on_mute_toggled(MuteState::Muted, &snap());

        let mut out = Vec::new();
        export(&rec.events(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["event"], "degraded");
        assert_eq!(parsed[0]["kind"], "ContextUnavailable");
        assert_eq!(parsed[0]["detail"], "blocked");

        assert_eq!(parsed[1]["event"], "strategy");
        assert_eq!(parsed[1]["strategy"], "GraphGain");
        assert_eq!(parsed[1]["snapshot"]["context"], "running");
        assert_eq!(parsed[1]["snapshot"]["fallback"], Value::Null);

        assert_eq!(parsed[2]["muted"], true);
        assert_eq!(parsed[2]["t"], 40.0);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn json_lines_one_object_per_line() {
        let mut sink = JsonLinesSink::with_writer(Vec::new());
        sink.on_playback_rejected(
            EndpointRole::Primary,
            &RoutingError::PlaybackRejected("NotAllowedError".into()),
            &snap(),
        );
        sink.on_periodic(&snap());

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "rejected");
        assert_eq!(lines[0]["role"], "primary");
        assert_eq!(lines[1]["event"], "periodic");
        assert_eq!(lines[1]["snapshot"]["gain"], 0.2);
    }
}
