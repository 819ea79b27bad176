// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable diagnostics output.
//!
//! [`PrettyPrintSink`] implements [`DiagnosticsSink`] and writes one line per
//! event to a [`Write`](std::io::Write) destination (default: stderr). Each
//! line starts with a bracketed tag and ends with the snapshot.

use std::io::Write;

use gainroute_core::diagnostics::{DiagnosticSnapshot, DiagnosticsSink, MediaEvent, MuteState};
use gainroute_core::error::RoutingError;
use gainroute_core::level::Level;
use gainroute_core::platform::EndpointRole;
use gainroute_core::strategy::Strategy;

/// Writes human-readable diagnostic lines to a [`Write`](std::io::Write)
/// destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    with_snapshots: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("with_snapshots", &self.with_snapshots)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            with_snapshots: true,
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            with_snapshots: true,
        }
    }

    /// Omits the trailing snapshot from status lines.
    ///
    /// Other events keep their snapshot; status lines are the ones a reader
    /// scans for the narrative.
    #[must_use]
    pub fn terse_status(mut self) -> Self {
        self.with_snapshots = false;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiagnosticsSink for PrettyPrintSink<W> {
    fn on_status(&mut self, message: &str, snapshot: &DiagnosticSnapshot) {
        let _ = if self.with_snapshots {
            writeln!(self.writer, "[status] {message} | {snapshot}")
        } else {
            writeln!(self.writer, "[status] {message}")
        };
    }

    fn on_degraded(&mut self, error: &RoutingError, snapshot: &DiagnosticSnapshot) {
        let _ = writeln!(
            self.writer,
            "[degraded] {} {} | {snapshot}",
            error.kind(),
            error.detail(),
        );
    }

    fn on_strategy_selected(&mut self, strategy: Strategy, snapshot: &DiagnosticSnapshot) {
        let _ = writeln!(self.writer, "[strategy] {strategy} | {snapshot}");
    }

    fn on_playback_rejected(
        &mut self,
        role: EndpointRole,
        error: &RoutingError,
        snapshot: &DiagnosticSnapshot,
    ) {
        let _ = writeln!(
            self.writer,
            "[rejected] {} {} | {snapshot}",
            role.as_str(),
            error.detail(),
        );
    }

    fn on_level_changed(&mut self, level: Level, snapshot: &DiagnosticSnapshot) {
        let _ = writeln!(self.writer, "[level] {level} | {snapshot}");
    }

    fn on_mute_toggled(&mut self, state: MuteState, snapshot: &DiagnosticSnapshot) {
        let state = match state {
            MuteState::Muted => "muted",
            MuteState::Unmuted => "unmuted",
        };
        let _ = writeln!(self.writer, "[mute] {state} | {snapshot}");
    }

    fn on_media_event(&mut self, event: MediaEvent, snapshot: &DiagnosticSnapshot) {
        let _ = writeln!(self.writer, "[media:{}] {snapshot}", event.dom_name());
    }

    fn on_periodic(&mut self, snapshot: &DiagnosticSnapshot) {
        let _ = writeln!(self.writer, "[periodic] {snapshot}");
    }
}
