// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostics to the browser console.

use alloc::format;

use gainroute_core::diagnostics::{DiagnosticSnapshot, DiagnosticsSink, MediaEvent, MuteState};
use gainroute_core::error::RoutingError;
use gainroute_core::level::Level;
use gainroute_core::platform::EndpointRole;
use gainroute_core::strategy::Strategy;
use wasm_bindgen::JsValue;
use web_sys::console;

/// A [`DiagnosticsSink`] that writes one console line per event.
///
/// Degradations go to `console.warn` and playback rejections to
/// `console.error`; everything else uses `console.log`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    /// Creates a console sink.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn log(line: &str) {
    console::log_1(&JsValue::from_str(line));
}

impl DiagnosticsSink for ConsoleSink {
    fn on_status(&mut self, message: &str, snapshot: &DiagnosticSnapshot) {
        log(&format!("[status] {message} | {snapshot}"));
    }

    fn on_degraded(&mut self, error: &RoutingError, snapshot: &DiagnosticSnapshot) {
        console::warn_1(&JsValue::from_str(&format!(
            "[degraded] {error} | {snapshot}"
        )));
    }

    fn on_strategy_selected(&mut self, strategy: Strategy, snapshot: &DiagnosticSnapshot) {
        log(&format!("[strategy] {strategy} | {snapshot}"));
    }

    fn on_playback_rejected(
        &mut self,
        role: EndpointRole,
        error: &RoutingError,
        snapshot: &DiagnosticSnapshot,
    ) {
        console::error_1(&JsValue::from_str(&format!(
            "[rejected] {} {error} | {snapshot}",
            role.as_str()
        )));
    }

    fn on_level_changed(&mut self, level: Level, snapshot: &DiagnosticSnapshot) {
        log(&format!("[level] {level} | {snapshot}"));
    }

    fn on_mute_toggled(&mut self, state: MuteState, snapshot: &DiagnosticSnapshot) {
        log(&format!("[mute] {state:?} | {snapshot}"));
    }

    fn on_media_event(&mut self, event: MediaEvent, snapshot: &DiagnosticSnapshot) {
        log(&format!("[{}] {snapshot}", event.dom_name()));
    }

    fn on_periodic(&mut self, snapshot: &DiagnosticSnapshot) {
        log(&format!("[periodic] {snapshot}"));
    }
}
