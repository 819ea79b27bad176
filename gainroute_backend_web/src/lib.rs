// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for gainroute.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`WebAudioPlatform`]: [`AudioPlatform`] over `AudioContext`,
//!   `MediaElementAudioSourceNode`, `GainNode` and a hidden `<audio>`
//!   fallback element
//! - [`config_from_location`]: [`RoutingConfig`] from `window.location.search`
//! - [`ConsoleSink`]: diagnostics to the browser console
//! - [`IntervalTimer`]: `setInterval` driver for periodic snapshots
//! - [`is_ios`]: detection of the platform where native volume is inert
//!
//! [`AudioPlatform`]: gainroute_core::platform::AudioPlatform
//! [`RoutingConfig`]: gainroute_core::config::RoutingConfig

#![no_std]

extern crate alloc;

mod console;
mod detect;
mod interval;
mod platform;
mod query;

pub use console::ConsoleSink;
pub use detect::{PROBED_TYPES, is_ios, is_ios_agent, probe_playback_types};
pub use interval::IntervalTimer;
pub use platform::{WebAudioPlatform, WebGraph};
pub use query::{config_from_location, config_from_search};

use alloc::format;
use alloc::string::String;

use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;

// Direct global binding instead of `web_sys::Window::performance()`, which
// would fetch and unwrap the Performance object on every snapshot.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    fn performance_now() -> f64;
}

/// Returns milliseconds since page load from `performance.now()`.
#[must_use]
pub fn now_ms() -> f64 {
    performance_now()
}

/// Describes a thrown JS value for status text and logs.
///
/// `Error` and `DOMException` instances become `"Name: message"`; strings are
/// passed through; anything else uses its debug form.
#[must_use]
pub fn js_detail(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        let name = String::from(err.name());
        let message = String::from(err.message());
        format!("{name}: {message}")
    } else if let Some(s) = value.as_string() {
        s
    } else {
        format!("{value:?}")
    }
}
