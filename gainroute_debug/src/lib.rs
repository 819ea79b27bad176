// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and JSON export for gainroute diagnostics.
//!
//! This crate provides [`DiagnosticsSink`](gainroute_core::diagnostics::DiagnosticsSink)
//! implementations for development and post-mortem analysis, plus a scripted
//! platform for running the controller off the browser:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: in-memory event recording with a shared
//!   handle, for tests and later export.
//! - [`json::JsonLinesSink`] and [`json::export`]: JSON output of live or
//!   recorded events.
//! - [`tee::TeeSink`]: fans events out to two sinks.
//! - [`sim::ScriptedPlatform`]: an
//!   [`AudioPlatform`](gainroute_core::platform::AudioPlatform) whose
//!   failures are chosen up front.

pub mod json;
pub mod pretty;
pub mod recorder;
pub mod sim;
pub mod tee;
