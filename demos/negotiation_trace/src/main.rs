// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted negotiation runs that exercise the diagnostics pipeline.
//!
//! Replays every [`Script`](gainroute_debug::sim::Script) in the catalog, plus
//! one run with `forceAudioFallback`, through a
//! [`VolumeController`](gainroute_core::controller::VolumeController). Each
//! run negotiates, moves the slider, presses the preset and mute buttons and
//! takes a periodic snapshot. Events go to a
//! [`PrettyPrintSink`](gainroute_debug::pretty::PrettyPrintSink) on stdout and
//! a [`RecorderSink`](gainroute_debug::recorder::RecorderSink), which is then
//! exported as JSON.

use std::fs::File;
use std::io::BufWriter;

use gainroute_core::config::RoutingConfig;
use gainroute_core::controller::VolumeController;
use gainroute_core::level::Level;
use gainroute_debug::pretty::PrettyPrintSink;
use gainroute_debug::recorder::RecorderSink;
use gainroute_debug::sim::{Script, ScriptedPlatform};
use gainroute_debug::tee::TeeSink;

/// Interval of the page's periodic snapshot timer.
const PERIOD_MS: f64 = 5_000.0;

fn main() {
    let recorder = RecorderSink::new();

    let mut runs: Vec<(Script, RoutingConfig)> = Script::catalog()
        .into_iter()
        .map(|script| (script, RoutingConfig::default()))
        .collect();
    runs.push((
        Script {
            name: "forceAudioFallback",
            ..Script::happy()
        },
        RoutingConfig {
            force_fallback: true,
            ..RoutingConfig::default()
        },
    ));

    for (script, config) in runs {
        let sink = TeeSink::new(
            PrettyPrintSink::new(Box::new(std::io::stdout())).terse_status(),
            recorder.clone(),
        );
        let controller = VolumeController::with_sink(ScriptedPlatform::new(script), config, sink);
        println!(
            "== {} (forceAudioFallback={}) ==",
            controller.platform().script().name,
            controller.config().force_fallback,
        );

        // 1. First play gesture.
        let Some(report) = pollster::block_on(controller.negotiate()) else {
            continue;
        };
        println!(
            "   -> {} after {} degradation(s), playback {}, src {}",
            report.strategy,
            report.degradations.len(),
            if report.playback.is_ok() { "ok" } else { "refused" },
            controller.platform().loaded_source().unwrap_or_default(),
        );

        // 2. A refused play gets a second gesture.
        if report.playback.is_err() && !report.is_terminal_failure() {
            controller.platform().grant_autoplay();
            let _ = pollster::block_on(controller.resume_playback());
        }

        // 3. Slider, preset, mute twice.
        controller.platform().advance(750.0);
        if let Some(level) = Level::new(0.5) {
            controller.set_level(level);
        }
        controller.apply_preset();
        controller.toggle_mute();
        controller.toggle_mute();

        // 4. Periodic snapshot.
        controller.platform().advance(PERIOD_MS);
        controller.report_periodic();
        println!();
    }

    let path = "negotiation_trace.json";
    let file = File::create(path).expect("failed to create negotiation_trace.json");
    let mut writer = BufWriter::new(file);
    gainroute_debug::json::export(&recorder.events(), &mut writer)
        .expect("failed to write negotiation trace");

    println!("Wrote {path} ({} events)", recorder.len());
}
