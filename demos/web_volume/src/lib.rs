// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Volume slider for a streaming video, on platforms that ignore native volume.
//!
//! This demo renders a `<video>` element with a play button, a volume slider,
//! a "set to 0.2" button and a mute toggle. The first play click negotiates a
//! routing strategy; the slider stays disabled until one is active. Status,
//! gain and native volume readouts update from the controller's diagnostics.
//!
//! Query parameters: `src` (stream URL, URL-encoded) and
//! `forceAudioFallback=true` (skip routing the visible element).
//!
//! Build with: `wasm-pack build --target web demos/web_volume`
//! Then serve `demos/web_volume/` and open `index.html`.

#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;

use gainroute_backend_web::{
    ConsoleSink, IntervalTimer, WebAudioPlatform, config_from_location, is_ios,
    probe_playback_types,
};
use gainroute_core::controller::VolumeController;
use gainroute_core::diagnostics::{DiagnosticSnapshot, DiagnosticsSink, MediaEvent, MuteState};
use gainroute_core::error::RoutingError;
use gainroute_core::level::Level;
use gainroute_core::platform::EndpointRole;
use gainroute_core::strategy::Strategy;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{
    Document, Event, HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlMediaElement,
    HtmlVideoElement, console,
};

const VIDEO_W: u32 = 640;
const VIDEO_H: u32 = 360;
const SNAPSHOT_PERIOD_MS: i32 = 5_000;

type Controller = VolumeController<WebAudioPlatform>;

#[derive(Clone)]
struct VolumeUi {
    play_button: HtmlButtonElement,
    slider: HtmlInputElement,
    preset_button: HtmlButtonElement,
    mute_button: HtmlButtonElement,
}

impl VolumeUi {
    fn enable_level_controls(&self) {
        self.slider.set_disabled(false);
        self.preset_button.set_disabled(false);
        self.mute_button.set_disabled(false);
    }

    fn show_level(&self, level: Level) {
        self.slider.set_value(&format!("{}", level.get()));
    }

    fn show_playback(&self, playback: &Result<(), RoutingError>) {
        match playback {
            Ok(()) => {
                self.play_button.set_text_content(Some("Playing"));
                self.play_button.set_disabled(true);
            }
            Err(_) => self.play_button.set_text_content(Some("Retry Play")),
        }
    }
}

/// Mirrors diagnostics into the page and the console.
struct DomSink {
    console: ConsoleSink,
    ui: VolumeUi,
    status: HtmlElement,
    strategy: HtmlElement,
    gain: HtmlElement,
    volume: HtmlElement,
}

impl DomSink {
    fn refresh(&self, snapshot: &DiagnosticSnapshot) {
        let gain = snapshot
            .gain
            .map_or_else(|| String::from("-"), |g| format!("{g:.2}"));
        self.gain.set_text_content(Some(&gain));
        self.volume
            .set_text_content(Some(&format!("{:.2}", snapshot.primary.volume)));
        self.strategy.set_text_content(Some(
            snapshot
                .strategy
                .map_or("not negotiated", Strategy::as_str),
        ));
    }
}

impl DiagnosticsSink for DomSink {
    fn on_status(&mut self, message: &str, snapshot: &DiagnosticSnapshot) {
        self.console.on_status(message, snapshot);
        self.status.set_text_content(Some(message));
        self.refresh(snapshot);
    }

    fn on_degraded(&mut self, error: &RoutingError, snapshot: &DiagnosticSnapshot) {
        self.console.on_degraded(error, snapshot);
    }

    fn on_strategy_selected(&mut self, strategy: Strategy, snapshot: &DiagnosticSnapshot) {
        self.console.on_strategy_selected(strategy, snapshot);
        // Level changes work from here on, even while playback is pending.
        self.ui.enable_level_controls();
        self.ui.show_level(snapshot.level);
        self.refresh(snapshot);
    }

    fn on_playback_rejected(
        &mut self,
        role: EndpointRole,
        error: &RoutingError,
        snapshot: &DiagnosticSnapshot,
    ) {
        self.console.on_playback_rejected(role, error, snapshot);
    }

    fn on_level_changed(&mut self, level: Level, snapshot: &DiagnosticSnapshot) {
        self.console.on_level_changed(level, snapshot);
        self.refresh(snapshot);
    }

    fn on_mute_toggled(&mut self, state: MuteState, snapshot: &DiagnosticSnapshot) {
        self.console.on_mute_toggled(state, snapshot);
        self.refresh(snapshot);
    }

    fn on_media_event(&mut self, event: MediaEvent, snapshot: &DiagnosticSnapshot) {
        self.console.on_media_event(event, snapshot);
        self.refresh(snapshot);
    }

    fn on_periodic(&mut self, snapshot: &DiagnosticSnapshot) {
        self.console.on_periodic(snapshot);
        self.refresh(snapshot);
    }
}

/// Entry point for the web-volume demo.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    let document = web_sys::window()
        .expect("window")
        .document()
        .expect("document");
    let config = config_from_location()?;

    let shell = create_shell(&document)?;
    document.body().expect("body").append_child(&shell)?;

    let video: HtmlVideoElement = document.create_element("video")?.unchecked_into();
    video.set_controls(true);
    video.set_preload("none");
    video.set_attribute("playsinline", "")?;
    video.set_width(VIDEO_W);
    video.set_height(VIDEO_H);
    style(
        &video,
        "width: 640px; height: 360px; background: #10121f; border-radius: 12px;",
    )?;
    shell.append_child(&video)?;

    let source = element(&document, "code")?;
    style(
        &source,
        "max-width: 640px; overflow-wrap: anywhere; font-size: 12px; color: #29415c;",
    )?;
    source.set_text_content(Some(&config.source));
    shell.append_child(&source)?;

    let controls = element(&document, "div")?;
    style(
        &controls,
        "display: flex; gap: 10px; align-items: center; width: 640px;",
    )?;
    let play_button = button(&document, "Play")?;
    let slider: HtmlInputElement = document.create_element("input")?.unchecked_into();
    slider.set_type("range");
    slider.set_min("0");
    slider.set_max("1");
    slider.set_step("0.01");
    slider.set_value("1");
    slider.set_disabled(true);
    style(&slider, "flex: 1;")?;
    let preset_button = button(&document, &format!("Set to {}", Level::PRESET))?;
    preset_button.set_disabled(true);
    let mute_button = button(&document, "Toggle Mute")?;
    mute_button.set_disabled(true);
    controls.append_child(&play_button)?;
    controls.append_child(&slider)?;
    controls.append_child(&preset_button)?;
    controls.append_child(&mute_button)?;
    shell.append_child(&controls)?;

    let readouts = element(&document, "dl")?;
    style(
        &readouts,
        "display: grid; grid-template-columns: auto 1fr; gap: 4px 12px; width: 640px; margin: 0; font: 13px/1.3 ui-monospace, SFMono-Regular, Menlo, monospace; color: #17304a;",
    )?;
    let status = readout(&document, &readouts, "status", "Click Play to start.")?;
    let strategy = readout(&document, &readouts, "strategy", "not negotiated")?;
    let gain = readout(&document, &readouts, "gain", "-")?;
    let volume = readout(
        &document,
        &readouts,
        "video volume",
        &format!("{:.2}", video.volume()),
    )?;
    shell.append_child(&readouts)?;

    let platform = WebAudioPlatform::new(HtmlMediaElement::from(video.clone()));
    log(&format!(
        "platform: ios={} src={} forceAudioFallback={}",
        is_ios(),
        config.source,
        config.force_fallback,
    ));
    for (mime, answer) in probe_playback_types(platform.primary()) {
        log(&format!("canPlayType {mime} -> {answer:?}"));
    }

    let ui = VolumeUi {
        play_button,
        slider,
        preset_button,
        mute_button,
    };
    let sink = DomSink {
        console: ConsoleSink::new(),
        ui: ui.clone(),
        status,
        strategy,
        gain,
        volume,
    };
    let controller = Rc::new(VolumeController::with_sink(platform, config, sink));

    bind_controls(&controller, &ui)?;
    bind_media_events(&controller, &video)?;
    keep_primary_muted(&controller, &video)?;

    Ok(())
}

fn bind_controls(controller: &Rc<Controller>, ui: &VolumeUi) -> Result<(), JsValue> {
    let periodic = Rc::clone(controller);
    let timer = Rc::new(IntervalTimer::new(SNAPSHOT_PERIOD_MS, move || {
        periodic.report_periodic();
    }));

    let play_controller = Rc::clone(controller);
    let play_ui = ui.clone();
    let play_cb = Closure::wrap(Box::new(move |_event: Event| {
        play_async(
            Rc::clone(&play_controller),
            play_ui.clone(),
            Rc::clone(&timer),
        );
    }) as Box<dyn FnMut(_)>);
    ui.play_button
        .add_event_listener_with_callback("click", play_cb.as_ref().unchecked_ref())?;
    play_cb.forget();

    let slider_controller = Rc::clone(controller);
    let slider = ui.slider.clone();
    let slider_cb = Closure::wrap(Box::new(move |_event: Event| {
        if let Some(level) = Level::parse(&slider.value()) {
            slider_controller.set_level(level);
        }
    }) as Box<dyn FnMut(_)>);
    ui.slider
        .add_event_listener_with_callback("input", slider_cb.as_ref().unchecked_ref())?;
    slider_cb.forget();

    let preset_controller = Rc::clone(controller);
    let preset_ui = ui.clone();
    let preset_cb = Closure::wrap(Box::new(move |_event: Event| {
        if let Some(level) = preset_controller.apply_preset() {
            preset_ui.show_level(level);
        }
    }) as Box<dyn FnMut(_)>);
    ui.preset_button
        .add_event_listener_with_callback("click", preset_cb.as_ref().unchecked_ref())?;
    preset_cb.forget();

    let mute_controller = Rc::clone(controller);
    let mute_ui = ui.clone();
    let mute_cb = Closure::wrap(Box::new(move |_event: Event| {
        // Under native volume the mute flag is separate from the slider.
        if mute_controller.toggle_mute().is_some()
            && mute_controller.strategy().is_some_and(Strategy::uses_graph)
        {
            mute_ui.show_level(mute_controller.level());
        }
    }) as Box<dyn FnMut(_)>);
    ui.mute_button
        .add_event_listener_with_callback("click", mute_cb.as_ref().unchecked_ref())?;
    mute_cb.forget();

    Ok(())
}

fn bind_media_events(
    controller: &Rc<Controller>,
    element: &HtmlMediaElement,
) -> Result<(), JsValue> {
    for event in MediaEvent::ALL {
        let observer = Rc::clone(controller);
        let cb = Closure::wrap(Box::new(move |_event: Event| {
            observer.observe(event);
        }) as Box<dyn FnMut(_)>);
        element.add_event_listener_with_callback(event.dom_name(), cb.as_ref().unchecked_ref())?;
        cb.forget();
    }
    Ok(())
}

/// Re-mutes the video when its native controls unmute it while the fallback
/// element carries the audio.
fn keep_primary_muted(controller: &Rc<Controller>, video: &HtmlVideoElement) -> Result<(), JsValue> {
    let guard = Rc::clone(controller);
    let target = video.clone();
    let cb = Closure::wrap(Box::new(move |_event: Event| {
        if guard.strategy() == Some(Strategy::FallbackGraphGain) && !target.muted() {
            target.set_muted(true);
        }
    }) as Box<dyn FnMut(_)>);
    video.add_event_listener_with_callback("volumechange", cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

/// Negotiates on the first click and retries playback on later ones.
///
/// On non-wasm targets this is a no-op since the demo only runs in a browser.
#[cfg(target_arch = "wasm32")]
fn play_async(controller: Rc<Controller>, ui: VolumeUi, timer: Rc<IntervalTimer>) {
    wasm_bindgen_futures::spawn_local(async move {
        if controller.strategy().is_some() {
            if let Some(playback) = controller.resume_playback().await {
                ui.show_playback(&playback);
            }
            return;
        }
        // `None` while the first click's negotiation is still running.
        let Some(report) = controller.negotiate().await else {
            return;
        };
        if report.strategy == Strategy::FallbackGraphGain
            && let Some(audio) = controller.platform().fallback()
            && let Err(err) = bind_media_events(&controller, &audio)
        {
            console::warn_1(&err);
        }
        ui.show_playback(&report.playback);
        if report.is_terminal_failure() {
            console::error_1(&JsValue::from_str(
                "no routing strategy could start playback",
            ));
        }
        timer.start();
        log(&format!("periodic snapshots every {} ms", timer.period_ms()));
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn play_async(_controller: Rc<Controller>, _ui: VolumeUi, _timer: Rc<IntervalTimer>) {}

fn log(line: &str) {
    console::log_1(&JsValue::from_str(line));
}

fn element(doc: &Document, tag: &str) -> Result<HtmlElement, JsValue> {
    Ok(doc.create_element(tag)?.unchecked_into())
}

fn button(doc: &Document, label: &str) -> Result<HtmlButtonElement, JsValue> {
    let button: HtmlButtonElement = doc.create_element("button")?.unchecked_into();
    button.set_text_content(Some(label));
    style(
        &button,
        "border: 0; border-radius: 999px; padding: 8px 16px; background: #0f5d71; color: #eff8ff; font-weight: 600; cursor: pointer;",
    )?;
    Ok(button)
}

fn readout(
    doc: &Document,
    host: &HtmlElement,
    label: &str,
    initial: &str,
) -> Result<HtmlElement, JsValue> {
    let term = element(doc, "dt")?;
    term.set_text_content(Some(label));
    let value = element(doc, "dd")?;
    style(&value, "margin: 0;")?;
    value.set_text_content(Some(initial));
    host.append_child(&term)?;
    host.append_child(&value)?;
    Ok(value)
}

fn create_shell(doc: &Document) -> Result<HtmlElement, JsValue> {
    let shell = element(doc, "section")?;
    style(
        &shell,
        "width: 700px; padding: 24px 28px 20px; border-radius: 20px; background: rgba(255,255,255,0.82); border: 1px solid rgba(22,44,65,0.15); box-shadow: 0 24px 70px rgba(26,43,64,0.2); display: grid; gap: 14px; justify-items: center;",
    )?;
    Ok(shell)
}

fn style(el: &web_sys::Element, css: &str) -> Result<(), JsValue> {
    el.set_attribute("style", css)
}
