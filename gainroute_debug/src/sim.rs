// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted platform for running the controller off the browser.
//!
//! [`ScriptedPlatform`] implements [`AudioPlatform`] with plain cells. Which
//! steps fail is decided up front by a [`Script`], so each degradation path
//! can be replayed deterministically from a native binary or a test.

use std::cell::{Cell, RefCell};
use std::future::{Future, ready};
use std::rc::Rc;

use gainroute_core::error::RoutingError;
use gainroute_core::platform::{AudioPlatform, ContextState, EndpointRole, GainStage, MediaState};

/// Failures to inject. `None` means the step succeeds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Script {
    /// Short name shown by the trace demo.
    pub name: &'static str,
    /// Context creation or resume throws this.
    pub context_error: Option<&'static str>,
    /// Binding the primary element throws this.
    pub primary_bind_error: Option<&'static str>,
    /// Creating the fallback element throws this.
    pub fallback_create_error: Option<&'static str>,
    /// Binding the fallback element throws this.
    pub fallback_bind_error: Option<&'static str>,
    /// The primary element's play request is refused with this.
    pub primary_play_error: Option<&'static str>,
    /// The fallback element's play request is refused with this.
    pub fallback_play_error: Option<&'static str>,
    /// Native volume writes are inaudible, as on iOS.
    pub native_volume_inert: bool,
}

impl Script {
    /// Every step succeeds.
    #[must_use]
    pub fn happy() -> Self {
        Self {
            name: "happy path",
            ..Self::default()
        }
    }

    /// A desktop browser that blocks autoplay until a second gesture.
    #[must_use]
    pub fn autoplay_blocked() -> Self {
        Self {
            name: "autoplay blocked",
            primary_play_error: Some("NotAllowedError: play() requires a user gesture"),
            ..Self::default()
        }
    }

    /// The primary element cannot be routed; the fallback can.
    #[must_use]
    pub fn primary_unroutable() -> Self {
        Self {
            name: "primary unroutable",
            primary_bind_error: Some("InvalidStateError: element already connected"),
            ..Self::default()
        }
    }

    /// The primary element cannot be routed and no fallback element can be
    /// created.
    #[must_use]
    pub fn fallback_unavailable() -> Self {
        Self {
            name: "fallback unavailable",
            primary_bind_error: Some("InvalidStateError: element already connected"),
            fallback_create_error: Some("NotSupportedError: audio element unavailable"),
            ..Self::default()
        }
    }

    /// Routing lands on the fallback element, whose first play is refused.
    #[must_use]
    pub fn fallback_autoplay_blocked() -> Self {
        Self {
            name: "fallback autoplay blocked",
            primary_bind_error: Some("InvalidStateError: element already connected"),
            fallback_play_error: Some("NotAllowedError: play() requires a user gesture"),
            ..Self::default()
        }
    }

    /// iOS Safari where no graph can be used at all.
    #[must_use]
    pub fn ios_without_graph() -> Self {
        Self {
            name: "iOS without graph",
            primary_bind_error: Some("InvalidStateError: element already connected"),
            fallback_bind_error: Some("SecurityError: cross-origin media"),
            native_volume_inert: true,
            ..Self::default()
        }
    }

    /// No audio-processing context at all.
    #[must_use]
    pub fn no_context() -> Self {
        Self {
            name: "no audio context",
            context_error: Some("NotSupportedError: AudioContext unavailable"),
            ..Self::default()
        }
    }

    /// The named scripts, in the order the trace demo runs them.
    #[must_use]
    pub fn catalog() -> Vec<Self> {
        vec![
            Self::happy(),
            Self::autoplay_blocked(),
            Self::primary_unroutable(),
            Self::fallback_unavailable(),
            Self::fallback_autoplay_blocked(),
            Self::ios_without_graph(),
            Self::no_context(),
        ]
    }
}

/// A gain stage whose value is shared with the platform for inspection.
#[derive(Clone, Debug)]
pub struct SimGraph {
    gain: Rc<Cell<f64>>,
}

impl GainStage for SimGraph {
    fn gain(&self) -> f64 {
        self.gain.get()
    }

    fn set_gain(&self, value: f64) {
        self.gain.set(value);
    }
}

/// An [`AudioPlatform`] driven by a [`Script`].
#[derive(Debug)]
pub struct ScriptedPlatform {
    script: Script,
    clock_ms: Cell<f64>,
    context: Cell<ContextState>,
    source: RefCell<Option<String>>,
    primary: Cell<MediaState>,
    fallback: Cell<Option<MediaState>>,
    primary_gain: RefCell<Option<Rc<Cell<f64>>>>,
    fallback_gain: RefCell<Option<Rc<Cell<f64>>>>,
    play_requests: Cell<u32>,
    autoplay_granted: Cell<bool>,
}

impl ScriptedPlatform {
    /// Creates a platform that will follow `script`.
    #[must_use]
    pub fn new(script: Script) -> Self {
        Self {
            script,
            clock_ms: Cell::new(0.0),
            context: Cell::new(ContextState::Unavailable),
            source: RefCell::new(None),
            primary: Cell::new(MediaState::default()),
            fallback: Cell::new(None),
            primary_gain: RefCell::new(None),
            fallback_gain: RefCell::new(None),
            play_requests: Cell::new(0),
            autoplay_granted: Cell::new(false),
        }
    }

    /// Returns the script this platform follows.
    #[must_use]
    pub fn script(&self) -> &Script {
        &self.script
    }

    /// Lets play requests succeed from now on, as after a user gesture.
    pub fn grant_autoplay(&self) {
        self.autoplay_granted.set(true);
    }

    /// Moves the clock and the playhead of every playing element forward.
    pub fn advance(&self, ms: f64) {
        self.clock_ms.set(self.clock_ms.get() + ms);
        let seconds = ms / 1000.0;
        let mut primary = self.primary.get();
        if !primary.paused {
            primary.current_time += seconds;
            self.primary.set(primary);
        }
        if let Some(mut fallback) = self.fallback.get()
            && !fallback.paused
        {
            fallback.current_time += seconds;
            self.fallback.set(Some(fallback));
        }
    }

    /// Returns the source assigned to the primary element.
    #[must_use]
    pub fn loaded_source(&self) -> Option<String> {
        self.source.borrow().clone()
    }

    /// Returns the gain of `role`'s gain stage, if one was bound.
    #[must_use]
    pub fn graph_gain(&self, role: EndpointRole) -> Option<f64> {
        self.gain_slot(role).borrow().as_ref().map(|g| g.get())
    }

    /// Returns how many play requests were issued.
    #[must_use]
    pub fn play_requests(&self) -> u32 {
        self.play_requests.get()
    }

    fn gain_slot(&self, role: EndpointRole) -> &RefCell<Option<Rc<Cell<f64>>>> {
        match role {
            EndpointRole::Primary => &self.primary_gain,
            EndpointRole::Fallback => &self.fallback_gain,
        }
    }

    fn update(&self, role: EndpointRole, f: impl FnOnce(&mut MediaState)) {
        match role {
            EndpointRole::Primary => {
                let mut state = self.primary.get();
                f(&mut state);
                self.primary.set(state);
            }
            EndpointRole::Fallback => {
                if let Some(mut state) = self.fallback.get() {
                    f(&mut state);
                    self.fallback.set(Some(state));
                }
            }
        }
    }
}

impl AudioPlatform for ScriptedPlatform {
    type Graph = SimGraph;

    fn load_primary(&self, source: &str) {
        let mut slot = self.source.borrow_mut();
        if slot.is_none() {
            *slot = Some(source.to_owned());
        }
    }

    fn resume_context(&self) -> impl Future<Output = Result<ContextState, RoutingError>> {
        let result = match self.script.context_error {
            Some(detail) => Err(RoutingError::ContextUnavailable(detail.to_owned())),
            None => {
                self.context.set(ContextState::Running);
                Ok(ContextState::Running)
            }
        };
        ready(result)
    }

    fn context_state(&self) -> ContextState {
        self.context.get()
    }

    fn bind_graph(&self, role: EndpointRole) -> Result<SimGraph, RoutingError> {
        let error = match role {
            EndpointRole::Primary => self.script.primary_bind_error,
            EndpointRole::Fallback => self.script.fallback_bind_error,
        };
        if let Some(detail) = error {
            return Err(RoutingError::binding_failed(role, detail));
        }
        let slot = self.gain_slot(role);
        if slot.borrow().is_some() {
            return Err(RoutingError::binding_failed(
                role,
                "InvalidStateError: element already connected",
            ));
        }
        let gain = Rc::new(Cell::new(1.0));
        *slot.borrow_mut() = Some(Rc::clone(&gain));
        Ok(SimGraph { gain })
    }

    fn create_fallback(&self, _source: &str) -> Result<(), RoutingError> {
        if let Some(detail) = self.script.fallback_create_error {
            return Err(RoutingError::FallbackBindingFailed(detail.to_owned()));
        }
        if self.fallback.get().is_none() {
            self.fallback.set(Some(MediaState::default()));
        }
        Ok(())
    }

    fn play(&self, role: EndpointRole) -> impl Future<Output = Result<(), RoutingError>> {
        self.play_requests.set(self.play_requests.get() + 1);
        let error = match role {
            _ if self.autoplay_granted.get() => None,
            EndpointRole::Primary => self.script.primary_play_error,
            EndpointRole::Fallback => self.script.fallback_play_error,
        };
        let result = match error {
            Some(detail) => Err(RoutingError::PlaybackRejected(detail.to_owned())),
            None if role == EndpointRole::Fallback && self.fallback.get().is_none() => Err(
                RoutingError::PlaybackRejected("fallback element does not exist".to_owned()),
            ),
            None => {
                self.update(role, |m| m.paused = false);
                Ok(())
            }
        };
        ready(result)
    }

    fn set_muted(&self, role: EndpointRole, muted: bool) {
        self.update(role, |m| m.muted = muted);
    }

    fn set_volume(&self, role: EndpointRole, volume: f64) {
        self.update(role, |m| m.volume = volume);
    }

    fn media_state(&self, role: EndpointRole) -> Option<MediaState> {
        match role {
            EndpointRole::Primary => Some(self.primary.get()),
            EndpointRole::Fallback => self.fallback.get(),
        }
    }

    fn native_volume_inert(&self) -> bool {
        self.script.native_volume_inert
    }

    fn now_ms(&self) -> f64 {
        self.clock_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use gainroute_core::config::RoutingConfig;
    use gainroute_core::controller::VolumeController;
    use gainroute_core::level::Level;
    use gainroute_core::strategy::Strategy;
    use pollster::block_on;

    fn run(
        script: Script,
        config: RoutingConfig,
    ) -> (VolumeController<ScriptedPlatform>, RecorderSink) {
        let recorder = RecorderSink::new();
        let controller =
            VolumeController::with_sink(ScriptedPlatform::new(script), config, recorder.clone());
        (controller, recorder)
    }

    #[test]
    fn catalog_outcomes() {
        let expected = [
            Strategy::GraphGain,
            Strategy::GraphGain,
            Strategy::FallbackGraphGain,
            Strategy::NativeVolume,
            Strategy::FallbackGraphGain,
            Strategy::NativeVolume,
            Strategy::NativeVolume,
        ];
        for (script, want) in Script::catalog().into_iter().zip(expected) {
            let name = script.name;
            let (controller, recorder) = run(script, RoutingConfig::default());
            let report = block_on(controller.negotiate()).unwrap();
            assert_eq!(report.strategy, want, "{name}");
            assert_eq!(recorder.strategies(), [want], "{name}");
        }
    }

    #[test]
    fn fallback_path_mutes_primary_and_plays_both() {
        let (controller, _) = run(Script::primary_unroutable(), RoutingConfig::default());
        let report = block_on(controller.negotiate()).unwrap();
        assert!(report.playback.is_ok());

        let platform = controller.platform();
        let primary = platform.media_state(EndpointRole::Primary).unwrap();
        let fallback = platform.media_state(EndpointRole::Fallback).unwrap();
        assert!(primary.muted);
        assert!(!primary.paused);
        assert!(!fallback.paused);
        assert_eq!(platform.play_requests(), 2);

        controller.set_level(Level::PRESET);
        assert_eq!(platform.graph_gain(EndpointRole::Fallback), Some(0.2));
        assert_eq!(platform.graph_gain(EndpointRole::Primary), None);
    }

    #[test]
    fn missing_fallback_element_degrades_to_native_volume() {
        let (controller, recorder) = run(Script::fallback_unavailable(), RoutingConfig::default());
        let report = block_on(controller.negotiate()).unwrap();

        assert_eq!(report.strategy, Strategy::NativeVolume);
        let kinds: Vec<_> = report.degradations.iter().map(RoutingError::kind).collect();
        assert_eq!(kinds, ["GraphBindingFailed", "FallbackBindingFailed"]);
        assert!(report.playback.is_ok());
        assert!(!report.is_terminal_failure());

        let platform = controller.platform();
        assert_eq!(platform.media_state(EndpointRole::Fallback), None);
        let primary = platform.media_state(EndpointRole::Primary).unwrap();
        assert!(!primary.muted);
        assert!(!primary.paused);
        assert_eq!(recorder.strategies(), [Strategy::NativeVolume]);

        controller.set_level(Level::PRESET);
        assert_eq!(platform.media_state(EndpointRole::Primary).unwrap().volume, 0.2);
    }

    #[test]
    fn refused_fallback_play_keeps_fallback_strategy() {
        for config in [
            RoutingConfig::default(),
            RoutingConfig {
                force_fallback: true,
                ..RoutingConfig::default()
            },
        ] {
            let (controller, recorder) = run(Script::fallback_autoplay_blocked(), config);
            let report = block_on(controller.negotiate()).unwrap();

            assert_eq!(report.strategy, Strategy::FallbackGraphGain);
            assert!(matches!(
                report.playback,
                Err(RoutingError::PlaybackRejected(_))
            ));
            assert!(!report.is_terminal_failure());
            assert!(
                recorder
                    .statuses()
                    .iter()
                    .any(|s| s.starts_with("Play failed: NotAllowedError"))
            );

            let platform = controller.platform();
            assert!(platform.media_state(EndpointRole::Primary).unwrap().muted);
            assert!(platform.media_state(EndpointRole::Fallback).unwrap().paused);

            platform.grant_autoplay();
            assert_eq!(block_on(controller.resume_playback()), Some(Ok(())));
            assert!(!platform.media_state(EndpointRole::Fallback).unwrap().paused);
        }
    }

    #[test]
    fn second_gesture_recovers_from_autoplay_block() {
        let (controller, recorder) = run(Script::autoplay_blocked(), RoutingConfig::default());
        let report = block_on(controller.negotiate()).unwrap();
        assert!(report.playback.is_err());
        assert!(!report.is_terminal_failure());
        assert!(
            recorder
                .statuses()
                .iter()
                .any(|s| s.starts_with("Play failed: NotAllowedError"))
        );

        controller.platform().grant_autoplay();
        assert_eq!(block_on(controller.resume_playback()), Some(Ok(())));
        assert_eq!(
            recorder.statuses().last().map(String::as_str),
            Some("Playing via gain stage (volume slider works)")
        );
    }

    #[test]
    fn advance_moves_only_playing_elements() {
        let platform = ScriptedPlatform::new(Script::happy());
        platform.advance(500.0);
        assert_eq!(platform.media_state(EndpointRole::Primary).unwrap().current_time, 0.0);
        let _ = block_on(platform.play(EndpointRole::Primary));
        platform.advance(1500.0);
        assert_eq!(platform.now_ms(), 2000.0);
        assert_eq!(platform.media_state(EndpointRole::Primary).unwrap().current_time, 1.5);
    }
}
