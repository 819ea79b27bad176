// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The volume routing controller.
//!
//! [`VolumeController`] owns every piece of session state: the negotiation
//! phase, the gain stages bound so far, and the last applied level. It is
//! constructed on page load and lives as long as the page.
//!
//! # Negotiation
//!
//! [`negotiate`](VolumeController::negotiate) runs once, in response to the
//! first user gesture. After resuming the audio-processing context it walks
//! an ordered plan of [`NegotiationStep`]s and settles on the first one that
//! succeeds:
//!
//! ```text
//!   resume context ──fail──────────────────────────────┐
//!        │ ok                                          │
//!        ▼                                             ▼
//!   PrimaryGraph ──fail──► FallbackGraph ──fail──► NativeVolume
//!        │ ok                  │ ok                    │
//!        ▼                     ▼                       ▼
//!    GraphGain         FallbackGraphGain          NativeVolume
//! ```
//!
//! `NativeVolume` cannot fail, so every negotiation ends with exactly one
//! strategy. Playback is requested only after the graph for that endpoint has
//! been bound (or has failed for good).
//!
//! # Sharing
//!
//! All operations take `&self`; mutable state lives in cells so a single
//! `Rc<VolumeController<_>>` can be captured by every event callback. No cell
//! borrow is held across an `.await`, so level changes arriving while
//! playback is starting are applied immediately.

use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::config::RoutingConfig;
use crate::diagnostics::{
    DiagnosticSnapshot, DiagnosticsSink, MediaEvent, MuteState, NoopSink,
};
use crate::error::RoutingError;
use crate::level::Level;
use crate::platform::{AudioPlatform, EndpointRole, GainStage};
use crate::strategy::Strategy;

/// Where the controller is in its one-shot negotiation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NegotiationPhase {
    /// No user gesture yet; level operations are ignored.
    Idle,
    /// Negotiation started and has not selected a strategy yet.
    InFlight,
    /// A strategy was selected. Final for the page session.
    Settled(Strategy),
}

/// One fallible step of the negotiation plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NegotiationStep {
    /// Bind the primary element to a gain stage.
    PrimaryGraph,
    /// Create the fallback element and bind it to a gain stage.
    FallbackGraph,
    /// Use the primary element's native volume.
    NativeVolume,
}

const FULL_PLAN: &[NegotiationStep] = &[
    NegotiationStep::PrimaryGraph,
    NegotiationStep::FallbackGraph,
    NegotiationStep::NativeVolume,
];
const FALLBACK_PLAN: &[NegotiationStep] =
    &[NegotiationStep::FallbackGraph, NegotiationStep::NativeVolume];
const NATIVE_PLAN: &[NegotiationStep] = &[NegotiationStep::NativeVolume];

impl NegotiationStep {
    /// Returns the steps to try, in order.
    ///
    /// Without a running context only [`NativeVolume`](Self::NativeVolume)
    /// remains; `force_fallback` drops [`PrimaryGraph`](Self::PrimaryGraph).
    #[must_use]
    pub fn plan(force_fallback: bool, context_ready: bool) -> &'static [Self] {
        if !context_ready {
            NATIVE_PLAN
        } else if force_fallback {
            FALLBACK_PLAN
        } else {
            FULL_PLAN
        }
    }
}

/// Outcome of a call to [`VolumeController::negotiate`].
#[derive(Clone, Debug, PartialEq)]
pub struct NegotiationReport {
    /// The selected strategy.
    pub strategy: Strategy,
    /// Failures that moved negotiation to a less preferred strategy, in the
    /// order they happened.
    pub degradations: Vec<RoutingError>,
    /// Result of the playback request. For a reused report nothing was
    /// requested and this is `Ok`.
    pub playback: Result<(), RoutingError>,
    /// `true` if negotiation had already settled and this call changed
    /// nothing.
    pub reused: bool,
}

impl NegotiationReport {
    /// Returns `true` if no strategy is left that could produce sound: native
    /// volume was selected and its playback was refused.
    #[must_use]
    pub fn is_terminal_failure(&self) -> bool {
        self.strategy == Strategy::NativeVolume && self.playback.is_err()
    }
}

/// Decides how level changes reach the audio output of one media element.
pub struct VolumeController<P: AudioPlatform> {
    platform: P,
    config: RoutingConfig,
    phase: Cell<NegotiationPhase>,
    primary_graph: RefCell<Option<P::Graph>>,
    fallback_graph: RefCell<Option<P::Graph>>,
    fallback_created: Cell<bool>,
    level: Cell<Level>,
    sink: RefCell<Box<dyn DiagnosticsSink>>,
}

impl<P: AudioPlatform> fmt::Debug for VolumeController<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VolumeController")
            .field("config", &self.config)
            .field("phase", &self.phase.get())
            .field("level", &self.level.get())
            .field("fallback_created", &self.fallback_created.get())
            .finish_non_exhaustive()
    }
}

impl<P: AudioPlatform> VolumeController<P> {
    /// Creates an idle controller that discards diagnostics.
    #[must_use]
    pub fn new(platform: P, config: RoutingConfig) -> Self {
        Self::with_sink(platform, config, NoopSink)
    }

    /// Creates an idle controller reporting to `sink`.
    #[must_use]
    pub fn with_sink(
        platform: P,
        config: RoutingConfig,
        sink: impl DiagnosticsSink + 'static,
    ) -> Self {
        Self {
            platform,
            config,
            phase: Cell::new(NegotiationPhase::Idle),
            primary_graph: RefCell::new(None),
            fallback_graph: RefCell::new(None),
            fallback_created: Cell::new(false),
            level: Cell::new(Level::default()),
            sink: RefCell::new(Box::new(sink)),
        }
    }

    /// Returns the platform this controller drives.
    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Returns the negotiation phase.
    #[must_use]
    pub fn phase(&self) -> NegotiationPhase {
        self.phase.get()
    }

    /// Returns the active strategy, or `None` until negotiation settles.
    #[must_use]
    pub fn strategy(&self) -> Option<Strategy> {
        match self.phase.get() {
            NegotiationPhase::Settled(strategy) => Some(strategy),
            NegotiationPhase::Idle | NegotiationPhase::InFlight => None,
        }
    }

    /// Returns the last level applied through the controller.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level.get()
    }

    /// Returns the gain of the active gain stage, if the active strategy has
    /// one.
    #[must_use]
    pub fn gain(&self) -> Option<f64> {
        let role = self.strategy()?.graph_endpoint()?;
        self.graph_slot(role).borrow().as_ref().map(GainStage::gain)
    }

    /// Returns `true` if a gain stage is attached to `role`.
    #[must_use]
    pub fn has_graph(&self, role: EndpointRole) -> bool {
        self.graph_slot(role).borrow().is_some()
    }

    /// Selects a strategy and requests playback.
    ///
    /// Must be called from a user gesture handler: platforms keep the audio
    /// context suspended until then. Only the first call does any work. Later
    /// calls return the settled strategy with `reused` set, or `None` if the
    /// first call is still in flight.
    pub async fn negotiate(&self) -> Option<NegotiationReport> {
        match self.phase.get() {
            NegotiationPhase::InFlight => return None,
            NegotiationPhase::Settled(strategy) => {
                return Some(NegotiationReport {
                    strategy,
                    degradations: Vec::new(),
                    playback: Ok(()),
                    reused: true,
                });
            }
            NegotiationPhase::Idle => {}
        }
        self.phase.set(NegotiationPhase::InFlight);
        self.status("Negotiating audio routing...");
        self.platform.load_primary(&self.config.source);

        let mut degradations = Vec::new();
        let context_ready = match self.platform.resume_context().await {
            Ok(_) => true,
            Err(err) => {
                self.degrade(err, &mut degradations);
                false
            }
        };
        if context_ready && self.config.force_fallback {
            self.status("Primary graph skipped (forceAudioFallback)");
        }

        let mut selected = Strategy::NativeVolume;
        for &step in NegotiationStep::plan(self.config.force_fallback, context_ready) {
            match self.attempt(step) {
                Ok(strategy) => {
                    selected = strategy;
                    break;
                }
                Err(err) => self.degrade(err, &mut degradations),
            }
        }

        self.phase.set(NegotiationPhase::Settled(selected));
        self.emit(|sink, snap| sink.on_strategy_selected(selected, snap));
        self.status(match selected {
            Strategy::GraphGain => "Gain stage routing established",
            Strategy::FallbackGraphGain => "Fallback element routing established (primary muted)",
            Strategy::NativeVolume => "Using native volume control (limited on iOS)",
        });

        let playback = self.start_playback(selected).await;
        self.report_playback_status(selected, &playback);

        Some(NegotiationReport {
            strategy: selected,
            degradations,
            playback,
            reused: false,
        })
    }

    /// Requests playback again after the first attempt was refused.
    ///
    /// Like [`negotiate`](Self::negotiate) this has to run inside a user
    /// gesture. Returns `None` until a strategy is active.
    pub async fn resume_playback(&self) -> Option<Result<(), RoutingError>> {
        let strategy = self.strategy()?;
        let playback = self.start_playback(strategy).await;
        self.report_playback_status(strategy, &playback);
        Some(playback)
    }

    /// Applies `level` through the active strategy.
    ///
    /// Ignored (returns `None`) until negotiation settles. Applying the same
    /// level twice leaves the output unchanged.
    pub fn set_level(&self, level: Level) -> Option<Strategy> {
        let strategy = self.strategy()?;
        self.level.set(level);
        match strategy.graph_endpoint() {
            Some(role) => {
                if let Some(graph) = self.graph_slot(role).borrow().as_ref() {
                    graph.set_gain(level.get());
                }
            }
            None => self
                .platform
                .set_volume(EndpointRole::Primary, level.get()),
        }
        self.emit(|sink, snap| sink.on_level_changed(level, snap));
        Some(strategy)
    }

    /// Applies [`Level::PRESET`] and returns it so the UI can move its slider.
    pub fn apply_preset(&self) -> Option<Level> {
        let strategy = self.set_level(Level::PRESET)?;
        let target = if strategy.uses_graph() { "Gain" } else { "Volume" };
        self.status(&format!("{target} set to {}", Level::PRESET));
        Some(Level::PRESET)
    }

    /// Toggles between silent and audible output.
    ///
    /// Under [`Strategy::NativeVolume`] this flips the primary element's mute
    /// flag. Under a graph strategy gain is the only control surface: a
    /// positive gain drops to zero and a zero gain returns to exactly
    /// [`Level::FULL`]. The level in effect before muting is not remembered.
    pub fn toggle_mute(&self) -> Option<MuteState> {
        let strategy = self.strategy()?;
        let state = match strategy.graph_endpoint() {
            Some(role) => {
                let next = {
                    let slot = self.graph_slot(role).borrow();
                    let graph = slot.as_ref()?;
                    let next = if graph.gain() > 0.0 {
                        Level::SILENT
                    } else {
                        Level::FULL
                    };
                    graph.set_gain(next.get());
                    next
                };
                self.level.set(next);
                if next.is_silent() {
                    MuteState::Muted
                } else {
                    MuteState::Unmuted
                }
            }
            None => {
                let muted = !self
                    .platform
                    .media_state(EndpointRole::Primary)
                    .is_some_and(|m| m.muted);
                self.platform.set_muted(EndpointRole::Primary, muted);
                if muted {
                    MuteState::Muted
                } else {
                    MuteState::Unmuted
                }
            }
        };
        self.status(match (state, strategy.uses_graph()) {
            (MuteState::Muted, true) => "Muted via gain",
            (MuteState::Unmuted, true) => "Unmuted via gain",
            (MuteState::Muted, false) => "Muted",
            (MuteState::Unmuted, false) => "Unmuted",
        });
        self.emit(|sink, snap| sink.on_mute_toggled(state, snap));
        Some(state)
    }

    /// Forwards a media element lifecycle event to diagnostics.
    pub fn observe(&self, event: MediaEvent) {
        self.emit(|sink, snap| sink.on_media_event(event, snap));
    }

    /// Emits a periodic snapshot.
    pub fn report_periodic(&self) {
        self.emit(|sink, snap| sink.on_periodic(snap));
    }

    /// Captures the current state for diagnostics.
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            timestamp_ms: self.platform.now_ms(),
            strategy: self.strategy(),
            level: self.level.get(),
            gain: self.gain(),
            primary: self
                .platform
                .media_state(EndpointRole::Primary)
                .unwrap_or_default(),
            fallback: self.platform.media_state(EndpointRole::Fallback),
            context: self.platform.context_state(),
        }
    }

    fn attempt(&self, step: NegotiationStep) -> Result<Strategy, RoutingError> {
        match step {
            NegotiationStep::PrimaryGraph => {
                self.attach(EndpointRole::Primary)?;
                // Gain is the only control surface from here on.
                self.platform.set_muted(EndpointRole::Primary, false);
                self.platform.set_volume(EndpointRole::Primary, 1.0);
                Ok(Strategy::GraphGain)
            }
            NegotiationStep::FallbackGraph => {
                if !self.fallback_created.get() {
                    self.platform.create_fallback(&self.config.source)?;
                    self.fallback_created.set(true);
                }
                self.attach(EndpointRole::Fallback)?;
                self.platform.set_muted(EndpointRole::Primary, true);
                Ok(Strategy::FallbackGraphGain)
            }
            NegotiationStep::NativeVolume => {
                self.platform.set_muted(EndpointRole::Primary, false);
                self.platform
                    .set_volume(EndpointRole::Primary, self.level.get().get());
                Ok(Strategy::NativeVolume)
            }
        }
    }

    /// Binds `role` unless a gain stage is already attached to it.
    fn attach(&self, role: EndpointRole) -> Result<(), RoutingError> {
        let slot = self.graph_slot(role);
        if slot.borrow().is_some() {
            return Ok(());
        }
        let graph = self.platform.bind_graph(role)?;
        graph.set_gain(self.level.get().get());
        *slot.borrow_mut() = Some(graph);
        Ok(())
    }

    async fn start_playback(&self, strategy: Strategy) -> Result<(), RoutingError> {
        if strategy == Strategy::FallbackGraphGain {
            // Both requests go out before either is awaited.
            let fallback = self.platform.play(EndpointRole::Fallback);
            let primary = self.platform.play(EndpointRole::Primary);
            let fallback = fallback.await;
            let primary = primary.await;
            self.report_rejection(EndpointRole::Fallback, &fallback);
            self.report_rejection(EndpointRole::Primary, &primary);
            fallback.and(primary)
        } else {
            let primary = self.platform.play(EndpointRole::Primary).await;
            self.report_rejection(EndpointRole::Primary, &primary);
            primary
        }
    }

    fn report_rejection(&self, role: EndpointRole, result: &Result<(), RoutingError>) {
        if let Err(err) = result {
            self.emit(|sink, snap| sink.on_playback_rejected(role, err, snap));
        }
    }

    fn report_playback_status(&self, strategy: Strategy, playback: &Result<(), RoutingError>) {
        match (playback, strategy) {
            (Err(err), _) => self.status(&format!("Play failed: {}", err.detail())),
            (Ok(()), Strategy::GraphGain) => self.status("Playing via gain stage (volume slider works)"),
            (Ok(()), Strategy::FallbackGraphGain) => {
                self.status("Playing via fallback element gain (volume slider works)");
            }
            (Ok(()), Strategy::NativeVolume) if self.platform.native_volume_inert() => {
                self.status("Playing (iOS: volume slider won't work - use device buttons)");
            }
            (Ok(()), Strategy::NativeVolume) => self.status("Playing with native volume control"),
        }
    }

    fn degrade(&self, err: RoutingError, degradations: &mut Vec<RoutingError>) {
        debug_assert!(err.degrades(), "{} never degrades negotiation", err.kind());
        self.emit(|sink, snap| sink.on_degraded(&err, snap));
        self.status(&format!("Routing step failed: {err}"));
        degradations.push(err);
    }

    fn status(&self, message: &str) {
        self.emit(|sink, snap| sink.on_status(message, snap));
    }

    fn graph_slot(&self, role: EndpointRole) -> &RefCell<Option<P::Graph>> {
        match role {
            EndpointRole::Primary => &self.primary_graph,
            EndpointRole::Fallback => &self.fallback_graph,
        }
    }

    fn emit(&self, f: impl FnOnce(&mut dyn DiagnosticsSink, &DiagnosticSnapshot)) {
        let snapshot = self.snapshot();
        let mut sink = self.sink.borrow_mut();
        f(&mut **sink, &snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ContextState, MediaState};
    use alloc::rc::Rc;
    use alloc::string::{String, ToString as _};
    use alloc::vec;
    use core::future::{Future, ready};

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum Call {
        Load,
        Resume,
        Bind(EndpointRole),
        CreateFallback,
        Play(EndpointRole),
        Muted(EndpointRole, bool),
        Volume(EndpointRole, f64),
    }

    struct FakeGraph {
        gain: Cell<f64>,
    }

    impl GainStage for FakeGraph {
        fn gain(&self) -> f64 {
            self.gain.get()
        }

        fn set_gain(&self, value: f64) {
            self.gain.set(value);
        }
    }

    #[derive(Default)]
    struct FakePlatform {
        context_fails: bool,
        primary_bind_fails: bool,
        fallback_bind_fails: bool,
        play_fails: bool,
        ios: bool,
        calls: RefCell<Vec<Call>>,
        context: Cell<ContextState>,
        primary: Cell<MediaState>,
        fallback: Cell<Option<MediaState>>,
    }

    impl FakePlatform {
        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn position(&self, call: Call) -> Option<usize> {
            self.calls.borrow().iter().position(|c| *c == call)
        }

        fn count(&self, call: Call) -> usize {
            self.calls.borrow().iter().filter(|c| **c == call).count()
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

    impl AudioPlatform for FakePlatform {
        type Graph = FakeGraph;

        fn load_primary(&self, _source: &str) {
            self.calls.borrow_mut().push(Call::Load);
        }

        fn resume_context(&self) -> impl Future<Output = Result<ContextState, RoutingError>> {
            self.calls.borrow_mut().push(Call::Resume);
            let result = if self.context_fails {
                Err(RoutingError::ContextUnavailable("no AudioContext".into()))
            } else {
                self.context.set(ContextState::Running);
                Ok(ContextState::Running)
            };
            ready(result)
        }

        fn context_state(&self) -> ContextState {
            self.context.get()
        }

        fn bind_graph(&self, role: EndpointRole) -> Result<FakeGraph, RoutingError> {
            self.calls.borrow_mut().push(Call::Bind(role));
            let fails = match role {
                EndpointRole::Primary => self.primary_bind_fails,
                EndpointRole::Fallback => self.fallback_bind_fails,
            };
            if fails {
                Err(RoutingError::binding_failed(role, "refused"))
            } else {
                Ok(FakeGraph {
                    gain: Cell::new(1.0),
                })
            }
        }

        fn create_fallback(&self, _source: &str) -> Result<(), RoutingError> {
            self.calls.borrow_mut().push(Call::CreateFallback);
            self.fallback.set(Some(MediaState::default()));
            Ok(())
        }

        fn play(&self, role: EndpointRole) -> impl Future<Output = Result<(), RoutingError>> {
            self.calls.borrow_mut().push(Call::Play(role));
            let result = if self.play_fails {
                Err(RoutingError::PlaybackRejected("NotAllowedError".into()))
            } else {
                self.update(role, |s| s.paused = false);
                Ok(())
            };
            ready(result)
        }

        fn set_muted(&self, role: EndpointRole, muted: bool) {
            self.calls.borrow_mut().push(Call::Muted(role, muted));
            self.update(role, |s| s.muted = muted);
        }

        fn set_volume(&self, role: EndpointRole, volume: f64) {
            self.calls.borrow_mut().push(Call::Volume(role, volume));
            self.update(role, |s| s.volume = volume);
        }

        fn media_state(&self, role: EndpointRole) -> Option<MediaState> {
            match role {
                EndpointRole::Primary => Some(self.primary.get()),
                EndpointRole::Fallback => self.fallback.get(),
            }
        }

        fn native_volume_inert(&self) -> bool {
            self.ios
        }

        fn now_ms(&self) -> f64 {
            0.0
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Recorded {
        Status(String),
        Degraded(RoutingError),
        Selected(Strategy),
        Rejected(EndpointRole),
        Level(Level, DiagnosticSnapshot),
        Mute(MuteState),
        Media(MediaEvent),
        Periodic,
    }

    #[derive(Clone, Default)]
    struct Recording(Rc<RefCell<Vec<Recorded>>>);

    impl Recording {
        fn events(&self) -> Vec<Recorded> {
            self.0.borrow().clone()
        }

        fn statuses(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Recorded::Status(s) => Some(s),
                    _ => None,
                })
                .collect()
        }
    }

    impl DiagnosticsSink for Recording {
        fn on_status(&mut self, message: &str, _snapshot: &DiagnosticSnapshot) {
            self.0
                .borrow_mut()
                .push(Recorded::Status(message.to_string()));
        }

        fn on_degraded(&mut self, error: &RoutingError, _snapshot: &DiagnosticSnapshot) {
            self.0.borrow_mut().push(Recorded::Degraded(error.clone()));
        }

        fn on_strategy_selected(&mut self, strategy: Strategy, _snapshot: &DiagnosticSnapshot) {
            self.0.borrow_mut().push(Recorded::Selected(strategy));
        }

        fn on_playback_rejected(
            &mut self,
            role: EndpointRole,
            _error: &RoutingError,
            _snapshot: &DiagnosticSnapshot,
        ) {
            self.0.borrow_mut().push(Recorded::Rejected(role));
        }

        fn on_level_changed(&mut self, level: Level, snapshot: &DiagnosticSnapshot) {
            self.0.borrow_mut().push(Recorded::Level(level, *snapshot));
        }

        fn on_mute_toggled(&mut self, state: MuteState, _snapshot: &DiagnosticSnapshot) {
            self.0.borrow_mut().push(Recorded::Mute(state));
        }

        fn on_media_event(&mut self, event: MediaEvent, _snapshot: &DiagnosticSnapshot) {
            self.0.borrow_mut().push(Recorded::Media(event));
        }

        fn on_periodic(&mut self, _snapshot: &DiagnosticSnapshot) {
            self.0.borrow_mut().push(Recorded::Periodic);
        }
    }

    fn controller(
        platform: FakePlatform,
        config: RoutingConfig,
    ) -> (VolumeController<FakePlatform>, Recording) {
        let recording = Recording::default();
        let controller = VolumeController::with_sink(platform, config, recording.clone());
        (controller, recording)
    }

    fn negotiate(controller: &VolumeController<FakePlatform>) -> NegotiationReport {
        pollster::block_on(controller.negotiate()).expect("negotiation was not in flight")
    }

    fn forced() -> RoutingConfig {
        RoutingConfig {
            force_fallback: true,
            ..RoutingConfig::default()
        }
    }

    fn level(v: f64) -> Level {
        Level::new(v).expect("finite level")
    }

    #[test]
    fn default_config_selects_graph_gain() {
        let (c, rec) = controller(FakePlatform::default(), RoutingConfig::default());
        let report = negotiate(&c);

        assert_eq!(report.strategy, Strategy::GraphGain);
        assert!(report.degradations.is_empty());
        assert_eq!(report.playback, Ok(()));
        assert!(!report.reused);
        assert_eq!(c.phase(), NegotiationPhase::Settled(Strategy::GraphGain));

        assert_eq!(c.set_level(level(0.2)), Some(Strategy::GraphGain));
        assert_eq!(c.gain(), Some(0.2));

        let reported = rec.events().into_iter().find_map(|e| match e {
            Recorded::Level(l, snap) => Some((l, snap)),
            _ => None,
        });
        let (reported_level, snap) = reported.expect("level event");
        assert_eq!(reported_level, Level::PRESET);
        assert_eq!(snap.level, Level::PRESET);
        assert_eq!(snap.gain, Some(0.2));
        assert_eq!(snap.strategy, Some(Strategy::GraphGain));
    }

    #[test]
    fn graph_strategy_pins_native_volume() {
        let (c, _) = controller(FakePlatform::default(), RoutingConfig::default());
        negotiate(&c);
        let primary = c.platform().primary.get();
        assert!(!primary.muted);
        assert_eq!(primary.volume, 1.0);
        assert!(!primary.paused);
    }

    #[test]
    fn graph_binding_precedes_playback() {
        let (c, _) = controller(FakePlatform::default(), RoutingConfig::default());
        negotiate(&c);
        let p = c.platform();

        let load = p.position(Call::Load).expect("source loaded");
        let resume = p.position(Call::Resume).expect("context resumed");
        let bind = p.position(Call::Bind(EndpointRole::Primary)).expect("bound");
        let play = p.position(Call::Play(EndpointRole::Primary)).expect("played");
        assert!(load < resume, "calls: {:?}", p.calls());
        assert!(resume < bind, "calls: {:?}", p.calls());
        assert!(bind < play, "calls: {:?}", p.calls());
    }

    #[test]
    fn force_fallback_starts_at_fallback_element() {
        let (c, _) = controller(FakePlatform::default(), forced());
        let report = negotiate(&c);
        let p = c.platform();

        assert_eq!(report.strategy, Strategy::FallbackGraphGain);
        assert_eq!(p.count(Call::Bind(EndpointRole::Primary)), 0);
        assert!(c.platform().primary.get().muted);

        let fallback = p.fallback.get().expect("fallback created");
        assert!(!fallback.paused, "fallback playback should have started");
        assert!(!fallback.muted);

        let create = p.position(Call::CreateFallback).expect("created");
        let bind = p.position(Call::Bind(EndpointRole::Fallback)).expect("bound");
        let muted = p
            .position(Call::Muted(EndpointRole::Primary, true))
            .expect("primary muted");
        let play_fb = p.position(Call::Play(EndpointRole::Fallback)).expect("played");
        let play_primary = p.position(Call::Play(EndpointRole::Primary)).expect("played");
        assert!(create < bind && bind < muted && muted < play_fb);
        assert!(bind < play_primary);
    }

    #[test]
    fn fallback_level_drives_fallback_gain() {
        let (c, _) = controller(FakePlatform::default(), forced());
        negotiate(&c);
        c.set_level(level(0.35));
        assert_eq!(c.gain(), Some(0.35));
        assert!(!c.has_graph(EndpointRole::Primary));
        assert!(c.has_graph(EndpointRole::Fallback));
        assert_eq!(c.platform().primary.get().volume, 1.0);
    }

    #[test]
    fn both_bindings_failing_selects_native_volume() {
        let platform = FakePlatform {
            primary_bind_fails: true,
            fallback_bind_fails: true,
            ..FakePlatform::default()
        };
        let (c, rec) = controller(platform, RoutingConfig::default());
        let report = negotiate(&c);

        assert_eq!(report.strategy, Strategy::NativeVolume);
        assert_eq!(
            report.degradations,
            vec![
                RoutingError::GraphBindingFailed("refused".into()),
                RoutingError::FallbackBindingFailed("refused".into()),
            ]
        );
        assert!(rec.events().contains(&Recorded::Selected(Strategy::NativeVolume)));

        c.set_level(level(0.5));
        assert_eq!(c.platform().primary.get().volume, 0.5);
        assert!(!c.platform().primary.get().muted);
        assert!(!c.has_graph(EndpointRole::Primary));
        assert!(!c.has_graph(EndpointRole::Fallback));
        assert_eq!(c.gain(), None);
    }

    #[test]
    fn primary_failure_recovers_through_fallback() {
        let platform = FakePlatform {
            primary_bind_fails: true,
            ..FakePlatform::default()
        };
        let (c, _) = controller(platform, RoutingConfig::default());
        let report = negotiate(&c);
        assert_eq!(report.strategy, Strategy::FallbackGraphGain);
        assert_eq!(
            report.degradations,
            vec![RoutingError::GraphBindingFailed("refused".into())]
        );
    }

    #[test]
    fn context_failure_forces_native_volume() {
        let platform = FakePlatform {
            context_fails: true,
            ..FakePlatform::default()
        };
        let (c, _) = controller(platform, RoutingConfig::default());
        let report = negotiate(&c);

        assert_eq!(report.strategy, Strategy::NativeVolume);
        assert_eq!(
            report.degradations,
            vec![RoutingError::ContextUnavailable("no AudioContext".into())]
        );
        assert!(
            !c.platform()
                .calls()
                .iter()
                .any(|call| matches!(call, Call::Bind(_) | Call::CreateFallback)),
            "no graph binding without a context",
        );
    }

    #[test]
    fn every_outcome_has_exactly_one_strategy() {
        for bits in 0_u8..16 {
            let context_fails = bits & 1 != 0;
            let primary_bind_fails = bits & 2 != 0;
            let fallback_bind_fails = bits & 4 != 0;
            let force_fallback = bits & 8 != 0;

            let platform = FakePlatform {
                context_fails,
                primary_bind_fails,
                fallback_bind_fails,
                ..FakePlatform::default()
            };
            let config = RoutingConfig {
                force_fallback,
                ..RoutingConfig::default()
            };
            let (c, rec) = controller(platform, config);
            let report = negotiate(&c);

            let expected = if context_fails {
                Strategy::NativeVolume
            } else if !force_fallback && !primary_bind_fails {
                Strategy::GraphGain
            } else if !fallback_bind_fails {
                Strategy::FallbackGraphGain
            } else {
                Strategy::NativeVolume
            };
            assert_eq!(report.strategy, expected, "case {bits:04b}");
            assert_eq!(c.phase(), NegotiationPhase::Settled(expected));

            let selections = rec
                .events()
                .iter()
                .filter(|e| matches!(e, Recorded::Selected(_)))
                .count();
            assert_eq!(selections, 1, "case {bits:04b}");

            let graphs = usize::from(c.has_graph(EndpointRole::Primary))
                + usize::from(c.has_graph(EndpointRole::Fallback));
            assert_eq!(graphs, usize::from(expected.uses_graph()), "case {bits:04b}");
            if force_fallback {
                assert_ne!(report.strategy, Strategy::GraphGain, "case {bits:04b}");
            }
        }
    }

    #[test]
    fn second_negotiation_reuses_strategy() {
        let (c, _) = controller(FakePlatform::default(), RoutingConfig::default());
        let first = negotiate(&c);
        c.set_level(level(0.6));

        let second = negotiate(&c);
        assert!(second.reused);
        assert_eq!(second.strategy, first.strategy);
        assert_eq!(c.platform().count(Call::Bind(EndpointRole::Primary)), 1);
        assert_eq!(c.platform().count(Call::Resume), 1);
        assert_eq!(c.gain(), Some(0.6));
    }

    #[test]
    fn negotiation_in_flight_is_not_restarted() {
        let (c, _) = controller(FakePlatform::default(), RoutingConfig::default());
        c.phase.set(NegotiationPhase::InFlight);
        assert_eq!(pollster::block_on(c.negotiate()), None);
        assert!(c.platform().calls().is_empty());
    }

    #[test]
    fn set_level_before_negotiation_is_ignored() {
        let (c, rec) = controller(FakePlatform::default(), RoutingConfig::default());
        assert_eq!(c.set_level(level(0.3)), None);
        assert_eq!(c.toggle_mute(), None);
        assert_eq!(c.apply_preset(), None);
        assert_eq!(c.level(), Level::FULL);
        assert!(c.platform().calls().is_empty());
        assert!(rec.events().is_empty());
    }

    #[test]
    fn set_level_is_idempotent() {
        let (c, _) = controller(FakePlatform::default(), RoutingConfig::default());
        negotiate(&c);
        c.set_level(level(0.7));
        let after_first = c.gain();
        c.set_level(level(0.7));
        assert_eq!(c.gain(), after_first);
        assert_eq!(c.gain(), Some(0.7));

        let platform = FakePlatform {
            context_fails: true,
            ..FakePlatform::default()
        };
        let (native, _) = controller(platform, RoutingConfig::default());
        negotiate(&native);
        native.set_level(level(0.7));
        let after_first = native.platform().primary.get();
        native.set_level(level(0.7));
        assert_eq!(native.platform().primary.get(), after_first);
    }

    #[test]
    fn graph_unmute_restores_full_gain_not_previous_level() {
        let (c, rec) = controller(FakePlatform::default(), RoutingConfig::default());
        negotiate(&c);
        c.set_level(level(0.4));

        assert_eq!(c.toggle_mute(), Some(MuteState::Muted));
        assert_eq!(c.gain(), Some(0.0));
        assert_eq!(c.toggle_mute(), Some(MuteState::Unmuted));
        assert_eq!(c.gain(), Some(1.0), "unmute restores full gain, not 0.4");
        assert_eq!(c.level(), Level::FULL);

        let statuses = rec.statuses();
        assert!(statuses.iter().any(|s| s == "Muted via gain"));
        assert!(statuses.iter().any(|s| s == "Unmuted via gain"));
    }

    #[test]
    fn native_toggle_mute_flips_element_flag() {
        let platform = FakePlatform {
            context_fails: true,
            ..FakePlatform::default()
        };
        let (c, _) = controller(platform, RoutingConfig::default());
        negotiate(&c);
        c.set_level(level(0.3));

        assert_eq!(c.toggle_mute(), Some(MuteState::Muted));
        assert!(c.platform().primary.get().muted);
        assert_eq!(c.toggle_mute(), Some(MuteState::Unmuted));
        assert!(!c.platform().primary.get().muted);
        assert_eq!(c.platform().primary.get().volume, 0.3);
    }

    #[test]
    fn preset_sets_point_two() {
        let (c, rec) = controller(FakePlatform::default(), RoutingConfig::default());
        negotiate(&c);
        assert_eq!(c.apply_preset(), Some(Level::PRESET));
        assert_eq!(c.gain(), Some(0.2));
        assert!(rec.statuses().iter().any(|s| s == "Gain set to 0.20"));
    }

    #[test]
    fn playback_rejection_keeps_strategy() {
        let platform = FakePlatform {
            play_fails: true,
            ..FakePlatform::default()
        };
        let (c, rec) = controller(platform, RoutingConfig::default());
        let report = negotiate(&c);

        assert_eq!(report.strategy, Strategy::GraphGain);
        assert_eq!(
            report.playback,
            Err(RoutingError::PlaybackRejected("NotAllowedError".into()))
        );
        assert!(!report.is_terminal_failure());
        assert!(rec.events().contains(&Recorded::Rejected(EndpointRole::Primary)));
        assert!(rec.statuses().iter().any(|s| s == "Play failed: NotAllowedError"));
    }

    #[test]
    fn native_playback_rejection_is_terminal() {
        let platform = FakePlatform {
            context_fails: true,
            play_fails: true,
            ..FakePlatform::default()
        };
        let (c, _) = controller(platform, RoutingConfig::default());
        let report = negotiate(&c);
        assert!(report.is_terminal_failure());
        assert_eq!(c.strategy(), Some(Strategy::NativeVolume));
    }

    #[test]
    fn resume_playback_retries_active_endpoints() {
        let (c, _) = controller(FakePlatform::default(), forced());
        assert_eq!(pollster::block_on(c.resume_playback()), None);

        negotiate(&c);
        assert_eq!(pollster::block_on(c.resume_playback()), Some(Ok(())));
        assert_eq!(c.platform().count(Call::Play(EndpointRole::Fallback)), 2);
        assert_eq!(c.platform().count(Call::Bind(EndpointRole::Fallback)), 1);
    }

    #[test]
    fn ios_native_status_names_device_buttons() {
        let platform = FakePlatform {
            context_fails: true,
            ios: true,
            ..FakePlatform::default()
        };
        let (c, rec) = controller(platform, RoutingConfig::default());
        negotiate(&c);
        assert!(
            rec.statuses().iter().any(|s| s.contains("use device buttons")),
            "statuses: {:?}",
            rec.statuses()
        );
    }

    #[test]
    fn media_events_and_periodic_snapshots_are_forwarded() {
        let (c, rec) = controller(FakePlatform::default(), RoutingConfig::default());
        c.observe(MediaEvent::Stalled);
        c.report_periodic();
        assert_eq!(
            rec.events(),
            vec![Recorded::Media(MediaEvent::Stalled), Recorded::Periodic]
        );
    }

    #[test]
    fn strategy_is_announced_before_playback_settles() {
        let platform = FakePlatform {
            play_fails: true,
            ..FakePlatform::default()
        };
        let (c, rec) = controller(platform, RoutingConfig::default());
        negotiate(&c);

        let events = rec.events();
        let selected = events
            .iter()
            .position(|e| *e == Recorded::Selected(Strategy::GraphGain))
            .unwrap();
        let rejected = events
            .iter()
            .position(|e| *e == Recorded::Rejected(EndpointRole::Primary))
            .unwrap();
        assert!(selected < rejected, "{events:?}");
    }

    #[test]
    fn plan_order() {
        assert_eq!(
            NegotiationStep::plan(false, true),
            &[
                NegotiationStep::PrimaryGraph,
                NegotiationStep::FallbackGraph,
                NegotiationStep::NativeVolume,
            ]
        );
        assert_eq!(NegotiationStep::plan(true, true)[0], NegotiationStep::FallbackGraph);
        assert_eq!(
            NegotiationStep::plan(true, false),
            &[NegotiationStep::NativeVolume]
        );
    }
}
