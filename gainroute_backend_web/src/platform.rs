// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`AudioPlatform`] over Web Audio and `HTMLMediaElement`.
//!
//! The audio context is created lazily inside the first play gesture, since
//! browsers keep a context created earlier suspended. `webkitAudioContext` is
//! used when the standard constructor is missing or throws (older Safari).

use alloc::format;
use core::cell::RefCell;
use core::fmt;
use core::future::Future;

use gainroute_core::error::RoutingError;
use gainroute_core::platform::{AudioPlatform, ContextState, EndpointRole, GainStage, MediaState};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AudioContext, AudioContextState, GainNode, HtmlAudioElement, HtmlMediaElement,
    MediaElementAudioSourceNode,
};

use crate::{detect, js_detail, now_ms};

/// A media element routed through a `GainNode` to the context destination.
pub struct WebGraph {
    // Held so the source node lives exactly as long as the binding.
    _source: MediaElementAudioSourceNode,
    gain: GainNode,
}

impl fmt::Debug for WebGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebGraph")
            .field("gain", &self.gain.gain().value())
            .finish_non_exhaustive()
    }
}

impl GainStage for WebGraph {
    fn gain(&self) -> f64 {
        f64::from(self.gain.gain().value())
    }

    fn set_gain(&self, value: f64) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "AudioParam values are f32; levels lie in [0, 1]"
        )]
        let value = value as f32;
        self.gain.gain().set_value(value);
    }
}

/// Browser implementation of [`AudioPlatform`].
///
/// Wraps the page's primary media element. The fallback `<audio>` element and
/// the audio context are created on demand and kept for the page lifetime.
pub struct WebAudioPlatform {
    primary: HtmlMediaElement,
    context: RefCell<Option<AudioContext>>,
    fallback: RefCell<Option<HtmlAudioElement>>,
    native_volume_inert: bool,
}

impl fmt::Debug for WebAudioPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebAudioPlatform")
            .field("primary", &"HtmlMediaElement")
            .field("context", &self.context_state())
            .field("fallback_created", &self.fallback.borrow().is_some())
            .field("native_volume_inert", &self.native_volume_inert)
            .finish()
    }
}

impl WebAudioPlatform {
    /// Wraps `primary`, marking it for anonymous CORS so a graph may read its
    /// samples.
    #[must_use]
    pub fn new(primary: HtmlMediaElement) -> Self {
        primary.set_cross_origin(Some("anonymous"));
        Self {
            primary,
            context: RefCell::new(None),
            fallback: RefCell::new(None),
            native_volume_inert: detect::is_ios(),
        }
    }

    /// Returns the primary media element.
    #[must_use]
    pub fn primary(&self) -> &HtmlMediaElement {
        &self.primary
    }

    /// Returns the hidden fallback `<audio>` element once it has been created.
    #[must_use]
    pub fn fallback(&self) -> Option<HtmlMediaElement> {
        self.element(EndpointRole::Fallback)
    }

    fn element(&self, role: EndpointRole) -> Option<HtmlMediaElement> {
        match role {
            EndpointRole::Primary => Some(self.primary.clone()),
            EndpointRole::Fallback => self
                .fallback
                .borrow()
                .as_ref()
                .map(|audio| HtmlMediaElement::from(audio.clone())),
        }
    }

    fn ensure_context(&self) -> Result<AudioContext, RoutingError> {
        let existing = self.context.borrow().clone();
        if let Some(ctx) = existing {
            return Ok(ctx);
        }
        let ctx = create_context()?;
        *self.context.borrow_mut() = Some(ctx.clone());
        Ok(ctx)
    }
}

impl AudioPlatform for WebAudioPlatform {
    type Graph = WebGraph;

    fn load_primary(&self, source: &str) {
        if self.primary.src().is_empty() {
            self.primary.set_src(source);
        }
    }

    fn resume_context(&self) -> impl Future<Output = Result<ContextState, RoutingError>> {
        // Construct synchronously so creation still counts as part of the
        // user gesture.
        let ctx = self.ensure_context();
        async move {
            let ctx = ctx?;
            if ctx.state() == AudioContextState::Suspended {
                let unavailable = |e: JsValue| RoutingError::ContextUnavailable(js_detail(&e));
                let promise = ctx.resume().map_err(unavailable)?;
                JsFuture::from(promise).await.map_err(unavailable)?;
            }
            Ok(map_state(&ctx))
        }
    }

    fn context_state(&self) -> ContextState {
        self.context
            .borrow()
            .as_ref()
            .map_or(ContextState::Unavailable, map_state)
    }

    fn bind_graph(&self, role: EndpointRole) -> Result<WebGraph, RoutingError> {
        let fail = |e: JsValue| RoutingError::binding_failed(role, js_detail(&e));
        let element = self
            .element(role)
            .ok_or_else(|| RoutingError::binding_failed(role, "element does not exist"))?;
        let ctx = self
            .context
            .borrow()
            .clone()
            .ok_or_else(|| RoutingError::binding_failed(role, "no audio context"))?;

        let (source, gain) = wire(&ElementWiring {
            ctx: &ctx,
            element: &element,
        })
        .map_err(fail)?;
        Ok(WebGraph {
            _source: source,
            gain,
        })
    }

    fn create_fallback(&self, source: &str) -> Result<(), RoutingError> {
        if self.fallback.borrow().is_some() {
            return Ok(());
        }
        let fail = |e: JsValue| RoutingError::FallbackBindingFailed(js_detail(&e));
        let audio = HtmlAudioElement::new().map_err(fail)?;
        audio.set_cross_origin(Some("anonymous"));
        audio.set_preload("auto");
        audio.set_loop(self.primary.loop_());
        audio.set_hidden(true);
        audio.set_src(source);
        if let Some(body) = self.primary.owner_document().and_then(|doc| doc.body()) {
            body.append_child(&audio).map_err(fail)?;
        }
        *self.fallback.borrow_mut() = Some(audio);
        Ok(())
    }

    fn play(&self, role: EndpointRole) -> impl Future<Output = Result<(), RoutingError>> {
        let rejected = |e: JsValue| RoutingError::PlaybackRejected(js_detail(&e));
        let request = match self.element(role) {
            Some(element) => element.play().map_err(rejected),
            None => Err(RoutingError::PlaybackRejected(format!(
                "{} element does not exist",
                role.as_str()
            ))),
        };
        async move {
            let promise = request?;
            JsFuture::from(promise).await.map_err(rejected)?;
            Ok(())
        }
    }

    fn set_muted(&self, role: EndpointRole, muted: bool) {
        if let Some(element) = self.element(role) {
            element.set_muted(muted);
        }
    }

    fn set_volume(&self, role: EndpointRole, volume: f64) {
        if let Some(element) = self.element(role) {
            element.set_volume(volume);
        }
    }

    fn media_state(&self, role: EndpointRole) -> Option<MediaState> {
        let element = self.element(role)?;
        Some(MediaState {
            paused: element.paused(),
            muted: element.muted(),
            volume: element.volume(),
            current_time: element.current_time(),
        })
    }

    fn native_volume_inert(&self) -> bool {
        self.native_volume_inert
    }

    fn now_ms(&self) -> f64 {
        now_ms()
    }
}

/// The node operations behind [`AudioPlatform::bind_graph`].
trait GraphWiring {
    type Gain;
    type Source;
    type Error;

    fn create_gain(&self) -> Result<Self::Gain, Self::Error>;
    fn connect_gain(&self, gain: &Self::Gain) -> Result<(), Self::Error>;
    /// Takes over the element's output. Cannot be repeated for one element.
    fn capture(&self) -> Result<Self::Source, Self::Error>;
    fn connect_source(&self, source: &Self::Source, gain: &Self::Gain) -> Result<(), Self::Error>;
    fn release_gain(&self, gain: &Self::Gain);
    fn release_source(&self, source: &Self::Source);
}

/// Builds `source -> gain -> destination`.
///
/// Capture comes last and is undone if its connection fails, so an `Err`
/// leaves the element playing through its own output.
fn wire<W: GraphWiring>(w: &W) -> Result<(W::Source, W::Gain), W::Error> {
    let gain = w.create_gain()?;
    if let Err(e) = w.connect_gain(&gain) {
        w.release_gain(&gain);
        return Err(e);
    }
    let source = match w.capture() {
        Ok(source) => source,
        Err(e) => {
            w.release_gain(&gain);
            return Err(e);
        }
    };
    if let Err(e) = w.connect_source(&source, &gain) {
        w.release_source(&source);
        w.release_gain(&gain);
        return Err(e);
    }
    Ok((source, gain))
}

struct ElementWiring<'a> {
    ctx: &'a AudioContext,
    element: &'a HtmlMediaElement,
}

impl GraphWiring for ElementWiring<'_> {
    type Gain = GainNode;
    type Source = MediaElementAudioSourceNode;
    type Error = JsValue;

    fn create_gain(&self) -> Result<GainNode, JsValue> {
        self.ctx.create_gain()
    }

    fn connect_gain(&self, gain: &GainNode) -> Result<(), JsValue> {
        gain.connect_with_audio_node(&self.ctx.destination())
            .map(drop)
    }

    fn capture(&self) -> Result<MediaElementAudioSourceNode, JsValue> {
        self.ctx.create_media_element_source(self.element)
    }

    fn connect_source(
        &self,
        source: &MediaElementAudioSourceNode,
        gain: &GainNode,
    ) -> Result<(), JsValue> {
        source.connect_with_audio_node(gain).map(drop)
    }

    fn release_gain(&self, gain: &GainNode) {
        let _ = gain.disconnect();
    }

    fn release_source(&self, source: &MediaElementAudioSourceNode) {
        let _ = source.disconnect();
    }
}

fn map_state(ctx: &AudioContext) -> ContextState {
    match ctx.state() {
        AudioContextState::Suspended => ContextState::Suspended,
        AudioContextState::Running => ContextState::Running,
        AudioContextState::Closed => ContextState::Closed,
        _ => ContextState::Unavailable,
    }
}

fn create_context() -> Result<AudioContext, RoutingError> {
    match AudioContext::new() {
        Ok(ctx) => Ok(ctx),
        Err(standard) => {
            webkit_context().ok_or_else(|| RoutingError::ContextUnavailable(js_detail(&standard)))
        }
    }
}

fn webkit_context() -> Option<AudioContext> {
    let window = web_sys::window()?;
    let ctor = js_sys::Reflect::get(&window, &JsValue::from_str("webkitAudioContext")).ok()?;
    let ctor = ctor.dyn_into::<js_sys::Function>().ok()?;
    let ctx = js_sys::Reflect::construct(&ctor, &js_sys::Array::new()).ok()?;
    Some(ctx.unchecked_into())
}
