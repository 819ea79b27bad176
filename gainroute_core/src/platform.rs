// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backend contract for host runtimes.
//!
//! The controller never touches browser objects directly. A backend crate
//! implements [`AudioPlatform`] over whatever the host provides (the web
//! backend wraps `AudioContext` and `HTMLMediaElement`), and tests implement
//! it with scripted fakes.
//!
//! All methods take `&self`. The controller is single-threaded and is shared
//! between event callbacks through `Rc`, so backends keep their own mutable
//! state in cells the same way browser handles already do.
//!
//! # Ordering
//!
//! [`bind_graph`](AudioPlatform::bind_graph) for an endpoint is always called
//! (and returns) before [`play`](AudioPlatform::play) is requested on that
//! endpoint. Requesting playback first and attaching a graph afterwards leaves
//! some platforms with an audio path that can neither be routed nor muted.

use core::fmt;
use core::future::Future;

use crate::error::RoutingError;

/// Which media element an operation addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointRole {
    /// The element owned by the host page.
    Primary,
    /// The hidden element created when the primary cannot be routed.
    Fallback,
}

impl EndpointRole {
    /// Returns a short label for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

/// State of the shared audio-processing context.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContextState {
    /// No context has been obtained.
    #[default]
    Unavailable,
    /// Created but waiting for a user gesture.
    Suspended,
    /// Processing audio.
    Running,
    /// Released; cannot be resumed.
    Closed,
}

impl ContextState {
    /// Returns the label the platform uses for this state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Suspended => "suspended",
            Self::Running => "running",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable state of one media element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MediaState {
    /// Playback is paused.
    pub paused: bool,
    /// The element's mute flag.
    pub muted: bool,
    /// The element's native volume scalar.
    pub volume: f64,
    /// Playback position in seconds.
    pub current_time: f64,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            paused: true,
            muted: false,
            volume: 1.0,
            current_time: 0.0,
        }
    }
}

/// A gain node that an endpoint's decoded audio flows through.
///
/// Holding a value of this type means the endpoint is attached to the audio
/// graph. There is no detach: the binding lives until page teardown.
pub trait GainStage {
    /// Returns the current gain factor.
    fn gain(&self) -> f64;

    /// Sets the gain factor.
    fn set_gain(&self, value: f64);
}

/// Everything the controller needs from the host runtime.
pub trait AudioPlatform {
    /// The gain stage produced by a successful [`bind_graph`](Self::bind_graph).
    type Graph: GainStage;

    /// Assigns `source` to the primary element if it has none yet.
    ///
    /// Loading is deferred until the first play gesture so that graph binding
    /// happens before the element starts decoding.
    fn load_primary(&self, source: &str);

    /// Creates the audio-processing context if needed and resumes it.
    fn resume_context(&self) -> impl Future<Output = Result<ContextState, RoutingError>>;

    /// Returns the context state without changing it.
    fn context_state(&self) -> ContextState;

    /// Routes `role`'s decoded audio through a new gain stage to the output.
    ///
    /// Platforms refuse a second binding for the same element, so the
    /// controller calls this at most once per role.
    fn bind_graph(&self, role: EndpointRole) -> Result<Self::Graph, RoutingError>;

    /// Creates the hidden fallback element playing `source`.
    ///
    /// Called at most once, before any operation addressing
    /// [`EndpointRole::Fallback`].
    fn create_fallback(&self, source: &str) -> Result<(), RoutingError>;

    /// Requests playback of `role`.
    ///
    /// The request is issued when this method is called, not when the
    /// returned future is first polled, so two requests made back to back run
    /// in parallel.
    fn play(&self, role: EndpointRole) -> impl Future<Output = Result<(), RoutingError>>;

    /// Sets the mute flag of `role`.
    fn set_muted(&self, role: EndpointRole, muted: bool);

    /// Sets the native volume of `role`.
    fn set_volume(&self, role: EndpointRole, volume: f64);

    /// Reads the state of `role`, or `None` if that element does not exist.
    fn media_state(&self, role: EndpointRole) -> Option<MediaState>;

    /// Returns `true` if native volume writes are known to have no audible
    /// effect on this platform (iOS).
    fn native_volume_inert(&self) -> bool {
        false
    }

    /// Returns a monotonic timestamp in milliseconds for diagnostics.
    fn now_ms(&self) -> f64;
}
