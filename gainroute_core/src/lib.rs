// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Volume routing for a single streaming media element.
//!
//! `gainroute_core` decides how a volume slider affects perceived loudness
//! when the host runtime may ignore a media element's native `volume`
//! property (iOS Safari) or refuse to route the element through an audio
//! graph at all. It is `no_std` compatible (with `alloc`) and contains no
//! browser bindings; platform backends implement [`AudioPlatform`] and hand it
//! to a [`VolumeController`].
//!
//! # Architecture
//!
//! ```text
//!   user gesture
//!       │
//!       ▼
//!   VolumeController::negotiate()
//!       │  resume context ──► PrimaryGraph ──► FallbackGraph ──► NativeVolume
//!       │                      (first step that succeeds wins)
//!       ▼
//!   Strategy (final for the page session)
//!       │
//!       ▼
//!   set_level / toggle_mute / apply_preset ──► GainStage or native volume
//!       │
//!       ▼
//!   DiagnosticsSink (snapshot on every transition)
//! ```
//!
//! **[`controller`]**: The negotiation state machine and level operations.
//!
//! **[`platform`]**: The [`AudioPlatform`] and [`GainStage`] traits that
//! backends implement, plus the endpoint and context state types.
//!
//! **[`strategy`]**: The three routing strategies in preference order.
//!
//! **[`level`]**: [`Level`], a volume scalar guaranteed to lie in `[0, 1]`.
//!
//! **[`diagnostics`]**: [`DiagnosticsSink`] trait and the
//! [`DiagnosticSnapshot`](diagnostics::DiagnosticSnapshot) it receives.
//!
//! **[`config`]**: [`RoutingConfig`], built from the page's query string.
//!
//! **[`error`]**: [`RoutingError`] kinds and how they degrade.
//!
//! [`AudioPlatform`]: platform::AudioPlatform
//! [`GainStage`]: platform::GainStage
//! [`VolumeController`]: controller::VolumeController
//! [`Level`]: level::Level
//! [`DiagnosticsSink`]: diagnostics::DiagnosticsSink
//! [`RoutingConfig`]: config::RoutingConfig
//! [`RoutingError`]: error::RoutingError

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod error;
pub mod level;
pub mod platform;
pub mod strategy;
