// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`RoutingConfig`] from the page URL.

use alloc::string::{String, ToString as _};

use gainroute_core::config::{FORCE_FALLBACK_PARAM, RoutingConfig, SOURCE_PARAM};
use wasm_bindgen::JsValue;
use web_sys::UrlSearchParams;

/// Reads the configuration from `window.location.search`.
///
/// # Errors
///
/// Returns the thrown value if there is no window or the query string cannot
/// be parsed.
pub fn config_from_location() -> Result<RoutingConfig, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let search = window.location().search()?;
    config_from_search(&search)
}

/// Parses a query string such as `"?src=...&forceAudioFallback=true"`.
///
/// `URLSearchParams` already decodes once; `src` is decoded a second time so
/// that doubly-encoded links still resolve. A value that fails the second
/// decode is used as is.
///
/// # Errors
///
/// Returns the thrown value if `URLSearchParams` rejects `search`.
pub fn config_from_search(search: &str) -> Result<RoutingConfig, JsValue> {
    let params = UrlSearchParams::new_with_str(search)?;
    let source = params.get(SOURCE_PARAM).map(|raw| decode_again(&raw));
    let force_fallback = params.get(FORCE_FALLBACK_PARAM);
    Ok(RoutingConfig::from_query_values(
        source.as_deref(),
        force_fallback.as_deref(),
    ))
}

fn decode_again(raw: &str) -> String {
    js_sys::decode_uri_component(raw).map_or_else(|_| raw.to_string(), String::from)
}
