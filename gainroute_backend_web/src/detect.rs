// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Platform detection and capability probing.

use alloc::string::String;
use alloc::vec::Vec;

use web_sys::HtmlMediaElement;

/// MIME types reported by [`probe_playback_types`].
pub const PROBED_TYPES: [&str; 2] = ["video/mp4", "application/vnd.apple.mpegurl"];

/// Returns `true` for iPhone, iPod and iPad user agents.
///
/// iPadOS reports itself as `MacIntel` by default; a touch-capable "Mac" is
/// treated as an iPad.
#[must_use]
pub fn is_ios_agent(user_agent: &str, platform: &str, max_touch_points: i32) -> bool {
    ["iPad", "iPhone", "iPod"]
        .iter()
        .any(|device| user_agent.contains(device))
        || (platform == "MacIntel" && max_touch_points > 1)
}

/// Returns `true` if the current browser runs on iOS, where writes to a media
/// element's `volume` are ignored.
#[must_use]
pub fn is_ios() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let navigator = window.navigator();
    let user_agent = navigator.user_agent().unwrap_or_default();
    let platform = navigator.platform().unwrap_or_default();
    is_ios_agent(&user_agent, &platform, navigator.max_touch_points())
}

/// Asks `element` whether it can play each of [`PROBED_TYPES`].
///
/// Answers are the raw `canPlayType` strings (`""`, `"maybe"`, `"probably"`).
#[must_use]
pub fn probe_playback_types(element: &HtmlMediaElement) -> Vec<(&'static str, String)> {
    PROBED_TYPES
        .iter()
        .map(|mime| (*mime, element.can_play_type(mime)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE: &str =
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15";
    const MAC_SAFARI: &str =
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15";
    const ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36";

    #[test]
    fn iphone_is_ios() {
        assert!(is_ios_agent(IPHONE, "iPhone", 5));
    }

    #[test]
    fn touch_mac_is_ipad() {
        assert!(is_ios_agent(MAC_SAFARI, "MacIntel", 5));
    }

    #[test]
    fn desktop_mac_is_not_ios() {
        assert!(!is_ios_agent(MAC_SAFARI, "MacIntel", 0));
        // Trackpads report a single touch point on some builds.
        assert!(!is_ios_agent(MAC_SAFARI, "MacIntel", 1));
    }

    #[test]
    fn android_is_not_ios() {
        assert!(!is_ios_agent(ANDROID, "Linux armv8l", 5));
    }
}
