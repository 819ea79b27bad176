// Copyright 2026 the Gainroute Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setInterval` driver.
//!
//! [`IntervalTimer`] invokes a callback every `period_ms` milliseconds. The
//! host page uses it to emit periodic diagnostic snapshots.

use alloc::boxed::Box;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setInterval")]
    fn set_interval(callback: &JsValue, millis: i32) -> i32;

    #[wasm_bindgen(js_name = "clearInterval")]
    fn clear_interval(id: i32);
}

type IntervalClosure = Closure<dyn FnMut()>;

/// A repeating timer backed by `setInterval`.
///
/// Create with [`IntervalTimer::new`], then call [`start`](Self::start).
/// The timer is cleared by [`stop`](Self::stop) or when dropped.
pub struct IntervalTimer {
    /// The JS closure handed to `setInterval`. Built lazily on first start.
    closure: RefCell<Option<IntervalClosure>>,

    /// The user-supplied callback, moved into the closure on first start.
    callback: RefCell<Option<Box<dyn FnMut()>>>,

    period_ms: i32,

    /// The ID returned by `setInterval` while running.
    interval_id: Cell<Option<i32>>,
}

impl IntervalTimer {
    /// Creates a timer that is **not yet running**.
    pub fn new(period_ms: i32, callback: impl FnMut() + 'static) -> Self {
        Self {
            closure: RefCell::new(None),
            callback: RefCell::new(Some(Box::new(callback))),
            period_ms,
            interval_id: Cell::new(None),
        }
    }

    /// Starts the timer. If already running, this is a no-op.
    pub fn start(&self) {
        if self.is_running() {
            return;
        }
        let mut closure = self.closure.borrow_mut();
        if closure.is_none()
            && let Some(callback) = self.callback.borrow_mut().take()
        {
            *closure = Some(Closure::wrap(callback));
        }
        if let Some(closure) = closure.as_ref() {
            let id = set_interval(closure.as_ref().unchecked_ref(), self.period_ms);
            self.interval_id.set(Some(id));
        }
    }

    /// Stops the timer. Can be restarted with [`start`](Self::start).
    pub fn stop(&self) {
        if let Some(id) = self.interval_id.take() {
            clear_interval(id);
        }
    }

    /// Returns `true` if the timer is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.interval_id.get().is_some()
    }

    /// Returns the period in milliseconds.
    #[must_use]
    pub fn period_ms(&self) -> i32 {
        self.period_ms
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        self.stop();
        self.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for IntervalTimer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IntervalTimer")
            .field("period_ms", &self.period_ms)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}
