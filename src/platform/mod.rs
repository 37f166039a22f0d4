//! Platform abstraction layer
//!
//! Browser side: requestAnimationFrame scheduling with a cancellation
//! token, monotonic time, DOM content scanning and viewport queries.
//! Native side: just enough stubs to keep the simulation core testable
//! off the web. Nothing in `sim` may depend on this module.

use crate::consts::DEFAULT_VIEWPORT;
use crate::sim::ContentBlock;

#[cfg(target_arch = "wasm32")]
use {
    std::cell::{Cell, RefCell},
    std::rc::Rc,
    wasm_bindgen::JsCast,
    wasm_bindgen::prelude::*,
    web_sys::{Element, EventTarget},
};

/// Monotonic milliseconds since an arbitrary origin
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::LazyLock;
    use std::time::Instant;
    static ORIGIN: LazyLock<Instant> = LazyLock::new(Instant::now);
    ORIGIN.elapsed().as_secs_f64() * 1000.0
}

/// Current viewport dimensions, with a default assumption when the host
/// provides none
#[cfg(target_arch = "wasm32")]
pub fn viewport_size() -> (f32, f32) {
    let Some(window) = web_sys::window() else {
        return DEFAULT_VIEWPORT;
    };
    let width = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_VIEWPORT.0 as f64);
    let height = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_VIEWPORT.1 as f64);
    (width as f32, height as f32)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn viewport_size() -> (f32, f32) {
    DEFAULT_VIEWPORT
}

/// Current page scroll offset
#[cfg(target_arch = "wasm32")]
pub fn scroll_offset() -> f32 {
    web_sys::window()
        .and_then(|w| w.scroll_y().ok())
        .unwrap_or(0.0) as f32
}

#[cfg(not(target_arch = "wasm32"))]
pub fn scroll_offset() -> f32 {
    0.0
}

/// Scan the host page's top-level sections into content blocks for the
/// corpus builder. Positions are document-flow coordinates (viewport rect
/// plus current scroll). Absence of sections is not an error; the caller
/// falls back to the canned course.
#[cfg(target_arch = "wasm32")]
pub fn scan_content_blocks() -> Vec<ContentBlock> {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return Vec::new();
    };
    let Ok(nodes) = document.query_selector_all("main > section, [data-runner-block]") else {
        return Vec::new();
    };

    let scroll = scroll_offset();
    let mut blocks = Vec::new();
    for index in 0..nodes.length() {
        let Some(element) = nodes.get(index).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let rect = element.get_bounding_client_rect();
        let heading = element.get_attribute("data-runner-label").or_else(|| {
            element
                .query_selector("h1, h2, h3")
                .ok()
                .flatten()
                .and_then(|h| h.text_content())
        });
        let id = element.id();
        blocks.push(ContentBlock {
            id: (!id.is_empty()).then_some(id),
            top: rect.top() as f32 + scroll,
            height: rect.height() as f32,
            heading,
        });
    }
    blocks
}

#[cfg(not(target_arch = "wasm32"))]
pub fn scan_content_blocks() -> Vec<ContentBlock> {
    Vec::new()
}

/// Continuous redraw loop with a cancellation token.
///
/// The token is checked before every scheduled continuation: after
/// `cancel`, the callback never runs again even if a frame request was
/// already queued at teardown time.
#[cfg(target_arch = "wasm32")]
pub struct FrameLoop {
    alive: Rc<Cell<bool>>,
    raf_id: Rc<Cell<i32>>,
    // Sole strong holder of the recurring closure; the tick itself only
    // keeps a weak handle, so dropping the loop frees the closure
    callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>,
}

#[cfg(target_arch = "wasm32")]
impl FrameLoop {
    pub fn start<F: FnMut(f64) + 'static>(mut on_frame: F) -> Self {
        let alive = Rc::new(Cell::new(true));
        let raf_id = Rc::new(Cell::new(0));
        let callback: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));

        let alive_tick = alive.clone();
        let raf_tick = raf_id.clone();
        let callback_tick = Rc::downgrade(&callback);
        *callback.borrow_mut() = Some(Closure::new(move |time: f64| {
            if !alive_tick.get() {
                return;
            }
            on_frame(time);
            if !alive_tick.get() {
                return;
            }
            let Some(holder) = callback_tick.upgrade() else {
                return;
            };
            if let Some(closure) = holder.borrow().as_ref() {
                raf_tick.set(request_frame(closure));
            }
        }));

        if let Some(closure) = callback.borrow().as_ref() {
            raf_id.set(request_frame(closure));
        }

        Self {
            alive,
            raf_id,
            callback,
        }
    }

    /// Stop the loop and cancel the pending frame request. Idempotent.
    pub fn cancel(&self) {
        self.alive.set(false);
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(self.raf_id.get());
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(target_arch = "wasm32")]
fn request_frame(closure: &Closure<dyn FnMut(f64)>) -> i32 {
    web_sys::window()
        .and_then(|w| w.request_animation_frame(closure.as_ref().unchecked_ref()).ok())
        .unwrap_or(0)
}

/// An event listener that detaches itself on drop, so teardown releases
/// every registration
#[cfg(target_arch = "wasm32")]
pub struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

#[cfg(target_arch = "wasm32")]
impl Listener {
    pub fn attach<F>(target: &EventTarget, kind: &'static str, handler: F) -> Option<Self>
    where
        F: FnMut(web_sys::Event) + 'static,
    {
        let closure = Closure::new(handler);
        target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

#[cfg(target_arch = "wasm32")]
impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// One-shot timer. The callback owns its closure; firing consumes it.
#[cfg(target_arch = "wasm32")]
pub fn set_timeout<F: FnOnce() + 'static>(delay_ms: i32, callback: F) {
    let closure = Closure::once_into_js(callback);
    if let Some(window) = web_sys::window() {
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.unchecked_ref(),
            delay_ms,
        );
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_frame_loop_frees_closure_on_drop() {
        let frame_loop = FrameLoop::start(|_| {});
        // The loop is the only strong holder of its own closure
        assert_eq!(Rc::strong_count(&frame_loop.callback), 1);

        let holder = Rc::downgrade(&frame_loop.callback);
        frame_loop.cancel();
        drop(frame_loop);
        assert!(holder.upgrade().is_none(), "tick closure leaked");
    }

    #[wasm_bindgen_test]
    fn test_frame_loop_cancel_is_idempotent() {
        let frame_loop = FrameLoop::start(|_| {});
        frame_loop.cancel();
        frame_loop.cancel();
        assert!(!frame_loop.alive.get());
    }
}
