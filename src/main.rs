//! Scroll Runner entry point
//!
//! Mounts the widget against the host page, wires the environment signals
//! (scroll, resize, content size changes) and drives the frame loop. The
//! simulation itself lives in `scroll_runner::sim`; this file is the
//! browser glue around it.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_widget {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{CustomEvent, CustomEventInit, Document, Element};

    use scroll_runner::consts::SETTLE_DELAY_MS;
    use scroll_runner::platform::{self, FrameLoop, Listener};
    use scroll_runner::sim::{Engine, FrameView, RunMode, SimConfig, TickInput};

    /// Fields written by listener handlers and read by the next tick.
    /// Handlers only flip these; all real work happens on the frame.
    struct Shared {
        scroll: Cell<f32>,
        rebuild_pending: Cell<bool>,
    }

    /// DOM handles for the built-in renderer glue
    struct Stage {
        mount: Element,
        runner_el: Element,
        obstacle_els: RefCell<Vec<(u32, Element)>>,
    }

    /// Everything that must be released when the widget unmounts
    struct Teardown {
        frame_loop: FrameLoop,
        _listeners: Vec<Listener>,
        observer: Option<(web_sys::ResizeObserver, Closure<dyn FnMut()>)>,
    }

    impl Teardown {
        fn release(self) {
            self.frame_loop.cancel();
            if let Some((observer, _)) = &self.observer {
                observer.disconnect();
            }
            // Listeners detach on drop
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("scroll-runner starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let Some(mount) = document.get_element_by_id("runner-track") else {
            log::warn!("no #runner-track element, widget not mounted");
            return;
        };

        let (width, height) = platform::viewport_size();
        let blocks = platform::scan_content_blocks();
        let mode = match mount.get_attribute("data-runner-mode").as_deref() {
            Some("clock") => RunMode::ClockDriven,
            Some("scroll") => RunMode::ScrollSynced,
            // Without structure there is nothing to sync scrolling against
            _ if blocks.is_empty() => RunMode::ClockDriven,
            _ => RunMode::ScrollSynced,
        };

        let mut engine = Engine::new(mode, SimConfig::for_viewport(width, height));
        engine.rebuild_corpus(&blocks);
        log::info!(
            "mounted in {:?} mode, {} obstacles, viewport {}x{}",
            mode,
            engine.corpus.len(),
            width,
            height
        );

        let Some(stage) = build_stage(&document, mount) else {
            log::warn!("could not build stage elements");
            return;
        };
        sync_obstacles(&document, &stage, &engine);

        let shared = Rc::new(Shared {
            scroll: Cell::new(platform::scroll_offset()),
            rebuild_pending: Cell::new(false),
        });
        let engine = Rc::new(RefCell::new(engine));
        let stage = Rc::new(stage);

        let mut listeners = Vec::new();

        // Scroll and resize handlers write narrow shared fields only; the
        // next tick picks them up
        {
            let shared = shared.clone();
            if let Some(listener) = Listener::attach(&window, "scroll", move |_| {
                shared.scroll.set(platform::scroll_offset());
            }) {
                listeners.push(listener);
            }
        }
        {
            let shared = shared.clone();
            if let Some(listener) = Listener::attach(&window, "resize", move |_| {
                shared.rebuild_pending.set(true);
            }) {
                listeners.push(listener);
            }
        }

        // Structural size changes of the content container force a rebuild
        let observer = observe_content(&document, shared.clone());

        // One more rebuild after a settle delay, for late content reflow
        {
            let shared = shared.clone();
            platform::set_timeout(SETTLE_DELAY_MS, move || {
                shared.rebuild_pending.set(true);
            });
        }

        let frame_loop = {
            let engine = engine.clone();
            let stage = stage.clone();
            let shared = shared.clone();
            FrameLoop::start(move |time| {
                let mut engine = engine.borrow_mut();

                if shared.rebuild_pending.take() {
                    let (width, height) = platform::viewport_size();
                    engine.set_viewport(width, height);
                    engine.rebuild_corpus(&platform::scan_content_blocks());
                    if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                        sync_obstacles(&document, &stage, &engine);
                    }
                }

                let input = match engine.mode() {
                    RunMode::ScrollSynced => TickInput {
                        scroll_offset: Some(shared.scroll.get()),
                    },
                    RunMode::ClockDriven => TickInput::default(),
                };
                let view = engine.frame(&input, time);
                apply_view(&stage, engine.mode(), &view);
                publish_frame(&stage.mount, &view);
            })
        };

        // Teardown: the host dispatches `runner:unmount` on the mount
        // element; everything pending is cancelled before it returns
        let slot = Rc::new(RefCell::new(Some(Teardown {
            frame_loop,
            _listeners: listeners,
            observer,
        })));
        {
            let slot = slot.clone();
            let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
                if let Some(teardown) = slot.borrow_mut().take() {
                    teardown.release();
                    log::info!("scroll-runner unmounted");
                }
            });
            let _ = stage
                .mount
                .add_event_listener_with_callback("runner:unmount", closure.as_ref().unchecked_ref());
            // Page-lifetime hook, intentionally leaked
            closure.forget();
        }

        log::info!("scroll-runner running");
    }

    fn build_stage(document: &Document, mount: Element) -> Option<Stage> {
        let runner_el = document.create_element("div").ok()?;
        runner_el.set_class_name("runner-sprite");
        mount.append_child(&runner_el).ok()?;
        Some(Stage {
            mount,
            runner_el,
            obstacle_els: RefCell::new(Vec::new()),
        })
    }

    /// Recreate obstacle elements for a freshly built corpus
    fn sync_obstacles(document: &Document, stage: &Stage, engine: &Engine) {
        let mut els = stage.obstacle_els.borrow_mut();
        for (_, el) in els.drain(..) {
            el.remove();
        }
        for obstacle in &engine.corpus.obstacles {
            let Ok(el) = document.create_element("div") else {
                continue;
            };
            el.set_class_name("runner-obstacle");
            el.set_text_content(Some(&obstacle.label));
            let _ = el.set_attribute("style", "display:none;");
            let _ = stage.mount.append_child(&el);
            els.push((obstacle.id, el));
        }
    }

    /// Built-in DOM renderer: positions the sprite and the visible
    /// obstacles, hides the rest
    fn apply_view(stage: &Stage, mode: RunMode, view: &FrameView) {
        let runner = &view.runner;
        let _ = stage.runner_el.set_attribute(
            "style",
            &format!("left:{:.1}px;bottom:{:.1}px;", runner.pos.x, runner.pos.y),
        );

        for (id, el) in stage.obstacle_els.borrow().iter() {
            match view.obstacles.iter().find(|o| o.id == *id) {
                Some(obstacle) => {
                    let edge = obstacle.lane_pos - obstacle.width / 2.0;
                    let style = match mode {
                        RunMode::ScrollSynced => format!(
                            "display:block;width:{:.0}px;height:{:.0}px;left:0;bottom:{edge:.1}px;",
                            obstacle.width, obstacle.height
                        ),
                        RunMode::ClockDriven => format!(
                            "display:block;width:{:.0}px;height:{:.0}px;bottom:0;left:{edge:.1}px;",
                            obstacle.width, obstacle.height
                        ),
                    };
                    let _ = el.set_attribute("style", &style);
                }
                None => {
                    let _ = el.set_attribute("style", "display:none;");
                }
            }
        }
    }

    /// Publish the frame for any other rendering surface on the page
    fn publish_frame(mount: &Element, view: &FrameView) {
        let Ok(json) = serde_json::to_string(view) else {
            return;
        };
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_detail(&JsValue::from_str(&json));
        if let Ok(event) = CustomEvent::new_with_event_init_dict("runner-frame", &init) {
            let _ = mount.dispatch_event(&event);
        }
    }

    /// Watch the content container for structural size changes
    fn observe_content(
        document: &Document,
        shared: Rc<Shared>,
    ) -> Option<(web_sys::ResizeObserver, Closure<dyn FnMut()>)> {
        let target = document.query_selector("main").ok().flatten()?;
        let closure = Closure::<dyn FnMut()>::new(move || {
            shared.rebuild_pending.set(true);
        });
        let observer = web_sys::ResizeObserver::new(closure.as_ref().unchecked_ref()).ok()?;
        observer.observe(&target);
        Some((observer, closure))
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_widget::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use scroll_runner::sim::{Engine, RunMode, SimConfig, TickInput};

    env_logger::init();
    log::info!("scroll-runner (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web widget");

    // Smoke run: fallback course, clock-driven, ten simulated seconds
    let mut engine = Engine::new(RunMode::ClockDriven, SimConfig::default());
    engine.rebuild_corpus(&[]);

    let input = TickInput::default();
    let mut jumps = 0u32;
    let mut last = None;
    for frame in 0..600u32 {
        let view = engine.step(&input, 1.0 / 60.0);
        if engine.runner.last_triggered != last {
            if engine.runner.last_triggered.is_some() {
                jumps += 1;
            }
            last = engine.runner.last_triggered;
        }
        if frame % 120 == 0 {
            log::info!(
                "t={:.1}s distance={:.0} visible obstacles={}",
                frame as f32 / 60.0,
                engine.source.position(),
                view.obstacles.len()
            );
        }
    }

    assert!(jumps > 0, "no jump armed over the smoke run");
    println!("✓ Headless run complete: {jumps} jumps over 10 simulated seconds");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
