// Re-export all public modules so they can be used from main.rs
pub mod config;
pub mod error;
pub mod logging;
pub mod utils;
pub mod ui;

pub mod assets;

// MVC Architecture
pub mod model;
pub mod view;
pub mod controller;

#[cfg(target_arch = "wasm32")]
pub use web::start;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::convert::FromWasmAbi;
    use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
    use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, MouseEvent, Window};

    use crate::assets::loader::FetchSource;
    use crate::assets::{load_assets, LoadingManager, SharedProgress};
    use crate::controller::input::wasm as web_input;
    use crate::controller::{FrameLoopContext, InputEvent, InputState};
    use crate::model::assembly;
    use crate::model::Scene;
    use crate::view::{GpuContext, RenderState};
    use crate::{config, logging, ui};

    /// Longest step the animation code sees, so a backgrounded tab does not jump.
    const MAX_FRAME_DT: f32 = 0.1;

    #[wasm_bindgen(start)]
    pub async fn start() -> Result<(), JsValue> {
        logging::init();
        let (window, document, canvas) = init_canvas()?;
        setup_app(&window, &document, &canvas).await
    }

    /// Main application setup for WASM
    async fn setup_app(window: &Window, document: &Document, canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
        let (width, height, viewport) = fit_canvas(window, canvas);

        let gpu = GpuContext::new(canvas, width, height)
            .await
            .map_err(|e| js_error(format!("GPU init failed: {e}")))?;

        let mut render_state = RenderState::new(
            gpu.device.as_ref(),
            gpu.queue.as_ref(),
            gpu.format,
            gpu.config.alpha_mode,
            gpu.config.width,
            gpu.config.height,
        );

        let input_state = Rc::new(RefCell::new(InputState::new()));
        let egui_events: Rc<RefCell<Vec<egui::Event>>> = Rc::new(RefCell::new(Vec::new()));
        let progress = SharedProgress::default();
        let mut frame_ctx = FrameLoopContext::new(width, height, viewport, input_state.clone(), progress.clone());

        // Assets stream in on their own task; the frame loop picks the scene up once it is built.
        let pending_scene: Rc<RefCell<Option<Scene>>> = Rc::new(RefCell::new(None));
        {
            let pending_scene = pending_scene.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let source = FetchSource::new(config::asset_root());
                let mut manager = LoadingManager::new(progress);
                let assets = load_assets(&source, &mut manager).await;
                let seed = (js_sys::Math::random() * u32::MAX as f64) as u64;
                *pending_scene.borrow_mut() = Some(assembly::assemble(assets, seed));
            });
        }

        setup_input_listeners(document, window, input_state, egui_events.clone())?;

        let egui_ctx = egui::Context::default();
        let performance = window.performance();
        let mut last_time = performance.as_ref().map(|p| p.now()).unwrap_or(0.0);

        // Continuous redraw using requestAnimationFrame
        let f = RcCellCallback::new(window.clone(), {
            let window = window.clone();
            let canvas = canvas.clone();

            move || {
                let now = performance.as_ref().map(|p| p.now()).unwrap_or(last_time);
                let dt = (((now - last_time) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT);
                last_time = now;

                let (width, height, viewport) = fit_canvas(&window, &canvas);
                if width != render_state.width || height != render_state.height {
                    render_state.resize(gpu.device.as_ref(), &gpu.surface, width, height);
                    frame_ctx.resize(width, height, viewport);
                }

                if let Some(scene) = pending_scene.borrow_mut().take() {
                    render_state.upload_scene(gpu.device.as_ref(), gpu.queue.as_ref(), &scene);
                    frame_ctx.set_scene(scene);
                }

                let ui_wants_pointer = egui_ctx.is_pointer_over_area() || egui_ctx.is_using_pointer();
                let out = frame_ctx.update(dt, ui_wants_pointer);
                for url in out.links {
                    if let Err(e) = window.open_with_url_and_target(url, "_blank") {
                        tracing::warn!(url, error = ?e, "could not open link");
                    }
                }
                if out.points_dirty {
                    if let Some(rig) = frame_ctx.scene.as_ref().and_then(|s| s.hologram.as_ref()) {
                        render_state.write_points(gpu.queue.as_ref(), &rig.cloud.current);
                    }
                }

                // Build egui input from queued events
                let dpr = window.device_pixel_ratio().min(config::MAX_PIXEL_RATIO) as f32;
                let mut raw_input = egui::RawInput::default();
                raw_input.time = Some(now / 1000.0);
                raw_input.screen_rect = Some(egui::Rect::from_min_size(
                    egui::Pos2::ZERO,
                    egui::vec2(width as f32 / dpr, height as f32 / dpr),
                ));
                raw_input.events.extend(egui_events.borrow_mut().drain(..));
                egui_ctx.set_pixels_per_point(dpr);

                let mut full_output = ui::build_ui(&egui_ctx, raw_input, &mut frame_ctx);
                let primitives = egui_ctx.tessellate(std::mem::take(&mut full_output.shapes), dpr);
                render_state.egui_primitives = Some(primitives);
                render_state.egui_full_output = Some(full_output);
                render_state.egui_dpr = dpr;

                match render_state.draw_frame(
                    gpu.device.as_ref(),
                    gpu.queue.as_ref(),
                    &gpu.surface,
                    frame_ctx.scene.as_ref(),
                    &frame_ctx.camera,
                    &frame_ctx.settings,
                ) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let (w, h) = (render_state.width, render_state.height);
                        render_state.resize(gpu.device.as_ref(), &gpu.surface, w, h);
                    }
                    Err(e) => tracing::warn!(error = ?e, "frame skipped"),
                }
            }
        });
        f.start();

        Ok(())
    }

    fn egui_pointer(e: &MouseEvent, pressed: bool) -> Option<egui::Event> {
        let button = match e.button() {
            0 => egui::PointerButton::Primary,
            1 => egui::PointerButton::Middle,
            2 => egui::PointerButton::Secondary,
            _ => return None,
        };
        Some(egui::Event::PointerButton {
            pos: egui::pos2(e.client_x() as f32, e.client_y() as f32),
            button,
            pressed,
            modifiers: egui::Modifiers::default(),
        })
    }

    /// Register `f` for `event` on `target` for the lifetime of the page.
    fn listen<E>(target: &EventTarget, event: &str, f: impl FnMut(E) + 'static) -> Result<(), JsValue>
    where
        E: FromWasmAbi + 'static,
    {
        let closure = Closure::<dyn FnMut(E)>::new(f);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    /// Mouse, wheel and focus events feed both the scene input and egui.
    fn setup_input_listeners(
        document: &Document,
        window: &Window,
        input_state: Rc<RefCell<InputState>>,
        egui_events: Rc<RefCell<Vec<egui::Event>>>,
    ) -> Result<(), JsValue> {
        let (input, events) = (input_state.clone(), egui_events.clone());
        listen(document, "mousedown", move |e: MouseEvent| {
            input.borrow_mut().process_event(&web_input::mouse_down_to_input(&e));
            events.borrow_mut().extend(egui_pointer(&e, true));
        })?;

        let (input, events) = (input_state.clone(), egui_events.clone());
        listen(document, "mouseup", move |e: MouseEvent| {
            input.borrow_mut().process_event(&web_input::mouse_up_to_input(&e));
            events.borrow_mut().extend(egui_pointer(&e, false));
        })?;

        let (input, events) = (input_state.clone(), egui_events.clone());
        listen(document, "mousemove", move |e: MouseEvent| {
            input.borrow_mut().process_event(&web_input::mouse_move_to_input(&e));
            let pos = egui::pos2(e.client_x() as f32, e.client_y() as f32);
            events.borrow_mut().push(egui::Event::PointerMoved(pos));
        })?;

        let input = input_state.clone();
        listen(document, "wheel", move |e: Event| {
            if let Some(event) = web_input::mouse_wheel_to_input(&e) {
                input.borrow_mut().process_event(&event);
                e.prevent_default();
            }
        })?;

        // Focus loss drops any drag in progress
        listen(window, "blur", move |_e: Event| {
            input_state.borrow_mut().process_event(&InputEvent::FocusLost);
            egui_events.borrow_mut().push(egui::Event::PointerGone);
        })?;

        // Right drag pans, so no context menu
        listen(document, "contextmenu", |e: MouseEvent| e.prevent_default())
    }

    /// Size the canvas backing store to the window at the capped pixel ratio.
    /// Returns (physical width, physical height, logical size).
    fn fit_canvas(window: &Window, canvas: &HtmlCanvasElement) -> (u32, u32, Vec2) {
        let logical_w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
        let logical_h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
        let dpr = window.device_pixel_ratio().min(config::MAX_PIXEL_RATIO);
        let width = ((logical_w * dpr) as u32).max(1);
        let height = ((logical_h * dpr) as u32).max(1);
        if canvas.width() != width || canvas.height() != height {
            canvas.set_width(width);
            canvas.set_height(height);
        }
        (width, height, Vec2::new(logical_w as f32, logical_h as f32))
    }

    fn init_canvas() -> Result<(Window, Document, HtmlCanvasElement), JsValue> {
        let window = web_sys::window().ok_or(js_error("no global `window`"))?;
        let document = window.document().ok_or(js_error("no document on window"))?;
        let body = document.body().ok_or(js_error("no body on document"))?;
        let canvas_el = document
            .create_element("canvas")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| js_error("failed to create canvas"))?;
        canvas_el.set_attribute("style", "position:fixed;inset:0;width:100vw;height:100vh;display:block")?;
        body.append_child(&canvas_el)?;
        Ok((window, document, canvas_el))
    }

    fn js_error<E: Into<String>>(msg: E) -> JsValue {
        JsValue::from_str(&msg.into())
    }

    struct RcCellCallback {
        inner: Rc<RefCell<Box<dyn FnMut()>>>,
        window: Window,
    }

    impl RcCellCallback {
        fn new(window: Window, f: impl FnMut() + 'static) -> Self {
            Self {
                inner: Rc::new(RefCell::new(Box::new(f))),
                window,
            }
        }

        fn start(self) {
            let inner = self.inner.clone();
            let window = self.window.clone();

            let callback = Rc::new(RefCell::new(None::<Closure<dyn FnMut()>>));
            let callback_clone = callback.clone();

            *callback.borrow_mut() = Some(Closure::wrap(Box::new(move || {
                inner.borrow_mut().as_mut()();

                // Recursively schedule next frame
                if let Some(cb) = callback_clone.borrow().as_ref() {
                    if let Err(e) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                        tracing::error!(error = ?e, "requestAnimationFrame failed");
                    }
                }
            }) as Box<dyn FnMut()>));

            if let Some(cb) = callback.borrow().as_ref() {
                if let Err(e) = self.window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tracing::error!(error = ?e, "requestAnimationFrame start failed");
                }
            }

            // Leak the closure to keep it alive
            std::mem::forget(callback);
        }
    }
}
