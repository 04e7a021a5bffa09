use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::Context as _;
use glam::Vec2;
use winit::{event::*, event_loop::EventLoop, window::Window};

// Import from the library crate
use ramen_folio::{assets, config, controller, logging, model, ui, view};

use assets::loader::FsSource;
use assets::{load_assets, LoadingManager, SharedProgress};
use controller::{FrameLoopContext, InputEvent, InputState, MouseButton as PointerButton};
use view::{GpuContext, RenderState};

struct App {
    gpu: GpuContext,
    window: Arc<Window>,
    size: winit::dpi::PhysicalSize<u32>,
    render_state: RenderState,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    frame_ctx: FrameLoopContext,
    input_state: Rc<RefCell<InputState>>,
    /// Last cursor position in logical pixels.
    cursor: (f32, f32),

    // Frame timing
    last_frame_time: std::time::Instant,
}

impl App {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let gpu = GpuContext::new_native(window.clone(), size.width, size.height)
            .await
            .context("GPU init failed")?;

        let render_state = RenderState::new(
            &gpu.device,
            &gpu.queue,
            gpu.format,
            gpu.config.alpha_mode,
            gpu.config.width,
            gpu.config.height,
        );

        // Initialize egui
        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(egui_ctx.clone(), egui::ViewportId::ROOT, &window, None, None, None);

        let input_state = Rc::new(RefCell::new(InputState::new()));
        let progress = SharedProgress::default();
        let logical = size.to_logical::<f32>(window.scale_factor());
        let mut frame_ctx = FrameLoopContext::new(
            size.width,
            size.height,
            Vec2::new(logical.width, logical.height),
            input_state.clone(),
            progress.clone(),
        );

        let source = FsSource::new(config::asset_root());
        let mut manager = LoadingManager::new(progress);
        let loaded = load_assets(&source, &mut manager).await;
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let scene = model::assembly::assemble(loaded, seed);

        let mut render_state = render_state;
        render_state.upload_scene(&gpu.device, &gpu.queue, &scene);
        frame_ctx.set_scene(scene);

        Ok(Self {
            gpu,
            window,
            size,
            render_state,
            egui_state,
            egui_ctx,
            frame_ctx,
            input_state,
            cursor: (0.0, 0.0),
            last_frame_time: std::time::Instant::now(),
        })
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // First let egui process the event
        let egui_captured = self.egui_state.on_window_event(self.window.as_ref(), event).consumed;

        let scale = self.window.scale_factor();
        let (x, y) = self.cursor;
        let input = match event {
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(scale);
                self.cursor = (logical.x, logical.y);
                Some(InputEvent::PointerMove { x: logical.x, y: logical.y })
            }
            WindowEvent::MouseInput { state, button, .. } if !egui_captured => {
                let button = match button {
                    winit::event::MouseButton::Left => PointerButton::Left,
                    winit::event::MouseButton::Right => PointerButton::Right,
                    winit::event::MouseButton::Middle => PointerButton::Middle,
                    _ => return true,
                };
                Some(match state {
                    ElementState::Pressed => InputEvent::PointerDown { button, x, y },
                    ElementState::Released => InputEvent::PointerUp { button, x, y },
                })
            }
            WindowEvent::MouseWheel { delta, .. } if !egui_captured => {
                // Browser convention: positive scrolls away from the page top
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, lines) => -lines * 100.0,
                    MouseScrollDelta::PixelDelta(p) => -p.y as f32,
                };
                Some(InputEvent::Wheel { delta_y })
            }
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            _ => None,
        };

        match input {
            Some(input) => {
                self.input_state.borrow_mut().process_event(&input);
                true
            }
            None => egui_captured,
        }
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.gpu.config.width = new_size.width;
            self.gpu.config.height = new_size.height;
            self.render_state
                .resize(&self.gpu.device, &self.gpu.surface, new_size.width, new_size.height);
            let logical = new_size.to_logical::<f32>(self.window.scale_factor());
            self.frame_ctx
                .resize(new_size.width, new_size.height, Vec2::new(logical.width, logical.height));
        }
    }

    fn update(&mut self, dt: f32) {
        let ui_wants_pointer = self.egui_ctx.is_pointer_over_area() || self.egui_ctx.is_using_pointer();
        let out = self.frame_ctx.update(dt, ui_wants_pointer);
        for url in out.links {
            tracing::info!(url, "no browser attached, link not opened");
        }
        if out.points_dirty {
            if let Some(rig) = self.frame_ctx.scene.as_ref().and_then(|s| s.hologram.as_ref()) {
                self.render_state.write_points(&self.gpu.queue, &rig.cloud.current);
            }
        }
    }

    fn render_ui(&mut self) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let mut output = ui::build_ui(&self.egui_ctx, raw_input, &mut self.frame_ctx);
        self.egui_state
            .handle_platform_output(&self.window, std::mem::take(&mut output.platform_output));

        let ppp = self.window.scale_factor() as f32;
        let primitives = self.egui_ctx.tessellate(std::mem::take(&mut output.shapes), ppp);
        self.render_state.egui_primitives = Some(primitives);
        self.render_state.egui_full_output = Some(output);
        self.render_state.egui_dpr = ppp;
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.render_ui();
        self.render_state.draw_frame(
            &self.gpu.device,
            &self.gpu.queue,
            &self.gpu.surface,
            self.frame_ctx.scene.as_ref(),
            &self.frame_ctx.camera,
            &self.frame_ctx.settings,
        )
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title("Ramen Folio")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    #[allow(deprecated)]
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut app = pollster::block_on(App::new(window.clone()))?;

    #[allow(deprecated)]
    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { ref event, window_id } if window_id == app.window.id() => {
            if !app.input(event) {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(physical_size) => {
                        app.resize(*physical_size);
                    }
                    WindowEvent::RedrawRequested => {
                        let now = std::time::Instant::now();
                        let dt = (now - app.last_frame_time).as_secs_f32();
                        app.last_frame_time = now;

                        app.update(dt);

                        match app.render() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => app.resize(app.size),
                            Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                            Err(e) => tracing::warn!(error = ?e, "frame skipped"),
                        }
                    }
                    _ => {}
                }
            }
        }
        Event::AboutToWait => {
            app.window.request_redraw();
        }
        _ => {}
    })?;

    Ok(())
}
