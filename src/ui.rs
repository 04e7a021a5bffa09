use egui::Context;

use crate::assets::LoadProgress;
use crate::config::Settings;
use crate::controller::FrameLoopContext;

/// Build the complete UI and return egui output
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, frame: &mut FrameLoopContext) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        draw_stats_window(ctx, frame);
        draw_controls_window(ctx, &mut frame.settings);
        draw_loading_overlay(ctx, &frame.progress.0.borrow());
    })
}

fn draw_stats_window(ctx: &Context, frame: &FrameLoopContext) {
    let eye = frame.camera.eye;
    let target = frame.camera.target;
    egui::Window::new("Stats")
        .default_pos([8.0, 8.0])
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new(format!("FPS: {:.0}", frame.stats.fps)).small());
            ui.label(egui::RichText::new(format!("Frame: {:.1} ms", frame.stats.frame_ms)).small());
            ui.label(egui::RichText::new(format!("Eye: x: {:.1} y: {:.1} z: {:.1}", eye.x, eye.y, eye.z)).small());
            ui.label(
                egui::RichText::new(format!("Target: x: {:.1} y: {:.1} z: {:.1}", target.x, target.y, target.z))
                    .small(),
            );
            ui.label(egui::RichText::new(format!("View: {}", frame.interaction.view().label())).small());
        });
}

fn draw_controls_window(ctx: &Context, settings: &mut Settings) {
    let width = ctx.available_rect().width();
    egui::Window::new("Controls")
        .default_pos([width - 230.0, 8.0])
        .default_width(220.0)
        .show(ctx, |ui| {
            ui.collapsing("Bloom", |ui| {
                ui.add(egui::Slider::new(&mut settings.bloom.threshold, 0.0..=1.0).text("threshold"));
                ui.add(egui::Slider::new(&mut settings.bloom.strength, 0.0..=3.0).text("strength"));
                ui.add(
                    egui::Slider::new(&mut settings.bloom.radius, 0.0..=1.0)
                        .step_by(0.01)
                        .text("radius"),
                );
            });
            ui.collapsing("Tone mapping", |ui| {
                ui.add(egui::Slider::new(&mut settings.exposure, 0.1..=2.0).text("exposure"));
            });
            ui.collapsing("Mirror", |ui| {
                ui.add(egui::Slider::new(&mut settings.mirror_blur, 0.0..=1.0).text("blur"));
            });
            ui.collapsing("Floor", |ui| {
                let floor = &mut settings.floor;
                ui.horizontal(|ui| {
                    ui.label("color");
                    ui.color_edit_button_srgb(&mut floor.color);
                });
                ui.add(egui::Slider::new(&mut floor.metalness, 0.0..=1.0).text("metalness"));
                ui.add(egui::Slider::new(&mut floor.roughness, 0.0..=1.0).text("roughness"));
                ui.add(egui::Slider::new(&mut floor.clearcoat, 0.0..=1.0).text("clearcoat"));
                ui.add(egui::Slider::new(&mut floor.clearcoat_roughness, 0.0..=1.0).text("clearcoat roughness"));
            });
        });
}

fn draw_loading_overlay(ctx: &Context, progress: &LoadProgress) {
    if progress.done {
        return;
    }
    egui::Area::new(egui::Id::new("loading"))
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.set_width(320.0);
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(progress_text(progress)).color(egui::Color32::WHITE));
                ui.add(egui::ProgressBar::new(progress.fraction()).show_percentage());
            });
        });
}

fn progress_text(progress: &LoadProgress) -> String {
    match progress.failed.len() {
        0 => format!("Loading {} / {}", progress.loaded, progress.total),
        n => format!("Loading {} / {} ({n} failed)", progress.loaded, progress.total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::SharedProgress;
    use crate::controller::InputState;
    use glam::Vec2;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn frame() -> FrameLoopContext {
        FrameLoopContext::new(
            800,
            600,
            Vec2::new(800.0, 600.0),
            Rc::new(RefCell::new(InputState::new())),
            SharedProgress::default(),
        )
    }

    #[test]
    fn progress_text_mentions_failures() {
        let mut progress = LoadProgress { loaded: 3, total: 9, ..Default::default() };
        assert_eq!(progress_text(&progress), "Loading 3 / 9");
        progress.failed.push("models/pole.glb".into());
        assert_eq!(progress_text(&progress), "Loading 3 / 9 (1 failed)");
    }

    #[test]
    fn ui_runs_headless_without_touching_settings() {
        let ctx = Context::default();
        let mut frame = frame();
        let before = frame.settings.clone();
        let raw_input = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0))),
            ..Default::default()
        };
        let output = build_ui(&ctx, raw_input, &mut frame);
        assert!(!output.shapes.is_empty());
        assert_eq!(frame.settings, before);
    }
}
