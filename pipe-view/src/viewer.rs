//! Interactive 3D pipe growth viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a growth session and the
//! segments it has emitted, and implements [`eframe::App`] to drive the
//! session from the frame loop and draw the pipes with an orthographic
//! projection.

use std::f32::consts::{FRAC_PI_2, PI};

use eframe::App;
use glam::{Mat3, Vec2, Vec3};
use pipe_core::{
    config::GrowthConfig,
    engine::{GrowthEngine, GrowthState, Segment, StepOutcome},
    error::ConfigError,
    types::ColorTag,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The growth session: [`GrowthEngine`] and the [`Segment`]s it emitted
///   (the viewer is the engine's segment sink).
/// - UI configuration (camera, timing, pending config edits).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Render the bounding box, the pipes and the tip.
///
/// ### Fields
/// - `engine` - Current growth session.
/// - `segments` - Every segment laid in this session, in order.
/// - `cfg` - Working copy of the configuration, applied with "Apply".
/// - `seed` - Seed used when `use_seed` is set; otherwise the RNG is
///   seeded from the thread RNG.
/// - `last_outcome` / `last_error` - Result of the most recent tick.
/// - `config_error` - Why the last "Apply" was rejected, if it was.
///
/// - `running` - Whether the session is currently auto-advancing.
/// - `zoom`, `pan`, `yaw`, `pitch` - Camera.
///
/// - `step_interval` - Target time between automatic ticks (seconds).
/// - `last_step_time` - Time stamp of the last tick (egui time).
/// - `last_step_dt` - Actual time delta between the last two ticks.
pub struct Viewer {
    engine: GrowthEngine<ChaCha8Rng>,
    segments: Vec<Segment>,
    cfg: GrowthConfig,
    seed: u64,
    use_seed: bool,

    last_outcome: Option<StepOutcome>,
    last_error: Option<String>,
    config_error: Option<String>,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,
    yaw: f32,
    pitch: f32,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

/// Builds a growth session, seeded when `seed` is given.
fn build_engine(
    cfg: GrowthConfig,
    seed: Option<u64>,
) -> Result<GrowthEngine<ChaCha8Rng>, ConfigError> {
    let rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    };
    GrowthEngine::new(cfg, rng)
}

fn to_color32(c: ColorTag) -> egui::Color32 {
    let ch = |v: f32| (v.clamp(0.0, 1.0) * 255.0) as u8;
    egui::Color32::from_rgb(ch(c.r), ch(c.g), ch(c.b))
}

/// The 12 edges of an axis-aligned box with the given half extents.
fn box_edges(h: Vec3) -> [(Vec3, Vec3); 12] {
    let c = |x: f32, y: f32, z: f32| Vec3::new(x * h.x, y * h.y, z * h.z);
    [
        (c(-1.0, -1.0, -1.0), c(1.0, -1.0, -1.0)),
        (c(-1.0, 1.0, -1.0), c(1.0, 1.0, -1.0)),
        (c(-1.0, -1.0, 1.0), c(1.0, -1.0, 1.0)),
        (c(-1.0, 1.0, 1.0), c(1.0, 1.0, 1.0)),
        (c(-1.0, -1.0, -1.0), c(-1.0, 1.0, -1.0)),
        (c(1.0, -1.0, -1.0), c(1.0, 1.0, -1.0)),
        (c(-1.0, -1.0, 1.0), c(-1.0, 1.0, 1.0)),
        (c(1.0, -1.0, 1.0), c(1.0, 1.0, 1.0)),
        (c(-1.0, -1.0, -1.0), c(-1.0, -1.0, 1.0)),
        (c(1.0, -1.0, -1.0), c(1.0, -1.0, 1.0)),
        (c(-1.0, 1.0, -1.0), c(-1.0, 1.0, 1.0)),
        (c(1.0, 1.0, -1.0), c(1.0, 1.0, 1.0)),
    ]
}

impl Viewer {
    /// Creates a viewer with a fresh session built from `cfg`.
    ///
    /// The camera starts looking slightly down onto the box, rotated so
    /// that all three axes are visible.
    ///
    /// ### Errors
    /// Returns the [`ConfigError`] if `cfg` is rejected by the engine.
    pub fn new(cfg: GrowthConfig, seed: Option<u64>) -> Result<Self, ConfigError> {
        let engine = build_engine(cfg, seed)?;

        Ok(Self {
            engine,
            segments: Vec::with_capacity(1024),
            cfg,
            seed: seed.unwrap_or(0),
            use_seed: seed.is_some(),
            last_outcome: None,
            last_error: None,
            config_error: None,
            running: false,
            zoom: 12.0,
            pan: egui::vec2(0.0, 0.0),
            yaw: 0.6,
            pitch: 0.45,
            step_interval: 0.05,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        })
    }

    /// Restarts the current session from the origin.
    ///
    /// Keeps the engine's configuration and camera settings, but clears
    /// the occupancy set, the drawn segments and the last tick result,
    /// and stops auto-running.
    fn reset(&mut self) {
        self.engine.reset();
        self.segments.clear();
        self.last_outcome = None;
        self.last_error = None;
        self.running = false;
    }

    /// Replaces the session with one built from the working config.
    ///
    /// If the config is invalid the current session is left untouched
    /// and the error is kept for display.
    fn apply_config(&mut self) {
        let seed = self.use_seed.then_some(self.seed);
        match build_engine(self.cfg, seed) {
            Ok(engine) => {
                self.engine = engine;
                self.config_error = None;
                self.reset();
            }
            Err(err) => {
                tracing::warn!(%err, "config rejected");
                self.config_error = Some(err.to_string());
            }
        }
    }

    /// Advances the session by a single tick.
    ///
    /// New segments are appended to `segments`. If relocation is
    /// exhausted the error is stored and auto-running stops, since every
    /// further tick would report the same error.
    fn step_once(&mut self) {
        match self.engine.tick(&mut self.segments) {
            Ok(outcome) => {
                self.last_outcome = Some(outcome);
                self.last_error = None;
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                self.running = false;
            }
        }
    }

    /// Camera rotation: yaw about the world y axis, then pitch about x.
    fn view_rotation(&self) -> Mat3 {
        Mat3::from_rotation_x(self.pitch) * Mat3::from_rotation_y(self.yaw)
    }

    /// Projects a world position onto the view plane.
    ///
    /// ### Returns
    /// The view-plane position (y up) and the depth (larger is nearer).
    fn project(&self, p: Vec3) -> (Vec2, f32) {
        let v = self.view_rotation() * p;
        (Vec2::new(v.x, v.y), v.z)
    }

    /// Converts a view-plane position to screen-space.
    ///
    /// Plane coordinates are scaled by `zoom`, offset by `pan`, and then
    /// centered inside the given `rect`. The y-axis is flipped so that
    /// positive y goes up.
    fn plane_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Inverse of [`Viewer::plane_to_screen`] (up to floating point rounding).
    fn screen_to_plane(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec2::new(x, y)
    }

    fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        self.plane_to_screen(self.project(p).0, rect)
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let can_run = !self.engine.is_exhausted();
                if ui
                    .add_enabled(
                        can_run,
                        egui::Button::new(if self.running { "⏸ Pause" } else { "▶ Run" }),
                    )
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.0..=1.0)
                        .speed(0.01),
                );

                if ui.add_enabled(can_run, egui::Button::new("Step")).clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.5..=60.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (timing, counters, session state).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let stats = self.engine.stats();
                ui.label(format!("dt target = {:.3} s", self.step_interval));
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("segments = {}", self.segments.len()));
                ui.label(format!(
                    "cells = {} / {}",
                    self.engine.occupancy().len(),
                    self.engine.lattice().cell_count()
                ));
                ui.label(format!("stalls = {}", stats.stalls));
                ui.label(format!("relocations = {}", stats.relocations));
                ui.separator();
                let state = match self.engine.state() {
                    GrowthState::Initializing => "initializing",
                    GrowthState::Growing => "growing",
                    GrowthState::Relocating => "relocating",
                    GrowthState::Exhausted { .. } => "exhausted",
                };
                ui.label(format!("state = {state}"));
                if let Some(outcome) = self.last_outcome {
                    let text = match outcome {
                        StepOutcome::Started => "started".to_owned(),
                        StepOutcome::Grew => "grew".to_owned(),
                        StepOutcome::Relocated { to, attempts, .. } => {
                            format!("relocated to {to} after {attempts} tries")
                        }
                    };
                    ui.label(text);
                }
                if let Some(err) = &self.last_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });
        });
    }

    /// Builds the right-hand panel for growth and camera parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Lattice");
                Self::labeled_drag_f32(
                    ui,
                    "step_length:",
                    &mut self.cfg.step_length,
                    0.0..=20.0,
                    0.1,
                );

                ui.label("Bounding box");
                Self::labeled_drag_f32(
                    ui,
                    "length (x):",
                    &mut self.cfg.range_length,
                    0.0..=200.0,
                    0.5,
                );
                Self::labeled_drag_f32(
                    ui,
                    "width (y):",
                    &mut self.cfg.range_width,
                    0.0..=200.0,
                    0.5,
                );
                Self::labeled_drag_f32(
                    ui,
                    "height (z):",
                    &mut self.cfg.range_height,
                    0.0..=200.0,
                    0.5,
                );

                ui.separator();
                ui.label("Relocation");
                ui.horizontal(|ui| {
                    ui.label("attempts:");
                    ui.add(
                        egui::DragValue::new(&mut self.cfg.relocation_attempts)
                            .range(0..=10_000)
                            .speed(1.0),
                    );
                });

                ui.separator();
                ui.horizontal(|ui| {
                    ui.checkbox(&mut self.use_seed, "seed:");
                    ui.add_enabled(self.use_seed, egui::DragValue::new(&mut self.seed));
                });

                ui.separator();
                if ui.button("Apply").clicked() {
                    self.apply_config();
                }
                if ui.button("Reset cfg to default").clicked() {
                    self.cfg = GrowthConfig::default();
                }
                if let Some(err) = &self.config_error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }

                ui.separator();
                ui.label("Camera");
                ui.add(egui::Slider::new(&mut self.yaw, -PI..=PI).text("yaw"));
                ui.add(egui::Slider::new(&mut self.pitch, -FRAC_PI_2..=FRAC_PI_2).text("pitch"));
            });
    }

    /// Builds the central panel where the pipes are drawn.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with primary drag, orbit with secondary drag.
            if response.dragged_by(egui::PointerButton::Primary) {
                self.pan += response.drag_delta();
            }
            if response.dragged_by(egui::PointerButton::Secondary) {
                let d = response.drag_delta();
                self.yaw += d.x * 0.01;
                self.pitch = (self.pitch + d.y * 0.01).clamp(-FRAC_PI_2, FRAC_PI_2);
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let plane_before = self.screen_to_plane(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.5, 60.0);

                let screen_after = self.plane_to_screen(plane_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            // Bounding box.
            let box_stroke = egui::Stroke::new(1.0, egui::Color32::from_gray(90));
            let half = self.engine.lattice().bounds().half_extents();
            for (a, b) in box_edges(half) {
                painter.line_segment(
                    [self.world_to_screen(a, rect), self.world_to_screen(b, rect)],
                    box_stroke,
                );
            }

            // Pipes, far to near.
            let lattice = *self.engine.lattice();
            let width = (lattice.step_length() * self.zoom * 0.3).max(1.0);
            let mut order: Vec<(f32, usize)> = self
                .segments
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    let mid = (lattice.to_world(s.start) + lattice.to_world(s.end())) * 0.5;
                    (self.project(mid).1, i)
                })
                .collect();
            order.sort_by(|a, b| a.0.total_cmp(&b.0));

            for (_, i) in order {
                let s = &self.segments[i];
                let a = self.world_to_screen(lattice.to_world(s.start), rect);
                let b = self.world_to_screen(lattice.to_world(s.end()), rect);
                let color = to_color32(s.color);
                painter.line_segment([a, b], egui::Stroke::new(width, color));
                painter.circle_filled(a, width * 0.6, color);
                painter.circle_filled(b, width * 0.6, color);
            }

            // Tip.
            let tip = self.world_to_screen(self.engine.tip_position(), rect);
            painter.circle_stroke(tip, width, egui::Stroke::new(1.5, egui::Color32::WHITE));

            // Auto-run if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    fn viewer() -> Viewer {
        Viewer::new(GrowthConfig::default(), Some(1)).unwrap()
    }

    #[test]
    fn plane_to_screen_and_back_is_roundtrip() {
        let mut viewer = viewer();
        viewer.zoom = 2.0;
        viewer.pan = egui::vec2(15.0, -7.0);
        let rect = test_rect();

        let eps = 1e-4;
        for p in [Vec2::new(0.0, 0.0), Vec2::new(10.0, -5.0), Vec2::new(-3.5, 8.25)] {
            let back = viewer.screen_to_plane(viewer.plane_to_screen(p, rect), rect);
            assert!(
                (back - p).abs().max_element() < eps,
                "roundtrip mismatch: p={p:?}, back={back:?}"
            );
        }
    }

    #[test]
    fn origin_projects_to_rect_center_without_pan() {
        let viewer = viewer();
        let rect = test_rect();
        let p = viewer.world_to_screen(Vec3::ZERO, rect);
        assert!((p - rect.center()).length() < 1e-4);
    }

    #[test]
    fn projection_preserves_length() {
        let viewer = viewer();
        let p = Vec3::new(3.0, -4.0, 12.0);
        let (plane, depth) = viewer.project(p);
        let len = (plane.length_squared() + depth * depth).sqrt();
        assert!((len - 13.0).abs() < 1e-4);
    }

    #[test]
    fn step_once_appends_contiguous_segments() {
        let mut viewer = viewer();
        for _ in 0..10 {
            viewer.step_once();
        }

        assert_eq!(viewer.segments.len(), 10);
        assert_eq!(viewer.segments[0].start, IVec3::ZERO);
        assert_eq!(viewer.segments.last().unwrap().end(), viewer.engine.tip());
        assert!(viewer.last_error.is_none());
        assert!(viewer.last_outcome.is_some());
    }

    #[test]
    fn exhaustion_stops_auto_run() {
        let cfg = GrowthConfig {
            step_length: 2.0,
            range_length: 2.0,
            range_width: 2.0,
            range_height: 2.0,
            relocation_attempts: 10,
        };
        let mut viewer = Viewer::new(cfg, Some(2)).unwrap();
        viewer.running = true;

        viewer.step_once();
        viewer.step_once();

        assert!(viewer.engine.is_exhausted());
        assert!(viewer.last_error.is_some());
        assert!(!viewer.running);
    }

    #[test]
    fn reset_restores_basic_state() {
        let mut viewer = viewer();
        for _ in 0..5 {
            viewer.step_once();
        }
        viewer.running = true;

        viewer.reset();

        assert!(viewer.segments.is_empty());
        assert_eq!(viewer.engine.occupancy().len(), 1);
        assert_eq!(viewer.engine.state(), GrowthState::Initializing);
        assert!(viewer.last_outcome.is_none());
        assert!(!viewer.running);
    }

    #[test]
    fn apply_config_rejects_invalid_and_keeps_session() {
        let mut viewer = viewer();
        for _ in 0..3 {
            viewer.step_once();
        }

        viewer.cfg.step_length = 0.0;
        viewer.apply_config();

        assert!(viewer.config_error.is_some());
        assert_eq!(viewer.segments.len(), 3);
        assert_eq!(viewer.engine.config().step_length, 2.0);
    }

    #[test]
    fn apply_config_rebuilds_session() {
        let mut viewer = viewer();
        viewer.step_once();

        viewer.cfg.range_length = 6.0;
        viewer.use_seed = true;
        viewer.seed = 42;
        viewer.apply_config();

        assert!(viewer.config_error.is_none());
        assert!(viewer.segments.is_empty());
        assert_eq!(viewer.engine.config().range_length, 6.0);
        assert_eq!(viewer.engine.lattice().max_cell().x, 1);
    }

    #[test]
    fn box_edges_have_unit_axis_spans() {
        let h = Vec3::new(1.0, 2.0, 3.0);
        for (a, b) in box_edges(h) {
            let d = (b - a).abs();
            let non_zero = [d.x, d.y, d.z].iter().filter(|&&v| v > 0.0).count();
            assert_eq!(non_zero, 1);
        }
    }

    #[test]
    fn color_conversion_spans_full_range() {
        let c = to_color32(ColorTag {
            r: 0.0,
            g: 0.5,
            b: 0.999,
        });
        assert_eq!(c.r(), 0);
        assert_eq!(c.g(), 127);
        assert_eq!(c.b(), 254);
    }
}
