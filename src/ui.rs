use crate::audio;
use crate::engine::Simulation;
use crate::error::Result;
use crate::events::EventBrowser;
use crate::export::{self, PARAMS_FILE_NAME, SimulationParams};
use crate::state::{CouplingSource, MIN_NODE_COUNT, SimState, Topology};
use crate::waveform::{Waveform, chirp_mass};
use bevy::prelude::*;
use bevy_egui::{EguiContexts, egui};
use bevy_panorbit_camera::PanOrbitCamera;
use std::path::PathBuf;

pub const METRICS_FILE_NAME: &str = "oscillator_metrics.csv";

/// Node-count slider bounds; the floor matches `SimState::validate`.
pub const NODE_COUNT_RANGE: std::ops::RangeInclusive<usize> = MIN_NODE_COUNT..=500;

#[derive(Resource, Debug, Clone)]
pub struct ChirpPanel {
    pub params: SimulationParams,
    pub volume: f64,
}

impl Default for ChirpPanel {
    fn default() -> Self {
        Self {
            params: SimulationParams::default(),
            volume: 0.35,
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct ExportSettings {
    pub out_dir: PathBuf,
    pub status: Option<String>,
}

impl ExportSettings {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            status: None,
        }
    }

    fn save(&mut self, file_name: &str, bytes: Result<Vec<u8>>, mime: &str) {
        let outcome = bytes.and_then(|b| export::save_bytes(&self.out_dir, file_name, &b, mime));
        self.status = Some(match outcome {
            Ok(place) => format!("Saved {place}"),
            Err(e) => {
                warn!("Export of {} failed: {}", file_name, e);
                format!("Export failed: {e}")
            }
        });
    }
}

pub fn setup_scene(mut commands: Commands) {
    // Lighting
    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            ..default()
        },
        Transform {
            translation: Vec3::new(10.0, 10.0, 10.0),
            rotation: Quat::from_rotation_x(-std::f32::consts::PI / 4.),
            ..default()
        },
    ));

    // Camera
    commands.spawn((
        Transform::from_xyz(0.0, 18.0, 18.0).looking_at(Vec3::ZERO, Vec3::Y),
        PanOrbitCamera {
            focus: Vec3::ZERO,
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        MeshPickingCamera,
    ));
}

pub fn ui_system(
    mut contexts: EguiContexts,
    mut state: ResMut<SimState>,
    mut sim: ResMut<Simulation>,
    mut browser: ResMut<EventBrowser>,
    mut chirp: ResMut<ChirpPanel>,
    mut exports: ResMut<ExportSettings>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        network_window(ctx, &mut state, &mut sim, &mut exports);
        chirp_window(ctx, &mut chirp, &mut exports);
        event_window(ctx, &mut browser);
    }
}

fn network_window(
    ctx: &egui::Context,
    state: &mut SimState,
    sim: &mut Simulation,
    exports: &mut ExportSettings,
) {
    egui::Window::new("Oscillator Controls").show(ctx, |ui| {
        ui.label("Topology Settings");

        let mut count = state.node_count;
        if ui
            .add(egui::Slider::new(&mut count, NODE_COUNT_RANGE).text("Node Count"))
            .changed()
        {
            state.node_count = count;
            state.rebuild_requested = true;
        }

        let mut min_degree = state.min_degree;
        let mut max_degree = state.max_degree;
        let min_changed = ui
            .add(egui::Slider::new(&mut min_degree, 1..=20).text("Min neighbours"))
            .changed();
        let max_changed = ui
            .add(egui::Slider::new(&mut max_degree, 1..=20).text("Max neighbours"))
            .changed();
        if min_changed || max_changed {
            state.min_degree = min_degree.min(max_degree);
            state.max_degree = max_degree.max(min_degree);
            state.rebuild_requested = true;
        }

        ui.horizontal(|ui| {
            let random = ui.radio_value(&mut state.topology, Topology::Random, "Random peers");
            let delaunay = ui.radio_value(&mut state.topology, Topology::Delaunay, "Delaunay");
            if random.changed() || delaunay.changed() {
                state.rebuild_requested = true;
            }
        });

        ui.horizontal(|ui| {
            ui.label("Seed");
            ui.add(egui::DragValue::new(&mut state.seed));
            if ui.button("Regenerate Network").clicked() {
                state.rebuild_requested = true;
            }
        });

        ui.separator();
        ui.label("Dynamics");
        ui.add(egui::Slider::new(&mut state.coupling, 0.0..=2.0).text("Coupling K"));
        ui.add(egui::Slider::new(&mut state.frequency_scale, 0.1..=3.0).text("Frequency scale"));
        ui.add(egui::Slider::new(&mut state.dt, 0.001..=0.1).text("Time step"));

        let mut legacy = state.coupling_source == CouplingSource::Neighbor;
        if ui
            .checkbox(&mut legacy, "Weight pull by neighbour's coefficient")
            .changed()
        {
            state.coupling_source = if legacy {
                CouplingSource::Neighbor
            } else {
                CouplingSource::Own
            };
        }

        ui.separator();
        ui.label("Background Field");
        ui.add(egui::Slider::new(&mut state.diffusion, 0.0..=0.25).text("Diffusion D"));
        ui.add(egui::Slider::new(&mut state.decay, 0.0..=0.1).text("Decay α"));

        ui.separator();
        ui.add(egui::Slider::new(&mut state.rotation_speed, 0.0..=2.0).text("Rotation speed"));

        ui.horizontal(|ui| {
            ui.checkbox(&mut state.paused, "Paused");
            if ui
                .add_enabled(state.paused, egui::Button::new("Step"))
                .clicked()
            {
                manual_step(state, sim);
            }
        });

        ui.separator();
        match sim.metrics.latest() {
            Some(s) => {
                ui.label(format!("t = {:.3}", s.t));
                ui.label(format!("Kuramoto R = {:.4}", s.order_parameter));
                ui.label(format!("Mean amplitude = {:.4}", s.mean_amplitude));
                ui.label(format!("Energy variance = {:.4}", s.energy_variance));
            }
            None => {
                ui.label("No frames yet.");
            }
        }
        ui.label(format!("Field mean = {:.4}", sim.field.mean()));

        if ui.button("Export Metrics (CSV)").clicked() {
            if sim.metrics.is_empty() {
                exports.status = Some("No metrics yet, run the simulation first.".into());
            } else {
                let csv = sim.metrics.to_csv().into_bytes();
                exports.save(METRICS_FILE_NAME, Ok(csv), "text/csv");
            }
        }

        if ui.button("Export Snapshot (JSON)").clicked() {
            let snapshot = sim.snapshot();
            let json = snapshot.to_json().map(String::into_bytes);
            exports.save(&snapshot.file_name(), json, "application/json");
        }

        if let Some(status) = &exports.status {
            ui.small(status);
        }
    });
}

/// Advances one frame on request. Only honoured while paused; otherwise the
/// frame driver already ticks this frame.
pub fn manual_step(state: &SimState, sim: &mut Simulation) -> bool {
    if !state.paused {
        return false;
    }
    sim.tick(&state.step_config());
    true
}

fn chirp_window(ctx: &egui::Context, chirp: &mut ChirpPanel, exports: &mut ExportSettings) {
    egui::Window::new("Chirp Designer").show(ctx, |ui| {
        ui.add(egui::Slider::new(&mut chirp.params.mass_a, 1.0..=100.0).text("Mass A (M☉)"));
        ui.add(egui::Slider::new(&mut chirp.params.mass_b, 1.0..=100.0).text("Mass B (M☉)"));
        ui.add(egui::Slider::new(&mut chirp.params.duration, 0.5..=10.0).text("Duration (s)"));
        ui.add(egui::Slider::new(&mut chirp.volume, 0.05..=1.0).text("Volume"));

        let mc = chirp_mass(chirp.params.mass_a, chirp.params.mass_b);
        ui.label(format!("Chirp mass proxy: {mc:.3}"));

        let wave = Waveform::synthesize(&chirp.params);
        plot_series(ui, &wave.times, &wave.strain, egui::Color32::from_rgb(0, 255, 255));

        ui.horizontal(|ui| {
            if ui.button("Export Parameters (JSON)").clicked() {
                let json = export::to_json(&chirp.params).map(String::into_bytes);
                exports.save(PARAMS_FILE_NAME, json, "application/json");
            }
            if ui.button("Export Chirp (WAV)").clicked() {
                let wav = audio::chirp_wav(&chirp.params, chirp.volume);
                exports.save(audio::WAV_FILE_NAME, wav, "audio/wav");
            }
        });
    });
}

fn event_window(ctx: &egui::Context, browser: &mut EventBrowser) {
    egui::Window::new("Event Browser").show(ctx, |ui| {
        let current = browser
            .selected()
            .map(|e| e.name.clone())
            .unwrap_or_else(|| "Select an event".to_owned());

        let mut picked: Option<String> = None;
        egui::ComboBox::from_label("Event")
            .selected_text(current)
            .show_ui(ui, |ui| {
                for event in browser.catalog().events() {
                    if ui.selectable_label(false, event.name.as_str()).clicked() {
                        picked = Some(event.id.clone());
                    }
                }
            });
        if let Some(id) = picked {
            browser.select(&id);
        }

        if let Some(event) = browser.selected() {
            ui.label(format!("Date: {}", event.date));
            ui.label(format!("Peak frequency: {:.1} Hz", event.frequency));
            if let Some(distance) = event.distance {
                ui.label(format!("Distance: {distance:.0} Mpc"));
            }
            ui.label(event.description.as_str());
        }

        if let Some(plot) = browser.plot() {
            plot_series(ui, &plot.times, &plot.strain, egui::Color32::from_rgb(255, 204, 153));
        }
    });
}

/// Line plot scaled to fit, symmetric about the horizontal midline.
fn plot_series(ui: &mut egui::Ui, xs: &[f64], ys: &[f64], color: egui::Color32) {
    let size = egui::vec2(ui.available_width().max(240.0), 90.0);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.hline(
        rect.x_range(),
        rect.center().y,
        egui::Stroke::new(0.5, egui::Color32::DARK_GRAY),
    );

    if xs.len() < 2 {
        return;
    }
    let x0 = xs[0];
    let width = (xs[xs.len() - 1] - x0).max(1e-12);
    let y_max = ys.iter().fold(0.0f64, |m, y| m.max(y.abs())).max(1e-12);

    let points: Vec<egui::Pos2> = xs
        .iter()
        .zip(ys)
        .map(|(&x, &y)| {
            let fx = ((x - x0) / width) as f32;
            let fy = (0.5 - 0.5 * y / y_max) as f32;
            egui::pos2(
                rect.left() + fx * rect.width(),
                rect.top() + fy * rect.height(),
            )
        })
        .collect();
    painter.add(egui::Shape::line(points, egui::Stroke::new(1.5, color)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_state() -> SimState {
        SimState {
            node_count: 4,
            grid_size: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_manual_step_only_while_paused() {
        let mut state = tiny_state();
        let mut sim = Simulation::from_state(&state);

        assert!(!manual_step(&state, &mut sim));
        assert_eq!(sim.frame, 0);

        state.paused = true;
        assert!(manual_step(&state, &mut sim));
        assert_eq!(sim.frame, 1);
    }

    #[test]
    fn test_node_slider_covers_valid_counts() {
        let smallest = SimState {
            node_count: *NODE_COUNT_RANGE.start(),
            ..Default::default()
        };
        assert!(smallest.validate().is_ok());

        let below = SimState {
            node_count: NODE_COUNT_RANGE.start() - 1,
            ..Default::default()
        };
        assert!(below.validate().is_err());
    }
}
