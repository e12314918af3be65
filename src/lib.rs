//! Coupled phase oscillators over a diffusing background field, rendered
//! with Bevy, plus a small gravitational-wave event browser and chirp
//! designer.
//!
//! The simulation core ([`oscillator`], [`field`], [`engine`]) has no
//! dependency on a window and is driven the same way by the Bevy frame
//! loop and by the headless command-line mode.

pub mod audio;
pub mod cli;
pub mod engine;
pub mod error;
pub mod events;
pub mod export;
pub mod field;
pub mod metrics;
pub mod oscillator;
pub mod scene;
pub mod state;
pub mod ui;
pub mod waveform;
