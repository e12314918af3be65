//! Audible rendition of the inspiral chirp, encoded as 16-bit mono WAV.

use crate::error::Result;
use crate::export::SimulationParams;
use crate::waveform::InspiralChirp;
use std::f64::consts::TAU;
use std::io::Cursor;

pub const SAMPLE_RATE: u32 = 44_100;
pub const WAV_FILE_NAME: &str = "chirp.wav";

/// Samples of the chirp played over `params.duration` seconds, normalised
/// so the loudest sample has magnitude `volume`.
pub fn render_chirp(params: &SimulationParams, volume: f64, sample_rate: u32) -> Vec<f64> {
    let chirp = InspiralChirp::synthesize(params, 2);
    let count = (sample_rate as f64 * params.duration).max(0.0) as usize;
    let rate = sample_rate as f64;

    let mut samples: Vec<f64> = (0..count)
        .map(|i| {
            let t = i as f64 / rate;
            let u = t / params.duration;
            (TAU * chirp.frequency_at(u) * t).sin() * chirp.envelope_at(u)
        })
        .collect();

    let peak = samples.iter().fold(0.0f64, |m, s| m.max(s.abs()));
    let gain = volume / (peak + 1e-12);
    for s in &mut samples {
        *s *= gain;
    }
    samples
}

/// WAV bytes for the given samples. Values are clamped to `[-1, 1]`.
pub fn encode_wav(samples: &[f64], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            let quantized = (s.clamp(-1.0, 1.0) * i16::MAX as f64) as i16;
            writer.write_sample(quantized)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

pub fn chirp_wav(params: &SimulationParams, volume: f64) -> Result<Vec<u8>> {
    encode_wav(&render_chirp(params, volume, SAMPLE_RATE), SAMPLE_RATE)
}
