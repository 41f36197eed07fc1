//! Read-only lookup tables.

/*
Lookup Tables
=============

The modulation sources never call transcendental functions per sample. Every
nonlinear mapping is a table built once (on first use) and read with the
fixed-point interpolators in `dsp::fixed`.

Vocabulary
----------

  increment   Phase advance per tick. One period is 2^32 of phase, so a
              period lasts 2^32 / increment ticks.

  rate        A 16-bit knob/CV value. The top 8 bits index the increment
              table, the low 8 bits interpolate between neighbours.

  curve       A 257-entry unsigned table mapping phase (0 to 1) to a blend
              position (0 to 65535). Envelopes pass their segment phase
              through a curve to get their shape.

  waveshaper  A 1025-entry signed table. Oscillator kernels index these with
              a full-range phase or a scaled sample.


Rate Mapping
------------

LFO rates are spaced evenly in octaves: the 256 table steps cover 12
octaves starting at 1/16 Hz, so each knob step is the same musical
interval whether the LFO is crawling or buzzing.

    rate     0  ->   0.0625 Hz
    rate 32768  ->   4 Hz
    rate 65535  -> ~256 Hz

Envelope segment times are spaced the same way over 20 octaves of samples:
index 0 is a single-tick segment, index 256 lasts 2^20 ticks (~21.8 s).
*/

use std::f64::consts::PI;

use once_cell::sync::Lazy;

use crate::SAMPLE_RATE;

const PHASE_RANGE: f64 = 4_294_967_296.0;

const LFO_BASE_FREQUENCY: f64 = 0.0625;
const LFO_OCTAVES: f64 = 12.0;
const ENV_OCTAVES: f64 = 20.0;

/// Gain that makes the fold/overdrive tables unity around the centre at the
/// minimum kernel gain (2048).
const SHAPER_GAIN: f64 = 20.0;

/// Phase increment per LFO rate step (257 entries, monotonic).
pub static LFO_INCREMENTS: Lazy<[u32; 257]> = Lazy::new(|| {
    let mut lut = [0u32; 257];
    for (i, entry) in lut.iter_mut().enumerate() {
        let octave = i as f64 * LFO_OCTAVES / 256.0;
        let frequency = LFO_BASE_FREQUENCY * octave.exp2();
        *entry = (frequency / SAMPLE_RATE as f64 * PHASE_RANGE) as u32;
    }
    lut
});

/// Phase increment per envelope segment time step (257 entries, decreasing).
pub static ENV_INCREMENTS: Lazy<[u32; 257]> = Lazy::new(|| {
    let mut lut = [0u32; 257];
    for (i, entry) in lut.iter_mut().enumerate() {
        let duration = (i as f64 * ENV_OCTAVES / 256.0).exp2();
        *entry = (PHASE_RANGE / duration).min(u32::MAX as f64) as u32;
    }
    lut
});

/// One full sine cycle.
pub static WAV_SINE: Lazy<[i16; 1025]> = Lazy::new(|| {
    build_wave(|u| (2.0 * PI * u).sin())
});

/// Sine wavefolder, indexed by a gain-scaled sample offset by half range.
pub static WAV_FOLD_SINE: Lazy<[i16; 1025]> = Lazy::new(|| {
    build_wave(|u| (0.5 * PI * SHAPER_GAIN * (2.0 * u - 1.0)).sin())
});

/// Cubed multi-fold curve, indexed by a phase-derived triangle.
pub static WAV_FOLD_POWER: Lazy<[i16; 1025]> = Lazy::new(|| {
    build_wave(|u| (2.5 * PI * (2.0 * u - 1.0)).sin().powi(3))
});

/// Soft clipper, indexed like the sine folder.
pub static WAV_OVERDRIVE: Lazy<[i16; 1025]> = Lazy::new(|| {
    build_wave(|u| (SHAPER_GAIN * (2.0 * u - 1.0)).tanh())
});

/// Segment and interpolation shapes usable through `interpolate824_u`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Linear,
    Exponential,
    Quartic,
    RaisedCosine,
    /// Overshoots twice before settling ("wiggly").
    Folded,
    /// Steep sigmoid, close to a rounded square step.
    SCurve,
}

static CURVE_LINEAR: Lazy<[u16; 257]> = Lazy::new(|| build_curve(|x| x));
static CURVE_EXPONENTIAL: Lazy<[u16; 257]> =
    Lazy::new(|| build_curve(|x| (1.0 - (-4.0 * x).exp()) / (1.0 - (-4.0f64).exp())));
static CURVE_QUARTIC: Lazy<[u16; 257]> = Lazy::new(|| build_curve(|x| x.powi(4)));
static CURVE_RAISED_COSINE: Lazy<[u16; 257]> =
    Lazy::new(|| build_curve(|x| 0.5 - 0.5 * (PI * x).cos()));
static CURVE_FOLDED: Lazy<[u16; 257]> =
    Lazy::new(|| build_curve(|x| 0.5 - 0.5 * (3.0 * PI * x).cos()));
static CURVE_S: Lazy<[u16; 257]> =
    Lazy::new(|| build_curve(|x| 0.5 + 0.5 * (6.0 * (x - 0.5)).tanh() / 3.0f64.tanh()));

impl Curve {
    pub fn table(self) -> &'static [u16; 257] {
        match self {
            Curve::Linear => &CURVE_LINEAR,
            Curve::Exponential => &CURVE_EXPONENTIAL,
            Curve::Quartic => &CURVE_QUARTIC,
            Curve::RaisedCosine => &CURVE_RAISED_COSINE,
            Curve::Folded => &CURVE_FOLDED,
            Curve::SCurve => &CURVE_S,
        }
    }
}

/// Map a 16-bit rate to a phase increment, interpolating between the two
/// nearest table entries.
#[inline]
pub fn rate_to_increment(rate: u16) -> u32 {
    let index = (rate >> 8) as usize;
    let a = LFO_INCREMENTS[index];
    let b = LFO_INCREMENTS[index + 1];
    a + (((b - a) >> 1) * (rate & 0xff) as u32 >> 7)
}

/// Phase increment for an envelope segment time knob.
#[inline]
pub fn time_to_increment(time: u16) -> u32 {
    ENV_INCREMENTS[(time >> 8) as usize]
}

/// Force every table to build. Call once at startup so the first render
/// does not pay for it.
pub fn warm_up() {
    Lazy::force(&LFO_INCREMENTS);
    Lazy::force(&ENV_INCREMENTS);
    Lazy::force(&WAV_SINE);
    Lazy::force(&WAV_FOLD_SINE);
    Lazy::force(&WAV_FOLD_POWER);
    Lazy::force(&WAV_OVERDRIVE);
    for curve in [
        Curve::Linear,
        Curve::Exponential,
        Curve::Quartic,
        Curve::RaisedCosine,
        Curve::Folded,
        Curve::SCurve,
    ] {
        curve.table();
    }
}

fn build_wave(f: impl Fn(f64) -> f64) -> [i16; 1025] {
    let mut lut = [0i16; 1025];
    for (i, entry) in lut.iter_mut().enumerate() {
        let u = i as f64 / 1024.0;
        *entry = (f(u).clamp(-1.0, 1.0) * 32767.0).round() as i16;
    }
    lut
}

fn build_curve(f: impl Fn(f64) -> f64) -> [u16; 257] {
    let mut lut = [0u16; 257];
    for (i, entry) in lut.iter_mut().enumerate() {
        let x = i as f64 / 256.0;
        *entry = (f(x).clamp(0.0, 1.0) * 65535.0).round() as u16;
    }
    lut
}
