use crate::dsp::{
    fixed::{crossfade, interpolate1022, interpolate824_u, triangle_phase},
    random::Random,
    tables::{Curve, WAV_FOLD_POWER, WAV_FOLD_SINE, WAV_OVERDRIVE, WAV_SINE},
};

/*
Waveform Kernels
================

A kernel turns `(phase, parameter)` into one signed sample. The LFO family
picks one per sample with a plain `match` on a shape enum, so every kernel is
known at compile time and inlines.

Vocabulary
----------

  parameter   Signed 16-bit, the single timbre knob. Its meaning depends on
              the kernel: fold amount, skew, pulse width, step count, or
              smoothness.

  balance     Q15 crossfade position between the clean and shaped signal.

  gain        How hard a sample is driven into a waveshaper table. 2048 is
              roughly unity, 65535 folds many times.


The Kernels
-----------

  sine      parameter > 0   drive the sine into the sine folder
            parameter < 0   blend toward a cubed multi-fold of a
                            quarter-shifted triangle
            The two halves are deliberately not mirror images.

  triangle  parameter sets where the peak sits. -32768 is a ramp down,
            0 a symmetric triangle, 32767 a ramp up. The slope factors are
            recomputed only when the parameter changes.

  square    parameter sets the pulse width. The threshold is kept at least
            2 * increment away from both rails, otherwise a fast LFO with an
            extreme width would never (or always) cross it.

  steps     a triangle quantised to 2..17 levels.

  noise     a new random target at every period start. parameter < 0 moves
            from held steps to linear ramps, parameter > 0 from linear ramps
            to raised-cosine glides.
*/

const SLOPE_BITS: u32 = 12;
const HALF_PHASE: u32 = 1 << 31;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LfoShape {
    Sine,
    Triangle,
    #[default]
    Square,
    Steps,
    Noise,
}

impl LfoShape {
    pub const ALL: [LfoShape; 5] = [
        LfoShape::Sine,
        LfoShape::Triangle,
        LfoShape::Square,
        LfoShape::Steps,
        LfoShape::Noise,
    ];

    pub fn from_knob(value: u16) -> LfoShape {
        Self::ALL[(value as usize * Self::ALL.len()) >> 16]
    }

    #[inline]
    pub fn render(self, state: &mut KernelState, phase: u32, increment: u32, parameter: i16) -> i16 {
        match self {
            LfoShape::Sine => sine(phase, parameter),
            LfoShape::Triangle => state.triangle(phase, parameter),
            LfoShape::Square => square(phase, increment, parameter),
            LfoShape::Steps => steps(phase, parameter),
            LfoShape::Noise => state.noise(phase, increment, parameter),
        }
    }
}

/// Shapes of the waveshape-modulated LFO and the PLO.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WsmShape {
    FoldedSine,
    FoldedPowerSine,
    OverdrivenSine,
    Triangle,
    #[default]
    Square,
    Noise,
}

impl WsmShape {
    pub const ALL: [WsmShape; 6] = [
        WsmShape::FoldedSine,
        WsmShape::FoldedPowerSine,
        WsmShape::OverdrivenSine,
        WsmShape::Triangle,
        WsmShape::Square,
        WsmShape::Noise,
    ];

    pub fn from_knob(value: u16) -> WsmShape {
        Self::ALL[(value as usize * Self::ALL.len()) >> 16]
    }

    #[inline]
    pub fn render(self, state: &mut KernelState, phase: u32, increment: u32, parameter: i16) -> i16 {
        match self {
            WsmShape::FoldedSine => shaped_sine(phase, parameter, &WAV_FOLD_SINE),
            WsmShape::FoldedPowerSine => folded_power_sine(phase, parameter),
            WsmShape::OverdrivenSine => shaped_sine(phase, parameter, &WAV_OVERDRIVE),
            WsmShape::Triangle => state.triangle(phase, parameter),
            WsmShape::Square => square(phase, increment, parameter),
            WsmShape::Noise => state.noise(phase, increment, parameter),
        }
    }
}

/// (shape, parameter) pairs reachable from a single preset knob.
pub(crate) const LFO_PRESETS: [(LfoShape, i16); 7] = [
    (LfoShape::Sine, 0),
    (LfoShape::Triangle, 0),
    (LfoShape::Triangle, 32767),
    (LfoShape::Square, 0),
    (LfoShape::Steps, 0),
    (LfoShape::Noise, -32767),
    (LfoShape::Noise, 32767),
];

pub(crate) const WSM_PRESETS: [(WsmShape, i16); 7] = [
    (WsmShape::FoldedSine, 0),
    (WsmShape::FoldedPowerSine, 0),
    (WsmShape::OverdrivenSine, 0),
    (WsmShape::Triangle, 0),
    (WsmShape::Triangle, 32767),
    (WsmShape::Square, 0),
    (WsmShape::Noise, -32767),
];

/// Index into a 7-entry preset table from a knob value.
#[inline]
pub(crate) fn preset_index(value: u16) -> usize {
    ((value >> 8) as usize * 7) >> 8
}

/// The stateful part of the kernels: cached triangle slopes and noise targets.
#[derive(Debug, Clone)]
pub struct KernelState {
    previous_parameter: Option<i16>,
    attack_factor: u32,
    decay_factor: u32,
    end_of_attack: u32,

    value: i16,
    next_value: i16,
    rng: Random,
}

impl KernelState {
    pub fn new(rng: Random) -> Self {
        Self {
            previous_parameter: None,
            attack_factor: 0,
            decay_factor: 0,
            end_of_attack: 0,
            value: 0,
            next_value: 0,
            rng,
        }
    }

    pub fn triangle(&mut self, phase: u32, parameter: i16) -> i16 {
        if self.previous_parameter != Some(parameter) {
            self.update_slopes(parameter);
        }

        if phase < self.end_of_attack {
            let skewed = (phase >> SLOPE_BITS).wrapping_mul(self.decay_factor);
            (-32768 + (skewed >> 15).min(65535) as i32) as i16
        } else {
            let skewed = ((phase - self.end_of_attack) >> SLOPE_BITS).wrapping_mul(self.attack_factor);
            (32767 - (skewed >> 15).min(65535) as i32) as i16
        }
    }

    /// Smoothed random: one new target per period.
    pub fn noise(&mut self, phase: u32, increment: u32, parameter: i16) -> i16 {
        if phase < increment {
            self.value = self.next_value;
            self.next_value = self.rng.sample();
        }
        let value = self.value as i32;
        let next = self.next_value as i32;
        let linear = crossfade(value, next, (phase >> 17) as i32);
        let sample = if parameter < 0 {
            crossfade(value, linear, parameter as i32 + 32767)
        } else {
            let raised_cosine = (interpolate824_u(Curve::RaisedCosine.table(), phase) >> 1) as i32;
            let smooth = crossfade(value, next, raised_cosine);
            crossfade(linear, smooth, parameter as i32)
        };
        sample.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }

    fn update_slopes(&mut self, parameter: i16) {
        let slope_offset = (parameter as i32 + 32768) as u32;
        if slope_offset <= 1 {
            self.decay_factor = 32768 << SLOPE_BITS;
            self.attack_factor = 1 << (SLOPE_BITS - 1);
        } else {
            self.decay_factor = (32768 << SLOPE_BITS) / slope_offset;
            self.attack_factor = (32768 << SLOPE_BITS) / (65536 - slope_offset);
        }
        self.end_of_attack = slope_offset << 16;
        self.previous_parameter = Some(parameter);
    }
}

impl Default for KernelState {
    fn default() -> Self {
        Self::new(Random::new())
    }
}

/// Sine with the asymmetric fold control.
pub fn sine(phase: u32, parameter: i16) -> i16 {
    let original = interpolate1022(&WAV_SINE, phase) as i32;
    let sample = if parameter > 0 {
        let gain = fold_gain(parameter);
        let folded = interpolate1022(&WAV_FOLD_SINE, drive(original, gain)) as i32;
        crossfade(original, folded, parameter as i32)
    } else {
        let tri = triangle_phase(phase.wrapping_add(1 << 30));
        let folded = interpolate1022(&WAV_FOLD_POWER, tri) as i32;
        crossfade(original, folded, -(parameter as i32))
    };
    sample as i16
}

pub fn square(phase: u32, increment: u32, parameter: i16) -> i16 {
    if phase < square_threshold(increment, parameter) {
        32767
    } else {
        -32767
    }
}

/// Pulse width threshold, at least `2 * increment` away from both rails.
///
/// When the guard band covers half the cycle the pulse is pinned at 50%.
pub fn square_threshold(increment: u32, parameter: i16) -> u32 {
    let guard = (increment as u64) << 1;
    if guard >= HALF_PHASE as u64 {
        return HALF_PHASE;
    }
    let guard = guard as u32;
    let threshold = ((parameter as i32 + 32768) as u32) << 16;
    if threshold < guard {
        guard
    } else if !threshold < guard {
        !guard
    } else {
        threshold
    }
}

pub fn steps(phase: u32, parameter: i16) -> i16 {
    let levels = 2 + (((parameter as i32 + 32768) * 16) >> 16);
    let scale = 65535 / (levels - 1);
    let tri = triangle_phase(phase);
    let step = ((tri >> 16) as i32 * levels) >> 16;
    (step * scale - 32768) as i16
}

fn fold_gain(parameter: i16) -> i32 {
    2048 + (parameter as i32 * (65535 - 2048) >> 15)
}

/// Scale a sample by `gain` and offset it to index a 1025-entry shaper.
#[inline]
fn drive(sample: i32, gain: i32) -> u32 {
    (sample as i64 * gain as i64 + HALF_PHASE as i64) as u32
}

/// Sine through a waveshaper, crossfaded by the parameter mapped to 0..1.
fn shaped_sine(phase: u32, parameter: i16, shaper: &[i16; 1025]) -> i16 {
    let original = interpolate1022(&WAV_SINE, phase) as i32;
    let balance = (parameter as i32 + 32767) >> 1;
    let shaped = interpolate1022(shaper, drive(original, fold_gain(parameter))) as i32;
    crossfade(original, shaped, balance) as i16
}

fn folded_power_sine(phase: u32, parameter: i16) -> i16 {
    let original = interpolate1022(&WAV_SINE, phase) as i32;
    let balance = (parameter as i32 + 32767) >> 1;
    let tri = triangle_phase(phase.wrapping_add(1 << 30));
    let folded = interpolate1022(&WAV_FOLD_POWER, tri) as i32;
    crossfade(original, folded, balance) as i16
}
