//! Free-running and clock-synced low frequency oscillator.

/*
Low Frequency Oscillator
========================

One phase accumulator, one kernel from `dsp::kernels`, and an optional sync
stage that derives the increment from an external clock instead of the rate
knob.

Vocabulary
----------

  rate          16-bit knob, mapped through the exponential rate table
                (1/16 Hz .. ~256 Hz).

  level         Output scale. `set_level` takes a 16-bit knob and keeps
                the top 15 bits, so full scale is 32767.

  reset phase   Where the phase jumps to on a rising gate edge. Lets a
                synced LFO start its cycle anywhere, not only at zero.

  sync counter  Ticks since the last rising edge. It is the raw measured
                clock interval.


Sync
----

With sync off, rising edges only reset the phase. With sync on, each edge
also turns the sync counter into a period:

    counter >= 8 s             implausible, keep the previous period
    edge came from the button  take the counter as is (tap tempo)
    counter < 1920 (40 ms)     audio-rate clock: cheap running average,
                               and do NOT reset phase (it would buzz)
    otherwise                  ask the pattern predictor

    increment = (2^32 - 1) / period

A new increment is only computed when the period actually changed.
*/

use crate::{
    config::ControlMode,
    dsp::{
        kernels::{preset_index, KernelState, LfoShape, LFO_PRESETS},
        pattern_predictor::PatternPredictor,
        phase::PhaseAccumulator,
        random::Random,
        tables::rate_to_increment,
        ModulationSource,
    },
    io::GateFlags,
    SYNC_COUNTER_MAX_TIME,
};

/// Clock intervals shorter than this are averaged rather than predicted.
pub const FAST_CLOCK_TICKS: u32 = 1920;

/// Level used by the knob layouts that don't expose a level control.
pub const DEFAULT_KNOB_LEVEL: u16 = 40960;

/// Increment that wraps the phase once every `period` ticks.
///
/// # Example
/// ```
/// use modcore::dsp::lfo::period_to_increment;
/// assert_eq!(period_to_increment(4), u32::MAX / 4);
/// assert_eq!(period_to_increment(0), u32::MAX);
/// ```
#[inline]
pub fn period_to_increment(period: u32) -> u32 {
    u32::MAX / period.max(1)
}

/// What a rising edge did to the synced period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SyncEdge {
    /// The new period, when it changed.
    pub period: Option<u32>,
    pub reset_phase: bool,
}

/// Interval measurement shared by the synced oscillators.
#[derive(Debug, Clone)]
pub(crate) struct ClockSync {
    counter: u32,
    period: u32,
    predictor: PatternPredictor,
}

impl ClockSync {
    pub fn new() -> Self {
        Self {
            counter: SYNC_COUNTER_MAX_TIME,
            period: 0,
            predictor: PatternPredictor::new(),
        }
    }

    pub fn reset(&mut self) {
        self.counter = SYNC_COUNTER_MAX_TIME;
        self.predictor.reset();
    }

    #[inline]
    pub fn tick(&mut self) {
        self.counter = self.counter.saturating_add(1);
    }

    pub fn edge(&mut self, from_button: bool) -> SyncEdge {
        let mut edge = SyncEdge {
            period: None,
            reset_phase: true,
        };
        if self.counter < SYNC_COUNTER_MAX_TIME {
            let period = if from_button {
                self.counter
            } else if self.counter < FAST_CLOCK_TICKS {
                edge.reset_phase = false;
                (3 * self.period + self.counter) >> 2
            } else {
                self.predictor.predict(self.counter)
            };
            if period != self.period {
                self.period = period;
                edge.period = Some(period);
            }
        }
        self.counter = 0;
        edge
    }

    pub fn period(&self) -> u32 {
        self.period
    }
}

#[derive(Debug, Clone)]
pub struct Lfo {
    rate: u16,
    shape: LfoShape,
    parameter: i16,
    reset_phase: u32,
    level: i32,
    sync: bool,

    clock: ClockSync,
    phase: PhaseAccumulator,
    kernel: KernelState,
}

impl Lfo {
    pub fn new() -> Self {
        Self::with_random(Random::new())
    }

    pub fn with_random(rng: Random) -> Self {
        Self {
            rate: 0,
            shape: LfoShape::Square,
            parameter: 0,
            reset_phase: 0,
            level: 32767,
            sync: false,
            clock: ClockSync::new(),
            phase: PhaseAccumulator::default(),
            kernel: KernelState::new(rng),
        }
    }

    /// Back to power-on defaults. A learned clock period survives.
    pub fn init(&mut self) {
        self.rate = 0;
        self.shape = LfoShape::Square;
        self.parameter = 0;
        self.reset_phase = 0;
        self.level = 32767;
        self.sync = false;
        self.clock.reset();
    }

    pub fn set_rate(&mut self, rate: u16) {
        self.rate = rate;
    }

    pub fn set_shape(&mut self, shape: LfoShape) {
        self.shape = shape;
    }

    pub fn set_shape_integer(&mut self, value: u16) {
        self.shape = LfoShape::from_knob(value);
    }

    pub fn set_parameter(&mut self, parameter: i16) {
        self.parameter = parameter;
    }

    /// One knob over seven (shape, parameter) pairs.
    pub fn set_shape_parameter_preset(&mut self, value: u16) {
        let (shape, parameter) = LFO_PRESETS[preset_index(value)];
        self.shape = shape;
        self.parameter = parameter;
    }

    pub fn set_reset_phase(&mut self, reset_phase: i16) {
        self.reset_phase = (reset_phase as u16 as u32) << 16;
    }

    pub fn set_level(&mut self, level: u16) {
        self.level = (level >> 1) as i32;
    }

    pub fn set_sync(&mut self, sync: bool) {
        if sync && !self.sync {
            log::trace!("lfo sync enabled, predictor reset");
            self.clock.reset();
        }
        self.sync = sync;
    }

    pub fn is_synced(&self) -> bool {
        self.sync
    }

    pub fn rate(&self) -> u16 {
        self.rate
    }

    pub fn shape(&self) -> LfoShape {
        self.shape
    }

    pub fn parameter(&self) -> i16 {
        self.parameter
    }

    /// Learned clock period in ticks (0 until two edges were seen).
    pub fn period(&self) -> u32 {
        self.clock.period()
    }

    pub fn increment(&self) -> u32 {
        self.phase.increment
    }

    pub fn process_one(&mut self, gate: GateFlags) -> i16 {
        if !self.sync {
            self.phase.increment = rate_to_increment(self.rate);
        }
        self.clock.tick();

        if gate.is_rising() {
            let mut reset_phase = true;
            if self.sync {
                let edge = self.clock.edge(gate.from_button());
                if let Some(period) = edge.period {
                    self.phase.increment = period_to_increment(period);
                }
                reset_phase = edge.reset_phase;
            }
            if reset_phase {
                self.phase.reset(self.reset_phase);
            }
        }

        self.phase.tick();
        let sample = self.shape.render(
            &mut self.kernel,
            self.phase.phase,
            self.phase.increment,
            self.parameter,
        );
        (sample as i32 * self.level >> 15) as i16
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new()
    }
}

impl ModulationSource for Lfo {
    fn configure(&mut self, parameters: &[u16; 4], control_mode: ControlMode) {
        let [p0, p1, p2, p3] = *parameters;
        let centred = |value: u16| (value as i32 - 32768) as i16;
        match (control_mode, self.sync) {
            (ControlMode::Half, true) => {
                self.set_shape_integer(p0);
                self.set_parameter(centred(p1));
                self.set_reset_phase(0);
                self.set_level(DEFAULT_KNOB_LEVEL);
            }
            (ControlMode::Half, false) => {
                self.set_rate(p0);
                self.set_shape_parameter_preset(p1);
                self.set_reset_phase(0);
                self.set_level(DEFAULT_KNOB_LEVEL);
            }
            (ControlMode::Full, true) => {
                self.set_level(p0);
                self.set_shape_integer(p1);
                self.set_parameter(centred(p2));
                self.set_reset_phase(centred(p3));
            }
            (ControlMode::Full, false) => {
                self.set_level(DEFAULT_KNOB_LEVEL);
                self.set_rate(p0);
                self.set_shape_integer(p1);
                self.set_parameter(centred(p2));
                self.set_reset_phase(centred(p3));
            }
        }
    }

    fn process_sample(&mut self, gate: GateFlags) -> i16 {
        self.process_one(gate)
    }
}
