use crate::{
    config::ControlMode,
    dsp::{
        fixed::interpolate1022,
        kernels::{preset_index, KernelState, WsmShape, WSM_PRESETS},
        lfo::{period_to_increment, ClockSync},
        phase::PhaseAccumulator,
        random::Random,
        tables::{rate_to_increment, WAV_SINE},
        ModulationSource,
    },
    io::GateFlags,
};

/*
Phase-Locked Oscillator
=======================

An oscillator that is always synced: the clock interval, smoothed by the
same machinery as the synced LFO, sets the base period, and a pitch knob
moves it by whole octaves so a slow clock can drive an audible tone.

    increment = ((2^32 - 1) / period) << octaves      octaves in -4..=3

Unlike the LFO, rising edges never jump the phase: the oscillator glides
onto the new period instead of clicking.

An optional internal sine sweeps the waveshape parameter when its depth is
non-zero.
*/

const MIN_OCTAVE: i32 = -4;
const MAX_OCTAVE: i32 = 3;

#[derive(Debug, Clone)]
pub struct Plo {
    shape: WsmShape,
    parameter: i16,
    pitch_multiplier: i32,
    base_increment: u32,

    wsm_rate: u16,
    wsm_depth: u16,
    wsm_phase: PhaseAccumulator,

    clock: ClockSync,
    phase: PhaseAccumulator,
    kernel: KernelState,
}

impl Plo {
    pub fn new() -> Self {
        Self::with_random(Random::new())
    }

    pub fn with_random(rng: Random) -> Self {
        Self {
            shape: WsmShape::Square,
            parameter: 0,
            pitch_multiplier: 0,
            base_increment: 0,
            wsm_rate: 0,
            wsm_depth: 0,
            wsm_phase: PhaseAccumulator::default(),
            clock: ClockSync::new(),
            phase: PhaseAccumulator::default(),
            kernel: KernelState::new(rng),
        }
    }

    pub fn set_shape(&mut self, shape: WsmShape) {
        self.shape = shape;
    }

    pub fn set_parameter(&mut self, parameter: i16) {
        self.parameter = parameter;
    }

    pub fn set_shape_parameter_preset(&mut self, value: u16) {
        let (shape, parameter) = WSM_PRESETS[preset_index(value)];
        self.shape = shape;
        self.parameter = parameter;
    }

    /// Octave shift from a knob: centre is 0, clamped to -4..=3.
    pub fn set_pitch_coefficient(&mut self, value: u16) {
        self.pitch_multiplier = ((value as i32 - 32767) >> 13).clamp(MIN_OCTAVE, MAX_OCTAVE);
    }

    pub fn set_wsm_rate(&mut self, rate: u16) {
        self.wsm_rate = rate;
    }

    pub fn set_wsm_depth(&mut self, depth: u16) {
        self.wsm_depth = depth;
    }

    pub fn pitch_multiplier(&self) -> i32 {
        self.pitch_multiplier
    }

    pub fn period(&self) -> u32 {
        self.clock.period()
    }

    pub fn increment(&self) -> u32 {
        self.phase.increment
    }

    pub fn shape(&self) -> WsmShape {
        self.shape
    }

    pub fn process_one(&mut self, gate: GateFlags) -> i16 {
        if self.wsm_depth != 0 {
            self.wsm_phase.increment = rate_to_increment(self.wsm_rate);
            self.wsm_phase.tick();
            let sine = interpolate1022(&WAV_SINE, self.wsm_phase.phase) as i32;
            self.parameter = ((sine * self.wsm_depth as i32) >> 16) as i16;
        }

        self.clock.tick();
        if gate.is_rising() {
            if let Some(period) = self.clock.edge(false).period {
                self.base_increment = period_to_increment(period);
            }
        }

        self.phase.increment = shift_octaves(self.base_increment, self.pitch_multiplier);
        self.phase.tick();
        self.shape.render(
            &mut self.kernel,
            self.phase.phase,
            self.phase.increment,
            self.parameter,
        )
    }
}

impl Default for Plo {
    fn default() -> Self {
        Self::new()
    }
}

impl ModulationSource for Plo {
    fn configure(&mut self, parameters: &[u16; 4], control_mode: ControlMode) {
        let [p0, p1, p2, p3] = *parameters;
        self.set_pitch_coefficient(p0);
        self.set_shape_parameter_preset(p1);
        if control_mode == ControlMode::Full {
            self.set_wsm_rate(p2);
            self.set_wsm_depth(p3);
        }
    }

    fn process_sample(&mut self, gate: GateFlags) -> i16 {
        self.process_one(gate)
    }
}

fn shift_octaves(increment: u32, octaves: i32) -> u32 {
    if octaves < 0 {
        increment >> (-octaves) as u32
    } else {
        increment.saturating_mul(1 << octaves as u32)
    }
}
