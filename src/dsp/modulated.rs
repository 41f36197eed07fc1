//! LFOs cross-modulated by a second, internal LFO.
//!
//! The secondary oscillator runs first on every tick. `FmLfo` adds its output
//! to the primary's rate before the increment lookup; `WsmLfo` uses it as the
//! primary's waveshape parameter, so the timbre itself oscillates. Both have
//! a "random" flavour where the secondary is smoothed noise instead of a
//! (folded) sine.

use crate::{
    config::ControlMode,
    dsp::{
        kernels::{self, preset_index, KernelState, LfoShape, WsmShape, LFO_PRESETS, WSM_PRESETS},
        phase::PhaseAccumulator,
        random::Random,
        tables::rate_to_increment,
        ModulationSource,
    },
    io::GateFlags,
};

/// Fold amount used for the secondary when its depth knob is past centre.
const FOLDED_SECONDARY: i16 = 16383;

/// The internal modulating oscillator.
#[derive(Debug, Clone)]
struct Secondary {
    rate: u16,
    depth: i32,
    parameter: i16,
    random: bool,
    phase: PhaseAccumulator,
    kernel: KernelState,
}

impl Secondary {
    fn new(rng: Random) -> Self {
        Self {
            rate: 0,
            depth: 0,
            parameter: 0,
            random: false,
            phase: PhaseAccumulator::default(),
            kernel: KernelState::new(rng),
        }
    }

    /// Below centre: plain sine, deeper toward zero. Above: folded sine,
    /// deeper toward full scale.
    fn set_depth_knob(&mut self, depth: u16) {
        if depth < 32768 {
            self.depth = (32767 - depth as i32) << 1;
            self.parameter = 0;
        } else {
            self.depth = (depth as i32 - 32768) << 1;
            self.parameter = FOLDED_SECONDARY;
        }
    }

    fn tick(&mut self, rising: bool) -> i32 {
        self.phase.increment = rate_to_increment(self.rate);
        if rising {
            self.phase.reset(0);
        }
        self.phase.tick();
        let sample = if self.random {
            self.kernel
                .noise(self.phase.phase, self.phase.increment, self.parameter)
        } else {
            kernels::sine(self.phase.phase, self.parameter)
        };
        sample as i32
    }
}

/// LFO whose rate is swept by the secondary oscillator.
#[derive(Debug, Clone)]
pub struct FmLfo {
    rate: u16,
    shape: LfoShape,
    parameter: i16,
    reset_phase: u32,
    level: i32,
    phase: PhaseAccumulator,
    kernel: KernelState,
    secondary: Secondary,
    modulated_rate: u16,
}

impl FmLfo {
    pub fn new() -> Self {
        Self::with_random(Random::new())
    }

    pub fn with_random(mut rng: Random) -> Self {
        let secondary = Secondary::new(Random::with_seed(rng.word() as u64));
        Self {
            rate: 0,
            shape: LfoShape::Square,
            parameter: 0,
            reset_phase: 0,
            level: 32767,
            phase: PhaseAccumulator::default(),
            kernel: KernelState::new(rng),
            secondary,
            modulated_rate: 0,
        }
    }

    pub fn init(&mut self) {
        self.rate = 0;
        self.shape = LfoShape::Square;
        self.parameter = 0;
        self.reset_phase = 0;
        self.level = 32767;
        self.secondary.rate = 0;
        self.secondary.depth = 0;
        self.secondary.parameter = 0;
    }

    pub fn set_rate(&mut self, rate: u16) {
        self.rate = rate;
    }

    pub fn set_shape(&mut self, shape: LfoShape) {
        self.shape = shape;
    }

    pub fn set_parameter(&mut self, parameter: i16) {
        self.parameter = parameter;
    }

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

    pub fn set_fm_rate(&mut self, rate: u16) {
        self.secondary.rate = rate;
    }

    pub fn set_fm_depth(&mut self, depth: u16) {
        self.secondary.set_depth_knob(depth);
    }

    /// Swap the secondary sine for smoothed random.
    pub fn set_random_modulation(&mut self, random: bool) {
        self.secondary.random = random;
    }

    pub fn shape(&self) -> LfoShape {
        self.shape
    }

    /// Rate after modulation on the last tick.
    pub fn modulated_rate(&self) -> u16 {
        self.modulated_rate
    }

    pub fn process_one(&mut self, gate: GateFlags) -> i16 {
        let rising = gate.is_rising();
        let modulation = self.secondary.tick(rising);
        let delta = (modulation * self.secondary.depth) >> 18;
        self.modulated_rate = (self.rate as i32 + delta).clamp(0, u16::MAX as i32) as u16;
        self.phase.increment = rate_to_increment(self.modulated_rate);

        if rising {
            self.phase.reset(self.reset_phase);
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

impl Default for FmLfo {
    fn default() -> Self {
        Self::new()
    }
}

impl ModulationSource for FmLfo {
    fn configure(&mut self, parameters: &[u16; 4], control_mode: ControlMode) {
        let [p0, p1, p2, p3] = *parameters;
        self.set_level(u16::MAX);
        self.set_rate(p0);
        self.set_shape_parameter_preset(p1);
        match control_mode {
            ControlMode::Half => self.set_reset_phase(0),
            ControlMode::Full => {
                self.set_fm_rate(p2);
                self.set_fm_depth(p3);
            }
        }
    }

    fn process_sample(&mut self, gate: GateFlags) -> i16 {
        self.process_one(gate)
    }
}

/// LFO whose waveshape parameter is driven by the secondary oscillator.
#[derive(Debug, Clone)]
pub struct WsmLfo {
    rate: u16,
    shape: WsmShape,
    parameter: i16,
    reset_phase: u32,
    phase: PhaseAccumulator,
    kernel: KernelState,
    secondary: Secondary,
}

impl WsmLfo {
    pub fn new() -> Self {
        Self::with_random(Random::new())
    }

    pub fn with_random(mut rng: Random) -> Self {
        let secondary = Secondary::new(Random::with_seed(rng.word() as u64));
        Self {
            rate: 0,
            shape: WsmShape::Square,
            parameter: 0,
            reset_phase: 0,
            phase: PhaseAccumulator::default(),
            kernel: KernelState::new(rng),
            secondary,
        }
    }

    pub fn init(&mut self) {
        self.rate = 0;
        self.shape = WsmShape::Square;
        self.parameter = 0;
        self.reset_phase = 0;
        self.secondary.rate = 0;
        self.secondary.depth = 0;
        self.secondary.parameter = 0;
    }

    pub fn set_rate(&mut self, rate: u16) {
        self.rate = rate;
    }

    pub fn set_shape(&mut self, shape: WsmShape) {
        self.shape = shape;
    }

    pub fn set_shape_parameter_preset(&mut self, value: u16) {
        let (shape, parameter) = WSM_PRESETS[preset_index(value)];
        self.shape = shape;
        self.parameter = parameter;
    }

    pub fn set_reset_phase(&mut self, reset_phase: i16) {
        self.reset_phase = (reset_phase as u16 as u32) << 16;
    }

    pub fn set_wsm_rate(&mut self, rate: u16) {
        self.secondary.rate = rate;
    }

    pub fn set_wsm_depth(&mut self, depth: u16) {
        self.secondary.set_depth_knob(depth);
    }

    pub fn set_random_modulation(&mut self, random: bool) {
        self.secondary.random = random;
    }

    pub fn shape(&self) -> WsmShape {
        self.shape
    }

    /// The parameter the secondary produced on the last tick.
    pub fn parameter(&self) -> i16 {
        self.parameter
    }

    pub fn process_one(&mut self, gate: GateFlags) -> i16 {
        let rising = gate.is_rising();
        let modulation = self.secondary.tick(rising);
        self.parameter = ((modulation * self.secondary.depth) >> 16) as i16;
        self.phase.increment = rate_to_increment(self.rate);

        if rising {
            self.phase.reset(self.reset_phase);
        }
        self.phase.tick();
        self.shape.render(
            &mut self.kernel,
            self.phase.phase,
            self.phase.increment,
            self.parameter,
        )
    }
}

impl Default for WsmLfo {
    fn default() -> Self {
        Self::new()
    }
}

impl ModulationSource for WsmLfo {
    fn configure(&mut self, parameters: &[u16; 4], control_mode: ControlMode) {
        let [p0, p1, p2, p3] = *parameters;
        self.set_rate(p0);
        self.set_shape_parameter_preset(p1);
        self.set_reset_phase(0);
        if control_mode == ControlMode::Full {
            self.set_wsm_rate(p2);
            self.set_wsm_depth(p3);
        }
    }

    fn process_sample(&mut self, gate: GateFlags) -> i16 {
        self.process_one(gate)
    }
}
