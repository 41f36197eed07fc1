use crate::{
    config::{ControlMode, ModulatorSettings, ProcessorFunction},
    dsp::{
        random::Random, Envelope, EnvelopeMode, EnvelopeShape, FmLfo, Lfo, ModulationSource,
        MultistageEnvelope, MultistageVariant, Plo, TuringMachine, WsmLfo,
    },
    io::GateFlags,
};

/// One instance of every modulation source, and the knobs that drive the live one.
///
/// Everything is allocated up front; switching function never allocates.
/// Multistage variants get their own instance each so a half-finished
/// envelope on one function does not leak into another.
#[derive(Debug, Clone)]
pub struct Processors {
    function: ProcessorFunction,
    control_mode: ControlMode,
    parameters: [u16; 4],

    envelope: MultistageEnvelope,
    shaped_envelope: Envelope,
    lfo: Lfo,
    tap_lfo: Lfo,
    dual_attack: MultistageEnvelope,
    repeating_attack: MultistageEnvelope,
    looping: MultistageEnvelope,
    randomised: MultistageEnvelope,
    turing: TuringMachine,
    fm_lfo: FmLfo,
    wsm_lfo: WsmLfo,
    plo: Plo,
}

impl Processors {
    pub fn new() -> Self {
        Self::from_seed_source(Random::new)
    }

    /// Reproducible instance: every source draws from its own seeded stream.
    pub fn with_seed(seed: u64) -> Self {
        let mut next = seed;
        Self::from_seed_source(move || {
            next = next.wrapping_add(1);
            Random::with_seed(next)
        })
    }

    fn from_seed_source(mut rng: impl FnMut() -> Random) -> Self {
        let mut processors = Self {
            function: ProcessorFunction::Envelope,
            control_mode: ControlMode::Half,
            parameters: [0; 4],
            envelope: MultistageEnvelope::with_random(MultistageVariant::Standard, rng()),
            shaped_envelope: Envelope::with_random(rng()),
            lfo: Lfo::with_random(rng()),
            tap_lfo: Lfo::with_random(rng()),
            dual_attack: MultistageEnvelope::with_random(MultistageVariant::DualAttack, rng()),
            repeating_attack: MultistageEnvelope::with_random(
                MultistageVariant::RepeatingAttack,
                rng(),
            ),
            looping: MultistageEnvelope::with_random(MultistageVariant::Looping, rng()),
            randomised: MultistageEnvelope::with_random(MultistageVariant::Randomised, rng()),
            turing: TuringMachine::with_random(rng()),
            fm_lfo: FmLfo::with_random(rng()),
            wsm_lfo: WsmLfo::with_random(rng()),
            plo: Plo::with_random(rng()),
        };
        processors.tap_lfo.set_sync(true);
        processors
    }

    /// Switch the live source. It starts from its defaults, except the
    /// clock-following ones, which keep the period they learned.
    pub fn set_function(&mut self, function: ProcessorFunction) {
        if function == self.function {
            return;
        }
        log::debug!("processor function {} -> {}", self.function.name(), function.name());
        self.function = function;

        match function {
            ProcessorFunction::Envelope => self.envelope.init(),
            ProcessorFunction::ShapedEnvelope => self.shaped_envelope.init(),
            ProcessorFunction::Lfo => self.lfo.init(),
            ProcessorFunction::TapLfo | ProcessorFunction::Plo => {}
            ProcessorFunction::DualAttackEnvelope => self.dual_attack.init(),
            ProcessorFunction::RepeatingAttackEnvelope => self.repeating_attack.init(),
            ProcessorFunction::LoopingEnvelope => self.looping.init(),
            ProcessorFunction::RandomisedEnvelope => self.randomised.init(),
            ProcessorFunction::TuringMachine => self.turing.init(),
            ProcessorFunction::FmLfo | ProcessorFunction::RandomFmLfo => {
                self.fm_lfo.init();
                self.fm_lfo
                    .set_random_modulation(function == ProcessorFunction::RandomFmLfo);
            }
            ProcessorFunction::WsmLfo | ProcessorFunction::RandomWsmLfo => {
                self.wsm_lfo.init();
                self.wsm_lfo
                    .set_random_modulation(function == ProcessorFunction::RandomWsmLfo);
            }
        }
        self.configure();
    }

    /// Knob `index` (0..4) moved. Out-of-range indices are ignored.
    pub fn set_parameter(&mut self, index: usize, value: u16) {
        if let Some(slot) = self.parameters.get_mut(index) {
            *slot = value;
            self.configure();
        }
    }

    pub fn set_control_mode(&mut self, control_mode: ControlMode) {
        self.control_mode = control_mode;
        self.configure();
    }

    /// Restore a channel from a settings store.
    pub fn apply_settings(&mut self, settings: &ModulatorSettings) {
        self.parameters = settings.parameters;
        self.control_mode = settings.control_mode;
        self.set_function(settings.function);
        self.configure();
    }

    pub fn settings(&self) -> ModulatorSettings {
        ModulatorSettings {
            function: self.function,
            control_mode: self.control_mode,
            parameters: self.parameters,
        }
    }

    pub fn function(&self) -> ProcessorFunction {
        self.function
    }

    pub fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    pub fn parameters(&self) -> [u16; 4] {
        self.parameters
    }

    /// Learned clock period of the active function, if it follows a clock.
    pub fn period(&self) -> Option<u32> {
        match self.function {
            ProcessorFunction::TapLfo => Some(self.tap_lfo.period()),
            ProcessorFunction::Plo => Some(self.plo.period()),
            _ => None,
        }
    }

    pub fn shaped_envelope(&self) -> &Envelope {
        &self.shaped_envelope
    }

    /// Step the shaped envelope through ADSR, AD and loop.
    pub fn cycle_envelope_mode(&mut self) -> EnvelopeMode {
        let mode = self.shaped_envelope.mode().next();
        self.shaped_envelope.set_mode(mode);
        log::debug!("shaped envelope mode {}", mode.name());
        mode
    }

    /// Step the attack (or, with `attack` false, the decay) curve of the
    /// shaped envelope. Takes effect when that segment next starts.
    pub fn cycle_envelope_shape(&mut self, attack: bool) -> EnvelopeShape {
        let envelope = &mut self.shaped_envelope;
        let (attack_shape, decay_shape) = if attack {
            (envelope.attack_shape().next(), envelope.decay_shape())
        } else {
            (envelope.attack_shape(), envelope.decay_shape().next())
        };
        envelope.set_shapes(attack_shape, decay_shape);
        log::debug!("shaped envelope shapes {} / {}", attack_shape.name(), decay_shape.name());
        if attack {
            attack_shape
        } else {
            decay_shape
        }
    }

    /// Make a new attack of the shaped envelope start from zero.
    pub fn toggle_envelope_hard_reset(&mut self) -> bool {
        let hard_reset = !self.shaped_envelope.hard_reset();
        self.shaped_envelope.set_hard_reset(hard_reset);
        hard_reset
    }

    pub fn turing_mut(&mut self) -> &mut TuringMachine {
        &mut self.turing
    }

    /// Render one sample per gate entry with the active source.
    pub fn process(&mut self, gate: &[GateFlags], out: &mut [i16]) {
        self.active_mut().process(gate, out);
    }

    fn configure(&mut self) {
        let parameters = self.parameters;
        let control_mode = self.control_mode;
        self.active_mut().configure(&parameters, control_mode);
    }

    fn active_mut(&mut self) -> &mut dyn ModulationSource {
        match self.function {
            ProcessorFunction::Envelope => &mut self.envelope,
            ProcessorFunction::ShapedEnvelope => &mut self.shaped_envelope,
            ProcessorFunction::Lfo => &mut self.lfo,
            ProcessorFunction::TapLfo => &mut self.tap_lfo,
            ProcessorFunction::DualAttackEnvelope => &mut self.dual_attack,
            ProcessorFunction::RepeatingAttackEnvelope => &mut self.repeating_attack,
            ProcessorFunction::LoopingEnvelope => &mut self.looping,
            ProcessorFunction::RandomisedEnvelope => &mut self.randomised,
            ProcessorFunction::TuringMachine => &mut self.turing,
            ProcessorFunction::FmLfo | ProcessorFunction::RandomFmLfo => &mut self.fm_lfo,
            ProcessorFunction::WsmLfo | ProcessorFunction::RandomWsmLfo => &mut self.wsm_lfo,
            ProcessorFunction::Plo => &mut self.plo,
        }
    }
}

impl Default for Processors {
    fn default() -> Self {
        Self::new()
    }
}
