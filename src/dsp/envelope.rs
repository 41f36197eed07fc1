use crate::{
    config::ControlMode,
    dsp::{
        fixed::{interpolate824_u, mix},
        random::Random,
        tables::{time_to_increment, Curve},
        ModulationSource,
    },
    io::GateFlags,
};

/*
Segment Envelope Automaton
==========================

A five-segment envelope timed entirely by phase accumulator overflow. There
is no sample counter and no "has the level reached the target yet" test:
each segment lasts exactly ceil(2^32 / increment) ticks.

Vocabulary
----------

  segment     Attack, Decay, Sustain, Release or Dead. Each has a target
              (the level it ends on) and an increment (how fast it gets
              there). Sustain and Dead have zero increment so they hold.

  start/end   Interpolation endpoints latched when a segment begins. The
              start is whatever the output was at that instant, so a
              retrigger halfway through a release does not click.

  shape       The curve the segment phase is pushed through before blending
              start into end. Random shapes draw their end (or a flat jump
              value) once, when the segment starts.

  mode        Adsr honours gate release, Ad ignores it and decays to zero,
              Loop cycles attack and decay forever (envelope as LFO).


The Shape of One Segment
------------------------

    value = mix(start, end, curve(phase))

    end   ┤           ___....------
          │      _.-''
          │   .-'             exponential: fast at first, settles late
          │  /
    start ┼-'─────────────────────────→ phase
          0                          2^32 (overflow: next segment)


Timing
------

    render():
        phase += increment[segment]
        if phase < increment[segment]:       # overflowed
            value = end
            trigger(next segment)
        value = mix(start, end, curve(phase))

    Adsr/Ad:  Attack → Decay → Sustain (holds) ... Release → Dead
    Loop:     Attack → Decay → Attack → Decay → ...

In loop mode a gate release or a stray Sustain/Dead segment is kicked
straight back into Attack on the next tick.
*/

/// Envelope segments in the order they normally play.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    Attack,
    Decay,
    Sustain,
    Release,
    Dead,
}

impl Segment {
    const COUNT: usize = 5;

    #[inline]
    fn index(self) -> usize {
        self as usize
    }

    fn next(self) -> Segment {
        match self {
            Segment::Attack => Segment::Decay,
            Segment::Decay => Segment::Sustain,
            Segment::Sustain => Segment::Release,
            Segment::Release | Segment::Dead => Segment::Dead,
        }
    }
}

/// Per-segment curve for the attack and decay segments.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvelopeShape {
    #[default]
    Exponential,
    Linear,
    Quartic,
    /// Overshoots on the way ("wiggly").
    Folded,
    /// Rounded square step.
    SCurve,
    /// Eases toward a random target drawn at segment start.
    RandomExponential,
    RandomLinear,
    /// Jumps to a random level for the whole segment.
    RandomJump,
}

impl EnvelopeShape {
    pub const ALL: [EnvelopeShape; 8] = [
        EnvelopeShape::Exponential,
        EnvelopeShape::Linear,
        EnvelopeShape::Quartic,
        EnvelopeShape::Folded,
        EnvelopeShape::SCurve,
        EnvelopeShape::RandomExponential,
        EnvelopeShape::RandomLinear,
        EnvelopeShape::RandomJump,
    ];

    /// Pick a shape from a knob value.
    pub fn from_knob(value: u16) -> EnvelopeShape {
        let index = (value as usize * Self::ALL.len()) >> 16;
        Self::ALL[index]
    }

    /// Next shape in knob order, wrapping.
    pub fn next(self) -> EnvelopeShape {
        let index = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            EnvelopeShape::Exponential => "exp",
            EnvelopeShape::Linear => "lin",
            EnvelopeShape::Quartic => "quartic",
            EnvelopeShape::Folded => "folded",
            EnvelopeShape::SCurve => "s-curve",
            EnvelopeShape::RandomExponential => "rnd exp",
            EnvelopeShape::RandomLinear => "rnd lin",
            EnvelopeShape::RandomJump => "rnd jump",
        }
    }

    fn is_random_target(self) -> bool {
        matches!(
            self,
            EnvelopeShape::RandomExponential | EnvelopeShape::RandomLinear
        )
    }

    /// Blend position for a segment phase. `None` means "hold the value".
    fn position(self, phase: u32) -> Option<u16> {
        match self {
            EnvelopeShape::Linear | EnvelopeShape::RandomLinear => Some((phase >> 16) as u16),
            EnvelopeShape::Exponential | EnvelopeShape::RandomExponential => {
                Some(interpolate824_u(Curve::Exponential.table(), phase))
            }
            EnvelopeShape::Quartic => Some(interpolate824_u(Curve::Quartic.table(), phase)),
            EnvelopeShape::Folded => Some(interpolate824_u(Curve::Folded.table(), phase)),
            EnvelopeShape::SCurve => Some(interpolate824_u(Curve::SCurve.table(), phase)),
            EnvelopeShape::RandomJump => None,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvelopeMode {
    #[default]
    Adsr,
    Ad,
    Loop,
}

impl EnvelopeMode {
    pub fn next(self) -> EnvelopeMode {
        match self {
            EnvelopeMode::Adsr => EnvelopeMode::Ad,
            EnvelopeMode::Ad => EnvelopeMode::Loop,
            EnvelopeMode::Loop => EnvelopeMode::Adsr,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EnvelopeMode::Adsr => "adsr",
            EnvelopeMode::Ad => "ad",
            EnvelopeMode::Loop => "loop",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Envelope {
    target: [u16; Segment::COUNT],
    increment: [u32; Segment::COUNT],
    sustain_level: u16,

    segment: Segment,
    phase: u32,
    start: u16,
    end: u16,
    value: u16,

    attack_shape: EnvelopeShape,
    decay_shape: EnvelopeShape,
    mode: EnvelopeMode,
    hard_reset: bool,
    rng: Random,
}

impl Envelope {
    pub fn new() -> Self {
        Self::with_random(Random::new())
    }

    pub fn with_random(rng: Random) -> Self {
        let mut envelope = Self {
            target: [u16::MAX, 0, 0, 0, 0],
            increment: [0; Segment::COUNT],
            sustain_level: 0,
            segment: Segment::Dead,
            phase: 0,
            start: 0,
            end: 0,
            value: 0,
            attack_shape: EnvelopeShape::Linear,
            decay_shape: EnvelopeShape::Exponential,
            mode: EnvelopeMode::Adsr,
            hard_reset: false,
            rng,
        };
        envelope.init();
        envelope
    }

    /// Default times and shapes, output silent. The random source is kept.
    pub fn init(&mut self) {
        self.segment = Segment::Dead;
        self.phase = 0;
        self.start = 0;
        self.end = 0;
        self.value = 0;
        self.attack_shape = EnvelopeShape::Linear;
        self.decay_shape = EnvelopeShape::Exponential;
        self.mode = EnvelopeMode::Adsr;
        self.hard_reset = false;
        self.update(0, 0x8000, 0, 0x8000);
    }

    /// Recompute targets and increments from the four knob values.
    ///
    /// Times go through the envelope time table; `sustain` is a level.
    pub fn update(&mut self, attack: u16, decay: u16, sustain: u16, release: u16) {
        self.increment[Segment::Attack.index()] = time_to_increment(attack);
        self.increment[Segment::Decay.index()] = time_to_increment(decay);
        self.increment[Segment::Release.index()] = time_to_increment(release);
        self.sustain_level = sustain;
        self.refresh_targets();
    }

    /// Jump to `segment`, latching the current output as the start point.
    pub fn trigger(&mut self, segment: Segment) {
        if segment == Segment::Dead || (self.hard_reset && segment == Segment::Attack) {
            self.value = 0;
        }
        self.start = self.value;
        self.end = self.target[segment.index()];
        self.segment = segment;
        self.phase = 0;

        if let Some(shape) = self.shape_for(segment) {
            if shape.is_random_target() {
                self.end = (self.rng.word() >> 16) as u16;
            } else if shape == EnvelopeShape::RandomJump {
                self.value = (self.rng.word() >> 16) as u16;
            }
        }
    }

    /// Advance one tick and return the new level.
    pub fn render(&mut self) -> u16 {
        let increment = self.increment[self.segment.index()];

        if self.mode == EnvelopeMode::Loop && self.segment > Segment::Decay {
            self.trigger(Segment::Attack);
        } else {
            self.phase = self.phase.wrapping_add(increment);
            if self.phase < increment {
                self.value = self.end;
                let next = match (self.mode, self.segment) {
                    (EnvelopeMode::Loop, Segment::Decay) => Segment::Attack,
                    (_, segment) => segment.next(),
                };
                self.trigger(next);
            }
        }

        if self.increment[self.segment.index()] != 0 {
            let shape = self.shape_for(self.segment).unwrap_or(EnvelopeShape::Exponential);
            if let Some(position) = shape.position(self.phase) {
                self.value = mix(self.start, self.end, position);
            }
        }
        self.value
    }

    /// Apply gate edges, then render one tick.
    pub fn process_one(&mut self, gate: GateFlags) -> u16 {
        if gate.is_rising() {
            self.trigger(Segment::Attack);
        } else if gate.is_falling() && self.mode == EnvelopeMode::Adsr {
            self.trigger(Segment::Release);
        }
        self.render()
    }

    pub fn set_shapes(&mut self, attack: EnvelopeShape, decay: EnvelopeShape) {
        self.attack_shape = attack;
        self.decay_shape = decay;
    }

    pub fn set_mode(&mut self, mode: EnvelopeMode) {
        self.mode = mode;
        self.refresh_targets();
    }

    /// When set, a new attack always starts from zero instead of the current level.
    pub fn set_hard_reset(&mut self, hard_reset: bool) {
        self.hard_reset = hard_reset;
    }

    pub fn attack_shape(&self) -> EnvelopeShape {
        self.attack_shape
    }

    pub fn decay_shape(&self) -> EnvelopeShape {
        self.decay_shape
    }

    pub fn hard_reset(&self) -> bool {
        self.hard_reset
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn start_value(&self) -> u16 {
        self.start
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn mode(&self) -> EnvelopeMode {
        self.mode
    }

    pub fn increment(&self, segment: Segment) -> u32 {
        self.increment[segment.index()]
    }

    fn refresh_targets(&mut self) {
        let sustain = match self.mode {
            EnvelopeMode::Adsr => self.sustain_level,
            EnvelopeMode::Ad | EnvelopeMode::Loop => 0,
        };
        self.target[Segment::Decay.index()] = sustain;
        self.target[Segment::Sustain.index()] = sustain;
    }

    fn shape_for(&self, segment: Segment) -> Option<EnvelopeShape> {
        match segment {
            Segment::Attack => Some(self.attack_shape),
            Segment::Decay => Some(self.decay_shape),
            _ => None,
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

impl ModulationSource for Envelope {
    fn configure(&mut self, parameters: &[u16; 4], control_mode: ControlMode) {
        match control_mode {
            ControlMode::Half => self.update(parameters[0], parameters[1], 0, parameters[1]),
            ControlMode::Full => {
                self.update(parameters[0], parameters[1], parameters[2], parameters[3])
            }
        }
    }

    fn process_sample(&mut self, gate: GateFlags) -> i16 {
        (self.process_one(gate) >> 1) as i16
    }
}
