use crate::{
    config::ControlMode,
    dsp::{
        fixed::interpolate824_u,
        random::Random,
        tables::{time_to_increment, Curve},
        ModulationSource,
    },
    io::GateFlags,
};

/*
Multistage Envelope
===================

A table of segments walked by gate edges. Each segment has an end level, a
time and a curve; the first level is where an idle envelope starts.

    level:   [0]     [1]      [2]     [3]
              │  A    │   D    │  R   │
             0 ──/‾‾‾‾\________\───── 0
                      32767    s

Gate Policy
-----------

  RISING          restart at segment 0. The start point is the current
                  output, or level[0] when idle or hard-resetting.
  FALLING         jump to the sustain point, if one is defined.
  overflow        move to the next segment; at the loop end go back to the
                  loop start.
  HIGH            hold while sitting on the sustain point.

The variants below are the same walker with a different preset and a
different rule for the loop:

  Standard         AD with 2 knobs, ADSR with 4
  DualAttack       attack, decay, second attack, release
  Looping          loops unconditionally (envelope as LFO)
  RepeatingAttack  loops only while the gate is held
  Randomised       level and time of segment 1 redrawn on every RISING edge
*/

pub const MAX_SEGMENTS: usize = 8;

const FULL_LEVEL: i16 = 32767;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MultistageVariant {
    #[default]
    Standard,
    DualAttack,
    Looping,
    RepeatingAttack,
    Randomised,
}

#[derive(Debug, Clone)]
pub struct MultistageEnvelope {
    variant: MultistageVariant,

    level: [i16; MAX_SEGMENTS + 1],
    time: [u16; MAX_SEGMENTS],
    shape: [Curve; MAX_SEGMENTS],
    num_segments: usize,
    sustain_point: Option<usize>,
    loop_points: Option<(usize, usize)>,

    // Randomised variant
    base_level: i16,
    base_time: u16,
    level_randomness: u16,
    time_randomness: u16,

    segment: usize,
    phase: u32,
    phase_increment: u32,
    start_value: i16,
    value: i16,
    hard_reset: bool,
    rng: Random,
}

impl MultistageEnvelope {
    pub fn new(variant: MultistageVariant) -> Self {
        Self::with_random(variant, Random::new())
    }

    pub fn with_random(variant: MultistageVariant, rng: Random) -> Self {
        let mut envelope = Self {
            variant,
            level: [0; MAX_SEGMENTS + 1],
            time: [0; MAX_SEGMENTS],
            shape: [Curve::Linear; MAX_SEGMENTS],
            num_segments: 0,
            sustain_point: None,
            loop_points: None,
            base_level: FULL_LEVEL,
            base_time: 0,
            level_randomness: 0,
            time_randomness: 0,
            segment: 0,
            phase: 0,
            phase_increment: 0,
            start_value: 0,
            value: 0,
            hard_reset: false,
            rng,
        };
        envelope.init();
        envelope
    }

    /// Load the variant's default preset and go idle.
    pub fn init(&mut self) {
        match self.variant {
            MultistageVariant::Standard => self.set_adsr(0, 8192, 16384, 32767),
            MultistageVariant::DualAttack => self.set_adsar(0, 8192, 16384, 32767),
            MultistageVariant::Looping | MultistageVariant::RepeatingAttack => {
                self.set_adr_loop(0, 8192, 16384, 32767)
            }
            MultistageVariant::Randomised => self.set_rad(0, 8192, 0, 0),
        }
        self.segment = self.num_segments;
        self.phase = 0;
        self.phase_increment = 0;
        self.start_value = 0;
        self.value = 0;
        self.hard_reset = false;
    }

    pub fn set_ad(&mut self, attack: u16, decay: u16) {
        self.set_segments(
            &[0, FULL_LEVEL, 0],
            &[attack, decay],
            &[Curve::Linear, Curve::Exponential],
        );
        self.sustain_point = None;
        self.loop_points = None;
    }

    pub fn set_ar(&mut self, attack: u16, release: u16) {
        self.set_segments(
            &[0, FULL_LEVEL, 0],
            &[attack, release],
            &[Curve::Linear, Curve::Linear],
        );
        self.sustain_point = Some(1);
        self.loop_points = None;
    }

    pub fn set_adsr(&mut self, attack: u16, decay: u16, sustain: i16, release: u16) {
        self.set_segments(
            &[0, FULL_LEVEL, sustain.max(0), 0],
            &[attack, decay, release],
            &[Curve::Linear, Curve::Exponential, Curve::Exponential],
        );
        self.sustain_point = Some(2);
        self.loop_points = None;
    }

    /// Attack, decay to sustain, attack again on release, then release.
    pub fn set_adsar(&mut self, attack: u16, decay: u16, sustain: i16, release: u16) {
        self.set_segments(
            &[0, FULL_LEVEL, sustain.max(0), FULL_LEVEL, 0],
            &[attack, decay, attack, release],
            &[
                Curve::Linear,
                Curve::Exponential,
                Curve::Linear,
                Curve::Exponential,
            ],
        );
        self.sustain_point = Some(2);
        self.loop_points = None;
    }

    pub fn set_ad_loop(&mut self, attack: u16, decay: u16) {
        self.set_segments(
            &[0, FULL_LEVEL, 0],
            &[attack, decay],
            &[Curve::Linear, Curve::Exponential],
        );
        self.sustain_point = None;
        self.loop_points = Some((0, 2));
    }

    pub fn set_adr_loop(&mut self, attack: u16, decay: u16, sustain: i16, release: u16) {
        self.set_segments(
            &[0, FULL_LEVEL, sustain.max(0), 0],
            &[attack, decay, release],
            &[Curve::Linear, Curve::Exponential, Curve::Exponential],
        );
        self.sustain_point = None;
        self.loop_points = Some((0, 3));
    }

    /// AD envelope whose peak level and decay time are redrawn per trigger.
    pub fn set_rad(
        &mut self,
        attack: u16,
        decay: u16,
        level_randomness: u16,
        time_randomness: u16,
    ) {
        self.set_ad(attack, decay);
        self.base_level = FULL_LEVEL;
        self.base_time = decay;
        self.level_randomness = level_randomness;
        self.time_randomness = time_randomness;
    }

    pub fn set_hard_reset(&mut self, hard_reset: bool) {
        self.hard_reset = hard_reset;
    }

    pub fn variant(&self) -> MultistageVariant {
        self.variant
    }

    pub fn value(&self) -> i16 {
        self.value
    }

    pub fn segment(&self) -> usize {
        self.segment
    }

    pub fn num_segments(&self) -> usize {
        self.num_segments
    }

    pub fn is_idle(&self) -> bool {
        self.segment >= self.num_segments
    }

    pub fn level(&self, index: usize) -> i16 {
        self.level[index.min(MAX_SEGMENTS)]
    }

    pub fn time(&self, index: usize) -> u16 {
        self.time[index.min(MAX_SEGMENTS - 1)]
    }

    pub fn process_one(&mut self, gate: GateFlags) -> i16 {
        if gate.is_rising() {
            self.start_value = if self.is_idle() || self.hard_reset {
                self.level[0]
            } else {
                self.value
            };
            self.segment = 0;
            self.phase = 0;
            if self.variant == MultistageVariant::Randomised {
                self.randomise();
            }
        } else if let (true, Some(sustain_point)) = (gate.is_falling(), self.sustain_point) {
            self.start_value = self.value;
            self.segment = sustain_point;
            self.phase = 0;
        } else if self.phase < self.phase_increment && !self.is_idle() {
            self.start_value = self.level[self.segment + 1];
            self.segment += 1;
            self.phase = 0;
            if let Some((loop_start, loop_end)) = self.loop_points {
                let may_loop =
                    self.variant != MultistageVariant::RepeatingAttack || gate.is_high();
                if self.segment == loop_end && may_loop {
                    self.segment = loop_start;
                }
            }
        }

        let done = self.is_idle();
        let sustained = self.sustain_point == Some(self.segment) && gate.is_high();
        self.phase_increment = if sustained || done {
            0
        } else {
            time_to_increment(self.time[self.segment])
        };

        let a = self.start_value as i32;
        let b = self.level[self.segment + 1] as i32;
        let shape = self.shape[self.segment.min(MAX_SEGMENTS - 1)];
        let t = interpolate824_u(shape.table(), self.phase) as i32;
        self.value = (a + ((b - a) * (t >> 1) >> 15)) as i16;
        self.phase = self.phase.wrapping_add(self.phase_increment);
        self.value
    }

    fn set_segments(&mut self, levels: &[i16], times: &[u16], shapes: &[Curve]) {
        let count = times.len().min(MAX_SEGMENTS);
        self.num_segments = count;
        for (i, slot) in self.level.iter_mut().enumerate() {
            *slot = levels[i.min(levels.len() - 1)];
        }
        for (i, slot) in self.time.iter_mut().enumerate() {
            *slot = times.get(i).copied().unwrap_or(0);
        }
        for (i, slot) in self.shape.iter_mut().enumerate() {
            *slot = shapes.get(i).copied().unwrap_or(Curve::Linear);
        }
        // A shorter preset cut off the running segment: settle on the new
        // end level and stay idle until the next trigger.
        if self.segment >= self.num_segments {
            self.segment = self.num_segments;
            self.phase = 0;
            self.phase_increment = 0;
            self.start_value = self.level[self.num_segments];
        }
    }

    fn randomise(&mut self) {
        let random = self.rng.word() >> 16;
        let level_offset = ((random * self.level_randomness as u32) >> 17) as i32;
        let time_offset = ((random * self.time_randomness as u32) >> 17) as i32;
        self.level[1] = (self.base_level as i32 - level_offset).max(0) as i16;
        self.time[1] = (self.base_time as i32 - time_offset).max(0) as u16;
    }
}

impl ModulationSource for MultistageEnvelope {
    fn configure(&mut self, parameters: &[u16; 4], control_mode: ControlMode) {
        let [p0, p1, p2, p3] = *parameters;
        let sustain = (p2 >> 1) as i16;
        match (self.variant, control_mode) {
            (MultistageVariant::Standard, ControlMode::Half) => self.set_ad(p0, p1),
            (MultistageVariant::Standard, ControlMode::Full) => {
                self.set_adsr(p0, p1, sustain, p3)
            }
            (MultistageVariant::DualAttack, ControlMode::Half) => {
                self.set_adsar(p0, p1, FULL_LEVEL >> 1, p1)
            }
            (MultistageVariant::DualAttack, ControlMode::Full) => {
                self.set_adsar(p0, p1, sustain, p3)
            }
            (
                MultistageVariant::Looping | MultistageVariant::RepeatingAttack,
                ControlMode::Half,
            ) => self.set_ad_loop(p0, p1),
            (
                MultistageVariant::Looping | MultistageVariant::RepeatingAttack,
                ControlMode::Full,
            ) => self.set_adr_loop(p0, p1, sustain, p3),
            (MultistageVariant::Randomised, ControlMode::Half) => {
                self.set_rad(p0, p1, 0x8000, 0x8000)
            }
            (MultistageVariant::Randomised, ControlMode::Full) => self.set_rad(p0, p1, p2, p3),
        }
    }

    fn process_sample(&mut self, gate: GateFlags) -> i16 {
        self.process_one(gate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIGGER: GateFlags = GateFlags(GateFlags::RISING.0 | GateFlags::HIGH.0);

    fn envelope(variant: MultistageVariant) -> MultistageEnvelope {
        MultistageEnvelope::with_random(variant, Random::with_seed(11))
    }

    fn run(env: &mut MultistageEnvelope, gate: GateFlags, samples: usize) -> i16 {
        let mut last = 0;
        for _ in 0..samples {
            last = env.process_one(gate);
        }
        last
    }

    #[test]
    fn starts_idle_and_silent() {
        let mut env = envelope(MultistageVariant::Standard);
        assert!(env.is_idle());
        assert_eq!(run(&mut env, GateFlags::LOW, 32), 0);
    }

    #[test]
    fn adsr_holds_sustain_while_gate_high() {
        let mut env = envelope(MultistageVariant::Standard);
        env.set_adsr(0x1000, 0x3000, 12000, 0x3000);

        env.process_one(TRIGGER);
        let held = run(&mut env, GateFlags::HIGH, 4_000);
        assert_eq!(env.segment(), 2, "expected to sit on the sustain point");
        assert_eq!(held, 12000);
    }

    #[test]
    fn release_returns_to_zero_and_idles() {
        let mut env = envelope(MultistageVariant::Standard);
        env.set_adsr(0x1000, 0x3000, 12000, 0x3000);
        env.process_one(TRIGGER);
        run(&mut env, GateFlags::HIGH, 4_000);

        env.process_one(GateFlags::FALLING);
        assert_eq!(env.segment(), 2);
        let last = run(&mut env, GateFlags::LOW, 4_000);
        assert!(env.is_idle());
        assert_eq!(last, 0);
    }

    #[test]
    fn ad_ignores_gate_release() {
        let mut env = envelope(MultistageVariant::Standard);
        env.set_ad(0x4000, 0x4000);
        env.process_one(TRIGGER);
        run(&mut env, GateFlags::HIGH, 10);
        env.process_one(GateFlags::FALLING);
        assert_eq!(env.segment(), 0, "AD has no sustain point to jump to");
    }

    #[test]
    fn attack_peaks_at_full_level() {
        let mut env = envelope(MultistageVariant::Standard);
        env.set_ad(0x2000, 0x6000);
        env.process_one(TRIGGER);
        let peak = (0..200).map(|_| env.process_one(GateFlags::HIGH)).max();
        assert!(peak.is_some_and(|p| p > 32000), "peak was {peak:?}");
    }

    #[test]
    fn retrigger_starts_from_current_value() {
        let mut env = envelope(MultistageVariant::Standard);
        env.set_ad(0x5000, 0x6000);
        env.process_one(TRIGGER);
        let before = run(&mut env, GateFlags::HIGH, 40);
        let after = env.process_one(TRIGGER);
        assert_eq!(after, before);
    }

    #[test]
    fn looping_envelope_never_idles() {
        let mut env = envelope(MultistageVariant::Looping);
        env.set_ad_loop(0x2000, 0x2000);
        env.process_one(TRIGGER);
        for _ in 0..1_000 {
            env.process_one(GateFlags::LOW);
            assert!(!env.is_idle());
        }
    }

    #[test]
    fn repeating_attack_stops_after_gate_release() {
        let mut env = envelope(MultistageVariant::RepeatingAttack);
        env.set_ad_loop(0x2000, 0x2000);
        env.process_one(TRIGGER);
        run(&mut env, GateFlags::HIGH, 1_000);
        assert!(!env.is_idle(), "loops while held");

        env.process_one(GateFlags::FALLING);
        run(&mut env, GateFlags::LOW, 1_000);
        assert!(env.is_idle(), "finishes once released");
    }

    #[test]
    fn dual_attack_rises_again_on_release() {
        let mut env = envelope(MultistageVariant::DualAttack);
        env.set_adsar(0x1000, 0x3000, 8000, 0x5000);
        env.process_one(TRIGGER);
        assert_eq!(run(&mut env, GateFlags::HIGH, 4_000), 8000);

        env.process_one(GateFlags::FALLING);
        let peak = (0..200).map(|_| env.process_one(GateFlags::LOW)).max();
        assert!(peak.is_some_and(|p| p > 30000), "second attack peak was {peak:?}");
    }

    #[test]
    fn randomised_levels_stay_in_range() {
        let mut env = envelope(MultistageVariant::Randomised);
        env.set_rad(0x1000, 0x6000, u16::MAX, u16::MAX);
        for _ in 0..64 {
            env.process_one(TRIGGER);
            env.process_one(GateFlags::LOW);
            assert!((0..=FULL_LEVEL).contains(&env.level(1)));
            assert!(env.time(1) <= 0x6000);
        }
    }

    #[test]
    fn randomised_without_randomness_is_plain_ad() {
        let mut env = envelope(MultistageVariant::Randomised);
        env.set_rad(0x1000, 0x6000, 0, 0);
        env.process_one(TRIGGER);
        assert_eq!(env.level(1), FULL_LEVEL);
        assert_eq!(env.time(1), 0x6000);
    }

    #[test]
    fn shorter_preset_clamps_running_segment() {
        let mut env = envelope(MultistageVariant::DualAttack);
        env.set_adsar(0x1000, 0x1000, 8000, 0x1000);
        env.process_one(TRIGGER);
        run(&mut env, GateFlags::HIGH, 200);
        env.process_one(GateFlags::FALLING);
        run(&mut env, GateFlags::LOW, 2);
        assert!(env.segment() >= 2, "second attack or release still running");

        env.set_ad(0x1000, 0x1000);
        assert!(env.is_idle());
        assert_eq!(run(&mut env, GateFlags::LOW, 100), 0);
        assert_eq!(env.segment(), env.num_segments());
    }

    #[test]
    fn switching_adr_loop_to_ad_loop_mid_release_keeps_walking() {
        let mut env = envelope(MultistageVariant::Looping);
        env.set_adr_loop(0x1000, 0x1000, 8000, 0x2000);
        env.process_one(TRIGGER);
        for wait in 0..400 {
            env.process_one(GateFlags::LOW);
            if env.segment() == 2 {
                break;
            }
            assert!(wait < 399, "never reached the release segment");
        }

        env.set_ad_loop(0x1000, 0x1000);
        assert!(env.is_idle());
        run(&mut env, GateFlags::LOW, 1_000);
        assert!(env.segment() <= env.num_segments());

        env.process_one(TRIGGER);
        run(&mut env, GateFlags::LOW, 1_000);
        assert!(!env.is_idle(), "loops again after a fresh trigger");
    }

    #[test]
    fn idle_envelope_never_walks_past_its_end() {
        let mut env = envelope(MultistageVariant::Standard);
        env.set_ad(0, 0);
        env.process_one(TRIGGER);
        for _ in 0..64 {
            env.process_one(GateFlags::LOW);
            assert!(env.segment() <= env.num_segments());
        }
        assert!(env.is_idle());
        assert_eq!(env.value(), 0);
    }
}
