use std::collections::VecDeque;

use modcore::{
    dsp::{
        fixed::{interpolate824_u, mix},
        kernels::square_threshold,
        random::Random,
        tables::{time_to_increment, Curve},
        Envelope, ModulationSource, PatternPredictor, PhaseAccumulator, Segment, TuringMachine,
    },
    engine::{with_positions, ModulationEngine, Processors, TickHandler},
    ControlMode, GateFlags, ProcessorFunction, BLOCK_SIZE,
};

const TRIGGER: GateFlags = GateFlags(GateFlags::RISING.0 | GateFlags::HIGH.0);

#[test]
fn first_wrap_lands_on_ceil_period() {
    for increment in [1u32, 3, 7_919, 1 << 20, 89_478_485, 1_000_000_007, u32::MAX] {
        let period = (1u64 << 32).div_ceil(increment as u64);
        if period > 5_000_000 {
            continue;
        }
        let mut acc = PhaseAccumulator::new(increment);
        for tick in 1..=period {
            let wrapped = acc.tick();
            assert_eq!(wrapped, tick == period, "increment {increment} tick {tick}");
            assert_eq!(wrapped, acc.phase < increment);
        }
    }
}

#[test]
fn power_of_two_increment_wraps_periodically() {
    let mut acc = PhaseAccumulator::new(1 << 24);
    let wraps: Vec<u64> = (1..=1024u64).filter(|_| acc.tick()).collect();
    assert_eq!(wraps, vec![256, 512, 768, 1024]);
}

#[test]
fn attack_hands_over_to_decay_on_the_overflow_tick() {
    let mut env = Envelope::with_random(Random::with_seed(1));
    env.update(0x5000, 0x8000, 0x8000, 0x8000);
    env.trigger(Segment::Attack);

    let ticks = (1u64 << 32).div_ceil(env.increment(Segment::Attack) as u64);
    for _ in 1..ticks {
        env.render();
        assert_eq!(env.segment(), Segment::Attack);
    }
    env.render();
    assert_eq!(env.segment(), Segment::Decay);
}

#[test]
fn retrigger_mid_segment_does_not_click() {
    let mut env = Envelope::with_random(Random::with_seed(2));
    env.update(0x9000, 0x9000, 0x4000, 0x9000);
    env.trigger(Segment::Attack);
    for _ in 0..5_000 {
        env.render();
    }
    for segment in [Segment::Attack, Segment::Release, Segment::Decay] {
        let before = env.value();
        env.trigger(segment);
        assert_eq!(env.start_value(), before, "retrigger into {segment:?}");
        for _ in 0..777 {
            env.render();
        }
    }
}

#[test]
fn square_threshold_never_reaches_a_rail() {
    let increments = [1u32, 1_000, 89_478, 1 << 24, 1 << 28, (1 << 30) - 1];
    let parameters = [i16::MIN, -20_000, -1, 0, 1, 20_000, i16::MAX];
    for &increment in &increments {
        for &parameter in &parameters {
            let threshold = square_threshold(increment, parameter) as u64;
            let guard = 2 * increment as u64;
            assert!(threshold >= guard, "inc {increment} param {parameter}");
            assert!(threshold <= (1u64 << 32) - guard, "inc {increment} param {parameter}");
        }
    }
}

#[test]
fn predictor_locks_onto_a_steady_clock() {
    for period in [2_000u32, 12_345, 48_000, 200_000] {
        let mut predictor = PatternPredictor::<32>::new();
        let mut prediction = 0;
        for _ in 0..4 {
            prediction = predictor.predict(period);
        }
        assert!(prediction.abs_diff(period) <= 1, "{period} -> {prediction}");
    }
}

#[test]
fn predictor_rides_out_a_single_outlier() {
    const P: u32 = 24_000;
    let mut predictor = PatternPredictor::<32>::new();
    for _ in 0..8 {
        predictor.predict(P);
    }
    let after = predictor.predict(P / 10);
    // no ratio fits P/10, so the step is the quarter-weight blend
    assert!(P - after <= (P - P / 10) / 4 + 1, "jumped to {after}");
}

#[test]
fn sequencer_without_mutation_only_rotates() {
    let seed = 0x0f0f_3c3c;
    let mut machine = TuringMachine::with_random(Random::with_seed(3));
    machine.reseed(seed);
    machine.set_length(12);
    machine.set_probability(0);

    let window = |value: u32| value & 0x0fff;
    for k in 1..=36u32 {
        machine.process_one(TRIGGER);
        let r = k % 12;
        let expected = window((window(seed) >> r) | (window(seed) << (12 - r)));
        assert_eq!(window(machine.shift_register()), expected, "after {k} triggers");
    }
}

#[test]
fn sequencer_at_full_probability_flips_every_time() {
    let mut plain = TuringMachine::with_random(Random::with_seed(4));
    let mut mutated = TuringMachine::with_random(Random::with_seed(4));
    plain.reseed(0x8001_8001);
    mutated.reseed(0x8001_8001);
    mutated.set_probability(u16::MAX);

    // a flipped bit takes a full loop to come back round, stay inside one
    for _ in 0..8 {
        plain.process_one(TRIGGER);
        mutated.process_one(TRIGGER);
        // same rotation; the two registers only ever differ in what was flipped
        assert_ne!(plain.shift_register() & 1, mutated.shift_register() & 1);
    }
}

#[test]
fn playback_advances_three_blocks_and_never_meets_render() {
    let (playback, render) = with_positions::<4, BLOCK_SIZE>(0, 2);
    let mut tick = TickHandler::new(playback, VecDeque::<GateFlags>::new());
    let mut engine = ModulationEngine::new(Processors::with_seed(5), render, VecDeque::new());
    let mut dac: Vec<i16> = Vec::new();

    engine.render_pending();
    let start = tick.playback().playback_index();
    for n in 0..3 * BLOCK_SIZE {
        let before = tick.playback().playback_index();
        tick.on_tick(n % 100 < 10, false, &mut dac);
        let after = tick.playback().playback_index();
        if after != before {
            assert_ne!(after, engine.render_index(), "tick {n}");
        }
        engine.render_pending();
    }
    assert_eq!(tick.playback().playback_index(), (start + 3) % 4);
    assert_eq!(dac.len(), 3 * BLOCK_SIZE);
}

#[test]
fn instant_attack_then_exponential_decay() {
    let mut env = Envelope::with_random(Random::with_seed(6));
    env.configure(&[0, u16::MAX, 0, 0], ControlMode::Full);

    let peak = env.process_one(TRIGGER);
    let peak = peak.max(env.process_one(GateFlags::HIGH));
    assert!(peak >= 65_534, "peak {peak}");
    assert_eq!(env.segment(), Segment::Decay);

    let increment = time_to_increment(u16::MAX);
    let ticks = (1u64 << 32).div_ceil(increment as u64);
    let mut previous = env.value();
    let mut phase = 0u32;
    for k in 1..ticks {
        let value = env.process_one(GateFlags::HIGH);
        phase = phase.wrapping_add(increment);
        assert!(value <= previous, "rose at decay tick {k}");
        if k % 4_096 == 0 {
            let expected = mix(u16::MAX, 0, interpolate824_u(Curve::Exponential.table(), phase));
            assert!(value.abs_diff(expected) <= 2, "tick {k}: {value} vs {expected}");
        }
        previous = value;
    }
    env.process_one(GateFlags::HIGH);
    assert_eq!(env.value(), 0);
    assert_eq!(env.segment(), Segment::Sustain);
}

#[test]
fn dropping_to_half_mode_mid_release_settles_silently() {
    for wait in 0..=40 {
        let mut processors = Processors::with_seed(9);
        processors.set_control_mode(ControlMode::Full);
        for (index, value) in [0x1000, 0x1000, 0x8000, 0x3000].into_iter().enumerate() {
            processors.set_parameter(index, value);
        }

        let mut out = vec![0i16; 1_000];
        let mut gate = vec![GateFlags::HIGH; 201];
        gate[0] = TRIGGER;
        processors.process(&gate, &mut out[..201]);
        processors.process(&[GateFlags::FALLING], &mut out[..1]);
        let low = vec![GateFlags::LOW; 1_000];
        processors.process(&low[..wait], &mut out[..wait]);

        processors.set_control_mode(ControlMode::Half);
        processors.process(&low, &mut out);
        assert!(out[900..].iter().all(|&s| s == 0), "switched {wait} ticks into the release");
    }
}

#[cfg(feature = "rtrb")]
#[test]
fn processors_render_every_function_through_the_ring() {
    let (playback, render) = with_positions::<4, BLOCK_SIZE>(2, 0);
    let (gate_tx, gate_rx) = rtrb::RingBuffer::<GateFlags>::new(16 * BLOCK_SIZE);
    let mut tick = TickHandler::new(playback, gate_tx);
    let mut engine = ModulationEngine::new(Processors::with_seed(7), render, gate_rx);
    let mut dac: Vec<i16> = Vec::new();

    for function in ProcessorFunction::ALL {
        engine.processors_mut().set_function(function);
        engine.processors_mut().set_parameter(0, 0x2000);
        engine.processors_mut().set_parameter(1, 0xa000);
        let start = dac.len();
        for n in 0..40 * BLOCK_SIZE {
            tick.on_tick(n % 240 < 24, false, &mut dac);
            engine.render_pending();
        }
        assert!(dac[start..].iter().any(|&s| s != 0), "{} stayed silent", function.name());
    }
    assert_eq!(dac.len(), ProcessorFunction::ALL.len() * 40 * BLOCK_SIZE);
}
