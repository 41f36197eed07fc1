//! Benchmarks for the envelope automata.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use modcore::dsp::{
    random::Random, Envelope, EnvelopeMode, EnvelopeShape, ModulationSource, MultistageEnvelope,
    MultistageVariant,
};
use modcore::{ControlMode, GateFlags};

use super::clock_gates;
use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0i16; size];
        let held = vec![GateFlags::HIGH; size];
        let clocked = clock_gates(size, 12);

        // Exponential decay - table interpolation per sample
        let mut env = Envelope::with_random(Random::with_seed(1));
        env.configure(&[0x1000, 0xc000, 0x4000, 0x8000], ControlMode::Full);
        env.process_one(GateFlags::RISING | GateFlags::HIGH);
        group.bench_with_input(BenchmarkId::new("decay", size), &size, |b, _| {
            b.iter(|| {
                env.process(black_box(&held), black_box(&mut buffer));
            })
        });

        // Loop mode with random targets - segment changes and RNG draws
        let mut env = Envelope::with_random(Random::with_seed(2));
        env.set_mode(EnvelopeMode::Loop);
        env.set_shapes(EnvelopeShape::RandomLinear, EnvelopeShape::RandomExponential);
        env.update(0x1000, 0x1000, 0, 0x1000);
        group.bench_with_input(BenchmarkId::new("loop_random", size), &size, |b, _| {
            b.iter(|| {
                env.process(black_box(&held), black_box(&mut buffer));
            })
        });

        // Multistage ADSR under a fast clock - edges every 12 samples
        let mut env =
            MultistageEnvelope::with_random(MultistageVariant::Standard, Random::with_seed(3));
        env.configure(&[0x2000, 0x4000, 0x8000, 0x4000], ControlMode::Full);
        group.bench_with_input(BenchmarkId::new("multistage_clocked", size), &size, |b, _| {
            b.iter(|| {
                env.process(black_box(&clocked), black_box(&mut buffer));
            })
        });

        // Randomised - redraws level and time on every edge
        let mut env =
            MultistageEnvelope::with_random(MultistageVariant::Randomised, Random::with_seed(4));
        env.configure(&[0x2000, 0x4000, 0xffff, 0xffff], ControlMode::Full);
        group.bench_with_input(BenchmarkId::new("randomised", size), &size, |b, _| {
            b.iter(|| {
                env.process(black_box(&clocked), black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
