//! Benchmarks for the LFO family and the phase-locked oscillator.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use modcore::dsp::{
    random::Random, FmLfo, Lfo, LfoShape, ModulationSource, Plo, WsmLfo, WsmShape,
};
use modcore::GateFlags;

use super::clock_gates;
use crate::BLOCK_SIZES;

pub fn bench_lfo(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/lfo");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0i16; size];
        let idle = vec![GateFlags::LOW; size];
        let clocked = clock_gates(size, 16);

        // Free-running sine - one table lookup per sample
        let mut lfo = Lfo::with_random(Random::with_seed(1));
        lfo.set_shape(LfoShape::Sine);
        lfo.set_rate(0x8000);
        group.bench_with_input(BenchmarkId::new("sine", size), &size, |b, _| {
            b.iter(|| {
                lfo.process(black_box(&idle), black_box(&mut buffer));
            })
        });

        // Sample and hold - RNG draw on every wrap
        let mut lfo = Lfo::with_random(Random::with_seed(2));
        lfo.set_shape(LfoShape::Noise);
        lfo.set_rate(0xf000);
        group.bench_with_input(BenchmarkId::new("noise", size), &size, |b, _| {
            b.iter(|| {
                lfo.process(black_box(&idle), black_box(&mut buffer));
            })
        });

        // Tap-synced - predictor runs on every clock edge
        let mut lfo = Lfo::with_random(Random::with_seed(3));
        lfo.set_sync(true);
        lfo.set_shape(LfoShape::Triangle);
        group.bench_with_input(BenchmarkId::new("synced", size), &size, |b, _| {
            b.iter(|| {
                lfo.process(black_box(&clocked), black_box(&mut buffer));
            })
        });

        // Rate modulated by a second oscillator
        let mut fm = FmLfo::with_random(Random::with_seed(4));
        fm.set_rate(0x8000);
        fm.set_fm_rate(0x6000);
        fm.set_fm_depth(0x8000);
        group.bench_with_input(BenchmarkId::new("fm", size), &size, |b, _| {
            b.iter(|| {
                fm.process(black_box(&idle), black_box(&mut buffer));
            })
        });

        // Shape parameter modulated by a second oscillator
        let mut wsm = WsmLfo::with_random(Random::with_seed(5));
        wsm.set_shape(WsmShape::FoldedSine);
        wsm.set_rate(0x8000);
        wsm.set_wsm_rate(0x6000);
        wsm.set_wsm_depth(0x8000);
        group.bench_with_input(BenchmarkId::new("wsm", size), &size, |b, _| {
            b.iter(|| {
                wsm.process(black_box(&idle), black_box(&mut buffer));
            })
        });

        // Locked to a fast clock with the octave shift applied per tick
        let mut plo = Plo::with_random(Random::with_seed(6));
        plo.set_pitch_coefficient(0xc000);
        plo.set_wsm_depth(0x4000);
        group.bench_with_input(BenchmarkId::new("plo", size), &size, |b, _| {
            b.iter(|| {
                plo.process(black_box(&clocked), black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
