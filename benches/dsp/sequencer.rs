//! Benchmarks for the shift-register sequencer.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use modcore::dsp::{random::Random, ModulationSource, TuringMachine};

use super::clock_gates;
use crate::BLOCK_SIZES;

pub fn bench_sequencer(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/sequencer");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0i16; size];

        // Locked loop - rotation only
        let mut machine = TuringMachine::with_random(Random::with_seed(1));
        machine.set_length(16);
        machine.set_probability(0);
        let clocked = clock_gates(size, 4);
        group.bench_with_input(BenchmarkId::new("locked", size), &size, |b, _| {
            b.iter(|| {
                machine.process(black_box(&clocked), black_box(&mut buffer));
            })
        });

        // Half probability on a clock edge every other sample
        let mut machine = TuringMachine::with_random(Random::with_seed(2));
        machine.set_length(8);
        machine.set_probability(0x8000);
        let clocked = clock_gates(size, 2);
        group.bench_with_input(BenchmarkId::new("mutating", size), &size, |b, _| {
            b.iter(|| {
                machine.process(black_box(&clocked), black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
