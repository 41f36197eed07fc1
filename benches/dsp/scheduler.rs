//! Benchmarks for the tick handler and render loop sharing the block ring.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use modcore::engine::{block_ring, ModulationEngine, Processors, TickHandler};
use modcore::{GateFlags, ProcessorFunction, BLOCK_SIZE, NUM_BLOCKS};

use crate::BLOCK_SIZES;

pub fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/scheduler");

    // Tick side alone - gate extraction plus one ring read
    let (playback, _render) = block_ring::<NUM_BLOCKS, BLOCK_SIZE>();
    let (gate_tx, mut gate_rx) = rtrb::RingBuffer::<GateFlags>::new(4096);
    let mut tick = TickHandler::new(playback, gate_tx);
    let mut dac: Vec<i16> = Vec::with_capacity(4096);
    group.bench_function("on_tick", |b| {
        let mut n = 0usize;
        b.iter(|| {
            tick.on_tick(black_box(n % 64 < 8), false, &mut dac);
            n = n.wrapping_add(1);
            while gate_rx.pop().is_ok() {}
            dac.clear();
        })
    });

    // Both sides interleaved, one render pass per tick as the host thread does
    for &size in BLOCK_SIZES {
        for function in [ProcessorFunction::Envelope, ProcessorFunction::TuringMachine] {
            let (playback, render) = block_ring::<NUM_BLOCKS, BLOCK_SIZE>();
            let (gate_tx, gate_rx) = rtrb::RingBuffer::<GateFlags>::new(16 * BLOCK_SIZE);
            let mut tick = TickHandler::new(playback, gate_tx);
            let mut engine = ModulationEngine::new(Processors::with_seed(1), render, gate_rx);
            engine.processors_mut().set_function(function);
            let mut dac: Vec<i16> = Vec::with_capacity(size);

            group.bench_with_input(BenchmarkId::new(function.name(), size), &size, |b, &size| {
                b.iter(|| {
                    dac.clear();
                    for n in 0..size {
                        tick.on_tick(n % 48 < 12, false, &mut dac);
                        engine.render_pending();
                    }
                    black_box(&dac);
                })
            });
        }
    }

    group.finish();
}
