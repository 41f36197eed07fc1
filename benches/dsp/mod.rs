//! Benchmarks for the per-sample modulation primitives.

mod envelope;
mod lfo;
mod scheduler;
mod sequencer;

use modcore::GateFlags;

pub use envelope::bench_envelope;
pub use lfo::bench_lfo;
pub use scheduler::bench_scheduler;
pub use sequencer::bench_sequencer;

/// Gate stream with a rising edge every `interval` samples.
pub fn clock_gates(size: usize, interval: usize) -> Vec<GateFlags> {
    (0..size)
        .map(|i| match i % interval {
            0 => GateFlags::RISING | GateFlags::HIGH,
            n if n < interval / 2 => GateFlags::HIGH,
            n if n == interval / 2 => GateFlags::FALLING,
            _ => GateFlags::LOW,
        })
        .collect()
}
