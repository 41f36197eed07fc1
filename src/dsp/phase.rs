/*
Phase Accumulator
=================

Every periodic thing in this crate (LFO cycles, envelope segments, noise
steps) is timed by a 32-bit counter that wraps.

    phase_after = phase_before + increment   (mod 2^32)

One full wrap is one period. The wrap itself is the timing signal: the sum
overflowed exactly when the result is smaller than what was added.

    overflowed  <=>  phase_after < increment

So a period lasts ceil(2^32 / increment) ticks and no separate sample
counter is needed. The increment is the only "frequency" state.

    increment = 2^32 / 48_000       ->  1 Hz at 48 kHz
    increment = 2^32 / 4            ->  a period every 4 ticks
*/

/// Wrapping 32-bit phase counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseAccumulator {
    pub phase: u32,
    pub increment: u32,
}

impl PhaseAccumulator {
    pub const fn new(increment: u32) -> Self {
        Self { phase: 0, increment }
    }

    /// Advance one tick. Returns `true` on the tick that wrapped.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.phase = self.phase.wrapping_add(self.increment);
        self.phase < self.increment
    }

    #[inline]
    pub fn reset(&mut self, phase: u32) {
        self.phase = phase;
    }

    /// Ticks per period, rounded up. `None` for a stopped accumulator.
    pub fn period_in_ticks(&self) -> Option<u64> {
        if self.increment == 0 {
            return None;
        }
        Some((1u64 << 32).div_ceil(self.increment as u64))
    }
}
