//! Block ring shared by the tick handler and the render loop.

/*
Block Ring
==========

Samples are computed a block at a time by the render loop and drained one
at a time by the tick handler. The two meet in a ring of blocks:

    blocks:    [ 0 ][ 1 ][ 2 ][ 3 ]
                 ^         ^
              playback   render

  playback  Block the tick handler is draining. Only the tick side writes it.
  render    Next block the render loop fills. Only the render side writes it.

The render loop fills blocks while `render != playback`. When it catches up
it stops, so it never writes the block being drained: at most N - 1 blocks
are ever ahead.

If rendering falls behind, playback walks into a block from the previous lap
and repeats it. That is audible but safe, and nothing here tries to detect
or patch it.

Each index is a single atomic written by one side only. Block samples are
atomics too, so a late render can produce stale audio but never a torn read.
*/

use std::sync::{
    atomic::{AtomicI16, AtomicUsize, Ordering},
    Arc,
};

use crate::{
    engine::GateSender,
    io::{DacSink, GateFlags},
    BLOCK_SIZE, NUM_BLOCKS,
};

struct BlockRing<const N: usize, const B: usize> {
    blocks: [[AtomicI16; B]; N],
    playback: AtomicUsize,
    render: AtomicUsize,
}

impl<const N: usize, const B: usize> BlockRing<N, B> {
    fn new(playback: usize, render: usize) -> Self {
        Self {
            blocks: std::array::from_fn(|_| std::array::from_fn(|_| AtomicI16::new(0))),
            playback: AtomicUsize::new(playback % N),
            render: AtomicUsize::new(render % N),
        }
    }
}

/// Firmware start-up positions: playback half a ring ahead of render.
pub fn block_ring<const N: usize, const B: usize>() -> (PlaybackSide<N, B>, RenderSide<N, B>) {
    with_positions(N / 2, 0)
}

/// Build a silent ring with explicit start indices (wrapped into `0..N`).
pub fn with_positions<const N: usize, const B: usize>(
    playback: usize,
    render: usize,
) -> (PlaybackSide<N, B>, RenderSide<N, B>) {
    let ring = Arc::new(BlockRing::new(playback, render));
    (
        PlaybackSide {
            ring: Arc::clone(&ring),
            sample_in_block: 0,
        },
        RenderSide { ring },
    )
}

/// Tick-side handle: drains one sample per call.
pub struct PlaybackSide<const N: usize = NUM_BLOCKS, const B: usize = BLOCK_SIZE> {
    ring: Arc<BlockRing<N, B>>,
    sample_in_block: usize,
}

impl<const N: usize, const B: usize> PlaybackSide<N, B> {
    /// Read the current sample and advance, moving to the next block on wrap.
    #[inline]
    pub fn next_sample(&mut self) -> i16 {
        let playback = self.ring.playback.load(Ordering::Relaxed);
        if self.sample_in_block == 0 {
            // Pairs with the Release store of `render` that published the block.
            let _ = self.ring.render.load(Ordering::Acquire);
        }
        let sample = self.ring.blocks[playback][self.sample_in_block].load(Ordering::Relaxed);

        self.sample_in_block += 1;
        if self.sample_in_block >= B {
            self.sample_in_block = 0;
            self.ring.playback.store((playback + 1) % N, Ordering::Release);
        }
        sample
    }

    pub fn playback_index(&self) -> usize {
        self.ring.playback.load(Ordering::Relaxed)
    }

    pub fn render_index(&self) -> usize {
        self.ring.render.load(Ordering::Acquire)
    }

    pub fn sample_in_block(&self) -> usize {
        self.sample_in_block
    }
}

/// Render-side handle: fills whole blocks ahead of playback.
pub struct RenderSide<const N: usize = NUM_BLOCKS, const B: usize = BLOCK_SIZE> {
    ring: Arc<BlockRing<N, B>>,
}

impl<const N: usize, const B: usize> RenderSide<N, B> {
    /// True while the render index has not caught up with playback.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.ring.render.load(Ordering::Relaxed) != self.ring.playback.load(Ordering::Acquire)
    }

    /// Let `fill` compute the block at the render index, then publish it.
    ///
    /// Returns `false` without calling `fill` when no block is pending.
    pub fn render_block<F>(&mut self, fill: F) -> bool
    where
        F: FnOnce(&mut [i16; B]),
    {
        if !self.is_pending() {
            return false;
        }
        let render = self.ring.render.load(Ordering::Relaxed);
        let mut block = [0i16; B];
        fill(&mut block);
        for (slot, sample) in self.ring.blocks[render].iter().zip(block) {
            slot.store(sample, Ordering::Relaxed);
        }
        self.ring.render.store((render + 1) % N, Ordering::Release);
        true
    }

    pub fn render_index(&self) -> usize {
        self.ring.render.load(Ordering::Relaxed)
    }

    pub fn playback_index(&self) -> usize {
        self.ring.playback.load(Ordering::Acquire)
    }
}

/// The periodic tick: gate in, one sample out.
///
/// Owns the playback side of the ring and the sending end of the gate
/// queue. Call `on_tick` exactly once per sample period; it never blocks
/// and never allocates.
pub struct TickHandler<S, const N: usize = NUM_BLOCKS, const B: usize = BLOCK_SIZE> {
    playback: PlaybackSide<N, B>,
    gates: S,
    previous: GateFlags,
}

impl<S: GateSender, const N: usize, const B: usize> TickHandler<S, N, B> {
    pub fn new(playback: PlaybackSide<N, B>, gates: S) -> Self {
        Self {
            playback,
            gates,
            previous: GateFlags::LOW,
        }
    }

    /// `high` is the gate level this tick; `from_button` marks a level
    /// produced by the panel button rather than the jack.
    pub fn on_tick<D: DacSink>(&mut self, high: bool, from_button: bool, dac: &mut D) {
        let mut flags = GateFlags::extract(self.previous, high);
        if from_button && flags.is_rising() {
            flags |= GateFlags::FROM_BUTTON;
        }
        self.previous = flags;
        self.gates.send(flags);
        dac.write(self.playback.next_sample());
    }

    pub fn playback(&self) -> &PlaybackSide<N, B> {
        &self.playback
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    #[test]
    fn render_fills_until_it_meets_playback() {
        let (_playback, mut render) = with_positions::<4, 8>(2, 0);
        let mut rendered = 0;
        while render.render_block(|block| block.fill(rendered as i16 + 1)) {
            rendered += 1;
        }
        assert_eq!(rendered, 2);
        assert_eq!(render.render_index(), 2);
        assert!(!render.is_pending());
    }

    #[test]
    fn playback_reads_what_render_wrote() {
        let (mut playback, mut render) = with_positions::<4, 4>(1, 0);
        render.render_block(|block| *block = [10, 11, 12, 13]);
        // playback starts on block 1 (silent), then reaches block 0 after a lap
        let lap: Vec<i16> = (0..16).map(|_| playback.next_sample()).collect();
        assert_eq!(&lap[..4], &[0, 0, 0, 0]);
        assert_eq!(&lap[12..], &[10, 11, 12, 13]);
    }

    #[test]
    fn playback_advances_one_block_per_block_of_ticks() {
        const B: usize = 6;
        let (playback, mut render) = with_positions::<4, B>(0, 2);
        let mut tick = TickHandler::new(playback, VecDeque::<GateFlags>::new());
        let mut dac: Vec<i16> = Vec::new();

        let start = tick.playback().playback_index();
        for n in 1..=3 * B {
            let before = tick.playback().playback_index();
            tick.on_tick(false, false, &mut dac);
            let after = tick.playback().playback_index();
            if after != before {
                assert_ne!(after, render.render_index(), "playback caught render at tick {n}");
            }
            while render.render_block(|block| block.fill(n as i16)) {}
        }
        assert_eq!(tick.playback().playback_index(), (start + 3) % 4);
        assert_eq!(dac.len(), 3 * B);
    }

    #[test]
    fn starved_render_repeats_old_blocks() {
        let (mut playback, mut render) = with_positions::<2, 2>(1, 0);
        render.render_block(|block| *block = [7, 7]);
        let samples: Vec<i16> = (0..8).map(|_| playback.next_sample()).collect();
        assert_eq!(samples, vec![0, 0, 7, 7, 0, 0, 7, 7]);
    }

    #[test]
    fn blocks_rendered_on_another_thread_arrive_whole_and_in_order() {
        use std::sync::atomic::AtomicBool;
        use std::thread;

        const B: usize = 16;
        let (mut playback, mut render) = block_ring::<4, B>();
        let stop = Arc::new(AtomicBool::new(false));

        let render_stop = Arc::clone(&stop);
        let renderer = thread::spawn(move || {
            let mut next = 1i16;
            while !render_stop.load(Ordering::Relaxed) {
                let value = next;
                if render.render_block(|block| block.fill(value)) {
                    next = next.wrapping_add(1);
                } else {
                    thread::yield_now();
                }
            }
        });

        let mut firsts = Vec::new();
        for _ in 0..200 {
            // drain only once render has caught up, so no block is ever stale
            while playback.render_index() != playback.playback_index() {
                thread::yield_now();
            }
            let block: Vec<i16> = (0..B).map(|_| playback.next_sample()).collect();
            assert!(block.iter().all(|&s| s == block[0]), "torn block {block:?}");
            firsts.push(block[0]);
        }
        stop.store(true, Ordering::Relaxed);
        assert!(renderer.join().is_ok());

        // blocks 2 and 3 were never rendered before the first lap
        assert_eq!(&firsts[..2], &[0, 0]);
        for (k, &value) in firsts[2..].iter().enumerate() {
            assert_eq!(value, k as i16 + 1);
        }
    }

    #[test]
    fn tick_forwards_gate_edges() {
        let (playback, _render) = block_ring::<4, 4>();
        let mut tick = TickHandler::new(playback, VecDeque::<GateFlags>::new());
        let mut dac: Vec<i16> = Vec::new();
        tick.on_tick(true, true, &mut dac);
        tick.on_tick(true, true, &mut dac);
        tick.on_tick(false, false, &mut dac);

        let sent: Vec<GateFlags> = tick.gates.drain(..).collect();
        assert!(sent[0].is_rising() && sent[0].from_button());
        assert_eq!(sent[1], GateFlags::HIGH);
        assert!(sent[2].is_falling());
    }
}
