pub mod processor;
pub mod scheduler;

use std::collections::VecDeque;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer};

use crate::{io::GateFlags, BLOCK_SIZE, NUM_BLOCKS};

pub use self::{
    processor::Processors,
    scheduler::{block_ring, with_positions, PlaybackSide, RenderSide, TickHandler},
};

/// Tick side of the gate queue. A full queue drops the flags.
pub trait GateSender {
    fn send(&mut self, flags: GateFlags);
}

/// Render side of the gate queue.
pub trait GateReceiver {
    fn pop(&mut self) -> Option<GateFlags>;
}

#[cfg(feature = "rtrb")]
impl GateSender for Producer<GateFlags> {
    fn send(&mut self, flags: GateFlags) {
        let _ = self.push(flags);
    }
}

#[cfg(feature = "rtrb")]
impl GateReceiver for Consumer<GateFlags> {
    fn pop(&mut self) -> Option<GateFlags> {
        Consumer::pop(self).ok()
    }
}

impl GateSender for VecDeque<GateFlags> {
    fn send(&mut self, flags: GateFlags) {
        self.push_back(flags);
    }
}

impl GateReceiver for VecDeque<GateFlags> {
    fn pop(&mut self) -> Option<GateFlags> {
        self.pop_front()
    }
}

/// The render loop: owns the processors and keeps the ring topped up.
pub struct ModulationEngine<R, const N: usize = NUM_BLOCKS, const B: usize = BLOCK_SIZE> {
    processors: Processors,
    ring: RenderSide<N, B>,
    gates: R,
    held: GateFlags,
}

impl<R: GateReceiver, const N: usize, const B: usize> ModulationEngine<R, N, B> {
    pub fn new(processors: Processors, ring: RenderSide<N, B>, gates: R) -> Self {
        Self {
            processors,
            ring,
            gates,
            held: GateFlags::LOW,
        }
    }

    /// Render every block the ring has room for. Returns how many.
    ///
    /// Each sample takes one gate entry from the queue. When the queue is
    /// dry the last level is held, without edges.
    pub fn render_pending(&mut self) -> usize {
        let mut rendered = 0;
        while self.ring.is_pending() {
            let mut gate = [GateFlags::LOW; B];
            for flags in gate.iter_mut() {
                *flags = match self.gates.pop() {
                    Some(next) => next,
                    None => GateFlags(self.held.0 & GateFlags::HIGH.0),
                };
                self.held = *flags;
            }

            let processors = &mut self.processors;
            self.ring
                .render_block(|block| processors.process(&gate, block));
            rendered += 1;
        }
        rendered
    }

    pub fn processors(&self) -> &Processors {
        &self.processors
    }

    pub fn processors_mut(&mut self) -> &mut Processors {
        &mut self.processors
    }

    pub fn render_index(&self) -> usize {
        self.ring.render_index()
    }
}
