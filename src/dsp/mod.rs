//! Fixed-point modulation primitives.
//!
//! Everything in here is allocation-free after construction and safe to call
//! from the render loop once per sample. State is integer only: phases are
//! wrapping `u32`, levels are 16-bit.

use crate::{config::ControlMode, io::GateFlags};

/// Braids-style ADSR automaton with per-segment shapes and loop mode.
pub mod envelope;
pub mod fixed;
/// Waveform kernels shared by the LFO family.
pub mod kernels;
/// Free-running and tempo-synced LFO.
pub mod lfo;
/// LFOs cross-modulated by a secondary internal oscillator.
pub mod modulated;
/// Gate-driven segment table envelope and its presets.
pub mod multistage;
pub mod pattern_predictor;
pub mod phase;
/// Phase-locked audio-rate oscillator.
pub mod plo;
pub mod random;
pub mod tables;
/// Shift-register sequencer.
pub mod turing;

pub use envelope::{Envelope, EnvelopeMode, EnvelopeShape, Segment};
pub use kernels::{LfoShape, WsmShape};
pub use lfo::Lfo;
pub use modulated::{FmLfo, WsmLfo};
pub use multistage::{MultistageEnvelope, MultistageVariant};
pub use pattern_predictor::PatternPredictor;
pub use phase::PhaseAccumulator;
pub use plo::Plo;
pub use turing::TuringMachine;

/// A per-sample modulation source driven by gate flags and four knobs.
pub trait ModulationSource {
    /// Map raw knob values onto the source's parameters.
    fn configure(&mut self, parameters: &[u16; 4], control_mode: ControlMode);

    /// Advance one tick and return the output sample.
    fn process_sample(&mut self, gate: GateFlags) -> i16;

    /// Fill `out` with one sample per gate entry.
    fn process(&mut self, gate: &[GateFlags], out: &mut [i16]) {
        for (flags, sample) in gate.iter().zip(out.iter_mut()) {
            *sample = self.process_sample(*flags);
        }
    }
}
