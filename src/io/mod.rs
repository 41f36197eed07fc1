// Purpose - the two byte-wide seams to the outside world: gate flags in, DAC samples out

pub mod dac;
pub mod gate;

pub use dac::DacSink;
pub use gate::GateFlags;
