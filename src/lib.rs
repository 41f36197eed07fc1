pub mod config; // Processor selection and persisted-settings shape
pub mod dsp;
pub mod engine; // Block ring, tick handler, processor dispatch
pub mod io;

pub use config::{ControlMode, ModulatorSettings, ProcessorFunction};
pub use io::gate::GateFlags;

/// The one tick rate everything is tuned for.
pub const SAMPLE_RATE: u32 = 48_000;

/// Samples per render block in the firmware ring.
pub const BLOCK_SIZE: usize = 24;

/// Blocks in the firmware ring.
pub const NUM_BLOCKS: usize = 4;

/// Longest interval (in ticks) a synced oscillator accepts as a clock period.
pub const SYNC_COUNTER_MAX_TIME: u32 = 8 * SAMPLE_RATE;
