//! Messages between the UI, render and audio threads
//!
//! Everything here is `Copy` so it can cross an `rtrb` ring without
//! allocating on the realtime side.

use modcore::{ControlMode, ModulatorSettings, ProcessorFunction};

/// Commands sent from the UI thread to the render thread
#[derive(Clone, Copy, Debug)]
pub enum ControlMessage {
    SetFunction(ProcessorFunction),
    SetParameter { index: usize, value: u16 },
    SetControlMode(ControlMode),
    /// Step the shaped envelope through ADSR, AD and loop
    CycleEnvelopeMode,
    /// Step the shaped envelope's attack curve
    CycleAttackShape,
    /// Step the shaped envelope's decay curve
    CycleDecayShape,
    ToggleHardReset,
    /// Fresh random register for the shift-register sequencer
    Reseed,
    Quit,
}

/// Gate events sent from the UI thread to the audio callback
#[derive(Clone, Copy, Debug)]
pub enum GateCommand {
    /// Panel button press (tap tempo)
    Tap,
    /// Start or stop the internal clock feeding the gate input
    ToggleClock,
}

/// Snapshot published by the render thread after each pass
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusUpdate {
    pub settings: ModulatorSettings,
    /// Learned clock period in ticks, for the functions that follow a clock
    pub period: Option<u32>,
    pub envelope_mode: &'static str,
    pub attack_shape: &'static str,
    pub decay_shape: &'static str,
    pub hard_reset: bool,
    pub blocks_rendered: u64,
}
