//! Settings handed to the core by an external settings store.
//!
//! The core never persists anything; these types only describe what the
//! store passes in through `Processors::apply_settings`.

/// How many knobs drive the active function.
///
/// `Half` is the 2-knob layout (the other two knobs belong to a sibling
/// channel), `Full` gives the function all four.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlMode {
    #[default]
    Half,
    Full,
}

/// Which modulation source is live.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ProcessorFunction {
    #[default]
    Envelope,
    ShapedEnvelope,
    Lfo,
    TapLfo,
    DualAttackEnvelope,
    RepeatingAttackEnvelope,
    LoopingEnvelope,
    RandomisedEnvelope,
    TuringMachine,
    FmLfo,
    RandomFmLfo,
    WsmLfo,
    RandomWsmLfo,
    Plo,
}

impl ProcessorFunction {
    pub const ALL: [ProcessorFunction; 14] = [
        ProcessorFunction::Envelope,
        ProcessorFunction::ShapedEnvelope,
        ProcessorFunction::Lfo,
        ProcessorFunction::TapLfo,
        ProcessorFunction::DualAttackEnvelope,
        ProcessorFunction::RepeatingAttackEnvelope,
        ProcessorFunction::LoopingEnvelope,
        ProcessorFunction::RandomisedEnvelope,
        ProcessorFunction::TuringMachine,
        ProcessorFunction::FmLfo,
        ProcessorFunction::RandomFmLfo,
        ProcessorFunction::WsmLfo,
        ProcessorFunction::RandomWsmLfo,
        ProcessorFunction::Plo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProcessorFunction::Envelope => "envelope",
            ProcessorFunction::ShapedEnvelope => "shaped envelope",
            ProcessorFunction::Lfo => "lfo",
            ProcessorFunction::TapLfo => "tap lfo",
            ProcessorFunction::DualAttackEnvelope => "dual attack",
            ProcessorFunction::RepeatingAttackEnvelope => "repeating attack",
            ProcessorFunction::LoopingEnvelope => "looping envelope",
            ProcessorFunction::RandomisedEnvelope => "randomised envelope",
            ProcessorFunction::TuringMachine => "turing machine",
            ProcessorFunction::FmLfo => "fm lfo",
            ProcessorFunction::RandomFmLfo => "random fm lfo",
            ProcessorFunction::WsmLfo => "wsm lfo",
            ProcessorFunction::RandomWsmLfo => "random wsm lfo",
            ProcessorFunction::Plo => "plo",
        }
    }

    /// Next function in panel order, wrapping.
    pub fn next(self) -> ProcessorFunction {
        let index = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> ProcessorFunction {
        let index = Self::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Everything needed to restore a channel.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModulatorSettings {
    pub function: ProcessorFunction,
    pub control_mode: ControlMode,
    pub parameters: [u16; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_cycle_wraps_both_ways() {
        assert_eq!(ProcessorFunction::Plo.next(), ProcessorFunction::Envelope);
        assert_eq!(ProcessorFunction::Envelope.previous(), ProcessorFunction::Plo);
        let mut function = ProcessorFunction::Envelope;
        for _ in 0..ProcessorFunction::ALL.len() {
            function = function.next();
        }
        assert_eq!(function, ProcessorFunction::Envelope);
    }
}
