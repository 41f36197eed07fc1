use crate::{
    config::ControlMode,
    dsp::{random::Random, ModulationSource},
    io::GateFlags,
};

/*
Shift-Register Sequencer
========================

A 32-bit register that turns once per trigger. Its low byte is the output,
held until the next trigger. Left alone it loops; with some probability the
bit coming round gets flipped, so the loop slowly mutates.

    length = 5, probability = 0:

      bit:  31 .......... 5 | 4 3 2 1 0
            remainder       | window
                            |       ↓ bit 0 falls off...
                            | ↑ ...and comes back in at bit 4

The window (bits 0..length) rotates right by one. The bits above the window
rotate among themselves, so a shorter loop does not destroy the rest of the
register and lengthening it again brings the old pattern back.

    output = offset + (low byte * span) >> 9

Length changes are latched on the next trigger, never mid-rotation. The
register is seeded from the random source by `init`; otherwise only
`reseed` replaces it.
*/

pub const MIN_LENGTH: u8 = 2;
pub const MAX_LENGTH: u8 = 32;

/// Nonzero stand-in for a zero seed, which would never produce anything.
const FALLBACK_SEED: u32 = 0xace1_ace1;

#[derive(Debug, Clone)]
pub struct TuringMachine {
    shift_register: u32,
    length: u8,
    pending_length: u8,
    probability: u16,
    offset: i16,
    span: u16,
    output: i16,
    rng: Random,
}

impl TuringMachine {
    pub fn new() -> Self {
        Self::with_random(Random::new())
    }

    pub fn with_random(rng: Random) -> Self {
        let mut machine = Self {
            shift_register: 0,
            length: 16,
            pending_length: 16,
            probability: 0,
            offset: 0,
            span: u16::MAX,
            output: 0,
            rng,
        };
        machine.init();
        machine
    }

    /// Fresh random register, default length, no mutation.
    pub fn init(&mut self) {
        self.length = 16;
        self.pending_length = 16;
        self.probability = 0;
        self.offset = 0;
        self.span = u16::MAX;
        self.output = 0;
        let seed = self.rng.word();
        self.reseed(seed);
    }

    /// Replace the register contents. A zero seed is swapped for a fixed pattern.
    pub fn reseed(&mut self, seed: u32) {
        self.shift_register = if seed == 0 { FALLBACK_SEED } else { seed };
        log::debug!("shift register reseeded to {:#010x}", self.shift_register);
    }

    /// Loop length in bits, clamped to 2..=32. Takes effect on the next trigger.
    pub fn set_length(&mut self, length: u8) {
        self.pending_length = length.clamp(MIN_LENGTH, MAX_LENGTH);
    }

    /// Chance of flipping the recycled bit, out of 65535.
    pub fn set_probability(&mut self, probability: u16) {
        self.probability = probability;
    }

    pub fn set_offset(&mut self, offset: i16) {
        self.offset = offset;
    }

    pub fn set_span(&mut self, span: u16) {
        self.span = span;
    }

    pub fn shift_register(&self) -> u32 {
        self.shift_register
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn pending_length(&self) -> u8 {
        self.pending_length
    }

    pub fn process_one(&mut self, gate: GateFlags) -> i16 {
        if gate.is_rising() {
            self.length = self.pending_length;
            self.shift_register = rotate_window(self.shift_register, self.length);

            let flip = self.probability == u16::MAX
                || ((self.rng.word() >> 16) as u16) < self.probability;
            if flip {
                self.shift_register ^= 1;
            }

            let byte = (self.shift_register & 0xff) as i32;
            let value = self.offset as i32 + ((byte * self.span as i32) >> 9);
            self.output = value.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        }
        self.output
    }
}

impl Default for TuringMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModulationSource for TuringMachine {
    fn configure(&mut self, parameters: &[u16; 4], control_mode: ControlMode) {
        let [p0, p1, p2, p3] = *parameters;
        self.set_probability(p0);
        self.set_length(MIN_LENGTH + ((p1 as u32 * 31) >> 16) as u8);
        match control_mode {
            ControlMode::Half => {
                self.set_offset(0);
                self.set_span(u16::MAX);
            }
            ControlMode::Full => {
                self.set_offset((p2 as i32 - 32768) as i16);
                self.set_span(p3);
            }
        }
    }

    fn process_sample(&mut self, gate: GateFlags) -> i16 {
        self.process_one(gate)
    }
}

/// Rotate bits `0..length` right by one; bits `length..32` rotate on their own.
fn rotate_window(register: u32, length: u8) -> u32 {
    let length = length.clamp(MIN_LENGTH, MAX_LENGTH) as u32;
    if length == 32 {
        return register.rotate_right(1);
    }
    let lsb = register & 1;
    let remainder_lsb = (register >> length) & 1;
    let mut rotated = register >> 1;
    rotated = (rotated & !(1 << (length - 1))) | (lsb << (length - 1));
    rotated = (rotated & !(1 << 31)) | (remainder_lsb << 31);
    rotated
}
