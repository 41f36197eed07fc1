//! Fixed-point table lookup and blending helpers.
//!
//! Phases are full-range `u32` values (one wrap = one period). Tables are
//! indexed by the top bits of the phase and linearly interpolated with the
//! next bits as a 16-bit fraction.

/// Lookup in a 257-entry unsigned table: 8 index bits, 16 fraction bits.
#[inline]
pub fn interpolate824_u(table: &[u16; 257], phase: u32) -> u16 {
    let index = (phase >> 24) as usize;
    let a = table[index] as i32;
    let b = table[index + 1] as i32;
    let frac = ((phase >> 8) & 0xffff) as i32;
    (a + ((b - a) * frac >> 16)) as u16
}

/// Lookup in a 257-entry signed table: 8 index bits, 16 fraction bits.
#[inline]
pub fn interpolate824(table: &[i16; 257], phase: u32) -> i16 {
    let index = (phase >> 24) as usize;
    let a = table[index] as i32;
    let b = table[index + 1] as i32;
    let frac = ((phase >> 8) & 0xffff) as i32;
    (a + ((b - a) * frac >> 16)) as i16
}

/// Lookup in a 1025-entry signed table: 10 index bits, 16 fraction bits.
#[inline]
pub fn interpolate1022(table: &[i16; 1025], phase: u32) -> i16 {
    let index = (phase >> 22) as usize;
    let a = table[index] as i32;
    let b = table[index + 1] as i32;
    let frac = ((phase >> 6) & 0xffff) as i32;
    (a + ((b - a) * frac >> 16)) as i16
}

/// Blend two unsigned values; `balance == 0` is all `a`, `65535` is (almost) all `b`.
#[inline]
pub fn mix(a: u16, b: u16, balance: u16) -> u16 {
    let a = a as u32;
    let b = b as u32;
    let balance = balance as u32;
    ((a * (65535 - balance) + b * balance) >> 16) as u16
}

/// Signed crossfade with a Q15 balance.
#[inline]
pub fn crossfade(a: i32, b: i32, balance: i32) -> i32 {
    a + (((b - a) as i64 * balance as i64) >> 15) as i32
}

/// Bipolar triangle from a phase: rises over the first half, falls over the second.
#[inline]
pub fn triangle_phase(phase: u32) -> u32 {
    if phase < (1 << 31) {
        phase << 1
    } else {
        !(phase << 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolate824_hits_table_points() {
        let mut table = [0u16; 257];
        for (i, v) in table.iter_mut().enumerate() {
            *v = (i * 256).min(65535) as u16;
        }
        assert_eq!(interpolate824_u(&table, 0), 0);
        assert_eq!(interpolate824_u(&table, 10 << 24), 2560);
        // Halfway between entries 10 and 11
        assert_eq!(interpolate824_u(&table, (10 << 24) | (1 << 23)), 2560 + 128);
    }

    #[test]
    fn mix_endpoints() {
        assert_eq!(mix(1000, 60000, 0), 999);
        assert!(mix(1000, 60000, 65535) >= 59999);
        assert_eq!(mix(0, 0, 30000), 0);
    }

    #[test]
    fn crossfade_is_q15() {
        assert_eq!(crossfade(0, 32768, 16384), 16384);
        assert_eq!(crossfade(-100, 100, 0), -100);
    }

    #[test]
    fn triangle_peaks_at_half_phase() {
        assert_eq!(triangle_phase(0), 0);
        assert!(triangle_phase((1 << 31) - 1) > u32::MAX - 4);
        assert!(triangle_phase(u32::MAX) < 4);
    }
}
