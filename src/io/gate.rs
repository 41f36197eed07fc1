use std::ops::{BitOr, BitOrAssign};

/// Per-sample gate/trigger state, as delivered by the gate input driver.
///
/// Edges are only present on the sample where the transition happened;
/// `HIGH` follows the level.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GateFlags(pub u8);

impl GateFlags {
    pub const LOW: GateFlags = GateFlags(0);
    pub const HIGH: GateFlags = GateFlags(1);
    pub const RISING: GateFlags = GateFlags(2);
    pub const FALLING: GateFlags = GateFlags(4);
    /// The edge came from the panel button (tap tempo), not the jack.
    pub const FROM_BUTTON: GateFlags = GateFlags(8);

    /// Derive this sample's flags from the previous flags and the current level.
    pub fn extract(previous: GateFlags, high: bool) -> GateFlags {
        match (previous.contains(GateFlags::HIGH), high) {
            (false, true) => GateFlags::RISING | GateFlags::HIGH,
            (true, true) => GateFlags::HIGH,
            (true, false) => GateFlags::FALLING,
            (false, false) => GateFlags::LOW,
        }
    }

    #[inline]
    pub const fn contains(self, other: GateFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_high(self) -> bool {
        self.contains(GateFlags::HIGH)
    }

    #[inline]
    pub const fn is_rising(self) -> bool {
        self.contains(GateFlags::RISING)
    }

    #[inline]
    pub const fn is_falling(self) -> bool {
        self.contains(GateFlags::FALLING)
    }

    #[inline]
    pub const fn from_button(self) -> bool {
        self.contains(GateFlags::FROM_BUTTON)
    }
}

impl BitOr for GateFlags {
    type Output = GateFlags;

    fn bitor(self, rhs: GateFlags) -> GateFlags {
        GateFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for GateFlags {
    fn bitor_assign(&mut self, rhs: GateFlags) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges(levels: &[bool]) -> Vec<GateFlags> {
        let mut previous = GateFlags::LOW;
        levels
            .iter()
            .map(|&high| {
                previous = GateFlags::extract(previous, high);
                previous
            })
            .collect()
    }

    #[test]
    fn rising_edge_is_reported_once() {
        let flags = edges(&[false, true, true, true]);
        assert_eq!(flags[0], GateFlags::LOW);
        assert_eq!(flags[1], GateFlags::RISING | GateFlags::HIGH);
        assert_eq!(flags[2], GateFlags::HIGH);
        assert_eq!(flags[3], GateFlags::HIGH);
    }

    #[test]
    fn falling_edge_drops_high() {
        let flags = edges(&[true, false, false]);
        assert!(flags[0].is_rising());
        assert!(flags[1].is_falling());
        assert!(!flags[1].is_high());
        assert_eq!(flags[2], GateFlags::LOW);
    }

    #[test]
    fn button_flag_survives_or() {
        let flags = GateFlags::extract(GateFlags::LOW, true) | GateFlags::FROM_BUTTON;
        assert!(flags.is_rising());
        assert!(flags.from_button());
    }
}
