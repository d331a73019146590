//! Input event flag words, as carried on the wire by the input protocol.

use bitflags::bitflags;

bitflags! {
    /// Keyboard event flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KeyboardFlags: u16 {
        /// Extended key (right ctrl/alt, navigation cluster, etc.).
        const EXTENDED = 0x0100;
        /// Key release; absence means press.
        const RELEASE = 0x8000;
    }
}

bitflags! {
    /// Pointer event flags. The low 9 bits double as the wheel rotation
    /// magnitude, so values outside the named flags are meaningful.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PointerFlags: u16 {
        const WHEEL_NEGATIVE = 0x0100;
        const WHEEL = 0x0200;
        const HWHEEL = 0x0400;
        const MOVE = 0x0800;
        const BUTTON1 = 0x1000; // left
        const BUTTON2 = 0x2000; // right
        const BUTTON3 = 0x4000; // middle
        const DOWN = 0x8000;
    }
}

/// Mask for the 9-bit wheel rotation magnitude embedded in the flags word.
pub const WHEEL_ROTATION_MASK: u16 = 0x01FF;

impl PointerFlags {
    /// Combine a wheel flag with a rotation magnitude, masking to 9 bits.
    pub fn with_rotation(self, magnitude: u16) -> Self {
        Self::from_bits_retain(self.bits() | (magnitude & WHEEL_ROTATION_MASK))
    }

    /// Rotation magnitude carried in the low bits.
    pub fn rotation(self) -> u16 {
        self.bits() & WHEEL_ROTATION_MASK & !Self::WHEEL_NEGATIVE.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rotation_is_masked_to_nine_bits() {
        let f = PointerFlags::WHEEL.with_rotation(0x3FF);
        assert!(f.contains(PointerFlags::WHEEL));
        assert_eq!(f.bits() & WHEEL_ROTATION_MASK, 0x1FF);
    }

    #[test]
    fn negative_wheel_keeps_magnitude() {
        let f = PointerFlags::WHEEL
            .union(PointerFlags::WHEEL_NEGATIVE)
            .with_rotation(120);
        assert!(f.contains(PointerFlags::WHEEL_NEGATIVE));
        assert_eq!(f.rotation(), 120);
    }
}
