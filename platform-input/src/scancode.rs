//! PS/2 scan code set 1 mapping for egui keys.

use egui::Key;

/// A wire-level key code: the set-1 make code plus the extended-key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RdpScancode {
    pub code: u8,
    pub extended: bool,
}

impl RdpScancode {
    pub const fn plain(code: u8) -> Self {
        Self {
            code,
            extended: false,
        }
    }

    pub const fn extended(code: u8) -> Self {
        Self {
            code,
            extended: true,
        }
    }
}

/// Left-modifier make codes, synthesized from egui modifier-state changes.
pub const SC_LEFT_SHIFT: RdpScancode = RdpScancode::plain(0x2A);
pub const SC_LEFT_CTRL: RdpScancode = RdpScancode::plain(0x1D);
pub const SC_LEFT_ALT: RdpScancode = RdpScancode::plain(0x38);
pub const SC_LEFT_GUI: RdpScancode = RdpScancode::extended(0x5B);

/// Map an egui key to its scan code. Returns `None` for keys with no wire
/// representation (media keys, clipboard pseudo-keys, etc.).
pub fn egui_key_to_scancode(key: Key) -> Option<RdpScancode> {
    use RdpScancode as Sc;
    let sc = match key {
        Key::Escape => Sc::plain(0x01),
        Key::Num1 => Sc::plain(0x02),
        Key::Num2 => Sc::plain(0x03),
        Key::Num3 => Sc::plain(0x04),
        Key::Num4 => Sc::plain(0x05),
        Key::Num5 => Sc::plain(0x06),
        Key::Num6 => Sc::plain(0x07),
        Key::Num7 => Sc::plain(0x08),
        Key::Num8 => Sc::plain(0x09),
        Key::Num9 => Sc::plain(0x0A),
        Key::Num0 => Sc::plain(0x0B),
        Key::Minus => Sc::plain(0x0C),
        Key::Equals => Sc::plain(0x0D),
        Key::Backspace => Sc::plain(0x0E),
        Key::Tab => Sc::plain(0x0F),

        Key::Q => Sc::plain(0x10),
        Key::W => Sc::plain(0x11),
        Key::E => Sc::plain(0x12),
        Key::R => Sc::plain(0x13),
        Key::T => Sc::plain(0x14),
        Key::Y => Sc::plain(0x15),
        Key::U => Sc::plain(0x16),
        Key::I => Sc::plain(0x17),
        Key::O => Sc::plain(0x18),
        Key::P => Sc::plain(0x19),
        Key::OpenBracket => Sc::plain(0x1A),
        Key::CloseBracket => Sc::plain(0x1B),
        Key::Enter => Sc::plain(0x1C),

        Key::A => Sc::plain(0x1E),
        Key::S => Sc::plain(0x1F),
        Key::D => Sc::plain(0x20),
        Key::F => Sc::plain(0x21),
        Key::G => Sc::plain(0x22),
        Key::H => Sc::plain(0x23),
        Key::J => Sc::plain(0x24),
        Key::K => Sc::plain(0x25),
        Key::L => Sc::plain(0x26),
        Key::Semicolon => Sc::plain(0x27),
        Key::Quote => Sc::plain(0x28),
        Key::Backtick => Sc::plain(0x29),
        Key::Backslash => Sc::plain(0x2B),

        Key::Z => Sc::plain(0x2C),
        Key::X => Sc::plain(0x2D),
        Key::C => Sc::plain(0x2E),
        Key::V => Sc::plain(0x2F),
        Key::B => Sc::plain(0x30),
        Key::N => Sc::plain(0x31),
        Key::M => Sc::plain(0x32),
        Key::Comma => Sc::plain(0x33),
        Key::Period => Sc::plain(0x34),
        Key::Slash => Sc::plain(0x35),

        Key::Space => Sc::plain(0x39),

        Key::F1 => Sc::plain(0x3B),
        Key::F2 => Sc::plain(0x3C),
        Key::F3 => Sc::plain(0x3D),
        Key::F4 => Sc::plain(0x3E),
        Key::F5 => Sc::plain(0x3F),
        Key::F6 => Sc::plain(0x40),
        Key::F7 => Sc::plain(0x41),
        Key::F8 => Sc::plain(0x42),
        Key::F9 => Sc::plain(0x43),
        Key::F10 => Sc::plain(0x44),
        Key::F11 => Sc::plain(0x57),
        Key::F12 => Sc::plain(0x58),

        // Navigation cluster and arrows carry the extended prefix.
        Key::Insert => Sc::extended(0x52),
        Key::Delete => Sc::extended(0x53),
        Key::Home => Sc::extended(0x47),
        Key::End => Sc::extended(0x4F),
        Key::PageUp => Sc::extended(0x49),
        Key::PageDown => Sc::extended(0x51),
        Key::ArrowUp => Sc::extended(0x48),
        Key::ArrowLeft => Sc::extended(0x4B),
        Key::ArrowRight => Sc::extended(0x4D),
        Key::ArrowDown => Sc::extended(0x50),

        _ => return None,
    };
    Some(sc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_to_set1_make_codes() {
        assert_eq!(egui_key_to_scancode(Key::A), Some(RdpScancode::plain(0x1E)));
        assert_eq!(egui_key_to_scancode(Key::Z), Some(RdpScancode::plain(0x2C)));
    }

    #[test]
    fn navigation_keys_are_extended() {
        let del = egui_key_to_scancode(Key::Delete).unwrap();
        assert!(del.extended);
        assert_eq!(del.code, 0x53);
    }

    #[test]
    fn unmapped_keys_yield_none() {
        assert_eq!(egui_key_to_scancode(Key::F20), None);
    }
}
