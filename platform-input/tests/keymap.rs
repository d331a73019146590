use egui::Key;
use platform_input::{egui_key_to_scancode, RdpScancode};

/// Spot-check the scan code table across every row of the keyboard.
#[test]
fn test_main_block_scancodes() {
    let expected = [
        (Key::Escape, 0x01),
        (Key::Num1, 0x02),
        (Key::Num0, 0x0B),
        (Key::Minus, 0x0C),
        (Key::Equals, 0x0D),
        (Key::Backspace, 0x0E),
        (Key::Tab, 0x0F),
        (Key::Q, 0x10),
        (Key::P, 0x19),
        (Key::OpenBracket, 0x1A),
        (Key::CloseBracket, 0x1B),
        (Key::Enter, 0x1C),
        (Key::A, 0x1E),
        (Key::L, 0x26),
        (Key::Semicolon, 0x27),
        (Key::Quote, 0x28),
        (Key::Backtick, 0x29),
        (Key::Backslash, 0x2B),
        (Key::Z, 0x2C),
        (Key::M, 0x32),
        (Key::Comma, 0x33),
        (Key::Period, 0x34),
        (Key::Slash, 0x35),
        (Key::Space, 0x39),
    ];
    for (key, code) in expected {
        assert_eq!(
            egui_key_to_scancode(key),
            Some(RdpScancode::plain(code)),
            "wrong scan code for {key:?}"
        );
    }
}

#[test]
fn test_function_key_scancodes() {
    // F1-F10 are contiguous; F11/F12 live past the original XT table.
    assert_eq!(egui_key_to_scancode(Key::F1), Some(RdpScancode::plain(0x3B)));
    assert_eq!(egui_key_to_scancode(Key::F10), Some(RdpScancode::plain(0x44)));
    assert_eq!(egui_key_to_scancode(Key::F11), Some(RdpScancode::plain(0x57)));
    assert_eq!(egui_key_to_scancode(Key::F12), Some(RdpScancode::plain(0x58)));
}

#[test]
fn test_navigation_cluster_is_extended() {
    let expected = [
        (Key::Insert, 0x52),
        (Key::Delete, 0x53),
        (Key::Home, 0x47),
        (Key::End, 0x4F),
        (Key::PageUp, 0x49),
        (Key::PageDown, 0x51),
        (Key::ArrowUp, 0x48),
        (Key::ArrowLeft, 0x4B),
        (Key::ArrowRight, 0x4D),
        (Key::ArrowDown, 0x50),
    ];
    for (key, code) in expected {
        assert_eq!(
            egui_key_to_scancode(key),
            Some(RdpScancode::extended(code)),
            "wrong scan code for {key:?}"
        );
    }
}

#[test]
fn test_keys_without_wire_representation() {
    for key in [Key::Copy, Key::Cut, Key::Paste, Key::F24] {
        assert_eq!(egui_key_to_scancode(key), None, "{key:?} should not map");
    }
}
