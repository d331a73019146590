//! platform-input: map egui input events to wire-level input commands.
//!
//! [`InputTranslator`] consumes the events egui collected for a frame and
//! produces keyboard scan-code and pointer commands ready for the session's
//! send methods. egui never reports modifier keys as key events, so the
//! translator tracks modifier state per event and synthesizes left-modifier
//! press/release pairs when it changes.

mod scancode;

use egui::{Event, Modifiers, MouseWheelUnit, PointerButton};
use rdp_engine::{KeyboardFlags, PointerFlags, WHEEL_ROTATION_MASK};
use tracing::trace;

pub use scancode::{
    egui_key_to_scancode, RdpScancode, SC_LEFT_ALT, SC_LEFT_CTRL, SC_LEFT_GUI, SC_LEFT_SHIFT,
};

/// Wheel rotation units per notch, per the input protocol.
const WHEEL_NOTCH: f32 = 120.0;
/// Scroll distance treated as one notch when egui reports points.
const POINTS_PER_NOTCH: f32 = 24.0;

/// One wire-level input command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    Keyboard { flags: KeyboardFlags, code: u8 },
    Mouse { flags: PointerFlags, x: u16, y: u16 },
}

/// Maps window coordinates (egui points) to desktop coordinates.
/// Defaults to identity, clamped to u16.
pub type CoordMapper = Box<dyn Fn(f32, f32) -> (u16, u16) + Send + Sync>;

#[derive(Debug, Default, Clone, Copy)]
struct ModifierTracker {
    shift: bool,
    ctrl: bool,
    alt: bool,
    gui: bool,
}

impl ModifierTracker {
    /// Emit press/release pairs for any modifier whose state changed.
    fn sync(&mut self, modifiers: &Modifiers, out: &mut Vec<InputCommand>) {
        let mut update = |held: &mut bool, now: bool, sc: RdpScancode| {
            if *held != now {
                *held = now;
                out.push(key_command(sc, now));
            }
        };
        update(&mut self.shift, modifiers.shift, SC_LEFT_SHIFT);
        update(&mut self.ctrl, modifiers.ctrl, SC_LEFT_CTRL);
        update(&mut self.alt, modifiers.alt, SC_LEFT_ALT);
        update(&mut self.gui, modifiers.mac_cmd, SC_LEFT_GUI);
    }

    /// Release everything still held (focus loss).
    fn release_all(&mut self, out: &mut Vec<InputCommand>) {
        let mut release = |held: &mut bool, sc: RdpScancode| {
            if *held {
                *held = false;
                out.push(key_command(sc, false));
            }
        };
        release(&mut self.shift, SC_LEFT_SHIFT);
        release(&mut self.ctrl, SC_LEFT_CTRL);
        release(&mut self.alt, SC_LEFT_ALT);
        release(&mut self.gui, SC_LEFT_GUI);
    }
}

fn key_command(sc: RdpScancode, pressed: bool) -> InputCommand {
    let mut flags = KeyboardFlags::empty();
    if sc.extended {
        flags |= KeyboardFlags::EXTENDED;
    }
    if !pressed {
        flags |= KeyboardFlags::RELEASE;
    }
    InputCommand::Keyboard {
        flags,
        code: sc.code,
    }
}

/// Per-session input translation state.
pub struct InputTranslator {
    coord_mapper: CoordMapper,
    modifiers: ModifierTracker,
    /// Last pointer position, already in desktop coordinates.
    pointer: (u16, u16),
    /// Window size change waiting for the resize debounce to elapse.
    pending_resize: Option<(u32, u32)>,
}

impl Default for InputTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl InputTranslator {
    pub fn new() -> Self {
        Self {
            coord_mapper: Box::new(|x, y| (x.max(0.0) as u16, y.max(0.0) as u16)),
            modifiers: ModifierTracker::default(),
            pointer: (0, 0),
            pending_resize: None,
        }
    }

    /// Override the coordinate mapper (viewport offset and scaling).
    pub fn set_coord_mapper<F>(&mut self, f: F)
    where
        F: Fn(f32, f32) -> (u16, u16) + Send + Sync + 'static,
    {
        self.coord_mapper = Box::new(f);
    }

    /// Record a window size change; the caller decides when the quiet period
    /// has elapsed and takes the latched value.
    pub fn window_resized(&mut self, width: u32, height: u32) {
        self.pending_resize = Some((width, height));
    }

    pub fn pending_resize(&self) -> Option<(u32, u32)> {
        self.pending_resize
    }

    pub fn clear_pending_resize(&mut self) {
        self.pending_resize = None;
    }

    /// Translate one egui event into zero or more wire commands.
    pub fn handle_event(&mut self, event: &Event) -> Vec<InputCommand> {
        let mut out = Vec::new();
        match event {
            Event::PointerMoved(pos) => {
                self.pointer = (self.coord_mapper)(pos.x, pos.y);
                let (x, y) = self.pointer;
                out.push(InputCommand::Mouse {
                    flags: PointerFlags::MOVE,
                    x,
                    y,
                });
            }
            Event::PointerButton {
                pos,
                button,
                pressed,
                modifiers,
            } => {
                self.modifiers.sync(modifiers, &mut out);
                self.pointer = (self.coord_mapper)(pos.x, pos.y);
                let (x, y) = self.pointer;
                if let Some(mut flags) = button_flag(*button) {
                    if *pressed {
                        flags |= PointerFlags::DOWN;
                    }
                    out.push(InputCommand::Mouse { flags, x, y });
                }
            }
            Event::MouseWheel {
                unit,
                delta,
                modifiers,
            } => {
                self.modifiers.sync(modifiers, &mut out);
                let scale = match unit {
                    MouseWheelUnit::Point => 1.0 / POINTS_PER_NOTCH,
                    MouseWheelUnit::Line => 1.0,
                    MouseWheelUnit::Page => 3.0,
                };
                let (x, y) = self.pointer;
                if delta.y != 0.0 {
                    out.push(InputCommand::Mouse {
                        flags: wheel_flags(PointerFlags::WHEEL, delta.y * scale),
                        x,
                        y,
                    });
                }
                if delta.x != 0.0 {
                    out.push(InputCommand::Mouse {
                        flags: wheel_flags(PointerFlags::HWHEEL, delta.x * scale),
                        x,
                        y,
                    });
                }
            }
            Event::Key {
                key,
                physical_key,
                pressed,
                repeat: _,
                modifiers,
            } => {
                self.modifiers.sync(modifiers, &mut out);
                let key = physical_key.unwrap_or(*key);
                match egui_key_to_scancode(key) {
                    Some(sc) => out.push(key_command(sc, *pressed)),
                    None => trace!(?key, "no scan code for key"),
                }
            }
            Event::WindowFocused(false) => {
                self.modifiers.release_all(&mut out);
            }
            _ => {}
        }
        out
    }
}

fn button_flag(button: PointerButton) -> Option<PointerFlags> {
    match button {
        PointerButton::Primary => Some(PointerFlags::BUTTON1),
        PointerButton::Secondary => Some(PointerFlags::BUTTON2),
        PointerButton::Middle => Some(PointerFlags::BUTTON3),
        // Extra buttons need the extended pointer PDU, which we don't send.
        PointerButton::Extra1 | PointerButton::Extra2 => None,
    }
}

/// Encode a signed notch count as the 9-bit two's complement rotation the
/// wire format uses; the sign bit doubles as the negative-wheel flag.
fn wheel_flags(base: PointerFlags, notches: f32) -> PointerFlags {
    let rotation = (notches * WHEEL_NOTCH) as i16 as u16 & WHEEL_ROTATION_MASK;
    base.with_rotation(rotation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Key, Pos2};
    use pretty_assertions::assert_eq;

    fn key_event(key: Key, pressed: bool, modifiers: Modifiers) -> Event {
        Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat: false,
            modifiers,
        }
    }

    #[test]
    fn key_press_and_release_carry_the_release_flag() {
        let mut t = InputTranslator::new();
        let down = t.handle_event(&key_event(Key::A, true, Modifiers::default()));
        assert_eq!(
            down,
            vec![InputCommand::Keyboard {
                flags: KeyboardFlags::empty(),
                code: 0x1E
            }]
        );
        let up = t.handle_event(&key_event(Key::A, false, Modifiers::default()));
        assert_eq!(
            up,
            vec![InputCommand::Keyboard {
                flags: KeyboardFlags::RELEASE,
                code: 0x1E
            }]
        );
    }

    #[test]
    fn extended_keys_carry_the_extended_flag() {
        let mut t = InputTranslator::new();
        let cmds = t.handle_event(&key_event(Key::ArrowLeft, true, Modifiers::default()));
        assert_eq!(
            cmds,
            vec![InputCommand::Keyboard {
                flags: KeyboardFlags::EXTENDED,
                code: 0x4B
            }]
        );
    }

    #[test]
    fn modifier_changes_are_synthesized_before_the_key() {
        let mut t = InputTranslator::new();
        let cmds = t.handle_event(&key_event(Key::C, true, Modifiers::CTRL));
        assert_eq!(
            cmds,
            vec![
                InputCommand::Keyboard {
                    flags: KeyboardFlags::empty(),
                    code: 0x1D
                },
                InputCommand::Keyboard {
                    flags: KeyboardFlags::empty(),
                    code: 0x2E
                },
            ]
        );
        // Releasing ctrl shows up on the next event.
        let cmds = t.handle_event(&key_event(Key::C, false, Modifiers::default()));
        assert_eq!(
            cmds,
            vec![
                InputCommand::Keyboard {
                    flags: KeyboardFlags::RELEASE,
                    code: 0x1D
                },
                InputCommand::Keyboard {
                    flags: KeyboardFlags::RELEASE,
                    code: 0x2E
                },
            ]
        );
    }

    #[test]
    fn focus_loss_releases_held_modifiers() {
        let mut t = InputTranslator::new();
        t.handle_event(&key_event(Key::C, true, Modifiers::CTRL));
        let cmds = t.handle_event(&Event::WindowFocused(false));
        assert_eq!(
            cmds,
            vec![InputCommand::Keyboard {
                flags: KeyboardFlags::RELEASE,
                code: 0x1D
            }]
        );
    }

    #[test]
    fn pointer_motion_goes_through_the_coord_mapper() {
        let mut t = InputTranslator::new();
        t.set_coord_mapper(|x, y| ((x / 2.0) as u16, (y / 2.0) as u16));
        let cmds = t.handle_event(&Event::PointerMoved(Pos2::new(100.0, 60.0)));
        assert_eq!(
            cmds,
            vec![InputCommand::Mouse {
                flags: PointerFlags::MOVE,
                x: 50,
                y: 30
            }]
        );
    }

    #[test]
    fn button_press_sets_down_and_release_does_not() {
        let mut t = InputTranslator::new();
        let press = t.handle_event(&Event::PointerButton {
            pos: Pos2::new(10.0, 20.0),
            button: PointerButton::Secondary,
            pressed: true,
            modifiers: Modifiers::default(),
        });
        assert_eq!(
            press,
            vec![InputCommand::Mouse {
                flags: PointerFlags::BUTTON2 | PointerFlags::DOWN,
                x: 10,
                y: 20
            }]
        );
        let release = t.handle_event(&Event::PointerButton {
            pos: Pos2::new(10.0, 20.0),
            button: PointerButton::Secondary,
            pressed: false,
            modifiers: Modifiers::default(),
        });
        assert_eq!(
            release,
            vec![InputCommand::Mouse {
                flags: PointerFlags::BUTTON2,
                x: 10,
                y: 20
            }]
        );
    }

    #[test]
    fn wheel_up_encodes_a_positive_notch() {
        let mut t = InputTranslator::new();
        let cmds = t.handle_event(&Event::MouseWheel {
            unit: MouseWheelUnit::Line,
            delta: egui::Vec2::new(0.0, 1.0),
            modifiers: Modifiers::default(),
        });
        let InputCommand::Mouse { flags, .. } = cmds[0] else {
            panic!("expected a mouse command");
        };
        assert!(flags.contains(PointerFlags::WHEEL));
        assert!(!flags.contains(PointerFlags::WHEEL_NEGATIVE));
        assert_eq!(flags.rotation(), 120);
    }

    #[test]
    fn wheel_down_sets_the_sign_bit_in_twos_complement() {
        let mut t = InputTranslator::new();
        let cmds = t.handle_event(&Event::MouseWheel {
            unit: MouseWheelUnit::Line,
            delta: egui::Vec2::new(0.0, -1.0),
            modifiers: Modifiers::default(),
        });
        let InputCommand::Mouse { flags, .. } = cmds[0] else {
            panic!("expected a mouse command");
        };
        assert!(flags.contains(PointerFlags::WHEEL));
        assert!(flags.contains(PointerFlags::WHEEL_NEGATIVE));
        // -120 truncated to 9 bits.
        assert_eq!(flags.bits() & WHEEL_ROTATION_MASK, (-120i16 as u16) & 0x1FF);
    }

    #[test]
    fn resize_latch_holds_the_most_recent_size() {
        let mut t = InputTranslator::new();
        assert_eq!(t.pending_resize(), None);
        t.window_resized(1280, 720);
        t.window_resized(1400, 900);
        assert_eq!(t.pending_resize(), Some((1400, 900)));
        t.clear_pending_resize();
        assert_eq!(t.pending_resize(), None);
    }
}
