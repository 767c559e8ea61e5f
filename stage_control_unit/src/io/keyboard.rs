//! Jog keyboard snapshot.
//!
//! Button lines are sampled every tick regardless of the enable line, so the
//! Disable long press and the Service cancel still see them. The enable line
//! only gates jogging.

use stage_common::motor::state::Button;

use crate::hal::PanelIo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Keyboard {
    pressed: [bool; 6],
    enabled: bool,
    keystep: bool,
}

impl Keyboard {
    /// No key held, jogging disabled.
    pub const fn new() -> Self {
        Self {
            pressed: [false; 6],
            enabled: false,
            keystep: false,
        }
    }

    /// Sample all six active-low lines.
    pub fn poll<P: PanelIo>(&mut self, panel: &mut P) {
        let was_pressed = self.any_pressed();
        for button in Button::ALL {
            self.pressed[button.index()] = !panel.button_line(button);
        }
        self.keystep = !was_pressed && self.any_pressed();
    }

    #[inline]
    pub const fn is_pressed(&self, button: Button) -> bool {
        self.pressed[button.index()]
    }

    #[inline]
    pub fn any_pressed(&self) -> bool {
        self.pressed.iter().any(|&p| p)
    }

    pub fn pressed_count(&self) -> usize {
        self.pressed.iter().filter(|&&p| p).count()
    }

    /// A key went down this tick with none held the tick before.
    #[inline]
    pub const fn keystep(&self) -> bool {
        self.keystep
    }

    #[inline]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// The only held button, if exactly one is held.
    pub fn single_pressed(&self) -> Option<Button> {
        if self.pressed_count() != 1 {
            return None;
        }
        Button::ALL.into_iter().find(|&b| self.is_pressed(b))
    }

    /// Button to jog with: a single held button while the keyboard is enabled.
    pub fn jog_button(&self) -> Option<Button> {
        if self.enabled { self.single_pressed() } else { None }
    }
}
