use crate::gb::interrupt::InterruptRegister;
use crate::gb::utils;

/// The eight buttons of the button matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum JoypadButton {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

/// Holds the state of all eight buttons, true means pressed.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct JoypadInput {
    pub right: bool,
    pub left: bool,
    pub up: bool,
    pub down: bool,
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
}

impl JoypadInput {
    /// Updates the state of a single button.
    pub fn set(&mut self, button: JoypadButton, pressed: bool) {
        let state = match button {
            JoypadButton::Right => &mut self.right,
            JoypadButton::Left => &mut self.left,
            JoypadButton::Up => &mut self.up,
            JoypadButton::Down => &mut self.down,
            JoypadButton::A => &mut self.a,
            JoypadButton::B => &mut self.b,
            JoypadButton::Select => &mut self.select,
            JoypadButton::Start => &mut self.start,
        };
        *state = pressed;
    }

    /// Returns the pressed D-Pad keys as active-high lower nibble.
    const fn dpad_bits(&self) -> u8 {
        (self.right as u8) | (self.left as u8) << 1 | (self.up as u8) << 2 | (self.down as u8) << 3
    }

    /// Returns the pressed action keys as active-high lower nibble.
    const fn action_bits(&self) -> u8 {
        (self.a as u8) | (self.b as u8) << 1 | (self.select as u8) << 2 | (self.start as u8) << 3
    }
}

/// Represents Joypad at register 0xFF00
/// The eight Game Boy action/direction buttons are arranged as a 2x4 matrix.
/// Select either action or direction buttons by writing to this register,
/// then read out the bits 0-3. The lower nibble is Read-only.
/// Note that, rather unconventionally for the Game Boy,
/// a button being pressed is seen as the corresponding bit being 0, not 1.
#[derive(Copy, Clone, Debug)]
pub struct Joypad {
    input: JoypadInput,
    selection: u8, // bit 4-5, a cleared bit selects D-Pad keys or Action keys respectively
}

impl Default for Joypad {
    fn default() -> Self {
        Self {
            input: JoypadInput::default(),
            selection: 0b0011_0000,
        }
    }
}

impl Joypad {
    /// Reads the Joypad register and returns the current state of the buttons.
    pub fn read(&self) -> u8 {
        0b1100_0000 | self.selection | self.lower_nibble()
    }

    /// Selects the button group(s), raises the Joypad interrupt if a line went low.
    pub fn write(&mut self, value: u8, int_reg: &mut InterruptRegister) {
        let before = self.lower_nibble();
        self.selection = value & 0b0011_0000;
        self.check_interrupt(before, int_reg);
    }

    /// Updates the pressed buttons, raises the Joypad interrupt if a line went low.
    pub fn handle_input(&mut self, input: JoypadInput, int_reg: &mut InterruptRegister) {
        let before = self.lower_nibble();
        self.input = input;
        self.check_interrupt(before, int_reg);
    }

    #[inline]
    pub fn input(&self) -> JoypadInput {
        self.input
    }

    /// Returns the active-low lower nibble for the selected groups.
    fn lower_nibble(&self) -> u8 {
        let mut pressed = 0;
        if !utils::bit_at(self.selection, 4) {
            pressed |= self.input.dpad_bits();
        }
        if !utils::bit_at(self.selection, 5) {
            pressed |= self.input.action_bits();
        }
        !pressed & 0b0000_1111
    }

    #[inline]
    fn check_interrupt(&self, before: u8, int_reg: &mut InterruptRegister) {
        if before & !self.lower_nibble() != 0 {
            int_reg.insert(InterruptRegister::JOYPAD);
        }
    }
}
