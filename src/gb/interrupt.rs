bitflags! {
    /// Represents interrupt registers IE at 0xFFFF and IF at 0xFF0F.
    /// The declaration order doubles as the service priority (highest first).
    #[derive(Copy, Clone, PartialEq, Debug, Default)]
    pub struct InterruptRegister: u8 {
        const VBLANK = 0b00000001; // V-Blank Interrupt
        const STAT   = 0b00000010; // LCD STAT Interrupt
        const TIMER  = 0b00000100; // Timer Overflow Interrupt
        const SERIAL = 0b00001000; // Serial Transfer Completion Interrupt
        const JOYPAD = 0b00010000; // Joypad Input Interrupt
    }
}

impl InterruptRegister {
    /// Returns the interrupt with the highest priority.
    #[inline]
    pub fn highest_prio(&self) -> Option<InterruptRegister> {
        self.iter_names().map(|(_, irq)| irq).next()
    }

    /// Returns the fixed address of the service routine for a single interrupt source.
    #[inline]
    pub fn vector(&self) -> Option<u16> {
        match *self {
            InterruptRegister::VBLANK => Some(0x0040),
            InterruptRegister::STAT => Some(0x0048),
            InterruptRegister::TIMER => Some(0x0050),
            InterruptRegister::SERIAL => Some(0x0058),
            InterruptRegister::JOYPAD => Some(0x0060),
            _ => None,
        }
    }
}

/// IME (Interrupt Master Enable) state. The EI instruction enables interrupts
/// only after the next instruction has been executed, which puts it on `ImeState::Pending`.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub enum ImeState {
    #[default]
    Disabled,
    Pending,
    Enabled,
}

/// Holds the requested (IF) and enabled (IE) interrupt sources
/// together with the interrupt master enable.
#[derive(Clone, Default, Debug)]
pub struct InterruptController {
    pub ime: ImeState,
    pub enable: InterruptRegister,
    pub flag: InterruptRegister,
}

impl InterruptController {
    /// Requests the given interrupt source.
    #[inline]
    pub fn raise(&mut self, irq: InterruptRegister) {
        self.flag.insert(irq);
    }

    /// Returns the highest priority source that is both requested and enabled.
    #[inline]
    pub fn pending_interrupt(&self) -> Option<InterruptRegister> {
        (self.flag & self.enable).highest_prio()
    }

    /// Indicates whether any enabled interrupt source is requested, regardless of IME.
    #[inline(always)]
    pub fn has_irq(&self) -> bool {
        self.pending_interrupt().is_some()
    }

    /// Clears exactly the request bit of the given source.
    #[inline]
    pub fn acknowledge(&mut self, irq: InterruptRegister) {
        self.flag.remove(irq);
    }

    #[inline]
    pub fn set_master_enable(&mut self, enabled: bool) {
        self.ime = match enabled {
            true => ImeState::Enabled,
            false => ImeState::Disabled,
        };
    }

    /// Schedules IME to be enabled after the next instruction (EI semantics).
    #[inline]
    pub fn request_delayed_enable(&mut self) {
        if self.ime == ImeState::Disabled {
            self.ime = ImeState::Pending;
        }
    }

    #[inline]
    pub fn is_master_enabled(&self) -> bool {
        self.ime == ImeState::Enabled
    }

    /// Promotes a delayed enable request at an instruction boundary.
    /// Returns true if the request has been committed during this call,
    /// in which case no interrupt may be serviced before the next instruction.
    #[inline]
    pub fn commit_delayed_enable(&mut self) -> bool {
        if self.ime == ImeState::Pending {
            self.ime = ImeState::Enabled;
            return true;
        }
        false
    }
}
