use crate::gb::AddressSpace;
use crate::gb::constants::{AUDIO_REGISTERS_SIZE, AUDIO_REGISTERS_START, UNDEFINED_READ};

/// This register controls CH1's period sweep functionality
pub const AUDIO_SOUND_CHANNEL_1_SWEEP: u16 = 0xFF10;

/// This register controls both the channel's length timer and duty cycle
pub const AUDIO_CHANNEL_1_LENGTH: u16 = 0xFF11;
pub const AUDIO_CHANNEL_1_VOLUME: u16 = 0xFF12;
pub const AUDIO_CHANNEL_1_PERIOD_LOW: u16 = 0xFF13;
pub const AUDIO_CHANNEL_1_PERIOD_HIGH: u16 = 0xFF14;

/// Channel 2 works like channel 1 but lacks the period sweep.
pub const AUDIO_CHANNEL_2_LENGTH: u16 = 0xFF16;
pub const AUDIO_CHANNEL_2_VOLUME: u16 = 0xFF17;
pub const AUDIO_CHANNEL_2_PERIOD_LOW: u16 = 0xFF18;
pub const AUDIO_CHANNEL_2_PERIOD_HIGH: u16 = 0xFF19;

pub const AUDIO_CHANNEL_3_DAC_ENABLE: u16 = 0xFF1A;
pub const AUDIO_CHANNEL_3_LENGTH: u16 = 0xFF1B;
pub const AUDIO_CHANNEL_3_VOLUME: u16 = 0xFF1C;
pub const AUDIO_CHANNEL_3_PERIOD_LOW: u16 = 0xFF1D;
pub const AUDIO_CHANNEL_3_PERIOD_HIGH: u16 = 0xFF1E;

pub const AUDIO_CHANNEL_4_LENGTH: u16 = 0xFF20;
pub const AUDIO_CHANNEL_4_VOLUME: u16 = 0xFF21;
pub const AUDIO_CHANNEL_4_FREQ: u16 = 0xFF22;
pub const AUDIO_CHANNEL_4_CONTROL: u16 = 0xFF23;

pub const AUDIO_MASTER_VOLUME: u16 = 0xFF24;
pub const AUDIO_SOUND_PANNING: u16 = 0xFF25;
pub const AUDIO_MASTER_CONTROL: u16 = 0xFF26;

/// Wave RAM is 16 bytes long; each byte holds two 4-bit samples.
pub const AUDIO_WAVE_PATTERN_START: u16 = 0xFF30;
pub const AUDIO_WAVE_PATTERN_END: u16 = 0xFF3F;

/// Register file of the audio unit. Sound synthesis is not emulated,
/// the registers only keep what has been written so software can read it back.
#[derive(Clone, Debug)]
pub struct AudioRegisters {
    r: [u8; AUDIO_REGISTERS_SIZE],
}

impl Default for AudioRegisters {
    fn default() -> Self {
        Self {
            r: [0; AUDIO_REGISTERS_SIZE],
        }
    }
}

impl AudioRegisters {
    /// Returns the raw register values from 0xFF10 to 0xFF3F.
    pub fn snapshot(&self) -> [u8; AUDIO_REGISTERS_SIZE] {
        self.r
    }

    /// Returns the bits that always read back as 1.
    const fn read_mask(address: u16) -> u8 {
        match address {
            AUDIO_SOUND_CHANNEL_1_SWEEP => 0b1000_0000,
            AUDIO_CHANNEL_1_LENGTH | AUDIO_CHANNEL_2_LENGTH => 0b0011_1111,
            AUDIO_CHANNEL_1_PERIOD_LOW | AUDIO_CHANNEL_2_PERIOD_LOW | AUDIO_CHANNEL_3_PERIOD_LOW => {
                0b1111_1111
            }
            AUDIO_CHANNEL_1_PERIOD_HIGH
            | AUDIO_CHANNEL_2_PERIOD_HIGH
            | AUDIO_CHANNEL_3_PERIOD_HIGH
            | AUDIO_CHANNEL_4_CONTROL => 0b1011_1111,
            AUDIO_CHANNEL_3_DAC_ENABLE => 0b0111_1111,
            AUDIO_CHANNEL_3_LENGTH | AUDIO_CHANNEL_4_LENGTH => 0b1111_1111,
            AUDIO_CHANNEL_3_VOLUME => 0b1001_1111,
            AUDIO_MASTER_CONTROL => 0b0111_0000,
            // Envelopes, noise frequency, master volume and panning are fully readable
            AUDIO_CHANNEL_1_VOLUME
            | AUDIO_CHANNEL_2_VOLUME
            | AUDIO_CHANNEL_4_VOLUME
            | AUDIO_CHANNEL_4_FREQ
            | AUDIO_MASTER_VOLUME
            | AUDIO_SOUND_PANNING => 0b0000_0000,
            _ => 0b0000_0000,
        }
    }

    /// Unused holes inside the audio register area.
    const fn is_unused(address: u16) -> bool {
        matches!(address, 0xFF15 | 0xFF1F | 0xFF27..=0xFF2F)
    }
}

impl AddressSpace for AudioRegisters {
    fn write(&mut self, address: u16, value: u8) {
        if Self::is_unused(address) {
            return;
        }
        if let Some(register) = self.r.get_mut(address.wrapping_sub(AUDIO_REGISTERS_START) as usize) {
            *register = value;
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        if Self::is_unused(address) {
            return UNDEFINED_READ;
        }
        match self.r.get(address.wrapping_sub(AUDIO_REGISTERS_START) as usize) {
            Some(value) => value | Self::read_mask(address),
            None => UNDEFINED_READ,
        }
    }
}
