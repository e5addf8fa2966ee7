use derivative::Derivative;
use serde::{Deserialize, Serialize};

use crate::{
    asic::{AsicHooks, IoAsic},
    display::SegmentDisplay,
    ram::ProtectedRam,
    rom::{BankedRom, FixedRom, RomImage},
    sound::SoundBridge,
};

pub const PROTECTED_RAM_END: u16 = 0x2fff;
pub const FREE_RAM_START: u16 = 0x3000;
pub const FREE_RAM_END: u16 = 0x3faf;
pub const ASIC_START: u16 = 0x3fb0;
pub const ASIC_END: u16 = 0x3fff;
pub const BANKED_ROM_START: u16 = 0x4000;
pub const BANKED_ROM_END: u16 = 0x7fff;
pub const FIXED_ROM_START: u16 = 0x8000;

const FREE_RAM_SIZE: usize = (FREE_RAM_END - FREE_RAM_START + 1) as usize;

/// The two interrupt inputs of the 6809, viewed from the board side.
///
/// Both are level-triggered: this board only ever asserts, and only the
/// I/O controller's acknowledge callbacks clear. The periodic timer feeds
/// `irq`; the sound board's reply edge feeds `firq`. They are deliberately
/// separate channels, not one merged signal.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InterruptLines {
    irq: bool,
    firq: bool,
}

impl InterruptLines {
    pub fn assert_irq(&mut self) {
        self.irq = true;
    }

    pub fn clear_irq(&mut self) {
        self.irq = false;
    }

    pub fn assert_firq(&mut self) {
        self.firq = true;
    }

    pub fn clear_firq(&mut self) {
        self.firq = false;
    }

    pub fn irq(&self) -> bool {
        self.irq
    }

    pub fn firq(&self) -> bool {
        self.firq
    }
}

/// The address decoder tying the board together.
///
/// Every CPU address resolves to exactly one region: protected RAM, free
/// RAM, the controller register window, the banked ROM window, or fixed
/// ROM. The controller's callbacks land back here through [`BusHooks`].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Bus {
    pub ram: ProtectedRam,
    free_ram: Vec<u8>,
    pub bank: BankedRom,
    fixed: FixedRom,
    pub sound: SoundBridge,
    pub display: SegmentDisplay,
    pub lines: InterruptLines,
    #[derivative(Debug = "ignore")]
    asic: Box<dyn IoAsic>,
    reply_rides_irq: bool,
}

impl Bus {
    pub fn new(
        image: RomImage,
        sound: SoundBridge,
        asic: Box<dyn IoAsic>,
        reply_rides_irq: bool,
    ) -> Self {
        Self {
            ram: ProtectedRam::new(),
            free_ram: vec![0; FREE_RAM_SIZE],
            bank: BankedRom::new(image.clone()),
            fixed: FixedRom::new(image),
            sound,
            display: SegmentDisplay::new(),
            lines: InterruptLines::default(),
            asic,
            reply_rides_irq,
        }
    }

    pub fn read_byte(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=PROTECTED_RAM_END => self.ram.read(addr),
            FREE_RAM_START..=FREE_RAM_END => self.free_ram[(addr - FREE_RAM_START) as usize],
            ASIC_START..=ASIC_END => {
                let value = {
                    let Bus {
                        asic,
                        bank,
                        sound,
                        lines,
                        ..
                    } = self;
                    let mut hooks = BusHooks { bank, sound, lines };
                    asic.read((addr - ASIC_START) as u8, &mut hooks)
                };
                self.poll_sound_reply();
                value
            }
            BANKED_ROM_START..=BANKED_ROM_END => self.bank.read(addr - BANKED_ROM_START),
            FIXED_ROM_START..=0xffff => self.fixed.read(addr - FIXED_ROM_START),
        }
    }

    pub fn write_byte(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=PROTECTED_RAM_END => {
                let active = self.asic.memprotect_active();
                let mask = self.asic.memprotect_mask();
                self.ram.write(addr, data, active, mask);
            }
            FREE_RAM_START..=FREE_RAM_END => {
                self.free_ram[(addr - FREE_RAM_START) as usize] = data;
            }
            ASIC_START..=ASIC_END => {
                {
                    let Bus {
                        asic,
                        bank,
                        sound,
                        lines,
                        ..
                    } = self;
                    let mut hooks = BusHooks { bank, sound, lines };
                    asic.write((addr - ASIC_START) as u8, data, &mut hooks);
                }
                self.poll_sound_reply();
            }
            BANKED_ROM_START..=0xffff => {
                tracing::trace!("[BUS] write {:#04x} to ROM address {:#06x} ignored", data, addr);
            }
        }
    }

    pub fn write_word(&mut self, address: u16, value: u16) {
        let low_byte = (value & 0x00FF) as u8;
        let high_byte = ((value & 0xFF00) >> 8) as u8;
        self.write_byte(address, low_byte);
        self.write_byte(address.wrapping_add(1), high_byte);
    }

    pub fn read_word(&mut self, address: u16) -> u16 {
        let low_byte = self.read_byte(address) as u16;
        let high_byte = self.read_byte(address.wrapping_add(1)) as u16;
        (high_byte << 8) | low_byte
    }

    /// Display refresh strobe: snapshot the controller's accumulated
    /// segment state into the digit latches, then clear the accumulator.
    pub fn refresh_display(&mut self) {
        let Bus { display, asic, .. } = self;
        display.latch_frame(asic.as_mut());
    }

    /// Sample the sound board's reply line; a rising edge becomes a fast
    /// interrupt. Whether it also rides the ordinary interrupt line is a
    /// machine option, undocumented on the real board.
    pub fn poll_sound_reply(&mut self) {
        if self.sound.poll_reply() {
            tracing::trace!("[SND] reply edge, asserting firq");
            self.lines.assert_firq();
            if self.reply_rides_irq {
                self.lines.assert_irq();
            }
        }
    }

    pub fn reset(&mut self) {
        self.bank.select(0);
        self.ram.clear();
        self.lines = InterruptLines::default();
        self.asic.reset();
    }

    pub fn asic(&self) -> &dyn IoAsic {
        self.asic.as_ref()
    }
}

/// The callback sink handed to the controller on every window access;
/// borrows exactly the state the callbacks are allowed to touch.
struct BusHooks<'a> {
    bank: &'a mut BankedRom,
    sound: &'a mut SoundBridge,
    lines: &'a mut InterruptLines,
}

impl AsicHooks for BusHooks<'_> {
    fn bank_select(&mut self, bank: u8) {
        self.bank.select(bank);
    }

    fn clear_irq(&mut self) {
        self.lines.clear_irq();
    }

    fn clear_firq(&mut self) {
        self.lines.clear_firq();
    }

    fn sound_ctrl_read(&mut self) -> u8 {
        self.sound.ctrl_read()
    }

    fn sound_ctrl_write(&mut self, data: u8) {
        self.sound.ctrl_write(data);
    }

    fn sound_data_read(&mut self) -> u8 {
        self.sound.data_read()
    }

    fn sound_data_write(&mut self, data: u8) {
        self.sound.data_write(data);
    }

    fn sound_s11_write(&mut self, data: u8) {
        self.sound.strobe_write(data);
    }
}
