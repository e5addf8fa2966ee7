use std::{cell::RefCell, rc::Rc};

use crate::{
    asic::IoAsic,
    bus::Bus,
    clock::{Clock, ClockEvent},
    rom::RomImage,
    sound::{BgSoundBoard, SoundBoard, SoundBridge, SoundLink},
    utils::hexdump,
};

/// The board aggregate: bus, clock, and the diagnostic tick counters.
///
/// There is no CPU in here. An emulated 6809 drives the board through
/// `read_byte`/`write_byte`, advances it with `tick`, and samples
/// `irq_line`/`firq_line` for its interrupt inputs.
pub struct Machine {
    pub bus: Rc<RefCell<Bus>>,
    pub clock: Clock,
    frame_count: u16,
    irq_count: u32,
}

impl Machine {
    fn new(bus: Bus) -> Self {
        Self {
            bus: Rc::new(RefCell::new(bus)),
            clock: Clock::new(),
            frame_count: 0,
            irq_count: 0,
        }
    }

    /// Advance the board by `cycles` CPU cycles, delivering any display
    /// refreshes and interrupt requests that come due.
    pub fn tick(&mut self, cycles: u32) {
        let events = self.clock.tick(cycles);
        for event in events {
            match event {
                ClockEvent::FrameTick => {
                    self.bus.borrow_mut().refresh_display();
                    self.frame_count = self.frame_count.wrapping_add(1);
                }
                ClockEvent::IrqAssert => {
                    // Level-triggered: asserting an already-high line is a
                    // no-op, the request simply stays pending.
                    self.bus.borrow_mut().lines.assert_irq();
                    self.irq_count = self.irq_count.wrapping_add(1);
                }
            }
        }
        self.bus.borrow_mut().poll_sound_reply();
    }

    pub fn read_byte(&mut self, addr: u16) -> u8 {
        self.bus.borrow_mut().read_byte(addr)
    }

    pub fn write_byte(&mut self, addr: u16, data: u8) {
        self.bus.borrow_mut().write_byte(addr, data);
    }

    pub fn irq_line(&self) -> bool {
        self.bus.borrow().lines.irq()
    }

    pub fn firq_line(&self) -> bool {
        self.bus.borrow().lines.firq()
    }

    /// Board reset: bank register and working RAM back to zero, counters
    /// cleared. The clock keeps its phase; the timers were armed at
    /// power-up and never stop.
    pub fn reset(&mut self) {
        tracing::debug!("[MCH] machine reset");
        self.bus.borrow_mut().reset();
        self.frame_count = 0;
        self.irq_count = 0;
    }

    pub fn frame_count(&self) -> u16 {
        self.frame_count
    }

    pub fn irq_count(&self) -> u32 {
        self.irq_count
    }

    pub fn total_cycles(&self) -> u64 {
        self.clock.total_cycles()
    }

    pub fn digits(&self) -> [u16; crate::display::DIGITS] {
        *self.bus.borrow().display.digits()
    }

    pub fn ram(&self) -> Vec<u8> {
        self.bus.borrow().ram.as_slice().to_vec()
    }

    pub fn ram_dump(&self, start: u16, end: u16) -> String {
        hexdump(self.bus.borrow().ram.as_slice(), start, end)
    }

    /// Diagnostic snapshot of the board-owned state as JSON.
    pub fn state_json(&self) -> String {
        let bus = self.bus.borrow();
        serde_json::json!({
            "cycles": self.clock.total_cycles(),
            "frame_count": self.frame_count,
            "irq_count": self.irq_count,
            "bank": { "current": bus.bank.current(), "mask": bus.bank.mask() },
            "lines": bus.lines,
            "sound_link": bus.sound.kind(),
            "ram_violations": bus.ram.violations(),
            "digits": bus.display.digits().to_vec(),
        })
        .to_string()
    }
}

/// Assembles a machine from its fixed hardware configuration: the ROM
/// image, the I/O controller, and whichever sound daughterboard this
/// cabinet shipped with.
pub struct MachineBuilder {
    image: RomImage,
    asic: Box<dyn IoAsic>,
    link: SoundLink,
    reply_rides_irq: bool,
}

impl MachineBuilder {
    pub fn new(image: RomImage, asic: Box<dyn IoAsic>) -> Self {
        Self {
            image,
            asic,
            link: SoundLink::Primary(None),
            reply_rides_irq: false,
        }
    }

    /// Populate the WPC sound board socket.
    pub fn sound_board(mut self, board: Box<dyn SoundBoard>) -> Self {
        self.link = SoundLink::Primary(Some(board));
        self
    }

    /// Wire the System 11 background sound adapter instead of the WPC
    /// sound board.
    pub fn bg_sound_board(mut self, board: Box<dyn BgSoundBoard>) -> Self {
        self.link = SoundLink::Legacy(Some(board));
        self
    }

    /// Legacy sound wiring with nothing plugged into the socket.
    pub fn legacy_sound_link(mut self) -> Self {
        self.link = SoundLink::Legacy(None);
        self
    }

    /// Let the sound reply edge assert the ordinary interrupt line as well
    /// as the fast one. Off by default; whether the real board merges the
    /// two is undocumented.
    pub fn reply_rides_irq(mut self, enabled: bool) -> Self {
        self.reply_rides_irq = enabled;
        self
    }

    pub fn build(self) -> Machine {
        tracing::info!(
            "[MCH] configuring board: image {:#x} bytes, {} sound link",
            self.image.len(),
            match self.link {
                SoundLink::Primary(_) => "primary",
                SoundLink::Legacy(_) => "legacy",
            }
        );
        let bus = Bus::new(
            self.image,
            SoundBridge::new(self.link),
            self.asic,
            self.reply_rides_irq,
        );
        Machine::new(bus)
    }
}
