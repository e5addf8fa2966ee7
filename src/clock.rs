/// WPC alphanumeric-generation timing constants
pub const CPU_CLOCK_HZ: u32 = 2_000_000; // 8 MHz crystal / 4 (68B09E E clock)
pub const FRAME_TICK_HZ: u32 = 60;
pub const IRQ_TICK_HZ: u32 = 976;
pub const CYCLES_PER_FRAME_TICK: u32 = CPU_CLOCK_HZ / FRAME_TICK_HZ;
pub const CYCLES_PER_IRQ: u32 = CPU_CLOCK_HZ / IRQ_TICK_HZ;

/// Event types the clock can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// Display refresh strobe: latch the accumulated segment state and
    /// clear the accumulator.
    FrameTick,
    /// Periodic interrupt request. Level-triggered; the line stays up
    /// until the controller acknowledges it.
    IrqAssert,
}

/// Master clock for the two free-running board timers.
///
/// Both timers are armed at construction with an initial delay equal to
/// their period and rearm themselves forever; nothing ever stops them.
/// Machine reset touches neither the phase nor the total cycle count.
pub struct Clock {
    /// Total CPU cycles executed
    total_cycles: u64,

    /// Cycles left until the next display refresh
    frame_countdown: u32,

    /// Cycles left until the next periodic interrupt
    irq_countdown: u32,
}

impl Clock {
    pub fn new() -> Self {
        Self {
            total_cycles: 0,
            frame_countdown: CYCLES_PER_FRAME_TICK,
            irq_countdown: CYCLES_PER_IRQ,
        }
    }

    /// Advance the clock by the specified number of CPU cycles.
    ///
    /// Returned events are ordered by expiry time; on a shared edge the
    /// frame timer wins because it was armed first.
    pub fn tick(&mut self, cycles: u32) -> Vec<ClockEvent> {
        let mut fired = Vec::new();

        for _ in 0..cycles {
            self.total_cycles += 1;

            self.frame_countdown -= 1;
            if self.frame_countdown == 0 {
                self.frame_countdown = CYCLES_PER_FRAME_TICK;
                fired.push(ClockEvent::FrameTick);
            }

            self.irq_countdown -= 1;
            if self.irq_countdown == 0 {
                self.irq_countdown = CYCLES_PER_IRQ;
                fired.push(ClockEvent::IrqAssert);
            }
        }

        fired
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub fn cycles_until_frame_tick(&self) -> u32 {
        self.frame_countdown
    }

    pub fn cycles_until_irq(&self) -> u32 {
        self.irq_countdown
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
