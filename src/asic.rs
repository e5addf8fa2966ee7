/// Callback surface the board registers with the I/O controller.
///
/// The controller invokes these while it decodes its own register traffic;
/// every call completes synchronously within the same bus access.
pub trait AsicHooks {
    /// The game wrote the ROM bank register.
    fn bank_select(&mut self, bank: u8);
    /// The periodic interrupt has been serviced; drop the request line.
    fn clear_irq(&mut self);
    /// The fast interrupt has been serviced; drop the request line.
    fn clear_firq(&mut self);

    fn sound_ctrl_read(&mut self) -> u8;
    fn sound_ctrl_write(&mut self, data: u8);
    fn sound_data_read(&mut self) -> u8;
    fn sound_data_write(&mut self, data: u8);
    /// Single-call strobe cycle used by the System 11 adapter board.
    fn sound_s11_write(&mut self, data: u8);
}

/// Observable surface of the WPC I/O controller ASIC.
///
/// Register semantics live entirely in the implementation; the board only
/// routes the `0x3fb0..=0x3fff` window here and reacts to the callbacks the
/// controller raises through [`AsicHooks`].
pub trait IoAsic {
    /// Register read at `offset` into the controller window.
    fn read(&mut self, offset: u8, hooks: &mut dyn AsicHooks) -> u8;
    /// Register write at `offset` into the controller window.
    fn write(&mut self, offset: u8, value: u8, hooks: &mut dyn AsicHooks);

    /// Accumulated segment state for one display position (0..=35).
    fn segment_state(&self, index: usize) -> u16;
    /// Throw away the accumulated segment state after a display latch.
    fn clear_segment_state(&mut self);

    fn memprotect_active(&self) -> bool;
    fn memprotect_mask(&self) -> u16;

    fn reset(&mut self) {}
}
