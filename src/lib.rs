pub mod asic;
pub mod bus;
pub mod clock;
pub mod display;
pub mod machine;
pub mod ram;
pub mod rom;
pub mod sound;
pub mod utils;

pub use asic::{AsicHooks, IoAsic};
pub use bus::{Bus, InterruptLines};
pub use clock::{Clock, ClockEvent};
pub use display::SegmentDisplay;
pub use machine::{Machine, MachineBuilder};
pub use ram::ProtectedRam;
pub use rom::{BankedRom, FixedRom, RomImage, RomImageError};
pub use sound::{BgSoundBoard, SoundBoard, SoundBridge, SoundLink};
pub use utils::hexdump;

/// Build a board with the default primary sound wiring from a raw ROM
/// image and a controller implementation.
pub fn get_machine(rom_data: &[u8], asic: Box<dyn IoAsic>) -> anyhow::Result<Machine> {
    let image = RomImage::new(rom_data.to_vec())?;
    Ok(MachineBuilder::new(image, asic).build())
}
