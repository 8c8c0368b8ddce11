//! Mapper factory and the [`Mapper`] contract itself.
//!
//! Every mapper works the same way regardless of its internal banking
//! scheme: on load it blits its active PRG bytes into the CPU's
//! cartridge-window array and its active CHR bytes into the PPU's pattern
//! table array; every subsequent register write re-blits whichever window
//! changed. Reads never consult the mapper at all — they are plain array
//! indexing into bytes the mapper already placed there. This mirrors how
//! the hardware itself works ("this range is this bank, until told
//! otherwise") and avoids recomputing a bank offset on every single access.

mod mapper474;
mod mmc1;
mod mmc3;
mod nrom;

use std::error::Error;
use std::fmt;
use std::ops::RangeInclusive;

use super::{LoadError, Mirroring, RomImage};

/// First address of the CPU-owned cartridge window that mappers blit into.
pub const CART_WINDOW_BASE: u16 = 0x4020;
/// Length in bytes of the CPU-owned cartridge window ($4020..=$FFFF).
pub const CART_WINDOW_LEN: usize = 0x10000 - CART_WINDOW_BASE as usize;

/// Errors raised while constructing a mapper from a decoded [`RomImage`].
#[derive(Debug)]
pub enum MapperError {
    InvalidConfiguration(String),
}

impl fmt::Display for MapperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapperError::InvalidConfiguration(msg) => {
                write!(f, "invalid mapper configuration: {msg}")
            }
        }
    }
}

impl Error for MapperError {}

/// Static facts about a mapper instance, queried once after construction and
/// again after any register write that could change mirroring.
#[derive(Debug, Clone)]
pub struct MapperInfo {
    /// First PC after reset, used when the driver loads in "direct" mode.
    pub entry_addr: u16,
    /// Start of the battery-backed SRAM region within the cartridge window,
    /// meaningful only when `sram_size > 0`.
    pub sram_addr: u16,
    /// Length of the battery-backed SRAM region; zero if the cartridge has
    /// no battery.
    pub sram_size: usize,
    /// Addresses in $8000..=$FFFF that should be forwarded to
    /// [`Mapper::write_reg`] instead of being dropped or treated as SRAM.
    pub register_window: Option<RangeInclusive<u16>>,
    pub mirroring: Mirroring,
}

/// The cartridge-resident logic that virtualizes PRG/CHR banks.
///
/// `cpu_window` is always the full $4020..=$FFFF array, indexed by
/// `addr - CART_WINDOW_BASE`. `chr` is always the full $0000..=$1FFF PPU
/// pattern-table array, indexed directly by PPU address.
pub trait Mapper: Send {
    /// Performs the one-time blit of the mapper's initial PRG/CHR banks.
    fn on_load(&mut self, cpu_window: &mut [u8], chr: &mut [u8]);

    /// Restores battery-backed SRAM from a previously saved byte vector.
    fn on_load_sram(&mut self, cpu_window: &mut [u8], sram: &[u8]);

    /// Extracts the current SRAM contents for persistence.
    fn on_save_sram(&self, cpu_window: &[u8]) -> Vec<u8>;

    /// Handles a CPU write whose address fell inside `info().register_window`.
    fn write_reg(&mut self, addr: u16, value: u8, cpu_window: &mut [u8], chr: &mut [u8]);

    fn info(&self) -> MapperInfo;
}

/// Constructs the concrete mapper for a decoded ROM image.
pub fn create_mapper(rom: &RomImage) -> Result<Box<dyn Mapper>, LoadError> {
    match rom.mapper_id {
        0 => Ok(Box::new(nrom::Nrom::new(rom))),
        1 => Ok(Box::new(mmc1::Mmc1::new(rom))),
        4 => Ok(Box::new(mmc3::Mmc3::new(rom))),
        474 => {
            if rom.submapper > 3 {
                return Err(LoadError::UnsupportedSubmapper(474, rom.submapper));
            }
            Ok(Box::new(mapper474::Mapper474::new(rom)))
        }
        other => Err(LoadError::UnsupportedMapper(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::RomImage;

    fn rom_with_mapper(mapper_id: u16, submapper: u8) -> RomImage {
        RomImage {
            prg_rom: vec![0u8; 16 * 1024],
            chr_rom: vec![0u8; 8 * 1024],
            chr_is_ram: false,
            mapper_id,
            submapper,
            mirroring: Mirroring::Horizontal,
            has_battery: false,
            battery_size: 0,
        }
    }

    #[test]
    fn unknown_mapper_is_rejected() {
        let rom = rom_with_mapper(255, 0);
        assert!(matches!(
            create_mapper(&rom),
            Err(LoadError::UnsupportedMapper(255))
        ));
    }

    #[test]
    fn nrom_is_constructed() {
        let rom = rom_with_mapper(0, 0);
        assert!(create_mapper(&rom).is_ok());
    }

    #[test]
    fn mapper_474_rejects_unknown_submapper() {
        let rom = rom_with_mapper(474, 9);
        assert!(matches!(
            create_mapper(&rom),
            Err(LoadError::UnsupportedSubmapper(474, 9))
        ));
    }
}
