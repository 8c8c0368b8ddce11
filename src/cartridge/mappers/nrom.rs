//! Mapper 0 (NROM). No registers, no bank switching: PRG is blitted once at
//! load and CHR is blitted once into the pattern table.

use super::{Mapper, MapperInfo};
use crate::cartridge::{Mirroring, RomImage};

const PRG_BANK_LEN: usize = 16 * 1024;

pub struct Nrom {
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    mirroring: Mirroring,
    entry_addr: u16,
}

impl Nrom {
    pub fn new(rom: &RomImage) -> Self {
        let entry_addr = if rom.prg_rom.len() == PRG_BANK_LEN { 0xC000 } else { 0x8000 };
        Nrom {
            prg_rom: rom.prg_rom.clone(),
            chr_rom: rom.chr_rom.clone(),
            mirroring: rom.mirroring,
            entry_addr,
        }
    }
}

impl Mapper for Nrom {
    fn on_load(&mut self, cpu_window: &mut [u8], chr: &mut [u8]) {
        let base = 0x8000 - super::CART_WINDOW_BASE as usize;
        cpu_window[base..base + self.prg_rom.len()].copy_from_slice(&self.prg_rom);
        if self.prg_rom.len() == PRG_BANK_LEN {
            let mirror_base = 0xC000 - super::CART_WINDOW_BASE as usize;
            cpu_window[mirror_base..mirror_base + PRG_BANK_LEN].copy_from_slice(&self.prg_rom);
        }
        chr[..self.chr_rom.len()].copy_from_slice(&self.chr_rom);
    }

    fn on_load_sram(&mut self, _cpu_window: &mut [u8], _sram: &[u8]) {}

    fn on_save_sram(&self, _cpu_window: &[u8]) -> Vec<u8> {
        Vec::new()
    }

    fn write_reg(&mut self, _addr: u16, _value: u8, _cpu_window: &mut [u8], _chr: &mut [u8]) {
        // NROM has no registers; writes into $8000-$FFFF are dropped by the bus.
    }

    fn info(&self) -> MapperInfo {
        MapperInfo {
            entry_addr: self.entry_addr,
            sram_addr: 0,
            sram_size: 0,
            register_window: None,
            mirroring: self.mirroring,
        }
    }
}
