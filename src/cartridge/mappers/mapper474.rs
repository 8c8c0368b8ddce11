//! Mapper 474, the Akerasoft NROM-383/368/320 family
//! (<https://www.nesdev.org/wiki/NES_2.0_Mapper_474>). No registers, like
//! NROM — it only differs from mapper 0 in where the PRG image starts and
//! how much leading padding in the dump is skipped, and, for submapper 3,
//! in offering a small battery-backed SRAM region ahead of the PRG window.

use super::{Mapper, MapperInfo, CART_WINDOW_BASE};
use crate::cartridge::{Mirroring, RomImage};

const NROM_383_START: u16 = 0x4020;
const NROM_368_START: u16 = 0x4800;
const NROM_320_START: u16 = 0x6000;

const NROM_383_PAD: usize = 0x20;
const NROM_368_PAD: usize = 0x800;
const NROM_320_PAD: usize = 0x2000;

const SAVE_START: u16 = 0x4020;
const SAVE_PAD: usize = 0x20;
// NROM_320_SAVE_MAX_SIZE from the original source: the save chip is 0x2000
// bytes, but only the portion that doesn't run into the PRG window starting
// at $6000 is usable (0x4020 + 0x1FE0 == 0x6000 exactly).
const SAVE_MAX_SIZE: usize = 0x1FE0;

fn window_off(addr: u16) -> usize {
    addr as usize - CART_WINDOW_BASE as usize
}

pub struct Mapper474 {
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    submapper: u8,
    mirroring: Mirroring,
}

impl Mapper474 {
    pub fn new(rom: &RomImage) -> Self {
        Mapper474 {
            prg_rom: rom.prg_rom.clone(),
            chr_rom: rom.chr_rom.clone(),
            submapper: rom.submapper,
            mirroring: rom.mirroring,
        }
    }

    fn start_and_pad(&self) -> (u16, usize) {
        match self.submapper {
            0 => (NROM_383_START, NROM_383_PAD),
            1 => (NROM_368_START, NROM_368_PAD),
            _ => (NROM_320_START, NROM_320_PAD),
        }
    }
}

impl Mapper for Mapper474 {
    fn on_load(&mut self, cpu_window: &mut [u8], chr: &mut [u8]) {
        let (start, pad) = self.start_and_pad();
        let dst = window_off(start);
        let len = self.prg_rom.len() - pad;
        cpu_window[dst..dst + len].copy_from_slice(&self.prg_rom[pad..pad + len]);
        chr[..self.chr_rom.len()].copy_from_slice(&self.chr_rom);
    }

    fn on_load_sram(&mut self, cpu_window: &mut [u8], sram: &[u8]) {
        if self.submapper != 3 {
            return;
        }
        let dst = window_off(SAVE_START);
        let n = sram.len().saturating_sub(SAVE_PAD).min(SAVE_MAX_SIZE);
        cpu_window[dst..dst + n].copy_from_slice(&sram[SAVE_PAD..SAVE_PAD + n]);
    }

    fn on_save_sram(&self, cpu_window: &[u8]) -> Vec<u8> {
        if self.submapper != 3 {
            return Vec::new();
        }
        let src = window_off(SAVE_START);
        cpu_window[src..src + SAVE_MAX_SIZE].to_vec()
    }

    fn write_reg(&mut self, _addr: u16, _value: u8, _cpu_window: &mut [u8], _chr: &mut [u8]) {}

    fn info(&self) -> MapperInfo {
        let (start, _pad) = self.start_and_pad();
        MapperInfo {
            entry_addr: start,
            sram_addr: if self.submapper == 3 { SAVE_START } else { 0 },
            sram_size: if self.submapper == 3 { SAVE_MAX_SIZE } else { 0 },
            register_window: None,
            mirroring: self.mirroring,
        }
    }
}
