//! Mapper 4 (MMC3). Even/odd address pairs within four 8 KiB windows select
//! between a "select" register and an "act on it" register. IRQ generation
//! is accepted (registers are latched) but never raised, matching the
//! original hardware's separately-clocked scanline counter, which this core
//! does not need in order to run the games in scope.

use super::{Mapper, MapperInfo, CART_WINDOW_BASE};
use crate::cartridge::{Mirroring, RomImage};

const PRG_RAM_LEN: usize = 8 * 1024;

fn window_off(addr: u16) -> usize {
    addr as usize - CART_WINDOW_BASE as usize
}

pub struct Mmc3 {
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    bank_select: u8,
    prev_prg_mode: u8,
    vertical_mirroring: bool,
    irq_latch: u8,
    irq_counter: u8,
    irq_enabled: bool,
}

impl Mmc3 {
    pub fn new(rom: &RomImage) -> Self {
        Mmc3 {
            prg_rom: rom.prg_rom.clone(),
            chr_rom: rom.chr_rom.clone(),
            bank_select: 0,
            prev_prg_mode: 0,
            vertical_mirroring: rom.mirroring == Mirroring::Vertical,
            irq_latch: 0,
            irq_counter: 0,
            irq_enabled: false,
        }
    }

    fn write_bank_select(&mut self, val: u8) {
        self.bank_select = val;
    }

    fn write_mirroring(&mut self, val: u8) {
        self.vertical_mirroring = val & 1 == 0;
    }

    fn write_prg_ram_protect(&mut self, _val: u8) {}
    fn write_irq_latch(&mut self, val: u8) {
        self.irq_latch = val;
    }
    fn write_irq_reload(&mut self, _val: u8) {
        self.irq_counter = 0;
    }
    fn write_irq_disable(&mut self, _val: u8) {
        self.irq_enabled = false;
    }
    fn write_irq_enable(&mut self, _val: u8) {
        self.irq_enabled = true;
    }

    fn write_bank_data(&mut self, val: u8, cpu_window: &mut [u8], chr: &mut [u8]) {
        let inversion = self.bank_select & 0x80 != 0;
        let select = self.bank_select & 0x7;
        let prg_mode_changed = self.prev_prg_mode != (self.bank_select & 0x40);
        self.prev_prg_mode = self.bank_select & 0x40;

        if prg_mode_changed {
            let second_last = self.prg_rom.len() - 0x4000;
            if self.bank_select & 0x40 != 0 {
                let dst = window_off(0x8000);
                cpu_window[dst..dst + 0x2000].copy_from_slice(&self.prg_rom[second_last..second_last + 0x2000]);
            } else {
                let dst = window_off(0xC000);
                cpu_window[dst..dst + 0x2000].copy_from_slice(&self.prg_rom[second_last..second_last + 0x2000]);
            }
        }

        if select >= 6 {
            let val = val & !0xB0;
            let offset = (val as usize) << 13;
            let size = 1usize << 13;
            if self.prg_rom.len() < offset + size {
                return;
            }
            let addr = if select == 6 {
                if self.bank_select & 0x40 != 0 { 0xC000 } else { 0x8000 }
            } else {
                0xA000
            };
            let dst = window_off(addr);
            cpu_window[dst..dst + size].copy_from_slice(&self.prg_rom[offset..offset + size]);
        } else {
            let (mut ppu_addr, bits, val) = match select {
                0 => (0x0000u16, 10u32, val & !0x1),
                1 => (0x0800, 10, val & !0x1),
                2 => (0x1000, 10, val),
                3 => (0x1400, 10, val),
                4 => (0x1800, 10, val),
                5 => (0x1C00, 10, val),
                _ => unreachable!(),
            };
            if inversion {
                ppu_addr ^= 0x1000;
            }
            let size = 1usize << bits;
            let offset = (val as usize) << bits;
            if self.chr_rom.len() < offset + size {
                return;
            }
            let dst = ppu_addr as usize;
            chr[dst..dst + size].copy_from_slice(&self.chr_rom[offset..offset + size]);
        }
    }
}

impl Mapper for Mmc3 {
    fn on_load(&mut self, cpu_window: &mut [u8], _chr: &mut [u8]) {
        // $E000-$FFFF is always the last 8 KiB bank; the rest is populated
        // lazily by bank_data writes during the game's own init code, which
        // always runs from the fixed bank.
        let dst = window_off(0xE000);
        let last = self.prg_rom.len() - 0x2000;
        cpu_window[dst..dst + 0x2000].copy_from_slice(&self.prg_rom[last..last + 0x2000]);
    }

    fn on_load_sram(&mut self, cpu_window: &mut [u8], sram: &[u8]) {
        let off = window_off(0x6000);
        let n = sram.len().min(PRG_RAM_LEN);
        cpu_window[off..off + n].copy_from_slice(&sram[..n]);
    }

    fn on_save_sram(&self, cpu_window: &[u8]) -> Vec<u8> {
        let off = window_off(0x6000);
        cpu_window[off..off + PRG_RAM_LEN].to_vec()
    }

    fn write_reg(&mut self, addr: u16, value: u8, cpu_window: &mut [u8], chr: &mut [u8]) {
        match addr {
            0x8000..=0x9FFF => {
                if addr & 1 != 0 {
                    self.write_bank_data(value, cpu_window, chr);
                } else {
                    self.write_bank_select(value);
                }
            }
            0xA000..=0xBFFF => {
                if addr & 1 != 0 {
                    self.write_prg_ram_protect(value);
                } else {
                    self.write_mirroring(value);
                }
            }
            0xC000..=0xDFFF => {
                if addr & 1 != 0 {
                    self.write_irq_reload(value);
                } else {
                    self.write_irq_latch(value);
                }
            }
            _ => {
                if addr & 1 != 0 {
                    self.write_irq_enable(value);
                } else {
                    self.write_irq_disable(value);
                }
            }
        }
    }

    fn info(&self) -> MapperInfo {
        MapperInfo {
            entry_addr: 0x8000,
            sram_addr: 0x6000,
            sram_size: PRG_RAM_LEN,
            register_window: Some(0x8000..=0xFFFF),
            mirroring: if self.vertical_mirroring { Mirroring::Vertical } else { Mirroring::Horizontal },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::mappers::CART_WINDOW_LEN;

    fn rom(prg_banks_8k: usize) -> RomImage {
        let mut prg = vec![0u8; prg_banks_8k * 0x2000];
        for (bank, chunk) in prg.chunks_mut(0x2000).enumerate() {
            chunk.fill(bank as u8);
        }
        RomImage {
            prg_rom: prg,
            chr_rom: vec![0u8; 2 * 1024 * 8],
            chr_is_ram: false,
            mapper_id: 4,
            submapper: 0,
            mirroring: Mirroring::Horizontal,
            has_battery: true,
            battery_size: PRG_RAM_LEN,
        }
    }

    #[test]
    fn on_load_maps_last_bank_to_e000() {
        let r = rom(8);
        let mut m = Mmc3::new(&r);
        let mut win = vec![0u8; CART_WINDOW_LEN];
        let mut chr = vec![0u8; 0x2000];
        m.on_load(&mut win, &mut chr);
        let off = window_off(0xE000);
        assert_eq!(win[off], 7);
    }

    #[test]
    fn prg_bank_select_6_maps_8000_when_mode_0() {
        let r = rom(8);
        let mut m = Mmc3::new(&r);
        let mut win = vec![0u8; CART_WINDOW_LEN];
        let mut chr = vec![0u8; 0x2000];
        m.on_load(&mut win, &mut chr);
        m.write_reg(0x8000, 6, &mut win, &mut chr); // select register 6, PRG mode 0
        m.write_reg(0x8001, 3, &mut win, &mut chr); // bank 3 at $8000-$9FFF
        let off = window_off(0x8000);
        assert_eq!(win[off], 3);
    }

    #[test]
    fn mirroring_register_toggles_mirroring() {
        let r = rom(8);
        let mut m = Mmc3::new(&r);
        let mut win = vec![0u8; CART_WINDOW_LEN];
        let mut chr = vec![0u8; 0x2000];
        m.write_reg(0xA000, 1, &mut win, &mut chr);
        assert_eq!(m.info().mirroring, Mirroring::Horizontal);
        m.write_reg(0xA000, 0, &mut win, &mut chr);
        assert_eq!(m.info().mirroring, Mirroring::Vertical);
    }

    #[test]
    fn irq_registers_latch_without_raising() {
        let r = rom(8);
        let mut m = Mmc3::new(&r);
        let mut win = vec![0u8; CART_WINDOW_LEN];
        let mut chr = vec![0u8; 0x2000];
        m.write_reg(0xC000, 10, &mut win, &mut chr);
        m.write_reg(0xE001, 0, &mut win, &mut chr);
        assert_eq!(m.irq_latch, 10);
        assert!(m.irq_enabled);
    }
}
