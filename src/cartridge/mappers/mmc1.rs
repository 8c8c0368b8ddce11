//! Mapper 1 (MMC1). A serial shift register collects 5 bits, lowest first;
//! on the 5th write the accumulated value is committed to one of four
//! internal registers selected by which $ address range the write landed in.
//! A write with bit 7 set resets the shift register and forces PRG mode to
//! "fix last bank at $C000" regardless of the previous control value.

use super::{Mapper, MapperInfo, CART_WINDOW_BASE};
use crate::cartridge::{Mirroring, RomImage};

const PRG_RAM_LEN: usize = 8 * 1024;

fn window_off(addr: u16) -> usize {
    addr as usize - CART_WINDOW_BASE as usize
}

pub struct Mmc1 {
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    chr_is_ram: bool,
    shift: u8,
    shift_count: u8,
    control: u8,
    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,
}

impl Mmc1 {
    pub fn new(rom: &RomImage) -> Self {
        Mmc1 {
            prg_rom: rom.prg_rom.clone(),
            chr_rom: rom.chr_rom.clone(),
            chr_is_ram: rom.chr_is_ram,
            shift: 0,
            shift_count: 0,
            control: 0x0C,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
        }
    }

    fn mirroring(&self) -> Mirroring {
        match self.control & 0x3 {
            0 => Mirroring::OneScreenLower,
            1 => Mirroring::OneScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }

    fn write_control(&mut self, val: u8) {
        self.control = val;
    }

    fn write_chr_bank_0(&mut self, val: u8, chr: &mut [u8]) {
        if self.chr_rom.is_empty() {
            return;
        }
        let (addr, size) = if self.control & 0x10 != 0 {
            (((val & 0x1F) as usize) << 12, 0x1000)
        } else {
            (((val & 0x1E) as usize) << 12, 0x2000)
        };
        if self.chr_rom.len() < addr + size {
            return;
        }
        chr[0..size].copy_from_slice(&self.chr_rom[addr..addr + size]);
    }

    fn write_chr_bank_1(&mut self, val: u8, chr: &mut [u8]) {
        if self.chr_rom.is_empty() || self.control & 0x10 == 0 {
            return;
        }
        let addr = ((val & 0x1F) as usize) << 12;
        let size = 0x1000;
        if self.chr_rom.len() < addr + size {
            return;
        }
        chr[0x1000..0x1000 + size].copy_from_slice(&self.chr_rom[addr..addr + size]);
    }

    fn write_prg_bank(&mut self, val: u8, cpu_window: &mut [u8]) {
        let lo = window_off(0x8000);
        let hi = window_off(0xC000);
        if self.control & 0x08 != 0 {
            if self.control & 0x04 != 0 {
                // fix last bank at $C000, switch 16K at $8000
                let off = (val & 0x0F) as usize * 0x4000;
                cpu_window[lo..lo + 0x4000].copy_from_slice(&self.prg_rom[off..off + 0x4000]);
                let last = self.prg_rom.len() - 0x4000;
                cpu_window[hi..hi + 0x4000].copy_from_slice(&self.prg_rom[last..last + 0x4000]);
            } else {
                // fix first bank at $8000, switch 16K at $C000
                cpu_window[lo..lo + 0x4000].copy_from_slice(&self.prg_rom[0..0x4000]);
                let off = (val & 0x0F) as usize * 0x4000;
                cpu_window[hi..hi + 0x4000].copy_from_slice(&self.prg_rom[off..off + 0x4000]);
            }
        } else {
            // 32K mode, low bit of bank number ignored
            let off = (val & 0x0E) as usize * 0x4000;
            cpu_window[lo..lo + 0x8000].copy_from_slice(&self.prg_rom[off..off + 0x8000]);
        }
    }

    fn apply_banks(&mut self, cpu_window: &mut [u8], chr: &mut [u8]) {
        self.write_prg_bank(self.prg_bank, cpu_window);
        self.write_chr_bank_0(self.chr_bank_0, chr);
        self.write_chr_bank_1(self.chr_bank_1, chr);
    }
}

impl Mapper for Mmc1 {
    fn on_load(&mut self, cpu_window: &mut [u8], chr: &mut [u8]) {
        // Initial mapping: last 32 KiB of PRG fills the whole window, matching
        // power-on hardware state before any register write occurs.
        let lo = window_off(0x8000);
        let last = self.prg_rom.len().saturating_sub(0x8000);
        cpu_window[lo..lo + 0x8000].copy_from_slice(&self.prg_rom[last..last + 0x8000]);
        if !self.chr_rom.is_empty() {
            let n = self.chr_rom.len().min(0x2000);
            chr[..n].copy_from_slice(&self.chr_rom[..n]);
        }
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
        if addr < 0x8000 {
            // PRG-RAM write ($6000-$7FFF) handled directly by the bus; not reached.
            return;
        }
        if value & 0x80 != 0 {
            self.shift = 0;
            self.shift_count = 0;
            self.control |= 0x0C;
            return;
        }

        self.shift >>= 1;
        self.shift |= (value & 1) << 4;
        self.shift_count += 1;
        if self.shift_count != 5 {
            return;
        }
        let reg_value = self.shift;
        self.shift = 0;
        self.shift_count = 0;

        match addr {
            0x8000..=0x9FFF => self.write_control(reg_value),
            0xA000..=0xBFFF => {
                self.chr_bank_0 = reg_value;
                self.write_chr_bank_0(reg_value, chr);
            }
            0xC000..=0xDFFF => {
                self.chr_bank_1 = reg_value;
                self.write_chr_bank_1(reg_value, chr);
            }
            _ => {
                self.prg_bank = reg_value;
                self.write_prg_bank(reg_value, cpu_window);
            }
        }
    }

    fn info(&self) -> MapperInfo {
        MapperInfo {
            entry_addr: if self.prg_rom.len() == 0x4000 { 0xC000 } else { 0x8000 },
            sram_addr: 0x6000,
            sram_size: PRG_RAM_LEN,
            register_window: Some(0x8000..=0xFFFF),
            mirroring: self.mirroring(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::mappers::CART_WINDOW_LEN;

    fn rom(prg_banks: usize) -> RomImage {
        let mut prg = vec![0u8; prg_banks * 0x4000];
        for (bank, chunk) in prg.chunks_mut(0x4000).enumerate() {
            chunk.fill(bank as u8);
        }
        RomImage {
            prg_rom: prg,
            chr_rom: vec![0u8; 0x2000],
            chr_is_ram: false,
            mapper_id: 1,
            submapper: 0,
            mirroring: Mirroring::Horizontal,
            has_battery: true,
            battery_size: PRG_RAM_LEN,
        }
    }

    fn shift_in(m: &mut Mmc1, addr: u16, value: u8, win: &mut [u8], chr: &mut [u8]) {
        for i in 0..5 {
            let bit = (value >> i) & 1;
            m.write_reg(addr, bit, win, chr);
        }
    }

    #[test]
    fn reset_bit_forces_prg_mode_fix_last() {
        let r = rom(4);
        let mut m = Mmc1::new(&r);
        let mut win = vec![0u8; CART_WINDOW_LEN];
        let mut chr = vec![0u8; 0x2000];
        m.on_load(&mut win, &mut chr);
        m.write_reg(0x8000, 0x80, &mut win, &mut chr);
        assert_eq!(m.control & 0x0C, 0x0C);
    }

    #[test]
    fn prg_bank_switch_updates_c000_window() {
        let r = rom(4);
        let mut m = Mmc1::new(&r);
        let mut win = vec![0u8; CART_WINDOW_LEN];
        let mut chr = vec![0u8; 0x2000];
        m.on_load(&mut win, &mut chr);
        // control: 16K mode, fix first bank at $8000, switch $C000 (bits 2-3 = 10)
        shift_in(&mut m, 0x8000, 0b01000, &mut win, &mut chr);
        shift_in(&mut m, 0xE000, 2, &mut win, &mut chr);
        let hi = window_off(0xC000);
        assert_eq!(win[hi], 2);
    }

    #[test]
    fn control_mirroring_bits_map_to_enum() {
        let r = rom(2);
        let mut m = Mmc1::new(&r);
        let mut win = vec![0u8; CART_WINDOW_LEN];
        let mut chr = vec![0u8; 0x2000];
        m.on_load(&mut win, &mut chr);
        shift_in(&mut m, 0x8000, 0b00011, &mut win, &mut chr);
        assert_eq!(m.info().mirroring, Mirroring::Horizontal);
        shift_in(&mut m, 0x8000, 0b00010, &mut win, &mut chr);
        assert_eq!(m.info().mirroring, Mirroring::Vertical);
        shift_in(&mut m, 0x8000, 0b00001, &mut win, &mut chr);
        assert_eq!(m.info().mirroring, Mirroring::OneScreenUpper);
        shift_in(&mut m, 0x8000, 0b00000, &mut win, &mut chr);
        assert_eq!(m.info().mirroring, Mirroring::OneScreenLower);
    }

    #[test]
    fn sram_round_trips_through_save_and_load() {
        let r = rom(2);
        let mut m = Mmc1::new(&r);
        let mut win = vec![0u8; CART_WINDOW_LEN];
        let off = window_off(0x6000);
        for i in 0..PRG_RAM_LEN {
            win[off + i] = (i % 251) as u8;
        }
        let saved = m.on_save_sram(&win);
        let mut win2 = vec![0u8; CART_WINDOW_LEN];
        m.on_load_sram(&mut win2, &saved);
        assert_eq!(&win[off..off + PRG_RAM_LEN], &win2[off..off + PRG_RAM_LEN]);
    }
}
