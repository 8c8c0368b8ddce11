// Bus module - CpuBus implementation
//
// Connects the CPU to every other component in the system: internal RAM,
// the PPU's register file, the two controller ports, the OAM DMA trigger,
// and the cartridge. The bus owns the PPU and the mapper directly (no
// shared/cyclic references) so that reads and writes can just be ordinary
// method calls.
//
// # NES Memory Map (CPU Address Space)
//
// ```text
// $0000-$07FF: 2KB Internal RAM
// $0800-$1FFF: Mirrors of RAM (3 times)
// $2000-$2007: PPU Registers
// $2008-$3FFF: Mirrors of PPU Registers (repeating every 8 bytes)
// $4000-$4013: APU registers (stub)
// $4014: OAM DMA trigger
// $4015: APU status (stub, reads 0)
// $4016-$4017: Controller ports
// $4018-$401F: APU and I/O test functionality (usually disabled)
// $4020-$FFFF: Cartridge space (PRG-ROM, PRG-RAM, and mapper registers)
// ```

use std::ops::RangeInclusive;

use crate::apu::Apu;
use crate::cartridge::mappers::{CART_WINDOW_BASE, CART_WINDOW_LEN};
use crate::cartridge::{create_mapper, LoadError, Mapper, RomImage};
use crate::input::ControllerIO;
use crate::ppu::Ppu;
use crate::ram::Ram;

/// Trait for memory-mapped components whose reads have no side effects.
///
/// The PPU and controller ports have read side effects (register latches,
/// shift registers) and so expose their own `cpu_read`/`read` methods
/// instead of going through this trait; `Ram` is the trait's sole user.
pub trait MemoryMappedDevice {
    /// Read a byte from the device.
    fn read(&self, addr: u16) -> u8;

    /// Write a byte to the device.
    fn write(&mut self, addr: u16, data: u8);
}

/// The CPU's view of the whole machine: RAM, PPU, controllers, and the
/// cartridge, all reachable at fixed addresses.
///
/// Ownership is a tree, not a graph: `Bus` owns `Ram`, `Ppu`, and the
/// `Mapper` trait object outright, so reads and writes are plain method
/// calls with no shared mutable state between components.
pub struct Bus {
    ram: Ram,
    pub ppu: Ppu,
    pub apu: Apu,
    pub controllers: ControllerIO,
    mapper: Option<Box<dyn Mapper>>,
    cart_window: Box<[u8; CART_WINDOW_LEN]>,
    register_window: Option<RangeInclusive<u16>>,
    sram_addr: u16,
    sram_size: usize,
    /// CPU cycles elapsed, used only to decide OAM DMA stall parity.
    total_cycles: u64,
    /// OAM DMA stall cycles queued by the last `$4014` write, drained by
    /// the driver loop via `take_dma_stall`.
    dma_stall: u32,
}

impl Bus {
    /// Creates a bus with no cartridge loaded.
    ///
    /// The cartridge window behaves as plain writable memory in this mode,
    /// which is what lets the CPU's own unit tests plant test programs
    /// directly at $8000+ without a real mapper.
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::Bus;
    /// let bus = Bus::new();
    /// ```
    pub fn new() -> Self {
        Bus {
            ram: Ram::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            controllers: ControllerIO::new(),
            mapper: None,
            cart_window: Box::new([0; CART_WINDOW_LEN]),
            register_window: None,
            sram_addr: 0,
            sram_size: 0,
            total_cycles: 0,
            dma_stall: 0,
        }
    }

    /// Builds a bus around a decoded cartridge: constructs the mapper, lets
    /// it blit its initial PRG/CHR banks, and adopts its mirroring.
    pub fn from_cartridge(rom: &RomImage) -> Result<Self, LoadError> {
        let mut bus = Bus::new();
        let mut mapper = create_mapper(rom)?;
        bus.ppu.set_chr_is_ram(rom.chr_is_ram);
        mapper.on_load(&mut bus.cart_window[..], bus.ppu.pattern_table_mut());
        let info = mapper.info();
        bus.ppu.set_mirroring(info.mirroring);
        bus.register_window = info.register_window;
        bus.sram_addr = info.sram_addr;
        bus.sram_size = info.sram_size;
        bus.mapper = Some(mapper);
        Ok(bus)
    }

    /// The program counter value the CPU should load at reset, as declared
    /// by the mapper. `None` when no cartridge is loaded, in which case the
    /// reset vector at $FFFC-$FFFD should be used as usual.
    pub fn mapper_entry_addr(&self) -> Option<u16> {
        self.mapper.as_ref().map(|m| m.info().entry_addr)
    }

    /// Restores battery-backed SRAM content, if the mapper declares any.
    pub fn load_sram(&mut self, data: &[u8]) {
        if let Some(mapper) = self.mapper.as_mut() {
            mapper.on_load_sram(&mut self.cart_window[..], data);
        }
    }

    /// Extracts battery-backed SRAM content for persistence. Empty if the
    /// mapper declares none.
    pub fn save_sram(&self) -> Vec<u8> {
        match self.mapper.as_ref() {
            Some(mapper) => mapper.on_save_sram(&self.cart_window[..]),
            None => Vec::new(),
        }
    }

    /// Advances bus-owned timing state by one CPU cycle: the OAM DMA
    /// parity counter and the PPU's post-power-on warm-up gate.
    pub fn tick(&mut self) {
        self.total_cycles = self.total_cycles.wrapping_add(1);
        self.ppu.tick_warm_up();
    }

    /// Drains and returns the CPU stall cycles queued by OAM DMA.
    pub fn take_dma_stall(&mut self) -> u32 {
        let stall = self.dma_stall;
        self.dma_stall = 0;
        stall
    }

    /// The internal 2KB work RAM, for tests and diagnostics.
    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    /// Read a byte from the bus.
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::Bus;
    /// let bus = Bus::new();
    /// let value = bus.read(0x0000); // Read from RAM
    /// ```
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram.read(addr),
            0x2000..=0x3FFF => self.ppu.cpu_read(addr),
            0x4016 | 0x4017 => self.controllers.read(addr),
            0x4015 => self.apu.read_status(),
            // $4000-$4013, $4018-$401F: APU/test registers, all stubbed.
            // Real hardware open bus behavior is not emulated.
            0x4000..=0x4013 | 0x4018..=0x401F => 0,
            0x4014 => 0,
            0x4020..=0xFFFF => self.cart_window[(addr - CART_WINDOW_BASE) as usize],
        }
    }

    /// Write a byte to the bus.
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::Bus;
    /// let mut bus = Bus::new();
    /// bus.write(0x0000, 0x42); // Write to RAM
    /// ```
    pub fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram.write(addr, data),
            0x2000..=0x3FFF => self.ppu.cpu_write(addr, data),
            0x4014 => self.start_oam_dma(data),
            0x4016 => self.controllers.write(addr, data),
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write_register(addr, data),
            0x4018..=0x401F => {}
            0x4020..=0xFFFF => self.write_cartridge(addr, data),
        }
    }

    fn write_cartridge(&mut self, addr: u16, data: u8) {
        let off = (addr - CART_WINDOW_BASE) as usize;
        match self.mapper.as_mut() {
            // No cartridge loaded: behave as plain writable memory so bare
            // unit tests can plant instructions directly at $8000+.
            None => self.cart_window[off] = data,
            Some(mapper) => {
                if self.register_window.as_ref().is_some_and(|w| w.contains(&addr)) {
                    mapper.write_reg(addr, data, &mut self.cart_window[..], self.ppu.pattern_table_mut());
                    self.ppu.set_mirroring(mapper.info().mirroring);
                } else if self.sram_size > 0
                    && addr >= self.sram_addr
                    && (addr - self.sram_addr) < self.sram_size as u16
                {
                    self.cart_window[off] = data;
                }
                // Otherwise the address targets ROM; writes are dropped.
            }
        }
    }

    /// Starts an OAM DMA transfer: copies the 256 bytes of CPU page `page`
    /// into OAM immediately, and queues the stall the CPU must spend
    /// waiting for it (513 cycles, or 514 if the triggering write landed
    /// on an odd CPU cycle).
    fn start_oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        for i in 0..256u16 {
            let byte = self.read(base + i);
            self.ppu.write_oam(i as u8, byte);
        }
        self.dma_stall += if self.total_cycles % 2 == 1 { 514 } else { 513 };
    }

    /// Read a 16-bit word from the bus (little-endian).
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::Bus;
    /// let mut bus = Bus::new();
    /// bus.write(0x0000, 0x34);
    /// bus.write(0x0001, 0x12);
    /// assert_eq!(bus.read_u16(0x0000), 0x1234);
    /// ```
    pub fn read_u16(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Write a 16-bit word to the bus (little-endian).
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::Bus;
    /// let mut bus = Bus::new();
    /// bus.write_u16(0x0000, 0x1234);
    /// assert_eq!(bus.read(0x0000), 0x34);
    /// assert_eq!(bus.read(0x0001), 0x12);
    /// ```
    pub fn write_u16(&mut self, addr: u16, data: u16) {
        let lo = (data & 0xFF) as u8;
        let hi = (data >> 8) as u8;
        self.write(addr, lo);
        self.write(addr.wrapping_add(1), hi);
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
