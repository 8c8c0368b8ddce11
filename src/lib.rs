// NES Emulator Library
// Core library for the NES emulator implementation

// Public modules
pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod cpu;
pub mod debug;
pub mod display;
pub mod emulator;
pub mod input;
pub mod machine;
pub mod ppu;
pub mod ram;

// Re-export main types for convenience
pub use apu::Apu;
pub use bus::{Bus, MemoryMappedDevice};
pub use cartridge::{create_mapper, LoadError, Mapper, MapperError, MapperInfo, Mirroring, RomImage};
pub use cpu::Cpu;
pub use debug::{CpuState, DiagnosticSink, LogLevel, Logger, MemorySink, NullSink, PpuState, TraceEntry};
pub use display::{FrameBuffer, WindowConfig};
pub use emulator::{Emulator, EmulatorConfig, SaveIoError, SpeedMode};
pub use input::{Controller, ControllerIO, InputSource};
pub use machine::{EntryMode, Machine};
pub use ppu::Ppu;
pub use ram::Ram;
