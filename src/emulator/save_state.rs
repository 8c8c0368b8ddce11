// Save state functionality
//
// Persists the mapper's battery-backed SRAM to a `.sav` file next to the
// ROM, mirroring the original hardware's save-cartridge behavior: the whole
// of the cycle-accurate machine state (CPU registers, PPU timing, VRAM) is
// not part of what gets saved, only the SRAM a real cartridge would keep
// powered by its own battery.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while persisting SRAM to a `.sav` file.
#[derive(Debug)]
pub enum SaveIoError {
    Io(io::Error),
    NoRomLoaded,
}

impl std::fmt::Display for SaveIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveIoError::Io(e) => write!(f, "i/o error writing save file: {e}"),
            SaveIoError::NoRomLoaded => write!(f, "no rom loaded"),
        }
    }
}

impl std::error::Error for SaveIoError {}

impl From<io::Error> for SaveIoError {
    fn from(e: io::Error) -> Self {
        SaveIoError::Io(e)
    }
}

/// The `.sav` path a ROM's battery-backed SRAM is persisted under: the ROM
/// path with its extension replaced by `.sav`.
pub fn sav_path_for_rom(rom_path: &Path) -> PathBuf {
    rom_path.with_extension("sav")
}

/// Writes `sram` to `<rom>.sav`. A zero-length `sram` (no battery) is a no-op.
pub fn save_sram(rom_path: &Path, sram: &[u8]) -> Result<(), SaveIoError> {
    if sram.is_empty() {
        return Ok(());
    }
    fs::write(sav_path_for_rom(rom_path), sram)?;
    Ok(())
}

/// Reads `<rom>.sav` if present. A missing file is treated as empty SRAM,
/// per the load-failure-is-silent rule for battery saves.
pub fn load_sram(rom_path: &Path) -> Vec<u8> {
    fs::read(sav_path_for_rom(rom_path)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sav_path_replaces_extension() {
        let rom = PathBuf::from("/games/metroid.nes");
        assert_eq!(sav_path_for_rom(&rom), PathBuf::from("/games/metroid.sav"));
    }

    #[test]
    fn save_io_error_display() {
        let err = SaveIoError::NoRomLoaded;
        assert_eq!(err.to_string(), "no rom loaded");
    }

    #[test]
    fn missing_sav_file_loads_as_empty() {
        let rom = PathBuf::from("/tmp/nes-rs-test-nonexistent-rom-xyz.nes");
        assert!(load_sram(&rom).is_empty());
    }

    #[test]
    fn empty_sram_skips_write() {
        let dir = std::env::temp_dir().join("nes-rs-save-test-empty");
        let rom = dir.join("game.nes");
        let result = save_sram(&rom, &[]);
        assert!(result.is_ok());
        assert!(!sav_path_for_rom(&rom).exists());
    }

    #[test]
    fn round_trips_nonempty_sram() {
        let dir = std::env::temp_dir().join("nes-rs-save-test-roundtrip");
        fs::create_dir_all(&dir).unwrap();
        let rom = dir.join("game.nes");
        let data = vec![0xAB; 8192];
        save_sram(&rom, &data).unwrap();
        assert_eq!(load_sram(&rom), data);
        let _ = fs::remove_file(sav_path_for_rom(&rom));
    }
}
