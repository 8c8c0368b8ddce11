// Emulator module - Main emulator coordinator
//
// Thin driver shell around a `Machine`: quality-of-life features like save
// states, screenshots, speed control, and configuration management, none of
// which the cycle-accurate core itself needs to know about.

mod config;
mod recent_roms;
pub(crate) mod save_state;
mod screenshot;

pub use config::{EmulatorConfig, SpeedMode};
pub use recent_roms::RecentRomsList;
pub use save_state::SaveIoError;
pub use screenshot::{save_screenshot, ScreenshotError};

use crate::machine::{EntryMode, Machine};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// PPU dots in one NTSC frame (262 scanlines x 341 dots).
const DOTS_PER_FRAME: u64 = 262 * 341;

/// Main emulator structure
///
/// A thin driver shell around a [`Machine`]: owns configuration, the
/// recent-ROM list, and `.sav` persistence, and presents the front-end
/// facing surface (`load_rom`/`reset`/`save`/`run_frame`). All
/// cycle-accurate state lives in the `Machine` it wraps.
pub struct Emulator {
    /// The cycle-accurate core.
    machine: Machine,

    /// Configuration
    config: EmulatorConfig,

    /// Currently loaded ROM path
    rom_path: Option<PathBuf>,

    /// Paused state
    paused: bool,

    /// Speed mode
    speed_mode: SpeedMode,

    /// Frame timing for speed control
    #[allow(dead_code)]
    last_frame_time: Option<Instant>,
}

impl Emulator {
    /// Create a new emulator instance
    ///
    /// Initializes all components to their power-on state.
    ///
    /// # Returns
    ///
    /// A new emulator instance
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::emulator::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// ```
    pub fn new() -> Self {
        Emulator {
            machine: Machine::new(),
            config: EmulatorConfig::load_or_default(),
            rom_path: None,
            paused: false,
            speed_mode: SpeedMode::Normal,
            last_frame_time: None,
        }
    }

    /// Load a ROM file
    ///
    /// Loads a ROM from the specified path and initializes the emulator state.
    /// Adds the ROM to the recent ROMs list.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the ROM file (.nes)
    ///
    /// # Returns
    ///
    /// Result indicating success or error
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nes_rs::emulator::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// emulator.load_rom("game.nes").expect("Failed to load ROM");
    /// ```
    pub fn load_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        self.machine.load_rom(path, EntryMode::ResetVector)?;
        self.rom_path = Some(path.to_path_buf());

        // Add to recent ROMs list
        let mut recent_roms = RecentRomsList::load_or_default();
        recent_roms.add(path);
        recent_roms.save()?;

        self.paused = false;
        Ok(())
    }

    /// Reset the emulator
    ///
    /// Resets all components to their power-on state, as if pressing the reset button.
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::emulator::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// emulator.reset();
    /// ```
    pub fn reset(&mut self) {
        self.machine.reset();
        self.paused = false;
    }

    /// Run one NTSC frame's worth of dots, scaled by the current speed mode.
    /// A no-op while paused.
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::emulator::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// emulator.run_frame();
    /// ```
    pub fn run_frame(&mut self) {
        if self.paused || self.speed_mode == SpeedMode::Paused {
            return;
        }
        let dots = match self.speed_mode {
            SpeedMode::Normal => DOTS_PER_FRAME,
            SpeedMode::FastForward2x => DOTS_PER_FRAME * 2,
            SpeedMode::FastForward4x => DOTS_PER_FRAME * 4,
            SpeedMode::SlowMotion => DOTS_PER_FRAME / 2,
            SpeedMode::Paused => 0,
        };
        self.machine.step(dots);
    }

    /// Persist the cartridge's battery-backed SRAM to `<rom>.sav`
    ///
    /// A no-op when the loaded mapper declares no battery.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nes_rs::emulator::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// emulator.save().expect("Failed to save");
    /// ```
    pub fn save(&self) -> Result<(), SaveIoError> {
        let path = self.rom_path.as_deref().ok_or(SaveIoError::NoRomLoaded)?;
        self.machine.save(path)
    }

    /// Take a screenshot
    ///
    /// Captures the current frame buffer and saves it as a PNG file.
    ///
    /// # Returns
    ///
    /// Result containing the path to the saved screenshot or an error
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nes_rs::emulator::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// let screenshot_path = emulator.screenshot().expect("Failed to save screenshot");
    /// println!("Screenshot saved to: {}", screenshot_path.display());
    /// ```
    pub fn screenshot(&self) -> Result<PathBuf, ScreenshotError> {
        screenshot::save_screenshot(self.machine.ppu().frame(), self.rom_path.as_deref())
    }

    /// Set speed mode
    ///
    /// Controls emulation speed (normal, fast forward, slow motion).
    ///
    /// # Arguments
    ///
    /// * `mode` - The speed mode to set
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::emulator::{Emulator, SpeedMode};
    ///
    /// let mut emulator = Emulator::new();
    /// emulator.set_speed_mode(SpeedMode::FastForward2x);
    /// ```
    pub fn set_speed_mode(&mut self, mode: SpeedMode) {
        self.speed_mode = mode;
    }

    /// Get current speed mode
    ///
    /// # Returns
    ///
    /// The current speed mode
    pub fn speed_mode(&self) -> SpeedMode {
        self.speed_mode
    }

    /// Pause the emulator
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::emulator::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// emulator.pause();
    /// ```
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume the emulator
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::emulator::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// emulator.resume();
    /// ```
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Toggle pause state
    ///
    /// # Example
    ///
    /// ```
    /// use nes_rs::emulator::Emulator;
    ///
    /// let mut emulator = Emulator::new();
    /// emulator.toggle_pause();
    /// ```
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Check if emulator is paused
    ///
    /// # Returns
    ///
    /// true if paused, false otherwise
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Get reference to the underlying machine
    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Get mutable reference to the underlying machine
    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// Get reference to configuration
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Get mutable reference to configuration
    pub fn config_mut(&mut self) -> &mut EmulatorConfig {
        &mut self.config
    }

    /// Get the currently loaded ROM path
    pub fn rom_path(&self) -> Option<&Path> {
        self.rom_path.as_deref()
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}
