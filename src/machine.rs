// Machine module - cycle-accurate core driver
//
// Wires the CPU, PPU, and bus together and owns the single stepping loop
// that keeps them in lockstep. `step` is the one coordination point: the
// CPU interpreter and PPU dot engine never call into each other directly.
// Between CPU instructions it services two latches the CPU itself cannot
// see — the PPU-set NMI request and the bus-set OAM DMA stall — the same
// ordering described for `cpu.step_to`/`ppu.step_to` in the two-component
// design this crate grew out of, adapted here to the CPU's actual
// instruction-at-a-time `step`.

use std::path::Path;

use crate::bus::Bus;
use crate::cartridge::{LoadError, RomImage};
use crate::cpu::Cpu;
use crate::debug::{DiagnosticSink, NullSink, TraceEntry};
use crate::emulator::save_state::{self, SaveIoError};
use crate::input::InputSource;
use crate::ppu::Ppu;
use crate::ram::Ram;

/// One CPU cycle is three PPU dots. `step`'s `n_dots` argument and the
/// internal `master_cycle` counter are both in dot units.
const DOTS_PER_CPU_CYCLE: u64 = 3;

/// How a loaded ROM's program counter is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMode {
    /// Load PC from the reset vector at $FFFC-$FFFD, as real hardware does.
    ResetVector,
    /// Load PC from the mapper's declared entry address, bypassing the
    /// reset vector. Automation-mode test ROMs (nestest and similar) expect
    /// this instead.
    Direct,
}

/// The cycle-accurate NES core: CPU, PPU, bus, and the stepping loop that
/// drives them. Everything that must stay in lockstep lives here; an
/// `Emulator` wraps one of these with configuration and persistence.
///
/// # Example
///
/// ```
/// use nes_rs::Machine;
///
/// let mut machine = Machine::new();
/// machine.power_on();
/// machine.step(341 * 3); // run roughly one scanline's worth of dots
/// ```
pub struct Machine {
    cpu: Cpu,
    bus: Bus,
    master_cycle: u64,
    inputs: [Option<Box<dyn InputSource>>; 2],
    sink: Box<dyn DiagnosticSink>,
}

impl Machine {
    /// Create a machine with no cartridge loaded and a `NullSink`.
    pub fn new() -> Self {
        Machine {
            cpu: Cpu::new(),
            bus: Bus::new(),
            master_cycle: 0,
            inputs: [None, None],
            sink: Box::new(NullSink),
        }
    }

    /// Replace the diagnostic sink. Defaults to `NullSink`.
    pub fn set_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    /// Power on: equivalent to plugging in a cold console. Resets the PPU,
    /// the APU's register surface, the controller ports, and the CPU.
    pub fn power_on(&mut self) {
        self.bus.ppu.reset();
        self.bus.controllers.reset();
        self.bus.apu.reset();
        self.cpu.reset(&mut self.bus);
        self.master_cycle = 0;
    }

    /// Reset: equivalent to pressing the console's reset button. Cartridge
    /// RAM and mapper bank-switch state survive; CPU and PPU timing state
    /// does not.
    pub fn reset(&mut self) {
        self.bus.ppu.reset();
        self.cpu.reset(&mut self.bus);
        self.master_cycle = 0;
    }

    /// Load a ROM from `path`, replacing any cartridge currently installed,
    /// restoring its `.sav` file if one exists, and initializing the
    /// program counter per `mode`.
    pub fn load_rom<P: AsRef<Path>>(&mut self, path: P, mode: EntryMode) -> Result<(), LoadError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(LoadError::from)?;
        let rom = RomImage::parse(&data)?;

        self.bus = Bus::from_cartridge(&rom)?;
        self.bus.load_sram(&save_state::load_sram(path));
        self.cpu.reset(&mut self.bus);

        if mode == EntryMode::Direct {
            if let Some(entry) = self.bus.mapper_entry_addr() {
                self.cpu.pc = entry;
            }
        }

        self.master_cycle = 0;
        Ok(())
    }

    /// Register a host-supplied input source for controller port `port`
    /// (0 or 1), polled once per `step` call.
    pub fn register_input(&mut self, port: usize, source: Box<dyn InputSource>) {
        if port < self.inputs.len() {
            self.inputs[port] = Some(source);
        }
    }

    /// Remove the input source registered for `port`, if any.
    pub fn unregister_input(&mut self, port: usize) {
        if port < self.inputs.len() {
            self.inputs[port] = None;
        }
    }

    /// Advance the machine by `n_dots` PPU dots (three dots per CPU cycle).
    ///
    /// Polls registered input sources once, then runs whole CPU
    /// instructions until `master_cycle` reaches the target, ticking the
    /// PPU dot engine in lockstep after each one. Between instructions it
    /// services a pending NMI first, then a pending OAM DMA stall, matching
    /// real hardware's priority when both land on the same boundary. Stops
    /// early if the CPU has set `stop_requested` (KIL or an unsupported
    /// opcode).
    pub fn step(&mut self, n_dots: u64) {
        self.poll_inputs();
        let target = self.master_cycle + n_dots;

        while self.master_cycle < target {
            if self.cpu.stop_requested {
                if let Some(err) = self.cpu.last_error {
                    self.sink.record(TraceEntry::Message(format!("cpu stopped: {err}")));
                }
                break;
            }

            self.service_nmi();
            self.service_dma();

            let cycles = self.cpu.step(&mut self.bus);
            self.advance_ppu(cycles as u64);
        }
    }

    fn poll_inputs(&mut self) {
        if let Some(source) = self.inputs[0].as_mut() {
            self.bus.controllers.set_controller1(source.poll());
        }
        if let Some(source) = self.inputs[1].as_mut() {
            self.bus.controllers.set_controller2(source.poll());
        }
    }

    fn service_nmi(&mut self) {
        if self.bus.ppu.nmi_pending() {
            self.bus.ppu.clear_nmi();
            self.cpu.nmi(&mut self.bus);
            self.cpu.cycles = self.cpu.cycles.wrapping_add(7);
            self.advance_ppu(7);
        }
    }

    fn service_dma(&mut self) {
        let stall = self.bus.take_dma_stall();
        if stall > 0 {
            self.cpu.cycles = self.cpu.cycles.wrapping_add(stall as u64);
            self.advance_ppu(stall as u64);
        }
    }

    /// Ticks the bus and PPU dot engine `cpu_cycles` CPU cycles' worth of
    /// dots and folds that into `master_cycle`.
    fn advance_ppu(&mut self, cpu_cycles: u64) {
        for _ in 0..cpu_cycles {
            self.bus.tick();
            for _ in 0..DOTS_PER_CPU_CYCLE {
                self.bus.ppu.step();
            }
        }
        self.master_cycle += cpu_cycles * DOTS_PER_CPU_CYCLE;
    }

    /// Persist the cartridge's battery-backed SRAM to `path`. A no-op when
    /// the loaded mapper declares no battery.
    pub fn save(&self, path: &Path) -> Result<(), SaveIoError> {
        save_state::save_sram(path, &self.bus.save_sram())
    }

    /// The CPU, for tests and diagnostics.
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// The PPU, for tests and diagnostics.
    pub fn ppu(&self) -> &Ppu {
        &self.bus.ppu
    }

    /// The internal work RAM, for tests and diagnostics.
    pub fn ram(&self) -> &Ram {
        self.bus.ram()
    }

    /// The underlying bus, for callers that need lower-level access than
    /// `cpu`/`ppu`/`ram` expose.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Mutable access to the underlying bus.
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_resets_cpu_and_master_cycle() {
        let mut machine = Machine::new();
        machine.step(30);
        machine.power_on();
        assert_eq!(machine.master_cycle, 0);
        assert!(!machine.cpu().stop_requested);
    }

    #[test]
    fn step_advances_master_cycle_to_at_least_the_target() {
        let mut machine = Machine::new();
        machine.power_on();
        machine.step(30);
        assert!(machine.master_cycle >= 30);
    }

    #[test]
    fn step_stops_calling_cpu_once_stop_requested_is_set() {
        let mut machine = Machine::new();
        machine.power_on();
        // $02 is KIL: halts the CPU without consuming the rest of the dots.
        machine.bus_mut().write(machine.cpu().pc, 0x02);
        machine.step(3000);
        assert!(machine.cpu().stop_requested);
    }

    struct HeldButton;

    impl InputSource for HeldButton {
        fn poll(&mut self) -> crate::input::Controller {
            let mut c = crate::input::Controller::new();
            c.button_a = true;
            c
        }
    }

    #[test]
    fn register_input_feeds_controller_state_into_the_bus() {
        let mut machine = Machine::new();
        machine.power_on();
        machine.register_input(0, Box::new(HeldButton));
        machine.step(3);

        machine.bus_mut().write(0x4016, 0x01);
        machine.bus_mut().write(0x4016, 0x00);
        assert_eq!(machine.bus_mut().read(0x4016), 0x01);
    }

    #[test]
    fn unregister_input_stops_polling_that_port() {
        let mut machine = Machine::new();
        machine.power_on();
        machine.register_input(0, Box::new(HeldButton));
        machine.unregister_input(0);
        machine.step(3);

        machine.bus_mut().write(0x4016, 0x01);
        machine.bus_mut().write(0x4016, 0x00);
        assert_eq!(machine.bus_mut().read(0x4016), 0x00);
    }
}
