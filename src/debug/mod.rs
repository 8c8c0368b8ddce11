// Debug module - structured diagnostics for the emulator core
//
// Provides the point-in-time state snapshots (`CpuState`, `PpuState`) and
// the `DiagnosticSink` trait a `Machine` reports them through. This
// generalizes a process-wide tracer into an injected collaborator: tests
// and headless runs use `NullSink`, a front end can plug in `MemorySink` or
// its own sink to capture a trace.

pub mod cpu;
pub mod logger;
pub mod ppu;
pub mod sink;

pub use cpu::CpuState;
pub use logger::{LogLevel, Logger, TraceEntry};
pub use ppu::PpuState;
pub use sink::{DiagnosticSink, MemorySink, NullSink};
