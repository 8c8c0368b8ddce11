// Unofficial (undocumented) 6502 opcodes
//
// The NMOS 6502's instruction decoder is incomplete: many unused opcode
// bytes happen to activate two official ALU operations at once, or latch
// up entirely. Real cartridges and most test ROMs rely on the combined
// ones (LAX, SAX, DCP, ISC, SLO, SRE, RLA, RRA) behaving consistently, so
// they're implemented here in terms of the official instructions they
// combine. KIL freezes the processor. The remaining family (ALR, ANC,
// ARR, AXS, XAA, AHX, TAS, LAS, SHX, SHY) depends on open-bus/internal-latch
// behavior that varies across chip revisions and isn't emulated.

use crate::bus::Bus;
use crate::cpu::addressing::AddressingResult;
use crate::cpu::{Cpu, CpuError};

impl Cpu {
    /// LAX - Load Accumulator and X
    ///
    /// Loads a byte from memory into both A and X in one instruction.
    /// Flags affected: Z, N
    pub fn lax(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        let value = self.read_operand(bus, addr_result);
        self.a = value;
        self.x = value;
        self.update_zero_and_negative_flags(value);
    }

    /// SAX - Store A AND X
    ///
    /// Stores the bitwise AND of A and X to memory. Flags affected: none.
    pub fn sax(&self, bus: &mut Bus, addr_result: &AddressingResult) {
        bus.write(addr_result.address, self.a & self.x);
    }

    /// DCP - Decrement then Compare
    ///
    /// Equivalent to DEC followed by CMP against the decremented value.
    pub fn dcp(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        self.dec(bus, addr_result);
        self.cmp(bus, addr_result);
    }

    /// ISC - Increment then Subtract with Carry
    ///
    /// Equivalent to INC followed by SBC against the incremented value.
    /// Also known as ISB or INS.
    pub fn isc(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        self.inc(bus, addr_result);
        self.sbc(bus, addr_result);
    }

    /// SLO - Shift Left then OR
    ///
    /// Equivalent to ASL followed by ORA against the shifted value.
    pub fn slo(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        self.asl(bus, addr_result, false);
        self.ora(bus, addr_result);
    }

    /// SRE - Shift Right then EOR
    ///
    /// Equivalent to LSR followed by EOR against the shifted value.
    pub fn sre(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        self.lsr(bus, addr_result, false);
        self.eor(bus, addr_result);
    }

    /// RLA - Rotate Left then AND
    ///
    /// Equivalent to ROL followed by AND against the rotated value.
    pub fn rla(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        self.rol(bus, addr_result, false);
        self.and(bus, addr_result);
    }

    /// RRA - Rotate Right then Add with Carry
    ///
    /// Equivalent to ROR followed by ADC against the rotated value.
    pub fn rra(&mut self, bus: &mut Bus, addr_result: &AddressingResult) {
        self.ror(bus, addr_result, false);
        self.adc(bus, addr_result);
    }

    /// KIL - Halt the processor
    ///
    /// Also known as JAM or HLT. On real hardware this locks the address
    /// and data bus and the CPU never recovers without a reset. We model
    /// that by parking PC on the KIL byte and setting `stop_requested`.
    pub fn kil(&mut self) {
        self.pc = self.pc.wrapping_sub(1);
        self.stop_requested = true;
    }

    /// Decode an opcode whose behavior is too unstable to emulate.
    ///
    /// Sets `stop_requested` and records an `UnsupportedOpcode` error
    /// instead of guessing at undefined hardware behavior.
    pub fn unsupported_opcode(&mut self, opcode: u8) {
        self.stop_requested = true;
        self.last_error = Some(CpuError::UnsupportedOpcode(opcode));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::addressing::AddressingResult;

    #[test]
    fn test_lax_loads_both_registers() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        bus.write(0x1000, 0x42);

        cpu.lax(&mut bus, &AddressingResult::new(0x1000));

        assert_eq!(cpu.a, 0x42);
        assert_eq!(cpu.x, 0x42);
        assert!(!cpu.get_zero());
        assert!(!cpu.get_negative());
    }

    #[test]
    fn test_sax_stores_and_of_a_and_x() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        cpu.a = 0b1100_1100;
        cpu.x = 0b1010_1010;

        cpu.sax(&mut bus, &AddressingResult::new(0x1000));

        assert_eq!(bus.read(0x1000), 0b1000_1000);
    }

    #[test]
    fn test_dcp_decrements_then_compares() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        bus.write(0x1000, 0x10);
        cpu.a = 0x0F;

        cpu.dcp(&mut bus, &AddressingResult::new(0x1000));

        assert_eq!(bus.read(0x1000), 0x0F, "memory should be decremented");
        assert!(cpu.get_zero(), "A == decremented memory, Z should be set");
        assert!(cpu.get_carry(), "A >= decremented memory, C should be set");
    }

    #[test]
    fn test_isc_increments_then_subtracts() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        bus.write(0x1000, 0x01);
        cpu.a = 0x10;
        cpu.set_carry(true);

        cpu.isc(&mut bus, &AddressingResult::new(0x1000));

        assert_eq!(bus.read(0x1000), 0x02, "memory should be incremented");
        assert_eq!(cpu.a, 0x0E, "A -= incremented memory");
    }

    #[test]
    fn test_slo_shifts_then_ors() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        bus.write(0x1000, 0b1000_0001);
        cpu.a = 0b0000_0001;

        cpu.slo(&mut bus, &AddressingResult::new(0x1000));

        assert_eq!(bus.read(0x1000), 0b0000_0010, "memory should be shifted left");
        assert!(cpu.get_carry(), "old bit 7 should go to carry");
        assert_eq!(cpu.a, 0b0000_0011, "A should be ORed with shifted value");
    }

    #[test]
    fn test_sre_shifts_then_eors() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        bus.write(0x1000, 0b0000_0011);
        cpu.a = 0b0000_0001;

        cpu.sre(&mut bus, &AddressingResult::new(0x1000));

        assert_eq!(bus.read(0x1000), 0b0000_0001, "memory should be shifted right");
        assert!(cpu.get_carry(), "old bit 0 should go to carry");
        assert_eq!(cpu.a, 0b0000_0000, "A should be XORed with shifted value");
    }

    #[test]
    fn test_rla_rotates_then_ands() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        bus.write(0x1000, 0b1000_0001);
        cpu.a = 0b0000_0011;
        cpu.set_carry(true);

        cpu.rla(&mut bus, &AddressingResult::new(0x1000));

        assert_eq!(bus.read(0x1000), 0b0000_0011, "memory should rotate left through carry");
        assert_eq!(cpu.a, 0b0000_0011, "A should be ANDed with rotated value");
    }

    #[test]
    fn test_rra_rotates_then_adds() {
        let mut cpu = Cpu::new();
        let mut bus = Bus::new();
        bus.write(0x1000, 0b0000_0010);
        cpu.a = 0x01;
        cpu.set_carry(false);

        cpu.rra(&mut bus, &AddressingResult::new(0x1000));

        assert_eq!(bus.read(0x1000), 0b0000_0001, "memory should rotate right through carry");
        assert_eq!(cpu.a, 0x02, "A should accumulate the rotated value");
    }

    #[test]
    fn test_kil_halts_and_parks_pc() {
        let mut cpu = Cpu::new();
        cpu.pc = 0x8001;

        cpu.kil();

        assert!(cpu.stop_requested);
        assert_eq!(cpu.pc, 0x8000, "PC should stay on the KIL opcode");
    }

    #[test]
    fn test_unsupported_opcode_sets_stop_and_error() {
        let mut cpu = Cpu::new();

        cpu.unsupported_opcode(0x8B);

        assert!(cpu.stop_requested);
        assert_eq!(cpu.last_error, Some(CpuError::UnsupportedOpcode(0x8B)));
    }
}
