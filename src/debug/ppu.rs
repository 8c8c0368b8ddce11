// PPU state snapshot - used by DiagnosticSink trace events

use crate::ppu::Ppu;

/// PPU state snapshot
///
/// Contains a complete snapshot of the PPU state at a specific point in time.
#[derive(Debug, Clone)]
pub struct PpuState {
    /// Current scanline (0-261)
    pub scanline: u16,

    /// Current cycle (0-340)
    pub cycle: u16,

    /// Frame counter
    pub frame: u64,

    /// PPUCTRL register ($2000)
    pub ppuctrl: u8,

    /// PPUMASK register ($2001)
    pub ppumask: u8,

    /// PPUSTATUS register ($2002)
    pub ppustatus: u8,

    /// OAMADDR register ($2003)
    pub oam_addr: u8,

    /// Current VRAM address (v)
    pub v: u16,

    /// Temporary VRAM address (t)
    pub t: u16,

    /// Fine X scroll
    pub fine_x: u8,

    /// Write latch (w)
    pub write_latch: bool,

    /// NMI pending flag
    pub nmi_pending: bool,
}

impl PpuState {
    /// Capture the current PPU state
    pub fn capture(ppu: &Ppu) -> PpuState {
        PpuState {
            scanline: ppu.scanline(),
            cycle: ppu.cycle(),
            frame: ppu.frame_count(),
            ppuctrl: ppu.ppuctrl,
            ppumask: ppu.ppumask,
            ppustatus: ppu.ppustatus,
            oam_addr: ppu.oam_addr,
            v: ppu.v,
            t: ppu.t,
            fine_x: ppu.fine_x,
            write_latch: ppu.write_latch,
            nmi_pending: ppu.nmi_pending(),
        }
    }

    /// Format PPUCTRL flags
    pub fn format_ppuctrl(&self) -> String {
        let mut flags = Vec::new();

        if self.ppuctrl & 0x80 != 0 {
            flags.push("NMI");
        }
        if self.ppuctrl & 0x20 != 0 {
            flags.push("SPR8x16");
        } else {
            flags.push("SPR8x8");
        }
        if self.ppuctrl & 0x10 != 0 {
            flags.push("BG@$1000");
        } else {
            flags.push("BG@$0000");
        }
        if self.ppuctrl & 0x08 != 0 {
            flags.push("SPR@$1000");
        } else {
            flags.push("SPR@$0000");
        }
        if self.ppuctrl & 0x04 != 0 {
            flags.push("+32");
        } else {
            flags.push("+1");
        }

        let nametable = self.ppuctrl & 0x03;
        flags.push(match nametable {
            0 => "NT$2000",
            1 => "NT$2400",
            2 => "NT$2800",
            3 => "NT$2C00",
            _ => unreachable!(),
        });

        flags.join(" ")
    }

    /// Format PPUSTATUS flags
    pub fn format_ppustatus(&self) -> String {
        let mut flags = Vec::new();

        if self.ppustatus & 0x80 != 0 {
            flags.push("VBlank");
        }
        if self.ppustatus & 0x40 != 0 {
            flags.push("Spr0Hit");
        }
        if self.ppustatus & 0x20 != 0 {
            flags.push("SprOvf");
        }

        if flags.is_empty() {
            "None".to_string()
        } else {
            flags.join(" ")
        }
    }
}

impl std::fmt::Display for PpuState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PPU[{:3},{:3}] CTRL:{:02X} MASK:{:02X} STATUS:{:02X} v:{:04X}",
            self.scanline, self.cycle, self.ppuctrl, self.ppumask, self.ppustatus, self.v
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_reflects_live_ppu_registers() {
        let mut ppu = Ppu::new();
        ppu.ppuctrl = 0x90;
        ppu.ppustatus = 0x80;

        let state = PpuState::capture(&ppu);

        assert_eq!(state.ppuctrl, 0x90);
        assert_eq!(state.ppustatus, 0x80);
    }

    #[test]
    fn format_ppuctrl_describes_nmi_and_bg_pattern_table() {
        let state = PpuState {
            scanline: 0,
            cycle: 0,
            frame: 0,
            ppuctrl: 0x90, // NMI enabled, BG pattern $1000
            ppumask: 0,
            ppustatus: 0,
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            write_latch: false,
            nmi_pending: false,
        };

        let formatted = state.format_ppuctrl();
        assert!(formatted.contains("NMI"));
        assert!(formatted.contains("BG@$1000"));
    }

    #[test]
    fn format_ppustatus_describes_vblank_and_sprite0() {
        let state = PpuState {
            scanline: 0,
            cycle: 0,
            frame: 0,
            ppuctrl: 0,
            ppumask: 0,
            ppustatus: 0xC0, // VBlank and Sprite 0 hit
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            write_latch: false,
            nmi_pending: false,
        };

        let formatted = state.format_ppustatus();
        assert!(formatted.contains("VBlank"));
        assert!(formatted.contains("Spr0Hit"));
    }
}
