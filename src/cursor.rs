/* The blinking cursor is not part of the text buffer. It is owned by the CRT controller (CRTC) of the VGA card,
which is reached through port-mapped IO: one port selects an internal register (the command or index port), the
other reads or writes the selected register (the data port). The cursor position is a 16 bit cell offset split
over two 8 bit registers. */

use log::trace;

/// Index port of the CRT controller in color text mode.
pub const CRTC_COMMAND_PORT: u16 = 0x3D4;
/// Data port of the CRT controller in color text mode.
pub const CRTC_DATA_PORT: u16 = 0x3D5;

/// CRTC register holding the high byte of the cursor offset.
pub const CURSOR_HIGH_BYTE: u8 = 0x0E;
/// CRTC register holding the low byte of the cursor offset.
pub const CURSOR_LOW_BYTE: u8 = 0x0F;
/// Cursor start scanline; bit 5 hides the cursor.
pub const CURSOR_START: u8 = 0x0A;
/// Cursor end scanline.
pub const CURSOR_END: u8 = 0x0B;

const CURSOR_DISABLE: u8 = 0x20;

/// Byte-wide port IO, the only hardware access the cursor needs.
///
/// The kernel uses [`CrtcPorts`]; tests plug in a register file that records every access.
pub trait PortIo {
    fn write_byte(&mut self, port: u16, value: u8);
    fn read_byte(&mut self, port: u16) -> u8;
}

/// The real port pair, backed by the `in`/`out` instructions.
#[cfg(target_arch = "x86_64")]
#[derive(Debug)]
pub struct CrtcPorts {
    _private: (),
}

#[cfg(target_arch = "x86_64")]
impl CrtcPorts {
    /// # Safety
    ///
    /// The caller must run in ring 0 on a machine with a VGA-compatible CRT controller, and must not hand out
    /// a second `CrtcPorts` that could interleave register selections with this one.
    pub const unsafe fn new() -> Self {
        CrtcPorts { _private: () }
    }
}

#[cfg(target_arch = "x86_64")]
impl PortIo for CrtcPorts {
    fn write_byte(&mut self, port: u16, value: u8) {
        use x86_64::instructions::port::Port;

        unsafe { Port::<u8>::new(port).write(value) }
    }

    fn read_byte(&mut self, port: u16) -> u8 {
        use x86_64::instructions::port::Port;

        unsafe { Port::<u8>::new(port).read() }
    }
}

/// The cursor registers of the CRT controller.
///
/// The command write must always precede the matching data access, and the high byte pair must precede the
/// low byte pair. The controller only latches what is currently selected.
#[derive(Debug)]
pub struct HardwareCursor<P> {
    ports: P,
}

impl<P: PortIo> HardwareCursor<P> {
    pub fn new(ports: P) -> Self {
        HardwareCursor { ports }
    }

    /// Moves the cursor to the linear cell `offset` (`row * 80 + col`).
    pub fn set(&mut self, offset: u16) {
        trace!("hardware cursor -> {}", offset);
        self.ports.write_byte(CRTC_COMMAND_PORT, CURSOR_HIGH_BYTE);
        self.ports.write_byte(CRTC_DATA_PORT, (offset >> 8) as u8);
        self.ports.write_byte(CRTC_COMMAND_PORT, CURSOR_LOW_BYTE);
        self.ports.write_byte(CRTC_DATA_PORT, (offset & 0xFF) as u8);
    }

    /// Reads the linear cell offset the cursor currently sits on.
    pub fn get(&mut self) -> u16 {
        self.ports.write_byte(CRTC_COMMAND_PORT, CURSOR_HIGH_BYTE);
        let mut offset = u16::from(self.ports.read_byte(CRTC_DATA_PORT)) << 8;
        self.ports.write_byte(CRTC_COMMAND_PORT, CURSOR_LOW_BYTE);
        offset |= u16::from(self.ports.read_byte(CRTC_DATA_PORT));
        offset
    }

    /// Shows the cursor as the scanlines `start..=end` of each cell (0-15 on a standard 16 line font).
    pub fn enable(&mut self, start: u8, end: u8) {
        // The upper bits of both registers belong to other CRTC features, keep them.
        self.ports.write_byte(CRTC_COMMAND_PORT, CURSOR_START);
        let prev = self.ports.read_byte(CRTC_DATA_PORT);
        self.ports.write_byte(CRTC_DATA_PORT, (prev & 0xC0) | (start & 0x1F));

        self.ports.write_byte(CRTC_COMMAND_PORT, CURSOR_END);
        let prev = self.ports.read_byte(CRTC_DATA_PORT);
        self.ports.write_byte(CRTC_DATA_PORT, (prev & 0xE0) | (end & 0x1F));
    }

    pub fn disable(&mut self) {
        self.ports.write_byte(CRTC_COMMAND_PORT, CURSOR_START);
        self.ports.write_byte(CRTC_DATA_PORT, CURSOR_DISABLE);
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }
}

/// A CRT controller simulated as a 256 entry register file, logging every port write.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct FakeCrtc {
    pub(crate) selected: u8,
    pub(crate) registers: [u8; 256],
    pub(crate) writes: std::vec::Vec<(u16, u8)>,
}

#[cfg(test)]
impl FakeCrtc {
    pub(crate) fn new() -> Self {
        FakeCrtc {
            selected: 0,
            registers: [0; 256],
            writes: std::vec::Vec::new(),
        }
    }
}

#[cfg(test)]
impl PortIo for FakeCrtc {
    fn write_byte(&mut self, port: u16, value: u8) {
        self.writes.push((port, value));
        match port {
            CRTC_COMMAND_PORT => self.selected = value,
            CRTC_DATA_PORT => self.registers[self.selected as usize] = value,
            other => panic!("write to unexpected port {:#x}", other),
        }
    }

    fn read_byte(&mut self, port: u16) -> u8 {
        match port {
            CRTC_COMMAND_PORT => self.selected,
            CRTC_DATA_PORT => self.registers[self.selected as usize],
            other => panic!("read from unexpected port {:#x}", other),
        }
    }
}
