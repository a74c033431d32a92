/* Drives the text surface through the public API only, the way kernel code would, with the buffer placed in host
memory and the CRTC replaced by a two register latch. */

use vga_tty::cursor::{CRTC_COMMAND_PORT, CRTC_DATA_PORT, CURSOR_HIGH_BYTE, CURSOR_LOW_BYTE};
use vga_tty::vga_buffer::DEFAULT_COLOR_CODE;
use vga_tty::{offset_of, Buffer, Color, ColorCode, PortIo, Position, Writer, BUFFER_HEIGHT, BUFFER_WIDTH};

const CELLS: usize = BUFFER_WIDTH * BUFFER_HEIGHT;

/// Only the two cursor location registers exist; the command port selects one of them.
#[derive(Default)]
struct CursorLatch {
    selected: u8,
    high: u8,
    low: u8,
}

impl PortIo for CursorLatch {
    fn write_byte(&mut self, port: u16, value: u8) {
        match (port, self.selected) {
            (CRTC_COMMAND_PORT, _) => self.selected = value,
            (CRTC_DATA_PORT, CURSOR_HIGH_BYTE) => self.high = value,
            (CRTC_DATA_PORT, CURSOR_LOW_BYTE) => self.low = value,
            (port, register) => panic!("unexpected write to {:#x} (register {:#x})", port, register),
        }
    }

    fn read_byte(&mut self, port: u16) -> u8 {
        match (port, self.selected) {
            (CRTC_DATA_PORT, CURSOR_HIGH_BYTE) => self.high,
            (CRTC_DATA_PORT, CURSOR_LOW_BYTE) => self.low,
            (port, register) => panic!("unexpected read from {:#x} (register {:#x})", port, register),
        }
    }
}

/// Returns the writer together with the raw memory behind its buffer.
fn surface() -> (Writer<CursorLatch>, *const u16) {
    let memory = Box::into_raw(Box::new([0xFFFFu16; CELLS])) as *mut u16;
    let buffer = unsafe { Buffer::at(memory as usize) };
    (Writer::new(buffer, CursorLatch::default()), memory)
}

fn raw_cell(memory: *const u16, col: usize, row: usize) -> u16 {
    unsafe { memory.add(usize::from(offset_of(col, row))).read_volatile() }
}

#[test]
fn init_overwrites_whatever_was_in_memory() {
    let (writer, memory) = surface();

    assert_eq!(writer.position(), Position::ORIGIN);
    for row in 0..BUFFER_HEIGHT {
        for col in 0..BUFFER_WIDTH {
            assert_eq!(raw_cell(memory, col, row), 0x0F20);
        }
    }
}

#[test]
fn cells_land_in_memory_as_attribute_then_character() {
    let (mut writer, memory) = surface();
    writer.set_color_code(ColorCode::new(Color::LightCyan, Color::Magenta));
    writer.write_string("Hi");

    assert_eq!(raw_cell(memory, 0, 0), 0x5B48);
    assert_eq!(raw_cell(memory, 1, 0), 0x5B69);
    assert_eq!(raw_cell(memory, 2, 0), 0x0F20);
}

#[test]
fn ab_newline_c_example() {
    let (mut writer, memory) = surface();

    writer.write_string("AB\n");
    assert_eq!(writer.position(), Position::new(0, 1).unwrap());
    writer.write_string("C");

    assert_eq!(raw_cell(memory, 0, 0) & 0xFF, u16::from(b'A'));
    assert_eq!(raw_cell(memory, 1, 0) & 0xFF, u16::from(b'B'));
    assert_eq!(raw_cell(memory, 0, 1) & 0xFF, u16::from(b'C'));
    assert_eq!(writer.position(), Position::new(1, 1).unwrap());
}

#[test]
fn two_thousand_and_one_bytes_wrap_onto_the_top_left_cell() {
    let (mut writer, memory) = surface();
    let text: Vec<u8> = (0..=CELLS).map(|i| b'0' + (i % 10) as u8).collect();

    writer.write_bytes(&text);

    assert_eq!(writer.position(), Position::new(1, 0).unwrap());
    assert_eq!(raw_cell(memory, 0, 0) & 0xFF, u16::from(text[CELLS]));
    for row in 0..BUFFER_HEIGHT {
        for col in 0..BUFFER_WIDTH {
            let i = usize::from(offset_of(col, row));
            let expected = if i == 0 { text[CELLS] } else { text[i] };
            assert_eq!(raw_cell(memory, col, row) & 0xFF, u16::from(expected));
        }
    }
}

#[test]
fn positioned_write_with_its_own_color() {
    let (mut writer, memory) = surface();
    let alert = ColorCode::new(Color::White, Color::Red);

    writer.write_at(b'!', alert, 40, 12).unwrap();
    assert!(writer.write_at(b'!', alert, 40, BUFFER_HEIGHT).is_err());

    assert_eq!(raw_cell(memory, 40, 12), 0x4F21);
    assert_eq!(writer.position(), Position::ORIGIN);
}

#[test]
fn hardware_cursor_round_trips() {
    let (mut writer, _) = surface();

    for offset in [0, 1, offset_of(0, 1), offset_of(79, 24), 0x1234] {
        writer.set_hardware_cursor(offset);
        assert_eq!(writer.hardware_cursor(), offset);
    }
}

#[test]
fn hardware_cursor_follows_logical_cursor_on_request() {
    let (mut writer, _) = surface();
    writer.write_string("prompt> ");
    assert_eq!(writer.hardware_cursor(), 0);

    writer.sync_hardware_cursor();
    assert_eq!(writer.hardware_cursor(), offset_of(8, 0));
}

#[test]
fn default_attribute_is_restored_by_a_fresh_writer() {
    let (writer, _) = surface();
    assert_eq!(writer.color_code(), DEFAULT_COLOR_CODE);
}
