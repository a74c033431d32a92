use core::fmt;

use log::debug;
use volatile::Volatile;

use crate::cursor::{HardwareCursor, PortIo};
use crate::error::TtyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)] // This makes sure each enum variant is stored as a u8. 4 bits would be enough but Rust doesn't have a u4 type.
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    Pink = 13,
    Yellow = 14,
    White = 15,
}

impl Color {
    /// Decodes the low four bits of `nibble`; the upper bits are ignored.
    pub const fn from_nibble(nibble: u8) -> Color {
        match nibble & 0x0F {
            0 => Color::Black,
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Cyan,
            4 => Color::Red,
            5 => Color::Magenta,
            6 => Color::Brown,
            7 => Color::LightGray,
            8 => Color::DarkGray,
            9 => Color::LightBlue,
            10 => Color::LightGreen,
            11 => Color::LightCyan,
            12 => Color::LightRed,
            13 => Color::Pink,
            14 => Color::Yellow,
            _ => Color::White,
        }
    }
}

/// The attribute byte of a cell: foreground in the low nibble, background in the high nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)] // ColorCode must have the same representation as the contained u8.
pub struct ColorCode(u8);

impl ColorCode {
    pub const fn new(foreground: Color, background: Color) -> ColorCode {
        ColorCode((background as u8) << 4 | (foreground as u8))
    }

    pub const fn foreground(self) -> Color {
        Color::from_nibble(self.0)
    }

    pub const fn background(self) -> Color {
        Color::from_nibble(self.0 >> 4)
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

/* Every byte is a valid attribute, so raw attributes coming from other kernel code convert without a check. */
impl From<u8> for ColorCode {
    fn from(attribute: u8) -> ColorCode {
        ColorCode(attribute)
    }
}

/// White on black, the attribute a fresh surface is cleared with.
pub const DEFAULT_COLOR_CODE: ColorCode = ColorCode::new(Color::White, Color::Black);

/// One cell of the text surface. On little-endian x86 the two bytes read as the `u16` `attribute << 8 | char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)] // need this since default ordering of fields in structs is undefined; this guarantees a C-style layout
pub struct ScreenChar {
    pub ascii_character: u8,
    pub color_code: ColorCode,
}

impl ScreenChar {
    pub const fn new(ascii_character: u8, color_code: ColorCode) -> ScreenChar {
        ScreenChar {
            ascii_character,
            color_code,
        }
    }

    pub const fn to_u16(self) -> u16 {
        (self.color_code.0 as u16) << 8 | self.ascii_character as u16
    }

    pub const fn from_u16(entry: u16) -> ScreenChar {
        ScreenChar {
            ascii_character: (entry & 0xFF) as u8,
            color_code: ColorCode((entry >> 8) as u8),
        }
    }
}

pub const BUFFER_HEIGHT: usize = 25;
pub const BUFFER_WIDTH: usize = 80;

/// Physical address of the color text mode buffer.
pub const VGA_BUFFER_ADDR: usize = 0xb8000;

/// Linear index of a cell, the addressing used by both the buffer and the hardware cursor.
///
/// The caller guarantees `col < BUFFER_WIDTH` and `row < BUFFER_HEIGHT`. Use [`Position`] when the
/// coordinates come from somewhere untrusted.
pub const fn offset_of(col: usize, row: usize) -> u16 {
    debug_assert!(col < BUFFER_WIDTH && row < BUFFER_HEIGHT);
    (row * BUFFER_WIDTH + col) as u16
}

/// A cell coordinate that is known to lie on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    col: usize,
    row: usize,
}

impl Position {
    pub const ORIGIN: Position = Position { col: 0, row: 0 };

    pub fn new(col: usize, row: usize) -> Result<Position, TtyError> {
        if col < BUFFER_WIDTH && row < BUFFER_HEIGHT {
            Ok(Position { col, row })
        } else {
            Err(TtyError::OutOfBounds { col, row })
        }
    }

    pub fn from_offset(offset: u16) -> Result<Position, TtyError> {
        let offset_usize = usize::from(offset);
        if offset_usize >= BUFFER_WIDTH * BUFFER_HEIGHT {
            return Err(TtyError::OffsetOutOfRange(offset));
        }
        Ok(Position {
            col: offset_usize % BUFFER_WIDTH,
            row: offset_usize / BUFFER_WIDTH,
        })
    }

    pub fn col(&self) -> usize {
        self.col
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn offset(&self) -> u16 {
        offset_of(self.col, self.row)
    }
}

#[repr(transparent)] // we use repr(transparent) again to ensure that it has the same memory layout as its single field.
pub struct Buffer {
    chars: [[Volatile<ScreenChar>; BUFFER_WIDTH]; BUFFER_HEIGHT],
}

impl Buffer {
    /// Views the `BUFFER_WIDTH * BUFFER_HEIGHT` cells starting at `addr` as a text buffer.
    ///
    /// # Safety
    ///
    /// `addr` must point to that many writable, 2-byte cells that stay valid for the rest of the program, and
    /// nothing else may hold a reference to them.
    pub unsafe fn at(addr: usize) -> &'static mut Buffer {
        &mut *(addr as *mut Buffer)
    }
}

/* The writer owns the whole text mode state: the logical cursor, the current attribute, the buffer binding and the
CRTC ports for the blinking cursor. Since it can only be obtained through `new`, which clears the screen, nothing ever
reads a cell that was not written by the writer first. */
pub struct Writer<P> {
    column_position: usize, // next column to write, always < BUFFER_WIDTH
    row_position: usize,    // next row to write, always < BUFFER_HEIGHT
    color_code: ColorCode,  // attribute for every write that does not bring its own
    buffer: &'static mut Buffer,
    cursor: HardwareCursor<P>,
}

impl<P: PortIo> Writer<P> {
    /// Binds the buffer, homes the cursor, restores the default colors and clears the screen.
    pub fn new(buffer: &'static mut Buffer, ports: P) -> Writer<P> {
        let addr = &*buffer as *const Buffer;
        debug!(
            "text surface {}x{} bound at {:p}",
            BUFFER_WIDTH, BUFFER_HEIGHT, addr
        );

        let mut writer = Writer {
            column_position: 0,
            row_position: 0,
            color_code: DEFAULT_COLOR_CODE,
            buffer,
            cursor: HardwareCursor::new(ports),
        };
        writer.clear_screen();
        writer
    }

    /// Writes one byte at the cursor and advances it. `\n` and `\r` only move the cursor.
    pub fn write_byte(&mut self, byte: u8) {
        match byte {
            b'\n' => {
                self.column_position = 0;
                self.advance_row();
            }
            b'\r' => self.column_position = 0,
            byte => {
                let row = self.row_position;
                let col = self.column_position;

                let color_code = self.color_code;
                self.buffer.chars[row][col].write(ScreenChar {
                    ascii_character: byte,
                    color_code,
                });

                self.column_position += 1;
                if self.column_position == BUFFER_WIDTH {
                    self.column_position = 0;
                    self.advance_row();
                }
            }
        }
    }

    // There is no scrolling: past the last row the writer starts over on row 0 and overwrites it in place.
    fn advance_row(&mut self) {
        self.row_position += 1;
        if self.row_position == BUFFER_HEIGHT {
            self.row_position = 0;
        }
    }

    /// Feeds every byte to `write_byte` as is.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.write_byte(byte);
        }
    }

    pub fn write_string(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Writes a cell at an absolute position. The logical cursor is neither used nor moved.
    pub fn write_at(
        &mut self,
        byte: u8,
        color_code: ColorCode,
        col: usize,
        row: usize,
    ) -> Result<(), TtyError> {
        let position = Position::new(col, row)?;
        self.buffer.chars[position.row][position.col].write(ScreenChar::new(byte, color_code));
        Ok(())
    }

    pub fn read_at(&self, col: usize, row: usize) -> Result<ScreenChar, TtyError> {
        let position = Position::new(col, row)?;
        Ok(self.buffer.chars[position.row][position.col].read())
    }

    pub fn clear_screen(&mut self) {
        for row in 0..BUFFER_HEIGHT {
            self.clear_row(row);
        }
    }

    fn clear_row(&mut self, row: usize) {
        // Clears a row by writing the ascii space character as each byte.
        let blank = ScreenChar {
            ascii_character: b' ',
            color_code: self.color_code,
        };
        for col in 0..BUFFER_WIDTH {
            self.buffer.chars[row][col].write(blank);
        }
    }

    pub fn set_color_code(&mut self, color_code: ColorCode) {
        self.color_code = color_code;
    }

    pub fn color_code(&self) -> ColorCode {
        self.color_code
    }

    /// Where the next unpositioned byte will land.
    pub fn position(&self) -> Position {
        Position {
            col: self.column_position,
            row: self.row_position,
        }
    }

    pub fn set_hardware_cursor(&mut self, offset: u16) {
        self.cursor.set(offset);
    }

    pub fn hardware_cursor(&mut self) -> u16 {
        self.cursor.get()
    }

    /// Puts the blinking cursor where the next byte will be written.
    pub fn sync_hardware_cursor(&mut self) {
        let offset = self.position().offset();
        self.cursor.set(offset);
    }

    pub fn enable_cursor(&mut self, start: u8, end: u8) {
        self.cursor.enable(start, end);
    }

    pub fn disable_cursor(&mut self) {
        self.cursor.disable();
    }
}

/* We want to use Rust formatting macros, so let's implement core::fmt::Write for our Writer. Unlike write_string,
formatted output is filtered to what the VGA code page can show. */
impl<P: PortIo> fmt::Write for Writer<P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            match byte {
                // printable ASCII byte, newline or carriage return
                0x20..=0x7e | b'\n' | b'\r' => self.write_byte(byte),
                // For unprintable bytes, we print a ■ character, which has the hex code 0xfe on the VGA hardware
                _ => self.write_byte(0xfe),
            }
        }
        Ok(())
    }
}

#[cfg(target_arch = "x86_64")]
use crate::cursor::CrtcPorts;
#[cfg(target_arch = "x86_64")]
use lazy_static::lazy_static;
#[cfg(target_arch = "x86_64")]
use spin::Mutex;

/* Use lazy_static to obtain a runtime static. This is to provide a global writer interface.
We also use a spin Mutex to perform atomic writes. We use a spinlock since it is CPU dependent
and doesn't require the standard library. It does burn CPU time though. */
#[cfg(target_arch = "x86_64")]
lazy_static! {
    pub static ref WRITER: Mutex<Writer<CrtcPorts>> = Mutex::new(Writer::new(
        unsafe { Buffer::at(VGA_BUFFER_ADDR) },
        unsafe { CrtcPorts::new() },
    ));
}

/// Binds and clears the screen. Later calls do nothing; the first `print!` would do the same implicitly.
#[cfg(target_arch = "x86_64")]
pub fn init() {
    lazy_static::initialize(&WRITER);
}

/* Define the println and print macros (code taken from the standard lib and repurposed to use the buffer). */
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::vga_buffer::_print(format_args!($($arg)*)));
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

#[doc(hidden)]
#[cfg(target_arch = "x86_64")]
pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;
    use x86_64::instructions::interrupts;

    // An interrupt handler that prints while we hold the lock would spin forever.
    interrupts::without_interrupts(|| {
        WRITER
            .lock()
            .write_fmt(args)
            .expect("Printing to VGA buffer failed");
    });
}
