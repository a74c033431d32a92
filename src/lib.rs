/* The driver runs on bare metal, so the library itself has no standard library. Unit tests are the exception: they
run on the host, with the text buffer and the CRTC ports replaced by plain memory and a fake register file. */
#![cfg_attr(not(test), no_std)]

pub mod cursor;
pub mod error;
pub mod vga_buffer;

/* COM1 output is only wanted by the bootable kernel, see the `kernel` feature in Cargo.toml. */
#[cfg(feature = "kernel")]
pub mod serial;

pub use cursor::{HardwareCursor, PortIo};
pub use error::TtyError;
pub use vga_buffer::{
    offset_of, Buffer, Color, ColorCode, Position, ScreenChar, Writer, BUFFER_HEIGHT, BUFFER_WIDTH,
};

#[cfg(target_arch = "x86_64")]
pub use cursor::CrtcPorts;

#[cfg(target_arch = "x86_64")]
pub fn hlt_loop() -> ! {
    // hlt: Halt the CPU until the next interrupt arrives and allow the CPU to enter a sleep state.
    loop {
        x86_64::instructions::hlt();
    }
}
