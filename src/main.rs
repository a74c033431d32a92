/* Remove dependence on standard lib so we can build a freestanding Rust binary that
runs on bare metal. */
#![no_std]
/* Override default entry point for program since we don't have access to the Rust runtime. */
#![no_main]

use core::panic::PanicInfo;

use bootloader::{entry_point, BootInfo};
use log::{info, LevelFilter};
use vga_tty::vga_buffer::{self, WRITER};
use vga_tty::{hlt_loop, println, serial, serial_println, Color, ColorCode, BUFFER_HEIGHT, BUFFER_WIDTH};

entry_point!(kernel_main);

fn kernel_main(_boot_info: &'static BootInfo) -> ! {
    if serial::init_logger(LevelFilter::Debug).is_err() {
        serial_println!("logger already installed");
    }

    vga_buffer::init();
    println!("Hello World{}", "!");
    info!("text console up");

    x86_64::instructions::interrupts::without_interrupts(|| {
        let mut writer = WRITER.lock();

        let banner = ColorCode::new(Color::Black, Color::LightGray);
        for (i, &byte) in b" vga_tty ".iter().enumerate() {
            // Fits on the bottom row by construction.
            let _ = writer.write_at(byte, banner, BUFFER_WIDTH - 9 + i, BUFFER_HEIGHT - 1);
        }

        writer.set_color_code(ColorCode::new(Color::Yellow, Color::Black));
        writer.write_string("cursor follows the text\r\n");
        writer.set_color_code(vga_buffer::DEFAULT_COLOR_CODE);

        writer.enable_cursor(14, 15);
        writer.sync_hardware_cursor();
        let offset = writer.hardware_cursor();
        info!("hardware cursor at offset {}", offset);
    });

    hlt_loop();
}

// This function is called on panic - we don't want to use the standard lib one..
#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    serial_println!("[failed]\n");
    serial_println!("Error: {}\n", info);
    println!("{}", info);
    hlt_loop();
}
