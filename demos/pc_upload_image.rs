use r502_protocol::{ConfirmationCode, SerialTransport, R502};
use std::{env, fs, thread, time::Duration};

mod pc_utils;
use pc_utils::{open_port, print_ports, PortBaud, SerialReader, SerialWriter, StdTimer};

const DEFAULT_BAUD_RATE: u32 = 57600;
const IMAGE_WIDTH: usize = 192;
const IMAGE_HEIGHT: usize = 192;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => print_ports(),
        3 => upload_to(args[1].as_str(), args[2].as_str()),
        _ => panic!("Usage: pc_upload_image [port_name] [output.pgm]"),
    };
}

fn upload_to(port_name: &str, path: &str) {
    let port_cell = open_port(port_name, DEFAULT_BAUD_RATE);

    let transport = SerialTransport::with_baud_control(
        SerialWriter(&port_cell),
        SerialReader(&port_cell),
        StdTimer::new(),
        PortBaud(&port_cell),
    );
    let mut r502 = R502::new(transport, 0xffffffff);

    println!("1. Verifying password");
    match r502.verify_password(0x00000000) {
        Ok(ConfirmationCode::Success) => {}
        Ok(code) => panic!("Module says: {:?}", code),
        Err(e) => panic!("Error: {}", e),
    };

    println!("2. Reading the packet size");
    match r502.sync_settings() {
        Ok(_) => println!("Packet size: {} bytes", r502.packet_size().len()),
        Err(e) => panic!("Error: {}", e),
    };

    println!("3. Place your finger on the sensor");
    loop {
        match r502.generate_image() {
            Ok(ConfirmationCode::Success) => break,
            Ok(ConfirmationCode::FingerNotDetected) => thread::sleep(Duration::from_millis(100)),
            Ok(code) => panic!("Module says: {:?}", code),
            Err(e) => panic!("Error: {}", e),
        }
    }

    println!("4. Uploading the image");
    let mut pixels = Vec::with_capacity(IMAGE_WIDTH * IMAGE_HEIGHT);
    let mut consumer = |frame: &[u8]| pixels.extend_from_slice(frame);
    match r502.up_image(Some(&mut consumer)) {
        Ok(result) if result.confirmation_code == ConfirmationCode::Success => println!(
            "Received {} packets, {} bytes",
            result.frames, result.bytes_received
        ),
        Ok(result) => panic!("Module says: {:?}", result.confirmation_code),
        Err(e) => panic!("Error: {}", e),
    };

    if pixels.len() != IMAGE_WIDTH * IMAGE_HEIGHT {
        println!(
            "Expected {} pixels, got {}; writing what arrived",
            IMAGE_WIDTH * IMAGE_HEIGHT,
            pixels.len()
        );
    }
    let height = pixels.len() / IMAGE_WIDTH;
    let mut pgm = format!("P5\n{} {}\n255\n", IMAGE_WIDTH, height).into_bytes();
    pgm.extend_from_slice(&pixels[..IMAGE_WIDTH * height]);
    fs::write(path, pgm).unwrap();
    println!("Image written to {}", path);
}
