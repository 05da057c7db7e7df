use r502_protocol::{Command, ConfirmationCode, SerialTransport, R502};
use std::env;

mod pc_utils;
use pc_utils::{open_port, print_ports, PortBaud, SerialReader, SerialWriter, StdTimer};

const DEFAULT_BAUD_RATE: u32 = 57600;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.len() {
        1 => print_ports(),
        2 => run_test(args[1].as_str()),
        _ => panic!("Usage: pc_authentication [port_name]"),
    };
}

fn run_test(port_name: &str) {
    let port_cell = open_port(port_name, DEFAULT_BAUD_RATE);

    let transport = SerialTransport::with_baud_control(
        SerialWriter(&port_cell),
        SerialReader(&port_cell),
        StdTimer::new(),
        PortBaud(&port_cell),
    );
    let mut r502 = R502::new(transport, 0xffffffff);

    println!("1. Checking status");

    let cmd = Command::ReadSysPara;
    println!("Command: {:#?}", cmd);
    match r502.send_command(cmd) {
        Ok(reply) => println!("Reply: {:#?}", reply),
        Err(e) => println!("Error: {}", e),
    };

    println!("2. Verifying password");

    match r502.verify_password(0x00000000) {
        Ok(ConfirmationCode::Success) => println!("Password accepted"),
        Ok(code) => println!("Module says: {:?}", code),
        Err(e) => panic!("Error: {}", e),
    };

    println!("3. Checking status again - password should be ok");

    match r502.read_system_parameters() {
        Ok(result) => println!(
            "Password ok: {}",
            result.system_parameters.password_ok()
        ),
        Err(e) => println!("Error: {}", e),
    };

    println!("4. Counting templates");

    match r502.template_count() {
        Ok(result) => println!("{} templates stored", result.template_num),
        Err(e) => println!("Error: {}", e),
    };
}
