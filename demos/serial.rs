use std::env;

use ac250k::{Ac250k, DeviceAddress, Error, types::LINE_SETTINGS};
use inquire::Select;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

// Configuration constants - adjust these for your setup
const DEFAULT_ADDRESS: u8 = 0;
const OUTPUT_VOLTAGE_V: u16 = 12;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

/// Words for the user, keeping "no answer" apart from "the port broke".
fn describe(err: &Error<IoError>) -> String {
    match err {
        Error::Communication | Error::Timeout => "device did not respond".to_string(),
        Error::SerialError(io) => format!("serial port failure: {io}"),
        other => other.to_string(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    let address = env::args()
        .nth(2)
        .map(|arg| arg.parse::<u8>().expect("Device address must be a number"))
        .unwrap_or(DEFAULT_ADDRESS);
    let address = DeviceAddress::new(address).expect("Device address must be 0-31 or 255");

    println!("Using port: {} (device {})", port_name, address);

    let port = serialport::new(&port_name, LINE_SETTINGS.baud_rate.raw())
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(std::time::Duration::from_millis(
            LINE_SETTINGS.read_timeout.to_millis().into(),
        ))
        .open()
        .expect("Failed to open serial port");

    let mut psu = Ac250k::new(PortWrapper(port), address);

    match psu.get_identification() {
        Ok(identification) => println!("Identification: {}", identification),
        Err(err) => {
            eprintln!("Identification failed: {}", describe(&err));
            std::process::exit(1);
        }
    }

    match psu.get_voltage() {
        Ok(volts) => println!("Set voltage: {}V", volts),
        Err(err) => eprintln!("Voltage query failed: {}", describe(&err)),
    }

    match psu.set_voltage(OUTPUT_VOLTAGE_V) {
        Ok(true) => println!("Set voltage to {}V", OUTPUT_VOLTAGE_V),
        Ok(false) => println!("Device refused voltage {}V", OUTPUT_VOLTAGE_V),
        Err(err) => eprintln!("Setting voltage failed: {}", describe(&err)),
    }

    match psu.get_output_state() {
        Ok(state) => println!("Output: {:?}", state),
        Err(err) => eprintln!("Output query failed: {}", describe(&err)),
    }
}
