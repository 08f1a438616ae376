// Command line interface for one-shot T'Rex commands
//
// trex motor <left> <right> | brake <left> <right> | servo <n> <position>
//      | status | reset | publish

use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::{I2C_DEVICE, PUBLISH_HZ, TREX_ADDRESS};
use crate::messages::StatusFormat;
use crate::trex::{BusTransport, Telemetry, TrexDriver};

/// Control a DAGU T'Rex robot controller over I2C
#[derive(Debug, Parser)]
#[command(name = "trex", version, about, disable_help_subcommand = true)]
pub struct Cli {
    /// I2C device the controller is attached to
    #[arg(short, long, default_value = I2C_DEVICE)]
    pub device: PathBuf,

    /// I2C address of the controller
    #[arg(short, long, default_value_t = TREX_ADDRESS)]
    pub address: u8,

    /// JSON file with board calibration
    #[arg(short, long)]
    pub calibration: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Print battery voltage, motor current, accelerometer and impact
    Status,
    /// Set speed of the dc motors (-255 to 255)
    #[command(allow_negative_numbers = true)]
    Motor { left: i16, right: i16 },
    /// Engage motor brakes
    Brake { left: u8, right: u8 },
    /// Set servo position (servo 1 to 6, position typically 1000 to 2000)
    Servo { servo: u8, position: u16 },
    /// Reset the controller to its defaults (stops the motors)
    Reset,
    /// Publish status continuously over Zenoh
    Publish {
        /// Samples per second
        #[arg(long, default_value_t = PUBLISH_HZ, value_parser = clap::value_parser!(u64).range(1..=1000))]
        rate: u64,

        #[arg(long, value_enum, default_value_t)]
        format: StatusFormat,
    },
}

/// Parse arguments; `None` means usage should be shown instead
pub fn parse_args<I, S>(args: I) -> Option<Cli>
where
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) if cli.command.is_some() => Some(cli),
        _ => None,
    }
}

/// Print usage help
pub fn print_usage(out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "trex status".bold())?;
    writeln!(out, "Battery voltage")?;
    writeln!(out, "Motor current")?;
    writeln!(out, "Accelerometer")?;
    writeln!(out, "Impact")?;
    writeln!(out)?;
    writeln!(out, "{}", "trex motor <left> <right>".bold())?;
    writeln!(out, "Set speed of the dc motors")?;
    writeln!(out, "Left, right: -255 to 255")?;
    writeln!(out)?;
    writeln!(out, "{}", "trex brake <left> <right>".bold())?;
    writeln!(out, "Engage motor brakes")?;
    writeln!(out)?;
    writeln!(out, "{}", "trex servo <servo_number> <position>".bold())?;
    writeln!(out, "Servo number: 1 to 6")?;
    writeln!(
        out,
        "Position: typically 1000 to 2000, depending on the servos used"
    )?;
    writeln!(out)?;
    writeln!(out, "{}", "trex reset".bold())?;
    writeln!(out, "Restore controller defaults and stop the motors")?;
    writeln!(out)?;
    writeln!(out, "{}", "trex publish [--rate <hz>] [--format csv|json]".bold())?;
    writeln!(out, "Publish status continuously over Zenoh")?;
    writeln!(out)?;
    Ok(())
}

/// Run a one-shot command against the driver and report the result
pub fn execute<T: BusTransport>(
    driver: &TrexDriver<T>,
    command: &Command,
    out: &mut impl Write,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match *command {
        Command::Status => {
            let telemetry = driver.read_status()?;
            print_telemetry(&telemetry, out)?;
        }
        Command::Motor { left, right } => {
            driver.set_motor(left, right)?;
            writeln!(out, "Motor speed left: {}", left)?;
            writeln!(out, "Motor speed right: {}", right)?;
        }
        Command::Brake { left, right } => {
            driver.set_brake(left, right)?;
            writeln!(out, "Left brake: {}", left)?;
            writeln!(out, "Right brake: {}", right)?;
        }
        Command::Servo { servo, position } => {
            driver.set_servo(servo, position)?;
            writeln!(out, "Servo number: {}", servo)?;
            writeln!(out, "Position: {}", position)?;
        }
        Command::Reset => {
            driver.reset()?;
            writeln!(out, "Controller reset")?;
        }
        Command::Publish { .. } => {
            return Err("publish runs in the async runtime".into());
        }
    }
    Ok(())
}

fn print_telemetry(t: &Telemetry, out: &mut impl Write) -> io::Result<()> {
    if let Some(prev) = t.previous_command {
        writeln!(out, "Previous command packet: {}", prev)?;
    }
    writeln!(out, "Battery voltage: {}", t.battery_voltage)?;
    writeln!(out, "Left motor current: {}", t.left_motor_current)?;
    writeln!(out, "Right motor current: {}", t.right_motor_current)?;
    writeln!(out, "Accelerometer X-axis: {}", t.accelerometer_x)?;
    writeln!(out, "Accelerometer Y-axis: {}", t.accelerometer_y)?;
    writeln!(out, "Accelerometer Z-axis: {}", t.accelerometer_z)?;
    writeln!(out, "Impact X-axis: {}", t.impact_x)?;
    writeln!(out, "Impact Y-axis: {}", t.impact_y)?;
    writeln!(out, "Impact Z-axis: {}", t.impact_z)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trex::transport::mock::MockBus;

    fn run(driver: &TrexDriver<MockBus>, args: &[&str]) -> String {
        let cli = parse_args(args.iter().copied()).expect("valid command");
        let mut out = Vec::new();
        execute(driver, cli.command.as_ref().unwrap(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_no_arguments_shows_usage() {
        assert!(parse_args(["trex"]).is_none());
    }

    #[test]
    fn test_unknown_subcommand_shows_usage() {
        assert!(parse_args(["trex", "dance"]).is_none());
        assert!(parse_args(["trex", "motor", "fast"]).is_none());
    }

    #[test]
    fn test_parse_negative_motor_speed() {
        let cli = parse_args(["trex", "motor", "-100", "50"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Motor {
                left: -100,
                right: 50
            })
        );
        assert_eq!(cli.address, TREX_ADDRESS);
        assert_eq!(cli.device, PathBuf::from(I2C_DEVICE));
    }

    #[test]
    fn test_parse_publish_defaults() {
        let cli = parse_args(["trex", "publish"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Publish {
                rate: PUBLISH_HZ,
                format: StatusFormat::Csv
            })
        );
        assert!(parse_args(["trex", "publish", "--rate", "0"]).is_none());
    }

    #[test]
    fn test_motor_command() {
        let driver = TrexDriver::new(MockBus::new());
        let output = run(&driver, &["trex", "motor", "-255", "255"]);
        assert_eq!(output, "Motor speed left: -255\nMotor speed right: 255\n");
        assert_eq!(&driver.registers()[1..3], &[0xFF, 0x01]);
        assert_eq!(&driver.registers()[4..6], &[0x00, 0xFF]);
    }

    #[test]
    fn test_servo_command() {
        let driver = TrexDriver::new(MockBus::new());
        let output = run(&driver, &["trex", "servo", "2", "1750"]);
        assert!(output.contains("Servo number: 2"));
        assert_eq!(&driver.registers()[9..11], &[0x06, 0xD6]);
    }

    #[test]
    fn test_servo_out_of_range_is_error() {
        let driver = TrexDriver::new(MockBus::new());
        let cli = parse_args(["trex", "servo", "9", "1500"]).unwrap();
        let mut out = Vec::new();
        assert!(execute(&driver, cli.command.as_ref().unwrap(), &mut out).is_err());
    }

    #[test]
    fn test_status_command() {
        let driver = TrexDriver::new(MockBus::new());
        let mut reply = vec![0u8; 24];
        reply[2] = 0x04;
        reply[3] = 0xB0;
        driver.transport().push_read(reply);
        let output = run(&driver, &["trex", "status"]);
        assert!(output.starts_with("Previous command packet: 0\nBattery voltage: 1200\n"));
        assert!(output.ends_with("Impact Z-axis: 0\n"));
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_usage_reports_write_errors() {
        let err = print_usage(&mut ClosedPipe).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_usage_lists_commands() {
        let mut out = Vec::new();
        print_usage(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        for cmd in ["trex status", "trex motor", "trex brake", "trex servo"] {
            assert!(text.contains(cmd), "usage missing {}", cmd);
        }
    }
}
