use tracing_subscriber::EnvFilter;
use trex_zenoh_driver::cli::{self, Cli};

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let Some(args) = cli::parse_args(std::env::args_os()) else {
        if let Err(e) = cli::print_usage(&mut std::io::stdout()) {
            eprintln!("trex error: {}", e);
            std::process::exit(1);
        }
        return;
    };

    if let Err(e) = run(args).await {
        eprintln!("trex error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_os = "linux")]
async fn run(args: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use std::sync::Arc;
    use trex_zenoh_driver::cli::Command;
    use trex_zenoh_driver::config::Calibration;
    use trex_zenoh_driver::publisher;
    use trex_zenoh_driver::trex::{I2cTransport, TrexDriver};

    let calibration = match &args.calibration {
        Some(path) => Calibration::load(path)?,
        None => Calibration::default(),
    };
    let bus = I2cTransport::open(&args.device, args.address)?;
    let driver = Arc::new(TrexDriver::with_calibration(bus, calibration));

    match args.command {
        Some(Command::Publish { rate, format }) => publisher::run(driver, rate, format).await,
        Some(command) => cli::execute(&*driver, &command, &mut std::io::stdout()),
        None => Ok(()),
    }
}

#[cfg(not(target_os = "linux"))]
async fn run(_args: Cli) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    Err("the T'Rex I2C transport is only available on Linux".into())
}
