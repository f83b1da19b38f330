use anyhow::Result;
use camapp::events::notifications;
use camapp::keyboard_input::KeyboardInputHandler;
use camapp::{
    AppConfig, CameraApp, EventBusError, FileMediaStore, InMemoryPermissions, SimulatedCamera,
    SurfaceHandle,
};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "camapp")]
#[command(about = "Camera session and capture coordinator")]
#[command(version)]
#[command(long_about = "Runs a camera session against the simulated camera backend: \
checks permissions, binds preview, photo and video capture to the back camera, \
and saves photos and recordings into a local media directory.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "camapp.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting the session")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    /// Disable keyboard controls
    #[arg(long, help = "Run without raw-mode keyboard controls")]
    no_keyboard: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        println!("# camapp configuration file");
        println!("# Default values for every option");
        println!();
        print!("{}", AppConfig::default_toml()?);
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting camapp v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match AppConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let store = Arc::new(FileMediaStore::new(&config.storage.root));
    let camera = Arc::new(SimulatedCamera::new(config.camera.clone(), store));
    let permissions = Arc::new(InMemoryPermissions::new(
        config.platform.granted.clone(),
        config.platform.grant_on_request.clone(),
    ));
    let (width, height) = config.camera.photo_resolution;

    let mut app = CameraApp::new(config, camera, permissions).map_err(|e| {
        error!("Failed to create camera session: {}", e);
        e
    })?;
    let handle = app.handle();

    // Toasts go to the terminal, which may be in raw mode
    let mut toasts = notifications(app.event_bus());
    tokio::spawn(async move {
        loop {
            match toasts.recv().await {
                Ok(event) => print!("[toast] {}\r\n", event.description()),
                Err(EventBusError::ChannelClosed) => break,
                Err(_) => continue,
            }
        }
    });

    let keyboard = if args.no_keyboard {
        None
    } else {
        let keyboard = KeyboardInputHandler::new(handle.clone());
        keyboard.start();
        Some(keyboard)
    };

    handle.surface_ready(SurfaceHandle::new(width, height))?;

    let exit_code = app.run().await.map_err(|e| {
        error!("Session error: {}", e);
        e
    })?;

    if let Some(keyboard) = keyboard {
        keyboard.stop().await;
    }

    info!("camapp exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{
        fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    };

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("camapp={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}
