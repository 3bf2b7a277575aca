//! memmon - GPU memory usage monitor
//!
//! A command-line front end that runs sampling windows and prints the
//! resulting memory statistics.

use clap::Parser;
use memmon::cli::args::{generate_completions, Cli, Commands};
use memmon::commands::{run_read, run_sample};
use memmon::config::{Config, ConfigBuilder};
use memmon::error::AppError;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    let config = build_config(&cli);

    // Set log level based on verbose flag
    if config.general.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Run the appropriate command
    let result = run(&cli, &config);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn build_config(cli: &Cli) -> Config {
    let duration = match &cli.command {
        Commands::Sample(args) => args.duration,
        _ => None,
    };

    ConfigBuilder::new()
        .with_file(cli.config.as_deref())
        .with_verbose(cli.verbose.then_some(true))
        .with_device(cli.device.clone())
        .with_poll_rate(cli.poll_rate)
        .with_duration(duration)
        .build()
}

fn run(cli: &Cli, config: &Config) -> Result<(), AppError> {
    match &cli.command {
        Commands::Sample(args) => run_sample(args, config, cli.format),

        Commands::Read => run_read(config, cli.format),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::MonitorDisabled(device) if device.starts_with("cuda") => {
            eprintln!();
            eprintln!("Hint: Make sure the NVIDIA driver is installed.");
            eprintln!("      Check 'nvidia-smi' for GPU detection.");
        }
        AppError::MonitorDisabled(_) => {
            eprintln!();
            eprintln!("Hint: The DRM backend reads /sys/class/drm/card<N>/device/mem_info_vram_*.");
            eprintln!("      Only amdgpu exposes these counters.");
        }
        AppError::Monitor(memmon::error::MonitorError::InvalidDevice(_)) => {
            eprintln!();
            eprintln!("Hint: Use --device cuda, cuda:<N> or drm:<N>.");
        }
        _ => {}
    }
}
