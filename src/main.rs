//! simplelog - pipe stdin lines into the asynchronous log service
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;

use simplelog::pipe::{run_pipe, PipeOptions};
use simplelog::signals::shutdown_signal;
use simplelog::{load_config, logging, LogService, Target};
use simplelog_core::{write_default_config, CONFIG_FILENAME};

/// simplelog - asynchronous buffered logging to stdout, a file, or both
#[derive(Parser, Debug)]
#[command(name = "simplelog")]
#[command(about = "Log every stdin line to stdout, a file, or both", long_about = None)]
struct Args {
    /// Config file (defaults to ./simplelog.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Records that can queue before writers wait
    #[arg(long, value_name = "N")]
    buffer: Option<usize>,

    /// Log file to open at startup
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Where each line goes: stdout, file or multi
    #[arg(long, default_value_t = Target::Stdout)]
    target: Target,

    /// Switch to this log file once stdin is exhausted
    #[arg(long, value_name = "PATH")]
    switch_to: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    init_config: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if let Err(e) = logging::init() {
        eprintln!("Warning: diagnostics disabled: {}", e);
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILENAME));

    if args.init_config {
        write_default_config(&config_path)?;
        eprintln!("Wrote {}", config_path.display());
        return Ok(());
    }

    let mut config = load_config(&config_path);
    if let Some(buffer) = args.buffer {
        config.buffer_capacity = buffer;
    }
    if let Some(file) = args.file {
        config.log_file = Some(file);
    }
    let options = PipeOptions {
        target: args.target,
        switch_to: args.switch_to,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        let service = LogService::with_config(&config);
        let stdin = BufReader::new(tokio::io::stdin());
        run_pipe(&service, &config, &options, stdin, shutdown_signal()).await
    });

    // The stdin reader may still be parked on a blocking read after a signal
    runtime.shutdown_background();

    result?;
    Ok(())
}
