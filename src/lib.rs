pub mod commands;
pub mod errors;
pub mod models;
pub mod services;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::config::{apply_overrides, init_config_manager, show_config, write_default_config};
use commands::session::{calibrate, open_session, SessionOptions};
use errors::AutofillResult;
use models::config::LoggingConfig;
use models::point::Point;

#[derive(Parser)]
#[command(name = "specimen-autofill")]
#[command(about = "Fill specimen records by template-matched clicks and OCR'd specimen numbers")]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ignore the saved calibration and locate anchors again
    #[arg(long, global = true)]
    recalibrate: bool,

    /// Override the template confidence threshold
    #[arg(long, global = true)]
    confidence: Option<f32>,

    /// Also resolve the determination grid
    #[arg(long, global = true)]
    extended: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Locate all anchors and save the coordinate map
    Calibrate {
        /// Print the map without saving it
        #[arg(long)]
        no_save: bool,
    },
    /// Read the specimen number around a point (default: pointer position)
    Ocr {
        #[arg(long, requires = "y")]
        x: Option<i32>,
        #[arg(long, requires = "x")]
        y: Option<i32>,
    },
    /// Find the specimen tag on screen and read its number
    AutoOcr,
    /// Clean a typed specimen number and run the number macro with it
    EnterNumber { text: String },
    /// Enter the clipboard number with the configured collection, then save
    NumberMacro,
    /// Fill the form from a JSON entry file
    Fill { entry: PathBuf },
    /// Go to the previous record
    Previous {
        /// Park the pointer over the specimen tag afterwards
        #[arg(long)]
        to_tag: bool,
    },
    /// Go to the next record
    Next {
        #[arg(long)]
        to_tag: bool,
    },
    /// Save the current record
    Save,
    /// Print the effective configuration
    ShowConfig {
        /// Write the default configuration file first
        #[arg(long)]
        init: bool,
    },
}

impl Command {
    fn needs_ocr(&self) -> bool {
        matches!(self, Command::Ocr { .. } | Command::AutoOcr)
    }
}

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let default_level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("specimen_autofill_lib={}", default_level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    // A subscriber may already be installed (tests, embedding hosts)
    let _ = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

pub fn run() -> AutofillResult<()> {
    let cli = Cli::parse();

    let manager = init_config_manager(cli.config.as_deref())?;
    let mut config = manager.load()?;
    apply_overrides(&mut config, cli.confidence, cli.extended);

    init_logging(&config.logging, cli.verbose);

    let options = SessionOptions {
        recalibrate: cli.recalibrate,
        with_ocr: cli.command.needs_ocr(),
    };

    match cli.command {
        Command::ShowConfig { init } => {
            if init {
                write_default_config(&manager)?;
            }
            show_config(&manager, &config)
        }
        Command::Calibrate { no_save } => calibrate(&manager, config, !no_save),
        command => {
            let session = open_session(&manager, config, options)?;
            match command {
                Command::Ocr { x, y } => {
                    let center = x.zip(y).map(|(x, y)| Point::new(x, y));
                    commands::ocr::ocr(&session, center)
                }
                Command::AutoOcr => commands::ocr::auto_ocr(&session),
                Command::EnterNumber { text } => commands::ocr::enter_number(&session, &text),
                Command::NumberMacro => commands::ocr::number_macro(&session),
                Command::Fill { entry } => commands::form::fill(&session, &entry),
                Command::Previous { to_tag } => commands::form::previous(&session, to_tag),
                Command::Next { to_tag } => commands::form::next(&session, to_tag),
                Command::Save => commands::form::save(&session),
                Command::ShowConfig { .. } | Command::Calibrate { .. } => Ok(()),
            }
        }
    }
}
