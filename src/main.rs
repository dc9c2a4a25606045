use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod domain;
mod filter;
mod inputter;
mod model;
mod pager;
mod sort;
mod table;
mod ui;

use controller::Controller;
use domain::{TVConfig, TVError};
use model::{Model, Status};
use pager::PageSize;
use ui::TableUI;

/// A tui viewer for CSV and Parquet files with column filters, sorting and paging.
#[derive(Parser, Debug)]
#[command(name = "tabview", version, about)]
struct Args {
    /// CSV or Parquet file to open
    #[arg(value_name = "FILE")]
    path: Option<String>,

    /// Rows per page, 0 shows all rows on one page
    #[arg(short = 'n', long, default_value_t = 10)]
    page_size: usize,

    /// Maximum rendered width of a column
    #[arg(long, default_value_t = 30)]
    max_column_width: usize,

    /// Log file, defaults to tabview.log in the temp directory
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("Warning: Could not initialize logging: {}", e);
    }

    match run(&args) {
        Err(e) => {
            error!("Exiting with error: {:?}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

// The terminal belongs to the ui, so logs go to a file.
fn init_logging(args: &Args) -> Result<(), TVError> {
    let path = args
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("tabview.log"));
    let file = File::create(path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let file_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: &Args) -> Result<(), TVError> {
    info!("Starting tabview!");

    let cfg = TVConfig::default()
        .page_size(PageSize::from_count(args.page_size))
        .max_column_width(args.max_column_width);

    let mut model = Model::init(&cfg);
    if let Some(raw) = &args.path {
        let path = table::resolve_path(raw)?;
        model = model.update(controller::open(&path));
        if model.status == Status::EMPTY {
            return Err(TVError::LoadingFailed(model.status_message().to_string()));
        }
    }

    let mut terminal = ratatui::init();
    let result = event_loop(&cfg, model, &mut terminal);
    ratatui::restore();
    result
}

fn event_loop(
    cfg: &TVConfig,
    mut model: Model,
    terminal: &mut DefaultTerminal,
) -> Result<(), TVError> {
    let ui = TableUI::new(cfg);
    let mut controller = Controller::new(cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, controller.prompt(), f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model = model.update(message);
        }
    }
    info!("Quitting tabview");
    Ok(())
}
