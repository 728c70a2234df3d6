use std::fs::{File, OpenOptions};
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info, level_filters::LevelFilter};

use table_enhancer::app::{App, Message};
use table_enhancer::batch::{replay, BatchPlan};
use table_enhancer::config::{Config, HeaderPlacement, LogDestination};
use table_enhancer::driver::Enhancer;
use table_enhancer::error::Result;
use table_enhancer::fileio::{export, FileFormat, FileIO, LoadOptions};
use table_enhancer::style::Style;

#[derive(Parser, Debug)]
#[command(
    name = "table-enhancer",
    version,
    about = "Filter and sort the tables of an HTML, CSV or TSV file"
)]
struct Args {
    /// HTML, CSV or TSV file to open
    file: PathBuf,

    /// Config file (default: ~/.config/table-enhancer/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Input format, overriding the file extension
    #[arg(long, value_parser = parse_format)]
    format: Option<FileFormat>,

    /// Leading CSV/TSV records used as header rows
    #[arg(long, value_name = "N")]
    header_rows: Option<usize>,

    /// Keep CSV/TSV header rows inside the body instead of a header section
    #[arg(long)]
    embedded_header: bool,

    /// Table to act on, counting from 1 (default: all)
    #[arg(long, value_name = "N", value_parser = parse_position)]
    table: Option<usize>,

    /// Click a header column, counting from 1. Repeatable.
    #[arg(long = "click", value_name = "COL", value_parser = parse_position)]
    clicks: Vec<usize>,

    /// Filter text applied after the clicks
    #[arg(long, value_name = "TEXT")]
    filter: Option<String>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Export format for batch mode
    #[arg(long, value_parser = parse_format)]
    export: Option<FileFormat>,

    /// trace, debug, info, warn or error
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,
}

impl Args {
    /// Any event or output option runs headless
    fn is_batch(&self) -> bool {
        !self.clicks.is_empty()
            || self.filter.is_some()
            || self.output.is_some()
            || self.export.is_some()
    }
}

fn parse_format(s: &str) -> std::result::Result<FileFormat, String> {
    FileFormat::from_name(s).ok_or_else(|| format!("unknown format '{}', use html, csv or tsv", s))
}

/// 1-based position on the command line
fn parse_position(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("'{}' is not a position (counting from 1)", s)),
        Ok(n) => Ok(n),
    }
}

/// Log panics. Restoring the terminal is left to `TerminalGuard`, since
/// panics caught per table must not tear down the screen.
fn install_panic_hook() {
    panic::set_hook(Box::new(move |info| {
        if let Some(location) = info.location() {
            error!(
                file = location.file(),
                line = location.line(),
                "panic occured"
            );
        } else {
            error!("panic occured");
        }

        if let Some(s) = info.payload().downcast_ref::<&str>() {
            error!(message = %s);
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            error!(message = %s);
        }
    }));
}

fn init_logging(destination: &LogDestination, level: &str) -> io::Result<()> {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let builder = tracing_subscriber::fmt().with_max_level(level);

    match destination {
        LogDestination::Stderr => builder.with_writer(io::stderr).init(),
        LogDestination::File(path) => {
            let file: File = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // no subscriber, so events are dropped
        LogDestination::Discard => {}
    }
    Ok(())
}

/// Raw mode, alternate screen and mouse capture for as long as it lives
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
    }
}

fn run_batch(args: &Args, enhancer: &mut Enhancer) -> Result<()> {
    let plan = BatchPlan {
        table: args.table.map(|n| n - 1),
        clicks: args.clicks.iter().map(|n| n - 1).collect(),
        filter: args.filter.clone(),
    };
    replay(enhancer, &plan)?;

    let format = args.export.unwrap_or(FileFormat::Html);
    match &args.output {
        Some(path) => {
            let file = File::create(path)?;
            export(enhancer.document(), format, plan.table, io::BufWriter::new(file))?;
            info!(path = %path.display(), "exported");
        }
        None => export(enhancer.document(), format, plan.table, io::stdout().lock())?,
    }
    Ok(())
}

fn run_interactive(enhancer: Enhancer, style: Style, warnings: Vec<String>) -> Result<()> {
    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut app = App::new(enhancer, style);
    if !warnings.is_empty() {
        app.message = Some(Message::info(warnings.join("; ")));
    }

    let result = app.run(&mut terminal);
    drop(guard);
    result?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let batch = args.is_batch();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LogDestination::Stderr, "info")?;
            error!(error = %e, "failed to load config");
            return Err(e);
        }
    };
    if let Some(rows) = args.header_rows {
        config.header_rows = rows;
    }
    if args.embedded_header {
        config.header_placement = HeaderPlacement::Body;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    init_logging(&config.log_destination(batch), &config.log_level)?;
    info!("table-enhancer started");

    install_panic_hook();

    let style = config
        .resolve_theme()
        .map(Style::with_theme)
        .map_err(|e| {
            error!(error = %e, "failed to load theme");
            e
        })?;

    let options = LoadOptions {
        header_rows: config.header_rows,
        header_placement: config.header_placement,
    };
    let file_io = FileIO::new(args.file.clone(), args.format, options);
    let load_result = file_io.load_document().map_err(|e| {
        error!(file = %file_io.file_name(), error = %e, "failed to load document");
        e
    })?;
    for warning in &load_result.warnings {
        info!(warning = %warning, "load warning");
    }

    let mut enhancer = Enhancer::activate(load_result.document, &config.filter_placeholder);

    if batch {
        run_batch(&args, &mut enhancer)
    } else {
        run_interactive(enhancer, style, load_result.warnings)
    }
}
