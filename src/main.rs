// src/main.rs - webprint command line front end
use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use webprint::config::{self, Config};
use webprint::file_manager::FileManager;
use webprint::logging;
use webprint::{
    CapabilityState, DuplexPlanner, JobStatusTracker, Preview, PrintOutcome, PrintRequest,
    PrintSession, TrackerHandle,
};
use webprint_shared::PrintJob;
use webprint_simulator::SimulatedBackend;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

const DEFAULT_CONFIG: &str = "webprint.toml";

#[derive(Parser, Debug)]
#[command(name = "webprint", version, about = "Driverless printing with manual duplex")]
struct Cli {
    /// Configuration file (defaults to ./webprint.toml when present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Overrides logging.level from the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List available printers
    Printers,
    /// Show a printer's supported options and the defaults derived from them
    Capabilities {
        printer: String,
        #[arg(long)]
        json: bool,
    },
    /// Render a preview of a document
    Preview { file: String },
    /// Print a document
    Print {
        file: String,
        #[arg(short, long)]
        printer: String,
        #[arg(short = 'n', long, default_value_t = 1)]
        copies: u32,
        /// Pages to print, e.g. "1,3-5"
        #[arg(long)]
        pages: Option<String>,
        #[arg(long)]
        paper: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        quality: Option<String>,
        /// Manual duplex: odd pages, flip the stack, then even pages
        #[arg(long)]
        duplex: bool,
        /// Document page count, if the renderer cannot tell
        #[arg(long)]
        total_pages: Option<u32>,
        /// Return after submission instead of following job status
        #[arg(long)]
        no_track: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();
    let config = load(&cli)?;
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    logging::init_logging(logging::parse_level(level));

    tracing::info!("Starting webprint {}", env!("CARGO_PKG_VERSION"));
    let backend = Arc::new(SimulatedBackend::new(config.simulator.clone()));
    let mut session = PrintSession::new(backend, &config);

    let result = match cli.command {
        Command::Printers => list_printers(&session).await,
        Command::Capabilities { printer, json } => show_capabilities(&mut session, &printer, json).await,
        Command::Preview { file } => preview(&session, &config, &file).await,
        Command::Print {
            file,
            printer,
            copies,
            pages,
            paper,
            color,
            quality,
            duplex,
            total_pages,
            no_track,
        } => {
            let document = FileManager::new(config.documents.clone()).load_document(&file).await?;
            let total_pages = match total_pages {
                Some(n) => Some(n),
                None => session.page_count(&document).await,
            };
            let request = PrintRequest {
                document,
                copies,
                page_range: pages,
                paper_size: paper,
                color_mode: color,
                quality,
                duplex,
                total_pages,
            };
            print(&mut session, &printer, request, !no_track).await
        }
    };
    if let Err(e) = &result {
        tracing::error!("{}", e);
    }
    result
}

fn load(cli: &Cli) -> Result<Config, BoxError> {
    match &cli.config {
        Some(path) => Ok(config::load_config(path)?),
        None if Path::new(DEFAULT_CONFIG).exists() => Ok(config::load_config(DEFAULT_CONFIG)?),
        None => Ok(Config::default()),
    }
}

async fn list_printers(session: &PrintSession) -> Result<(), BoxError> {
    for printer in session.printers().await? {
        println!("{printer}");
    }
    Ok(())
}

async fn show_capabilities(session: &mut PrintSession, printer: &str, json: bool) -> Result<(), BoxError> {
    match session.select_printer(printer).await {
        CapabilityState::Available { capabilities, defaults } => {
            if json {
                let out = serde_json::json!({
                    "printer": printer,
                    "capabilities": capabilities,
                    "defaults": defaults,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Printer:  {printer}");
                println!("Media:    {}", list_or_unsupported(capabilities.media()));
                println!("Color:    {}", list_or_unsupported(capabilities.color_modes()));
                println!("Quality:  {}", list_or_unsupported(capabilities.qualities()));
                println!(
                    "Defaults: paper={} color={} quality={}",
                    defaults.paper_size.as_deref().unwrap_or("-"),
                    defaults.color_mode.as_deref().unwrap_or("-"),
                    defaults.quality.as_deref().unwrap_or("-"),
                );
            }
            Ok(())
        }
        CapabilityState::Unavailable { reason } => Err(reason.clone().into()),
    }
}

fn list_or_unsupported(items: &[String]) -> String {
    if items.is_empty() {
        "(unsupported)".to_string()
    } else {
        items.join(", ")
    }
}

async fn preview(session: &PrintSession, config: &Config, file: &str) -> Result<(), BoxError> {
    let document = FileManager::new(config.documents.clone()).load_document(file).await?;
    match session.preview(&document).await? {
        Preview::Direct => println!("{}: shown as is", document.name()),
        Preview::Rendered(locator) => {
            let pages = locator
                .page_count
                .map(|n| format!(" ({n} pages)"))
                .unwrap_or_default();
            println!("{}: preview at {}{}", document.name(), locator.path, pages);
        }
        Preview::Unavailable { reason } => {
            println!("{}: preview unavailable ({reason})", document.name())
        }
    }
    Ok(())
}

async fn print(
    session: &mut PrintSession,
    printer: &str,
    request: PrintRequest,
    track: bool,
) -> Result<(), BoxError> {
    if let CapabilityState::Unavailable { reason } = session.select_printer(printer).await {
        eprintln!("Printer options unavailable ({reason}); printing with printer defaults");
    }
    let tracker = session.tracker().clone();
    match session.print(request).await? {
        PrintOutcome::Single(job) => {
            report_submitted("Job", &job);
            if track {
                follow(tracker.watch(job.id()), job).await?;
            }
        }
        PrintOutcome::Duplex(planner) => run_duplex(planner, &tracker, track).await?,
    }
    Ok(())
}

async fn run_duplex(mut planner: DuplexPlanner, tracker: &JobStatusTracker, track: bool) -> Result<(), BoxError> {
    let mut followers = Vec::new();
    if let Some(job) = planner.odd_job() {
        report_submitted("Odd pages", job);
        if track {
            followers.push(tokio::spawn(follow(tracker.watch(job.id()), job.clone())));
        }
    }
    if let Some(note) = planner.note() {
        println!("{note}");
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while planner.awaiting_flip() {
        println!(
            "Flip the printed stack and put it back in the tray, then type 'y' to print pages {} (or 'n' to stop):",
            planner.even_pages()
        );
        let line = stdin.next_line().await?;
        match flip_answer(line.as_deref()) {
            FlipAnswer::Confirm => match planner.confirm_flip().await {
                Ok(job) => {
                    report_submitted("Even pages", job);
                    if track {
                        followers.push(tokio::spawn(follow(tracker.watch(job.id()), job.clone())));
                    }
                }
                Err(e) => eprintln!("{e}. Type 'y' to retry."),
            },
            FlipAnswer::Decline => {
                if line.is_none() {
                    eprintln!("Input closed before the flip was confirmed.");
                }
                planner.cancel_flip()?;
                println!("Second pass skipped; the odd pages keep printing.");
            }
            FlipAnswer::Unrecognized => {}
        }
    }

    for follower in followers {
        follower.await??;
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum FlipAnswer {
    Confirm,
    Decline,
    Unrecognized,
}

/// Operator reply to the flip prompt. Closed input (`None`) declines.
fn flip_answer(line: Option<&str>) -> FlipAnswer {
    match line.map(str::trim) {
        None => FlipAnswer::Decline,
        Some("y" | "Y" | "yes") => FlipAnswer::Confirm,
        Some("n" | "N" | "no") => FlipAnswer::Decline,
        Some(_) => FlipAnswer::Unrecognized,
    }
}

fn report_submitted(label: &str, job: &PrintJob) {
    println!(
        "{label}: job {} on {} (pages {})",
        job.id(),
        job.parameters().printer_id(),
        job.parameters().page_range().unwrap_or("all")
    );
}

async fn follow(mut handle: TrackerHandle, mut job: PrintJob) -> Result<(), BoxError> {
    while let Some(update) = handle.next_into(&mut job).await {
        let update = update?;
        println!(
            "[{}] job {}: {} ({})",
            update.observed_at.format("%H:%M:%S"),
            job.id(),
            job.status().state,
            job.status().reason
        );
    }
    Ok(())
}
