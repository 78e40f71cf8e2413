use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wikicorpus::extract::{self, JobConfig};
use wikicorpus::models::ContentFormat;
use wikicorpus::stats::CounterSnapshot;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikicorpus")]
#[command(about = "Split Wikipedia dumps into classified pages and extract text or redirects")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every article as `id<TAB>content`
    PlainText(PlainTextArgs),
    /// Write every redirect as `title<TAB>target`
    Redirects(JobArgs),
}

#[derive(Args)]
struct JobArgs {
    /// Path to the Wikipedia dump file (.xml or .xml.bz2)
    #[arg(short, long)]
    input: String,

    /// Output directory (replaced if it exists)
    #[arg(short, long)]
    output: String,

    /// Two-letter or six-letter language code (en, de, zh_yue, simple, ...)
    #[arg(long, value_parser = parse_language)]
    language: Option<String>,

    /// Bytes per split for uncompressed dumps
    #[arg(long, default_value_t = wikicorpus::config::DEFAULT_SPLIT_SIZE)]
    split_size: u64,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// Stop after roughly this many pages (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Classify and count only, don't write output files
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct PlainTextArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Output content type: TEXT, HTML or WIKI
    #[arg(long, default_value_t = ContentFormat::Text)]
    content_format: ContentFormat,
}

fn parse_language(s: &str) -> Result<String, String> {
    if s.len() == 2 || s.len() == 6 {
        Ok(s.to_string())
    } else {
        Err(format!("\"{s}\" unknown language"))
    }
}

impl JobArgs {
    fn into_config(self) -> JobConfig {
        let mut config = JobConfig::new(self.input, self.output);
        config.language = self.language;
        config.split_size = self.split_size;
        config.threads = self.threads;
        config.limit = self.limit;
        config.dry_run = self.dry_run;
        config
    }
}

fn print_summary(counters: &CounterSnapshot, elapsed_secs: f64) {
    println!();
    println!("=== Summary ===");
    println!("Elapsed time:       {:.2}s", elapsed_secs);
    println!();
    println!("Total pages:        {}", counters.total);
    println!("Redirects:          {}", counters.redirect);
    println!("Disambiguations:    {}", counters.disambiguation);
    println!("Empty:              {}", counters.empty);
    println!("Articles:           {}", counters.article);
    println!("Stubs:              {}", counters.stub);
    println!("Other:              {}", counters.other);
    println!("Malformed:          {}", counters.malformed);
    println!("Missing targets:    {}", counters.redirect_target_missing);
}

fn run(command: Commands) -> Result<()> {
    let start = Instant::now();
    let counters = match command {
        Commands::PlainText(args) => {
            let mut config = args.job.into_config();
            config.content_format = args.content_format;
            extract::run_plain_text(&config)?
        }
        Commands::Redirects(args) => extract::run_redirects(&args.into_config())?,
    };
    print_summary(&counters, start.elapsed().as_secs_f64());
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // RUST_LOG overrides -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli.command) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
