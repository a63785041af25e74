//! `slots` CLI: propose interview availability from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Six random slots over the next three weeks, as a bullet list
//! slots generate
//!
//! # Weekday mornings only, two per day at most, reproducible
//! slots generate --weekdays-only --morning --per-day 2 --seed 42
//!
//! # Drop anything that collides with exported calendars, draft an email
//! slots generate --busy-ics work.ics --busy-ics personal.ics --format email --name "Sam"
//!
//! # Settings from a file, one flag overridden, holds written as iCalendar
//! slots generate --config slots.json --count 10 --format ics -o holds.ics
//!
//! # Inspect the busy time an .ics file contributes
//! slots parse-ics -i work.ics
//! ```

use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use slot_engine::availability::{hold_end, SlotConflict};
use slot_engine::config::{
    self, BlacklistInput, LenientBool, LenientInt, SlotConfig, SlotConfigInput, DEFAULT_ZONE,
};
use slot_engine::ics;
use slot_engine::render::{self, Tone};
use slot_engine::source::{BusySource, IcsFeed, SourceStatus, DEFAULT_SOURCE_TIMEOUT};
use slot_engine::{propose, Proposal};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slots",
    version,
    about = "Randomized interview availability proposals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug details to stderr (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate slot proposals
    Generate(GenerateArgs),
    /// Print the busy intervals found in an .ics file as JSON
    ParseIcs {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Zone for floating times
        #[arg(long)]
        zone: Option<String>,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// JSON settings file; flags given on the command line take precedence
    #[arg(long)]
    config: Option<String>,
    /// Number of slots to propose (1-24)
    #[arg(long)]
    count: Option<i64>,
    /// Furthest day to consider, counted from tomorrow (1-120)
    #[arg(long)]
    days_ahead: Option<i64>,
    /// Window start, HH:MM
    #[arg(long)]
    start: Option<String>,
    /// Window end, HH:MM
    #[arg(long)]
    end: Option<String>,
    /// Slot grid in minutes (5-180)
    #[arg(long)]
    interval: Option<i64>,
    /// Maximum slots per day, 0 for no limit
    #[arg(long)]
    per_day: Option<i64>,
    /// Skip Saturdays and Sundays
    #[arg(long)]
    weekdays_only: bool,
    /// Keep slots away from the window edges
    #[arg(long)]
    biz_friendly: bool,
    /// Prefer the first half of the window
    #[arg(long)]
    morning: bool,
    /// Prefer the second half of the window
    #[arg(long)]
    afternoon: bool,
    /// Comma-separated YYYY-MM-DD days to skip
    #[arg(long)]
    blacklist: Option<String>,
    /// Reference time zone (IANA name)
    #[arg(long)]
    zone: Option<String>,
    /// Seed for a reproducible proposal
    #[arg(long)]
    seed: Option<u64>,
    /// Instant treated as "now" (RFC 3339)
    #[arg(long)]
    now: Option<String>,
    /// Exported calendar whose events count as busy (repeatable)
    #[arg(long = "busy-ics")]
    busy_ics: Vec<String>,
    /// Per-source wait in milliseconds
    #[arg(long, default_value_t = DEFAULT_SOURCE_TIMEOUT.as_millis() as u64)]
    timeout_ms: u64,
    /// Output format
    #[arg(long, value_enum, default_value_t = Format::List)]
    format: Format,
    /// Email tone
    #[arg(long, default_value_t = Tone::Formal)]
    tone: Tone,
    /// Name used to sign the email and label calendar holds
    #[arg(long, default_value = "")]
    name: String,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    List,
    Email,
    Ics,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate(args) => generate(args).await?,
        Commands::ParseIcs { input, zone } => {
            let zone = parse_zone(zone.as_deref())?;
            let text = read_input(input.as_deref())?;
            let busy = ics::parse_busy(&text, zone).context("Failed to parse calendar")?;
            let json = serde_json::to_string_pretty(&busy)?;
            write_output(None, &format!("{json}\n"))?;
        }
    }

    Ok(())
}

/// Log to stderr so stdout only ever carries the rendered result.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let config = build_config(&args)?;
    let now = match args.now.as_deref() {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --now instant: {}", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let sources: Vec<Box<dyn BusySource>> = args
        .busy_ics
        .iter()
        .map(|path| {
            Box::new(IcsFeed::from_path(Path::new(path), config.zone)) as Box<dyn BusySource>
        })
        .collect();

    let proposal = propose(
        &config,
        now,
        &mut rng,
        &sources,
        Duration::from_millis(args.timeout_ms),
    )
    .await;

    eprintln!("{}", proposal.status_message());
    for line in proposal.source_messages() {
        eprintln!("{}", line);
    }

    let rendered = render_output(&proposal, &config, &args, now)?;
    write_output(args.output.as_deref(), &rendered)
}

/// Load the optional settings file and layer the command-line flags on top.
fn build_config(args: &GenerateArgs) -> Result<SlotConfig> {
    let base = match args.config.as_deref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            serde_json::from_str::<SlotConfigInput>(&raw)
                .with_context(|| format!("Invalid config file: {}", path))?
        }
        None => SlotConfigInput::default(),
    };

    if let Some(zone) = args.zone.as_deref() {
        parse_zone(Some(zone))?;
    }

    // Switches only override the file when they are actually given.
    let flag = |set: bool| set.then_some(LenientBool::Bool(true));
    let overrides = SlotConfigInput {
        count: args.count.map(LenientInt::from),
        max_days_ahead: args.days_ahead.map(LenientInt::from),
        window_start: args.start.clone(),
        window_end: args.end.clone(),
        interval: args.interval.map(LenientInt::from),
        per_day: args.per_day.map(LenientInt::from),
        weekdays_only: flag(args.weekdays_only),
        biz_friendly_padding: flag(args.biz_friendly),
        morning_bias: flag(args.morning),
        afternoon_bias: flag(args.afternoon),
        blacklist: args.blacklist.clone().map(BlacklistInput::Csv),
        zone: args.zone.clone(),
        dst_policy: None,
    };

    Ok(base.merge(overrides).normalize())
}

fn parse_zone(zone: Option<&str>) -> Result<Tz> {
    match zone {
        None => Ok(DEFAULT_ZONE),
        Some(name) => Ok(config::parse_zone(name)?),
    }
}

#[derive(Serialize)]
struct SlotJson {
    start: String,
    end: String,
    label: String,
}

#[derive(Serialize)]
struct ProposalJson<'a> {
    zone: &'a str,
    requested: usize,
    generated: usize,
    slots: Vec<SlotJson>,
    sources: &'a [SourceStatus],
    conflicts: &'a [SlotConflict],
}

fn render_output(
    proposal: &Proposal,
    config: &SlotConfig,
    args: &GenerateArgs,
    now: DateTime<Utc>,
) -> Result<String> {
    let zone = config.zone;
    let slots = &proposal.slots;

    let text = match args.format {
        Format::List => with_newline(render::bullet_list(slots, zone)),
        Format::Email => with_newline(render::build_email(slots, zone, &args.name, args.tone)),
        Format::Ics => ics::export_calendar(slots, zone, &args.name, now),
        Format::Json => {
            let doc = ProposalJson {
                zone: zone.name(),
                requested: proposal.requested,
                generated: proposal.generated,
                slots: slots
                    .iter()
                    .map(|s| SlotJson {
                        start: s.to_rfc3339(),
                        end: hold_end(*s).to_rfc3339(),
                        label: render::label(*s, zone),
                    })
                    .collect(),
                sources: &proposal.sources,
                conflicts: &proposal.conflicts,
            };
            with_newline(serde_json::to_string_pretty(&doc).context("Failed to serialize proposal")?)
        }
    };

    Ok(text)
}

fn with_newline(mut text: String) -> String {
    if !text.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
