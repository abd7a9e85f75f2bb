//! Command-line interface for groupchat-podcast.

#![allow(clippy::print_stdout)] // user-facing CLI output

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use groupchat_podcast::config::AppConfig;
use groupchat_podcast::contacts;
use groupchat_podcast::db::ChatDb;
use groupchat_podcast::logging::init_logging;
use groupchat_podcast::podcast::{PodcastGenerator, ProgressObserver};
use groupchat_podcast::preflight;
use groupchat_podcast::tts::ElevenLabsClient;
use groupchat_podcast::urls::{HttpTitleResolver, UrlRewriter};
use groupchat_podcast::validation::{ensure_mp3_extension, load_voice_map, parse_datetime_input};

#[derive(Parser)]
#[command(author, version, about = "Convert iMessage group chats into podcast-style audio", long_about = None)]
struct Cli {
    /// Path to iMessage chat.db (defaults to the configured location)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify prerequisites (ffmpeg, chat.db access, API key)
    Preflight,

    /// List group chats, most recently active first
    ListChats,

    /// Estimate the synthesis cost for a date range
    Estimate {
        /// Group chat ID
        #[arg(long)]
        chat_id: i64,

        /// Start date (YYYY-MM-DD or "YYYY-MM-DD HH:MM")
        #[arg(long)]
        start_date: String,

        /// End date (YYYY-MM-DD or "YYYY-MM-DD HH:MM")
        #[arg(long)]
        end_date: String,
    },

    /// Generate a podcast from a group chat
    Generate {
        /// Group chat ID
        #[arg(long)]
        chat_id: i64,

        /// Start date (YYYY-MM-DD or "YYYY-MM-DD HH:MM")
        #[arg(long)]
        start_date: String,

        /// End date (YYYY-MM-DD or "YYYY-MM-DD HH:MM")
        #[arg(long)]
        end_date: String,

        /// Output file path
        #[arg(short, long, default_value = "podcast.mp3")]
        output: PathBuf,

        /// JSON file mapping sender handles to voice IDs ("_default" = fallback)
        #[arg(long)]
        voices: PathBuf,

        /// Milliseconds of silence between messages
        #[arg(long)]
        pause_ms: Option<u32>,
    },
}

/// Logs synthesis progress as each utterance is dispatched.
struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&mut self, current: usize, total: usize, preview: &str) {
        info!(current, total, preview, "Synthesizing");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let log_level = config.get_log_level();
    init_logging(
        Some(log_level.as_str()),
        config.logging.file_path.as_deref().map(std::path::Path::new),
    )?;

    let db_path = cli
        .db_path
        .unwrap_or_else(|| PathBuf::from(config.get_imessage_db_path()));

    match cli.command {
        Commands::Preflight => run_preflight(&config),
        Commands::ListChats => list_chats(&db_path),
        Commands::Estimate {
            chat_id,
            start_date,
            end_date,
        } => estimate(&config, &db_path, chat_id, &start_date, &end_date),
        Commands::Generate {
            chat_id,
            start_date,
            end_date,
            output,
            voices,
            pause_ms,
        } => generate(
            &config,
            &db_path,
            chat_id,
            &start_date,
            &end_date,
            output,
            &voices,
            pause_ms,
        ),
    }
}

fn run_preflight(config: &AppConfig) -> Result<()> {
    let results = preflight::run_checks(config);
    let mut all_passed = true;

    for check in &results {
        if check.passed {
            println!("  ok   {}: {}", check.name, check.message);
        } else {
            all_passed = false;
            println!("  FAIL {}: {}", check.name, check.message);
            if let Some(fix) = &check.fix_instruction {
                println!("       fix: {fix}");
            }
        }
    }

    if all_passed {
        println!("\nAll checks passed.");
        Ok(())
    } else {
        anyhow::bail!("one or more preflight checks failed")
    }
}

fn list_chats(db_path: &std::path::Path) -> Result<()> {
    let db = ChatDb::open(db_path).context("Failed to open iMessage database")?;
    let chats = db.list_group_chats()?;

    if chats.is_empty() {
        warn!("No group chats found");
        return Ok(());
    }

    // Resolve display names for presentation only
    let lookup = contacts::build_contact_lookup(&contacts::find_contact_dbs(
        &contacts::default_sources_dir(),
    ))
    .unwrap_or_default();

    println!("{:>8}  {:<30} {:>12}  {}", "ID", "Name", "Participants", "Last Message");
    for chat in &chats {
        let resolved = contacts::resolve_participants(&chat.participants, &lookup);
        let names: Vec<&str> = chat
            .participants
            .iter()
            .map(|p| resolved.get(p).map_or(p.as_str(), String::as_str))
            .collect();
        let last = chat
            .last_message_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:>8}  {:<30} {:>12}  {}",
            chat.chat_id, chat.display_name, chat.participant_count, last
        );
        println!("          members: {}", names.join(", "));
    }
    Ok(())
}

fn build_generator_parts(
    config: &AppConfig,
) -> Result<(ElevenLabsClient, UrlRewriter<HttpTitleResolver>)> {
    let api_key = std::env::var(preflight::API_KEY_ENV)
        .with_context(|| format!("{} is not set", preflight::API_KEY_ENV))?;
    let mut client = ElevenLabsClient::with_base_url(&api_key, &config.tts.api_base)?;
    client.set_model_id(&config.tts.model_id);
    client.set_output_format(&config.tts.output_format);

    let resolver = HttpTitleResolver::new(config.podcast.url_fetch_timeout_secs)?;
    let rewriter = UrlRewriter::new(resolver, config.podcast.url_cache_capacity)?;
    Ok((client, rewriter))
}

fn estimate(
    config: &AppConfig,
    db_path: &std::path::Path,
    chat_id: i64,
    start_date: &str,
    end_date: &str,
) -> Result<()> {
    let start = parse_datetime_input(start_date, false)?;
    let end = parse_datetime_input(end_date, true)?;

    let db = ChatDb::open(db_path).context("Failed to open iMessage database")?;
    let (client, mut rewriter) = build_generator_parts(config)?;
    let generator = PodcastGenerator::new(
        &client,
        groupchat_podcast::VoiceMap::new(),
        config.podcast.merge_gap_secs,
        config.podcast.cost_per_char,
    )?;

    let estimate = generator.estimate_cost(&db, &mut rewriter, chat_id, start, end)?;
    println!("Messages:       {}", estimate.message_count);
    println!("Characters:     {}", estimate.characters);
    println!("Estimated cost: ${:.2}", estimate.estimated_cost);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn generate(
    config: &AppConfig,
    db_path: &std::path::Path,
    chat_id: i64,
    start_date: &str,
    end_date: &str,
    output: PathBuf,
    voices: &std::path::Path,
    pause_ms: Option<u32>,
) -> Result<()> {
    let start = parse_datetime_input(start_date, false)?;
    let end = parse_datetime_input(end_date, true)?;
    let output = ensure_mp3_extension(output);
    let voice_map = load_voice_map(voices)?;

    let db = ChatDb::open(db_path).context("Failed to open iMessage database")?;
    let (client, mut rewriter) = build_generator_parts(config)?;
    let generator = PodcastGenerator::new(
        &client,
        voice_map,
        config.podcast.merge_gap_secs,
        config.podcast.cost_per_char,
    )?;

    let pause = pause_ms.unwrap_or(config.podcast.pause_ms);
    let mut progress = LogProgress;

    match generator.generate(
        &db,
        &mut rewriter,
        chat_id,
        start,
        end,
        &output,
        pause,
        &mut progress,
    ) {
        Ok(()) => {
            println!("Podcast saved to {}", output.display());
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Podcast generation failed");
            Err(e.into())
        }
    }
}
