// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podpost::{
    Credentials, NoopReporter, PipelineConfig, ProcessedStoreConfig, ProgressEvent,
    ProgressReporter, SharedProgressReporter, SlugFallback, SourceConfig, SyncResult, run_sync,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static NEW: Emoji<'_, '_> = Emoji("📝 ", "[>] ");
static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[-] ");
static IMAGE: Emoji<'_, '_> = Emoji("🖼️  ", "[#] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[?] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Turn new podcast episodes into blog posts
#[derive(Parser, Debug)]
#[command(name = "podpost")]
#[command(about = "Turn new podcast episodes into Quarto blog posts")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    source: SourceArgs,

    /// Track processed episodes in this JSON ledger instead of listing post directories
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Extension of the generated document
    #[arg(short, long, default_value = "qmd", global = true)]
    extension: String,

    /// Use a hash of the title instead of a timestamp when a title yields no usable slug
    #[arg(long, global = true)]
    hash_fallback: bool,

    /// Timeout in seconds for every network request
    #[arg(short, long, default_value = "30", global = true)]
    timeout: u64,

    /// Quiet mode - only print the summary
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose diagnostic logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum SourceArgs {
    /// Fetch episodes from the Spotify Web API
    Api {
        /// Spotify show id
        #[arg(long)]
        show_id: String,

        /// Directory holding one subdirectory per post
        posts_dir: PathBuf,

        /// Spotify client id
        #[arg(long, env = "SPOTIFY_CLIENT_ID", hide_env_values = true)]
        client_id: Option<String>,

        /// Spotify client secret
        #[arg(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
    },

    /// Fetch episodes from an RSS feed
    Feed {
        /// Spotify show id, used for the show-level player embed
        #[arg(long)]
        show_id: String,

        /// Directory holding one subdirectory per post
        posts_dir: PathBuf,

        /// Feed URLs or local files, tried in order (default: the show's Anchor/Spotify feeds)
        feeds: Vec<String>,
    },
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig> {
        let (source, posts_dir) = match self.source {
            SourceArgs::Api {
                show_id,
                posts_dir,
                client_id,
                client_secret,
            } => {
                let credentials = Credentials::resolve(client_id, client_secret)
                    .context("Spotify API credentials are required")?;
                (
                    SourceConfig::Api {
                        show_id,
                        credentials,
                    },
                    posts_dir,
                )
            }
            SourceArgs::Feed {
                show_id,
                posts_dir,
                feeds,
            } if feeds.is_empty() => (SourceConfig::default_feeds(&show_id), posts_dir),
            SourceArgs::Feed {
                show_id,
                posts_dir,
                feeds,
            } => (
                SourceConfig::Feed {
                    show_id,
                    locations: feeds,
                },
                posts_dir,
            ),
        };

        let mut config = PipelineConfig::new(source, posts_dir);
        if let Some(ledger) = self.ledger {
            config.store = ProcessedStoreConfig::Ledger(ledger);
        }
        config.document_extension = self.extension;
        if self.hash_fallback {
            config.slug_fallback = SlugFallback::TitleHash;
        }
        config.timeout = Duration::from_secs(self.timeout);
        Ok(config)
    }
}

/// Progress reporter printing one block per episode below a spinner
struct ConsoleReporter {
    spinner: ProgressBar,
}

impl ConsoleReporter {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {wide_msg}")
                .unwrap(),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self { spinner }
    }

    fn line(&self, message: String) {
        self.spinner.println(message);
    }
}

impl ProgressReporter for ConsoleReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingEpisodes { source } => {
                self.spinner
                    .set_message(format!("{SEARCH}Fetching episodes from {}", source.cyan()));
            }

            ProgressEvent::EpisodesFetched { count } => {
                self.line(format!(
                    "{HEADPHONES}Found {} episodes",
                    count.to_string().cyan()
                ));
            }

            ProgressEvent::ProcessedSetLoaded {
                store,
                existing_count,
            } => {
                self.line(format!(
                    "{FOLDER}{} already processed ({})",
                    existing_count.to_string().yellow(),
                    store.dimmed()
                ));
            }

            ProgressEvent::EpisodeStarting {
                title,
                slug,
                date,
                episode_index,
                total_episodes,
            } => {
                self.spinner.set_message(format!("Creating {}", slug.cyan()));
                self.line(format!(
                    "\n{NEW}[{}/{}] {}",
                    episode_index + 1,
                    total_episodes,
                    title.bold()
                ));
                self.line(format!("    Date: {}  Slug: {}", date, slug.cyan()));
            }

            ProgressEvent::EpisodeSkipped { title, slug } => {
                self.line(
                    format!("{SKIP}{title} ({slug}) already exists")
                        .dimmed()
                        .to_string(),
                );
            }

            ProgressEvent::CoverSaved { path, .. } => {
                self.line(format!("    {IMAGE}Cover: {}", path.display()));
            }

            ProgressEvent::CoverSkipped { reason, .. } => {
                self.line(format!("    {WARNING}{}", format!("No cover image: {reason}").yellow()));
            }

            ProgressEvent::EpisodeCreated { path, .. } => {
                self.line(format!(
                    "    {SUCCESS}Created {}",
                    path.display().to_string().green()
                ));
            }

            ProgressEvent::RecordFailed { slug, error, .. } => {
                self.line(format!(
                    "    {WARNING}{}",
                    format!("{slug} was created but not recorded: {error}").yellow()
                ));
            }

            ProgressEvent::EpisodeFailed { title, error } => {
                self.line(format!("    {FAILURE}{} - {}", title.red(), error.red()));
            }

            ProgressEvent::SyncCompleted { .. } => {
                self.spinner.finish_and_clear();
            }
        }
    }
}

fn print_summary(result: &SyncResult) {
    println!(
        "\n{PARTY}{} fetched={}, added={}, existing={}, failed={}",
        "Sync complete:".bold().green(),
        result.fetched.to_string().cyan(),
        result.added.to_string().green().bold(),
        result.existing.to_string().yellow(),
        if result.failed > 0 {
            result.failed.to_string().red().bold()
        } else {
            result.failed.to_string().green()
        }
    );
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "podpost=debug" } else { "podpost=warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let quiet = args.quiet;
    let config = args.into_config()?;

    if !quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podpost".bold().magenta(),
            "- Podcast Post Generator".dimmed()
        );
    }

    let reporter: SharedProgressReporter = if quiet {
        NoopReporter::shared()
    } else {
        Arc::new(ConsoleReporter::new())
    };

    let result = run_sync(&config, reporter)
        .await
        .context("Failed to sync podcast posts")?;

    print_summary(&result);

    if !quiet && !result.failed_episodes.is_empty() {
        println!("\n{}", "Failed episodes:".red().bold());
        for (title, error) in &result.failed_episodes {
            println!("  {}{} - {}", CROSS, title.yellow(), error.dimmed());
        }
    }

    if !quiet {
        println!(
            "\n{FOLDER}Output: {}\n",
            config.posts_dir.display().to_string().cyan()
        );
    }

    Ok(())
}
