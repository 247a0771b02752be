use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use emotion_player::config::Config;
use emotion_player::emotion::{ClassifierKind, EmotionLabel};
use emotion_player::journal::{MoodEntry, MoodJournal};
use emotion_player::media::{MediaResolver, ResolvedMedia};
use emotion_player::pipeline::EmotionPipeline;
use emotion_player::report::MediaOutcome;

/// Detect the mood of a photo and play music to match
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Photo to analyse (JPEG or PNG, uploaded or captured)
    #[arg(required_unless_present = "list_labels")]
    image: Option<PathBuf>,

    /// Classifier: "rule" (local brightness/contrast) or "remote" (inference API)
    #[arg(short, long)]
    classifier: Option<ClassifierKind>,

    /// Directory holding {label}.mp3 clips
    #[arg(short, long)]
    music_dir: Option<PathBuf>,

    /// Path to the config file (default: ~/.emotionplayer/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Command used to play the clip, e.g. "mpv --no-video"
    #[arg(long)]
    player: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Show the score for every detected emotion
    #[arg(short = 'a', long)]
    show_distribution: bool,

    /// Play the matching clip with the configured player
    #[arg(short, long)]
    play: bool,

    /// Append the detected mood to the mood journal
    #[arg(long)]
    save_mood: bool,

    /// List emotion labels and their clips, then exit
    #[arg(long)]
    list_labels: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = load_config(&args)?;

    // Handle --list-labels
    if args.list_labels {
        list_labels(&MediaResolver::default(), &config);
        return Ok(());
    }

    let Some(image_path) = args.image.as_deref() else {
        anyhow::bail!("No photo given");
    };

    info!("Emotion player starting...");
    info!("Photo: {:?}", image_path);
    info!("Classifier: {:?}", config.classifier);
    info!("Music directory: {:?}", config.music_dir);

    let pipeline = match EmotionPipeline::from_config(&config) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to set up classifier: {}", e);
            eprintln!("\n{}", e);
            eprintln!("{}", e.user_hint());
            return Err(e.into());
        }
    };

    let report = match pipeline.process_path(image_path).await {
        Ok(report) => report,
        Err(e) => {
            error!("Mood detection failed: {}", e);
            eprintln!("\nOops! {}", e);
            eprintln!("Tip: {}", e.user_hint());
            return Err(e.into());
        }
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
    } else {
        println!("\n{}", report.render_text(args.show_distribution));
    }

    // Play music
    if args.play {
        match report.playable() {
            Some(status) => match pipeline.playback().play(status) {
                Ok(true) => debug!("Player started"),
                Ok(false) => warn!("No player configured; set --player or `player_command`"),
                Err(e) => warn!("{}", e),
            },
            None => warn!("Nothing to play for this mood"),
        }
    }

    // Save mood
    if args.save_mood {
        let media = match &report.media {
            MediaOutcome::Resolved { media, .. } => Some(media.media.as_str()),
            MediaOutcome::NotFound { .. } => None,
        };
        let entry = MoodEntry::new(&report.classification, Some(image_path), media);
        let journal = MoodJournal::new(config.get_journal_path()?);
        journal
            .append(&entry)
            .with_context(|| format!("Failed to save mood to {:?}", journal.path()))?;
        if !args.json {
            println!("Mood saved to your journal!");
        }
    }

    info!("Done");
    Ok(())
}

/// Load the config file and apply command-line overrides
fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => Some(path.clone()),
        None => match Config::default_config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("No default config location, using defaults: {}", e);
                None
            }
        },
    };

    let mut config = match path {
        Some(path) => {
            debug!("Loading config from {:?}", path);
            Config::load(&path)?
        }
        None => Config::default(),
    };

    if let Some(kind) = args.classifier {
        config.classifier = kind;
    }
    if let Some(ref dir) = args.music_dir {
        config.music_dir = dir.clone();
    }
    if let Some(ref player) = args.player {
        config.player_command = Some(player.clone());
    }

    Ok(config)
}

fn list_labels(resolver: &MediaResolver, config: &Config) {
    println!("Emotion labels:\n");

    for label in EmotionLabel::ALL {
        match resolver.resolve(label) {
            Ok(ResolvedMedia {
                media,
                source_label,
                is_fallback,
            }) => {
                let alias = if is_fallback {
                    format!(" (uses {} clip)", source_label)
                } else {
                    String::new()
                };
                let path = config.music_dir.join(media.as_str());
                let marker = if path.is_file() { "" } else { " [missing]" };
                println!(
                    "  {} {:<9} -> {}{}{}",
                    label.symbol(),
                    label.as_str(),
                    path.display(),
                    alias,
                    marker
                );
            }
            Err(e) => println!("  {} {:<9} -> {}", label.symbol(), label.as_str(), e),
        }
    }

    if config.classifier == ClassifierKind::Rule {
        println!("\nThe rule-based classifier only produces: happy, sad, surprise, neutral, calm");
    }
}
