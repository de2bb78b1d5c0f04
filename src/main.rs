// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use amarelo::app_config::{self, Config};
use amarelo::app_controller::{Controller, RunTarget};
use amarelo::file_utils::FileManager;
use amarelo::progress::{RunStatus, WorkflowEvent};
use amarelo::subtitle_processor::{SubtitleFormat, SubtitleTrack};
use amarelo::{subtitle_generator, sync};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate styled subtitles for a video or a directory of videos (default command)
    Run(RunArgs),

    /// Shift an existing subtitle file by an offset or onto a scene anchor
    Resync(ResyncArgs),

    /// Generate shell completions for amarelo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Input video file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Output directory (overrides general.output_dir)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Translate the subtitles
    #[arg(long)]
    translate: bool,

    /// Target language code (e.g., 'pt', 'es', 'fr')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Skip the alignment check of existing subtitles
    #[arg(long)]
    no_verify: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct ResyncArgs {
    /// Subtitle file to shift (.srt, .ass, .ssa or .vtt)
    #[arg(value_name = "SUBTITLE")]
    subtitle: PathBuf,

    /// Seconds to add to every timestamp (negative to pull earlier)
    #[arg(long, allow_hyphen_values = true, conflicts_with = "scenes", required_unless_present = "scenes")]
    offset: Option<f64>,

    /// Scene anchors in seconds; the first entry is moved onto the first anchor
    #[arg(long, value_delimiter = ',')]
    scenes: Vec<f64>,

    /// Output file; `.ass` writes ASS, anything else SRT
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file path (font styling)
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,
}

/// Amarelo - styled subtitles for your videos
///
/// Reuses and resynchronizes subtitles found next to your videos, or
/// transcribes the audio when there are none, then writes styled SRT/ASS files.
#[derive(Parser, Debug)]
#[command(name = "amarelo")]
#[command(version)]
#[command(about = "Styled subtitle generation and resynchronization")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "Amarelo writes styled subtitles for videos. When a subtitle with the same
name sits next to a video it is checked against the audio and resynchronized,
otherwise the audio is transcribed from scratch.

EXAMPLES:
    amarelo movie.mkv                         # One video, default config
    amarelo /movies/                          # Every video in a directory
    amarelo run --translate -t es /movies/    # Translate to Spanish
    amarelo resync movie.srt --offset -1.25   # Pull a subtitle 1.25s earlier
    amarelo resync movie.srt --scenes 4.2 -o movie.ass
    amarelo completions bash > amarelo.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file does not
    exist, a default one is created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set by log::set_max_level below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "amarelo", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Resync(args)) => run_resync(args),
        Some(Commands::Run(args)) => run_workflow(args).await,
        None => run_workflow(cli.run).await,
    }
}

/// Load the configuration, creating a default file when it is missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config.save(config_path)?;
    Ok(config)
}

async fn run_workflow(options: RunArgs) -> Result<()> {
    if let Some(level) = &options.log_level {
        log::set_max_level(level_filter(&level.clone().into()));
    }

    let input_path = options.input_path.clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required"))?;

    let mut config = load_config(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(output_dir) = &options.output_dir {
        config.general.output_dir = output_dir.to_string_lossy().to_string();
    }
    if options.translate {
        config.translation.enabled = true;
    }
    if let Some(target) = &options.target_language {
        config.translation.target_language = target.clone();
    }
    if options.no_verify {
        config.sync.auto_verify = false;
    }
    if let Some(level) = &options.log_level {
        config.log_level = level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(level_filter(&config.log_level));

    let target = if input_path.is_dir() {
        RunTarget::Directory(input_path)
    } else if input_path.is_file() {
        RunTarget::Files(vec![input_path])
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    };

    let controller = Controller::with_config(config)?;
    let mut handle = controller.spawn(target);

    let cancel = handle.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Stopping after the current video...");
            cancel.cancel();
        }
    });

    let progress_bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    progress_bar.set_style(style.progress_chars("█▓▒░"));

    let mut final_status = RunStatus::Failed;
    let mut final_message = String::from("Worker stopped without reporting");

    while let Some(event) = handle.events.recv().await {
        match event {
            WorkflowEvent::Progress { current, total, message } => {
                if total > 0 {
                    progress_bar.set_length(total as u64);
                    progress_bar.set_position(current as u64);
                }
                progress_bar.set_message(message);
            }
            WorkflowEvent::Preview(text) => {
                progress_bar.println(text);
            }
            WorkflowEvent::VideoFailed { video, message, .. } => {
                progress_bar.println(format!("Failed: {} ({})", video, message));
            }
            WorkflowEvent::Finished { status, message } => {
                progress_bar.finish_with_message(message.clone());
                final_status = status;
                final_message = message;
            }
        }
    }

    handle.join.await.context("Workflow worker panicked")?;

    if final_status.is_success() {
        info!("{}", final_message);
        Ok(())
    } else {
        Err(anyhow!("Run {}: {}", final_status, final_message))
    }
}

fn run_resync(args: ResyncArgs) -> Result<()> {
    let config = load_config(&args.config_path)?;
    config.validate().context("Configuration validation failed")?;

    let mut track = SubtitleTrack::load(&args.subtitle)
        .with_context(|| format!("Failed to load subtitle {}", args.subtitle.display()))?;

    match args.offset {
        Some(offset) => {
            sync::adjust_offset(&mut track, offset);
        }
        None => {
            sync::sync_by_scenes(&mut track, &args.scenes);
        }
    }

    let output = match args.output {
        Some(output) => output,
        None => {
            let extension = match SubtitleFormat::from_path(&args.subtitle)? {
                SubtitleFormat::Ass => "ass",
                _ => "srt",
            };
            let parent = args.subtitle.parent().unwrap_or_else(|| Path::new("."));
            FileManager::generate_output_path(&args.subtitle, parent, "_resynced", extension)
        }
    };

    subtitle_generator::generate(&track, &output, &config.font)?;
    info!("Success: {}", output.display());
    Ok(())
}
