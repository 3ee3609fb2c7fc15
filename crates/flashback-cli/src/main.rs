use clap::{Parser, ValueEnum};
use flashback::audio::{AudioCall, RecordingAudio};
use flashback::systems::renderer::RenderCall;
use flashback::systems::RecordingRenderer;
use flashback::{Depth, LogNavigator, Player, PlayerConfig, PlayerContext};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the decoded movie JSON
    #[arg(value_name = "MOVIE")]
    movie: PathBuf,

    /// Number of frames to play (defaults to one loop of the main timeline)
    #[arg(long)]
    frames: Option<u32>,

    /// Player configuration JSON
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the movie frame rate
    #[arg(long)]
    frame_rate: Option<f64>,

    /// Keep the pointer over the root layer at this depth while playing
    #[arg(long, value_name = "DEPTH")]
    hover: Option<u32>,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(cli.log_level).into())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match cli.log_format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Movie: {:?}", cli.movie);
    let movie = flashback::load_movie(&cli.movie)?;

    let mut config = match &cli.config {
        Some(path) => PlayerConfig::from_file(path)?,
        None => PlayerConfig::default(),
    };
    if cli.frame_rate.is_some() {
        config.frame_rate = cli.frame_rate;
    }

    let renderer = RecordingRenderer::new();
    let audio = RecordingAudio::new();
    let context = PlayerContext {
        mount: RecordingRenderer::MOUNT,
        renderer: Box::new(renderer.clone()),
        audio: Box::new(audio.clone()),
        navigator: Box::new(LogNavigator),
    };
    let mut player = Player::new(&movie, config, context)?;
    let root = player.root();

    if let Some(depth) = cli.hover {
        match player.layer_state(root, Depth(depth)) {
            Some(layer) => {
                renderer.set_hovered(layer.container, true);
                player.pointer_hover(layer.container, true);
            }
            None => error!("No root layer at depth {}", depth),
        }
    }

    let frames = cli.frames.unwrap_or(movie.root.frame_count);
    for _ in 0..frames {
        renderer.clear_calls();
        player.advance_frames(1);
        let calls = renderer.calls();
        let changes = calls
            .iter()
            .filter(|call| matches!(call, RenderCall::SetHref(..) | RenderCall::Detach(..)))
            .count();
        if let Some(state) = player.timeline_state(root) {
            info!(
                frame = state.rendered_frame.unwrap_or(0),
                paused = state.paused,
                renderer_calls = calls.len(),
                changes,
                "Frame shown"
            );
        }
    }

    let started = audio
        .calls()
        .iter()
        .filter(|call| matches!(call, AudioCall::Play(_)))
        .count();
    info!(frames, sounds_started = started, "Playback finished");

    if let Some(state) = player.timeline_state(root) {
        for depth in 0..state.layer_count as u32 {
            if let Some(layer) = player.layer_state(root, Depth(depth)) {
                if let Some(character) = layer.character {
                    info!(
                        depth,
                        %character,
                        name = layer.name.as_deref().unwrap_or("-"),
                        sprite = layer.sprite.is_some(),
                        button = ?layer.button,
                        "Display list"
                    );
                }
            }
        }
        info!(frame = state.frame, "Next frame");
    }
    Ok(())
}
