//! Binary entry point: plays a subtitle file against a simulated video player.

mod player;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use player::SimulatedPlayer;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use subsync_core::srt;
use subsync_core::{runtime, Inbound, ParseMode, Session, SyncConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command line options for the binary.
#[derive(Parser)]
#[command(about = "Overlay SubRip subtitles on a simulated player and fix their timing by hand")]
struct Cli {
    /// TOML file with timing and key binding settings.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Drop malformed subtitle blocks instead of keeping them.
    #[arg(long)]
    strict: bool,

    /// Override the quiet period after a manual adjustment.
    #[arg(long, value_name = "MS")]
    suppression_ms: Option<u64>,

    /// Identity of the simulated video.
    #[arg(long, default_value = "local")]
    video_id: String,

    /// Playback position to start from, in seconds.
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Write the adjusted subtitles to this file on exit.
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Only parse the file and print the entries as JSON.
    #[arg(long)]
    check: bool,

    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,

    /// Path to the SRT file to overlay.
    subtitles: PathBuf,
}

/// A line typed on stdin.
#[derive(Debug, PartialEq)]
enum Input {
    Send(Inbound),
    Seek(f64),
    Pause,
    Play,
    Open(String),
    Close,
    Load(PathBuf),
    Wait(Duration),
    Quit,
}

/// Interpret one stdin line.
/// Words are player controls; any other single character is a key press.
fn parse_input(line: &str) -> Result<Option<Input>> {
    let line = line.trim();
    let (word, arg) = match line.split_once(char::is_whitespace) {
        Some((word, arg)) => (word, arg.trim()),
        None => (line, ""),
    };
    let input = match word {
        "" => return Ok(None),
        "enter" => Input::Send(Inbound::PointerEnter),
        "leave" => Input::Send(Inbound::PointerLeave),
        "seek" => Input::Seek(parse_secs(arg)?),
        "wait" => Input::Wait(
            Duration::try_from_secs_f64(parse_secs(arg)?)
                .with_context(|| format!("wait is too long: {arg:?}"))?,
        ),
        "pause" => Input::Pause,
        "play" => Input::Play,
        "open" if !arg.is_empty() => Input::Open(arg.to_string()),
        "close" => Input::Close,
        "load" if !arg.is_empty() => Input::Load(PathBuf::from(arg)),
        "quit" | "q" => Input::Quit,
        _ => {
            let mut chars = line.chars();
            match (chars.next(), chars.next()) {
                (Some(key), None) => Input::Send(Inbound::KeyPress(key)),
                _ => return Err(anyhow!("unknown command: {line:?}")),
            }
        }
    };
    Ok(Some(input))
}

fn parse_secs(arg: &str) -> Result<f64> {
    let secs: f64 = arg
        .parse()
        .with_context(|| format!("expected seconds, got {arg:?}"))?;
    if !(secs.is_finite() && secs >= 0.0) {
        return Err(anyhow!("seconds must be a non-negative number"));
    }
    Ok(secs)
}

/// Read commands from stdin until `quit` or end of input.
/// Player controls are applied directly, everything else goes to the session.
async fn read_input(player: SimulatedPlayer, tx: mpsc::Sender<Inbound>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let input = match parse_input(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                warn!("{e:#}");
                continue;
            }
        };
        let message = match input {
            Input::Send(message) => message,
            Input::Seek(secs) => {
                player.seek(secs);
                continue;
            }
            Input::Pause => {
                player.pause();
                continue;
            }
            Input::Play => {
                player.play();
                continue;
            }
            Input::Open(id) => {
                player.open(id);
                continue;
            }
            Input::Close => {
                player.close();
                continue;
            }
            Input::Wait(duration) => {
                tokio::time::sleep(duration).await;
                continue;
            }
            Input::Load(path) => match read_subtitles(&path) {
                Ok(raw) => Inbound::Load(raw),
                Err(e) => {
                    warn!("{e:#}");
                    continue;
                }
            },
            Input::Quit => break,
        };
        if tx.send(message).await.is_err() {
            break;
        }
    }
    let _ = tx.send(Inbound::Shutdown).await;
    Ok(())
}

fn read_subtitles(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to open subtitle file: '{}'", path.display()))
}

fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = match &cli.config {
        Some(path) => SyncConfig::load(path)?,
        None => SyncConfig::default(),
    };
    if cli.strict {
        config.parse_mode = ParseMode::Strict;
    }
    if let Some(ms) = cli.suppression_ms {
        config.suppression_ms = ms;
    }
    config.validate()?;
    Ok(config)
}

/// Application entry point which parses CLI args and runs the session.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("subsync=trace".parse()?)
            .add_directive("subsync_core=trace".parse()?)
            .add_directive("info".parse()?)
    } else {
        EnvFilter::default()
            .add_directive("subsync=info".parse()?)
            .add_directive("subsync_core=info".parse()?)
            .add_directive("warn".parse()?)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let raw = read_subtitles(&cli.subtitles)?;

    if cli.check {
        let parsed = srt::parse(&raw, config.parse_mode);
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    let player = SimulatedPlayer::new(Some(cli.video_id.clone()), cli.start);
    let mut session = Session::new(config, player.clone())?;
    // The page is already showing this video when the file is picked.
    session.identity_tick();
    let report = session.load_subtitles(&raw);
    for anomaly in &report.anomalies {
        warn!(%anomaly, "subtitle file has problems");
    }
    info!(
        file = %cli.subtitles.display(),
        entries = report.entries,
        "playing; type `enter` to hover the video, then use the control keys"
    );

    let (tx, rx) = mpsc::channel(32);
    let input = tokio::spawn(read_input(player, tx));
    let session = runtime::run(session, rx).await;
    input.abort();

    if let Some(path) = &cli.export {
        fs::write(path, session.export_srt())
            .with_context(|| format!("Failed to write subtitles: '{}'", path.display()))?;
        info!(path = %path.display(), "adjusted subtitles written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ensure player controls and key presses are told apart.
    #[test]
    fn parses_input_lines() {
        assert_eq!(parse_input("  ").unwrap(), None);
        assert_eq!(
            parse_input("enter").unwrap(),
            Some(Input::Send(Inbound::PointerEnter))
        );
        assert_eq!(parse_input("seek 12.5").unwrap(), Some(Input::Seek(12.5)));
        assert_eq!(
            parse_input("wait 0.5").unwrap(),
            Some(Input::Wait(Duration::from_millis(500)))
        );
        assert_eq!(
            parse_input("open abc123").unwrap(),
            Some(Input::Open("abc123".into()))
        );
        assert_eq!(
            parse_input("]").unwrap(),
            Some(Input::Send(Inbound::KeyPress(']')))
        );
        assert_eq!(
            parse_input("s").unwrap(),
            Some(Input::Send(Inbound::KeyPress('s')))
        );
        assert_eq!(parse_input("quit").unwrap(), Some(Input::Quit));
    }

    /// Ensure malformed lines are reported instead of guessed at.
    #[test]
    fn rejects_bad_input() {
        assert!(parse_input("seek soon").is_err());
        assert!(parse_input("seek -1").is_err());
        assert!(parse_input("dance").is_err());
        assert!(parse_input("open").is_err());
        assert!(parse_input("wait 1e300").is_err());
    }

    /// Ensure command line switches override the config file.
    #[test]
    fn flags_override_config() {
        let cli = Cli::parse_from(["subsync", "--strict", "--suppression-ms", "100", "movie.srt"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.parse_mode, ParseMode::Strict);
        assert_eq!(config.suppression_ms, 100);
        assert_eq!(cli.video_id, "local");
    }
}
