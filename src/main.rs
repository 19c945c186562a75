//! # SkyPath Application Entry Point
//!
//! This binary drives the sky engine the way a watchface would: a minute clock
//! tick redraws the screen, settings messages from the companion device arrive
//! asynchronously, and a tap rotates the info line.
//!
//! Without watch hardware, the companion channel is stdin:
//! - a JSON object line is a settings message, e.g. `{"Latitude": 47}`
//! - the line `tap` is a tap gesture
//!
//! `--stdout` renders a single ASCII frame and exits.

// Test modules
#[cfg(test)]
mod tests;

use chrono::{Local, Timelike};
use log::{info, warn};
use skypath_lib::{
    config::Config,
    engine::SkyEngine,
    renderer::draw_ascii,
    settings::{SettingsError, SettingsUpdate},
    state::PersistedState,
};
use std::env;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::time::{interval_at, Instant};

/// What a line on the companion channel turned out to be.
#[derive(Debug, PartialEq)]
enum LineOutcome {
    Tap { accepted: bool },
    Settings { recomputed: bool },
    Ignored,
}

/// One read from the companion channel.
#[derive(Debug, PartialEq)]
enum ChannelEvent {
    Line(String),
    /// An unreadable line was dropped; the channel is still open
    Skipped,
    Closed,
}

async fn next_event<R: AsyncBufRead + Unpin>(lines: &mut Lines<R>) -> ChannelEvent {
    match lines.next_line().await {
        Ok(Some(line)) => ChannelEvent::Line(line),
        Ok(None) => ChannelEvent::Closed,
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            warn!("Skipping unreadable companion line: {}", e);
            ChannelEvent::Skipped
        }
        Err(e) => {
            warn!("Companion channel failed: {}", e);
            ChannelEvent::Closed
        }
    }
}

fn handle_line(engine: &mut SkyEngine, line: &str) -> Result<LineOutcome, SettingsError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineOutcome::Ignored);
    }
    if line.eq_ignore_ascii_case("tap") {
        return Ok(LineOutcome::Tap {
            accepted: engine.on_tap(),
        });
    }

    let update = SettingsUpdate::parse(line)?;
    let recomputed = engine.apply_settings(&update, &Local::now());
    if let Err(e) = engine.save_state() {
        warn!("Could not store settings: {}", e);
    }
    Ok(LineOutcome::Settings { recomputed })
}

/// Seconds until the next wall-clock minute starts.
fn until_next_minute() -> Duration {
    let second = Local::now().second().min(59);
    Duration::from_secs(u64::from(60 - second))
}

/// Tick, read and redraw until ctrl-c.
async fn run(engine: &mut SkyEngine) {
    draw_ascii(&engine.on_tick(&Local::now()));

    let mut ticker = interval_at(Instant::now() + until_next_minute(), Duration::from_secs(60));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                draw_ascii(&engine.on_tick(&Local::now()));
            }
            event = next_event(&mut lines), if stdin_open => {
                match event {
                    ChannelEvent::Line(line) => match handle_line(engine, &line) {
                        Ok(LineOutcome::Ignored) => {}
                        Ok(outcome) => {
                            info!("{:?}", outcome);
                            draw_ascii(&engine.frame(&Local::now()));
                        }
                        Err(e) => warn!("{}", e),
                    },
                    ChannelEvent::Skipped => {}
                    ChannelEvent::Closed => {
                        info!("Companion channel closed");
                        stdin_open = false;
                    }
                }
            }
            signal = &mut shutdown => {
                if let Err(e) = signal {
                    warn!("Could not listen for ctrl-c: {}", e);
                }
                info!("Shutting down");
                break;
            }
        }
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Development mode: one ASCII frame for testing
    let development_mode = env::args().any(|arg| arg == "--stdout");

    let config = Config::load();
    let state = PersistedState::load_or_default(&config.engine.state_path);
    info!(
        "Loaded settings on start: lat {} lon {}",
        state.latitude, state.longitude
    );

    // Create Tokio runtime for the tick loop and tap debounce timers
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let mut engine = SkyEngine::from_config(config, state);

        if development_mode {
            draw_ascii(&engine.on_tick(&Local::now()));
            return Ok(());
        }

        run(&mut engine).await;
        engine.save_state()?;
        info!("Stored state on exit");
        anyhow::Ok(())
    })
}
