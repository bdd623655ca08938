//! mipscope - headless demo
//!
//! Streams generated signals into a scope at the configured channel rates,
//! runs the viewport at the configured frame rate and builds every frame the
//! way a renderer would, logging what would be drawn.
//!
//! Usage: `mipscope [CONFIG] [SECONDS]`
//!
//! Set `MIPSCOPE_LOG_FILE` to additionally write the log to a file.

use anyhow::Context;
use mipscope::{
    config::ScopeConfig,
    grid,
    ingest::{self, Sample},
    scope::Scope,
    signal::SignalGenerator,
};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_SECONDS: f64 = 10.0;
const VIEW_SIZE: (f64, f64) = (1280.0, 720.0);

fn main() -> anyhow::Result<()> {
    // Keeps the file writer flushing until exit
    let _log_guard = init_logging();

    tracing::info!("Starting mipscope demo");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => ScopeConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path))?,
        None => ScopeConfig::load_or_default(),
    };
    let seconds = match args.next() {
        Some(s) => s
            .parse::<f64>()
            .with_context(|| format!("Invalid duration '{}'", s))?,
        None => DEFAULT_SECONDS,
    };

    run(&config, seconds)
}

fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mipscope=debug"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    let file = std::env::var_os("MIPSCOPE_LOG_FILE");
    match file.as_deref().map(Path::new) {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or(path.as_os_str());
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

fn run(config: &ScopeConfig, seconds: f64) -> anyhow::Result<()> {
    let mut scope = Scope::from_config(config).context("Failed to build scope")?;
    scope.set_view_size(VIEW_SIZE.0, VIEW_SIZE.1);

    let frame_dt = config.frame_interval();
    let frames = (seconds.max(0.0) * config.frame_rate).round() as u64;
    let frames_per_second = config.frame_rate.round().max(1.0) as u64;

    let generators: Vec<SignalGenerator> = (0..scope.channels().len())
        .map(|i| SignalGenerator::new(i as u32 + 1))
        .collect();
    let frequencies: Vec<f64> = scope.channels().iter().map(|c| c.frequency()).collect();

    // Samples arrive through the queue as they would from an acquisition thread
    let (sender, receiver) = ingest::queue(65_536);
    let mut emitted = vec![0u64; frequencies.len()];
    let start = chrono::Utc::now().timestamp_micros() as f64 / 1e6;

    for frame in 1..=frames {
        let t = frame as f64 * frame_dt;
        for (i, (generator, &frequency)) in generators.iter().zip(&frequencies).enumerate() {
            let due = (t * frequency).floor() as u64;
            while emitted[i] < due {
                let ts = emitted[i] as f64 / frequency;
                let sample = Sample::Raw {
                    value: generator.sample(ts),
                    timestamp: Some(start + ts),
                };
                // Same thread on both ends, so make room instead of blocking
                if !sender.try_send(i, sample) {
                    scope.drain(&receiver);
                    if !sender.send_sample(i, sample) {
                        tracing::warn!("Sample queue closed, dropping sample for channel {}", i);
                    }
                }
                emitted[i] += 1;
            }
        }

        scope.drain(&receiver);
        scope.tick(frame_dt);
        let traces = scope.frame(VIEW_SIZE.0)?;

        if frame % frames_per_second == 0 {
            let view = scope.viewport().current();
            let reference = scope.reference();
            let vertices: usize = traces.iter().map(|t| t.avg.len() + t.minmax.len()).sum();
            tracing::info!(
                "t={} samples={} view={}..{} level={} vertices={} anchored={}",
                grid::format_time(t),
                reference.size(),
                grid::format_time(reference.sample_to_time(view.x1)),
                grid::format_time(reference.sample_to_time(view.x2)),
                traces.first().map(|t| t.level).unwrap_or(0),
                vertices,
                scope.viewport().is_anchored()
            );
        }
    }

    for channel in scope.channels() {
        let last = channel
            .size()
            .checked_sub(1)
            .and_then(|i| channel.sample_to_datetime_utc(i as f64));
        tracing::info!(
            "Channel '{}': {} samples, {} mip levels, last sample at {}",
            channel.name(),
            channel.size(),
            channel.buffer().level_count(),
            last.map(|d| d.to_rfc3339()).unwrap_or_else(|| "-".to_string())
        );
    }

    tracing::info!("Done");
    Ok(())
}
