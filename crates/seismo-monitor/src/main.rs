//! Seismo Monitor - headless seismometer over a simulated accelerometer
//!
//! Usage: seismo-monitor [CONFIG.json] [--preset needle|graph] [--pattern NAME]
//!                       [--seconds N] [--log-every N]

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use seismo_core::{EngineConfig, ProcessedReading};
use seismo_processing::{Engine, EngineStats};
use seismo_sensor::{MotionPattern, PollingSensor, SimulatedAccelerometer, SimulationConfig, GRAVITY_G};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Headless seismometer over a simulated accelerometer
#[derive(Debug, Parser)]
#[command(name = "seismo-monitor")]
struct MonitorArgs {
    /// JSON engine configuration; overrides --preset
    config: Option<PathBuf>,

    /// Built-in engine configuration
    #[arg(long, value_enum, default_value_t = Preset::Needle)]
    preset: Preset,

    /// Simulated motion pattern
    #[arg(long, value_enum, default_value_t = PatternName::Quake)]
    pattern: PatternName,

    /// Run time in seconds
    #[arg(long = "seconds", value_name = "N", default_value = "5", value_parser = parse_seconds)]
    run_for: Duration,

    /// Log every N-th reading
    #[arg(long, value_name = "N", default_value_t = 25, value_parser = clap::value_parser!(u64).range(1..))]
    log_every: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Preset {
    Needle,
    Graph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PatternName {
    Rest,
    Tremor,
    Quake,
    Burst,
    Ramp,
}

impl PatternName {
    fn motion_pattern(self) -> MotionPattern {
        let name = match self {
            PatternName::Rest => "rest",
            PatternName::Tremor => "tremor",
            PatternName::Quake => "quake",
            PatternName::Burst => "burst",
            PatternName::Ramp => "ramp",
        };
        MotionPattern::preset(name).unwrap_or_default()
    }
}

fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value.parse().map_err(|e| format!("expected a number: {}", e))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid run time {}: {}", secs, e))
}

impl MonitorArgs {
    fn engine_config(&self) -> Result<EngineConfig> {
        if let Some(path) = &self.config {
            return EngineConfig::from_file(path)
                .with_context(|| format!("loading configuration from {}", path.display()));
        }

        Ok(match self.preset {
            Preset::Needle => EngineConfig::needle(),
            Preset::Graph => EngineConfig::graph(),
        })
    }
}

/// Final report printed as JSON
#[derive(Debug, Serialize)]
struct RunSummary {
    pattern: String,
    config: EngineConfig,
    stats: EngineStats,
    latest: Option<ProcessedReading>,
    mean_smoothed_magnitude: Option<f64>,
    max_deflection_g: Option<f64>,
}

impl RunSummary {
    fn new(pattern: &MotionPattern, engine: &Engine<PollingSensor<SimulatedAccelerometer>>) -> Self {
        let history = engine.history();
        let count = history.len() as f64;

        let mean_smoothed_magnitude = (!history.is_empty())
            .then(|| history.iter().map(|r| r.smoothed_magnitude).sum::<f64>() / count);
        let max_deflection_g = history
            .iter()
            .map(|r| r.deflection_from(GRAVITY_G).abs())
            .reduce(f64::max);

        RunSummary {
            pattern: pattern.description(),
            config: engine.config().clone(),
            stats: engine.stats(),
            latest: engine.latest(),
            mean_smoothed_magnitude,
            max_deflection_g,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = MonitorArgs::parse();
    let config = args.engine_config()?;
    let pattern = args.pattern.motion_pattern();

    info!("Signal flow: simulated accelerometer -> smoothing engine -> console");
    info!(pattern = %pattern.description(), "starting monitor");

    let device = SimulatedAccelerometer::new(SimulationConfig {
        pattern,
        time_step_secs: config.interval.as_secs_f64(),
        ..SimulationConfig::default()
    })?;
    let mut engine = Engine::new(config, PollingSensor::new(device))?;

    let readings = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&readings);
    let log_every = args.log_every;
    engine.on_reading(move |reading| {
        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
        if n % log_every == 0 {
            info!(
                t = %reading.timestamp,
                magnitude = reading.magnitude,
                smoothed = reading.smoothed_magnitude,
                deflection = reading.deflection_from(GRAVITY_G),
                "reading"
            );
        }
    });

    engine.start().context("starting motion engine")?;

    tokio::select! {
        _ = tokio::time::sleep(args.run_for) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }

    engine.stop();

    let summary = RunSummary::new(&pattern, &engine);
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<MonitorArgs, clap::Error> {
        MonitorArgs::try_parse_from(std::iter::once("seismo-monitor").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert!(args.config.is_none());
        assert_eq!(args.run_for, Duration::from_secs(5));
        assert_eq!(args.log_every, 25);
        assert_eq!(args.pattern, PatternName::Quake);
        assert_eq!(args.engine_config().unwrap(), EngineConfig::needle());
    }

    #[test]
    fn test_flags() {
        let args = parse(&["--preset", "graph", "--pattern", "tremor", "--seconds", "1.5", "--log-every", "3"])
            .unwrap();
        assert_eq!(args.engine_config().unwrap(), EngineConfig::graph());
        assert_eq!(args.pattern, PatternName::Tremor);
        assert_eq!(args.run_for, Duration::from_millis(1500));
        assert_eq!(args.log_every, 3);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(parse(&["--seconds"]).is_err());
        assert!(parse(&["--seconds", "-2"]).is_err());
        assert!(parse(&["--seconds", "soon"]).is_err());
        assert!(parse(&["--log-every", "0"]).is_err());
        assert!(parse(&["--verbose"]).is_err());
        assert!(parse(&["--preset", "dial"]).is_err());
        assert!(parse(&["--pattern", "landslide"]).is_err());
    }

    #[test]
    fn test_every_pattern_has_a_preset() {
        for name in PatternName::value_variants() {
            assert!(MotionPattern::preset(&format!("{:?}", name).to_lowercase()).is_some());
        }
        assert_eq!(PatternName::Rest.motion_pattern(), MotionPattern::Rest);
    }

    #[test]
    fn test_missing_config_file() {
        let args = parse(&["/nonexistent/seismo.json"]).unwrap();
        assert!(args.engine_config().is_err());
    }
}
