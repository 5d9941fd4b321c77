//! Pre-defined ground and device motion patterns for simulation

use seismo_core::Acceleration;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Motion added on top of gravity, as a function of simulated time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MotionPattern {
    /// Device lying still
    Rest,
    /// Continuous low-amplitude horizontal shaking
    Tremor {
        frequency_hz: f64,
        amplitude_g: f64,
    },
    /// Quiet period followed by a shock that rises fast and decays
    Quake {
        onset_secs: f64,
        peak_g: f64,
        frequency_hz: f64,
        decay_secs: f64,
    },
    /// Repeating on/off vibration, like a phone buzzing on a table
    Burst {
        on_secs: f64,
        off_secs: f64,
        amplitude_g: f64,
        frequency_hz: f64,
    },
    /// Slow vertical drift, e.g. an elevator starting to move
    Ramp {
        start_g: f64,
        end_g: f64,
        duration_secs: f64,
    },
}

impl MotionPattern {
    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "rest" => Some(MotionPattern::Rest),
            "tremor" => Some(MotionPattern::Tremor {
                frequency_hz: 8.0,
                amplitude_g: 0.05,
            }),
            "quake" => Some(MotionPattern::Quake {
                onset_secs: 1.0,
                peak_g: 0.8,
                frequency_hz: 3.0,
                decay_secs: 1.5,
            }),
            "burst" => Some(MotionPattern::Burst {
                on_secs: 0.4,
                off_secs: 0.6,
                amplitude_g: 0.3,
                frequency_hz: 30.0,
            }),
            "ramp" => Some(MotionPattern::Ramp {
                start_g: 0.0,
                end_g: 0.2,
                duration_secs: 2.0,
            }),
            _ => None,
        }
    }

    /// Acceleration contributed by the pattern at `time` seconds
    pub fn acceleration_at(&self, time: f64) -> Acceleration {
        match *self {
            MotionPattern::Rest => Acceleration::new(0.0, 0.0, 0.0),

            MotionPattern::Tremor { frequency_hz, amplitude_g } => {
                let phase = 2.0 * PI * frequency_hz * time;
                Acceleration::new(amplitude_g * phase.sin(), amplitude_g * 0.5 * phase.cos(), 0.0)
            }

            MotionPattern::Quake { onset_secs, peak_g, frequency_hz, decay_secs } => {
                if time < onset_secs {
                    return Acceleration::new(0.0, 0.0, 0.0);
                }
                let t = time - onset_secs;
                let envelope = peak_g * (-t / decay_secs.max(f64::EPSILON)).exp();
                let phase = 2.0 * PI * frequency_hz * t;
                Acceleration::new(
                    envelope * phase.sin(),
                    envelope * 0.7 * (phase * 1.3).cos(),
                    envelope * 0.4 * (phase * 0.7).sin(),
                )
            }

            MotionPattern::Burst { on_secs, off_secs, amplitude_g, frequency_hz } => {
                let cycle = on_secs + off_secs;
                if cycle <= 0.0 || time % cycle >= on_secs {
                    return Acceleration::new(0.0, 0.0, 0.0);
                }
                let phase = 2.0 * PI * frequency_hz * time;
                Acceleration::new(0.0, 0.0, amplitude_g * phase.sin())
            }

            MotionPattern::Ramp { start_g, end_g, duration_secs } => {
                let z = if time >= duration_secs {
                    end_g
                } else {
                    start_g + (end_g - start_g) * (time / duration_secs)
                };
                Acceleration::new(0.0, 0.0, z)
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            MotionPattern::Rest => "Device at rest".to_string(),
            MotionPattern::Tremor { frequency_hz, amplitude_g } => {
                format!("Tremor: {:.1}Hz, {:.3}g", frequency_hz, amplitude_g)
            }
            MotionPattern::Quake { onset_secs, peak_g, .. } => {
                format!("Quake: {:.2}g peak at {:.1}s", peak_g, onset_secs)
            }
            MotionPattern::Burst { on_secs, off_secs, amplitude_g, .. } => {
                format!("Burst: {:.1}s on / {:.1}s off, {:.2}g", on_secs, off_secs, amplitude_g)
            }
            MotionPattern::Ramp { start_g, end_g, duration_secs } => {
                format!("Ramp: {:.2}g to {:.2}g over {:.1}s", start_g, end_g, duration_secs)
            }
        }
    }
}

impl Default for MotionPattern {
    fn default() -> Self {
        MotionPattern::Rest
    }
}
