//! Simulated accelerometer for development and tests

use crate::motion_patterns::MotionPattern;
use crate::source::MotionDevice;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use seismo_core::{Acceleration, SeismoError, SeismoResult};
use serde::{Deserialize, Serialize};

/// Standard gravity along the device z axis when lying flat, in g
pub const GRAVITY_G: f64 = 1.0;

/// Configuration for the simulated accelerometer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Motion added on top of gravity
    pub pattern: MotionPattern,
    /// Gaussian noise standard deviation per axis, in g (0.0 = no noise)
    pub noise_std: f64,
    /// Simulated time advanced per read, in seconds
    pub time_step_secs: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Refuse `open()` as if the motion permission was denied
    pub permission_denied: bool,
    /// Fail every n-th read with a transient device error
    pub read_error_every: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pattern: MotionPattern::Rest,
            noise_std: 0.002,
            time_step_secs: 0.01,
            seed: None,
            permission_denied: false,
            read_error_every: None,
        }
    }
}

impl SimulationConfig {
    /// Noise-free configuration with a fixed seed
    pub fn deterministic(pattern: MotionPattern) -> Self {
        Self {
            pattern,
            noise_std: 0.0,
            seed: Some(0),
            ..Self::default()
        }
    }
}

/// Motion device producing gravity plus a [`MotionPattern`] plus noise
pub struct SimulatedAccelerometer {
    config: SimulationConfig,
    rng: StdRng,
    noise: Normal<f64>,
    time: f64,
    reads: u64,
    open: bool,
}

impl SimulatedAccelerometer {
    pub fn new(config: SimulationConfig) -> SeismoResult<Self> {
        if !(config.time_step_secs.is_finite() && config.time_step_secs > 0.0) {
            return Err(SeismoError::InvalidConfiguration {
                reason: format!("time step {} must be positive", config.time_step_secs),
            });
        }

        if !(config.noise_std.is_finite() && config.noise_std >= 0.0) {
            return Err(SeismoError::InvalidConfiguration {
                reason: format!("noise standard deviation {} must be finite and non-negative", config.noise_std),
            });
        }

        let noise = Normal::new(0.0, config.noise_std).map_err(|e| {
            SeismoError::InvalidConfiguration {
                reason: format!("Failed to create noise distribution: {}", e),
            }
        })?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(SimulatedAccelerometer {
            config,
            rng,
            noise,
            time: 0.0,
            reads: 0,
            open: false,
        })
    }

    /// Switch to another pattern; simulated time keeps running
    pub fn set_pattern(&mut self, pattern: MotionPattern) {
        self.config.pattern = pattern;
    }

    /// Grant or revoke the simulated motion permission
    pub fn set_permission_denied(&mut self, denied: bool) {
        self.config.permission_denied = denied;
    }

    /// Rewind simulated time to zero
    pub fn reset_time(&mut self) {
        self.time = 0.0;
    }

    /// Simulated seconds elapsed
    pub fn elapsed_secs(&self) -> f64 {
        self.time
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn sample_noise(&mut self) -> f64 {
        if self.config.noise_std == 0.0 {
            0.0
        } else {
            self.noise.sample(&mut self.rng)
        }
    }
}

impl MotionDevice for SimulatedAccelerometer {
    fn open(&mut self) -> SeismoResult<()> {
        if self.config.permission_denied {
            return Err(SeismoError::sensor_unavailable("motion access denied by user"));
        }
        self.open = true;
        Ok(())
    }

    fn read(&mut self) -> SeismoResult<Acceleration> {
        if !self.open {
            return Err(SeismoError::device("accelerometer is not open"));
        }

        self.reads += 1;
        let time = self.time;
        self.time += self.config.time_step_secs;

        if let Some(every) = self.config.read_error_every {
            if every > 0 && self.reads % every == 0 {
                return Err(SeismoError::device(format!("simulated dropout on read {}", self.reads)));
            }
        }

        let motion = self.config.pattern.acceleration_at(time);
        Ok(Acceleration::new(
            motion.x + self.sample_noise(),
            motion.y + self.sample_noise(),
            GRAVITY_G + motion.z + self.sample_noise(),
        ))
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn name(&self) -> &str {
        "simulated-accelerometer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_reads_gravity() {
        let mut device =
            SimulatedAccelerometer::new(SimulationConfig::deterministic(MotionPattern::Rest)).unwrap();
        device.open().unwrap();

        for _ in 0..10 {
            let accel = device.read().unwrap();
            assert_eq!(accel, Acceleration::new(0.0, 0.0, GRAVITY_G));
        }
        assert!((device.elapsed_secs() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_noise_is_reproducible_with_seed() {
        let config = SimulationConfig {
            noise_std: 0.05,
            seed: Some(42),
            ..SimulationConfig::default()
        };
        let mut a = SimulatedAccelerometer::new(config.clone()).unwrap();
        let mut b = SimulatedAccelerometer::new(config).unwrap();
        a.open().unwrap();
        b.open().unwrap();

        for _ in 0..20 {
            assert_eq!(a.read().unwrap(), b.read().unwrap());
        }
    }

    #[test]
    fn test_permission_denied() {
        let config = SimulationConfig {
            permission_denied: true,
            ..SimulationConfig::default()
        };
        let mut device = SimulatedAccelerometer::new(config).unwrap();
        let err = device.open().unwrap_err();
        assert!(err.is_sensor_unavailable());

        device.set_permission_denied(false);
        assert!(device.open().is_ok());
    }

    #[test]
    fn test_read_requires_open() {
        let mut device = SimulatedAccelerometer::new(SimulationConfig::default()).unwrap();
        assert!(matches!(device.read(), Err(SeismoError::DeviceError { .. })));
    }

    #[test]
    fn test_periodic_read_errors() {
        let config = SimulationConfig {
            read_error_every: Some(3),
            ..SimulationConfig::deterministic(MotionPattern::Rest)
        };
        let mut device = SimulatedAccelerometer::new(config).unwrap();
        device.open().unwrap();

        let results: Vec<bool> = (0..6).map(|_| device.read().is_ok()).collect();
        assert_eq!(results, vec![true, true, false, true, true, false]);
    }

    #[test]
    fn test_invalid_config() {
        let config = SimulationConfig {
            noise_std: -1.0,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            SimulatedAccelerometer::new(config),
            Err(SeismoError::InvalidConfiguration { .. })
        ));

        let config = SimulationConfig {
            noise_std: f64::NAN,
            ..SimulationConfig::default()
        };
        assert!(SimulatedAccelerometer::new(config).is_err());

        let config = SimulationConfig {
            time_step_secs: 0.0,
            ..SimulationConfig::default()
        };
        assert!(SimulatedAccelerometer::new(config).is_err());
    }
}
