use thiserror::Error;

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
pub const DEFAULT_GRADIENT_TOLERANCE: f64 = 1e-4;
pub const DEFAULT_ENERGY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {value} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Termination settings for one minimization run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizerConfig {
    /// Upper bound on quasi-Newton iterations.
    pub max_iterations: usize,
    /// Threshold for the scaled gradient test.
    pub gradient_tolerance: f64,
    /// Threshold for the relative energy change between iterations.
    pub energy_tolerance: f64,
}

impl Default for MinimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            gradient_tolerance: DEFAULT_GRADIENT_TOLERANCE,
            energy_tolerance: DEFAULT_ENERGY_TOLERANCE,
        }
    }
}

#[derive(Default)]
pub struct MinimizerConfigBuilder {
    max_iterations: Option<usize>,
    gradient_tolerance: Option<f64>,
    energy_tolerance: Option<f64>,
}

impl MinimizerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }
    pub fn gradient_tolerance(mut self, tolerance: f64) -> Self {
        self.gradient_tolerance = Some(tolerance);
        self
    }
    pub fn energy_tolerance(mut self, tolerance: f64) -> Self {
        self.energy_tolerance = Some(tolerance);
        self
    }

    /// Fills unset fields with defaults and validates the result.
    pub fn build(self) -> Result<MinimizerConfig, ConfigError> {
        let config = MinimizerConfig {
            max_iterations: self.max_iterations.unwrap_or(DEFAULT_MAX_ITERATIONS),
            gradient_tolerance: self
                .gradient_tolerance
                .unwrap_or(DEFAULT_GRADIENT_TOLERANCE),
            energy_tolerance: self.energy_tolerance.unwrap_or(DEFAULT_ENERGY_TOLERANCE),
        };

        if config.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_iterations",
                value: config.max_iterations.to_string(),
                reason: "must be at least 1",
            });
        }
        check_tolerance("gradient_tolerance", config.gradient_tolerance)?;
        check_tolerance("energy_tolerance", config.energy_tolerance)?;
        Ok(config)
    }
}

fn check_tolerance(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "must be a finite positive number",
        })
    }
}
