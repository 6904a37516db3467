use thiserror::Error;

use super::config::ConfigError;
use crate::core::forcefield::field::ForceFieldError;
use crate::core::forcefield::parameterization::ParameterizationError;
use crate::core::forcefield::params::ParamLoadError;
use crate::core::models::molecule::GeometryError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Force field parameterization failed: {source}")]
    Parameterization {
        #[from]
        source: ParameterizationError,
    },

    #[error("Failed to load force field parameters: {source}")]
    ParameterFile {
        #[from]
        source: ParamLoadError,
    },

    #[error("Invalid force field setup: {source}")]
    ForceField {
        #[from]
        source: ForceFieldError,
    },

    #[error("Geometry error: {source}")]
    Geometry {
        #[from]
        source: GeometryError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}
