use std::fmt;

/// How a minimization run ended. Non-convergence is a status, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinimizationStatus {
    Converged,
    MaxIterationsReached,
    /// Energy or gradient became non-finite.
    NumericalFailure,
}

impl MinimizationStatus {
    /// Numeric result code; `0` means converged.
    pub fn code(&self) -> i32 {
        match self {
            Self::Converged => 0,
            Self::MaxIterationsReached => 1,
            Self::NumericalFailure => 2,
        }
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

impl fmt::Display for MinimizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Converged => "converged",
            Self::MaxIterationsReached => "max-iterations-reached",
            Self::NumericalFailure => "numerical-failure",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizationResult {
    pub status: MinimizationStatus,
    pub initial_energy: f64,
    pub final_energy: f64,
    pub iterations: usize,
}
