//! # Workflows Module
//!
//! High-level entry points that take a molecule and a job description, build the
//! force field, attach restraints and run the engine.
//!
//! - **Minimization** ([`minimize`]) - Constrained geometry optimization that writes
//!   the final coordinates back into the molecule
//! - **Single-point energy** ([`energy`]) - Per-category energy of the current geometry
//!
//! Both share [`minimize::MinimizationJob`], so a job file can be evaluated before
//! and after minimizing without changes.

pub mod energy;
pub mod minimize;
