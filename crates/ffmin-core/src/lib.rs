//! # ffmin
//!
//! Constrained molecular-mechanics minimization with UFF- and MMFF94-style force
//! fields.
//!
//! ## Architectural Philosophy
//!
//! The library keeps a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** The [`Molecule`](core::models::molecule::Molecule)
//!   model, parameter tables, energy terms, flat-bottom restraints, and the
//!   [`ForceField`](core::forcefield::field::ForceField) that sums them.
//!
//! - **[`engine`]: The Optimizer.** A BFGS quasi-Newton minimizer over the free
//!   coordinates of a force field, its configuration, status codes and progress
//!   reporting.
//!
//! - **[`workflows`]: The Public API.** Job-driven entry points that build a force
//!   field for a molecule, attach restraints and fixed atoms, minimize, and write the
//!   result back.
//!
//! ## Example
//!
//! ```ignore
//! use ffmin::core::forcefield::field::ForceField;
//! use ffmin::engine::config::MinimizerConfig;
//!
//! let mut ff = ForceField::uff(&molecule)?;
//! ff.add_distance_constraint(1, 3, false, 2.0, 2.0, 1.0e5)?;
//! let result = ff.minimize(&MinimizerConfig::default())?;
//! assert_eq!(result.status.code(), 0);
//! ff.write_positions(&mut molecule)?;
//! ```

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;
