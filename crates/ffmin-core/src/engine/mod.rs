//! # Engine Module
//!
//! Drives a [`ForceField`](crate::core::forcefield::field::ForceField) toward a
//! local energy minimum.
//!
//! ## Overview
//!
//! The optimizer works on the flat vector of free coordinates (three per
//! non-fixed atom). Fixed atoms are dropped when the vector is gathered and
//! restored unchanged when it is scattered back, so energy terms never need to
//! know which atoms are frozen.
//!
//! The quasi-Newton loop in [`minimizer`] is generic over the [`minimizer::Objective`]
//! trait; [`minimization`] adapts a force field to it and adds
//! `ForceField::minimize`.
//!
//! ## Key Components
//!
//! - [`config`] - Iteration limit and convergence tolerances
//! - [`minimizer`] - BFGS with a strong-Wolfe line search
//! - [`state`] - Termination status codes and run results
//! - [`progress`] - Callback-based progress events
//! - [`error`] - Errors raised while preparing a run
//!
//! Non-convergence is never an error: it is reported through
//! [`state::MinimizationStatus`].

pub mod config;
pub mod error;
pub mod minimization;
pub mod minimizer;
pub mod progress;
pub mod state;
