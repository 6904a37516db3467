//! # Force Field Module
//!
//! Molecular mechanics energy model used by the minimizer: parameter tables, atom
//! typing, the individual energy terms, user restraints, and the [`field::ForceField`]
//! aggregate that ties them to one molecule's coordinates.
//!
//! ## Overview
//!
//! Two parameter families are supported:
//!
//! - **UFF** - generic rule-based parameters derived per atom type, covering most
//!   main-group organic chemistry
//! - **MMFF94** - tabulated parameters for saturated C/N/O/H chemistry with
//!   bond-charge-increment partial charges
//!
//! Every term implements the same contract: given all positions, return its energy
//! and optionally accumulate its analytic Cartesian gradient. Terms are held in an
//! ordered list of [`term::EnergyContrib`] variants, so evaluation order (and hence
//! floating-point summation) is deterministic.
//!
//! ## Key Components
//!
//! - [`params`] - Built-in UFF/MMFF parameter tables and custom UFF parameter files
//! - [`parameterization`] - Force-field kinds and construction errors
//! - [`uff`] / [`mmff`] - Atom typing and base-term assembly
//! - [`bonded`] / [`nonbonded`] - Stretch, bend, torsion, van der Waals and Coulomb terms
//! - [`constraints`] - Flat-bottom distance, angle, torsion and position restraints
//! - [`term`] - The term enum and per-category energy breakdown
//! - [`field`] - The force field aggregate
//!
//! ## Usage
//!
//! ```ignore
//! use ffmin::core::forcefield::field::ForceField;
//!
//! let mut ff = ForceField::uff(&molecule)?;
//! ff.add_distance_constraint(0, 8, false, 2.0, 2.0, 100.0)?;
//! ff.add_fixed_point(3)?;
//! let energy = ff.energy(ff.positions())?;
//! ```

pub mod bonded;
pub mod constraints;
pub mod field;
pub(crate) mod interactions;
pub mod mmff;
pub mod nonbonded;
pub mod parameterization;
pub mod params;
pub(crate) mod potentials;
pub mod term;
pub mod uff;
