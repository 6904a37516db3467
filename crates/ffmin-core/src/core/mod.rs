//! # Core Module
//!
//! Stateless building blocks of the library: the molecule model, the force-field
//! energy model and geometry helpers shared by both.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Atoms, bonds and the molecule with its
//!   geometric queries
//! - **Energy Model** ([`forcefield`]) - Parameters, typing, energy terms, restraints and
//!   the force field aggregate
//! - **Geometry** ([`utils`]) - Distances, angles and dihedrals together with their
//!   Cartesian derivatives
//!
//! Nothing in this layer iterates toward a minimum; that lives in
//! [`crate::engine`].

pub mod forcefield;
pub mod models;
pub mod utils;
