//! # Core Models Module
//!
//! Data structures describing the molecule a force field is built for.
//!
//! ## Overview
//!
//! A [`molecule::Molecule`] owns an ordered list of [`atom::Atom`]s (addressed by
//! their 0-based index), the bonded topology as [`topology::Bond`]s, and an adjacency
//! cache. Positions are mutable; topology is fixed once built. The molecule also
//! answers the geometric queries used throughout the crate:
//!
//! - **Distances, angles and dihedrals** between indexed atoms (degrees for angles)
//! - **Rigid torsion driving** via `set_dihedral`, rotating the downstream fragment
//!
//! ## Key Components
//!
//! - [`atom`] - Elements and atoms
//! - [`topology`] - Bonds and bond orders
//! - [`molecule`] - The molecule container and its geometry operations
//! - [`builder`] - Serial-number based incremental construction
//!
//! ## Usage
//!
//! ```ignore
//! use ffmin::core::models::{atom::Element, builder::MoleculeBuilder, topology::BondOrder};
//!
//! let mut builder = MoleculeBuilder::new("ethane");
//! builder
//!     .add_atom(1, Element::Carbon, Point3::new(0.0, 0.0, 0.0), None)
//!     .add_atom(2, Element::Carbon, Point3::new(1.54, 0.0, 0.0), None)
//!     .add_bond(1, 2, BondOrder::Single);
//! let molecule = builder.build()?;
//! let length = molecule.distance(0, 1)?;
//! ```

pub mod atom;
pub mod builder;
pub mod molecule;
pub mod topology;
