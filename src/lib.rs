// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Simplified package linking.
//!
//! Knot keeps track of __knots__: named link points that describe where a
//! package's source lives and which targets consume it, so that build
//! tooling can later link or sync the two.
//!
//! # Knots
//!
//! A knot is either a __package__ (a directory whose contents get installed
//! somewhere else) or a __target__ (a directory that consumes a package).
//! Every knot is anchored to a project directory by a descriptor file named
//! ".knotrc" at its top level. The descriptor records the knot's name, the
//! language/package manager it uses, its kind, and a couple of conditional
//! settings collected through an interactive questionnaire at
//! initialization time.
//!
//! # User Registry
//!
//! Installed knots are recorded in a user-global registry at
//! `$HOME/.knotcli/config.json`. The registry partitions entries into a
//! package list and a target list, each entry pairing a knot's name with
//! the directory that holds its descriptor. The registry is shared by every
//! project directory the user has installed a knot from.

pub mod descriptor;
pub mod path;
pub mod prompt;
pub mod registry;
pub mod serial;

/// Version that new descriptors get stamped with.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
