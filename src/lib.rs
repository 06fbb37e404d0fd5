//! Linked in-memory model of a TestRail suite hierarchy
//!
//! Suites are fetched through a [`remote::Client`], linked into an arena of
//! sections and cases, and pruned with one of the [`deletion`] strategies.

pub mod builder;
pub use builder::Builder;

pub mod config;
pub use config::{Config, DeletionSettings};

/// Hard, soft and mark-for-deletion removal of sections and cases.
pub mod deletion;
pub use deletion::{Deletion, Outcome, deletion_handler};

pub mod domain;
pub use domain::{Case, LinkError, Project, Section, SectionView, Suite};

/// The remote service: client trait, typed adapter and an in-memory client.
pub mod remote;
pub use remote::{Adapter, Client};

#[cfg(test)]
mod testing;
