//! aerocluster - collection teardown for sharded, replicated clusters
//!
//! Subsystems:
//! - cluster: data model, collaborator seams and in-memory collaborators
//! - teardown: the delete-collection controller and its components
//! - observability: structured logging, lifecycle events, metrics
//! - cli: command-line front end

pub mod cli;
pub mod cluster;
pub mod observability;
pub mod teardown;
