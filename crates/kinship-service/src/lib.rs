//! Kinship Service
//!
//! The operations a family network exposes to its members: applying for a
//! relation, deciding on applications and inferred edges, removing relations,
//! reading the network and running full re-inference.
//!
//! # Example
//!
//! ```no_run
//! use kinship_domain::PersonId;
//! use kinship_service::{KinshipConfig, KinshipService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = KinshipConfig::from_file("kinship.toml")?;
//!     let service = KinshipService::open(&config)?;
//!     service.warm_graph().await?;
//!
//!     let apply = service.apply_relation(PersonId(3), PersonId(2), r#"["父"]"#, None)?;
//!     let outcome = service.accept_application(PersonId(2), apply)?;
//!     outcome.propagation.await?;
//!
//!     let view = service.lookup_network(PersonId(3))?;
//!     println!("{} people, {} edges", view.nodes.len(), view.edges.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod service;

pub use config::KinshipConfig;
pub use error::{Result, ServiceError};
pub use service::{AcceptOutcome, KinshipService, NetworkNode, NetworkView};
