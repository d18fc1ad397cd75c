//! Kinship Propagation Engine
//!
//! Turns one confirmed relation into inferred relations for everyone nearby.
//!
//! # Modes
//!
//! - **Graph**: enumerate paths in the graph substrate and resolve each pair
//!   with the path resolver. The neighbourhoods of both endpoints are
//!   re-inferred, so a new link reaches the whole local family.
//! - **Fallback**: when the substrate is missing, switched off or failing,
//!   compose stored chains through the two endpoints instead.
//!
//! Every inferred write goes through the store's atomic upsert, so
//! concurrent runs cannot duplicate rows or overwrite manual ones.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod propagator;

pub use config::EngineConfig;
pub use error::EngineError;
pub use propagator::{PropagationMode, PropagationReport, Propagator};
