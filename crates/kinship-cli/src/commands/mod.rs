//! Command implementations.

pub mod apply;
pub mod config;
pub mod edges;
pub mod maintenance;
pub mod person;
pub mod query;

pub use self::apply::{execute_accept, execute_apply, execute_reject};
pub use self::config::execute_config;
pub use self::edges::{execute_confirm, execute_dismiss, execute_remove};
pub use self::maintenance::{execute_janitor, execute_reinfer};
pub use self::person::execute_person;
pub use self::query::{execute_applications, execute_network, execute_relations, execute_resolve, execute_status};

use crate::cli::Command;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use kinship_service::KinshipService;
use kinship_store::SqliteStore;
use std::path::Path;

/// Service over the SQLite file named in the configuration.
pub type Service = KinshipService<SqliteStore>;

/// Open the database named in `config` and load its relations into the graph.
pub async fn open_service(config: &Config) -> Result<Service> {
    let service = Service::open(&config.kinship)?;
    let pairs = service.warm_graph().await?;
    tracing::debug!(pairs, db = %config.kinship.db_path.display(), "Database ready");
    Ok(service)
}

/// Run one command. Only commands that touch relations open the database.
pub async fn execute(command: Command, config: &Config, config_path: Option<&Path>, formatter: &Formatter) -> Result<()> {
    match command {
        Command::Config(args) => {
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => Config::default_path()?,
            };
            execute_config(args, config, &path, formatter)
        }
        Command::Resolve(args) => execute_resolve(args, formatter),
        Command::Person(args) => execute_person(args, &open_service(config).await?, formatter),
        Command::Apply(args) => execute_apply(args, &open_service(config).await?, formatter),
        Command::Accept(args) => execute_accept(args, &open_service(config).await?, formatter).await,
        Command::Reject(args) => execute_reject(args, &open_service(config).await?, formatter),
        Command::Confirm(args) => execute_confirm(args, &open_service(config).await?, formatter).await,
        Command::Dismiss(args) => execute_dismiss(args, &open_service(config).await?, formatter),
        Command::Remove(args) => execute_remove(args, &open_service(config).await?, formatter).await,
        Command::Relations(args) => execute_relations(args, &open_service(config).await?, formatter),
        Command::Applications(args) => execute_applications(args, &open_service(config).await?, formatter),
        Command::Status(args) => execute_status(args, &open_service(config).await?, formatter),
        Command::Network(args) => execute_network(args, &open_service(config).await?, formatter),
        Command::Reinfer(args) => execute_reinfer(args, &open_service(config).await?, formatter).await,
        Command::Janitor(args) => {
            let service = open_service(config).await?;
            execute_janitor(args, &config.kinship.janitor, &service, formatter).await
        }
    }
}
