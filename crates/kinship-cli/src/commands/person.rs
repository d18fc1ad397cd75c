//! Person command implementation.

use super::Service;
use crate::cli::{PersonAction, PersonArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kinship_domain::{Gender, PersonId};
use kinship_service::ServiceError;

/// Execute the person command.
pub fn execute_person(args: PersonArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let mut store = service
        .store()
        .lock()
        .map_err(|e| CliError::Service(ServiceError::Store(format!("Store lock error: {}", e))))?;

    match args.action {
        PersonAction::Add { id, gender, name } => {
            let gender: Gender = gender.into();
            store.upsert_person(PersonId(id), gender, name.as_deref())?;
            println!(
                "{}",
                formatter.success(&format!("Person {} saved ({})", id, gender.as_str()))
            );
        }
        PersonAction::Deactivate { id } => {
            store.deactivate_person(PersonId(id))?;
            println!("{}", formatter.success(&format!("Person {} deactivated", id)));
        }
    }

    Ok(())
}
