//! Edge decision command implementations.

use super::Service;
use crate::cli::{EdgeArgs, RemoveArgs};
use crate::error::Result;
use crate::output::Formatter;
use kinship_domain::{EdgeId, PersonId};
use std::io::{self, Write};

/// Execute the confirm command.
pub async fn execute_confirm(args: EdgeArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let propagation = service.confirm_inferred_edge(PersonId(args.person), EdgeId(args.edge_id))?;
    println!("{}", formatter.success(&format!("Edge {} confirmed", args.edge_id)));
    if propagation.await.is_err() {
        println!("{}", formatter.warning("Propagation did not finish; run 'reinfer' to rebuild"));
    }
    Ok(())
}

/// Execute the dismiss command.
pub fn execute_dismiss(args: EdgeArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    service.reject_inferred_edge(PersonId(args.person), EdgeId(args.edge_id))?;
    println!("{}", formatter.success(&format!("Edge {} rejected", args.edge_id)));
    Ok(())
}

/// Execute the remove command.
pub async fn execute_remove(args: RemoveArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    // Confirm deletion unless --yes is specified
    if !args.yes {
        print!(
            "Remove edge {} and every relation row between the pair? [y/N] ",
            args.edge_id
        );
        io::stdout().flush()?;

        let mut response = String::new();
        io::stdin().read_line(&mut response)?;

        if !response.trim().eq_ignore_ascii_case("y") {
            println!("{}", formatter.info("Operation cancelled"));
            return Ok(());
        }
    }

    let removed = service
        .remove_relation(PersonId(args.person), EdgeId(args.edge_id))
        .await?;
    println!("{}", formatter.success(&format!("Removed {} row(s)", removed)));
    Ok(())
}
