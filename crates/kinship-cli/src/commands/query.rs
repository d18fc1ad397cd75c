//! Read-only command implementations.

use super::apply::parse_chain_arg;
use super::Service;
use crate::cli::{PersonRef, RelationsArgs, ResolveArgs, StatusArgs};
use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::Formatter;
use kinship_domain::{resolve, reverse, Chain, Gender, PersonId};

/// Execute the relations command.
pub fn execute_relations(args: RelationsArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let person = PersonId(args.person);
    let edges = if args.pending {
        service.pending_inferred(person)?
    } else {
        service.my_relations(person)?
    };
    println!("{}", formatter.format_edges(&edges)?);
    Ok(())
}

/// Execute the applications command.
pub fn execute_applications(args: PersonRef, service: &Service, formatter: &Formatter) -> Result<()> {
    let applies = service.pending_applications(PersonId(args.person))?;
    println!("{}", formatter.format_applications(&applies)?);
    Ok(())
}

/// Execute the status command.
pub fn execute_status(args: StatusArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let status = service.relation_status(PersonId(args.a), PersonId(args.b))?;
    match formatter.format() {
        OutputFormat::Json => println!("{}", serde_json::to_string(&status)?),
        _ => println!("{}", formatter.format_status(status)),
    }
    Ok(())
}

/// Execute the network command.
pub fn execute_network(args: PersonRef, service: &Service, formatter: &Formatter) -> Result<()> {
    let view = service.lookup_network(PersonId(args.person))?;
    println!("{}", formatter.format_network(&view)?);
    Ok(())
}

/// Execute the resolve command.
pub fn execute_resolve(args: ResolveArgs, formatter: &Formatter) -> Result<()> {
    let chain = Chain::decode(&parse_chain_arg(&args.chain)?).map_err(kinship_service::ServiceError::from)?;
    let from: Gender = args.from.into();
    let to: Gender = args.to.into();

    let forward = chain.with_target_gender(to);
    let back = reverse(&forward, from, to);
    let (term, back_term) = (resolve(&forward), resolve(&back));

    match formatter.format() {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "chain": forward.tokens(),
                "term": term,
                "reverse_chain": back.tokens(),
                "reverse_term": back_term,
            }))?
        ),
        OutputFormat::Quiet => println!("{}", term),
        OutputFormat::Table => {
            println!("{} {}", forward, formatter.info(&term));
            println!("{} {}", back, formatter.info(&back_term));
        }
    }
    Ok(())
}
