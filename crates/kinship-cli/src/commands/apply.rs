//! Application command implementations.

use super::Service;
use crate::cli::{ApplyArgs, DecideArgs, RejectArgs};
use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kinship_domain::{ApplyId, PersonId};

/// Execute the apply command.
pub fn execute_apply(args: ApplyArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let chain_json = parse_chain_arg(&args.chain)?;
    let id = service.apply_relation(
        PersonId(args.applicant),
        PersonId(args.target),
        &chain_json,
        args.note.as_deref(),
    )?;

    match formatter.format() {
        OutputFormat::Quiet => println!("{}", id),
        _ => println!(
            "{}",
            formatter.success(&format!("Application {} sent to {}", id, args.target))
        ),
    }
    Ok(())
}

/// Execute the accept command.
pub async fn execute_accept(args: DecideArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    let outcome = service.accept_application(PersonId(args.person), ApplyId(args.apply_id))?;
    println!(
        "{}",
        formatter.success(&format!(
            "Application {} accepted (edges {} and {})",
            args.apply_id, outcome.forward, outcome.reverse
        ))
    );

    if args.no_wait {
        return Ok(());
    }
    if outcome.propagation.await.is_err() {
        println!("{}", formatter.warning("Propagation did not finish; run 'reinfer' to rebuild"));
    }
    Ok(())
}

/// Execute the reject command.
pub fn execute_reject(args: RejectArgs, service: &Service, formatter: &Formatter) -> Result<()> {
    service.reject_application(PersonId(args.person), ApplyId(args.apply_id), args.reason.as_deref())?;
    println!("{}", formatter.success(&format!("Application {} rejected", args.apply_id)));
    Ok(())
}

/// Normalize a chain argument to the JSON token array.
///
/// Accepts either JSON (`["父","母"]`) or comma-separated tokens (`父,母`).
pub fn parse_chain_arg(input: &str) -> Result<String> {
    let input = input.trim();
    if input.starts_with('[') {
        return Ok(input.to_string());
    }

    let tokens: Vec<&str> = input
        .split([',', '，'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(CliError::InvalidInput("Chain must contain at least one step".to_string()));
    }
    Ok(serde_json::to_string(&tokens)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_tokens() {
        assert_eq!(parse_chain_arg("父, 母").unwrap(), r#"["父","母"]"#);
        assert_eq!(parse_chain_arg("父，母").unwrap(), r#"["父","母"]"#);
    }

    #[test]
    fn test_parse_json_passthrough() {
        assert_eq!(parse_chain_arg(r#" ["父"] "#).unwrap(), r#"["父"]"#);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_chain_arg(" , ").is_err());
    }
}
