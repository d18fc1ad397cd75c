//! Re-inference and janitor command implementations.

use super::Service;
use crate::cli::{JanitorArgs, PersonRef};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kinship_domain::{JobStatus, PersonId};
use kinship_janitor::{JanitorConfig, JanitorWorker};
use std::sync::Arc;
use std::time::Duration;

/// Execute the reinfer command, following the job until it ends.
pub async fn execute_reinfer(args: PersonRef, service: &Service, formatter: &Formatter) -> Result<()> {
    let person = PersonId(args.person);
    let job_id = service.start_full_reinference(person)?;
    println!("{}", formatter.info(&format!("Job {} started", job_id)));

    let mut last_stage = String::new();
    let job = loop {
        let job = service.get_job_status(person, job_id)?;
        if job.is_terminal() {
            break job;
        }
        if job.message != last_stage {
            println!("{}", formatter.info(&format!("{:>3}% {}", job.percent, job.message)));
            last_stage = job.message.clone();
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    };

    println!("{}", formatter.format_job(&job)?);
    if job.status == JobStatus::Error {
        return Err(CliError::Job(job.message));
    }
    Ok(())
}

/// Execute the janitor command.
pub async fn execute_janitor(
    args: JanitorArgs,
    config: &JanitorConfig,
    service: &Service,
    formatter: &Formatter,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(interval) = args.interval {
        config.repair_interval_secs = interval;
    }
    config.dry_run |= args.dry_run;
    config.validate().map_err(CliError::Config)?;

    let mut worker = JanitorWorker::new(config);
    let store = Arc::clone(service.store());
    match args.cycles {
        Some(cycles) => worker.run_cycles(store, cycles).await?,
        None => worker.run(store).await?,
    }

    println!("{}", formatter.success("Janitor finished"));
    println!("{}", worker.metrics().summary());
    Ok(())
}
