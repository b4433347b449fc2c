mod args;
mod history;
mod progress;

use crate::args::{Args, Commands, ConnectionArgs, JobArgs, ListArgs, SubmitArgs, UsageArgs};
use crate::history::{HistoryError, HistoryManager, JobRecord};
use crate::progress::WaitProgress;

use camino::Utf8Path;
use clap::Parser;
use itertools::Itertools;
use std::fs;
use thiserror::Error;
use verifalia::{
    api::{
        ApiClient, ApiClientError, EndpointSelection, ListingOptions, Validation,
        ValidationOverview, ValidationRequest, WaitOutcome,
    },
    auth::{Authenticator, ClientCertificate, Credentials},
    endpoints::EndpointSet,
    errors::ConfigurationError,
    job_id::JobId,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiClientError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("[E030] Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[E031] No credentials provided\n\nSuggestions:\n  • Pass --username and --password, or set VERIFALIA_USERNAME and VERIFALIA_PASSWORD\n  • Pass --cert to authenticate with a client certificate")]
    MissingCredentials,

    #[error("[E032] No email addresses to verify\n\nSuggestions:\n  • Pass addresses as arguments\n  • Use --file with one address per line")]
    NoAddresses,

    #[error("[E033] Job {0} was not found\n\nSuggestions:\n  • The job may have been deleted or may have expired\n  • Check the job ID with `verifalia list`")]
    NotFound(JobId),
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let Args {
        connection,
        command,
    } = Args::parse();

    match &command {
        Commands::History { limit } => show_history(*limit)?,
        command => {
            let client = build_client(&connection)?;
            run(&client, command)?;
        }
    }
    Ok(())
}

fn build_client(args: &ConnectionArgs) -> Result<ApiClient, CliError> {
    let authenticator = if let Some(cert) = &args.cert {
        let certificate =
            ClientCertificate::from_pem_files(cert, args.ca.as_deref().map(Utf8Path::as_std_path))
                .map_err(|source| CliError::Read {
                    path: cert.to_string(),
                    source,
                })?;
        Authenticator::client_certificate(certificate)
    } else {
        let (Some(username), Some(password)) = (&args.username, &args.password) else {
            return Err(CliError::MissingCredentials);
        };
        let credentials = Credentials::new(username, password);
        if args.bearer {
            Authenticator::bearer(credentials)
        } else {
            Authenticator::basic(credentials)
        }
    };

    let mut builder = ApiClient::builder().authenticator(authenticator);
    if !args.endpoints.is_empty() {
        builder = builder.endpoints(EndpointSet::from_urls(args.endpoints.clone())?);
    }
    if args.sequential {
        builder = builder.selection(EndpointSelection::Sequential);
    }

    Ok(builder.build()?)
}

fn run(client: &ApiClient, command: &Commands) -> Result<(), CliError> {
    match command {
        Commands::Submit(args) => submit(client, args),
        Commands::Get(JobArgs { job, wait }) => {
            let mut progress = WaitProgress::new(&format!("Fetching job {job}..."));
            let fetched =
                client
                    .email_validations()
                    .get_with_events(job, &wait.options(), &mut progress);
            progress.finish_and_clear();
            let outcome = fetched?;
            record_status(&outcome);
            print_validation_outcome(job, outcome)
        }
        Commands::Overview(JobArgs { job, wait }) => {
            let mut progress = WaitProgress::new(&format!("Fetching job {job}..."));
            let fetched =
                client
                    .email_validations()
                    .get_overview(job, &wait.options(), &mut progress);
            progress.finish_and_clear();
            match fetched?.into_snapshot() {
                Some(overview) => {
                    print_overview(&overview);
                    Ok(())
                }
                None => Err(CliError::NotFound(job.clone())),
            }
        }
        Commands::List(ListArgs { limit, max }) => {
            let jobs = client.email_validations().list(&ListingOptions {
                limit: *limit,
                max_items: Some(*max),
            })?;
            for job in &jobs {
                println!(
                    "{}  {:<10}  {:>6} entries  {}  {}",
                    job.id,
                    job.status,
                    job.no_of_entries,
                    job.submitted_on.format("%Y-%m-%d %H:%M"),
                    job.name.as_deref().unwrap_or("-")
                );
            }
            Ok(())
        }
        Commands::Delete { job } => {
            client.email_validations().delete(job)?;
            println!("Job {job} deleted");
            Ok(())
        }
        Commands::Credits => {
            let balance = client.credits().balance()?;
            println!("Credit packs: {}", balance.credit_packs);
            if let Some(free) = balance.free_credits {
                println!("Free credits: {free}");
            }
            if let Some(reset_in) = balance.free_credits_reset_in {
                println!(
                    "Free credits reset in: {}",
                    verifalia::api::time_span::format(&reset_in)
                );
            }
            Ok(())
        }
        Commands::Usage(UsageArgs { since, until }) => {
            let usage = client.credits().daily_usage(*since, *until)?;
            for day in &usage {
                println!(
                    "{}  credit packs: {:>10}  free credits: {:>10}",
                    day.date, day.credit_packs, day.free_credits
                );
            }
            Ok(())
        }
        Commands::History { limit } => show_history(*limit),
    }
}

/// Addresses from the command line first, then from the file.
fn collect_addresses(args: &SubmitArgs) -> Result<Vec<String>, CliError> {
    let mut addresses = args.addresses.clone();

    if let Some(path) = &args.file {
        let content = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_string(),
            source,
        })?;
        addresses.extend(parse_address_lines(&content));
    }

    if addresses.is_empty() {
        return Err(CliError::NoAddresses);
    }
    Ok(addresses)
}

fn parse_address_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect_vec()
}

fn submit(client: &ApiClient, args: &SubmitArgs) -> Result<(), CliError> {
    let addresses = collect_addresses(args)?;

    let mut request = ValidationRequest::new(addresses);
    if let Some(name) = &args.name {
        request = request.name(name.clone());
    }
    if let Some(quality) = args.quality {
        request = request.quality(quality);
    }
    if let Some(deduplication) = args.deduplication {
        request = request.deduplication(deduplication);
    }

    let mut progress = WaitProgress::new(&format!(
        "Submitting {} address(es)...",
        request.entries.len()
    ));
    let submitted =
        client
            .email_validations()
            .submit_with_events(&request, &args.wait.options(), &mut progress);
    progress.finish_and_clear();
    let outcome = submitted?;

    if let Some(validation) = outcome.snapshot() {
        let record = JobRecord::new(
            validation.id().clone(),
            request.name.clone(),
            request.entries.len(),
        );
        if let Err(e) = HistoryManager::new().and_then(|manager| manager.add_job(record)) {
            log::warn!("Could not record job in history: {e}");
        }
        println!("Job ID: {}", validation.id());
    }
    record_status(&outcome);

    let id = outcome.snapshot().map(|validation| validation.id().clone());
    match id {
        Some(id) => print_validation_outcome(&id, outcome),
        None => Ok(()),
    }
}

fn record_status(outcome: &WaitOutcome<Validation>) {
    let Some(validation) = outcome.snapshot() else {
        return;
    };
    let result = HistoryManager::new().and_then(|manager| {
        manager.update_job_status(validation.id(), validation.status().to_string())
    });
    if let Err(e) = result {
        log::debug!("Could not update job status in history: {e}");
    }
}

fn print_validation_outcome(job: &JobId, outcome: WaitOutcome<Validation>) -> Result<(), CliError> {
    match outcome {
        WaitOutcome::Completed(validation) => {
            print_overview(&validation.overview);
            print_entries(&validation);
        }
        WaitOutcome::Pending(validation) => {
            print_overview(&validation.overview);
            println!("Job is still running, check on it with `verifalia get {job} --wait`");
        }
        WaitOutcome::TimedOut(validation) => {
            print_overview(&validation.overview);
            println!("Gave up waiting, check on it later with `verifalia get {job}`");
        }
        WaitOutcome::Cancelled(_) => println!("Waiting for job {job} was cancelled"),
        WaitOutcome::NotFound => return Err(CliError::NotFound(job.clone())),
    }
    Ok(())
}

fn print_overview(overview: &ValidationOverview) {
    println!("Job:      {}", overview.id);
    if let Some(name) = &overview.name {
        println!("Name:     {name}");
    }
    println!("Status:   {}", overview.status);
    println!("Entries:  {}", overview.no_of_entries);
    println!("Submitted: {}", overview.submitted_on.to_rfc3339());
    if let Some(completed_on) = overview.completed_on {
        println!("Completed: {}", completed_on.to_rfc3339());
    }
    if let Some(percentage) = overview.percentage() {
        println!("Progress: {:.0}%", percentage * 100.0);
    }
}

fn print_entries(validation: &Validation) {
    let summary = validation
        .entries
        .iter()
        .map(|entry| entry.classification.to_string())
        .sorted()
        .dedup_with_count()
        .map(|(count, classification)| format!("{classification}: {count}"))
        .join(", ");
    println!("Summary:  {summary}\n");

    for entry in &validation.entries {
        println!(
            "{:<40} {:<14} {:?}",
            entry.input_data, entry.classification, entry.status
        );
    }
}

fn show_history(limit: usize) -> Result<(), CliError> {
    let jobs = HistoryManager::new()?.list_recent_jobs(limit)?;
    if jobs.is_empty() {
        println!("No jobs submitted yet");
        return Ok(());
    }

    for job in &jobs {
        println!(
            "{}  {}  {:>6} entries  {:<10}  {}",
            job.job_id,
            job.timestamp.format("%Y-%m-%d %H:%M"),
            job.entries,
            job.status.as_deref().unwrap_or("-"),
            job.name.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_lines_skips_blanks_and_comments() {
        let content = "batman@gmail.com\n\n  # heroes\n robin@gmail.com \n";
        assert_eq!(
            parse_address_lines(content),
            vec!["batman@gmail.com".to_string(), "robin@gmail.com".to_string()]
        );
    }

    #[test]
    fn test_collect_addresses_requires_at_least_one() {
        let args = Args::parse_from(["verifalia", "submit"]);
        let Commands::Submit(submit) = args.command else {
            panic!("expected submit");
        };
        assert!(matches!(collect_addresses(&submit), Err(CliError::NoAddresses)));
    }

    #[test]
    fn test_collect_addresses_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("addresses.txt");
        fs::write(&path, "a@example.com\nb@example.com\n").unwrap();

        let args = Args::parse_from([
            "verifalia",
            "submit",
            "c@example.com",
            "--file",
            path.to_str().unwrap(),
        ]);
        let Commands::Submit(submit) = args.command else {
            panic!("expected submit");
        };
        assert_eq!(
            collect_addresses(&submit).unwrap(),
            vec!["c@example.com", "a@example.com", "b@example.com"]
        );
    }
}
