use std::time::Duration;

use camino::Utf8PathBuf;
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;

use verifalia::{
    api::{time_span, Deduplication, QualityLevel, WaitOptions},
    job_id::JobId,
};

fn get_control_chars_regex() -> Result<&'static Regex, String> {
    lazy_static! {
        static ref CONTROL_CHARS_REGEX: Result<Regex, regex::Error> = Regex::new(r"\p{Cc}");
    }

    match CONTROL_CHARS_REGEX.as_ref() {
        Ok(regex) => Ok(regex),
        Err(_) => Err("Internal regex compilation error".to_string()),
    }
}

#[derive(clap::Parser)]
#[command(name = "verifalia")]
#[command(version)]
#[command(about = "Verify email addresses with the Verifalia API")]
#[command(long_about = "
A command-line client for the Verifalia email verification service.

Requests are spread across the service endpoints and fail over to the next
endpoint when one is unreachable or busy. Credentials are read from the
command line or from the environment.

Examples:
  # Verify two addresses and wait for the result
  verifalia --username user --password secret submit --wait \\
    batman@gmail.com robin@gmail.com

  # Submit a file, one address per line, without waiting
  verifalia submit --file addresses.txt --quality high

  # Check on a job later
  verifalia get 9ece66cf-916c-4313-9c40-b8a73f0ef872 --wait

  # Show the credit balance
  verifalia credits
")]
pub struct Args {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args)]
pub struct ConnectionArgs {
    /// Account or user name
    #[arg(long, global = true, env = "VERIFALIA_USERNAME")]
    pub username: Option<String>,

    /// Password of the account or user
    #[arg(long, global = true, env = "VERIFALIA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Exchange the credentials for a bearer token instead of sending them
    /// with every request
    #[arg(long, global = true, default_value_t = false)]
    pub bearer: bool,

    /// PEM file holding the client certificate and its private key
    #[arg(long, global = true, value_name = "PEM", value_hint = clap::ValueHint::FilePath)]
    pub cert: Option<Utf8PathBuf>,

    /// PEM bundle of authorities trusted for the server certificate
    #[arg(
        long,
        global = true,
        value_name = "PEM",
        value_hint = clap::ValueHint::FilePath,
        requires = "cert"
    )]
    pub ca: Option<Utf8PathBuf>,

    /// Base URL of an API endpoint; repeat to provide several
    #[arg(
        long = "endpoint",
        global = true,
        value_name = "URL",
        value_hint = clap::ValueHint::Url,
        env = "VERIFALIA_ENDPOINTS",
        value_delimiter = ','
    )]
    pub endpoints: Vec<Url>,

    /// Always start from the first endpoint instead of a random one
    #[arg(long, global = true, default_value_t = false)]
    pub sequential: bool,
}

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Submit email addresses for verification
    ///
    /// Addresses come from the command line, from a file holding one
    /// address per line, or both.
    ///
    /// Examples:
    ///   verifalia submit --wait batman@gmail.com
    ///   verifalia submit --file addresses.txt --name "newsletter"
    Submit(SubmitArgs),

    /// Show a job together with its entries
    Get(JobArgs),

    /// Show the overview of a job, without its entries
    Overview(JobArgs),

    /// List the jobs of the account
    List(ListArgs),

    /// Delete a job
    Delete {
        /// Job ID (UUID format)
        #[arg(value_name = "UUID", value_parser = JobId::new)]
        job: JobId,
    },

    /// Show the credit balance
    Credits,

    /// Show the daily credit consumption
    Usage(UsageArgs),

    /// Show the jobs submitted from this machine
    History {
        /// Number of jobs to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn job_name_value_parser(name: &str) -> Result<String, String> {
    if name.trim().is_empty() {
        return Err("Job name cannot be empty".to_string());
    }

    if name.chars().count() > 256 {
        return Err("Job name cannot exceed 256 characters".to_string());
    }

    let regex = get_control_chars_regex()?;
    if regex.is_match(name) {
        return Err("Job name cannot contain control characters".to_string());
    }

    Ok(name.to_string())
}

/// Seconds (`90`) or a time span (`00:01:30`).
fn duration_value_parser(raw: &str) -> Result<Duration, String> {
    if raw.contains(':') {
        return time_span::parse(raw);
    }

    raw.parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| format!("Invalid duration: {raw}, use seconds or hh:mm:ss"))
}

#[derive(clap::Args)]
pub struct WaitArgs {
    /// Wait until the job completes
    #[arg(long, default_value_t = false)]
    pub wait: bool,

    /// Give up waiting after this long (seconds or hh:mm:ss)
    #[arg(long, value_name = "DURATION", value_parser = duration_value_parser, default_value = "1800")]
    pub timeout: Duration,

    /// Delay between two status checks (seconds or hh:mm:ss)
    #[arg(long, value_name = "DURATION", value_parser = duration_value_parser, default_value = "5")]
    pub poll_interval: Duration,
}

impl WaitArgs {
    pub const fn options(&self) -> WaitOptions {
        if self.wait {
            WaitOptions::new(self.timeout, self.poll_interval)
        } else {
            WaitOptions::DONT_WAIT
        }
    }
}

#[derive(clap::Args)]
pub struct SubmitArgs {
    /// Email addresses to verify
    #[arg(value_name = "EMAIL")]
    pub addresses: Vec<String>,

    /// File with one address per line; blank lines and lines starting
    /// with '#' are skipped
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub file: Option<Utf8PathBuf>,

    /// Quality level of the verification
    #[arg(long, value_enum)]
    pub quality: Option<QualityLevel>,

    /// How duplicated addresses are detected
    #[arg(long, value_enum)]
    pub deduplication: Option<Deduplication>,

    /// Name shown in the dashboard for this job
    #[arg(long, value_name = "NAME", value_parser = job_name_value_parser)]
    pub name: Option<String>,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(clap::Args)]
pub struct JobArgs {
    /// Job ID (UUID format)
    #[arg(value_name = "UUID", value_parser = JobId::new)]
    pub job: JobId,

    #[command(flatten)]
    pub wait: WaitArgs,
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Page size requested from the service
    #[arg(long)]
    pub limit: Option<u32>,

    /// Stop after this many jobs
    #[arg(long, default_value_t = 20)]
    pub max: usize,
}

#[derive(clap::Args)]
pub struct UsageArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub since: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub until: Option<NaiveDate>,
}
