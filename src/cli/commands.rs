//! Command-line interface
//!
//! Every command builds one [`AnsClient`] from the global flags, runs a
//! single operation and prints the JSON result on stdout. Progress notices
//! go through `tracing`.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use tracing::info;

use crate::api::AnsClient;
use crate::credentials::{CredentialProvider, NoToken, StaticToken, TOKEN_ENV_VAR};
use crate::downloader::config::{
    API_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_REQUESTS_PER_MINUTE, DEFAULT_WORKERS,
};
use crate::downloader::FetchConfig;
use crate::fetcher::PagedResource;
use crate::metrics;

use super::CliError;

/// Date formats accepted on the command line, tried in order
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// Parse a calendar date in any of [`DATE_FORMATS`]
pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .ok_or_else(|| {
            format!("'{input}' is not a date (expected YYYY-MM-DD, DD-MM-YYYY, DD/MM/YYYY or DD.MM.YYYY)")
        })
}

/// Parse and validate the worker count
fn parse_workers(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("workers must be at least 1".to_string());
    }
    Ok(value)
}

/// Parse and validate the rate-limit capacity
fn parse_requests_per_minute(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("requests per minute must be at least 1".to_string());
    }
    Ok(value)
}

/// CLI application
#[derive(Debug, Parser)]
#[command(name = "ans-fetch")]
#[command(about = "Fetch JSON resources from the ANS API within its request quota", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// API token
    #[arg(long, global = true, env = TOKEN_ENV_VAR, hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, global = true, default_value = API_BASE_URL)]
    pub base_url: String,

    /// Number of concurrent workers (1 runs sequentially)
    #[arg(long, global = true, default_value_t = DEFAULT_WORKERS, value_parser = parse_workers)]
    pub workers: usize,

    /// Requests allowed per rolling minute
    #[arg(long, global = true, default_value_t = DEFAULT_REQUESTS_PER_MINUTE, value_parser = parse_requests_per_minute)]
    pub requests_per_minute: usize,

    /// Serve Prometheus metrics on this address
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch one resource
    Get {
        /// Resource path relative to the base URL (e.g. courses/42)
        path: String,

        /// Filter expression
        #[arg(long)]
        query: Option<String>,
    },

    /// Fetch every page of a paginated resource
    Pages {
        /// Resource path relative to the base URL (e.g. assignments/7/results)
        path: String,

        /// Filter expression
        #[arg(long)]
        query: Option<String>,

        /// Items per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        items: u32,

        /// First page to request
        #[arg(long, default_value_t = 1)]
        first_page: u32,
    },

    /// Find assignments starting within a date range
    Assignments {
        /// First day of the range
        #[arg(long, value_parser = parse_date)]
        from: NaiveDate,

        /// Last day of the range
        #[arg(long, value_parser = parse_date)]
        to: NaiveDate,
    },

    /// Fetch course records
    Courses {
        /// Course ids
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Fetch all results of assignments
    Results {
        /// Assignment ids
        #[arg(required = true)]
        assignment_ids: Vec<u64>,
    },
}

impl Cli {
    /// Client configuration from the global flags
    pub fn config(&self) -> FetchConfig {
        FetchConfig::default()
            .with_base_url(self.base_url.as_str())
            .with_workers(self.workers)
            .with_requests_per_minute(self.requests_per_minute)
    }

    fn credentials(&self) -> Box<dyn CredentialProvider> {
        match &self.token {
            Some(token) => Box::new(StaticToken::new(token.clone())),
            None => Box::new(NoToken),
        }
    }

    /// Build the client for this invocation
    pub fn client(&self) -> Result<AnsClient, CliError> {
        let credentials = self.credentials();
        Ok(AnsClient::builder()
            .with_config(self.config())
            .with_credentials(credentials.as_ref())
            .build()?)
    }

    /// Run the selected command
    pub async fn execute(&self) -> Result<(), CliError> {
        if let Some(addr) = self.metrics_addr {
            metrics::init_metrics(addr)
                .map_err(|e| CliError::ConfigurationError(format!("metrics exporter: {e}")))?;
        }

        let client = self.client()?;
        match &self.command {
            Commands::Get { path, query } => {
                let key = client.request_key(path, query.as_deref(), None);
                print_json(&client.get(&key).await?)
            }
            Commands::Pages {
                path,
                query,
                items,
                first_page,
            } => {
                if *items == 0 {
                    return Err(CliError::InvalidArgument(
                        "items must be at least 1".to_string(),
                    ));
                }
                let mut resource =
                    PagedResource::new(path.as_str(), *items).with_first_page(*first_page);
                if let Some(query) = query {
                    resource = resource.with_query(query.as_str());
                }
                let pages = client.get_multiple_pages(&resource).await?;
                info!(items = pages.len(), "pages fetched");
                print_json(&pages)
            }
            Commands::Assignments { from, to } => {
                if from > to {
                    return Err(CliError::InvalidArgument(format!(
                        "--from {from} is after --to {to}"
                    )));
                }
                print_json(&client.find_assignments(*from, *to).await?)
            }
            Commands::Courses { ids } => print_json(&client.courses(ids).await?),
            Commands::Results { assignment_ids } => {
                print_json(&client.assignment_results(assignment_ids).await?)
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
