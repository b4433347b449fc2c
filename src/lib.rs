//! # Verifalia
//!
//! A blocking Rust client for the Verifalia email verification REST API.
//!
//! ## Features
//!
//! - **Failover**: every request rotates through a set of equivalent
//!   endpoints, starting from a random one
//! - **Authentication**: HTTP Basic, bearer tokens issued on first use, and
//!   TLS client certificates
//! - **Job polling**: wait for a verification job to complete, with
//!   timeout, cancellation and progress events
//! - **Error Handling**: error types with actionable suggestions
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use verifalia::{
//!     api::{ApiClient, ValidationRequest, WaitOptions, WaitOutcome},
//!     auth::{Authenticator, Credentials},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new(Authenticator::basic(Credentials::new("username", "password")))?;
//!
//! let request = ValidationRequest::new(["batman@gmail.com"]);
//! match client.email_validations().submit(&request, &WaitOptions::default())? {
//!     WaitOutcome::Completed(validation) => {
//!         for entry in &validation.entries {
//!             println!("{} => {}", entry.input_data, entry.classification);
//!         }
//!     }
//!     other => println!("job did not complete: {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```

/// REST client, request executor, models and completion polling
pub mod api;

/// Authentication strategies
pub mod auth;

/// Base URLs of the service
pub mod endpoints;

/// Error types with actionable suggestions
pub mod errors;

/// Type-safe job identifiers
pub mod job_id;
