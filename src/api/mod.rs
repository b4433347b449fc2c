// Re-export the API module components
pub use self::{
    client::{ApiClient, ApiClientBuilder, EndpointSelection, DEFAULT_API_VERSION, DEFAULT_TIMEOUT},
    credits::Credits,
    errors::ApiClientError,
    models::{
        Callback, CreditBalance, DailyUsage, EntryRequest, ListingMeta, Page, Progress, Validation,
        ValidationEntry, ValidationOverview, ValidationRequest,
    },
    polling::{
        wait_for_completion, CancellationToken, Clock, IgnoreEvents, Pollable, Poller,
        SystemClock, WaitEvent, WaitEventSink, WaitOptions, WaitOutcome, DEFAULT_POLLING_INTERVAL,
        DEFAULT_WAIT_TIMEOUT,
    },
    request::{Request, Response, StatusClass},
    types::{
        time_span, Deduplication, EntryClassification, EntryStatus, QualityLevel,
        ValidationStatus,
    },
    validations::{EmailValidations, ListingOptions},
};

// Module declarations
mod client;
mod credits;
mod errors;
mod models;
mod polling;
mod request;
mod types;
mod validations;
