use reqwest::StatusCode;

use crate::job_id::JobId;

use super::client::ApiClient;
use super::errors::ApiClientError;
use super::models::{Page, Validation, ValidationEntry, ValidationOverview, ValidationRequest, ValidationResponse};
use super::polling::{IgnoreEvents, Poller, WaitEventSink, WaitOptions, WaitOutcome};
use super::request::{Request, Response};

const RESOURCE: &str = "email-validations";

/// Options for listing the jobs of the account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListingOptions {
    /// Page size requested from the service.
    pub limit: Option<u32>,
    /// Stop after this many jobs.
    pub max_items: Option<usize>,
}

/// Email validation jobs: submission, queries, listing and deletion.
pub struct EmailValidations<'a> {
    client: &'a ApiClient,
    poller: Poller,
}

impl<'a> EmailValidations<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            poller: Poller::new(),
        }
    }

    /// Uses `poller` (e.g. one carrying a cancellation token) for waits.
    #[must_use]
    pub fn with_poller(mut self, poller: Poller) -> Self {
        self.poller = poller;
        self
    }

    /// # Errors
    ///
    /// See [`EmailValidations::submit_with_events`].
    pub fn submit(
        &self,
        request: &ValidationRequest,
        wait: &WaitOptions,
    ) -> Result<WaitOutcome<Validation>, ApiClientError> {
        self.submit_with_events(request, wait, &mut IgnoreEvents)
    }

    /// Submits a new job. A job completed on the spot is returned without
    /// polling; otherwise, unless `wait` is [`WaitOptions::DONT_WAIT`],
    /// the job is polled until it completes.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure, rejected credentials,
    /// insufficient credit or when the service refuses the submission.
    pub fn submit_with_events(
        &self,
        request: &ValidationRequest,
        wait: &WaitOptions,
        events: &mut dyn WaitEventSink<Validation>,
    ) -> Result<WaitOutcome<Validation>, ApiClientError> {
        let response = self
            .client
            .execute(&Request::post([RESOURCE]).json(request)?)?;
        let validation = self.read_validation(&response)?;
        log::debug!(
            "Submitted job {} ({} entries), status {}",
            validation.id(),
            validation.overview.no_of_entries,
            validation.status()
        );

        if validation.is_completed() {
            return Ok(WaitOutcome::Completed(validation));
        }
        if wait.is_dont_wait() {
            return Ok(WaitOutcome::Pending(validation));
        }

        let id = validation.id().clone();
        self.poller.wait(|| self.fetch(&id), wait, events)
    }

    /// # Errors
    ///
    /// See [`EmailValidations::get_with_events`].
    pub fn get(
        &self,
        id: &JobId,
        wait: &WaitOptions,
    ) -> Result<WaitOutcome<Validation>, ApiClientError> {
        self.get_with_events(id, wait, &mut IgnoreEvents)
    }

    /// Fetches a job, polling until completion unless `wait` is
    /// [`WaitOptions::DONT_WAIT`]. Missing jobs, and jobs reported as
    /// deleted or expired, yield [`WaitOutcome::NotFound`].
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or on any answer other than
    /// success, 404 and 410.
    pub fn get_with_events(
        &self,
        id: &JobId,
        wait: &WaitOptions,
        events: &mut dyn WaitEventSink<Validation>,
    ) -> Result<WaitOutcome<Validation>, ApiClientError> {
        self.poller.wait(|| self.fetch(id), wait, events)
    }

    /// # Errors
    ///
    /// Will return `Err` on network failure or on any answer other than
    /// success, 404 and 410.
    pub fn get_overview(
        &self,
        id: &JobId,
        wait: &WaitOptions,
        events: &mut dyn WaitEventSink<ValidationOverview>,
    ) -> Result<WaitOutcome<ValidationOverview>, ApiClientError> {
        self.poller.wait(|| self.fetch_overview(id), wait, events)
    }

    /// Lists the jobs of the account, following cursors until the listing
    /// ends or `options.max_items` jobs have been collected.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or unexpected answers.
    pub fn list(&self, options: &ListingOptions) -> Result<Vec<ValidationOverview>, ApiClientError> {
        let mut jobs = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut request = Request::get([RESOURCE]);
            if let Some(limit) = options.limit {
                request = request.query("limit", limit.to_string());
            }
            if let Some(cursor) = &cursor {
                request = request.query("cursor", cursor.as_str());
            }

            let page: Page<ValidationOverview> = self.client.execute(&request)?.json()?;
            cursor = page.next_cursor().map(str::to_owned);
            jobs.extend(page.data);

            if let Some(max) = options.max_items {
                if jobs.len() >= max {
                    jobs.truncate(max);
                    break;
                }
            }
            if cursor.is_none() {
                break;
            }
        }

        Ok(jobs)
    }

    /// Deletes a job. Deleting a job that is already gone succeeds.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or on any answer other than
    /// success and 410.
    pub fn delete(&self, id: &JobId) -> Result<(), ApiClientError> {
        match self.client.execute(&Request::delete([RESOURCE, id.as_ref()])) {
            Ok(_) => Ok(()),
            Err(ApiClientError::Failure(failure)) if failure.status == StatusCode::GONE => {
                log::debug!("Job {id} was already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Single-shot query of a job, `None` once it is gone.
    fn fetch(&self, id: &JobId) -> Result<Option<Validation>, ApiClientError> {
        let response = match self.client.execute(&Request::get([RESOURCE, id.as_ref()])) {
            Ok(response) => response,
            Err(e) => return not_found_as_none(e),
        };
        let validation = self.read_validation(&response)?;
        if validation.overview.is_gone() {
            log::debug!("Job {id} is {}, treating as not found", validation.status());
            return Ok(None);
        }
        Ok(Some(validation))
    }

    fn fetch_overview(&self, id: &JobId) -> Result<Option<ValidationOverview>, ApiClientError> {
        let overview: ValidationOverview = match self
            .client
            .execute(&Request::get([RESOURCE, id.as_ref(), "overview"]))
        {
            Ok(response) => response.json()?,
            Err(e) => return not_found_as_none(e),
        };
        if overview.is_gone() {
            log::debug!("Job {id} is {}, treating as not found", overview.status);
            return Ok(None);
        }
        Ok(Some(overview))
    }

    /// Decodes a job payload, pulling the remaining entry pages when the
    /// embedded page is truncated.
    fn read_validation(&self, response: &Response) -> Result<Validation, ApiClientError> {
        let ValidationResponse { overview, entries } = response.json()?;
        let mut validation = Validation {
            overview,
            entries: Vec::new(),
        };

        let Some(page) = entries else {
            return Ok(validation);
        };
        let mut cursor = page.next_cursor().map(str::to_owned);
        validation.entries.extend(page.data);

        while let Some(current) = cursor {
            let page: Page<ValidationEntry> = self
                .client
                .execute(
                    &Request::get([RESOURCE, validation.id().as_ref(), "entries"])
                        .query("cursor", current),
                )?
                .json()?;
            cursor = page.next_cursor().map(str::to_owned);
            validation.entries.extend(page.data);
        }

        Ok(validation)
    }
}

fn not_found_as_none<T>(error: ApiClientError) -> Result<Option<T>, ApiClientError> {
    match error {
        ApiClientError::Failure(failure)
            if matches!(failure.status, StatusCode::NOT_FOUND | StatusCode::GONE) =>
        {
            log::debug!("{} returned {}, treating as not found", failure.url, failure.status);
            Ok(None)
        }
        e => Err(e),
    }
}

impl ApiClient {
    pub fn email_validations(&self) -> EmailValidations<'_> {
        EmailValidations::new(self)
    }
}
