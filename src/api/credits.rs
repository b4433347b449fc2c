use chrono::NaiveDate;

use super::client::ApiClient;
use super::errors::ApiClientError;
use super::models::{CreditBalance, DailyUsage, Page};
use super::request::Request;

const RESOURCE: &str = "credits";

/// Credit balance and consumption of the account.
pub struct Credits<'a> {
    client: &'a ApiClient,
}

impl<'a> Credits<'a> {
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Will return `Err` on network failure or rejected credentials.
    pub fn balance(&self) -> Result<CreditBalance, ApiClientError> {
        let balance = self
            .client
            .execute(&Request::get([RESOURCE, "balance"]))?
            .json()?;
        Ok(balance)
    }

    /// Daily consumption between `since` and `until`, both inclusive and
    /// both optional.
    ///
    /// # Errors
    ///
    /// Will return `Err` on network failure or rejected credentials.
    pub fn daily_usage(
        &self,
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<Vec<DailyUsage>, ApiClientError> {
        let mut usage = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            // The cursor already encodes the date filters
            let request = match &cursor {
                Some(cursor) => Request::get([RESOURCE, "daily-usage"]).query("cursor", cursor.as_str()),
                None => {
                    let mut request = Request::get([RESOURCE, "daily-usage"]);
                    if let Some(since) = since {
                        request = request.query("date:since", since.format("%Y-%m-%d").to_string());
                    }
                    if let Some(until) = until {
                        request = request.query("date:until", until.format("%Y-%m-%d").to_string());
                    }
                    request
                }
            };

            let page: Page<DailyUsage> = self.client.execute(&request)?.json()?;
            cursor = page.next_cursor().map(str::to_owned);
            usage.extend(page.data);

            if cursor.is_none() {
                return Ok(usage);
            }
        }
    }
}

impl ApiClient {
    pub const fn credits(&self) -> Credits<'_> {
        Credits::new(self)
    }
}
