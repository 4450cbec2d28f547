//! Paginated catalog collection.
//!
//! The encyclopedia serves each catalog as numbered pages wrapped in a
//! `{status, data, meta}` envelope. [`PaginatedCollector`] walks the pages one
//! at a time through a [`RateLimitedFetcher`], so requests are never
//! concurrent and always at least one cooldown apart.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::fetch::{FetchOutcome, RateLimitedFetcher, Transport};
use crate::model::{Catalog, RecordId};
use crate::progress::ProgressSink;
use crate::rate_limit::RateLimiter;

pub const SHIPS_ENDPOINT: &str = "encyclopedia/ships/";
pub const MODULES_ENDPOINT: &str = "encyclopedia/modules/";

/// What to do when a page answers with a non-success status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingPagePolicy {
    /// Fail the collection with [`Error::FetchFailed`].
    #[default]
    Abort,
    /// Log the page and carry on with the next one. The first page is always
    /// required because it carries the page count.
    Skip,
}

/// Endpoint plus the static query parameters sent with every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    base_url: String,
    endpoint: String,
    params: Vec<(String, String)>,
}

impl CatalogQuery {
    pub fn new(base_url: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: endpoint.into(),
            params: Vec::new(),
        }
    }

    /// Query for `endpoint` carrying the application id, language and page size.
    pub fn for_endpoint(config: &ApiConfig, endpoint: &str) -> Result<Self> {
        let application_id = config.require_application_id()?;
        Ok(Self::new(config.base_url.clone(), endpoint)
            .param("application_id", application_id)
            .param("language", &config.language)
            .param("limit", config.page_limit.to_string()))
    }

    pub fn ships(config: &ApiConfig) -> Result<Self> {
        Self::for_endpoint(config, SHIPS_ENDPOINT)
    }

    pub fn modules(config: &ApiConfig) -> Result<Self> {
        Self::for_endpoint(config, MODULES_ENDPOINT)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Full request URL for page `page` (1-based).
    pub fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        ))?;
        url.query_pairs_mut()
            .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .append_pair("page_no", &page.to_string());
        Ok(url)
    }
}

/// Pagination metadata attached to every page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    /// Records on this page.
    pub count: u64,
    #[serde(default)]
    pub page: Option<u32>,
    pub page_total: u32,
    /// Records across all pages.
    pub total: u64,
}

/// Error body the API sends with `status: "error"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub field: Option<String>,
}

/// One decoded page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageEnvelope<R> {
    #[serde(default)]
    pub status: Option<String>,
    /// `null` entries are dropped when merged.
    pub data: BTreeMap<RecordId, Option<R>>,
    pub meta: PageMeta,
}

impl<R: DeserializeOwned> PageEnvelope<R> {
    /// Parse raw body text, so a non-JSON answer (an HTML maintenance page,
    /// a truncated body) is reported against its page.
    pub fn parse(page: u32, body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body).map_err(|err| Error::MalformedResponse {
            page,
            message: err.to_string(),
        })?;
        Self::decode(page, value)
    }

    /// Decode a page body, surfacing API-level errors and malformed envelopes
    /// with the page number attached.
    pub fn decode(page: u32, body: Value) -> Result<Self> {
        if body.get("status").and_then(Value::as_str) == Some("error") {
            let error = body
                .get("error")
                .cloned()
                .map(serde_json::from_value::<ApiError>)
                .transpose()
                .map_err(|err| Error::MalformedResponse {
                    page,
                    message: err.to_string(),
                })?
                .unwrap_or_default();
            return Err(Error::Api {
                page,
                code: error.code,
                message: error.message,
            });
        }

        serde_json::from_value(body).map_err(|err| Error::MalformedResponse {
            page,
            message: err.to_string(),
        })
    }
}

/// Walks every page of a catalog and merges the records.
#[derive(Debug, Clone)]
pub struct PaginatedCollector<T, L> {
    fetcher: RateLimitedFetcher<T, L>,
    policy: MissingPagePolicy,
}

impl<T: Transport, L: RateLimiter> PaginatedCollector<T, L> {
    pub fn new(fetcher: RateLimitedFetcher<T, L>) -> Self {
        Self {
            fetcher,
            policy: MissingPagePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MissingPagePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Collect every page of `query` into one catalog.
    ///
    /// `sink` receives `(total, 0)` as soon as page 1 announces the total,
    /// then `(total, records_so_far)` after each page. Any error discards
    /// everything collected so far.
    pub fn collect<R: DeserializeOwned>(
        &self,
        query: &CatalogQuery,
        sink: &mut dyn ProgressSink,
    ) -> Result<Catalog<R>> {
        // The first page carries the page count, so it is required whatever
        // the policy says.
        let first = match self.fetch_page::<R>(query, 1)? {
            Page::Loaded(envelope) => envelope,
            Page::Unavailable(status) => return Err(Error::FetchFailed { page: 1, status }),
        };

        let PageMeta {
            total, page_total, ..
        } = first.meta;
        let mut received = 0;
        let mut catalog = Catalog::new();
        sink.update(total, 0);

        received += merge_page(&mut catalog, first);
        sink.update(total, received);

        for page in 2..=page_total {
            match self.fetch_page::<R>(query, page)? {
                Page::Loaded(envelope) => received += merge_page(&mut catalog, envelope),
                Page::Unavailable(status) => match self.policy {
                    MissingPagePolicy::Abort => return Err(Error::FetchFailed { page, status }),
                    MissingPagePolicy::Skip => warn!(
                        endpoint = query.endpoint(),
                        page, status, "skipping unavailable page"
                    ),
                },
            }
            sink.update(total, received);
        }

        if received != total {
            match self.policy {
                MissingPagePolicy::Abort => {
                    return Err(Error::IncompleteCatalog {
                        expected: total,
                        received,
                    })
                }
                MissingPagePolicy::Skip => warn!(
                    endpoint = query.endpoint(),
                    expected = total,
                    received,
                    "catalog incomplete after skipping pages"
                ),
            }
        }

        info!(
            endpoint = query.endpoint(),
            records = catalog.len(),
            pages = page_total,
            "catalog collected"
        );
        Ok(catalog)
    }

    /// Fetch and decode one page. Transport failures come back tagged with
    /// the page number.
    fn fetch_page<R: DeserializeOwned>(
        &self,
        query: &CatalogQuery,
        page: u32,
    ) -> Result<Page<R>> {
        let url = query.page_url(page)?;
        let outcome = self
            .fetcher
            .fetch(&url)
            .map_err(|source| Error::Transport {
                page,
                source: Box::new(source),
            })?;
        match outcome {
            FetchOutcome::Body(body) => {
                let envelope = PageEnvelope::parse(page, &body)?;
                debug!(
                    endpoint = query.endpoint(),
                    page,
                    count = envelope.meta.count,
                    "page fetched"
                );
                Ok(Page::Loaded(envelope))
            }
            FetchOutcome::Unavailable { status } => Ok(Page::Unavailable(status)),
        }
    }
}

enum Page<R> {
    Loaded(PageEnvelope<R>),
    Unavailable(u16),
}

fn merge_page<R>(catalog: &mut Catalog<R>, envelope: PageEnvelope<R>) -> u64 {
    let count = envelope.meta.count;
    let before = envelope.data.len();
    let records: Vec<(RecordId, R)> = envelope
        .data
        .into_iter()
        .filter_map(|(id, record)| record.map(|record| (id, record)))
        .collect();
    if records.len() != before {
        debug!(dropped = before - records.len(), "dropped null records");
    }
    catalog.merge(records);
    count
}
