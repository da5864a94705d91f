//! Backend access: the HTTP endpoints of an svviz server and the polling client that
//! drives them.
//!
//! Results are delivered as [`ClientEvent`]s over an unbounded channel. The UI drains the
//! receiver every frame; the `waker` passed to [`PollingClient::new`] is called after each
//! send so an idle UI repaints.

use crate::detail::html_to_text;
use crate::{Category, CountTable, Fragment, ProgressToken};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;

const USER_AGENT: &str = "svviz-view";

/// Errors that can occur when talking to the backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("invalid server URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{endpoint} answered with status {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },
    #[error("no detail available for read '{0}'")]
    UnknownRead(String),
}

/// The svviz backend endpoints the viewer consumes.
pub trait Backend: Send + Sync + 'static {
    /// Rendering progress (`_disp?req=progress`).
    fn progress(&self) -> impl Future<Output = Result<ProgressToken, BackendError>> + Send;

    /// Rendered fragments for one category (`_disp?req=<category>`).
    fn fragments(
        &self,
        category: Category,
    ) -> impl Future<Output = Result<Vec<Fragment>, BackendError>> + Send;

    /// Allele count table (`_disp?req=counts`).
    fn counts(&self) -> impl Future<Output = Result<CountTable, BackendError>> + Send;

    /// Detail HTML for one read (`_info?readid=<id>`).
    fn read_detail(
        &self,
        read_id: &str,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;

    /// Whether the backend can export PDF (`_haspdfexport`).
    fn has_pdf_export(&self) -> impl Future<Output = Result<bool, BackendError>> + Send;
}

#[derive(Debug, Deserialize)]
struct ResultResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct FragmentsResponse {
    results: Vec<Fragment>,
}

#[derive(Debug, Deserialize)]
struct PdfExportResponse {
    haspdfexport: bool,
}

/// [`Backend`] over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl HttpBackend {
    /// Creates a backend for the server at `base_url`, with an optional per-request timeout.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let base = reqwest::Url::parse(base_url).map_err(|err| BackendError::InvalidUrl {
            url: base_url.to_string(),
            message: err.to_string(),
        })?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base,
        })
    }

    fn endpoint(&self, path: &str) -> Result<reqwest::Url, BackendError> {
        self.base.join(path).map_err(|err| BackendError::InvalidUrl {
            url: format!("{}{}", self.base, path),
            message: err.to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .get(self.endpoint(endpoint)?)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::Status {
                endpoint,
                status: response.status(),
            });
        }

        Ok(response.json().await?)
    }
}

impl Backend for HttpBackend {
    async fn progress(&self) -> Result<ProgressToken, BackendError> {
        let response: ResultResponse<ProgressToken> =
            self.get_json("_disp", &[("req", "progress")]).await?;
        Ok(response.result)
    }

    async fn fragments(&self, category: Category) -> Result<Vec<Fragment>, BackendError> {
        let response: FragmentsResponse =
            self.get_json("_disp", &[("req", category.as_str())]).await?;
        Ok(response.results)
    }

    async fn counts(&self) -> Result<CountTable, BackendError> {
        let response: ResultResponse<CountTable> =
            self.get_json("_disp", &[("req", "counts")]).await?;
        Ok(response.result)
    }

    async fn read_detail(&self, read_id: &str) -> Result<String, BackendError> {
        // The backend answers unknown reads with an empty body.
        let response: Option<ResultResponse<String>> = self
            .get_json("_info", &[("readid", read_id)])
            .await
            .or_else(|err| match err {
                BackendError::Http(ref inner) if inner.is_decode() => Ok(None),
                err => Err(err),
            })?;

        response
            .map(|r| r.result)
            .ok_or_else(|| BackendError::UnknownRead(read_id.to_string()))
    }

    async fn has_pdf_export(&self) -> Result<bool, BackendError> {
        let response: PdfExportResponse = self.get_json("_haspdfexport", &[]).await?;
        Ok(response.haspdfexport)
    }
}

/// Something the UI should apply.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The backend reported a non-terminal progress token.
    Progress { attempt: usize, state: String },
    /// Fragments for one category; replaces whatever that category showed before.
    Fragments {
        category: Category,
        fragments: Vec<Fragment>,
    },
    Counts(CountTable),
    /// Plain detail text for a hovered read.
    Detail { read_id: String, text: String },
    /// PDF export capability of the backend.
    PdfExport(bool),
    /// A request failed; the affected region stays as it was.
    Failed { what: String, message: String },
}

/// How a polling run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Rendering finished after `attempts` status requests and results were loaded.
    Ready { attempts: usize },
    /// Nobody is listening any more; no further ticks were scheduled.
    Cancelled,
}

/// Drives a [`Backend`] and reports results as [`ClientEvent`]s.
pub struct PollingClient<B> {
    backend: Arc<B>,
    events: UnboundedSender<ClientEvent>,
    waker: Arc<dyn Fn() + Send + Sync>,
    categories: Vec<Category>,
}

impl<B> Clone for PollingClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            events: self.events.clone(),
            waker: Arc::clone(&self.waker),
            categories: self.categories.clone(),
        }
    }
}

impl<B: Backend> PollingClient<B> {
    pub fn new(
        backend: B,
        categories: Vec<Category>,
        events: UnboundedSender<ClientEvent>,
        waker: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            backend: Arc::new(backend),
            events,
            waker: Arc::new(waker),
            categories,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn emit(&self, event: ClientEvent) -> bool {
        let delivered = self.events.send(event).is_ok();
        (self.waker)();
        delivered
    }

    /// Polls the status endpoint every `interval` until it reports `done`, then loads
    /// results once.
    ///
    /// Request failures count as "not ready yet". Stops without loading when the event
    /// receiver has been dropped.
    pub async fn poll_until_ready(&self, interval: Duration) -> PollOutcome {
        let mut attempts = 0;

        loop {
            if self.events.is_closed() {
                log::debug!("Event receiver dropped; stopping status polling");
                return PollOutcome::Cancelled;
            }

            attempts += 1;
            match self.backend.progress().await {
                Ok(token) if token.is_done() => {
                    log::info!("Backend finished rendering after {attempts} status requests");
                    break;
                }
                Ok(token) => {
                    log::debug!("Status poll {attempts}: {}", token.0);
                    self.emit(ClientEvent::Progress {
                        attempt: attempts,
                        state: token.0,
                    });
                }
                Err(err) => {
                    log::debug!("Status poll {attempts} failed: {err}");
                }
            }

            tokio::time::sleep(interval).await;
        }

        self.load_results().await;
        PollOutcome::Ready { attempts }
    }

    /// Fetches every category and the count table concurrently.
    ///
    /// A failed fetch is reported and leaves its category untouched; nothing is retried.
    pub async fn load_results(&self) {
        let mut join_set: JoinSet<()> = JoinSet::new();

        for &category in &self.categories {
            let client = self.clone();
            join_set.spawn(async move {
                match client.backend.fragments(category).await {
                    Ok(fragments) => {
                        log::info!("Loaded {} {category} fragments", fragments.len());
                        client.emit(ClientEvent::Fragments {
                            category,
                            fragments,
                        });
                    }
                    Err(err) => {
                        log::warn!("Failed to load {category} fragments: {err}");
                        client.emit(ClientEvent::Failed {
                            what: format!("{} reads", category.label()),
                            message: err.to_string(),
                        });
                    }
                }
            });
        }

        let client = self.clone();
        join_set.spawn(async move {
            match client.backend.counts().await {
                Ok(counts) => {
                    client.emit(ClientEvent::Counts(counts));
                }
                Err(err) => log::warn!("Failed to load allele counts: {err}"),
            }
        });

        while let Some(result) = join_set.join_next().await {
            if let Err(err) = result {
                log::error!("Result loader task failed: {err}");
            }
        }
    }

    /// Looks up detail text for a read. Responses are applied in arrival order.
    pub async fn lookup_detail(&self, read_id: String) {
        match self.backend.read_detail(&read_id).await {
            Ok(html) => {
                let text = html_to_text(&html);
                self.emit(ClientEvent::Detail { read_id, text });
            }
            Err(err) => {
                log::warn!("Detail lookup for {read_id} failed: {err}");
            }
        }
    }

    /// Asks whether PDF export is available; failures count as unavailable.
    pub async fn check_pdf_export(&self) {
        let available = match self.backend.has_pdf_export().await {
            Ok(available) => available,
            Err(err) => {
                log::debug!("PDF export capability query failed: {err}");
                false
            }
        };
        self.emit(ClientEvent::PdfExport(available));
    }
}
