use crate::codec::decode_payload;
use crate::error::PollStage;
use crate::models::{submitted_query, DecodedResult, PollConfig, RawSearchResult, SearchOutcome};
use crate::render::{final_page, progress_page, search_started_page, waiting_page};
use crate::session::SearchSession;
use crate::traits::{ContentRegion, SearchBackend};
use crate::PollError;
use chrono::Utc;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct ActiveSession {
    generation: u64,
    cancel: CancellationToken,
}

/// Drives a search from submission to final render.
///
/// Only the most recent submission may write to the content region: starting
/// a new search cancels the one before it.
pub struct SearchPoller<B, R>
where
    B: SearchBackend,
    R: ContentRegion,
{
    backend: B,
    region: R,
    config: PollConfig,
    generation: AtomicU64,
    index_ready: AtomicBool,
    current: Mutex<Option<ActiveSession>>,
}

impl<B, R> SearchPoller<B, R>
where
    B: SearchBackend + Send + Sync,
    R: ContentRegion + Send + Sync,
{
    pub fn new(backend: B, region: R) -> Self {
        Self {
            backend,
            region,
            config: PollConfig::default(),
            generation: AtomicU64::new(0),
            index_ready: AtomicBool::new(false),
            current: Mutex::new(None),
        }
    }

    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn region(&self) -> &R {
        &self.region
    }

    /// True once any readiness check has succeeded.
    pub fn index_ready(&self) -> bool {
        self.index_ready.load(Ordering::SeqCst)
    }

    /// Opens a session for `input`, cancelling whichever session was running.
    /// Blank input opens nothing.
    pub fn begin(&self, input: &str) -> Option<SearchSession> {
        let Some(query) = submitted_query(input) else {
            debug!("ignoring blank search submission");
            return None;
        };

        let mut current = self.current.lock();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = SearchSession::new(generation, query);

        let previous = current.replace(ActiveSession {
            generation,
            cancel: session.cancel_token(),
        });
        if let Some(previous) = previous {
            previous.cancel.cancel();
            info!(
                superseded = previous.generation,
                generation, "cancelled previous search"
            );
        }

        info!(
            session_id = %session.id(),
            generation,
            query = %session.query(),
            "search submitted"
        );
        Some(session)
    }

    /// Cancels the running session, if any.
    pub fn cancel(&self) -> bool {
        match self.current.lock().take() {
            Some(active) => {
                active.cancel.cancel();
                info!(generation = active.generation, "search cancelled");
                true
            }
            None => false,
        }
    }

    /// Runs a whole search inline. `Ok(None)` means the input was blank and no
    /// request was made.
    pub async fn search(&self, input: &str) -> Result<Option<SearchOutcome>, PollError> {
        let Some(session) = self.begin(input) else {
            return Ok(None);
        };
        self.run(session).await.map(Some)
    }

    pub async fn run(&self, mut session: SearchSession) -> Result<SearchOutcome, PollError> {
        let result = self.run_stages(&mut session).await;
        self.release(&session);

        match &result {
            Ok(outcome) => info!(
                session_id = %session.id(),
                generation = session.generation(),
                readiness_polls = outcome.readiness_polls,
                result_polls = outcome.result_polls,
                found_nothing = outcome.found_nothing(),
                "search finished"
            ),
            Err(PollError::Cancelled) => debug!(
                session_id = %session.id(),
                generation = session.generation(),
                "search stopped after cancellation"
            ),
            Err(error) => warn!(
                session_id = %session.id(),
                generation = session.generation(),
                error = %error,
                "search failed"
            ),
        }
        result
    }

    async fn run_stages(&self, session: &mut SearchSession) -> Result<SearchOutcome, PollError> {
        let started_at = Utc::now();
        let readiness_polls = self.wait_for_index(session).await?;
        let (decoded, result_polls, html) = self.search_and_poll(session).await?;

        Ok(SearchOutcome {
            query: session.query().to_string(),
            status: decoded.status,
            complete: decoded.complete,
            detailed: decoded.detailed,
            html,
            readiness_polls,
            result_polls,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Polls the readiness endpoint until it answers `true`; returns the number
    /// of requests made.
    pub async fn wait_for_index(&self, session: &mut SearchSession) -> Result<u32, PollError> {
        let mut attempts = 0;
        loop {
            ensure_active(session)?;
            attempts += 1;

            let ready = self.guarded(session, self.backend.index_ready()).await?;
            debug!(generation = session.generation(), attempts, ready, "index readiness polled");

            if ready {
                self.index_ready.store(true, Ordering::SeqCst);
                session.waiting.reset();
                info!(generation = session.generation(), attempts, "search index ready");
                return Ok(attempts);
            }

            session.waiting.tick();
            self.render(session, &waiting_page(&session.waiting));

            if let Some(max) = self.config.max_readiness_polls {
                if attempts >= max {
                    return Err(PollError::Exhausted {
                        stage: PollStage::Readiness,
                        attempts,
                    });
                }
            }

            self.pause(session, self.config.readiness_interval).await?;
        }
    }

    /// Fires the search request, then polls results after the first interval
    /// whether or not the request has answered yet. The request keeps being
    /// driven alongside the poll loop and is dropped once polling ends.
    pub async fn search_and_poll(
        &self,
        session: &mut SearchSession,
    ) -> Result<(DecodedResult, u32, String), PollError> {
        ensure_active(session)?;
        session.searching.reset();
        self.render(session, &search_started_page(session.query()));

        let trigger = self.trigger_search(
            session.generation(),
            session.query().to_string(),
            session.cancel_token(),
        );
        tokio::pin!(trigger);

        let polling = async {
            self.pause(session, self.config.result_interval).await?;
            self.poll_results(session).await
        };
        tokio::pin!(polling);

        let mut triggered = false;
        loop {
            tokio::select! {
                result = &mut polling => return result,
                _ = &mut trigger, if !triggered => triggered = true,
            }
        }
    }

    /// Sends the search request once. A failure is logged, not fatal; the
    /// result endpoint has the final say.
    async fn trigger_search(&self, generation: u64, query: String, cancel: CancellationToken) {
        let triggered = tokio::select! {
            _ = cancel.cancelled() => return,
            result = self.bounded(self.backend.start_search(&query)) => result,
        };

        match triggered {
            Ok(()) => debug!(generation, "search triggered"),
            Err(error) => warn!(
                generation,
                error = %error,
                "search trigger failed, polling results anyway"
            ),
        }
    }

    /// Polls the result endpoint until the search is done; returns the decoded
    /// result, the number of requests made and the final fragment.
    pub async fn poll_results(
        &self,
        session: &mut SearchSession,
    ) -> Result<(DecodedResult, u32, String), PollError> {
        let mut attempts = 0;
        loop {
            ensure_active(session)?;
            attempts += 1;

            let raw = self.guarded(session, self.backend.fetch_result()).await?;
            let decoded = decode_result(raw)?;
            debug!(
                generation = session.generation(),
                attempts,
                done = decoded.status.is_done(),
                "search result polled"
            );

            if decoded.status.is_done() {
                let html = final_page(session.query(), &decoded.complete, &decoded.detailed);
                self.render(session, &html);
                return Ok((decoded, attempts, html));
            }

            session.searching.tick();
            let html = progress_page(
                session.query(),
                &session.searching,
                &decoded.complete,
                &decoded.detailed,
            );
            self.render(session, &html);

            if let Some(max) = self.config.max_result_polls {
                if attempts >= max {
                    return Err(PollError::Exhausted {
                        stage: PollStage::Results,
                        attempts,
                    });
                }
            }

            self.pause(session, self.config.result_interval).await?;
        }
    }

    fn render(&self, session: &SearchSession, html: &str) {
        let current = self.current.lock();
        let is_current = matches!(
            current.as_ref(),
            Some(active) if active.generation == session.generation()
        );

        if is_current && !session.is_cancelled() {
            self.region.replace(html);
        } else {
            debug!(generation = session.generation(), "dropping render from stale search");
        }
    }

    fn release(&self, session: &SearchSession) {
        let mut current = self.current.lock();
        if matches!(current.as_ref(), Some(active) if active.generation == session.generation()) {
            current.take();
        }
    }

    async fn pause(&self, session: &SearchSession, duration: Duration) -> Result<(), PollError> {
        tokio::select! {
            _ = session.cancel.cancelled() => Err(PollError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }

    async fn guarded<T, F>(&self, session: &SearchSession, request: F) -> Result<T, PollError>
    where
        F: Future<Output = Result<T, PollError>>,
    {
        tokio::select! {
            _ = session.cancel.cancelled() => Err(PollError::Cancelled),
            result = self.bounded(request) => result,
        }
    }

    async fn bounded<T, F>(&self, request: F) -> Result<T, PollError>
    where
        F: Future<Output = Result<T, PollError>>,
    {
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or(Err(PollError::Timeout(limit))),
            None => request.await,
        }
    }
}

impl<B, R> SearchPoller<B, R>
where
    B: SearchBackend + Send + Sync + 'static,
    R: ContentRegion + Send + Sync + 'static,
{
    /// Starts the search on the runtime and hands back a handle to it.
    pub fn spawn_search(self: &Arc<Self>, input: &str) -> Option<SearchTask> {
        let session = self.begin(input)?;
        let generation = session.generation();
        let query = session.query().to_string();
        let cancel = session.cancel_token();

        let poller = Arc::clone(self);
        let handle = tokio::spawn(async move { poller.run(session).await });

        Some(SearchTask {
            generation,
            query,
            cancel,
            handle,
        })
    }
}

pub struct SearchTask {
    generation: u64,
    query: String,
    cancel: CancellationToken,
    handle: JoinHandle<Result<SearchOutcome, PollError>>,
}

impl SearchTask {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Result<SearchOutcome, PollError> {
        self.handle.await?
    }
}

fn ensure_active(session: &SearchSession) -> Result<(), PollError> {
    if session.is_cancelled() {
        Err(PollError::Cancelled)
    } else {
        Ok(())
    }
}

fn decode_result(raw: RawSearchResult) -> Result<DecodedResult, PollError> {
    Ok(DecodedResult {
        complete: decode_payload("res_completa", &raw.complete)?,
        detailed: decode_payload("res_detallada", &raw.detailed)?,
        status: raw.status,
    })
}
