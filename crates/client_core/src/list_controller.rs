//! Paged, searchable view over one remote collection.
//!
//! Every fetch is stamped with a sequence number when it is issued; a
//! response is applied only while its number is still the latest one, so the
//! last request issued wins regardless of the order responses arrive in.
//! State is never locked across a network call. A page past the last one the
//! server reports for the current query is replaced by that last page.

use std::{future::Future, sync::Arc};

use shared::domain::Entity;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    api::{ListSource, PageRequest},
    error::ClientError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Browsing,
    Searching,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListState<E> {
    pub items: Vec<E>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub error: Option<String>,
    pub search_term: Option<String>,
}

impl<E> ListState<E> {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            total_pages: 1,
            total_count: 0,
            is_loading: false,
            is_refreshing: false,
            error: None,
            search_term: None,
        }
    }

    pub fn mode(&self) -> ListMode {
        if self.search_term.is_some() {
            ListMode::Searching
        } else {
            ListMode::Browsing
        }
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_refreshing
    }

    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// What happened to a requested fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page was applied to the state.
    Applied,
    /// The fetch failed; `error` was set and the items were kept.
    Failed,
    /// A newer request was issued before this one completed.
    Superseded,
    /// The controller was closed.
    Cancelled,
    /// Preconditions did not hold; nothing was requested.
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Replace,
    Append,
}

struct FetchPlan {
    seq: u64,
    request: PageRequest,
    placement: Placement,
}

/// Page count the server reported for one query (search term plus filters).
struct PageBounds {
    search: Option<String>,
    filters: Vec<(String, String)>,
    total_pages: u32,
}

impl PageBounds {
    fn covers(&self, search: &Option<String>, filters: &[(String, String)]) -> bool {
        self.search == *search && self.filters == filters
    }
}

/// How a finished fetch settled.
enum Settled {
    Done(FetchOutcome),
    /// The requested page lies past the last page; reload that one instead.
    PastEnd { last_page: u32 },
}

struct ControllerInner<E> {
    state: ListState<E>,
    latest_seq: u64,
    /// Only bounds requests for the query it was reported for.
    bounds: Option<PageBounds>,
    filters: Vec<(String, String)>,
}

pub struct ListFetchController<E: Entity> {
    source: Arc<dyn ListSource<E>>,
    page_size: u32,
    inner: Mutex<ControllerInner<E>>,
    cancel: CancellationToken,
}

fn normalize_term(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|term| !term.is_empty())
        .map(str::to_string)
}

impl<E: Entity> ListFetchController<E> {
    pub fn new(source: Arc<dyn ListSource<E>>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            inner: Mutex::new(ControllerInner {
                state: ListState::empty(),
                latest_seq: 0,
                bounds: None,
                filters: Vec::new(),
            }),
            cancel: CancellationToken::new(),
        }
    }

    pub async fn snapshot(&self) -> ListState<E> {
        self.inner.lock().await.state.clone()
    }

    /// Listing filters for browsing mode. Takes effect on the next fetch.
    pub async fn set_filters(&self, filters: Vec<(String, String)>) {
        self.inner.lock().await.filters = filters;
    }

    /// Replaces the items with `page`, searching when `search_term` is non-empty.
    pub async fn load(&self, page: u32, search_term: Option<&str>) -> FetchOutcome {
        self.load_with(page, normalize_term(search_term), false).await
    }

    /// Reloads page one with the active search term as a background refresh.
    pub async fn refresh(&self) -> FetchOutcome {
        let term = self.inner.lock().await.state.search_term.clone();
        self.load_with(1, term, true).await
    }

    /// Appends the next page. Ignored while a fetch is in flight or on the last page.
    pub async fn load_more(&self) -> FetchOutcome {
        let plan = {
            let mut inner = self.inner.lock().await;
            if self.cancel.is_cancelled() || inner.state.is_busy() || !inner.state.has_more() {
                return FetchOutcome::Skipped;
            }
            let page = inner.state.current_page + 1;
            let search = inner.state.search_term.clone();
            self.issue(&mut inner, page, search, false, Placement::Append)
        };
        match self.run(plan).await {
            Settled::Done(outcome) => outcome,
            // Appends never settle past the end.
            Settled::PastEnd { .. } => FetchOutcome::Skipped,
        }
    }

    /// Sets the search term and loads its first page; a blank term clears search.
    pub async fn search(&self, term: &str) -> FetchOutcome {
        self.load_with(1, normalize_term(Some(term)), false).await
    }

    pub async fn clear_search(&self) -> FetchOutcome {
        self.search("").await
    }

    /// Runs `mutation`; on success reloads the current page. On failure the
    /// error is returned and the state is left alone.
    pub async fn mutate_then_reload<T, F, Fut>(&self, mutation: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let (value, _) = self.mutate_and_reload(mutation).await?;
        Ok(value)
    }

    /// Like [`Self::mutate_then_reload`], but steps back one page when the
    /// reloaded page came back empty, e.g. after removing its last record.
    pub async fn delete_then_reload<T, F, Fut>(&self, mutation: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let (value, outcome) = self.mutate_and_reload(mutation).await?;
        if outcome != FetchOutcome::Applied {
            return Ok(value);
        }
        let step_back = {
            let inner = self.inner.lock().await;
            (inner.state.items.is_empty() && inner.state.current_page > 1).then(|| {
                (
                    inner.state.current_page.saturating_sub(1).max(1),
                    inner.state.search_term.clone(),
                )
            })
        };
        if let Some((page, term)) = step_back {
            debug!(page, "list: reloaded page is empty, stepping back");
            self.load_with(page, term, false).await;
        }
        Ok(value)
    }

    /// Tears the controller down; in-flight results are dropped and later
    /// calls do nothing.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn mutate_and_reload<T, F, Fut>(
        &self,
        mutation: F,
    ) -> Result<(T, FetchOutcome), ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let value = match mutation().await {
            Ok(value) => value,
            Err(err) => {
                warn!("list: mutation failed, keeping current page: {err}");
                return Err(err);
            }
        };
        let (page, term) = {
            let inner = self.inner.lock().await;
            (inner.state.current_page, inner.state.search_term.clone())
        };
        let outcome = self.load_with(page, term, false).await;
        Ok((value, outcome))
    }

    async fn load_with(&self, page: u32, search: Option<String>, background: bool) -> FetchOutcome {
        let mut page = page;
        loop {
            let plan = {
                let mut inner = self.inner.lock().await;
                if self.cancel.is_cancelled() {
                    return FetchOutcome::Cancelled;
                }
                inner.state.search_term = search.clone();
                self.issue(&mut inner, page, search.clone(), background, Placement::Replace)
            };
            match self.run(plan).await {
                Settled::Done(outcome) => return outcome,
                Settled::PastEnd { last_page } => {
                    debug!(
                        requested = page,
                        last_page,
                        "list: page past the end, loading last page"
                    );
                    page = last_page;
                }
            }
        }
    }

    fn issue(
        &self,
        inner: &mut ControllerInner<E>,
        page: u32,
        search: Option<String>,
        background: bool,
        placement: Placement,
    ) -> FetchPlan {
        let filters = if search.is_some() {
            Vec::new()
        } else {
            inner.filters.clone()
        };
        let upper = inner
            .bounds
            .as_ref()
            .filter(|bounds| bounds.covers(&search, &filters))
            .map_or(u32::MAX, |bounds| bounds.total_pages.max(1));
        let page = page.clamp(1, upper);

        inner.latest_seq += 1;
        inner.state.is_loading = !background;
        inner.state.is_refreshing = background;
        inner.state.error = None;

        FetchPlan {
            seq: inner.latest_seq,
            request: PageRequest {
                page,
                limit: self.page_size,
                search,
                filters,
            },
            placement,
        }
    }

    async fn run(&self, plan: FetchPlan) -> Settled {
        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(seq = plan.seq, "list: fetch cancelled");
                return Settled::Done(FetchOutcome::Cancelled);
            }
            result = self.source.fetch_page(&plan.request) => result,
        };

        let mut inner = self.inner.lock().await;
        if self.cancel.is_cancelled() {
            return Settled::Done(FetchOutcome::Cancelled);
        }
        if plan.seq != inner.latest_seq {
            debug!(
                seq = plan.seq,
                latest = inner.latest_seq,
                page = plan.request.page,
                "list: dropping superseded response"
            );
            return Settled::Done(FetchOutcome::Superseded);
        }

        if let Ok(page) = &result {
            let total_pages = page.pagination.total_pages.max(1);
            inner.bounds = Some(PageBounds {
                search: plan.request.search.clone(),
                filters: plan.request.filters.clone(),
                total_pages,
            });
            if plan.placement == Placement::Replace && plan.request.page > total_pages {
                // Loading flags stay up; the reload for `total_pages` clears them.
                return Settled::PastEnd {
                    last_page: total_pages,
                };
            }
        }

        let state = &mut inner.state;
        state.is_loading = false;
        state.is_refreshing = false;

        match result {
            Ok(page) => {
                let fetched = page.items.len();
                match plan.placement {
                    Placement::Replace => state.items = page.items,
                    Placement::Append => state.items.extend(page.items),
                }
                state.total_pages = page.pagination.total_pages.max(1);
                state.current_page = plan.request.page.min(state.total_pages);
                state.total_count = page.pagination.total_count;
                state.error = None;
                info!(
                    kind = E::KIND.label(),
                    page = state.current_page,
                    total_pages = state.total_pages,
                    fetched,
                    "list: page applied"
                );
                Settled::Done(FetchOutcome::Applied)
            }
            Err(err) => {
                warn!(
                    kind = E::KIND.label(),
                    page = plan.request.page,
                    "list: fetch failed: {err}"
                );
                state.error = Some(err.user_message());
                Settled::Done(FetchOutcome::Failed)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/list_controller_tests.rs"]
mod tests;
