//! A single recommendation section.
//!
//! A section fetches one ranked list, drops whatever other sections already
//! claimed, claims the rest and then pages through it locally. Each fetch
//! runs as its own task holding a child of the section's lifetime token; a
//! newer fetch or dropping the section cancels it, and a cancelled fetch never
//! touches the section state or the registry.

use crate::kind::{SectionKind, Viewer};
use crate::registry::{ClaimRegistry, SectionId};
use crate::window::RotationWindow;
use catalog::{ListQuery, Product, ProductApi, ProductId};
use common::{OperationTimer, SectionDefaults};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Caller-facing configuration of a section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionProps {
    pub title: String,
    pub kind: SectionKind,
    /// Falls back to the kind's type name when absent
    pub section_id: Option<SectionId>,
    pub page_size: usize,
    pub fetch_limit: usize,
    /// Shown only while the viewer is signed out
    pub anonymous_only: bool,
}

impl SectionProps {
    pub fn new(title: impl Into<String>, kind: SectionKind) -> Self {
        let defaults = SectionDefaults::default();
        Self {
            title: title.into(),
            kind,
            section_id: None,
            page_size: defaults.page_size,
            fetch_limit: defaults.effective_fetch_limit(),
            anonymous_only: false,
        }
    }

    pub fn anonymous_only(mut self) -> Self {
        self.anonymous_only = true;
        self
    }

    pub fn visible_to(&self, viewer: Viewer) -> bool {
        !(self.anonymous_only && viewer.is_authenticated())
    }

    pub fn with_section_id(mut self, id: impl Into<SectionId>) -> Self {
        self.section_id = Some(id.into());
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_fetch_limit(mut self, fetch_limit: usize) -> Self {
        self.fetch_limit = fetch_limit.max(1);
        self
    }

    pub fn with_defaults(self, defaults: &SectionDefaults) -> Self {
        self.with_page_size(defaults.page_size)
            .with_fetch_limit(defaults.effective_fetch_limit())
    }

    pub fn claim_id(&self) -> SectionId {
        self.section_id
            .clone()
            .unwrap_or_else(|| SectionId::new(self.kind.type_name()))
    }

    pub fn fetch_key(&self, viewer: Viewer) -> FetchKey {
        FetchKey {
            section_id: self.claim_id(),
            kind: self.kind.clone(),
            viewer,
        }
    }
}

/// Everything whose change requires a new fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    pub section_id: SectionId,
    pub kind: SectionKind,
    pub viewer: Viewer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionPhase {
    Loading,
    Ready,
    /// Every candidate was already claimed by another section
    Empty,
    Failed,
}

/// How a single fetch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Ready { claimed: usize },
    Empty { fetched: usize },
    Failed { reason: String },
    /// Superseded or unmounted before the result could be applied
    Discarded,
}

/// Render model of a section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SectionRender {
    Hidden,
    Loading { title: String },
    Visible(VisibleSection),
}

impl SectionRender {
    pub fn is_visible(&self) -> bool {
        matches!(self, SectionRender::Visible(_))
    }

    pub fn visible(&self) -> Option<&VisibleSection> {
        match self {
            SectionRender::Visible(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleSection {
    pub section_id: SectionId,
    pub title: String,
    pub description: String,
    pub products: Vec<Product>,
    pub window_start: usize,
    pub total: usize,
    /// Whether the "show more" control is offered
    pub can_rotate: bool,
}

impl VisibleSection {
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.products.iter().map(|p| p.id.clone()).collect()
    }
}

/// Awaitable handle to a spawned fetch
#[derive(Debug)]
pub struct FetchHandle {
    fetch_id: Uuid,
    task: JoinHandle<FetchOutcome>,
}

impl FetchHandle {
    pub fn fetch_id(&self) -> Uuid {
        self.fetch_id
    }

    pub async fn wait(self) -> FetchOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => FetchOutcome::Discarded,
            Err(e) => FetchOutcome::Failed {
                reason: format!("fetch task panicked: {e}"),
            },
        }
    }
}

/// Frozen result of the last applied fetch
#[derive(Debug, Clone)]
struct SectionView {
    candidates: Vec<Product>,
    window: RotationWindow,
}

struct InFlight {
    fetch_id: Uuid,
    token: CancellationToken,
}

struct SectionState {
    props: SectionProps,
    viewer: Viewer,
    key: FetchKey,
    phase: SectionPhase,
    view: Option<SectionView>,
    in_flight: Option<InFlight>,
}

pub struct RecommendationSection {
    api: Arc<dyn ProductApi>,
    registry: ClaimRegistry,
    state: Arc<Mutex<SectionState>>,
    lifetime: CancellationToken,
}

impl RecommendationSection {
    /// Create the section and start its first fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(
        props: SectionProps,
        viewer: Viewer,
        api: Arc<dyn ProductApi>,
        registry: ClaimRegistry,
    ) -> (Self, FetchHandle) {
        let key = props.fetch_key(viewer);
        debug!(section_id = %key.section_id, kind = key.kind.type_name(), "mounting section");

        let section = Self {
            api,
            registry,
            state: Arc::new(Mutex::new(SectionState {
                props,
                viewer,
                key,
                phase: SectionPhase::Loading,
                view: None,
                in_flight: None,
            })),
            lifetime: CancellationToken::new(),
        };

        let handle = {
            let mut state = section.state.lock();
            section.start_fetch(&mut state)
        };
        (section, handle)
    }

    /// Apply new props/viewer; re-fetches only when the fetch key changed
    pub fn update(&self, props: SectionProps, viewer: Viewer) -> Option<FetchHandle> {
        let mut state = self.state.lock();
        let key = props.fetch_key(viewer);

        if props.page_size != state.props.page_size {
            if let Some(view) = state.view.as_mut() {
                view.window = RotationWindow::new(props.page_size);
            }
        }
        state.props = props;
        state.viewer = viewer;

        if key == state.key {
            return None;
        }

        debug!(
            old = %state.key.section_id,
            new = %key.section_id,
            "fetch key changed, refetching"
        );
        state.key = key;
        Some(self.start_fetch(&mut state))
    }

    /// Re-run the fetch for the current key
    pub fn refresh(&self) -> FetchHandle {
        let mut state = self.state.lock();
        self.start_fetch(&mut state)
    }

    /// Advance the visible window by one page; no network, no registry
    pub fn rotate(&self) -> bool {
        let mut state = self.state.lock();
        let Some(view) = state.view.as_mut() else {
            return false;
        };
        let rotated = view.window.rotate(view.candidates.len());
        if rotated {
            debug!(window_start = view.window.start(), "rotated section window");
        }
        rotated
    }

    pub fn render(&self) -> SectionRender {
        let state = self.state.lock();

        match (&state.view, state.phase) {
            (Some(view), _) => SectionRender::Visible(VisibleSection {
                section_id: state.key.section_id.clone(),
                title: state.props.title.clone(),
                description: state.props.kind.description(state.viewer).to_string(),
                products: view.window.visible(&view.candidates).into_iter().cloned().collect(),
                window_start: view.window.start(),
                total: view.candidates.len(),
                can_rotate: view.window.can_rotate(view.candidates.len()),
            }),
            (None, SectionPhase::Loading) => SectionRender::Loading {
                title: state.props.title.clone(),
            },
            (None, _) => SectionRender::Hidden,
        }
    }

    pub fn phase(&self) -> SectionPhase {
        self.state.lock().phase
    }

    pub fn section_id(&self) -> SectionId {
        self.state.lock().key.section_id.clone()
    }

    pub fn props(&self) -> SectionProps {
        self.state.lock().props.clone()
    }

    /// Frozen candidate list of the last applied fetch
    pub fn candidates(&self) -> Vec<Product> {
        self.state
            .lock()
            .view
            .as_ref()
            .map(|v| v.candidates.clone())
            .unwrap_or_default()
    }

    pub fn is_fetching(&self) -> bool {
        self.state.lock().in_flight.is_some()
    }

    /// Cancel any in-flight fetch and drop the section
    pub fn unmount(self) {}

    fn start_fetch(&self, state: &mut SectionState) -> FetchHandle {
        if let Some(previous) = state.in_flight.take() {
            debug!(fetch_id = %previous.fetch_id, "cancelling superseded fetch");
            previous.token.cancel();
        }

        let fetch_id = Uuid::new_v4();
        let token = self.lifetime.child_token();
        state.in_flight = Some(InFlight {
            fetch_id,
            token: token.clone(),
        });
        state.phase = SectionPhase::Loading;

        let task = FetchTask {
            fetch_id,
            key: state.key.clone(),
            query: ListQuery::new(state.props.fetch_limit),
            token,
            api: Arc::clone(&self.api),
            registry: self.registry.clone(),
            state: Arc::clone(&self.state),
        };

        FetchHandle {
            fetch_id,
            task: tokio::spawn(task.run()),
        }
    }
}

impl Drop for RecommendationSection {
    fn drop(&mut self) {
        // под локом: применение результата и отмена не пересекаются
        let _state = self.state.lock();
        self.lifetime.cancel();
    }
}

impl std::fmt::Debug for RecommendationSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RecommendationSection")
            .field("section_id", &state.key.section_id)
            .field("kind", &state.key.kind)
            .field("phase", &state.phase)
            .finish()
    }
}

struct FetchTask {
    fetch_id: Uuid,
    key: FetchKey,
    query: ListQuery,
    token: CancellationToken,
    api: Arc<dyn ProductApi>,
    registry: ClaimRegistry,
    state: Arc<Mutex<SectionState>>,
}

impl FetchTask {
    async fn run(self) -> FetchOutcome {
        let plan = self.key.kind.plan(self.key.viewer);
        let timer = OperationTimer::start("fetch_recommendations")
            .with_field("section_id", &self.key.section_id)
            .with_field("endpoint", plan.endpoint())
            .with_field("limit", self.query.limit);

        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                debug!(fetch_id = %self.fetch_id, section_id = %self.key.section_id, "fetch cancelled in flight");
                return FetchOutcome::Discarded;
            }
            result = plan.execute(self.api.as_ref(), self.query) => result,
        };
        timer.finish(&result);

        let mut state = self.state.lock();
        if self.token.is_cancelled() {
            debug!(fetch_id = %self.fetch_id, section_id = %self.key.section_id, "discarding stale response");
            return FetchOutcome::Discarded;
        }
        state.in_flight = None;

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    section_id = %self.key.section_id,
                    error_code = e.error_code(),
                    "recommendations unavailable: {}",
                    e
                );
                state.view = None;
                state.phase = SectionPhase::Failed;
                return FetchOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        let fetched = raw.len();
        let filtered = dedup_by_id(self.registry.filter(&self.key.section_id, raw));
        if filtered.is_empty() {
            info!(
                section_id = %self.key.section_id,
                fetched = fetched,
                "all candidates already claimed elsewhere, hiding section"
            );
            state.view = None;
            state.phase = SectionPhase::Empty;
            return FetchOutcome::Empty { fetched };
        }

        let claimed = filtered.len();
        self.registry.register(
            &self.key.section_id,
            filtered.iter().map(|p| p.id.clone()).collect(),
        );
        state.view = Some(SectionView {
            candidates: filtered,
            window: RotationWindow::new(state.props.page_size),
        });
        state.phase = SectionPhase::Ready;

        info!(
            section_id = %self.key.section_id,
            fetched = fetched,
            claimed = claimed,
            "section ready"
        );
        FetchOutcome::Ready { claimed }
    }
}

/// Backend lists occasionally repeat a product; keep the first occurrence
fn dedup_by_id(products: Vec<Product>) -> Vec<Product> {
    let mut seen = HashSet::new();
    products
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}
