use crate::kind::{SectionKind, Viewer};
use crate::registry::{ClaimRegistry, SectionId};
use crate::section::{FetchHandle, FetchOutcome, RecommendationSection, SectionProps, SectionRender};
use catalog::{ProductApi, ProductId};
use common::SectionDefaults;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One page view: a layout of sections sharing a single claim registry
pub struct RecommendationPage {
    api: Arc<dyn ProductApi>,
    registry: ClaimRegistry,
    viewer: Viewer,
    /// Everything the page asked for, including sections hidden for the current viewer
    layout: Vec<SectionProps>,
    sections: Vec<RecommendationSection>,
    pending: Vec<FetchHandle>,
}

impl RecommendationPage {
    pub fn new(api: Arc<dyn ProductApi>, viewer: Viewer) -> Self {
        Self {
            api,
            registry: ClaimRegistry::new(),
            viewer,
            layout: Vec::new(),
            sections: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn registry(&self) -> &ClaimRegistry {
        &self.registry
    }

    pub fn viewer(&self) -> Viewer {
        self.viewer
    }

    pub fn sections(&self) -> &[RecommendationSection] {
        &self.sections
    }

    pub fn section(&self, id: &SectionId) -> Option<&RecommendationSection> {
        self.sections.iter().find(|s| &s.section_id() == id)
    }

    /// Add a section to the layout; it mounts and starts fetching only if
    /// the current viewer can see it
    pub fn mount(&mut self, props: SectionProps) -> Option<&RecommendationSection> {
        self.layout.push(props.clone());
        if !props.visible_to(self.viewer) {
            debug!(section_id = %props.claim_id(), "section hidden for this viewer");
            return None;
        }
        Some(self.mount_section(props))
    }

    fn mount_section(&mut self, props: SectionProps) -> &RecommendationSection {
        let id = props.claim_id();
        if self.section(&id).is_some() {
            warn!(section_id = %id, "two mounted sections share a claim id; their claims will overwrite each other");
        }

        let (section, handle) = RecommendationSection::mount(
            props,
            self.viewer,
            Arc::clone(&self.api),
            self.registry.clone(),
        );
        self.pending.push(handle);
        self.sections.push(section);
        &self.sections[self.sections.len() - 1]
    }

    /// Propagate a sign-in/sign-out.
    ///
    /// Sections the new viewer can't see are unmounted; their claims stay in
    /// the registry until the next navigation. Sections that become visible
    /// are mounted after the rest.
    pub fn set_viewer(&mut self, viewer: Viewer) {
        if viewer == self.viewer {
            return;
        }
        info!(?viewer, "viewer changed, updating sections");
        self.viewer = viewer;

        self.sections.retain(|section| {
            let keep = section.props().visible_to(viewer);
            if !keep {
                debug!(section_id = %section.section_id(), "unmounting section hidden for viewer");
            }
            keep
        });

        for section in &self.sections {
            if let Some(handle) = section.update(section.props(), viewer) {
                self.pending.push(handle);
            }
        }

        let revealed: Vec<SectionProps> = self
            .layout
            .iter()
            .filter(|props| props.visible_to(viewer) && self.section(&props.claim_id()).is_none())
            .cloned()
            .collect();
        for props in revealed {
            self.mount_section(props);
        }
    }

    /// Replace the whole layout and start from an empty registry
    pub fn navigate(&mut self, layout: Vec<SectionProps>) {
        debug!(
            old_sections = self.sections.len(),
            new_sections = layout.len(),
            "navigating"
        );
        // снимаем секции до сброса реестра, чтобы запоздалые ответы не записали заявки
        self.sections.clear();
        self.registry.reset();
        self.layout.clear();

        for props in layout {
            self.mount(props);
        }
    }

    /// Wait for every fetch started so far
    pub async fn settle(&mut self) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        for handle in std::mem::take(&mut self.pending) {
            outcomes.push(handle.wait().await);
        }
        outcomes
    }

    pub fn render(&self) -> Vec<SectionRender> {
        self.sections.iter().map(|s| s.render()).collect()
    }

    pub fn rotate(&self, id: &SectionId) -> bool {
        self.section(id).map(|s| s.rotate()).unwrap_or(false)
    }
}

/// Section layouts used by the storefront pages
pub mod layouts {
    use super::*;

    /// Home page: popular, personalized, related to the first featured product,
    /// and a second personalized block at the bottom for anonymous viewers
    pub fn home(featured: Option<ProductId>, defaults: &SectionDefaults) -> Vec<SectionProps> {
        let mut layout = vec![
            SectionProps::new("Popular picks", SectionKind::Popular)
                .with_section_id("popular")
                .with_defaults(defaults),
            SectionProps::new("Recommended for you", SectionKind::Personalized)
                .with_section_id("personalized")
                .with_defaults(defaults),
        ];

        if let Some(product_id) = featured {
            layout.push(
                SectionProps::new("You may also like", SectionKind::Related { product_id })
                    .with_section_id("related")
                    .with_defaults(defaults),
            );
        }

        layout.push(
            SectionProps::new("Picked for you", SectionKind::Personalized)
                .with_section_id("bottom-personalized")
                .with_defaults(defaults)
                .anonymous_only(),
        );
        layout
    }

    /// Product detail page: a single related block keyed by its type
    pub fn product_detail(product_id: ProductId) -> Vec<SectionProps> {
        vec![SectionProps::new("Related products", SectionKind::Related { product_id })
            .with_page_size(4)
            .with_fetch_limit(4)]
    }
}
