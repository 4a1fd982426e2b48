//! Cross-section recommendation arbitration.
//!
//! Several recommendation sections on one page fetch their ranked lists
//! independently. The [`ClaimRegistry`] records which products each section
//! committed to showing so that a section completing later skips products
//! another section already shows. Arbitration is best-effort: two sections
//! whose fetches complete at the same moment can both claim a product until
//! one of them fetches again.
//!
//! ```no_run
//! use std::sync::Arc;
//! use catalog::HttpProductApi;
//! use recommend::{layouts, RecommendationPage, Viewer};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let api = HttpProductApi::new("http://localhost:5000/api", std::time::Duration::from_secs(10))?;
//! let mut page = RecommendationPage::new(Arc::new(api), Viewer::Anonymous);
//! page.navigate(layouts::home(None, &Default::default()));
//! page.settle().await;
//! for section in page.render() {
//!     println!("{section:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod kind;
pub mod page;
pub mod registry;
pub mod section;
pub mod window;

pub use kind::{FetchPlan, SectionKind, Viewer};
pub use page::{layouts, RecommendationPage};
pub use registry::{ClaimEntry, ClaimRegistry, Claimable, RegistrySnapshot, SectionId};
pub use section::{
    FetchHandle, FetchKey, FetchOutcome, RecommendationSection, SectionPhase, SectionProps,
    SectionRender, VisibleSection,
};
pub use window::RotationWindow;
