use crate::output;
use anyhow::Result;
use catalog::{HttpProductApi, ProductId};
use clap::Subcommand;
use common::{RequestContext, StorefrontConfig};
use console::Term;
use recommend::{layouts, FetchOutcome, RecommendationPage, SectionProps, Viewer};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Subcommand)]
pub enum PreviewCommand {
    /// Главная страница: popular, personalized, related
    Home {
        /// Product the "related" section is built around
        #[arg(long)]
        featured: Option<String>,

        /// Rotate every rotatable section this many times
        #[arg(long, default_value_t = 0)]
        rotate: usize,
    },
    /// Страница товара: один related блок
    #[command(visible_alias = "pdp")]
    Product {
        /// Product id
        id: String,

        #[arg(long, default_value_t = 0)]
        rotate: usize,
    },
}

impl PreviewCommand {
    pub fn rotations(&self) -> usize {
        match self {
            PreviewCommand::Home { rotate, .. } | PreviewCommand::Product { rotate, .. } => *rotate,
        }
    }

    /// Section layout for this page; the page decides what the viewer sees
    pub fn layout(&self, config: &StorefrontConfig) -> Result<Vec<SectionProps>> {
        Ok(match self {
            PreviewCommand::Home { featured, .. } => {
                let featured = featured.as_deref().map(ProductId::parse).transpose()?;
                layouts::home(featured, &config.sections)
            }
            PreviewCommand::Product { id, .. } => layouts::product_detail(ProductId::parse(id)?),
        })
    }

    pub async fn execute(self, config: &StorefrontConfig, json: bool) -> Result<()> {
        let api = HttpProductApi::from_config(&config.api)?;
        let viewer = Viewer::from_token(config.api.token.as_deref());
        let layout = self.layout(config)?;
        let ctx = RequestContext::new();
        info!(
            request_id = %ctx.request_id,
            base_url = api.base_url(),
            ?viewer,
            sections = layout.len(),
            "previewing page"
        );

        let mut page = RecommendationPage::new(Arc::new(api), viewer);
        page.navigate(layout);
        let outcomes = page.settle().await;
        log_outcomes(&ctx, &outcomes);

        let term = Term::stdout();
        output::print_round(&term, 0, &page.render(), json)?;

        for round in 1..=self.rotations() {
            let mut rotated_any = false;
            for section in page.sections() {
                rotated_any |= section.rotate();
            }
            if !rotated_any {
                debug!(round, "nothing left to rotate");
                break;
            }
            output::print_round(&term, round, &page.render(), json)?;
        }

        Ok(())
    }
}

fn log_outcomes(ctx: &RequestContext, outcomes: &[FetchOutcome]) {
    let ready = outcomes
        .iter()
        .filter(|o| matches!(o, FetchOutcome::Ready { .. }))
        .count();
    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, FetchOutcome::Failed { .. }))
        .count();
    info!(
        request_id = %ctx.request_id,
        elapsed_ms = ctx.elapsed_ms(),
        total = outcomes.len(),
        ready,
        failed,
        "page settled"
    );
}
