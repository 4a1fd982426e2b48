use catalog::{CatalogResult, ListQuery, Product, ProductApi, ProductId};
use serde::{Deserialize, Serialize};

/// Whether the current viewer is signed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Viewer {
    #[default]
    Anonymous,
    Authenticated,
}

impl Viewer {
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some(t) if !t.is_empty() => Viewer::Authenticated,
            _ => Viewer::Anonymous,
        }
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, Viewer::Authenticated)
    }
}

/// Which ranked list a section shows
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SectionKind {
    Popular,
    Personalized,
    Related { product_id: ProductId },
}

impl SectionKind {
    pub fn related(product_id: impl Into<ProductId>) -> Self {
        SectionKind::Related {
            product_id: product_id.into(),
        }
    }

    /// Claim key used when a section is mounted without an explicit id
    pub fn type_name(&self) -> &'static str {
        match self {
            SectionKind::Popular => "popular",
            SectionKind::Personalized => "personalized",
            SectionKind::Related { .. } => "related",
        }
    }

    /// Resolve the backend call for this kind and viewer
    pub fn plan(&self, viewer: Viewer) -> FetchPlan {
        match self {
            SectionKind::Popular => FetchPlan::Recommended,
            SectionKind::Personalized if viewer.is_authenticated() => FetchPlan::Personalized,
            // anonymous viewers get the popular list instead
            SectionKind::Personalized => FetchPlan::Recommended,
            SectionKind::Related { product_id } => FetchPlan::Related(product_id.clone()),
        }
    }

    pub fn description(&self, viewer: Viewer) -> &'static str {
        match self {
            SectionKind::Personalized if viewer.is_authenticated() => {
                "Picked for you from your browsing and purchase history"
            }
            SectionKind::Personalized => "Sign in to see personalized picks",
            SectionKind::Related { .. } => "Similar alternatives to this product",
            SectionKind::Popular => "The most popular products right now",
        }
    }
}

/// A concrete backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchPlan {
    Recommended,
    Personalized,
    Related(ProductId),
}

impl FetchPlan {
    pub async fn execute(
        &self,
        api: &dyn ProductApi,
        query: ListQuery,
    ) -> CatalogResult<Vec<Product>> {
        match self {
            FetchPlan::Recommended => api.recommended(query).await,
            FetchPlan::Personalized => api.personalized(query).await,
            FetchPlan::Related(product_id) => api.related(product_id, query).await,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            FetchPlan::Recommended => "recommended",
            FetchPlan::Personalized => "personalized",
            FetchPlan::Related(_) => "related",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::MockProductApi;

    #[test]
    fn test_personalized_falls_back_for_anonymous() {
        let kind = SectionKind::Personalized;
        assert_eq!(kind.plan(Viewer::Anonymous), FetchPlan::Recommended);
        assert_eq!(kind.plan(Viewer::Authenticated), FetchPlan::Personalized);
    }

    #[test]
    fn test_popular_and_related_ignore_viewer() {
        assert_eq!(SectionKind::Popular.plan(Viewer::Authenticated), FetchPlan::Recommended);
        assert_eq!(
            SectionKind::related("p1").plan(Viewer::Anonymous),
            FetchPlan::Related(ProductId::new("p1"))
        );
    }

    #[test]
    fn test_type_names() {
        assert_eq!(SectionKind::Popular.type_name(), "popular");
        assert_eq!(SectionKind::Personalized.type_name(), "personalized");
        assert_eq!(SectionKind::related("x").type_name(), "related");
    }

    #[test]
    fn test_kind_serde_shape() {
        let json = serde_json::to_value(SectionKind::related("p9")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "related", "product_id": "p9"}));

        let kind: SectionKind = serde_json::from_str(r#"{"type": "popular"}"#).unwrap();
        assert_eq!(kind, SectionKind::Popular);
    }

    #[test]
    fn test_viewer_from_token() {
        assert_eq!(Viewer::from_token(None), Viewer::Anonymous);
        assert_eq!(Viewer::from_token(Some("")), Viewer::Anonymous);
        assert_eq!(Viewer::from_token(Some("jwt")), Viewer::Authenticated);
    }

    #[tokio::test]
    async fn test_execute_dispatches_related() {
        let mut api = MockProductApi::new();
        api.expect_related()
            .withf(|id, query| id.as_str() == "p1" && query.limit == 4)
            .times(1)
            .returning(|_, _| Ok(vec![Product::new("p2", "Teapot")]));

        let products = FetchPlan::Related(ProductId::new("p1"))
            .execute(&api, ListQuery::new(4))
            .await
            .unwrap();
        assert_eq!(products[0].id.as_str(), "p2");
    }
}
