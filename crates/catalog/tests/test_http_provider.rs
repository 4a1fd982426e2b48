use catalog::{CatalogError, HttpProductApi, ListQuery, NetworkError, ProductApi, ProductId};
use mockito::{Matcher, Server};
use std::time::Duration;

fn products_body(ids: &[&str]) -> String {
    let items: Vec<String> = ids
        .iter()
        .map(|id| format!(r#"{{"_id": "{id}", "name": "Product {id}", "price": 9.99}}"#))
        .collect();
    format!(r#"{{"success": true, "data": [{}]}}"#, items.join(","))
}

fn api_for(server: &Server) -> HttpProductApi {
    HttpProductApi::new(server.url(), Duration::from_secs(5)).expect("client should build")
}

#[tokio::test]
async fn test_recommended_sends_limit_and_parses_products() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/products/recommendations")
        .match_query(Matcher::UrlEncoded("limit".into(), "4".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(products_body(&["p1", "p2", "p3"]))
        .create_async()
        .await;

    let products = api_for(&server)
        .recommended(ListQuery::new(4))
        .await
        .expect("request should succeed");

    mock.assert_async().await;
    let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
    assert_eq!(products[0].price, Some(9.99));
}

#[tokio::test]
async fn test_personalized_sends_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/products/recommendations/personalized")
        .match_query(Matcher::UrlEncoded("limit".into(), "8".into()))
        .match_header("authorization", "Bearer t0ken")
        .with_status(200)
        .with_body(products_body(&["p9"]))
        .create_async()
        .await;

    let products = api_for(&server)
        .with_token("t0ken")
        .personalized(ListQuery::new(8))
        .await
        .expect("request should succeed");

    mock.assert_async().await;
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn test_related_uses_product_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/products/64b7f0c2a1/related")
        .match_query(Matcher::UrlEncoded("limit".into(), "8".into()))
        .with_status(200)
        .with_body(products_body(&["r1", "r2"]))
        .create_async()
        .await;

    let products = api_for(&server)
        .related(&ProductId::new("64b7f0c2a1"), ListQuery::new(8))
        .await
        .expect("request should succeed");

    mock.assert_async().await;
    assert_eq!(products.len(), 2);
}

#[tokio::test]
async fn test_unsuccessful_envelope_is_rejected() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/products/recommendations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"success": false, "error": "no recommendations"}"#)
        .create_async()
        .await;

    let err = api_for(&server)
        .recommended(ListQuery::new(4))
        .await
        .unwrap_err();

    match err {
        CatalogError::Rejected { message } => assert_eq!(message, "no recommendations"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_carries_envelope_message() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/products/p1/related")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"success": false, "error": "related lookup failed", "message": "cast error"}"#)
        .create_async()
        .await;

    let err = api_for(&server)
        .related(&ProductId::new("p1"), ListQuery::new(4))
        .await
        .unwrap_err();

    match err {
        CatalogError::Network(NetworkError::Http { code, message }) => {
            assert_eq!(code, 500);
            assert_eq!(message, "related lookup failed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_status_maps_to_unauthenticated() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/products/recommendations/personalized")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(r#"{"success": false, "error": "login required"}"#)
        .create_async()
        .await;

    let err = api_for(&server)
        .with_token("expired")
        .personalized(ListQuery::new(4))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Unauthenticated));
}

#[tokio::test]
async fn test_garbage_body_is_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/products/recommendations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let err = api_for(&server)
        .recommended(ListQuery::new(4))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Decode(_)));
}
