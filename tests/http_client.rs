//! Integration tests for the HTTP catalog client and the reconciler running
//! on top of it, against a mock catalog API.
//!
//! ```bash
//! cargo test --test http_client -- --nocapture
//! ```

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pokedex::catalog::{
    CatalogClient, CatalogError, HttpCatalogClient, PageLimit, QueryParams, Reconciler,
    ReconcilerStatus, SortOrder,
};

fn item(id: u64) -> Value {
    json!({
        "id": id,
        "number": id,
        "name": format!("Mon{id}"),
        "type_one": "Fire",
        "type_two": null,
        "total": 300,
        "hit_points": 50,
        "attack": 50,
        "defense": 50,
        "special_attack": 50,
        "special_defense": 50,
        "speed": 50,
        "generation": 1,
        "legendary": false,
        "captured": id == 2,
        "imageUrl": format!("https://img.example/{id}.jpg")
    })
}

fn page_body(page: u32, total_pages: u32, limit: u32) -> Value {
    let start = u64::from((page - 1) * limit) + 1;
    let data: Vec<Value> = (start..start + u64::from(limit)).map(item).collect();
    json!({
        "success": true,
        "data": data,
        "pagination": {
            "total": total_pages * limit,
            "page": page,
            "limit": limit,
            "totalPages": total_pages,
            "hasNext": page < total_pages,
            "hasPrev": page > 1,
            "capturedCount": 1
        },
        "filters": { "sort": "asc", "type": null, "search": null }
    })
}

fn client(server: &MockServer) -> HttpCatalogClient {
    HttpCatalogClient::new(format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap()
}

async fn mount_page(server: &MockServer, page: u32, total_pages: u32, limit: u32) {
    Mock::given(method("GET"))
        .and(path("/api/pokemon"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(page, total_pages, limit)))
        .mount(server)
        .await;
}

// ============================================================================
// Client
// ============================================================================

#[tokio::test]
async fn test_fetch_page_sends_filter_and_decodes_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pokemon"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "5"))
        .and(query_param("sort", "desc"))
        .and(query_param("type", "Fire"))
        .and(query_param("search", "char"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(2, 3, 5)))
        .expect(1)
        .mount(&server)
        .await;

    let params = QueryParams {
        page: 2,
        limit: PageLimit::Five,
        sort: SortOrder::Desc,
        category: Some("Fire".to_string()),
        search: "char".to_string(),
    };
    let page = client(&server).fetch_page(&params).await.unwrap();

    assert_eq!(page.items.len(), 5);
    assert_eq!(page.items[0].id, 6);
    assert_eq!(page.metadata.page, 2);
    assert_eq!(page.metadata.total_pages, 3);
    assert!(page.metadata.has_next);
    assert_eq!(page.metadata.captured_count, 1);
}

#[tokio::test]
async fn test_out_of_range_page_reports_max_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pokemon"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": "Invalid page. Max page allowed is 4 for limit 10.",
            "maxPage": 4
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_page(&QueryParams::default().with_page(9))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Upstream { status: 400, .. }));
    assert_eq!(err.max_page(), Some(4));
    assert_eq!(
        err.display_message(),
        "Invalid page. Max page allowed is 4 for limit 10."
    );
}

#[tokio::test]
async fn test_unstructured_failure_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pokemon"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = client(&server)
        .fetch_page(&QueryParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Http { status: 500 }));
    assert_eq!(err.max_page(), None);
}

#[tokio::test]
async fn test_fetch_categories() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pokemon/types"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "types": ["Fire", "Grass", "Water"]
        })))
        .mount(&server)
        .await;

    let types = client(&server).fetch_categories().await.unwrap();
    assert_eq!(types, vec!["Fire", "Grass", "Water"]);
}

#[tokio::test]
async fn test_capture_and_release_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pokemon/7/capture"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Pokemon captured",
            "captured": true
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/pokemon/7/release"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Pokemon released",
            "captured": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    assert!(client.set_captured(7, true).await.unwrap().captured);
    assert!(!client.set_captured(7, false).await.unwrap().captured);
}

#[tokio::test]
async fn test_capture_of_unknown_item() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pokemon/999/capture"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": "Pokemon not found"
        })))
        .mount(&server)
        .await;

    let err = client(&server).set_captured(999, true).await.unwrap_err();
    assert_eq!(err.display_message(), "Pokemon not found");
}

#[tokio::test]
async fn test_unreachable_api_is_transport_error() {
    // Bind then drop to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client =
        HttpCatalogClient::new(format!("http://127.0.0.1:{port}/api"), Duration::from_secs(2))
            .unwrap();

    let err = client.fetch_page(&QueryParams::default()).await.unwrap_err();
    assert!(matches!(err, CatalogError::Transport(_)));
}

// ============================================================================
// Reconciler over HTTP
// ============================================================================

#[tokio::test]
async fn test_deep_link_catches_up_every_page() {
    let server = MockServer::start().await;
    for page in 1..=3 {
        mount_page(&server, page, 4, 10).await;
    }

    let client = client(&server);
    let mut reconciler = Reconciler::new();
    assert!(reconciler.reconcile(&client, &QueryParams::default().with_page(3)).await);

    let ids: Vec<u64> = reconciler.items().iter().map(|i| i.id).collect();
    assert_eq!(ids, (1..=30).collect::<Vec<_>>());
    assert_eq!(reconciler.metadata().map(|m| m.page), Some(3));
    assert_eq!(reconciler.captured_count(), 1);
    assert_eq!(*reconciler.status(), ReconcilerStatus::Idle);
}

#[tokio::test]
async fn test_range_error_sets_bound_and_blocks_later_pages() {
    let server = MockServer::start().await;
    // Page 1 still claims ten pages; the set shrank since
    mount_page(&server, 1, 10, 10).await;
    Mock::given(method("GET"))
        .and(path("/api/pokemon"))
        .and(query_param("page", "6"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "success": false,
            "error": "Invalid page. Max page allowed is 4 for limit 10.",
            "maxPage": 4
        })))
        .expect(1)
        .mount(&server)
        .await;
    let client = client(&server);
    let mut reconciler = Reconciler::new();

    reconciler.reconcile(&client, &QueryParams::default()).await;
    assert_eq!(reconciler.upper_bound(), Some(10));

    reconciler.reconcile(&client, &QueryParams::default().with_page(6)).await;
    assert_eq!(reconciler.upper_bound(), Some(4));
    assert_eq!(reconciler.items().len(), 10);
    assert_eq!(
        reconciler.display_error().as_deref(),
        Some("Invalid page. Max page allowed is 4 for limit 10. (Try a page between 1 and 4)")
    );

    // Rejected locally, no second request for page 6
    assert!(!reconciler.reconcile(&client, &QueryParams::default().with_page(6)).await);
    assert!(reconciler.items().is_empty());
    assert_eq!(
        reconciler.display_error().as_deref(),
        Some("Page number exceeds available data. (Try a page between 1 and 4)")
    );

    reconciler.reconcile(&client, &QueryParams::default()).await;
    assert_eq!(reconciler.items().len(), 10);
    assert!(reconciler.error().is_none());
}

#[tokio::test]
async fn test_capture_through_reconciler() {
    let server = MockServer::start().await;
    mount_page(&server, 1, 1, 10).await;
    Mock::given(method("POST"))
        .and(path("/api/pokemon/4/capture"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Pokemon captured",
            "captured": true
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let mut reconciler = Reconciler::new();
    reconciler.reconcile(&client, &QueryParams::default()).await;
    assert_eq!(reconciler.captured_count(), 1);

    assert!(reconciler.set_captured(&client, 4, true).await);
    assert!(reconciler.item(4).unwrap().captured);
    assert_eq!(reconciler.captured_count(), 2);
    assert!(!reconciler.is_updating(4));
}
