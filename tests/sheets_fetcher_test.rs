// Tests for SheetsFetcher against a mocked Sheets API
// Uses mockito for HTTP mocking

use mockito::{Matcher, Server};
use mrr_dashboard_service::cache::{DataSource, TtlCache};
use mrr_dashboard_service::fetch_error::FetchError;
use mrr_dashboard_service::fetcher::{SheetsFetcher, ValueRender};
use mrr_dashboard_service::metrics::{MetricField, MetricTable};
use mrr_dashboard_service::operational::OperationalSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const VALUES_PATH: &str = "/v4/spreadsheets/sheet123/values/DADOS";

const DASHBOARD_PAYLOAD: &str = r#"{
    "range": "DADOS!A1:D4",
    "majorDimension": "ROWS",
    "values": [
        ["Mes", "Receita Orcada", "Receita Realizada", "Essencial Realizado"],
        ["junho/2025", "R$ 900,00", "R$ 950,00", "8"],
        ["julho/2025", "R$ 1.000,00", "R$ 1.000,00", "10"],
        ["agosto/2025", "R$ 1.000,00", "R$ 1.200,00", "12"]
    ]
}"#;

// Helper to create a fetcher pointed at the mock server
fn create_test_fetcher(base_url: String) -> SheetsFetcher {
    SheetsFetcher::new("sheet123", "DADOS", ValueRender::Formatted)
        .with_base_url(base_url)
        .with_retries(2, Duration::from_millis(1))
}

#[tokio::test]
async fn test_fetch_grid_success() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", VALUES_PATH)
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("valueRenderOption".into(), "FORMATTED_VALUE".into()),
            Matcher::UrlEncoded("key".into(), "test-key".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(DASHBOARD_PAYLOAD)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url()).with_api_key(Some("test-key".to_string()));
    let table: MetricTable = DataSource::<MetricTable>::fetch(&fetcher).await.unwrap();

    assert_eq!(table.len(), 3);
    assert_eq!(
        table.month_labels(),
        vec!["junho/2025", "julho/2025", "agosto/2025"]
    );
    assert_eq!(table.total(MetricField::RevenueActual), 3150.0);
    assert_eq!(table.rows()[2].get(MetricField::EssencialActual), Some(12.0));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_sends_bearer_token() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", VALUES_PATH)
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer secret-token")
        .with_status(200)
        .with_body(DASHBOARD_PAYLOAD)
        .create_async()
        .await;

    let fetcher =
        create_test_fetcher(server.url()).with_access_token(Some("secret-token".to_string()));
    let grid = fetcher.fetch_grid().await.unwrap();

    assert_eq!(grid.rows.len(), 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_forbidden_is_not_retried() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", VALUES_PATH)
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body(r#"{"error": {"code": 403, "message": "The caller does not have permission"}}"#)
        .expect(1)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let result = fetcher.fetch_grid().await;

    match result.unwrap_err() {
        FetchError::Status { status, body } => {
            assert_eq!(status, 403);
            assert!(body.contains("permission"));
        }
        other => panic!("Expected Status error, got {other:?}"),
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_server_error_is_retried() {
    let mut server = Server::new_async().await;

    // One initial attempt plus two retries
    let mock = server
        .mock("GET", VALUES_PATH)
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(3)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let result = fetcher.fetch_grid().await;

    assert!(matches!(
        result,
        Err(FetchError::Status { status: 503, .. })
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_without_values_is_missing_header() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", VALUES_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"range": "DADOS!A1:Z1000", "majorDimension": "ROWS"}"#)
        .create_async()
        .await;

    let fetcher = create_test_fetcher(server.url());
    let result = fetcher.fetch_grid().await;

    assert!(matches!(result, Err(FetchError::MissingHeader)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_operational_sheet_uses_unformatted_values() {
    let mut server = Server::new_async().await;

    let mock = server
        .mock("GET", "/v4/spreadsheets/sheet123/values/OPERACIONAL")
        .match_query(Matcher::UrlEncoded(
            "valueRenderOption".into(),
            "UNFORMATTED_VALUE".into(),
        ))
        .with_status(200)
        .with_body(
            r#"{"values": [
                ["CTR Google Mes Atual", "CTR Google Mes Anterior", "CPR Meta Mes Atual", "CPR Meta Mes Anterior"],
                [0.054, 0.042, 22.5, 25]
            ]}"#,
        )
        .create_async()
        .await;

    let fetcher = SheetsFetcher::new("sheet123", "OPERACIONAL", ValueRender::Unformatted)
        .with_base_url(server.url());
    let snapshot: OperationalSnapshot =
        DataSource::<OperationalSnapshot>::fetch(&fetcher).await.unwrap();

    let google = snapshot.google.ctr_card();
    assert_eq!(google.value, "5,40%");
    assert_eq!(google.delta, "+1,20 p.p.");
    assert_eq!(snapshot.meta.cpr_card().delta, "R$ -2,50 (-10,0%)");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_cache_serves_empty_table_when_sheet_unavailable() {
    let mut server = Server::new_async().await;

    let failing = server
        .mock("GET", VALUES_PATH)
        .match_query(Matcher::Any)
        .with_status(404)
        .expect(2)
        .create_async()
        .await;

    let source: Arc<dyn DataSource<MetricTable>> = Arc::new(create_test_fetcher(server.url()));
    let cache = TtlCache::new(source, Duration::from_secs(600));

    // Failures are not cached, so the second access fetches again
    assert!(cache.get_or_refresh().await.is_empty());
    assert!(cache.get_or_refresh().await.is_empty());
    assert!(cache.loaded_at().await.is_none());

    failing.assert_async().await;
}

// Accepts connections and holds them open without ever writing a response
async fn spawn_silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_fetch_times_out_on_silent_server() {
    let base_url = spawn_silent_server().await;
    let fetcher = SheetsFetcher::new("sheet123", "DADOS", ValueRender::Formatted)
        .with_base_url(base_url)
        .with_retries(0, Duration::from_millis(1))
        .with_timeout(Duration::from_millis(200));

    let result = tokio::time::timeout(Duration::from_secs(5), fetcher.fetch_grid())
        .await
        .expect("fetch should give up before the outer bound");

    match result {
        Err(err @ FetchError::Request(_)) => assert!(err.is_transient()),
        other => panic!("Expected a request timeout, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_cache_releases_lock_after_silent_server() {
    let base_url = spawn_silent_server().await;
    let fetcher = SheetsFetcher::new("sheet123", "DADOS", ValueRender::Formatted)
        .with_base_url(base_url)
        .with_retries(1, Duration::from_millis(1))
        .with_timeout(Duration::from_millis(200));
    let source: Arc<dyn DataSource<MetricTable>> = Arc::new(fetcher);
    let cache = TtlCache::new(source, Duration::from_secs(600));

    let table = tokio::time::timeout(Duration::from_secs(5), cache.get_or_refresh())
        .await
        .expect("render should not block on a hung sheet");
    assert!(table.is_empty());

    tokio::time::timeout(Duration::from_secs(1), cache.invalidate())
        .await
        .expect("invalidate should not wait on a hung fetch");
    assert!(cache.loaded_at().await.is_none());
}
