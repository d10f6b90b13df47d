// Path: crates/lcd/tests/http_fetcher.rs
//! Exercises the `reqwest` fetcher against a local axum server that mimics the
//! governance endpoints of a Cosmos SDK LCD.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::get,
    Router,
};
use govwatch_lcd::{EndpointResolver, HttpFetcher, LcdClient, ReqwestFetcher};
use govwatch_types::error::{FetchError, WatchError};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

const VOTER: &str = "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";

async fn proposals(Query(q): Query<HashMap<String, String>>) -> (StatusCode, String) {
    if q.get("proposal_status").map(String::as_str) != Some("2") {
        return (StatusCode::BAD_REQUEST, "missing status filter".into());
    }
    (
        StatusCode::OK,
        r#"{"proposals": [{"proposal_id": "42", "status": "PROPOSAL_STATUS_VOTING_PERIOD",
            "voting_end_time": "2026-10-16T08:00:00Z"}], "pagination": {"next_key": null}}"#
            .into(),
    )
}

async fn vote(Path((id, voter)): Path<(String, String)>) -> (StatusCode, String) {
    if id == "42" && voter == VOTER {
        (StatusCode::NOT_FOUND, r#"{"code": 5, "message": "not found"}"#.into())
    } else {
        (
            StatusCode::OK,
            r#"{"vote": {"options": [{"option": "VOTE_OPTION_NO", "weight": "1"}]}}"#.into(),
        )
    }
}

async fn spawn_lcd() -> SocketAddr {
    let app = Router::new()
        .route("/cosmos/base/tendermint/v1beta1/node_info", get(|| async { "{}" }))
        .route("/cosmos/gov/v1beta1/proposals", get(proposals))
        .route("/cosmos/gov/v1beta1/proposals/:id/votes/:voter", get(vote))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(base: &str, fetcher: Arc<dyn HttpFetcher>) -> LcdClient {
    let mut configured = BTreeMap::new();
    configured.insert(
        "localnet".to_string(),
        vec![base.to_string(), "http://127.0.0.1:1".to_string()],
    );
    LcdClient::new(
        fetcher.clone(),
        EndpointResolver::new(fetcher, configured, None),
    )
}

#[tokio::test]
async fn test_end_to_end_lookups() {
    let addr = spawn_lcd().await;
    let base = format!("http://{addr}");
    let fetcher: Arc<dyn HttpFetcher> = Arc::new(
        ReqwestFetcher::new(Duration::from_secs(2), Duration::from_millis(500)).unwrap(),
    );
    let client = client_for(&base, fetcher);

    let healthy = client.healthy_endpoints("localnet").await;
    assert_eq!(healthy, vec![base.clone()]);

    let proposals = client.active_proposals(&base).await.unwrap();
    assert_eq!(proposals.len(), 1);
    assert_eq!(proposals[0].id, "42");
    assert!(proposals[0].is_voting());

    let absent = client.vote(&base, "42", VOTER).await.unwrap();
    assert!(!absent.has_voted());

    let cast = client.vote(&base, "43", VOTER).await.unwrap();
    assert_eq!(cast.option.as_deref(), Some("VOTE_OPTION_NO"));
}

#[tokio::test]
async fn test_request_timeout_is_reported() {
    let addr = spawn_lcd().await;
    let base = format!("http://{addr}");
    let fetcher =
        ReqwestFetcher::new(Duration::from_millis(200), Duration::from_millis(200)).unwrap();

    let err = fetcher.fetch(&base, "/slow", &[]).await.unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_non_success_status_is_surfaced() {
    let addr = spawn_lcd().await;
    let base = format!("http://{addr}");
    let fetcher =
        ReqwestFetcher::new(Duration::from_secs(2), Duration::from_millis(500)).unwrap();

    let resp = fetcher
        .fetch(&base, "/cosmos/gov/v1beta1/proposals", &[])
        .await
        .unwrap();
    assert_eq!(resp.status, 400);

    let client = client_for(&base, Arc::new(fetcher));
    let missing = client.active_proposals(&format!("{base}/nope")).await;
    assert!(matches!(
        missing,
        Err(WatchError::Fetch(FetchError::Status { status: 404, .. }))
    ));
}
