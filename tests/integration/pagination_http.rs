//! Integration tests for cursor pagination over HTTP.
//!
//! Starts the server in-process and drives `GET /tasks` with reqwest to
//! check the lookahead-by-one contract, token chaining and error mapping.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;

use tasksync_proto::cursor;
use tasksync_proto::task::{CreateTaskRequest, ErrorBody, ListTasksResponse, RecordId, TaskResponse};
use tasksync_server::server::start_server;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn spawn() -> (SocketAddr, reqwest::Client) {
    let (addr, _handle) = start_server("127.0.0.1:0").await.unwrap();
    (addr, reqwest::Client::new())
}

async fn seed(client: &reqwest::Client, addr: SocketAddr, count: usize) -> Vec<TaskResponse> {
    let mut created = Vec::with_capacity(count);
    for i in 0..count {
        let resp: TaskResponse = client
            .post(format!("http://{addr}/tasks"))
            .json(&CreateTaskRequest {
                text: format!("task {i}"),
            })
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        created.push(resp);
    }
    created
}

async fn list(
    client: &reqwest::Client,
    addr: SocketAddr,
    page_size: u32,
    token: Option<&str>,
) -> reqwest::Response {
    let mut query = vec![("pageSize", page_size.to_string())];
    if let Some(token) = token {
        query.push(("pageToken", token.to_string()));
    }
    client
        .get(format!("http://{addr}/tasks"))
        .query(&query)
        .send()
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_collection_returns_empty_last_page() {
    let (addr, client) = spawn().await;
    let body: serde_json::Value = client
        .get(format!("http://{addr}/tasks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, serde_json::json!({"items": [], "nextPageToken": null}));
}

#[tokio::test]
async fn n_plus_one_records_give_n_items_and_a_token() {
    let (addr, client) = spawn().await;
    seed(&client, addr, 4).await;

    let page: ListTasksResponse = list(&client, addr, 3, None).await.json().await.unwrap();
    assert_eq!(page.items.len(), 3);
    let ids: Vec<u64> = page.items.iter().map(|t| t.id.get()).collect();
    assert_eq!(ids, vec![4, 3, 2]);
    assert_eq!(page.next_page_token, Some(cursor::encode(RecordId::new(1))));
}

#[tokio::test]
async fn exactly_n_records_give_no_token() {
    let (addr, client) = spawn().await;
    seed(&client, addr, 3).await;

    let page: ListTasksResponse = list(&client, addr, 3, None).await.json().await.unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.next_page_token, None);
}

#[tokio::test]
async fn chained_tokens_cover_collection_without_overlap() {
    let (addr, client) = spawn().await;
    let created = seed(&client, addr, 8).await;

    let mut seen = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page: ListTasksResponse = list(&client, addr, 3, token.as_deref())
            .await
            .json()
            .await
            .unwrap();
        seen.extend(page.items.into_iter().map(|t| t.id));
        match page.next_page_token {
            Some(next) => token = Some(next.as_str().to_string()),
            None => break,
        }
    }

    let mut expected: Vec<RecordId> = created.iter().map(|r| r.item.id).collect();
    expected.reverse();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn malformed_token_is_validation_error() {
    let (addr, client) = spawn().await;
    let resp = list(&client, addr, 3, Some("not*a*token")).await;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.code, "VALIDATION_ERROR");
    assert!(body.message.starts_with("pageToken"), "got: {}", body.message);
}

#[tokio::test]
async fn oversized_page_is_validation_error() {
    let (addr, client) = spawn().await;
    let resp = list(&client, addr, 1000, None).await;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: ErrorBody = resp.json().await.unwrap();
    assert!(body.message.starts_with("pageSize"), "got: {}", body.message);
}

#[tokio::test]
async fn non_numeric_page_size_is_400() {
    let (addr, client) = spawn().await;
    let resp = client
        .get(format!("http://{addr}/tasks?pageSize=lots"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_id_is_404() {
    let (addr, client) = spawn().await;
    let resp = client
        .delete(format!("http://{addr}/tasks/{}", RecordId::new(99)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    let body: ErrorBody = resp.json().await.unwrap();
    assert_eq!(body.code, "NOT_FOUND");
}
