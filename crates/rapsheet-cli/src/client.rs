//! Async HTTP client wrapping the rapsheet JSON API.
//!
//! [`ApiClient`] implements [`RecordStore`], so the core synchronizer drives
//! the remote server exactly as it would a local backend.

use std::time::Duration;

use rapsheet_core::{
  record::{NewRecord, Record},
  store::RecordStore,
};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;

use crate::sse::SseFeed;

/// Connection settings for the rapsheet API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
  #[error("{0}")]
  Core(#[from] rapsheet_core::Error),

  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("server returned {status}: {message}")]
  Status { status: StatusCode, message: String },

  #[error("invalid server URL: {0}")]
  InvalidUrl(String),
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Shape of the server's JSON error bodies.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// Async HTTP client for the rapsheet JSON REST API.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  /// No overall timeout: change streams stay open indefinitely.
  stream: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let stream = Client::builder()
      .connect_timeout(Duration::from_secs(10))
      .build()?;
    Ok(Self { client, stream, config })
  }

  pub fn base_url(&self) -> &str { &self.config.base_url }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  /// `/api/records/{identifier}` with the identifier percent-encoded as a
  /// single path segment.
  fn record_url(&self, identifier: &str) -> Result<Url> {
    let mut url = Url::parse(&self.url("/records"))
      .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
    url
      .path_segments_mut()
      .map_err(|()| ClientError::InvalidUrl(self.config.base_url.clone()))?
      .push(identifier);
    Ok(url)
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }
}

/// Pass successful responses through; turn the rest into
/// [`ClientError::Status`] carrying the server's error message.
async fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = match resp.json::<ErrorBody>().await {
    Ok(body) => body.error,
    Err(_) => status.canonical_reason().unwrap_or("request failed").to_owned(),
  };
  Err(ClientError::Status { status, message })
}

// ─── RecordStore impl ─────────────────────────────────────────────────────────

impl RecordStore for ApiClient {
  type Error = ClientError;
  type Feed = SseFeed;

  /// `GET /api/records`
  async fn list_records(&self) -> Result<Vec<Record>> {
    let resp = self.auth(self.client.get(self.url("/records"))).send().await?;
    Ok(check(resp).await?.json().await?)
  }

  /// `GET /api/records/{id}`
  async fn get_record(&self, identifier: &str) -> Result<Option<Record>> {
    let url = self.record_url(identifier)?;
    let resp = self.auth(self.client.get(url)).send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Ok(Some(check(resp).await?.json().await?))
  }

  /// `POST /api/records`
  async fn insert_record(&self, input: NewRecord) -> Result<Record> {
    let resp = self
      .auth(self.client.post(self.url("/records")))
      .json(&input)
      .send()
      .await?;
    match check(resp).await {
      Ok(resp) => Ok(resp.json().await?),
      Err(ClientError::Status { status, .. }) if status == StatusCode::CONFLICT => Err(
        rapsheet_core::Error::DuplicateIdentifier(input.identifier).into(),
      ),
      Err(e) => Err(e),
    }
  }

  /// `GET /api/changes?table=<table>`
  async fn subscribe_to_table_changes(&self, table: &str) -> Result<SseFeed> {
    let resp = self
      .auth(self.stream.get(self.url("/changes")))
      .query(&[("table", table)])
      .send()
      .await?;
    Ok(SseFeed::new(check(resp).await?, table))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  };

  use rapsheet_core::{
    record::Status,
    store::{ChangeFeed, ChangeKind, RECORDS_TABLE},
    sync::Synchronizer,
  };
  use rapsheet_store_sqlite::SqliteStore;
  use tokio::net::TcpListener;

  use super::*;

  /// Serve the real API over loopback and return a client pointed at it.
  async fn serve() -> ApiClient {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let app = axum::Router::new().nest("/api", rapsheet_api::api_router(store));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    ApiClient::new(ApiConfig {
      base_url: format!("http://{addr}"),
      username: String::new(),
      password: String::new(),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn insert_then_list_and_get() {
    let client = serve().await;
    client
      .insert_record(NewRecord::new("A1", "Jane", "Doe", Status::Wanted))
      .await
      .unwrap();

    let all = client.list_records().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].identifier, "A1");
    assert!(client.get_record("A1").await.unwrap().is_some());
    assert!(client.get_record("nope").await.unwrap().is_none());
  }

  #[test]
  fn record_url_encodes_identifier_as_one_segment() {
    let client = ApiClient::new(ApiConfig {
      base_url: "http://localhost:8080/".into(),
      username: String::new(),
      password: String::new(),
    })
    .unwrap();
    assert_eq!(
      client.record_url("a/b?c#d").unwrap().as_str(),
      "http://localhost:8080/api/records/a%2Fb%3Fc%23d"
    );
  }

  #[tokio::test]
  async fn get_with_reserved_characters_does_not_match_other_records() {
    let client = serve().await;
    client
      .insert_record(NewRecord::new("A1", "Jane", "Doe", Status::Wanted))
      .await
      .unwrap();

    assert!(client.get_record("A1#x").await.unwrap().is_none());
    assert!(client.get_record("A1?x=1").await.unwrap().is_none());
    assert!(client.get_record("A1/status").await.unwrap().is_none());
  }

  #[tokio::test]
  async fn duplicate_insert_maps_to_core_error() {
    let client = serve().await;
    let input = NewRecord::new("A1", "Jane", "Doe", Status::Wanted);
    client.insert_record(input.clone()).await.unwrap();

    let err = client.insert_record(input).await.unwrap_err();
    assert!(matches!(
      err,
      ClientError::Core(rapsheet_core::Error::DuplicateIdentifier(_))
    ));
  }

  #[tokio::test]
  async fn validation_failure_carries_server_message() {
    let client = serve().await;
    let err = client
      .insert_record(NewRecord::new("A1", "Jane", "", Status::Wanted))
      .await
      .unwrap_err();
    match err {
      ClientError::Status { status, message } => {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("last_name"), "{message}");
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn change_feed_reports_inserts() {
    let client = serve().await;
    let mut feed = client.subscribe_to_table_changes(RECORDS_TABLE).await.unwrap();

    client
      .insert_record(NewRecord::new("A1", "Jane", "Doe", Status::Wanted))
      .await
      .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(5), feed.next())
      .await
      .expect("event in time")
      .expect("feed open");
    assert_eq!(event.kind, ChangeKind::Insert);
    assert_eq!(event.table, RECORDS_TABLE);
  }

  #[tokio::test]
  async fn synchronizer_follows_remote_changes() {
    let client = serve().await;
    let writer = client.clone();
    let sync = Arc::new(Synchronizer::new(Arc::new(client)));
    sync.refresh().await.unwrap();

    let applied = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&applied);
    let sub = sync
      .subscribe(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
      })
      .await
      .unwrap();
    let mut rx = sync.watch();

    writer
      .insert_record(NewRecord::new("A1", "Jane", "Doe", Status::Wanted))
      .await
      .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
      while rx.borrow_and_update().records.is_empty() {
        rx.changed().await.unwrap();
      }
      while applied.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
      }
    })
    .await
    .expect("base list updated");
    assert_eq!(sync.snapshot().records[0].identifier, "A1");

    sync.unsubscribe(sub).await;
  }
}
