//! Integration tests for the HTTP clients against in-process stub providers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use downstream::{
    Backoff, DownstreamError, Failure, MovieInfoClient, RetryPolicy, ReviewsClient, Service,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

const MOVIE_INFO_JSON: &str = r#"{
    "movieInfoId": "abc",
    "name": "Batman Begins",
    "year": 2005,
    "cast": ["Christian Bale", "Michael Cane"],
    "release_date": "2005-06-15"
}"#;

const REVIEWS_JSON: &str = r#"[
    {"reviewId": "1", "movieInfoId": "abc", "comment": "Awesome Movie", "rating": 9.0},
    {"reviewId": "2", "movieInfoId": "abc", "comment": "Excellent Movie", "rating": 8.0}
]"#;

// ============================================================================
// Test Fixtures
// ============================================================================

/// Serve `router` on a random local port.
async fn start_stub(router: Router) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub provider");
    let addr = listener.local_addr().expect("Failed to get local address");

    let handle = tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Stub provider failed");
    });

    (format!("http://{}", addr), handle)
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(4, Backoff::Fixed(Duration::from_millis(5))).with_jitter(false)
}

fn movie_info_client(base: &str) -> MovieInfoClient {
    let url = Url::parse(&format!("{}/v1/movieinfo", base)).unwrap();
    MovieInfoClient::new(reqwest::Client::new(), url, fast_retry()).unwrap()
}

fn reviews_client(base: &str) -> ReviewsClient {
    let url = Url::parse(&format!("{}/v1/reviews", base)).unwrap();
    ReviewsClient::new(reqwest::Client::new(), url, fast_retry()).unwrap()
}

/// Movie-info route answering `status`/`body` every time and counting hits.
fn movie_info_stub(status: StatusCode, body: &'static str, hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/v1/movieinfo/:id",
        get(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (status, [(header::CONTENT_TYPE, "application/json")], body)
            }
        }),
    )
}

/// Reviews route that only answers for `movieInfoId=abc`.
fn reviews_stub(status: StatusCode, body: &'static str, hits: Arc<AtomicUsize>) -> Router {
    Router::new().route(
        "/v1/reviews",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                if params.get("movieInfoId").map(String::as_str) != Some("abc") {
                    return (StatusCode::BAD_REQUEST, "missing movieInfoId").into_response();
                }
                (status, body).into_response()
            }
        }),
    )
}

// ============================================================================
// MovieInfo client
// ============================================================================

#[tokio::test]
async fn test_movie_info_success() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base, handle) = start_stub(movie_info_stub(StatusCode::OK, MOVIE_INFO_JSON, hits.clone())).await;

    let info = movie_info_client(&base).fetch("abc").await.expect("fetch failed");

    assert_eq!(info.name, "Batman Begins");
    assert_eq!(info.cast.len(), 2);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test]
async fn test_movie_info_404_is_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base, handle) = start_stub(movie_info_stub(StatusCode::NOT_FOUND, "", hits.clone())).await;

    let err = movie_info_client(&base).fetch("abc").await.unwrap_err();

    assert_eq!(
        err,
        DownstreamError::NotFound {
            service: Service::MovieInfo,
            id: "abc".to_string()
        }
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test]
async fn test_movie_info_5xx_retries_four_times_and_passes_body_through() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base, handle) = start_stub(movie_info_stub(
        StatusCode::INTERNAL_SERVER_ERROR,
        "MovieInfo Service Unavailable",
        hits.clone(),
    ))
    .await;

    let err = movie_info_client(&base).fetch("abc").await.unwrap_err();

    assert_eq!(hits.load(Ordering::SeqCst), 4, "1 initial call + 3 retries");
    assert_eq!(err.to_string(), "MovieInfo Service Unavailable");
    assert_eq!(err.passthrough_body(), Some("MovieInfo Service Unavailable"));

    handle.abort();
}

#[tokio::test]
async fn test_movie_info_recovers_after_transient_5xx() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/v1/movieinfo/:id",
        get(move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    (StatusCode::SERVICE_UNAVAILABLE, "warming up")
                } else {
                    (StatusCode::OK, MOVIE_INFO_JSON)
                }
            }
        }),
    );
    let (base, handle) = start_stub(router).await;

    let info = movie_info_client(&base).fetch("abc").await.expect("should recover");

    assert_eq!(info.movie_info_id.as_deref(), Some("abc"));
    assert_eq!(hits.load(Ordering::SeqCst), 3);

    handle.abort();
}

#[tokio::test]
async fn test_movie_info_malformed_payload_is_terminal() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base, handle) = start_stub(movie_info_stub(StatusCode::OK, r#"{"name": 42}"#, hits.clone())).await;

    let err = movie_info_client(&base).fetch("abc").await.unwrap_err();

    assert!(matches!(err, DownstreamError::Malformed { service: Service::MovieInfo, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test]
async fn test_movie_info_invalid_payload_is_malformed() {
    let hits = Arc::new(AtomicUsize::new(0));
    let body = r#"{"name": "Nameless", "year": 2005, "cast": [], "release_date": "2005-06-15"}"#;
    let (base, handle) = start_stub(movie_info_stub(StatusCode::OK, body, hits.clone())).await;

    let err = movie_info_client(&base).fetch("abc").await.unwrap_err();

    assert!(err.to_string().contains("cast"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test]
async fn test_movie_info_client_error_is_rejected() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base, handle) = start_stub(movie_info_stub(StatusCode::BAD_REQUEST, "bad id", hits.clone())).await;

    let err = movie_info_client(&base).fetch("abc").await.unwrap_err();

    assert_eq!(
        err,
        DownstreamError::Rejected {
            service: Service::MovieInfo,
            status: 400,
            body: "bad id".to_string()
        }
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test]
async fn test_connection_refused_is_retried_then_exhausted() {
    // Grab a free port, then release it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = movie_info_client(&format!("http://{}", addr))
        .fetch("abc")
        .await
        .unwrap_err();

    match err {
        DownstreamError::Exhausted {
            service,
            attempts,
            last: Failure::Transport(_),
        } => {
            assert_eq!(service, Service::MovieInfo);
            assert_eq!(attempts, 4);
        }
        other => panic!("expected exhausted transport failure, got {other:?}"),
    }
}

// ============================================================================
// Reviews client
// ============================================================================

#[tokio::test]
async fn test_reviews_success_keeps_provider_order() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base, handle) = start_stub(reviews_stub(StatusCode::OK, REVIEWS_JSON, hits.clone())).await;

    let reviews = reviews_client(&base).fetch("abc").await.expect("fetch failed");

    let comments: Vec<_> = reviews.iter().map(|r| r.comment.as_str()).collect();
    assert_eq!(comments, vec!["Awesome Movie", "Excellent Movie"]);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test]
async fn test_reviews_empty_list_is_success() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base, handle) = start_stub(reviews_stub(StatusCode::OK, "[]", hits.clone())).await;

    let reviews = reviews_client(&base).fetch("abc").await.expect("fetch failed");
    assert!(reviews.is_empty());

    handle.abort();
}

#[tokio::test]
async fn test_reviews_without_movie_info_id_are_kept() {
    let hits = Arc::new(AtomicUsize::new(0));
    let body = r#"[
        {"reviewId": "1", "movieInfoId": null, "comment": "Orphaned", "rating": 6.0},
        {"reviewId": "2", "movieInfoId": "abc", "comment": "Linked", "rating": 8.0}
    ]"#;
    let (base, handle) = start_stub(reviews_stub(StatusCode::OK, body, hits.clone())).await;

    let reviews = reviews_client(&base).fetch("abc").await.expect("fetch failed");

    assert_eq!(reviews.len(), 2);
    assert!(reviews[0].movie_info_id.is_none());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test]
async fn test_reviews_404_resolves_to_empty_list() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base, handle) = start_stub(reviews_stub(StatusCode::NOT_FOUND, "", hits.clone())).await;

    let reviews = reviews_client(&base).fetch("abc").await.expect("404 is not an error");

    assert!(reviews.is_empty());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    handle.abort();
}

#[tokio::test]
async fn test_reviews_5xx_retries_four_times() {
    let hits = Arc::new(AtomicUsize::new(0));
    let (base, handle) = start_stub(reviews_stub(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Review Service Unavailable",
        hits.clone(),
    ))
    .await;

    let err = reviews_client(&base).fetch("abc").await.unwrap_err();

    assert_eq!(hits.load(Ordering::SeqCst), 4);
    assert_eq!(err.service(), Service::Reviews);
    assert_eq!(err.to_string(), "Review Service Unavailable");

    handle.abort();
}
