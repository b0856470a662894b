//! HTTP surface over a group registry.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::AppState;

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Groups
        .route("/groups", get(handlers::list_groups).post(handlers::create_group))
        .route(
            "/groups/:group",
            get(handlers::get_group).delete(handlers::remove_group),
        )
        // Entries
        .route(
            "/groups/:group/entries/:key",
            put(handlers::put_entry).delete(handlers::delete_entry),
        )
        // Lookups
        .route("/groups/:group/match", get(handlers::match_key))
        .route("/groups/:group/hash", get(handlers::hash_key))
        // Persistence
        .route(
            "/snapshot",
            get(handlers::get_snapshot).put(handlers::put_snapshot),
        )
        .with_state(state)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use tower::ServiceExt;

    use crate::registry::Registry;
    use crate::types::ServiceConfig;
    use handlers::{ErrorResponse, MatchResponse};

    fn app() -> (Router, Arc<Registry>) {
        let registry = Arc::new(Registry::new());
        let state = Arc::new(AppState {
            registry: Arc::clone(&registry),
            config: ServiceConfig {
                default_replicas: 100,
                ..ServiceConfig::default()
            },
        });
        (router(state), registry)
    }

    fn request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_create_group_uses_default_replicas() {
        let (app, registry) = app();
        let response = app
            .oneshot(request("POST", "/groups", r#"{"name":"db"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(registry.get_group("db").unwrap().replicas(), 100);
    }

    #[tokio::test]
    async fn test_duplicate_group_conflicts() {
        let (app, registry) = app();
        registry.create_group("db", 10).unwrap();

        let response = app
            .oneshot(request("POST", "/groups", r#"{"name":"db","replicas":5}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let body: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.code, 10001);
    }

    #[tokio::test]
    async fn test_put_entry_and_match() {
        let (app, registry) = app();
        registry.create_group("redis", 100).unwrap();

        let response = app
            .clone()
            .oneshot(request("PUT", "/groups/redis/entries/10.0.0.1:6379", "redis0-info"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request("PUT", "/groups/redis/entries/10.0.0.1:6379", "again"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(request("GET", "/groups/redis/match?key=user-id-1", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let matched: MatchResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(matched.key, "10.0.0.1:6379");
        assert_eq!(STANDARD.decode(matched.payload).unwrap(), b"redis0-info".to_vec());
        assert_eq!(matched.hash, crate::ring::hash_key("user-id-1"));
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let (app, registry) = app();
        registry.create_group("db", 10).unwrap();
        registry.insert("db", "a", "old").unwrap();

        let response = app
            .oneshot(request("PUT", "/groups/db/entries/a?upsert=true", "new"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            registry.get_group("db").unwrap().get("a").unwrap().payload,
            b"new".to_vec()
        );
    }

    #[tokio::test]
    async fn test_match_on_empty_or_missing_group() {
        let (app, registry) = app();
        registry.create_group("empty", 10).unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", "/groups/empty/match?key=k", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.code, 10002);

        let response = app
            .oneshot(request("GET", "/groups/nope/match?key=k", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.code, 10000);
    }

    #[tokio::test]
    async fn test_delete_entry_and_group() {
        let (app, registry) = app();
        registry.create_group("db", 10).unwrap();
        registry.insert("db", "a", "A").unwrap();

        let response = app
            .clone()
            .oneshot(request("DELETE", "/groups/db/entries/a", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(registry.get_group("db").unwrap().positions(), 0);

        let response = app
            .clone()
            .oneshot(request("DELETE", "/groups/db", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("DELETE", "/groups/db", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let (app, registry) = app();
        registry.create_group("db", 20).unwrap();
        registry.insert("db", "10.0.0.1:3306", "mysql0").unwrap();

        let response = app
            .clone()
            .oneshot(request("GET", "/snapshot", Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot = body_bytes(response).await;

        let (other, restored) = self::app();
        let response = other
            .clone()
            .oneshot(request("PUT", "/snapshot", snapshot))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(restored.get_group("db").unwrap().positions(), 20);

        let response = other
            .oneshot(request("PUT", "/snapshot", "{broken"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_out_of_range_replicas_are_rejected() {
        let (app, registry) = app();

        for body in [
            r#"{"name":"none","replicas":0}"#,
            r#"{"name":"huge","replicas":1099511627776}"#,
        ] {
            let response = app
                .clone()
                .oneshot(request("POST", "/groups", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let error: ErrorResponse =
                serde_json::from_slice(&body_bytes(response).await).unwrap();
            assert_eq!(error.code, 10005);
        }

        let snapshot = r#"{"g":{"name":"g","numberOfReplicas":18446744073709551615,"elements":{"a":{"key":"a","payload":"QQ=="}}}}"#;
        let response = app
            .oneshot(request("PUT", "/snapshot", snapshot))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(error.code, 10004);

        assert!(registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_large_restore_runs_off_the_workers() {
        let source = Registry::new();
        source.create_group("db", crate::DEFAULT_REPLICAS).unwrap();
        for i in 0..20 {
            source
                .insert("db", &format!("10.0.0.{}:3306", i), "mysql")
                .unwrap();
        }
        let snapshot = source.serialize().unwrap();

        let (app, registry) = app();
        let restore = tokio::spawn(app.clone().oneshot(request("PUT", "/snapshot", snapshot)));
        let health = app
            .oneshot(request("GET", "/health", Body::empty()))
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);

        let response = restore.await.unwrap().unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let ring = registry.get_group("db").unwrap();
        assert_eq!(ring.positions(), 20 * crate::DEFAULT_REPLICAS);
        assert_eq!(
            ring.match_key("user-id-1").unwrap().key,
            source.match_key("db", "user-id-1").unwrap().key
        );
    }
}
