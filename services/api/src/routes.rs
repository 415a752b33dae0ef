use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use bsd_index::index::SearchIndex;
use bsd_index::{registry_router, BsdRepository, RegistryService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_registry_routes<R, I>(service: Arc<RegistryService<R, I>>) -> axum::Router
where
    R: BsdRepository + 'static,
    I: SearchIndex + 'static,
{
    registry_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryBsdRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use bsd_index::config::{AppEnvironment, IndexConfig};
    use bsd_index::InMemoryIndex;
    use chrono::Utc;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    const FIXTURES: &str = r#"[
        {
            "type": "BSVHU",
            "id": "VHU-1",
            "status": "INITIAL",
            "createdAt": "2021-01-01T00:00:00Z",
            "emitter": { "siret": "11111111111111" }
        },
        {
            "type": "BSVHU",
            "id": "VHU-2",
            "status": "PROCESSED",
            "createdAt": "2021-01-02T00:00:00Z",
            "emitter": { "siret": "11111111111111" }
        }
    ]"#;

    async fn app(ready: bool) -> axum::Router {
        let repository =
            InMemoryBsdRepository::from_reader(FIXTURES.as_bytes()).expect("fixtures load");
        let service = Arc::new(RegistryService::new(
            Arc::new(repository),
            Arc::new(InMemoryIndex::new()),
            &IndexConfig::default(),
        ));
        service
            .rebuild(AppEnvironment::Test, None, false, Utc::now())
            .await
            .expect("rebuild runs");

        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_registry_routes(service).layer(Extension(state))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let response = app(false)
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let waiting = app(false)
            .await
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(waiting.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(waiting).await["status"], "initializing");

        let ready = app(true)
            .await
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn registry_search_reads_the_fixture_index() {
        let request = Request::post("/api/v1/registry/search")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{ "createdAt": { "_gte": "2021-01-02T00:00:00Z" } }"#))
            .unwrap();
        let response = app(true).await.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["hits"][0]["id"], "VHU-2");
    }

    #[tokio::test]
    async fn metrics_render_as_prometheus_text() {
        let response = app(true)
            .await
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }
}
