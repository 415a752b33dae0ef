use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::filter::FilterExpression;
use super::service::RegistryService;
use crate::bsds::WasteDocument;
use crate::error::AppError;
use crate::index::{IndexDocument, SearchIndex};
use crate::repository::BsdRepository;

/// Router exposing document indexing and registry search.
pub fn registry_router<R, I>(service: Arc<RegistryService<R, I>>) -> Router
where
    R: BsdRepository + 'static,
    I: SearchIndex + 'static,
{
    Router::new()
        .route("/api/v1/bsds", post(index_handler::<R, I>))
        .route("/api/v1/bsds/:bsd_id/reindex", post(reindex_handler::<R, I>))
        .route("/api/v1/registry/search", post(search_handler::<R, I>))
        .route("/api/v1/registry/query", post(query_handler::<R, I>))
        .route("/api/v1/registry/export", post(export_handler::<R, I>))
        .with_state(service)
}

pub(crate) async fn index_handler<R, I>(
    State(service): State<Arc<RegistryService<R, I>>>,
    Json(document): Json<WasteDocument>,
) -> Result<Json<IndexDocument>, AppError>
where
    R: BsdRepository + 'static,
    I: SearchIndex + 'static,
{
    let indexed = service.index_record(&document, Utc::now()).await?;
    Ok(Json(indexed))
}

pub(crate) async fn reindex_handler<R, I>(
    State(service): State<Arc<RegistryService<R, I>>>,
    Path(bsd_id): Path<String>,
) -> Result<Json<IndexDocument>, AppError>
where
    R: BsdRepository + 'static,
    I: SearchIndex + 'static,
{
    let indexed = service.reindex_record(&bsd_id, Utc::now()).await?;
    Ok(Json(indexed))
}

pub(crate) async fn search_handler<R, I>(
    State(service): State<Arc<RegistryService<R, I>>>,
    Json(filter): Json<FilterExpression>,
) -> Result<Json<Value>, AppError>
where
    R: BsdRepository + 'static,
    I: SearchIndex + 'static,
{
    let hits = service.search(&filter).await?;
    Ok(Json(json!({
        "total": hits.len(),
        "hits": hits,
    })))
}

pub(crate) async fn query_handler<R, I>(
    State(service): State<Arc<RegistryService<R, I>>>,
    Json(filter): Json<FilterExpression>,
) -> Result<Json<Value>, AppError>
where
    R: BsdRepository + 'static,
    I: SearchIndex + 'static,
{
    Ok(Json(service.query(&filter)?))
}

pub(crate) async fn export_handler<R, I>(
    State(service): State<Arc<RegistryService<R, I>>>,
    Json(filter): Json<FilterExpression>,
) -> Result<impl IntoResponse, AppError>
where
    R: BsdRepository + 'static,
    I: SearchIndex + 'static,
{
    let mut buffer = Vec::new();
    service.export(&filter, &mut buffer).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        buffer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bsds::participants::company_for_tests;
    use crate::bsds::{BsdType, Bsvhu, BsvhuStatus};
    use crate::config::IndexConfig;
    use crate::index::{InMemoryIndex, IndexError};
    use crate::registry::Predicate;
    use crate::repository::RepositoryError;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Default)]
    struct MemoryRepository {
        records: Mutex<HashMap<String, WasteDocument>>,
    }

    impl BsdRepository for MemoryRepository {
        fn get_record_for_indexing(&self, id: &str) -> Result<WasteDocument, RepositoryError> {
            self.records
                .lock()
                .expect("repository mutex poisoned")
                .get(id)
                .cloned()
                .ok_or_else(|| RepositoryError::NotFound(id.to_string()))
        }

        fn list_ids(&self, _bsd_type: Option<BsdType>) -> Result<Vec<String>, RepositoryError> {
            Ok(self
                .records
                .lock()
                .expect("repository mutex poisoned")
                .keys()
                .cloned()
                .collect())
        }
    }

    fn vhu(id: &str, day: u32) -> WasteDocument {
        WasteDocument::Bsvhu(Bsvhu {
            id: id.into(),
            status: BsvhuStatus::Initial,
            created_at: Some(Utc.with_ymd_and_hms(2021, 1, day, 0, 0, 0).unwrap()),
            emitter: company_for_tests("11111111111111"),
            ..Bsvhu::default()
        })
    }

    fn app() -> (Router, Arc<MemoryRepository>) {
        let repository = Arc::new(MemoryRepository::default());
        let index = Arc::new(InMemoryIndex::new());
        let service = Arc::new(RegistryService::new(
            repository.clone(),
            index,
            &IndexConfig::default(),
        ));
        (registry_router(service), repository)
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn indexes_then_finds_a_document() {
        let (app, _) = app();
        let document = serde_json::to_value(vhu("VHU-1", 2)).expect("serializable");

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/bsds", &document))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let indexed = json_body(response).await;
        assert_eq!(indexed["isForActionFor"], json!(["11111111111111"]));

        let response = app
            .oneshot(post_json(
                "/api/v1/registry/search",
                &json!({ "id": { "_eq": "VHU-1" } }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let found = json_body(response).await;
        assert_eq!(found["total"], 1);
        assert_eq!(found["hits"][0]["id"], "VHU-1");
    }

    #[tokio::test]
    async fn contradictory_filters_are_bad_requests() {
        let (app, _) = app();
        let filter = json!({
            "createdAt": { "_gt": "2021-01-01T00:00:00Z", "_gte": "2021-01-02T00:00:00Z" }
        });

        let response = app
            .oneshot(post_json("/api/v1/registry/query", &filter))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        let message = body["error"].as_str().expect("error message");
        assert!(message.contains("createdAt"));
    }

    #[tokio::test]
    async fn reindexes_from_the_repository() {
        let (app, repository) = app();
        repository
            .records
            .lock()
            .expect("repository mutex poisoned")
            .insert("VHU-7".into(), vhu("VHU-7", 3));

        let found = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/bsds/VHU-7/reindex")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(found.status(), StatusCode::OK);

        let missing = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/bsds/VHU-404/reindex")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn query_endpoint_renders_the_search_body() {
        let (app, _) = app();
        let response = app
            .oneshot(post_json(
                "/api/v1/registry/query",
                &json!({ "wasteCode": { "_contains": "16 01" } }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["query"]["bool"]["filter"][0],
            json!({ "wildcard": { "wasteCode": { "value": "*16 01*" } } })
        );
    }

    struct HungIndex;

    impl SearchIndex for HungIndex {
        fn submit(&self, _target: &str, _documents: &[IndexDocument]) -> Result<(), IndexError> {
            Ok(())
        }

        fn search(
            &self,
            _target: &str,
            _predicates: &[Predicate],
        ) -> Result<Vec<IndexDocument>, IndexError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn hung_searches_answer_service_unavailable() {
        let config = IndexConfig {
            timeout_ms: 20,
            ..IndexConfig::default()
        };
        let service = Arc::new(RegistryService::new(
            Arc::new(MemoryRepository::default()),
            Arc::new(HungIndex),
            &config,
        ));

        let started = std::time::Instant::now();
        let response = registry_router(service)
            .oneshot(post_json("/api/v1/registry/search", &json!({})))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(started.elapsed() < Duration::from_millis(250));
        let body = json_body(response).await;
        assert!(body["error"].as_str().expect("error message").contains("timed out"));
    }
}
