use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::{error, info};

use crate::{
    app_state::AppState,
    error::AppError,
    queries::{self, ChatListView, CompanyView},
    recommendation::LeadView,
    response::{ApiResponse, ResponseMessage},
};

// --- Router ---

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/v1/", get(index_handler))
        .route("/api/v1/companies/:id", get(company_handler))
        .route("/api/v1/companies/:id/leads", get(company_leads_handler))
        .route("/api/v1/leads/:lead_id/chats", get(lead_chats_handler))
        .route("/api/health", get(health_handler))
        .with_state(app_state)
}

// --- Handlers ---

async fn index_handler() -> &'static str {
    "Hello World"
}

#[axum::debug_handler]
async fn company_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<CompanyView>, AppError> {
    let company = queries::company_profile(state.store.as_ref(), id).await?;
    Ok(ApiResponse::new(ResponseMessage::CompanyFound, company))
}

#[axum::debug_handler]
async fn company_leads_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<Vec<LeadView>>, AppError> {
    let leads = state.leads.recommend(id).await?;
    info!("Empresa {id}: {} leads recomendados.", leads.len());
    Ok(ApiResponse::new(ResponseMessage::LeadsListed, leads))
}

#[axum::debug_handler]
async fn lead_chats_handler(
    State(state): State<AppState>,
    Path(lead_id): Path<i64>,
) -> Result<ApiResponse<ChatListView>, AppError> {
    let history = queries::chat_history(state.store.as_ref(), lead_id).await?;
    Ok(ApiResponse::new(ResponseMessage::ChatsListed, history))
}

#[axum::debug_handler]
async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.store.ping().await {
        Ok(()) => Ok(Json(json!({
            "status": "ok",
            "lead_source": format!("{:?}", state.config.lead_source).to_lowercase(),
        }))),
        Err(e) => {
            error!("Error en el health check del almacén: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, LeadSource, StoreBackend};
    use crate::recommendation::provider_from_config;
    use crate::store::{fixtures, EntityStore};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app(lead_source: LeadSource, dataset: PathBuf) -> Router {
        let config = AppConfig {
            server_addr: "127.0.0.1:0".to_string(),
            store: StoreBackend::Memory { seed_path: None },
            lead_source,
            recommendation_dataset: dataset,
            recommendation_limit: 30,
        };
        let store: Arc<dyn EntityStore> = Arc::new(fixtures::store());
        let leads = provider_from_config(&config, store.clone());
        create_router(AppState { config, store, leads })
    }

    fn relational_app() -> Router {
        test_app(LeadSource::Relational, PathBuf::from("data/recommendations.json"))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or_else(
            |_| json!({ "raw": String::from_utf8_lossy(&bytes).to_string() }),
        );
        (status, body)
    }

    #[tokio::test]
    async fn company_lookup_returns_envelope() {
        let (status, body) = get_json(relational_app(), "/api/v1/companies/7").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "회사 정보 조회 성공");
        assert_eq!(body["data"]["id"], 7);
        assert_eq!(body["data"]["companyName"], "Bravo");
        assert_eq!(body["data"]["keyExecutive"], "Kim");
        assert!(body["data"]["totalFunding"].is_null());
    }

    #[tokio::test]
    async fn unknown_company_is_404() {
        let (status, body) = get_json(relational_app(), "/api/v1/companies/404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "company not found");
    }

    #[tokio::test]
    async fn relational_leads_for_company_seven() {
        let (status, body) = get_json(relational_app(), "/api/v1/companies/7/leads").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "리드 추천 목록 조회 성공");
        let mut leads: Vec<(String, f64)> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| {
                (
                    l["leadCompanyName"].as_str().unwrap().to_string(),
                    l["leadScore"].as_f64().unwrap(),
                )
            })
            .collect();
        leads.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(leads, vec![("Acme".to_string(), 0.8), ("Cosmos".to_string(), 0.6)]);
    }

    #[tokio::test]
    async fn leads_never_404() {
        let (status, body) = get_json(relational_app(), "/api/v1/companies/404/leads").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn sampling_with_missing_dataset_still_returns_200() {
        let app = test_app(LeadSource::Sampling, PathBuf::from("/no/existe.json"));
        let (status, body) = get_json(app, "/api/v1/companies/7/leads").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!([]));
    }

    #[tokio::test]
    async fn chat_history_in_creation_order() {
        let (status, body) = get_json(relational_app(), "/api/v1/leads/41/chats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "채팅 내역 조회 성공");
        assert_eq!(body["data"]["roomId"], 5);
        let chats = body["data"]["chats"].as_array().unwrap();
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0]["id"], 1);
        assert_eq!(chats[0]["fromCompanyName"], "Bravo");
        assert_eq!(chats[0]["toCompanyName"], "Acme");
        assert_eq!(chats[0]["contents"], "hello");
        assert_eq!(chats[1]["id"], 2);
        assert_eq!(chats[1]["contents"], "hi");
    }

    #[tokio::test]
    async fn lead_without_room_is_404() {
        let (status, _) = get_json(relational_app(), "/api/v1/leads/42/chats").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_id_is_rejected() {
        let (status, _) = get_json(relational_app(), "/api/v1/companies/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn index_and_health() {
        let (status, body) = get_json(relational_app(), "/api/v1/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["raw"], "Hello World");

        let (status, body) = get_json(relational_app(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["lead_source"], "relational");
    }

    #[tokio::test]
    async fn sampling_from_bundled_dataset_caps_at_thirty() {
        let app = test_app(LeadSource::Sampling, PathBuf::from("data/recommendations.json"));
        let (status, body) = get_json(app, "/api/v1/companies/7/leads").await;

        assert_eq!(status, StatusCode::OK);
        let leads = body["data"].as_array().unwrap();
        assert_eq!(leads.len(), 30);
        assert!(leads.iter().all(|l| l["status"] == "RECOMMENDED"));
        assert!(leads.iter().all(|l| l["createAt"].as_str().unwrap().ends_with("-01T12:00:00")));
    }
}
