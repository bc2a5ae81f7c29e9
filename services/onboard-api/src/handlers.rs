use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use onboard_provisioning::{
    FailureReason, ParticipantLocator, ParticipantManifest, ProvisionFailure, ProvisionStep,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use crate::state::AppState;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    reason: FailureReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<ProvisionStep>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

pub async fn create_participant(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let manifest = match ParticipantManifest::from_json(&body) {
        Ok(manifest) => manifest,
        Err(failure) => {
            return failure_response(&ProvisionFailure::at(ProvisionStep::Validating, failure))
        }
    };

    // Capability calls are synchronous; keep them off the async workers
    let orchestrator = state.orchestrator.clone();
    match tokio::task::spawn_blocking(move || orchestrator.provision(&manifest)).await {
        Ok(Ok(locator)) => created(state.config.api.context_path(), &locator),
        Ok(Err(failure)) => failure_response(&failure),
        Err(e) => {
            error!(error = %e, "provisioning task did not complete");
            let body = ErrorBody {
                reason: FailureReason::Unexpected,
                step: None,
                detail: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

fn created(api_path: &str, locator: &ParticipantLocator) -> Response {
    let location = format!("{api_path}{}", locator.path());
    (StatusCode::CREATED, [(header::LOCATION, location)]).into_response()
}

fn failure_response(failure: &ProvisionFailure) -> Response {
    let body = ErrorBody {
        reason: failure.reason,
        step: Some(failure.step),
        detail: failure.detail.as_deref(),
    };
    (status_for(failure.reason), Json(body)).into_response()
}

/// HTTP status for a failure reason.
pub fn status_for(reason: FailureReason) -> StatusCode {
    match reason {
        FailureReason::NotFound => StatusCode::NOT_FOUND,
        FailureReason::Conflict => StatusCode::CONFLICT,
        FailureReason::BadRequest => StatusCode::BAD_REQUEST,
        FailureReason::Unauthorized => StatusCode::UNAUTHORIZED,
        FailureReason::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use onboard_core::Config;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const PARTICIPANTS: &str = "/api/mgmt/v1alpha/participants";

    fn state() -> Arc<AppState> {
        Arc::new(AppState::in_memory(Config::default_config()))
    }

    fn manifest_json(id: &str) -> Value {
        json!({
            "participantContextId": id,
            "participantId": format!("did:web:{id}.example.com"),
            "active": true,
            "tokenUrl": "https://idp/token",
            "clientId": "c1",
            "clientSecret": "s3cr3t",
            "clientSecretAlias": format!("{id}-secret")
        })
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(PARTICIPANTS)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_returns_location() {
        let app = crate::router(state());
        let response = app
            .oneshot(post(manifest_json("p1").to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/api/mgmt/v1alpha/participants/cDE="
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_root_context_path_location() {
        for path in ["/", "/api/mgmt/"] {
            let mut config = Config::default_config();
            config.api.path = path.to_string();
            let expected = format!("{}/v1alpha/participants", path.trim_end_matches('/'));

            let request = Request::builder()
                .method("POST")
                .uri(&expected)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(manifest_json("p1").to_string()))
                .unwrap();
            let response = crate::router(Arc::new(AppState::in_memory(config)))
                .oneshot(request)
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::CREATED);
            assert_eq!(
                response.headers().get(header::LOCATION).unwrap(),
                format!("{expected}/cDE=").as_str()
            );
        }
    }

    #[tokio::test]
    async fn test_duplicate_maps_to_conflict() {
        let state = state();
        let first = crate::router(state.clone())
            .oneshot(post(manifest_json("p1").to_string()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = crate::router(state)
            .oneshot(post(manifest_json("p1").to_string()))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
        let body = json_body(second).await;
        assert_eq!(body["reason"], "CONFLICT");
        assert_eq!(body["step"], "CREATING_IDENTITY");
    }

    #[tokio::test]
    async fn test_missing_oauth_field_is_bad_request() {
        let mut manifest = manifest_json("p1");
        manifest.as_object_mut().unwrap().remove("tokenUrl");

        let response = crate::router(state())
            .oneshot(post(manifest.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["reason"], "BAD_REQUEST");
        assert_eq!(body["step"], "SAVING_CONFIG");
        assert_eq!(body["detail"], "tokenUrl is required");
    }

    #[tokio::test]
    async fn test_undecodable_body_is_bad_request() {
        let response = crate::router(state())
            .oneshot(post("{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["reason"], "BAD_REQUEST");
        assert_eq!(body["step"], "VALIDATING");
    }

    #[tokio::test]
    async fn test_health() {
        let response = crate::router(state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "onboard-api");
    }

    #[test]
    fn test_every_reason_has_a_status() {
        let statuses: Vec<u16> = FailureReason::ALL
            .iter()
            .map(|reason| status_for(*reason).as_u16())
            .collect();
        assert_eq!(statuses, vec![404, 409, 400, 401, 500]);
    }
}
