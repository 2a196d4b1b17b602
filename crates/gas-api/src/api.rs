use {
    axum::{
        Router,
        body::Bytes,
        extract::{DefaultBodyLimit, State},
        http::{HeaderValue, Method, StatusCode, header},
        response::{IntoResponse, Json, Response},
        routing::post,
    },
    registrar_gas::{Error as EstimationError, Estimator, GasEstimate},
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    std::sync::Arc,
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
};

const MAX_JSON_BODY_PAYLOAD: usize = 1024 * 16;

const REGISTRATION_KEYS: &[&str] = &[
    "networkId",
    "label",
    "owner",
    "resolver",
    "data",
    "reverseRecord",
    "ownerControlledFuses",
];

const EXTENSION_KEYS: &[&str] = &["networkId", "labels", "duration", "from"];

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    pub error: String,
    pub status: u16,
}

pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(Error {
            error: message.into(),
            status: status.as_u16(),
        }),
    )
        .into_response()
}

pub fn handle_all_routes(estimator: Arc<Estimator>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ORIGIN])
        .max_age(std::time::Duration::from_secs(86400));

    Router::new()
        .route("/registration", post(registration))
        .route("/extension", post(extension))
        .with_state(estimator)
        .layer(DefaultBodyLimit::max(MAX_JSON_BODY_PAYLOAD))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn registration(State(estimator): State<Arc<Estimator>>, body: Bytes) -> Response {
    let request = match parse(&body, REGISTRATION_KEYS) {
        Ok(request) => request,
        Err(response) => return response,
    };
    reply(estimator.registration(&request).await)
}

async fn extension(State(estimator): State<Arc<Estimator>>, body: Bytes) -> Response {
    let request = match parse(&body, EXTENSION_KEYS) {
        Ok(request) => request,
        Err(response) => return response,
    };
    reply(estimator.extension(&request).await)
}

/// Parses a request body, reporting all missing keys at once.
fn parse<T: DeserializeOwned>(body: &[u8], required: &[&str]) -> Result<T, Response> {
    let bad_request = |message: String| error(StatusCode::BAD_REQUEST, message);
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(bad_request("Bad request, empty body".to_owned()));
    }
    let value = serde_json::from_slice::<serde_json::Value>(body)
        .map_err(|err| bad_request(format!("Bad request, {err}")))?;
    let Some(object) = value.as_object() else {
        return Err(bad_request("Bad request, expected an object".to_owned()));
    };
    let missing = required
        .iter()
        .filter(|key| object.get(**key).is_none_or(serde_json::Value::is_null))
        .copied()
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(bad_request(format!(
            "Bad request, missing keys: {}",
            missing.join(", ")
        )));
    }
    serde_json::from_value(value).map_err(|err| bad_request(format!("Bad request, {err}")))
}

fn reply(result: Result<GasEstimate, EstimationError>) -> Response {
    match result {
        Ok(estimate) => {
            let mut response = Json(estimate).into_response();
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
            response
        }
        Err(
            err @ (EstimationError::UnsupportedNetwork(_) | EstimationError::InvalidRequest(_)),
        ) => error(StatusCode::BAD_REQUEST, err.to_string()),
        Err(EstimationError::Upstream(err)) => {
            // The error chain can contain node URLs including their API keys.
            tracing::warn!(?err, "estimation failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        axum::{body::Body, http::Request},
        maplit::hashmap,
        registrar_gas::{
            Endpoints,
            backend::{Backend, MockBackend, node::NodeBackend},
            overrides::SlotEncoding,
        },
        serde_json::{Value, json},
        std::time::Duration,
        tower::ServiceExt,
    };

    fn router(endpoints: Endpoints) -> Router {
        handle_all_routes(Arc::new(Estimator::new(hashmap! { 1 => endpoints })))
    }

    async fn post_json(router: Router, path: &str, body: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::post(path)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn registration_body(network_id: u64) -> Value {
        json!({
            "networkId": network_id,
            "label": "test",
            "owner": "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            "resolver": "0x231b0Ee14048e9dCcD1d247744d114a4EB5E8E63",
            "data": ["0x"],
            "reverseRecord": true,
            "ownerControlledFuses": 0,
        })
    }

    #[tokio::test]
    async fn empty_body() {
        let (status, body) = post_json(router(Endpoints::default()), "/registration", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Bad request, empty body", "status": 400 })
        );
    }

    #[tokio::test]
    async fn missing_keys_in_declaration_order() {
        let (status, body) = post_json(
            router(Endpoints::default()),
            "/extension",
            r#"{"labels": ["test"], "duration": null}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Bad request, missing keys: networkId, duration, from"
        );

        let (_, body) =
            post_json(router(Endpoints::default()), "/registration", "{}").await;
        assert_eq!(
            body["error"],
            "Bad request, missing keys: networkId, label, owner, resolver, data, \
             reverseRecord, ownerControlledFuses"
        );
    }

    #[tokio::test]
    async fn malformed_values() {
        let mut request = registration_body(1);
        request["owner"] = json!("nick.eth");
        let (status, body) = post_json(
            router(Endpoints::default()),
            "/registration",
            &request.to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Bad request, "));
    }

    #[tokio::test]
    async fn unsupported_network() {
        let (status, body) = post_json(
            router(Endpoints::default()),
            "/registration",
            &registration_body(10).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Unsupported network", "status": 400 }));
    }

    #[tokio::test]
    async fn local_network_estimates() {
        let (status, body) = post_json(
            router(Endpoints::default()),
            "/registration",
            &registration_body(1337).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "gasUsed": 350000, "status": true }));

        let (status, body) = post_json(
            router(Endpoints::default()),
            "/extension",
            &json!({
                "networkId": 1337,
                "labels": ["a", "b"],
                "duration": 31557600,
                "from": "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
            })
            .to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "gasUsed": 189000, "status": true }));
    }

    #[tokio::test]
    async fn upstream_failure() {
        let mut backend = MockBackend::new();
        backend.expect_name().return_const("1/node".to_owned());
        backend
            .expect_slot_encoding()
            .return_const(SlotEncoding::Padded);
        backend
            .expect_read()
            .returning(|_, _, _| Err(anyhow::anyhow!("connection refused")));
        let endpoints = Endpoints::new(vec![Arc::new(backend) as Arc<dyn Backend>]);

        let (status, body) = post_json(
            router(endpoints),
            "/registration",
            &registration_body(1).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "error": "Internal server error", "status": 500 })
        );
    }

    #[tokio::test]
    async fn upstream_failure_hides_node_url() {
        let node = NodeBackend::new(
            "1/127.0.0.1".to_owned(),
            "http://127.0.0.1:9/v3/SUPERSECRETKEY".parse().unwrap(),
            SlotEncoding::Padded,
            Duration::from_secs(5),
        );
        let endpoints = Endpoints::new(vec![Arc::new(node) as Arc<dyn Backend>]);

        let (status, body) = post_json(
            router(endpoints),
            "/registration",
            &registration_body(1).to_string(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.to_string().contains("SUPERSECRETKEY"), "{body}");
        assert!(!body.to_string().contains("/v3/"), "{body}");
    }

    #[tokio::test]
    async fn cors_preflight() {
        let response = router(Endpoints::default())
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/registration")
                    .header(header::ORIGIN, "https://app.ens.domains")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
