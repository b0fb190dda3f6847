use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Path, Query, Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use chrono::{DateTime, Utc};
use corral_models::{
    merge_tags, CompositeServiceRequest, CompositeTaskTemplateRequest, LogPage, LogQuery,
    Parameter, ParameterSpec, RunTaskRequest, SecretCreateSpec, SecretDeletion, SecretHandle,
    SecretSummary, Service, ServiceDetail, ServiceUpdateRequest, TaskSummary, TaskTemplate,
    TaskTemplateDetail, TaskTemplateUpdateRequest,
};
use corral_orchestrations::{
    activities, ClassifiedError, ErrorKind, OrchestrationContext, OrchestrationPolicy,
    TeardownReport, TenantRegistry,
};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth;

/// Shared API state
#[derive(Clone)]
pub struct AppState {
    pub tenants: Arc<TenantRegistry>,
    pub policy: OrchestrationPolicy,
    pub api_token: Option<String>,
    /// Default wait for teardown loops started by a DELETE
    pub teardown_timeout: Duration,
}

impl AppState {
    fn context(&self, tenant: &str) -> Result<OrchestrationContext, AppError> {
        let tenant = self
            .tenants
            .get(tenant)
            .ok_or_else(|| AppError::UnknownTenant(tenant.to_string()))?;
        Ok(OrchestrationContext::new(tenant, self.policy.clone()))
    }

    fn wait_for(&self, wait_secs: Option<u64>) -> Duration {
        wait_secs
            .map(Duration::from_secs)
            .unwrap_or(self.teardown_timeout)
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Services
        .route("/api/:tenant/services", post(create_service))
        .route("/api/:tenant/clusters/:cluster/services", get(list_services))
        .route(
            "/api/:tenant/clusters/:cluster/services/:name",
            get(get_service).put(update_service).delete(delete_service),
        )
        .route("/api/:tenant/clusters/:cluster", delete(delete_cluster))
        .route(
            "/api/:tenant/clusters/:cluster/logs/:component/:instance",
            get(get_logs),
        )
        // Task templates and tasks
        .route("/api/:tenant/task-templates", post(create_task_template))
        .route(
            "/api/:tenant/task-templates/:family",
            get(get_task_template)
                .put(update_task_template)
                .delete(delete_task_template),
        )
        .route("/api/:tenant/tasks", post(run_task))
        // Secrets and parameters
        .route("/api/:tenant/secrets", get(list_secrets).post(create_secret))
        .route(
            "/api/:tenant/secrets/:id",
            get(get_secret).put(update_secret).delete(delete_secret),
        )
        .route(
            "/api/:tenant/parameters",
            get(list_parameters).post(put_parameter),
        )
        .route(
            "/api/:tenant/parameters/*name",
            get(get_parameter).delete(delete_parameter),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the API server
pub async fn start_server(host: &str, port: u16, state: AppState) -> Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("✓ API server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

/// Run an orchestration on its own task.
///
/// If the client goes away the handler future is dropped, which cancels the
/// request token; the orchestration then stops at its next remote call and unwinds.
async fn run<T, F, Fut>(state: &AppState, tenant: &str, f: F) -> Result<T, AppError>
where
    F: FnOnce(OrchestrationContext) -> Fut,
    Fut: Future<Output = corral_orchestrations::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let ctx = state.context(tenant)?;
    let guard = ctx.cancellation_token().clone().drop_guard();
    let joined = tokio::spawn(f(ctx)).await;
    guard.disarm();

    joined
        .map_err(|e| AppError::Internal(format!("orchestration task failed: {}", e)))?
        .map_err(AppError::from)
}

// ============================================================================
// Health Check
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "corral",
        "version": env!("CARGO_PKG_VERSION"),
        "tenants": state.tenants.names(),
    }))
}

// ============================================================================
// Services
// ============================================================================

async fn create_service(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    ApiJson(request): ApiJson<CompositeServiceRequest>,
) -> Result<(StatusCode, Json<ServiceDetail>), AppError> {
    let detail = run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::create_service(&ctx, request).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn list_services(
    State(state): State<AppState>,
    Path((tenant, cluster)): Path<(String, String)>,
) -> Result<Json<Vec<Service>>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::list_services(&ctx, &cluster).await
    })
    .await
    .map(Json)
}

async fn get_service(
    State(state): State<AppState>,
    Path((tenant, cluster, name)): Path<(String, String, String)>,
) -> Result<Json<ServiceDetail>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::get_service(&ctx, &cluster, &name).await
    })
    .await
    .map(Json)
}

async fn update_service(
    State(state): State<AppState>,
    Path((tenant, cluster, name)): Path<(String, String, String)>,
    ApiJson(request): ApiJson<ServiceUpdateRequest>,
) -> Result<Json<ServiceDetail>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::update_service(&ctx, &cluster, &name, request).await
    })
    .await
    .map(Json)
}

#[derive(Debug, Default, Deserialize)]
struct DeleteServiceQuery {
    #[serde(default)]
    recursive: bool,
    wait_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ServiceDeletionResponse {
    service: Service,
    task_template: Option<TaskTemplate>,
    deleted_secrets: Vec<String>,
    teardowns: Vec<TeardownReport>,
}

async fn delete_service(
    State(state): State<AppState>,
    Path((tenant, cluster, name)): Path<(String, String, String)>,
    Query(query): Query<DeleteServiceQuery>,
) -> Result<Json<ServiceDeletionResponse>, AppError> {
    let recursive = query.recursive;
    let deletion = run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::delete_service(&ctx, &cluster, &name, recursive).await
    })
    .await?;

    // every loop shares one deadline
    let deadline = Instant::now() + state.wait_for(query.wait_secs);
    let mut teardowns = Vec::with_capacity(deletion.teardowns.len());
    for handle in deletion.teardowns {
        let remaining = deadline.saturating_duration_since(Instant::now());
        teardowns.push(handle.report(remaining).await);
    }

    Ok(Json(ServiceDeletionResponse {
        service: deletion.service,
        task_template: deletion.task_template,
        deleted_secrets: deletion.deleted_secrets,
        teardowns,
    }))
}

#[derive(Debug, Default, Deserialize)]
struct WaitQuery {
    wait_secs: Option<u64>,
}

async fn delete_cluster(
    State(state): State<AppState>,
    Path((tenant, cluster)): Path<(String, String)>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<TeardownReport>, AppError> {
    let handle = run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::delete_cluster(&ctx, &cluster).await
    })
    .await?;
    Ok(Json(handle.report(state.wait_for(query.wait_secs)).await))
}

#[derive(Debug, Default, Deserialize)]
struct LogsQuery {
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    limit: Option<usize>,
    next_token: Option<String>,
    #[serde(default)]
    start_from_head: bool,
}

async fn get_logs(
    State(state): State<AppState>,
    Path((tenant, cluster, component, instance)): Path<(String, String, String, String)>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogPage>, AppError> {
    let query = LogQuery {
        cluster,
        component,
        instance,
        start_time: query.start_time,
        end_time: query.end_time,
        limit: query.limit,
        next_token: query.next_token,
        start_from_head: query.start_from_head,
    };
    run(&state, &tenant, move |ctx| async move {
        activities::logs::get_log_events(&ctx, &query).await
    })
    .await
    .map(Json)
}

// ============================================================================
// Task Templates and Tasks
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct RevisionQuery {
    revision: Option<u32>,
}

async fn create_task_template(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    ApiJson(request): ApiJson<CompositeTaskTemplateRequest>,
) -> Result<(StatusCode, Json<TaskTemplateDetail>), AppError> {
    let detail = run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::create_task_template(&ctx, request).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

async fn get_task_template(
    State(state): State<AppState>,
    Path((tenant, family)): Path<(String, String)>,
    Query(query): Query<RevisionQuery>,
) -> Result<Json<TaskTemplateDetail>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::get_task_template(&ctx, &family, query.revision).await
    })
    .await
    .map(Json)
}

async fn update_task_template(
    State(state): State<AppState>,
    Path((tenant, family)): Path<(String, String)>,
    ApiJson(request): ApiJson<TaskTemplateUpdateRequest>,
) -> Result<Json<TaskTemplateDetail>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::update_task_template(&ctx, &family, request).await
    })
    .await
    .map(Json)
}

async fn delete_task_template(
    State(state): State<AppState>,
    Path((tenant, family)): Path<(String, String)>,
    Query(query): Query<RevisionQuery>,
) -> Result<Json<Vec<TaskTemplate>>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::delete_task_template(&ctx, &family, query.revision).await
    })
    .await
    .map(Json)
}

async fn run_task(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    ApiJson(request): ApiJson<RunTaskRequest>,
) -> Result<(StatusCode, Json<Vec<TaskSummary>>), AppError> {
    let tasks = run(&state, &tenant, move |ctx| async move {
        corral_orchestrations::run_task(&ctx, request).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(tasks)))
}

// ============================================================================
// Secrets
// ============================================================================

/// Lists only secrets carrying the tenant's ownership tag
async fn list_secrets(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> Result<Json<Vec<SecretSummary>>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        let filter = [ctx.defaults().ownership_tag()];
        activities::secrets::list_secrets(&ctx, &filter).await
    })
    .await
    .map(Json)
}

async fn create_secret(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    ApiJson(mut spec): ApiJson<SecretCreateSpec>,
) -> Result<(StatusCode, Json<SecretHandle>), AppError> {
    let handle = run(&state, &tenant, move |ctx| async move {
        spec.tags = merge_tags(&spec.tags, &[ctx.defaults().ownership_tag()]);
        activities::secrets::create_secret(&ctx, &spec).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(handle)))
}

async fn get_secret(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, String)>,
) -> Result<Json<SecretSummary>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        activities::secrets::describe_secret(&ctx, &id).await
    })
    .await
    .map(Json)
}

#[derive(Deserialize)]
struct SecretValue {
    secret_string: String,
}

async fn update_secret(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, String)>,
    ApiJson(value): ApiJson<SecretValue>,
) -> Result<Json<SecretHandle>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        activities::secrets::update_secret(&ctx, &id, &value.secret_string).await
    })
    .await
    .map(Json)
}

#[derive(Debug, Default, Deserialize)]
struct SecretDeleteQuery {
    /// Recovery window; the tenant default when absent, 0 deletes immediately
    grace_days: Option<u32>,
}

async fn delete_secret(
    State(state): State<AppState>,
    Path((tenant, id)): Path<(String, String)>,
    Query(query): Query<SecretDeleteQuery>,
) -> Result<Json<SecretDeletion>, AppError> {
    run(&state, &tenant, move |ctx| async move {
        let grace = query
            .grace_days
            .unwrap_or(ctx.defaults().secret_grace_days);
        activities::secrets::delete_secret(&ctx, &id, grace).await
    })
    .await
    .map(Json)
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct ParameterListQuery {
    prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PutParameterQuery {
    #[serde(default)]
    overwrite: bool,
}

/// The wildcard capture drops the leading slash of hierarchical names
fn parameter_name(captured: &str) -> String {
    format!("/{}", captured.trim_start_matches('/'))
}

async fn list_parameters(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<ParameterListQuery>,
) -> Result<Json<Vec<Parameter>>, AppError> {
    let prefix = query.prefix.unwrap_or_else(|| "/".to_string());
    run(&state, &tenant, move |ctx| async move {
        activities::parameters::list_parameters(&ctx, &prefix).await
    })
    .await
    .map(Json)
}

async fn put_parameter(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
    Query(query): Query<PutParameterQuery>,
    ApiJson(mut spec): ApiJson<ParameterSpec>,
) -> Result<(StatusCode, Json<Parameter>), AppError> {
    let parameter = run(&state, &tenant, move |ctx| async move {
        spec.tags = merge_tags(&spec.tags, &[ctx.defaults().ownership_tag()]);
        activities::parameters::put_parameter(&ctx, &spec, query.overwrite).await
    })
    .await?;
    Ok((StatusCode::CREATED, Json(parameter)))
}

async fn get_parameter(
    State(state): State<AppState>,
    Path((tenant, name)): Path<(String, String)>,
) -> Result<Json<Parameter>, AppError> {
    let name = parameter_name(&name);
    run(&state, &tenant, move |ctx| async move {
        activities::parameters::get_parameter(&ctx, &name).await
    })
    .await
    .map(Json)
}

async fn delete_parameter(
    State(state): State<AppState>,
    Path((tenant, name)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let name = parameter_name(&name);
    run(&state, &tenant, move |ctx| async move {
        activities::parameters::delete_parameter(&ctx, &name).await
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Error Handling
// ============================================================================

/// JSON body extractor whose rejections answer like every other API error
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::Orchestration(ClassifiedError::bad_request(
                rejection.body_text(),
            ))),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    Orchestration(ClassifiedError),
    UnknownTenant(String),
    Internal(String),
}

impl From<ClassifiedError> for AppError {
    fn from(err: ClassifiedError) -> Self {
        AppError::Orchestration(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::LimitExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (kind, message) = match self {
            AppError::Orchestration(err) => (err.kind, err.message),
            AppError::UnknownTenant(tenant) => {
                (ErrorKind::NotFound, format!("tenant {} not found", tenant))
            }
            AppError::Internal(message) => (ErrorKind::InternalError, message),
        };
        if kind == ErrorKind::InternalError {
            tracing::error!("Request failed: {}", message);
        }

        let body = Json(serde_json::json!({
            "error": kind.as_str(),
            "message": message,
        }));

        (status_for(kind), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use corral_orchestrations::{MemoryPlatform, PlatformClients, Tenant, TenantDefaults};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_state(api_token: Option<&str>) -> AppState {
        let platform = Arc::new(MemoryPlatform::new());
        platform.add_namespace("ns-internal", "internal.acme");
        let mut defaults = TenantDefaults::new("acme");
        defaults.network.subnets = vec!["subnet-a".to_string()];
        let tenant = Tenant::new("acme", PlatformClients::from_platform(platform), defaults);

        AppState {
            tenants: Arc::new(TenantRegistry::builder().tenant(tenant).build()),
            policy: OrchestrationPolicy {
                retry_delay: Duration::from_millis(10),
                ..OrchestrationPolicy::default()
            },
            api_token: api_token.map(str::to_string),
            teardown_timeout: Duration::from_secs(5),
        }
    }

    fn service_request() -> Value {
        json!({
            "cluster": {"name": "shared", "capacity_providers": ["FARGATE"]},
            "task_template": {
                "family": "web",
                "cpu": "256",
                "memory": "512",
                "containers": [{"name": "app", "image": "registry.example/web:1"}]
            },
            "service": {"name": "web", "desired_count": 2},
            "registry_entry": {"name": "web", "namespace_id": "ns-internal"},
            "credentials": {"app": {"secret_string": "token"}}
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(test_state(Some("s3cret")));

        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["tenants"], json!(["acme"]));
    }

    #[tokio::test]
    async fn test_unknown_tenant_is_not_found() {
        let app = create_router(test_state(None));

        let (status, body) = send(&app, "GET", "/api/initech/clusters/shared/services", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert!(body["message"].as_str().unwrap().contains("initech"));
    }

    #[tokio::test]
    async fn test_bearer_token_required() {
        let app = create_router(test_state(Some("s3cret")));

        let (status, body) = send(&app, "GET", "/api/acme/task-templates/web", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");

        let request = Request::builder()
            .uri("/api/acme/task-templates/web")
            .header(header::AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let request = Request::builder()
            .uri("/api/acme/task-templates/web")
            .header(header::AUTHORIZATION, "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        // authenticated; the template just does not exist
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_get_and_recursive_delete_service() {
        let app = create_router(test_state(None));

        let (status, body) = send(&app, "POST", "/api/acme/services", Some(service_request())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["endpoint"], "web.internal.acme");
        assert_eq!(body["task_template"]["revision"], 1);

        let (status, body) = send(&app, "GET", "/api/acme/clusters/shared/services/web", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"]["desired_count"], 2);

        let (status, body) = send(&app, "POST", "/api/acme/services", Some(service_request())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "conflict");

        let (status, body) = send(
            &app,
            "DELETE",
            "/api/acme/clusters/shared/services/web?recursive=true&wait_secs=5",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task_template"]["status"], "INACTIVE");
        let teardowns = body["teardowns"].as_array().unwrap();
        assert_eq!(teardowns.len(), 2);
        assert!(teardowns.iter().all(|t| t["outcome"] == "deleted"));

        let (status, _) = send(&app, "GET", "/api/acme/clusters/shared/services/web", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_request_is_bad_request() {
        let app = create_router(test_state(None));
        let mut request = service_request();
        request["service"] = Value::Null;

        let (status, body) = send(&app, "POST", "/api/acme/services", Some(request)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app = create_router(test_state(None));

        let request = Request::builder()
            .method("POST")
            .uri("/api/acme/services")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"service\": {\"name\": "))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "bad_request");

        let (status, body) = send(
            &app,
            "POST",
            "/api/acme/parameters",
            Some(json!({"name": "/web/db/host", "value": 42})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_hierarchical_parameter_names() {
        let app = create_router(test_state(None));

        let (status, body) = send(
            &app,
            "POST",
            "/api/acme/parameters",
            Some(json!({"name": "/web/db/host", "value": "db.internal"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["version"], 1);

        let (status, body) = send(&app, "GET", "/api/acme/parameters/web/db/host", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["value"], "db.internal");

        let (status, _) = send(&app, "DELETE", "/api/acme/parameters/web/db/host", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", "/api/acme/parameters/web/db/host", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_secret_lifecycle() {
        let app = create_router(test_state(None));

        let (status, handle) = send(
            &app,
            "POST",
            "/api/acme/secrets",
            Some(json!({"name": "acme/api-key", "secret_string": "v1"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let arn = handle["arn"].as_str().unwrap().to_string();
        let encoded = arn.replace('/', "%2F");

        let (status, secrets) = send(&app, "GET", "/api/acme/secrets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(secrets.as_array().unwrap().len(), 1);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/acme/secrets/{}?grace_days=3", encoded),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/acme/secrets/{}?grace_days=7", encoded),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["arn"], arn.as_str());
    }

    #[test]
    fn test_error_kind_status_codes() {
        let cases = [
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
            (ErrorKind::Conflict, StatusCode::CONFLICT),
            (ErrorKind::BadRequest, StatusCode::BAD_REQUEST),
            (ErrorKind::Forbidden, StatusCode::FORBIDDEN),
            (ErrorKind::LimitExceeded, StatusCode::TOO_MANY_REQUESTS),
            (ErrorKind::InternalError, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (kind, status) in cases {
            let response = AppError::from(ClassifiedError::new(kind, "boom")).into_response();
            assert_eq!(response.status(), status, "{:?}", kind);
        }
    }

    #[test]
    fn test_parameter_name_restores_leading_slash() {
        assert_eq!(parameter_name("web/db/host"), "/web/db/host");
        assert_eq!(parameter_name("/web"), "/web");
    }
}
