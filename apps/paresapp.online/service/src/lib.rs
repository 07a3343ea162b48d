use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::SystemTime;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Utc;
use pares_domain::admin::{AdminUserAction, AdminUserFilter, AdminUserView};
use pares_domain::catalog::{NewPackage, PackageFilter, PackageListing};
use pares_domain::commission::CommissionSettingsPatch;
use pares_domain::profile::{ProfileUpdate, ProfileView, ProviderProfileView};
use pares_domain::scheduling::{
    AppointmentChange, AppointmentFilter, ensure_time_range, parse_clock_time, parse_date,
};
use pares_domain::settings::{ProviderSettings, UserSettings};
use pares_domain::{
    Category, CommissionSettings, Package, PackagePurchase, TransactionStatus, TransactionType,
    User, UserType, ValidationError,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod api_envelope;
pub mod auth;
pub mod config;
pub mod marketplace_store;
pub mod observability;
pub mod openapi;
pub mod session_token;

use crate::api_envelope::{
    ApiErrorCode, ApiErrorTuple, created_data, error_response_with_status, forbidden_error,
    internal_error, json_rejection_error, not_found_error, ok_data, unauthorized_error,
    validation_error,
};
use crate::auth::{
    AuthError, AuthService, AuthenticatedSession, LoginRequest, PasswordHashing, RegisterRequest,
    seeded_store,
};
use crate::config::Config;
use crate::marketplace_store::{
    MarketplaceStore, MarketplaceStoreError, NewAppointment, OutgoingMessage, TransactionFilter,
};
use crate::observability::{AuditEvent, Observability};
use crate::openapi::{
    ROUTE_ADMIN_COMMISSION, ROUTE_ADMIN_STATS, ROUTE_ADMIN_TRANSACTIONS, ROUTE_ADMIN_USERS,
    ROUTE_APPOINTMENTS, ROUTE_APPOINTMENTS_BY_ID, ROUTE_AUTH_LOGIN, ROUTE_AUTH_LOGOUT,
    ROUTE_AUTH_ME, ROUTE_AUTH_REGISTER, ROUTE_CATEGORIES, ROUTE_CUSTOMER_PURCHASES, ROUTE_HEALTHZ,
    ROUTE_MESSAGES, ROUTE_OPENAPI_JSON, ROUTE_PACKAGES, ROUTE_PACKAGES_BY_ID, ROUTE_PROFILE,
    ROUTE_PROVIDER_PACKAGES, ROUTE_PROVIDER_PROFILE, ROUTE_PROVIDER_SETTINGS, ROUTE_PROVIDER_STATS,
    ROUTE_SETTINGS, openapi_document,
};

pub const SERVICE_NAME: &str = "pares-marketplace-service";
const CACHE_MANIFEST: &str = "no-cache, no-store, must-revalidate";
const HEADER_X_FORWARDED_FOR: &str = "x-forwarded-for";
const HEADER_X_REAL_IP: &str = "x-real-ip";

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    auth: AuthService,
    observability: Observability,
    store: MarketplaceStore,
    throttle_state: ThrottleState,
    started_at: SystemTime,
}

#[derive(Clone, Default)]
struct ThrottleState {
    buckets: Arc<Mutex<HashMap<String, VecDeque<i64>>>>,
}

/// The caller resolved by a session gate.
#[derive(Clone)]
struct SessionUser(User);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    uptime_seconds: u64,
    seeded: bool,
    counters: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize)]
struct UserPayload {
    user: User,
}

#[derive(Debug, Serialize)]
struct AdminUserPayload {
    user: AdminUserView,
}

#[derive(Debug, Serialize)]
struct LogoutPayload {
    #[serde(rename = "loggedOut")]
    logged_out: bool,
}

#[derive(Debug, Serialize)]
struct PackageSearchPayload {
    packages: Vec<PackageListing>,
    categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
struct PackagePayload {
    package: Package,
}

#[derive(Debug, Serialize)]
struct PurchasePayload {
    purchase: PackagePurchase,
}

#[derive(Debug, Serialize)]
struct CommissionPayload {
    settings: CommissionSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageSearchQuery {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    featured: Option<String>,
    #[serde(default)]
    min_price: Option<String>,
    #[serde(default)]
    max_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePackageRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    session_count: Option<u32>,
    #[serde(default)]
    duration_minutes: Option<u32>,
    #[serde(default)]
    validity_days: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePurchaseRequest {
    #[serde(default)]
    package_id: Option<String>,
    #[serde(default)]
    promotion_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentsQuery {
    #[serde(default)]
    provider_id: Option<String>,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAppointmentRequest {
    #[serde(default)]
    package_purchase_id: Option<String>,
    #[serde(default)]
    customer_id: Option<String>,
    #[serde(default)]
    service_provider_id: Option<String>,
    #[serde(default)]
    appointment_date: Option<String>,
    #[serde(default)]
    start_time: Option<String>,
    #[serde(default)]
    end_time: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateAppointmentRequest {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagesQuery {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    sender_id: Option<String>,
    #[serde(default)]
    receiver_id: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminUsersQuery {
    #[serde(default)]
    user_type: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminUserActionRequest {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    action: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TransactionsQuery {
    #[serde(default, rename = "type")]
    transaction_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

pub fn build_router(config: Config) -> Router {
    build_router_with_observability(config, Observability::default())
}

pub fn build_router_with_observability(config: Config, observability: Observability) -> Router {
    let store = if config.seed_demo_data {
        seeded_store(&PasswordHashing::from_config(&config), Utc::now())
    } else {
        MarketplaceStore::default()
    };
    let auth = AuthService::from_config(&config, store.clone());
    let state = AppState {
        config: Arc::new(config),
        auth,
        observability,
        store,
        throttle_state: ThrottleState::default(),
        started_at: SystemTime::now(),
    };

    let public_router = Router::new()
        .route(ROUTE_HEALTHZ, get(health))
        .route(ROUTE_OPENAPI_JSON, get(openapi_spec))
        .route(
            ROUTE_AUTH_LOGIN,
            post(login).route_layer(middleware::from_fn_with_state(
                state.clone(),
                throttle_auth_gate,
            )),
        )
        .route(
            ROUTE_AUTH_REGISTER,
            post(register).route_layer(middleware::from_fn_with_state(
                state.clone(),
                throttle_auth_gate,
            )),
        )
        .route(ROUTE_AUTH_LOGOUT, post(logout))
        .route(ROUTE_AUTH_ME, get(me))
        .route(ROUTE_CATEGORIES, get(list_categories))
        .route(ROUTE_PACKAGES, get(search_packages))
        .route(ROUTE_PACKAGES_BY_ID, get(show_package));

    let session_router = Router::new()
        .route(ROUTE_PROFILE, get(show_profile).put(update_profile))
        .route(ROUTE_SETTINGS, get(show_settings).put(update_settings))
        .route(
            ROUTE_APPOINTMENTS,
            get(list_appointments).post(create_appointment),
        )
        .route(
            ROUTE_APPOINTMENTS_BY_ID,
            patch(update_appointment).delete(cancel_appointment),
        )
        .route(ROUTE_MESSAGES, get(list_messages).post(send_message))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_gate,
        ));

    let customer_router = Router::new()
        .route(
            ROUTE_CUSTOMER_PURCHASES,
            get(list_purchases).post(create_purchase),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            customer_gate,
        ));

    let provider_router = Router::new()
        .route(
            ROUTE_PROVIDER_PACKAGES,
            get(list_provider_packages).post(create_provider_package),
        )
        .route(ROUTE_PROVIDER_STATS, get(show_provider_stats))
        .route(
            ROUTE_PROVIDER_PROFILE,
            get(show_provider_profile).put(update_provider_profile),
        )
        .route(
            ROUTE_PROVIDER_SETTINGS,
            get(show_provider_settings).put(update_provider_settings),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            provider_gate,
        ));

    let admin_router = Router::new()
        .route(
            ROUTE_ADMIN_USERS,
            get(list_admin_users).patch(update_admin_user),
        )
        .route(ROUTE_ADMIN_STATS, get(show_admin_stats))
        .route(ROUTE_ADMIN_TRANSACTIONS, get(list_transactions))
        .route(
            ROUTE_ADMIN_COMMISSION,
            get(show_commission).put(update_commission),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), admin_gate));

    Router::new()
        .merge(public_router)
        .merge(session_router)
        .merge(customer_router)
        .merge(provider_router)
        .merge(admin_router)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http()),
        )
}

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let bind_addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, service = SERVICE_NAME, "marketplace service listening");
    axum::serve(listener, build_router(config)).await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = match state.started_at.elapsed() {
        Ok(duration) => duration.as_secs(),
        Err(_) => 0,
    };

    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds,
        seeded: state.store.is_seeded().await,
        counters: state.observability.counters(),
    })
}

async fn openapi_spec() -> Result<Response, ApiErrorTuple> {
    let encoded = serde_json::to_vec(&openapi_document())
        .map_err(|_| internal_error("Failed to generate OpenAPI document."))?;

    let mut response = Response::new(Body::from(encoded));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_MANIFEST));
    Ok(response)
}

// Gates

async fn session_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match active_user_from_headers(&state, request.headers()).await {
        Ok(user) => {
            request.extensions_mut().insert(SessionUser(user));
            next.run(request).await
        }
        Err(response) => response.into_response(),
    }
}

async fn customer_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    role_gate(&state, request, next, UserType::Customer).await
}

async fn provider_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    role_gate(&state, request, next, UserType::ServiceProvider).await
}

async fn admin_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    role_gate(&state, request, next, UserType::Admin).await
}

async fn role_gate(
    state: &AppState,
    mut request: Request,
    next: Next,
    role: UserType,
) -> Response {
    let user = match active_user_from_headers(state, request.headers()).await {
        Ok(user) => user,
        Err(response) => return response.into_response(),
    };

    if user.user_type != role {
        return forbidden_error("Forbidden.").into_response();
    }

    request.extensions_mut().insert(SessionUser(user));
    next.run(request).await
}

async fn throttle_auth_gate(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let key = format!("auth:{}", request_identity_key(request.headers()));
    match consume_throttle_token(
        &state.throttle_state,
        &key,
        state.config.auth_throttle_limit,
        state.config.auth_throttle_window_seconds,
    )
    .await
    {
        Ok(()) => next.run(request).await,
        Err(retry_after_seconds) => error_response_with_status(
            StatusCode::TOO_MANY_REQUESTS,
            ApiErrorCode::RateLimited,
            format!("Too many requests. Retry in {retry_after_seconds}s."),
        )
        .into_response(),
    }
}

/// Sliding window over request timestamps. `Err` carries the seconds until
/// the oldest request leaves the window.
async fn consume_throttle_token(
    throttle_state: &ThrottleState,
    bucket_key: &str,
    max_requests: usize,
    window_seconds: i64,
) -> Result<(), i64> {
    consume_throttle_token_at(
        throttle_state,
        bucket_key,
        max_requests,
        window_seconds,
        Utc::now().timestamp(),
    )
    .await
}

async fn consume_throttle_token_at(
    throttle_state: &ThrottleState,
    bucket_key: &str,
    max_requests: usize,
    window_seconds: i64,
    now_epoch: i64,
) -> Result<(), i64> {
    let window_start = now_epoch - window_seconds;

    let mut buckets = throttle_state.buckets.lock().await;
    // Drop buckets with no request left inside the window.
    buckets.retain(|_, bucket| bucket.back().is_some_and(|newest| *newest > window_start));
    let bucket = buckets.entry(bucket_key.to_string()).or_default();

    while bucket.front().is_some_and(|oldest| *oldest <= window_start) {
        let _ = bucket.pop_front();
    }

    if bucket.len() >= max_requests {
        let retry_after = bucket
            .front()
            .map(|oldest| ((*oldest + window_seconds) - now_epoch).max(1))
            .unwrap_or(1);
        return Err(retry_after);
    }

    bucket.push_back(now_epoch);
    Ok(())
}

async fn session_user_from_headers(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<User, ApiErrorTuple> {
    let access_token = access_token_from_headers(headers, &state.config.auth_cookie_name)
        .ok_or_else(|| unauthorized_error("Unauthenticated."))?;
    state
        .auth
        .authenticate(&access_token)
        .await
        .map_err(map_auth_error)
}

async fn active_user_from_headers(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<User, ApiErrorTuple> {
    let user = session_user_from_headers(state, headers).await?;
    if !user.is_active {
        return Err(forbidden_error("Forbidden."));
    }
    Ok(user)
}

fn request_identity_key(headers: &HeaderMap) -> String {
    if let Some(value) = header_string(headers, HEADER_X_FORWARDED_FOR) {
        let first_ip = value.split(',').next().unwrap_or_default().trim();
        if !first_ip.is_empty() {
            return format!("ip:{first_ip}");
        }
    }

    if let Some(ip) = header_string(headers, HEADER_X_REAL_IP) {
        return format!("ip:{ip}");
    }

    "ip:unknown".to_string()
}

// Auth

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let Json(payload) = payload.map_err(|rejection| json_rejection_error(&rejection))?;

    let session = match state.auth.login(payload).await {
        Ok(session) => session,
        Err(error) => {
            emit_auth_failure_event(&state, &request_id, "auth.login.failed", &error);
            return Err(map_auth_error(error));
        }
    };

    state.observability.audit(
        AuditEvent::new("auth.login.completed", request_id.clone())
            .with_user_id(session.user.id.clone())
            .with_attribute("user_type", session.user.user_type.as_str()),
    );
    state
        .observability
        .increment_counter("auth.login.completed", &request_id);

    session_response(&state, StatusCode::OK, session)
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let Json(payload) = payload.map_err(|rejection| json_rejection_error(&rejection))?;

    let session = match state.auth.register(payload).await {
        Ok(session) => session,
        Err(error) => {
            emit_auth_failure_event(&state, &request_id, "auth.register.failed", &error);
            return Err(map_auth_error(error));
        }
    };

    state.observability.audit(
        AuditEvent::new("auth.register.completed", request_id.clone())
            .with_user_id(session.user.id.clone())
            .with_attribute("user_type", session.user.user_type.as_str())
            .with_attribute(
                "email_domain",
                email_domain(&session.user.email).unwrap_or_else(|| "unknown".to_string()),
            ),
    );
    state
        .observability
        .increment_counter("auth.register.completed", &request_id);

    session_response(&state, StatusCode::CREATED, session)
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiErrorTuple> {
    let request_id = request_id(&headers);
    state
        .observability
        .audit(AuditEvent::new("auth.logout.completed", request_id.clone()));
    state
        .observability
        .increment_counter("auth.logout.completed", &request_id);

    let mut response = ok_data(LogoutPayload { logged_out: true }).into_response();
    append_set_cookie_header(&mut response, &clear_cookie(&state.config.auth_cookie_name))?;
    Ok(response)
}

async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let user = session_user_from_headers(&state, &headers).await?;
    Ok(ok_data(UserPayload { user }))
}

fn session_response(
    state: &AppState,
    status: StatusCode,
    session: AuthenticatedSession,
) -> Result<Response, ApiErrorTuple> {
    let cookie = auth_access_cookie(
        &state.config,
        &session.token.token,
        session.token.max_age_seconds,
    );
    let payload = UserPayload { user: session.user };
    let mut response = if status == StatusCode::CREATED {
        created_data(payload).into_response()
    } else {
        ok_data(payload).into_response()
    };
    append_set_cookie_header(&mut response, &cookie)?;
    Ok(response)
}

// Catalogue

async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    ok_data(state.store.active_categories().await)
}

async fn search_packages(
    State(state): State<AppState>,
    Query(query): Query<PackageSearchQuery>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let filter = PackageFilter::from_query(
        query.category.as_deref(),
        query.search.as_deref(),
        query.featured.as_deref(),
        query.min_price.as_deref(),
        query.max_price.as_deref(),
    )
    .map_err(map_validation_error)?;

    let (packages, categories) = state
        .store
        .search_packages(&filter, Utc::now().date_naive())
        .await;
    Ok(ok_data(PackageSearchPayload {
        packages,
        categories,
    }))
}

async fn show_package(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let listing = state
        .store
        .package_listing(&package_id, Utc::now().date_naive())
        .await
        .map_err(map_store_error)?;
    Ok(ok_data(listing))
}

async fn list_provider_packages(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let packages = state
        .store
        .provider_packages(&user.id)
        .await
        .map_err(map_store_error)?;
    Ok(ok_data(packages))
}

async fn create_provider_package(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(SessionUser(user)): Extension<SessionUser>,
    payload: Result<Json<CreatePackageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let Json(payload) = payload.map_err(|rejection| json_rejection_error(&rejection))?;

    let input = NewPackage {
        title: payload.title.unwrap_or_default(),
        description: payload.description.and_then(non_empty),
        category_id: payload.category_id.and_then(non_empty),
        price: payload.price.unwrap_or(0.0),
        session_count: payload.session_count.unwrap_or(0),
        duration_minutes: payload.duration_minutes,
        validity_days: payload.validity_days,
    };
    let package = state
        .store
        .create_package(&user.id, input)
        .await
        .map_err(map_store_error)?;

    state.observability.audit(
        AuditEvent::new("package.created", request_id.clone())
            .with_user_id(user.id.clone())
            .with_attribute("package_id", package.id.clone())
            .with_attribute("provider_id", package.service_provider_id.clone()),
    );
    state
        .observability
        .increment_counter("package.created", &request_id);

    Ok(created_data(PackagePayload { package }))
}

// Purchases

async fn list_purchases(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
) -> impl IntoResponse {
    ok_data(state.store.customer_purchases(&user.id).await)
}

async fn create_purchase(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(SessionUser(user)): Extension<SessionUser>,
    payload: Result<Json<CreatePurchaseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let Json(payload) = payload.map_err(|rejection| json_rejection_error(&rejection))?;

    let package_id = payload
        .package_id
        .and_then(non_empty)
        .ok_or_else(|| validation_error("packageId", "Package is required."))?;
    let promotion_id = payload.promotion_id.and_then(non_empty);

    let purchase = state
        .store
        .create_purchase(&user, &package_id, promotion_id.as_deref(), Utc::now())
        .await
        .map_err(map_store_error)?;

    let mut event = AuditEvent::new("purchase.created", request_id.clone())
        .with_user_id(user.id.clone())
        .with_attribute("purchase_id", purchase.id.clone())
        .with_attribute("package_id", purchase.package_id.clone())
        .with_attribute("final_price", format!("{:.2}", purchase.final_price))
        .with_attribute(
            "commission_amount",
            format!("{:.2}", purchase.commission_amount),
        );
    if let Some(promotion_id) = purchase.promotion_id.as_deref() {
        event = event.with_attribute("promotion_id", promotion_id);
    }
    state.observability.audit(event);
    state
        .observability
        .increment_counter("purchase.created", &request_id);

    Ok(created_data(PurchasePayload { purchase }))
}

// Appointments

async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Response, ApiErrorTuple> {
    let provider_id = query.provider_id.and_then(non_empty);
    let date = query.date.and_then(non_empty);

    if let (Some(provider_id), Some(date)) = (provider_id.as_deref(), date.as_deref()) {
        let date = parse_date("date", date).map_err(map_validation_error)?;
        let slots = state.store.open_slots(provider_id, date).await;
        return Ok(ok_data(slots).into_response());
    }

    let filter = AppointmentFilter {
        provider_id,
        customer_id: query.customer_id.and_then(non_empty),
    };
    Ok(ok_data(state.store.appointments(&filter).await).into_response())
}

async fn create_appointment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(SessionUser(user)): Extension<SessionUser>,
    payload: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let Json(payload) = payload.map_err(|rejection| json_rejection_error(&rejection))?;

    let package_purchase_id = required_field(
        payload.package_purchase_id,
        "packagePurchaseId",
        "Package purchase is required.",
    )?;
    let customer_id = required_field(payload.customer_id, "customerId", "Customer is required.")?;
    let service_provider_id = required_field(
        payload.service_provider_id,
        "serviceProviderId",
        "Service provider is required.",
    )?;
    let appointment_date = required_field(
        payload.appointment_date,
        "appointmentDate",
        "Appointment date is required.",
    )?;
    let start_time = required_field(payload.start_time, "startTime", "Start time is required.")?;
    let end_time = required_field(payload.end_time, "endTime", "End time is required.")?;

    let appointment_date =
        parse_date("appointmentDate", &appointment_date).map_err(map_validation_error)?;
    let start_time = parse_clock_time("startTime", &start_time).map_err(map_validation_error)?;
    let end_time = parse_clock_time("endTime", &end_time).map_err(map_validation_error)?;
    ensure_time_range(&start_time, &end_time).map_err(map_validation_error)?;

    let appointment = state
        .store
        .create_appointment(NewAppointment {
            package_purchase_id,
            customer_id,
            service_provider_id,
            appointment_date,
            start_time,
            end_time,
            notes: payload.notes.and_then(non_empty),
        })
        .await;

    state.observability.audit(
        AuditEvent::new("appointment.created", request_id.clone())
            .with_user_id(user.id.clone())
            .with_attribute("appointment_id", appointment.id.clone())
            .with_attribute("provider_id", appointment.service_provider_id.clone())
            .with_attribute("date", appointment.appointment_date.to_string()),
    );
    state
        .observability
        .increment_counter("appointment.created", &request_id);

    Ok(created_data(appointment))
}

async fn update_appointment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(SessionUser(user)): Extension<SessionUser>,
    Path(appointment_id): Path<String>,
    payload: Result<Json<UpdateAppointmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let Json(payload) = payload.map_err(|rejection| json_rejection_error(&rejection))?;

    let change = AppointmentChange {
        status: payload.status,
        notes: payload.notes,
    };
    let appointment = state
        .store
        .update_appointment(&appointment_id, &change, Utc::now())
        .await
        .map_err(map_store_error)?;

    state.observability.audit(
        AuditEvent::new("appointment.updated", request_id.clone())
            .with_user_id(user.id.clone())
            .with_attribute("appointment_id", appointment.id.clone())
            .with_attribute("status", appointment.status.as_str()),
    );
    state
        .observability
        .increment_counter("appointment.updated", &request_id);

    Ok(ok_data(appointment))
}

async fn cancel_appointment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(SessionUser(user)): Extension<SessionUser>,
    Path(appointment_id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let appointment = state
        .store
        .cancel_appointment(&appointment_id, Utc::now())
        .await
        .map_err(map_store_error)?;

    state.observability.audit(
        AuditEvent::new("appointment.cancelled", request_id.clone())
            .with_user_id(user.id.clone())
            .with_attribute("appointment_id", appointment.id.clone()),
    );
    state
        .observability
        .increment_counter("appointment.cancelled", &request_id);

    Ok(ok_data(appointment))
}

// Messaging

async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Response {
    if let Some(conversation_id) = query.conversation_id.and_then(non_empty) {
        return ok_data(state.store.messages(&conversation_id).await).into_response();
    }

    let user_id = query.user_id.and_then(non_empty);
    ok_data(state.store.conversations(user_id.as_deref()).await).into_response()
}

async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(SessionUser(user)): Extension<SessionUser>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let Json(payload) = payload.map_err(|rejection| json_rejection_error(&rejection))?;

    let message = state
        .store
        .send_message(
            OutgoingMessage {
                conversation_id: payload.conversation_id.and_then(non_empty),
                sender_id: payload.sender_id.unwrap_or_default(),
                receiver_id: payload.receiver_id.unwrap_or_default(),
                content: payload.content.unwrap_or_default(),
            },
            Utc::now(),
        )
        .await
        .map_err(map_store_error)?;

    state.observability.audit(
        AuditEvent::new("message.sent", request_id.clone())
            .with_user_id(user.id.clone())
            .with_attribute("conversation_id", message.conversation_id.clone())
            .with_attribute("message_id", message.id.clone()),
    );
    state
        .observability
        .increment_counter("message.sent", &request_id);

    Ok(created_data(message))
}

// Profile and settings

async fn show_profile(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let (user, details) = state
        .store
        .profile(&user.id)
        .await
        .map_err(map_store_error)?;
    Ok(ok_data(ProfileView::build(&user, &details)))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let Json(update) = payload.map_err(|rejection| json_rejection_error(&rejection))?;
    let (user, details) = state
        .store
        .update_profile(&user.id, update, Utc::now())
        .await
        .map_err(map_store_error)?;
    Ok(ok_data(ProfileView::build(&user, &details)))
}

async fn show_provider_profile(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let (user, details) = state
        .store
        .profile(&user.id)
        .await
        .map_err(map_store_error)?;
    Ok(ok_data(ProviderProfileView::build(&user, &details)))
}

async fn update_provider_profile(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let Json(update) = payload.map_err(|rejection| json_rejection_error(&rejection))?;
    let (user, details) = state
        .store
        .update_profile(&user.id, update, Utc::now())
        .await
        .map_err(map_store_error)?;
    Ok(ok_data(ProviderProfileView::build(&user, &details)))
}

async fn show_settings(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
) -> impl IntoResponse {
    ok_data(state.store.user_settings(&user.id).await)
}

async fn update_settings(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
    payload: Result<Json<UserSettings>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let Json(settings) = payload.map_err(|rejection| json_rejection_error(&rejection))?;
    let settings = state
        .store
        .save_user_settings(&user.id, settings)
        .await
        .map_err(map_store_error)?;
    Ok(ok_data(settings))
}

async fn show_provider_settings(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
) -> impl IntoResponse {
    ok_data(state.store.provider_settings(&user.id).await)
}

async fn update_provider_settings(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
    payload: Result<Json<ProviderSettings>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let Json(settings) = payload.map_err(|rejection| json_rejection_error(&rejection))?;
    let settings = state
        .store
        .save_provider_settings(&user.id, settings)
        .await
        .map_err(map_store_error)?;
    Ok(ok_data(settings))
}

async fn show_provider_stats(
    State(state): State<AppState>,
    Extension(SessionUser(user)): Extension<SessionUser>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let stats = state
        .store
        .provider_stats(&user.id, Utc::now().date_naive())
        .await
        .map_err(map_store_error)?;
    Ok(ok_data(stats))
}

// Administration

async fn list_admin_users(
    State(state): State<AppState>,
    Query(query): Query<AdminUsersQuery>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let filter = AdminUserFilter::from_query(
        query.user_type.as_deref(),
        query.search.as_deref(),
        query.status.as_deref(),
    )
    .map_err(map_validation_error)?;
    Ok(ok_data(state.store.admin_users(&filter).await))
}

async fn update_admin_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(SessionUser(admin)): Extension<SessionUser>,
    payload: Result<Json<AdminUserActionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let Json(payload) = payload.map_err(|rejection| json_rejection_error(&rejection))?;

    let user_id = required_field(payload.user_id, "userId", "User id is required.")?;
    let action = required_field(payload.action, "action", "Action is required.")?;
    let action = AdminUserAction::parse(&action).map_err(map_validation_error)?;

    let view = state
        .store
        .apply_admin_action(&user_id, action, Utc::now())
        .await
        .map_err(map_store_error)?;

    state.observability.audit(
        AuditEvent::new("admin.user.updated", request_id.clone())
            .with_user_id(admin.id.clone())
            .with_attribute("target_user_id", user_id)
            .with_attribute("action", action.as_str()),
    );
    state
        .observability
        .increment_counter("admin.user.updated", &request_id);

    Ok(ok_data(AdminUserPayload { user: view }))
}

async fn show_admin_stats(State(state): State<AppState>) -> impl IntoResponse {
    ok_data(state.store.admin_stats(Utc::now()).await)
}

async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let transaction_type = match query.transaction_type.and_then(non_empty_filter) {
        Some(raw) => Some(
            TransactionType::parse(&raw)
                .ok_or_else(|| validation_error("type", "Unknown transaction type."))?,
        ),
        None => None,
    };
    let status = match query.status.and_then(non_empty_filter) {
        Some(raw) => Some(
            TransactionStatus::parse(&raw)
                .ok_or_else(|| validation_error("status", "Unknown transaction status."))?,
        ),
        None => None,
    };

    let filter = TransactionFilter {
        transaction_type,
        status,
    };
    Ok(ok_data(state.store.transactions(&filter).await))
}

async fn show_commission(State(state): State<AppState>) -> impl IntoResponse {
    ok_data(state.store.commission_settings().await)
}

async fn update_commission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Extension(SessionUser(admin)): Extension<SessionUser>,
    payload: Result<Json<CommissionSettingsPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErrorTuple> {
    let request_id = request_id(&headers);
    let Json(patch) = payload.map_err(|rejection| json_rejection_error(&rejection))?;
    if patch.is_empty() {
        return Err(validation_error(
            "settings",
            "At least one commission field is required.",
        ));
    }

    let settings = state
        .store
        .update_commission_settings(patch)
        .await
        .map_err(map_store_error)?;

    state.observability.audit(
        AuditEvent::new("admin.commission.updated", request_id.clone())
            .with_user_id(admin.id.clone())
            .with_attribute("default_rate", format!("{:.2}", settings.default_rate))
            .with_attribute("custom_rates", settings.custom_rates.len().to_string()),
    );
    state
        .observability
        .increment_counter("admin.commission.updated", &request_id);

    Ok(ok_data(CommissionPayload { settings }))
}

// Error mapping

fn map_auth_error(error: AuthError) -> ApiErrorTuple {
    match error {
        AuthError::Validation { field, message } => validation_error(field, &message),
        AuthError::Unauthorized { message } => unauthorized_error(&message),
        AuthError::Forbidden { message } => forbidden_error(&message),
        AuthError::Conflict { message } => {
            error_response_with_status(StatusCode::CONFLICT, ApiErrorCode::Conflict, message)
        }
        AuthError::Internal { message } => {
            tracing::error!(%message, "auth operation failed");
            internal_error("Internal server error.")
        }
    }
}

fn map_store_error(error: MarketplaceStoreError) -> ApiErrorTuple {
    match error {
        MarketplaceStoreError::NotFound { resource } => {
            not_found_error(format!("{resource} not found."))
        }
        MarketplaceStoreError::Validation { field, message } => validation_error(field, &message),
        MarketplaceStoreError::Conflict { message } => {
            error_response_with_status(StatusCode::CONFLICT, ApiErrorCode::Conflict, message)
        }
    }
}

fn map_validation_error(error: ValidationError) -> ApiErrorTuple {
    validation_error(error.field, &error.message)
}

fn emit_auth_failure_event(
    state: &AppState,
    request_id: &str,
    event_name: &str,
    error: &AuthError,
) {
    let mut event = AuditEvent::new(event_name, request_id.to_string())
        .with_outcome("failure")
        .with_attribute("reason", error.reason());

    if let AuthError::Validation { field, .. } = error {
        event = event.with_attribute("field", *field);
    }

    state.observability.audit(event);
    state
        .observability
        .increment_counter(event_name, request_id);
}

// Request helpers

fn required_field(
    value: Option<String>,
    field: &'static str,
    message: &str,
) -> Result<String, ApiErrorTuple> {
    value
        .and_then(non_empty)
        .ok_or_else(|| validation_error(field, message))
}

fn auth_access_cookie(config: &Config, access_token: &str, max_age_seconds: u64) -> String {
    let mut cookie = format!(
        "{}={access_token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}",
        config.auth_cookie_name
    );
    if config.auth_cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn append_set_cookie_header(response: &mut Response, cookie: &str) -> Result<(), ApiErrorTuple> {
    response
        .headers_mut()
        .append(SET_COOKIE, header_value(cookie)?);
    Ok(())
}

fn header_value(raw: &str) -> Result<HeaderValue, ApiErrorTuple> {
    HeaderValue::from_str(raw).map_err(|_| internal_error("Failed to build response headers."))
}

fn extract_cookie_value(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for part in raw.split(';') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        if key == cookie_name {
            return non_empty(value.to_string());
        }
    }

    None
}

fn header_string(headers: &HeaderMap, key: &str) -> Option<String> {
    headers
        .get(key)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let authorization = headers.get(AUTHORIZATION)?.to_str().ok();
    session_token::extract_bearer_token(authorization).map(str::to_string)
}

fn access_token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    bearer_token(headers).or_else(|| extract_cookie_value(headers, cookie_name))
}

fn request_id(headers: &HeaderMap) -> String {
    header_string(headers, "x-request-id")
        .and_then(non_empty)
        .unwrap_or_else(|| format!("req_{}", uuid::Uuid::new_v4().simple()))
}

fn email_domain(email: &str) -> Option<String> {
    let domain = email.split('@').nth(1)?.trim();
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_string())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Like [`non_empty`], but also drops the `all` sentinel used by list filters.
fn non_empty_filter(value: String) -> Option<String> {
    non_empty(value).filter(|value| !value.eq_ignore_ascii_case("all"))
}

#[cfg(test)]
mod tests;
