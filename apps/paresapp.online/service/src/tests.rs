use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::body::Body;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use pares_domain::seed::{
    DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD, DEMO_CUSTOMER_EMAIL, DEMO_CUSTOMER_PASSWORD,
    DEMO_INACTIVE_EMAIL, DEMO_PROVIDER_EMAIL, DEMO_PROVIDER_PASSWORD,
};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::config::Config;
use crate::observability::{Observability, RecordingAuditSink};
use crate::{
    ThrottleState, build_router, build_router_with_observability, consume_throttle_token_at,
};

fn test_app() -> Router {
    build_router(Config::for_tests())
}

async fn read_json(response: axum::response::Response) -> Result<Value> {
    let bytes = response.into_body().collect().await?.to_bytes();
    let value = serde_json::from_slice::<Value>(&bytes)?;
    Ok(value)
}

fn set_cookie_header(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

fn cookie_pair(response: &axum::response::Response) -> Option<String> {
    set_cookie_header(response)?
        .split(';')
        .next()
        .map(ToString::to_string)
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

fn get_request(uri: &str, cookie: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    Ok(builder.body(Body::empty())?)
}

async fn login_cookie(app: &Router, email: &str, password: &str) -> Result<String> {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": email, "password": password }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK, "login as {email}");
    cookie_pair(&response).ok_or_else(|| anyhow::anyhow!("login did not set a cookie"))
}

async fn customer_cookie(app: &Router) -> Result<String> {
    login_cookie(app, DEMO_CUSTOMER_EMAIL, DEMO_CUSTOMER_PASSWORD).await
}

async fn provider_cookie(app: &Router) -> Result<String> {
    login_cookie(app, DEMO_PROVIDER_EMAIL, DEMO_PROVIDER_PASSWORD).await
}

async fn admin_cookie(app: &Router) -> Result<String> {
    login_cookie(app, DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD).await
}

#[tokio::test]
async fn healthz_reports_seeded_service() -> Result<()> {
    let app = test_app();
    let response = app.oneshot(get_request("/healthz", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "pares-marketplace-service");
    assert_eq!(body["seeded"], true);
    assert!(body["counters"].is_object());
    Ok(())
}

#[tokio::test]
async fn openapi_route_serves_uncached_json() -> Result<()> {
    let app = test_app();
    let response = app.oneshot(get_request("/openapi.json", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
        Some("application/json")
    );
    assert_eq!(
        response.headers().get(CACHE_CONTROL).and_then(|v| v.to_str().ok()),
        Some("no-cache, no-store, must-revalidate")
    );

    let body = read_json(response).await?;
    assert_eq!(body["openapi"], "3.0.2");
    assert!(body["paths"]["/api/packages/{id}"]["get"].is_object());
    Ok(())
}

#[tokio::test]
async fn login_sets_http_only_session_cookie() -> Result<()> {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "  Customer@Example.com ", "password": DEMO_CUSTOMER_PASSWORD }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = set_cookie_header(&response).unwrap_or_default();
    assert!(set_cookie.starts_with("auth-token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=604800"));
    assert!(!set_cookie.contains("Secure"));

    let body = read_json(response).await?;
    assert_eq!(body["data"]["user"]["id"], "usr_customer_mehmet");
    assert_eq!(body["data"]["user"]["userType"], "customer");
    assert!(body["data"]["user"].get("password").is_none());
    assert!(body["data"]["user"].get("passwordHash").is_none());
    Ok(())
}

#[tokio::test]
async fn login_rejects_bad_credentials_and_inactive_accounts() -> Result<()> {
    let app = test_app();

    let wrong = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": DEMO_CUSTOMER_EMAIL, "password": "nope" }),
        )?)
        .await?;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie_header(&wrong).is_none());
    let body = read_json(wrong).await?;
    assert_eq!(body["error"]["code"], "unauthorized");

    let inactive = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": DEMO_INACTIVE_EMAIL, "password": DEMO_CUSTOMER_PASSWORD }),
        )?)
        .await?;
    assert_eq!(inactive.status(), StatusCode::FORBIDDEN);

    let missing = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": DEMO_CUSTOMER_EMAIL }),
        )?)
        .await?;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    let body = read_json(missing).await?;
    assert!(body["errors"]["password"].is_array());
    Ok(())
}

#[tokio::test]
async fn me_accepts_cookie_or_bearer_and_logout_clears_cookie() -> Result<()> {
    let app = test_app();
    let cookie = customer_cookie(&app).await?;

    let via_cookie = app
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&cookie))?)
        .await?;
    assert_eq!(via_cookie.status(), StatusCode::OK);
    let body = read_json(via_cookie).await?;
    assert_eq!(body["data"]["user"]["email"], DEMO_CUSTOMER_EMAIL);

    let token = cookie.trim_start_matches("auth-token=");
    let via_bearer = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/auth/me")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(via_bearer.status(), StatusCode::OK);

    let mixed_cookies = format!("theme; locale=tr; {cookie}; consent");
    let via_mixed = app
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&mixed_cookies))?)
        .await?;
    assert_eq!(via_mixed.status(), StatusCode::OK);
    let body = read_json(via_mixed).await?;
    assert_eq!(body["data"]["user"]["email"], DEMO_CUSTOMER_EMAIL);

    let anonymous = app
        .clone()
        .oneshot(get_request("/api/auth/me", None)?)
        .await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .clone()
        .oneshot(get_request("/api/auth/me", Some("auth-token=not-a-jwt"))?)
        .await?;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let logout = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/logout", Some(&cookie), json!({}))?)
        .await?;
    assert_eq!(logout.status(), StatusCode::OK);
    let cleared = set_cookie_header(&logout).unwrap_or_default();
    assert!(cleared.starts_with("auth-token=;"));
    assert!(cleared.contains("Max-Age=0"));
    let body = read_json(logout).await?;
    assert_eq!(body["data"]["loggedOut"], true);
    Ok(())
}

#[tokio::test]
async fn register_creates_account_and_session() -> Result<()> {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "email": "Elif.Arslan@Example.com",
                "password": "secret12",
                "firstName": "Elif",
                "lastName": "Arslan",
                "userType": "service_provider"
            }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = cookie_pair(&response).unwrap_or_default();
    assert!(cookie.starts_with("auth-token="));
    let body = read_json(response).await?;
    assert_eq!(body["data"]["user"]["email"], "elif.arslan@example.com");
    assert_eq!(body["data"]["user"]["userType"], "service_provider");

    // The new provider owns an empty catalogue.
    let packages = app
        .clone()
        .oneshot(get_request("/api/provider/packages", Some(&cookie))?)
        .await?;
    assert_eq!(packages.status(), StatusCode::OK);
    let body = read_json(packages).await?;
    assert_eq!(body["data"], json!([]));

    let duplicate = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "email": DEMO_CUSTOMER_EMAIL,
                "password": "secret12",
                "firstName": "Dup",
                "lastName": "User"
            }),
        )?)
        .await?;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let short_password = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "email": "short@example.com",
                "password": "123",
                "firstName": "Short",
                "lastName": "Password"
            }),
        )?)
        .await?;
    assert_eq!(short_password.status(), StatusCode::BAD_REQUEST);
    let body = read_json(short_password).await?;
    assert!(body["errors"]["password"].is_array());

    let admin_signup = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({
                "email": "root@example.com",
                "password": "secret12",
                "firstName": "Root",
                "lastName": "User",
                "userType": "admin"
            }),
        )?)
        .await?;
    assert_eq!(admin_signup.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_json_bodies_use_error_envelope() -> Result<()> {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from("{\"email\":"))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await?;
    assert_eq!(body["error"]["code"], "invalid_request");
    assert!(body["message"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn auth_routes_are_throttled_per_client() -> Result<()> {
    let mut config = Config::for_tests();
    config.auth_throttle_limit = 2;
    let app = build_router(config);

    let attempt = |ip: &'static str| -> Result<Request<Body>> {
        Ok(Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .header("x-forwarded-for", ip)
            .body(Body::from(
                json!({ "email": DEMO_CUSTOMER_EMAIL, "password": "wrong" }).to_string(),
            ))?)
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(attempt("203.0.113.9")?).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let limited = app.clone().oneshot(attempt("203.0.113.9")?).await?;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = read_json(limited).await?;
    assert_eq!(body["error"]["code"], "rate_limited");

    let other_client = app.clone().oneshot(attempt("198.51.100.4")?).await?;
    assert_eq!(other_client.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn throttle_evicts_clients_idle_past_the_window() {
    let throttle = ThrottleState::default();
    for client in ["ip:203.0.113.1", "ip:203.0.113.2", "ip:203.0.113.3"] {
        assert_eq!(consume_throttle_token_at(&throttle, client, 2, 60, 1_000).await, Ok(()));
    }
    assert_eq!(throttle.buckets.lock().await.len(), 3);

    assert_eq!(
        consume_throttle_token_at(&throttle, "ip:203.0.113.1", 2, 60, 1_030).await,
        Ok(())
    );
    assert_eq!(
        consume_throttle_token_at(&throttle, "ip:203.0.113.1", 2, 60, 1_040).await,
        Err(20)
    );

    assert_eq!(
        consume_throttle_token_at(&throttle, "ip:198.51.100.7", 2, 60, 1_061).await,
        Ok(())
    );
    let buckets = throttle.buckets.lock().await;
    assert_eq!(buckets.len(), 2);
    assert!(buckets.contains_key("ip:203.0.113.1"));
    assert!(buckets.contains_key("ip:198.51.100.7"));
}

#[tokio::test]
async fn role_gates_distinguish_missing_and_wrong_roles() -> Result<()> {
    let app = test_app();

    let anonymous = app
        .clone()
        .oneshot(get_request("/api/admin/stats", None)?)
        .await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let customer = customer_cookie(&app).await?;
    let forbidden = app
        .clone()
        .oneshot(get_request("/api/admin/stats", Some(&customer))?)
        .await?;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);
    let body = read_json(forbidden).await?;
    assert_eq!(body["error"]["code"], "forbidden");

    let provider_only = app
        .clone()
        .oneshot(get_request("/api/provider/stats", Some(&customer))?)
        .await?;
    assert_eq!(provider_only.status(), StatusCode::FORBIDDEN);

    let provider = provider_cookie(&app).await?;
    let customer_only = app
        .clone()
        .oneshot(get_request("/api/customer/purchases", Some(&provider))?)
        .await?;
    assert_eq!(customer_only.status(), StatusCode::FORBIDDEN);

    let session_only = app
        .clone()
        .oneshot(get_request("/api/appointments", None)?)
        .await?;
    assert_eq!(session_only.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn categories_and_package_search_are_public() -> Result<()> {
    let app = test_app();

    let categories = app
        .clone()
        .oneshot(get_request("/api/categories", None)?)
        .await?;
    assert_eq!(categories.status(), StatusCode::OK);
    let body = read_json(categories).await?;
    let rows = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row["isActive"] == true));

    let all = app
        .clone()
        .oneshot(get_request("/api/packages", None)?)
        .await?;
    assert_eq!(all.status(), StatusCode::OK);
    let body = read_json(all).await?;
    let packages = body["data"]["packages"].as_array().cloned().unwrap_or_default();
    assert_eq!(packages.len(), 5);
    assert!(packages.iter().all(|row| row["id"] != "pkg_winter_2"));
    assert_eq!(
        body["data"]["categories"].as_array().map(Vec::len),
        Some(4)
    );

    let featured = app
        .clone()
        .oneshot(get_request("/api/packages?featured=true&category=all", None)?)
        .await?;
    let body = read_json(featured).await?;
    let packages = body["data"]["packages"].as_array().cloned().unwrap_or_default();
    assert!(!packages.is_empty());
    assert!(packages.iter().all(|row| row["isFeatured"] == true));

    let priced = app
        .clone()
        .oneshot(get_request("/api/packages?minPrice=1000&maxPrice=2500", None)?)
        .await?;
    let body = read_json(priced).await?;
    let packages = body["data"]["packages"].as_array().cloned().unwrap_or_default();
    assert_eq!(packages.len(), 2);
    for row in &packages {
        let price = row["price"].as_f64().unwrap_or_default();
        assert!((1000.0..=2500.0).contains(&price));
    }

    let bad_price = app
        .clone()
        .oneshot(get_request("/api/packages?minPrice=abc", None)?)
        .await?;
    assert_eq!(bad_price.status(), StatusCode::BAD_REQUEST);
    let body = read_json(bad_price).await?;
    assert!(body["errors"]["minPrice"].is_array());
    Ok(())
}

#[tokio::test]
async fn package_detail_includes_provider_and_live_promotions() -> Result<()> {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(get_request("/api/packages/pkg_pilates_8", None)?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await?;
    assert_eq!(body["data"]["id"], "pkg_pilates_8");
    assert_eq!(body["data"]["serviceProvider"]["id"], "sp_ayse");
    assert_eq!(body["data"]["category"]["id"], "cat_fitness");
    let promotions = body["data"]["promotions"].as_array().cloned().unwrap_or_default();
    assert!(promotions.iter().any(|row| row["id"] == "promo_pilates_spring"));

    // Retired packages stay reachable by id for existing purchase links.
    let retired = app
        .clone()
        .oneshot(get_request("/api/packages/pkg_winter_2", None)?)
        .await?;
    assert_eq!(retired.status(), StatusCode::OK);
    let body = read_json(retired).await?;
    assert_eq!(body["data"]["isActive"], false);

    let missing = app
        .clone()
        .oneshot(get_request("/api/packages/pkg_missing", None)?)
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = read_json(missing).await?;
    assert_eq!(body["error"]["code"], "not_found");
    Ok(())
}

#[tokio::test]
async fn customer_purchase_applies_promotion_and_records_commission() -> Result<()> {
    let app = test_app();
    let customer = customer_cookie(&app).await?;

    let before = app
        .clone()
        .oneshot(get_request("/api/customer/purchases", Some(&customer))?)
        .await?;
    assert_eq!(before.status(), StatusCode::OK);
    let body = read_json(before).await?;
    let before_count = body["data"].as_array().map_or(0, Vec::len);
    assert_eq!(before_count, 2);
    assert!(body["data"][0]["package"].is_object());

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/customer/purchases",
            Some(&customer),
            json!({ "packageId": "pkg_pilates_8", "promotionId": "promo_pilates_spring" }),
        )?)
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json(created).await?;
    let purchase = &body["data"]["purchase"];
    assert_eq!(purchase["originalPrice"], 2400.0);
    assert_eq!(purchase["finalPrice"], 2040.0);
    assert_eq!(purchase["commissionAmount"], 204.0);
    assert_eq!(purchase["sessionsRemaining"], 8);
    assert_eq!(purchase["promotionId"], "promo_pilates_spring");

    let after = app
        .clone()
        .oneshot(get_request("/api/customer/purchases", Some(&customer))?)
        .await?;
    let body = read_json(after).await?;
    assert_eq!(body["data"].as_array().map_or(0, Vec::len), before_count + 1);

    let admin = admin_cookie(&app).await?;
    let ledger = app
        .clone()
        .oneshot(get_request(
            "/api/admin/transactions?type=commission",
            Some(&admin),
        )?)
        .await?;
    let body = read_json(ledger).await?;
    assert_eq!(body["data"][0]["amount"], 204.0);
    assert_eq!(body["data"][0]["customerName"], "Mehmet Demir");

    let missing_package = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/customer/purchases",
            Some(&customer),
            json!({}),
        )?)
        .await?;
    assert_eq!(missing_package.status(), StatusCode::BAD_REQUEST);

    let foreign_promotion = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/customer/purchases",
            Some(&customer),
            json!({ "packageId": "pkg_pilates_8", "promotionId": "promo_massage_bonus" }),
        )?)
        .await?;
    assert_eq!(foreign_promotion.status(), StatusCode::BAD_REQUEST);

    let unknown_package = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/customer/purchases",
            Some(&customer),
            json!({ "packageId": "pkg_missing" }),
        )?)
        .await?;
    assert_eq!(unknown_package.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn appointments_list_slots_and_book() -> Result<()> {
    let app = test_app();
    let customer = customer_cookie(&app).await?;
    let date = (Utc::now().date_naive() + Duration::days(2)).to_string();

    let slots = app
        .clone()
        .oneshot(get_request(
            &format!("/api/appointments?providerId=sp_ayse&date={date}"),
            Some(&customer),
        )?)
        .await?;
    assert_eq!(slots.status(), StatusCode::OK);
    let body = read_json(slots).await?;
    let open: Vec<String> = serde_json::from_value(body["data"].clone())?;
    assert!(open.contains(&"09:00".to_string()));
    assert!(!open.contains(&"10:00".to_string()));
    assert!(!open.contains(&"11:00".to_string()));

    let mine = app
        .clone()
        .oneshot(get_request(
            "/api/appointments?customerId=usr_customer_mehmet",
            Some(&customer),
        )?)
        .await?;
    let body = read_json(mine).await?;
    let rows = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row["customerId"] == "usr_customer_mehmet"));

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/appointments",
            Some(&customer),
            json!({
                "packagePurchaseId": "pur_mehmet_pilates",
                "customerId": "usr_customer_mehmet",
                "serviceProviderId": "sp_ayse",
                "appointmentDate": date,
                "startTime": "09:00",
                "endTime": "10:00",
                "notes": "İlk ders"
            }),
        )?)
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json(created).await?;
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["notes"], "İlk ders");

    let after = app
        .clone()
        .oneshot(get_request(
            &format!("/api/appointments?providerId=sp_ayse&date={date}"),
            Some(&customer),
        )?)
        .await?;
    let body = read_json(after).await?;
    let open: Vec<String> = serde_json::from_value(body["data"].clone())?;
    assert!(!open.contains(&"09:00".to_string()));

    let backwards = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/appointments",
            Some(&customer),
            json!({
                "packagePurchaseId": "pur_mehmet_pilates",
                "customerId": "usr_customer_mehmet",
                "serviceProviderId": "sp_ayse",
                "appointmentDate": date,
                "startTime": "14:00",
                "endTime": "13:00"
            }),
        )?)
        .await?;
    assert_eq!(backwards.status(), StatusCode::BAD_REQUEST);

    let missing_field = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/appointments",
            Some(&customer),
            json!({ "customerId": "usr_customer_mehmet" }),
        )?)
        .await?;
    assert_eq!(missing_field.status(), StatusCode::BAD_REQUEST);
    let body = read_json(missing_field).await?;
    assert!(body["errors"]["packagePurchaseId"].is_array());

    let bad_date = app
        .clone()
        .oneshot(get_request(
            "/api/appointments?providerId=sp_ayse&date=next-week",
            Some(&customer),
        )?)
        .await?;
    assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn appointments_can_be_updated_and_cancelled() -> Result<()> {
    let app = test_app();
    let provider = provider_cookie(&app).await?;

    let confirmed = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/appointments/apt_mehmet_massage",
            Some(&provider),
            json!({ "status": "confirmed", "notes": "Havlu getirin" }),
        )?)
        .await?;
    assert_eq!(confirmed.status(), StatusCode::OK);
    let body = read_json(confirmed).await?;
    assert_eq!(body["data"]["status"], "confirmed");
    assert_eq!(body["data"]["notes"], "Havlu getirin");

    let unknown_status = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/appointments/apt_mehmet_massage",
            Some(&provider),
            json!({ "status": "postponed" }),
        )?)
        .await?;
    assert_eq!(unknown_status.status(), StatusCode::BAD_REQUEST);

    let cancelled = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/appointments/apt_mehmet_next")
                .header("cookie", &provider)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(cancelled.status(), StatusCode::OK);
    let body = read_json(cancelled).await?;
    assert_eq!(body["data"]["status"], "cancelled");

    let missing = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/appointments/apt_missing")
                .header("cookie", &provider)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn messages_list_threads_and_send() -> Result<()> {
    let app = test_app();
    let customer = customer_cookie(&app).await?;

    let threads = app
        .clone()
        .oneshot(get_request(
            "/api/messages?userId=usr_customer_mehmet",
            Some(&customer),
        )?)
        .await?;
    assert_eq!(threads.status(), StatusCode::OK);
    let body = read_json(threads).await?;
    let rows = body["data"].as_array().cloned().unwrap_or_default();
    assert!(rows.iter().any(|row| row["id"] == "conv_mehmet_ayse"));
    assert!(rows.iter().all(|row| row["id"] != "conv_zeynep_can"));

    let sent = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/messages",
            Some(&customer),
            json!({
                "conversationId": "conv_mehmet_ayse",
                "senderId": "usr_customer_mehmet",
                "receiverId": "usr_provider_ayse",
                "content": "Cuma günü uygun musunuz?"
            }),
        )?)
        .await?;
    assert_eq!(sent.status(), StatusCode::CREATED);
    let body = read_json(sent).await?;
    assert_eq!(body["data"]["conversationId"], "conv_mehmet_ayse");

    let thread = app
        .clone()
        .oneshot(get_request(
            "/api/messages?conversationId=conv_mehmet_ayse",
            Some(&customer),
        )?)
        .await?;
    let body = read_json(thread).await?;
    let messages = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(
        messages.last().map(|row| row["content"].clone()),
        Some(json!("Cuma günü uygun musunuz?"))
    );

    let empty = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/messages",
            Some(&customer),
            json!({
                "senderId": "usr_customer_mehmet",
                "receiverId": "usr_provider_ayse",
                "content": "   "
            }),
        )?)
        .await?;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn profile_and_settings_round_trip_for_the_caller() -> Result<()> {
    let app = test_app();
    let customer = customer_cookie(&app).await?;

    let profile = app
        .clone()
        .oneshot(get_request("/api/profile", Some(&customer))?)
        .await?;
    assert_eq!(profile.status(), StatusCode::OK);
    let body = read_json(profile).await?;
    assert_eq!(body["data"]["firstName"], "Mehmet");
    assert_eq!(body["data"]["district"], "Üsküdar");

    let updated = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/profile",
            Some(&customer),
            json!({ "city": "Ankara", "interests": ["Yoga"] }),
        )?)
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let body = read_json(updated).await?;
    assert_eq!(body["data"]["city"], "Ankara");
    assert_eq!(body["data"]["interests"], json!(["Yoga"]));

    let blank_name = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/profile",
            Some(&customer),
            json!({ "firstName": "  " }),
        )?)
        .await?;
    assert_eq!(blank_name.status(), StatusCode::BAD_REQUEST);

    let settings = app
        .clone()
        .oneshot(get_request("/api/settings", Some(&customer))?)
        .await?;
    let body = read_json(settings).await?;
    assert_eq!(body["data"]["profileVisibility"], "public");

    let saved = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/settings",
            Some(&customer),
            json!({ "profileVisibility": "private", "weeklyDigest": true }),
        )?)
        .await?;
    assert_eq!(saved.status(), StatusCode::OK);
    let reread = app
        .clone()
        .oneshot(get_request("/api/settings", Some(&customer))?)
        .await?;
    let body = read_json(reread).await?;
    assert_eq!(body["data"]["profileVisibility"], "private");
    assert_eq!(body["data"]["weeklyDigest"], true);

    let invalid = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/settings",
            Some(&customer),
            json!({ "profileVisibility": "secret" }),
        )?)
        .await?;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn provider_dashboard_routes_scope_to_the_caller() -> Result<()> {
    let app = test_app();
    let provider = provider_cookie(&app).await?;

    let packages = app
        .clone()
        .oneshot(get_request("/api/provider/packages", Some(&provider))?)
        .await?;
    assert_eq!(packages.status(), StatusCode::OK);
    let body = read_json(packages).await?;
    let rows = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row["serviceProviderId"] == "sp_ayse"));

    let created = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/provider/packages",
            Some(&provider),
            json!({
                "title": "10 Seans Mat Pilates",
                "categoryId": "cat_fitness",
                "price": 1800,
                "sessionCount": 10
            }),
        )?)
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json(created).await?;
    assert_eq!(body["data"]["package"]["serviceProviderId"], "sp_ayse");
    assert_eq!(body["data"]["package"]["isActive"], true);

    let invalid = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/provider/packages",
            Some(&provider),
            json!({ "title": "", "price": -5, "sessionCount": 0 }),
        )?)
        .await?;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    for (field, oversized) in [
        (
            "validityDays",
            json!({ "title": "Sonsuz", "price": 100, "sessionCount": 4, "validityDays": 4_000_000_000u64 }),
        ),
        (
            "sessionCount",
            json!({ "title": "Sonsuz", "price": 100, "sessionCount": 1001 }),
        ),
        (
            "durationMinutes",
            json!({ "title": "Sonsuz", "price": 100, "sessionCount": 4, "durationMinutes": 1441 }),
        ),
    ] {
        let rejected = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/provider/packages",
                Some(&provider),
                oversized,
            )?)
            .await?;
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST, "{field}");
        let body = read_json(rejected).await?;
        assert!(body["errors"][field].is_array(), "{field}");
    }

    let stats = app
        .clone()
        .oneshot(get_request("/api/provider/stats", Some(&provider))?)
        .await?;
    assert_eq!(stats.status(), StatusCode::OK);
    let body = read_json(stats).await?;
    assert_eq!(body["data"]["totalPackages"], 4);

    let profile = app
        .clone()
        .oneshot(get_request("/api/provider/profile", Some(&provider))?)
        .await?;
    assert_eq!(profile.status(), StatusCode::OK);
    let body = read_json(profile).await?;
    assert_eq!(body["data"]["profession"], "Pilates Eğitmeni");

    let settings = app
        .clone()
        .oneshot(get_request("/api/provider/settings", Some(&provider))?)
        .await?;
    assert_eq!(settings.status(), StatusCode::OK);
    let body = read_json(settings).await?;
    assert!(body["data"]["autoAcceptBookings"].is_boolean());
    Ok(())
}

#[tokio::test]
async fn admin_can_filter_and_moderate_users() -> Result<()> {
    let app = test_app();
    let admin = admin_cookie(&app).await?;

    let customers = app
        .clone()
        .oneshot(get_request("/api/admin/users?userType=customer", Some(&admin))?)
        .await?;
    assert_eq!(customers.status(), StatusCode::OK);
    let body = read_json(customers).await?;
    let rows = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row["userType"] == "customer"));
    assert!(rows.iter().all(|row| row["totalSpent"].is_number()));

    let inactive = app
        .clone()
        .oneshot(get_request("/api/admin/users?status=inactive", Some(&admin))?)
        .await?;
    let body = read_json(inactive).await?;
    assert_eq!(body["data"].as_array().map_or(0, Vec::len), 1);

    let bad_filter = app
        .clone()
        .oneshot(get_request("/api/admin/users?userType=robot", Some(&admin))?)
        .await?;
    assert_eq!(bad_filter.status(), StatusCode::BAD_REQUEST);

    let verified = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/admin/users",
            Some(&admin),
            json!({ "userId": "usr_provider_can", "action": "verify" }),
        )?)
        .await?;
    assert_eq!(verified.status(), StatusCode::OK);
    let body = read_json(verified).await?;
    assert_eq!(body["data"]["user"]["serviceProvider"]["isVerified"], true);

    let deactivated = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/admin/users",
            Some(&admin),
            json!({ "userId": "usr_customer_zeynep", "action": "deactivate" }),
        )?)
        .await?;
    assert_eq!(deactivated.status(), StatusCode::OK);
    let body = read_json(deactivated).await?;
    assert_eq!(body["data"]["user"]["isActive"], false);

    let login = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": "zeynep.kaya@example.com", "password": DEMO_CUSTOMER_PASSWORD }),
        )?)
        .await?;
    assert_eq!(login.status(), StatusCode::FORBIDDEN);

    let unknown_action = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/admin/users",
            Some(&admin),
            json!({ "userId": "usr_customer_zeynep", "action": "ban" }),
        )?)
        .await?;
    assert_eq!(unknown_action.status(), StatusCode::BAD_REQUEST);

    let unknown_user = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/admin/users",
            Some(&admin),
            json!({ "userId": "usr_missing", "action": "activate" }),
        )?)
        .await?;
    assert_eq!(unknown_user.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn deactivated_sessions_lose_access_to_gated_routes() -> Result<()> {
    let app = test_app();
    let customer = customer_cookie(&app).await?;
    let admin = admin_cookie(&app).await?;

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/admin/users",
            Some(&admin),
            json!({ "userId": "usr_customer_mehmet", "action": "deactivate" }),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let purchases = app
        .clone()
        .oneshot(get_request("/api/customer/purchases", Some(&customer))?)
        .await?;
    assert_eq!(purchases.status(), StatusCode::FORBIDDEN);

    let me = app
        .clone()
        .oneshot(get_request("/api/auth/me", Some(&customer))?)
        .await?;
    assert_eq!(me.status(), StatusCode::OK);
    let body = read_json(me).await?;
    assert_eq!(body["data"]["user"]["isActive"], false);
    Ok(())
}

#[tokio::test]
async fn admin_stats_transactions_and_commission() -> Result<()> {
    let app = test_app();
    let admin = admin_cookie(&app).await?;

    let stats = app
        .clone()
        .oneshot(get_request("/api/admin/stats", Some(&admin))?)
        .await?;
    assert_eq!(stats.status(), StatusCode::OK);
    let body = read_json(stats).await?;
    assert_eq!(body["data"]["totalUsers"], 6);
    assert_eq!(body["data"]["totalCustomers"], 3);
    assert_eq!(body["data"]["totalServiceProviders"], 2);
    assert!(body["data"]["topCategories"].is_array());

    let commissions = app
        .clone()
        .oneshot(get_request(
            "/api/admin/transactions?type=commission&status=completed",
            Some(&admin),
        )?)
        .await?;
    let body = read_json(commissions).await?;
    let rows = body["data"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row["type"] == "commission"));

    let all = app
        .clone()
        .oneshot(get_request("/api/admin/transactions?type=all", Some(&admin))?)
        .await?;
    let body = read_json(all).await?;
    assert_eq!(body["data"].as_array().map_or(0, Vec::len), 6);

    let bad_type = app
        .clone()
        .oneshot(get_request("/api/admin/transactions?type=refund", Some(&admin))?)
        .await?;
    assert_eq!(bad_type.status(), StatusCode::BAD_REQUEST);

    let commission = app
        .clone()
        .oneshot(get_request("/api/admin/commission", Some(&admin))?)
        .await?;
    let body = read_json(commission).await?;
    assert_eq!(body["data"]["defaultRate"], 10.0);

    let updated = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/admin/commission",
            Some(&admin),
            json!({ "defaultRate": 12.5 }),
        )?)
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let body = read_json(updated).await?;
    assert_eq!(body["data"]["settings"]["defaultRate"], 12.5);
    assert_eq!(body["data"]["settings"]["maximumRate"], 20.0);

    let out_of_band = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/admin/commission",
            Some(&admin),
            json!({ "defaultRate": 150 }),
        )?)
        .await?;
    assert_eq!(out_of_band.status(), StatusCode::BAD_REQUEST);
    let body = read_json(out_of_band).await?;
    assert!(body["errors"]["defaultRate"].is_array());

    let empty = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/admin/commission",
            Some(&admin),
            json!({}),
        )?)
        .await?;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    let body = read_json(empty).await?;
    assert!(body["errors"]["settings"].is_array());
    Ok(())
}

#[tokio::test]
async fn handlers_emit_audit_events() -> Result<()> {
    let sink = Arc::new(RecordingAuditSink::default());
    let app = build_router_with_observability(
        Config::for_tests(),
        Observability::new(sink.clone()),
    );

    let failed = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": DEMO_CUSTOMER_EMAIL, "password": "wrong" }),
        )?)
        .await?;
    assert_eq!(failed.status(), StatusCode::UNAUTHORIZED);

    let customer = customer_cookie(&app).await?;
    let purchase = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/customer/purchases")
                .header("content-type", "application/json")
                .header("cookie", &customer)
                .header("x-request-id", "req_audit_purchase")
                .body(Body::from(json!({ "packageId": "pkg_yoga_4" }).to_string()))?,
        )
        .await?;
    assert_eq!(purchase.status(), StatusCode::CREATED);

    let events = sink.events();
    let failure = events
        .iter()
        .find(|event| event.event_name == "auth.login.failed")
        .ok_or_else(|| anyhow::anyhow!("missing auth.login.failed"))?;
    assert_eq!(failure.outcome, "failure");
    assert_eq!(
        failure.attributes.get("reason").map(String::as_str),
        Some("unauthorized")
    );

    assert!(
        events
            .iter()
            .any(|event| event.event_name == "auth.login.completed")
    );

    let created = events
        .iter()
        .find(|event| event.event_name == "purchase.created")
        .ok_or_else(|| anyhow::anyhow!("missing purchase.created"))?;
    assert_eq!(created.request_id, "req_audit_purchase");
    assert_eq!(created.user_id.as_deref(), Some("usr_customer_mehmet"));
    assert_eq!(
        created.attributes.get("package_id").map(String::as_str),
        Some("pkg_yoga_4")
    );

    let health = app.clone().oneshot(get_request("/healthz", None)?).await?;
    let body = read_json(health).await?;
    assert_eq!(body["counters"]["purchase.created"], 1);
    Ok(())
}

#[tokio::test]
async fn unseeded_service_starts_empty() -> Result<()> {
    let mut config = Config::for_tests();
    config.seed_demo_data = false;
    let app = build_router(config);

    let health = app.clone().oneshot(get_request("/healthz", None)?).await?;
    let body = read_json(health).await?;
    assert_eq!(body["seeded"], false);

    let packages = app
        .clone()
        .oneshot(get_request("/api/packages", None)?)
        .await?;
    let body = read_json(packages).await?;
    assert_eq!(body["data"]["packages"], json!([]));

    let login = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({ "email": DEMO_ADMIN_EMAIL, "password": DEMO_ADMIN_PASSWORD }),
        )?)
        .await?;
    assert_eq!(login.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
