//! Per-user records: profile, stats, trade history, settings, audit log.
//! Every route requires the caller to be the user or an admin.

use actix_web::{HttpResponse, web};
use fxfeed_core::DomainError;
use fxfeed_core::domain::{ProfileUpdate, SettingKey, TradeDraft, TradeRecord, TradingStats};
use fxfeed_shared::ApiResponse;
use fxfeed_shared::dto::{AuditLogQuery, CurrencyRequest};
use serde::Serialize;

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Largest page of audit entries one request may ask for.
const MAX_AUDIT_PAGE: usize = 200;

#[derive(Serialize)]
struct RecordedTrade {
    trade: TradeRecord,
    stats: TradingStats,
}

/// GET /api/users/{user_id}/profile
///
/// A user's first read creates their profile, as the app does on first
/// sign-in. Admins only ever read existing profiles.
pub async fn get_profile(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();
    identity.ensure_can_act_for(&user_id)?;

    let profile = if identity.uid == user_id {
        state.profiles.ensure_profile(&user_id, &identity.email).await?
    } else {
        state
            .profiles
            .get_profile(&user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Profile", user_id))?
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok(profile)))
}

/// PUT /api/users/{user_id}/profile
pub async fn update_profile(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<ProfileUpdate>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let profile = state.profiles.update_profile(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(profile, "Profile updated")))
}

/// GET /api/users/{user_id}/stats
pub async fn get_stats(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let stats = state.profiles.get_stats(&path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}

/// PUT /api/users/{user_id}/stats
pub async fn update_stats(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<TradingStats>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let stats = state.profiles.update_stats(&path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}

/// GET /api/users/{user_id}/trades
pub async fn get_trades(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let trades = state.profiles.get_trades(&path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(trades)))
}

/// POST /api/users/{user_id}/trades
pub async fn record_trade(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<TradeDraft>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let (trade, stats) = state.profiles.record_trade(&path, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(RecordedTrade { trade, stats })))
}

/// GET /api/users/{user_id}/settings
pub async fn get_settings(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let settings = state.menu.get_settings(&path).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

/// POST /api/users/{user_id}/settings/{key}/toggle
pub async fn toggle_setting(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (user_id, key) = path.into_inner();
    identity.ensure_can_act_for(&user_id)?;
    let key: SettingKey = key.parse()?;
    let settings = state.menu.toggle_setting(&user_id, key).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

/// PUT /api/users/{user_id}/settings/currency
pub async fn set_currency(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<CurrencyRequest>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let settings = state.menu.set_currency(&path, &body.currency).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

/// GET /api/users/{user_id}/audit-log[?limit=]
pub async fn audit_log(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    query: web::Query<AuditLogQuery>,
) -> AppResult<HttpResponse> {
    identity.ensure_can_act_for(&path)?;
    let limit = query.limit.clamp(1, MAX_AUDIT_PAGE);
    let entries = state.menu.get_audit_log(&path, limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(entries)))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use crate::handlers::{configure_app, test_support};

    #[actix_web::test]
    async fn test_first_profile_read_creates_it() {
        let state = test_support::state();
        let user = test_support::bearer(&state, "dana");
        let admin = test_support::admin_bearer(&state, "ops");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/users/nobody/profile").insert_header(admin.clone()).to_request(),
        )
        .await;
        assert_eq!(res.status(), 404);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/users/dana/profile").insert_header(user.clone()).to_request(),
        )
        .await;
        assert_eq!(res.status(), 200);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["name"], "dana");
        assert_eq!(body["data"]["stats"]["balance"], 0.0);

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/users/dana/profile")
                .insert_header(user)
                .set_json(json!({ "name": "Dana K" }))
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["name"], "Dana K");

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/users/dana/profile").insert_header(admin).to_request(),
        )
        .await;
        assert_eq!(res.status(), 200);
    }

    #[actix_web::test]
    async fn test_other_users_records_are_forbidden() {
        let state = test_support::state();
        let user = test_support::bearer(&state, "dana");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        for uri in ["/api/users/eve/stats", "/api/users/eve/trades", "/api/users/eve/settings"] {
            let res = test::call_service(
                &app,
                test::TestRequest::get().uri(uri).insert_header(user.clone()).to_request(),
            )
            .await;
            assert_eq!(res.status(), 403, "{uri}");
        }

        let res = test::call_service(&app, test::TestRequest::get().uri("/api/users/dana/stats").to_request()).await;
        assert_eq!(res.status(), 401);
    }

    #[actix_web::test]
    async fn test_recording_a_trade_updates_stats() {
        let state = test_support::state();
        let user = test_support::bearer(&state, "dana");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/users/dana/trades")
                .insert_header(user.clone())
                .set_json(json!({
                    "pair": "eur/usd",
                    "direction": "buy",
                    "amount": 1000.0,
                    "entryPrice": 1.1000,
                    "exitPrice": 1.1050
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), 201);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["trade"]["pair"], "EUR/USD");
        assert_eq!(body["data"]["stats"]["totalTrades"], 1);
        assert_eq!(body["data"]["stats"]["winningTrades"], 1);

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/users/dana/trades").insert_header(user.clone()).to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert!(body["data"][0]["id"].is_string());

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/users/dana/stats")
                .insert_header(user)
                .set_json(json!({ "totalTrades": 1, "winningTrades": 3 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), 400);
    }

    #[actix_web::test]
    async fn test_settings_toggle_and_audit_log() {
        let state = test_support::state();
        let user = test_support::bearer(&state, "dana");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/users/dana/settings/twoFactor/toggle")
                .insert_header(user.clone())
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["twoFactor"], true);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/users/dana/settings/darkMode/toggle")
                .insert_header(user.clone())
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), 400);

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/users/dana/settings/currency")
                .insert_header(user.clone())
                .set_json(json!({ "currency": "eur" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), 400);

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/users/dana/audit-log?limit=10")
                .insert_header(user)
                .to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"][0]["action"], "settings.toggled");
    }
}
