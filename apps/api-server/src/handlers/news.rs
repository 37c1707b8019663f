//! Feed endpoints. Reads are public; writes act as the caller.

use actix_web::{HttpResponse, web};
use fxfeed_core::DomainError;
use fxfeed_core::domain::{CommentDraft, NewsDraft, NewsUpdate, display_name_from_email};
use fxfeed_shared::ApiResponse;
use fxfeed_shared::dto::{CommentRequest, CreateNewsRequest, NewsQuery};

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Name shown on the caller's posts and comments unless the body sets one.
fn display_name(requested: Option<String>, identity: &Identity) -> String {
    requested
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| display_name_from_email(&identity.email))
}

/// GET /api/news[?authorId=]
pub async fn list_news(
    state: web::Data<AppState>,
    query: web::Query<NewsQuery>,
) -> AppResult<HttpResponse> {
    let posts = match query.into_inner().author_id {
        Some(uid) => state.news.get_news_by_owner(&uid).await?,
        None => state.news.get_news().await?,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::ok(posts)))
}

/// GET /api/news/{id}
pub async fn get_news(state: web::Data<AppState>, path: web::Path<String>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let post = state
        .news
        .get_news_by_id(&id)
        .await?
        .ok_or_else(|| DomainError::not_found("News", id))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// POST /api/news
pub async fn create_news(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreateNewsRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let author = display_name(req.author, &identity);
    let draft = NewsDraft {
        category: req.category,
        image_url: req.image_url,
        ..NewsDraft::new(req.title, req.content)
    }
    .with_author(author, identity.uid.clone());

    let post = state.news.create_news(draft).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(post, "News created successfully")))
}

/// PUT /api/news/{id}
pub async fn update_news(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<NewsUpdate>,
) -> AppResult<HttpResponse> {
    let post = state
        .news
        .update_news_as(&path, body.into_inner(), &identity.actor())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(post, "News updated successfully")))
}

/// DELETE /api/news/{id}
pub async fn delete_news(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    state.news.delete_news_as(&path, &identity.actor()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::message("News deleted successfully")))
}

/// POST /api/news/{id}/like
pub async fn toggle_like(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let post = state.news.like_news(&path, &identity.uid).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post)))
}

/// POST /api/news/{id}/comments
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let draft = CommentDraft {
        author: display_name(req.author, &identity),
        author_id: Some(identity.uid.clone()),
        text: req.text,
    };
    let post = state.news.add_comment(&path, draft).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(post, "Comment added")))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use serde_json::{Value, json};

    use crate::handlers::{configure_app, test_support};

    #[actix_web::test]
    async fn test_create_then_read_back() {
        let state = test_support::state();
        let auth = test_support::bearer(&state, "uid-1");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        let req = test::TestRequest::post()
            .uri("/api/news")
            .insert_header(auth)
            .set_json(json!({ "title": "EUR/USD breaks 1.10", "content": "ECB minutes." }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 201);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["author"], "uid-1");
        assert_eq!(body["data"]["authorId"], "uid-1");
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri(&format!("/api/news/{id}")).to_request(),
        )
        .await;
        assert_eq!(res.status(), 200);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["title"], "EUR/USD breaks 1.10");

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/news?authorId=someone-else").to_request(),
        )
        .await;
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"], json!([]));
    }

    #[actix_web::test]
    async fn test_create_requires_identity_and_fields() {
        let state = test_support::state();
        let auth = test_support::bearer(&state, "uid-1");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        let anonymous = test::TestRequest::post()
            .uri("/api/news")
            .set_json(json!({ "title": "t", "content": "c" }))
            .to_request();
        assert_eq!(test::call_service(&app, anonymous).await.status(), 401);

        let missing = test::TestRequest::post()
            .uri("/api/news")
            .insert_header(auth)
            .set_json(json!({ "title": "  " }))
            .to_request();
        let res = test::call_service(&app, missing).await;
        assert_eq!(res.status(), 400);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["success"], false);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"content"));
    }

    #[actix_web::test]
    async fn test_missing_post_is_404() {
        let state = test_support::state();
        let auth = test_support::bearer(&state, "uid-1");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/news/nonexistent-id").to_request(),
        )
        .await;
        assert_eq!(res.status(), 404);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "News not found");

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri("/api/news/nonexistent-id")
                .insert_header(auth)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), 404);
    }

    #[actix_web::test]
    async fn test_only_owner_or_admin_may_change_a_post() {
        let state = test_support::state();
        let owner = test_support::bearer(&state, "owner");
        let other = test_support::bearer(&state, "other");
        let admin = test_support::admin_bearer(&state, "moderator");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        let req = test::TestRequest::post()
            .uri("/api/news")
            .insert_header(owner.clone())
            .set_json(json!({ "title": "GBP outlook", "content": "Range-bound." }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let uri = format!("/api/news/{}", body["data"]["id"].as_str().unwrap());

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .insert_header(other.clone())
                .set_json(json!({ "title": "hijacked" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), 403);

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&uri)
                .insert_header(owner)
                .set_json(json!({ "title": "GBP outlook (updated)" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), 200);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["title"], "GBP outlook (updated)");
        assert_eq!(body["data"]["content"], "Range-bound.");

        let res = test::call_service(
            &app,
            test::TestRequest::delete().uri(&uri).insert_header(other).to_request(),
        )
        .await;
        assert_eq!(res.status(), 403);

        let res = test::call_service(
            &app,
            test::TestRequest::delete().uri(&uri).insert_header(admin).to_request(),
        )
        .await;
        assert_eq!(res.status(), 200);
    }

    #[actix_web::test]
    async fn test_unknown_update_field_is_unprocessable() {
        let state = test_support::state();
        let auth = test_support::bearer(&state, "owner");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri("/api/news/abc")
                .insert_header(auth)
                .set_json(json!({ "likesCount": 1000 }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), 422);
    }

    #[actix_web::test]
    async fn test_like_toggles_and_comment_appends() {
        let state = test_support::state();
        let auth = test_support::bearer(&state, "reader");
        let app = test::init_service(App::new().configure(configure_app(state))).await;

        let req = test::TestRequest::post()
            .uri("/api/news")
            .insert_header(auth.clone())
            .set_json(json!({ "title": "JPY", "content": "BoJ holds.", "author": "Desk" }))
            .to_request();
        let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(body["data"]["author"], "Desk");

        let like = || {
            test::TestRequest::post()
                .uri(&format!("/api/news/{id}/like"))
                .insert_header(auth.clone())
                .to_request()
        };
        let body: Value = test::read_body_json(test::call_service(&app, like()).await).await;
        assert_eq!(body["data"]["likesCount"], 1);
        let body: Value = test::read_body_json(test::call_service(&app, like()).await).await;
        assert_eq!(body["data"]["likesCount"], 0);

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/news/{id}/comments"))
                .insert_header(auth.clone())
                .set_json(json!({ "text": "Agreed" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), 201);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"]["commentsCount"], 1);
        assert_eq!(body["data"]["comments"][0]["author"], "reader");
        assert_eq!(body["data"]["comments"][0]["authorId"], "reader");
    }
}
