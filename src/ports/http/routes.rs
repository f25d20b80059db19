// src/ports/http/routes.rs
use crate::application::ServiceError;
use crate::domain::{Bookmark, BookmarkPatch, BookmarkTagPair, NewBookmark, Tag};
use crate::ports::http::{ApiError, ApiPath, ApiQuery, AppState, Authenticated};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/bookmarks",
            get(list_bookmarks).delete(delete_all_bookmarks),
        )
        .route(
            "/api/bookmark",
            get(get_bookmark).post(add_bookmark).delete(delete_bookmark),
        )
        .route("/api/bookmark/addBookmarks", post(add_bookmarks))
        .route("/api/bookmark/{bookmark_id}", put(update_bookmark))
        .route(
            "/api/bookmark/{bookmark_id}/tag",
            post(add_tag_by_title).delete(remove_tag_by_title),
        )
        .route(
            "/api/bookmark/{bookmark_id}/tagId",
            post(add_tag_by_id).delete(remove_tag_by_id),
        )
        .route("/api/tags", get(list_tags).post(create_tags))
        .route("/api/tag", get(get_tag))
        .with_state(state)
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
struct IdQuery {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct TagTitleQuery {
    tag: String,
}

#[derive(Debug, Deserialize)]
struct TagIdQuery {
    #[serde(rename = "tagId")]
    tag_id: i64,
}

#[derive(Debug, Deserialize)]
struct TagLookupQuery {
    id: Option<i64>,
    title: Option<String>,
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "findfirst"
    }))
}

async fn list_bookmarks(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
) -> Result<Json<Vec<Bookmark>>, ApiError> {
    let bookmarks = state.run(move |svc| svc.list_bookmarks(user.id)).await?;
    Ok(Json(bookmarks))
}

async fn get_bookmark(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<Json<Bookmark>, ApiError> {
    let bookmark = state
        .run(move |svc| svc.get_bookmark(user.id, query.id))
        .await?;
    Ok(Json(bookmark))
}

async fn add_bookmark(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Json(request): Json<NewBookmark>,
) -> Result<Json<Bookmark>, ApiError> {
    let bookmark = state
        .run(move |svc| svc.add_bookmark(user.id, &request))
        .await?;
    Ok(Json(bookmark))
}

async fn add_bookmarks(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Json(requests): Json<Vec<NewBookmark>>,
) -> Result<Json<Vec<Bookmark>>, ApiError> {
    let bookmarks = state
        .run(move |svc| svc.add_bookmarks(user.id, &requests))
        .await?;
    Ok(Json(bookmarks))
}

async fn update_bookmark(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    ApiPath(bookmark_id): ApiPath<i64>,
    Json(patch): Json<BookmarkPatch>,
) -> Result<Json<Bookmark>, ApiError> {
    let bookmark = state
        .run(move |svc| svc.update_bookmark(user.id, bookmark_id, &patch))
        .await?;
    Ok(Json(bookmark))
}

async fn delete_bookmark(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    ApiQuery(query): ApiQuery<IdQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .run(move |svc| svc.delete_bookmark(user.id, query.id))
        .await?;
    Ok(StatusCode::OK)
}

async fn delete_all_bookmarks(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
) -> Result<Json<Value>, ApiError> {
    let deleted = state
        .run(move |svc| svc.delete_all_bookmarks(user.id))
        .await?;
    Ok(Json(json!({ "deleted": deleted })))
}

async fn add_tag_by_title(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    ApiPath(bookmark_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<TagTitleQuery>,
) -> Result<Json<Bookmark>, ApiError> {
    let bookmark = state
        .run(move |svc| svc.add_tag_by_title(user.id, bookmark_id, &query.tag))
        .await?;
    Ok(Json(bookmark))
}

async fn remove_tag_by_title(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    ApiPath(bookmark_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<TagTitleQuery>,
) -> Result<Json<Bookmark>, ApiError> {
    let bookmark = state
        .run(move |svc| svc.remove_tag_by_title(user.id, bookmark_id, &query.tag))
        .await?;
    Ok(Json(bookmark))
}

async fn add_tag_by_id(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    ApiPath(bookmark_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<TagIdQuery>,
) -> Result<Json<BookmarkTagPair>, ApiError> {
    let pair = state
        .run(move |svc| svc.add_tag_by_id(user.id, bookmark_id, query.tag_id))
        .await?;
    Ok(Json(pair))
}

async fn remove_tag_by_id(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    ApiPath(bookmark_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<TagIdQuery>,
) -> Result<Json<Bookmark>, ApiError> {
    let bookmark = state
        .run(move |svc| svc.remove_tag_by_id(user.id, bookmark_id, query.tag_id))
        .await?;
    Ok(Json(bookmark))
}

async fn list_tags(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = state.run(|svc| svc.list_tags()).await?;
    Ok(Json(tags))
}

async fn create_tags(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    Json(titles): Json<Vec<String>>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = state.run(move |svc| svc.create_tags(&titles)).await?;
    Ok(Json(tags))
}

async fn get_tag(
    State(state): State<AppState>,
    Authenticated(_): Authenticated,
    ApiQuery(query): ApiQuery<TagLookupQuery>,
) -> Result<Json<Tag>, ApiError> {
    let tag = match (query.id, query.title) {
        (Some(id), _) => state.run(move |svc| svc.get_tag(id)).await?,
        (None, Some(title)) => state.run(move |svc| svc.get_tag_by_title(&title)).await?,
        (None, None) => {
            return Err(ServiceError::Validation("id or title is required".to_string()).into())
        }
    };
    Ok(Json(tag))
}
