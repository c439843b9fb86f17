use cms_core::media::validate_upload;
use cms_core::tag::{self, TagResolution};
use cms_core::{
    Category, DetailField, LiveUpdate, LiveUpdateDraft, LiveUpdatePatch, MediaAsset, Post,
    PostPayload, PostQuery, PostStatus, SaveTarget, Tag, TagDraft,
};
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::forms::http_fallback;
use crate::models::{
    Authors, ErrorBody, ImageUpdated, ImageUploaded, Images, LiveUpdateChanged, LoginRequest,
    LoginResponse, PostSaved, StatusPatch, TagCreated,
};

const API_BASE_URL: &str = match option_env!("WASM_API_BASE_URL") {
    Some(value) => value,
    None => "http://localhost:5000",
};

#[derive(Debug, Clone)]
pub(crate) enum ApiError {
    Network(String),
    Http { status: u16, message: String },
    Decode(String),
    Invalid(String),
}

impl ApiError {
    pub(crate) fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Http { status: 401, .. })
    }
}

impl core::fmt::Display for ApiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Http { status, message } => write!(f, "http error {status}: {message}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

fn endpoint(path: &str) -> String {
    format!(
        "{}/{}",
        API_BASE_URL.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Адрес файла медиатеки: сервер отдаёт путь вида `/uploads/...`.
pub(crate) fn asset_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    endpoint(url)
}

fn authorized(builder: RequestBuilder, token: &str) -> RequestBuilder {
    builder.header("Authorization", &format!("Bearer {token}"))
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}

async fn parse_error_body(response: Response) -> ApiError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    let message = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => body.into_message(),
        Err(_) => Some(text.trim().to_string()).filter(|text| !text.is_empty()),
    };

    ApiError::Http {
        status,
        message: message.unwrap_or_else(|| http_fallback(status)),
    }
}

async fn send(request: Result<Request, gloo_net::Error>) -> Result<Response, ApiError> {
    let response = request
        .map_err(|err| ApiError::Network(err.to_string()))?
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;

    if !response.ok() {
        return Err(parse_error_body(response).await);
    }
    Ok(response)
}

async fn fetch<T: DeserializeOwned>(request: Result<Request, gloo_net::Error>) -> Result<T, ApiError> {
    parse_json(send(request).await?).await
}

pub(crate) async fn login(username: &str, password: &str) -> Result<String, ApiError> {
    let payload = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };

    let response: LoginResponse =
        fetch(Request::post(&endpoint("/api/auth/login")).json(&payload)).await?;
    Ok(response.token)
}

pub(crate) async fn list_categories(token: &str) -> Result<Vec<Category>, ApiError> {
    let builder = Request::get(&endpoint("/api/categories/list-categories"));
    fetch(authorized(builder, token).build()).await
}

pub(crate) async fn list_tags(token: &str) -> Result<Vec<Tag>, ApiError> {
    let builder = Request::get(&endpoint("/api/tags/list-tags"));
    fetch(authorized(builder, token).build()).await
}

async fn create_tag(token: &str, draft: &TagDraft) -> Result<Tag, ApiError> {
    let builder = Request::post(&endpoint("/api/tags/add-tag"));
    let created: TagCreated = fetch(authorized(builder, token).json(draft)).await?;
    Ok(created.tag)
}

/// Id тегов по именам; недостающие создаются, неудачные пропускаются.
/// 401 прерывает разбор: сессия больше не действует.
pub(crate) async fn resolve_tags(
    token: &str,
    known: &mut Vec<Tag>,
    names: &[String],
) -> Result<Vec<String>, ApiError> {
    let mut ids = Vec::with_capacity(names.len());

    for step in tag::plan_resolution(known, names) {
        match step {
            TagResolution::Existing(id) => ids.push(id),
            TagResolution::Missing(name) => match create_tag(token, &TagDraft::lazy(&name)).await {
                Ok(created) => {
                    ids.push(created.id.clone());
                    known.push(created);
                }
                Err(err) if err.is_unauthorized() => return Err(err),
                Err(err) => web_sys::console::warn_1(
                    &format!("failed to create tag {name:?}, skipping: {err}").into(),
                ),
            },
        }
    }

    Ok(ids)
}

pub(crate) async fn list_posts(token: &str, query: &PostQuery) -> Result<Vec<Post>, ApiError> {
    let pairs = query.to_pairs();
    let builder = Request::get(&endpoint("/api/posts"))
        .query(pairs.iter().map(|(key, value)| (*key, value.as_str())));
    fetch(authorized(builder, token).build()).await
}

pub(crate) async fn distinct_authors(token: &str) -> Result<Vec<String>, ApiError> {
    let builder = Request::get(&endpoint("/api/posts/distinct-authors"));
    let authors: Authors = fetch(authorized(builder, token).build()).await?;
    Ok(authors.authors)
}

pub(crate) async fn save_post(
    token: &str,
    target: &SaveTarget,
    payload: &PostPayload,
) -> Result<Post, ApiError> {
    let url = endpoint(&target.path());
    let builder = if target.is_update() {
        Request::put(&url)
    } else {
        Request::post(&url)
    };
    let saved: PostSaved = fetch(authorized(builder, token).json(payload)).await?;
    Ok(saved.into())
}

pub(crate) async fn set_post_status(token: &str, id: &str, status: PostStatus) -> Result<(), ApiError> {
    let builder = Request::put(&endpoint(&format!("/api/posts/{id}")));
    send(authorized(builder, token).json(&StatusPatch { status })).await?;
    Ok(())
}

pub(crate) async fn delete_post(token: &str, id: &str) -> Result<(), ApiError> {
    let builder = Request::delete(&endpoint(&format!("/api/posts/{id}")));
    send(authorized(builder, token).build()).await?;
    Ok(())
}

pub(crate) async fn list_media(token: &str) -> Result<Vec<MediaAsset>, ApiError> {
    let builder = Request::get(&endpoint("/api/images"));
    let images: Images = fetch(authorized(builder, token).build()).await?;
    Ok(images.images)
}

/// MIME-тип проверяется до запроса.
pub(crate) async fn upload_media(
    token: &str,
    author: &str,
    file: &web_sys::File,
) -> Result<MediaAsset, ApiError> {
    validate_upload(&file.type_()).map_err(|err| ApiError::Invalid(err.to_string()))?;

    let form = web_sys::FormData::new()
        .map_err(|_| ApiError::Invalid("failed to build upload form".to_string()))?;
    form.append_with_str("uploadedBy", author)
        .and_then(|_| form.append_with_blob_and_filename("image", file, &file.name()))
        .map_err(|_| ApiError::Invalid("failed to attach file".to_string()))?;

    let builder = Request::post(&endpoint("/api/images/upload"));
    let uploaded: ImageUploaded = fetch(authorized(builder, token).body(form)).await?;
    Ok(uploaded.image_details)
}

pub(crate) async fn update_media_detail(
    token: &str,
    id: &str,
    field: DetailField,
    value: &str,
) -> Result<MediaAsset, ApiError> {
    let mut body = serde_json::Map::new();
    body.insert(field.wire_name().to_string(), value.into());

    let builder = Request::put(&endpoint(&format!("/api/images/{id}")));
    let updated: ImageUpdated = fetch(authorized(builder, token).json(&body)).await?;
    Ok(updated.into())
}

pub(crate) async fn delete_media(token: &str, asset: &MediaAsset) -> Result<(), ApiError> {
    let builder = Request::delete(&endpoint(&format!("/api/images/{}", asset.delete_path())));
    send(authorized(builder, token).build()).await?;
    Ok(())
}

pub(crate) async fn list_live_updates(token: &str, post_id: &str) -> Result<Vec<LiveUpdate>, ApiError> {
    let builder = Request::get(&endpoint(&format!("/api/live-updates/{post_id}")));
    let mut updates: Vec<LiveUpdate> = fetch(authorized(builder, token).build()).await?;
    cms_core::live_update::sort_for_display(&mut updates);
    Ok(updates)
}

pub(crate) async fn add_live_update(
    token: &str,
    post_id: &str,
    draft: &LiveUpdateDraft,
) -> Result<LiveUpdate, ApiError> {
    let builder = Request::post(&endpoint(&format!("/api/live-updates/{post_id}")));
    fetch(authorized(builder, token).json(draft)).await
}

pub(crate) async fn toggle_live_pin(token: &str, update: &LiveUpdate) -> Result<LiveUpdate, ApiError> {
    let builder = Request::put(&endpoint(&format!("/api/live-updates/{}", update.id)));
    let changed: LiveUpdateChanged =
        fetch(authorized(builder, token).json(&LiveUpdatePatch::toggle_pin(update))).await?;
    Ok(changed.live_update)
}

pub(crate) async fn delete_live_update(token: &str, id: &str) -> Result<(), ApiError> {
    let builder = Request::delete(&endpoint(&format!("/api/live-updates/{id}")));
    send(authorized(builder, token).build()).await?;
    Ok(())
}
