//! Клиентская библиотека для работы с REST API CMS.
//!
//! Предоставляет единый API (`CmsClient`) поверх `reqwest`:
//! - категории, теги, посты, медиатека, live-обновления и пользователи;
//! - явная сессия (`SessionStore`), общая для клиента и фоновых задач;
//! - отложенное автосохранение деталей медиа по полям;
//! - таймер неактивности с автоматическим выходом.
//!
//! Токен прикрепляется к каждому запросу, если сессия есть. Ответ 401
//! сбрасывает сессию и превращается в `CmsClientError::SessionExpired`.
#![warn(missing_docs)]

mod autosave;
mod dto;
mod editor;
mod error;
mod http_client;
mod inactivity;
mod session;

pub use autosave::{AutoSaveOutcome, DEFAULT_DEBOUNCE, DetailAutoSaver, DetailSink};
pub use editor::{TagStore, ensure_tags_exist};
pub use error::{CmsClientError, CmsClientResult};
pub use http_client::HttpOptions;
pub use inactivity::InactivityWatch;
pub use session::{Session, SessionStore};

use async_trait::async_trait;
use chrono::Utc;
use cms_core::category::validate_parent;
use cms_core::live_update::sort_for_display;
use cms_core::media::{mime_from_extension, validate_upload};
use cms_core::{
    Category, CategoryDraft, CategoryTree, DetailField, LiveUpdate, LiveUpdateDraft,
    LiveUpdatePatch, MediaAsset, NewUser, Post, PostAction, PostEditor, PostQuery, PostStatus, Tag,
    TagDraft, User, UserPatch,
};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::info;
use validator::Validate;

use dto::{
    AuthorsDto, ImageUpdateResponseDto, ImageUploadedDto, ImagesDto, LiveUpdateChangedDto,
    PostSaveResponseDto, StatusPatchDto, TagCreatedDto,
};
use http_client::HttpClient;

const NO_BODY: Option<&()> = None;

#[derive(Debug, Clone)]
/// Клиент админки CMS.
pub struct CmsClient {
    http: HttpClient,
    session: SessionStore,
}

impl CmsClient {
    /// Создаёт клиент с базовым URL сервера и таймаутами по умолчанию.
    pub fn new(base_url: impl Into<String>) -> CmsClientResult<Self> {
        Self::with_options(base_url, HttpOptions::default())
    }

    /// Создаёт клиент с явными таймаутами.
    pub fn with_options(base_url: impl Into<String>, options: HttpOptions) -> CmsClientResult<Self> {
        Ok(Self {
            http: HttpClient::new(base_url, options)?,
            session: SessionStore::new(),
        })
    }

    /// Подключает внешнее хранилище сессии (например, общее с таймером).
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = session;
        self
    }

    /// Базовый URL сервера.
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Хранилище сессии.
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Восстанавливает сессию из сохранённого токена.
    pub fn restore_token(&self, token: &str) -> CmsClientResult<Session> {
        let session = Session::from_token(token)?;
        self.session.set(session.clone());
        Ok(session)
    }

    /// Локальный выход, без запроса к серверу.
    pub fn logout(&self) -> bool {
        self.session.clear()
    }

    fn require_session(&self) -> CmsClientResult<Session> {
        self.session.get().ok_or(CmsClientError::Unauthorized)
    }

    fn token(&self) -> Option<String> {
        self.session.token()
    }

    fn guard<T>(&self, result: CmsClientResult<T>) -> CmsClientResult<T> {
        if let Err(err) = &result {
            if err.is_session_expired() && self.session.clear() {
                info!("server rejected the token, session dropped");
            }
        }
        result
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> CmsClientResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let token = self.token();
        let result = self.http.get_json(path, query, token.as_deref()).await;
        self.guard(result)
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> CmsClientResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let session = self.require_session()?;
        let result = self
            .http
            .send_json(method, path, body, Some(session.token()))
            .await;
        self.guard(result)
    }

    async fn send_for_message<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        fallback: &str,
    ) -> CmsClientResult<String>
    where
        B: serde::Serialize + ?Sized,
    {
        let session = self.require_session()?;
        let result = self
            .http
            .send_for_message(method, path, body, Some(session.token()))
            .await;
        self.guard(result)
            .map(|message| message.unwrap_or_else(|| fallback.to_string()))
    }

    /// Выполняет вход и сохраняет сессию в клиенте.
    pub async fn login(&self, username: &str, password: &str) -> CmsClientResult<Session> {
        let token = self.http.login(username.trim(), password).await?;
        let session = Session::from_token(&token)?;
        self.session.set(session.clone());
        info!(username = session.author_name(), "logged in");
        Ok(session)
    }

    // категории

    /// Плоский список категорий.
    pub async fn list_categories(&self) -> CmsClientResult<Vec<Category>> {
        self.get("/api/categories/list-categories", &[]).await
    }

    /// Двухуровневое дерево категорий для выпадающих списков.
    pub async fn category_tree(&self) -> CmsClientResult<CategoryTree> {
        let categories = self.list_categories().await?;
        Ok(CategoryTree::build(&categories))
    }

    /// Категория по id.
    pub async fn get_category(&self, id: &str) -> CmsClientResult<Category> {
        self.get(&format!("/api/categories/{id}"), &[]).await
    }

    /// Создаёт категорию; вложенность глубже двух уровней отклоняется.
    pub async fn create_category(&self, draft: &CategoryDraft) -> CmsClientResult<String> {
        draft.validate()?;
        let categories = self.list_categories().await?;
        validate_parent(&categories, None, draft.parent_id.as_deref())?;

        self.send_for_message(
            Method::POST,
            "/api/categories/add-category",
            Some(draft),
            "Category created",
        )
        .await
    }

    /// Изменяет категорию с той же проверкой иерархии.
    pub async fn update_category(&self, id: &str, draft: &CategoryDraft) -> CmsClientResult<String> {
        draft.validate()?;
        let categories = self.list_categories().await?;
        validate_parent(&categories, Some(id), draft.parent_id.as_deref())?;

        self.send_for_message(
            Method::PUT,
            &format!("/api/categories/update-category/{id}"),
            Some(draft),
            "Category updated",
        )
        .await
    }

    /// Удаляет категорию.
    pub async fn delete_category(&self, id: &str) -> CmsClientResult<String> {
        self.send_for_message(
            Method::DELETE,
            &format!("/api/categories/delete-category/{id}"),
            NO_BODY,
            "Category deleted",
        )
        .await
    }

    // теги

    /// Все теги.
    pub async fn list_tags(&self) -> CmsClientResult<Vec<Tag>> {
        self.get("/api/tags/list-tags", &[]).await
    }

    /// Теги «в тренде».
    pub async fn trending_tags(&self) -> CmsClientResult<Vec<Tag>> {
        self.get("/api/tags/trending-tags", &[]).await
    }

    /// Тег по id.
    pub async fn get_tag(&self, id: &str) -> CmsClientResult<Tag> {
        self.get(&format!("/api/tags/{id}"), &[]).await
    }

    /// Создаёт тег.
    pub async fn create_tag(&self, draft: &TagDraft) -> CmsClientResult<Tag> {
        draft.validate()?;
        let created: TagCreatedDto = self.send(Method::POST, "/api/tags/add-tag", draft).await?;
        Ok(created.tag)
    }

    /// Изменяет тег.
    pub async fn update_tag(&self, id: &str, draft: &TagDraft) -> CmsClientResult<String> {
        draft.validate()?;
        self.send_for_message(
            Method::PUT,
            &format!("/api/tags/update-tag/{id}"),
            Some(draft),
            "Tag updated",
        )
        .await
    }

    /// Переключает флаг «в тренде».
    pub async fn toggle_trending(&self, id: &str) -> CmsClientResult<String> {
        self.send_for_message(
            Method::PUT,
            &format!("/api/tags/mark-as-trending/{id}"),
            NO_BODY,
            "Trending status updated",
        )
        .await
    }

    /// Удаляет тег.
    pub async fn delete_tag(&self, id: &str) -> CmsClientResult<String> {
        self.send_for_message(
            Method::DELETE,
            &format!("/api/tags/delete-tag/{id}"),
            NO_BODY,
            "Tag deleted",
        )
        .await
    }

    // посты

    /// Список постов по фильтрам.
    pub async fn list_posts(&self, query: &PostQuery) -> CmsClientResult<Vec<Post>> {
        self.get("/api/posts", &query.to_pairs()).await
    }

    /// Пост по id.
    pub async fn get_post(&self, id: &str) -> CmsClientResult<Post> {
        self.get(&format!("/api/posts/{id}"), &[]).await
    }

    /// Авторы, у которых есть посты.
    pub async fn distinct_authors(&self) -> CmsClientResult<Vec<String>> {
        let dto: AuthorsDto = self.get("/api/posts/distinct-authors", &[]).await?;
        Ok(dto.authors)
    }

    /// Сохраняет пост из редактора.
    ///
    /// Проверяет действие, создаёт недостающие теги, собирает slug и
    /// итоговую категорию, отправляет пост и обновляет редактор по ответу.
    pub async fn save_post(
        &self,
        editor: &mut PostEditor,
        action: PostAction,
    ) -> CmsClientResult<Post> {
        let session = self.require_session()?;
        editor.check(&action, Utc::now())?;

        let mut known = self.list_tags().await?;
        let tag_ids = ensure_tags_exist(self, &mut known, editor.tags()).await?;
        let payload = editor.payload(&action, tag_ids, session.author_name());

        let (method, path) = editor::route(&editor.save_target(&action));
        let saved: PostSaveResponseDto = self.send(method, &path, &payload).await?;
        let saved = Post::from(saved);

        editor.mark_saved(&saved);
        info!(post_id = %saved.id, status = %saved.status, "post saved");
        Ok(saved)
    }

    /// Меняет только статус поста (корзина, восстановление).
    pub async fn set_post_status(&self, id: &str, status: PostStatus) -> CmsClientResult<String> {
        self.send_for_message(
            Method::PUT,
            &format!("/api/posts/{id}"),
            Some(&StatusPatchDto { status }),
            "Post updated",
        )
        .await
    }

    /// Удаляет пост насовсем.
    pub async fn delete_post(&self, id: &str) -> CmsClientResult<String> {
        self.send_for_message(
            Method::DELETE,
            &format!("/api/posts/{id}"),
            NO_BODY,
            "Post deleted",
        )
        .await
    }

    // медиатека

    /// Все ассеты медиатеки.
    pub async fn list_media(&self) -> CmsClientResult<Vec<MediaAsset>> {
        let dto: ImagesDto = self.get("/api/images", &[]).await?;
        Ok(dto.images)
    }

    /// Загружает файл.
    ///
    /// MIME-тип берётся из аргумента или из расширения файла и проверяется
    /// до сетевого запроса.
    pub async fn upload_media(
        &self,
        file_name: &str,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> CmsClientResult<MediaAsset> {
        let mime = mime
            .or_else(|| mime_from_extension(file_name))
            .unwrap_or("application/octet-stream");
        validate_upload(mime)?;

        let session = self.require_session()?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = Form::new()
            .text("uploadedBy", session.author_name().to_string())
            .part("image", part);

        let result: CmsClientResult<ImageUploadedDto> = self
            .http
            .upload("/api/images/upload", form, Some(session.token()))
            .await;
        let uploaded = self.guard(result)?;
        Ok(uploaded.image_details)
    }

    /// Сохраняет одно поле деталей ассета.
    pub async fn update_media_detail(
        &self,
        id: &str,
        field: DetailField,
        value: &str,
    ) -> CmsClientResult<MediaAsset> {
        let mut body = serde_json::Map::new();
        body.insert(field.wire_name().to_string(), value.into());

        let updated: ImageUpdateResponseDto = self
            .send(Method::PUT, &format!("/api/images/{id}"), &body)
            .await?;
        Ok(updated.into())
    }

    /// Удаляет файл медиатеки.
    pub async fn delete_media(&self, asset: &MediaAsset) -> CmsClientResult<String> {
        self.send_for_message(
            Method::DELETE,
            &format!("/api/images/{}", asset.delete_path()),
            NO_BODY,
            "File deleted",
        )
        .await
    }

    // live-обновления

    /// Live-обновления поста в порядке показа.
    pub async fn list_live_updates(&self, post_id: &str) -> CmsClientResult<Vec<LiveUpdate>> {
        let mut updates: Vec<LiveUpdate> =
            self.get(&format!("/api/live-updates/{post_id}"), &[]).await?;
        sort_for_display(&mut updates);
        Ok(updates)
    }

    /// Добавляет live-обновление к сохранённому посту.
    pub async fn add_live_update(
        &self,
        post_id: &str,
        title: &str,
        content: &str,
    ) -> CmsClientResult<LiveUpdate> {
        if post_id.trim().is_empty() {
            return Err(CmsClientError::InvalidRequest(
                "save the post before adding live updates".to_string(),
            ));
        }
        let session = self.require_session()?;
        let draft = LiveUpdateDraft {
            title: title.trim().to_string(),
            content: content.to_string(),
            created_by: session.author_name().to_string(),
        };
        draft.validate()?;

        self.send(Method::POST, &format!("/api/live-updates/{post_id}"), &draft)
            .await
    }

    /// Частично изменяет live-обновление.
    pub async fn update_live_update(
        &self,
        id: &str,
        patch: &LiveUpdatePatch,
    ) -> CmsClientResult<LiveUpdate> {
        let changed: LiveUpdateChangedDto = self
            .send(Method::PUT, &format!("/api/live-updates/{id}"), patch)
            .await?;
        Ok(changed.live_update)
    }

    /// Закрепляет или открепляет live-обновление.
    pub async fn toggle_live_pin(&self, update: &LiveUpdate) -> CmsClientResult<LiveUpdate> {
        self.update_live_update(&update.id, &LiveUpdatePatch::toggle_pin(update))
            .await
    }

    /// Удаляет live-обновление.
    pub async fn delete_live_update(&self, id: &str) -> CmsClientResult<String> {
        self.send_for_message(
            Method::DELETE,
            &format!("/api/live-updates/{id}"),
            NO_BODY,
            "Live update deleted",
        )
        .await
    }

    // пользователи

    /// Все пользователи.
    pub async fn list_users(&self) -> CmsClientResult<Vec<User>> {
        self.get("/api/users/all-users", &[]).await
    }

    /// Пользователь по id.
    pub async fn get_user(&self, id: &str) -> CmsClientResult<User> {
        self.get(&format!("/api/users/{id}"), &[]).await
    }

    /// Создаёт пользователя.
    pub async fn add_user(&self, user: &NewUser) -> CmsClientResult<String> {
        user.validate()?;
        self.send_for_message(Method::POST, "/api/users/add-user", Some(user), "User created")
            .await
    }

    /// Изменяет пользователя; пустой пароль не отправляется.
    pub async fn edit_user(&self, id: &str, patch: &UserPatch) -> CmsClientResult<String> {
        self.send_for_message(
            Method::PUT,
            &format!("/api/users/edit/{id}"),
            Some(patch),
            "User updated",
        )
        .await
    }

    /// Удаляет пользователя.
    pub async fn delete_user(&self, id: &str) -> CmsClientResult<String> {
        self.send_for_message(
            Method::DELETE,
            &format!("/api/users/{id}"),
            NO_BODY,
            "User deleted",
        )
        .await
    }
}

#[async_trait]
impl TagStore for CmsClient {
    async fn create_tag(&self, draft: &TagDraft) -> CmsClientResult<Tag> {
        CmsClient::create_tag(self, draft).await
    }
}

#[async_trait]
impl DetailSink for CmsClient {
    async fn save_detail(
        &self,
        asset_id: &str,
        field: DetailField,
        value: &str,
    ) -> CmsClientResult<MediaAsset> {
        self.update_media_detail(asset_id, field, value).await
    }
}
