//! Редактор поста без сети: состояние формы, флаг несохранённых правок,
//! проверка действия и сборка тела запроса.
//!
//! Теги в редакторе хранятся именами; в id их превращает вызывающая
//! сторона (с ленивым созданием недостающих), после чего собирается
//! [`PostPayload`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::category::CategoryTree;
use crate::category_selector::CategorySelector;
use crate::error::DomainError;
use crate::post::{self, FeatureImage, MetaCounter, Post, PostAction, PostStatus, validate_meta};
use crate::slug::{self, SlugParts};
use crate::tag::{self, Tag};

/// Период автосохранения черновика.
pub const DRAFT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Тело сохранения поста.
pub struct PostPayload {
    /// Заголовок.
    pub title: String,
    /// Slug: основа плюс исходный суффикс.
    pub slug: String,
    /// Краткое содержание.
    pub summary: String,
    /// HTML-содержимое.
    pub content: String,
    /// Целевой статус.
    pub status: PostStatus,
    /// Время публикации для запланированных постов.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Изображение поста.
    pub feature_image: Option<FeatureImage>,
    /// Итоговая категория: подкатегория или родитель.
    pub category: Option<String>,
    /// Идентификаторы тегов.
    pub tags: Vec<String>,
    /// Meta title.
    pub meta_title: String,
    /// Meta description.
    pub meta_description: String,
    /// Meta keywords.
    pub meta_keywords: Vec<String>,
    /// Автор из сессии.
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Куда и каким методом отправлять сохранение поста.
pub enum SaveTarget {
    /// Новый черновик: `POST /api/posts`.
    CreateDraft,
    /// Новый опубликованный или запланированный пост: `POST /api/posts/publish`.
    CreatePublished,
    /// Существующий пост: `PUT /api/posts/:id`.
    Update(String),
}

impl SaveTarget {
    /// Путь запроса.
    pub fn path(&self) -> String {
        match self {
            Self::CreateDraft => "/api/posts".to_string(),
            Self::CreatePublished => "/api/posts/publish".to_string(),
            Self::Update(id) => format!("/api/posts/{id}"),
        }
    }

    /// `PUT` для существующего поста, иначе `POST`.
    pub fn is_update(&self) -> bool {
        matches!(self, Self::Update(_))
    }
}

#[derive(Debug, Clone, Default)]
/// Состояние редактора одного поста.
pub struct PostEditor {
    post_id: Option<String>,
    title: String,
    slug: SlugParts,
    summary: String,
    content: String,
    meta_title: String,
    meta_description: String,
    meta_keywords: Vec<String>,
    tags: Vec<String>,
    selector: CategorySelector,
    feature_image: Option<FeatureImage>,
    status: PostStatus,
    scheduled_at: Option<DateTime<Utc>>,
    dirty: bool,
}

impl PostEditor {
    /// Редактор нового поста.
    pub fn new(tree: CategoryTree) -> Self {
        Self {
            selector: CategorySelector::new(tree),
            ..Self::default()
        }
    }

    /// Редактор существующего поста.
    ///
    /// `known_tags` нужны, чтобы показать названия тегов вместо id.
    pub fn from_post(post: &Post, tree: CategoryTree, known_tags: &[Tag]) -> Self {
        let mut selector = CategorySelector::new(tree);
        selector.preselect(post.category_id());

        Self {
            post_id: Some(post.id.clone()),
            title: post.title.clone(),
            slug: SlugParts::split(&post.slug),
            summary: post.summary.clone(),
            content: post.content.clone(),
            meta_title: post.meta_title.clone(),
            meta_description: post.meta_description.clone(),
            meta_keywords: post.meta_keywords.clone(),
            tags: tag::names_for_ids(known_tags, &post.tags),
            selector,
            feature_image: post.feature_image.clone(),
            status: post.status,
            scheduled_at: post.scheduled_at,
            dirty: false,
        }
    }

    /// Id поста, если он уже сохранён.
    pub fn post_id(&self) -> Option<&str> {
        self.post_id.as_deref()
    }

    /// Текущий статус.
    pub fn status(&self) -> PostStatus {
        self.status
    }

    /// Запланированное время.
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
    }

    /// Есть ли несохранённые правки.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Нужно ли сохранять черновик по таймеру.
    pub fn should_autosave(&self) -> bool {
        self.dirty && self.status == PostStatus::Draft
    }

    /// Заголовок.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Меняет заголовок.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.dirty = true;
    }

    /// Редактируемая часть slug и неизменяемый суффикс.
    pub fn slug(&self) -> &SlugParts {
        &self.slug
    }

    /// Меняет основу slug; суффикс остаётся прежним.
    pub fn set_slug_base(&mut self, base: &str) {
        self.slug.set_base(slug::normalize_slug_input(base));
        self.dirty = true;
    }

    /// Краткое содержание.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Меняет краткое содержание.
    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
        self.dirty = true;
    }

    /// Содержимое.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Меняет содержимое.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.dirty = true;
    }

    /// Meta title и его счётчик.
    pub fn meta_title(&self) -> (&str, MetaCounter) {
        (&self.meta_title, MetaCounter::title(&self.meta_title))
    }

    /// Меняет meta title.
    pub fn set_meta_title(&mut self, value: impl Into<String>) {
        self.meta_title = value.into();
        self.dirty = true;
    }

    /// Meta description и его счётчик.
    pub fn meta_description(&self) -> (&str, MetaCounter) {
        (
            &self.meta_description,
            MetaCounter::description(&self.meta_description),
        )
    }

    /// Меняет meta description.
    pub fn set_meta_description(&mut self, value: impl Into<String>) {
        self.meta_description = value.into();
        self.dirty = true;
    }

    /// Meta keywords.
    pub fn meta_keywords(&self) -> &[String] {
        &self.meta_keywords
    }

    /// Задаёт meta keywords строкой через запятую.
    pub fn set_meta_keywords(&mut self, input: &str) {
        self.meta_keywords = tag::parse_tag_input(input);
        self.dirty = true;
    }

    /// Имена тегов поста.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Добавляет теги из строки ввода.
    pub fn add_tags(&mut self, input: &str) {
        tag::merge_tag_input(&mut self.tags, input);
        self.dirty = true;
    }

    /// Убирает тег по имени.
    pub fn remove_tag(&mut self, name: &str) {
        self.tags.retain(|tag| tag != name);
        self.dirty = true;
    }

    /// Каскадный выбор категории.
    pub fn selector(&self) -> &CategorySelector {
        &self.selector
    }

    /// Выбирает родительскую категорию.
    pub fn select_parent_category(&mut self, id: Option<&str>) -> Result<(), DomainError> {
        self.selector.select_parent(id)?;
        self.dirty = true;
        Ok(())
    }

    /// Выбирает подкатегорию.
    pub fn select_child_category(&mut self, id: Option<&str>) -> Result<(), DomainError> {
        self.selector.select_child(id)?;
        self.dirty = true;
        Ok(())
    }

    /// Подменяет дерево категорий после повторной загрузки.
    pub fn refresh_categories(&mut self, tree: CategoryTree) {
        self.selector.refresh(tree);
    }

    /// Изображение поста.
    pub fn feature_image(&self) -> Option<&FeatureImage> {
        self.feature_image.as_ref()
    }

    /// Меняет или убирает изображение поста.
    pub fn set_feature_image(&mut self, image: Option<FeatureImage>) {
        self.feature_image = image;
        self.dirty = true;
    }

    /// Подписи кнопок для текущего статуса.
    pub fn action_labels(&self) -> &'static [&'static str] {
        post::action_labels(self.status)
    }

    /// Проверяет, что действие можно выполнить.
    pub fn check(&self, action: &PostAction, now: DateTime<Utc>) -> Result<(), DomainError> {
        action.validate(now)?;
        if *action == PostAction::Trash && self.post_id.is_none() {
            return Err(DomainError::Validation {
                field: "id",
                message: "only a saved post can be moved to trash",
            });
        }
        validate_meta(&self.meta_title, &self.meta_description)
    }

    /// Куда отправлять сохранение.
    pub fn save_target(&self, action: &PostAction) -> SaveTarget {
        match (&self.post_id, action.target_status()) {
            (Some(id), _) => SaveTarget::Update(id.clone()),
            (None, PostStatus::Draft | PostStatus::Trash) => SaveTarget::CreateDraft,
            (None, PostStatus::Published | PostStatus::Scheduled) => SaveTarget::CreatePublished,
        }
    }

    /// Тело запроса с уже разрешёнными id тегов.
    pub fn payload(&self, action: &PostAction, tag_ids: Vec<String>, author: &str) -> PostPayload {
        let status = action.target_status();
        let scheduled_at = match status {
            PostStatus::Scheduled => action.scheduled_at(),
            _ => None,
        };

        PostPayload {
            title: self.title.trim().to_string(),
            slug: self.slug.join(),
            summary: self.summary.clone(),
            content: self.content.clone(),
            status,
            scheduled_at,
            feature_image: self.feature_image.clone(),
            category: self.selector.effective_category().map(str::to_string),
            tags: tag_ids,
            meta_title: self.meta_title.clone(),
            meta_description: self.meta_description.clone(),
            meta_keywords: self.meta_keywords.clone(),
            author_name: author.to_string(),
        }
    }

    /// Принимает ответ сервера после успешного сохранения.
    pub fn mark_saved(&mut self, saved: &Post) {
        self.post_id = Some(saved.id.clone());
        self.status = saved.status;
        self.scheduled_at = saved.scheduled_at;
        if !saved.slug.is_empty() {
            self.slug = SlugParts::split(&saved.slug);
        }
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, TimeZone};

    use super::*;
    use crate::category::Category;

    fn existing(id: &str, name: &str) -> Tag {
        Tag {
            id: id.to_string(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: String::new(),
            post_count: 3,
            is_trending: false,
        }
    }

    fn tree() -> CategoryTree {
        let cat = |id: &str, parent: Option<&str>| Category {
            id: id.to_string(),
            name: id.to_string(),
            slug: id.to_string(),
            parent_id: parent.map(str::to_string),
            description: String::new(),
            keywords: String::new(),
        };
        CategoryTree::build(&[cat("tech", None), cat("phones", Some("tech"))])
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn slug_base_edit_is_normalized_and_keeps_suffix() {
        let mut editor = PostEditor::new(tree());
        editor.set_slug_base("  World   News ");
        assert_eq!(editor.slug().base(), "world-news");
        assert!(editor.is_dirty());

        let post: Post = serde_json::from_str(r#"{"_id":"p1","slug":"breaking-news-a1b2c3"}"#)
            .expect("valid post");
        let mut editor = PostEditor::from_post(&post, tree(), &[]);
        editor.set_slug_base("Hot Take");
        assert_eq!(editor.slug().join(), "hot-take-a1b2c3");
    }

    #[test]
    fn save_target_depends_on_id_and_status() {
        let editor = PostEditor::new(tree());
        assert_eq!(editor.save_target(&PostAction::SaveDraft), SaveTarget::CreateDraft);
        assert_eq!(editor.save_target(&PostAction::Publish), SaveTarget::CreatePublished);
        assert_eq!(
            editor.save_target(&PostAction::Schedule(now())),
            SaveTarget::CreatePublished
        );
        assert_eq!(SaveTarget::CreatePublished.path(), "/api/posts/publish");

        let post: Post =
            serde_json::from_str(r#"{"_id":"p1","slug":"hello-9z"}"#).expect("valid post");
        let editor = PostEditor::from_post(&post, tree(), &[]);
        let target = editor.save_target(&PostAction::Publish);
        assert!(target.is_update());
        assert_eq!(target.path(), "/api/posts/p1");
    }

    #[test]
    fn payload_recombines_slug_and_takes_effective_category() {
        let post: Post = serde_json::from_str(
            r#"{"_id":"p1","slug":"breaking-news-a1b2c3","category":"phones","tags":["t1"]}"#,
        )
        .expect("valid post");
        let mut editor = PostEditor::from_post(&post, tree(), &[existing("t1", "Rust")]);
        assert_eq!(editor.tags(), ["Rust"]);
        assert_eq!(editor.selector().selected_parent(), Some("tech"));

        editor.set_slug_base("World News");
        let payload = editor.payload(&PostAction::SaveDraft, vec!["t1".to_string()], "alice");

        assert_eq!(payload.slug, "world-news-a1b2c3");
        assert_eq!(payload.category.as_deref(), Some("phones"));
        assert_eq!(payload.status, PostStatus::Draft);
        assert_eq!(payload.scheduled_at, None);
    }

    #[test]
    fn schedule_payload_carries_time() {
        let editor = PostEditor::new(tree());
        let at = now() + ChronoDuration::days(1);
        let payload = editor.payload(&PostAction::Schedule(at), vec![], "alice");
        assert_eq!(payload.status, PostStatus::Scheduled);
        assert_eq!(payload.scheduled_at, Some(at));
    }

    #[test]
    fn payload_json_omits_missing_schedule() {
        let mut editor = PostEditor::new(tree());
        editor.set_title("  T  ");
        let payload = editor.payload(&PostAction::SaveDraft, vec!["t1".to_string()], "alice");

        let json = serde_json::to_value(&payload).expect("serializable");
        assert!(json.get("scheduledAt").is_none());
        assert_eq!(json["title"], "T");
        assert_eq!(json["status"], "draft");
        assert_eq!(json["authorName"], "alice");
        assert_eq!(json["featureImage"], serde_json::Value::Null);
    }

    #[test]
    fn check_rejects_past_schedule_long_meta_and_unsaved_trash() {
        let mut editor = PostEditor::new(tree());
        assert_eq!(
            editor.check(&PostAction::Schedule(now() - ChronoDuration::hours(1)), now()),
            Err(DomainError::ScheduleInPast)
        );
        assert!(editor.check(&PostAction::Trash, now()).is_err());

        editor.set_meta_title("x".repeat(61));
        assert!(editor.check(&PostAction::SaveDraft, now()).is_err());
    }

    #[test]
    fn dirty_flag_drives_draft_autosave() {
        let mut editor = PostEditor::new(tree());
        assert!(!editor.should_autosave());

        editor.set_title("Hello");
        assert!(editor.should_autosave());

        let saved: Post = serde_json::from_str(r#"{"_id":"p9","status":"draft","slug":"hello-1a"}"#)
            .expect("valid post");
        editor.mark_saved(&saved);
        assert!(!editor.is_dirty());
        assert_eq!(editor.post_id(), Some("p9"));
        assert_eq!(editor.slug().suffix(), "-1a");

        editor.set_content("<p>x</p>");
        let published: Post =
            serde_json::from_str(r#"{"_id":"p9","status":"published"}"#).expect("valid post");
        editor.mark_saved(&published);
        editor.set_content("<p>y</p>");
        assert!(!editor.should_autosave());
        assert_eq!(editor.action_labels(), ["Update & Re-publish"]);
    }
}
