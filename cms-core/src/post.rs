//! Посты: модель, статусы и действия редактора, SEO-лимиты и фильтры списка.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;
use crate::media::MediaType;
use crate::slug;
use crate::wire;

/// Лимит длины meta title.
pub const MAX_META_TITLE: usize = 60;
/// Лимит длины meta description.
pub const MAX_META_DESCRIPTION: usize = 160;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Статус поста. Переходы между статусами ничем не ограничены.
pub enum PostStatus {
    /// Черновик.
    #[default]
    Draft,
    /// Опубликован.
    Published,
    /// Запланирован.
    Scheduled,
    /// В корзине.
    Trash,
}

impl PostStatus {
    /// Имя статуса на проводе.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Scheduled => "scheduled",
            Self::Trash => "trash",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "scheduled" => Ok(Self::Scheduled),
            "trash" => Ok(Self::Trash),
            _ => Err(DomainError::Validation {
                field: "status",
                message: "expected draft, published, scheduled or trash",
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Выбранное для поста изображение (снимок ассета медиатеки).
pub struct FeatureImage {
    /// Адрес файла.
    pub url: String,
    /// Заголовок.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub title: String,
    /// Alt-текст.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub alt_text: String,
    /// Подпись.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub caption: String,
    /// Описание.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub description: String,
    /// Тип ассета.
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
}

impl From<&crate::media::MediaAsset> for FeatureImage {
    fn from(asset: &crate::media::MediaAsset) -> Self {
        Self {
            url: asset.url.clone(),
            title: asset.title.clone(),
            alt_text: asset.alt_text.clone(),
            caption: asset.caption.clone(),
            description: asset.description.clone(),
            media_type: asset.media_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Категория поста: id и, если бэкенд её раскрыл, названия.
pub struct PostCategory {
    /// Идентификатор категории.
    pub id: String,
    /// Название категории.
    pub name: Option<String>,
    /// Название родительской категории.
    pub parent_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParentRef {
    Object {
        #[serde(default)]
        name: Option<String>,
    },
    Id(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPostCategory {
    Id(String),
    Object {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(rename = "parentCategory", default)]
        parent: Option<ParentRef>,
    },
}

fn post_category<'de, D>(deserializer: D) -> Result<Option<PostCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    let category = Option::<RawPostCategory>::deserialize(deserializer)?.map(|raw| match raw {
        RawPostCategory::Id(id) => PostCategory {
            id,
            ..PostCategory::default()
        },
        RawPostCategory::Object { id, name, parent } => PostCategory {
            id,
            name,
            parent_name: match parent {
                Some(ParentRef::Object { name }) => name,
                _ => None,
            },
        },
    });

    Ok(category.filter(|category| !category.id.trim().is_empty()))
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Пост в том виде, в каком его отдаёт `/api/posts`.
pub struct Post {
    /// Идентификатор.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Заголовок.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub title: String,
    /// Slug вместе с серверным суффиксом.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub slug: String,
    /// Статус.
    #[serde(default)]
    pub status: PostStatus,
    /// Время публикации для запланированных постов.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    /// Краткое содержание.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub summary: String,
    /// HTML-содержимое.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub content: String,
    /// Изображение поста.
    #[serde(default)]
    pub feature_image: Option<FeatureImage>,
    /// Категория.
    #[serde(default, deserialize_with = "post_category")]
    pub category: Option<PostCategory>,
    /// Идентификаторы тегов.
    #[serde(default, deserialize_with = "wire::id_ref_list")]
    pub tags: Vec<String>,
    /// Meta title.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub meta_title: String,
    /// Meta description.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub meta_description: String,
    /// Meta keywords.
    #[serde(default, deserialize_with = "wire::string_list")]
    pub meta_keywords: Vec<String>,
    /// Автор.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub author_name: String,
    /// Когда опубликован.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Когда изменён.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Публичный путь поста на сайте.
    pub fn public_path(&self) -> String {
        let category = self.category.as_ref();
        slug::public_path(
            &self.slug,
            category.and_then(|c| c.name.as_deref()),
            category.and_then(|c| c.parent_name.as_deref()),
        )
    }

    /// Время, которое показывается в списке постов.
    pub fn listing_timestamp(&self) -> Option<DateTime<Utc>> {
        match self.status {
            PostStatus::Published => self.published_at.or(self.updated_at),
            PostStatus::Scheduled => self.scheduled_at.or(self.updated_at),
            PostStatus::Draft | PostStatus::Trash => self.updated_at,
        }
    }

    /// Идентификатор категории, если она есть.
    pub fn category_id(&self) -> Option<&str> {
        self.category.as_ref().map(|category| category.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Счётчик символов SEO-поля.
pub struct MetaCounter {
    /// Сколько символов введено.
    pub used: usize,
    /// Лимит.
    pub max: usize,
}

impl MetaCounter {
    /// Считает символы (не байты) значения.
    pub fn new(value: &str, max: usize) -> Self {
        Self {
            used: value.chars().count(),
            max,
        }
    }

    /// Счётчик для meta title.
    pub fn title(value: &str) -> Self {
        Self::new(value, MAX_META_TITLE)
    }

    /// Счётчик для meta description.
    pub fn description(value: &str) -> Self {
        Self::new(value, MAX_META_DESCRIPTION)
    }

    /// Превышен ли лимит.
    pub fn is_exceeded(&self) -> bool {
        self.used > self.max
    }

    /// Сколько символов ещё можно ввести.
    pub fn remaining(&self) -> usize {
        self.max.saturating_sub(self.used)
    }

    /// Заполненность в процентах, не больше 100.
    pub fn percent(&self) -> u8 {
        if self.max == 0 {
            return 100;
        }
        let percent = (self.used * 100 / self.max).min(100);
        u8::try_from(percent).unwrap_or(100)
    }
}

/// Проверяет SEO-поля поста перед сохранением.
pub fn validate_meta(meta_title: &str, meta_description: &str) -> Result<(), DomainError> {
    if MetaCounter::title(meta_title).is_exceeded() {
        return Err(DomainError::Validation {
            field: "metaTitle",
            message: "meta title must be at most 60 characters",
        });
    }
    if MetaCounter::description(meta_description).is_exceeded() {
        return Err(DomainError::Validation {
            field: "metaDescription",
            message: "meta description must be at most 160 characters",
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Действие редактора поста.
pub enum PostAction {
    /// Сохранить черновик.
    SaveDraft,
    /// Опубликовать сейчас.
    Publish,
    /// Запланировать публикацию.
    Schedule(DateTime<Utc>),
    /// Отправить в корзину.
    Trash,
}

impl PostAction {
    /// Статус, который получит пост.
    pub fn target_status(&self) -> PostStatus {
        match self {
            Self::SaveDraft => PostStatus::Draft,
            Self::Publish => PostStatus::Published,
            Self::Schedule(_) => PostStatus::Scheduled,
            Self::Trash => PostStatus::Trash,
        }
    }

    /// Время публикации для планирования.
    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Schedule(at) => Some(*at),
            _ => None,
        }
    }

    /// Проверяет действие относительно текущего времени.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self {
            Self::Schedule(at) if *at < now => Err(DomainError::ScheduleInPast),
            _ => Ok(()),
        }
    }
}

/// Подписи кнопок редактора для текущего статуса поста.
pub fn action_labels(status: PostStatus) -> &'static [&'static str] {
    match status {
        PostStatus::Draft => &["Save Draft", "Schedule", "Publish"],
        PostStatus::Published => &["Update & Re-publish"],
        PostStatus::Scheduled => &["Publish Now", "Edit Schedule"],
        PostStatus::Trash => &["Save Draft", "Publish"],
    }
}

/// Проверяет месяц фильтра в формате `YYYY-MM`.
pub fn parse_month(raw: &str) -> Result<String, DomainError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .map(|_| raw.to_string())
        .map_err(|_| DomainError::Validation {
            field: "month",
            message: "expected YYYY-MM",
        })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Фильтры списка постов.
pub struct PostQuery {
    /// Конкретный статус; без него корзина скрывается.
    pub status: Option<PostStatus>,
    /// Автор.
    pub author_name: Option<String>,
    /// Месяц `YYYY-MM`.
    pub month: Option<String>,
    /// Поиск по заголовку.
    pub search: Option<String>,
    /// Категории: выбранная подкатегория или родитель со всеми детьми.
    pub category_in: Vec<String>,
}

impl PostQuery {
    /// Пары query-параметров для `GET /api/posts`.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        match self.status {
            Some(status) => pairs.push(("status", status.to_string())),
            None => pairs.push(("status_ne", PostStatus::Trash.to_string())),
        }

        let optional = [
            ("authorName", &self.author_name),
            ("month", &self.month),
            ("search", &self.search),
        ];
        for (key, value) in optional {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }

        if !self.category_in.is_empty() {
            pairs.push(("categoryIn", self.category_in.join(",")));
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn status_parsing_and_display() {
        assert_eq!("Published".parse::<PostStatus>(), Ok(PostStatus::Published));
        assert_eq!(PostStatus::Trash.to_string(), "trash");
        assert!("archived".parse::<PostStatus>().is_err());
    }

    #[test]
    fn scheduling_in_past_is_rejected() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let past = PostAction::Schedule(now - Duration::minutes(1));
        let future = PostAction::Schedule(now + Duration::hours(1));

        assert_eq!(past.validate(now), Err(DomainError::ScheduleInPast));
        assert_eq!(future.validate(now), Ok(()));
        assert_eq!(future.target_status(), PostStatus::Scheduled);
        assert_eq!(PostAction::Trash.validate(now), Ok(()));
    }

    #[test]
    fn labels_follow_status() {
        assert_eq!(action_labels(PostStatus::Published), &["Update & Re-publish"]);
        assert_eq!(
            action_labels(PostStatus::Scheduled),
            &["Publish Now", "Edit Schedule"]
        );
    }

    #[test]
    fn meta_counter_counts_chars() {
        let counter = MetaCounter::title("ёжик");
        assert_eq!(counter.used, 4);
        assert_eq!(counter.remaining(), 56);
        assert!(!counter.is_exceeded());

        let long = "x".repeat(161);
        assert!(MetaCounter::description(&long).is_exceeded());
        assert_eq!(MetaCounter::description(&long).percent(), 100);
        assert!(validate_meta("ok", &long).is_err());
        assert!(validate_meta(&"t".repeat(60), "ok").is_ok());
    }

    #[test]
    fn query_hides_trash_by_default() {
        let query = PostQuery {
            author_name: Some("  ".to_string()),
            search: Some("rust".to_string()),
            category_in: vec!["a".to_string(), "b".to_string()],
            ..PostQuery::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("status_ne", "trash".to_string()),
                ("search", "rust".to_string()),
                ("categoryIn", "a,b".to_string()),
            ]
        );

        let trash = PostQuery {
            status: Some(PostStatus::Trash),
            ..PostQuery::default()
        };
        assert_eq!(trash.to_pairs(), vec![("status", "trash".to_string())]);
    }

    #[test]
    fn month_must_be_year_and_month() {
        assert_eq!(parse_month("2026-03"), Ok("2026-03".to_string()));
        assert!(parse_month("2026-13").is_err());
        assert!(parse_month("March").is_err());
    }

    #[test]
    fn post_accepts_populated_category_and_joined_keywords() {
        let raw = r#"{
            "_id": "p1",
            "title": "Hello",
            "slug": "hello-1a2b",
            "status": "published",
            "category": {"_id": "c2", "name": "Phones", "parentCategory": {"_id": "c1", "name": "Tech"}},
            "tags": ["t1", {"_id": "t2"}],
            "metaKeywords": "rust, cms",
            "publishedAt": "2026-01-02T03:04:05Z",
            "featureImage": null
        }"#;
        let post: Post = serde_json::from_str(raw).expect("valid post");

        assert_eq!(post.category_id(), Some("c2"));
        assert_eq!(post.public_path(), "/tech/phones/hello-1a2b");
        assert_eq!(post.tags, vec!["t1", "t2"]);
        assert_eq!(post.meta_keywords, vec!["rust", "cms"]);
        assert_eq!(post.listing_timestamp(), post.published_at);
        assert!(post.feature_image.is_none());
    }

    #[test]
    fn post_accepts_bare_category_id() {
        let raw = r#"{"_id":"p1","category":"c1","status":"draft"}"#;
        let post: Post = serde_json::from_str(raw).expect("valid post");
        assert_eq!(post.category_id(), Some("c1"));
        assert_eq!(post.public_path(), "/");
        assert_eq!(post.status, PostStatus::Draft);
    }
}
