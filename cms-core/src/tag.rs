//! Теги: модель, разбор ввода в редакторе поста, подсказки и план
//! ленивого создания недостающих тегов.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::slug;
use crate::wire;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Тег из `list-tags`.
pub struct Tag {
    /// Идентификатор тега.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Название.
    pub name: String,
    /// Slug.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub slug: String,
    /// Описание.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub description: String,
    /// Сколько постов ссылается на тег (считает сервер).
    #[serde(default, deserialize_with = "wire::nullable_u64")]
    pub post_count: u64,
    /// Флаг «в тренде».
    #[serde(default, deserialize_with = "wire::nullable_bool")]
    pub is_trending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Тело запроса `add-tag` / `update-tag`.
pub struct TagDraft {
    /// Название.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Slug; по умолчанию строится из названия.
    #[validate(length(min = 1, max = 200))]
    pub slug: String,
    /// Описание.
    pub description: String,
    /// Флаг «в тренде».
    pub is_trending: bool,
}

impl TagDraft {
    /// Черновик из формы тега.
    pub fn new(name: &str, explicit_slug: Option<&str>, description: &str, is_trending: bool) -> Self {
        let name = name.trim().to_string();
        let slug = explicit_slug
            .map(slug::normalize_slug_input)
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| slug::slugify(&name));

        Self {
            name,
            slug,
            description: description.trim().to_string(),
            is_trending,
        }
    }

    /// Черновик тега, создаваемого на лету из редактора поста.
    pub fn lazy(name: &str) -> Self {
        Self::new(name, None, "", false)
    }
}

/// Разбирает строку ввода тегов: через запятую, без пустых значений.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Добавляет теги из строки ввода к текущему списку без точных повторов.
pub fn merge_tag_input(current: &mut Vec<String>, input: &str) {
    for name in parse_tag_input(input) {
        if !current.contains(&name) {
            current.push(name);
        }
    }
}

/// Подсказки: существующие теги, в названии которых встречается ввод
/// (без учёта регистра). Пустой ввод подсказок не даёт.
pub fn suggest<'a>(tags: &'a [Tag], input: &str) -> Vec<&'a Tag> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    tags.iter()
        .filter(|tag| tag.name.to_lowercase().contains(&needle))
        .collect()
}

/// Ищет тег по названию без учёта регистра.
pub fn find_by_name<'a>(tags: &'a [Tag], name: &str) -> Option<&'a Tag> {
    let needle = name.trim().to_lowercase();
    tags.iter().find(|tag| tag.name.to_lowercase() == needle)
}

/// Только теги «в тренде».
pub fn trending(tags: &[Tag]) -> Vec<&Tag> {
    tags.iter().filter(|tag| tag.is_trending).collect()
}

/// Превращает id тегов поста в названия; неизвестные id пропускаются.
pub fn names_for_ids(tags: &[Tag], ids: &[String]) -> Vec<String> {
    ids.iter()
        .filter_map(|id| tags.iter().find(|tag| &tag.id == id))
        .map(|tag| tag.name.clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Как получить id для очередного имени тега.
pub enum TagResolution {
    /// Тег уже существует.
    Existing(String),
    /// Тег нужно создать перед сохранением поста.
    Missing(String),
}

/// План разрешения имён тегов против уже известных тегов.
///
/// Имена, совпадающие без учёта регистра с ранее встреченным недостающим
/// именем, второй раз к созданию не планируются.
pub fn plan_resolution(tags: &[Tag], names: &[String]) -> Vec<TagResolution> {
    let mut planned_missing: Vec<String> = Vec::new();
    let mut plan = Vec::with_capacity(names.len());

    for name in names {
        if let Some(existing) = find_by_name(tags, name) {
            plan.push(TagResolution::Existing(existing.id.clone()));
            continue;
        }

        let key = name.trim().to_lowercase();
        if planned_missing.contains(&key) {
            continue;
        }
        planned_missing.push(key);
        plan.push(TagResolution::Missing(name.trim().to_string()));
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: &str, name: &str, trending: bool) -> Tag {
        Tag {
            id: id.to_string(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: String::new(),
            post_count: 0,
            is_trending: trending,
        }
    }

    #[test]
    fn parse_input_splits_and_trims() {
        assert_eq!(parse_tag_input(" rust, ,web ,"), vec!["rust", "web"]);
        assert!(parse_tag_input("   ").is_empty());
    }

    #[test]
    fn merge_input_skips_exact_duplicates() {
        let mut current = vec!["rust".to_string()];
        merge_tag_input(&mut current, "rust, async, async");
        assert_eq!(current, vec!["rust", "async"]);
    }

    #[test]
    fn suggest_is_case_insensitive() {
        let tags = vec![tag("1", "Rust", false), tag("2", "Trust", false), tag("3", "Go", false)];
        let names: Vec<_> = suggest(&tags, "RUS").iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Rust", "Trust"]);
        assert!(suggest(&tags, " ").is_empty());
    }

    #[test]
    fn plan_matches_existing_case_insensitively() {
        let tags = vec![tag("1", "Rust", false)];
        let names = vec!["rust".to_string(), "Tokio".to_string(), "TOKIO".to_string()];

        let plan = plan_resolution(&tags, &names);
        assert_eq!(
            plan,
            vec![
                TagResolution::Existing("1".to_string()),
                TagResolution::Missing("Tokio".to_string()),
            ]
        );
    }

    #[test]
    fn names_for_ids_drops_unknown() {
        let tags = vec![tag("1", "Rust", false), tag("2", "Web", true)];
        let ids = vec!["2".to_string(), "x".to_string(), "1".to_string()];
        assert_eq!(names_for_ids(&tags, &ids), vec!["Web", "Rust"]);
        assert_eq!(trending(&tags).len(), 1);
    }

    #[test]
    fn draft_generates_slug_from_name() {
        let draft = TagDraft::new("  Breaking News ", None, "", true);
        assert_eq!(draft.name, "Breaking News");
        assert_eq!(draft.slug, "breaking-news");
        assert!(draft.is_trending);

        let lazy = TagDraft::lazy("Rust");
        assert_eq!(lazy.slug, "rust");
        assert!(!lazy.is_trending);
    }

    #[test]
    fn tag_tolerates_missing_counters() {
        let raw = r#"{"_id":"t1","name":"Rust","postCount":null}"#;
        let tag: Tag = serde_json::from_str(raw).expect("valid tag");
        assert_eq!(tag.post_count, 0);
        assert!(!tag.is_trending);
    }
}
