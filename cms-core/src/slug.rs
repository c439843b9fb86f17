//! Работа со slug: разбиение на редактируемую основу и серверный суффикс,
//! генерация slug из названий и публичные пути постов.

/// Slug, разобранный на редактируемую основу и неизменяемый суффикс.
///
/// Сервер дописывает к slug токен уникальности (`breaking-news-a1b2c3`).
/// Пользователь правит только основу, суффикс при сохранении приклеивается
/// обратно без изменений.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlugParts {
    base: String,
    suffix: String,
}

impl SlugParts {
    /// Разбирает сохранённый slug.
    ///
    /// Суффикс есть, только если сегмент после последнего `-` непустой
    /// и состоит из ASCII-букв и цифр.
    /// Иначе весь slug считается основой.
    pub fn split(slug: &str) -> Self {
        if let Some(dash) = slug.rfind('-') {
            let tail = &slug[dash + 1..];
            if is_uniqueness_token(tail) {
                return Self {
                    base: slug[..dash].to_string(),
                    suffix: slug[dash..].to_string(),
                };
            }
        }

        Self {
            base: slug.to_string(),
            suffix: String::new(),
        }
    }

    /// Редактируемая часть slug.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Суффикс вместе с ведущим `-`, либо пустая строка.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Есть ли у slug серверный суффикс.
    pub fn has_suffix(&self) -> bool {
        !self.suffix.is_empty()
    }

    /// Заменяет основу; суффикс не трогается.
    pub fn set_base(&mut self, base: impl Into<String>) {
        self.base = base.into();
    }

    /// Собирает итоговый slug для сохранения.
    pub fn join(&self) -> String {
        format!("{}{}", self.base, self.suffix)
    }
}

fn is_uniqueness_token(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|ch| ch.is_ascii_alphanumeric())
}

/// Делает slug из произвольного названия.
///
/// Нижний регистр, пробельные последовательности превращаются в `-`,
/// всё кроме букв, цифр, `_` и `-` выбрасывается, повторные `-` схлопываются,
/// крайние `-` обрезаются.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = false;

    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        let mapped = if ch.is_whitespace() || ch == '-' {
            '-'
        } else if ch.is_alphanumeric() || ch == '_' {
            ch
        } else {
            continue;
        };

        if mapped == '-' {
            if last_dash {
                continue;
            }
            last_dash = true;
        } else {
            last_dash = false;
        }
        out.push(mapped);
    }

    out.trim_matches('-').to_string()
}

/// Нормализует slug, введённый пользователем вручную: обрезка краёв,
/// пробелы в `-`, нижний регистр.
pub fn normalize_slug_input(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Slug новой категории.
///
/// Явно введённый slug имеет приоритет. Иначе slug строится из названия,
/// а у подкатегории к нему добавляется slug родителя.
pub fn category_slug(name: &str, explicit: Option<&str>, parent_name: Option<&str>) -> String {
    let explicit = explicit.map(normalize_slug_input).unwrap_or_default();
    if !explicit.is_empty() {
        return explicit;
    }

    let own = slugify(name);
    match parent_name.map(slugify) {
        Some(parent) if !parent.is_empty() => format!("{own}-{parent}"),
        _ => own,
    }
}

/// Публичный путь поста на сайте: `/родитель/категория/slug`,
/// `/категория/slug` или просто `/slug`.
pub fn public_path(post_slug: &str, category_name: Option<&str>, parent_name: Option<&str>) -> String {
    match (category_name, parent_name) {
        (Some(category), Some(parent)) => {
            format!("/{}/{}/{}", slugify(parent), slugify(category), post_slug)
        }
        (Some(category), None) => format!("/{}/{}", slugify(category), post_slug),
        _ => format!("/{post_slug}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_extracts_server_suffix() {
        let parts = SlugParts::split("breaking-news-a1b2c3");
        assert_eq!(parts.base(), "breaking-news");
        assert_eq!(parts.suffix(), "-a1b2c3");
        assert!(parts.has_suffix());
    }

    #[test]
    fn split_treats_letters_only_tail_as_suffix() {
        let parts = SlugParts::split("my-post-abcdef");
        assert_eq!(parts.base(), "my-post");
        assert_eq!(parts.suffix(), "-abcdef");
    }

    #[test]
    fn split_of_dashless_slug_has_no_suffix() {
        let parts = SlugParts::split("breakingnews");
        assert_eq!(parts.base(), "breakingnews");
        assert_eq!(parts.suffix(), "");
    }

    #[test]
    fn split_without_dash_is_fully_editable() {
        let parts = SlugParts::split("breakingnews");
        assert_eq!(parts.base(), "breakingnews");
        assert!(!parts.has_suffix());
    }

    #[test]
    fn split_rejects_non_alphanumeric_tail() {
        let parts = SlugParts::split("abc-!!");
        assert_eq!(parts.base(), "abc-!!");
        assert_eq!(parts.suffix(), "");
    }

    #[test]
    fn split_ignores_trailing_dash() {
        let parts = SlugParts::split("abc-");
        assert_eq!(parts.base(), "abc-");
        assert!(!parts.has_suffix());
    }

    #[test]
    fn edited_base_keeps_original_suffix() {
        let mut parts = SlugParts::split("breaking-news-a1b2c3");
        parts.set_base("world-news");
        assert_eq!(parts.join(), "world-news-a1b2c3");
    }

    #[test]
    fn join_without_suffix_returns_base() {
        let parts = SlugParts::split("hello");
        assert_eq!(parts.join(), "hello");
    }

    #[test]
    fn slugify_normalizes_name() {
        assert_eq!(slugify("  Hello,   World!! "), "hello-world");
        assert_eq!(slugify("Rust -- Async"), "rust-async");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn category_slug_prefers_explicit_value() {
        assert_eq!(category_slug("Tech", Some("  My Tech "), None), "my-tech");
    }

    #[test]
    fn category_slug_appends_parent() {
        assert_eq!(category_slug("Mobile Phones", None, Some("Tech")), "mobile-phones-tech");
        assert_eq!(category_slug("Tech", Some("   "), None), "tech");
    }

    #[test]
    fn public_path_follows_category_depth() {
        assert_eq!(public_path("p-1a", Some("Phones"), Some("Tech")), "/tech/phones/p-1a");
        assert_eq!(public_path("p-1a", Some("Tech"), None), "/tech/p-1a");
        assert_eq!(public_path("p-1a", None, None), "/p-1a");
    }
}
