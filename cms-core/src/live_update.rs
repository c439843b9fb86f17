//! Live-обновления поста (лента событий для live-блога).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::wire;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Одно live-обновление.
pub struct LiveUpdate {
    /// Идентификатор.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Пост, к которому относится обновление.
    #[serde(default, deserialize_with = "wire::optional_id_ref")]
    pub post_id: Option<String>,
    /// Заголовок.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub title: String,
    /// HTML-содержимое.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub content: String,
    /// Автор.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub created_by: String,
    /// Закреплено ли наверху ленты.
    #[serde(default, deserialize_with = "wire::nullable_bool")]
    pub pinned: bool,
    /// Когда опубликовано.
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

/// Порядок показа: закреплённые сверху, внутри групп новые раньше старых.
pub fn sort_for_display(updates: &mut [LiveUpdate]) {
    updates.sort_by(|a, b| {
        b.pinned
            .cmp(&a.pinned)
            .then_with(|| b.posted_at.cmp(&a.posted_at))
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Тело `POST /api/live-updates/:postId`.
pub struct LiveUpdateDraft {
    /// Заголовок.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Содержимое.
    #[validate(length(min = 1))]
    pub content: String,
    /// Автор, обычно пользователь из сессии.
    pub created_by: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Частичное изменение live-обновления.
pub struct LiveUpdatePatch {
    /// Новый заголовок.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Новое содержимое.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Закрепить или открепить.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
}

impl LiveUpdatePatch {
    /// Переключение закрепления.
    pub fn toggle_pin(update: &LiveUpdate) -> Self {
        Self {
            pinned: Some(!update.pinned),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn update(id: &str, pinned: bool, hour: u32) -> LiveUpdate {
        LiveUpdate {
            id: id.to_string(),
            post_id: Some("p1".to_string()),
            title: id.to_string(),
            content: String::new(),
            created_by: "editor".to_string(),
            pinned,
            posted_at: Some(Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap()),
        }
    }

    #[test]
    fn pinned_first_then_newest() {
        let mut updates = vec![
            update("old", false, 1),
            update("pinned-old", true, 2),
            update("new", false, 5),
            update("pinned-new", true, 4),
        ];
        sort_for_display(&mut updates);

        let order: Vec<_> = updates.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(order, vec!["pinned-new", "pinned-old", "new", "old"]);
    }

    #[test]
    fn toggle_pin_sends_only_flag() {
        let patch = LiveUpdatePatch::toggle_pin(&update("u", true, 1));
        let json = serde_json::to_value(&patch).expect("serializable");
        assert_eq!(json, serde_json::json!({ "pinned": false }));
    }

    #[test]
    fn draft_requires_title_and_content() {
        let draft = LiveUpdateDraft {
            title: String::new(),
            content: "x".to_string(),
            created_by: "me".to_string(),
        };
        assert!(draft.validate().is_err());
    }
}
