//! Сохранение поста через API: ленивое создание тегов и маршрут запроса.

use async_trait::async_trait;
use cms_core::tag::{self, TagResolution};
use cms_core::{SaveTarget, Tag, TagDraft};
use reqwest::Method;
use tracing::warn;

use crate::error::CmsClientResult;

#[async_trait]
/// Где создаются недостающие теги.
pub trait TagStore: Send + Sync {
    /// Создаёт тег и возвращает его с серверным id.
    async fn create_tag(&self, draft: &TagDraft) -> CmsClientResult<Tag>;
}

/// Превращает имена тегов в id, создавая недостающие теги по одному.
///
/// Сравнение с существующими тегами без учёта регистра. Созданные теги
/// добавляются в `known`. Если тег создать не удалось, имя пропускается,
/// а сохранение поста продолжается. Истёкшая сессия прерывает разбор.
pub async fn ensure_tags_exist<S>(
    store: &S,
    known: &mut Vec<Tag>,
    names: &[String],
) -> CmsClientResult<Vec<String>>
where
    S: TagStore + ?Sized,
{
    let mut ids = Vec::with_capacity(names.len());

    for step in tag::plan_resolution(known, names) {
        match step {
            TagResolution::Existing(id) => ids.push(id),
            TagResolution::Missing(name) => {
                match store.create_tag(&TagDraft::lazy(&name)).await {
                    Ok(created) => {
                        ids.push(created.id.clone());
                        known.push(created);
                    }
                    Err(err) if err.is_session_expired() => return Err(err),
                    Err(err) => warn!(tag = %name, error = %err, "failed to create tag, skipping"),
                }
            }
        }
    }

    Ok(ids)
}

pub(crate) fn route(target: &SaveTarget) -> (Method, String) {
    let method = if target.is_update() {
        Method::PUT
    } else {
        Method::POST
    };
    (method, target.path())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::CmsClientError;

    #[derive(Default)]
    struct FakeTags {
        created: Arc<Mutex<Vec<String>>>,
        reject: Option<String>,
        expired: bool,
    }

    #[async_trait]
    impl TagStore for FakeTags {
        async fn create_tag(&self, draft: &TagDraft) -> CmsClientResult<Tag> {
            if self.expired {
                return Err(CmsClientError::SessionExpired);
            }
            if self.reject.as_deref() == Some(draft.name.as_str()) {
                return Err(CmsClientError::Api {
                    status: 500,
                    message: "boom".to_string(),
                });
            }
            let mut created = self.created.lock().expect("lock");
            created.push(draft.name.clone());
            Ok(Tag {
                id: format!("new-{}", created.len()),
                name: draft.name.clone(),
                slug: draft.slug.clone(),
                description: String::new(),
                post_count: 0,
                is_trending: false,
            })
        }
    }

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

    #[tokio::test]
    async fn only_missing_tags_are_created() {
        let store = FakeTags::default();
        let mut known = vec![existing("t1", "Rust")];
        let names = vec!["rust".to_string(), "Tokio".to_string()];

        let ids = ensure_tags_exist(&store, &mut known, &names)
            .await
            .expect("tags resolved");

        assert_eq!(ids, vec!["t1", "new-1"]);
        assert_eq!(*store.created.lock().expect("lock"), vec!["Tokio"]);
        assert_eq!(known.len(), 2);
    }

    #[tokio::test]
    async fn failed_tag_is_skipped() {
        let store = FakeTags {
            reject: Some("Broken".to_string()),
            ..FakeTags::default()
        };
        let mut known = Vec::new();
        let names = vec!["Broken".to_string(), "Fine".to_string()];

        let ids = ensure_tags_exist(&store, &mut known, &names)
            .await
            .expect("tags resolved");
        assert_eq!(ids, vec!["new-1"]);
    }

    #[tokio::test]
    async fn expired_session_stops_tag_resolution() {
        let store = FakeTags {
            expired: true,
            ..FakeTags::default()
        };
        let mut known = vec![existing("t1", "Rust")];
        let names = vec!["Rust".to_string(), "Tokio".to_string()];

        let err = ensure_tags_exist(&store, &mut known, &names)
            .await
            .expect_err("session expired");
        assert!(err.is_session_expired());
        assert_eq!(known.len(), 1);
    }

    #[test]
    fn route_uses_put_only_for_saved_posts() {
        assert_eq!(
            route(&SaveTarget::CreateDraft),
            (Method::POST, "/api/posts".to_string())
        );
        assert_eq!(
            route(&SaveTarget::Update("p1".to_string())),
            (Method::PUT, "/api/posts/p1".to_string())
        );
    }
}
