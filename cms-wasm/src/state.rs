use cms_core::{Category, CategoryTree, MediaLibrary, Post, PostEditor, Tag};
use leptos::prelude::*;

use crate::api::ApiError;
use crate::models::Session;
use crate::storage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tab {
    Posts,
    Editor,
    Media,
}

#[derive(Debug, Clone)]
pub(crate) struct AppState {
    pub(crate) session: RwSignal<Option<Session>>,
    pub(crate) tab: RwSignal<Tab>,
    pub(crate) categories: RwSignal<Vec<Category>>,
    pub(crate) tags: RwSignal<Vec<Tag>>,
    pub(crate) posts: RwSignal<Vec<Post>>,
    pub(crate) editor: RwSignal<PostEditor>,
    pub(crate) media: RwSignal<MediaLibrary>,
    pub(crate) error: RwSignal<Option<String>>,
    pub(crate) notice: RwSignal<Option<String>>,
    pub(crate) loading: RwSignal<bool>,
}

impl AppState {
    pub(crate) fn new() -> Self {
        Self {
            session: RwSignal::new(None),
            tab: RwSignal::new(Tab::Posts),
            categories: RwSignal::new(Vec::new()),
            tags: RwSignal::new(Vec::new()),
            posts: RwSignal::new(Vec::new()),
            editor: RwSignal::new(PostEditor::default()),
            media: RwSignal::new(MediaLibrary::default()),
            error: RwSignal::new(None),
            notice: RwSignal::new(None),
            loading: RwSignal::new(false),
        }
    }

    pub(crate) fn set_error(&self, message: impl Into<String>) {
        self.error.set(Some(message.into()));
    }

    pub(crate) fn clear_error(&self) {
        self.error.set(None);
    }

    pub(crate) fn set_notice(&self, message: impl Into<String>) {
        self.notice.set(Some(message.into()));
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.session.with(Option::is_some)
    }

    pub(crate) fn token(&self) -> Option<String> {
        self.session.with(|session| session.as_ref().map(|s| s.token.clone()))
    }

    pub(crate) fn username(&self) -> Option<String> {
        self.session
            .with(|session| session.as_ref().map(|s| s.username.clone()))
    }

    pub(crate) fn category_tree(&self) -> CategoryTree {
        self.categories.with(|categories| CategoryTree::build(categories))
    }

    /// Локальный выход: сервер не вызывается.
    pub(crate) fn end_session(&self, notice: &str) {
        if let Err(err) = storage::clear_session() {
            self.set_error(err);
        }
        self.session.set(None);
        self.posts.set(Vec::new());
        self.editor.set(PostEditor::default());
        self.media.set(MediaLibrary::default());
        self.set_notice(notice);
    }

    /// Показывает ошибку запроса; 401 завершает сессию.
    pub(crate) fn report(&self, err: ApiError) {
        if err.is_unauthorized() {
            self.end_session("Сессия истекла, войдите снова");
            return;
        }
        self.set_error(err.to_string());
    }
}
