//! Доменная логика админки CMS, общая для HTTP-клиента, CLI и wasm-фронтенда.
//!
//! Здесь нет сети и таймеров: только модели, которые приходят от REST API,
//! и чистые операции над ними:
//! - дерево категорий и каскадный выбор родитель/подкатегория;
//! - разбор slug с неизменяемым суффиксом;
//! - ленивое создание тегов (план разрешения имён);
//! - реестр медиатеки и проверка загрузок до сетевого запроса;
//! - статусы/действия постов, редактор поста, фильтры списка, live-обновления;
//! - часы неактивности для автоматического выхода.
#![warn(missing_docs)]

pub mod category;
pub mod category_selector;
pub mod editor;
pub mod error;
pub mod inactivity;
pub mod live_update;
pub mod media;
pub mod post;
pub mod slug;
pub mod tag;
pub mod user;

mod wire;

pub use category::{Category, CategoryDraft, CategoryNode, CategoryTree, FlatCategory};
pub use category_selector::CategorySelector;
pub use editor::{DRAFT_AUTOSAVE_INTERVAL, PostEditor, PostPayload, SaveTarget};
pub use error::DomainError;
pub use inactivity::InactivityClock;
pub use live_update::{LiveUpdate, LiveUpdateDraft, LiveUpdatePatch};
pub use media::{DetailField, MediaAsset, MediaDetails, MediaLibrary, MediaType};
pub use post::{FeatureImage, Post, PostAction, PostCategory, PostQuery, PostStatus};
pub use slug::SlugParts;
pub use tag::{Tag, TagDraft};
pub use user::{NewUser, Role, RoleCounts, User, UserPatch};
