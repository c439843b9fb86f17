//! Ошибки доменного уровня.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Ошибки доменного уровня: проверка данных до отправки на сервер.
pub enum DomainError {
    /// Поле не прошло проверку.
    #[error("validation failed for '{field}': {message}")]
    Validation {
        /// Имя поля в терминах API.
        field: &'static str,
        /// Что именно не так.
        message: &'static str,
    },

    /// Сущность с таким идентификатором отсутствует в локальной копии.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Нарушение двухуровневой иерархии категорий.
    #[error("invalid category hierarchy: {0}")]
    InvalidHierarchy(&'static str),

    /// MIME-тип файла не входит в список разрешённых для загрузки.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Попытка запланировать публикацию на прошедшее время.
    #[error("cannot schedule a post in the past")]
    ScheduleInPast,
}
