use cms_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `cms-client`.
pub enum CmsClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Сервер ответил 401: сессия истекла, локальная сессия сброшена.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// Операция требует входа, а сессии нет.
    #[error("unauthorized: login required")]
    Unauthorized,

    /// Сервер запретил операцию (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Запрошенный ресурс не найден.
    #[error("not found")]
    NotFound,

    /// Слишком много запросов (429).
    #[error("too many requests, try again later")]
    RateLimited,

    /// Прочие ошибки сервера с его сообщением.
    #[error("server error {status}: {message}")]
    Api {
        /// HTTP-статус.
        status: u16,
        /// Сообщение сервера или запасной текст.
        message: String,
    },

    /// Токен не удалось разобрать.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Локальная проверка данных не прошла.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Форма не прошла проверку `validator`.
    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Некорректный запрос, обнаруженный на клиенте.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Результат операций `cms-client`.
pub type CmsClientResult<T> = Result<T, CmsClientError>;

impl CmsClientError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => Self::SessionExpired,
            reqwest::StatusCode::FORBIDDEN => {
                Self::Forbidden(message.unwrap_or_else(|| "access denied".to_string()))
            }
            reqwest::StatusCode::NOT_FOUND => Self::NotFound,
            reqwest::StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            _ => {
                let message = message.unwrap_or_else(|| format!("http status {status}"));
                Self::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }

    /// Ошибки входа читаются иначе: 401 означает неверные данные,
    /// а не истёкшую сессию.
    pub(crate) fn from_login_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => Self::Api {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| "invalid username or password".to_string()),
            },
            reqwest::StatusCode::FORBIDDEN => Self::Forbidden(
                message.unwrap_or_else(|| "account is locked".to_string()),
            ),
            _ => Self::from_http_status(status, message),
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        Self::Http(err)
    }

    /// Признак того, что после ошибки нужно сбросить локальную сессию.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn unauthorized_status_means_expired_session() {
        let err = CmsClientError::from_http_status(StatusCode::UNAUTHORIZED, None);
        assert!(err.is_session_expired());
    }

    #[test]
    fn server_message_is_kept_verbatim() {
        let err = CmsClientError::from_http_status(
            StatusCode::BAD_REQUEST,
            Some("Slug already exists".to_string()),
        );
        match err {
            CmsClientError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Slug already exists");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_message_gets_fallback() {
        let err = CmsClientError::from_http_status(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(
            err.to_string(),
            "server error 500: http status 500 Internal Server Error"
        );
    }

    #[test]
    fn login_statuses_have_dedicated_meaning() {
        let bad_password = CmsClientError::from_login_status(StatusCode::UNAUTHORIZED, None);
        assert!(matches!(bad_password, CmsClientError::Api { status: 401, .. }));

        let locked = CmsClientError::from_login_status(StatusCode::FORBIDDEN, None);
        assert_eq!(locked.to_string(), "forbidden: account is locked");

        let throttled = CmsClientError::from_login_status(StatusCode::TOO_MANY_REQUESTS, None);
        assert!(matches!(throttled, CmsClientError::RateLimited));
    }
}
