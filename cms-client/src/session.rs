//! Сессия пользователя: единственная точка, где токен разбирается на claims.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use cms_core::Role;
use jsonwebtoken::dangerous::insecure_decode;
use serde::Deserialize;
use tracing::info;

use crate::error::{CmsClientError, CmsClientResult};

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    exp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Активная сессия: токен и прочитанные из него поля для отображения.
///
/// Подпись токена не проверяется: это делает сервер. Клиент только
/// читает claims и отбрасывает токены с истёкшим `exp`.
pub struct Session {
    token: String,
    username: Option<String>,
    role: Option<Role>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Разбирает токен, полученный при входе или прочитанный из хранилища.
    pub fn from_token(token: &str) -> CmsClientResult<Self> {
        Self::from_token_at(token, Utc::now())
    }

    /// То же, что [`Session::from_token`], с явным текущим временем.
    pub fn from_token_at(token: &str, now: DateTime<Utc>) -> CmsClientResult<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CmsClientError::InvalidToken("token is empty".to_string()));
        }

        let data = insecure_decode::<Claims>(token)
            .map_err(|e| CmsClientError::InvalidToken(e.to_string()))?;
        let claims = data.claims;

        let expires_at = claims
            .exp
            .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0));
        if expires_at.is_some_and(|exp| exp <= now) {
            return Err(CmsClientError::SessionExpired);
        }

        Ok(Self {
            token: token.to_string(),
            username: claims.username.filter(|name| !name.trim().is_empty()),
            role: claims.role.and_then(|role| role.parse().ok()),
            expires_at,
        })
    }

    /// Сырой токен для заголовка `Authorization`.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Имя пользователя из токена.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Роль из токена.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Когда истекает токен, если в нём есть `exp`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Имя автора для постов, загрузок и live-обновлений.
    pub fn author_name(&self) -> &str {
        self.username.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Default)]
/// Общая ячейка сессии для клиента, автосохранения и таймера неактивности.
pub struct SessionStore {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    /// Пустое хранилище.
    pub fn new() -> Self {
        Self::default()
    }

    /// Копия текущей сессии.
    pub fn get(&self) -> Option<Session> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Токен текущей сессии.
    pub fn token(&self) -> Option<String> {
        self.get().map(|session| session.token)
    }

    /// Есть ли активная сессия.
    pub fn is_active(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Заменяет сессию.
    pub fn set(&self, session: Session) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Сбрасывает сессию; возвращает `true`, если она была.
    pub fn clear(&self) -> bool {
        let previous = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = &previous {
            info!(username = session.author_name(), "session cleared");
        }
        previous.is_some()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        username: &'a str,
        role: &'a str,
        exp: i64,
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn token(exp: DateTime<Utc>) -> String {
        token_with(Algorithm::HS256, exp)
    }

    fn token_with(algorithm: Algorithm, exp: DateTime<Utc>) -> String {
        let claims = TestClaims {
            username: "alice",
            role: "Admin",
            exp: exp.timestamp(),
        };
        encode(
            &Header::new(algorithm),
            &claims,
            &EncodingKey::from_secret(b"server-side-secret"),
        )
        .expect("token must encode")
    }

    #[test]
    fn decodes_display_claims_without_secret() {
        let session =
            Session::from_token_at(&token(now() + Duration::hours(1)), now()).expect("valid");
        assert_eq!(session.username(), Some("alice"));
        assert_eq!(session.role(), Some(Role::Admin));
        assert!(session.expires_at().is_some());
    }

    #[test]
    fn any_hmac_algorithm_is_read_without_key() {
        let token = token_with(Algorithm::HS512, now() + Duration::hours(1));
        let session = Session::from_token_at(&token, now()).expect("valid");
        assert_eq!(session.username(), Some("alice"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let err = Session::from_token_at(&token(now() - Duration::seconds(1)), now())
            .expect_err("must be expired");
        assert!(err.is_session_expired());
    }

    #[test]
    fn garbage_token_is_invalid() {
        assert!(matches!(
            Session::from_token_at("not-a-jwt", now()),
            Err(CmsClientError::InvalidToken(_))
        ));
        assert!(matches!(
            Session::from_token_at("  ", now()),
            Err(CmsClientError::InvalidToken(_))
        ));
    }

    #[test]
    fn store_is_shared_between_clones() {
        let store = SessionStore::new();
        let other = store.clone();
        let session =
            Session::from_token_at(&token(now() + Duration::hours(1)), now()).expect("valid");

        store.set(session);
        assert!(other.is_active());
        assert!(other.clear());
        assert!(!store.is_active());
        assert!(!store.clear());
    }
}
