//! Пользователи админки и их роли.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::error::DomainError;
use crate::wire;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
/// Роль пользователя.
pub enum Role {
    /// Администратор.
    Admin,
    /// Редактор.
    Editor,
    /// Подписчик.
    #[default]
    Subscriber,
}

impl Role {
    /// Имя роли на проводе.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Subscriber => "subscriber",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "subscriber" => Ok(Self::Subscriber),
            _ => Err(DomainError::Validation {
                field: "role",
                message: "expected admin, editor or subscriber",
            }),
        }
    }
}

// Бэкенд хранит роль в произвольном регистре.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Пользователь из `all-users`.
pub struct User {
    /// Идентификатор.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Логин.
    pub username: String,
    /// Email.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub email: String,
    /// Имя.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub first_name: String,
    /// Фамилия.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub last_name: String,
    /// Роль.
    #[serde(default)]
    pub role: Role,
    /// Язык интерфейса.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub language: String,
}

impl User {
    /// Имя и фамилия, либо логин.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Счётчики для вкладок «Все / Администраторы / Редакторы / Подписчики».
pub struct RoleCounts {
    /// Всего.
    pub all: usize,
    /// Администраторов.
    pub admin: usize,
    /// Редакторов.
    pub editor: usize,
    /// Подписчиков.
    pub subscriber: usize,
}

impl RoleCounts {
    /// Пересчитывает роли по списку пользователей.
    pub fn count(users: &[User]) -> Self {
        users.iter().fold(Self::default(), |mut acc, user| {
            acc.all += 1;
            match user.role {
                Role::Admin => acc.admin += 1,
                Role::Editor => acc.editor += 1,
                Role::Subscriber => acc.subscriber += 1,
            }
            acc
        })
    }
}

/// Пользователи с указанной ролью; `None` означает всех.
pub fn filter_by_role(users: &[User], role: Option<Role>) -> Vec<&User> {
    users
        .iter()
        .filter(|user| role.is_none_or(|role| user.role == role))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Тело `POST /api/users/add-user`.
pub struct NewUser {
    /// Логин.
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    /// Email.
    #[validate(email)]
    pub email: String,
    /// Пароль.
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Имя.
    pub first_name: String,
    /// Фамилия.
    pub last_name: String,
    /// Роль.
    pub role: Role,
    /// Язык.
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Тело `PUT /api/users/edit/:id`.
pub struct UserPatch {
    /// Логин.
    pub username: String,
    /// Email.
    pub email: String,
    /// Имя.
    pub first_name: String,
    /// Фамилия.
    pub last_name: String,
    /// Роль.
    pub role: Role,
    /// Язык.
    pub language: String,
    /// Новый пароль; пустой не отправляется.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserPatch {
    /// Правка на основе текущих данных пользователя.
    pub fn from_user(user: &User, password: Option<&str>) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
            language: user.language.clone(),
            password: password
                .map(str::trim)
                .filter(|password| !password.is_empty())
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "_id": "u1",
            "username": "alice",
            "role": role,
        }))
        .expect("valid user")
    }

    #[test]
    fn role_is_case_insensitive() {
        assert_eq!(user("Admin").role, Role::Admin);
        assert_eq!(user("EDITOR").role, Role::Editor);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn counts_by_role() {
        let users = vec![user("admin"), user("editor"), user("Editor"), user("subscriber")];
        let counts = RoleCounts::count(&users);
        assert_eq!(
            counts,
            RoleCounts {
                all: 4,
                admin: 1,
                editor: 2,
                subscriber: 1,
            }
        );
        assert_eq!(filter_by_role(&users, Some(Role::Editor)).len(), 2);
        assert_eq!(filter_by_role(&users, None).len(), 4);
    }

    #[test]
    fn blank_password_is_not_sent() {
        let patch = UserPatch::from_user(&user("admin"), Some("   "));
        let json = serde_json::to_value(&patch).expect("serializable");
        assert!(json.get("password").is_none());

        let patch = UserPatch::from_user(&user("admin"), Some("new-secret"));
        assert_eq!(patch.password.as_deref(), Some("new-secret"));
    }

    #[test]
    fn new_user_validation() {
        let mut new_user = NewUser {
            username: "bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "long-enough".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            role: Role::Editor,
            language: "en".to_string(),
        };
        assert!(new_user.validate().is_ok());

        new_user.email = "not-an-email".to_string();
        assert!(new_user.validate().is_err());
    }

    #[test]
    fn display_name_falls_back_to_username() {
        assert_eq!(user("admin").display_name(), "alice");
    }
}
