use cms_core::{LiveUpdate, MediaAsset, Post, PostStatus, Tag};
use serde::{Deserialize, Serialize};

/// Сессия браузера: токен и имя, под которым пользователь вошёл.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
}

impl Session {
    pub fn new(token: &str, username: &str) -> Option<Self> {
        let token = token.trim();
        let username = username.trim();
        if token.is_empty() || username.is_empty() {
            return None;
        }
        Some(Self {
            token: token.to_string(),
            username: username.to_string(),
        })
    }
}

pub fn parse_session(raw: &str) -> Option<Session> {
    let session = serde_json::from_str::<Session>(raw).ok()?;
    Session::new(&session.token, &session.username)
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagCreated {
    pub tag: Tag,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Authors {
    #[serde(default)]
    pub authors: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Images {
    #[serde(default)]
    pub images: Vec<MediaAsset>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploaded {
    pub image_details: MediaAsset,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ImageUpdated {
    #[serde(rename_all = "camelCase")]
    Envelope { image_details: MediaAsset },
    Bare(MediaAsset),
}

impl From<ImageUpdated> for MediaAsset {
    fn from(value: ImageUpdated) -> Self {
        match value {
            ImageUpdated::Envelope { image_details } | ImageUpdated::Bare(image_details) => {
                image_details
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PostSaved {
    Envelope { post: Post },
    Bare(Post),
}

impl From<PostSaved> for Post {
    fn from(value: PostSaved) -> Self {
        match value {
            PostSaved::Envelope { post } | PostSaved::Bare(post) => post,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveUpdateChanged {
    pub live_update: LiveUpdate,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusPatch {
    pub status: PostStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_requires_token_and_username() {
        assert!(Session::new(" ", "alice").is_none());
        assert!(Session::new("abc", "").is_none());
        let session = Session::new(" abc ", " alice ").expect("valid session");
        assert_eq!(session.token, "abc");
        assert_eq!(session.username, "alice");
    }

    #[test]
    fn parse_session_rejects_broken_storage() {
        assert!(parse_session("{not-json}").is_none());
        assert!(parse_session(r#"{"token":"","username":"alice"}"#).is_none());

        let session = parse_session(r#"{"token":"t","username":"alice"}"#).expect("session");
        assert_eq!(session.username, "alice");
    }

    #[test]
    fn error_body_falls_back_to_error_field() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"Invalid token"}"#).expect("json");
        assert_eq!(body.into_message().as_deref(), Some("Invalid token"));
    }

    #[test]
    fn saved_post_accepts_envelope_and_bare_shapes() {
        let saved: PostSaved =
            serde_json::from_str(r#"{"message":"ok","post":{"_id":"p1"}}"#).expect("envelope");
        assert_eq!(Post::from(saved).id, "p1");

        let saved: PostSaved = serde_json::from_str(r#"{"_id":"p2"}"#).expect("bare");
        assert_eq!(Post::from(saved).id, "p2");
    }

    #[test]
    fn updated_image_accepts_envelope_and_bare_shapes() {
        let updated: ImageUpdated =
            serde_json::from_str(r#"{"imageDetails":{"_id":"1","url":"/uploads/a.png"}}"#)
                .expect("envelope");
        assert_eq!(MediaAsset::from(updated).id, "1");

        let updated: ImageUpdated =
            serde_json::from_str(r#"{"_id":"2","url":"/uploads/b.png","altText":"B"}"#)
                .expect("bare");
        assert_eq!(MediaAsset::from(updated).alt_text, "B");
    }
}
