//! Контракты запросов и ответов REST API.
//!
//! Каждая форма ответа описана отдельным типом; там, где бэкенд отдаёт
//! объект в конверте, конверт тоже отдельный тип.

use cms_core::{LiveUpdate, MediaAsset, Post, PostStatus, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponseDto {
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

impl ErrorResponseDto {
    pub(crate) fn into_message(self) -> Option<String> {
        self.message
            .or(self.error)
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequestDto<'a> {
    pub(crate) username: &'a str,
    pub(crate) password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponseDto {
    pub(crate) token: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessageResponseDto {
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TagCreatedDto {
    pub(crate) tag: Tag,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthorsDto {
    #[serde(default)]
    pub(crate) authors: Vec<String>,
}

/// `POST /api/posts` и `/publish` отдают пост в конверте, `PUT` может
/// отдать и голый пост.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PostSaveResponseDto {
    Envelope { post: Post },
    Bare(Post),
}

impl From<PostSaveResponseDto> for Post {
    fn from(value: PostSaveResponseDto) -> Self {
        match value {
            PostSaveResponseDto::Envelope { post } | PostSaveResponseDto::Bare(post) => post,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImagesDto {
    #[serde(default)]
    pub(crate) images: Vec<MediaAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ImageUploadedDto {
    pub(crate) image_details: MediaAsset,
}

/// Ответ `PUT /api/images/:id`: конверт `{imageDetails}` либо сам ассет.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ImageUpdateResponseDto {
    #[serde(rename_all = "camelCase")]
    Envelope { image_details: MediaAsset },
    Bare(MediaAsset),
}

impl From<ImageUpdateResponseDto> for MediaAsset {
    fn from(value: ImageUpdateResponseDto) -> Self {
        match value {
            ImageUpdateResponseDto::Envelope { image_details }
            | ImageUpdateResponseDto::Bare(image_details) => image_details,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LiveUpdateChangedDto {
    pub(crate) live_update: LiveUpdate,
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusPatchDto {
    pub(crate) status: PostStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_prefers_message_over_error() {
        let dto: ErrorResponseDto =
            serde_json::from_str(r#"{"message":"Tag exists","error":"dup"}"#).expect("json");
        assert_eq!(dto.into_message().as_deref(), Some("Tag exists"));

        let dto: ErrorResponseDto = serde_json::from_str(r#"{"error":"boom"}"#).expect("json");
        assert_eq!(dto.into_message().as_deref(), Some("boom"));

        let dto: ErrorResponseDto = serde_json::from_str(r#"{"message":"  "}"#).expect("json");
        assert_eq!(dto.into_message(), None);
    }

    #[test]
    fn image_update_accepts_both_shapes() {
        let enveloped: ImageUpdateResponseDto = serde_json::from_str(
            r#"{"message":"ok","imageDetails":{"_id":"1","url":"/uploads/a.png","title":"A"}}"#,
        )
        .expect("envelope");
        assert_eq!(MediaAsset::from(enveloped).title, "A");

        let bare: ImageUpdateResponseDto =
            serde_json::from_str(r#"{"_id":"2","url":"/uploads/b.png","caption":"B"}"#)
                .expect("bare");
        let asset = MediaAsset::from(bare);
        assert_eq!(asset.id, "2");
        assert_eq!(asset.caption, "B");
    }

    #[test]
    fn post_save_accepts_both_shapes() {
        let enveloped: PostSaveResponseDto =
            serde_json::from_str(r#"{"post":{"_id":"p1","slug":"a-1b"}}"#).expect("envelope");
        assert_eq!(Post::from(enveloped).id, "p1");

        let bare: PostSaveResponseDto =
            serde_json::from_str(r#"{"_id":"p2","status":"scheduled"}"#).expect("bare");
        assert_eq!(Post::from(bare).status, PostStatus::Scheduled);
    }
}
