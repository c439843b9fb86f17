//! Медиатека: модель ассета, проверка загрузок, редактируемые поля
//! деталей и клиентский реестр с поиском и постраничным показом.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::wire;

/// Пауза после последней правки поля деталей перед его сохранением.
pub const DETAIL_SAVE_DELAY: Duration = Duration::from_secs(1);

/// MIME-типы, которые разрешено загружать.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/x-msvideo",
    "video/quicktime",
    "video/x-ms-wmv",
    "video/x-flv",
    "video/x-matroska",
    "audio/mpeg",
    "audio/wav",
    "audio/aac",
    "audio/ogg",
    "audio/flac",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "text/plain",
];

/// Проверяет MIME-тип файла до отправки на сервер.
pub fn validate_upload(mime: &str) -> Result<MediaType, DomainError> {
    let mime = mime.trim().to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(DomainError::UnsupportedMediaType(mime));
    }
    Ok(media_type_for_mime(&mime))
}

/// Группа ассета по MIME-типу.
pub fn media_type_for_mime(mime: &str) -> MediaType {
    match mime.split('/').next().unwrap_or_default() {
        "image" => MediaType::Image,
        "video" => MediaType::Video,
        "audio" => MediaType::Audio,
        _ => MediaType::Document,
    }
}

/// MIME-тип по расширению файла; `None` для незнакомых расширений.
pub fn mime_from_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "mkv" => "video/x-matroska",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "txt" => "text/plain",
        "svg" => "image/svg+xml",
        "exe" => "application/octet-stream",
        _ => return None,
    };
    Some(mime)
}

/// Размер файла для людей: байты, KB или MB с двумя знаками.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        format!("{bytes} Bytes")
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Тип ассета.
pub enum MediaType {
    /// Изображение.
    Image,
    /// Видео.
    Video,
    /// Аудио.
    Audio,
    /// Документ и всё неизвестное.
    #[default]
    #[serde(other)]
    Document,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Загруженный файл медиатеки.
pub struct MediaAsset {
    /// Идентификатор.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Адрес файла на сервере (`/uploads/...`).
    pub url: String,
    /// Имя файла.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub name: String,
    /// Тип.
    #[serde(rename = "type", default)]
    pub media_type: MediaType,
    /// Формат (расширение).
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub format: String,
    /// Размер в байтах.
    #[serde(default, deserialize_with = "wire::nullable_u64")]
    pub size: u64,
    /// Размеры изображения, если известны.
    #[serde(default)]
    pub dimensions: Option<String>,
    /// Кто загрузил.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub uploaded_by: String,
    /// Сколько раз используется; ведёт сервер.
    #[serde(default, deserialize_with = "wire::nullable_u64", skip_serializing)]
    pub usage_count: u64,
    /// Заголовок.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub title: String,
    /// Alt-текст.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub alt_text: String,
    /// Подпись.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub caption: String,
    /// Описание.
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub description: String,
    /// Когда загружен.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl MediaAsset {
    /// Заголовок, а если он пуст, то имя файла.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.name
        } else {
            &self.title
        }
    }

    /// Хвост пути для `DELETE /api/images/...`.
    pub fn delete_path(&self) -> &str {
        let url = self.url.trim_start_matches('/');
        url.strip_prefix("uploads/").unwrap_or(url)
    }

    /// Размер для людей.
    pub fn human_size(&self) -> String {
        format_file_size(self.size)
    }

    /// Значение редактируемого поля.
    pub fn detail(&self, field: DetailField) -> &str {
        match field {
            DetailField::Title => &self.title,
            DetailField::AltText => &self.alt_text,
            DetailField::Caption => &self.caption,
            DetailField::Description => &self.description,
        }
    }

    /// Локально применяет правку поля.
    pub fn set_detail(&mut self, field: DetailField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DetailField::Title => self.title = value,
            DetailField::AltText => self.alt_text = value,
            DetailField::Caption => self.caption = value,
            DetailField::Description => self.description = value,
        }
    }

    /// Детали ассета в одном значении.
    pub fn details(&self) -> MediaDetails {
        MediaDetails {
            title: self.title.clone(),
            alt_text: self.alt_text.clone(),
            caption: self.caption.clone(),
            description: self.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Поле деталей ассета, которое сохраняется отдельно.
pub enum DetailField {
    /// Заголовок.
    Title,
    /// Alt-текст.
    AltText,
    /// Подпись.
    Caption,
    /// Описание.
    Description,
}

impl DetailField {
    /// Все поля в порядке формы.
    pub const ALL: [DetailField; 4] = [
        DetailField::Title,
        DetailField::AltText,
        DetailField::Caption,
        DetailField::Description,
    ];

    /// Имя поля в теле `PUT /api/images/:id`.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::AltText => "altText",
            Self::Caption => "caption",
            Self::Description => "description",
        }
    }

    /// Разбор имени из CLI или формы.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "alttext" | "alt-text" | "alt_text" | "alt" => Some(Self::AltText),
            "caption" => Some(Self::Caption),
            "description" => Some(Self::Description),
            _ => None,
        }
    }
}

impl fmt::Display for DetailField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Редактируемые детали ассета.
pub struct MediaDetails {
    /// Заголовок.
    #[serde(default)]
    pub title: String,
    /// Alt-текст.
    #[serde(default)]
    pub alt_text: String,
    /// Подпись.
    #[serde(default)]
    pub caption: String,
    /// Описание.
    #[serde(default)]
    pub description: String,
}

/// Реестр медиатеки на клиенте: полный список, поиск и постраничный показ.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaLibrary {
    assets: Vec<MediaAsset>,
    query: String,
    visible: usize,
}

impl Default for MediaLibrary {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MediaLibrary {
    /// Сколько ассетов показывается сразу и добавляется по «ещё».
    pub const PAGE_SIZE: usize = 100;

    /// Реестр по свежему списку с сервера.
    pub fn new(assets: Vec<MediaAsset>) -> Self {
        Self {
            assets,
            query: String::new(),
            visible: Self::PAGE_SIZE,
        }
    }

    /// Подменяет список после повторной загрузки; страница сбрасывается.
    pub fn replace(&mut self, assets: Vec<MediaAsset>) {
        self.assets = assets;
        self.visible = Self::PAGE_SIZE;
    }

    /// Все ассеты.
    pub fn assets(&self) -> &[MediaAsset] {
        &self.assets
    }

    /// Текущая строка поиска.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Меняет строку поиска и сбрасывает страницу.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.visible = Self::PAGE_SIZE;
    }

    /// Ассеты, подходящие под поиск (имя или заголовок, без учёта регистра).
    pub fn matching(&self) -> Vec<&MediaAsset> {
        let needle = self.query.trim().to_lowercase();
        self.assets
            .iter()
            .filter(|asset| {
                needle.is_empty()
                    || asset.name.to_lowercase().contains(&needle)
                    || asset.title.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Видимая страница результатов поиска.
    pub fn visible(&self) -> Vec<&MediaAsset> {
        let mut matching = self.matching();
        matching.truncate(self.visible);
        matching
    }

    /// Сколько всего ассетов подходит под поиск.
    pub fn total_matching(&self) -> usize {
        self.matching().len()
    }

    /// Есть ли что показать по «ещё».
    pub fn has_more(&self) -> bool {
        self.total_matching() > self.visible
    }

    /// Показывает следующую порцию.
    pub fn load_more(&mut self) {
        self.visible += Self::PAGE_SIZE;
    }

    /// Новый загруженный ассет встаёт в начало списка.
    pub fn insert_uploaded(&mut self, asset: MediaAsset) {
        self.assets.retain(|existing| existing.id != asset.id);
        self.assets.insert(0, asset);
    }

    /// Заменяет ассет по id, а если его нет, добавляет в начало.
    pub fn upsert(&mut self, asset: MediaAsset) {
        match self.assets.iter_mut().find(|existing| existing.id == asset.id) {
            Some(existing) => *existing = asset,
            None => self.assets.insert(0, asset),
        }
    }

    /// Убирает ассет после удаления на сервере.
    pub fn remove(&mut self, id: &str) -> Option<MediaAsset> {
        let index = self.assets.iter().position(|asset| asset.id == id)?;
        Some(self.assets.remove(index))
    }

    /// Ищет ассет по id.
    pub fn find(&self, id: &str) -> Option<&MediaAsset> {
        self.assets.iter().find(|asset| asset.id == id)
    }

    /// Изменяемая ссылка на ассет по id.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut MediaAsset> {
        self.assets.iter_mut().find(|asset| asset.id == id)
    }
}
