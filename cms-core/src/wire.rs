//! Нормализация «плавающих» форм полей, которые отдаёт бэкенд.

use serde::{Deserialize, Deserializer};

pub(crate) fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn nullable_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn nullable_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ссылка на сущность: либо голый id, либо populated-объект с `_id`.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRef {
    Id(String),
    Object {
        #[serde(rename = "_id", alias = "id")]
        id: String,
    },
}

impl IdRef {
    fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Object { id } => id,
        }
    }
}

pub(crate) fn optional_id_ref<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<IdRef>::deserialize(deserializer)?
        .map(IdRef::into_id)
        .filter(|id| !id.trim().is_empty()))
}

pub(crate) fn id_ref_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<IdRef>>::deserialize(deserializer)?
        .unwrap_or_default()
        .into_iter()
        .map(IdRef::into_id)
        .collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
    List(Vec<String>),
    Joined(String),
}

/// Список строк, пришедший массивом или строкой через запятую.
pub(crate) fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<StringList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(StringList::List(items)) => items,
        Some(StringList::Joined(raw)) => raw.split(',').map(str::to_string).collect(),
    };

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}
