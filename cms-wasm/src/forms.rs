use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use cms_core::{PostAction, SlugParts};
use cms_core::post::MetaCounter;

const LOCAL_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub fn http_fallback(status: u16) -> String {
    match status {
        400 => "Некорректный запрос".to_string(),
        401 => "Сессия истекла, войдите снова".to_string(),
        403 => "Недостаточно прав для этой операции".to_string(),
        404 => "Ресурс не найден".to_string(),
        409 => "Конфликт данных".to_string(),
        429 => "Слишком много попыток, повторите позже".to_string(),
        500..=599 => "Ошибка сервера".to_string(),
        _ => format!("HTTP ошибка {status}"),
    }
}

/// Значение `<input type="datetime-local">` в UTC.
///
/// `offset_minutes` как у `Date.getTimezoneOffset()`: UTC минус локальное.
pub fn parse_local_datetime(raw: &str, offset_minutes: i32) -> Option<DateTime<Utc>> {
    let local = NaiveDateTime::parse_from_str(raw.trim(), LOCAL_INPUT_FORMAT).ok()?;
    let utc = local + Duration::minutes(i64::from(offset_minutes));
    Some(utc.and_utc())
}

pub fn to_local_input(at: DateTime<Utc>, offset_minutes: i32) -> String {
    let local = at.naive_utc() - Duration::minutes(i64::from(offset_minutes));
    local.format(LOCAL_INPUT_FORMAT).to_string()
}

pub fn millis_to_utc(ms: f64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms as i64)
}

pub fn counter_label(counter: MetaCounter) -> String {
    format!("{}/{}", counter.used, counter.max)
}

pub fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Действие по подписи кнопки редактора.
///
/// Для планирования нужно время из поля ввода.
pub fn action_for_label(
    label: &str,
    schedule_at: Option<DateTime<Utc>>,
) -> Result<PostAction, &'static str> {
    match label {
        "Save Draft" => Ok(PostAction::SaveDraft),
        "Publish" | "Publish Now" | "Update & Re-publish" => Ok(PostAction::Publish),
        "Schedule" | "Edit Schedule" => schedule_at
            .map(PostAction::Schedule)
            .ok_or("Укажите дату и время публикации"),
        _ => Err("Неизвестное действие"),
    }
}

/// Неизменяемый хвост slug рядом с полем основы; дефис уже входит в суффикс.
pub fn slug_suffix_label(parts: &SlugParts) -> Option<String> {
    parts.has_suffix().then(|| parts.suffix().to_string())
}

pub fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn local_datetime_is_shifted_to_utc() {
        // Москва: getTimezoneOffset() == -180.
        let at = parse_local_datetime("2030-05-01T12:30", -180).expect("valid input");
        assert_eq!(at, Utc.with_ymd_and_hms(2030, 5, 1, 9, 30, 0).unwrap());
        assert_eq!(to_local_input(at, -180), "2030-05-01T12:30");
    }

    #[test]
    fn broken_datetime_is_rejected() {
        assert!(parse_local_datetime("", 0).is_none());
        assert!(parse_local_datetime("2030-13-01T00:00", 0).is_none());
    }

    #[test]
    fn counter_label_shows_used_and_limit() {
        assert_eq!(counter_label(MetaCounter::title("Привет")), "6/60");
    }

    #[test]
    fn fallback_messages_cover_common_statuses() {
        assert_eq!(http_fallback(404), "Ресурс не найден");
        assert_eq!(http_fallback(503), "Ошибка сервера");
        assert_eq!(http_fallback(418), "HTTP ошибка 418");
    }

    #[test]
    fn every_editor_label_maps_to_an_action() {
        use cms_core::PostStatus;
        use cms_core::post::action_labels;

        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        for status in [
            PostStatus::Draft,
            PostStatus::Published,
            PostStatus::Scheduled,
            PostStatus::Trash,
        ] {
            for label in action_labels(status) {
                assert!(action_for_label(label, Some(at)).is_ok(), "{label}");
            }
        }
        assert_eq!(
            action_for_label("Edit Schedule", Some(at)),
            Ok(PostAction::Schedule(at))
        );
        assert!(action_for_label("Schedule", None).is_err());
    }

    #[test]
    fn slug_suffix_is_shown_with_single_dash() {
        let parts = SlugParts::split("breaking-news-a1b2c3");
        assert_eq!(slug_suffix_label(&parts).as_deref(), Some("-a1b2c3"));
        assert_eq!(slug_suffix_label(&SlugParts::split("plain")), None);
    }

    #[test]
    fn blank_values_are_dropped() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(" a ").as_deref(), Some("a"));
    }

    #[test]
    fn missing_timestamp_is_dash() {
        assert_eq!(format_timestamp(None), "-");
        assert_eq!(
            format_timestamp(millis_to_utc(0.0)),
            "1970-01-01 00:00"
        );
    }
}
