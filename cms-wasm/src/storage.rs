use web_sys::Storage;

use crate::models::{Session, parse_session};

const SESSION_KEY: &str = "cms_session";

fn local_storage() -> Result<Storage, String> {
    let window = web_sys::window().ok_or_else(|| "window is not available".to_string())?;
    window
        .local_storage()
        .map_err(|_| "failed to access localStorage".to_string())?
        .ok_or_else(|| "localStorage is not available".to_string())
}

pub(crate) fn load_session() -> Option<Session> {
    let raw = local_storage().ok()?.get_item(SESSION_KEY).ok()??;
    parse_session(&raw)
}

pub(crate) fn save_session(session: &Session) -> Result<(), String> {
    let raw =
        serde_json::to_string(session).map_err(|_| "failed to serialize session".to_string())?;
    local_storage()?
        .set_item(SESSION_KEY, &raw)
        .map_err(|_| "failed to save session".to_string())
}

pub(crate) fn clear_session() -> Result<(), String> {
    local_storage()?
        .remove_item(SESSION_KEY)
        .map_err(|_| "failed to clear session".to_string())
}
