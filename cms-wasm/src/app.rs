use std::time::Duration;

use cms_core::InactivityClock;
use cms_core::inactivity::DEFAULT_INACTIVITY_LIMIT;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::components::login_panel::LoginPanel;
use crate::components::media_panel::MediaPanel;
use crate::components::post_editor::PostEditorPanel;
use crate::components::posts_panel::PostsPanel;
use crate::state::{AppState, Tab};
use crate::storage;

const INACTIVITY_CHECK_PERIOD: Duration = Duration::from_secs(30);

pub(crate) fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

/// Категории и теги нужны редактору и фильтрам.
pub(crate) fn load_reference_data(state: AppState) {
    let Some(token) = state.token() else {
        return;
    };

    spawn_local(async move {
        match api::list_categories(&token).await {
            Ok(categories) => {
                state.categories.set(categories);
                let tree = state.category_tree();
                state.editor.update(|editor| editor.refresh_categories(tree));
            }
            Err(err) => state.report(err),
        }
        match api::list_tags(&token).await {
            Ok(tags) => state.tags.set(tags),
            Err(err) => state.report(err),
        }
    });
}

/// Мышь и клавиатура продлевают сессию; по истечении лимита выход локальный.
fn install_inactivity_logout(state: AppState) {
    let clock = StoredValue::new(InactivityClock::new(DEFAULT_INACTIVITY_LIMIT, now_ms()));
    let touch = move || clock.update_value(|clock| clock.record_activity(now_ms()));

    let on_move = window_event_listener(ev::mousemove, move |_| touch());
    let on_key = window_event_listener(ev::keypress, move |_| touch());

    let check = set_interval_with_handle(
        move || {
            if !clock.with_value(|clock| clock.is_expired(now_ms())) {
                return;
            }
            if state.is_authenticated() {
                state.end_session("Вы вышли из-за неактивности");
            }
            clock.update_value(|clock| clock.record_activity(now_ms()));
        },
        INACTIVITY_CHECK_PERIOD,
    )
    .ok();

    on_cleanup(move || {
        on_move.remove();
        on_key.remove();
        if let Some(check) = check {
            check.clear();
        }
    });
}

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new();

    if let Some(session) = storage::load_session() {
        state.session.set(Some(session));
        load_reference_data(state.clone());
    }
    install_inactivity_logout(state.clone());

    let on_login = Callback::new({
        let state = state.clone();
        move |_| load_reference_data(state.clone())
    });

    let user_text = {
        let state = state.clone();
        move || state.username().unwrap_or_else(|| "anonymous".to_string())
    };

    let on_logout = {
        let state = state.clone();
        move |_| state.end_session("Выход выполнен")
    };

    let error_text = {
        let state = state.clone();
        move || state.error.get().unwrap_or_default()
    };
    let notice_text = {
        let state = state.clone();
        move || state.notice.get().unwrap_or_default()
    };

    let tab_button = {
        let state = state.clone();
        move |tab: Tab, label: &'static str| {
            let state = state.clone();
            view! {
                <button
                    class:active=move || state.tab.get() == tab
                    on:click=move |_| state.tab.set(tab)
                >
                    {label}
                </button>
            }
        }
    };

    let state_for_error = state.clone();
    let state_for_notice = state.clone();
    let state_for_auth = state.clone();
    let state_for_logout = state.clone();
    let state_for_tabs = state.clone();

    view! {
        <main class="page">
            <section class="container">
                <header class="topbar">
                    <h1>"CMS Admin"</h1>
                    <Show when=move || state_for_logout.is_authenticated()>
                        <span>"Пользователь: " {user_text.clone()}</span>
                        <button on:click=on_logout.clone()>"Выйти"</button>
                    </Show>
                </header>

                <Show when=move || !state_for_notice.notice.get().unwrap_or_default().is_empty()>
                    <div class="notice-banner">{notice_text.clone()}</div>
                </Show>

                <Show when=move || !state_for_error.error.get().unwrap_or_default().is_empty()>
                    <div class="error-banner">
                        <strong>"Ошибка: "</strong>
                        {error_text.clone()}
                    </div>
                </Show>

                <Show
                    when=move || state_for_auth.is_authenticated()
                    fallback={
                        let state = state.clone();
                        move || view! { <LoginPanel state=state.clone() on_login=on_login /> }
                    }
                >
                    <nav class="tabs">
                        {tab_button(Tab::Posts, "Посты")}
                        {tab_button(Tab::Editor, "Редактор")}
                        {tab_button(Tab::Media, "Медиатека")}
                    </nav>

                    {
                        let state = state_for_tabs.clone();
                        move || match state.tab.get() {
                            Tab::Posts => view! { <PostsPanel state=state.clone() /> }.into_any(),
                            Tab::Editor => view! { <PostEditorPanel state=state.clone() /> }.into_any(),
                            Tab::Media => view! { <MediaPanel state=state.clone() /> }.into_any(),
                        }
                    }
                </Show>
            </section>
        </main>
    }
}
