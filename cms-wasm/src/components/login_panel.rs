use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::models::Session;
use crate::state::AppState;
use crate::storage;

#[component]
pub(crate) fn LoginPanel(state: AppState, on_login: Callback<()>) -> impl IntoView {
    let username = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());

    let on_submit = {
        let state = state.clone();
        move |ev: SubmitEvent| {
            ev.prevent_default();
            state.clear_error();

            let login = username.get().trim().to_string();
            let secret = password.get();
            if login.is_empty() || secret.trim().is_empty() {
                state.set_error("Введите логин и пароль");
                return;
            }

            state.loading.set(true);
            let state2 = state.clone();
            spawn_local(async move {
                match api::login(&login, &secret).await {
                    Ok(token) => match Session::new(&token, &login) {
                        Some(session) => {
                            if let Err(err) = storage::save_session(&session) {
                                state2.set_error(err);
                            }
                            state2.session.set(Some(session));
                            state2.notice.set(None);
                            password.set(String::new());
                            on_login.run(());
                        }
                        None => state2.set_error("Сервер вернул пустой токен"),
                    },
                    Err(api::ApiError::Http { status: 401, .. }) => {
                        state2.set_error("Неверный логин или пароль");
                    }
                    Err(api::ApiError::Http { status: 403, .. }) => {
                        state2.set_error("Учётная запись заблокирована");
                    }
                    Err(err) => state2.set_error(err.to_string()),
                }
                state2.loading.set(false);
            });
        }
    };

    view! {
        <h2>"Вход"</h2>
        <form on:submit=on_submit>
            <input
                placeholder="username"
                prop:value=move || username.get()
                on:input=move |ev| username.set(event_target_value(&ev))
            />
            <input
                placeholder="password"
                type="password"
                prop:value=move || password.get()
                on:input=move |ev| password.set(event_target_value(&ev))
            />
            <button type="submit" disabled=move || state.loading.get()>"Войти"</button>
        </form>
    }
}
