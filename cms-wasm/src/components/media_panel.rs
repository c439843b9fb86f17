use std::collections::HashMap;

use cms_core::media::DETAIL_SAVE_DELAY;
use cms_core::{DetailField, FeatureImage, MediaAsset, MediaType};
use leptos::prelude::*;
use leptos::task::spawn_local;
use web_sys::HtmlInputElement;

use crate::api;
use crate::state::AppState;

/// Отложенные сохранения деталей: один таймер на пару (ассет, поле).
type PendingSaves = HashMap<(String, DetailField), TimeoutHandle>;

fn field_label(field: DetailField) -> &'static str {
    match field {
        DetailField::Title => "Заголовок",
        DetailField::AltText => "Alt-текст",
        DetailField::Caption => "Подпись",
        DetailField::Description => "Описание",
    }
}

fn load_media(state: AppState) {
    let Some(token) = state.token() else {
        return;
    };

    state.loading.set(true);
    spawn_local(async move {
        match api::list_media(&token).await {
            Ok(assets) => state.media.update(|library| library.replace(assets)),
            Err(err) => state.report(err),
        }
        state.loading.set(false);
    });
}

fn upload(state: AppState, file: web_sys::File) {
    let (Some(token), Some(author)) = (state.token(), state.username()) else {
        return;
    };

    state.loading.set(true);
    state.clear_error();
    spawn_local(async move {
        match api::upload_media(&token, &author, &file).await {
            Ok(asset) => {
                state.media.update(|library| library.insert_uploaded(asset));
                state.set_notice("Файл загружен");
            }
            Err(err) => state.report(err),
        }
        state.loading.set(false);
    });
}

fn save_detail(state: AppState, id: String, field: DetailField, value: String) {
    let Some(token) = state.token() else {
        return;
    };

    spawn_local(async move {
        // Ответ сервера не применяется: локальные правки могут быть новее.
        if let Err(err) = api::update_media_detail(&token, &id, field, &value).await {
            state.report(err);
        }
    });
}

fn delete(state: AppState, asset: MediaAsset, selected: RwSignal<Option<String>>) {
    let Some(token) = state.token() else {
        return;
    };

    spawn_local(async move {
        match api::delete_media(&token, &asset).await {
            Ok(()) => {
                state.media.update(|library| {
                    library.remove(&asset.id);
                });
                if selected.get_untracked().as_deref() == Some(asset.id.as_str()) {
                    selected.set(None);
                }
                state.set_notice("Файл удалён");
            }
            Err(err) => state.report(err),
        }
    });
}

#[component]
pub(crate) fn MediaPanel(state: AppState) -> impl IntoView {
    let media = state.media;
    let editor = state.editor;
    let selected = RwSignal::new(None::<String>);
    let pending = StoredValue::new(PendingSaves::new());

    if media.with_untracked(|library| library.assets().is_empty()) {
        load_media(state.clone());
    }

    let schedule_save = {
        let state = state.clone();
        move |id: String, field: DetailField, value: String| {
            let key = (id.clone(), field);
            pending.update_value(|timers| {
                if let Some(previous) = timers.remove(&key) {
                    previous.clear();
                }
            });

            let state = state.clone();
            let fired = key.clone();
            let handle = set_timeout_with_handle(
                move || {
                    pending.try_update_value(|timers| timers.remove(&fired));
                    save_detail(state, id, field, value);
                },
                DETAIL_SAVE_DELAY,
            )
            .ok();

            if let Some(handle) = handle {
                pending.update_value(|timers| {
                    timers.insert(key, handle);
                });
            }
        }
    };

    // Отложенные правки ассета уходят на сервер сразу.
    let flush = {
        let state = state.clone();
        move |id: &str| {
            let fields: Vec<DetailField> = pending
                .try_update_value(|timers| {
                    let keys: Vec<_> = timers.keys().filter(|(asset, _)| asset == id).cloned().collect();
                    keys.into_iter()
                        .filter_map(|key| {
                            let handle = timers.remove(&key)?;
                            handle.clear();
                            Some(key.1)
                        })
                        .collect()
                })
                .unwrap_or_default();

            for field in fields {
                let value = media.with_untracked(|library| {
                    library.find(id).map(|asset| asset.detail(field).to_string())
                });
                if let Some(value) = value {
                    save_detail(state.clone(), id.to_string(), field, value);
                }
            }
        }
    };

    let on_file = {
        let state = state.clone();
        move |ev: web_sys::Event| {
            let input = event_target::<HtmlInputElement>(&ev);
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            upload(state.clone(), file);
            input.set_value("");
        }
    };

    let state_for_refresh = state.clone();
    let state_for_detail = state.clone();
    let state_for_loading = state.clone();

    view! {
        <h2>"Медиатека"</h2>
        <div class="media-toolbar">
            <input type="file" on:change=on_file disabled=move || state_for_loading.loading.get() />
            <input
                placeholder="поиск по имени или заголовку"
                prop:value=move || media.with(|library| library.query().to_string())
                on:input=move |ev| media.update(|library| library.set_query(event_target_value(&ev)))
            />
            <button on:click=move |_| load_media(state_for_refresh.clone())>"Обновить"</button>
            <span class="muted">
                {move || media.with(|library| format!("Найдено: {}", library.total_matching()))}
            </span>
        </div>

        <div class="media-grid">
            <For
                each=move || media.with(|library| library.visible().into_iter().cloned().collect::<Vec<_>>())
                key=|asset| (asset.id.clone(), asset.title.clone())
                children=move |asset: MediaAsset| {
                    let id = asset.id.clone();
                    let active_id = asset.id.clone();
                    view! {
                        <div
                            class="media-tile"
                            class:active=move || selected.get().as_deref() == Some(active_id.as_str())
                            on:click=move |_| selected.set(Some(id.clone()))
                        >
                            {if asset.media_type == MediaType::Image {
                                view! { <img src=api::asset_url(&asset.url) alt=asset.alt_text.clone() /> }.into_any()
                            } else {
                                view! { <div class="file">{asset.media_type.to_string()}</div> }.into_any()
                            }}
                            <div>{asset.display_title().to_string()}</div>
                            <div class="muted">{asset.human_size()}</div>
                        </div>
                    }
                }
            />
        </div>

        <Show when=move || media.with(|library| library.has_more())>
            <button on:click=move |_| media.update(|library| library.load_more())>"Показать ещё"</button>
        </Show>

        {move || {
            let id = selected.get()?;
            let asset = media.with_untracked(|library| library.find(&id).cloned())?;
            let state = state_for_detail.clone();
            let schedule_save = schedule_save.clone();
            let flush = flush.clone();

            let fields = DetailField::ALL
                .iter()
                .map(|field| {
                    let field = *field;
                    let id = id.clone();
                    let read_id = id.clone();
                    let schedule_save = schedule_save.clone();
                    view! {
                        <label>{field_label(field)}</label>
                        <input
                            prop:value=move || {
                                media.with(|library| {
                                    library
                                        .find(&read_id)
                                        .map(|asset| asset.detail(field).to_string())
                                        .unwrap_or_default()
                                })
                            }
                            on:input=move |ev| {
                                let value = event_target_value(&ev);
                                media.update(|library| {
                                    if let Some(asset) = library.find_mut(&id) {
                                        asset.set_detail(field, value.clone());
                                    }
                                });
                                schedule_save(id.clone(), field, value);
                            }
                        />
                    }
                })
                .collect_view();

            let for_feature = asset.id.clone();
            let for_delete = asset.clone();
            let state_delete = state.clone();

            Some(view! {
                <div class="media-detail">
                    <h3>{asset.name.clone()}</h3>
                    <div class="muted">
                        {format!(
                            "{} · {} · загрузил {} · используется {}",
                            asset.format,
                            asset.human_size(),
                            asset.uploaded_by,
                            asset.usage_count,
                        )}
                    </div>
                    {fields}
                    <button on:click=move |_| {
                        flush(&for_feature);
                        let image = media.with_untracked(|library| {
                            library.find(&for_feature).map(FeatureImage::from)
                        });
                        if let Some(image) = image {
                            editor.update(|e| e.set_feature_image(Some(image)));
                            state.set_notice("Изображение выбрано для поста");
                        }
                    }>"Сделать изображением поста"</button>
                    <button class="danger" on:click=move |_| {
                        delete(state_delete.clone(), for_delete.clone(), selected)
                    }>"Удалить"</button>
                </div>
            })
        }}
    }
}
