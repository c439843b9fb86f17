use cms_core::live_update::sort_for_display;
use cms_core::tag;
use cms_core::{
    DRAFT_AUTOSAVE_INTERVAL, LiveUpdate, LiveUpdateDraft, PostAction, PostEditor, PostStatus,
};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::components::category_selector::{CategoryChoices, CategorySelect};
use crate::forms::{
    action_for_label, counter_label, format_timestamp, millis_to_utc, non_blank,
    parse_local_datetime, slug_suffix_label, to_local_input,
};
use crate::state::{AppState, Tab};

const MAX_TAG_SUGGESTIONS: usize = 8;

fn timezone_offset() -> i32 {
    js_sys::Date::new_0().get_timezone_offset() as i32
}

fn saved_notice(action: &PostAction) -> &'static str {
    match action {
        PostAction::SaveDraft => "Черновик сохранён",
        PostAction::Publish => "Пост опубликован",
        PostAction::Schedule(_) => "Публикация запланирована",
        PostAction::Trash => "Пост перемещён в корзину",
    }
}

/// Сохраняет пост: сначала теги, затем сам пост.
///
/// При автосохранении индикатор загрузки не включается.
fn save(state: AppState, action: PostAction, auto: bool) {
    let (Some(token), Some(author)) = (state.token(), state.username()) else {
        return;
    };
    let Some(now) = millis_to_utc(js_sys::Date::now()) else {
        return;
    };

    if let Err(err) = state.editor.with_untracked(|editor| editor.check(&action, now)) {
        state.set_error(err.to_string());
        return;
    }

    let (target, names) = state
        .editor
        .with_untracked(|editor| (editor.save_target(&action), editor.tags().to_vec()));

    if !auto {
        state.loading.set(true);
        state.clear_error();
    }
    spawn_local(async move {
        let mut known = state.tags.get_untracked();
        let resolved = api::resolve_tags(&token, &mut known, &names).await;
        state.tags.set(known);
        let tag_ids = match resolved {
            Ok(ids) => ids,
            Err(err) => {
                state.report(err);
                if !auto {
                    state.loading.set(false);
                }
                return;
            }
        };

        let payload = state
            .editor
            .with_untracked(|editor| editor.payload(&action, tag_ids, &author));

        match api::save_post(&token, &target, &payload).await {
            Ok(saved) => {
                state.editor.update(|editor| editor.mark_saved(&saved));
                state.posts.update(|posts| {
                    match posts.iter_mut().find(|post| post.id == saved.id) {
                        Some(existing) => *existing = saved.clone(),
                        None => posts.insert(0, saved.clone()),
                    }
                });
                if auto {
                    state.set_notice("Черновик сохранён автоматически");
                } else {
                    state.set_notice(saved_notice(&action));
                }
            }
            Err(err) => state.report(err),
        }
        if !auto {
            state.loading.set(false);
        }
    });
}

fn install_autosave(state: AppState) {
    let handle = set_interval_with_handle(
        move || {
            if state.loading.get_untracked() {
                return;
            }
            let due = state.editor.with_untracked(|editor| {
                editor.should_autosave() && !editor.title().trim().is_empty()
            });
            if due {
                save(state.clone(), PostAction::SaveDraft, true);
            }
        },
        DRAFT_AUTOSAVE_INTERVAL,
    )
    .ok();

    on_cleanup(move || {
        if let Some(handle) = handle {
            handle.clear();
        }
    });
}

#[component]
pub(crate) fn PostEditorPanel(state: AppState) -> impl IntoView {
    let editor = state.editor;
    let tags = state.tags;
    let tag_input = RwSignal::new(String::new());
    let schedule = RwSignal::new(
        editor
            .with_untracked(PostEditor::scheduled_at)
            .map(|at| to_local_input(at, timezone_offset()))
            .unwrap_or_default(),
    );
    let saved_id = Memo::new(move |_| editor.with(|e| e.post_id().map(str::to_string)));

    install_autosave(state.clone());

    let on_action = Callback::new({
        let state = state.clone();
        move |label: &'static str| {
            let at = parse_local_datetime(&schedule.get_untracked(), timezone_offset());
            match action_for_label(label, at) {
                Ok(action) => save(state.clone(), action, false),
                Err(message) => state.set_error(message),
            }
        }
    });

    let on_trash = {
        let state = state.clone();
        move |_| save(state.clone(), PostAction::Trash, false)
    };

    let add_tags = move || {
        let input = tag_input.get_untracked();
        editor.update(|e| e.add_tags(&input));
        tag_input.set(String::new());
    };

    let suggestions = move || {
        let input = tag_input.get();
        tags.with(|tags| {
            tag::suggest(tags, &input)
                .into_iter()
                .take(MAX_TAG_SUGGESTIONS)
                .map(|tag| tag.name.clone())
                .collect::<Vec<_>>()
        })
    };

    let on_parent = Callback::new({
        let state = state.clone();
        move |id: Option<String>| {
            if let Some(Err(err)) = editor.try_update(|e| e.select_parent_category(id.as_deref())) {
                state.set_error(err.to_string());
            }
        }
    });
    let on_child = Callback::new({
        let state = state.clone();
        move |id: Option<String>| {
            if let Some(Err(err)) = editor.try_update(|e| e.select_child_category(id.as_deref())) {
                state.set_error(err.to_string());
            }
        }
    });

    let state_for_media = state.clone();
    let state_for_live = state.clone();
    let state_for_loading = state.clone();

    view! {
        <h2>
            {move || if saved_id.get().is_some() { "Редактирование поста" } else { "Новый пост" }}
        </h2>
        <div class="muted">
            "Статус: " {move || editor.with(|e| e.status().to_string())}
            {move || editor.with(|e| if e.is_dirty() { " (есть несохранённые правки)" } else { "" })}
        </div>

        <div class="editor">
            <label>"Заголовок"</label>
            <input
                prop:value=move || editor.with(|e| e.title().to_string())
                on:input=move |ev| editor.update(|e| e.set_title(event_target_value(&ev)))
            />

            <label>"Slug"</label>
            <div class="slug">
                <input
                    prop:value=move || editor.with(|e| e.slug().base().to_string())
                    on:input=move |ev| editor.update(|e| e.set_slug_base(&event_target_value(&ev)))
                />
                <span class="muted">
                    {move || editor.with(|e| slug_suffix_label(e.slug())).unwrap_or_default()}
                </span>
            </div>

            <label>"Краткое описание"</label>
            <textarea
                prop:value=move || editor.with(|e| e.summary().to_string())
                on:input=move |ev| editor.update(|e| e.set_summary(event_target_value(&ev)))
            ></textarea>

            <label>"Текст"</label>
            <textarea
                class="content"
                prop:value=move || editor.with(|e| e.content().to_string())
                on:input=move |ev| editor.update(|e| e.set_content(event_target_value(&ev)))
            ></textarea>

            <label>"Категория"</label>
            <CategorySelect
                choices=Signal::derive(move || editor.with(|e| CategoryChoices::of(e.selector())))
                on_parent=on_parent
                on_child=on_child
            />

            <label>"Теги"</label>
            <div class="tags">
                <For
                    each=move || editor.with(|e| e.tags().to_vec())
                    key=|name| name.clone()
                    children=move |name| {
                        let remove = name.clone();
                        view! {
                            <span class="tag">
                                {name}
                                <button on:click=move |_| editor.update(|e| e.remove_tag(&remove))>"×"</button>
                            </span>
                        }
                    }
                />
            </div>
            <input
                placeholder="теги через запятую"
                prop:value=move || tag_input.get()
                on:input=move |ev| tag_input.set(event_target_value(&ev))
                on:keydown=move |ev| {
                    if ev.key() == "Enter" {
                        ev.prevent_default();
                        add_tags();
                    }
                }
            />
            <button on:click=move |_| add_tags()>"Добавить"</button>
            <ul class="suggestions">
                <For
                    each=suggestions
                    key=|name| name.clone()
                    children=move |name| {
                        let pick = name.clone();
                        view! {
                            <li on:click=move |_| {
                                editor.update(|e| e.add_tags(&pick));
                                tag_input.set(String::new());
                            }>{name}</li>
                        }
                    }
                />
            </ul>

            <label>"Meta title"</label>
            <input
                prop:value=move || editor.with(|e| e.meta_title().0.to_string())
                on:input=move |ev| editor.update(|e| e.set_meta_title(event_target_value(&ev)))
            />
            <span class="counter" class:exceeded=move || editor.with(|e| e.meta_title().1.is_exceeded())>
                {move || editor.with(|e| counter_label(e.meta_title().1))}
            </span>

            <label>"Meta description"</label>
            <textarea
                prop:value=move || editor.with(|e| e.meta_description().0.to_string())
                on:input=move |ev| editor.update(|e| e.set_meta_description(event_target_value(&ev)))
            ></textarea>
            <span class="counter" class:exceeded=move || editor.with(|e| e.meta_description().1.is_exceeded())>
                {move || editor.with(|e| counter_label(e.meta_description().1))}
            </span>

            <label>"Ключевые слова"</label>
            <input
                placeholder="через запятую"
                prop:value=move || editor.with(|e| e.meta_keywords().join(", "))
                on:change=move |ev| editor.update(|e| e.set_meta_keywords(&event_target_value(&ev)))
            />

            <label>"Изображение"</label>
            {move || match editor.with(|e| e.feature_image().cloned()) {
                Some(image) => view! {
                    <div class="feature-image">
                        <img src=api::asset_url(&image.url) alt=image.alt_text.clone() />
                        <div>{image.title.clone()}</div>
                        <button on:click=move |_| editor.update(|e| e.set_feature_image(None))>"Убрать"</button>
                    </div>
                }
                .into_any(),
                None => {
                    let state = state_for_media.clone();
                    view! {
                        <div class="muted">
                            "Не выбрано. "
                            <button on:click=move |_| state.tab.set(Tab::Media)>"Открыть медиатеку"</button>
                        </div>
                    }
                    .into_any()
                }
            }}

            <label>"Время публикации"</label>
            <input
                type="datetime-local"
                prop:value=move || schedule.get()
                on:input=move |ev| schedule.set(event_target_value(&ev))
            />
        </div>

        <div class="actions">
            {move || {
                editor
                    .with(|e| e.action_labels())
                    .iter()
                    .map(|label| {
                        let label = *label;
                        let state = state_for_loading.clone();
                        view! {
                            <button
                                on:click=move |_| on_action.run(label)
                                disabled=move || state.loading.get()
                            >
                                {label}
                            </button>
                        }
                    })
                    .collect_view()
            }}
            <Show when=move || {
                editor.with(|e| e.post_id().is_some() && e.status() != PostStatus::Trash)
            }>
                <button class="danger" on:click=on_trash.clone()>"В корзину"</button>
            </Show>
        </div>

        {move || {
            saved_id
                .get()
                .map(|post_id| view! { <LiveUpdatesSection state=state_for_live.clone() post_id=post_id /> })
        }}
    }
}

/// Лента live-обновлений сохранённого поста.
#[component]
fn LiveUpdatesSection(state: AppState, post_id: String) -> impl IntoView {
    let updates = RwSignal::new(Vec::<LiveUpdate>::new());
    let title = RwSignal::new(String::new());
    let content = RwSignal::new(String::new());

    if let Some(token) = state.token() {
        let state = state.clone();
        let post_id = post_id.clone();
        spawn_local(async move {
            match api::list_live_updates(&token, &post_id).await {
                Ok(list) => updates.set(list),
                Err(err) => state.report(err),
            }
        });
    }

    let on_add = {
        let state = state.clone();
        move |_| {
            let (Some(token), Some(author)) = (state.token(), state.username()) else {
                return;
            };
            let (Some(heading), Some(body)) = (
                non_blank(&title.get_untracked()),
                non_blank(&content.get_untracked()),
            ) else {
                state.set_error("Заполните заголовок и текст обновления");
                return;
            };

            let draft = LiveUpdateDraft {
                title: heading,
                content: body,
                created_by: author,
            };
            let state = state.clone();
            let post_id = post_id.clone();
            spawn_local(async move {
                match api::add_live_update(&token, &post_id, &draft).await {
                    Ok(created) => {
                        updates.update(|list| {
                            list.push(created);
                            sort_for_display(list);
                        });
                        title.set(String::new());
                        content.set(String::new());
                    }
                    Err(err) => state.report(err),
                }
            });
        }
    };

    let toggle_pin = Callback::new({
        let state = state.clone();
        move |update: LiveUpdate| {
            let Some(token) = state.token() else {
                return;
            };
            let state = state.clone();
            spawn_local(async move {
                match api::toggle_live_pin(&token, &update).await {
                    Ok(changed) => updates.update(|list| {
                        list.retain(|item| item.id != changed.id);
                        list.push(changed);
                        sort_for_display(list);
                    }),
                    Err(err) => state.report(err),
                }
            });
        }
    });

    let remove = Callback::new({
        let state = state.clone();
        move |id: String| {
            let Some(token) = state.token() else {
                return;
            };
            let state = state.clone();
            spawn_local(async move {
                match api::delete_live_update(&token, &id).await {
                    Ok(()) => updates.update(|list| list.retain(|item| item.id != id)),
                    Err(err) => state.report(err),
                }
            });
        }
    });

    view! {
        <h3>"Live-обновления"</h3>
        <div class="live-form">
            <input
                placeholder="заголовок"
                prop:value=move || title.get()
                on:input=move |ev| title.set(event_target_value(&ev))
            />
            <textarea
                placeholder="текст"
                prop:value=move || content.get()
                on:input=move |ev| content.set(event_target_value(&ev))
            ></textarea>
            <button on:click=on_add>"Добавить"</button>
        </div>

        <ul class="live-updates">
            <For
                each=move || updates.get()
                key=|update| (update.id.clone(), update.pinned)
                children=move |update: LiveUpdate| {
                    let for_pin = update.clone();
                    let id = update.id.clone();
                    view! {
                        <li class:pinned=update.pinned>
                            <strong>{update.title.clone()}</strong>
                            <span class="muted">
                                {format!(" {} · {}", update.created_by, format_timestamp(update.posted_at))}
                            </span>
                            <p>{update.content.clone()}</p>
                            <button on:click=move |_| toggle_pin.run(for_pin.clone())>
                                {if update.pinned { "Открепить" } else { "Закрепить" }}
                            </button>
                            <button on:click=move |_| remove.run(id.clone())>"Удалить"</button>
                        </li>
                    }
                }
            />
        </ul>
    }
}
