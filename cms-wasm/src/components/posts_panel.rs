use std::str::FromStr;

use cms_core::{CategorySelector, Post, PostEditor, PostQuery, PostStatus};
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::api;
use crate::components::category_selector::{CategoryChoices, CategorySelect};
use crate::forms::{format_timestamp, non_blank};
use crate::state::{AppState, Tab};

const STATUS_TABS: [(&str, &str); 5] = [
    ("", "Все"),
    ("draft", "Черновики"),
    ("published", "Опубликованные"),
    ("scheduled", "Запланированные"),
    ("trash", "Корзина"),
];

fn load_posts(state: AppState, query: PostQuery) {
    let Some(token) = state.token() else {
        return;
    };

    state.loading.set(true);
    state.clear_error();
    spawn_local(async move {
        match api::list_posts(&token, &query).await {
            Ok(posts) => state.posts.set(posts),
            Err(err) => state.report(err),
        }
        state.loading.set(false);
    });
}

fn change_status(state: AppState, id: String, status: PostStatus) {
    let Some(token) = state.token() else {
        return;
    };

    spawn_local(async move {
        match api::set_post_status(&token, &id, status).await {
            // Пост уходит из текущей выборки.
            Ok(()) => state.posts.update(|posts| posts.retain(|post| post.id != id)),
            Err(err) => state.report(err),
        }
    });
}

fn delete_forever(state: AppState, id: String) {
    let Some(token) = state.token() else {
        return;
    };

    spawn_local(async move {
        match api::delete_post(&token, &id).await {
            Ok(()) => state.posts.update(|posts| posts.retain(|post| post.id != id)),
            Err(err) => state.report(err),
        }
    });
}

#[component]
pub(crate) fn PostsPanel(state: AppState) -> impl IntoView {
    let status = RwSignal::new(String::new());
    let author = RwSignal::new(String::new());
    let month = RwSignal::new(String::new());
    let search = RwSignal::new(String::new());
    let authors = RwSignal::new(Vec::<String>::new());
    let filter = RwSignal::new(CategorySelector::new(state.category_tree()));

    Effect::new({
        let state = state.clone();
        move |_| {
            let tree = state.category_tree();
            filter.update(|f| f.refresh(tree));
        }
    });

    let query = move || PostQuery {
        status: PostStatus::from_str(&status.get_untracked()).ok(),
        author_name: non_blank(&author.get_untracked()),
        month: non_blank(&month.get_untracked()),
        search: non_blank(&search.get_untracked()),
        category_in: filter.with_untracked(CategorySelector::filter_ids),
    };

    let reload = {
        let state = state.clone();
        move || load_posts(state.clone(), query())
    };
    reload();

    if let Some(token) = state.token() {
        let state = state.clone();
        spawn_local(async move {
            match api::distinct_authors(&token).await {
                Ok(list) => authors.set(list),
                Err(err) => state.report(err),
            }
        });
    }

    let on_new_post = {
        let state = state.clone();
        move |_| {
            state.editor.set(PostEditor::new(state.category_tree()));
            state.tab.set(Tab::Editor);
        }
    };

    let on_edit = Callback::new({
        let state = state.clone();
        move |post: Post| {
            let tree = state.category_tree();
            let editor = state
                .tags
                .with_untracked(|tags| PostEditor::from_post(&post, tree, tags));
            state.editor.set(editor);
            state.tab.set(Tab::Editor);
        }
    });

    let reload_for_button = reload.clone();
    let reload_for_status = reload.clone();
    let reload_for_parent = reload.clone();
    let reload_for_child = reload.clone();
    let state_for_rows = state.clone();

    view! {
        <h2>"Посты"</h2>
        <button on:click=on_new_post>"Новый пост"</button>

        <div class="filters">
            <select on:change=move |ev| {
                status.set(event_target_value(&ev));
                reload_for_status();
            }>
                {STATUS_TABS
                    .iter()
                    .map(|(value, label)| view! { <option value=*value>{*label}</option> })
                    .collect_view()}
            </select>

            <select on:change=move |ev| author.set(event_target_value(&ev))>
                <option value="">"Все авторы"</option>
                <For
                    each=move || authors.get()
                    key=|name| name.clone()
                    children=move |name| view! { <option value=name.clone()>{name.clone()}</option> }
                />
            </select>

            <input
                type="month"
                prop:value=move || month.get()
                on:input=move |ev| month.set(event_target_value(&ev))
            />
            <input
                placeholder="поиск"
                prop:value=move || search.get()
                on:input=move |ev| search.set(event_target_value(&ev))
            />

            <CategorySelect
                choices=Signal::derive(move || filter.with(CategoryChoices::of))
                on_parent=Callback::new(move |id: Option<String>| {
                    filter.update(|f| {
                        let _ = f.select_parent(id.as_deref());
                    });
                    reload_for_parent();
                })
                on_child=Callback::new(move |id: Option<String>| {
                    filter.update(|f| {
                        let _ = f.select_child(id.as_deref());
                    });
                    reload_for_child();
                })
            />

            <button on:click=move |_| reload_for_button() disabled=move || state.loading.get()>
                "Найти"
            </button>
        </div>

        <table class="posts">
            <tbody>
                <For
                    each=move || state_for_rows.posts.get()
                    key=|post| (post.id.clone(), post.status, post.updated_at)
                    children={
                        let state = state_for_rows.clone();
                        move |post: Post| {
                            let id = post.id.clone();
                            let in_trash = post.status == PostStatus::Trash;
                            let state_trash = state.clone();
                            let state_restore = state.clone();
                            let state_delete = state.clone();
                            let id_trash = id.clone();
                            let id_restore = id.clone();
                            let id_delete = id.clone();
                            let for_edit = post.clone();

                            view! {
                                <tr>
                                    <td>
                                        <strong>{post.title.clone()}</strong>
                                        <div class="muted">{post.public_path()}</div>
                                    </td>
                                    <td>{post.status.to_string()}</td>
                                    <td>{post.author_name.clone()}</td>
                                    <td>{format_timestamp(post.listing_timestamp())}</td>
                                    <td>
                                        <Show
                                            when=move || in_trash
                                            fallback={
                                                let state = state_trash.clone();
                                                let id = id_trash.clone();
                                                let post = for_edit.clone();
                                                move || {
                                                    let state = state.clone();
                                                    let id = id.clone();
                                                    let post = post.clone();
                                                    view! {
                                                        <button on:click=move |_| on_edit.run(post.clone())>
                                                            "Редактировать"
                                                        </button>
                                                        <button on:click=move |_| {
                                                            change_status(state.clone(), id.clone(), PostStatus::Trash)
                                                        }>"В корзину"</button>
                                                    }
                                                }
                                            }
                                        >
                                            <button on:click={
                                                let state = state_restore.clone();
                                                let id = id_restore.clone();
                                                move |_| change_status(state.clone(), id.clone(), PostStatus::Draft)
                                            }>"Восстановить"</button>
                                            <button on:click={
                                                let state = state_delete.clone();
                                                let id = id_delete.clone();
                                                move |_| delete_forever(state.clone(), id.clone())
                                            }>"Удалить навсегда"</button>
                                        </Show>
                                    </td>
                                </tr>
                            }
                        }
                    }
                />
            </tbody>
        </table>
    }
}
