use cms_core::CategorySelector;
use leptos::prelude::*;

use crate::forms::non_blank;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoryChoices {
    pub(crate) parents: Vec<(String, String)>,
    pub(crate) children: Vec<(String, String)>,
    pub(crate) parent: Option<String>,
    pub(crate) child: Option<String>,
}

impl CategoryChoices {
    pub(crate) fn of(selector: &CategorySelector) -> Self {
        Self {
            parents: selector
                .parent_options()
                .iter()
                .map(|node| (node.category.id.clone(), node.category.name.clone()))
                .collect(),
            children: selector
                .child_options()
                .iter()
                .map(|child| (child.id.clone(), child.name.clone()))
                .collect(),
            parent: selector.selected_parent().map(str::to_string),
            child: selector.selected_child().map(str::to_string),
        }
    }
}

/// Два связанных списка: родитель и его подкатегории.
#[component]
pub(crate) fn CategorySelect(
    #[prop(into)] choices: Signal<CategoryChoices>,
    on_parent: Callback<Option<String>>,
    on_child: Callback<Option<String>>,
) -> impl IntoView {
    view! {
        <div class="category-select">
            <select on:change=move |ev| on_parent.run(non_blank(&event_target_value(&ev)))>
                <option value="" prop:selected=move || choices.with(|c| c.parent.is_none())>
                    "— категория —"
                </option>
                <For
                    each=move || choices.with(|c| c.parents.clone())
                    key=|(id, _)| id.clone()
                    children=move |(id, name)| {
                        let selected_id = id.clone();
                        view! {
                            <option
                                value=id
                                prop:selected=move || {
                                    choices.with(|c| c.parent.as_deref() == Some(selected_id.as_str()))
                                }
                            >
                                {name}
                            </option>
                        }
                    }
                />
            </select>

            <Show when=move || choices.with(|c| !c.children.is_empty())>
                <select on:change=move |ev| on_child.run(non_blank(&event_target_value(&ev)))>
                    <option value="" prop:selected=move || choices.with(|c| c.child.is_none())>
                        "— подкатегория —"
                    </option>
                    <For
                        each=move || choices.with(|c| c.children.clone())
                        key=|(id, _)| id.clone()
                        children=move |(id, name)| {
                            let selected_id = id.clone();
                            view! {
                                <option
                                    value=id
                                    prop:selected=move || {
                                        choices.with(|c| c.child.as_deref() == Some(selected_id.as_str()))
                                    }
                                >
                                    {name}
                                </option>
                            }
                        }
                    />
                </select>
            </Show>
        </div>
    }
}
