pub(crate) mod category_selector;
pub(crate) mod login_panel;
pub(crate) mod media_panel;
pub(crate) mod post_editor;
pub(crate) mod posts_panel;
