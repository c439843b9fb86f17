use chrono::{DateTime, Utc};
use cms_client::Session;
use cms_core::{CategoryTree, LiveUpdate, MediaAsset, Post, RoleCounts, SlugParts, Tag, User};

pub fn print_session(title: &str, session: &Session) {
    println!("{title}");
    println!("user: {}", session.author_name());
    if let Some(role) = session.role() {
        println!("role: {role}");
    }
    println!("expires_at: {}", format_time(session.expires_at()));
}

pub fn print_slug(slug: &str, new_base: Option<&str>) {
    let mut parts = SlugParts::split(slug);
    println!("base: {}", parts.base());
    println!("suffix: {}", parts.suffix());
    if let Some(base) = new_base {
        parts.set_base(base);
        println!("result: {}", parts.join());
    }
}

pub fn print_category_tree(tree: &CategoryTree) {
    for node in tree.roots() {
        println!("{}  {}", node.category.id, node.category.name);
        for child in &node.children {
            println!("  └ {}  {}", child.id, child.name);
        }
    }
}

pub fn print_tags(tags: &[&Tag]) {
    println!("tags: {}", tags.len());
    for tag in tags {
        let trending = if tag.is_trending { " *" } else { "" };
        println!(
            "- [{}] {} ({}, posts: {}){trending}",
            tag.id, tag.name, tag.slug, tag.post_count
        );
    }
}

pub fn print_post(title: &str, post: &Post) {
    println!("{title}");
    println!("id: {}", post.id);
    println!("title: {}", post.title);
    println!("slug: {}", post.slug);
    println!("status: {}", post.status);
    println!("path: {}", post.public_path());
    println!("author: {}", post.author_name);
    if let Some(at) = post.scheduled_at {
        println!("scheduled_at: {}", at.to_rfc3339());
    }
    println!("updated_at: {}", format_time(post.updated_at));
    if !post.tags.is_empty() {
        println!("tags: {}", post.tags.join(", "));
    }
}

pub fn print_post_list(posts: &[Post]) {
    println!("posts: {}", posts.len());
    for post in posts {
        println!(
            "- [{}] {} | {} | {} | {}",
            post.id,
            post.title,
            post.status,
            post.author_name,
            format_time(post.listing_timestamp())
        );
    }
}

pub fn print_media(assets: &[&MediaAsset], total: usize) {
    println!("files: {} of {total}", assets.len());
    for asset in assets {
        println!(
            "- [{}] {} | {} | {} | {}",
            asset.id,
            asset.display_title(),
            asset.media_type,
            asset.human_size(),
            asset.url
        );
    }
}

pub fn print_live_updates(updates: &[LiveUpdate]) {
    for update in updates {
        let pin = if update.pinned { "📌 " } else { "" };
        println!(
            "- [{}] {pin}{} ({}, {})",
            update.id,
            update.title,
            update.created_by,
            format_time(update.posted_at)
        );
    }
}

pub fn print_users(users: &[&User], counts: &RoleCounts) {
    println!(
        "all: {} | admin: {} | editor: {} | subscriber: {}",
        counts.all, counts.admin, counts.editor, counts.subscriber
    );
    for user in users {
        println!(
            "- [{}] {} <{}> {} ({})",
            user.id,
            user.username,
            user.email,
            user.display_name(),
            user.role
        );
    }
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn missing_time_is_dash() {
        assert_eq!(format_time(None), "-");
    }

    #[test]
    fn time_is_minute_precision() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 59).single();
        assert_eq!(format_time(at), "2024-03-05 14:07");
    }
}
