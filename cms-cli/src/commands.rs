use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use cms_client::CmsClient;
use cms_core::category::flatten_with_depth;
use cms_core::post::parse_month;
use cms_core::user::filter_by_role;
use cms_core::{
    CategoryDraft, DetailField, MediaLibrary, NewUser, PostAction, PostEditor, PostQuery,
    PostStatus, Role, RoleCounts, TagDraft,
};

use crate::map_client_error;
use crate::print;

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    /// Плоский список с отступами по глубине.
    List,
    /// Двухуровневое дерево (как в выпадающих списках).
    Tree,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: Option<String>,
        /// id родительской категории.
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        keywords: String,
    },
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        keywords: String,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum TagCommand {
    List {
        /// Подсказки по началу имени.
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Trending,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        trending: bool,
    },
    ToggleTrending {
        #[arg(long)]
        id: String,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum PostCommand {
    List {
        /// draft | published | scheduled | trash; без него корзина скрыта.
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        author: Option<String>,
        /// Месяц в формате YYYY-MM.
        #[arg(long)]
        month: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// id категории; для родителя учитываются и подкатегории.
        #[arg(long)]
        category: Option<String>,
    },
    Get {
        #[arg(long)]
        id: String,
    },
    /// Новый пост из командной строки.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long, default_value = "")]
        summary: String,
        /// HTML-содержимое или @путь к файлу.
        #[arg(long)]
        content: String,
        /// Теги через запятую; недостающие будут созданы.
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long)]
        parent_category: Option<String>,
        #[arg(long)]
        child_category: Option<String>,
        #[arg(long, default_value = "")]
        meta_title: String,
        #[arg(long, default_value = "")]
        meta_description: String,
        #[arg(long)]
        publish: bool,
    },
    Trash {
        #[arg(long)]
        id: String,
    },
    /// Возвращает пост из корзины в черновики.
    Restore {
        #[arg(long)]
        id: String,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
    Publish {
        #[arg(long)]
        id: String,
    },
    Schedule {
        #[arg(long)]
        id: String,
        /// Время публикации в RFC 3339.
        #[arg(long)]
        at: String,
    },
    Authors,
}

#[derive(Debug, Subcommand)]
pub enum MediaCommand {
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// Сколько страниц показать.
        #[arg(long, default_value_t = 1)]
        pages: usize,
        #[arg(long)]
        json: bool,
    },
    Upload {
        #[arg(long)]
        file: PathBuf,
        /// MIME-тип; по умолчанию по расширению.
        #[arg(long)]
        mime: Option<String>,
    },
    Update {
        #[arg(long)]
        id: String,
        /// title | alt | caption | description.
        #[arg(long)]
        field: String,
        #[arg(long)]
        value: String,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum LiveCommand {
    List {
        #[arg(long)]
        post: String,
    },
    Add {
        #[arg(long)]
        post: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    /// Переключает закрепление.
    Pin {
        #[arg(long)]
        post: String,
        #[arg(long)]
        id: String,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    List {
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "subscriber")]
        role: String,
        #[arg(long, default_value = "en")]
        language: String,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

pub async fn categories(client: &CmsClient, command: CategoryCommand) -> Result<()> {
    match command {
        CategoryCommand::List => {
            let categories = client.list_categories().await.map_err(map_client_error)?;
            for item in flatten_with_depth(&categories) {
                println!("{}  [{}] {}", item.category.id, item.category.slug, item.label());
            }
        }
        CategoryCommand::Tree => {
            let tree = client.category_tree().await.map_err(map_client_error)?;
            print::print_category_tree(&tree);
        }
        CategoryCommand::Create {
            name,
            slug,
            parent,
            description,
            keywords,
        } => {
            let categories = client.list_categories().await.map_err(map_client_error)?;
            let parent = find_category(&categories, parent.as_deref())?;
            let draft = CategoryDraft::new(&name, slug.as_deref(), parent, &description, &keywords);
            let message = client
                .create_category(&draft)
                .await
                .map_err(map_client_error)?;
            println!("{message}: slug={}", draft.slug);
        }
        CategoryCommand::Update {
            id,
            name,
            slug,
            parent,
            description,
            keywords,
        } => {
            let categories = client.list_categories().await.map_err(map_client_error)?;
            let parent = find_category(&categories, parent.as_deref())?;
            let draft = CategoryDraft::new(&name, slug.as_deref(), parent, &description, &keywords);
            let message = client
                .update_category(&id, &draft)
                .await
                .map_err(map_client_error)?;
            println!("{message}: id={id}");
        }
        CategoryCommand::Delete { id } => {
            let message = client.delete_category(&id).await.map_err(map_client_error)?;
            println!("{message}: id={id}");
        }
    }

    Ok(())
}

fn find_category<'a>(
    categories: &'a [cms_core::Category],
    id: Option<&str>,
) -> Result<Option<&'a cms_core::Category>> {
    let Some(id) = id else {
        return Ok(None);
    };
    categories
        .iter()
        .find(|category| category.id == id)
        .map(Some)
        .ok_or_else(|| anyhow!("категория {id} не найдена"))
}

pub async fn tags(client: &CmsClient, command: TagCommand) -> Result<()> {
    match command {
        TagCommand::List { search, json } => {
            let tags = client.list_tags().await.map_err(map_client_error)?;
            let shown: Vec<_> = match search.as_deref() {
                Some(input) => cms_core::tag::suggest(&tags, input),
                None => tags.iter().collect(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print::print_tags(&shown);
            }
        }
        TagCommand::Trending => {
            let tags = client.trending_tags().await.map_err(map_client_error)?;
            print::print_tags(&tags.iter().collect::<Vec<_>>());
        }
        TagCommand::Create {
            name,
            slug,
            description,
            trending,
        } => {
            let draft = TagDraft::new(&name, slug.as_deref(), &description, trending);
            let tag = client.create_tag(&draft).await.map_err(map_client_error)?;
            println!("Тег создан: id={} slug={}", tag.id, tag.slug);
        }
        TagCommand::ToggleTrending { id } => {
            let message = client.toggle_trending(&id).await.map_err(map_client_error)?;
            println!("{message}: id={id}");
        }
        TagCommand::Delete { id } => {
            let message = client.delete_tag(&id).await.map_err(map_client_error)?;
            println!("{message}: id={id}");
        }
    }

    Ok(())
}

pub async fn posts(client: &CmsClient, command: PostCommand) -> Result<()> {
    match command {
        PostCommand::List {
            status,
            author,
            month,
            search,
            category,
        } => {
            let status = status.as_deref().map(str::parse::<PostStatus>).transpose()?;
            let month = month.as_deref().map(parse_month).transpose()?;
            let category_in = match category.as_deref() {
                Some(id) => {
                    let tree = client.category_tree().await.map_err(map_client_error)?;
                    tree.filter_ids(id)
                }
                None => Vec::new(),
            };
            let query = PostQuery {
                status,
                author_name: author,
                month,
                search,
                category_in,
            };
            let posts = client.list_posts(&query).await.map_err(map_client_error)?;
            print::print_post_list(&posts);
        }
        PostCommand::Get { id } => {
            let post = client.get_post(&id).await.map_err(map_client_error)?;
            print::print_post("Пост", &post);
        }
        PostCommand::Create {
            title,
            slug,
            summary,
            content,
            tags,
            parent_category,
            child_category,
            meta_title,
            meta_description,
            publish,
        } => {
            let tree = client.category_tree().await.map_err(map_client_error)?;
            let mut editor = PostEditor::new(tree);
            editor.set_title(title);
            if let Some(slug) = slug.as_deref() {
                editor.set_slug_base(slug);
            }
            editor.set_summary(summary);
            editor.set_content(read_content(&content)?);
            editor.add_tags(&tags);
            editor.select_parent_category(parent_category.as_deref())?;
            editor.select_child_category(child_category.as_deref())?;
            editor.set_meta_title(meta_title);
            editor.set_meta_description(meta_description);

            let action = if publish {
                PostAction::Publish
            } else {
                PostAction::SaveDraft
            };
            let saved = client
                .save_post(&mut editor, action)
                .await
                .map_err(map_client_error)?;
            print::print_post("Пост сохранён", &saved);
        }
        PostCommand::Trash { id } => {
            let message = client
                .set_post_status(&id, PostStatus::Trash)
                .await
                .map_err(map_client_error)?;
            println!("{message}: id={id}");
        }
        PostCommand::Restore { id } => {
            let message = client
                .set_post_status(&id, PostStatus::Draft)
                .await
                .map_err(map_client_error)?;
            println!("{message}: id={id}");
        }
        PostCommand::Delete { id } => {
            let message = client.delete_post(&id).await.map_err(map_client_error)?;
            println!("Пост удалён: id={id} ({message})");
        }
        PostCommand::Publish { id } => {
            let saved = resave(client, &id, PostAction::Publish).await?;
            print::print_post("Пост опубликован", &saved);
        }
        PostCommand::Schedule { id, at } => {
            let at = parse_schedule(&at)?;
            let saved = resave(client, &id, PostAction::Schedule(at)).await?;
            print::print_post("Публикация запланирована", &saved);
        }
        PostCommand::Authors => {
            for author in client.distinct_authors().await.map_err(map_client_error)? {
                println!("{author}");
            }
        }
    }

    Ok(())
}

async fn resave(client: &CmsClient, id: &str, action: PostAction) -> Result<cms_core::Post> {
    let post = client.get_post(id).await.map_err(map_client_error)?;
    let tree = client.category_tree().await.map_err(map_client_error)?;
    let tags = client.list_tags().await.map_err(map_client_error)?;

    let mut editor = PostEditor::from_post(&post, tree, &tags);
    client
        .save_post(&mut editor, action)
        .await
        .map_err(map_client_error)
}

fn parse_schedule(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|at| at.with_timezone(&Utc))
        .with_context(|| format!("некорректное время {raw:?}, ожидается RFC 3339"))
}

fn read_content(raw: &str) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("не удалось прочитать {path}"))
        }
        None => Ok(raw.to_string()),
    }
}

pub async fn media(client: &CmsClient, command: MediaCommand) -> Result<()> {
    match command {
        MediaCommand::List {
            search,
            pages,
            json,
        } => {
            let assets = client.list_media().await.map_err(map_client_error)?;
            let mut library = MediaLibrary::new(assets);
            library.set_query(search);
            for _ in 1..pages {
                library.load_more();
            }

            let visible = library.visible();
            if json {
                println!("{}", serde_json::to_string_pretty(&visible)?);
            } else {
                print::print_media(&visible, library.total_matching());
            }
        }
        MediaCommand::Upload { file, mime } => {
            let bytes =
                fs::read(&file).with_context(|| format!("не удалось прочитать {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| anyhow!("некорректное имя файла {}", file.display()))?;
            let asset = client
                .upload_media(file_name, mime.as_deref(), bytes)
                .await
                .map_err(map_client_error)?;
            println!(
                "Файл загружен: id={} url={} ({})",
                asset.id,
                asset.url,
                asset.human_size()
            );
        }
        MediaCommand::Update { id, field, value } => {
            let field = DetailField::parse(&field)
                .ok_or_else(|| anyhow!("неизвестное поле {field:?}"))?;
            let asset = client
                .update_media_detail(&id, field, &value)
                .await
                .map_err(map_client_error)?;
            println!("Сохранено: {field} = {:?}", asset.detail(field));
        }
        MediaCommand::Delete { id } => {
            let assets = client.list_media().await.map_err(map_client_error)?;
            let library = MediaLibrary::new(assets);
            let asset = library
                .find(&id)
                .ok_or_else(|| anyhow!("файл {id} не найден"))?;
            let message = client.delete_media(asset).await.map_err(map_client_error)?;
            println!("{message}: id={id}");
        }
    }

    Ok(())
}

pub async fn live(client: &CmsClient, command: LiveCommand) -> Result<()> {
    match command {
        LiveCommand::List { post } => {
            let updates = client
                .list_live_updates(&post)
                .await
                .map_err(map_client_error)?;
            print::print_live_updates(&updates);
        }
        LiveCommand::Add {
            post,
            title,
            content,
        } => {
            let update = client
                .add_live_update(&post, &title, &content)
                .await
                .map_err(map_client_error)?;
            println!("Live-обновление добавлено: id={}", update.id);
        }
        LiveCommand::Pin { post, id } => {
            let updates = client
                .list_live_updates(&post)
                .await
                .map_err(map_client_error)?;
            let update = updates
                .iter()
                .find(|update| update.id == id)
                .ok_or_else(|| anyhow!("live-обновление {id} не найдено"))?;
            let changed = client
                .toggle_live_pin(update)
                .await
                .map_err(map_client_error)?;
            let state = if changed.pinned { "закреплено" } else { "откреплено" };
            println!("Live-обновление {state}: id={id}");
        }
        LiveCommand::Delete { id } => {
            let message = client
                .delete_live_update(&id)
                .await
                .map_err(map_client_error)?;
            println!("{message}: id={id}");
        }
    }

    Ok(())
}

pub async fn users(client: &CmsClient, command: UserCommand) -> Result<()> {
    match command {
        UserCommand::List { role, json } => {
            let role = role.as_deref().map(str::parse::<Role>).transpose()?;
            let users = client.list_users().await.map_err(map_client_error)?;
            let shown = filter_by_role(&users, role);
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print::print_users(&shown, &RoleCounts::count(&users));
            }
        }
        UserCommand::Add {
            username,
            email,
            password,
            first_name,
            last_name,
            role,
            language,
        } => {
            let user = NewUser {
                username: username.trim().to_string(),
                email: email.trim().to_string(),
                password,
                first_name,
                last_name,
                role: role.parse()?,
                language,
            };
            let message = client.add_user(&user).await.map_err(map_client_error)?;
            println!("{message}: {}", user.username);
        }
        UserCommand::Delete { id } => {
            let message = client.delete_user(&id).await.map_err(map_client_error)?;
            println!("{message}: id={id}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_time_accepts_offsets() {
        let at = parse_schedule("2030-01-02T10:00:00+03:00").expect("valid time");
        assert_eq!(at.to_rfc3339(), "2030-01-02T07:00:00+00:00");
    }

    #[test]
    fn schedule_time_rejects_garbage() {
        assert!(parse_schedule("tomorrow").is_err());
    }

    #[test]
    fn inline_content_is_passed_through() {
        let content = read_content("<p>hello</p>").expect("inline content");
        assert_eq!(content, "<p>hello</p>");
    }

    #[test]
    fn missing_content_file_is_reported() {
        assert!(read_content("@/definitely/not/here.html").is_err());
    }

    #[test]
    fn unknown_category_is_an_error() {
        let categories: Vec<cms_core::Category> = Vec::new();
        assert!(find_category(&categories, None).expect("no parent").is_none());
        assert!(find_category(&categories, Some("missing")).is_err());
    }
}
