mod commands;
mod logging;
mod print;
mod settings;

use std::fs;
use std::io;
use std::path::Path;
use std::process;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cms_client::{CmsClient, CmsClientError};
use cms_core::InactivityClock;
use tracing::{debug, info};

use crate::commands::{
    CategoryCommand, LiveCommand, MediaCommand, PostCommand, TagCommand, UserCommand,
};
use crate::logging::init_logging;
use crate::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "cms-cli", version, about = "CLI админки CMS")]
struct Cli {
    /// Адрес API (по умолчанию из CMS_API_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Вход пользователя.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Локальный выход: удаляет сохранённый токен.
    Logout,
    /// Кто вошёл.
    Whoami,
    /// Категории.
    #[command(subcommand)]
    Categories(CategoryCommand),
    /// Теги.
    #[command(subcommand)]
    Tags(TagCommand),
    /// Посты.
    #[command(subcommand)]
    Posts(PostCommand),
    /// Медиатека.
    #[command(subcommand)]
    Media(MediaCommand),
    /// Live-обновления поста.
    #[command(subcommand)]
    Live(LiveCommand),
    /// Пользователи.
    #[command(subcommand)]
    Users(UserCommand),
    /// Разбор slug на редактируемую основу и суффикс.
    Slug {
        slug: String,
        /// Новая основа: показать итоговый slug.
        #[arg(long)]
        base: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    init_logging(&settings.log_level)?;

    let cli = Cli::parse();
    let server = normalize_server(cli.server.unwrap_or_else(|| settings.api_url.clone()));
    debug!(%server, "using api server");

    let client = CmsClient::with_options(server, settings.http_options())
        .map_err(map_client_error)?;

    if let Command::Slug { slug, base } = &cli.command {
        print::print_slug(slug, base.as_deref());
        return Ok(());
    }

    restore_session(&client, &settings).context("не удалось прочитать файл токена")?;

    let result = dispatch(&client, &settings, cli.command).await;
    if matches!(
        result.as_ref().err().and_then(|e| e.downcast_ref::<CmsClientError>()),
        Some(CmsClientError::SessionExpired)
    ) {
        remove_token(&settings.token_file).context("не удалось удалить токен")?;
    }
    result?;

    if client.session().is_active() {
        persist_token(&client, &settings.token_file).context("не удалось сохранить токен")?;
    }
    Ok(())
}

async fn dispatch(client: &CmsClient, settings: &Settings, command: Command) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let session = client
                .login(&username, &password)
                .await
                .map_err(map_client_error)?;
            persist_token(client, &settings.token_file).context("не удалось сохранить токен")?;
            print::print_session("Вход выполнен", &session);
        }
        Command::Logout => {
            client.logout();
            remove_token(&settings.token_file).context("не удалось удалить токен")?;
            println!("Выход выполнен");
        }
        Command::Whoami => match client.session().get() {
            Some(session) => print::print_session("Текущая сессия", &session),
            None => println!("Вход не выполнен"),
        },
        Command::Categories(command) => commands::categories(client, command).await?,
        Command::Tags(command) => commands::tags(client, command).await?,
        Command::Posts(command) => commands::posts(client, command).await?,
        Command::Media(command) => commands::media(client, command).await?,
        Command::Live(command) => commands::live(client, command).await?,
        Command::Users(command) => commands::users(client, command).await?,
        Command::Slug { slug, base } => print::print_slug(&slug, base.as_deref()),
    }

    Ok(())
}

fn normalize_server(server: String) -> String {
    let server = server.trim().to_string();
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("http://{server}")
}

fn parse_token_content(raw: &str) -> Option<String> {
    let token = raw.trim().to_string();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn load_token(path: &Path) -> io::Result<Option<(String, SystemTime)>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(path)?;
    let modified = fs::metadata(path)?.modified()?;
    Ok(parse_token_content(&raw).map(|token| (token, modified)))
}

fn persist_token(client: &CmsClient, path: &Path) -> io::Result<()> {
    if let Some(token) = client.session().token() {
        fs::write(path, token)?;
    }
    Ok(())
}

fn remove_token(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

fn millis_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Время изменения файла токена считается моментом последней активности:
/// каждая команда с активной сессией перезаписывает файл.
fn inactivity_expired(last_activity: SystemTime, now: SystemTime, limit: Duration) -> bool {
    let clock = InactivityClock::new(limit, millis_since_epoch(last_activity));
    clock.is_expired(millis_since_epoch(now))
}

fn restore_session(client: &CmsClient, settings: &Settings) -> io::Result<()> {
    let Some((token, modified)) = load_token(&settings.token_file)? else {
        return Ok(());
    };

    if inactivity_expired(modified, SystemTime::now(), settings.inactivity_limit()) {
        info!("session expired due to inactivity");
        eprintln!("Сессия завершена из-за неактивности, выполните вход заново");
        return remove_token(&settings.token_file);
    }

    match client.restore_token(&token) {
        Ok(session) => {
            debug!(username = session.author_name(), "session restored");
            Ok(())
        }
        Err(err) => {
            info!(error = %err, "stored token rejected");
            eprintln!("Сохранённый токен недействителен: {err}");
            remove_token(&settings.token_file)
        }
    }
}

fn map_client_error(err: CmsClientError) -> anyhow::Error {
    let message = match &err {
        CmsClientError::Unauthorized => {
            "требуется авторизация: выполните `cms-cli login ...`".to_string()
        }
        CmsClientError::SessionExpired => {
            "сессия истекла: выполните `cms-cli login ...` заново".to_string()
        }
        CmsClientError::Forbidden(message) => format!("доступ запрещён: {message}"),
        CmsClientError::NotFound => "ресурс не найден".to_string(),
        CmsClientError::RateLimited => "слишком много попыток, повторите позже".to_string(),
        CmsClientError::Api { status, message } => format!("ошибка сервера ({status}): {message}"),
        CmsClientError::InvalidToken(message) => format!("некорректный токен: {message}"),
        CmsClientError::Domain(err) => format!("некорректные данные: {err}"),
        CmsClientError::Validation(errors) => format!("некорректные данные: {errors}"),
        CmsClientError::InvalidRequest(message) => format!("некорректный запрос: {message}"),
        CmsClientError::Http(err) => format!("ошибка HTTP: {err}"),
    };

    if err.is_session_expired() {
        return anyhow::Error::new(err).context(message);
    }
    anyhow::anyhow!(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_server_keeps_scheme() {
        let s = normalize_server("https://cms.example.com".to_string());
        assert_eq!(s, "https://cms.example.com");
    }

    #[test]
    fn normalize_server_adds_http_scheme() {
        let s = normalize_server(" localhost:5000 ".to_string());
        assert_eq!(s, "http://localhost:5000");
    }

    #[test]
    fn parse_token_content_trims_whitespace() {
        let token = parse_token_content("  abc.def.ghi  ");
        assert_eq!(token.as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn parse_token_content_rejects_blank() {
        assert!(parse_token_content("   ").is_none());
    }

    #[test]
    fn inactivity_is_measured_from_last_write() {
        let limit = Duration::from_secs(60);
        let written = UNIX_EPOCH + Duration::from_secs(1_000);

        assert!(!inactivity_expired(written, written + Duration::from_secs(59), limit));
        assert!(inactivity_expired(written, written + Duration::from_secs(60), limit));
    }

    #[test]
    fn expired_session_error_keeps_its_type() {
        let err = map_client_error(CmsClientError::SessionExpired);
        assert!(matches!(
            err.downcast_ref::<CmsClientError>(),
            Some(CmsClientError::SessionExpired)
        ));

        let err = map_client_error(CmsClientError::NotFound);
        assert_eq!(err.to_string(), "ресурс не найден");
    }

    #[test]
    fn cli_parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "cms-cli",
            "--server",
            "localhost:5000",
            "posts",
            "list",
            "--status",
            "draft",
        ])
        .expect("valid command line");
        assert_eq!(cli.server.as_deref(), Some("localhost:5000"));
        assert!(matches!(cli.command, Command::Posts(_)));
    }
}
