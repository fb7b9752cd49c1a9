mod config;
mod credentials;
mod render;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{ApiClient, ClientContext, FetchState, HttpList};
use serde::de::DeserializeOwned;
use shared::domain::PostId;
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(name = "blog", about = "Command-line client for the blog API")]
struct Args {
    /// Base URL of the API, e.g. http://localhost:5000/api
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Where the credential token is kept.
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        /// Visible in the process list; prefer BLOG_PASSWORD or stdin.
        #[arg(long)]
        password: Option<String>,
    },
    Signup {
        #[arg(long)]
        nickname: String,
        #[arg(long)]
        email: String,
        /// Visible in the process list; prefer BLOG_PASSWORD or stdin.
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    /// Exchange the stored token for a fresh one.
    Renew,
    Posts {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    SearchPosts {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Comments {
        post_id: i64,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    UserPosts {
        nickname: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    SearchUsers {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings()?;
    settings.apply_overrides(args.api_url, args.database_url, args.timeout_secs);
    settings.validate()?;

    let storage = Storage::new(&settings.normalized_database_url()).await?;
    let api = ApiClient::new(&settings.api_url, settings.request_timeout())?;
    info!(api_url = %api.base_url(), "blog client ready");

    let context = ClientContext::new(api, Arc::new(storage));
    context.session().initialize().await;

    let output = run(&context, &settings, args.command).await?;
    println!("{output}");
    Ok(())
}

async fn run(context: &ClientContext, settings: &Settings, command: Command) -> Result<String> {
    let session = context.session();
    let api = context.api();

    let output = match command {
        Command::Login { email, password } => {
            let password = read_password(password)?;
            session.login(&email, &password).await?;
            render::session(&session.snapshot())
        }
        Command::Signup {
            nickname,
            email,
            password,
        } => {
            let password = read_password(password)?;
            session.signup(&nickname, &email, &password).await?;
            render::session(&session.snapshot())
        }
        Command::Logout => {
            session.logout().await;
            render::session(&session.snapshot())
        }
        Command::Whoami => render::session(&session.snapshot()),
        Command::Renew => {
            session.renew_token().await?;
            "Token renewed".to_string()
        }
        Command::Posts { page } => {
            let state = load(context, api.posts(), settings.posts_per_page, page).await;
            render::list(&state, render::NO_POSTS, render::post_line)
        }
        Command::SearchPosts { query, page } => {
            let state = load(context, api.search_posts(query), settings.posts_per_page, page).await;
            render::list(&state, render::NO_MATCHING_POSTS, render::post_line)
        }
        Command::Comments { post_id, page } => {
            let list = api.post_comments(PostId(post_id));
            let state = load(context, list, settings.comments_per_page, page).await;
            render::list(&state, render::NO_COMMENTS, render::comment_line)
        }
        Command::UserPosts { nickname, page } => {
            let state = load(context, api.user_posts(nickname), settings.posts_per_page, page).await;
            render::list(&state, render::NO_POSTS, render::post_line)
        }
        Command::SearchUsers { query, page } => {
            let state = load(context, api.search_users(query), settings.users_per_page, page).await;
            render::list(&state, render::NO_USERS, render::user_line)
        }
    };
    Ok(output)
}

fn read_password(flag: Option<String>) -> Result<String> {
    credentials::resolve_password(
        flag,
        |key| std::env::var(key).ok(),
        &mut std::io::stdin().lock(),
    )
}

async fn load<T>(context: &ClientContext, list: HttpList<T>, per_page: u32, page: u32) -> FetchState<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let controller = context.controller_for(list, Some(per_page));
    controller.go_to_page(page).await;
    controller.fetch_state()
}
