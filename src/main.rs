use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser as _;

use bookgate::auth;
use bookgate::books::{BookClient, cover_path};
use bookgate::cli::{Cli, Command, CreateArgs, SearchArgs};
use bookgate::gateway::{self, GatewayConfig};
use bookgate::model::{Book, BookDraft};
use bookgate::query::SearchFilter;
use bookgate::session::{AuthSession, LocalFsSessionStore};

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    bookgate::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    if let Command::Serve(args) = &cli.command {
        let config = GatewayConfig::from_env().context("load gateway config")?;
        return gateway::serve(args.addr, config).await.context("serve");
    }

    let store = Arc::new(LocalFsSessionStore::new(&cli.data_dir));
    let mut session = AuthSession::load(store).await.context("load session")?;
    let client = BookClient::new(format!(
        "{}/api/backend",
        cli.gateway.trim_end_matches('/')
    ));

    match cli.command {
        Command::Serve(_) => unreachable!("handled above"),
        Command::Login(args) => {
            let http = reqwest::Client::new();
            let tokens = auth::login(&http, &cli.gateway, &args.username, &args.password)
                .await
                .context("login")?;
            let user = session
                .login_with_token(tokens.access_token)
                .await
                .context("store session")?;
            println!(
                "logged in as {} (roles: {})",
                user.username,
                user.roles.join(", ")
            );
        }
        Command::Logout => {
            session.logout().await.context("logout")?;
            println!("logged out");
        }
        Command::Whoami => match session.user() {
            Some(user) => {
                println!("{}", user.username);
                println!("  roles: {}", user.roles.join(", "));
                println!("  admin: {}", session.is_admin());
            }
            None => println!("not logged in"),
        },
        Command::Search(args) => {
            let filter = search_filter(args);
            let result = client
                .search(&filter, session.token())
                .await
                .context("search")?;

            for book in &result.content {
                let title = book
                    .title
                    .as_ref()
                    .map(|t| t.title.as_str())
                    .unwrap_or("(untitled)");
                println!("{:>6}  {:<40}  {}", book.id, title, book.isbn);
            }
            println!(
                "page {}/{} ({} total)",
                result.page.number + 1,
                result.page.total_pages,
                result.page.total_elements
            );
        }
        Command::Show(args) => {
            let book = client
                .get_by_id(args.id, session.token())
                .await
                .context("show")?;
            print_book(&book);
        }
        Command::Create(args) => {
            // Local gate mirrors the entry form; the backend's 403 stays
            // the authoritative denial for stale roles.
            if !session.is_admin() {
                anyhow::bail!("creating entries requires the admin role (log in as an admin)");
            }
            let draft = create_draft(args);
            let created = client
                .create(&draft, session.token())
                .await
                .context("create")?;
            println!("created #{}", created.id);
            print_book(&created);
        }
    }

    Ok(())
}

fn search_filter(args: SearchArgs) -> SearchFilter {
    SearchFilter {
        title: args.title,
        isbn: args.isbn,
        kind: args.kind,
        available: args.available,
        rating: args.rating,
        page: Some(args.page),
        size: args.size,
    }
}

fn create_draft(args: CreateArgs) -> BookDraft {
    BookDraft {
        title: args.title,
        isbn: args.isbn,
        price: args.price,
        discount: args.discount_percent.map(|percent| percent / 100.0),
        homepage: args.homepage,
        release_date: args.date,
        rating: args.rating,
        available: args.available.then_some(true),
        kind: args.kind,
    }
}

fn print_book(book: &Book) {
    let title = book
        .title
        .as_ref()
        .map(|t| t.title.as_str())
        .unwrap_or("(untitled)");
    println!("#{} {title}", book.id);
    if let Some(subtitle) = book.title.as_ref().and_then(|t| t.subtitle.as_deref()) {
        println!("  subtitle: {subtitle}");
    }
    println!("  isbn:     {}", book.isbn);
    println!("  price:    {:.2}", book.price);
    if let Some(discount) = book.discount {
        println!("  discount: {:.0}%", discount * 100.0);
    }
    println!("  rating:   {}", book.rating);
    if let Some(kind) = book.kind {
        println!("  kind:     {kind:?}");
    }
    if let Some(available) = book.available {
        println!("  available: {available}");
    }
    if let Some(date) = book.release_date {
        println!("  released: {}", date.date_naive());
    }
    if let Some(homepage) = book.homepage.as_deref() {
        println!("  homepage: {homepage}");
    }
    println!("  cover:    {}", cover_path(book.id));
}
