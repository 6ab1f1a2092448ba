//! LMS patron client - terminal front end
//!
//! A line-oriented view over the client services: login, catalog
//! browsing with debounced search, borrow requests, and the dashboard.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_stream::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lms_client::{
    api::{auth::LoginForm, Api, Transport},
    config::AppConfig,
    models::{BookRequest, StreamFilter},
    services::{
        catalog::SearchSnapshot,
        requests::ReturnOutcome,
        Services,
    },
    AppState, ClientError,
};

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("lms_client={}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting LMS patron client v{}", env!("CARGO_PKG_VERSION"));

    let transport = Transport::new(&config.api)?;
    let services = Services::new(Api::new(transport), &config);
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    run(state).await
}

async fn run(state: AppState) -> anyhow::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let services = &state.services;

    login(services, &mut input).await?;

    // Search results render as they arrive; the pipeline already discards
    // anything stale, so printing every snapshot is last-write-wins.
    let search = services.catalog.search_pipeline();
    let mut snapshots = search.snapshots();
    tokio::spawn(async move {
        while let Some(snapshot) = snapshots.next().await {
            if snapshot.seq > 0 {
                print_snapshot(&snapshot);
            }
        }
    });

    // Initial page load
    print_streams(services).await;
    search.refresh();
    if let Err(err) = services.requests.refresh().await {
        println!("Failed to load request history: {}", describe(&err));
    }
    help();

    loop {
        let Some(line) = prompt_line(&mut input, "> ").await? else {
            break;
        };
        let line = line.trim();
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));

        match command {
            "" => {}
            "help" => help(),
            "streams" => print_streams(services).await,
            "search" => search.on_text_input(rest),
            "stream" => match parse_stream(rest) {
                Some(filter) => search.on_stream_change(filter),
                None => println!("Usage: stream <id|all>"),
            },
            "books" => search.refresh(),
            "requests" => match services.requests.refresh().await {
                Ok(requests) => print_requests(&requests),
                Err(err) => println!("Failed to load request history: {}", describe(&err)),
            },
            "request" => {
                let selection = match rest.trim() {
                    "" => None,
                    id => match id.parse() {
                        Ok(id) => Some(id),
                        Err(_) => {
                            println!("Usage: request <book-id>");
                            continue;
                        }
                    },
                };
                match services.requests.create_request(selection).await {
                    Ok(created) => {
                        println!("Book requested successfully: {}", created.book_title_display())
                    }
                    Err(err) => println!("{}", describe(&err)),
                }
            }
            "return" => match rest.trim().parse() {
                Ok(id) => {
                    let Some(answer) = prompt_line(
                        &mut input,
                        "Are you sure you want to return this book? [y/N] ",
                    )
                    .await?
                    else {
                        break;
                    };
                    let confirmed = matches!(answer.trim(), "y" | "Y" | "yes");
                    let confirm = move |_: &BookRequest| confirmed;
                    match services.requests.return_request(id, &confirm).await {
                        Ok(ReturnOutcome::Returned(_)) => println!("Book returned successfully."),
                        Ok(ReturnOutcome::Cancelled) => println!("Return cancelled."),
                        Err(err) => println!("{}", describe(&err)),
                    }
                }
                Err(_) => println!("Usage: return <request-id>"),
            },
            "dashboard" => dashboard(services).await,
            "logout" => {
                services.logout();
                println!("Logged out.");
                login(services, &mut input).await?;
            }
            "quit" | "exit" => break,
            other => println!("Unknown command: {other} (try 'help')"),
        }
    }

    Ok(())
}

/// Entry point of the authenticated area; loops until a login succeeds.
async fn login(services: &Services, input: &mut Input) -> anyhow::Result<()> {
    loop {
        let Some(username) = prompt_line(input, "Username: ").await? else {
            anyhow::bail!("stdin closed before login");
        };
        let Some(password) = prompt_line(input, "Password: ").await? else {
            anyhow::bail!("stdin closed before login");
        };

        let form = LoginForm {
            username: username.trim().to_string(),
            password: password.trim().to_string(),
        };
        match services.session.login(&form).await {
            Ok(_) => {
                println!("Login successful.");
                return Ok(());
            }
            Err(err) => println!("{}", describe(&err)),
        }
    }
}

async fn dashboard(services: &Services) {
    let credential = match services.session.require_session() {
        Ok(credential) => credential,
        Err(err) => {
            println!("{}", describe(&err));
            return;
        }
    };
    match services.profile.get_profile(&credential).await {
        Ok(profile) => println!("Welcome, {}", profile.full_name()),
        Err(err) => println!("Failed to load profile: {}", describe(&err)),
    }
    if let Err(err) = services.requests.refresh().await {
        println!("Failed to load request history: {}", describe(&err));
        return;
    }
    let summary = services.requests.summary();
    println!(
        "Approved: {}   Returned: {}   Total requests: {}",
        summary.approved, summary.returned, summary.total
    );
    print_requests(&services.requests.current());
}

async fn print_streams(services: &Services) {
    match services.catalog.stream_choices().await {
        Ok(choices) => {
            println!("Streams:");
            for choice in choices {
                match choice.filter {
                    StreamFilter::All => println!("  all: {}", choice.label),
                    StreamFilter::Stream(id) => println!("  {:>3}: {}", id, choice.label),
                }
            }
        }
        Err(err) => println!("Failed to load streams: {}", describe(&err)),
    }
}

fn print_snapshot(snapshot: &SearchSnapshot) {
    if let Some(message) = &snapshot.message {
        println!("Search failed: {message}");
    }
    if snapshot.books.is_empty() {
        println!("No books found.");
        return;
    }
    for book in &snapshot.books {
        println!(
            "  #{:<4} {} by {} [{}]",
            book.id,
            book.title,
            book.author_display(),
            book.stream_display()
        );
    }
}

fn print_requests(requests: &[BookRequest]) {
    if requests.is_empty() {
        println!("No book requests yet.");
        return;
    }
    println!(
        "{:<5} {:<24} {:<10} {:<12} {:<12} {:<8}",
        "id", "book", "status", "requested", "due", "overdue"
    );
    for request in requests {
        let overdue = match request.overdue() {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        let due = request
            .return_due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let action = if request.can_return() {
            format!("  [return {}]", request.id)
        } else {
            String::new()
        };
        println!(
            "{:<5} {:<24} {:<10} {:<12} {:<12} {:<8}{}",
            request.id,
            request.book_title_display(),
            request.state().label(),
            request.requested_at.format("%Y-%m-%d").to_string(),
            due,
            overdue,
            action
        );
    }
}

/// Local and server validation detail, flattened for the terminal.
fn describe(err: &ClientError) -> String {
    match err {
        ClientError::Validation(errors) => {
            let details: Vec<String> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |error| match &error.message {
                        Some(message) => format!("{field}: {message}"),
                        None => field.to_string(),
                    })
                })
                .collect();
            details.join("; ")
        }
        ClientError::Rejected {
            message,
            fields: Some(fields),
            ..
        } => {
            let details: Vec<String> = fields
                .iter()
                .flat_map(|(field, messages)| {
                    messages.iter().map(move |message| format!("{field}: {message}"))
                })
                .collect();
            format!("{} ({})", message, details.join("; "))
        }
        other => other.to_string(),
    }
}

fn parse_stream(value: &str) -> Option<StreamFilter> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("all") {
        return Some(StreamFilter::All);
    }
    value.parse().ok().map(StreamFilter::Stream)
}

async fn prompt_line(input: &mut Input, prompt: &str) -> anyhow::Result<Option<String>> {
    use std::io::Write;
    print!("{prompt}");
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

fn help() {
    println!("Commands:");
    println!("  streams              list subject streams");
    println!("  search <text>        search the catalog (debounced)");
    println!("  stream <id|all>      set the stream filter");
    println!("  books                reload the catalog with the current query");
    println!("  requests             show borrow request history");
    println!("  request <book-id>    request a book");
    println!("  return <request-id>  return an approved book");
    println!("  dashboard            profile greeting and request counts");
    println!("  logout               end the session");
    println!("  quit                 leave");
}
