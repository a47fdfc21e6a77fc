//! Interactive REPL and one-shot command dispatch.
//!
//! Each command maps to one page or action of the auction marketplace:
//! the feed, a listing's detail page, bidding, selling, and profile
//! management. Failures are scoped to the command that triggered them:
//! a visible message for the user, a diagnostic on stderr, and a
//! transcript entry. In one-shot mode a failed command also fails the
//! process, so scripts can branch on the exit code.

use crate::api::{ApiClient, UreqTransport};
use crate::config::Config;
use crate::detail::{self, DetailPage};
use crate::error::ApiError;
use crate::feed::{self, MSG_LOAD_FAILED};
use crate::model::Media;
use crate::session::{self, FileStore, SessionStore};
use crate::transcript::Transcript;
use crate::Args;
use anyhow::{bail, Result};
use chrono::Utc;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::cell::RefCell;

pub struct Context {
    pub args: Args,
    pub config: Config,
    pub store: FileStore,
    pub transport: UreqTransport,
    pub transcript: RefCell<Transcript>,
    pub session_id: String,
}

impl Context {
    fn api(&self) -> ApiClient<'_> {
        ApiClient::new(&self.config.base_url, &self.store, &self.transport)
    }

    /// API key to persist at login: CLI flag wins over config/env.
    fn configured_api_key(&self) -> Option<String> {
        self.args
            .api_key
            .clone()
            .or_else(|| self.config.resolve_api_key())
    }
}

/// Outcome of one dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandStatus {
    Done,
    Failed,
    Exit,
}

pub fn run_once(ctx: &Context, line: &str) -> Result<()> {
    if handle_command(ctx, line) == CommandStatus::Failed {
        // The visible message was already printed; the exit code still
        // has to signal the failure to calling scripts.
        bail!("command failed: {}", line);
    }
    Ok(())
}

pub fn run_repl(ctx: Context) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("gavel - type 'help' for commands, 'exit' to quit");

    loop {
        match rl.readline("gavel> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;

                if handle_command(&ctx, line) == CommandStatus::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Dispatch one command line.
fn handle_command(ctx: &Context, line: &str) -> CommandStatus {
    let _ = ctx.transcript.borrow_mut().command(line);

    let parts: Vec<&str> = line.splitn(2, ' ').collect();
    let rest = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match parts[0] {
        "exit" | "quit" => CommandStatus::Exit,
        "help" => {
            print_help();
            CommandStatus::Done
        }
        "feed" => cmd_feed(ctx, rest),
        "show" => cmd_show(ctx, rest),
        "bid" => report(ctx, "bid", cmd_bid(ctx, rest)),
        "sell" => report(ctx, "sell", cmd_sell(ctx, rest)),
        "mine" => report(ctx, "mine", cmd_mine(ctx)),
        "credits" => report(ctx, "credits", cmd_credits(ctx)),
        "avatar" => report(ctx, "avatar", cmd_avatar(ctx, rest)),
        "login" => report(ctx, "login", cmd_login(ctx, rest)),
        "register" => report(ctx, "register", cmd_register(ctx, rest)),
        "logout" => report(ctx, "logout", cmd_logout(ctx)),
        "whoami" => {
            cmd_whoami(ctx);
            CommandStatus::Done
        }
        _ => {
            println!("Unknown command: {}. Type 'help' for commands.", parts[0]);
            CommandStatus::Failed
        }
    }
}

/// Render a command failure: visible message, stderr diagnostic, transcript.
fn report(ctx: &Context, context: &str, result: Result<()>) -> CommandStatus {
    match result {
        Ok(()) => CommandStatus::Done,
        Err(e) => {
            println!("{}", e);
            eprintln!("Error in {}: {:#}", context, e);
            let _ = ctx.transcript.borrow_mut().error(context, &e.to_string());
            CommandStatus::Failed
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  feed [query]                  - browse listings, optionally searched");
    println!("  show <id> [image#]            - open one listing's detail page");
    println!("  bid <id> <amount>             - place a bid on a listing");
    println!("  sell <title> | <description> | <endsAt> | <tag,tag> | <image-url>");
    println!("                                - create a new listing");
    println!("  mine                          - list your own listings");
    println!("  credits                       - show your credit balance");
    println!("  avatar <url>                  - update your profile avatar");
    println!("  login <email> <password>      - log in and store the session");
    println!("  register <name> <email> <password> [bio] - create an account");
    println!("  whoami                        - show session state");
    println!("  logout                        - drop the stored session");
    println!("  exit                          - quit");
}

fn cmd_feed(ctx: &Context, query: &str) -> CommandStatus {
    let api = ctx.api();
    let fetched = if query.is_empty() {
        api.read_listings(ctx.config.page_size, 1, None)
    } else {
        api.search_listings(query)
    };

    match fetched {
        Ok(listings) => {
            let view = feed::build_feed(&listings, Utc::now());
            println!("{}", feed::render_feed(&view));
            CommandStatus::Done
        }
        Err(e) => {
            println!("{}", MSG_LOAD_FAILED);
            eprintln!("Error populating listings: {:#}", e);
            let _ = ctx.transcript.borrow_mut().error("feed", &e.to_string());
            CommandStatus::Failed
        }
    }
}

fn cmd_show(ctx: &Context, args: &str) -> CommandStatus {
    let mut parts = args.split_whitespace();
    let id = parts.next().unwrap_or("");
    let image_index = parts.next().and_then(|s| s.parse::<usize>().ok());

    let api = ctx.api();
    let mut page = detail::load_detail(&api, id, Utc::now());
    if let (DetailPage::Loaded(view), Some(index)) = (&mut page, image_index) {
        view.select_image(index);
    }
    println!("{}", detail::render_detail(&page));
    match page {
        DetailPage::Loaded(_) => CommandStatus::Done,
        DetailPage::Error(_) => CommandStatus::Failed,
    }
}

fn cmd_bid(ctx: &Context, args: &str) -> Result<()> {
    session::require_authentication(&ctx.store)?;

    let mut parts = args.split_whitespace();
    let id = parts.next().unwrap_or("").to_string();
    if id.is_empty() {
        return Err(ApiError::MissingParameter("listing ID").into());
    }
    // Validated before any network call
    let amount = detail::parse_bid_amount(parts.next().unwrap_or(""))?;

    let api = ctx.api();
    let result = api.place_bid(&id, amount);
    let _ = ctx
        .transcript
        .borrow_mut()
        .bid(&id, amount, result.is_ok());
    result?;

    println!("Bid of {} USD placed successfully.", amount);
    // Re-fetch and re-render the whole listing; no incremental update.
    println!("{}", detail::render_detail(&detail::load_detail(&api, &id, Utc::now())));
    Ok(())
}

fn cmd_sell(ctx: &Context, args: &str) -> Result<()> {
    session::require_authentication(&ctx.store)?;

    let fields: Vec<&str> = args.split('|').map(|f| f.trim()).collect();
    if fields.len() < 5 || fields[..3].iter().any(|f| f.is_empty()) || fields[4].is_empty() {
        println!("Please fill out all required fields.");
        println!("Usage: sell <title> | <description> | <endsAt> | <tag,tag> | <image-url>");
        return Ok(());
    }

    let tags: Vec<String> = fields[3]
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    let api = ctx.api();
    let created = api.create_listing(&crate::api::listings::NewListing {
        title: fields[0].to_string(),
        description: fields[1].to_string(),
        ends_at: fields[2].to_string(),
        tags,
        media: vec![Media {
            url: fields[4].to_string(),
            alt: None,
        }],
    })?;

    let _ = ctx
        .transcript
        .borrow_mut()
        .listing_created(&created.id, &created.title);
    println!("Listing created successfully! id: {}", created.id);
    Ok(())
}

fn cmd_mine(ctx: &Context) -> Result<()> {
    session::require_authentication(&ctx.store)?;

    let api = ctx.api();
    let listings = api.read_listings_by_user(ctx.config.page_size, 1)?;
    if listings.is_empty() {
        println!("You have no listings.");
        return Ok(());
    }

    for listing in &listings {
        let image = listing
            .primary_media()
            .map(|m| m.url.as_str())
            .unwrap_or("/images/default-image.jpg");
        let high_bid = match listing.current_high_bid() {
            Some(amount) => format!("{} USD", amount),
            None => "No bids yet".to_string(),
        };
        println!(
            "{}  [{}]\n  Ends: {}   Highest bid: {}\n  Image: {}",
            listing.title,
            listing.id,
            listing.ends_at.format("%Y-%m-%d"),
            high_bid,
            image
        );
    }
    Ok(())
}

fn cmd_credits(ctx: &Context) -> Result<()> {
    let username = ctx.store.profile_name().ok_or(ApiError::MissingUser)?;
    let credits = ctx.api().fetch_user_credits(&username)?;
    println!("{}p", credits);
    Ok(())
}

fn cmd_avatar(ctx: &Context, url: &str) -> Result<()> {
    session::require_authentication(&ctx.store)?;
    if url.is_empty() {
        return Err(ApiError::MissingParameter("avatar URL").into());
    }

    ctx.api().update_avatar(url)?;
    println!("Avatar updated.");
    Ok(())
}

fn cmd_login(ctx: &Context, args: &str) -> Result<()> {
    let mut parts = args.split_whitespace();
    let (email, password) = match (parts.next(), parts.next()) {
        (Some(email), Some(password)) => (email.to_string(), password.to_string()),
        _ => {
            println!("Usage: login <email> <password>");
            return Ok(());
        }
    };

    let api = ctx.api();
    let outcome = api.login(
        &crate::api::auth::Credentials {
            email: email.clone(),
            password,
        },
        ctx.configured_api_key().as_deref(),
    )?;

    let _ = ctx.transcript.borrow_mut().login(&email, outcome.ok);
    println!("{}", outcome.message);
    Ok(())
}

fn cmd_register(ctx: &Context, args: &str) -> Result<()> {
    let mut parts = args.splitn(4, ' ');
    let (name, email, password) = match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(email), Some(password))
            if !name.is_empty() && !email.is_empty() && !password.is_empty() =>
        {
            (name.to_string(), email.to_string(), password.to_string())
        }
        _ => {
            println!("Usage: register <name> <email> <password> [bio]");
            return Ok(());
        }
    };
    let bio = parts
        .next()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    let outcome = ctx.api().register(&crate::api::auth::RegisterDetails {
        name: name.clone(),
        email,
        password,
        bio,
        banner: None,
        avatar: None,
    })?;

    let _ = ctx.transcript.borrow_mut().register(&name, outcome.ok);
    println!("{}", outcome.message);
    if outcome.ok {
        println!("Log in with 'login <email> <password>'.");
    }
    Ok(())
}

fn cmd_logout(ctx: &Context) -> Result<()> {
    ctx.api().logout()?;
    let _ = ctx.transcript.borrow_mut().logout();
    println!("You have been logged out.");
    Ok(())
}

fn cmd_whoami(ctx: &Context) {
    if session::is_authenticated(&ctx.store) {
        match ctx.store.profile_name() {
            Some(name) => println!("Logged in as: {}", name),
            None => println!("Logged in (no cached profile)"),
        }
    } else {
        println!("Not logged in.");
    }
    println!("Session: {}", ctx.session_id);
    println!("Transcript: {:?}", ctx.transcript.borrow().path);
    println!("Store: {:?}", ctx.store.path());
    println!("API: {}", ctx.config.base_url);
}
