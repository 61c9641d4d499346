//! Command-line front end for the markstash bookmark store.
//!
//! # Responsibility
//! - Resolve the data directory and refuse to run against an ambiguous store.
//! - Map subcommands to core services and print their results.
//!
//! # Invariants
//! - Record output goes to stdout; prompts, diagnostics and errors go to stderr.
//! - Any failure exits with status 1 after printing one error line.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use log::info;
use markstash_core::db::{open_db, Connection};
use markstash_core::model::tags::split_tags;
use markstash_core::{
    canonicalize_tags, id_from_index, init_logging, init_stderr_logging, list_blank,
    search_keywords, search_regex, search_tags, tag_counts, target_from_index, BookmarkService,
    HttpTitleFetcher, NewBookmark, ReservedKeyword, SearchHit, SearchMode, SearchQuery,
    SqliteBookmarkRepository, TagRewriter, TagRewriteOutcome, TitleInput,
};

mod browser;
mod cli;
mod crypto;
mod error;
mod paths;
mod prompt;
mod render;

use cli::{Cli, Command, PromptArgs, WriteArgs};
use error::{CliError, CliResult};
use paths::{DataDir, StoreState};
use render::Renderer;

const LOG_ENV: &str = "MARKSTASH_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {err}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }
    init_cli_logging(cli.verbose, cli.log_dir.as_deref())?;

    let data_dir = DataDir::resolve(cli.data_dir.as_deref())?;
    let ctx = Context {
        data_dir,
        json: cli.json,
    };

    match cli.command {
        Command::Add(args) => cmd_add(&ctx, args),
        Command::Update(args) => cmd_update(&ctx, args),
        Command::Refresh(args) => cmd_refresh(&ctx, args),
        Command::Delete(args) => cmd_delete(&ctx, args),
        Command::Print(args) => cmd_print(&ctx, args),
        Command::Search(args) => cmd_search(&ctx, args),
        Command::Stag(args) => cmd_stag(&ctx, args),
        Command::Regex(args) => cmd_regex(&ctx, args),
        Command::Replace(args) => cmd_replace(&ctx, args),
        Command::Lock(args) => cmd_lock(&ctx, args),
        Command::Unlock => cmd_unlock(&ctx),
    }
}

struct Context {
    data_dir: DataDir,
    json: bool,
}

impl Context {
    fn connect(&self) -> CliResult<Connection> {
        let path = self.data_dir.open_path()?;
        Ok(open_db(path)?)
    }

    fn renderer(&self, fields: &[cli::Field]) -> Renderer {
        Renderer::new(self.json, fields)
    }
}

fn init_cli_logging(verbose: u8, log_dir: Option<&Path>) -> CliResult<()> {
    let level = match std::env::var(LOG_ENV) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
        .to_string(),
    };

    let started = match log_dir {
        Some(dir) => {
            let dir = if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                std::env::current_dir()?.join(dir)
            };
            init_logging(&level, &dir.to_string_lossy())
        }
        None => init_stderr_logging(&level),
    };
    started.map_err(CliError::Config)
}

fn title_input(title: Option<String>) -> TitleInput {
    match title {
        Some(title) => TitleInput::Manual(title),
        None => TitleInput::Fetch,
    }
}

fn new_bookmark(url: String, write: WriteArgs) -> NewBookmark {
    NewBookmark::new(url)
        .with_tags(write.tags)
        .with_title(title_input(write.title))
}

fn cmd_add(ctx: &Context, args: cli::AddArgs) -> CliResult<()> {
    let mut conn = ctx.connect()?;
    let repo = SqliteBookmarkRepository::try_new(&mut conn)?;
    let mut service = BookmarkService::new(repo, HttpTitleFetcher::default());

    let new = new_bookmark(args.url, args.write);
    let added = match args.insert_at {
        Some(index) => service.insert_at(id_from_index(index)?, &new)?,
        None => service.add(&new)?,
    };

    ctx.renderer(&[]).bookmarks(&mut io::stdout().lock(), &[added])
}

fn cmd_update(ctx: &Context, args: cli::UpdateArgs) -> CliResult<()> {
    let id = id_from_index(args.index)?;
    let mut conn = ctx.connect()?;
    let repo = SqliteBookmarkRepository::try_new(&mut conn)?;
    let mut service = BookmarkService::new(repo, HttpTitleFetcher::default());

    let updated = service.update(id, &new_bookmark(args.url, args.write))?;
    ctx.renderer(&[]).bookmarks(&mut io::stdout().lock(), &[updated])
}

fn cmd_refresh(ctx: &Context, args: cli::RefreshArgs) -> CliResult<()> {
    let target = target_from_index(args.index)?;
    let mut conn = ctx.connect()?;
    let repo = SqliteBookmarkRepository::try_new(&mut conn)?;
    let mut service = BookmarkService::new(repo, HttpTitleFetcher::default());

    let report = service.refresh_titles(target, &title_input(args.title))?;
    eprintln!(
        "{} titles updated, {} skipped",
        report.updated.to_string().green().bold(),
        report.skipped.to_string().yellow()
    );
    Ok(())
}

fn cmd_delete(ctx: &Context, args: cli::DeleteArgs) -> CliResult<()> {
    let target = target_from_index(args.index)?;
    let mut conn = ctx.connect()?;
    let repo = SqliteBookmarkRepository::try_new(&mut conn)?;
    let mut service = BookmarkService::new(repo, HttpTitleFetcher::default());

    let count = service.count()?;
    let yes = args.yes;
    let mut prompt_error = None;
    let removed = service.delete(target, || {
        if yes {
            return true;
        }
        let question = format!("Delete all {count} bookmarks?");
        match prompt::confirm(&mut io::stdin().lock(), &mut io::stderr(), &question) {
            Ok(answer) => answer,
            Err(err) => {
                prompt_error = Some(err);
                false
            }
        }
    })?;
    if let Some(err) = prompt_error {
        return Err(err.into());
    }

    eprintln!("{} deleted", removed.to_string().red().bold());
    Ok(())
}

fn cmd_print(ctx: &Context, args: cli::PrintArgs) -> CliResult<()> {
    let target = target_from_index(args.index)?;
    let mut conn = ctx.connect()?;
    let repo = SqliteBookmarkRepository::try_new(&mut conn)?;
    let service = BookmarkService::new(repo, HttpTitleFetcher::default());

    let bookmarks = service.get(target)?;
    ctx.renderer(&args.fields.fields)
        .bookmarks(&mut io::stdout().lock(), &bookmarks)
}

fn cmd_search(ctx: &Context, args: cli::SearchArgs) -> CliResult<()> {
    let conn = ctx.connect()?;
    let mode = search_mode(args.all);
    let query = SearchQuery::new(args.keywords, mode);
    let renderer = ctx.renderer(&args.fields.fields);

    match query.reserved() {
        Some(ReservedKeyword::Tags) => {
            let counts = tag_counts(&conn)?;
            renderer.tag_counts(&mut io::stdout().lock(), &counts)
        }
        Some(ReservedKeyword::Blank) => {
            let blank = list_blank(&conn)?;
            renderer.bookmarks(&mut io::stdout().lock(), &blank)
        }
        None => {
            let hits = search_keywords(&conn, &query)?;
            show_hits(ctx, &renderer, &hits, &args.prompt)
        }
    }
}

fn cmd_stag(ctx: &Context, args: cli::TagSearchArgs) -> CliResult<()> {
    let conn = ctx.connect()?;
    let canonical = canonicalize_tags(args.tags.as_slice());
    let tags = split_tags(&canonical).collect::<Vec<_>>();
    let hits = search_tags(&conn, tags.as_slice(), search_mode(args.all))?;
    show_hits(ctx, &ctx.renderer(&args.fields.fields), &hits, &args.prompt)
}

fn cmd_regex(ctx: &Context, args: cli::RegexArgs) -> CliResult<()> {
    let conn = ctx.connect()?;
    let hits = search_regex(&conn, &args.pattern)?;
    show_hits(ctx, &ctx.renderer(&args.fields.fields), &hits, &args.prompt)
}

fn cmd_replace(ctx: &Context, args: cli::ReplaceArgs) -> CliResult<()> {
    let mut conn = ctx.connect()?;
    let mut repo = SqliteBookmarkRepository::try_new(&mut conn)?;
    let replacement = (!args.new.is_empty()).then_some(args.new.as_slice());

    let outcome = TagRewriter::new(&mut repo).replace_tag(&args.old, replacement)?;
    match outcome {
        TagRewriteOutcome::Unchanged => eprintln!("old and new tags are the same; nothing to do"),
        TagRewriteOutcome::Rewritten { affected } => {
            eprintln!("{} bookmarks updated", affected.to_string().green().bold())
        }
    }
    Ok(())
}

fn cmd_lock(ctx: &Context, args: cli::LockArgs) -> CliResult<()> {
    match ctx.data_dir.store_state()? {
        StoreState::Plain => {}
        StoreState::Locked => return Err(CliError::Config("the store is already locked".into())),
        StoreState::Empty => return Err(CliError::Config("there is no store to lock".into())),
    }

    let password = prompt::new_password(prompt::read_password)?
        .ok_or_else(|| CliError::Config("passwords do not match".into()))?;

    crypto::lock_file(
        &ctx.data_dir.db_path(),
        &ctx.data_dir.locked_path(),
        &password,
        args.iterations,
    )?;
    eprintln!("{} {}", "locked".green().bold(), ctx.data_dir.locked_path().display());
    Ok(())
}

fn cmd_unlock(ctx: &Context) -> CliResult<()> {
    match ctx.data_dir.store_state()? {
        StoreState::Locked => {}
        StoreState::Plain | StoreState::Empty => {
            return Err(CliError::Config("the store is not locked".into()))
        }
    }

    let password = prompt::read_password("Password")?;
    crypto::unlock_file(&ctx.data_dir.locked_path(), &ctx.data_dir.db_path(), &password)?;
    eprintln!("{} {}", "unlocked".green().bold(), ctx.data_dir.db_path().display());
    Ok(())
}

fn search_mode(all: bool) -> SearchMode {
    if all {
        SearchMode::All
    } else {
        SearchMode::Any
    }
}

fn show_hits(
    ctx: &Context,
    renderer: &Renderer,
    hits: &[SearchHit],
    prompt: &PromptArgs,
) -> CliResult<()> {
    renderer.hits(&mut io::stdout().lock(), hits)?;
    info!("event=search module=cli status=ok hits={}", hits.len());

    let interactive = !prompt.no_prompt
        && !ctx.json
        && !hits.is_empty()
        && io::stdin().is_terminal()
        && io::stdout().is_terminal();
    if !interactive {
        return Ok(());
    }

    let opened = prompt::open_results(
        &mut io::stdin().lock(),
        &mut io::stderr(),
        hits,
        browser::open_url,
    )?;
    info!("event=search_open module=cli status=ok opened={opened}");
    Ok(())
}
