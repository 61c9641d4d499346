use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "markstash",
    version,
    about = "A personal bookmark store backed by SQLite"
)]
pub struct Cli {
    /// Override the XDG data directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Write rotating log files to this directory instead of stderr
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long = "nc", global = true)]
    pub no_color: bool,

    /// Output records as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a bookmark, fetching its title unless one is given
    Add(AddArgs),
    /// Replace url, tags and title of a bookmark
    Update(UpdateArgs),
    /// Re-fetch or overwrite titles (index 0 refreshes every bookmark)
    Refresh(RefreshArgs),
    /// Delete a bookmark (index 0 deletes every bookmark)
    Delete(DeleteArgs),
    /// Print one bookmark or the whole store
    Print(PrintArgs),
    /// Search url, title and tags for keywords (`tags` and `blank` are listings)
    Search(SearchArgs),
    /// Search bookmarks by whole tags
    Stag(TagSearchArgs),
    /// Search url, title and tags with a regular expression
    Regex(RegexArgs),
    /// Rename a tag across all bookmarks, or delete it when no new tag is given
    Replace(ReplaceArgs),
    /// Encrypt the store at rest
    Lock(LockArgs),
    /// Decrypt a locked store
    Unlock,
}

/// Tag, title and position options shared by write commands.
#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Tags; a token ending in `,` closes a tag, other tokens are joined with spaces
    #[arg(short, long = "tag", num_args = 1.., value_name = "TAG")]
    pub tags: Vec<String>,

    /// Use this title instead of fetching one (may be empty)
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub url: String,

    #[command(flatten)]
    pub write: WriteArgs,

    /// Store under this free index instead of the next one
    #[arg(long, value_name = "INDEX")]
    pub insert_at: Option<i64>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub index: i64,

    pub url: String,

    #[command(flatten)]
    pub write: WriteArgs,
}

#[derive(Debug, Args)]
pub struct RefreshArgs {
    #[arg(default_value_t = 0)]
    pub index: i64,

    /// Write this title instead of fetching
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub index: i64,

    /// Skip the confirmation prompt when deleting every bookmark
    #[arg(short, long)]
    pub yes: bool,
}

/// Field selection shared by listing commands.
#[derive(Debug, Args)]
pub struct FieldArgs {
    /// Comma-separated fields to show
    #[arg(long, value_delimiter = ',', value_enum)]
    pub fields: Vec<Field>,
}

/// Interactive result-opening switch shared by search commands.
#[derive(Debug, Args)]
pub struct PromptArgs {
    /// Do not prompt to open a result after searching
    #[arg(long = "np")]
    pub no_prompt: bool,
}

#[derive(Debug, Args)]
pub struct PrintArgs {
    #[arg(default_value_t = 0)]
    pub index: i64,

    #[command(flatten)]
    pub fields: FieldArgs,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true)]
    pub keywords: Vec<String>,

    /// Require every keyword to match
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub fields: FieldArgs,

    #[command(flatten)]
    pub prompt: PromptArgs,
}

#[derive(Debug, Args)]
pub struct TagSearchArgs {
    /// Tags, in the same token form accepted by `add --tag`
    #[arg(required = true)]
    pub tags: Vec<String>,

    /// Require every tag to be present
    #[arg(long)]
    pub all: bool,

    #[command(flatten)]
    pub fields: FieldArgs,

    #[command(flatten)]
    pub prompt: PromptArgs,
}

#[derive(Debug, Args)]
pub struct RegexArgs {
    pub pattern: String,

    #[command(flatten)]
    pub fields: FieldArgs,

    #[command(flatten)]
    pub prompt: PromptArgs,
}

#[derive(Debug, Args)]
pub struct ReplaceArgs {
    pub old: String,

    /// Replacement tags; omit to delete the old tag
    pub new: Vec<String>,
}

#[derive(Debug, Args)]
pub struct LockArgs {
    /// Key derivation rounds
    #[arg(default_value_t = crate::crypto::DEFAULT_ITERATIONS)]
    pub iterations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Field {
    Id,
    Url,
    Title,
    Tags,
}

impl Field {
    /// Record key used in JSON output.
    pub fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Url => "url",
            Self::Title => "title",
            Self::Tags => "tags",
        }
    }
}
