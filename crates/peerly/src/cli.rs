//! Clap derive structures for the `peerly` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Also compiled by `build.rs`, so it may only depend on clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// peerly -- command-line client for the peer-review backend
#[derive(Debug, Parser)]
#[command(
    name = "peerly",
    version,
    about = "Work with peer-review courses, assignments and duties from the command line",
    long_about = "A CLI for the peer-review platform's REST backend.\n\n\
        Runs the same route guards, loaders and list pages as the terminal UI,\n\
        so what you can see here is what the web front-end would show you.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "PEERLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, short = 's', env = "PEERLY_SERVER", global = true)]
    pub server: Option<String>,

    /// Login name (overrides profile)
    #[arg(long, short = 'u', env = "PEERLY_USER", global = true)]
    pub user: Option<String>,

    /// Password (prefer the keyring or a profile's password_env)
    #[arg(long, env = "PEERLY_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Session token from an earlier login
    #[arg(long, env = "PEERLY_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "PEERLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "PEERLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (defaults to the config file's value)
    #[arg(long, env = "PEERLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and save the session token to the active profile
    Login(LoginArgs),

    /// Forget the saved session token
    Logout,

    /// Inspect the route table and open routes
    #[command(alias = "r")]
    Routes(RoutesArgs),

    /// Manage duties
    #[command(alias = "d")]
    Duties(DutiesArgs),

    /// Manage assignments
    #[command(alias = "a")]
    Assignments(AssignmentsArgs),

    /// Browse courses
    Courses(CoursesArgs),

    /// Review reports: show, grade, export
    Reviews(ReviewsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Login ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Do not write the token to the config file
    #[arg(long)]
    pub no_save: bool,
}

// ── Routes ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[command(subcommand)]
    pub command: RoutesCommand,
}

#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// List every route with its page, loader and access requirement
    #[command(alias = "ls")]
    List,

    /// Show how a path resolves, without contacting the server
    Resolve {
        /// Path, optionally with a query string
        path: String,

        /// Resolve as a logged-in user with this role ("Student", "TA", ...)
        #[arg(long = "as")]
        role: Option<String>,

        /// Acting user id for the simulated session
        #[arg(long, default_value = "1")]
        user_id: i64,
    },

    /// Navigate to a path: run the guard and loaders, print the page data
    Open {
        /// Path, optionally with a query string
        path: String,
    },
}

// ── Duties ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DutiesArgs {
    #[command(subcommand)]
    pub command: DutiesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DutiesCommand {
    /// List duties visible to you (yours first)
    #[command(alias = "ls")]
    List(TableArgs),

    /// Create a duty
    Create {
        /// Duty name (3 to 50 characters)
        #[arg(long)]
        name: String,

        /// Only visible to you
        #[arg(long)]
        private: bool,
    },

    /// Update a duty
    Update {
        /// Duty id
        id: i64,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Change visibility
        #[arg(long)]
        private: Option<bool>,
    },

    /// Delete a duty
    #[command(alias = "rm")]
    Delete {
        /// Duty id
        id: i64,
    },
}

// ── Assignments ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AssignmentsArgs {
    #[command(subcommand)]
    pub command: AssignmentsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AssignmentsCommand {
    /// List assignments
    #[command(alias = "ls")]
    List(TableArgs),

    /// Delete an assignment
    #[command(alias = "rm")]
    Delete {
        /// Assignment id
        id: i64,
    },
}

// ── Courses ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CoursesArgs {
    #[command(subcommand)]
    pub command: CoursesCommand,
}

#[derive(Debug, Subcommand)]
pub enum CoursesCommand {
    /// List a course's assignments
    Assignments {
        /// Course id
        course_id: i64,

        #[command(flatten)]
        table: TableArgs,
    },

    /// Run a row action on one of a course's assignments and print where it leads
    Action {
        /// Course id
        course_id: i64,

        /// Assignment id
        assignment_id: i64,

        /// Action id (edit, delete, add_participant, assign_reviewers, create_teams,
        /// view_review_report, view_scores, view_submissions, copy, export)
        action: String,
    },
}

// ── Reviews ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReviewsArgs {
    #[command(subcommand)]
    pub command: ReviewsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReviewsCommand {
    /// Show an assignment's review report
    Show {
        /// Assignment id
        assignment_id: i64,

        // --search matches reviewer name or username
        #[command(flatten)]
        table: TableArgs,
    },

    /// Assign a grade to one review
    Grade {
        /// Assignment id
        assignment_id: i64,

        /// Review row id
        review_id: i64,

        /// Grade from 0 to 100; empty clears it
        grade: String,

        /// Instructor comment
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Export a review report as CSV
    Export {
        /// Assignment id
        assignment_id: i64,

        /// Output file
        #[arg(long, short = 'f', default_value = "review_report.csv")]
        file: PathBuf,
    },
}

// ── Shared table arguments ───────────────────────────────────────────

/// Sorting, filtering and paging for table-backed list commands.
#[derive(Debug, Default, Args)]
pub struct TableArgs {
    /// Sort by column id; repeat to cycle (asc, desc)
    #[arg(long)]
    pub sort: Vec<String>,

    /// Column filter, `column=text`
    #[arg(long, short = 'f', value_name = "COLUMN=TEXT")]
    pub filter: Vec<String>,

    /// Text matched against every column
    #[arg(long, short = 'g')]
    pub search: Option<String>,

    /// Page number, starting at 1
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Show all rows instead of a single page
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Show a hidden column (e.g. "id")
    #[arg(long)]
    pub show: Vec<String>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (server, user_name, password_env, timeout, insecure)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile to store the password for (defaults to the active one)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
