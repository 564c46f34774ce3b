//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::models::FormattingMode;
use crate::storage::config::{ConfigOverrides, SessionBackendKind};

/// Client for the streaming AI document-formatting service.
#[derive(Parser, Debug)]
#[command(name = "docstream")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // === Global flags ===
    /// Output format
    #[arg(long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Log level
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Emit JSONL logs to stderr
    #[arg(long, global = true)]
    pub json_output: bool,

    /// Verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API base URL
    #[arg(long, value_name = "URL", global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds (streaming reads use the idle timeout)
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Where the session is stored
    #[arg(long, value_enum, value_name = "BACKEND", global = true)]
    pub session_backend: Option<SessionBackendKind>,

    /// Config file path
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Resolve the effective output format.
    #[must_use]
    pub const fn effective_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }

    /// Configuration values given on the command line.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config.clone(),
            base_url: self.base_url.clone(),
            timeout_seconds: self.timeout,
            session_backend: self.session_backend,
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login(LoginArgs),

    /// Revoke the session on the server and forget it locally
    Logout,

    /// Show the logged-in account
    Whoami(WhoamiArgs),

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Format a document, streaming the result to stdout
    Format(FormatArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments for the `login` command.
#[derive(Parser, Debug)]
pub struct LoginArgs {
    /// Account email
    #[arg(long, value_name = "EMAIL")]
    pub email: String,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

/// Arguments for the `whoami` command.
#[derive(Parser, Debug)]
pub struct WhoamiArgs {
    /// Fetch the profile from the server instead of using the cached one
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments for the `format` command.
#[derive(Parser, Debug)]
pub struct FormatArgs {
    /// Document type (paper, proposal, report)
    #[arg(long, short, value_name = "MODE")]
    pub mode: Option<FormattingMode>,

    /// Source text file; `-` or omitted reads stdin
    #[arg(long, short, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Also write the final HTML to this file
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Save the HTML as formatted_<mode>_<millis>.html in this directory
    #[arg(long, value_name = "DIR")]
    pub save_dir: Option<PathBuf>,

    /// Save into the configured output directory
    #[arg(long, conflicts_with = "save_dir")]
    pub save: bool,

    /// Print the document as plain text once complete instead of streaming HTML
    #[arg(long)]
    pub plain: bool,

    /// Do not print the document
    #[arg(long, short, conflicts_with = "plain")]
    pub quiet: bool,
}

impl FormatArgs {
    /// Input path, `None` for stdin.
    #[must_use]
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_os_str() != "-")
    }
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,
    /// Print the resolved configuration and where each value came from
    Show,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
}
