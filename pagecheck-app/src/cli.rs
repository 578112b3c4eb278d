use clap::{Parser, Subcommand, ValueEnum};
use pagecheck_store::SiteId;
use std::path::PathBuf;

/// Register web pages and record their SEO signals over time.
#[derive(Debug, Parser)]
#[command(name = "pagecheck", version, about)]
pub struct Cli {
    /// Config file; when omitted `pagecheck.yaml` is read if present.
    #[arg(long, global = true, env = "PAGECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a page by URL (reduced to scheme://host).
    Register { url: String },
    /// Fetch a registered site now and record a check.
    Check { site_id: SiteId },
    /// List sites, newest first, with their latest check.
    Sites,
    /// Show one site and its check history.
    Show { site_id: SiteId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
