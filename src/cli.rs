use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Desktop-companion backend for browsing beads issues.
///
/// bealin serves a small REST + SSE API over a project's `.beads` data files
/// (issues JSONL plus the dependency database) for the Kanban web UI.
#[derive(Parser, Debug)]
#[command(
    name = "bealin",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the backend server.
    Serve {
        /// Address to bind.
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on.
        #[arg(long, env = "PORT", default_value_t = 4000)]
        port: u16,
    },

    /// Register a beads project and print it.
    AddProject {
        /// Path to the project folder (the one containing `.beads/`).
        path: PathBuf,

        /// Display name; defaults to the folder name.
        #[arg(long)]
        name: Option<String>,
    },

    /// List registered projects.
    Projects,
}
