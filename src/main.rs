use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bealin::cli::{Cli, Commands};
use bealin::config::ConfigStore;
use bealin::server::{self, AppState};
use bealin::watch::ChangeWatcher;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = ConfigStore::new()?;

    match cli.command {
        Commands::Serve { host, port } => {
            let state = AppState::new(config, ChangeWatcher::new());
            server::serve(&host, port, state).await
        }
        Commands::AddProject { path, name } => {
            let project = config.add_project(&path, name)?;
            println!("{}", serde_json::to_string_pretty(&project)?);
            Ok(())
        }
        Commands::Projects => {
            let app_config = config.load()?;
            for project in &app_config.projects {
                let marker = if app_config.active_project_id.as_deref() == Some(&project.id) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {}  {}  {}", project.id, project.name, project.path.display());
            }
            Ok(())
        }
    }
}
