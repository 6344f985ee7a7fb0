use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod context;
mod logging;

use context::AppContext;
use neptune_infrastructure::NeptunePaths;

#[derive(Parser)]
#[command(name = "neptune")]
#[command(about = "Neptune - Git repository browser state and session tools", long_about = None)]
struct Cli {
    /// Use this directory instead of the platform config directory
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Keep the store in memory; nothing is written to neptune.json
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the persisted view of the store
    State,
    /// Manage local repositories
    Repo {
        #[command(subcommand)]
        action: RepoAction,
    },
    /// Sidebar selection
    Ui {
        #[command(subcommand)]
        action: UiAction,
    },
    /// Tab strip
    Tab {
        #[command(subcommand)]
        action: TabAction,
    },
    /// GitHub sign-in
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Local settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum RepoAction {
    /// List registered repositories
    List,
    /// Register a repository
    Add { id: String, name: String },
    /// Link a repository to a local checkout
    Link { id: String, path: String },
    /// Read the commit DAG from the linked checkout
    LoadDag { id: String },
    /// Toggle watching
    Watch {
        id: String,
        #[arg(long)]
        off: bool,
    },
    /// List commit authors
    Authors { id: String },
    /// Look up one commit
    Commit { id: String, sha: String },
}

#[derive(Subcommand)]
enum UiAction {
    Select { id: String },
    Unselect { id: String },
}

#[derive(Subcommand)]
enum TabAction {
    Open { id: String },
    Close { id: String },
    Activate { id: String },
    /// Move a tab; indexes past the end place it last
    Move { id: String, index: usize },
}

#[derive(Subcommand)]
enum AuthAction {
    Login,
    Logout,
    Status,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show or update the commit author
    Author {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Print the config directory
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = NeptunePaths::new(cli.config_dir.as_deref());
    let config = AppContext::load_config(&paths)?;
    let _log_guard = logging::init(&AppContext::logs_dir(&paths)?, &config.log_level);

    let ctx = AppContext::load(paths, config, cli.ephemeral).await?;
    let outcome = run(&ctx, cli.command).await;

    // Every mutation is queued; wait for the writes before exiting
    ctx.store.flush().await;
    outcome
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::State => commands::state::show(ctx)?,
        Commands::Repo { action } => match action {
            RepoAction::List => commands::repo::list(ctx)?,
            RepoAction::Add { id, name } => commands::repo::add(ctx, &id, &name)?,
            RepoAction::Link { id, path } => commands::repo::link(ctx, &id, &path)?,
            RepoAction::LoadDag { id } => commands::repo::load_dag(ctx, &id).await?,
            RepoAction::Watch { id, off } => commands::repo::watch(ctx, &id, !off)?,
            RepoAction::Authors { id } => commands::repo::authors(ctx, &id)?,
            RepoAction::Commit { id, sha } => commands::repo::commit(ctx, &id, &sha)?,
        },
        Commands::Ui { action } => match action {
            UiAction::Select { id } => commands::ui::select(ctx, &id)?,
            UiAction::Unselect { id } => commands::ui::unselect(ctx, &id)?,
        },
        Commands::Tab { action } => match action {
            TabAction::Open { id } => commands::ui::open_tab(ctx, &id)?,
            TabAction::Close { id } => commands::ui::close_tab(ctx, &id)?,
            TabAction::Activate { id } => commands::ui::activate(ctx, &id)?,
            TabAction::Move { id, index } => commands::ui::move_tab(ctx, &id, index)?,
        },
        Commands::Auth { action } => match action {
            AuthAction::Login => commands::auth::login(ctx).await?,
            AuthAction::Logout => commands::auth::logout(ctx).await?,
            AuthAction::Status => commands::auth::status(ctx).await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Author { name, email } => {
                commands::config::author(ctx, name, email).await?
            }
            ConfigAction::Path => commands::config::paths(ctx)?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["neptune", "tab", "move", "r1", "9", "--ephemeral"]).unwrap();
        assert!(cli.ephemeral);
        assert!(matches!(
            cli.command,
            Commands::Tab {
                action: TabAction::Move { index: 9, .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_commands_run_against_ephemeral_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let paths = NeptunePaths::new(Some(temp_dir.path()));
        let config = AppContext::load_config(&paths).unwrap();
        let ctx = AppContext::load(paths, config, true).await.unwrap();

        run(&ctx, Commands::Repo { action: RepoAction::Add { id: "r1".into(), name: "Demo".into() } })
            .await
            .unwrap();
        run(&ctx, Commands::Tab { action: TabAction::Open { id: "r1".into() } })
            .await
            .unwrap();
        ctx.store.flush().await;

        assert_eq!(ctx.store.ui_view().active_tab.as_deref(), Some("r1"));
        assert!(!temp_dir.path().join("neptune.json").exists());
    }
}
