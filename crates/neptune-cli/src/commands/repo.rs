use anyhow::{Result, bail};

use crate::context::AppContext;

pub fn add(ctx: &AppContext, id: &str, name: &str) -> Result<()> {
    if ctx.store.add_repo(id, name) {
        println!("Added {} ({})", id, name);
    } else {
        println!("{} is already registered", id);
    }
    Ok(())
}

pub fn link(ctx: &AppContext, id: &str, path: &str) -> Result<()> {
    ctx.store.link_path(id, path)?;
    println!("Linked {} to {}", id, path);
    Ok(())
}

pub async fn load_dag(ctx: &AppContext, id: &str) -> Result<()> {
    let count = ctx.repo_service().load_dag(id).await?;
    println!("Loaded {} commits into {}", count, id);
    Ok(())
}

pub fn watch(ctx: &AppContext, id: &str, on: bool) -> Result<()> {
    ctx.store.set_watching(id, on)?;
    println!("{} watching: {}", id, on);
    Ok(())
}

pub fn authors(ctx: &AppContext, id: &str) -> Result<()> {
    let Some(repo) = ctx.store.repo(id) else {
        bail!("Unknown repo '{}'", id);
    };
    for author in repo.author_list {
        println!("{}", author);
    }
    Ok(())
}

pub fn commit(ctx: &AppContext, id: &str, sha: &str) -> Result<()> {
    let Some(commit) = ctx.store.get_commit(id, sha) else {
        bail!("No commit {} in '{}'", sha, id);
    };
    println!("{}", serde_json::to_string_pretty(&commit)?);
    Ok(())
}

pub fn list(ctx: &AppContext) -> Result<()> {
    let repos = ctx.store.local_repos_view();
    for id in repos.ids() {
        if let Some(repo) = repos.repo(&id) {
            println!(
                "{}\t{}\t{}\t{} commits{}",
                id,
                repo.repo_name,
                repo.local_path.as_deref().unwrap_or("-"),
                repo.commit_count(),
                if repo.is_watching { "\twatching" } else { "" }
            );
        }
    }
    Ok(())
}
