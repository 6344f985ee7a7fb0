use anyhow::Result;

use crate::context::AppContext;

/// Shows the commit author, updating whichever fields are given.
pub async fn author(ctx: &AppContext, name: Option<String>, email: Option<String>) -> Result<()> {
    let service = ctx.author_service()?;
    let mut author = service.load_or_create().await?;

    if name.is_some() || email.is_some() {
        if let Some(name) = name {
            author.author_name = name;
        }
        if let Some(email) = email {
            author.author_email = email;
        }
        service.save(&author)?;
    }

    println!("{} <{}>", author.author_name, author.author_email);
    Ok(())
}

pub fn paths(ctx: &AppContext) -> Result<()> {
    println!("{}", ctx.config_dir()?.display());
    Ok(())
}
