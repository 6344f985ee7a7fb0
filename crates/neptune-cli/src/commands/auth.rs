use anyhow::Result;

use crate::context::AppContext;

pub async fn login(ctx: &AppContext) -> Result<()> {
    println!("Opening GitHub in your browser...");
    let user = ctx.auth_service()?.login().await?;
    println!("Signed in as {} ({})", user.display_name(), user.login);
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.auth_service()?.logout().await;
    println!("Signed out");
    Ok(())
}

/// Revalidates the stored token, then reports the session.
pub async fn status(ctx: &AppContext) -> Result<()> {
    ctx.auth_service()?.try_auto_login().await;

    let session = ctx.store.session_view();
    match &session.user {
        Some(user) if session.has_token => {
            println!("Signed in as {} ({}), plan: {}", user.display_name(), user.login, session.plan);
        }
        _ => println!("Not signed in"),
    }
    Ok(())
}
