use anyhow::Result;
use neptune_infrastructure::dto::PersistedState;

use crate::context::AppContext;

/// Prints the whole store as its persisted projection.
pub fn show(ctx: &AppContext) -> Result<()> {
    let projection = ctx.store.read(|state| PersistedState::from(state));
    println!("{}", serde_json::to_string_pretty(&projection)?);
    Ok(())
}
