use anyhow::Result;

use crate::context::AppContext;

pub fn select(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.store.add_repo_to_ui(id);
    print_ui(ctx);
    Ok(())
}

pub fn unselect(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.store.remove_repo_from_ui(id);
    print_ui(ctx);
    Ok(())
}

pub fn open_tab(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.store.open_tab(id);
    print_ui(ctx);
    Ok(())
}

pub fn close_tab(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.store.close_tab(id)?;
    print_ui(ctx);
    Ok(())
}

pub fn activate(ctx: &AppContext, id: &str) -> Result<()> {
    ctx.store.set_active(id)?;
    print_ui(ctx);
    Ok(())
}

pub fn move_tab(ctx: &AppContext, id: &str, index: usize) -> Result<()> {
    ctx.store.move_tab(id, index)?;
    print_ui(ctx);
    Ok(())
}

fn print_ui(ctx: &AppContext) {
    let ui = ctx.store.ui_view();
    println!("selected: {}", ui.selected_repos.join(", "));
    let tabs: Vec<String> = ui
        .open_tabs
        .iter()
        .map(|tab| {
            if ui.active_tab.as_ref() == Some(tab) {
                format!("[{}]", tab)
            } else {
                tab.clone()
            }
        })
        .collect();
    println!("tabs:     {}", tabs.join(" "));
}
