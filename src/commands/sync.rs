use anyhow::{Result, bail};
use calsync_core::sync::SyncExecutor;
use owo_colors::OwoColorize;

use crate::commands::{self, Context, Source};
use crate::render::{PlanRender, Render};
use crate::utils::tui;

pub async fn run(ctx: &Context, source: Source, dry_run: bool, verbose: bool) -> Result<()> {
    let plan = commands::plan(ctx, &source).await?;
    println!("{}", plan.render(&ctx.resolver, verbose));

    if plan.is_empty() {
        return Ok(());
    }

    let remote = ctx.remote()?;
    let spinner = tui::create_spinner(format!("Applying {} changes", plan.operation_count()));
    let stats = SyncExecutor::new(remote).dry_run(dry_run).apply(&plan).await;
    spinner.finish_and_clear();

    println!("\n{}", stats.render());
    if dry_run {
        println!("{}", "Dry run, nothing was changed".dimmed());
    }

    if !stats.is_clean() {
        bail!("{} of {} operations failed", stats.errors(), plan.operation_count());
    }

    Ok(())
}
