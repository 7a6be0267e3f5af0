use anyhow::Result;
use owo_colors::OwoColorize;

use crate::commands::{self, Context, Source};
use crate::render::render_event_time;

pub async fn run(ctx: &Context, source: Source) -> Result<()> {
    let events = commands::load_feed(ctx, &source).await?;

    if events.is_empty() {
        println!("   {}", "No events in range".dimmed());
        return Ok(());
    }

    for event in &events {
        println!(
            "   {} {}",
            event,
            render_event_time(event, &ctx.resolver).dimmed()
        );
        if !event.location.is_empty() {
            println!("      {}", event.location.dimmed());
        }
    }

    Ok(())
}
