use anyhow::Result;

use crate::commands::{self, Context, Source};
use crate::render::PlanRender;

pub async fn run(ctx: &Context, source: Source, json: bool, verbose: bool) -> Result<()> {
    let plan = commands::plan(ctx, &source).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        println!("{}", plan.render(&ctx.resolver, verbose));
    }

    Ok(())
}
