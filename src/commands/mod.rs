pub mod events;
pub mod status;
pub mod sync;

use std::path::Path;

use anyhow::{Context as _, Result, anyhow};
use calsync_core::config::CalsyncConfig;
use calsync_core::date_range::DateRange;
use calsync_core::event::Event;
use calsync_core::ics;
use calsync_core::reconcile::{ActionPlan, reconcile};
use calsync_core::remote::{Remote, RemoteCalendar};
use calsync_core::sync::prepare_source_events;
use calsync_core::TimezoneResolver;
use owo_colors::OwoColorize;

use crate::feed;
use crate::render::Render;
use crate::utils::tui;

/// Loaded configuration shared by all commands.
pub struct Context {
    pub config: CalsyncConfig,
    pub resolver: TimezoneResolver,
}

/// Where to read events from and which days to consider.
pub struct Source {
    pub feed: String,
    pub range: DateRange,
}

impl Context {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = CalsyncConfig::load(config_path)?;
        let resolver = config.resolver();
        Ok(Context { config, resolver })
    }

    pub fn source(
        &self,
        feed: Option<String>,
        from: Option<String>,
        to: Option<String>,
    ) -> Result<Source> {
        let feed = feed.or_else(|| self.config.feed_url.clone()).ok_or_else(|| {
            anyhow!(
                "No feed configured.\n\n\
                Pass one with:\n  \
                calsync <command> --feed https://example.com/calendar.ics\n\n\
                or set feed_url in {}",
                config_location()
            )
        })?;
        let range = DateRange::from_args(
            from.as_deref(),
            to.as_deref(),
            self.config.sync_days_past,
            self.config.sync_days_future,
        )?;
        Ok(Source { feed, range })
    }

    pub fn remote(&self) -> Result<&Remote> {
        self.config.remote.as_ref().ok_or_else(|| {
            anyhow!(
                "No remote calendar configured.\n\n\
                Add a [remote] table with a provider to {}",
                config_location()
            )
        })
    }
}

fn config_location() -> String {
    CalsyncConfig::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "~/.config/calsync/config.toml".into())
}

/// Fetch and parse the feed, keeping events inside the sync window.
pub async fn load_feed(ctx: &Context, source: &Source) -> Result<Vec<Event>> {
    let spinner = tui::create_spinner(format!("Fetching {}", source.feed));
    let text = feed::fetch_text(&source.feed).await;
    spinner.finish_and_clear();

    let report = ics::parse_with_report(&text?)
        .with_context(|| format!("Could not parse {}", source.feed))?;
    println!("{}", report.render());

    Ok(prepare_source_events(
        report.events,
        &source.range,
        &ctx.resolver,
    ))
}

/// Connect to the remote calendar and reconcile the feed against it.
pub async fn plan(ctx: &Context, source: &Source) -> Result<ActionPlan> {
    let events = load_feed(ctx, source).await?;
    let remote = ctx.remote()?;

    let spinner = tui::create_spinner(format!("Connecting to {}", remote.provider.name()));
    let identity = remote.check_connection().await;
    spinner.finish_and_clear();
    let identity = identity.context("Remote calendar is unreachable")?;
    println!("{} {}", "Connected as".dimmed(), identity);

    let spinner = tui::create_spinner("Listing remote events".into());
    let remote_events = remote.list(&source.range).await;
    spinner.finish_and_clear();
    let remote_events = remote_events?;

    let plan = reconcile(
        &events,
        &remote_events,
        ctx.config.tolerances(),
        &ctx.resolver,
    );

    let counts = ctx.resolver.counts();
    if counts.fallbacks() > 0 {
        tracing::info!(
            default_zone = counts.default_zone,
            system_local = counts.system_local,
            unknown_zone_names = counts.unknown_zone_names,
            nonexistent_local_times = counts.nonexistent_local_times,
            "Timezone fallbacks used"
        );
    }

    Ok(plan)
}
