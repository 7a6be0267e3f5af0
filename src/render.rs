//! TUI rendering traits for calsync types.
//!
//! Extension traits that add colored terminal rendering to calsync-core
//! types using owo_colors.

use calsync_core::TimezoneResolver;
use calsync_core::event::Event;
use calsync_core::ics::ParseReport;
use calsync_core::reconcile::{ActionKind, ActionPlan, Update};
use calsync_core::sync::SyncStats;
use chrono::Local;
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for ActionKind {
    fn render(&self) -> String {
        colorize(*self, self.symbol())
    }
}

fn colorize(kind: ActionKind, text: &str) -> String {
    match kind {
        ActionKind::Create => text.green().to_string(),
        ActionKind::Update => text.yellow().to_string(),
        ActionKind::Delete => text.red().to_string(),
    }
}

/// Start and end in the local zone, or the civil date for all-day events.
pub fn render_event_time(event: &Event, resolver: &TimezoneResolver) -> String {
    let Some(start) = &event.start else {
        return "(no start)".to_string();
    };

    if event.is_all_day {
        return format!("{} (all day)", start.civil_date().format("%Y-%m-%d"));
    }

    let start = resolver
        .to_absolute(start, &event.time_zone)
        .with_timezone(&Local);
    let Some(end) = &event.end else {
        return start.format("%Y-%m-%d %H:%M").to_string();
    };
    let end = resolver
        .to_absolute(end, &event.time_zone)
        .with_timezone(&Local);

    if start.date_naive() == end.date_naive() {
        format!("{} - {}", start.format("%Y-%m-%d %H:%M"), end.format("%H:%M"))
    } else {
        format!(
            "{} - {}",
            start.format("%Y-%m-%d %H:%M"),
            end.format("%Y-%m-%d %H:%M")
        )
    }
}

fn render_entry(kind: ActionKind, event: &Event, resolver: &TimezoneResolver) -> String {
    format!(
        "{} {} {}",
        kind.render(),
        colorize(kind, &event.to_string()),
        render_event_time(event, resolver).dimmed()
    )
}

fn render_changes(update: &Update) -> String {
    let fields: Vec<String> = update.changes.iter().map(|c| c.to_string()).collect();
    format!("{}: {}", "changed".dimmed(), fields.join(", "))
}

/// Threshold for compact view (show counts instead of individual events)
const COMPACT_THRESHOLD: usize = 10;

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

pub trait PlanRender {
    fn render(&self, resolver: &TimezoneResolver, verbose: bool) -> String;
}

impl PlanRender for ActionPlan {
    fn render(&self, resolver: &TimezoneResolver, verbose: bool) -> String {
        let mut lines = Vec::new();

        if self.is_empty() {
            lines.push("   No changes".dimmed().to_string());
        } else if verbose || self.operation_count() <= COMPACT_THRESHOLD {
            for event in &self.creates {
                lines.push(format!("   {}", render_entry(ActionKind::Create, event, resolver)));
            }
            for update in &self.updates {
                lines.push(format!(
                    "   {}",
                    render_entry(ActionKind::Update, &update.payload.event, resolver)
                ));
                lines.push(format!("      {}", render_changes(update)));
            }
            for remote in &self.deletes {
                lines.push(format!(
                    "   {}",
                    render_entry(ActionKind::Delete, &remote.event, resolver)
                ));
            }
        } else {
            for (kind, label) in [
                (ActionKind::Create, "new"),
                (ActionKind::Update, "changed"),
                (ActionKind::Delete, "removed"),
            ] {
                let count = self.count(kind);
                if count > 0 {
                    let text = format!("({} {} {})", count, label, pluralize("event", count));
                    lines.push(format!("   {} {}", kind.render(), colorize(kind, &text)));
                }
            }
        }

        for conflict in &self.conflicts {
            lines.push(format!(
                "   {} {} {}",
                "!".yellow(),
                conflict.source.to_string().yellow(),
                "matches an event calsync doesn't own, left alone".dimmed()
            ));
        }

        if verbose && !self.skips.is_empty() {
            lines.push(
                format!("   {} other remote events untouched", self.skips.len())
                    .dimmed()
                    .to_string(),
            );
        }

        lines.join("\n")
    }
}

impl Render for ParseReport {
    fn render(&self) -> String {
        let mut line = format!(
            "{} {} in feed",
            self.events.len(),
            pluralize("event", self.events.len())
        );
        if self.skipped_without_uid > 0 {
            line.push_str(&format!(", {} without UID skipped", self.skipped_without_uid));
        }
        if self.unterminated_blocks > 0 {
            line.push_str(&format!(", {} unterminated", self.unterminated_blocks));
        }

        let mut lines = vec![line.dimmed().to_string()];
        for diagnostic in &self.diagnostics {
            lines.push(format!("   {}", diagnostic.to_string().yellow()));
        }
        lines.join("\n")
    }
}

impl Render for SyncStats {
    fn render(&self) -> String {
        let mut lines = vec![format!(
            "{} created, {} updated, {} deleted, {} unchanged",
            self.created, self.updated, self.deleted, self.unchanged
        )];
        for failure in &self.failures {
            lines.push(format!("   {}", failure.to_string().red()));
        }
        lines.join("\n")
    }
}
