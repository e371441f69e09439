//! Terminal rendering for slotlink types.
//!
//! Extension traits that add colored output to slotlink-core types using
//! owo_colors.

use owo_colors::OwoColorize;
use slotlink_core::codec::EditPrefill;
use slotlink_core::local_time::LocalSlotKey;
use slotlink_core::organizer::OrganizerSession;
use slotlink_core::payload::SchedulingPayload;
use slotlink_core::presenter::DateGroup;
use slotlink_core::validation::ValidationErrors;

/// Width of one day column in the week grid
const COLUMN_WIDTH: usize = 8;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for DateGroup {
    fn render(&self) -> String {
        let mut lines = vec![self.date_label.bold().to_string()];
        for slot in &self.slots {
            lines.push(format!(
                "  {} {}",
                format!("[{}]", slot.index).dimmed(),
                slot.label
            ));
        }
        lines.join("\n")
    }
}

impl Render for SchedulingPayload {
    fn render(&self) -> String {
        let mut lines = vec![
            format!("📅 {}", self.title.bold()),
            format!("   with {} · {}", self.organizer_name, self.duration),
        ];
        if let Some(link) = &self.video_link {
            lines.push(format!("   {}", link.dimmed()));
        }
        lines.join("\n")
    }
}

impl Render for EditPrefill {
    fn render(&self) -> String {
        let field = |label: &str, value: &str| {
            let value = if value.trim().is_empty() {
                "(blank)".dimmed().to_string()
            } else {
                value.to_string()
            };
            format!("  {:<10} {}", label.dimmed(), value)
        };

        [
            field("Title", &self.title),
            field("Name", &self.organizer_name),
            field("Email", &self.organizer_email),
            field("Duration", &self.duration.to_string()),
            field("Video", &self.video_link),
            field("Timezone", self.organizer_timezone.as_deref().unwrap_or("")),
        ]
        .join("\n")
    }
}

impl Render for ValidationErrors {
    fn render(&self) -> String {
        self.errors()
            .iter()
            .map(|e| format!("  {} {}", format!("{}:", e.field.as_str()).red(), e.message))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The visible week as a table: selected cells green, past cells dimmed.
impl Render for OrganizerSession {
    fn render(&self) -> String {
        let days = self.visible_days();
        let mut lines = Vec::new();

        lines.push(format!(
            "{} {}",
            self.week_label().bold(),
            format!("({})", self.timezone().name()).dimmed()
        ));

        let mut header = " ".repeat(6);
        for day in &days {
            let label = format!("{:^COLUMN_WIDTH$}", day.header());
            header.push_str(&if day.is_today {
                label.bold().underline().to_string()
            } else {
                label
            });
        }
        lines.push(header);

        for slot in self.time_slots() {
            let mut row = format!("{:<6}", slot.label).dimmed().to_string();
            for day in &days {
                let key = LocalSlotKey::new(day.date, slot.time());
                row.push_str(&cell(self, &key));
            }
            lines.push(row);
        }

        lines.push(format!(
            "{} selected",
            self.selected_count().to_string().green()
        ));
        lines.join("\n")
    }
}

fn cell(session: &OrganizerSession, key: &LocalSlotKey) -> String {
    let text = |symbol: &str| format!("{:^COLUMN_WIDTH$}", symbol);
    if session.is_selected(key) {
        text("●").green().to_string()
    } else if session.is_selectable(key) {
        text("○")
    } else {
        text("·").dimmed().to_string()
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
