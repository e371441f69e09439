use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use slotlink_core::organizer::OrganizerSession;

use super::{load_config, parse_date};
use crate::links;
use crate::render::Render;

pub fn run(date: Option<&str>, tz: Option<&str>, weekends: bool, edit: Option<&str>) -> Result<()> {
    let config = load_config();
    let tz = links::timezone(tz)?;

    let mut settings = config.grid_settings()?;
    settings.show_weekends |= weekends;
    let mut session = OrganizerSession::new(tz, Utc::now(), settings);

    if let Some(edit) = edit {
        let reference = links::reference(edit, "edit");
        if !session.load_edit(&reference) {
            eprintln!("{}", "Could not read the edit link; showing an empty grid.".yellow());
        }
    }

    if let Some(date) = date {
        session.go_to_week_of(parse_date(date)?);
    }

    println!("{}", session.render());
    Ok(())
}
