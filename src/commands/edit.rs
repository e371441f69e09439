use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use slotlink_core::codec;
use slotlink_core::organizer::OrganizerSession;

use super::load_config;
use crate::links;
use crate::render::Render;

pub fn run(link: &str, tz: Option<&str>) -> Result<()> {
    let reference = links::reference(link, "edit");

    // An unreadable edit link just means a blank form.
    let prefill = match codec::decode_for_edit(&reference) {
        Ok(prefill) => prefill,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring unreadable edit link");
            println!("{}", "Could not read this edit link; the form would start blank.".yellow());
            return Ok(());
        }
    };

    let tz = match tz {
        Some(name) => links::timezone(Some(name))?,
        None => prefill
            .organizer_timezone
            .as_deref()
            .and_then(|name| links::timezone(Some(name)).ok())
            .map_or_else(|| links::timezone(None), Ok)?,
    };

    println!("{}", prefill.render());
    println!();

    let mut session = OrganizerSession::new(tz, Utc::now(), load_config().grid_settings()?);
    session.apply_prefill(prefill);

    let mut keys: Vec<_> = session.selection().keys().copied().collect();
    keys.sort();
    println!("{} ({})", "Slots".bold(), tz.name());
    for key in &keys {
        let marker = if session.is_selectable(key) {
            "●".green().to_string()
        } else {
            "·".dimmed().to_string()
        };
        println!("  {} {}", marker, key);
    }
    if keys.is_empty() {
        println!("  {}", "(none)".dimmed());
    } else {
        println!();
        println!("{}", session.render());
    }

    Ok(())
}
