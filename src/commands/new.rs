use anyhow::Result;
use chrono::Utc;
use owo_colors::OwoColorize;
use slotlink_core::SlotLinkError;
use slotlink_core::codec::WirePayload;
use slotlink_core::local_time::LocalSlotKey;
use slotlink_core::organizer::{OrganizerForm, OrganizerSession};
use slotlink_core::payload::MeetingDuration;

use super::load_config;
use crate::client::{Client, EditMailRequest};
use crate::links;
use crate::render::{Render, pluralize};

pub struct NewLink {
    pub title: String,
    pub name: String,
    pub email: String,
    pub duration: u32,
    pub link: Option<String>,
    pub tz: Option<String>,
    pub base_url: Option<String>,
    /// Create the schedule on this booking service instead of offline
    pub server: Option<String>,
    /// Mail the edit link to the organiser's address
    pub email_edit: bool,
    pub slots: Vec<String>,
}

pub async fn run(args: NewLink) -> Result<()> {
    let config = load_config();
    let tz = links::timezone(args.tz.as_deref())?;
    let duration = MeetingDuration::try_from(args.duration).map_err(|e| anyhow::anyhow!(e))?;

    let mut session = OrganizerSession::new(tz, Utc::now(), config.grid_settings()?);
    session.set_duration(duration);
    session.form = OrganizerForm {
        title: args.title,
        organizer_name: args.name,
        organizer_email: args.email,
        video_link: args.link.unwrap_or_default(),
    };

    let skipped = select_keys(&mut session, &args.slots)?;
    if !skipped.is_empty() {
        eprintln!(
            "{}",
            format!(
                "Skipped {} {} off the {}–{} grid or already past: {}",
                skipped.len(),
                pluralize("slot", skipped.len()),
                config.day_start,
                config.day_end,
                skipped.join(", ")
            )
            .yellow()
        );
    }

    let base_url = args.base_url.unwrap_or_else(|| config.base_url.clone());
    let generated = match session.generate_links(&base_url) {
        Ok(generated) => generated,
        Err(SlotLinkError::Validation(errors)) => {
            eprintln!("{}", errors.render());
            anyhow::bail!("Could not create links");
        }
        Err(e) => return Err(e.into()),
    };

    // Mailing the edit link needs a service even when the links are made here.
    let client = match (&args.server, args.email_edit) {
        (Some(server), _) => Some(Client::new(links::server_url(server)?)),
        (None, true) => Some(Client::new(links::server_url(&config.server_addr())?)),
        (None, false) => None,
    };

    let created = match (&client, args.server.is_some()) {
        (Some(client), true) => {
            let form = WirePayload::from(&session.to_payload());
            Some(client.create(&form).await?)
        }
        _ => None,
    };
    let (booking_url, edit_url) = match &created {
        Some(created) => (created.booking_url.as_str(), created.edit_url.as_str()),
        None => (generated.booking_url.as_str(), generated.edit_url.as_str()),
    };

    println!(
        "{} {} in {}",
        session.selected_count().to_string().green(),
        pluralize("slot", session.selected_count()),
        tz.name()
    );
    println!();
    println!("{}", "Booking link (share with attendees)".bold());
    println!("  {}", booking_url);
    println!("{}", "Edit link (keep private)".bold());
    println!("  {}", edit_url);

    if let (Some(client), true) = (&client, args.email_edit) {
        let email = session.form.organizer_email.trim();
        let request = EditMailRequest::new(email, created.as_ref(), &generated.token);
        let response = client.email_edit(&request).await?;
        if !response.success {
            for error in &response.errors {
                eprintln!("  {} {}", format!("{}:", error.field).red(), error.message);
            }
            anyhow::bail!("{}", response.message);
        }
        println!();
        println!("{}", response.message.green());
    }

    Ok(())
}

/// Select each key once; returns the keys that could not be selected.
fn select_keys(session: &mut OrganizerSession, keys: &[String]) -> Result<Vec<String>> {
    let mut skipped = Vec::new();
    for raw in keys {
        let key: LocalSlotKey = raw.parse()?;
        if session.is_selected(&key) {
            continue;
        }
        if session.tap(key).is_none() {
            skipped.push(key.to_string());
        }
    }
    Ok(skipped)
}
