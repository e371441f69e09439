use anyhow::Result;
use owo_colors::OwoColorize;
use slotlink_core::codec;
use slotlink_core::payload::SchedulingPayload;
use slotlink_core::presenter::AttendeeView;

use crate::client::Client;
use crate::links;
use crate::render::Render;

const INVALID_LINK: &str = "This booking link appears to be invalid or corrupted. Please ask the organiser to send a new link.";

pub async fn run(link: &str, tz: Option<&str>, server: Option<&str>) -> Result<()> {
    let tz = links::timezone(tz)?;
    let reference = links::reference(link, "book");

    let Some(payload) = resolve(&reference, server).await? else {
        println!("{}", INVALID_LINK.red());
        return Ok(());
    };

    let view = AttendeeView::new(payload, tz);
    println!("{}", view.payload().render());
    println!();

    if !view.has_slots() {
        println!("{}", "No time slots are available.".yellow());
        return Ok(());
    }

    println!("{}", format!("Times shown in {}", tz.name()).dimmed());
    for group in view.group_by_local_date() {
        println!("{}", group.render());
    }

    Ok(())
}

/// Decode a token locally, or ask the booking service for a stored id.
pub async fn resolve(reference: &str, server: Option<&str>) -> Result<Option<SchedulingPayload>> {
    match codec::decode_for_booking(reference) {
        Ok(payload) => Ok(Some(payload)),
        Err(e) => {
            tracing::debug!(error = %e, "Not a booking token");
            let Some(server) = server else {
                return Ok(None);
            };
            let client = Client::new(links::server_url(server)?);
            let wire = client.schedule(reference).await?;
            Ok(Some(wire.into_payload()?))
        }
    }
}
