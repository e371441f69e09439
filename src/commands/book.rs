use anyhow::Result;
use owo_colors::OwoColorize;
use slotlink_core::codec;
use slotlink_core::presenter::{AttendeeView, BookingSubmission, ScheduleRef};

use super::load_config;
use crate::client::Client;
use crate::links;

pub async fn run(
    link: &str,
    slot: usize,
    name: &str,
    email: &str,
    server: Option<&str>,
) -> Result<()> {
    let config = load_config();
    let server = match server {
        Some(server) => links::server_url(server)?,
        None => links::server_url(&config.server_addr())?,
    };
    let reference = links::reference(link, "book");

    let submission = match codec::decode_for_booking(&reference) {
        Ok(payload) => {
            let tz = links::timezone(None)?;
            let view = AttendeeView::new(payload, tz);
            let selected = view.select(slot)?;
            println!("Booking {}", selected.summary.bold());
            view.booking_submission(
                ScheduleRef::Token {
                    booking_data: reference.clone(),
                },
                &selected,
                name,
                email,
            )?
        }
        // Not a token: let the service resolve it as a stored booking id.
        Err(_) => BookingSubmission {
            schedule: ScheduleRef::BookId {
                book_id: reference.clone(),
            },
            slot_index: slot,
            attendee_name: name.trim().to_string(),
            attendee_email: email.trim().to_string(),
        },
    };

    let response = Client::new(server).book(&submission).await?;
    if !response.success {
        for error in &response.errors {
            eprintln!("  {} {}", format!("{}:", error.field).red(), error.message);
        }
        anyhow::bail!("{}", response.message);
    }

    println!("{}", response.message.green());
    Ok(())
}
