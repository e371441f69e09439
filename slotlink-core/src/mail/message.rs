//! Plain-text bodies for the three mails slotlink sends.

use chrono::{DateTime, Utc};

use super::{Attachment, Mailbox, OutgoingMail};
use crate::payload::MeetingDuration;

/// What a booking mail needs to describe the meeting.
#[derive(Debug, Clone, Copy)]
pub struct MeetingDetails<'a> {
    pub title: &'a str,
    pub organizer: &'a Mailbox,
    pub attendee: &'a Mailbox,
    pub start: DateTime<Utc>,
    pub duration: MeetingDuration,
    pub video_link: Option<&'a str>,
}

impl MeetingDetails<'_> {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.duration.as_duration()
    }

    /// "Monday, 15 January 2024 at 9:30 AM UTC – 10:00 AM UTC"
    pub fn when(&self) -> String {
        format!(
            "{} – {}",
            self.start.format("%A, %-d %B %Y at %-I:%M %p UTC"),
            self.end().format("%-I:%M %p UTC")
        )
    }
}

/// Confirmation to the attendee, with the invite attached.
pub fn attendee_confirmation(details: &MeetingDetails<'_>, ics: String) -> OutgoingMail {
    let mut body = format!(
        "Hi {attendee},\n\n\
         Your meeting with {organizer} has been scheduled. A calendar invite \
         (invite.ics) is attached; open it to add the event to your calendar.\n\n\
         Event:       {title}\n\
         Date & time: {when}\n\
         Duration:    {duration}\n\
         Organiser:   {organizer}\n",
        attendee = details.attendee.name,
        organizer = details.organizer.name,
        title = details.title,
        when = details.when(),
        duration = details.duration,
    );
    if let Some(link) = details.video_link {
        body.push_str(&format!("Video link:  {link}\n"));
    }
    body.push_str(&format!(
        "\nNeed to make a change? Reply to this email or contact {} directly.\n",
        details.organizer.name
    ));

    OutgoingMail {
        to: details.attendee.clone(),
        reply_to: Some(details.organizer.clone()),
        subject: format!("Confirmed: {}", details.title),
        body,
        attachments: vec![Attachment::calendar_invite(ics)],
    }
}

/// Heads-up to the organiser that a slot was taken.
pub fn organizer_notification(details: &MeetingDetails<'_>) -> OutgoingMail {
    let mut body = format!(
        "Hi {organizer},\n\n\
         {attendee} has booked a slot for {title}. Their confirmation email \
         and calendar invite have been sent automatically.\n\n\
         Attendee:       {attendee}\n\
         Attendee email: {email}\n\
         Event:          {title}\n\
         Date & time:    {when}\n\
         Duration:       {duration}\n",
        organizer = details.organizer.name,
        attendee = details.attendee.name,
        email = details.attendee.email,
        title = details.title,
        when = details.when(),
        duration = details.duration,
    );
    if let Some(link) = details.video_link {
        body.push_str(&format!("Video link:     {link}\n"));
    }
    body.push_str("\nAdd this time to your own calendar if needed.\n");

    OutgoingMail {
        to: details.organizer.clone(),
        reply_to: Some(details.attendee.clone()),
        subject: format!("New booking: {} — {}", details.attendee.name, details.title),
        body,
        attachments: Vec::new(),
    }
}

/// The organiser's personal edit link. Anyone holding it can edit the form.
pub fn organizer_edit_link(to: Mailbox, title: &str, edit_url: &str) -> OutgoingMail {
    let title = if title.trim().is_empty() { "your meeting" } else { title };
    let greeting = if to.name.trim().is_empty() { "there" } else { to.name.as_str() };

    let body = format!(
        "Hi {greeting},\n\n\
         Here is your personal edit link for {title}. Open it to re-open your \
         scheduling form with all your current slots pre-filled, update them, \
         then generate a new booking link to share.\n\n\
         {edit_url}\n\n\
         This link does not expire. Keep it safe: anyone with this link can \
         edit your scheduling form.\n"
    );

    OutgoingMail {
        subject: format!("Your booking edit link — {title}"),
        to,
        reply_to: None,
        body,
        attachments: Vec::new(),
    }
}
