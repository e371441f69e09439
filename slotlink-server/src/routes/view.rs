//! Page view models for the three link modes
//!
//! `?book=` shows the attendee's slot list, `?edit=` the pre-filled
//! organiser grid, and no parameter a blank grid for the current week.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use slotlink_core::calendar_week::CalendarDay;
use slotlink_core::codec::{self, EditPrefill};
use slotlink_core::local_time::parse_timezone;
use slotlink_core::mail::Mailer;
use slotlink_core::organizer::{OrganizerForm, OrganizerSession};
use slotlink_core::payload::MeetingDuration;
use slotlink_core::presenter::{AttendeeView, DateGroup};
use slotlink_core::time_grid::TimeSlot;

use crate::routes::AppError;
use crate::state::AppState;

const INVALID_LINK_NOTICE: &str = "This booking link appears to be invalid or corrupted. Please ask the organiser to send a new link.";

pub fn router<M: Mailer + 'static>() -> Router<AppState<M>> {
    Router::new().route("/view", get(view::<M>))
}

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub book: Option<String>,
    pub edit: Option<String>,
    /// Viewer's IANA zone; UTC when absent.
    pub tz: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GridView {
    pub timezone: String,
    pub week_start: String,
    pub week_label: String,
    pub duration: MeetingDuration,
    pub days: Vec<CalendarDay>,
    pub time_slots: Vec<TimeSlot>,
    pub selected: Vec<String>,
    pub has_week_slots: bool,
}

impl GridView {
    fn from_session(session: &OrganizerSession) -> Self {
        GridView {
            timezone: session.timezone().name().to_string(),
            week_start: session.week_start().to_string(),
            week_label: session.week_label(),
            duration: session.duration(),
            days: session.visible_days(),
            time_slots: session.time_slots().to_vec(),
            selected: session.selection().keys().map(ToString::to_string).collect(),
            has_week_slots: session.has_week_slots(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewModel {
    Book {
        title: String,
        organizer_name: String,
        duration: MeetingDuration,
        video_link: Option<String>,
        timezone: String,
        groups: Vec<DateGroup>,
    },
    InvalidLink {
        message: String,
    },
    Edit {
        form: OrganizerForm,
        grid: GridView,
    },
    Create {
        grid: GridView,
    },
}

/// GET /view?book=|edit=&tz= - What the page should render
async fn view<M: Mailer + 'static>(
    State(state): State<AppState<M>>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<ViewModel>, AppError> {
    let tz = match query.tz.as_deref() {
        Some(name) if !name.trim().is_empty() => parse_timezone(name)?,
        _ => chrono_tz::UTC,
    };

    if let Some(book) = query.book.as_deref() {
        return Ok(Json(book_view(&state, book, tz)));
    }

    let mut session = OrganizerSession::new(tz, Utc::now(), state.grid);

    let prefill = query
        .edit
        .as_deref()
        .and_then(|edit| edit_prefill(&state, edit));
    if let Some(prefill) = prefill {
        session.apply_prefill(prefill);
        return Ok(Json(ViewModel::Edit {
            form: session.form.clone(),
            grid: GridView::from_session(&session),
        }));
    }

    Ok(Json(ViewModel::Create {
        grid: GridView::from_session(&session),
    }))
}

fn book_view<M: Mailer>(state: &AppState<M>, reference: &str, tz: Tz) -> ViewModel {
    // A `book` value is either a stored id or a token.
    match state.resolver().resolve_booking(Some(reference), Some(reference)) {
        Ok(payload) => {
            let view = AttendeeView::new(payload, tz);
            let groups = view.group_by_local_date();
            let payload = view.payload();
            ViewModel::Book {
                title: payload.title.clone(),
                organizer_name: payload.organizer_name.clone(),
                duration: payload.duration,
                video_link: payload.video_link.clone(),
                timezone: tz.name().to_string(),
                groups,
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "Booking link could not be read");
            ViewModel::InvalidLink {
                message: INVALID_LINK_NOTICE.to_string(),
            }
        }
    }
}

/// Unreadable edit links fall back to a blank form.
fn edit_prefill<M: Mailer>(state: &AppState<M>, reference: &str) -> Option<EditPrefill> {
    if let Some(stored) = state.resolver().stored_by_edit_token(Some(reference)) {
        return Some(stored.schedule.into_prefill());
    }
    codec::decode_for_edit(reference)
        .inspect_err(|e| tracing::debug!(error = %e, "Ignoring unreadable edit link"))
        .ok()
}
