use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;
use shared_types::{Entry, EntryDatesResponse, EntryResponse, SaveEntryRequest};

use crate::auth::CurrentUser;
use crate::dates::{parse_date, today_string};
use crate::error::{ApiError, ApiResult};
use crate::services::{self, EntryError};
use crate::AppState;

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// Send the user to today's page.
pub async fn root(State(state): State<AppState>) -> Response {
    let location = format!("/entries/{}", today_string(state.timezone));
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

// Entry handlers

/// Entry for a day. Days without a saved entry get a blank, unsaved one.
pub async fn show_entry(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(date): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    parse_date(&date, state.timezone)?;
    let editable = date == today_string(state.timezone);

    let response = match services::find_entry(state.entries.as_ref(), user.id, &date).await? {
        Some(entry) => EntryResponse::new(entry, editable, true),
        None => EntryResponse::new(Entry::blank(user.id, &date), editable, false),
    };

    Ok(Json(response))
}

/// Same as [`show_entry`], but only for today's page.
pub async fn edit_entry(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(date): Path<String>,
) -> ApiResult<Json<EntryResponse>> {
    parse_date(&date, state.timezone)?;
    if date != today_string(state.timezone) {
        return Err(EntryError::NotEditable.into());
    }

    let response = match services::find_entry(state.entries.as_ref(), user.id, &date).await? {
        Some(entry) => EntryResponse::new(entry, true, true),
        None => EntryResponse::new(Entry::blank(user.id, &date), true, false),
    };

    Ok(Json(response))
}

pub async fn save_entry(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(date): Path<String>,
    payload: Result<Json<SaveEntryRequest>, JsonRejection>,
) -> ApiResult<Json<EntryResponse>> {
    parse_date(&date, state.timezone)?;
    let Json(payload) =
        payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let today = today_string(state.timezone);

    let entry = services::save_entry(
        state.entries.as_ref(),
        user.id,
        &date,
        &payload.body,
        &today,
    )
    .await?;

    Ok(Json(EntryResponse::new(entry, true, true)))
}

/// Month calendar around the given day.
pub async fn show_calendar(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(date): Path<String>,
) -> ApiResult<Json<EntryDatesResponse>> {
    let reference = parse_date(&date, state.timezone)?;

    let calendar =
        services::month_calendar(state.entries.as_ref(), user.id, reference, Utc::now()).await?;

    Ok(Json(calendar))
}
