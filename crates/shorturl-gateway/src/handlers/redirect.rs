use crate::error::Result;
use crate::handlers::within_deadline;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Redirect;

/// `303 See Other` to the long URL behind `short_id`.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(short_id): Path<String>,
) -> Result<Redirect> {
    let long = within_deadline(&state, state.resolver().resolve(&short_id)).await?;
    Ok(Redirect::to(long.as_str()))
}
