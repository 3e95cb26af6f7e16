//! Semester reference-data handlers.

use actix_web::{HttpResponse, web};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /semesters/ - newest first.
pub async fn list(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let semesters = state.semesters.list_desc().await?;
    Ok(HttpResponse::Ok().json(semesters))
}

/// GET /semesters/current - the highest-id semester.
pub async fn current(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let semester = state
        .semesters
        .current()
        .await?
        .ok_or_else(|| AppError::NotFound("No semesters exist".to_string()))?;

    Ok(HttpResponse::Ok().json(semester))
}
