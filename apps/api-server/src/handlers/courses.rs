//! Course reference-data handlers.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_LIMIT: u64 = 100;

#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    pub query: Option<String>,
    pub limit: Option<u64>,
}

/// GET /courses/
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<CourseListQuery>,
) -> AppResult<HttpResponse> {
    let courses = state
        .courses
        .list(
            query.query.as_deref(),
            query.limit.unwrap_or(DEFAULT_LIMIT),
        )
        .await?;

    Ok(HttpResponse::Ok().json(courses))
}

/// GET /courses/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<i32>) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let course = state
        .courses
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {id} doesn't exist")))?;

    Ok(HttpResponse::Ok().json(course))
}
