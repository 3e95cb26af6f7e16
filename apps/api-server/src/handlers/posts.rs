//! Post handlers: the listing query, creation, threads, engagement, and
//! owner redaction.

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;

use studyhall_core::domain::{NewComment, NewPost};
use studyhall_core::query::PostFilter;
use studyhall_core::sanitize;
use studyhall_shared::dto::{NewCommentRequest, NewPostRequest};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn parse_date(name: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid {name} '{value}': expected YYYY-MM-DD")))
}

fn parse_id(name: &str, value: &str) -> Result<i32, AppError> {
    value
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {name} '{value}': expected an id")))
}

/// Fold raw query pairs into a typed filter. Repeated `courses[]` and
/// `categories[]` keys accumulate; unknown keys are ignored.
fn parse_filter(pairs: &[(String, String)]) -> Result<PostFilter, AppError> {
    let mut filter = PostFilter {
        page: 1,
        ..PostFilter::default()
    };

    for (key, value) in pairs {
        match key.as_str() {
            "courses[]" => filter.courses.push(parse_id("courses[]", value)?),
            "categories[]" => filter.categories.push(parse_id("categories[]", value)?),
            "query" => filter.query = Some(value.clone()),
            "sort" => filter.sort = value.parse()?,
            "start_date" => filter.start_date = Some(parse_date("start_date", value)?),
            "end_date" => filter.end_date = Some(parse_date("end_date", value)?),
            "page" => {
                filter.page = value.parse().map_err(|_| {
                    AppError::BadRequest(format!("Invalid page '{value}': expected a number"))
                })?;
            }
            _ => {}
        }
    }

    Ok(filter)
}

/// GET /posts/
pub async fn list(
    state: web::Data<AppState>,
    _identity: Identity,
    query: web::Query<Vec<(String, String)>>,
) -> AppResult<HttpResponse> {
    let filter = parse_filter(&query)?;
    let page = state.posts.search(&filter).await?;

    Ok(HttpResponse::Ok().json(page))
}

/// POST /posts/
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<NewPostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    state
        .categories
        .find_by_id(req.category_id)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest(format!("Category {} doesn't exist", req.category_id))
        })?;
    state
        .courses
        .find_by_id(req.course_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("Course {} doesn't exist", req.course_id)))?;

    // every post lands in the current semester
    let semester = state
        .semesters
        .current()
        .await?
        .ok_or_else(|| AppError::Internal("No semester has been seeded".to_string()))?;

    let thread = state
        .posts
        .create(NewPost {
            title: req.title,
            content: sanitize::clean(&req.content),
            due_date: req.due_date,
            author_id: identity.user_id,
            course_id: req.course_id,
            category_id: req.category_id,
            semester_id: semester.id,
        })
        .await?;

    Ok(HttpResponse::Created().json(thread))
}

/// GET /posts/{id}
pub async fn get(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let thread = state
        .posts
        .thread(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} doesn't exist")))?;

    Ok(HttpResponse::Ok().json(thread))
}

async fn sentinel_id(state: &AppState) -> AppResult<i32> {
    let sentinel = state
        .users
        .find_by_email(&state.settings.sentinel_email)
        .await?
        .ok_or_else(|| AppError::Internal("Sentinel deleted account is missing".to_string()))?;
    Ok(sentinel.id)
}

/// DELETE /posts/{id}
///
/// Owner redaction: the row survives with its content replaced and its
/// author handed to the sentinel account.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} doesn't exist")))?;

    if post.author_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    state.posts.redact_post(id, sentinel_id(&state).await?).await?;

    let thread = state
        .posts
        .thread(id)
        .await?
        .ok_or_else(|| AppError::Internal("Redacted post vanished".to_string()))?;

    Ok(HttpResponse::Ok().json(thread))
}

/// POST /posts/{id}/comments/
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i32>,
    body: web::Json<NewCommentRequest>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    let post = state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} doesn't exist")))?;

    if post.is_archived {
        return Err(AppError::BadRequest(format!(
            "Post {id} is archived and cannot be commented on"
        )));
    }

    state
        .posts
        .add_comment(NewComment {
            content: sanitize::clean(&body.content),
            post_id: id,
            author_id: identity.user_id,
        })
        .await?;

    let thread = state
        .posts
        .thread(id)
        .await?
        .ok_or_else(|| AppError::Internal("Commented post vanished".to_string()))?;

    Ok(HttpResponse::Ok().json(thread))
}

/// DELETE /posts/{id}/comments/{cid}
pub async fn delete_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(i32, i32)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    let comment = state
        .posts
        .find_comment(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id} doesn't exist")))?;

    if comment.author_id != identity.user_id {
        return Err(AppError::Forbidden);
    }

    state
        .posts
        .redact_comment(comment_id, sentinel_id(&state).await?)
        .await?;

    let thread = state
        .posts
        .thread(post_id)
        .await?
        .ok_or_else(|| AppError::Internal("Commented post vanished".to_string()))?;

    Ok(HttpResponse::Ok().json(thread))
}

/// POST /posts/{id}/cheers/
///
/// Set-insert: cheering twice is a no-op, and there is no un-cheer.
pub async fn cheer(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} doesn't exist")))?;

    state.posts.cheer(id, identity.user_id).await?;

    let thread = state
        .posts
        .thread(id)
        .await?
        .ok_or_else(|| AppError::Internal("Cheered post vanished".to_string()))?;

    Ok(HttpResponse::Ok().json(thread))
}

#[cfg(test)]
mod tests {
    use studyhall_core::query::PostSort;

    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_to_time_sort_on_page_one() {
        let filter = parse_filter(&[]).unwrap();

        assert_eq!(filter.page, 1);
        assert_eq!(filter.sort, PostSort::Time);
        assert!(filter.courses.is_empty());
        assert!(filter.query.is_none());
    }

    #[test]
    fn repeated_bracket_keys_accumulate() {
        let filter = parse_filter(&pairs(&[
            ("courses[]", "1"),
            ("courses[]", "2"),
            ("categories[]", "9"),
        ]))
        .unwrap();

        assert_eq!(filter.courses, vec![1, 2]);
        assert_eq!(filter.categories, vec![9]);
    }

    #[test]
    fn parses_dates_sort_and_page() {
        let filter = parse_filter(&pairs(&[
            ("start_date", "2018-01-15"),
            ("end_date", "2018-02-01"),
            ("sort", "activity"),
            ("page", "4"),
            ("query", "midterm"),
        ]))
        .unwrap();

        assert_eq!(filter.start_date, NaiveDate::from_ymd_opt(2018, 1, 15));
        assert_eq!(filter.end_date, NaiveDate::from_ymd_opt(2018, 2, 1));
        assert_eq!(filter.sort, PostSort::Activity);
        assert_eq!(filter.page, 4);
        assert_eq!(filter.query.as_deref(), Some("midterm"));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let err = parse_filter(&pairs(&[("start_date", "01/15/2018")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = parse_filter(&pairs(&[("end_date", "not-a-date")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unknown_sort_and_bad_ids_are_rejected() {
        assert!(matches!(
            parse_filter(&pairs(&[("sort", "newest")])),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_filter(&pairs(&[("courses[]", "abc")])),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let filter = parse_filter(&pairs(&[("utm_source", "newsletter")])).unwrap();
        assert_eq!(filter.page, 1);
    }
}
