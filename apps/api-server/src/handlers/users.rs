//! Account lifecycle and enrollment handlers.

use actix_web::{HttpRequest, HttpResponse, web};

use studyhall_core::domain::{validate_institutional_email, validate_password, NewUser, User};
use studyhall_core::ports::{Job, JobPayload};
use studyhall_shared::dto::{
    ChangePasswordRequest, EmailRequest, LoginRequest, MessageResponse, RegisterRequest,
    RemoveAccountRequest, SessionResponse, TokenRequest,
};

use crate::middleware::auth::{Identity, bearer_token};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn verification_required(email: &str) -> AppError {
    AppError::BadRequest(format!(
        "The user {email} must verify their email address before logging in"
    ))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

async fn check_password(state: &AppState, user: &User, password: &str) -> AppResult<()> {
    let valid = state.passwords.verify(password, &user.password_hash)?;
    if !valid {
        return Err(invalid_credentials());
    }
    Ok(())
}

fn session_response(state: &AppState, user: &User) -> AppResult<SessionResponse> {
    let jwt = state.tokens.issue(user.id, &user.email)?;
    Ok(SessionResponse {
        email: user.email.clone(),
        jwt,
    })
}

/// POST /users/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    validate_institutional_email(&req.email, &state.settings.email_domain)?;
    validate_password(&req.password)?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::BadRequest(format!(
            "A user with email {} already exists",
            req.email
        )));
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = state
        .users
        .create(NewUser {
            email: req.email,
            password_hash,
        })
        .await?;

    state
        .jobs
        .enqueue(Job::new(&JobPayload::VerificationEmail {
            email: user.email.clone(),
        }))
        .await?;

    tracing::info!(user_id = user.id, "New account registered");

    Ok(HttpResponse::Created().json(MessageResponse::new(
        "Account created. Check your email for a verification link.",
    )))
}

/// POST /users/register/resend
pub async fn resend_verification(
    state: web::Data<AppState>,
    body: web::Json<EmailRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("No user with email {}", req.email)))?;

    if user.is_verified {
        return Err(AppError::BadRequest(format!(
            "The user {} is already verified",
            user.email
        )));
    }

    state
        .jobs
        .enqueue(Job::new(&JobPayload::VerificationEmail { email: user.email }))
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Verification email sent.")))
}

/// POST /users/register/verify
pub async fn verify_account(
    state: web::Data<AppState>,
    body: web::Json<TokenRequest>,
) -> AppResult<HttpResponse> {
    let user_id = state.tokens.verify_verification(&body.jwt)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

    state.users.set_verified(user.id).await?;

    tracing::info!(user_id = user.id, "Account verified");

    Ok(HttpResponse::Ok().json(session_response(&state, &user)?))
}

/// POST /users/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(invalid_credentials)?;

    check_password(&state, &user, &req.password).await?;

    if !user.is_verified {
        return Err(verification_required(&user.email));
    }

    Ok(HttpResponse::Ok().json(session_response(&state, &user)?))
}

/// POST /users/login/magic
///
/// Token-based login for the password-reset flow. Does not change the
/// verification flag.
pub async fn magic_login(
    state: web::Data<AppState>,
    body: web::Json<TokenRequest>,
) -> AppResult<HttpResponse> {
    let claims = state.tokens.verify(&body.jwt)?;

    let user = state
        .users
        .find_by_id(claims.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

    if !user.is_verified {
        return Err(verification_required(&user.email));
    }

    Ok(HttpResponse::Ok().json(session_response(&state, &user)?))
}

/// POST /users/refresh
///
/// Issues a new session token from the (possibly expired) token in the
/// Authorization header.
pub async fn refresh_session(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    let old_token = bearer_token(&req)?;

    let jwt = state.tokens.refresh(old_token)?;
    let claims = state.tokens.verify(&jwt)?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        email: claims.email,
        jwt,
    }))
}

/// POST /users/password/change
pub async fn change_password(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ChangePasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

    check_password(&state, &user, &req.old_password).await?;
    validate_password(&req.new_password)?;

    let password_hash = state.passwords.hash(&req.new_password)?;
    state.users.set_password_hash(user.id, &password_hash).await?;

    tracing::info!(user_id = user.id, "Password changed");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password updated.")))
}

/// POST /users/password/forgot
pub async fn forgot_password(
    state: web::Data<AppState>,
    body: web::Json<EmailRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("No user with email {}", req.email)))?;

    state
        .jobs
        .enqueue(Job::new(&JobPayload::PasswordResetEmail { email: user.email }))
        .await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Password reset email sent.")))
}

/// POST /users/remove
///
/// Schedules the asynchronous deletion job; the account is removed by the
/// background worker, not within this request.
pub async fn remove_account(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<RemoveAccountRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

    check_password(&state, &user, &req.password).await?;

    state
        .jobs
        .enqueue(Job::new(&JobPayload::AccountDeletion {
            user_id: user.id,
            remove_content: req.remove_content,
        }))
        .await?;

    tracing::info!(user_id = user.id, "Account deletion scheduled");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Account deletion has been scheduled.")))
}

/// GET /users/courses/
pub async fn my_courses(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let courses = state.users.courses(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(courses))
}

/// POST /users/courses/{id}
pub async fn enroll(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let course_id = path.into_inner();

    state
        .courses
        .find_by_id(course_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {course_id} doesn't exist")))?;

    state.users.enroll(identity.user_id, course_id).await?;

    let courses = state.users.courses(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(courses))
}

/// DELETE /users/courses/{id}
pub async fn withdraw(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let course_id = path.into_inner();

    state.users.withdraw(identity.user_id, course_id).await?;

    let courses = state.users.courses(identity.user_id).await?;
    Ok(HttpResponse::Ok().json(courses))
}
