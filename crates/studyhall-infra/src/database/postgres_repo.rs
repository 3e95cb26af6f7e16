//! PostgreSQL repository implementations for users and reference data.

use async_trait::async_trait;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};

use studyhall_core::domain::{Category, Course, NewUser, Semester, User, REDACTION_MARKER};
use studyhall_core::error::RepoError;
use studyhall_core::ports::{
    CategoryRepository, CourseRepository, DeletionOutcome, SemesterRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment;
use super::entity::course::{self, Entity as CourseEntity};
use super::entity::post;
use super::entity::semester::{self, Entity as SemesterEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::entity::user_course;
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL course repository.
pub type PostgresCourseRepository = PostgresBaseRepository<CourseEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL semester repository.
pub type PostgresSemesterRepository = PostgresBaseRepository<SemesterEntity>;

fn query_err(e: sea_orm::DbErr) -> RepoError {
    RepoError::Query(e.to_string())
}

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            if local.len() > 1 {
                format!("{}***{}", &local[..1], domain)
            } else {
                format!("***{domain}")
            }
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, RepoError> {
        let model = user::ActiveModel {
            id: NotSet,
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            is_verified: Set(false),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            let err_str = e.to_string();
            if err_str.contains("duplicate") || err_str.contains("unique") {
                RepoError::Constraint("Email already registered".to_string())
            } else {
                RepoError::Query(err_str)
            }
        })?;

        Ok(model.into())
    }

    async fn set_verified(&self, user_id: i32) -> Result<(), RepoError> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::IsVerified, Expr::value(true))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn set_password_hash(&self, user_id: i32, password_hash: &str) -> Result<(), RepoError> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(password_hash))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn courses(&self, user_id: i32) -> Result<Vec<Course>, RepoError> {
        let course_ids: Vec<i32> = user_course::Entity::find()
            .filter(user_course::Column::UserId.eq(user_id))
            .select_only()
            .column(user_course::Column::CourseId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(query_err)?;

        let courses = CourseEntity::find()
            .filter(course::Column::Id.is_in(course_ids))
            .order_by_asc(course::Column::Name)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(courses.into_iter().map(Into::into).collect())
    }

    async fn enroll(&self, user_id: i32, course_id: i32) -> Result<(), RepoError> {
        user_course::Entity::insert(user_course::ActiveModel {
            user_id: Set(user_id),
            course_id: Set(course_id),
        })
        .on_conflict(
            OnConflict::columns([user_course::Column::UserId, user_course::Column::CourseId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&self.db)
        .await
        .map_err(query_err)?;

        Ok(())
    }

    async fn withdraw(&self, user_id: i32, course_id: i32) -> Result<(), RepoError> {
        user_course::Entity::delete_many()
            .filter(user_course::Column::UserId.eq(user_id))
            .filter(user_course::Column::CourseId.eq(course_id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }

    async fn reassign_content_and_delete(
        &self,
        user_id: i32,
        sentinel_id: i32,
        remove_content: bool,
    ) -> Result<DeletionOutcome, RepoError> {
        let txn = self.db.begin().await.map_err(query_err)?;

        // a retry after a completed run finds no row and stops here
        let existing = UserEntity::find_by_id(user_id)
            .one(&txn)
            .await
            .map_err(query_err)?;
        if existing.is_none() {
            txn.commit().await.map_err(query_err)?;
            return Ok(DeletionOutcome::AlreadyDeleted);
        }

        let mut posts = post::Entity::update_many()
            .col_expr(post::Column::AuthorId, Expr::value(sentinel_id));
        if remove_content {
            posts = posts.col_expr(post::Column::Content, Expr::value(REDACTION_MARKER));
        }
        posts
            .filter(post::Column::AuthorId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(query_err)?;

        let mut comments = comment::Entity::update_many()
            .col_expr(comment::Column::AuthorId, Expr::value(sentinel_id));
        if remove_content {
            comments = comments.col_expr(comment::Column::Content, Expr::value(REDACTION_MARKER));
        }
        comments
            .filter(comment::Column::AuthorId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(query_err)?;

        UserEntity::delete_by_id(user_id)
            .exec(&txn)
            .await
            .map_err(query_err)?;

        txn.commit().await.map_err(query_err)?;

        tracing::info!(user_id, remove_content, "Account content reassigned and user deleted");
        Ok(DeletionOutcome::Deleted)
    }
}

#[async_trait]
impl CourseRepository for PostgresCourseRepository {
    async fn list(&self, query: Option<&str>, limit: u64) -> Result<Vec<Course>, RepoError> {
        let mut select = CourseEntity::find();

        if let Some(q) = query {
            select = select.filter(course::Column::Name.contains(q));
        }

        let courses = select
            .order_by_asc(course::Column::Name)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(courses.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let categories = CategoryEntity::find()
            .order_by_asc(category::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(categories.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl SemesterRepository for PostgresSemesterRepository {
    async fn list_desc(&self) -> Result<Vec<Semester>, RepoError> {
        let semesters = SemesterEntity::find()
            .order_by_desc(semester::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(semesters.into_iter().map(Into::into).collect())
    }

    async fn current(&self) -> Result<Option<Semester>, RepoError> {
        let semester = SemesterEntity::find()
            .order_by_desc(semester::Column::Id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(semester.map(Into::into))
    }
}
