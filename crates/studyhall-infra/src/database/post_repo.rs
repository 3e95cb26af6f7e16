//! PostgreSQL post repository: the filter/sort/paginate query engine plus
//! engagement writes and redaction.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{Days, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, OnConflict, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Insert, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};

use studyhall_core::domain::{
    Comment, CommentView, NewComment, NewPost, PostOverview, PostThread, REDACTION_MARKER,
};
use studyhall_core::error::RepoError;
use studyhall_core::ports::PostRepository;
use studyhall_core::query::{Page, PostFilter, PostSort, PAGE_SIZE};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::course::{self, Entity as CourseEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_cheer;
use super::entity::semester::{self, Entity as SemesterEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::PostgresBaseRepository;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

fn query_err(e: sea_orm::DbErr) -> RepoError {
    RepoError::Query(e.to_string())
}

/// Conjunction of all supplied filters.
///
/// The due-date range is inclusive of the start date via a strictly-greater
/// comparison against the preceding day, and exclusive of the end date.
fn filter_condition(filter: &PostFilter) -> Condition {
    let mut cond = Condition::all();

    if !filter.courses.is_empty() {
        cond = cond.add(post::Column::CourseId.is_in(filter.courses.iter().copied()));
    }

    if !filter.categories.is_empty() {
        cond = cond.add(post::Column::CategoryId.is_in(filter.categories.iter().copied()));
    }

    if let Some(query) = filter.query.as_deref() {
        cond = cond.add(
            Condition::any()
                .add(post::Column::Title.contains(query))
                .add(post::Column::Content.contains(query)),
        );
    }

    if let Some(end) = filter.end_date {
        cond = cond.add(post::Column::DueDate.lt(end));
    }

    if let Some(start) = filter.start_date {
        let day_before = start.checked_sub_days(Days::new(1)).unwrap_or(start);
        cond = cond.add(post::Column::DueDate.gt(day_before));
    }

    cond
}

/// Latest activity of a post: its newest comment, or the post itself when
/// it has none. Requires the left join and grouping applied below.
fn latest_activity() -> SimpleExpr {
    Expr::cust(r#"MAX(COALESCE("comments"."timestamp", "posts"."timestamp"))"#)
}

/// Build the page query for a filter. Ties on the primary sort key are
/// broken by post id descending so ordering is deterministic.
fn search_select(filter: &PostFilter) -> Select<PostEntity> {
    let select = PostEntity::find().filter(filter_condition(filter));

    let select = match filter.sort {
        PostSort::Time => select.order_by(post::Column::Timestamp, Order::Desc),
        PostSort::Activity => select
            .left_join(CommentEntity)
            .group_by(post::Column::Id)
            .order_by(latest_activity(), Order::Desc),
    };

    select
        .order_by(post::Column::Id, Order::Desc)
        .limit(PAGE_SIZE)
        .offset(filter.offset())
}

fn cheer_insert(post_id: i32, user_id: i32) -> Insert<post_cheer::ActiveModel> {
    post_cheer::Entity::insert(post_cheer::ActiveModel {
        user_id: Set(user_id),
        post_id: Set(post_id),
    })
    .on_conflict(
        OnConflict::columns([post_cheer::Column::UserId, post_cheer::Column::PostId])
            .do_nothing()
            .to_owned(),
    )
}

impl PostgresPostRepository {
    /// Batch-count grouped child rows for a set of posts.
    async fn comment_counts(&self, post_ids: &[i32]) -> Result<HashMap<i32, u64>, RepoError> {
        let rows: Vec<(i32, i64)> = CommentEntity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(comment::Column::Id.count(), "count")
            .filter(comment::Column::PostId.is_in(post_ids.iter().copied()))
            .group_by(comment::Column::PostId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(|(id, n)| (id, n as u64)).collect())
    }

    async fn cheer_counts(&self, post_ids: &[i32]) -> Result<HashMap<i32, u64>, RepoError> {
        let rows: Vec<(i32, i64)> = post_cheer::Entity::find()
            .select_only()
            .column(post_cheer::Column::PostId)
            .column_as(post_cheer::Column::UserId.count(), "count")
            .filter(post_cheer::Column::PostId.is_in(post_ids.iter().copied()))
            .group_by(post_cheer::Column::PostId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(rows.into_iter().map(|(id, n)| (id, n as u64)).collect())
    }

    async fn author_emails(&self, author_ids: &[i32]) -> Result<HashMap<i32, String>, RepoError> {
        let authors = UserEntity::find()
            .filter(user::Column::Id.is_in(author_ids.iter().copied()))
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(authors.into_iter().map(|u| (u.id, u.email)).collect())
    }

    /// Materialize a page of post rows into overviews with all references
    /// resolved upfront (no per-row traversal).
    async fn materialize(&self, rows: Vec<post::Model>) -> Result<Vec<PostOverview>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i32> = rows.iter().map(|p| p.id).collect();
        let course_ids: Vec<i32> = rows
            .iter()
            .map(|p| p.course_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let category_ids: Vec<i32> = rows
            .iter()
            .map(|p| p.category_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let author_ids: Vec<i32> = rows
            .iter()
            .map(|p| p.author_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let courses: HashMap<i32, course::Model> = CourseEntity::find()
            .filter(course::Column::Id.is_in(course_ids))
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let categories: HashMap<i32, category::Model> = CategoryEntity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(&self.db)
            .await
            .map_err(query_err)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let authors = self.author_emails(&author_ids).await?;
        let comment_counts = self.comment_counts(&post_ids).await?;
        let cheer_counts = self.cheer_counts(&post_ids).await?;

        rows.into_iter()
            .map(|row| {
                let course = courses
                    .get(&row.course_id)
                    .cloned()
                    .ok_or_else(|| missing_ref("course", row.course_id))?;
                let category = categories
                    .get(&row.category_id)
                    .cloned()
                    .ok_or_else(|| missing_ref("category", row.category_id))?;
                let author_email = authors
                    .get(&row.author_id)
                    .cloned()
                    .ok_or_else(|| missing_ref("user", row.author_id))?;

                Ok(PostOverview {
                    id: row.id,
                    title: row.title,
                    content: row.content,
                    timestamp: row.timestamp.into(),
                    is_archived: row.is_archived,
                    due_date: row.due_date,
                    author_email,
                    course: course.into(),
                    category: category.into(),
                    comment_count: comment_counts.get(&row.id).copied().unwrap_or(0),
                    cheer_count: cheer_counts.get(&row.id).copied().unwrap_or(0),
                })
            })
            .collect()
    }
}

fn missing_ref(entity: &str, id: i32) -> RepoError {
    RepoError::Constraint(format!("post references missing {entity} {id}"))
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn search(&self, filter: &PostFilter) -> Result<Page<PostOverview>, RepoError> {
        let total = PostEntity::find()
            .filter(filter_condition(filter))
            .count(&self.db)
            .await
            .map_err(query_err)?;

        let rows = search_select(filter).all(&self.db).await.map_err(query_err)?;
        let items = self.materialize(rows).await?;

        Ok(Page { items, total })
    }

    async fn create(&self, new_post: NewPost) -> Result<PostThread, RepoError> {
        let model = post::ActiveModel {
            id: NotSet,
            title: Set(new_post.title),
            content: Set(new_post.content),
            timestamp: Set(Utc::now().into()),
            is_archived: Set(false),
            due_date: Set(new_post.due_date),
            author_id: Set(new_post.author_id),
            course_id: Set(new_post.course_id),
            category_id: Set(new_post.category_id),
            semester_id: Set(new_post.semester_id),
        }
        .insert(&self.db)
        .await
        .map_err(query_err)?;

        self.thread(model.id)
            .await?
            .ok_or_else(|| RepoError::Query("created post vanished".to_string()))
    }

    async fn thread(&self, post_id: i32) -> Result<Option<PostThread>, RepoError> {
        let Some(row) = PostEntity::find_by_id(post_id)
            .one(&self.db)
            .await
            .map_err(query_err)?
        else {
            return Ok(None);
        };

        let author = UserEntity::find_by_id(row.author_id)
            .one(&self.db)
            .await
            .map_err(query_err)?
            .ok_or_else(|| missing_ref("user", row.author_id))?;
        let course = CourseEntity::find_by_id(row.course_id)
            .one(&self.db)
            .await
            .map_err(query_err)?
            .ok_or_else(|| missing_ref("course", row.course_id))?;
        let category = CategoryEntity::find_by_id(row.category_id)
            .one(&self.db)
            .await
            .map_err(query_err)?
            .ok_or_else(|| missing_ref("category", row.category_id))?;
        let semester = SemesterEntity::find_by_id(row.semester_id)
            .one(&self.db)
            .await
            .map_err(query_err)?
            .ok_or_else(|| missing_ref("semester", row.semester_id))?;

        // append order = creation order
        let comment_rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by(comment::Column::Id, Order::Asc)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        let commenter_ids: Vec<i32> = comment_rows
            .iter()
            .map(|c| c.author_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let commenters = self.author_emails(&commenter_ids).await?;

        let comments = comment_rows
            .into_iter()
            .map(|c| {
                let author_email = commenters
                    .get(&c.author_id)
                    .cloned()
                    .ok_or_else(|| missing_ref("user", c.author_id))?;
                Ok(CommentView {
                    id: c.id,
                    content: c.content,
                    timestamp: c.timestamp.into(),
                    author_email,
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        let cheer_count = post_cheer::Entity::find()
            .filter(post_cheer::Column::PostId.eq(post_id))
            .count(&self.db)
            .await
            .map_err(query_err)?;

        Ok(Some(PostThread {
            id: row.id,
            title: row.title,
            content: row.content,
            timestamp: row.timestamp.into(),
            is_archived: row.is_archived,
            due_date: row.due_date,
            author_email: author.email,
            course: course.into(),
            category: category.into(),
            semester: semester.into(),
            comments,
            cheer_count,
        }))
    }

    async fn find_comment(&self, comment_id: i32) -> Result<Option<Comment>, RepoError> {
        let result = CommentEntity::find_by_id(comment_id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn add_comment(&self, new_comment: NewComment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel {
            id: NotSet,
            content: Set(new_comment.content),
            timestamp: Set(Utc::now().into()),
            post_id: Set(new_comment.post_id),
            author_id: Set(new_comment.author_id),
        }
        .insert(&self.db)
        .await
        .map_err(query_err)?;

        Ok(model.into())
    }

    async fn redact_post(&self, post_id: i32, sentinel_id: i32) -> Result<(), RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Content, Expr::value(REDACTION_MARKER))
            .col_expr(post::Column::AuthorId, Expr::value(sentinel_id))
            .filter(post::Column::Id.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn redact_comment(&self, comment_id: i32, sentinel_id: i32) -> Result<(), RepoError> {
        let result = CommentEntity::update_many()
            .col_expr(comment::Column::Content, Expr::value(REDACTION_MARKER))
            .col_expr(comment::Column::AuthorId, Expr::value(sentinel_id))
            .filter(comment::Column::Id.eq(comment_id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn cheer(&self, post_id: i32, user_id: i32) -> Result<(), RepoError> {
        cheer_insert(post_id, user_id)
            .exec_without_returning(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;

    fn build(filter: &PostFilter) -> String {
        search_select(filter).build(DbBackend::Postgres).to_string()
    }

    #[test]
    fn default_filter_sorts_by_time_and_paginates() {
        let sql = build(&PostFilter::default());

        assert!(sql.contains(r#"ORDER BY "posts"."timestamp" DESC, "posts"."id" DESC"#));
        assert!(sql.contains("LIMIT 20"));
        assert!(sql.contains("OFFSET 0"));
        assert!(!sql.contains("JOIN"));
    }

    #[test]
    fn page_number_moves_the_offset() {
        let filter = PostFilter {
            page: 3,
            ..Default::default()
        };

        assert!(build(&filter).contains("OFFSET 40"));
    }

    #[test]
    fn course_and_category_filters_use_set_membership() {
        let filter = PostFilter {
            courses: vec![1, 2],
            categories: vec![7],
            ..Default::default()
        };
        let sql = build(&filter);

        assert!(sql.contains(r#""posts"."course_id" IN (1, 2)"#));
        assert!(sql.contains(r#""posts"."category_id" IN (7)"#));
    }

    #[test]
    fn text_query_matches_title_or_content() {
        let filter = PostFilter {
            query: Some("midterm".to_string()),
            ..Default::default()
        };
        let sql = build(&filter);

        assert!(sql.contains(r#""posts"."title" LIKE '%midterm%'"#));
        assert!(sql.contains(r#""posts"."content" LIKE '%midterm%'"#));
        assert!(sql.contains(" OR "));
    }

    #[test]
    fn date_range_is_inclusive_start_exclusive_end() {
        let filter = PostFilter {
            start_date: NaiveDate::from_ymd_opt(2018, 1, 15),
            end_date: NaiveDate::from_ymd_opt(2018, 2, 1),
            ..Default::default()
        };
        let sql = build(&filter);

        // start 2018-01-15 becomes strictly-greater-than the day before,
        // so a due date exactly on the start date is included
        assert!(sql.contains(r#""posts"."due_date" > '2018-01-14'"#));
        // the end date itself is excluded
        assert!(sql.contains(r#""posts"."due_date" < '2018-02-01'"#));
    }

    #[test]
    fn activity_sort_joins_comments_and_orders_by_latest_activity() {
        let filter = PostFilter {
            sort: PostSort::Activity,
            ..Default::default()
        };
        let sql = build(&filter);

        assert!(sql.contains(r#"LEFT JOIN "comments""#));
        assert!(sql.contains(r#"GROUP BY "posts"."id""#));
        assert!(sql.contains(
            r#"ORDER BY MAX(COALESCE("comments"."timestamp", "posts"."timestamp")) DESC, "posts"."id" DESC"#
        ));
    }

    #[test]
    fn total_count_ignores_pagination() {
        let filter = PostFilter {
            page: 5,
            courses: vec![3],
            ..Default::default()
        };
        let sql = PostEntity::find()
            .filter(filter_condition(&filter))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""posts"."course_id" IN (3)"#));
        assert!(!sql.contains("LIMIT"));
        assert!(!sql.contains("OFFSET"));
    }

    #[test]
    fn cheers_are_set_inserts() {
        let sql = cheer_insert(9, 4).build(DbBackend::Postgres).to_string();

        assert!(sql.contains(r#"ON CONFLICT ("user_id", "post_id") DO NOTHING"#));
    }
}
