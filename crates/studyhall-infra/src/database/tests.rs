use maplit::btreemap;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

use studyhall_core::domain::{Post, User};
use studyhall_core::ports::{BaseRepository, DeletionOutcome, PostRepository, UserRepository};
use studyhall_core::query::PostFilter;

use crate::database::entity::{post, user};
use crate::database::post_repo::PostgresPostRepository;
use crate::database::postgres_repo::PostgresUserRepository;

fn post_model(id: i32) -> post::Model {
    post::Model {
        id,
        title: "Midterm review".to_owned(),
        content: "When is the review session?".to_owned(),
        timestamp: chrono::Utc::now().into(),
        is_archived: false,
        due_date: None,
        author_id: 1,
        course_id: 2,
        category_id: 3,
        semester_id: 4,
    }
}

#[tokio::test]
async fn find_post_by_id_maps_to_domain() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(11)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let result: Option<Post> = repo.find_by_id(11).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.id, 11);
    assert_eq!(post.title, "Midterm review");
    assert_eq!(post.course_id, 2);
}

#[tokio::test]
async fn find_user_by_email_maps_to_domain() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user::Model {
            id: 5,
            email: "test@uni.edu".to_owned(),
            password_hash: "hash".to_owned(),
            is_verified: true,
        }]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let result: Option<User> = repo.find_by_email("test@uni.edu").await.unwrap();

    let user = result.unwrap();
    assert_eq!(user.id, 5);
    assert!(user.is_verified);
}

#[tokio::test]
async fn search_with_no_matches_returns_empty_page_and_zero_total() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // count query
        .append_query_results([vec![btreemap! {
            "num_items" => Into::<Value>::into(0i64)
        }]])
        // page query
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo.search(&PostFilter::default()).await.unwrap();

    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn deletion_is_a_noop_when_the_user_is_already_gone() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let outcome = repo.reassign_content_and_delete(9, 1, true).await.unwrap();

    assert_eq!(outcome, DeletionOutcome::AlreadyDeleted);
}

#[tokio::test]
async fn deletion_reassigns_content_then_removes_the_user() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user::Model {
            id: 9,
            email: "leaving@uni.edu".to_owned(),
            password_hash: "hash".to_owned(),
            is_verified: true,
        }]])
        .append_exec_results([
            // posts reassigned
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 3,
            },
            // comments reassigned
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 2,
            },
            // user row deleted
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
        ])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let outcome = repo.reassign_content_and_delete(9, 1, false).await.unwrap();

    assert_eq!(outcome, DeletionOutcome::Deleted);
}
