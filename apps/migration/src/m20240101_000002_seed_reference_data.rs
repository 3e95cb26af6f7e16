//! Seed reference data: categories, the first semester, and the sentinel
//! deleted-account user.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CATEGORY_NAMES: [&str; 6] = [
    "Exam",
    "Lecture",
    "Homework",
    "Recitation",
    "Complaint",
    "Off Topic",
];

fn sentinel_email() -> String {
    std::env::var("SENTINEL_EMAIL").unwrap_or_else(|_| "deletedaccount".to_string())
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in CATEGORY_NAMES {
            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(Categories::Table)
                        .columns([Categories::Name])
                        .values_panic([name.into()])
                        .to_owned(),
                )
                .await?;
        }

        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Semesters::Table)
                    .columns([Semesters::Year, Semesters::Season])
                    .values_panic([2024.into(), "Fall".into()])
                    .to_owned(),
            )
            .await?;

        // The sentinel account takes over authorship of deleted users'
        // content. Its credential is the disabled marker, so it can never
        // log in, and it stays unverified forever.
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Users::Table)
                    .columns([Users::Email, Users::PasswordHash, Users::IsVerified])
                    .values_panic([sentinel_email().into(), "!".into(), false.into()])
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Users::Table)
                    .and_where(Expr::col(Users::Email).eq(sentinel_email()))
                    .to_owned(),
            )
            .await?;

        manager
            .exec_stmt(
                Query::delete()
                    .from_table(Semesters::Table)
                    .and_where(Expr::col(Semesters::Year).eq(2024))
                    .and_where(Expr::col(Semesters::Season).eq("Fall"))
                    .to_owned(),
            )
            .await?;

        for name in CATEGORY_NAMES {
            manager
                .exec_stmt(
                    Query::delete()
                        .from_table(Categories::Table)
                        .and_where(Expr::col(Categories::Name).eq(name))
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Email,
    PasswordHash,
    IsVerified,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Name,
}

#[derive(DeriveIden)]
enum Semesters {
    Table,
    Year,
    Season,
}
