//! Course entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub offering_unit: String,
    pub subject: String,
    pub course_number: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::post::Entity")]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Course.
impl From<Model> for studyhall_core::domain::Course {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            offering_unit: model.offering_unit,
            subject: model.subject,
            course_number: model.course_number,
        }
    }
}
