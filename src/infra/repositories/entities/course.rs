//! Course database entity (owner fields only are read here).

use sea_orm::entity::prelude::*;

use crate::domain::CourseRef;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub title: String,
    pub lecturer_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CourseRef {
    fn from(model: Model) -> Self {
        CourseRef {
            id: model.id,
            code: model.code,
            title: model.title,
            lecturer_id: model.lecturer_id,
        }
    }
}
