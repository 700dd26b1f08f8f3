use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "access_key")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key_hash: String,
    pub role: String,
    pub username: String,
    pub sub_event_id: Option<Uuid>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sub_event::Entity",
        from = "Column::SubEventId",
        to = "super::sub_event::Column::Uuid",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    SubEvent,
}

impl Related<super::sub_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
