use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entry")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub participant_id: String,
    pub participant_name: String,
    pub group_type: String,
    pub round: i16,
    #[sea_orm(column_type = "Double")]
    pub score: f64,
    #[sea_orm(column_type = "Double")]
    pub time: f64,
    pub timestamp: DateTime,
    pub sub_event_id: Uuid,
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
