use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sub_event")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: Uuid,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entry::Entity")]
    Entry,
    #[sea_orm(has_many = "super::roster_item::Entity")]
    RosterItem,
    #[sea_orm(has_many = "super::referee::Entity")]
    Referee,
    #[sea_orm(has_many = "super::access_key::Entity")]
    AccessKey,
}

impl Related<super::entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entry.def()
    }
}

impl Related<super::roster_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RosterItem.def()
    }
}

impl Related<super::referee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Referee.def()
    }
}

impl Related<super::access_key::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccessKey.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
