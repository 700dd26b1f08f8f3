use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Meta {
    Table,
    Key,
    Value,
}

#[derive(Iden)]
pub enum SubEvent {
    Table,
    Uuid,
    Name,
}

#[derive(Iden)]
pub enum Referee {
    Table,
    Uuid,
    Username,
    PasswordHash,
    SubEventId,
}

#[derive(Iden)]
pub enum Entry {
    Table,
    Uuid,
    ParticipantId,
    ParticipantName,
    GroupType,
    Round,
    Score,
    Time,
    Timestamp,
    SubEventId,
}

#[derive(Iden)]
pub enum RosterItem {
    Table,
    Id,
    SubEventId,
    Name,
    GroupType,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Meta::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Meta::Key).string().not_null().primary_key())
                    .col(ColumnDef::new(Meta::Value).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubEvent::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(SubEvent::Uuid).uuid().not_null().primary_key())
                    .col(ColumnDef::new(SubEvent::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Referee::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Referee::Uuid).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Referee::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Referee::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Referee::SubEventId).uuid().not_null())
                    .foreign_key(
                        ForeignKeyCreateStatement::new()
                            .name("fk-referee-sub_event")
                            .from_tbl(Referee::Table)
                            .from_col(Referee::SubEventId)
                            .to_tbl(SubEvent::Table)
                            .to_col(SubEvent::Uuid)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Entry::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Entry::Uuid).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Entry::ParticipantId).string().not_null())
                    .col(ColumnDef::new(Entry::ParticipantName).string().not_null())
                    .col(ColumnDef::new(Entry::GroupType).string().not_null())
                    .col(ColumnDef::new(Entry::Round).small_integer().not_null())
                    .col(ColumnDef::new(Entry::Score).double().not_null())
                    .col(ColumnDef::new(Entry::Time).double().not_null())
                    .col(ColumnDef::new(Entry::Timestamp).date_time().not_null())
                    .col(ColumnDef::new(Entry::SubEventId).uuid().not_null())
                    .foreign_key(
                        ForeignKeyCreateStatement::new()
                            .name("fk-entry-sub_event")
                            .from_tbl(Entry::Table)
                            .from_col(Entry::SubEventId)
                            .to_tbl(SubEvent::Table)
                            .to_col(SubEvent::Uuid)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Not unique, the write path replaces rows colliding on this key.
        manager
            .create_index(
                IndexCreateStatement::new()
                    .name("idx-entry-participant-round")
                    .table(Entry::Table)
                    .col(Entry::SubEventId)
                    .col(Entry::ParticipantId)
                    .col(Entry::Round)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RosterItem::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RosterItem::Id).string().not_null())
                    .col(ColumnDef::new(RosterItem::SubEventId).uuid().not_null())
                    .col(ColumnDef::new(RosterItem::Name).string().not_null())
                    .col(ColumnDef::new(RosterItem::GroupType).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(RosterItem::Id)
                            .col(RosterItem::SubEventId),
                    )
                    .foreign_key(
                        ForeignKeyCreateStatement::new()
                            .name("fk-roster_item-sub_event")
                            .from_tbl(RosterItem::Table)
                            .from_col(RosterItem::SubEventId)
                            .to_tbl(SubEvent::Table)
                            .to_col(SubEvent::Uuid)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(RosterItem::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Entry::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Referee::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(SubEvent::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Meta::Table).to_owned()).await?;
        Ok(())
    }
}
