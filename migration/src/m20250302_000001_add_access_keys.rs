use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum SubEvent {
    Table,
    Uuid,
}

#[derive(Iden)]
enum AccessKey {
    Table,
    KeyHash,
    Role,
    Username,
    SubEventId,
    CreatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AccessKey::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AccessKey::KeyHash)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AccessKey::Role).string().not_null())
                    .col(ColumnDef::new(AccessKey::Username).string().not_null())
                    .col(ColumnDef::new(AccessKey::SubEventId).uuid())
                    .col(ColumnDef::new(AccessKey::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKeyCreateStatement::new()
                            .name("fk-access_key-sub_event")
                            .from_tbl(AccessKey::Table)
                            .from_col(AccessKey::SubEventId)
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
        manager
            .drop_table(Table::drop().table(AccessKey::Table).to_owned())
            .await
    }
}
