//! Chart of accounts and fiscal calendar tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
pub enum Accounts {
    Table,
    Id,
    Code,
    Name,
    AccountType,
    SubType,
    ParentId,
    Description,
    IsSystemAccount,
    Active,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum FiscalPeriods {
    Table,
    Id,
    Name,
    StartDate,
    EndDate,
    Status,
    ClosedAt,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::Code).string_len(32).not_null())
                    .col(ColumnDef::new(Accounts::Name).string().not_null())
                    .col(ColumnDef::new(Accounts::AccountType).string_len(16).not_null())
                    .col(ColumnDef::new(Accounts::SubType).string_len(64))
                    .col(ColumnDef::new(Accounts::ParentId).uuid())
                    .col(ColumnDef::new(Accounts::Description).text())
                    .col(
                        ColumnDef::new(Accounts::IsSystemAccount)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Accounts::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Accounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-accounts-parent_id")
                            .from(Accounts::Table, Accounts::ParentId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-accounts-code")
                    .table(Accounts::Table)
                    .col(Accounts::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-accounts-parent_id")
                    .table(Accounts::Table)
                    .col(Accounts::ParentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FiscalPeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FiscalPeriods::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FiscalPeriods::Name).string().not_null())
                    .col(ColumnDef::new(FiscalPeriods::StartDate).date().not_null())
                    .col(ColumnDef::new(FiscalPeriods::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(FiscalPeriods::Status)
                            .string_len(16)
                            .not_null()
                            .default("OPEN"),
                    )
                    .col(ColumnDef::new(FiscalPeriods::ClosedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(FiscalPeriods::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FiscalPeriods::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-fiscal_periods-dates")
                    .table(FiscalPeriods::Table)
                    .col(FiscalPeriods::StartDate)
                    .col(FiscalPeriods::EndDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FiscalPeriods::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}
