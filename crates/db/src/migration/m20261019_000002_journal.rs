//! Journal entries, their lines, and the auto-entry idempotency key.

use sea_orm_migration::prelude::*;

use super::m20261019_000001_accounts_and_periods::{Accounts, FiscalPeriods};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum JournalEntries {
    Table,
    Id,
    EntryNumber,
    Date,
    Description,
    ReferenceType,
    ReferenceId,
    Status,
    FiscalPeriodId,
    PostedAt,
    ReversedEntryId,
    CreatedBy,
    SourceRule,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum JournalEntryLines {
    Table,
    Id,
    JournalEntryId,
    AccountId,
    LineNumber,
    Debit,
    Credit,
    Memo,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(JournalEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::EntryNumber)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntries::Date).date().not_null())
                    .col(ColumnDef::new(JournalEntries::Description).text().not_null())
                    .col(ColumnDef::new(JournalEntries::ReferenceType).string_len(32))
                    .col(ColumnDef::new(JournalEntries::ReferenceId).uuid())
                    .col(
                        ColumnDef::new(JournalEntries::Status)
                            .string_len(16)
                            .not_null()
                            .default("DRAFT"),
                    )
                    .col(ColumnDef::new(JournalEntries::FiscalPeriodId).uuid())
                    .col(ColumnDef::new(JournalEntries::PostedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(JournalEntries::ReversedEntryId).uuid())
                    .col(ColumnDef::new(JournalEntries::CreatedBy).uuid())
                    .col(ColumnDef::new(JournalEntries::SourceRule).string_len(32))
                    .col(
                        ColumnDef::new(JournalEntries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entries-fiscal_period_id")
                            .from(JournalEntries::Table, JournalEntries::FiscalPeriodId)
                            .to(FiscalPeriods::Table, FiscalPeriods::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entries-reversed_entry_id")
                            .from(JournalEntries::Table, JournalEntries::ReversedEntryId)
                            .to(JournalEntries::Table, JournalEntries::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uidx-journal_entries-entry_number")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::EntryNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Manual entries leave source_rule NULL and never collide.
        manager
            .create_index(
                Index::create()
                    .name("uidx-journal_entries-reference-source_rule")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::ReferenceType)
                    .col(JournalEntries::ReferenceId)
                    .col(JournalEntries::SourceRule)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-date")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entries-fiscal_period_id-status")
                    .table(JournalEntries::Table)
                    .col(JournalEntries::FiscalPeriodId)
                    .col(JournalEntries::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(JournalEntryLines::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(JournalEntryLines::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::JournalEntryId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(JournalEntryLines::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(JournalEntryLines::LineNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::Debit)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(JournalEntryLines::Credit)
                            .decimal_len(16, 4)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(JournalEntryLines::Memo).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entry_lines-journal_entry_id")
                            .from(JournalEntryLines::Table, JournalEntryLines::JournalEntryId)
                            .to(JournalEntries::Table, JournalEntries::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-journal_entry_lines-account_id")
                            .from(JournalEntryLines::Table, JournalEntryLines::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entry_lines-journal_entry_id")
                    .table(JournalEntryLines::Table)
                    .col(JournalEntryLines::JournalEntryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-journal_entry_lines-account_id")
                    .table(JournalEntryLines::Table)
                    .col(JournalEntryLines::AccountId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(JournalEntryLines::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(JournalEntries::Table).to_owned())
            .await?;
        Ok(())
    }
}
