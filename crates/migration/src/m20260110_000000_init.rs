//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for Prospetto:
//!
//! - `users`: account identities
//! - `ledgers`: shared financial ledgers
//! - `ledger_memberships`: multi-user ledger access
//! - `categories`: per-ledger expenditure categories
//! - `cashes`: income events and current-money snapshots
//! - `expenditures`: expected and actual spending lines

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Name,
}

#[derive(Iden)]
enum Ledgers {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum LedgerMemberships {
    Table,
    LedgerId,
    Username,
}

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    Name,
    LedgerId,
}

#[derive(Iden)]
enum Cashes {
    Table,
    Id,
    Name,
    ValueCents,
    RecordedAt,
    ReferenceDate,
    IsIncome,
    LedgerId,
}

#[derive(Iden)]
enum Expenditures {
    Table,
    Id,
    Name,
    ValueCents,
    Date,
    IsExpected,
    CategoryId,
    LedgerId,
    CreatedBy,
    ExpectedExpenditureId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Ledgers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Ledgers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Ledgers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Ledgers::Name).string().not_null())
                    .col(ColumnDef::new(Ledgers::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Ledger Memberships
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(LedgerMemberships::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerMemberships::LedgerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerMemberships::Username)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(LedgerMemberships::LedgerId)
                            .col(LedgerMemberships::Username),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_memberships-ledger_id")
                            .from(LedgerMemberships::Table, LedgerMemberships::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-ledger_memberships-username")
                            .from(LedgerMemberships::Table, LedgerMemberships::Username)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-ledger_memberships-username")
                    .table(LedgerMemberships::Table)
                    .col(LedgerMemberships::Username)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Categories
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::LedgerId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-categories-ledger_id")
                            .from(Categories::Table, Categories::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-categories-ledger_id-name-unique")
                    .table(Categories::Table)
                    .col(Categories::LedgerId)
                    .col(Categories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Cashes
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Cashes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cashes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cashes::Name).string())
                    .col(ColumnDef::new(Cashes::ValueCents).big_integer().not_null())
                    .col(ColumnDef::new(Cashes::RecordedAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Cashes::ReferenceDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Cashes::IsIncome).boolean().not_null())
                    .col(ColumnDef::new(Cashes::LedgerId).string().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-cashes-ledger_id")
                            .from(Cashes::Table, Cashes::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cashes-ledger_id-is_income-reference_date")
                    .table(Cashes::Table)
                    .col(Cashes::LedgerId)
                    .col(Cashes::IsIncome)
                    .col(Cashes::ReferenceDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Expenditures
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Expenditures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Expenditures::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Expenditures::Name).string().not_null())
                    .col(
                        ColumnDef::new(Expenditures::ValueCents)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Expenditures::Date).timestamp().not_null())
                    .col(ColumnDef::new(Expenditures::IsExpected).boolean().not_null())
                    .col(ColumnDef::new(Expenditures::CategoryId).string().not_null())
                    .col(ColumnDef::new(Expenditures::LedgerId).string().not_null())
                    .col(ColumnDef::new(Expenditures::CreatedBy).string().not_null())
                    .col(ColumnDef::new(Expenditures::ExpectedExpenditureId).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenditures-category_id")
                            .from(Expenditures::Table, Expenditures::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenditures-ledger_id")
                            .from(Expenditures::Table, Expenditures::LedgerId)
                            .to(Ledgers::Table, Ledgers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expenditures-expected_expenditure_id")
                            .from(Expenditures::Table, Expenditures::ExpectedExpenditureId)
                            .to(Expenditures::Table, Expenditures::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenditures-ledger_id-date")
                    .table(Expenditures::Table)
                    .col(Expenditures::LedgerId)
                    .col(Expenditures::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenditures-expected_expenditure_id")
                    .table(Expenditures::Table)
                    .col(Expenditures::ExpectedExpenditureId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Expenditures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cashes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LedgerMemberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Ledgers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
