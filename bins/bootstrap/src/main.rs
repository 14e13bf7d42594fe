//! Prepares a Tally database for use.
//!
//! Runs pending migrations, creates the system chart of accounts (skipping codes
//! that already exist) and, when given, opens a first fiscal period.
//!
//! Usage:
//!   bootstrap
//!   bootstrap <period-name> <start-date> <end-date>
//!
//! Dates are `YYYY-MM-DD`. Account code overrides come from
//! `TALLY__LEDGER__ACCOUNT_CODES__<ROLE>`.

use anyhow::{Context, bail};
use chrono::NaiveDate;
use tally_core::account::AccountCodeRegistry;
use tally_core::fiscal::CreateFiscalPeriodInput;
use tally_db::migration::{Migrator, MigratorTrait};
use tally_db::{AccountRepository, FiscalRepository};
use tally_shared::AppConfig;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=info,sea_orm=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let period = parse_period(std::env::args().skip(1).collect())?;

    let config = AppConfig::load_with_dotenv().context("Failed to load configuration")?;
    let registry = AccountCodeRegistry::from_overrides(&config.ledger.account_codes)
        .context("Invalid account code overrides")?;

    let db = tally_db::connect_with_config(&config.database).await?;

    Migrator::up(&db, None).await.context("Migration failed")?;
    info!("Migrations applied");

    let report = AccountRepository::new(db.clone())
        .initialize_default_accounts(&registry)
        .await?;
    info!(
        created = report.created.len(),
        skipped = report.skipped.len(),
        "System accounts ready"
    );

    if let Some(input) = period {
        let fiscal = FiscalRepository::new(db);
        let created = fiscal.create(input).await?;
        info!(
            period_id = %created.id,
            name = %created.name,
            start_date = %created.start_date,
            end_date = %created.end_date,
            "Fiscal period opened"
        );
    }

    Ok(())
}

fn parse_period(args: Vec<String>) -> anyhow::Result<Option<CreateFiscalPeriodInput>> {
    match args.as_slice() {
        [] => Ok(None),
        [name, start, end] => Ok(Some(CreateFiscalPeriodInput {
            name: name.clone(),
            start_date: parse_date(start)?,
            end_date: parse_date(end)?,
        })),
        _ => bail!("usage: bootstrap [<period-name> <start-date> <end-date>]"),
    }
}

fn parse_date(value: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date {value:?}, expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period() {
        assert!(parse_period(Vec::new()).unwrap().is_none());

        let input = parse_period(vec![
            "FY 2026".to_string(),
            "2026-01-01".to_string(),
            "2026-12-31".to_string(),
        ])
        .unwrap()
        .unwrap();
        assert_eq!(input.name, "FY 2026");
        assert_eq!(input.end_date, NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_parse_period_rejects_bad_input() {
        assert!(parse_period(vec!["FY".to_string()]).is_err());
        assert!(
            parse_period(vec![
                "FY".to_string(),
                "2026-13-01".to_string(),
                "2026-12-31".to_string(),
            ])
            .is_err()
        );
    }
}
