//! Organization settings stored in the key/value `settings` table

use std::fmt;
use std::str::FromStr;

use cmc_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

pub const ORGANIZATION_NAME: &str = "organization_name";
pub const ORGANIZATION_ADDRESS: &str = "organization_address";
pub const PAYROLL_FREQUENCY: &str = "payroll_frequency";

const DEFAULT_ORGANIZATION_NAME: &str = "Cathay Metal Corporation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollFrequency {
    #[default]
    SemiMonthly,
    Monthly,
}

impl PayrollFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollFrequency::SemiMonthly => "semi_monthly",
            PayrollFrequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for PayrollFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayrollFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "semi_monthly" => Ok(PayrollFrequency::SemiMonthly),
            "monthly" => Ok(PayrollFrequency::Monthly),
            other => Err(format!(
                "Payroll frequency must be semi_monthly or monthly, got '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationSettings {
    pub organization_name: String,
    pub organization_address: String,
    pub payroll_frequency: PayrollFrequency,
}

/// Typed setting; `None` when the key is absent or NULL
pub async fn get_setting<T: FromStr>(pool: &SqlitePool, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    match value.flatten() {
        Some(s) => s
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("Failed to parse setting '{}' value: {}", key, s))),
        None => Ok(None),
    }
}

pub async fn set_setting<T: ToString>(pool: &SqlitePool, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_organization(pool: &SqlitePool) -> Result<OrganizationSettings> {
    Ok(OrganizationSettings {
        organization_name: get_setting(pool, ORGANIZATION_NAME)
            .await?
            .unwrap_or_else(|| DEFAULT_ORGANIZATION_NAME.to_string()),
        organization_address: get_setting(pool, ORGANIZATION_ADDRESS)
            .await?
            .unwrap_or_default(),
        payroll_frequency: get_setting(pool, PAYROLL_FREQUENCY)
            .await?
            .unwrap_or_default(),
    })
}

/// Write all organization settings in one transaction
pub async fn save_organization(pool: &SqlitePool, settings: &OrganizationSettings) -> Result<()> {
    let mut tx = pool.begin().await?;

    for (key, value) in [
        (ORGANIZATION_NAME, settings.organization_name.as_str()),
        (ORGANIZATION_ADDRESS, settings.organization_address.as_str()),
        (PAYROLL_FREQUENCY, settings.payroll_frequency.as_str()),
    ] {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}
