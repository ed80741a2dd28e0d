//! Plan transaction history queries.

use jiff::Timestamp;
use rusqlite::{params, types::Type, OptionalExtension, Row};

use crate::{
    error::{DatabaseResultExt, PlanError, Result},
    models::{normalize_address, ChainId, PlanStatus, PlanTransaction},
};

const UPSERT_TRANSACTION_SQL: &str = "INSERT INTO plan_transactions \
     (address, chain_id, plan_id, status, steps, tx_hashes, updated_at) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
     ON CONFLICT (address, chain_id, plan_id) DO UPDATE SET \
     status = excluded.status, steps = excluded.steps, \
     tx_hashes = excluded.tx_hashes, updated_at = excluded.updated_at";
const TRANSACTION_COLUMNS: &str = "address, chain_id, plan_id, status, steps, tx_hashes, updated_at";
const SELECT_TRANSACTION_SQL: &str = "SELECT address, chain_id, plan_id, status, steps, tx_hashes, updated_at \
     FROM plan_transactions WHERE address = ?1 AND chain_id = ?2 AND plan_id = ?3";

fn conversion_error(
    column: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Timestamps are stored as integer nanoseconds so SQL ordering matches
/// `Timestamp` ordering.
fn timestamp_to_sql(timestamp: Timestamp) -> Result<i64> {
    i64::try_from(timestamp.as_nanosecond()).map_err(|_| {
        PlanError::validation("updated_at")
            .with_reason(format!("{timestamp} is outside the storable range"))
    })
}

fn timestamp_from_sql(column: usize, nanos: i64) -> rusqlite::Result<Timestamp> {
    Timestamp::from_nanosecond(i128::from(nanos))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Integer, Box::new(e)))
}

fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<PlanTransaction> {
    let status_str: String = row.get(3)?;
    let status = status_str.parse::<PlanStatus>().map_err(|reason| {
        conversion_error(
            3,
            std::io::Error::new(std::io::ErrorKind::InvalidData, reason),
        )
    })?;

    Ok(PlanTransaction {
        address: row.get(0)?,
        chain_id: ChainId(row.get::<_, i64>(1)? as u64),
        plan_id: row.get(2)?,
        status,
        steps: serde_json::from_str(&row.get::<_, String>(4)?)
            .map_err(|e| conversion_error(4, e))?,
        tx_hashes: serde_json::from_str(&row.get::<_, String>(5)?)
            .map_err(|e| conversion_error(5, e))?,
        updated_at: timestamp_from_sql(6, row.get(6)?)?,
    })
}

impl super::Database {
    /// Inserts the record or replaces the one with the same key.
    pub fn upsert_transaction(&mut self, record: &PlanTransaction) -> Result<()> {
        let steps = serde_json::to_string(&record.steps)?;
        let tx_hashes = serde_json::to_string(&record.tx_hashes)?;
        let updated_at = timestamp_to_sql(record.updated_at)?;

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(
            UPSERT_TRANSACTION_SQL,
            params![
                normalize_address(&record.address),
                record.chain_id.0 as i64,
                &record.plan_id,
                record.status.as_str(),
                steps,
                tx_hashes,
                updated_at,
            ],
        )
        .db_context("Failed to upsert plan transaction")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(())
    }

    /// Retrieves a single record by key.
    pub fn get_transaction(
        &self,
        address: &str,
        chain_id: ChainId,
        plan_id: &str,
    ) -> Result<Option<PlanTransaction>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_TRANSACTION_SQL)
            .db_context("Failed to prepare query")?;

        stmt.query_row(
            params![normalize_address(address), chain_id.0 as i64, plan_id],
            row_to_transaction,
        )
        .optional()
        .db_context("Failed to query plan transaction")
    }

    /// Lists records for an address, newest first, optionally for one chain.
    pub fn list_transactions(
        &self,
        address: &str,
        chain_id: Option<ChainId>,
    ) -> Result<Vec<PlanTransaction>> {
        let mut query = format!("SELECT {TRANSACTION_COLUMNS} FROM plan_transactions WHERE address = ?1");
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(normalize_address(address))];

        if let Some(chain_id) = chain_id {
            query.push_str(" AND chain_id = ?2");
            params_vec.push(Box::new(chain_id.0 as i64));
        }
        query.push_str(" ORDER BY updated_at DESC, plan_id ASC");

        let mut stmt = self
            .connection
            .prepare(&query)
            .db_context("Failed to prepare query")?;

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|b| &**b).collect();

        let rows = stmt
            .query_map(&params_refs[..], row_to_transaction)
            .db_context("Failed to query plan transactions")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read plan transaction row")
    }
}
