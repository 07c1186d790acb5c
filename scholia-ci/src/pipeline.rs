//! Corpus ingestion pipeline
//!
//! One run is one transaction. Token rows deduplicate on
//! (surface form, language) through the table's uniqueness constraint
//! with "do nothing on conflict", so first-seen metadata wins and
//! concurrent runs of the same language serialize on the constraint,
//! not on application logic. String rows insert in stream order with
//! their token link deferred; a single backfill statement resolves the
//! links before commit. Any failure rolls the whole run back.

use std::time::{Duration, Instant};

use scholia_common::access::{authorize, Action};
use scholia_common::db::models::User;
use scholia_common::error::{Error, Result};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::reader::TokenRecord;

/// Rows between progress reports
const PROGRESS_EVERY: u64 = 5_000;

/// Runs longer than this get flagged after commit
const LONG_RUN_WARN_SECS: u64 = 30;

/// Outcome of one committed ingest run
#[derive(Debug)]
pub struct IngestReceipt {
    /// Run id used in the operational logs
    pub run_id: Uuid,
    /// String rows inserted
    pub strings: u64,
    /// Token rows created (duplicates within and across runs excluded)
    pub new_tokens: u64,
    /// Wall time for the whole transaction
    pub elapsed: Duration,
}

impl IngestReceipt {
    pub fn rows_per_sec(&self) -> f64 {
        self.strings as f64 / self.elapsed.as_secs_f64().max(0.001)
    }
}

/// Ingest one tokenized document into a text.
///
/// `lang` overrides the text's own language for token dedup; callers
/// re-ingesting must delete the text's prior string rows first (see
/// [`clear_strings`]). The run commits fully or not at all.
pub async fn ingest(
    pool: &SqlitePool,
    actor: &User,
    text_id: i64,
    lang: Option<&str>,
    records: impl Iterator<Item = Result<TokenRecord>>,
) -> Result<IngestReceipt> {
    if !authorize(actor, Action::EditContent) {
        return Err(Error::Authorization(format!(
            "user {} may not ingest corpora",
            actor.name
        )));
    }
    let row = sqlx::query("SELECT lang FROM texts WHERE id = ?")
        .bind(text_id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Err(Error::Validation(format!("unknown text: {}", text_id)));
    };
    let text_lang: String = row.try_get("lang")?;
    let lang = lang.unwrap_or(&text_lang);

    let run_id = Uuid::new_v4();
    let started = Instant::now();
    info!(run_id = %run_id, text_id, lang, "Starting corpus ingest");

    let mut tx = pool.begin().await?;

    let mut strings: u64 = 0;
    let mut new_tokens: u64 = 0;
    for record in records {
        let record = record?;
        if record.form.trim().is_empty() {
            return Err(Error::Validation(format!(
                "record {}: surface form must not be empty",
                strings + 1
            )));
        }

        let inserted = sqlx::query(
            "INSERT INTO tokens (token, lang, meta) VALUES (?, ?, ?) \
             ON CONFLICT (token, lang) DO NOTHING",
        )
        .bind(&record.form)
        .bind(lang)
        .bind(&record.meta)
        .execute(&mut *tx)
        .await?;
        new_tokens += inserted.rows_affected();

        let fmt = serde_json::to_string(&record.fmt)?;
        sqlx::query(
            "INSERT INTO strings (text_id, p, s, line, form, repr, fmt, comments) \
             VALUES (?, ?, ?, ?, ?, ?, ?, '[]')",
        )
        .bind(text_id)
        .bind(record.p)
        .bind(record.s)
        .bind(record.line)
        .bind(&record.form)
        .bind(record.repr())
        .bind(&fmt)
        .execute(&mut *tx)
        .await?;

        strings += 1;
        if strings % PROGRESS_EVERY == 0 {
            debug!(run_id = %run_id, rows = strings, "Ingest progress");
        }
    }

    // One backfill pass links every new string to its canonical token
    let linked = sqlx::query(
        "UPDATE strings SET token_id = \
             (SELECT t.id FROM tokens t WHERE t.token = strings.form AND t.lang = ?) \
         WHERE strings.text_id = ? AND strings.token_id IS NULL",
    )
    .bind(lang)
    .bind(text_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    if linked != strings {
        warn!(
            run_id = %run_id,
            linked,
            strings,
            "Backfill row count differs from inserted strings"
        );
    }

    tx.commit().await?;

    let elapsed = started.elapsed();
    let receipt = IngestReceipt {
        run_id,
        strings,
        new_tokens,
        elapsed,
    };
    info!(
        run_id = %run_id,
        strings = receipt.strings,
        new_tokens = receipt.new_tokens,
        elapsed_secs = elapsed.as_secs_f64(),
        rows_per_sec = receipt.rows_per_sec(),
        "Ingest committed"
    );
    if elapsed.as_secs() > LONG_RUN_WARN_SECS {
        warn!(
            run_id = %run_id,
            elapsed_secs = elapsed.as_secs(),
            "Ingest transaction ran long; readers were blocked from writing"
        );
    }

    Ok(receipt)
}

/// Delete a text's string rows ahead of re-ingestion, returning the count.
pub async fn clear_strings(pool: &SqlitePool, actor: &User, text_id: i64) -> Result<u64> {
    if !authorize(actor, Action::EditContent) {
        return Err(Error::Authorization(format!(
            "user {} may not ingest corpora",
            actor.name
        )));
    }
    let text_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM texts WHERE id = ?)")
        .bind(text_id)
        .fetch_one(pool)
        .await?;
    if !text_exists {
        return Err(Error::Validation(format!("unknown text: {}", text_id)));
    }

    let deleted = sqlx::query("DELETE FROM strings WHERE text_id = ?")
        .bind(text_id)
        .execute(pool)
        .await?
        .rows_affected();

    info!(text_id, deleted, "Cleared prior string rows");
    Ok(deleted)
}
