//! Database operations for the `trend_records` table.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use trendlab_core::model::{
    ContentRef, GeoScope, LifecycleStage, OpportunityWindow, PeakPrediction, TrendRecord,
};

use crate::DbError;

const TREND_RECORD_COLUMNS: &str = "id, public_id, source, keyword, keyword_norm, capture_bucket, \
     volume, growth_percent, competition, geo_level, geo_location, lifecycle, \
     viral_coefficient, sentiment, relevance_score, pillars, related_keywords, \
     top_content, peak_prediction, opportunity_window, captured_at, expires_at, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `trend_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendRecordRow {
    pub id: i64,
    pub public_id: Uuid,
    pub source: String,
    pub keyword: String,
    pub keyword_norm: String,
    pub capture_bucket: NaiveDate,
    pub volume: i64,
    pub growth_percent: f64,
    pub competition: f64,
    pub geo_level: String,
    pub geo_location: String,
    pub lifecycle: String,
    pub viral_coefficient: Option<f64>,
    pub sentiment: f32,
    pub relevance_score: i16,
    pub pillars: Vec<String>,
    pub related_keywords: Vec<String>,
    pub top_content: serde_json::Value,
    pub peak_prediction: Option<serde_json::Value>,
    pub opportunity_window: Option<serde_json::Value>,
    pub captured_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrendRecordRow {
    /// Convert the raw row into the domain record, parsing the textual enums
    /// and the JSONB payloads.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Decode`] if a stored value does not parse.
    pub fn into_record(self) -> Result<TrendRecord, DbError> {
        let lifecycle: LifecycleStage = self.lifecycle.parse().map_err(|e| DbError::Decode {
            column: "lifecycle",
            reason: format!("{e}"),
        })?;

        let geo_level = self.geo_level.parse().map_err(|e| DbError::Decode {
            column: "geo_level",
            reason: format!("{e}"),
        })?;

        let top_content: Vec<ContentRef> =
            serde_json::from_value(self.top_content).map_err(|e| DbError::Decode {
                column: "top_content",
                reason: e.to_string(),
            })?;

        let peak_prediction: Option<PeakPrediction> = self
            .peak_prediction
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| DbError::Decode {
                column: "peak_prediction",
                reason: e.to_string(),
            })?;

        let opportunity_window: Option<OpportunityWindow> = self
            .opportunity_window
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| DbError::Decode {
                column: "opportunity_window",
                reason: e.to_string(),
            })?;

        Ok(TrendRecord {
            id: self.public_id,
            source: self.source,
            keyword: self.keyword,
            volume: self.volume,
            growth_percent: self.growth_percent,
            competition: self.competition,
            geography: GeoScope {
                level: geo_level,
                location: self.geo_location,
            },
            lifecycle,
            viral_coefficient: self.viral_coefficient,
            sentiment: self.sentiment,
            relevance_score: self.relevance_score,
            pillars: self.pillars,
            related_keywords: self.related_keywords,
            top_content,
            peak_prediction,
            opportunity_window,
            captured_at: self.captured_at,
            expires_at: self.expires_at,
        })
    }
}

fn encode_json<T: serde::Serialize>(
    column: &'static str,
    value: &T,
) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(value).map_err(|e| DbError::Encode {
        column,
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Insert or overwrite the record for its `(source, keyword_norm,
/// capture_bucket)` key. A conflicting write replaces the observation fields
/// but keeps the existing `public_id` and any stored prediction.
///
/// Returns the `public_id` the table keeps for that key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_trend_record(pool: &PgPool, record: &TrendRecord) -> Result<Uuid, DbError> {
    let top_content = encode_json("top_content", &record.top_content)?;

    let public_id: Uuid = sqlx::query_scalar(
        "INSERT INTO trend_records \
             (public_id, source, keyword, keyword_norm, capture_bucket, volume, \
              growth_percent, competition, geo_level, geo_location, lifecycle, \
              viral_coefficient, sentiment, relevance_score, pillars, \
              related_keywords, top_content, captured_at, expires_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                 $15, $16, $17, $18, $19) \
         ON CONFLICT (source, keyword_norm, capture_bucket) DO UPDATE SET \
             keyword           = EXCLUDED.keyword, \
             volume            = EXCLUDED.volume, \
             growth_percent    = EXCLUDED.growth_percent, \
             competition       = EXCLUDED.competition, \
             geo_level         = EXCLUDED.geo_level, \
             geo_location      = EXCLUDED.geo_location, \
             lifecycle         = EXCLUDED.lifecycle, \
             viral_coefficient = EXCLUDED.viral_coefficient, \
             sentiment         = EXCLUDED.sentiment, \
             relevance_score   = EXCLUDED.relevance_score, \
             pillars           = EXCLUDED.pillars, \
             related_keywords  = EXCLUDED.related_keywords, \
             top_content       = EXCLUDED.top_content, \
             captured_at       = EXCLUDED.captured_at, \
             expires_at        = EXCLUDED.expires_at, \
             updated_at        = NOW() \
         RETURNING public_id",
    )
    .bind(record.id)
    .bind(&record.source)
    .bind(&record.keyword)
    .bind(record.normalized_keyword())
    .bind(record.capture_bucket())
    .bind(record.volume)
    .bind(record.growth_percent)
    .bind(record.competition)
    .bind(record.geography.level.to_string())
    .bind(&record.geography.location)
    .bind(record.lifecycle.to_string())
    .bind(record.viral_coefficient)
    .bind(record.sentiment)
    .bind(record.relevance_score)
    .bind(&record.pillars)
    .bind(&record.related_keywords)
    .bind(top_content)
    .bind(record.captured_at)
    .bind(record.expires_at)
    .fetch_one(pool)
    .await?;

    Ok(public_id)
}

/// Fetch a single non-expired record by its `public_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_trend_record(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<TrendRecordRow>, DbError> {
    let sql = format!(
        "SELECT {TREND_RECORD_COLUMNS} \
         FROM trend_records \
         WHERE public_id = $1 AND expires_at > NOW()"
    );
    let row = sqlx::query_as::<_, TrendRecordRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Non-expired records in any of the given lifecycle stages, newest capture
/// first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_active_trends(
    pool: &PgPool,
    lifecycles: &[String],
    limit: i64,
) -> Result<Vec<TrendRecordRow>, DbError> {
    let sql = format!(
        "SELECT {TREND_RECORD_COLUMNS} \
         FROM trend_records \
         WHERE expires_at > NOW() AND lifecycle = ANY($1) \
         ORDER BY captured_at DESC, id DESC \
         LIMIT $2"
    );
    let rows = sqlx::query_as::<_, TrendRecordRow>(&sql)
        .bind(lifecycles)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// All captures of a normalized keyword since `since`, ascending by capture
/// time. Includes expired rows: the velocity estimator wants the full recent
/// series, not just the live window.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_keyword_history(
    pool: &PgPool,
    keyword_norm: &str,
    since: DateTime<Utc>,
) -> Result<Vec<TrendRecordRow>, DbError> {
    let sql = format!(
        "SELECT {TREND_RECORD_COLUMNS} \
         FROM trend_records \
         WHERE keyword_norm = $1 AND captured_at >= $2 \
         ORDER BY captured_at ASC, id ASC"
    );
    let rows = sqlx::query_as::<_, TrendRecordRow>(&sql)
        .bind(keyword_norm)
        .bind(since)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Overwrite the denormalized prediction columns on a record.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `public_id`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn save_trend_prediction(
    pool: &PgPool,
    public_id: Uuid,
    peak: &PeakPrediction,
    window: &OpportunityWindow,
) -> Result<(), DbError> {
    let peak_json = encode_json("peak_prediction", peak)?;
    let window_json = encode_json("opportunity_window", window)?;

    let result = sqlx::query(
        "UPDATE trend_records \
         SET peak_prediction = $1, opportunity_window = $2, updated_at = NOW() \
         WHERE public_id = $3",
    )
    .bind(peak_json)
    .bind(window_json)
    .bind(public_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Delete records whose `expires_at` is at or before `now`.
///
/// Returns the number of deleted rows.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn purge_expired_trends(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM trend_records WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
