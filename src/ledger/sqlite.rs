//! SQLite-backed fee source
//!
//! Runs the hourly aggregation inside the ledger database and maps each
//! result row to an [`AggregatedFeePoint`].
//!
//! # Expected schema
//!
//! ```text
//! transactions("from" TEXT, "to" TEXT, gas_used INTEGER, gas_price INTEGER, block_time INTEGER)
//! contracts(address TEXT)
//! ```
//!
//! Transfers touching a known contract or the zero address are left out of
//! the aggregate entirely, in either direction.

use crate::config::DataSourceConfig;
use crate::ledger::{
    AggregatedFeePoint, DataSourceError, DataSourceResult, FeeSource, SECONDS_PER_HOUR,
    WEI_TO_ETHER,
};
use async_trait::async_trait;
use rusqlite::{named_params, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// The burn / mint address, never counted as a peer
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Tables the aggregation query reads from
pub const LEDGER_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    "from" TEXT,
    "to" TEXT,
    gas_used INTEGER NOT NULL,
    gas_price INTEGER NOT NULL,
    block_time INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS contracts (
    address TEXT PRIMARY KEY
);
"#;

/// Hourly fee aggregate
///
/// Bound parameters: `:zero` is [`ZERO_ADDRESS`], `:hour` is
/// [`SECONDS_PER_HOUR`], `:scale` is [`WEI_TO_ETHER`].
///
/// Per-row cost stays integer; the hourly sum uses TOTAL so that busy hours
/// cannot overflow SQLite's 64-bit integers. An hour whose costs are all NULL
/// yields a NULL fee, which fails the row decode like SUM would.
const HOURLY_FEE_QUERY: &str = r#"
SELECT sub.ts - (sub.ts % :hour + :hour) % :hour AS hour,
       CASE WHEN COUNT(sub.gas_payed) = 0 THEN NULL
            ELSE TOTAL(sub.gas_payed) * :scale
       END AS hourly_fee
FROM (
    SELECT t.gas_used * t.gas_price AS gas_payed, t.block_time AS ts
    FROM (
        SELECT gas_used, gas_price, "from", "to", block_time
        FROM transactions
        WHERE "to" != :zero AND "from" != :zero
    ) AS t
    LEFT JOIN contracts AS c ON t."from" = c.address OR t."to" = c.address
    WHERE c.address IS NULL
) AS sub
GROUP BY hour
"#;

/// Fee source reading a SQLite ledger database
///
/// Holds only connection parameters. Every call opens its own read-only
/// connection on the blocking pool, so concurrent requests share nothing.
#[derive(Debug, Clone)]
pub struct SqliteFeeSource {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteFeeSource {
    /// Create a fee source for the ledger at `path`
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    /// Create a fee source from the `[datasource]` config section
    pub fn from_config(config: &DataSourceConfig) -> Self {
        Self::new(
            &config.path,
            Duration::from_millis(config.busy_timeout_ms),
        )
    }

    /// Path of the ledger database
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify the ledger can be opened and the aggregation query compiles
    pub async fn health_check(&self) -> DataSourceResult<()> {
        let source = self.clone();
        tokio::task::spawn_blocking(move || {
            let conn = source.connect()?;
            conn.prepare(HOURLY_FEE_QUERY)
                .map_err(DataSourceError::from_query)?;
            Ok(())
        })
        .await?
    }

    fn connect(&self) -> DataSourceResult<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            DataSourceError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;

        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| DataSourceError::Unavailable(e.to_string()))?;

        Ok(conn)
    }

    /// Run the aggregation on the current thread
    fn aggregate(&self) -> DataSourceResult<Vec<AggregatedFeePoint>> {
        let conn = self.connect()?;

        let mut stmt = conn
            .prepare(HOURLY_FEE_QUERY)
            .map_err(DataSourceError::from_query)?;

        let rows = stmt
            .query_map(
                named_params! {
                    ":zero": ZERO_ADDRESS,
                    ":hour": SECONDS_PER_HOUR,
                    ":scale": WEI_TO_ETHER,
                },
                |row| {
                    Ok(AggregatedFeePoint {
                        timestamp: row.get(0)?,
                        fee: row.get(1)?,
                    })
                },
            )
            .map_err(DataSourceError::from_query)?;

        // First bad row fails the whole aggregate
        let points = rows
            .collect::<Result<Vec<_>, _>>()
            .map_err(DataSourceError::from_query)?;

        Ok(points)
    }
}

#[async_trait]
impl FeeSource for SqliteFeeSource {
    async fn fetch_hourly_fees(&self) -> DataSourceResult<Vec<AggregatedFeePoint>> {
        let source = self.clone();
        let started = Instant::now();

        let points = tokio::task::spawn_blocking(move || source.aggregate()).await??;

        tracing::debug!(
            hours = points.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregated hourly fees"
        );

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rusqlite::params;
    use tempfile::tempdir;

    const ALICE: &str = "0x00000000000000000000000000000000000a11ce";
    const BOB: &str = "0x0000000000000000000000000000000000000b0b";
    const TOKEN: &str = "0x00000000000000000000000000000000000c0de1";

    const GWEI: i64 = 1_000_000_000;

    fn create_ledger(dir: &Path) -> (PathBuf, Connection) {
        let path = dir.join("ledger.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(LEDGER_SCHEMA).unwrap();
        conn.execute("INSERT INTO contracts (address) VALUES (?1)", params![TOKEN])
            .unwrap();
        (path, conn)
    }

    fn insert_transfer(
        conn: &Connection,
        from: &str,
        to: &str,
        gas_used: i64,
        gas_price: i64,
        block_time: i64,
    ) {
        conn.execute(
            r#"INSERT INTO transactions ("from", "to", gas_used, gas_price, block_time)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![from, to, gas_used, gas_price, block_time],
        )
        .unwrap();
    }

    fn source(path: &Path) -> SqliteFeeSource {
        SqliteFeeSource::new(path, Duration::from_millis(1000))
    }

    fn sorted(mut points: Vec<AggregatedFeePoint>) -> Vec<AggregatedFeePoint> {
        points.sort_by_key(|p| p.timestamp);
        points
    }

    fn assert_fee(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "fee {} != {}",
            actual,
            expected
        );
    }

    #[tokio::test]
    async fn test_empty_ledger() {
        let dir = tempdir().unwrap();
        let (path, _conn) = create_ledger(dir.path());

        let points = source(&path).fetch_hourly_fees().await.unwrap();
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_groups_by_hour() {
        let dir = tempdir().unwrap();
        let (path, conn) = create_ledger(dir.path());

        let hour = Utc.with_ymd_and_hms(2021, 8, 5, 14, 0, 0).unwrap().timestamp();

        // 21000 gas at 100 gwei = 0.0021 ether
        insert_transfer(&conn, ALICE, BOB, 21_000, 100 * GWEI, hour + 10);
        insert_transfer(&conn, BOB, ALICE, 21_000, 100 * GWEI, hour + 3599);
        insert_transfer(&conn, ALICE, BOB, 50_000, 20 * GWEI, hour + 3600);

        let points = sorted(source(&path).fetch_hourly_fees().await.unwrap());

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, hour);
        assert_fee(points[0].fee, 0.0042);
        assert_eq!(points[1].timestamp, hour + 3600);
        assert_fee(points[1].fee, 0.001);
    }

    #[tokio::test]
    async fn test_excludes_contract_and_zero_address_transfers() {
        let dir = tempdir().unwrap();
        let (path, conn) = create_ledger(dir.path());

        let hour = Utc.with_ymd_and_hms(2021, 8, 5, 14, 0, 0).unwrap().timestamp();
        let other_hour = hour + 7200;

        insert_transfer(&conn, ALICE, BOB, 21_000, 100 * GWEI, hour + 60);
        insert_transfer(&conn, ALICE, TOKEN, 90_000, 100 * GWEI, hour + 120);
        insert_transfer(&conn, TOKEN, BOB, 90_000, 100 * GWEI, hour + 180);
        insert_transfer(&conn, ZERO_ADDRESS, ALICE, 90_000, 100 * GWEI, hour + 240);
        insert_transfer(&conn, BOB, ZERO_ADDRESS, 90_000, 100 * GWEI, hour + 300);

        // An hour with only excluded transfers is omitted entirely
        insert_transfer(&conn, ALICE, TOKEN, 90_000, 100 * GWEI, other_hour);
        insert_transfer(&conn, ZERO_ADDRESS, BOB, 90_000, 100 * GWEI, other_hour + 1);

        let points = source(&path).fetch_hourly_fees().await.unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, hour);
        assert_fee(points[0].fee, 0.0021);
    }

    #[tokio::test]
    async fn test_null_recipient_excluded() {
        let dir = tempdir().unwrap();
        let (path, conn) = create_ledger(dir.path());

        conn.execute(
            r#"INSERT INTO transactions ("from", "to", gas_used, gas_price, block_time)
               VALUES (?1, NULL, 500000, 1000000000, 7200)"#,
            params![ALICE],
        )
        .unwrap();

        let points = source(&path).fetch_hourly_fees().await.unwrap();
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn test_large_hourly_sum_does_not_overflow() {
        let dir = tempdir().unwrap();
        let (path, conn) = create_ledger(dir.path());

        // Each cost is 3e18 wei; ten of them exceed i64::MAX when summed
        for i in 0..10 {
            insert_transfer(&conn, ALICE, BOB, 30_000_000, 100 * GWEI, 3600 + i);
        }

        let points = source(&path).fetch_hourly_fees().await.unwrap();
        assert_eq!(points.len(), 1);
        assert_fee(points[0].fee, 30.0);
    }

    #[tokio::test]
    async fn test_pre_epoch_bucket() {
        let dir = tempdir().unwrap();
        let (path, conn) = create_ledger(dir.path());

        insert_transfer(&conn, ALICE, BOB, 1, GWEI, -1);

        let points = source(&path).fetch_hourly_fees().await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, -3600);
    }

    fn create_nullable_ledger(dir: &Path) -> (PathBuf, Connection) {
        let path = dir.join("nullable.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            r#"CREATE TABLE transactions ("from" TEXT, "to" TEXT, gas_used INTEGER,
                                          gas_price INTEGER, block_time INTEGER);
               CREATE TABLE contracts (address TEXT);"#,
        )
        .unwrap();
        (path, conn)
    }

    fn insert_null_gas(conn: &Connection, block_time: i64) {
        conn.execute(
            r#"INSERT INTO transactions ("from", "to", gas_used, gas_price, block_time)
               VALUES (?1, ?2, NULL, 1000000000, ?3)"#,
            params![ALICE, BOB, block_time],
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_all_null_costs_fail_decode() {
        let dir = tempdir().unwrap();
        let (path, conn) = create_nullable_ledger(dir.path());

        insert_null_gas(&conn, 3600);

        let err = source(&path).fetch_hourly_fees().await.unwrap_err();
        assert!(matches!(err, DataSourceError::Decode(_)));
    }

    #[tokio::test]
    async fn test_null_cost_ignored_beside_known_costs() {
        let dir = tempdir().unwrap();
        let (path, conn) = create_nullable_ledger(dir.path());

        insert_null_gas(&conn, 3600);
        insert_transfer(&conn, ALICE, BOB, 21_000, 100 * GWEI, 3700);

        let points = source(&path).fetch_hourly_fees().await.unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, 3600);
        assert_fee(points[0].fee, 0.0021);
    }

    #[tokio::test]
    async fn test_missing_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("does_not_exist.db");

        let err = source(&path).fetch_hourly_fees().await.unwrap_err();
        assert!(matches!(
            err,
            DataSourceError::Unavailable(_) | DataSourceError::Query(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_tables_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (id INTEGER)")
            .unwrap();

        let err = source(&path).fetch_hourly_fees().await.unwrap_err();
        assert!(matches!(err, DataSourceError::Query(_)));
    }

    #[tokio::test]
    async fn test_non_integer_hour_fails_decode() {
        let dir = tempdir().unwrap();
        let (path, conn) = create_ledger(dir.path());

        conn.execute(
            r#"INSERT INTO transactions ("from", "to", gas_used, gas_price, block_time)
               VALUES (?1, ?2, 21000, 1000000000, 3600.5)"#,
            params![ALICE, BOB],
        )
        .unwrap();

        let err = source(&path).fetch_hourly_fees().await.unwrap_err();
        assert!(matches!(err, DataSourceError::Decode(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = tempdir().unwrap();
        let (path, _conn) = create_ledger(dir.path());
        assert!(source(&path).health_check().await.is_ok());

        let missing = dir.path().join("missing.db");
        assert!(source(&missing).health_check().await.is_err());
    }

    #[test]
    fn test_from_config() {
        let config = DataSourceConfig {
            path: "/var/lib/feewatch/ledger.db".to_string(),
            busy_timeout_ms: 250,
        };
        let source = SqliteFeeSource::from_config(&config);
        assert_eq!(source.path(), Path::new("/var/lib/feewatch/ledger.db"));
        assert_eq!(source.busy_timeout, Duration::from_millis(250));
    }
}
