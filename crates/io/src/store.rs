// SQLite-backed MID metric store.
//
// Report runs open the database read-only and issue three grouped queries.
// The schema constant exists so tests and fixtures can build a conforming
// database; the report path itself never writes.

use std::fmt;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OpenFlags};

use midio_report::{MetricRow, MidRecord, Month};

/// Dispute statuses whose incidents count as chargebacks. The set comes
/// from the dispute workflow; the report treats it as opaque.
const ACTIVE_DISPUTE_STATUS_CODES: [i64; 4] = [1, 2, 4, -1];

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS mid (
    id INTEGER PRIMARY KEY,
    mid TEXT NOT NULL,
    portal_account_id INTEGER,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS credentials (
    id INTEGER PRIMARY KEY,
    portal_account_id INTEGER,
    company_id INTEGER
);

CREATE TABLE IF NOT EXISTS chargeback_incident (
    id INTEGER PRIMARY KEY,
    mid_id INTEGER NOT NULL,
    dispute_case_id INTEGER,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS dispute_case (
    id INTEGER PRIMARY KEY,
    status_code INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS prevention_case (
    id INTEGER PRIMARY KEY,
    mid_id INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
"#;

#[derive(Debug)]
pub enum StoreError {
    /// The database could not be opened.
    Connection { path: String, message: String },
    /// A query failed.
    Query(String),
    /// A stored value did not parse.
    BadRow { field: String, value: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection { path, message } => {
                write!(f, "cannot open database '{path}': {message}")
            }
            Self::Query(msg) => write!(f, "query failed: {msg}"),
            Self::BadRow { field, value } => {
                write!(f, "field '{field}': cannot parse '{value}'")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Handle to the report database. Scoped to one run; the connection is
/// released when the handle drops, on success and failure alike.
#[derive(Debug)]
pub struct MidStore {
    conn: Connection,
}

impl MidStore {
    /// Open an existing database read-only.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| StoreError::Connection {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { conn })
    }

    /// In-memory store for tests and fixtures. Writable so [`SCHEMA`] can
    /// be applied.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Connection {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { conn })
    }

    /// Create the report tables.
    pub fn create_schema(&self) -> Result<(), StoreError> {
        self.conn
            .execute_batch(SCHEMA)
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// One record per distinct mid label: the earliest creation date wins
    /// and the company id resolves through the credentials join. Mids
    /// without credentials keep a NULL company.
    pub fn all_mids(&self) -> Result<Vec<MidRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "select m.id as mid_id, m.mid, min(m.created_at) as created_at, \
                        c.company_id \
                 from mid m \
                 left join credentials c on c.portal_account_id = m.portal_account_id \
                 group by m.mid \
                 order by mid_id",
            )
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                let mid_id: i64 = row.get(0)?;
                let mid: String = row.get(1)?;
                let created_at: String = row.get(2)?;
                let company_id: Option<i64> = row.get(3)?;
                Ok((mid_id, mid, created_at, company_id))
            })
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let (mid_id, mid, created_at, company_id) =
                row.map_err(|e| StoreError::Query(e.to_string()))?;
            let created_at = parse_stored_date("created_at", &created_at)?;
            records.push(MidRecord { mid_id, mid, created_at, company_id });
        }
        Ok(records)
    }

    /// Chargeback incidents per (mid, month): distinct incidents joined to
    /// their dispute case, restricted to the active status-code set. The
    /// caller passes the already-filtered id set.
    pub fn chargeback_counts(&self, mid_ids: &[i64]) -> Result<Vec<MetricRow>, StoreError> {
        let sql = format!(
            "select ci.mid_id, \
                    coalesce(strftime('%Y-%m', ci.created_at), ci.created_at) as month, \
                    count(distinct ci.id) as cb_count \
             from chargeback_incident ci \
             join dispute_case dc on dc.id = ci.dispute_case_id \
             where ci.mid_id in ({ids}) and dc.status_code in ({codes}) \
             group by ci.mid_id, month \
             order by ci.mid_id, month",
            ids = placeholders(mid_ids.len()),
            codes = status_code_list(),
        );
        self.metric_rows(&sql, mid_ids)
    }

    /// Prevention cases per (mid, month).
    pub fn alert_counts(&self, mid_ids: &[i64]) -> Result<Vec<MetricRow>, StoreError> {
        let sql = format!(
            "select pc.mid_id, \
                    coalesce(strftime('%Y-%m', pc.created_at), pc.created_at) as month, \
                    count(distinct pc.id) as alert_count \
             from prevention_case pc \
             where pc.mid_id in ({ids}) \
             group by pc.mid_id, month \
             order by pc.mid_id, month",
            ids = placeholders(mid_ids.len()),
        );
        self.metric_rows(&sql, mid_ids)
    }

    /// Run a grouped metric query over the id set. An empty set returns no
    /// rows without touching the database; the `IN` list is never empty.
    /// Unparseable dates fall through `coalesce` raw, so the error names
    /// the offending value.
    fn metric_rows(&self, sql: &str, mid_ids: &[i64]) -> Result<Vec<MetricRow>, StoreError> {
        if mid_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(mid_ids.iter()), |row| {
                let mid_id: i64 = row.get(0)?;
                let month: String = row.get(1)?;
                let count: i64 = row.get(2)?;
                Ok((mid_id, month, count))
            })
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let mut metrics = Vec::new();
        for row in rows {
            let (mid_id, month_key, count) = row.map_err(|e| StoreError::Query(e.to_string()))?;
            let month = Month::from_group_key(&month_key).map_err(|_| StoreError::BadRow {
                field: "month".to_string(),
                value: month_key.clone(),
            })?;
            metrics.push(MetricRow { mid_id, month, count });
        }
        Ok(metrics)
    }
}

/// Stored timestamps are TEXT: either a bare date or a full datetime.
fn parse_stored_date(field: &str, value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
        })
        .map_err(|_| StoreError::BadRow {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn status_code_list() -> String {
    ACTIVE_DISPUTE_STATUS_CODES.map(|code| code.to_string()).join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store(fixtures: &str) -> MidStore {
        let store = MidStore::open_in_memory().unwrap();
        store.create_schema().unwrap();
        store.conn.execute_batch(fixtures).unwrap();
        store
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn month(year: i32, month: u32) -> Month {
        Month { year, month }
    }

    #[test]
    fn all_mids_resolves_company_via_credentials() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', 10, '2017-01-10'),
                 (2, 'MID-002', NULL, '2017-02-01');
             INSERT INTO credentials (id, portal_account_id, company_id) VALUES
                 (100, 10, 501);",
        );

        let mids = store.all_mids().unwrap();
        assert_eq!(mids.len(), 2);
        assert_eq!(mids[0].mid, "MID-001");
        assert_eq!(mids[0].company_id, Some(501));
        assert_eq!(mids[1].company_id, None);
    }

    #[test]
    fn all_mids_dedupes_labels_to_earliest() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, '2017-02-01'),
                 (2, 'MID-001', NULL, '2016-12-15');",
        );

        let mids = store.all_mids().unwrap();
        assert_eq!(mids.len(), 1);
        assert_eq!(mids[0].created_at, date("2016-12-15"));
        assert_eq!(mids[0].mid_id, 2);
    }

    #[test]
    fn all_mids_ordered_by_id() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (3, 'MID-C', NULL, '2017-01-01'),
                 (1, 'MID-A', NULL, '2017-01-02'),
                 (2, 'MID-B', NULL, '2017-01-03');",
        );

        let ids: Vec<i64> = store.all_mids().unwrap().iter().map(|m| m.mid_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn datetime_created_at_truncates_to_date() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, '2017-01-10 14:30:00');",
        );

        let mids = store.all_mids().unwrap();
        assert_eq!(mids[0].created_at, date("2017-01-10"));
    }

    #[test]
    fn malformed_created_at_names_field() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, 'soon');",
        );

        match store.all_mids().unwrap_err() {
            StoreError::BadRow { field, value } => {
                assert_eq!(field, "created_at");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn inactive_dispute_statuses_excluded() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, '2017-01-01');
             INSERT INTO dispute_case (id, status_code) VALUES
                 (1, 1), (2, 2), (3, 4), (4, -1), (5, 0), (6, 3);
             INSERT INTO chargeback_incident (id, mid_id, dispute_case_id, created_at) VALUES
                 (1, 1, 1, '2017-01-05'),
                 (2, 1, 2, '2017-01-06'),
                 (3, 1, 3, '2017-01-07'),
                 (4, 1, 4, '2017-01-08'),
                 (5, 1, 5, '2017-01-09'),
                 (6, 1, 6, '2017-01-10');",
        );

        let rows = store.chargeback_counts(&[1]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].month, month(2017, 1));
        assert_eq!(rows[0].count, 4);
    }

    #[test]
    fn incidents_sharing_a_case_each_count() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, '2017-01-01');
             INSERT INTO dispute_case (id, status_code) VALUES (1, 1);
             INSERT INTO chargeback_incident (id, mid_id, dispute_case_id, created_at) VALUES
                 (1, 1, 1, '2017-01-05'),
                 (2, 1, 1, '2017-01-06');",
        );

        let rows = store.chargeback_counts(&[1]).unwrap();
        assert_eq!(rows[0].count, 2);
    }

    #[test]
    fn incidents_without_a_case_do_not_count() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, '2017-01-01');
             INSERT INTO chargeback_incident (id, mid_id, dispute_case_id, created_at) VALUES
                 (1, 1, NULL, '2017-01-05');",
        );

        assert!(store.chargeback_counts(&[1]).unwrap().is_empty());
    }

    #[test]
    fn months_group_separately() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, '2017-01-01');
             INSERT INTO dispute_case (id, status_code) VALUES (1, 1), (2, 2);
             INSERT INTO chargeback_incident (id, mid_id, dispute_case_id, created_at) VALUES
                 (1, 1, 1, '2017-01-31'),
                 (2, 1, 2, '2017-02-01');",
        );

        let rows = store.chargeback_counts(&[1]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].month, rows[0].count), (month(2017, 1), 1));
        assert_eq!((rows[1].month, rows[1].count), (month(2017, 2), 1));
    }

    #[test]
    fn only_requested_mids_counted() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, '2017-01-01'),
                 (2, 'MID-002', NULL, '2017-01-01');
             INSERT INTO prevention_case (id, mid_id, created_at) VALUES
                 (1, 1, '2017-01-05'),
                 (2, 2, '2017-01-06');",
        );

        let rows = store.alert_counts(&[1]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mid_id, 1);
    }

    #[test]
    fn alerts_group_by_month() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, '2017-01-01');
             INSERT INTO prevention_case (id, mid_id, created_at) VALUES
                 (1, 1, '2017-02-03'),
                 (2, 1, '2017-02-17'),
                 (3, 1, '2017-03-01');",
        );

        let rows = store.alert_counts(&[1]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!((rows[0].month, rows[0].count), (month(2017, 2), 2));
        assert_eq!((rows[1].month, rows[1].count), (month(2017, 3), 1));
    }

    #[test]
    fn bad_incident_date_names_month_field() {
        let store = seeded_store(
            "INSERT INTO mid (id, mid, portal_account_id, created_at) VALUES
                 (1, 'MID-001', NULL, '2017-01-01');
             INSERT INTO prevention_case (id, mid_id, created_at) VALUES
                 (1, 1, 'not-a-date');",
        );

        match store.alert_counts(&[1]).unwrap_err() {
            StoreError::BadRow { field, value } => {
                assert_eq!(field, "month");
                assert_eq!(value, "not-a-date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_id_set_skips_the_database() {
        // No schema applied: an empty set must short-circuit before any query.
        let store = MidStore::open_in_memory().unwrap();
        assert!(store.chargeback_counts(&[]).unwrap().is_empty());
        assert!(store.alert_counts(&[]).unwrap().is_empty());
    }

    #[test]
    fn open_missing_file_is_a_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MidStore::open(&dir.path().join("missing.db")).unwrap_err();
        assert!(matches!(err, StoreError::Connection { .. }));
    }
}
