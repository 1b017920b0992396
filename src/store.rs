//! DuckDB access: schema verification and the enrichment query.
//!
//! The source file is expected to carry three relations: `sales` facts plus
//! the `products` and `supervisors` dimensions. Product codes are compared
//! after trimming a canonical string cast, since the fact and dimension
//! tables disagree on padding and type representation.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use duckdb::Connection;

use crate::error::{DashboardError, Result};
use crate::models::RawSaleRow;

pub const SALES: &str = "sales";
pub const PRODUCTS: &str = "products";
pub const SUPERVISORS: &str = "supervisors";

/// Required relations and columns, matched case-insensitively.
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (SALES, &["code", "sales_date", "qty", "route"]),
    (PRODUCTS, &["code", "description", "cake", "cr_bo"]),
    (SUPERVISORS, &["route", "supervisor"]),
];

/// Left joins keep unreconciled sales in the result with NULL dimension
/// columns; an inner join would silently drop them and change the totals.
const ENRICH_QUERY: &str = r#"
    SELECT
        CAST(s.Sales_Date AS VARCHAR) AS sales_date,
        CAST(s.Route AS VARCHAR) AS route,
        CAST(p.Cr_Bo AS DOUBLE) AS crates_box,
        CASE
            WHEN p.Cake IS NOT NULL AND p.Cake <> 0
                THEN CAST(s.Qty AS DOUBLE) / CAST(p.Cake AS DOUBLE)
            ELSE NULL
        END AS crt_box,
        CAST(sup.Supervisor AS VARCHAR) AS supervisor
    FROM sales AS s
    LEFT JOIN products AS p
        ON TRIM(CAST(s.Code AS VARCHAR)) = TRIM(CAST(p.Code AS VARCHAR))
    LEFT JOIN supervisors AS sup
        ON s.Route = sup.Route
"#;

/// Open the local database file and verify the expected schema.
pub fn open(path: &Path) -> Result<Connection> {
    if !path.exists() {
        return Err(DashboardError::SourceMissing(path.to_path_buf()));
    }
    let conn = Connection::open(path)?;
    verify_schema(&conn)?;
    Ok(conn)
}

/// Fatal startup check: every required relation and column must be present.
pub fn verify_schema(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare("SELECT lower(table_name), lower(column_name) FROM information_schema.columns")?;
    let mut columns: HashMap<String, HashSet<String>> = HashMap::new();
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (table, column) = row?;
        columns.entry(table).or_default().insert(column);
    }

    for (relation, required) in REQUIRED_COLUMNS {
        match columns.get(*relation) {
            None => return Err(DashboardError::MissingRelation((*relation).to_string())),
            Some(present) => {
                for column in *required {
                    if !present.contains(*column) {
                        return Err(DashboardError::MissingColumn {
                            relation: (*relation).to_string(),
                            column: (*column).to_string(),
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

/// Run the enrichment join and materialize the full result set.
pub fn load_enriched(conn: &Connection) -> Result<Vec<RawSaleRow>> {
    let mut stmt = conn.prepare(ENRICH_QUERY)?;
    let rows = stmt.query_map([], |row| {
        Ok(RawSaleRow {
            sales_date: row.get(0)?,
            route: row.get(1)?,
            crates_box: row.get(2)?,
            ratio: row.get(3)?,
            supervisor: row.get(4)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Row counts per source relation.
pub fn relation_counts(conn: &Connection) -> Result<Vec<(String, i64)>> {
    let mut out = Vec::new();
    for (relation, _) in REQUIRED_COLUMNS {
        let count: i64 =
            conn.query_row(&format!("SELECT count(*) FROM {}", relation), [], |row| {
                row.get(0)
            })?;
        out.push(((*relation).to_string(), count));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_with_schema() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE sales (Code VARCHAR, Sales_Date VARCHAR, Qty INTEGER, Route VARCHAR);
            CREATE TABLE products (Code VARCHAR, Description VARCHAR, Cake DOUBLE, Cr_Bo DOUBLE);
            CREATE TABLE supervisors (Route VARCHAR, Supervisor VARCHAR);
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn schema_check_passes_on_complete_schema() {
        let conn = conn_with_schema();
        verify_schema(&conn).unwrap();
    }

    #[test]
    fn missing_relation_is_fatal() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE sales (Code VARCHAR, Sales_Date VARCHAR, Qty INTEGER, Route VARCHAR);
            CREATE TABLE products (Code VARCHAR, Description VARCHAR, Cake DOUBLE, Cr_Bo DOUBLE);
            "#,
        )
        .unwrap();
        let err = verify_schema(&conn).unwrap_err();
        assert!(matches!(err, DashboardError::MissingRelation(r) if r == "supervisors"));
    }

    #[test]
    fn missing_column_is_fatal() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE sales (Code VARCHAR, Sales_Date VARCHAR, Qty INTEGER, Route VARCHAR);
            CREATE TABLE products (Code VARCHAR, Description VARCHAR, Cake DOUBLE);
            CREATE TABLE supervisors (Route VARCHAR, Supervisor VARCHAR);
            "#,
        )
        .unwrap();
        let err = verify_schema(&conn).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingColumn { relation, column } if relation == "products" && column == "cr_bo"
        ));
    }

    #[test]
    fn padded_codes_still_join() {
        let conn = conn_with_schema();
        conn.execute_batch(
            r#"
            INSERT INTO sales VALUES ('  1 ', '2024-01-01', 10, 'A');
            INSERT INTO products VALUES ('1', 'Sliced loaf', 5, 12);
            INSERT INTO supervisors VALUES ('A', 'X');
            "#,
        )
        .unwrap();
        let rows = load_enriched(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ratio, Some(2.0));
        assert_eq!(rows[0].crates_box, Some(12.0));
        assert_eq!(rows[0].supervisor.as_deref(), Some("X"));
    }

    #[test]
    fn unmatched_product_keeps_the_sale() {
        let conn = conn_with_schema();
        conn.execute_batch(
            r#"
            INSERT INTO sales VALUES ('999', '2024-01-01', 10, 'A');
            INSERT INTO supervisors VALUES ('A', 'X');
            "#,
        )
        .unwrap();
        let rows = load_enriched(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ratio, None);
        assert_eq!(rows[0].crates_box, None);
        assert_eq!(rows[0].supervisor.as_deref(), Some("X"));
    }

    #[test]
    fn zero_cake_yields_null_ratio() {
        let conn = conn_with_schema();
        conn.execute_batch(
            r#"
            INSERT INTO sales VALUES ('1', '2024-01-01', 10, 'A');
            INSERT INTO products VALUES ('1', 'Sampler', 0, 12);
            "#,
        )
        .unwrap();
        let rows = load_enriched(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ratio, None);
    }

    #[test]
    fn unmapped_route_keeps_the_sale_with_null_supervisor() {
        let conn = conn_with_schema();
        conn.execute_batch(
            r#"
            INSERT INTO sales VALUES ('1', '2024-01-01', 10, 'B');
            INSERT INTO products VALUES ('1', 'Sliced loaf', 5, 12);
            INSERT INTO supervisors VALUES ('A', 'X');
            "#,
        )
        .unwrap();
        let rows = load_enriched(&conn).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ratio, Some(2.0));
        assert_eq!(rows[0].supervisor, None);
    }

    #[test]
    fn relation_counts_cover_all_three_relations() {
        let conn = conn_with_schema();
        conn.execute("INSERT INTO sales VALUES ('1', '2024-01-01', 10, 'A')", [])
            .unwrap();
        let counts = relation_counts(&conn).unwrap();
        assert_eq!(counts.len(), 3);
        assert_eq!(counts[0], ("sales".to_string(), 1));
    }
}
