//! Demo database seeding.
//!
//! Builds a DuckDB file carrying the three source relations, including the
//! data quirks the pipeline has to survive: whitespace-padded product codes,
//! a zero cake-count product, an unreconciled product code, a route without
//! a supervisor, and one unparseable sale date.

use chrono::{Duration, NaiveDate};
use duckdb::{params, Connection};
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct SeedSpec {
    pub rows: usize,
    pub routes: usize,
    pub days: i64,
    pub start_date: NaiveDate,
    pub seed: u64,
}

impl Default for SeedSpec {
    fn default() -> Self {
        Self {
            rows: 500,
            routes: 8,
            days: 30,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            seed: 42,
        }
    }
}

#[derive(Debug)]
pub struct SeedStats {
    pub sales: usize,
    pub products: usize,
    pub supervisors: usize,
}

const SUPERVISORS: [&str; 6] = ["Adams", "Baker", "Castillo", "Dimitrov", "Ekwueme", "Farouk"];

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sales (
            Code VARCHAR,
            Sales_Date VARCHAR,
            Qty INTEGER,
            Route VARCHAR
        );
        CREATE TABLE IF NOT EXISTS products (
            Code VARCHAR,
            Description VARCHAR,
            Cake DOUBLE,
            Cr_Bo DOUBLE
        );
        CREATE TABLE IF NOT EXISTS supervisors (
            Route VARCHAR,
            Supervisor VARCHAR
        );
        "#,
    )?;
    Ok(())
}

pub fn seed(conn: &Connection, spec: &SeedSpec) -> Result<SeedStats> {
    create_schema(conn)?;
    let mut rng = StdRng::seed_from_u64(spec.seed);

    // Product dimension. Code 199 has a zero cake count, so its sales get a
    // NULL ratio.
    let cakes = [4.0, 5.0, 6.0, 8.0, 12.0];
    let crates = [12.0, 24.0, 36.0];
    let mut products: Vec<(String, String, f64, f64)> = (0..10)
        .map(|i| {
            (
                format!("{}", 100 + i),
                format!("Product {}", 100 + i),
                cakes[i % cakes.len()],
                crates[i % crates.len()],
            )
        })
        .collect();
    products.push(("199".to_string(), "Legacy sampler".to_string(), 0.0, 12.0));

    for (code, description, cake, cr_bo) in &products {
        conn.execute(
            "INSERT INTO products (Code, Description, Cake, Cr_Bo) VALUES (?, ?, ?, ?)",
            params![code, description, cake, cr_bo],
        )?;
    }

    // Route/supervisor dimension. The last route is left unmapped.
    let routes: Vec<String> = (0..spec.routes.max(2))
        .map(|i| format!("R{:02}", i + 1))
        .collect();
    let mut supervisor_rows = 0;
    for (i, route) in routes.iter().enumerate().take(routes.len() - 1) {
        conn.execute(
            "INSERT INTO supervisors (Route, Supervisor) VALUES (?, ?)",
            params![route, SUPERVISORS[i % SUPERVISORS.len()]],
        )?;
        supervisor_rows += 1;
    }

    // Sales facts. Codes are sometimes padded, occasionally unknown.
    let mut sales_rows = 0;
    for _ in 0..spec.rows {
        let route = routes.choose(&mut rng).unwrap().clone();
        let (code, _, _, _) = products.choose(&mut rng).unwrap();
        let code = if rng.gen_bool(0.03) {
            "999".to_string()
        } else {
            match rng.gen_range(0..4) {
                0 => format!(" {}", code),
                1 => format!("{} ", code),
                _ => code.clone(),
            }
        };
        let date = spec.start_date + Duration::days(rng.gen_range(0..spec.days.max(1)));
        let qty: i32 = rng.gen_range(1..=120);
        conn.execute(
            "INSERT INTO sales (Code, Sales_Date, Qty, Route) VALUES (?, ?, ?, ?)",
            params![code, date.format("%Y-%m-%d").to_string(), qty, route],
        )?;
        sales_rows += 1;
    }

    // One row the date coercion must drop.
    conn.execute(
        "INSERT INTO sales (Code, Sales_Date, Qty, Route) VALUES (?, ?, ?, ?)",
        params!["100", "not-a-date", 10, routes[0]],
    )?;
    sales_rows += 1;

    Ok(SeedStats {
        sales: sales_rows,
        products: products.len(),
        supervisors: supervisor_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{pipeline, store};

    #[test]
    fn seeded_database_passes_schema_check_and_loads() {
        let conn = Connection::open_in_memory().unwrap();
        let spec = SeedSpec {
            rows: 50,
            ..SeedSpec::default()
        };
        let stats = seed(&conn, &spec).unwrap();
        assert_eq!(stats.sales, 51);

        store::verify_schema(&conn).unwrap();
        let raw = store::load_enriched(&conn).unwrap();
        assert_eq!(raw.len(), 51);

        // The invalid-date row is dropped by coercion, nothing else is.
        let rows = pipeline::coerce_dates(raw);
        assert_eq!(rows.len(), 50);
    }

    #[test]
    fn seeding_is_deterministic_for_a_seed() {
        let spec = SeedSpec {
            rows: 20,
            ..SeedSpec::default()
        };
        let load = |spec: &SeedSpec| {
            let conn = Connection::open_in_memory().unwrap();
            seed(&conn, spec).unwrap();
            let rows = pipeline::coerce_dates(store::load_enriched(&conn).unwrap());
            pipeline::pivot(&rows)
        };
        let a = load(&spec);
        let b = load(&spec);
        assert_eq!(a.dates, b.dates);
        assert_eq!(a.rows.len(), b.rows.len());
        for (ra, rb) in a.rows.iter().zip(&b.rows) {
            assert_eq!(ra.route, rb.route);
            assert_eq!(ra.total, rb.total);
        }
    }
}
