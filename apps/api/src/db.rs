use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &str = include_str!("../migrations/0001_init.sql");

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Applies the schema. Every statement is idempotent, so this runs on each boot.
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
    let statements = schema_statements(SCHEMA);
    for statement in &statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Schema statement failed: {statement}"))?;
    }
    info!("Database schema applied ({} statements)", statements.len());
    Ok(())
}

fn schema_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_splits_into_statements() {
        let statements = schema_statements(SCHEMA);
        assert!(statements.iter().any(|s| s.starts_with("CREATE TABLE IF NOT EXISTS jobs")));
        assert!(statements.iter().all(|s| !s.ends_with(';')));
    }
}
