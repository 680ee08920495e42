use std::{collections::HashSet, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait,
};
use tokio::fs;

const MIGRATIONS_DIR: &str = "migrations";

pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    let conn = Database::connect(options)
        .await
        .context("connecting to the database")?;
    Ok(conn)
}

/// Applies every `migrations/*.sql` file not yet listed in `schema_migrations`,
/// in filename order, each inside its own transaction.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    conn.execute(Statement::from_string(
        backend,
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    ))
    .await?;

    let applied: HashSet<String> = conn
        .query_all(Statement::from_string(
            backend,
            "SELECT version FROM schema_migrations",
        ))
        .await?
        .iter()
        .map(|row| row.try_get::<String>("", "version"))
        .collect::<Result<_, _>>()?;

    for file in migration_files().await? {
        let version = file
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .with_context(|| format!("unreadable migration name {}", file.display()))?;
        if applied.contains(&version) {
            continue;
        }

        let sql = fs::read_to_string(&file).await?;
        let txn = conn.begin().await?;
        for statement in split_statements(&sql) {
            txn.execute(Statement::from_string(backend, statement))
                .await
                .with_context(|| format!("migration {version} failed"))?;
        }
        txn.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO schema_migrations (version) VALUES ($1) ON CONFLICT DO NOTHING",
            [version.clone().into()],
        ))
        .await?;
        txn.commit().await?;
        tracing::info!(%version, "migration applied");
    }

    Ok(())
}

async fn migration_files() -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(MIGRATIONS_DIR)
        .await
        .with_context(|| format!("reading {MIGRATIONS_DIR}/"))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Postgres prepared statements take one command each.
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| {
            stmt.lines()
                .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"))
        })
        .map(|stmt| format!("{stmt};"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_semicolons_and_drops_empty_chunks() {
        let sql = "CREATE TABLE a (id INT);\n\n-- trailing note\nCREATE INDEX i ON a (id);\n";
        let statements = split_statements(sql);
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE a (id INT);".to_string(),
                "-- trailing note\nCREATE INDEX i ON a (id);".to_string(),
            ]
        );
    }

    #[test]
    fn comment_only_chunk_is_skipped() {
        assert!(split_statements("-- nothing here\n").is_empty());
    }
}
