//! PostgreSQL database connection and schema

use crate::config::PostgresConfig;
use crate::error::Result;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// PostgreSQL connection pool type alias
pub type PostgresPool = PgPool;

/// Initialize the PostgreSQL connection pool
pub async fn init_pool(config: &PostgresConfig) -> Result<PostgresPool> {
    info!("Initializing PostgreSQL connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect(config.url.expose_secret())
        .await?;

    verify_database(&pool).await?;

    info!("PostgreSQL connection pool initialized successfully");
    Ok(pool)
}

/// Verify the connection is usable
pub async fn verify_database(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Database migrations
pub mod migrations {
    use super::*;

    /// Run all migrations
    pub async fn run(pool: &PgPool) -> Result<()> {
        info!("Running database migrations");

        // Problems are authored elsewhere; the worker only reads them
        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS problems (
                id UUID PRIMARY KEY,
                title TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                difficulty TEXT NOT NULL CHECK (difficulty IN ('Easy', 'Medium', 'Hard')),
                category TEXT NOT NULL DEFAULT '',
                prerequisites JSONB NOT NULL DEFAULT '[]',
                starter_code JSONB NOT NULL DEFAULT '{}',
                test_cases JSONB NOT NULL DEFAULT '[]',
                function_metadata JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(pool)
        .await?;

        sqlx::query(r#"
            CREATE TABLE IF NOT EXISTS submissions (
                id UUID PRIMARY KEY,
                problem_id UUID NOT NULL REFERENCES problems(id),
                language TEXT NOT NULL,
                code TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Pending' CHECK (status IN (
                    'Pending', 'Processing', 'Accepted',
                    'Wrong Answer', 'Time Limit Exceeded', 'Error'
                )),
                output JSONB NOT NULL DEFAULT '[]',
                submitted_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#)
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_submissions_problem_id ON submissions(problem_id)")
            .execute(pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_submissions_status ON submissions(status)")
            .execute(pool)
            .await?;

        info!("Database migrations completed");
        Ok(())
    }
}
