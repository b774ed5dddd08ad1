//! PostgreSQL schema migrations for outreach storage.

use sqlx::PgPool;

/// Run all PostgreSQL migrations.
pub async fn run_pg_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leads (
            id TEXT PRIMARY KEY,
            first_name TEXT,
            last_name TEXT,
            vehicle_interest TEXT,
            ai_opt_in BOOLEAN NOT NULL DEFAULT FALSE,
            ai_sequence_paused BOOLEAN NOT NULL DEFAULT FALSE,
            ai_pause_reason TEXT,
            pending_human_response BOOLEAN NOT NULL DEFAULT FALSE,
            human_response_deadline TIMESTAMPTZ,
            next_ai_send_at TIMESTAMPTZ,
            ai_stage TEXT NOT NULL DEFAULT 'initial',
            ai_messages_sent INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS phone_numbers (
            id BIGSERIAL PRIMARY KEY,
            lead_id TEXT NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
            number TEXT NOT NULL,
            is_primary BOOLEAN NOT NULL DEFAULT FALSE,
            UNIQUE (lead_id, number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS conversations (
            id BIGSERIAL PRIMARY KEY,
            lead_id TEXT NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
            direction TEXT NOT NULL,
            body TEXT NOT NULL,
            sms_status TEXT NOT NULL DEFAULT 'pending',
            sent_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            sms_error TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("ALTER TABLE conversations ADD COLUMN IF NOT EXISTS provider_message_id TEXT")
        .execute(pool)
        .await?;

    sqlx::query(
        "ALTER TABLE conversations ADD COLUMN IF NOT EXISTS is_automated BOOLEAN NOT NULL DEFAULT FALSE",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_leads_next_send ON leads (next_ai_send_at)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_leads_deadline ON leads (human_response_deadline)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_phone_numbers_lead ON phone_numbers (lead_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_conversations_lead ON conversations (lead_id)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_conversations_status_sent ON conversations (sms_status, sent_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_conversations_provider_id ON conversations (provider_message_id)",
    )
    .execute(pool)
    .await?;

    tracing::info!("PostgreSQL migrations complete");
    Ok(())
}
