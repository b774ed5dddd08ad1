//! LeadStore implementation for PgStorage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outreach_core::{AiStage, Lead, NewLead, PauseReason};

use super::{LEAD_COLUMNS, PgStorage, expect_lead_updated, row_to_lead, usize_to_i64};
use crate::error::StorageError;
use crate::traits::LeadStore;

impl PgStorage {
    async fn fetch_leads(
        &self,
        sql: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError> {
        let rows = sqlx::query(sql)
            .bind(now)
            .bind(usize_to_i64(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_lead).collect()
    }
}

#[async_trait]
impl LeadStore for PgStorage {
    async fn insert_lead(&self, input: &NewLead, now: DateTime<Utc>) -> Result<Lead, StorageError> {
        let id = input.id_or_generate();
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "INSERT INTO leads
               (id, first_name, last_name, vehicle_interest, ai_opt_in, next_ai_send_at,
                ai_stage, ai_messages_sent, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, 'initial', 0, $7)
             RETURNING {LEAD_COLUMNS}"
        ))
        .bind(&id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.vehicle_interest)
        .bind(input.ai_opt_in)
        .bind(input.next_ai_send_at)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        if let Some(number) = input.phone.as_deref().filter(|n| !n.trim().is_empty()) {
            sqlx::query(
                "INSERT INTO phone_numbers (lead_id, number, is_primary) VALUES ($1, $2, TRUE)",
            )
            .bind(&id)
            .bind(number.trim())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        row_to_lead(&row)
    }

    async fn get_lead(&self, id: &str) -> Result<Option<Lead>, StorageError> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| row_to_lead(&r)).transpose()
    }

    async fn add_lead_phone(
        &self,
        lead_id: &str,
        number: &str,
        is_primary: bool,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM leads WHERE id = $1)")
            .bind(lead_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(StorageError::not_found("lead", lead_id));
        }
        if is_primary {
            sqlx::query("UPDATE phone_numbers SET is_primary = FALSE WHERE lead_id = $1")
                .bind(lead_id)
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query(
            "INSERT INTO phone_numbers (lead_id, number, is_primary) VALUES ($1, $2, $3)
             ON CONFLICT (lead_id, number) DO UPDATE SET is_primary = EXCLUDED.is_primary",
        )
        .bind(lead_id)
        .bind(number)
        .bind(is_primary)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_primary_phone(&self, lead_id: &str) -> Result<Option<String>, StorageError> {
        let number = sqlx::query_scalar(
            "SELECT number FROM phone_numbers
             WHERE lead_id = $1 AND is_primary
             ORDER BY id DESC LIMIT 1",
        )
        .bind(lead_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(number)
    }

    async fn find_due_leads(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError> {
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads
             WHERE ai_opt_in
               AND NOT ai_sequence_paused
               AND NOT pending_human_response
               AND next_ai_send_at IS NOT NULL
               AND next_ai_send_at <= $1
             ORDER BY next_ai_send_at ASC, id ASC
             LIMIT $2"
        );
        self.fetch_leads(&sql, now, limit).await
    }

    async fn claim_scheduled_send(
        &self,
        id: &str,
        expected: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE leads SET next_ai_send_at = NULL WHERE id = $1 AND next_ai_send_at = $2",
        )
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn record_send_success(
        &self,
        id: &str,
        next_stage: AiStage,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE leads
             SET ai_messages_sent = ai_messages_sent + 1,
                 ai_stage = $2,
                 next_ai_send_at = $3,
                 ai_pause_reason = NULL
             WHERE id = $1",
        )
        .bind(id)
        .bind(next_stage.as_str())
        .bind(next_send_at)
        .execute(&self.pool)
        .await?;
        expect_lead_updated(result.rows_affected(), id)
    }

    async fn pause_sequence(&self, id: &str, reason: PauseReason) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE leads SET ai_sequence_paused = TRUE, ai_pause_reason = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(reason.as_str())
        .execute(&self.pool)
        .await?;
        expect_lead_updated(result.rows_affected(), id)
    }

    async fn reschedule_after_error(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
        reason: PauseReason,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE leads SET next_ai_send_at = $2, ai_pause_reason = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(retry_at)
        .bind(reason.as_str())
        .execute(&self.pool)
        .await?;
        expect_lead_updated(result.rows_affected(), id)
    }

    async fn find_takeover_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError> {
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads
             WHERE ai_opt_in
               AND pending_human_response
               AND human_response_deadline IS NOT NULL
               AND human_response_deadline <= $1
             ORDER BY human_response_deadline ASC, id ASC
             LIMIT $2"
        );
        self.fetch_leads(&sql, now, limit).await
    }

    async fn claim_takeover(
        &self,
        id: &str,
        expected: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "UPDATE leads SET human_response_deadline = NULL
             WHERE id = $1 AND pending_human_response AND human_response_deadline = $2",
        )
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn complete_takeover(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE leads
             SET pending_human_response = FALSE,
                 human_response_deadline = NULL,
                 ai_messages_sent = ai_messages_sent + 1,
                 next_ai_send_at = $2
             WHERE id = $1",
        )
        .bind(id)
        .bind(next_send_at)
        .execute(&self.pool)
        .await?;
        expect_lead_updated(result.rows_affected(), id)
    }

    async fn reschedule_takeover(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query("UPDATE leads SET human_response_deadline = $2 WHERE id = $1")
            .bind(id)
            .bind(retry_at)
            .execute(&self.pool)
            .await?;
        expect_lead_updated(result.rows_affected(), id)
    }

    async fn request_human_response(
        &self,
        id: &str,
        deadline: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE leads SET pending_human_response = TRUE, human_response_deadline = $2
             WHERE id = $1",
        )
        .bind(id)
        .bind(deadline)
        .execute(&self.pool)
        .await?;
        expect_lead_updated(result.rows_affected(), id)
    }

    async fn resume_sequence(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE leads
             SET ai_sequence_paused = FALSE, ai_pause_reason = NULL, next_ai_send_at = $2
             WHERE id = $1",
        )
        .bind(id)
        .bind(next_send_at)
        .execute(&self.pool)
        .await?;
        expect_lead_updated(result.rows_affected(), id)
    }

    async fn set_ai_opt_in(&self, id: &str, opt_in: bool) -> Result<(), StorageError> {
        let result = if opt_in {
            sqlx::query("UPDATE leads SET ai_opt_in = TRUE WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query(
                "UPDATE leads
                 SET ai_opt_in = FALSE, ai_sequence_paused = TRUE, ai_pause_reason = $2
                 WHERE id = $1",
            )
            .bind(id)
            .bind(PauseReason::OptedOut.as_str())
            .execute(&self.pool)
            .await?
        };
        expect_lead_updated(result.rows_affected(), id)
    }
}
