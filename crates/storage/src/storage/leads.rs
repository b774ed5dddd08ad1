use chrono::{DateTime, Utc};
use outreach_core::{AiStage, Lead, NewLead, PauseReason};
use rusqlite::{Connection, OptionalExtension, params};

use super::{Storage, from_millis, get_conn, log_row_error, opt_from_millis, to_millis};
use crate::error::StorageError;

const LEAD_COLUMNS: &str = "id, first_name, last_name, vehicle_interest, ai_opt_in,
    ai_sequence_paused, ai_pause_reason, pending_human_response, human_response_deadline,
    next_ai_send_at, ai_stage, ai_messages_sent, created_at";

fn row_to_lead(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    let reason: Option<String> = row.get(6)?;
    let stage: String = row.get(10)?;
    Ok(Lead {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        vehicle_interest: row.get(3)?,
        ai_opt_in: row.get(4)?,
        ai_sequence_paused: row.get(5)?,
        ai_pause_reason: PauseReason::parse_stored(reason.as_deref()),
        pending_human_response: row.get(7)?,
        human_response_deadline: opt_from_millis(8, row.get(8)?)?,
        next_ai_send_at: opt_from_millis(9, row.get(9)?)?,
        ai_stage: AiStage::parse_lenient(&stage),
        ai_messages_sent: row.get(11)?,
        created_at: from_millis(12, row.get(12)?)?,
    })
}

fn query_lead(conn: &Connection, id: &str) -> Result<Option<Lead>, StorageError> {
    let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], row_to_lead).optional()?)
}

fn query_leads(
    conn: &Connection,
    sql: &str,
    now: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<Lead>, StorageError> {
    let mut stmt = conn.prepare(sql)?;
    let leads = stmt
        .query_map(params![to_millis(now), limit as i64], row_to_lead)?
        .filter_map(log_row_error)
        .collect();
    Ok(leads)
}

fn expect_updated(changed: usize, id: &str) -> Result<(), StorageError> {
    if changed == 0 {
        return Err(StorageError::not_found("lead", id));
    }
    Ok(())
}

impl Storage {
    /// Insert a lead and, if given, its primary phone number.
    ///
    /// # Errors
    /// Returns `Duplicate` if the id is taken, or a database error.
    pub fn insert_lead(&self, input: &NewLead, now: DateTime<Utc>) -> Result<Lead, StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let id = input.id_or_generate();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO leads
               (id, first_name, last_name, vehicle_interest, ai_opt_in, next_ai_send_at,
                ai_stage, ai_messages_sent, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'initial', 0, ?7)",
            params![
                id,
                input.first_name,
                input.last_name,
                input.vehicle_interest,
                input.ai_opt_in,
                input.next_ai_send_at.map(to_millis),
                to_millis(now),
            ],
        )?;
        if let Some(number) = input.phone.as_deref().filter(|n| !n.trim().is_empty()) {
            tx.execute(
                "INSERT INTO phone_numbers (lead_id, number, is_primary) VALUES (?1, ?2, 1)",
                params![id, number.trim()],
            )?;
        }
        tx.commit()?;
        query_lead(&conn, &id)?.ok_or_else(|| StorageError::not_found("lead", id))
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_lead(&self, id: &str) -> Result<Option<Lead>, StorageError> {
        let conn = get_conn(&self.pool)?;
        query_lead(&conn, id)
    }

    /// # Errors
    /// Returns `NotFound` if the lead does not exist.
    pub fn add_lead_phone(
        &self,
        lead_id: &str,
        number: &str,
        is_primary: bool,
    ) -> Result<(), StorageError> {
        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction()?;
        let exists: bool =
            tx.query_row("SELECT EXISTS(SELECT 1 FROM leads WHERE id = ?1)", params![lead_id], |row| {
                row.get(0)
            })?;
        if !exists {
            return Err(StorageError::not_found("lead", lead_id));
        }
        if is_primary {
            tx.execute("UPDATE phone_numbers SET is_primary = 0 WHERE lead_id = ?1", params![
                lead_id
            ])?;
        }
        tx.execute(
            "INSERT INTO phone_numbers (lead_id, number, is_primary) VALUES (?1, ?2, ?3)
               ON CONFLICT (lead_id, number) DO UPDATE SET is_primary = excluded.is_primary",
            params![lead_id, number, is_primary],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn get_primary_phone(&self, lead_id: &str) -> Result<Option<String>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let number = conn
            .query_row(
                "SELECT number FROM phone_numbers
                   WHERE lead_id = ?1 AND is_primary = 1
                   ORDER BY id DESC LIMIT 1",
                params![lead_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(number)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn find_due_leads(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads
               WHERE ai_opt_in = 1
                 AND ai_sequence_paused = 0
                 AND pending_human_response = 0
                 AND next_ai_send_at IS NOT NULL
                 AND next_ai_send_at <= ?1
               ORDER BY next_ai_send_at ASC, id ASC
               LIMIT ?2"
        );
        query_leads(&conn, &sql, now, limit)
    }

    /// # Errors
    /// Returns error if database update fails.
    pub fn claim_scheduled_send(
        &self,
        id: &str,
        expected: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE leads SET next_ai_send_at = NULL
               WHERE id = ?1 AND next_ai_send_at = ?2",
            params![id, to_millis(expected)],
        )?;
        Ok(changed == 1)
    }

    /// # Errors
    /// Returns `NotFound` if the lead does not exist.
    pub fn record_send_success(
        &self,
        id: &str,
        next_stage: AiStage,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE leads
               SET ai_messages_sent = ai_messages_sent + 1,
                   ai_stage = ?2,
                   next_ai_send_at = ?3,
                   ai_pause_reason = NULL
               WHERE id = ?1",
            params![id, next_stage.as_str(), to_millis(next_send_at)],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns `NotFound` if the lead does not exist.
    pub fn pause_sequence(&self, id: &str, reason: PauseReason) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE leads SET ai_sequence_paused = 1, ai_pause_reason = ?2 WHERE id = ?1",
            params![id, reason.as_str()],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns `NotFound` if the lead does not exist.
    pub fn reschedule_after_error(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
        reason: PauseReason,
    ) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE leads SET next_ai_send_at = ?2, ai_pause_reason = ?3 WHERE id = ?1",
            params![id, to_millis(retry_at), reason.as_str()],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns error if database query fails.
    pub fn find_takeover_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Lead>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {LEAD_COLUMNS} FROM leads
               WHERE ai_opt_in = 1
                 AND pending_human_response = 1
                 AND human_response_deadline IS NOT NULL
                 AND human_response_deadline <= ?1
               ORDER BY human_response_deadline ASC, id ASC
               LIMIT ?2"
        );
        query_leads(&conn, &sql, now, limit)
    }

    /// # Errors
    /// Returns error if database update fails.
    pub fn claim_takeover(&self, id: &str, expected: DateTime<Utc>) -> Result<bool, StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE leads SET human_response_deadline = NULL
               WHERE id = ?1 AND pending_human_response = 1 AND human_response_deadline = ?2",
            params![id, to_millis(expected)],
        )?;
        Ok(changed == 1)
    }

    /// # Errors
    /// Returns `NotFound` if the lead does not exist.
    pub fn complete_takeover(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE leads
               SET pending_human_response = 0,
                   human_response_deadline = NULL,
                   ai_messages_sent = ai_messages_sent + 1,
                   next_ai_send_at = ?2
               WHERE id = ?1",
            params![id, to_millis(next_send_at)],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns `NotFound` if the lead does not exist.
    pub fn reschedule_takeover(
        &self,
        id: &str,
        retry_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE leads SET human_response_deadline = ?2 WHERE id = ?1",
            params![id, to_millis(retry_at)],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns `NotFound` if the lead does not exist.
    pub fn request_human_response(
        &self,
        id: &str,
        deadline: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE leads SET pending_human_response = 1, human_response_deadline = ?2
               WHERE id = ?1",
            params![id, to_millis(deadline)],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns `NotFound` if the lead does not exist.
    pub fn resume_sequence(
        &self,
        id: &str,
        next_send_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = conn.execute(
            "UPDATE leads
               SET ai_sequence_paused = 0, ai_pause_reason = NULL, next_ai_send_at = ?2
               WHERE id = ?1",
            params![id, to_millis(next_send_at)],
        )?;
        expect_updated(changed, id)
    }

    /// # Errors
    /// Returns `NotFound` if the lead does not exist.
    pub fn set_ai_opt_in(&self, id: &str, opt_in: bool) -> Result<(), StorageError> {
        let conn = get_conn(&self.pool)?;
        let changed = if opt_in {
            conn.execute("UPDATE leads SET ai_opt_in = 1 WHERE id = ?1", params![id])?
        } else {
            conn.execute(
                "UPDATE leads
                   SET ai_opt_in = 0, ai_sequence_paused = 1, ai_pause_reason = ?2
                   WHERE id = ?1",
                params![id, PauseReason::OptedOut.as_str()],
            )?
        };
        expect_updated(changed, id)
    }
}
