//! Migration v1: Initial schema

pub(super) const SQL: &str = "
CREATE TABLE IF NOT EXISTS leads (
    id TEXT PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    vehicle_interest TEXT,
    ai_opt_in INTEGER NOT NULL DEFAULT 0,
    ai_sequence_paused INTEGER NOT NULL DEFAULT 0,
    ai_pause_reason TEXT,
    pending_human_response INTEGER NOT NULL DEFAULT 0,
    human_response_deadline INTEGER,
    next_ai_send_at INTEGER,
    ai_stage TEXT NOT NULL DEFAULT 'initial',
    ai_messages_sent INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS phone_numbers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lead_id TEXT NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
    number TEXT NOT NULL,
    is_primary INTEGER NOT NULL DEFAULT 0,
    UNIQUE (lead_id, number)
);

CREATE TABLE IF NOT EXISTS conversations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    lead_id TEXT NOT NULL REFERENCES leads(id) ON DELETE CASCADE,
    direction TEXT NOT NULL,
    body TEXT NOT NULL,
    sms_status TEXT NOT NULL DEFAULT 'pending',
    sent_at INTEGER NOT NULL,
    sms_error TEXT
);

CREATE INDEX IF NOT EXISTS idx_leads_next_send ON leads(next_ai_send_at);
CREATE INDEX IF NOT EXISTS idx_leads_deadline ON leads(human_response_deadline);
CREATE INDEX IF NOT EXISTS idx_phone_numbers_lead ON phone_numbers(lead_id);
CREATE INDEX IF NOT EXISTS idx_conversations_lead ON conversations(lead_id);
CREATE INDEX IF NOT EXISTS idx_conversations_status_sent ON conversations(sms_status, sent_at);
";
