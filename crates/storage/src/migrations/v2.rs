//! Migration v2: provider message id lookup for delivery reports

pub(super) const INDEX_SQL: &str = "
CREATE INDEX IF NOT EXISTS idx_conversations_provider_id ON conversations(provider_message_id);
";
