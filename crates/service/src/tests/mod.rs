//! Shared fixtures for service tests: a SQLite store in a temp dir plus
//! in-memory fakes for the generator and the outbound channel.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use outreach_core::{
    GeneratedMessage, Lead, MaintenanceConfig, NewLead, SchedulerConfig,
};
use outreach_sms::{DeliveryStatus, SmsError, SmsReceipt};
use outreach_storage::traits::LeadStore;
use outreach_storage::{Storage, StorageBackend};
use tempfile::TempDir;

use crate::collaborators::{MessageGenerator, OutboundChannel, OutboundRequest};
use crate::maintenance::MaintenanceSweep;
use crate::messaging::MessagingService;
use crate::scheduler::{InFlight, Scheduler};

mod maintenance_tests;
mod messaging_tests;

pub const PHONE: &str = "+15551230000";

/// Generator returning a fixed reply, with per-lead overrides.
///
/// Records the `next_ai_send_at` it observes in the store at call time.
pub struct FakeGenerator {
    default: GeneratedMessage,
    overrides: HashMap<String, GeneratedMessage>,
    storage: Option<Arc<StorageBackend>>,
    pub observed_next_send: Mutex<Vec<Option<DateTime<Utc>>>>,
    pub calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn replying(default: GeneratedMessage) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
            storage: None,
            observed_next_send: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::replying(GeneratedMessage::Generated(text.to_owned()))
    }

    pub fn with_override(mut self, lead_id: &str, reply: GeneratedMessage) -> Self {
        self.overrides.insert(lead_id.to_owned(), reply);
        self
    }

    pub fn observing(mut self, storage: Arc<StorageBackend>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageGenerator for FakeGenerator {
    async fn generate(&self, lead: &Lead) -> GeneratedMessage {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(storage) = &self.storage {
            let current = storage.get_lead(&lead.id).await.unwrap().unwrap();
            self.observed_next_send.lock().unwrap().push(current.next_ai_send_at);
        }
        self.overrides.get(&lead.id).cloned().unwrap_or_else(|| self.default.clone())
    }
}

/// Channel recording every request; fails when `fail_with` is set.
#[derive(Default)]
pub struct FakeChannel {
    pub requests: Mutex<Vec<OutboundRequest>>,
    fail_with: Mutex<Option<(u16, String)>>,
    counter: AtomicUsize,
}

impl FakeChannel {
    pub fn failing(status: u16, message: &str) -> Self {
        let channel = Self::default();
        channel.set_failure(Some((status, message.to_owned())));
        channel
    }

    pub fn set_failure(&self, failure: Option<(u16, String)>) {
        *self.fail_with.lock().unwrap() = failure;
    }

    pub fn sent_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutboundChannel for FakeChannel {
    async fn send(&self, request: &OutboundRequest) -> Result<SmsReceipt, SmsError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some((status, message)) = self.fail_with.lock().unwrap().clone() {
            return Err(SmsError::Api { status, code: None, message });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(SmsReceipt { provider_message_id: format!("SM{n:04}"), status: DeliveryStatus::Queued })
    }
}

pub struct Harness {
    pub storage: Arc<StorageBackend>,
    pub channel: Arc<FakeChannel>,
    pub messaging: Arc<MessagingService>,
    db_path: PathBuf,
    _temp_dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_channel(FakeChannel::default())
    }

    pub fn with_channel(channel: FakeChannel) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service.db");
        let storage = Storage::new(&db_path).unwrap();
        let storage = Arc::new(StorageBackend::Sqlite(storage));
        let channel = Arc::new(channel);
        let messaging = Arc::new(MessagingService::new(storage.clone(), channel.clone()));
        Self { storage, channel, messaging, db_path, _temp_dir: temp_dir }
    }

    /// Make every later UPDATE that sets `table.column` abort, simulating a
    /// storage failure at one bookkeeping step.
    pub fn reject_updates_of(&self, table: &str, column: &str) {
        let conn = rusqlite::Connection::open(&self.db_path).unwrap();
        conn.execute_batch(&format!(
            "CREATE TRIGGER reject_{table}_{column} BEFORE UPDATE OF {column} ON {table}
             BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END;"
        ))
        .unwrap();
    }

    pub fn scheduler(&self, generator: Arc<FakeGenerator>, in_flight: Arc<InFlight>) -> Scheduler {
        Scheduler::new(
            self.storage.clone(),
            generator,
            self.messaging.clone(),
            SchedulerConfig::default(),
            in_flight,
        )
    }

    pub fn sweep(&self) -> MaintenanceSweep {
        MaintenanceSweep::new(self.storage.clone(), self.channel.clone(), MaintenanceConfig::default())
    }

    /// Insert an opted-in lead due `ago` in the past, with the default phone.
    pub async fn due_lead(&self, id: &str, ago: Duration) -> Lead {
        self.insert(NewLead {
            id: Some(id.to_owned()),
            first_name: Some("Dana".to_owned()),
            vehicle_interest: Some("2021 Civic".to_owned()),
            ai_opt_in: true,
            next_ai_send_at: Some(Utc::now() - ago),
            phone: Some(PHONE.to_owned()),
            ..NewLead::default()
        })
        .await
    }

    pub async fn insert(&self, input: NewLead) -> Lead {
        self.storage.insert_lead(&input, Utc::now()).await.unwrap()
    }

    pub async fn lead(&self, id: &str) -> Lead {
        self.storage.get_lead(id).await.unwrap().unwrap()
    }
}
