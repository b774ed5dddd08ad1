use anyhow::Result;
use outreach_service::LeadService;

use crate::open_storage;

pub(crate) async fn run_show(id: &str, limit: usize) -> Result<()> {
    let leads = LeadService::new(open_storage().await?);
    let lead = leads.get_lead(id).await?;
    let messages = leads.lead_messages(id, limit).await?;
    let out = serde_json::json!({ "lead": lead, "messages": messages });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

pub(crate) async fn run_resume(id: &str) -> Result<()> {
    let lead = LeadService::new(open_storage().await?).resume_sequence(id).await?;
    println!("{}", serde_json::to_string_pretty(&lead)?);
    Ok(())
}
