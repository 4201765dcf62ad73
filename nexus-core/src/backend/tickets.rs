//! Support tickets and the two ticket tools handed to the support responder

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use dashmap::DashMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::clock::{Clock, IdSource, RandomIds, SystemClock};
use crate::tool::{parse_arguments, Tool, ToolDefinition, ToolSet};

/// Ticket urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// General inquiries
    Low,
    /// Refunds, complaints, booking problems
    Medium,
    /// Medical, safety, urgent
    High,
}

impl Priority {
    /// Upper-case label used in ticket text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A support ticket as recorded in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportTicket {
    /// `ANX-YYYYMMDD-XXXXXX`
    pub ticket_id: String,
    /// Urgency
    pub priority: Priority,
    /// One-line description of the issue
    pub summary: String,
    /// When the ticket was opened
    pub created_at: NaiveDateTime,
}

/// Issues ticket ids and remembers opened tickets
pub struct TicketDesk {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    tickets: DashMap<String, SupportTicket>,
}

impl Default for TicketDesk {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketDesk {
    /// Desk on the system clock with random suffixes
    pub fn new() -> Self {
        Self::with_sources(Arc::new(SystemClock), Arc::new(RandomIds))
    }

    /// Desk on injected time and id sources
    pub fn with_sources(clock: Arc<dyn Clock>, ids: Arc<dyn IdSource>) -> Self {
        Self {
            clock,
            ids,
            tickets: DashMap::new(),
        }
    }

    /// Fresh ticket id, `ANX-` + local date + six hex chars
    pub fn next_ticket_id(&self) -> String {
        format!(
            "ANX-{}-{}",
            self.clock.now().format("%Y%m%d"),
            self.ids.ticket_suffix()
        )
    }

    /// Open and remember a ticket
    pub fn open(&self, priority: Priority, summary: impl Into<String>) -> SupportTicket {
        let ticket = SupportTicket {
            ticket_id: self.next_ticket_id(),
            priority,
            summary: summary.into(),
            created_at: self.clock.now(),
        };
        info!(ticket_id = %ticket.ticket_id, priority = %priority, "support ticket opened");
        self.tickets.insert(ticket.ticket_id.clone(), ticket.clone());
        ticket
    }

    /// Look up a ticket opened by this desk
    pub fn get(&self, ticket_id: &str) -> Option<SupportTicket> {
        self.tickets.get(ticket_id).map(|t| t.clone())
    }

    /// Number of tickets opened so far
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// True before any ticket is opened
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}

/// Customer-facing confirmation for a new ticket
pub fn format_ticket_response(ticket_id: &str, priority: Priority) -> String {
    format!(
        "Support ticket created successfully! We send a mail to your email address with the ticket details.\n\
         \n\
         Ticket ID: {ticket_id}\n\
         Priority: {priority}\n\
         \n\
         Our support team will contact you within:\n\
         - High priority: 2-4 hours\n\
         - Medium priority: 4-8 hours\n\
         \n\
         Is there anything else I can help you with?"
    )
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateTicketArgs {
    /// Short summary of the customer's issue
    #[serde(default)]
    summary: Option<String>,
}

/// `create_support_ticket`: opens a ticket at the priority the classifier chose
pub struct CreateSupportTicketTool {
    desk: Arc<TicketDesk>,
    priority: Priority,
}

#[async_trait]
impl Tool for CreateSupportTicketTool {
    fn name(&self) -> String {
        "create_support_ticket".to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        ToolDefinition::for_args::<CreateTicketArgs>(
            self.name(),
            "Create support ticket. Returns the new ticket ID.",
        )
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let args: CreateTicketArgs = parse_arguments(&self.name(), arguments)?;
        let ticket = self
            .desk
            .open(self.priority, args.summary.unwrap_or_default());
        Ok(ticket.ticket_id)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct FormatTicketArgs {
    /// Ticket ID returned by create_support_ticket
    ticket_id: String,
    /// Ticket priority; defaults to the assessed priority
    #[serde(default)]
    priority: Option<Priority>,
}

/// `format_ticket_response`
pub struct FormatTicketResponseTool {
    priority: Priority,
}

#[async_trait]
impl Tool for FormatTicketResponseTool {
    fn name(&self) -> String {
        "format_ticket_response".to_string()
    }

    async fn definition(&self) -> ToolDefinition {
        ToolDefinition::for_args::<FormatTicketArgs>(self.name(), "Format ticket creation response")
    }

    async fn call(&self, arguments: &str) -> anyhow::Result<String> {
        let args: FormatTicketArgs = parse_arguments(&self.name(), arguments)?;
        Ok(format_ticket_response(
            &args.ticket_id,
            args.priority.unwrap_or(self.priority),
        ))
    }
}

/// Both ticket tools, bound to the assessed priority
pub fn ticket_toolset(desk: Arc<TicketDesk>, priority: Priority) -> ToolSet {
    let mut tools = ToolSet::new();
    tools
        .add(CreateSupportTicketTool { desk, priority })
        .add(FormatTicketResponseTool { priority });
    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::clock::{FixedClock, SequenceIds};
    use chrono::NaiveDate;

    fn desk() -> Arc<TicketDesk> {
        let now = NaiveDate::from_ymd_opt(2025, 7, 4)
            .and_then(|d| d.and_hms_opt(23, 59, 0))
            .expect("valid date");
        Arc::new(TicketDesk::with_sources(
            Arc::new(FixedClock(now)),
            Arc::new(SequenceIds::starting_at(0xABC)),
        ))
    }

    #[test]
    fn test_ticket_id_format() {
        assert_eq!(desk().next_ticket_id(), "ANX-20250704-000ABD");
    }

    #[test]
    fn test_random_ticket_id_shape() {
        let id = TicketDesk::new().next_ticket_id();
        let parts: Vec<_> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ANX");
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 6);
    }

    #[tokio::test]
    async fn test_create_tool_records_ticket() {
        let desk = desk();
        let tools = ticket_toolset(Arc::clone(&desk), Priority::High);

        let id = tools
            .call("create_support_ticket", r#"{"summary": "wheelchair needed"}"#)
            .await
            .expect("ticket created");

        let ticket = desk.get(&id).expect("ticket remembered");
        assert_eq!(ticket.priority, Priority::High);
        assert_eq!(ticket.summary, "wheelchair needed");
        assert_eq!(desk.len(), 1);
    }

    #[tokio::test]
    async fn test_format_tool_defaults_priority() {
        let tools = ticket_toolset(desk(), Priority::Medium);
        let text = tools
            .call("format_ticket_response", r#"{"ticket_id": "ANX-20250704-000001"}"#)
            .await
            .expect("formatted");

        assert!(text.starts_with("Support ticket created successfully!"));
        assert!(text.contains("Ticket ID: ANX-20250704-000001\nPriority: MEDIUM\n"));
        assert!(text.ends_with("Is there anything else I can help you with?"));
    }
}
