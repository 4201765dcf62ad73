use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::ResponderModel;
use crate::agent::coordinator::{Responder, ResponderKind};
use crate::backend::{ticket_toolset, Priority, TicketDesk};
use crate::error::Result;
use crate::prompts::{support_query, NO_TICKET_NEEDED, SUPPORT_SYSTEM_PROMPT};

/// Words that escalate a support query to a ticket
pub const SUPPORT_KEYWORDS: [&str; 8] = [
    "refund",
    "complaint",
    "problem",
    "issue",
    "cancel",
    "help",
    "urgent",
    "medical",
];

/// Outcome of the keyword classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportAssessment {
    /// Any keyword matched
    pub needs_ticket: bool,
    /// HIGH when "urgent" appears, MEDIUM otherwise
    pub priority: Priority,
}

/// Case-insensitive substring match against [`SUPPORT_KEYWORDS`]
pub fn assess_support_need(message: &str) -> SupportAssessment {
    let lower = message.to_lowercase();
    SupportAssessment {
        needs_ticket: SUPPORT_KEYWORDS.iter().any(|k| lower.contains(k)),
        priority: if lower.contains("urgent") {
            Priority::High
        } else {
            Priority::Medium
        },
    }
}

/// Opens tickets for issues the classifier flags
pub struct SupportResponder {
    model: ResponderModel,
    desk: Arc<TicketDesk>,
}

impl SupportResponder {
    pub fn new(model: ResponderModel, desk: Arc<TicketDesk>) -> Self {
        Self { model, desk }
    }
}

#[async_trait]
impl Responder for SupportResponder {
    fn kind(&self) -> ResponderKind {
        ResponderKind::Support
    }

    async fn respond(&self, query: &str) -> Result<String> {
        let assessment = assess_support_need(query);
        debug!(?assessment, "support query assessed");
        if !assessment.needs_ticket {
            return Ok(NO_TICKET_NEEDED.to_string());
        }

        let tools = ticket_toolset(Arc::clone(&self.desk), assessment.priority);
        let agent = self
            .model
            .agent("support_agent", SUPPORT_SYSTEM_PROMPT, Some(&tools))?;
        agent.prompt(support_query(query)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgent_medical_is_high() {
        let a = assess_support_need("This is urgent, I have a medical issue");
        assert!(a.needs_ticket);
        assert_eq!(a.priority, Priority::High);
    }

    #[test]
    fn test_keyword_without_urgent_is_medium() {
        for message in [
            "I want a REFUND",
            "Filing a complaint",
            "There is a problem with my seat",
            "Can you help?",
            "Please cancel it",
            "medical certificate",
        ] {
            let a = assess_support_need(message);
            assert!(a.needs_ticket, "{message}");
            assert_eq!(a.priority, Priority::Medium, "{message}");
        }
    }

    #[test]
    fn test_no_keyword_no_ticket() {
        let a = assess_support_need("What time does boarding start?");
        assert!(!a.needs_ticket);
    }

    #[test]
    fn test_substring_matches_count() {
        // "helpful" contains "help", "cancellation" contains "cancel"
        assert!(assess_support_need("that was helpful").needs_ticket);
        assert!(assess_support_need("cancellation fees").needs_ticket);
    }

    #[test]
    fn test_prompt_wrapper_adds_no_keywords() {
        assert!(!assess_support_need(&support_query("when is boarding")).needs_ticket);
    }
}
