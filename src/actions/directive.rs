use super::ActionError;
use crate::record::Document;

/// Recognized action kinds a human can approve. Anything outside this set is
/// an unknown action and a hard failure, while the `Unimplemented` members
/// are recognized vocabulary that merely has no automated handler yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    SendMessage,
    Unimplemented(UnimplementedAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnimplementedAction {
    SocialPost,
    InvoiceCreation,
    MeetingScheduling,
}

impl ActionKind {
    /// Trimmed, case-insensitive; `_` and `-` are interchangeable so
    /// `send_message` and `send-message` name the same kind.
    pub fn parse(raw: &str) -> Result<Self, ActionError> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "send-message" => Ok(Self::SendMessage),
            "social-post" => Ok(Self::Unimplemented(UnimplementedAction::SocialPost)),
            "invoice-creation" => Ok(Self::Unimplemented(UnimplementedAction::InvoiceCreation)),
            "meeting-scheduling" => {
                Ok(Self::Unimplemented(UnimplementedAction::MeetingScheduling))
            }
            _ => Err(ActionError::UnknownActionType {
                raw: raw.trim().to_string(),
            }),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SendMessage => "send-message",
            Self::Unimplemented(UnimplementedAction::SocialPost) => "social-post",
            Self::Unimplemented(UnimplementedAction::InvoiceCreation) => "invoice-creation",
            Self::Unimplemented(UnimplementedAction::MeetingScheduling) => "meeting-scheduling",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The validated parameters of a send-message action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageDirective {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub thread_id: Option<String>,
}

impl SendMessageDirective {
    /// Builds a directive from an Approved record. The body comes from the
    /// `body` header field, falling back to the document body. Validation
    /// failures here mean no network call is ever attempted.
    pub fn from_document(doc: &Document) -> Result<Self, ActionError> {
        let to = doc
            .field("to")
            .ok_or(ActionError::MissingField { field: "to" })?;
        if !to.contains('@') {
            return Err(ActionError::InvalidRecipient { to: to.to_string() });
        }
        let subject = doc
            .field("subject")
            .ok_or(ActionError::MissingField { field: "subject" })?;
        let body = match doc.field("body") {
            Some(body) => body.to_string(),
            None => {
                let fallback = doc.body.trim();
                if fallback.is_empty() {
                    return Err(ActionError::MissingField { field: "body" });
                }
                fallback.to_string()
            }
        };

        Ok(Self {
            to: to.to_string(),
            subject: subject.to_string(),
            body,
            thread_id: doc.field("threadId").map(str::to_string),
        })
    }
}
