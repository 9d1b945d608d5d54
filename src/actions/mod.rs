pub mod directive;
pub mod executor;

pub use directive::{ActionKind, SendMessageDirective, UnimplementedAction};
pub use executor::{is_loopback_url, MessageExecutor, SendReceipt};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("unknown action_type `{raw}`")]
    UnknownActionType { raw: String },
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },
    #[error("`to` is not an email address: {to}")]
    InvalidRecipient { to: String },
    #[error("executor url is not loopback, refusing to dispatch: {url}")]
    NonLoopbackExecutor { url: String },
    #[error("executor returned HTTP {status}: {detail}")]
    ExecutorStatus { status: u16, detail: String },
    #[error("executor unreachable: {detail}")]
    ExecutorUnreachable { detail: String },
    #[error("executor rejected the message: {detail}")]
    ExecutorRejected { detail: String },
    #[error("executor response was not the expected shape: {detail}")]
    BadResponse { detail: String },
}
