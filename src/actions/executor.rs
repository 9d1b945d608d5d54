use super::{ActionError, SendMessageDirective};
use crate::config::Settings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for the local send-message executor service.
#[derive(Debug, Clone)]
pub struct MessageExecutor {
    url: String,
    timeout: Duration,
}

/// What the executor reported back for a dispatched message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    to: &'a str,
    subject: &'a str,
    body: &'a str,
    #[serde(rename = "threadId", skip_serializing_if = "Option::is_none")]
    thread_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    success: bool,
    #[serde(rename = "messageId", default)]
    message_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// True when the URL host is a loopback address. Side-effecting dispatch is
/// restricted to loopback so a bad config can never mail the outside world.
pub fn is_loopback_url(url: &str) -> bool {
    let Some(after_scheme) = url.split_once("://").map(|(_, rest)| rest) else {
        return false;
    };
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = if let Some(rest) = authority.strip_prefix('[') {
        match rest.split_once(']') {
            Some((host, _)) => format!("[{host}]"),
            None => return false,
        }
    } else {
        authority.split(':').next().unwrap_or_default().to_string()
    };
    matches!(host.as_str(), "127.0.0.1" | "localhost" | "[::1]")
}

impl MessageExecutor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.executor_url, settings.executor_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// One synchronous dispatch attempt. The loopback restriction is checked
    /// on every call, independent of startup validation.
    pub fn send(&self, directive: &SendMessageDirective) -> Result<SendReceipt, ActionError> {
        if !is_loopback_url(&self.url) {
            return Err(ActionError::NonLoopbackExecutor {
                url: self.url.clone(),
            });
        }

        let request = SendMessageRequest {
            to: &directive.to,
            subject: &directive.subject,
            body: &directive.body,
            thread_id: directive.thread_id.as_deref(),
        };

        let response = ureq::post(&self.url)
            .timeout(self.timeout)
            .send_json(serde_json::json!(request))
            .map_err(|err| match err {
                ureq::Error::Status(status, response) => ActionError::ExecutorStatus {
                    status,
                    detail: response
                        .into_string()
                        .unwrap_or_else(|_| "unreadable response body".to_string()),
                },
                ureq::Error::Transport(transport) => ActionError::ExecutorUnreachable {
                    detail: transport.to_string(),
                },
            })?;

        let parsed: SendMessageResponse =
            response
                .into_json()
                .map_err(|err| ActionError::BadResponse {
                    detail: err.to_string(),
                })?;

        if !parsed.success {
            return Err(ActionError::ExecutorRejected {
                detail: parsed
                    .error
                    .unwrap_or_else(|| "no error detail given".to_string()),
            });
        }

        Ok(SendReceipt {
            message_id: parsed.message_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive() -> SendMessageDirective {
        SendMessageDirective {
            to: "alice@example.com".to_string(),
            subject: "Hi".to_string(),
            body: "Report attached".to_string(),
            thread_id: None,
        }
    }

    #[test]
    fn loopback_hosts_are_recognized() {
        assert!(is_loopback_url("http://127.0.0.1:3000/send-message"));
        assert!(is_loopback_url("http://localhost/send-message"));
        assert!(is_loopback_url("http://[::1]:3000/send-message"));
    }

    #[test]
    fn non_loopback_hosts_are_refused() {
        assert!(!is_loopback_url("http://mail.example.com/send-message"));
        assert!(!is_loopback_url("http://10.0.0.5:3000/send-message"));
        assert!(!is_loopback_url("http://localhost.evil.example/send"));
        assert!(!is_loopback_url("not a url"));
    }

    #[test]
    fn send_refuses_non_loopback_without_any_network_call() {
        let executor = MessageExecutor::new(
            "http://mail.example.com/send-message",
            Duration::from_secs(1),
        );
        let err = executor.send(&directive()).expect_err("must refuse");
        assert!(matches!(err, ActionError::NonLoopbackExecutor { .. }));
    }

    #[test]
    fn unreachable_executor_is_a_transport_error() {
        // Port 9 (discard) is virtually never listening on loopback.
        let executor = MessageExecutor::new("http://127.0.0.1:9/send-message", Duration::from_millis(300));
        let err = executor.send(&directive()).expect_err("must fail");
        assert!(matches!(err, ActionError::ExecutorUnreachable { .. }));
    }

    #[test]
    fn request_serializes_thread_id_only_when_present() {
        let with_thread = SendMessageRequest {
            to: "a@b.test",
            subject: "s",
            body: "b",
            thread_id: Some("t-1"),
        };
        let value = serde_json::json!(with_thread);
        assert_eq!(value["threadId"], "t-1");

        let without = SendMessageRequest {
            to: "a@b.test",
            subject: "s",
            body: "b",
            thread_id: None,
        };
        let value = serde_json::json!(without);
        assert!(value.get("threadId").is_none());
    }
}
