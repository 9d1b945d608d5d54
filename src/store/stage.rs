/// Lifecycle stages of a task record. The directory a record sits in is the
/// sole authoritative state; these variants name those directories verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Inbox,
    Active,
    Plan,
    Completed,
    PendingApproval,
    Approved,
    Rejected,
    AuditLog,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Inbox,
        Stage::Active,
        Stage::Plan,
        Stage::Completed,
        Stage::PendingApproval,
        Stage::Approved,
        Stage::Rejected,
        Stage::AuditLog,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Active => "Active",
            Self::Plan => "Plan",
            Self::Completed => "Completed",
            Self::PendingApproval => "PendingApproval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::AuditLog => "AuditLog",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}
