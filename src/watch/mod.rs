pub mod guard;
pub mod notifier;

pub use guard::{ClaimTicket, InFlightSet};
pub use notifier::{list_records, scan_new_records};
