pub mod approval;
pub mod processing;
pub mod rejection;

pub use approval::handle_approved_record;
pub use processing::{handle_inbox_record, sweep_inbox_backlog};
pub use rejection::handle_rejected_record;
