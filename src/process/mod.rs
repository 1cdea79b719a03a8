/*!
 * Process Module
 * PID issuance, process records and lifecycle
 */

pub mod lifecycle;
pub mod table;
pub mod types;

// Re-export for convenience
pub use table::ProcessTable;
pub use types::*;
