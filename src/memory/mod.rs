/*!
 * Memory Module
 * Virtual memory accounting and footprint estimation
 */

pub mod footprint;
pub mod manager;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use footprint::estimate;
pub use manager::MemoryManager;
pub use traits::*;
pub use types::*;
