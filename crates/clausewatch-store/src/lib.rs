//! Report storage: analysis responses saved per user and listed newest first.

mod error;
mod memory;
mod report;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use report::{HISTORY_LIMIT, NewReport, ReportStore, StoredReport};

#[cfg(feature = "duckdb")]
mod duck;
#[cfg(feature = "duckdb")]
pub use duck::DuckStore;
