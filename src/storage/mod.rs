//! Graph persistence
//!
//! A storage trait plus the SQLite backend. The one structural guarantee
//! every backend must give: replacing a page's step set is atomic — readers
//! never observe a mixed old/new step set.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{DiscourseStore, OpenStore, StorageError, StorageResult};
