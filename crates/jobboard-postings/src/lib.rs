pub mod db;
pub mod error;
pub mod manager;
pub mod types;

pub use error::PostingError;
pub use manager::PostingStore;
pub use types::JobPosting;
