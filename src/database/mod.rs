pub mod manager;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryVoteStore;
pub use models::{NewVote, VoteRecord};
pub use repository::PgVoteStore;
pub use store::VoteStore;
