pub mod vote;

pub use vote::{NewVote, VoteRecord};
