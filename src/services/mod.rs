pub mod vote_service;
pub mod webhook;

pub use vote_service::{Submission, VoteError, VoteService, VoteSummary};
pub use webhook::{HttpNotifier, LinkError, LinkPolicy, Notifier, NotifyError};
