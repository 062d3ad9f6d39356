// Public tier: no session required (the vote endpoint can opt into one via policy)
pub mod pages;
pub mod submit_vote;

pub use pages::{health, index};
pub use submit_vote::submit_vote;
