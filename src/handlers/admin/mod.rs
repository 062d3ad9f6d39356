// Admin tier: page gated by session cookie, JSON API by JWT
pub mod login;
pub mod votes;

pub use login::{login_page, login_post};
pub use votes::{admin_page, list as votes_list, summary as votes_summary};
