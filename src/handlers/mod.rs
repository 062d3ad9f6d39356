// handlers/mod.rs - two security tiers
//
// Public (no session) → Admin (admin JWT, from header or session cookie)
pub mod admin;
pub mod public;
