// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (JWT auth, served locally) → Gateway (route
// table lookup, auth decided per route, forwarded upstream).

pub mod gateway;
pub mod protected;
pub mod public;
