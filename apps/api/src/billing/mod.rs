// Billing: Lemon Squeezy webhook boundary.
// Signature check first, then event classification, then store writes.

pub mod events;
pub mod handlers;
pub mod plans;
pub mod signature;
pub mod store;
