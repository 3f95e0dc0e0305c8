pub mod admission;
pub mod availability;
pub mod catalog;
pub mod payment_hold;
pub mod payments;
pub mod public_links;
pub mod tenant_locks;
