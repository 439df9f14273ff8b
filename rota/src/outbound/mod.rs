//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **supabase**: hosted auth and data API over HTTP
//!
//! Adapters are thin translators that convert between domain types and
//! transport representations. They contain no business logic.

pub mod supabase;
