//! Supabase outbound adapters.
//!
//! One shared reqwest client talks to the hosted auth service (GoTrue) and the
//! data API (PostgREST). Each adapter implements one domain port.

mod auth;
mod client;
mod dto;
mod employees;
mod http;
mod rest;
mod shifts;

pub use auth::SupabaseAuthGateway;
pub use client::{SupabaseClient, SupabaseClientError, SupabaseConfig};
pub use employees::SupabaseEmployeeRepository;
pub use shifts::SupabaseShiftRepository;
