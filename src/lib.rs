//! SEO and page metadata service.
//!
//! A cache-aside [`application::controller::Controller`] sits between two
//! transport adapters (`infra::http`, `infra::grpc`) and a pair of injected
//! backends: an authoritative store and an optional cache.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub(crate) mod util;
