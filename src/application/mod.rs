//! Application layer: the controller and the contracts it depends on.

pub mod controller;
pub mod error;
pub mod repos;
