//! Concrete adapters for the repository ports.

pub mod postgres;
