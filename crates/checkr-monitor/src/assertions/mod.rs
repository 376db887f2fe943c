//! Assertion programs shipped with the monitor
//!
//! Each module exposes `mainfn`, registered in
//! [`AssertionCatalog::builtin`](crate::AssertionCatalog::builtin) as
//! `<module>:mainfn`.

pub mod assertion1;
pub mod query_liveness;
pub mod tool_discipline;
