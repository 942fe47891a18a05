//! Domain layer
//!
//! Contains pure business logic with no external dependencies.
//! - `entities`: Domain models representing core business concepts
//! - `criteria`: Declarative perícia filters shared by rules and adapters
//! - `ports`: Trait definitions for external dependencies

pub mod entities;
pub mod criteria;
pub mod ports;
