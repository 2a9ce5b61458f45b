//! Access policy lookup.

pub mod resolver;

pub use resolver::PolicyResolver;
