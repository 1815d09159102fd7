pub mod auth;
pub mod domain;
pub mod error;
pub mod lifecycle;
pub mod pagination;
