//! Route handlers, grouped by resource.

pub mod admin;
pub mod cases;
pub mod login;
pub mod updates;
