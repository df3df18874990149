#![forbid(unsafe_code)]

pub mod auth;
pub mod books;
pub mod cli;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod query;
pub mod session;
