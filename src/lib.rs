#![forbid(unsafe_code)]

pub mod backend;
pub mod catalog;
pub mod cheatsheet;
pub mod chunks;
pub mod cli;
pub mod companies;
pub mod formats;
pub mod library;
pub mod logging;
pub mod query;
pub mod render;
pub mod serve;
pub mod session;
pub mod toc;
pub mod view;
