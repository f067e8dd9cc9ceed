#![deny(warnings)]

pub mod config;
pub mod crisis;
pub mod empathy;
pub mod face;
pub mod fusion;
pub mod lingo;
pub mod mood;
pub mod sentiment;
pub mod session;
pub mod speech;
pub mod store;
pub mod tables;
pub mod translate;
