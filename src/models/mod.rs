pub mod auth;
pub mod common;
pub mod empresa;
pub mod schedule;
pub mod turno;
