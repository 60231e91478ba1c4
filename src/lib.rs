//! Social film catalogue backend: users and their friendship graph, films
//! and likes, reviews with usefulness votes, a per-user activity feed, and
//! like-overlap film recommendations. Served over HTTP by axum, persisted
//! either in memory or in PostgreSQL.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
