//! `PostgreSQL` session store.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresSessionStore, SessionPgPool};
