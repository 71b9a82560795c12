pub mod client;
pub mod repositories;
pub mod schema;

pub use client::SqlitePersistenceClient;
pub use schema::init_schema;
