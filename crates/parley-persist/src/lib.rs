pub mod builder;
pub mod dbs;
pub mod error;
pub mod models;
pub mod trait_client;

pub use builder::PersistClientBuilder;
pub use dbs::sqlite::SqlitePersistenceClient;
pub use error::PersistError;
pub use models::{NewUser, Thread, User};
pub use trait_client::PersistenceClient;
