pub mod thread;
pub mod user;

pub use thread::SqliteThreadRepository;
pub use user::SqliteUserRepository;
