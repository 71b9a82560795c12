pub mod thread;
pub mod user;

pub use thread::Thread;
pub use user::{NewUser, User};
