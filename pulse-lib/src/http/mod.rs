pub mod handlers;
pub mod response;
pub mod server;

pub use server::{run, serve, AppState};
