pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;

pub use server::{build_router, serve};
