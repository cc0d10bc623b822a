pub mod addon;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod user_config;

pub use routes::create_router;
