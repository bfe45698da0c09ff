// API routes and handlers

pub mod detection;
pub mod error;
pub mod extract;
pub mod health;
pub mod routes;
pub mod sessions;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use state::AppState;
