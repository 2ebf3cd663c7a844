pub mod api;
pub mod app;
pub mod categories;
pub mod config;
pub mod errors;
pub mod fetcher;
pub mod handlers;
pub mod links;
pub mod login;
pub mod models;
pub mod page;
pub mod query;
pub mod render;
pub mod session;
pub mod state;
pub mod ui;
pub mod upload;

pub use app::router;
pub use config::Config;
pub use state::AppState;
