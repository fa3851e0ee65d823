mod handlers;
mod models;
mod render;
mod state;

pub use handlers::{router, run_server};
