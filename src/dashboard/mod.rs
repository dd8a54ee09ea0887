pub mod render;
pub mod server;

pub use render::{render_dashboard, render_product_report};
pub use server::{router, serve, AppState, ServeConfig};
