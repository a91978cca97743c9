pub use client::*;
pub use service::*;
pub use store::*;

mod client;
mod service;
mod store;
