//! likenessd: HTTP front end for the likeness embedding services.
//!
//! One process serves one profile: the face service (`/compare_faces`,
//! `/get_embeddings`) or the general image service (`/compare_images`,
//! `/get_embeddings`). Requests are multipart uploads; responses are JSON.

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod server;

pub use config::Config;
pub use engine::{spawn_engine, EngineHandle};
pub use server::{build_router, serve, AppState};
