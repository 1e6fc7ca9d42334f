//! healthz: a liveness service assembled through an explicit composition root.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │                   lifecycle                    │
//!                     │  start hooks in order ─▶ run ─▶ stop reversed  │
//!                     └────────────────────────┬───────────────────────┘
//!                                              │ ServerHook
//!     Client Request     ┌──────────┐    ┌─────▼────┐    ┌──────────┐    ┌──────────┐
//!     ──────────────────▶│   net    │───▶│   http   │───▶│ routing  │───▶│  health  │
//!                        │ listener │    │  server  │    │ dispatch │    │ /healthz │
//!                        └──────────┘    └──────────┘    └──────────┘    └──────────┘
//!
//!     Cross-cutting: config (TOML, defaults), observability (tracing)
//! ```
//!
//! [`app::App`] is the composition root tying these together.

pub mod app;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use app::App;
pub use config::ServiceConfig;
pub use error::AppError;
pub use http::HttpServer;
pub use lifecycle::{Lifecycle, Shutdown};
pub use observability::Logger;
