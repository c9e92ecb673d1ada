// Composite preview thumbnails for cursor and icon themes, cached on disk
// per display scale factor and per-kind format version.

pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod theme;

pub use config::Config;
pub use error::Error;
pub use generator::{AssetKind, Generator};
pub use pipeline::icons::{IconResolver, XdgIconResolver};
pub use theme::ThemeDescriptor;
