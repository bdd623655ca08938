//! # mipscope: real-time oscilloscope core
//!
//! The data side of a live plotting widget: streams of samples are appended
//! at high rate and drawn every frame at any zoom level, from a few samples up
//! to days of history, with bounded cost per frame.
//!
//! ## Architecture
//!
//! - **Mip buffer** ([`mip`]): every sample plus a pyramid of `(min, max, avg)`
//!   aggregates. A range query picks the level with about one entry per pixel.
//! - **Channel** ([`channel`]): one buffer with sampling frequency, raw-to-unit
//!   calibration, render style and a sparse wall-clock index.
//! - **Viewport** ([`viewport`]): animated zoom/pan over sample-space that
//!   follows the newest sample until the user pans back in time, and repairs
//!   any out-of-range state on every frame.
//! - **Scope** ([`scope`]): channels + viewport; builds per-frame [`trace`]
//!   geometry and [`grid`] marks.
//! - **Ingest** ([`ingest`]): bounded crossbeam queue for producer threads;
//!   channels themselves are single-writer.
//!
//! ## Configuration
//!
//! [`config::ScopeConfig`] is stored as TOML (or JSON) under `dev.mipscope` in
//! the platform data directory.
//!
//! ## Example
//!
//! ```ignore
//! use mipscope::{config::ScopeConfig, ingest, scope::Scope};
//!
//! let mut scope = Scope::from_config(&ScopeConfig::load_or_default())?;
//! let (tx, rx) = ingest::queue(4096);
//!
//! std::thread::spawn(move || {
//!     for v in adc_readings() {
//!         tx.send(0, v, None);
//!     }
//! });
//!
//! loop {
//!     scope.drain(&rx);
//!     scope.tick(1.0 / 60.0);
//!     for trace in scope.frame(1280.0)? {
//!         draw(&trace, scope.viewport());
//!     }
//! }
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod grid;
pub mod ingest;
pub mod mip;
pub mod scope;
pub mod signal;
pub mod trace;
pub mod types;
pub mod viewport;

// Re-export commonly used types
pub use channel::{Channel, ChannelConfig, ValueMapping};
pub use config::ScopeConfig;
pub use error::{Result, ScopeError};
pub use mip::{MipBuffer, MipSlice};
pub use scope::Scope;
pub use trace::Trace;
pub use types::{MipEntry, SampleRect, TraceStyle};
pub use viewport::{SampleExtent, ViewportController, ViewportSettings};
