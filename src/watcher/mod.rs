//! Download folder watcher that relays finished files to an HTTP endpoint.
//!
//! Each new file whose name matches the naming convention is uploaded at
//! most once per process run. Files already present at startup are skipped.
//!
//! # Architecture
//!
//! ```text
//! RelayWatcher
//!   - Bootstrapper marks existing files
//!   - Single notify::RecommendedWatcher (non-recursive)
//!   - NameMatcher filters event paths
//!         |
//!    RelayHandler
//!      created  -> settle delay -> Uploader
//!      modified -> UploadedSet check -> StabilityProbe -> Uploader
//!         |
//!    Uploader -> UploadTransport (reqwest multipart POST)
//!             -> UploadedSet (on 200 only)
//! ```

mod bootstrap;
mod error;
mod handler;
mod matcher;
mod probe;
mod relay;
mod uploaded;
mod uploader;

pub use bootstrap::Bootstrapper;
pub use error::RelayError;
pub use handler::RelayHandler;
pub use matcher::NameMatcher;
pub use probe::StabilityProbe;
pub use relay::{FileEvent, RelayWatcher, RelayWatcherBuilder, classify};
pub use uploaded::{UploadClaim, UploadedSet};
pub use uploader::{
    FilePart, HttpTransport, TransportResponse, UploadOutcome, UploadTransport, Uploader,
};
