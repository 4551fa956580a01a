//! Placer module: the filesystem half of replacing a library file.
//!
//! This module provides the `Placer` trait and its filesystem implementation.
//! It owns every irreversible operation the pipeline performs.
//!
//! # Features
//!
//! - Atomic swap: the verified temp file is renamed over the original, so the
//!   library path always names either the old or the new bytes
//! - Post-swap size confirmation, with errors that say whether the swap had
//!   already committed
//! - Temp discard that tolerates an already-missing file
//! - Intake cleanup that refuses to delete the library file itself
//!
//! # Example
//!
//! ```ignore
//! use squeeze_core::placer::{FsPlacer, Placer, SwapRequest};
//!
//! let placer = FsPlacer::new();
//!
//! let request = SwapRequest {
//!     replacement: PathBuf::from("/data/Movies/Film/.Film.tmp.mkv"),
//!     original: PathBuf::from("/data/Movies/Film/Film.mkv"),
//!     expected_size: 4_000_000_000,
//! };
//!
//! match placer.swap(&request).await {
//!     Ok(receipt) => println!("Replaced {} ({} bytes)", receipt.path.display(), receipt.size_bytes),
//!     Err(e) if e.replacement_committed() => eprintln!("Check {} by hand: {}", request.original.display(), e),
//!     Err(e) => eprintln!("Original untouched: {}", e),
//! }
//! ```

mod error;
mod fs_placer;
mod traits;
mod types;

pub use error::PlacerError;
pub use fs_placer::FsPlacer;
pub use traits::Placer;
pub use types::{IntakeCleanup, SwapReceipt, SwapRequest};
