//! Verifier module: decides whether a fresh transcode may replace its source.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the output has a positive duration (it is decodable at all)
//! 2. the duration matches the source within a tolerance, when the source
//!    duration is known
//! 3. the video codec is the target codec
//! 4. a short decode-to-null sample produces no errors

mod types;
mod verify;

pub use types::{VerifiedOutput, VerifyConfig, VerifyFailure};
pub use verify::Verifier;
