//! Library module: finding intake candidates and their library copies.
//!
//! Both searches are synchronous directory walks; async callers should run
//! them on the blocking pool.

mod scan;

pub use scan::{find_matching_media, find_video_files, is_video_file, LibraryError, VIDEO_EXTENSIONS};
