//! Testing utilities and mock implementations.
//!
//! The mocks stand in for ffmpeg, the filesystem swap and the outbound HTTP
//! calls so the replacement protocol can be exercised end to end without
//! real media or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use squeeze_core::testing::{MockEngine, MockNotifier, MockPlacer};
//!
//! let engine = MockEngine::new();
//! engine.set_output_ratio(0.4).await;
//!
//! let placer = MockPlacer::new();
//! let notifier = MockNotifier::new();
//! ```

mod mock_engine;
mod mock_notify;
mod mock_placer;

pub use mock_engine::{
    EngineCall, MockEngine, MOCK_DEFAULT_CODEC, MOCK_DEFAULT_DURATION, MOCK_HEVC_MARKER,
};
pub use mock_notify::{MockNotifier, MockRefresher};
pub use mock_placer::{MockPlacer, SwapFailure};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    use crate::config::Config;

    /// Config rooted at `root`, with all three directories created.
    pub fn config_in(root: &Path) -> Config {
        let config = Config {
            downloads_dir: root.join("Downloads"),
            movies_dir: root.join("Movies"),
            shows_dir: root.join("Shows"),
            lock_file: root.join("run").join("squeeze.lock"),
            log_file: None,
            ..Default::default()
        };
        for dir in [&config.downloads_dir, &config.movies_dir, &config.shows_dir] {
            std::fs::create_dir_all(dir).expect("create fixture directory");
        }
        config
    }

    /// Creates a sparse file of `size` bytes filled with `fill` at its start.
    pub fn sparse_file(path: &Path, fill: u8, size: u64) -> PathBuf {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture directory");
        }
        let file = std::fs::File::create(path).expect("create fixture file");
        let head = vec![fill; size.min(4096) as usize];
        std::io::Write::write_all(&mut &file, &head).expect("write fixture file");
        file.set_len(size).expect("resize fixture file");
        path.to_path_buf()
    }

    /// Creates an intake file and a same-named library file under
    /// `Movies/<title>/`, both of `size` bytes. Returns `(intake, library)`.
    pub fn movie_pair(config: &Config, name: &str, size: u64) -> (PathBuf, PathBuf) {
        let title = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let intake = sparse_file(&config.downloads_dir.join(name), b'i', size);
        let library = sparse_file(&config.movies_dir.join(title).join(name), b'o', size);
        (intake, library)
    }
}
