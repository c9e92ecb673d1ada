use std::path::PathBuf;

// Cache layout shared with earlier generations of the thumbnailer; the
// directory tree below this root is partitioned by scale factor and
// per-kind format version.
const CACHE_SUBDIR: &str = "deepin/dde-api/theme_thumb";

#[derive(Clone, Debug)]
pub struct Config {
    pub cache_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            cache_root: base.join(CACHE_SUBDIR),
        }
    }
}
