// Thumbnail generation service: scale state, cache orchestration and the
// per-kind entry points.

use image::RgbaImage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache;
use crate::config::Config;
use crate::pipeline::compose;
use crate::pipeline::icons::{IconResolver, XdgIconResolver};
use crate::pipeline::select::{self, PRESENT_CURSORS, PRESENT_ICONS};
use crate::pipeline::xcursor;
use crate::theme::ThemeDescriptor;

const BASE_WIDTH: u32 = 220;
const BASE_HEIGHT: u32 = 36;
const BASE_CURSOR_SIZE: u32 = 24;
const BASE_CURSOR_PADDING: u32 = 7;
const BASE_ICON_SIZE: u32 = 36;
const BASE_ICON_PADDING: u32 = 10;

const DARK_GTK_THEME: &str = "deepin-dark";

/// Cache partitions, one per asset kind, each with its own format version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Gtk,
    Cursor,
    Icon,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Gtk => "gtk",
            AssetKind::Cursor => "cursor",
            AssetKind::Icon => "icon",
        }
    }

    /// Bumping a version structurally invalidates every cached thumbnail of
    /// that kind on the next sweep.
    pub fn version(self) -> u32 {
        match self {
            AssetKind::Gtk => 1,
            AssetKind::Cursor => 1,
            AssetKind::Icon => 1,
        }
    }

    fn all() -> [AssetKind; 3] {
        [AssetKind::Gtk, AssetKind::Cursor, AssetKind::Icon]
    }
}

type FlightKey = (AssetKind, String, u64);

pub struct Generator {
    cache_root: PathBuf,
    scale_bits: AtomicU64,
    resolver: Box<dyn IconResolver + Send + Sync>,
    inflight: Mutex<HashMap<FlightKey, Arc<Mutex<()>>>>,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        Self::with_resolver(config, XdgIconResolver::new())
    }

    pub fn with_resolver<R>(config: Config, resolver: R) -> Self
    where
        R: IconResolver + Send + Sync + 'static,
    {
        Self {
            cache_root: config.cache_root,
            scale_bits: AtomicU64::new(0f64.to_bits()),
            resolver: Box::new(resolver),
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Store the display scale factor pushed by the session. Values at or
    /// below zero keep the generator unusable.
    pub fn update_scale_factor(&self, scale: f64) {
        self.scale_bits.store(scale.to_bits(), Ordering::Relaxed);
    }

    pub fn scale_factor(&self) -> f64 {
        f64::from_bits(self.scale_bits.load(Ordering::Relaxed))
    }

    pub fn scale_usable(&self) -> bool {
        self.scale_factor() > 0.0
    }

    /// Drop cache partitions for other scale factors and other format
    /// versions. Run once after the scale factor is known.
    pub fn init(&self) {
        let Some(scale) = self.usable_scale() else {
            return;
        };
        let scale_dir_name = cache::scale_dir_name(scale);
        cache::sweep_scale_dirs(&self.cache_root, &scale_dir_name);

        let scale_dir = self.cache_root.join(&scale_dir_name);
        for kind in AssetKind::all() {
            cache::sweep_version_dirs(&scale_dir, kind.as_str(), kind.version());
        }
    }

    /// Thumbnail of a cursor theme, composited from the theme's cursor
    /// bitmaps under `<theme dir>/cursors`. `desc_path` may name the theme
    /// directory or a description file inside it.
    pub fn get_cursor(&self, id: &str, desc_path: &Path) -> Option<PathBuf> {
        let scale = self.usable_scale()?;
        let out = self.output_path(AssetKind::Cursor, id, scale)?;

        let flight = self.lock_for(AssetKind::Cursor, id, scale);
        let _guard = flight.lock();

        let theme_dir = theme_dir_of(desc_path);
        if !cache::is_stale(&theme_dir, &out) {
            return Some(out);
        }

        let icon_size = (BASE_CURSOR_SIZE as f64 * scale) as u32;
        let cursors_dir = theme_dir.join("cursors");
        let images = select::select_images(PRESENT_CURSORS, |name| {
            xcursor::load_cursor(&cursors_dir.join(name), icon_size)
        });

        self.finish(&images, BASE_CURSOR_SIZE, BASE_CURSOR_PADDING, scale, out)
    }

    /// Thumbnail of an icon theme, composited from category-representative
    /// icons resolved in the theme named by `id`.
    pub fn get_icon(&self, id: &str, desc_path: &Path) -> Option<PathBuf> {
        let scale = self.usable_scale()?;
        let out = self.output_path(AssetKind::Icon, id, scale)?;

        let flight = self.lock_for(AssetKind::Icon, id, scale);
        let _guard = flight.lock();

        if !cache::is_stale(desc_path, &out) {
            return Some(out);
        }

        let icon_size = (BASE_ICON_SIZE as f64 * scale) as u32;
        let images = select::select_images(PRESENT_ICONS, |name| {
            self.resolver.resolve(id, name, icon_size)
        });

        self.finish(&images, BASE_ICON_SIZE, BASE_ICON_PADDING, scale, out)
    }

    /// Pre-made representative image shipped by the theme itself: the
    /// example path is passed through without compositing or caching. Dark
    /// GTK variants pick the last entry of the example list.
    pub fn get_global(&self, theme: &ThemeDescriptor, gtk_theme: &str) -> Option<PathBuf> {
        self.usable_scale()?;

        let examples = theme.example_list();
        let picked = if gtk_theme == DARK_GTK_THEME {
            examples.last()
        } else {
            examples.first()
        }
        .copied()?;

        let path = Path::new(picked);
        if path.is_relative() {
            Some(theme.path().join(path))
        } else {
            Some(path.to_path_buf())
        }
    }

    fn usable_scale(&self) -> Option<f64> {
        let scale = self.scale_factor();
        if scale <= 0.0 {
            tracing::info!("scale factor not set");
            return None;
        }
        Some(scale)
    }

    fn output_path(&self, kind: AssetKind, id: &str, scale: f64) -> Option<PathBuf> {
        match cache::output_path(&self.cache_root, kind.as_str(), id, kind.version(), scale) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!("{err}");
                None
            }
        }
    }

    // Single-flight: one regeneration per (kind, id, scale) at a time;
    // concurrent callers for the same key serialize and the later one hits
    // the staleness short-circuit instead of duplicating the work.
    fn lock_for(&self, kind: AssetKind, id: &str, scale: f64) -> Arc<Mutex<()>> {
        let mut table = self.inflight.lock();
        table
            .entry((kind, id.to_string(), scale.to_bits()))
            .or_default()
            .clone()
    }

    fn finish(
        &self,
        images: &[RgbaImage],
        icon_size: u32,
        padding: u32,
        scale: f64,
        out: PathBuf,
    ) -> Option<PathBuf> {
        let canvas = compose::composite(images, BASE_WIDTH, BASE_HEIGHT, icon_size, padding, scale)?;
        match compose::write_png(&canvas, &out) {
            Ok(()) => Some(out),
            Err(err) => {
                tracing::warn!("{err}");
                None
            }
        }
    }
}

fn theme_dir_of(desc_path: &Path) -> PathBuf {
    if desc_path.is_file() {
        if let Some(parent) = desc_path.parent() {
            return parent.to_path_buf();
        }
    }
    desc_path.to_path_buf()
}
