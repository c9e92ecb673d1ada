// Icon resolution and rasterization for icon-theme thumbnails.

use anyhow::{Context, Result, anyhow};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resolves a named icon within a theme to a fixed-size pixel image.
///
/// `None` means "no match in this theme", a try-next-candidate signal.
pub trait IconResolver {
    fn resolve(&self, theme: &str, name: &str, size: u32) -> Option<RgbaImage>;
}

/// Icon lookup over the usual XDG icon directories, with a `hicolor`
/// fallback and standalone pixmaps as the last resort.
pub struct XdgIconResolver {
    search_roots: Vec<PathBuf>,
    standalone_roots: Vec<PathBuf>,
}

impl XdgIconResolver {
    pub fn new() -> Self {
        let mut roots = Vec::new();
        if let Some(home) = dirs::home_dir() {
            roots.push(home.join(".icons"));
        }
        if let Some(data) = dirs::data_dir() {
            roots.push(data.join("icons"));
        }
        roots.push(PathBuf::from("/usr/local/share/icons"));
        roots.push(PathBuf::from("/usr/share/icons"));

        Self {
            search_roots: roots,
            standalone_roots: vec![PathBuf::from("/usr/share/pixmaps")],
        }
    }

    /// Restrict lookup to the given theme roots (no standalone fallback).
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self {
            search_roots: roots,
            standalone_roots: Vec::new(),
        }
    }
}

impl Default for XdgIconResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IconResolver for XdgIconResolver {
    fn resolve(&self, theme: &str, name: &str, size: u32) -> Option<RgbaImage> {
        let mut themes = vec![theme];
        if theme != "hicolor" {
            themes.push("hicolor");
        }

        for theme_name in themes {
            for root in &self.search_roots {
                let theme_dir = root.join(theme_name);
                if !theme_dir.is_dir() {
                    continue;
                }
                if let Some(path) = find_in_theme(&theme_dir, name, size) {
                    match rasterize(&path, size) {
                        Ok(image) => return Some(image),
                        Err(err) => {
                            tracing::debug!("icon candidate {} skipped: {err}", path.display());
                        }
                    }
                }
            }
        }

        for dir in &self.standalone_roots {
            for ext in ["png", "svg"] {
                let path = dir.join(format!("{name}.{ext}"));
                if !path.is_file() {
                    continue;
                }
                match rasterize(&path, size) {
                    Ok(image) => return Some(image),
                    Err(err) => {
                        tracing::debug!("pixmap candidate {} skipped: {err}", path.display());
                    }
                }
            }
        }

        None
    }
}

/// Walk a theme directory for `<name>.{png,svg}`, preferring the candidate
/// whose directory size annotation is closest to the request. Scalable
/// entries rank just behind an exact size match.
fn find_in_theme(theme_dir: &Path, name: &str, size: u32) -> Option<PathBuf> {
    let mut best: Option<(u32, PathBuf)> = None;

    for entry in WalkDir::new(theme_dir).follow_links(true) {
        let Ok(entry) = entry else {
            continue;
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let matches_name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem == name);
        if !matches_name || !has_icon_extension(path) {
            continue;
        }

        let score = candidate_score(path, size);
        let better = match &best {
            Some((best_score, _)) => score < *best_score,
            None => true,
        };
        if better {
            best = Some((score, path.to_path_buf()));
        }
    }

    best.map(|(_, path)| path)
}

fn has_icon_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png") || ext.eq_ignore_ascii_case("svg"))
}

fn candidate_score(path: &Path, size: u32) -> u32 {
    let mut hint = None;
    for component in path.components() {
        let Some(text) = component.as_os_str().to_str() else {
            continue;
        };
        if text.eq_ignore_ascii_case("scalable") {
            return 1;
        }
        if let Some(dim) = parse_size_component(text) {
            hint = Some(dim);
        }
    }
    match hint {
        Some(dim) if dim == size => 0,
        Some(dim) => 2 + dim.abs_diff(size),
        None => 2 + size,
    }
}

// "48x48" or plain "48" directory names
fn parse_size_component(text: &str) -> Option<u32> {
    if let Some((w, h)) = text.split_once('x') {
        let w = w.parse::<u32>().ok()?;
        let h = h.parse::<u32>().ok()?;
        if w == h {
            return Some(w);
        }
        return None;
    }
    text.parse::<u32>().ok()
}

fn rasterize(path: &Path, size: u32) -> Result<RgbaImage> {
    let is_svg = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));

    if is_svg {
        render_svg(path, size)
    } else {
        let image = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgba8();
        Ok(fit_to_square(image, size))
    }
}

/// Scale into a size-by-size transparent canvas, preserving aspect.
fn fit_to_square(image: RgbaImage, size: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width == size && height == size {
        return image;
    }

    let ratio = (size as f64 / width as f64).min(size as f64 / height as f64);
    let new_width = ((width as f64 * ratio) as u32).max(1);
    let new_height = ((height as f64 * ratio) as u32).max(1);
    let resized = imageops::resize(&image, new_width, new_height, FilterType::CatmullRom);

    let mut canvas = RgbaImage::new(size, size);
    let x = (size - new_width) / 2;
    let y = (size - new_height) / 2;
    imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
    canvas
}

fn render_svg(path: &Path, size: u32) -> Result<RgbaImage> {
    let data = std::fs::read(path)?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let mut pixmap =
        tiny_skia::Pixmap::new(size, size).ok_or_else(|| anyhow!("zero-sized pixmap"))?;

    let view = tree.size();
    let scale = (size as f32 / view.width()).min(size as f32 / view.height());
    let tx = (size as f32 - view.width() * scale) / 2.0;
    let ty = (size as f32 - view.height() * scale) / 2.0;
    let transform = tiny_skia::Transform::from_row(scale, 0.0, 0.0, scale, tx, ty);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let mut out = RgbaImage::new(size, size);
    for (index, pixel) in pixmap.pixels().iter().enumerate() {
        let color = pixel.demultiply();
        let x = index as u32 % size;
        let y = index as u32 / size;
        out.put_pixel(
            x,
            y,
            Rgba([color.red(), color.green(), color.blue(), color.alpha()]),
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_solid_png(path: &Path, dim: u32, rgba: [u8; 4]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let image = RgbaImage::from_pixel(dim, dim, Rgba(rgba));
        image.save(path).unwrap();
    }

    #[test]
    fn resolves_png_to_requested_size() {
        let root = tempdir().unwrap();
        write_solid_png(
            &root.path().join("mytheme/48x48/apps/browser.png"),
            48,
            [0, 0, 255, 255],
        );

        let resolver = XdgIconResolver::with_roots(vec![root.path().to_path_buf()]);
        let image = resolver.resolve("mytheme", "browser", 36).unwrap();
        assert_eq!(image.dimensions(), (36, 36));
        assert_eq!(image.get_pixel(18, 18).0, [0, 0, 255, 255]);
    }

    #[test]
    fn prefers_directory_with_matching_size() {
        let root = tempdir().unwrap();
        write_solid_png(
            &root.path().join("mytheme/24x24/apps/browser.png"),
            24,
            [255, 0, 0, 255],
        );
        write_solid_png(
            &root.path().join("mytheme/48x48/apps/browser.png"),
            48,
            [0, 255, 0, 255],
        );

        let resolver = XdgIconResolver::with_roots(vec![root.path().to_path_buf()]);
        let image = resolver.resolve("mytheme", "browser", 48).unwrap();
        assert_eq!(image.get_pixel(24, 24).0, [0, 255, 0, 255]);
    }

    #[test]
    fn falls_back_to_hicolor() {
        let root = tempdir().unwrap();
        write_solid_png(
            &root.path().join("hicolor/32x32/apps/editor.png"),
            32,
            [9, 9, 9, 255],
        );

        let resolver = XdgIconResolver::with_roots(vec![root.path().to_path_buf()]);
        assert!(resolver.resolve("mytheme", "editor", 32).is_some());
        assert!(resolver.resolve("mytheme", "absent", 32).is_none());
    }

    #[test]
    fn renders_svg_at_requested_size() {
        let root = tempdir().unwrap();
        let svg_path = root.path().join("mytheme/scalable/apps/player.svg");
        std::fs::create_dir_all(svg_path.parent().unwrap()).unwrap();
        std::fs::write(
            &svg_path,
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><rect width="16" height="16" fill="#ff0000"/></svg>"##,
        )
        .unwrap();

        let resolver = XdgIconResolver::with_roots(vec![root.path().to_path_buf()]);
        let image = resolver.resolve("mytheme", "player", 36).unwrap();
        assert_eq!(image.dimensions(), (36, 36));
        let center = image.get_pixel(18, 18).0;
        assert_eq!(center[0], 255);
        assert_eq!(center[3], 255);
    }

    #[test]
    fn non_square_png_is_letterboxed() {
        let root = tempdir().unwrap();
        let path = root.path().join("mytheme/48x48/apps/wide.png");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let image = RgbaImage::from_pixel(48, 24, Rgba([7, 7, 7, 255]));
        image.save(&path).unwrap();

        let resolver = XdgIconResolver::with_roots(vec![root.path().to_path_buf()]);
        let out = resolver.resolve("mytheme", "wide", 36).unwrap();
        assert_eq!(out.dimensions(), (36, 36));
        // letterbox rows stay transparent
        assert_eq!(out.get_pixel(18, 2).0[3], 0);
        assert_eq!(out.get_pixel(18, 18).0[3], 255);
    }
}
