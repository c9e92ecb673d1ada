// End-to-end tests for the thumbnail pipeline: synthetic cursor themes and
// stub icon resolvers through Generator to decoded PNG output.

use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

use crate::config::Config;
use crate::generator::Generator;
use crate::pipeline::icons::IconResolver;
use crate::pipeline::xcursor::synthetic_cursor_bytes;

fn write_cursor(theme_dir: &Path, name: &str, argb: u32) {
    let cursors_dir = theme_dir.join("cursors");
    fs::create_dir_all(&cursors_dir).unwrap();
    fs::write(
        cursors_dir.join(name),
        synthetic_cursor_bytes(&[(24, 24, argb)]),
    )
    .unwrap();
}

fn generator(cache_root: &Path) -> Generator {
    Generator::new(Config {
        cache_root: cache_root.to_path_buf(),
    })
}

#[test]
fn cursor_thumbnail_end_to_end() {
    let dir = tempdir().unwrap();
    let theme_dir = dir.path().join("theme");
    write_cursor(&theme_dir, "left_ptr", 0xffff_0000); // opaque red
    write_cursor(&theme_dir, "hand2", 0xff00_00ff); // opaque blue
    // pixel-identical to left_ptr: its group must be suppressed
    write_cursor(&theme_dir, "grab", 0xffff_0000);

    let cache_root = dir.path().join("cache");
    let thumbs = generator(&cache_root);
    thumbs.update_scale_factor(1.0);

    let out = thumbs.get_cursor("mytheme", &theme_dir).unwrap();
    assert_eq!(
        out,
        cache_root.join("X1").join("cursor-v1").join("mytheme.png")
    );

    let canvas = image::open(&out).unwrap().to_rgba8();
    assert_eq!(canvas.dimensions(), (55, 36));
    // left_ptr glyph, then hand2 at the advance offset, centered vertically
    assert_eq!(canvas.get_pixel(0, 6).0, [255, 0, 0, 255]);
    assert_eq!(canvas.get_pixel(31, 6).0, [0, 0, 255, 255]);
    // slot gap and margins stay transparent
    assert_eq!(canvas.get_pixel(27, 18).0[3], 0);
    assert_eq!(canvas.get_pixel(0, 2).0[3], 0);
}

#[test]
fn cursor_cache_reused_until_source_changes() {
    let dir = tempdir().unwrap();
    let theme_dir = dir.path().join("theme");
    write_cursor(&theme_dir, "left_ptr", 0xffff_0000);
    write_cursor(&theme_dir, "hand2", 0xff00_00ff);

    let cache_root = dir.path().join("cache");
    let thumbs = generator(&cache_root);
    thumbs.update_scale_factor(1.0);

    let first = thumbs.get_cursor("mytheme", &theme_dir).unwrap();

    // append a marker; a reused cache entry keeps it, a regeneration drops it
    let mut bytes = fs::read(&first).unwrap();
    bytes.push(0xAB);
    let marked_len = bytes.len() as u64;
    fs::write(&first, &bytes).unwrap();

    let second = thumbs.get_cursor("mytheme", &theme_dir).unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::metadata(&second).unwrap().len(), marked_len);

    // age the cached file, then change the theme: a third slot appears
    let cached = fs::OpenOptions::new().write(true).open(&first).unwrap();
    cached
        .set_modified(SystemTime::now() - Duration::from_secs(120))
        .unwrap();
    drop(cached);
    write_cursor(&theme_dir, "fleur", 0xff00_ff00);
    fs::write(theme_dir.join("touched"), b"x").unwrap();

    let third = thumbs.get_cursor("mytheme", &theme_dir).unwrap();
    assert_eq!(first, third);
    let canvas = image::open(&third).unwrap().to_rgba8();
    assert_eq!(canvas.dimensions(), (24 * 3 + 7 * 2, 36));
}

#[test]
fn cursor_thumbnail_partitions_by_scale() {
    let dir = tempdir().unwrap();
    let theme_dir = dir.path().join("theme");
    let cursors_dir = theme_dir.join("cursors");
    fs::create_dir_all(&cursors_dir).unwrap();
    fs::write(
        cursors_dir.join("left_ptr"),
        synthetic_cursor_bytes(&[(24, 24, 0xffff_0000), (48, 48, 0xffff_0000)]),
    )
    .unwrap();

    let cache_root = dir.path().join("cache");
    let thumbs = generator(&cache_root);
    thumbs.update_scale_factor(2.0);

    let out = thumbs.get_cursor("mytheme", &theme_dir).unwrap();
    assert_eq!(
        out,
        cache_root.join("X2").join("cursor-v1").join("mytheme.png")
    );

    // one 48px glyph on a 48x72 canvas, centered
    let canvas = image::open(&out).unwrap().to_rgba8();
    assert_eq!(canvas.dimensions(), (48, 72));
    assert_eq!(canvas.get_pixel(24, 36).0, [255, 0, 0, 255]);
    assert_eq!(canvas.get_pixel(24, 6).0[3], 0);
}

#[test]
fn theme_without_decodable_cursors_yields_nothing() {
    let dir = tempdir().unwrap();
    let theme_dir = dir.path().join("theme");
    fs::create_dir_all(theme_dir.join("cursors")).unwrap();
    fs::write(theme_dir.join("cursors").join("left_ptr"), b"not a cursor").unwrap();

    let thumbs = generator(&dir.path().join("cache"));
    thumbs.update_scale_factor(1.0);
    assert!(thumbs.get_cursor("mytheme", &theme_dir).is_none());
}

struct StubIcons;

impl IconResolver for StubIcons {
    fn resolve(&self, _theme: &str, name: &str, size: u32) -> Option<RgbaImage> {
        match name {
            "dde-file-manager" => Some(RgbaImage::from_pixel(size, size, Rgba([1, 0, 0, 255]))),
            "firefox" => Some(RgbaImage::from_pixel(size, size, Rgba([2, 0, 0, 255]))),
            // same pixels as the file manager: the trash group must collapse
            "user-trash" => Some(RgbaImage::from_pixel(size, size, Rgba([1, 0, 0, 255]))),
            _ => None,
        }
    }
}

#[test]
fn icon_thumbnail_end_to_end() {
    let dir = tempdir().unwrap();
    let desc = dir.path().join("index.theme");
    fs::write(&desc, "[Icon Theme]\nName=mytheme\n").unwrap();

    let cache_root = dir.path().join("cache");
    let thumbs = Generator::with_resolver(
        Config {
            cache_root: cache_root.to_path_buf(),
        },
        StubIcons,
    );
    thumbs.update_scale_factor(1.0);

    let out = thumbs.get_icon("mytheme", &desc).unwrap();
    assert_eq!(
        out,
        cache_root.join("X1").join("icon-v1").join("mytheme.png")
    );

    // file manager + browser survive, the duplicate trash slot does not
    let canvas = image::open(&out).unwrap().to_rgba8();
    assert_eq!(canvas.dimensions(), (36 * 2 + 10, 36));
    assert_eq!(canvas.get_pixel(0, 18).0, [1, 0, 0, 255]);
    assert_eq!(canvas.get_pixel(46, 18).0, [2, 0, 0, 255]);
}
