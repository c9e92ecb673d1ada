// Candidate selection: one representative image per visual slot.

use image::RgbaImage;

/// Cursor roles shown in a cursor-theme thumbnail, one group per slot,
/// candidate names in preference order.
pub const PRESENT_CURSORS: &[&[&str]] = &[
    &["left_ptr"],
    &["left_ptr_watch"],
    &["x-cursor", "X_cursor"],
    &["hand2", "hand1"],
    &["grab", "grabbing", "closedhand"],
    &["fleur", "move"],
    &["sb_v_double_arrow"],
];

/// Application categories shown in an icon-theme thumbnail.
pub const PRESENT_ICONS: &[&[&str]] = &[
    // file manager
    &["dde-file-manager", "system-file-manager"],
    // music player
    &[
        "deepin-music",
        "banshee",
        "amarok",
        "deadbeef",
        "clementine",
        "rhythmbox",
    ],
    // image viewer
    &[
        "deepin-image-viewer",
        "eog",
        "gthumb",
        "gwenview",
        "gpicview",
        "showfoto",
        "phototonic",
    ],
    // web browser
    &[
        "org.deepin.browser",
        "google-chrome",
        "firefox",
        "chromium",
        "opera",
        "internet-web-browser",
        "browser",
    ],
    // system settings
    &["user-trash"],
];

/// Pick at most one image per candidate group, preserving group order.
///
/// The first candidate that decodes closes its group. A decoded image that
/// is pixel-identical to an earlier selection also closes the group but
/// contributes nothing: the slot is visually redundant.
pub fn select_images<F>(groups: &[&[&str]], mut load: F) -> Vec<RgbaImage>
where
    F: FnMut(&str) -> Option<RgbaImage>,
{
    let mut selected: Vec<RgbaImage> = Vec::new();
    for group in groups {
        for name in *group {
            let Some(image) = load(name) else {
                continue;
            };
            if !selected.iter().any(|prev| is_duplicate(prev, &image)) {
                selected.push(image);
            }
            break;
        }
    }
    selected
}

fn is_duplicate(a: &RgbaImage, b: &RgbaImage) -> bool {
    a.dimensions() == b.dimensions() && a.as_raw() == b.as_raw()
}
