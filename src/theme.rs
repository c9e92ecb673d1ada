// Theme description handle: base path, display name and the optional
// comma-separated list of shipped example previews.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default)]
pub struct ThemeDescriptor {
    path: PathBuf,
    name: String,
    example: String,
}

impl ThemeDescriptor {
    pub fn new<P: Into<PathBuf>>(
        path: P,
        name: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            example: example.into(),
        }
    }

    /// Read a description file (`Key=Value` lines, section headers and
    /// comments ignored). The descriptor's base path is the file's
    /// directory; relative example paths resolve against it.
    pub fn load(desc_file: &Path) -> Result<Self> {
        let file = File::open(desc_file)
            .with_context(|| format!("failed to open theme description {}", desc_file.display()))?;
        let path = desc_file
            .parent()
            .unwrap_or_else(|| Path::new("/"))
            .to_path_buf();

        let mut name = String::new();
        let mut example = String::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with(';')
                || line.starts_with('[')
            {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key.trim() {
                "Name" if name.is_empty() => name = value.trim().to_string(),
                "Example" if example.is_empty() => example = value.trim().to_string(),
                _ => {}
            }
        }

        if name.is_empty() {
            if let Some(dir) = path.file_name().and_then(|n| n.to_str()) {
                name = dir.to_string();
            }
        }

        Ok(Self {
            path,
            name,
            example,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn example(&self) -> &str {
        &self.example
    }

    pub fn example_list(&self) -> Vec<&str> {
        self.example
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_reads_name_and_example() {
        let dir = tempdir().unwrap();
        let desc = dir.path().join("index.theme");
        std::fs::write(
            &desc,
            "# preview metadata\n\
             [Deepin Theme]\n\
             Name=white\n\
             Example=preview-light.svg,preview-dark.svg\n",
        )
        .unwrap();

        let theme = ThemeDescriptor::load(&desc).unwrap();
        assert_eq!(theme.name(), "white");
        assert_eq!(theme.path(), dir.path());
        assert_eq!(
            theme.example_list(),
            vec!["preview-light.svg", "preview-dark.svg"]
        );
    }

    #[test]
    fn load_falls_back_to_directory_name() {
        let dir = tempdir().unwrap();
        let theme_dir = dir.path().join("bloom");
        std::fs::create_dir_all(&theme_dir).unwrap();
        let desc = theme_dir.join("index.theme");
        std::fs::write(&desc, "[Deepin Theme]\nComment=no name here\n").unwrap();

        let theme = ThemeDescriptor::load(&desc).unwrap();
        assert_eq!(theme.name(), "bloom");
        assert!(theme.example_list().is_empty());
    }

    #[test]
    fn example_list_skips_blank_entries() {
        let theme = ThemeDescriptor::new("/tmp", "t", "a.png, ,b.png,");
        assert_eq!(theme.example_list(), vec!["a.png", "b.png"]);
    }
}
