//! Where source images come from.

use crate::config::MIN_STICKERS_PER_PACK;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use whereat::*;

/// File extensions treated as images, lowercase.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif", "bmp", "tif", "tiff"];

/// A source image: its path inside the source and its encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Path relative to the source root, `/`-separated.
    pub name: String,
    /// Encoded image bytes, format not yet known.
    pub data: Vec<u8>,
}

/// Provides the ordered list of images to convert.
///
/// Implementations return only entries that look like images and are not
/// metadata, and fail with [`Error::Archive`] when fewer than three remain.
pub trait ImageSource {
    /// Load every qualifying image, in conversion order.
    fn load(&mut self) -> Result<Vec<SourceImage>>;
}

/// Whether an entry name looks like a convertible image.
///
/// Rejects anything under `__MACOSX/`, dot-files such as `._cat.png` or
/// `.DS_Store`, and names without a known image extension.
pub fn is_image_entry(name: &str) -> bool {
    let name = name.replace('\\', "/");
    let mut components = name.split('/').filter(|c| !c.is_empty()).peekable();
    let mut file = None;
    while let Some(component) = components.next() {
        if component == "__MACOSX" || component.starts_with('.') {
            return false;
        }
        if components.peek().is_none() {
            file = Some(component);
        }
    }
    let Some(file) = file else {
        return false;
    };
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

fn select(entries: Vec<SourceImage>) -> Result<Vec<SourceImage>> {
    let total = entries.len();
    let images: Vec<SourceImage> = entries
        .into_iter()
        .filter(|entry| is_image_entry(&entry.name))
        .collect();
    log::debug!("{} of {} entries are images", images.len(), total);
    if images.len() < MIN_STICKERS_PER_PACK {
        return Err(at!(Error::Archive(format!(
            "found {} images, need at least {}",
            images.len(),
            MIN_STICKERS_PER_PACK
        ))));
    }
    Ok(images)
}

/// Images held in memory, kept in the order given.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<SourceImage>,
}

impl MemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named entry. Non-image names are filtered out on load.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.push(name, data);
        self
    }

    /// Add a named entry in place.
    pub fn push(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.entries.push(SourceImage {
            name: name.into(),
            data: data.into(),
        });
    }
}

impl ImageSource for MemorySource {
    fn load(&mut self) -> Result<Vec<SourceImage>> {
        select(self.entries.clone())
    }
}

/// A folder of images, walked recursively, ordered by relative path.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Read images under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Collect files under `dir`, following symlinks. `visited` holds the
    /// canonical directories already walked so link cycles end.
    fn walk(
        &self,
        dir: &Path,
        visited: &mut HashSet<PathBuf>,
        out: &mut Vec<PathBuf>,
    ) -> Result<()> {
        let canonical = fs::canonicalize(dir).map_err(|e| {
            at!(Error::Archive(format!("cannot read {}: {}", dir.display(), e)))
        })?;
        if !visited.insert(canonical) {
            log::debug!("skipping {}: already walked", dir.display());
            return Ok(());
        }

        let entries = fs::read_dir(dir).map_err(|e| {
            at!(Error::Archive(format!("cannot read {}: {}", dir.display(), e)))
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| at!(Error::Archive(e.to_string())))?;
            let path = entry.path();
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::warn!("skipping {}: {}", path.display(), e);
                    continue;
                }
            };
            if metadata.is_dir() {
                self.walk(&path, visited, out)?;
            } else if metadata.is_file() {
                out.push(path);
            }
        }
        Ok(())
    }

    fn relative_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl ImageSource for DirectorySource {
    fn load(&mut self) -> Result<Vec<SourceImage>> {
        let mut paths = Vec::new();
        self.walk(&self.root, &mut HashSet::new(), &mut paths)?;

        let mut named: Vec<(String, PathBuf)> = paths
            .into_iter()
            .map(|path| (self.relative_name(&path), path))
            .filter(|(name, _)| is_image_entry(name))
            .collect();
        named.sort_by(|a, b| a.0.cmp(&b.0));

        let entries = named
            .into_iter()
            .map(|(name, path)| {
                let data = fs::read(&path).map_err(|e| {
                    at!(Error::Archive(format!("cannot read {}: {}", path.display(), e)))
                })?;
                Ok(SourceImage { name, data })
            })
            .collect::<Result<Vec<_>>>()?;

        select(entries)
    }
}
