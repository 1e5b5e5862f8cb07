//! Chunk store over zipped legacy region worlds.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;
use zip::result::ZipError;

use chisel_utils::ChunkPos;

use crate::error::ChunkStoreError;

/// Legacy region chunk store backed by a ZIP archive.
///
/// Entries are expected under `<world>/region/<name>.mca|.mcr`, optionally
/// nested below a prefix, written with either path-separator convention.
/// The prefix is auto-detected on first lookup unless pinned up front.
pub struct ZippedRegionChunkStore<R: Read + Seek> {
    archive: ZipArchive<R>,
    /// `None` until detected; `Some("")` means the archive root.
    folder: Option<String>,
}

impl ZippedRegionChunkStore<BufReader<File>> {
    /// Opens a zipped world at `path`, auto-detecting the region folder on
    /// first lookup.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ChunkStoreError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), None)
    }

    /// Opens a zipped world at `path` with a pinned folder prefix. An empty
    /// string reads entries from the archive root.
    pub fn open_with_folder(
        path: impl AsRef<Path>,
        folder: impl Into<String>,
    ) -> Result<Self, ChunkStoreError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), Some(folder.into()))
    }
}

impl<R: Read + Seek> ZippedRegionChunkStore<R> {
    /// Wraps an already-open archive. `folder` pins the prefix to look
    /// under; `None` auto-detects it on first lookup.
    pub fn from_reader(reader: R, folder: Option<String>) -> Result<Self, ChunkStoreError> {
        let archive = ZipArchive::new(reader).map_err(io::Error::other)?;
        Ok(Self { archive, folder })
    }

    /// Reads the raw bytes of one region file (e.g. `r.0.0.mca`) belonging
    /// to `world`, trying both path separators and falling back from `.mca`
    /// to the older `.mcr` naming.
    pub fn region_input(&mut self, name: &str, world: &str) -> Result<Vec<u8>, ChunkStoreError> {
        let folder = self.resolve_folder(world)?;
        let name = if folder.is_empty() {
            name.to_owned()
        } else {
            format!("{folder}/{name}")
        };

        if let Some(bytes) = self.read_entry(&name)? {
            return Ok(bytes);
        }
        if let Some(stripped) = name.strip_suffix(".mca") {
            let legacy = format!("{stripped}.mcr");
            if let Some(bytes) = self.read_entry(&legacy)? {
                return Ok(bytes);
            }
        }
        Err(ChunkStoreError::MissingChunk {
            world: world.to_owned(),
            name,
        })
    }

    /// Raw bytes of the region file containing `pos`.
    pub fn chunk_data(&mut self, pos: ChunkPos, world: &str) -> Result<Vec<u8>, ChunkStoreError> {
        let name = format!("r.{}.{}.mca", pos.region_x(), pos.region_z());
        self.region_input(&name, world)
    }

    /// Cheap structural sniff: true iff the archive contains any region
    /// file, current or legacy naming. Not a deep validation.
    pub fn is_valid(&self) -> bool {
        self.archive
            .file_names()
            .any(|entry| entry.ends_with(".mca") || entry.ends_with(".mcr"))
    }

    /// Scans the archive for an entry proving where `world`'s region files
    /// live. The result is cached so one store only ever scans once.
    fn resolve_folder(&mut self, world: &str) -> Result<String, ChunkStoreError> {
        if let Some(folder) = &self.folder {
            return Ok(folder.clone());
        }
        let detected = self.archive.file_names().find_map(|entry| {
            if !matches_world(entry, world) || !is_region_entry(entry) {
                return None;
            }
            let end = entry.rfind(['/', '\\'])?;
            let folder = &entry[..end];
            // Point-of-interest data lives next to the region folder and
            // uses the same file naming; it is not chunk data.
            if folder.ends_with("poi") {
                return None;
            }
            Some(folder.to_owned())
        });
        match detected {
            Some(folder) => {
                log::debug!("detected region folder {folder:?} for world {world:?}");
                self.folder = Some(folder.clone());
                Ok(folder)
            }
            None => Err(ChunkStoreError::MissingWorld(world.to_owned())),
        }
    }

    /// Reads an entry, trying both separator conventions. `Ok(None)` means
    /// the entry does not exist under either.
    fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>, ChunkStoreError> {
        for candidate in [name.to_owned(), name.replace('/', "\\")] {
            match self.archive.by_name(&candidate) {
                Ok(mut entry) => {
                    let mut bytes = Vec::with_capacity(entry.size() as usize);
                    entry.read_to_end(&mut bytes).map_err(|err| {
                        io::Error::new(
                            err.kind(),
                            format!("failed to read {candidate} in archive: {err}"),
                        )
                    })?;
                    return Ok(Some(bytes));
                }
                Err(ZipError::FileNotFound) => {}
                Err(err) => return Err(ChunkStoreError::Io(io::Error::other(err))),
            }
        }
        Ok(None)
    }
}

fn matches_world(entry: &str, world: &str) -> bool {
    entry
        .strip_prefix(world)
        .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('\\'))
}

fn is_region_entry(entry: &str) -> bool {
    entry.ends_with(".mca") || entry.ends_with(".mcr")
}
