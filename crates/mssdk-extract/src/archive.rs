//! # Archive extraction and packing
//!
//! Supports zip, plain tar and gzip-compressed tar. The format is taken from
//! the file extension, falling back to the leading magic bytes for
//! extensionless files. Unpacking accepts only regular files and
//! directories that land inside the destination; link entries are refused.
//! The cancellation token is checked between entries, and temporary
//! extraction removes its directory again on any failure.
//!
//! Packing walks the directory in sorted order with fixed entry metadata, so
//! packing the same tree twice yields the same entry list.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio_util::sync::CancellationToken;

use crate::error::{ExtractError, ExtractResult};
use crate::scoped::ScopedDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    /// Format implied by the file name, if any.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(Self::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if name.ends_with(".tar") {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Format of an existing file: extension first, then magic bytes.
    pub fn detect(path: &Path) -> ExtractResult<Self> {
        if let Some(format) = Self::from_extension(path) {
            return Ok(format);
        }
        let mut magic = [0u8; 4];
        let mut file = File::open(path).map_err(|e| ExtractError::io(path, e))?;
        let n = file.read(&mut magic).map_err(|e| ExtractError::io(path, e))?;
        match &magic[..n] {
            [b'P', b'K', 0x03, 0x04] => Ok(Self::Zip),
            [0x1f, 0x8b, ..] => Ok(Self::TarGz),
            _ => Err(ExtractError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

/// Unpacks package archives and packs package directories.
#[derive(Debug, Clone, Default)]
pub struct ArchiveExtractor {
    cancel: Option<CancellationToken>,
    scratch: Option<PathBuf>,
}

impl ArchiveExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Create temporary extraction directories under `dir` instead of the
    /// system temp dir.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch = Some(dir.into());
        self
    }

    /// Unpack `source` into `destination`, creating it if needed.
    pub fn extract(&self, source: &Path, destination: &Path) -> ExtractResult<PathBuf> {
        let _span = tracing::info_span!("extract_archive", source = %source.display()).entered();
        check_source(source)?;
        let format = ArchiveFormat::detect(source)?;
        if destination.exists() && !destination.is_dir() {
            return Err(ExtractError::NotADirectory {
                path: destination.to_path_buf(),
            });
        }
        fs::create_dir_all(destination).map_err(|e| ExtractError::io(destination, e))?;
        self.unpack(source, format, destination)?;
        Ok(destination.to_path_buf())
    }

    /// Unpack `source` into a fresh temporary directory owned by the
    /// returned guard.
    pub fn extract_temporary(&self, source: &Path) -> ExtractResult<ScopedDir> {
        let _span = tracing::info_span!("extract_archive", source = %source.display()).entered();
        check_source(source)?;
        let format = ArchiveFormat::detect(source)?;
        let scoped = ScopedDir::create_in(self.scratch.as_deref())?;
        self.unpack(source, format, scoped.path())?;
        tracing::debug!(root = %scoped.path().display(), "archive extracted");
        Ok(scoped)
    }

    /// Pack the contents of `directory` into `archive_path`. The format is
    /// chosen from the archive extension.
    pub fn pack(&self, directory: &Path, archive_path: &Path) -> ExtractResult<PathBuf> {
        let _span = tracing::info_span!("pack_archive", directory = %directory.display()).entered();
        if !directory.exists() {
            return Err(ExtractError::NotFound {
                path: directory.to_path_buf(),
            });
        }
        if !directory.is_dir() {
            return Err(ExtractError::NotADirectory {
                path: directory.to_path_buf(),
            });
        }
        let format = ArchiveFormat::from_extension(archive_path).ok_or_else(|| {
            ExtractError::UnsupportedFormat {
                path: archive_path.to_path_buf(),
            }
        })?;
        if let Some(parent) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ExtractError::io(parent, e))?;
        }
        // The archive may live inside the directory being packed.
        let skip = canonical_target(archive_path)?;
        let mut entries = Vec::new();
        collect_entries(directory, directory, &skip, &mut entries)?;
        let file = File::create(archive_path).map_err(|e| ExtractError::io(archive_path, e))?;

        let packed = match format {
            ArchiveFormat::Zip => self.write_zip(file, &entries),
            ArchiveFormat::Tar => self.write_tar(file, &entries).map(|_| ()),
            ArchiveFormat::TarGz => {
                let encoder = GzEncoder::new(file, Compression::default());
                self.write_tar(encoder, &entries).and_then(|encoder| {
                    encoder.finish().map(|_| ()).map_err(|e| ExtractError::archive(archive_path, e))
                })
            }
        };
        if let Err(e) = packed {
            let _ = fs::remove_file(archive_path);
            return Err(match e {
                ExtractError::Archive { source, .. } => ExtractError::Archive {
                    archive: archive_path.to_path_buf(),
                    source,
                },
                other => other,
            });
        }
        tracing::info!(archive = %archive_path.display(), entries = entries.len(), "directory packed");
        Ok(archive_path.to_path_buf())
    }

    fn check_cancelled(&self) -> ExtractResult<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(ExtractError::Cancelled),
            _ => Ok(()),
        }
    }

    fn unpack(&self, source: &Path, format: ArchiveFormat, dest: &Path) -> ExtractResult<()> {
        let file = File::open(source).map_err(|e| ExtractError::io(source, e))?;
        let len = file.metadata().map_err(|e| ExtractError::io(source, e))?.len();
        if len == 0 {
            return Err(ExtractError::archive(source, "archive file is empty"));
        }
        let reader = BufReader::new(file);
        match format {
            ArchiveFormat::Zip => self.unpack_zip(reader, source, dest),
            ArchiveFormat::Tar => self.unpack_tar(reader, source, dest),
            ArchiveFormat::TarGz => self.unpack_tar(GzDecoder::new(reader), source, dest),
        }
    }

    fn unpack_zip(&self, reader: BufReader<File>, source: &Path, dest: &Path) -> ExtractResult<()> {
        let mut archive =
            zip::ZipArchive::new(reader).map_err(|e| ExtractError::archive(source, e))?;
        for i in 0..archive.len() {
            self.check_cancelled()?;
            let mut entry = archive
                .by_index(i)
                .map_err(|e| ExtractError::archive(source, e))?;
            let link = is_symlink_mode(entry.unix_mode());
            let Some(relative) = entry.enclosed_name().filter(|_| !link) else {
                return Err(ExtractError::UnsafeEntry {
                    archive: source.to_path_buf(),
                    entry: entry.name().to_string(),
                });
            };
            let out = dest.join(relative);
            if entry.is_dir() {
                fs::create_dir_all(&out).map_err(|e| ExtractError::io(&out, e))?;
                continue;
            }
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent).map_err(|e| ExtractError::io(parent, e))?;
            }
            let mut file = File::create(&out).map_err(|e| ExtractError::io(&out, e))?;
            // A read failure here is a decompression or CRC failure.
            io::copy(&mut entry, &mut file).map_err(|e| ExtractError::archive(source, e))?;
        }
        Ok(())
    }

    fn unpack_tar<R: Read>(&self, reader: R, source: &Path, dest: &Path) -> ExtractResult<()> {
        let mut archive = tar::Archive::new(reader);
        let entries = archive
            .entries()
            .map_err(|e| ExtractError::archive(source, e))?;
        for entry in entries {
            self.check_cancelled()?;
            let mut entry = entry.map_err(|e| ExtractError::archive(source, e))?;
            let name = entry
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            let kind = entry.header().entry_type();
            if !(kind.is_file() || kind.is_dir()) {
                return Err(ExtractError::UnsafeEntry {
                    archive: source.to_path_buf(),
                    entry: name,
                });
            }
            let unpacked = entry
                .unpack_in(dest)
                .map_err(|e| ExtractError::archive(source, e))?;
            if !unpacked {
                return Err(ExtractError::UnsafeEntry {
                    archive: source.to_path_buf(),
                    entry: name,
                });
            }
        }
        Ok(())
    }

    fn write_zip(&self, file: File, entries: &[PackEntry]) -> ExtractResult<()> {
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        for entry in entries {
            self.check_cancelled()?;
            let archive_err = |e: zip::result::ZipError| ExtractError::archive(&entry.source, e);
            if entry.is_dir {
                writer
                    .add_directory(format!("{}/", entry.name), options)
                    .map_err(archive_err)?;
            } else {
                writer
                    .start_file(entry.name.clone(), options)
                    .map_err(archive_err)?;
                let mut input =
                    File::open(&entry.source).map_err(|e| ExtractError::io(&entry.source, e))?;
                io::copy(&mut input, &mut writer).map_err(|e| ExtractError::io(&entry.source, e))?;
            }
        }
        writer
            .finish()
            .map_err(|e| ExtractError::archive(PathBuf::new(), e))?;
        Ok(())
    }

    fn write_tar<W: Write>(&self, writer: W, entries: &[PackEntry]) -> ExtractResult<W> {
        let mut builder = tar::Builder::new(writer);
        builder.mode(tar::HeaderMode::Deterministic);
        for entry in entries {
            self.check_cancelled()?;
            let appended = if entry.is_dir {
                builder.append_dir(&entry.name, &entry.source)
            } else {
                builder.append_path_with_name(&entry.source, &entry.name)
            };
            appended.map_err(|e| ExtractError::io(&entry.source, e))?;
        }
        builder
            .into_inner()
            .map_err(|e| ExtractError::archive(PathBuf::new(), e))
    }
}

/// Whether zip entry mode bits mark a symbolic link.
fn is_symlink_mode(mode: Option<u32>) -> bool {
    const S_IFMT: u32 = 0o170000;
    const S_IFLNK: u32 = 0o120000;
    mode.is_some_and(|mode| mode & S_IFMT == S_IFLNK)
}

/// Absolute path `archive_path` will have, without requiring it to exist.
fn canonical_target(archive_path: &Path) -> ExtractResult<PathBuf> {
    let parent = match archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let parent = parent
        .canonicalize()
        .map_err(|e| ExtractError::io(parent, e))?;
    match archive_path.file_name() {
        Some(name) => Ok(parent.join(name)),
        None => Err(ExtractError::InvalidArgument(format!(
            "archive path has no file name: {}",
            archive_path.display()
        ))),
    }
}

fn check_source(source: &Path) -> ExtractResult<()> {
    if !source.exists() {
        return Err(ExtractError::NotFound {
            path: source.to_path_buf(),
        });
    }
    if !source.is_file() {
        return Err(ExtractError::NotAFile {
            path: source.to_path_buf(),
        });
    }
    Ok(())
}

#[derive(Debug)]
struct PackEntry {
    name: String,
    source: PathBuf,
    is_dir: bool,
}

fn collect_entries(
    root: &Path,
    dir: &Path,
    skip: &Path,
    out: &mut Vec<PackEntry>,
) -> ExtractResult<()> {
    let mut children: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| ExtractError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<_, _>>()
        .map_err(|e| ExtractError::io(dir, e))?;
    children.sort();
    for path in children {
        if path.canonicalize().map(|p| p == skip).unwrap_or(false) {
            continue;
        }
        let name = archive_name(root, &path)?;
        if path.is_dir() {
            out.push(PackEntry {
                name,
                source: path.clone(),
                is_dir: true,
            });
            collect_entries(root, &path, skip, out)?;
        } else {
            out.push(PackEntry {
                name,
                source: path,
                is_dir: false,
            });
        }
    }
    Ok(())
}

fn archive_name(root: &Path, path: &Path) -> ExtractResult<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ExtractError::InvalidArgument(format!("{} is outside {}", path.display(), root.display())))?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component.as_os_str().to_str() {
            Some(s) => segments.push(s),
            None => {
                return Err(ExtractError::InvalidArgument(format!(
                    "non UTF-8 file name: {}",
                    path.display()
                )))
            }
        }
    }
    Ok(segments.join("/"))
}
