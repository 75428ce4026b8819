// snapshottool/src/snapshot/archive.rs
use std::fs::File;
use std::io::{self, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::Builder;
use tracing::info;
use walkdir::WalkDir;
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::{Result, SnapshotError};

/// Supported archive formats and the file extension each one produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    TarXz,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => ".zip",
            ArchiveFormat::Tar => ".tar",
            ArchiveFormat::TarGz => ".tar.gz",
            ArchiveFormat::TarBz2 => ".tar.bz2",
            ArchiveFormat::TarXz => ".tar.xz",
        }
    }
}

impl FromStr for ArchiveFormat {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "zip" => Ok(ArchiveFormat::Zip),
            "tar" => Ok(ArchiveFormat::Tar),
            "tar.gz" => Ok(ArchiveFormat::TarGz),
            "tar.bz2" => Ok(ArchiveFormat::TarBz2),
            "tar.xz" => Ok(ArchiveFormat::TarXz),
            other => Err(SnapshotError::Config(format!(
                "Unknown archive format '{other}'. Supported: zip, tar, tar.gz, tar.bz2, tar.xz"
            ))),
        }
    }
}

/// Creates a compressed archive of `source_dir` at `dest_path`.
///
/// The archive contains all files and directories within `source_dir`, with
/// paths relative to it. An existing regular file at `dest_path` is
/// overwritten; the parent directory is created if missing. The working
/// directory of the process is never touched.
///
/// # Returns
/// Path to the created archive file.
pub fn create_archive(
    source_dir: &Path,
    dest_path: &Path,
    format: ArchiveFormat,
) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        return Err(SnapshotError::SourceMissing(source_dir.to_path_buf()));
    }
    if dest_path.exists() && !dest_path.is_file() {
        return Err(SnapshotError::ArchiveConflict(dest_path.to_path_buf()));
    }
    if let Some(parent) = dest_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    info!(
        "creating {:?} archive of {} at {}",
        format,
        source_dir.display(),
        dest_path.display()
    );

    let archive_file = File::create(dest_path)?;

    match format {
        ArchiveFormat::Zip => write_zip(source_dir, archive_file)?,
        ArchiveFormat::Tar => {
            let mut builder = Builder::new(archive_file);
            append_dir_contents(&mut builder, source_dir)?;
            builder.into_inner()?;
        }
        ArchiveFormat::TarGz => {
            let enc = GzEncoder::new(archive_file, Compression::default());
            let mut builder = Builder::new(enc);
            append_dir_contents(&mut builder, source_dir)?;
            builder.into_inner()?.finish()?;
        }
        ArchiveFormat::TarBz2 => {
            let enc = BzEncoder::new(archive_file, bzip2::Compression::default());
            let mut builder = Builder::new(enc);
            append_dir_contents(&mut builder, source_dir)?;
            builder.into_inner()?.finish()?;
        }
        ArchiveFormat::TarXz => {
            let enc = XzEncoder::new(archive_file, 6);
            let mut builder = Builder::new(enc);
            append_dir_contents(&mut builder, source_dir)?;
            builder.into_inner()?.finish()?;
        }
    }

    info!("archive created at {}", dest_path.display());
    Ok(dest_path.to_path_buf())
}

/// Appends every entry under `source_dir` to the tar builder, paths relative
/// to `source_dir`.
fn append_dir_contents<W: Write>(builder: &mut Builder<W>, source_dir: &Path) -> Result<()> {
    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|e| {
            SnapshotError::Archive(format!("Failed to walk {}: {e}", source_dir.display()))
        })?;
        let path = entry.path();
        let name = match relative_name(path, source_dir)? {
            Some(name) => name,
            None => continue, // the source root itself
        };

        if path.is_dir() {
            builder.append_dir(&name, path)?;
        } else if path.is_file() {
            builder.append_path_with_name(path, &name)?;
        }
    }
    Ok(())
}

fn write_zip(source_dir: &Path, archive_file: File) -> Result<()> {
    let mut writer = ZipWriter::new(archive_file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir) {
        let entry = entry.map_err(|e| {
            SnapshotError::Archive(format!("Failed to walk {}: {e}", source_dir.display()))
        })?;
        let path = entry.path();
        let name = match relative_name(path, source_dir)? {
            Some(name) => name,
            None => continue,
        };
        let name = name.to_string_lossy().into_owned();

        if path.is_dir() {
            writer
                .add_directory(name.as_str(), options)
                .map_err(|e| SnapshotError::Archive(format!("Failed to add directory {name}: {e}")))?;
        } else if path.is_file() {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| SnapshotError::Archive(format!("Failed to start entry {name}: {e}")))?;
            let mut file = File::open(path)?;
            io::copy(&mut file, &mut writer)?;
        }
    }

    writer
        .finish()
        .map_err(|e| SnapshotError::Archive(format!("Failed to finish zip archive: {e}")))?;
    Ok(())
}

fn relative_name(path: &Path, source_dir: &Path) -> Result<Option<PathBuf>> {
    let name = path.strip_prefix(source_dir).map_err(|e| {
        SnapshotError::Archive(format!(
            "Failed to strip prefix {} from {}: {e}",
            source_dir.display(),
            path.display()
        ))
    })?;
    if name.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(name.to_path_buf()))
    }
}

/// Extracts an archive produced by [`create_archive`] into `dest_dir`.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path, format: ArchiveFormat) -> Result<()> {
    if !archive_path.is_file() {
        return Err(SnapshotError::Archive(format!(
            "Archive for extraction is not a file: {}",
            archive_path.display()
        )));
    }
    std::fs::create_dir_all(dest_dir)?;

    let archive_file = File::open(archive_path)?;
    match format {
        ArchiveFormat::Zip => extract_zip(archive_file, dest_dir)?,
        ArchiveFormat::Tar => unpack_tar(archive_file, dest_dir)?,
        ArchiveFormat::TarGz => unpack_tar(GzDecoder::new(archive_file), dest_dir)?,
        ArchiveFormat::TarBz2 => unpack_tar(BzDecoder::new(archive_file), dest_dir)?,
        ArchiveFormat::TarXz => unpack_tar(XzDecoder::new(archive_file), dest_dir)?,
    }
    Ok(())
}

fn unpack_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.unpack(dest_dir)?;
    Ok(())
}

fn extract_zip<R: Read + Seek>(reader: R, dest_dir: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| SnapshotError::Archive(format!("Failed to read zip archive: {e}")))?;
    archive
        .extract(dest_dir)
        .map_err(|e| SnapshotError::Archive(format!("Failed to extract zip archive: {e}")))?;
    Ok(())
}
