//! # Package Services
//!
//! Entry points that tie acquisition, assembly, validation and
//! serialization together. [`PackageService`] carries the extractors so
//! callers can configure git binaries, timeouts and cancellation once; the
//! free functions use a default service.

use std::path::{Path, PathBuf};

use mssdk_core::MappingPackage;
use mssdk_extract::{
    ArchiveExtractor, GitExtractor, GitSource, PackageRoots, ScopedDir, SourceExtractor,
};

use crate::assembler::PackageAssembler;
use crate::error::{PackError, PackResult};
use crate::repository::PackageRepository;
use crate::serializer::PackageSerializer;
use crate::validation::{PackageValidationError, ValidationPipeline};

/// Where packages come from.
pub enum PackageSource<'a> {
    Folder(PathBuf),
    Archive(PathBuf),
    Git(GitSource),
    Repository {
        repository: &'a dyn PackageRepository,
        id: String,
    },
}

impl std::fmt::Debug for PackageSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Folder(path) => f.debug_tuple("Folder").field(path).finish(),
            Self::Archive(path) => f.debug_tuple("Archive").field(path).finish(),
            Self::Git(source) => f.debug_tuple("Git").field(source).finish(),
            Self::Repository { id, .. } => f.debug_struct("Repository").field("id", id).finish(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PackageService {
    archive: ArchiveExtractor,
    git: GitExtractor,
    assembler: PackageAssembler,
}

impl PackageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_archive_extractor(mut self, extractor: ArchiveExtractor) -> Self {
        self.archive = extractor;
        self
    }

    pub fn with_git_extractor(mut self, extractor: GitExtractor) -> Self {
        self.git = extractor;
        self
    }

    pub fn load_from_folder(&self, folder: &Path) -> PackResult<MappingPackage> {
        self.assembler.build(folder)
    }

    /// Unpack into a scoped directory, assemble, and drop the directory.
    pub fn load_from_archive(&self, archive: &Path) -> PackResult<MappingPackage> {
        let scoped: ScopedDir = SourceExtractor::extract_temporary(&self.archive, archive)?;
        let package = self.assembler.build(scoped.path())?;
        scoped.close()?;
        Ok(package)
    }

    /// Every package directory in the repository matching the pattern.
    pub fn load_from_git(&self, source: &GitSource) -> PackResult<Vec<MappingPackage>> {
        let _span = tracing::info_span!("extract_git", url = %source.url, pattern = %source.pattern)
            .entered();
        let scoped = SourceExtractor::extract_temporary(&self.git, source)?;
        let packages = scoped
            .roots()
            .into_iter()
            .map(|root| self.assembler.build(root))
            .collect::<PackResult<Vec<_>>>()?;
        scoped.close()?;
        Ok(packages)
    }

    pub fn load_from_repository(
        &self,
        repository: &dyn PackageRepository,
        id: &str,
    ) -> PackResult<MappingPackage> {
        if id.is_empty() {
            return Err(PackError::InvalidArgument(
                "mapping package id must be provided".into(),
            ));
        }
        Ok(repository.read(id)?)
    }

    pub fn load_packages(&self, source: &PackageSource<'_>) -> PackResult<Vec<MappingPackage>> {
        match source {
            PackageSource::Folder(path) => Ok(vec![self.load_from_folder(path)?]),
            PackageSource::Archive(path) => Ok(vec![self.load_from_archive(path)?]),
            PackageSource::Git(source) => self.load_from_git(source),
            PackageSource::Repository { repository, id } => {
                Ok(vec![self.load_from_repository(*repository, id)?])
            }
        }
    }

    pub fn validate_from_archive(
        &self,
        archive: &Path,
        pipeline: &ValidationPipeline,
    ) -> PackResult<bool> {
        let package = self.load_from_archive(archive)?;
        Ok(pipeline.validate(&package)?)
    }

    /// Write the package and pack it into `archive`. The archive is only
    /// replaced once packing has fully succeeded.
    pub fn serialize_to_archive(
        &self,
        package: &MappingPackage,
        archive: &Path,
    ) -> PackResult<PathBuf> {
        let file_name = archive.file_name().ok_or_else(|| {
            PackError::InvalidArgument(format!("{} does not name a file", archive.display()))
        })?;
        let staging = tempfile::Builder::new()
            .prefix("mssdk-serialize-")
            .tempdir()
            .map_err(|e| PackError::io(std::env::temp_dir(), e))?;
        let package_dir = staging.path().join("package");
        PackageSerializer::write(package, &package_dir)?;
        let staged_archive = staging.path().join(file_name);
        self.archive.pack(&package_dir, &staged_archive)?;

        if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PackError::io(parent, e))?;
        }
        // Rename fails across filesystems; fall back to a copy.
        if std::fs::rename(&staged_archive, archive).is_err() {
            std::fs::copy(&staged_archive, archive).map_err(|e| PackError::io(archive, e))?;
        }
        Ok(archive.to_path_buf())
    }
}

pub fn load_from_folder(folder: &Path) -> PackResult<MappingPackage> {
    PackageService::default().load_from_folder(folder)
}

pub fn load_from_archive(archive: &Path) -> PackResult<MappingPackage> {
    PackageService::default().load_from_archive(archive)
}

pub fn load_from_git(source: &GitSource) -> PackResult<Vec<MappingPackage>> {
    PackageService::default().load_from_git(source)
}

pub fn load_from_repository(
    repository: &dyn PackageRepository,
    id: &str,
) -> PackResult<MappingPackage> {
    PackageService::default().load_from_repository(repository, id)
}

pub fn load_packages(source: &PackageSource<'_>) -> PackResult<Vec<MappingPackage>> {
    PackageService::default().load_packages(source)
}

/// Validate with `pipeline`, or the standard pipeline when `None`.
pub fn validate_package(
    package: &MappingPackage,
    pipeline: Option<&ValidationPipeline>,
) -> Result<bool, PackageValidationError> {
    match pipeline {
        Some(pipeline) => pipeline.validate(package),
        None => ValidationPipeline::standard().validate(package),
    }
}

pub fn validate_from_archive(archive: &Path, pipeline: &ValidationPipeline) -> PackResult<bool> {
    PackageService::default().validate_from_archive(archive, pipeline)
}

pub fn serialize_to_archive(package: &MappingPackage, archive: &Path) -> PackResult<PathBuf> {
    PackageService::default().serialize_to_archive(package, archive)
}
