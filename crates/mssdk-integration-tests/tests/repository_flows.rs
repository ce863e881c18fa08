//! # Repository Flows
//!
//! Packages persisted to a document repository and loaded back through
//! the service layer.

use serde_json::json;

use mssdk_integration_tests::PackageFixture;
use mssdk_pack::{
    load_packages, FsPackageRepository, InMemoryPackageRepository, MetadataFilter,
    PackageRepository, PackageSource, RepositoryError, ValidationPipeline,
};

#[test]
fn filesystem_repository_survives_reopen() {
    let fixture = PackageFixture::signed("package_persisted").unwrap();
    let package = fixture.load().unwrap();
    let store = fixture.scratch().join("store");

    FsPackageRepository::open(&store)
        .unwrap()
        .create(&package)
        .unwrap();

    let reopened = FsPackageRepository::open(&store).unwrap();
    let loaded = reopened.read("package_persisted").unwrap();
    assert_eq!(loaded, package);
    assert!(ValidationPipeline::standard().validate(&loaded).unwrap());
}

#[test]
fn repository_source_loads_through_service() {
    let fixture = PackageFixture::signed("package_repo").unwrap();
    let repo = InMemoryPackageRepository::new();
    repo.create(&fixture.load().unwrap()).unwrap();

    let packages = load_packages(&PackageSource::Repository {
        repository: &repo,
        id: "package_repo".into(),
    })
    .unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].identifier(), "package_repo");
}

#[test]
fn read_many_filters_on_wire_names() {
    let repo = InMemoryPackageRepository::new();
    for id in ["package_one", "package_two"] {
        let fixture = PackageFixture::signed(id).unwrap();
        let mut package = fixture.load().unwrap();
        if id == "package_two" {
            package.metadata.mapping_version = Some("2.0.0".into());
        }
        repo.create(&package).unwrap();
    }

    let mut filter = MetadataFilter::new();
    filter.insert("mapping_version".into(), json!("2.0.0"));
    let matched = repo.read_many(&filter).unwrap();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].identifier(), "package_two");

    let mut by_alias = MetadataFilter::new();
    by_alias.insert("created_at".into(), json!("2024-05-01T00:00:00"));
    assert_eq!(repo.read_many(&by_alias).unwrap().len(), 2);
}

#[test]
fn missing_model_is_reported() {
    let repo = InMemoryPackageRepository::new();
    assert!(matches!(
        repo.read("package_absent"),
        Err(RepositoryError::ModelNotFound { id }) if id == "package_absent"
    ));
}
