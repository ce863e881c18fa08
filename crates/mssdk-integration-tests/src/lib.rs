//! Shared fixtures for the cross-crate tests in `tests/`.
//!
//! [`PackageFixture`] writes a small but complete package tree:
//!
//! ```text
//! metadata.json
//! transformation/conceptual_mappings.xlsx
//! transformation/mappings/a.ttl
//! transformation/mappings/b.yaml
//! transformation/resources/c.csv
//! test_data/t1/d.xml
//! validation/sparql/s1/e.rq
//! validation/shacl/h1/f.ttl
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mssdk_core::MappingPackage;
use mssdk_pack::{PackError, PackResult, PackageAssembler, PackageHasher, PackageSerializer};

pub const SCENARIO_FILES: &[(&str, &str)] = &[
    ("transformation/conceptual_mappings.xlsx", "PK\u{3}\u{4}conceptual"),
    ("transformation/mappings/a.ttl", "@prefix rr: <http://www.w3.org/ns/r2rml#> .\n"),
    ("transformation/mappings/b.yaml", "prefixes:\n  ex: http://example.org/\nmappings: {}\n"),
    ("transformation/resources/c.csv", "code,label\nF03,Contract award\n"),
    ("test_data/t1/d.xml", "<ContractNotice><ID>1</ID></ContractNotice>\n"),
    ("validation/sparql/s1/e.rq", "ASK { ?notice a <http://data.europa.eu/a4g/ontology#Notice> }\n"),
    ("validation/shacl/h1/f.ttl", "@prefix sh: <http://www.w3.org/ns/shacl#> .\n"),
];

/// A package tree inside its own temporary directory.
pub struct PackageFixture {
    dir: tempfile::TempDir,
    root: PathBuf,
}

impl PackageFixture {
    /// The scenario tree with an unsigned `metadata.json`.
    pub fn unsigned(identifier: &str) -> io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().join(identifier);
        write_scenario(&root, identifier)?;
        Ok(Self { dir, root })
    }

    /// The scenario tree with a correct signature.
    pub fn signed(identifier: &str) -> PackResult<Self> {
        let fixture = Self::unsigned(identifier).map_err(|source| PackError::Io {
            path: PathBuf::from(identifier),
            source,
        })?;
        sign_in_place(fixture.root())?;
        Ok(fixture)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the package root, usable for sibling files.
    pub fn scratch(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> io::Result<()> {
        write_file(&self.root, relative, content)
    }

    pub fn remove(&self, relative: &str) -> io::Result<()> {
        fs::remove_file(self.root.join(relative))
    }

    pub fn load(&self) -> PackResult<MappingPackage> {
        PackageAssembler::new().build(&self.root)
    }
}

pub fn write_file(root: &Path, relative: &str, content: &str) -> io::Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Write the scenario tree under `root` with the given identifier.
pub fn write_scenario(root: &Path, identifier: &str) -> io::Result<()> {
    let metadata = format!(
        concat!(
            "{{\n",
            "  \"identifier\": \"{id}\",\n",
            "  \"title\": \"Scenario package {id}\",\n",
            "  \"created_at\": \"2024-05-01T00:00:00\",\n",
            "  \"mapping_version\": \"1.0.0\",\n",
            "  \"ontology_version\": \"4.0.0\",\n",
            "  \"metadata_constraints\": {{\"constraints\": {{\"form_number\": [\"F03\"]}}}}\n",
            "}}\n"
        ),
        id = identifier
    );
    write_file(root, "metadata.json", &metadata)?;
    for (relative, content) in SCENARIO_FILES {
        write_file(root, relative, content)?;
    }
    Ok(())
}

/// Store the computed signature in the package's `metadata.json`.
pub fn sign_in_place(root: &Path) -> PackResult<MappingPackage> {
    let package = PackageAssembler::new().build(root)?;
    let signature = PackageHasher::signature(&package)?;
    let signed = package.with_signature(signature);
    PackageSerializer::write_metadata(&signed, root)?;
    Ok(signed)
}
