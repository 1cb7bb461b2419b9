// src/package.rs
//
// The boundary to the document container. Reading and writing the archive
// format itself is left to other tools; a `Package` only has to list, read
// and write the XML parts and produce the final output. `DirectoryPackage`
// works on an unpacked document tree.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::RemovalConfig;
use crate::error::{Result, TidyError};
use crate::tidy::Tidier;

/// Directory (relative to the package root) holding the tidied parts.
pub const PART_DIR: &str = "word";

/// A part, addressed by its path relative to the package root.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartHandle(PathBuf);

impl PartHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PartHandle(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

pub trait Package {
    /// XML parts to tidy, in a stable order.
    fn xml_parts(&self) -> Result<Vec<PartHandle>>;

    fn read_part(&self, part: &PartHandle) -> Result<String>;

    /// Stage new content for `part`; it reaches the output on
    /// [`Package::repackage`].
    fn write_part(&mut self, part: &PartHandle, xml: String) -> Result<()>;

    fn repackage(&mut self, output: &Path) -> Result<()>;
}

/// An unpacked document: `word/document.xml`, `word/styles.xml`, ...
#[derive(Debug)]
pub struct DirectoryPackage {
    root: PathBuf,
    staged: BTreeMap<PartHandle, String>,
}

impl DirectoryPackage {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        DirectoryPackage {
            root: root.into(),
            staged: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_staged(&self, output: &Path) -> Result<()> {
        for (part, xml) in &self.staged {
            let target = output.join(part.path());
            let write = || -> io::Result<()> {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, xml)
            };
            write().map_err(|source| TidyError::PartWrite {
                part: target.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

fn is_xml_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map_or(false, |e| e.to_string_lossy().eq_ignore_ascii_case("xml"))
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    fs::create_dir_all(to)?;
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Absolute, symlink-free form of `path`, which need not exist yet: the
/// nearest existing ancestor is canonicalized and the rest re-joined.
fn normalized(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(canonical) => {
                return Ok(missing.iter().rev().fold(canonical, |acc, name| acc.join(name)));
            }
            Err(err) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = parent;
                }
                _ => return Err(err),
            },
        }
    }
}

impl Package for DirectoryPackage {
    fn xml_parts(&self) -> Result<Vec<PartHandle>> {
        let dir = self.root.join(PART_DIR);
        let list = || -> io::Result<Vec<PartHandle>> {
            let mut parts = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if is_xml_file(&path) {
                    if let Some(name) = path.file_name() {
                        parts.push(PartHandle::new(Path::new(PART_DIR).join(name)));
                    }
                }
            }
            parts.sort();
            Ok(parts)
        };
        list().map_err(|source| TidyError::PartRead {
            part: dir.clone(),
            source,
        })
    }

    fn read_part(&self, part: &PartHandle) -> Result<String> {
        let path = self.root.join(part.path());
        fs::read_to_string(&path).map_err(|source| TidyError::PartRead { part: path, source })
    }

    fn write_part(&mut self, part: &PartHandle, xml: String) -> Result<()> {
        self.staged.insert(part.clone(), xml);
        Ok(())
    }

    fn repackage(&mut self, output: &Path) -> Result<()> {
        let packaging = |source| TidyError::Packaging {
            path: output.to_path_buf(),
            source,
        };
        let root = normalized(&self.root).map_err(packaging)?;
        let target = normalized(output).map_err(packaging)?;
        if root != target {
            if target.starts_with(&root) {
                return Err(packaging(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "output lies inside the source package",
                )));
            }
            copy_tree(&self.root, output).map_err(packaging)?;
        }
        self.write_staged(output)?;
        self.staged.clear();
        Ok(())
    }
}

/// Tidy every XML part of `package` and write the result to `output`.
///
/// All parts are tidied in memory first; if any of them fails nothing is
/// written. Returns the number of parts tidied.
pub fn tidy_package<P: Package>(
    package: &mut P,
    output: &Path,
    removal: &RemovalConfig,
) -> Result<usize> {
    let tidier = Tidier::new(removal)?;

    let mut tidied = Vec::new();
    for part in package.xml_parts()? {
        let xml = package.read_part(&part)?;
        let out = tidier.tidy(&xml)?;
        debug!(
            part = %part.path().display(),
            before = xml.len(),
            after = out.len(),
            "tidied part"
        );
        tidied.push((part, out));
    }

    let count = tidied.len();
    for (part, xml) in tidied {
        package.write_part(&part, xml)?;
    }
    package.repackage(output)?;
    info!(parts = count, output = %output.display(), "document written");
    Ok(count)
}

/// Tidy an unpacked document directory, in place unless `output` is given.
pub fn tidy_document(source: &Path, output: Option<&Path>, removal: &RemovalConfig) -> Result<usize> {
    let mut package = DirectoryPackage::open(source);
    tidy_package(&mut package, output.unwrap_or(source), removal)
}

/// Tidy a single XML part file, in place unless `output` is given.
pub fn tidy_part_file(input: &Path, output: Option<&Path>, removal: &RemovalConfig) -> Result<()> {
    let xml = fs::read_to_string(input).map_err(|source| TidyError::PartRead {
        part: input.to_path_buf(),
        source,
    })?;
    let tidied = Tidier::new(removal)?.tidy(&xml)?;
    let target = output.unwrap_or(input);
    fs::write(target, tidied).map_err(|source| TidyError::PartWrite {
        part: target.to_path_buf(),
        source,
    })?;
    info!(part = %target.display(), "part written");
    Ok(())
}
