//! Loads the target file and the sibling files of its package.

use std::fs;
use std::path::Path;

use crate::ast;
use crate::error::Error;
use crate::parser::parse_file;
use crate::source::SourceMap;

/// A loaded package: one position table, one tree per file, and the index of
/// the target file's tree.
#[derive(Debug)]
pub struct Package {
    pub map: SourceMap,
    pub files: Vec<ast::File>,
    pub target: usize,
}

impl Package {
    pub fn target_file(&self) -> &ast::File {
        &self.files[self.target]
    }

    pub fn target_source(&self) -> &crate::source::SourceFile {
        self.map.file(self.files[self.target].file_id)
    }
}

/// Parses the target file (fatal on failure) and as many of its package
/// siblings as parse (failures degrade to warnings).
pub fn load(path: &Path) -> Result<Package, Error> {
    let text = fs::read_to_string(path).map_err(|e| Error::input(path, e))?;

    let mut map = SourceMap::new();
    let name = path.to_string_lossy().into_owned();
    let target_id = map.add(name, text);

    let target_tree = parse_file(target_id, map.file(target_id))?;
    let package_name = target_tree.package_name.clone();

    let mut files = vec![target_tree];

    for sibling in sibling_paths(path) {
        let text = match fs::read_to_string(&sibling) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %sibling.display(), error = %err, "skipping unreadable sibling");
                continue;
            }
        };

        let id = map.add(sibling.to_string_lossy().into_owned(), text);
        match parse_file(id, map.file(id)) {
            Ok(tree) if tree.package_name == package_name => files.push(tree),
            Ok(tree) => {
                tracing::debug!(
                    path = %sibling.display(),
                    package = %tree.package_name,
                    "sibling belongs to another package"
                );
            }
            Err(err) => {
                tracing::warn!(path = %sibling.display(), error = %err, "skipping unparseable sibling");
            }
        }
    }

    Ok(Package {
        map,
        files,
        target: 0,
    })
}

/// Builds a package from in-memory sources; the first entry is the target.
///
/// Siblings that fail to parse or belong to another package are skipped with
/// a warning, matching `load`.
pub fn load_sources(sources: &[(String, String)]) -> Result<Package, Error> {
    let mut map = SourceMap::new();

    let (target_name, target_text) = sources
        .first()
        .expect("load_sources requires at least one source");
    let target_id = map.add(target_name.clone(), target_text.clone());
    let target_tree = parse_file(target_id, map.file(target_id))?;
    let package_name = target_tree.package_name.clone();

    let mut files = vec![target_tree];
    for (name, text) in &sources[1..] {
        let id = map.add(name.clone(), text.clone());
        match parse_file(id, map.file(id)) {
            Ok(tree) if tree.package_name == package_name => files.push(tree),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "skipping unparseable sibling");
            }
        }
    }

    Ok(Package {
        map,
        files,
        target: 0,
    })
}

/// Sibling `.go` files of the target, excluding tests, in name order.
fn sibling_paths(target: &Path) -> Vec<std::path::PathBuf> {
    let Some(dir) = target.parent() else {
        return Vec::new();
    };
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension().map_or(false, |ext| ext == "go")
                && !p
                    .file_name()
                    .map_or(false, |n| n.to_string_lossy().ends_with("_test.go"))
                && p.file_name() != target.file_name()
        })
        .collect();

    paths.sort();
    paths
}
