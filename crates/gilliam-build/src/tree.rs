//! ソースツリーの走査
//!
//! 除外ルールを適用しながら、上から順に辞書順でディレクトリを辿ります。
//! 除外されたディレクトリの中には入りません。

use crate::error::Result;
use crate::ignore::IgnoreSet;
use std::path::{Path, PathBuf};

/// ルートからの相対パス（ルートは `.`）と、含まれるファイル名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDir {
    pub path: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SourceTree {
    root: PathBuf,
    dirs: Vec<SourceDir>,
}

impl SourceTree {
    /// `root` を `.gilliam/ignore` と組み込みルールで走査
    pub fn scan(root: &Path) -> Result<Self> {
        let ignore = IgnoreSet::load(root)?;
        Self::scan_with(root, &ignore)
    }

    pub fn scan_with(root: &Path, ignore: &IgnoreSet) -> Result<Self> {
        let mut dirs = Vec::new();
        visit(root, ".", ignore, &mut dirs)?;
        Ok(Self {
            root: root.to_path_buf(),
            dirs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 走査順のディレクトリ
    pub fn dirs(&self) -> &[SourceDir] {
        &self.dirs
    }

    /// 含まれるファイルの相対パス（走査順）
    pub fn files(&self) -> impl Iterator<Item = String> + '_ {
        self.dirs.iter().flat_map(|dir| {
            dir.files.iter().map(move |file| relative(&dir.path, file))
        })
    }

    /// 相対パスを実際のパスに変換
    pub fn resolve(&self, relative: &str) -> PathBuf {
        if relative == "." {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

fn relative(parent: &str, name: &str) -> String {
    if parent == "." {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn visit(root: &Path, rel: &str, ignore: &IgnoreSet, out: &mut Vec<SourceDir>) -> Result<()> {
    let dir = if rel == "." { root.to_path_buf() } else { root.join(rel) };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(name) => {
                tracing::warn!(dir = %dir.display(), name = ?name, "Skipping non UTF-8 file name");
                continue;
            }
        };
        if ignore.is_ignored(&name) {
            continue;
        }
        let file_type = entry.file_type()?;
        entries.push((name, file_type));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for (name, file_type) in entries {
        if file_type.is_dir() {
            subdirs.push(name);
        } else if file_type.is_file() {
            files.push(name);
        } else if file_type.is_symlink() && dir.join(&name).is_file() {
            // ディレクトリへのシンボリックリンクは辿らない
            files.push(name);
        }
    }

    out.push(SourceDir {
        path: rel.to_string(),
        files,
    });
    for name in subdirs {
        visit(root, &relative(rel, &name), ignore, out)?;
    }
    Ok(())
}
