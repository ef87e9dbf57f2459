//! 除外パターン
//!
//! ビルドタグの計算とビルドコンテキストの作成は同じ除外ルールを使います。
//! `.gilliam/ignore` に1行1パターン（シェルのグロブ）で追加できます。

use crate::error::Result;
use std::path::Path;

/// ソースディレクトリ内の除外パターンファイル
pub const IGNORE_FILE: &str = ".gilliam/ignore";

/// 常に除外するバージョン管理ディレクトリ
const EXCLUDE_DIRS: &[&str] = &[
    "CVS", "RCS", "SCCS", ".git", ".svn", ".arch-ids", "{arch}", ".bzr", ".hg", "_darcs",
];

/// 常に除外するファイル
const EXCLUDE_FILES: &[&str] = &[
    ".gitignore",
    ".cvsignore",
    ".hgignore",
    ".bzrignore",
    "gilliam.yml",
    ".#*",
    "*~",
    "#*#",
];

#[derive(Debug, Clone)]
struct Rule {
    text: String,
    glob: Option<glob::Pattern>,
}

impl Rule {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            // 不正なグロブは完全一致のみで扱う
            glob: glob::Pattern::new(text).ok(),
        }
    }

    fn matches(&self, name: &str) -> bool {
        name == self.text || self.glob.as_ref().is_some_and(|g| g.matches(name))
    }
}

/// ファイル名・ディレクトリ名に対する除外ルールの集合
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    rules: Vec<Rule>,
}

impl IgnoreSet {
    /// 組み込みの除外ルールのみ
    pub fn builtin() -> Self {
        Self {
            rules: EXCLUDE_DIRS
                .iter()
                .chain(EXCLUDE_FILES)
                .map(|p| Rule::new(p))
                .collect(),
        }
    }

    /// 組み込みルールに `root/.gilliam/ignore` の内容を加える
    pub fn load(root: &Path) -> Result<Self> {
        let mut set = Self::builtin();
        let path = root.join(IGNORE_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                set.extend(content.lines());
                tracing::debug!(path = %path.display(), "Loaded ignore patterns");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(set)
    }

    /// パターンを追加（空行と `#` で始まる行は無視）
    pub fn extend<'a, I>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.rules.extend(
            patterns
                .into_iter()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(Rule::new),
        );
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_builtin_exclusions() {
        let set = IgnoreSet::builtin();
        assert!(set.is_ignored(".git"));
        assert!(set.is_ignored("{arch}"));
        assert!(set.is_ignored("gilliam.yml"));
        assert!(set.is_ignored("app.py~"));
        assert!(set.is_ignored(".#app.py"));
        assert!(set.is_ignored("#app.py#"));
        assert!(!set.is_ignored("app.py"));
        assert!(!set.is_ignored(".gilliam"));
    }

    #[test]
    fn test_ignore_file_patterns() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".gilliam")).unwrap();
        fs::write(
            dir.path().join(IGNORE_FILE),
            "# build output\n*.pyc\n\n  node_modules  \n[broken\n",
        )
        .unwrap();

        let set = IgnoreSet::load(dir.path()).unwrap();
        assert!(set.is_ignored("app.pyc"));
        assert!(set.is_ignored("node_modules"));
        assert!(set.is_ignored("[broken"));
        assert!(!set.is_ignored("# build output"));
        assert!(!set.is_ignored("app.py"));
    }

    #[test]
    fn test_missing_ignore_file() {
        let dir = tempdir().unwrap();
        let set = IgnoreSet::load(dir.path()).unwrap();
        assert!(!set.is_ignored("main.rs"));
    }
}
