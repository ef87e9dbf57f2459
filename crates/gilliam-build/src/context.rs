use crate::error::Result;
use crate::tree::SourceTree;
use tar::Builder;

pub struct ContextBuilder;

impl ContextBuilder {
    /// ソースツリーをtarアーカイブ（非圧縮）として作成
    ///
    /// タグ計算と同じ除外ルールを適用済みの `tree` をそのまま使います。
    pub fn create_context(tree: &SourceTree) -> Result<Vec<u8>> {
        tracing::debug!("Creating build context from: {}", tree.root().display());

        let mut tar = Builder::new(Vec::new());
        tar.follow_symlinks(true);

        for dir in tree.dirs() {
            if dir.path != "." {
                tar.append_dir(&dir.path, tree.resolve(&dir.path))?;
            }
        }
        for file in tree.files() {
            tar.append_path_with_name(tree.resolve(&file), &file)?;
        }

        let archive_data = tar.into_inner()?;
        tracing::debug!("Build context created: {} bytes", archive_data.len());

        Self::check_context_size(archive_data.len());
        Ok(archive_data)
    }

    /// コンテキストサイズのチェックと警告
    fn check_context_size(size: usize) {
        const MAX_CONTEXT_SIZE: usize = 500 * 1024 * 1024; // 500MB

        if size > MAX_CONTEXT_SIZE {
            tracing::warn!(
                "build context is large ({}MB); consider excluding files in .gilliam/ignore",
                size / 1024 / 1024
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_create_context() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("app.py"), "content1").unwrap();
        fs::write(temp_dir.path().join("app.py~"), "backup").unwrap();
        let subdir = temp_dir.path().join("subdir");
        fs::create_dir(&subdir).unwrap();
        fs::write(subdir.join("file3.txt"), "content3").unwrap();
        fs::create_dir(temp_dir.path().join(".hg")).unwrap();
        fs::write(temp_dir.path().join(".hg/store"), "x").unwrap();

        let tree = SourceTree::scan(temp_dir.path()).unwrap();
        let archive = ContextBuilder::create_context(&tree).unwrap();

        let extract_dir = tempdir().unwrap();
        let mut tar = tar::Archive::new(std::io::Cursor::new(archive));
        tar.unpack(extract_dir.path()).unwrap();

        assert_eq!(
            fs::read_to_string(extract_dir.path().join("subdir/file3.txt")).unwrap(),
            "content3"
        );
        assert!(extract_dir.path().join("app.py").exists());
        assert!(!extract_dir.path().join("app.py~").exists());
        assert!(!extract_dir.path().join(".hg").exists());
    }

    #[test]
    fn test_create_context_empty_dir() {
        let temp_dir = tempdir().unwrap();
        let tree = SourceTree::scan(temp_dir.path()).unwrap();
        let archive = ContextBuilder::create_context(&tree).unwrap();
        assert!(!archive.is_empty());
    }
}
