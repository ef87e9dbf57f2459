//! ビルドタグの計算
//!
//! ソースツリーの構造と内容から決まるタグです。同じ内容なら同じタグに
//! なるので、変更のないサービスは同じイメージを指し続けます。

use crate::error::Result;
use crate::tree::SourceTree;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;

const CHUNK_SIZE: usize = 4096;

const DIR_TAG: u8 = b'd';
const NAME_TAG: u8 = b'f';
const CONTENT_TAG: u8 = b'c';

/// 種別・長さ・NUL で区切って流し込む（境界のずれで衝突しないように）
fn update_field(hasher: &mut Sha256, tag: u8, value: &[u8]) {
    hasher.update([tag]);
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value);
    hasher.update([0u8]);
}

/// ツリーのタグ（SHA-256 の16進表記）
///
/// 各ディレクトリについて相対パス、続いて各ファイルの名前と内容を
/// 走査順に1つのハッシュへ流し込みます。内容の前には長さを置きます。
pub fn compute_tag(tree: &SourceTree) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];

    for dir in tree.dirs() {
        update_field(&mut hasher, DIR_TAG, dir.path.as_bytes());
        let dir_path = tree.resolve(&dir.path);
        for name in &dir.files {
            update_field(&mut hasher, NAME_TAG, name.as_bytes());
            let mut file = File::open(dir_path.join(name))?;
            let len = file.metadata()?.len();
            hasher.update([CONTENT_TAG]);
            hasher.update(len.to_le_bytes());
            loop {
                let n = file.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
        }
    }

    Ok(hex::encode(hasher.finalize()))
}
