//! ポート指定
//!
//! `"8080"`（プライベートのみ）、`"80:8080"`（パブリック:プライベート）、
//! `":8080"`（パブリック = プライベート）の3形式を扱います。

use crate::error::{CoreError, Result};
use std::fmt;
use std::str::FromStr;

/// ポートマッピング
///
/// 同一性はプライベートポートで判定する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortSpec {
    pub public: Option<u16>,
    pub private: u16,
}

impl FromStr for PortSpec {
    type Err = CoreError;

    fn from_str(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        let parse = |s: &str| {
            s.parse::<u16>()
                .map_err(|_| CoreError::InvalidPortSpec(spec.to_string()))
        };

        match spec.split_once(':') {
            None => Ok(PortSpec {
                public: None,
                private: parse(spec)?,
            }),
            Some((public, private)) => {
                let private = parse(private)?;
                let public = if public.is_empty() {
                    private
                } else {
                    parse(public)?
                };
                Ok(PortSpec {
                    public: Some(public),
                    private,
                })
            }
        }
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.public {
            Some(public) => write!(f, "{}:{}", public, self.private),
            None => write!(f, "{}", self.private),
        }
    }
}

/// ベースのポート一覧にオーバーライドをマージ
///
/// プライベートポートが一致するエントリはオーバーライド側で置き換え、
/// どちらか一方にしかないエントリはそのまま残す。
/// 結果の並び順は保証しない。
pub fn merge_port_specs<B, O>(base: &[B], overrides: &[O]) -> Result<Vec<String>>
where
    B: AsRef<str>,
    O: AsRef<str>,
{
    let mut merged: Vec<PortSpec> = Vec::with_capacity(base.len() + overrides.len());

    let specs = base
        .iter()
        .map(AsRef::as_ref)
        .chain(overrides.iter().map(AsRef::as_ref));
    for spec in specs {
        let spec: PortSpec = spec.parse()?;
        match merged.iter_mut().find(|p| p.private == spec.private) {
            Some(existing) => *existing = spec,
            None => merged.push(spec),
        }
    }

    Ok(merged.iter().map(PortSpec::to_string).collect())
}
