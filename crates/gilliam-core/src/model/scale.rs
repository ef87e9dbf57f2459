use crate::error::{CoreError, Result};
use std::collections::BTreeMap;

/// サービス名 → インスタンス数
pub type ScaleMap = BTreeMap<String, u32>;

/// `NAME=COUNT` 形式のスケール指定をパース
pub fn parse_scale<I, S>(specs: I) -> Result<ScaleMap>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scales = ScaleMap::new();
    for spec in specs {
        let spec = spec.as_ref();
        let (name, count) = spec
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidScale(spec.to_string()))?;
        let count = count
            .trim()
            .parse::<u32>()
            .map_err(|_| CoreError::InvalidScale(spec.to_string()))?;
        if name.is_empty() {
            return Err(CoreError::InvalidScale(spec.to_string()));
        }
        scales.insert(name.to_string(), count);
    }
    Ok(scales)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scale() {
        let scales = parse_scale(["web=3", "worker=0"]).unwrap();
        assert_eq!(scales["web"], 3);
        assert_eq!(scales["worker"], 0);
    }

    #[test]
    fn test_parse_scale_bad_format() {
        assert!(matches!(
            parse_scale(["web"]),
            Err(CoreError::InvalidScale(s)) if s == "web"
        ));
        assert!(parse_scale(["web=many"]).is_err());
        assert!(parse_scale(["=2"]).is_err());
    }
}
