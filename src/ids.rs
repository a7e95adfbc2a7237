//! ID list input and output in each catalog's export format.
//!
//! PypyDance lists are plain `2330,3429,3605`. WannaDance favorites are
//! exported as `WannaFavorite:3302,2929,4950`.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::models::{CatalogKind, RequestedId, SongId};

/// Prefix of a WannaDance favorites export.
pub const WANNA_FAVORITE_PREFIX: &str = "WannaFavorite:";

/// Arguments with these extensions are read as files holding the ID list.
pub fn is_list_file(arg: &str) -> bool {
    arg.ends_with(".txt") || arg.ends_with(".json")
}

/// Resolve the CLI input argument to the raw ID list text.
pub fn read_input(arg: &str) -> Result<String> {
    if is_list_file(arg) {
        let contents =
            fs::read_to_string(arg).with_context(|| format!("Failed to read input file {}", arg))?;
        Ok(contents.trim().to_string())
    } else {
        Ok(arg.trim().to_string())
    }
}

/// Parse a comma-separated list of IDs exported from `kind`.
///
/// Blank entries are ignored. Entries that are not plain decimal integers
/// are kept as `RequestedId::Invalid` so they show up in the report.
pub fn parse_ids(input: &str, kind: CatalogKind) -> Vec<RequestedId> {
    let mut body = input.trim();
    if kind == CatalogKind::WannaDance {
        body = body.strip_prefix(WANNA_FAVORITE_PREFIX).unwrap_or(body);
    }

    body.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(parse_token)
        .collect()
}

fn parse_token(token: &str) -> RequestedId {
    if !token.bytes().all(|b| b.is_ascii_digit()) {
        return RequestedId::Invalid(token.to_string());
    }
    token
        .parse::<SongId>()
        .map(RequestedId::Valid)
        .unwrap_or_else(|_| RequestedId::Invalid(token.to_string()))
}

/// Format converted IDs in `kind`'s export format.
pub fn format_ids(ids: &[SongId], kind: CatalogKind) -> String {
    let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
    match kind {
        CatalogKind::WannaDance => format!("{}{}", WANNA_FAVORITE_PREFIX, joined),
        CatalogKind::PypyDance => joined,
    }
}

/// Write the formatted list to `path`.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_plain_list() {
        assert_eq!(
            parse_ids("2330,3429, 3605", CatalogKind::PypyDance),
            vec![
                RequestedId::Valid(2330),
                RequestedId::Valid(3429),
                RequestedId::Valid(3605)
            ]
        );
    }

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        assert_eq!(
            parse_ids("5,1,5", CatalogKind::PypyDance),
            vec![RequestedId::Valid(5), RequestedId::Valid(1), RequestedId::Valid(5)]
        );
    }

    #[test]
    fn test_parse_wannadance_prefix() {
        assert_eq!(
            parse_ids("WannaFavorite:3302,2929", CatalogKind::WannaDance),
            vec![RequestedId::Valid(3302), RequestedId::Valid(2929)]
        );
        // The prefix only belongs to WannaDance exports.
        assert_eq!(
            parse_ids("WannaFavorite:3302", CatalogKind::PypyDance),
            vec![RequestedId::Invalid("WannaFavorite:3302".into())]
        );
    }

    #[test]
    fn test_parse_invalid_and_blank_tokens() {
        assert_eq!(
            parse_ids("1,,abc, -2 ,3.5,\n4\n", CatalogKind::PypyDance),
            vec![
                RequestedId::Valid(1),
                RequestedId::Invalid("abc".into()),
                RequestedId::Invalid("-2".into()),
                RequestedId::Invalid("3.5".into()),
                RequestedId::Valid(4),
            ]
        );
        assert!(parse_ids("", CatalogKind::WannaDance).is_empty());
        assert!(parse_ids("WannaFavorite:", CatalogKind::WannaDance).is_empty());
    }

    #[test]
    fn test_parse_overflow_is_invalid() {
        let huge = "99999999999999999999999";
        assert_eq!(parse_ids(huge, CatalogKind::PypyDance), vec![RequestedId::Invalid(huge.into())]);
    }

    #[test]
    fn test_format_ids() {
        assert_eq!(format_ids(&[1, 2, 3], CatalogKind::PypyDance), "1,2,3");
        assert_eq!(format_ids(&[1, 2, 3], CatalogKind::WannaDance), "WannaFavorite:1,2,3");
        assert_eq!(format_ids(&[], CatalogKind::WannaDance), "WannaFavorite:");
        assert_eq!(format_ids(&[], CatalogKind::PypyDance), "");
    }

    #[test]
    fn test_format_then_parse_wannadance_export() {
        let text = format_ids(&[3302, 2929], CatalogKind::WannaDance);
        assert_eq!(
            parse_ids(&text, CatalogKind::WannaDance),
            vec![RequestedId::Valid(3302), RequestedId::Valid(2929)]
        );
    }

    #[test]
    fn test_read_input_literal_and_file() {
        assert_eq!(read_input(" 1,2 ").unwrap(), "1,2");

        let dir = tempdir().unwrap();
        let path = dir.path().join("favorites.txt");
        fs::write(&path, "WannaFavorite:1,2\n").unwrap();
        assert_eq!(read_input(path.to_str().unwrap()).unwrap(), "WannaFavorite:1,2");

        let missing = dir.path().join("missing.json");
        assert!(read_input(missing.to_str().unwrap()).is_err());
    }
}
