//! In-memory catalogs built from the PypyDance and WannaDance JSON dumps.
//!
//! PypyDance: `{"songs": [{"i": 2330, "n": "Title - Artist", ...}]}`
//! WannaDance: `{"groups": {"contents": [{"songInfos": [{"id", "name", "artist"}]}]}}`
//!
//! Missing containers mean an empty catalog. A record without an integer ID
//! is a hard error naming the record.

use anyhow::{bail, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::models::{CatalogKind, CatalogLayout, SongId, SongRecord};
use crate::normalize::TextOptions;

/// Raw record as read from a catalog, before normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawSong {
    pub id: SongId,
    pub name: String,
    pub artist: Option<String>,
}

/// One catalog: its songs in file order plus an ID index.
#[derive(Clone, Debug)]
pub struct Catalog {
    kind: CatalogKind,
    songs: Vec<SongRecord>,
    index: FxHashMap<SongId, usize>,
    duplicates: usize,
}

impl Catalog {
    /// Build a catalog from raw records. Later records reusing an ID are dropped.
    pub fn from_raw(kind: CatalogKind, raw: Vec<RawSong>, opts: TextOptions) -> Self {
        let mut index = FxHashMap::default();
        let mut unique = Vec::with_capacity(raw.len());
        let mut duplicates = 0;

        for song in raw {
            if index.contains_key(&song.id) {
                duplicates += 1;
                continue;
            }
            index.insert(song.id, unique.len());
            unique.push(song);
        }

        let songs: Vec<SongRecord> = unique
            .into_par_iter()
            .map(|s| SongRecord::with_options(s.id, s.name, s.artist, opts))
            .collect();

        Self {
            kind,
            songs,
            index,
            duplicates,
        }
    }

    /// Parse the catalog-specific JSON layout.
    pub fn from_json(kind: CatalogKind, data: &Value, opts: TextOptions) -> Result<Self> {
        let raw = match kind {
            CatalogKind::PypyDance => parse_pypy(data)?,
            CatalogKind::WannaDance => parse_wannadance(data)?,
        };
        Ok(Self::from_raw(kind, raw, opts))
    }

    pub fn from_json_str(kind: CatalogKind, json: &str, opts: TextOptions) -> Result<Self> {
        let data: Value = serde_json::from_str(json)?;
        Self::from_json(kind, &data, opts)
    }

    pub fn kind(&self) -> CatalogKind {
        self.kind
    }

    pub fn layout(&self) -> CatalogLayout {
        self.kind.layout()
    }

    pub fn get(&self, id: SongId) -> Option<&SongRecord> {
        self.index.get(&id).map(|&i| &self.songs[i])
    }

    pub fn songs(&self) -> &[SongRecord] {
        &self.songs
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Number of records skipped because their ID was already present.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

// ============================================================================
// Schema Parsing
// ============================================================================

/// Optional array under `key`: absent or null is empty, anything else but an
/// array is malformed.
fn array_field<'a>(obj: &'a Value, key: &str, context: &str) -> Result<&'a [Value]> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => bail!(
            "{}: expected '{}' to be an array, found {}",
            context,
            key,
            json_type(other)
        ),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn string_field(record: &Value, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

fn require_object(data: &Value, catalog: CatalogKind) -> Result<()> {
    if !data.is_object() {
        bail!("{} catalog: expected a JSON object at top level, found {}", catalog, json_type(data));
    }
    Ok(())
}

fn require_id(record: &Value, key: &str, name: &str, position: &str, catalog: CatalogKind) -> Result<SongId> {
    match record.get(key).and_then(Value::as_i64) {
        Some(id) => Ok(id),
        None => bail!(
            "{} catalog: song {} ({:?}) has no integer '{}' field",
            catalog,
            position,
            name,
            key
        ),
    }
}

/// PypyDance bundle: `songs[].i` is the ID, `songs[].n` the combined name.
pub fn parse_pypy(data: &Value) -> Result<Vec<RawSong>> {
    require_object(data, CatalogKind::PypyDance)?;
    let songs = array_field(data, "songs", "PypyDance catalog")?;

    songs
        .iter()
        .enumerate()
        .map(|(pos, record)| -> Result<RawSong> {
            let name = string_field(record, "n").unwrap_or_default();
            let id = require_id(record, "i", &name, &format!("#{}", pos), CatalogKind::PypyDance)?;
            Ok(RawSong {
                id,
                name,
                artist: None,
            })
        })
        .collect()
}

/// WannaDance song list: `groups.contents[].songInfos[]` with `id`, `name`, `artist`.
pub fn parse_wannadance(data: &Value) -> Result<Vec<RawSong>> {
    require_object(data, CatalogKind::WannaDance)?;
    let groups = match data.get("groups") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(groups @ Value::Object(_)) => groups,
        Some(other) => bail!(
            "WannaDance catalog: expected 'groups' to be an object, found {}",
            json_type(other)
        ),
    };

    let mut raw = Vec::new();
    for (g, group) in array_field(groups, "contents", "WannaDance catalog")?.iter().enumerate() {
        let context = format!("WannaDance catalog group #{}", g);
        for (s, record) in array_field(group, "songInfos", &context)?.iter().enumerate() {
            let name = string_field(record, "name").unwrap_or_default();
            let position = format!("#{} in group #{}", s, g);
            let id = require_id(record, "id", &name, &position, CatalogKind::WannaDance)?;
            raw.push(RawSong {
                id,
                name,
                artist: string_field(record, "artist"),
            });
        }
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pypy() {
        let data = json!({
            "songs": [
                {"i": 2330, "n": "Despacito - Luis Fonsi", "g": 3},
                {"i": 3429, "n": null},
                {"i": 3605}
            ]
        });
        let raw = parse_pypy(&data).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0].id, 2330);
        assert_eq!(raw[0].name, "Despacito - Luis Fonsi");
        assert_eq!(raw[0].artist, None);
        assert_eq!(raw[1].name, "");
        assert_eq!(raw[2].name, "");
    }

    #[test]
    fn test_parse_pypy_missing_songs_is_empty() {
        assert!(parse_pypy(&json!({"updatedAt": 1})).unwrap().is_empty());
    }

    #[test]
    fn test_parse_pypy_missing_id_names_record() {
        let data = json!({"songs": [{"i": 1, "n": "Ok"}, {"n": "Broken Song"}]});
        let err = parse_pypy(&data).unwrap_err().to_string();
        assert!(err.contains("#1"), "{}", err);
        assert!(err.contains("Broken Song"), "{}", err);
        assert!(err.contains("'i'"), "{}", err);
    }

    #[test]
    fn test_parse_pypy_rejects_non_integer_id() {
        let data = json!({"songs": [{"i": "12", "n": "Stringly"}]});
        assert!(parse_pypy(&data).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_shapes() {
        assert!(parse_pypy(&json!([1, 2, 3])).is_err());
        assert!(parse_pypy(&json!({"songs": {"i": 1}})).is_err());
        assert!(parse_wannadance(&json!({"groups": []})).is_err());
    }

    #[test]
    fn test_parse_wannadance() {
        let data = json!({
            "groups": {
                "contents": [
                    {"groupName": "All", "songInfos": [
                        {"id": 100, "name": "Despacito", "artist": "Luis Fonsi"},
                        {"id": 101, "name": "Gokuraku Jodo", "artist": null}
                    ]},
                    {"groupName": "Empty"},
                    {"groupName": "New", "songInfos": [
                        {"id": 100, "name": "Despacito", "artist": "Luis Fonsi"}
                    ]}
                ]
            }
        });
        let raw = parse_wannadance(&data).unwrap();
        assert_eq!(raw.len(), 3);
        assert_eq!(raw[0].artist.as_deref(), Some("Luis Fonsi"));
        assert_eq!(raw[1].artist, None);
    }

    #[test]
    fn test_parse_wannadance_missing_id_names_record() {
        let data = json!({"groups": {"contents": [
            {"songInfos": [{"id": 1, "name": "A"}]},
            {"songInfos": [{"name": "No Id Here", "artist": "X"}]}
        ]}});
        let err = parse_wannadance(&data).unwrap_err().to_string();
        assert!(err.contains("No Id Here"), "{}", err);
        assert!(err.contains("group #1"), "{}", err);
    }

    #[test]
    fn test_parse_wannadance_missing_groups_is_empty() {
        assert!(parse_wannadance(&json!({})).unwrap().is_empty());
        assert!(parse_wannadance(&json!({"groups": {}})).unwrap().is_empty());
    }

    #[test]
    fn test_catalog_dedupes_and_indexes() {
        let raw = vec![
            RawSong { id: 5, name: "First".into(), artist: None },
            RawSong { id: 6, name: "Second".into(), artist: Some("Band".into()) },
            RawSong { id: 5, name: "First Again".into(), artist: None },
        ];
        let catalog = Catalog::from_raw(CatalogKind::WannaDance, raw, TextOptions::default());
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.duplicates(), 1);
        assert_eq!(catalog.get(5).unwrap().raw_name, "First");
        assert_eq!(catalog.get(6).unwrap().artist_norm, "band");
        assert!(catalog.get(7).is_none());
        assert_eq!(catalog.layout(), CatalogLayout::Structured);
    }

    #[test]
    fn test_catalog_preserves_file_order() {
        let json = r#"{"songs": [{"i": 9, "n": "c"}, {"i": 1, "n": "a"}, {"i": 5, "n": "b"}]}"#;
        let catalog = Catalog::from_json_str(CatalogKind::PypyDance, json, TextOptions::default()).unwrap();
        let ids: Vec<i64> = catalog.songs().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![9, 1, 5]);
    }
}
