use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;

use crate::error::{Error, Result};

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// Language used when a requested corpus is not bundled.
pub const FALLBACK_LANGUAGE: &str = "uzbek";

/// A bundled set of sample paragraphs for one language.
#[derive(Deserialize, Clone, Debug)]
pub struct Corpus {
    pub name: String,
    pub samples: Vec<String>,
}

impl Corpus {
    /// Load the bundled corpus for `language`, or `None` when it is not bundled.
    pub fn load(language: &str) -> Result<Option<Self>> {
        let Some(file) = LANG_DIR.get_file(format!("{language}.json")) else {
            return Ok(None);
        };
        let contents = file.contents_utf8().unwrap_or_default();
        from_str(contents)
            .map(Some)
            .map_err(|source| Error::Corpus {
                name: language.to_string(),
                source,
            })
    }

    /// Names of every bundled corpus, sorted.
    pub fn available() -> Vec<String> {
        let mut names: Vec<String> = LANG_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|f| f.path().file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
