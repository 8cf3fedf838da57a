//! Shared serde helpers

use serde::{Deserialize, Deserializer};

/// Deserialize a `DependsOn` value that may be either a bare string or a
/// sequence of strings (both are legal in the declarative grammar) into a
/// normalized `Vec<String>`.
pub(crate) fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrSeq {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrSeq::deserialize(deserializer)? {
        StringOrSeq::One(s) => vec![s],
        StringOrSeq::Many(v) => v,
    })
}
