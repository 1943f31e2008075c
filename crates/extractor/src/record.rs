use serde::de::{Deserialize, Deserializer, IgnoredAny, MapAccess, Visitor};
use std::fmt;

/// One element of the `in_network_files` array.
///
/// Both fields are optional in real indexes; a missing or `null` field decodes to an
/// empty string and unknown fields are ignored. When a key repeats, the last non-null
/// value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InNetworkFile {
    pub description: String,
    pub location: String,
}

impl<'de> Deserialize<'de> for InNetworkFile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(InNetworkFileVisitor)
    }
}

struct InNetworkFileVisitor;

impl<'de> Visitor<'de> for InNetworkFileVisitor {
    type Value = InNetworkFile;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an in_network_files object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut file = InNetworkFile::default();
        while let Some(key) = map.next_key::<String>()? {
            let slot = match key.as_str() {
                "description" => &mut file.description,
                "location" => &mut file.location,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                    continue;
                }
            };
            if let Some(value) = map.next_value::<Option<String>>()? {
                *slot = value;
            }
        }
        Ok(file)
    }
}
