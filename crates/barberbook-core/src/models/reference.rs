use serde::{Deserialize, Serialize};

/// Link to another document: either its id or the embedded document when
/// the backend populates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(untagged)]
pub enum Reference {
    Id(String),
    Embedded(Embedded),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Embedded {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Reference {
    pub fn id(&self) -> &str {
        match self {
            Reference::Id(id) => id,
            Reference::Embedded(e) => &e.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Reference::Id(_) => None,
            Reference::Embedded(e) => e.name.as_deref(),
        }
    }

    /// Name when populated, otherwise the id.
    pub fn display(&self) -> &str {
        self.name().unwrap_or_else(|| self.id())
    }
}

impl From<&str> for Reference {
    fn from(id: &str) -> Self {
        Reference::Id(id.to_string())
    }
}

impl From<String> for Reference {
    fn from(id: String) -> Self {
        Reference::Id(id)
    }
}
