use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The two setlist documents every user owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetlistKind {
    Praise,
    Worship,
}

impl SetlistKind {
    pub const ALL: [SetlistKind; 2] = [SetlistKind::Praise, SetlistKind::Worship];

    pub fn as_str(&self) -> &'static str {
        match self {
            SetlistKind::Praise => "praise",
            SetlistKind::Worship => "worship",
        }
    }

    /// Absent or unrecognised kinds fall back to praise instead of failing.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("worship") => SetlistKind::Worship,
            _ => SetlistKind::Praise,
        }
    }
}

impl Default for SetlistKind {
    fn default() -> Self {
        SetlistKind::Praise
    }
}

impl std::fmt::Display for SetlistKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a favorites or setlist document: ordered song references plus the
/// display name cached at save time.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct SongList {
    pub songs: Vec<String>,
    pub name: Option<String>,
}

impl SongList {
    pub fn new(songs: Vec<String>, name: Option<String>) -> Self {
        Self { songs, name }
    }
}
