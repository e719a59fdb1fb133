//! News categories, their aliases and display colours

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::extract::Importance;

/// Fixed set of news categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Technology,
    Business,
    Politics,
    Sports,
    Entertainment,
    Health,
    Science,
    World,
    General,
}

/// Lowercase aliases, checked in order for partial matches
static ALIASES: &[(&str, Category)] = &[
    ("tech", Category::Technology),
    ("technology", Category::Technology),
    ("ai", Category::Technology),
    ("artificial", Category::Technology),
    ("software", Category::Technology),
    ("hardware", Category::Technology),
    ("digital", Category::Technology),
    ("startup", Category::Technology),
    ("startups", Category::Technology),
    ("internet", Category::Technology),
    ("cyber", Category::Technology),
    ("business", Category::Business),
    ("finance", Category::Business),
    ("financial", Category::Business),
    ("economy", Category::Business),
    ("economic", Category::Business),
    ("market", Category::Business),
    ("markets", Category::Business),
    ("money", Category::Business),
    ("corporate", Category::Business),
    ("company", Category::Business),
    ("earnings", Category::Business),
    ("politics", Category::Politics),
    ("political", Category::Politics),
    ("government", Category::Politics),
    ("election", Category::Politics),
    ("elections", Category::Politics),
    ("policy", Category::Politics),
    ("congress", Category::Politics),
    ("senate", Category::Politics),
    ("president", Category::Politics),
    ("sports", Category::Sports),
    ("sport", Category::Sports),
    ("football", Category::Sports),
    ("basketball", Category::Sports),
    ("baseball", Category::Sports),
    ("soccer", Category::Sports),
    ("tennis", Category::Sports),
    ("golf", Category::Sports),
    ("olympics", Category::Sports),
    ("entertainment", Category::Entertainment),
    ("celebrity", Category::Entertainment),
    ("celebrities", Category::Entertainment),
    ("movie", Category::Entertainment),
    ("movies", Category::Entertainment),
    ("music", Category::Entertainment),
    ("tv", Category::Entertainment),
    ("television", Category::Entertainment),
    ("gaming", Category::Entertainment),
    ("games", Category::Entertainment),
    ("health", Category::Health),
    ("healthcare", Category::Health),
    ("medical", Category::Health),
    ("medicine", Category::Health),
    ("wellness", Category::Health),
    ("fitness", Category::Health),
    ("science", Category::Science),
    ("scientific", Category::Science),
    ("research", Category::Science),
    ("study", Category::Science),
    ("space", Category::Science),
    ("environment", Category::Science),
    ("climate", Category::Science),
    ("world", Category::World),
    ("international", Category::World),
    ("global", Category::World),
    ("foreign", Category::World),
    ("conflict", Category::World),
    ("war", Category::World),
    ("news", Category::General),
    ("general", Category::General),
    ("other", Category::General),
    ("misc", Category::General),
    ("miscellaneous", Category::General),
];

/// Accent colour per category: hex and RGB components
static COLORS: &[(Category, &str, (u8, u8, u8))] = &[
    (Category::Politics, "#ef4444", (239, 68, 68)),
    (Category::Technology, "#3b82f6", (59, 130, 246)),
    (Category::Sports, "#22c55e", (34, 197, 94)),
    (Category::Business, "#f59e0b", (245, 158, 11)),
    (Category::Entertainment, "#a855f7", (168, 85, 247)),
    (Category::Health, "#10b981", (16, 185, 129)),
    (Category::Science, "#06b6d4", (6, 182, 212)),
    (Category::World, "#ec4899", (236, 72, 153)),
    (Category::General, "#64748b", (100, 116, 139)),
];

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 9] = [
        Category::Technology,
        Category::Business,
        Category::Politics,
        Category::Sports,
        Category::Entertainment,
        Category::Health,
        Category::Science,
        Category::World,
        Category::General,
    ];

    /// Map a free-form label onto a category
    ///
    /// Exact alias matches win; otherwise the first alias that contains or is
    /// contained in the label. Anything else is `General`.
    pub fn normalize(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.is_empty() {
            return Self::General;
        }

        if let Some((_, category)) = ALIASES.iter().find(|(alias, _)| *alias == label) {
            return *category;
        }

        ALIASES
            .iter()
            .find(|(alias, _)| label.contains(alias) || alias.contains(label.as_str()))
            .map(|(_, category)| *category)
            .unwrap_or(Self::General)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::Business => "Business",
            Self::Politics => "Politics",
            Self::Sports => "Sports",
            Self::Entertainment => "Entertainment",
            Self::Health => "Health",
            Self::Science => "Science",
            Self::World => "World",
            Self::General => "General",
        }
    }

    fn palette(&self) -> (&'static str, (u8, u8, u8)) {
        COLORS
            .iter()
            .find(|(category, _, _)| category == self)
            .map(|(_, hex, rgb)| (*hex, *rgb))
            .unwrap_or(("#64748b", (100, 116, 139)))
    }

    /// Accent colour as a hex string
    pub fn accent(&self) -> &'static str {
        self.palette().0
    }

    /// Glow colour as `rgba(...)`, stronger for more important items
    pub fn glow(&self, importance: Importance) -> String {
        let (r, g, b) = self.palette().1;
        let alpha = match importance {
            Importance::High => 0.8,
            Importance::Medium => 0.6,
            Importance::Low => 0.4,
        };
        format!("rgba({r}, {g}, {b}, {alpha})")
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::normalize(&label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_exact() {
        assert_eq!(Category::normalize("Tech"), Category::Technology);
        assert_eq!(Category::normalize("  ELECTIONS "), Category::Politics);
        assert_eq!(Category::normalize("war"), Category::World);
    }

    #[test]
    fn test_normalize_partial() {
        assert_eq!(Category::normalize("Sports & Recreation"), Category::Sports);
        assert_eq!(Category::normalize("Climate Change"), Category::Science);
    }

    #[test]
    fn test_normalize_default() {
        assert_eq!(Category::normalize(""), Category::General);
        assert_eq!(Category::normalize("zzz"), Category::General);
    }

    #[test]
    fn test_every_category_has_colours() {
        for category in Category::ALL {
            assert!(category.accent().starts_with('#'));
        }
        assert_eq!(Category::Politics.accent(), "#ef4444");
        assert_eq!(
            Category::Technology.glow(Importance::High),
            "rgba(59, 130, 246, 0.8)"
        );
        assert_eq!(
            Category::General.glow(Importance::Low),
            "rgba(100, 116, 139, 0.4)"
        );
    }

    #[test]
    fn test_serde_round_trip_normalizes() {
        let category: Category = serde_json::from_str("\"finance\"").unwrap();
        assert_eq!(category, Category::Business);
        assert_eq!(serde_json::to_string(&category).unwrap(), "\"Business\"");
    }
}
