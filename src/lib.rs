use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub mod client;
pub mod config;
pub mod detail;
pub mod hits;
pub mod panel;
pub mod render;
pub mod scrollbar;
pub mod snapshot;

/// Allele category a read was assigned to by the backend.
///
/// The serialized names are the ones the backend uses in `_disp?req=<category>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Reads supporting the alternate (variant) allele
    #[serde(rename = "alt")]
    Alt,
    /// Reads supporting the reference allele
    #[serde(rename = "ref")]
    Ref,
    /// Reads that could not be assigned to either allele
    #[serde(rename = "amb")]
    Amb,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 3] = [Category::Alt, Category::Ref, Category::Amb];

    /// Name used on the wire (`_disp?req=...`).
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Alt => "alt",
            Category::Ref => "ref",
            Category::Amb => "amb",
        }
    }

    /// Human-readable label for tabs and headings.
    pub fn label(self) -> &'static str {
        match self {
            Category::Alt => "Alternate allele",
            Category::Ref => "Reference allele",
            Category::Amb => "Ambiguous",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered SVG fragment for one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Sample name the fragment belongs to
    pub name: String,
    /// Complete SVG document markup
    pub svg: String,
}

/// Number of reads assigned to each allele for a single sample.
///
/// The backend builds these from a counter, so a category with no reads may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlleleCounts {
    #[serde(default)]
    pub alt: u64,
    #[serde(default, rename = "ref")]
    pub reference: u64,
    #[serde(default)]
    pub amb: u64,
}

impl AlleleCounts {
    /// Count for a single category.
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Alt => self.alt,
            Category::Ref => self.reference,
            Category::Amb => self.amb,
        }
    }
}

/// Per-sample allele counts keyed by sample name, including the backend's `Total` row.
pub type CountTable = BTreeMap<String, AlleleCounts>;

/// Name of the aggregate row in a [`CountTable`].
pub const TOTAL_ROW: &str = "Total";

/// Opaque progress token returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressToken(pub String);

impl ProgressToken {
    /// The only terminal value the backend reports.
    pub const DONE: &'static str = "done";

    pub fn is_done(&self) -> bool {
        self.0 == Self::DONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_uses_backend_wire_names() {
        let names: Vec<_> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, ["alt", "ref", "amb"]);

        let parsed: Category = serde_json::from_str("\"amb\"").unwrap();
        assert_eq!(parsed, Category::Amb);
    }

    #[test]
    fn counts_tolerate_missing_categories() {
        let table: CountTable =
            serde_json::from_str(r#"{"NA12878": {"alt": 12, "amb": 3}, "Total": {"alt": 12, "ref": 0, "amb": 3}}"#)
                .unwrap();

        assert_eq!(table["NA12878"].get(Category::Ref), 0);
        assert_eq!(table[TOTAL_ROW].get(Category::Amb), 3);
    }

    #[test]
    fn only_done_is_terminal() {
        assert!(ProgressToken("done".into()).is_done());
        assert!(!ProgressToken("pending".into()).is_done());
        assert!(!ProgressToken("Done".into()).is_done());
    }
}
