use serde::{Deserialize, Serialize};

use crate::errors::{AutofillError, AutofillResult};
use crate::models::config::GridFieldConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NumberEntry {
    pub number: String,
    /// Value typed into the number type field, e.g. "Collection Number"
    pub number_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DateEntry {
    pub verbatim: String,
    /// `yyyy/mm/dd`, month and day optional
    pub interpreted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ElevationEntry {
    pub from: String,
    pub to: String,
}

/// One taxonomic determination; absent parts are left empty in the grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Determination {
    pub genus: Option<String>,
    pub species: Option<String>,
    pub subspecies: Option<String>,
    pub infraspecific: Option<String>,
    pub infrarank: Option<String>,
    pub author: Option<String>,
    pub determiner: Option<String>,
    pub date: Option<String>,
    pub verbatim: Option<String>,
}

impl Determination {
    /// Provided parts by grid column, the same order as
    /// [`GridFieldConfig::column`] documents
    fn parts(&self) -> [(&'static str, &Option<String>); 9] {
        [
            ("genus", &self.genus),
            ("species", &self.species),
            ("subspecies", &self.subspecies),
            ("infraspecific", &self.infraspecific),
            ("infrarank", &self.infrarank),
            ("author", &self.author),
            ("determiner", &self.determiner),
            ("date", &self.date),
            ("verbatim", &self.verbatim),
        ]
    }

    /// Provided parts paired with the configured grid key they are pasted
    /// into, in column order. A provided part without a configured column
    /// is a configuration error.
    pub fn fields<'a>(
        &'a self,
        grid_fields: &'a [GridFieldConfig],
    ) -> AutofillResult<Vec<(&'a str, &'a str)>> {
        let mut fields = Vec::new();
        for (column, (part, value)) in self.parts().into_iter().enumerate() {
            let Some(value) = value.as_deref() else {
                continue;
            };
            let field = grid_fields
                .iter()
                .find(|f| f.column as usize == column)
                .ok_or_else(|| {
                    AutofillError::Config(format!(
                        "No determination grid field configured for {} (column {})",
                        part, column
                    ))
                })?;
            fields.push((field.name.as_str(), value));
        }
        Ok(fields)
    }
}

/// Everything to enter for one specimen record. Fields left out are skipped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct FormEntry {
    pub collection: Option<String>,
    pub collector: Option<String>,
    pub number: Option<NumberEntry>,
    pub date: Option<DateEntry>,
    pub taxon: Option<String>,
    pub elevation: Option<ElevationEntry>,
    pub notes: Option<String>,
    pub sex: Option<String>,
    pub workflow_status: Option<String>,
    pub determination: Option<Determination>,
    /// Press save after filling
    pub save: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::GridConfig;

    fn field(name: &str, column: u32) -> GridFieldConfig {
        GridFieldConfig {
            name: name.to_string(),
            column,
        }
    }

    #[test]
    fn test_determination_fields_skip_missing() {
        let det = Determination {
            genus: Some("Sunira".into()),
            species: Some("circellaris".into()),
            author: Some("H.".into()),
            ..Default::default()
        };
        let grid = GridConfig::default();

        assert_eq!(
            det.fields(&grid.fields).unwrap(),
            vec![
                ("det_genus", "Sunira"),
                ("det_species", "circellaris"),
                ("det_author", "H."),
            ]
        );
    }

    #[test]
    fn test_determination_fields_follow_renamed_grid() {
        let det = Determination {
            genus: Some("Sunira".into()),
            date: Some("1985".into()),
            ..Default::default()
        };
        let grid_fields = vec![field("when", 7), field("genus_cell", 0)];

        assert_eq!(
            det.fields(&grid_fields).unwrap(),
            vec![("genus_cell", "Sunira"), ("when", "1985")]
        );
    }

    #[test]
    fn test_determination_part_without_column_fails() {
        let det = Determination {
            author: Some("H.".into()),
            ..Default::default()
        };
        let grid_fields = vec![field("det_genus", 0)];

        let err = det.fields(&grid_fields).unwrap_err();
        assert!(matches!(err, AutofillError::Config(ref m) if m.contains("author")));
    }

    #[test]
    fn test_form_entry_from_partial_json() {
        let json = r#"{
            "collection": "Weber, Paul (1881-1968)",
            "number": { "number": "12093", "number_type": "Collection Number" },
            "save": true
        }"#;
        let entry: FormEntry = serde_json::from_str(json).unwrap();

        assert_eq!(entry.collection.as_deref(), Some("Weber, Paul (1881-1968)"));
        assert_eq!(entry.number.unwrap().number, "12093");
        assert!(entry.collector.is_none());
        assert!(entry.save);
    }
}
