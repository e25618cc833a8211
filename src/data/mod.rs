//! Reference dataset records as exported to JSON.
//!
//! Both datasets come out of spreadsheets, so numeric columns may hold
//! numbers, numeric strings or junk. Fields that do not parse become `None`
//! and the row is dropped when it is converted.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::models::{DataError, InkReferenceRow, LabColor, PmsEntry};

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let s = match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => return Ok(None),
    };
    let s = s.trim();
    Ok((!s.is_empty()).then(|| s.to_string()))
}

/// One row of the concentration ladder export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InkRecord {
    #[serde(rename = "Ink", default, deserialize_with = "lenient_string")]
    pub ink: Option<String>,
    #[serde(rename = "Name", default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "Conc %", default, deserialize_with = "lenient_f64")]
    pub concentration: Option<f64>,
    #[serde(rename = "L*", default, deserialize_with = "lenient_f64")]
    pub l: Option<f64>,
    #[serde(rename = "a*", default, deserialize_with = "lenient_f64")]
    pub a: Option<f64>,
    #[serde(rename = "b*", default, deserialize_with = "lenient_f64")]
    pub b: Option<f64>,
}

impl InkRecord {
    /// Convert to a typed row, `None` when any required field is missing
    pub fn to_row(&self) -> Option<InkReferenceRow> {
        Some(InkReferenceRow {
            code: self.ink.clone()?,
            name: self.name.clone().unwrap_or_default(),
            concentration_pct: self.concentration?,
            lab: LabColor::new(self.l?, self.a?, self.b?),
        })
    }
}

/// One row of the spot colour export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PmsRecord {
    #[serde(rename = "Pantone", default, deserialize_with = "lenient_string")]
    pub pantone: Option<String>,
    #[serde(rename = "L", default, deserialize_with = "lenient_f64")]
    pub l: Option<f64>,
    #[serde(rename = "a", default, deserialize_with = "lenient_f64")]
    pub a: Option<f64>,
    #[serde(rename = "b", default, deserialize_with = "lenient_f64")]
    pub b: Option<f64>,

    #[serde(rename = "Item Code 1", alias = "Item Code 1 ", alias = "ItemCode1")]
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_code_1: Option<String>,
    #[serde(rename = "Percentage 1", alias = "Percentage 1 ", alias = "Percent 1")]
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percentage_1: Option<f64>,
    #[serde(rename = "Item Code 2", alias = "Item Code 2 ", alias = "ItemCode2")]
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_code_2: Option<String>,
    #[serde(rename = "Percentage 2", alias = "Percentage 2 ", alias = "Percent 2")]
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percentage_2: Option<f64>,
    #[serde(rename = "Item Code 3", alias = "Item Code 3 ", alias = "ItemCode3")]
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_code_3: Option<String>,
    #[serde(rename = "Percentage 3", alias = "Percentage 3 ", alias = "Percent 3")]
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percentage_3: Option<f64>,
    #[serde(rename = "Item Code 4", alias = "Item Code 4 ", alias = "ItemCode4")]
    #[serde(default, deserialize_with = "lenient_string")]
    pub item_code_4: Option<String>,
    #[serde(rename = "Percentage 4", alias = "Percentage 4 ", alias = "Percent 4")]
    #[serde(default, deserialize_with = "lenient_f64")]
    pub percentage_4: Option<f64>,
}

impl PmsRecord {
    /// Convert to a typed entry, `None` when the code or Lab is unusable.
    /// Formula pairs missing either half are left out.
    pub fn to_entry(&self) -> Option<PmsEntry> {
        let pairs = [
            (&self.item_code_1, self.percentage_1),
            (&self.item_code_2, self.percentage_2),
            (&self.item_code_3, self.percentage_3),
            (&self.item_code_4, self.percentage_4),
        ];
        let items = pairs
            .into_iter()
            .filter_map(|(code, pct)| Some((code.clone()?, pct?)))
            .collect();

        Some(PmsEntry {
            code: self.pantone.clone()?,
            lab: LabColor::new(self.l?, self.a?, self.b?),
            items,
        })
    }
}

/// True for the blank carrier row, e.g. "White Substrate" or "WHITE  substrate"
pub fn is_white_substrate(text: &str) -> bool {
    let squashed: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    squashed.contains("whitesubstrate")
}

/// Parse a JSON array of records, skipping elements that are not objects
pub fn parse_records<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, DataError> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if records.len() < total {
        tracing::debug!(skipped = total - records.len(), "Skipped non-record dataset entries");
    }
    Ok(records)
}

pub fn load_records<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>, DataError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_records(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ink_record_accepts_numeric_strings() {
        let json = r#"[{"Ink": "DC10-101", "Name": "Warm Red", "Conc %": "50", "L*": 48.2, "a*": "61.5", "b*": 33}]"#;
        let records: Vec<InkRecord> = parse_records(json).unwrap();
        let row = records[0].to_row().unwrap();
        assert_eq!(row.code, "DC10-101");
        assert_eq!(row.concentration_pct, 50.0);
        assert_eq!(row.lab, LabColor::new(48.2, 61.5, 33.0));
    }

    #[test]
    fn ink_record_with_junk_is_dropped() {
        let json = r#"[
            {"Ink": "DC10-101", "Name": "Warm Red", "Conc %": "n/a", "L*": 48.2, "a*": 61.5, "b*": 33},
            {"Ink": "", "Name": "Blank", "Conc %": 10, "L*": 48.2, "a*": 61.5, "b*": 33},
            {"Ink": "DC10-102", "Name": "Blue", "Conc %": 10, "L*": null, "a*": 1, "b*": -40},
            42
        ]"#;
        let records: Vec<InkRecord> = parse_records(json).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.to_row().is_none()));
    }

    #[test]
    fn pms_record_collects_complete_pairs_and_aliases() {
        let json = r#"[{
            "Pantone": "186 C", "L": 42.1, "a": 64.2, "b": 31.0,
            "Item Code 1 ": "DC10-101", "Percentage 1 ": "60.5",
            "ItemCode2": "DC21-002", "Percent 2": 39.5,
            "Item Code 3": "DC30-300", "Percentage 3": ""
        }]"#;
        let records: Vec<PmsRecord> = parse_records(json).unwrap();
        let entry = records[0].to_entry().unwrap();
        assert_eq!(entry.code, "186 C");
        assert_eq!(
            entry.items,
            vec![
                ("DC10-101".to_string(), 60.5),
                ("DC21-002".to_string(), 39.5)
            ]
        );
    }

    #[test]
    fn substrate_detection_ignores_case_and_spacing() {
        assert!(is_white_substrate("White Substrate"));
        assert!(is_white_substrate("WHITE   SUBSTRATE (paper)"));
        assert!(!is_white_substrate("Opaque White"));
    }

    #[test]
    fn non_array_dataset_is_an_error() {
        assert!(matches!(
            parse_records::<InkRecord>(r#"{"Ink": "x"}"#),
            Err(DataError::Json(_))
        ));
    }
}
