//! Wire types for the Yparéo school-management API.
//!
//! Collections arrive as JSON objects keyed by an opaque string, not arrays.
//! Numeric identifiers are not reliably typed upstream (integers in some
//! deployments, strings in others), so codes and durations accept both.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

pub(crate) type LearnerCollection = HashMap<String, Learner>;
pub(crate) type GroupCollection = HashMap<String, Group>;
pub(crate) type AbsenceCollection = HashMap<String, Absence>;

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Learner {
    #[serde(rename = "codeApprenant", deserialize_with = "int_or_string")]
    pub(crate) code: i64,
    #[serde(rename = "nomApprenant", default)]
    pub(crate) last_name: String,
    #[serde(rename = "prenomApprenant", default)]
    pub(crate) first_name: String,
    #[serde(rename = "dateNaissance", default)]
    pub(crate) birth_date: String,
    #[serde(rename = "inscriptions", default)]
    pub(crate) enrollments: Vec<Enrollment>,
    #[serde(rename = "informationsCourantes", default)]
    pub(crate) current: Option<CurrentInfo>,
}

impl Learner {
    /// Campus name from the first enrollment, when present.
    pub(crate) fn site_name(&self) -> Option<&str> {
        self.enrollments
            .first()
            .and_then(|enrollment| enrollment.site.as_ref())
            .map(|site| site.name.as_str())
    }

    pub(crate) fn group_code(&self) -> Option<i64> {
        self.current.as_ref().and_then(|current| current.group_code)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Enrollment {
    #[serde(default)]
    pub(crate) site: Option<Site>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Site {
    #[serde(rename = "nomSite", default)]
    pub(crate) name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CurrentInfo {
    #[serde(rename = "codeGroupe", default, deserialize_with = "opt_int_or_string")]
    pub(crate) group_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Group {
    #[serde(rename = "codeGroupe", deserialize_with = "int_or_string")]
    pub(crate) code: i64,
    #[serde(rename = "nomGroupe", default)]
    pub(crate) name: String,
    #[serde(rename = "etenduGroupe", default)]
    pub(crate) extent: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Absence {
    #[serde(rename = "codeApprenant", deserialize_with = "int_or_string")]
    pub(crate) learner_code: i64,
    #[serde(rename = "duree", default, deserialize_with = "opt_minutes")]
    pub(crate) minutes: Option<i64>,
    #[serde(rename = "isJustifie", default)]
    pub(crate) justified: bool,
    #[serde(rename = "isRetard", default)]
    pub(crate) late: bool,
}

/// Payload for importing a learner document.
#[derive(Debug, Serialize)]
pub(crate) struct DocumentImport {
    #[serde(rename = "contenu")]
    pub(crate) content: String,
    #[serde(rename = "nomDocument")]
    pub(crate) document_name: String,
    #[serde(rename = "typeMime")]
    pub(crate) mime_type: String,
    pub(crate) extension: String,
}

fn int_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(value) => Ok(value),
        Raw::Float(value) => Ok(value as i64),
        Raw::Text(value) => value
            .trim()
            .parse::<f64>()
            .map(|value| value as i64)
            .map_err(serde::de::Error::custom),
    }
}

fn opt_int_or_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(value)) => Ok(Some(value)),
        Some(Raw::Float(value)) => Ok(Some(value as i64)),
        Some(Raw::Text(value)) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(|value| Some(value as i64))
                .map_err(serde::de::Error::custom)
        }
    }
}

fn opt_minutes<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Int(value)) => Ok(Some(value)),
        Some(Raw::Float(value)) => Ok(Some(value as i64)),
        // Durations sometimes come back as "1h30" style text instead of raw minutes.
        Some(Raw::Text(value)) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            match crate::core::duration::parse_duration_to_minutes(trimmed) {
                Some(minutes) => Ok(Some(minutes)),
                None => Err(serde::de::Error::custom(format!(
                    "invalid duration value: {trimmed}"
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learner_collection_is_keyed_by_opaque_strings() {
        let raw = r#"{
            "4016": {
                "codeApprenant": 4016,
                "nomApprenant": "DURAND",
                "prenomApprenant": "Alice",
                "dateNaissance": "01/02/1999",
                "inscriptions": [{"site": {"nomSite": "Paris"}}],
                "informationsCourantes": {"codeGroupe": "161"}
            }
        }"#;
        let learners: LearnerCollection = serde_json::from_str(raw).unwrap();
        let learner = &learners["4016"];
        assert_eq!(learner.code, 4016);
        assert_eq!(learner.site_name(), Some("Paris"));
        assert_eq!(learner.group_code(), Some(161));
    }

    #[test]
    fn codes_accept_integers_and_strings() {
        let as_int: Group =
            serde_json::from_str(r#"{"codeGroupe": 161, "nomGroupe": "M1 MAPI"}"#).unwrap();
        let as_text: Group =
            serde_json::from_str(r#"{"codeGroupe": "161", "nomGroupe": "M1 MAPI"}"#).unwrap();
        assert_eq!(as_int.code, as_text.code);
        assert_eq!(as_int.extent, "");
    }

    #[test]
    fn absence_flags_default_to_false() {
        let absence: Absence =
            serde_json::from_str(r#"{"codeApprenant": 4016, "duree": "120"}"#).unwrap();
        assert_eq!(absence.minutes, Some(120));
        assert!(!absence.justified);
        assert!(!absence.late);
    }

    #[test]
    fn absence_duration_accepts_hour_minute_text() {
        let absence: Absence =
            serde_json::from_str(r#"{"codeApprenant": 4016, "duree": "1h30"}"#).unwrap();
        assert_eq!(absence.minutes, Some(90));
    }

    #[test]
    fn document_import_serializes_with_upstream_field_names() {
        let payload = DocumentImport {
            content: "QUJD".to_string(),
            document_name: "bulletin.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            extension: "pdf".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["contenu"], "QUJD");
        assert_eq!(json["nomDocument"], "bulletin.pdf");
        assert_eq!(json["typeMime"], "application/pdf");
        assert_eq!(json["extension"], "pdf");
    }
}
