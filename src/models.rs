// Core data structures for the race manifest

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

use crate::utils::error::ManifestError;

/// Ordered collection of races; insertion order is display order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub races: Vec<RaceRecord>,
}

/// One race's metadata and attachments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predictions: Vec<HorsePrediction>,
}

/// One displayable or downloadable item attached to a race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub label: String,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

/// Attachment kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Pdf,
    Image,
    Link,
}

impl AttachmentKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Link => "link",
        }
    }
}

/// Predicted win probability for one horse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorsePrediction {
    #[serde(deserialize_with = "string_or_number")]
    pub horse_id: String,
    pub horse_name: String,
    #[serde(
        default,
        deserialize_with = "optional_number_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub draw: Option<u32>,
    pub win_prob: f64,
}

/// Shape of a candidate document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestFormat {
    /// `{ "races": [RaceRecord, ...] }`
    #[default]
    Races,
    /// `{ "<race id>": [horse, ...], ... }` as written by the prediction exporter
    LegacyPredictions,
}

impl ManifestFormat {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Races => "races",
            Self::LegacyPredictions => "legacy-predictions",
        }
    }
}

impl std::str::FromStr for ManifestFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "races" => Ok(Self::Races),
            "legacy-predictions" | "legacy" => Ok(Self::LegacyPredictions),
            other => Err(format!("unknown manifest format: {other}")),
        }
    }
}

#[derive(Deserialize)]
struct RacesDocument {
    races: Vec<RaceRecord>,
}

#[derive(Deserialize)]
struct LegacyHorse {
    #[serde(deserialize_with = "string_or_number")]
    horse_id: String,
    horse_name: String,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    draw: Option<u32>,
    win_prob: f64,
    #[serde(default)]
    links: Option<LegacyLinks>,
}

#[derive(Deserialize)]
struct LegacyLinks {
    #[serde(default)]
    race: Option<String>,
}

impl Manifest {
    /// Manifest with no races
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a manifest from records, enforcing unique identifiers
    ///
    /// Any string is a valid identifier, including the empty one.
    pub fn from_races(races: Vec<RaceRecord>) -> Result<Self, ManifestError> {
        let mut seen = HashSet::with_capacity(races.len());
        for race in &races {
            if !seen.insert(race.id.as_str()) {
                return Err(ManifestError::DuplicateId(race.id.clone()));
            }
        }
        Ok(Self { races })
    }

    /// Parse and validate a candidate body
    ///
    /// A body that does not match `format` is rejected wholesale; no partial
    /// salvage is attempted.
    pub fn from_json_str(body: &str, format: ManifestFormat) -> Result<Self, ManifestError> {
        match format {
            ManifestFormat::Races => {
                let doc: RacesDocument = serde_json::from_str(body)?;
                Self::from_races(doc.races)
            }
            ManifestFormat::LegacyPredictions => Self::from_legacy_str(body),
        }
    }

    fn from_legacy_str(body: &str) -> Result<Self, ManifestError> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        let serde_json::Value::Object(map) = value else {
            return Err(ManifestError::InvalidShape(
                "legacy predictions must be a JSON object".to_string(),
            ));
        };

        let mut races = Vec::with_capacity(map.len());
        for (race_id, horses) in map {
            let horses: Vec<LegacyHorse> = serde_json::from_value(horses).map_err(|e| {
                ManifestError::InvalidShape(format!("race {race_id}: {e}"))
            })?;

            // The first horse carries the race detail link
            let attachments = horses
                .first()
                .and_then(|h| h.links.as_ref())
                .and_then(|l| l.race.clone())
                .map(|src| {
                    vec![Attachment {
                        kind: AttachmentKind::Link,
                        label: "レース詳細（netkeiba）".to_string(),
                        src,
                        filename: None,
                    }]
                })
                .unwrap_or_default();

            let predictions = horses
                .into_iter()
                .map(|h| HorsePrediction {
                    horse_id: h.horse_id,
                    horse_name: h.horse_name,
                    draw: h.draw,
                    win_prob: h.win_prob,
                })
                .collect();

            races.push(RaceRecord {
                title: race_id.clone(),
                id: race_id,
                datetime: None,
                track: None,
                distance: None,
                attachments,
                predictions,
            });
        }

        Self::from_races(races)
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }

    pub fn len(&self) -> usize {
        self.races.len()
    }

    /// Find a race by identifier
    pub fn find(&self, id: &str) -> Option<&RaceRecord> {
        self.races.iter().find(|r| r.id == id)
    }

    /// First race in display order
    pub fn first(&self) -> Option<&RaceRecord> {
        self.races.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RaceRecord> {
        self.races.iter()
    }
}

impl RaceRecord {
    /// Create a record with only the required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            datetime: None,
            track: None,
            distance: None,
            attachments: Vec::new(),
            predictions: Vec::new(),
        }
    }

    /// Picker label: the title, or the identifier when the title is blank
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.id
        } else {
            &self.title
        }
    }
}

impl HorsePrediction {
    /// Win probability as a percentage with one decimal, e.g. `23.4`
    pub fn win_percent(&self) -> String {
        format!("{:.1}", self.win_prob * 100.0)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

/// Gate numbers arrive as `5`, `"5"`, `""` or `null`
fn optional_number_or_string<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u32),
        String(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::String(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid draw: {s}"))),
    }
}
