use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A dictionary provider whose senses get their own tab.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SourceId {
    Macmillan,
    Vocabulary,
    Wiktionary,
    Urban,
}

impl SourceId {
    pub const ALL: [SourceId; 4] = [
        SourceId::Macmillan,
        SourceId::Vocabulary,
        SourceId::Wiktionary,
        SourceId::Urban,
    ];

    /// Human-readable tab label.
    pub fn label(&self) -> &'static str {
        match self {
            SourceId::Macmillan => "Macmillan",
            SourceId::Vocabulary => "Vocabulary",
            SourceId::Wiktionary => "Wiktionary",
            SourceId::Urban => "Urban Dictionary",
        }
    }

    /// Element id of the source's definition panel.
    pub fn panel_id(&self) -> &'static str {
        match self {
            SourceId::Macmillan => "Macmillan",
            SourceId::Vocabulary => "Vocab",
            SourceId::Wiktionary => "Wiki",
            SourceId::Urban => "Urban",
        }
    }

    fn query_value(&self) -> &'static str {
        match self {
            SourceId::Macmillan => "macmillan",
            SourceId::Vocabulary => "vocab",
            SourceId::Wiktionary => "wiki",
            SourceId::Urban => "urban",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseSourceError(String);

impl fmt::Display for ParseSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown definition source {:?} (expected macmillan, vocab, wiki or urban)",
            self.0
        )
    }
}

impl std::error::Error for ParseSourceError {}

impl FromStr for SourceId {
    type Err = ParseSourceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "macmillan" => Ok(SourceId::Macmillan),
            "vocab" | "vocabulary" => Ok(SourceId::Vocabulary),
            "wiki" | "wiktionary" => Ok(SourceId::Wiktionary),
            "urban" | "urban dictionary" => Ok(SourceId::Urban),
            _ => Err(ParseSourceError(value.to_string())),
        }
    }
}

/// One meaning of a word under one part of speech.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sense {
    #[serde(default, alias = "part_of_speech")]
    pub part_of_speech: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// A source item: either a lone sense or a primary sense followed by its sub-senses.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefinitionEntry {
    Group(Vec<Sense>),
    Single(Sense),
}

impl DefinitionEntry {
    /// Splits the entry into its primary sense and sub-senses.
    ///
    /// Returns `None` for an empty group.
    pub fn split(&self) -> Option<(&Sense, &[Sense])> {
        match self {
            DefinitionEntry::Single(sense) => Some((sense, &[])),
            DefinitionEntry::Group(senses) => senses.split_first(),
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Origin {
    #[serde(default, alias = "part_of_speech", skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, alias = "origin")]
    pub text: String,
}

pub const PARAGRAPH_MARKER: &str = "<br>";

impl Origin {
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.text.split(PARAGRAPH_MARKER)
    }

    /// Part-of-speech tag, ignoring blank values.
    pub fn tag(&self) -> Option<&str> {
        self.part_of_speech
            .as_deref()
            .map(str::trim)
            .filter(|pos| !pos.is_empty())
    }
}

/// The lookup service's response for one word.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<Vec<String>>,
    #[serde(default, alias = "macmillan_defs", skip_serializing_if = "Option::is_none")]
    pub macmillan_defs: Option<Vec<DefinitionEntry>>,
    #[serde(default, alias = "vocab_defs", skip_serializing_if = "Option::is_none")]
    pub vocab_defs: Option<Vec<DefinitionEntry>>,
    #[serde(default, alias = "wiki_defs", skip_serializing_if = "Option::is_none")]
    pub wiki_defs: Option<Vec<DefinitionEntry>>,
    #[serde(default, alias = "urban_defs", skip_serializing_if = "Option::is_none")]
    pub urban_defs: Option<Vec<DefinitionEntry>>,
    #[serde(default, alias = "stock_images", skip_serializing_if = "Option::is_none")]
    pub stock_images: Option<Vec<String>>,
    #[serde(
        default,
        alias = "etymOrigins",
        alias = "etym_origins",
        skip_serializing_if = "Option::is_none"
    )]
    pub etymology_origins: Option<Vec<Origin>>,
    #[serde(default, alias = "wiki_origins", skip_serializing_if = "Option::is_none")]
    pub wiki_origins: Option<Vec<Origin>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl LookupResult {
    pub fn definitions(&self, source: SourceId) -> &[DefinitionEntry] {
        let field = match source {
            SourceId::Macmillan => &self.macmillan_defs,
            SourceId::Vocabulary => &self.vocab_defs,
            SourceId::Wiktionary => &self.wiki_defs,
            SourceId::Urban => &self.urban_defs,
        };
        non_empty(field)
    }

    pub fn overview(&self) -> &[String] {
        non_empty(&self.overview)
    }

    pub fn stock_images(&self) -> &[String] {
        non_empty(&self.stock_images)
    }

    pub fn sources(&self) -> &[String] {
        non_empty(&self.sources)
    }

    /// Origins to display: etymology notes win over wiki notes, never merged.
    pub fn displayed_origins(&self) -> &[Origin] {
        let etymology = non_empty(&self.etymology_origins);
        if etymology.is_empty() {
            non_empty(&self.wiki_origins)
        } else {
            etymology
        }
    }

    /// True when no recognized field carries any content.
    ///
    /// A definitions list holding only empty groups counts as empty.
    pub fn is_empty(&self) -> bool {
        self.overview().is_empty()
            && SourceId::ALL.iter().all(|source| {
                self.definitions(*source)
                    .iter()
                    .all(|entry| entry.split().is_none())
            })
            && self.stock_images().is_empty()
            && self.displayed_origins().is_empty()
            && self.sources().is_empty()
    }
}

fn non_empty<T>(field: &Option<Vec<T>>) -> &[T] {
    field.as_deref().unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_camel_and_snake_keys() {
        let camel: LookupResult = serde_json::from_str(
            r#"{"vocabDefs":[{"partOfSpeech":"noun","meaning":"a test","examples":["e.g. this"]}],
                "etymologyOrigins":[{"partOfSpeech":"n.","text":"old"}]}"#,
        )
        .unwrap();
        let snake: LookupResult = serde_json::from_str(
            r#"{"vocab_defs":[{"part_of_speech":"noun","meaning":"a test","examples":["e.g. this"]}],
                "etym_origins":[{"part_of_speech":"n.","origin":"old"}]}"#,
        )
        .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.definitions(SourceId::Vocabulary).len(), 1);
        assert_eq!(camel.displayed_origins()[0].text, "old");
    }

    #[test]
    fn nested_entries_parse_as_groups() {
        let result: LookupResult = serde_json::from_str(
            r#"{"macmillanDefs":[[{"partOfSpeech":"verb","meaning":"main"},{"partOfSpeech":"verb","meaning":"sub"}]]}"#,
        )
        .unwrap();
        let entries = result.definitions(SourceId::Macmillan);
        let (primary, subs) = entries[0].split().unwrap();
        assert_eq!(primary.meaning, "main");
        assert!(primary.examples.is_empty());
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].meaning, "sub");
    }

    #[test]
    fn empty_group_has_no_primary() {
        assert!(DefinitionEntry::Group(Vec::new()).split().is_none());
    }

    #[test]
    fn empty_object_and_empty_arrays_are_empty() {
        let empty: LookupResult = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
        let arrays: LookupResult =
            serde_json::from_str(r#"{"overview":[],"vocab_defs":[],"sources":[],"unknown":1}"#)
                .unwrap();
        assert!(arrays.is_empty());
        let sourced: LookupResult = serde_json::from_str(r#"{"sources":["x"]}"#).unwrap();
        assert!(!sourced.is_empty());
        let hollow: LookupResult =
            serde_json::from_str(r#"{"vocabDefs":[[]],"urban_defs":[[],[]]}"#).unwrap();
        assert!(hollow.is_empty());
        let mixed: LookupResult = serde_json::from_str(
            r#"{"vocabDefs":[[],{"partOfSpeech":"noun","meaning":"kept"}]}"#,
        )
        .unwrap();
        assert!(!mixed.is_empty());
    }

    #[test]
    fn etymology_wins_over_wiki_origins() {
        let result = LookupResult {
            etymology_origins: Some(vec![Origin {
                part_of_speech: None,
                text: "etym".into(),
            }]),
            wiki_origins: Some(vec![Origin {
                part_of_speech: None,
                text: "wiki".into(),
            }]),
            ..Default::default()
        };
        assert_eq!(result.displayed_origins().len(), 1);
        assert_eq!(result.displayed_origins()[0].text, "etym");
    }

    #[test]
    fn source_ids_parse_from_labels_and_keys() {
        assert_eq!("wiki".parse::<SourceId>(), Ok(SourceId::Wiktionary));
        assert_eq!("Vocabulary".parse::<SourceId>(), Ok(SourceId::Vocabulary));
        assert_eq!("Urban Dictionary".parse::<SourceId>(), Ok(SourceId::Urban));
        assert!("oxford".parse::<SourceId>().is_err());
        for source in SourceId::ALL {
            assert_eq!(source.to_string().parse::<SourceId>(), Ok(source));
        }
    }

    #[test]
    fn origin_paragraphs_split_on_marker() {
        let origin = Origin {
            part_of_speech: Some("  ".into()),
            text: "first<br>second".into(),
        };
        assert_eq!(origin.paragraphs().collect::<Vec<_>>(), ["first", "second"]);
        assert_eq!(origin.tag(), None);
    }
}
