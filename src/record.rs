use crate::statics;
use crate::value::FieldValue;
use anyhow::Context;
use indexmap::IndexMap;

/// One game-data entity (a monster or an item): an ordered flat mapping of
/// field name to value, loaded from a single JSON file.
///
/// `source` is the file stem the record came from. It is provenance, not a
/// field: keeping it out of the mapping means it can never leak into a
/// saved file or an export.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub fields: IndexMap<String, FieldValue>,
    pub source: Option<String>,
}

impl Record {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            source: None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.shift_remove(field)
    }

    pub fn name(&self) -> Option<&str> {
        self.get(statics::FIELD_NAME)
            .and_then(FieldValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn tags(&self) -> &[String] {
        self.get(statics::FIELD_TAGS)
            .and_then(FieldValue::as_list)
            .unwrap_or_default()
    }

    pub fn id(&self) -> Option<i64> {
        match self.get(statics::FIELD_ID) {
            Some(FieldValue::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    /// Numeric view of a field with the degrade-to-zero rule; a missing
    /// field is 0 (see `FieldValue::numeric_or_zero` for the quirk).
    pub fn numeric_or_zero(&self, field: &str) -> f64 {
        self.get(field).map_or(0.0, FieldValue::numeric_or_zero)
    }

    /// Stringified view of a field; missing fields read as empty.
    pub fn text_or_empty(&self, field: &str) -> String {
        self.get(field).map_or_else(String::new, FieldValue::display_text)
    }

    /// Case-insensitive free-text match over the searchable surface:
    /// name, type, alignment, description, and every tag/note entry.
    /// `query` must already be lower-cased by the caller.
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        for field in statics::SEARCH_TEXT_FIELDS {
            if self.text_or_empty(field).to_lowercase().contains(query) {
                return true;
            }
        }
        for field in statics::SEARCH_LIST_FIELDS {
            if let Some(items) = self.get(field).and_then(FieldValue::as_list)
                && items.iter().any(|it| it.to_lowercase().contains(query))
            {
                return true;
            }
        }
        false
    }

    /// Merge comma-separated tag input into the existing `tags` list:
    /// existing order kept, new tags appended, duplicates dropped.
    pub fn union_tags(&mut self, new_tags: &[String]) {
        let mut merged: Vec<String> = self.tags().to_vec();
        for tag in new_tags {
            if !merged.iter().any(|t| t == tag) {
                merged.push(tag.clone());
            }
        }
        self.set(statics::FIELD_TAGS, FieldValue::List(merged));
    }

    pub fn parse(text: &str) -> anyhow::Result<Record> {
        let fields: IndexMap<String, FieldValue> =
            json5::from_str(text).context("parsing record JSON")?;
        Ok(Record {
            fields,
            source: None,
        })
    }

    /// Pretty JSON, 2-space indent, the shape the game's data loader
    /// expects. An empty `tags` list is omitted entirely. Provenance is
    /// never written.
    pub fn to_pretty_json(&self, ensure_ascii: bool) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0, ensure_ascii);
        out
    }

    pub(crate) fn write_pretty(&self, out: &mut String, indent: usize, ensure_ascii: bool) {
        let written: Vec<(&String, &FieldValue)> = self
            .fields
            .iter()
            .filter(|(k, v)| {
                !(k.as_str() == statics::FIELD_TAGS
                    && v.as_list().is_some_and(<[String]>::is_empty))
            })
            .collect();

        if written.is_empty() {
            out.push_str("{}");
            return;
        }

        out.push_str("{\n");
        for (i, (key, value)) in written.iter().enumerate() {
            out.push_str(&" ".repeat(indent + 2));
            crate::value::write_key(out, key, ensure_ascii);
            out.push_str(": ");
            value.write_pretty(out, indent + 2, ensure_ascii);
            if i + 1 != written.len() {
                out.push(',');
            }
            out.push('\n');
        }
        out.push_str(&" ".repeat(indent));
        out.push('}');
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a display name to its on-disk identity: strip characters that
/// are not word characters, whitespace, or hyphens; collapse each
/// whitespace run to a single hyphen; lower-case the result.
/// "Ancient Red Dragon" becomes "ancient-red-dragon".
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            pending_hyphen = true;
            continue;
        }
        if !(ch.is_alphanumeric() || ch == '_' || ch == '-') {
            continue;
        }
        if pending_hyphen {
            out.push('-');
            pending_hyphen = false;
        }
        out.extend(ch.to_lowercase());
    }
    if pending_hyphen && !out.is_empty() {
        // Trailing whitespace in the name still produced a hyphen in the
        // original tool; keep parity.
        out.push('-');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{Record, slug};
    use crate::statics;
    use crate::value::{FieldNumber, FieldValue};

    fn goblin() -> Record {
        let mut r = Record::new();
        r.set(statics::FIELD_NAME, FieldValue::Text("Goblin".into()));
        r.set(statics::FIELD_TYPE, FieldValue::Text("Humanoid".into()));
        r.set(
            statics::FIELD_CHALLENGE_RATING,
            FieldValue::Number(FieldNumber::F64(0.25)),
        );
        r.set(
            statics::FIELD_TAGS,
            FieldValue::List(vec!["cave".into(), "goblinoid".into()]),
        );
        r
    }

    #[test]
    fn slug_lowercases_and_hyphenates() {
        assert_eq!(slug("Goblin"), "goblin");
        assert_eq!(slug("Ancient Red Dragon"), "ancient-red-dragon");
        assert_eq!(slug("Will-o'-Wisp"), "will-o-wisp");
        assert_eq!(slug("Ghast  (Lesser)"), "ghast-lesser");
    }

    #[test]
    fn matches_query_covers_tags_and_is_case_insensitive() {
        let r = goblin();
        assert!(r.matches_query("gob"));
        assert!(r.matches_query("humanoid"));
        assert!(r.matches_query("cave"));
        assert!(!r.matches_query("dragon"));
        // Empty query filters nothing.
        assert!(r.matches_query(""));
    }

    #[test]
    fn union_tags_appends_without_duplicating() {
        let mut r = goblin();
        r.union_tags(&["cave".into(), "nocturnal".into()]);
        assert_eq!(r.tags(), ["cave", "goblinoid", "nocturnal"]);
    }

    #[test]
    fn pretty_json_omits_empty_tags_list() {
        let mut r = Record::new();
        r.set(statics::FIELD_NAME, FieldValue::Text("Rat".into()));
        r.set(statics::FIELD_TAGS, FieldValue::List(Vec::new()));
        assert_eq!(r.to_pretty_json(false), "{\n  \"name\": \"Rat\"\n}");
    }

    #[test]
    fn pretty_json_round_trips_through_parse() {
        let r = goblin();
        let text = r.to_pretty_json(false);
        let back = Record::parse(&text).unwrap();
        assert_eq!(back.fields, r.fields);
    }

    #[test]
    fn parse_rejects_non_object_files() {
        assert!(Record::parse("[1, 2, 3]").is_err());
        assert!(Record::parse("\"just a string\"").is_err());
    }
}
