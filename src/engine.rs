use crate::record::Record;
use crate::statics;
use crate::store::RecordStore;
use crate::value::{CoerceError, FieldKind, FieldValue, split_list};
use indexmap::IndexMap;

/// A single-field filter predicate. Criteria for different fields combine
/// as a conjunction; at most one criterion per field (the `FilterSet` map
/// enforces that by construction).
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Keep records whose numeric view falls in `min..=max`. A record
    /// missing the field compares as 0, so ranges that include 0 keep it.
    Range { min: f64, max: f64 },
    /// Case-insensitive substring match on the stringified field value.
    /// An empty needle matches everything, same as no criterion.
    Contains(String),
    /// Exact, type-sensitive equality; a missing field compares as Null.
    Equals(FieldValue),
}

impl Criterion {
    pub fn keeps(&self, record: &Record, field: &str) -> bool {
        match self {
            Criterion::Range { min, max } => {
                let v = record.numeric_or_zero(field);
                *min <= v && v <= *max
            }
            Criterion::Contains(needle) => record
                .text_or_empty(field)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Criterion::Equals(value) => {
                record.get(field).unwrap_or(&FieldValue::Null) == value
            }
        }
    }
}

/// field name -> active criterion, in insertion order. Setting a new
/// criterion for a field replaces the old one.
pub type FilterSet = IndexMap<String, Criterion>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, descending: bool) -> Self {
        Self {
            key: key.into(),
            descending,
        }
    }
}

/// Declared kind of a field for coercion purposes, from the schema tables.
pub fn field_kind(field: &str) -> FieldKind {
    if statics::LIST_FIELDS.contains(&field) {
        FieldKind::List
    } else if statics::FLOAT_FIELDS.contains(&field) {
        FieldKind::Float
    } else if statics::INTEGER_FIELDS.contains(&field) {
        FieldKind::Integer
    } else if statics::NULLABLE_FIELDS.contains(&field) {
        FieldKind::Nullable
    } else {
        FieldKind::Text
    }
}

fn is_numeric_field(field: &str) -> bool {
    statics::FLOAT_FIELDS.contains(&field) || statics::INTEGER_FIELDS.contains(&field)
}

/// Filter and order a view over the records: free-text search, then each
/// criterion in turn, then an optional column sort. The input collection is
/// never mutated; the result borrows from it.
///
/// Sorting only happens for recognized sortable fields. Numeric columns
/// compare by their degraded-to-zero numeric view, everything else by
/// lower-cased text. The sort is stable, so equal keys keep their relative
/// load order, and `descending` inverts the comparison (not the output),
/// which keeps ties stable too.
pub fn apply<'a, I>(
    records: I,
    query: &str,
    criteria: &FilterSet,
    sort: Option<&SortSpec>,
) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    let needle = query.trim().to_lowercase();
    let mut kept: Vec<&Record> = records
        .into_iter()
        .filter(|r| r.matches_query(&needle))
        .filter(|r| criteria.iter().all(|(field, c)| c.keeps(r, field)))
        .collect();

    if let Some(spec) = sort
        && statics::SORTABLE_FIELDS.contains(&spec.key.as_str())
    {
        let numeric = is_numeric_field(&spec.key);
        kept.sort_by(|a, b| {
            let ord = if numeric {
                a.numeric_or_zero(&spec.key)
                    .total_cmp(&b.numeric_or_zero(&spec.key))
            } else {
                a.text_or_empty(&spec.key)
                    .to_lowercase()
                    .cmp(&b.text_or_empty(&spec.key).to_lowercase())
            };
            if spec.descending { ord.reverse() } else { ord }
        });
    }

    kept
}

/// One problem encountered during a bulk apply. Field coercion failures and
/// per-record save failures are collected, never fatal to the batch.
#[derive(Debug, thiserror::Error)]
pub enum BulkIssue {
    #[error("{record}: field {field:?}: {source}")]
    InvalidValue {
        record: String,
        field: String,
        #[source]
        source: CoerceError,
    },
    #[error("{record}: save failed: {message}")]
    Save { record: String, message: String },
    #[error("no record {0:?} in store")]
    UnknownRecord(String),
}

#[derive(Debug, Default)]
pub struct BulkOutcome {
    /// Records that had at least one change applied (and were handed to the
    /// store), regardless of how many fields changed in each.
    pub modified: usize,
    pub issues: Vec<BulkIssue>,
}

/// Apply the same raw field changes to every record in `selection`,
/// persisting each modified record immediately, one file at a time.
///
/// An empty input string means "leave this field alone" for the whole
/// batch. `tags` input merges into the existing list instead of replacing
/// it. Writes are not transactional: a failure on one record leaves the
/// earlier writes in place and is reported in the outcome.
pub fn bulk_apply(
    store: &mut RecordStore,
    selection: &[String],
    changes: &IndexMap<String, String>,
) -> BulkOutcome {
    let mut outcome = BulkOutcome::default();

    for identity in selection {
        let Some(record) = store.get_mut(identity) else {
            outcome.issues.push(BulkIssue::UnknownRecord(identity.clone()));
            continue;
        };

        let mut applied = false;
        for (field, input) in changes {
            if input.trim().is_empty() {
                continue;
            }
            if field.as_str() == statics::FIELD_TAGS {
                record.union_tags(&split_list(input));
                applied = true;
                continue;
            }
            match FieldValue::coerce(field_kind(field), input) {
                Ok(value) => {
                    record.set(field.clone(), value);
                    applied = true;
                }
                Err(source) => outcome.issues.push(BulkIssue::InvalidValue {
                    record: identity.clone(),
                    field: field.clone(),
                    source,
                }),
            }
        }

        if applied {
            outcome.modified += 1;
            if let Err(e) = store.save_record(identity) {
                outcome.issues.push(BulkIssue::Save {
                    record: identity.clone(),
                    message: format!("{e:#}"),
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::{Criterion, FilterSet, SortSpec, apply, field_kind};
    use crate::record::Record;
    use crate::statics;
    use crate::value::{FieldKind, FieldNumber, FieldValue};

    fn monster(name: &str, cr: f64, kind: Option<&str>) -> Record {
        let mut r = Record::new();
        r.set(statics::FIELD_NAME, FieldValue::Text(name.into()));
        r.set(
            statics::FIELD_CHALLENGE_RATING,
            FieldValue::Number(FieldNumber::F64(cr)),
        );
        if let Some(kind) = kind {
            r.set(statics::FIELD_TYPE, FieldValue::Text(kind.into()));
        }
        r
    }

    #[test]
    fn no_query_no_criteria_no_sort_is_identity() {
        let records = vec![
            monster("Goblin", 0.25, Some("Humanoid")),
            monster("Dragon", 24.0, Some("Dragon")),
            monster("Rat", 0.0, None),
        ];
        let out = apply(&records, "", &FilterSet::new(), None);
        let names: Vec<_> = out.iter().filter_map(|r| r.name()).collect();
        assert_eq!(names, ["Goblin", "Dragon", "Rat"]);
    }

    #[test]
    fn contains_is_case_insensitive_and_skips_missing_fields() {
        let records = vec![
            monster("Wyrm", 10.0, Some("Dragon")),
            monster("Basilisk", 3.0, Some("Lizard")),
            monster("Shade", 2.0, None),
        ];
        let mut criteria = FilterSet::new();
        criteria.insert(
            statics::FIELD_TYPE.to_string(),
            Criterion::Contains("dragon".into()),
        );
        let out = apply(&records, "", &criteria, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name(), Some("Wyrm"));
    }

    #[test]
    fn range_with_zero_min_keeps_records_missing_the_field() {
        let mut no_cr = Record::new();
        no_cr.set(statics::FIELD_NAME, FieldValue::Text("Spirit".into()));
        let records = vec![monster("Dragon", 24.0, None), no_cr];

        let mut criteria = FilterSet::new();
        criteria.insert(
            statics::FIELD_CHALLENGE_RATING.to_string(),
            Criterion::Range {
                min: 0.0,
                max: f64::INFINITY,
            },
        );
        // Full-range filter is a no-op: the missing field degrades to 0.
        assert_eq!(apply(&records, "", &criteria, None).len(), 2);

        criteria.insert(
            statics::FIELD_CHALLENGE_RATING.to_string(),
            Criterion::Range {
                min: 1.0,
                max: f64::INFINITY,
            },
        );
        let out = apply(&records, "", &criteria, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name(), Some("Dragon"));
    }

    #[test]
    fn equals_is_type_sensitive_and_missing_reads_as_null() {
        let mut with_flag = monster("A", 1.0, None);
        with_flag.set("legendary", FieldValue::Bool(true));
        let without_flag = monster("B", 1.0, None);
        let records = vec![with_flag, without_flag];

        let mut criteria = FilterSet::new();
        criteria.insert("legendary".to_string(), Criterion::Equals(FieldValue::Bool(true)));
        assert_eq!(apply(&records, "", &criteria, None)[0].name(), Some("A"));

        // The stringly "true" does not equal the boolean true.
        criteria.insert(
            "legendary".to_string(),
            Criterion::Equals(FieldValue::Text("true".into())),
        );
        assert!(apply(&records, "", &criteria, None).is_empty());

        criteria.insert("legendary".to_string(), Criterion::Equals(FieldValue::Null));
        assert_eq!(apply(&records, "", &criteria, None)[0].name(), Some("B"));
    }

    #[test]
    fn numeric_sort_descending_orders_by_challenge_rating() {
        let records = vec![
            monster("Goblin", 0.25, None),
            monster("Dragon", 24.0, None),
            monster("Rat", 0.0, None),
        ];
        let sort = SortSpec::new(statics::FIELD_CHALLENGE_RATING, true);
        let out = apply(&records, "", &FilterSet::new(), Some(&sort));
        let names: Vec<_> = out.iter().filter_map(|r| r.name()).collect();
        assert_eq!(names, ["Dragon", "Goblin", "Rat"]);
    }

    #[test]
    fn flipping_descending_reverses_exactly_when_no_ties() {
        let records = vec![
            monster("Goblin", 0.25, None),
            monster("Dragon", 24.0, None),
            monster("Rat", 0.5, None),
        ];
        let asc = apply(
            &records,
            "",
            &FilterSet::new(),
            Some(&SortSpec::new(statics::FIELD_CHALLENGE_RATING, false)),
        );
        let desc = apply(
            &records,
            "",
            &FilterSet::new(),
            Some(&SortSpec::new(statics::FIELD_CHALLENGE_RATING, true)),
        );
        let mut asc_names: Vec<_> = asc.iter().filter_map(|r| r.name()).collect();
        let desc_names: Vec<_> = desc.iter().filter_map(|r| r.name()).collect();
        asc_names.reverse();
        assert_eq!(asc_names, desc_names);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let records = vec![
            monster("Zeta", 1.0, None),
            monster("Alpha", 1.0, None),
            monster("Mid", 0.5, None),
            monster("Omega", 1.0, None),
        ];
        let sort = SortSpec::new(statics::FIELD_CHALLENGE_RATING, false);
        let out = apply(&records, "", &FilterSet::new(), Some(&sort));
        let names: Vec<_> = out.iter().filter_map(|r| r.name()).collect();
        // Ties (cr = 1.0) keep their load order behind the lone 0.5.
        assert_eq!(names, ["Mid", "Zeta", "Alpha", "Omega"]);

        let sort = SortSpec::new(statics::FIELD_CHALLENGE_RATING, true);
        let out = apply(&records, "", &FilterSet::new(), Some(&sort));
        let names: Vec<_> = out.iter().filter_map(|r| r.name()).collect();
        assert_eq!(names, ["Zeta", "Alpha", "Omega", "Mid"]);
    }

    #[test]
    fn unrecognized_sort_key_leaves_order_alone() {
        let records = vec![monster("B", 2.0, None), monster("A", 1.0, None)];
        let sort = SortSpec::new("favorite_color", false);
        let out = apply(&records, "", &FilterSet::new(), Some(&sort));
        let names: Vec<_> = out.iter().filter_map(|r| r.name()).collect();
        assert_eq!(names, ["B", "A"]);
    }

    #[test]
    fn search_and_criteria_compose_as_a_conjunction() {
        let mut tagged = monster("Fire Drake", 5.0, Some("Dragon"));
        tagged.set(
            statics::FIELD_TAGS,
            FieldValue::List(vec!["volcanic".into()]),
        );
        let records = vec![
            tagged,
            monster("Frost Drake", 5.0, Some("Dragon")),
            monster("Fire Beetle", 0.25, Some("Beast")),
        ];
        let mut criteria = FilterSet::new();
        criteria.insert(
            statics::FIELD_TYPE.to_string(),
            Criterion::Equals(FieldValue::Text("Dragon".into())),
        );
        let out = apply(&records, "fire", &criteria, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name(), Some("Fire Drake"));
    }

    #[test]
    fn field_kind_tables_cover_the_schema() {
        assert_eq!(field_kind(statics::FIELD_CHALLENGE_RATING), FieldKind::Float);
        assert_eq!(field_kind(statics::FIELD_HIT_POINTS), FieldKind::Integer);
        assert_eq!(field_kind(statics::FIELD_TAGS), FieldKind::List);
        assert_eq!(field_kind(statics::FIELD_DAMAGE), FieldKind::Nullable);
        assert_eq!(field_kind(statics::FIELD_ALIGNMENT), FieldKind::Text);
    }
}
