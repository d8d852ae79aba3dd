use crate::record::{Record, slug};
use crate::statics;
use crate::value::FieldValue;
use anyhow::{Context, bail};
use indexmap::IndexMap;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// How a record's on-disk identity is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingScheme {
    /// Monster-style: filename is the sanitized `name` field. Renaming a
    /// record changes its identity; the old file is only removed if the
    /// caller explicitly deletes it.
    SlugFromName,
    /// Item-style: filename is the stem the record was loaded from (or the
    /// stem the caller assigns on add); the `name` field is display-only.
    FileStem,
}

/// A file that could not be loaded. Collected, not fatal: a content
/// directory with one broken file should still open for editing.
#[derive(Debug)]
pub struct LoadWarning {
    pub path: PathBuf,
    pub message: String,
}

/// Result of a multi-record save sweep. Failures do not stop the sweep and
/// do not roll anything back.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub saved: usize,
    pub failures: Vec<(String, String)>,
}

/// A directory of one-JSON-file-per-record content, loaded into an ordered
/// in-memory collection keyed by identity. The authoritative copy of
/// records during an editing session; all persistence goes through here.
#[derive(Debug)]
pub struct RecordStore {
    dir: PathBuf,
    naming: NamingScheme,
    ensure_ascii: bool,
    records: IndexMap<String, Record>,
    warnings: Vec<LoadWarning>,
}

impl RecordStore {
    /// Load every `*.json` file under `dir`. Files are visited in filename
    /// order so load order is reproducible. A missing directory is an empty
    /// store, not an error (it is created on first write).
    pub fn open(
        dir: impl Into<PathBuf>,
        naming: NamingScheme,
        ensure_ascii: bool,
    ) -> anyhow::Result<Self> {
        let dir = dir.into();
        let mut store = Self {
            dir,
            naming,
            ensure_ascii,
            records: IndexMap::new(),
            warnings: Vec::new(),
        };

        if !store.dir.exists() {
            return Ok(store);
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&store.dir)
            .with_context(|| format!("reading {:?}", store.dir))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some(statics::JSON_EXT))
            .collect();
        paths.sort();

        for path in paths {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            match load_one(&path) {
                Ok(mut record) => {
                    record.source = Some(stem);
                    let identity = store.identity_of(&record);
                    // Two files can slug to the same identity. Last one wins,
                    // but the caller gets told which file it shadowed.
                    if let Some(prev) = store.records.insert(identity.clone(), record) {
                        let prev_stem = prev.source.unwrap_or_default();
                        store.warnings.push(LoadWarning {
                            path,
                            message: format!(
                                "identity {identity:?} already loaded from \
                                 {prev_stem}.{}; keeping this file",
                                statics::JSON_EXT
                            ),
                        });
                    }
                }
                Err(e) => store.warnings.push(LoadWarning {
                    path,
                    message: format!("{e:#}"),
                }),
            }
        }

        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn naming(&self) -> NamingScheme {
        self.naming
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, identity: &str) -> Option<&Record> {
        self.records.get(identity)
    }

    pub fn get_mut(&mut self, identity: &str) -> Option<&mut Record> {
        self.records.get_mut(identity)
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn file_path(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("{identity}.{}", statics::JSON_EXT))
    }

    /// Next free `id`: one past the largest id in the collection. The
    /// monster tool assigned these on add; item files carry no ids.
    pub fn next_id(&self) -> i64 {
        self.records
            .values()
            .filter_map(Record::id)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Persist one record. Returns the identity the record now lives under:
    /// under `SlugFromName` a renamed record is written to its new filename
    /// and re-keyed, and the old file stays on disk until the caller
    /// invokes `delete_file_for` on the old identity.
    pub fn save_record(&mut self, identity: &str) -> anyhow::Result<String> {
        let Some(record) = self.records.get(identity) else {
            bail!("no record {identity:?} in store");
        };
        let target = self.save_identity(record)?;
        let text = record.to_pretty_json(self.ensure_ascii);

        fs::create_dir_all(&self.dir).with_context(|| format!("creating {:?}", self.dir))?;
        let path = self.file_path(&target);
        fs::write(&path, text).with_context(|| format!("writing {path:?}"))?;

        if target == identity {
            if let Some(record) = self.records.get_mut(identity) {
                record.source = Some(target.clone());
            }
        } else {
            let mut record = self
                .records
                .shift_remove(identity)
                .unwrap_or_else(Record::new);
            record.source = Some(target.clone());
            self.records.insert(target.clone(), record);
        }
        Ok(target)
    }

    /// Save every record, keeping going past failures.
    pub fn save_all(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        let identities: Vec<String> = self.records.keys().cloned().collect();
        for identity in identities {
            match self.save_record(&identity) {
                Ok(_) => report.saved += 1,
                Err(e) => report.failures.push((identity, format!("{e:#}"))),
            }
        }
        report
    }

    /// Add a new record and persist it. Under `SlugFromName` an `id` is
    /// assigned when absent; under `FileStem` the caller must have set
    /// `source` to the stem the file should use.
    pub fn add(&mut self, mut record: Record) -> anyhow::Result<String> {
        if self.naming == NamingScheme::SlugFromName && record.id().is_none() {
            let id = self.next_id();
            record.set(
                statics::FIELD_ID,
                FieldValue::Number(crate::value::FieldNumber::I64(id)),
            );
        }
        let identity = self.save_identity(&record)?;
        record.source = Some(identity.clone());
        self.records.insert(identity.clone(), record);
        self.save_record(&identity)?;
        Ok(identity)
    }

    /// Drop a record from the collection and delete its file.
    pub fn remove(&mut self, identity: &str) -> anyhow::Result<Record> {
        let Some(record) = self.records.shift_remove(identity) else {
            bail!("no record {identity:?} in store");
        };
        self.delete_file_for(identity)?;
        Ok(record)
    }

    /// Explicit cleanup for files orphaned by renames (or anything else).
    /// Deleting a file that is already gone is fine.
    pub fn delete_file_for(&self, identity: &str) -> anyhow::Result<()> {
        let path = self.file_path(identity);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("deleting {path:?}"))?;
        }
        Ok(())
    }

    /// Schema sweep: give every record that lacks `field` the supplied
    /// default, persisting each touched record.
    pub fn add_field_to_all(&mut self, field: &str, default: FieldValue) -> SaveReport {
        let mut report = SaveReport::default();
        let identities: Vec<String> = self.records.keys().cloned().collect();
        for identity in identities {
            let Some(record) = self.records.get_mut(&identity) else {
                continue;
            };
            if record.get(field).is_some() {
                continue;
            }
            record.set(field.to_string(), default.clone());
            match self.save_record(&identity) {
                Ok(_) => report.saved += 1,
                Err(e) => report.failures.push((identity, format!("{e:#}"))),
            }
        }
        report
    }

    /// Schema sweep: remove `field` from every record that has it. Core
    /// schema fields are protected.
    pub fn remove_field_from_all(&mut self, field: &str) -> anyhow::Result<SaveReport> {
        if statics::CORE_FIELDS.contains(&field) {
            bail!("{field:?} is a core field and cannot be removed");
        }
        let mut report = SaveReport::default();
        let identities: Vec<String> = self.records.keys().cloned().collect();
        for identity in identities {
            let Some(record) = self.records.get_mut(&identity) else {
                continue;
            };
            if record.remove(field).is_none() {
                continue;
            }
            match self.save_record(&identity) {
                Ok(_) => report.saved += 1,
                Err(e) => report.failures.push((identity, format!("{e:#}"))),
            }
        }
        Ok(report)
    }

    /// Write an explicit selection as one pretty JSON array. Provenance is
    /// never included; unknown identities fail the export before anything
    /// is written.
    pub fn export(&self, identities: &[String], path: &Path) -> anyhow::Result<usize> {
        let mut selected = Vec::with_capacity(identities.len());
        for identity in identities {
            let Some(record) = self.records.get(identity.as_str()) else {
                bail!("no record {identity:?} in store");
            };
            selected.push(record);
        }

        let mut out = String::new();
        if selected.is_empty() {
            out.push_str("[]");
        } else {
            out.push_str("[\n");
            for (i, record) in selected.iter().enumerate() {
                out.push_str("  ");
                record.write_pretty(&mut out, 2, self.ensure_ascii);
                if i + 1 != selected.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push(']');
        }

        fs::write(path, out).with_context(|| format!("writing {path:?}"))?;
        Ok(selected.len())
    }

    /// Identity a record would persist under right now.
    fn save_identity(&self, record: &Record) -> anyhow::Result<String> {
        match self.naming {
            NamingScheme::SlugFromName => {
                let Some(name) = record.name() else {
                    bail!("record has no name; cannot derive a filename");
                };
                let identity = slug(name);
                if identity.is_empty() {
                    bail!("record name {name:?} sanitizes to an empty filename");
                }
                Ok(identity)
            }
            NamingScheme::FileStem => record
                .source
                .clone()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow::anyhow!("record has no file stem to save under")),
        }
    }

    /// Identity for a freshly loaded record: same derivation as saving,
    /// with the file stem as the fallback when a name is unusable.
    fn identity_of(&self, record: &Record) -> String {
        match self.naming {
            NamingScheme::SlugFromName => record
                .name()
                .map(slug)
                .filter(|s| !s.is_empty())
                .or_else(|| record.source.clone())
                .unwrap_or_default(),
            NamingScheme::FileStem => record.source.clone().unwrap_or_default(),
        }
    }
}

fn load_one(path: &Path) -> anyhow::Result<Record> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {path:?}"))?;
    Record::parse(&text).with_context(|| format!("parsing {path:?}"))
}
