use crate::model::{
    clamp_dimension, default_roster_for, ClassConfig, DisabledSeats, SeatIndex, SeatingMap,
    Student, DEFAULT_COLS, DEFAULT_ROWS,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

const KEY_PREFIX: &str = "student-data";

/// The five per-class records kept in the key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    ClassConfig,
    Roster,
    Seating,
    DisabledSeats,
    CalledOn,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::ClassConfig => "class-config",
            RecordKind::Roster => "roster",
            RecordKind::Seating => "seating",
            RecordKind::DisabledSeats => "disabled-seats",
            RecordKind::CalledOn => "called-on",
        }
    }

    pub fn key(self, class_id: &str) -> String {
        format!("{}:{}:{}", KEY_PREFIX, self.as_str(), class_id)
    }
}

/// Result of a load-or-initialize read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Loaded<T> {
    Found(T),
    Defaulted(T),
}

impl<T> Loaded<T> {
    pub fn into_inner(self) -> T {
        match self {
            Loaded::Found(v) | Loaded::Defaulted(v) => v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Loaded::Defaulted(_))
    }
}

enum Stored {
    Missing,
    Parsed(Value),
    Unreadable,
}

fn read_stored<S: SeatingStore + ?Sized>(store: &S, key: &str) -> Stored {
    match store.get_item(key) {
        Ok(None) => Stored::Missing,
        Ok(Some(raw)) if raw.is_empty() => Stored::Missing,
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(v) => Stored::Parsed(v),
            Err(e) => {
                warn!(key, error = %e, "stored record is not valid json");
                Stored::Unreadable
            }
        },
        Err(e) => {
            warn!(key, error = %e, "store read failed");
            Stored::Unreadable
        }
    }
}

fn write_record<S: SeatingStore + ?Sized, T: Serialize + ?Sized>(
    store: &mut S,
    key: &str,
    value: &T,
) {
    let raw = match serde_json::to_string(value) {
        Ok(v) => v,
        Err(e) => {
            warn!(key, error = %e, "failed to serialize record");
            return;
        }
    };
    if let Err(e) = store.set_item(key, &raw) {
        warn!(key, error = %e, "store write failed");
    }
}

fn positive_dimension(v: &Value, field: &str) -> Option<u32> {
    v.get(field)
        .and_then(Value::as_f64)
        .filter(|n| *n > 0.0)
        .map(clamp_dimension)
}

fn parse_roster(items: Vec<Value>) -> Vec<Student> {
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<Student>(item).ok())
        .collect()
}

fn parse_seating(obj: serde_json::Map<String, Value>) -> SeatingMap {
    obj.into_iter()
        .filter_map(|(k, v)| {
            let seat = k.parse::<SeatIndex>().ok()?;
            let student_id = v.as_str()?.to_string();
            Some((seat, student_id))
        })
        .collect()
}

/// String-keyed persistence for seating charts.
///
/// Implementors provide the two raw primitives; the per-record accessors are
/// shared. Reads never fail: absent, malformed, or wrongly shaped values
/// degrade to the record's default. Writes are fire-and-forget and only log
/// on failure.
pub trait SeatingStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()>;

    fn load_class_config(&self, class_id: &str) -> Loaded<ClassConfig> {
        match read_stored(self, &RecordKind::ClassConfig.key(class_id)) {
            Stored::Parsed(v) if v.is_object() => Loaded::Found(ClassConfig {
                rows: positive_dimension(&v, "rows").unwrap_or(DEFAULT_ROWS),
                cols: positive_dimension(&v, "cols").unwrap_or(DEFAULT_COLS),
            }),
            _ => Loaded::Defaulted(ClassConfig::default()),
        }
    }

    fn get_class_config(&self, class_id: &str) -> ClassConfig {
        self.load_class_config(class_id).into_inner()
    }

    fn save_class_config(&mut self, class_id: &str, config: &ClassConfig) {
        write_record(
            self,
            &RecordKind::ClassConfig.key(class_id),
            &config.sanitized(),
        );
    }

    /// Reads the roster, seeding and persisting the canned default on first use.
    fn load_roster(&mut self, class_id: &str) -> Loaded<Vec<Student>> {
        let key = RecordKind::Roster.key(class_id);
        match read_stored(self, &key) {
            Stored::Missing => {
                let roster = default_roster_for(class_id);
                write_record(self, &key, &roster);
                Loaded::Defaulted(roster)
            }
            Stored::Parsed(Value::Array(items)) => Loaded::Found(parse_roster(items)),
            Stored::Parsed(_) | Stored::Unreadable => {
                Loaded::Defaulted(default_roster_for(class_id))
            }
        }
    }

    fn get_roster(&mut self, class_id: &str) -> Vec<Student> {
        self.load_roster(class_id).into_inner()
    }

    fn save_roster(&mut self, class_id: &str, roster: &[Student]) {
        write_record(self, &RecordKind::Roster.key(class_id), roster);
    }

    fn get_seating(&self, class_id: &str) -> SeatingMap {
        match read_stored(self, &RecordKind::Seating.key(class_id)) {
            Stored::Parsed(Value::Object(obj)) => parse_seating(obj),
            // A stored array reads as position -> student id.
            Stored::Parsed(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| match v {
                    Value::String(id) => Some((SeatIndex::try_from(i).ok()?, id)),
                    _ => None,
                })
                .collect(),
            _ => SeatingMap::new(),
        }
    }

    fn save_seating(&mut self, class_id: &str, seating: &SeatingMap) {
        write_record(self, &RecordKind::Seating.key(class_id), seating);
    }

    fn get_disabled_seats(&self, class_id: &str) -> DisabledSeats {
        match read_stored(self, &RecordKind::DisabledSeats.key(class_id)) {
            Stored::Parsed(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_u64)
                .filter_map(|n| SeatIndex::try_from(n).ok())
                .collect(),
            _ => DisabledSeats::new(),
        }
    }

    fn save_disabled_seats(&mut self, class_id: &str, disabled: &DisabledSeats) {
        write_record(self, &RecordKind::DisabledSeats.key(class_id), disabled);
    }

    fn get_called_on(&self, class_id: &str) -> Vec<String> {
        match read_stored(self, &RecordKind::CalledOn.key(class_id)) {
            Stored::Parsed(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn save_called_on(&mut self, class_id: &str, student_ids: &[String]) {
        write_record(self, &RecordKind::CalledOn.key(class_id), student_ids);
    }
}

/// Store that lives only as long as the process. Backs `--ephemeral` and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeatingStore for MemoryStore {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
