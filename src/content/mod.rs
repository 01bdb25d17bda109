/*!
 * Content Model
 * Section names, write mutations and the rules for applying them
 */
pub mod defaults;
pub mod schema;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    #[error("Expected a JSON object")]
    NotAnObject,

    #[error("Expected a JSON array for section '{0}'")]
    NotAnArray(Section),

    #[error("Invalid {section} content: {source}")]
    Schema {
        section: Section,
        #[source]
        source: serde_json::Error,
    },

    #[error("Maintenance end date must be after start date")]
    InvalidSchedule,

    #[error("Stored {0} content is malformed")]
    Corrupt(Section),
}

// ============================================================================
// Sections
// ============================================================================

/// Top-level bucket of portfolio content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Hero,
    About,
    Skills,
    Projects,
    Blog,
    Contact,
    Config,
    Maintenance,
}

/// Where the items of a collection section live inside the section value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    /// The section value is itself the item array.
    Root,
    /// The item array sits under this key of the section object.
    Field(&'static str),
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::Hero,
        Section::About,
        Section::Skills,
        Section::Projects,
        Section::Blog,
        Section::Contact,
        Section::Config,
        Section::Maintenance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Hero => "hero",
            Section::About => "about",
            Section::Skills => "skills",
            Section::Projects => "projects",
            Section::Blog => "blog",
            Section::Contact => "contact",
            Section::Config => "config",
            Section::Maintenance => "maintenance",
        }
    }

    /// Sections holding addressable items (`?id=`).
    pub fn collection(self) -> Option<Collection> {
        match self {
            Section::Projects => Some(Collection::Root),
            Section::Blog => Some(Collection::Field("posts")),
            _ => None,
        }
    }

    /// Key under which a client keeps its offline copy of the section.
    pub fn cache_key(self) -> String {
        match self {
            Section::Maintenance => "maintenanceMode".to_string(),
            other => format!("{}Content", other.as_str()),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == lowered)
            .ok_or_else(|| ContentError::UnknownSection(s.to_string()))
    }
}

impl Collection {
    fn items<'a>(self, value: &'a Value) -> Option<&'a Vec<Value>> {
        match self {
            Collection::Root => value.as_array(),
            Collection::Field(key) => value.get(key).and_then(Value::as_array),
        }
    }

    fn items_mut(self, section: Section, value: &mut Value) -> Result<&mut Vec<Value>, ContentError> {
        let slot = match self {
            Collection::Root => value,
            Collection::Field(key) => value
                .as_object_mut()
                .ok_or(ContentError::Corrupt(section))?
                .entry(key)
                .or_insert_with(|| Value::Array(Vec::new())),
        };
        slot.as_array_mut().ok_or(ContentError::Corrupt(section))
    }
}

fn item_id(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}

/// Look up one item of a collection section by id.
pub fn find_item<'a>(section: Section, value: &'a Value, id: &str) -> Option<&'a Value> {
    section
        .collection()?
        .items(value)?
        .iter()
        .find(|item| item_id(item) == Some(id))
}

/// Ids are the creation time in milliseconds, bumped until unique in the collection.
fn next_id(items: &[Value], at: DateTime<Utc>) -> String {
    let mut candidate = at.timestamp_millis();
    loop {
        let id = candidate.to_string();
        if !items.iter().any(|item| item_id(item) == Some(id.as_str())) {
            return id;
        }
        candidate += 1;
    }
}

pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn into_object(value: Value) -> Result<Map<String, Value>, ContentError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ContentError::NotAnObject),
    }
}

// ============================================================================
// Mutations
// ============================================================================

/// A single write against one section.
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Shallow-merge keys into an object section.
    Merge(Map<String, Value>),
    /// Replace the whole section value.
    Replace(Value),
    /// Append a new item; the id (and creation stamp) are assigned here.
    Insert {
        item: Map<String, Value>,
        at: DateTime<Utc>,
    },
    /// Shallow-merge keys into one item. The item id is never overwritten.
    MergeItem {
        id: String,
        patch: Map<String, Value>,
    },
    RemoveItem {
        id: String,
    },
}

impl Mutation {
    /// Section-level update: array sections take a replacement array,
    /// object sections take a patch object.
    pub fn patch_section(section: Section, body: Value) -> Result<Self, ContentError> {
        match section.collection() {
            Some(Collection::Root) => match body {
                Value::Array(_) => Ok(Mutation::Replace(body)),
                _ => Err(ContentError::NotAnArray(section)),
            },
            _ => into_object(body).map(Mutation::Merge),
        }
    }
}

/// Result of applying a mutation to a section value.
#[derive(Debug, Clone)]
pub struct Applied {
    /// The validated section value after the write.
    pub value: Value,
    /// The section, item or removed item the write touched; `None` for a no-op.
    pub affected: Option<Value>,
}

enum Target {
    Whole,
    Item(String),
    Removed(Value),
    Nothing,
}

/// Apply `mutation` to a copy of `current`. The result is validated against
/// the section schema, so a rejected write leaves the caller's value untouched.
pub fn apply(section: Section, current: &Value, mutation: Mutation) -> Result<Applied, ContentError> {
    let mut next = current.clone();

    let target = match mutation {
        Mutation::Merge(patch) => {
            let object = next.as_object_mut().ok_or(ContentError::NotAnObject)?;
            object.extend(patch);
            Target::Whole
        }
        Mutation::Replace(value) => {
            next = value;
            Target::Whole
        }
        Mutation::Insert { mut item, at } => {
            let collection = section.collection().ok_or(ContentError::NotAnArray(section))?;
            let items = collection.items_mut(section, &mut next)?;
            let id = next_id(items, at);
            item.insert("id".to_string(), Value::String(id.clone()));
            match section {
                Section::Blog => {
                    item.insert("publishDate".to_string(), Value::String(iso_timestamp(at)));
                }
                _ => {
                    item.insert("createdAt".to_string(), Value::String(iso_timestamp(at)));
                }
            }
            items.push(Value::Object(item));
            Target::Item(id)
        }
        Mutation::MergeItem { id, mut patch } => {
            patch.remove("id");
            let Some(collection) = section.collection() else {
                return Ok(unchanged(current));
            };
            let items = collection.items_mut(section, &mut next)?;
            match items.iter_mut().find(|item| item_id(item) == Some(id.as_str())) {
                Some(item) => {
                    item.as_object_mut()
                        .ok_or(ContentError::Corrupt(section))?
                        .extend(patch);
                    Target::Item(id)
                }
                None => Target::Nothing,
            }
        }
        Mutation::RemoveItem { id } => {
            let Some(collection) = section.collection() else {
                return Ok(unchanged(current));
            };
            let items = collection.items_mut(section, &mut next)?;
            match items.iter().position(|item| item_id(item) == Some(id.as_str())) {
                Some(index) => Target::Removed(items.remove(index)),
                None => Target::Nothing,
            }
        }
    };

    if matches!(target, Target::Nothing) {
        return Ok(unchanged(current));
    }

    let value = schema::validate(section, next)?;
    let affected = match target {
        Target::Whole => Some(value.clone()),
        Target::Item(id) => find_item(section, &value, &id).cloned(),
        Target::Removed(item) => Some(item),
        Target::Nothing => None,
    };

    Ok(Applied { value, affected })
}

fn unchanged(current: &Value) -> Applied {
    Applied {
        value: current.clone(),
        affected: None,
    }
}
