//! Quarantine record model and its persisted representation.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::sanitize::sanitize_component;

/// Timestamp format of the `Deleted` field.
pub const DELETED_AT_FORMAT: &str = "%m/%d/%y %H:%M";

/// Clock format that prefixes every generated id; followed by one tenths digit.
const ID_CLOCK_FORMAT: &str = "%m%d%y%H%M%S";

/// Kind of pipeline entity a record was created from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityType {
    SceneFiles,
    ShotDepartment,
    AssetDepartment,
    ShotTask,
    AssetTask,
    Product,
    ProductVersion,
    Media,
    MediaVersion,
    LibraryItem,
    /// Tag written by another plugin revision. Kept verbatim.
    Other(String),
}

/// How a record's files get back to where they came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreStrategy {
    /// Everything came out of one directory.
    SingleDirectory,
    /// Files were split across several storage locations.
    MultiLocation,
}

impl EntityType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::SceneFiles => "Scene Files",
            Self::ShotDepartment => "Shot Dept",
            Self::AssetDepartment => "Asset Dept",
            Self::ShotTask => "Shot Task",
            Self::AssetTask => "Asset Task",
            Self::Product => "Product",
            Self::ProductVersion => "Product Version",
            Self::Media => "Media",
            Self::MediaVersion => "Media Version",
            Self::LibraryItem => "Library Item",
            Self::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Scene Files" => Self::SceneFiles,
            "Shot Dept" => Self::ShotDepartment,
            "Asset Dept" => Self::AssetDepartment,
            "Shot Task" => Self::ShotTask,
            "Asset Task" => Self::AssetTask,
            "Product" => Self::Product,
            "Product Version" => Self::ProductVersion,
            "Media" => Self::Media,
            "Media Version" => Self::MediaVersion,
            "Library Item" => Self::LibraryItem,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn restore_strategy(&self) -> RestoreStrategy {
        match self {
            Self::Product | Self::ProductVersion | Self::Media | Self::MediaVersion => {
                RestoreStrategy::MultiLocation
            }
            _ => RestoreStrategy::SingleDirectory,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EntityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// Opaque identifier of a quarantine record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Id derived from the wall clock at tenth-of-a-second resolution.
    pub fn from_clock(now: NaiveDateTime) -> Self {
        let tenths = now.nanosecond() % 1_000_000_000 / 100_000_000;
        Self(format!("{}{}", now.format(ID_CLOCK_FORMAT), tenths))
    }

    /// Next id after this one, keeping the digit width. Non-numeric ids get a
    /// `_1` suffix instead.
    pub fn bumped(&self) -> Self {
        match self.0.parse::<u64>() {
            Ok(value) => Self(format!("{:0width$}", value + 1, width = self.0.len())),
            Err(_) => Self(format!("{}_1", self.0)),
        }
    }

    /// Fresh id that does not collide with any of `taken`.
    pub fn generate<'a>(now: NaiveDateTime, taken: impl Iterator<Item = &'a RecordId> + Clone) -> Self {
        let mut id = Self::from_clock(now);
        while taken.clone().any(|existing| existing == &id) {
            id = id.bumped();
        }
        id
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One source item handed to the engine for quarantine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    pub location_tag: String,
    pub source_path: PathBuf,
}

impl SourceItem {
    pub fn new(location_tag: impl Into<String>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            location_tag: location_tag.into(),
            source_path: source_path.into(),
        }
    }
}

/// Where a quarantined item lived before it was moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalLocation {
    #[serde(rename = "location")]
    pub location_tag: String,
    #[serde(rename = "path")]
    pub original_path: PathBuf,
}

impl From<&SourceItem> for OriginalLocation {
    fn from(item: &SourceItem) -> Self {
        Self {
            location_tag: item.location_tag.clone(),
            original_path: item.source_path.clone(),
        }
    }
}

/// A completed deletion event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarantineRecord {
    #[serde(rename = "Project", default)]
    pub project_name: String,
    #[serde(rename = "Type")]
    pub entity_type: EntityType,
    #[serde(rename = "Entity")]
    pub display_name: String,
    #[serde(rename = "Deleted", with = "deleted_at_format")]
    pub deleted_at: NaiveDateTime,
    #[serde(rename = "UID")]
    pub id: RecordId,
    #[serde(rename = "OriginalLocation", default)]
    pub original_locations: Vec<OriginalLocation>,
    #[serde(rename = "DeletedLocation")]
    pub quarantine_path: PathBuf,
}

impl QuarantineRecord {
    /// Where `location`'s item sits inside this record's quarantine directory.
    pub fn quarantined_item_path(&self, location: &OriginalLocation) -> Option<PathBuf> {
        location
            .original_path
            .file_name()
            .map(|name| self.location_dir(&location.location_tag).join(name))
    }

    pub fn location_dir(&self, location_tag: &str) -> PathBuf {
        self.quarantine_path.join(sanitize_component(location_tag))
    }

    pub fn restore_strategy(&self) -> RestoreStrategy {
        self.entity_type.restore_strategy()
    }

    /// True when the record was deleted strictly before `now - retention`.
    ///
    /// A window reaching past the earliest representable date expires nothing.
    pub fn is_expired(&self, now: NaiveDateTime, retention: Duration) -> bool {
        now.checked_sub_signed(retention)
            .is_some_and(|cutoff| self.deleted_at < cutoff)
    }

    /// The timestamp as shown in the settings table.
    pub fn deleted_label(&self) -> String {
        self.deleted_at.format(DELETED_AT_FORMAT).to_string()
    }

    pub fn is_under(&self, root: &Path) -> bool {
        self.quarantine_path.starts_with(root)
    }
}

/// Truncates to the minute so an in-memory timestamp equals its persisted form.
pub fn deletion_timestamp(now: NaiveDateTime) -> NaiveDateTime {
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

mod deleted_at_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DELETED_AT_FORMAT;

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(DELETED_AT_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, DELETED_AT_FORMAT).map_err(serde::de::Error::custom)
    }
}
