//! Item Entity
//!
//! The unit of ordering on the dashboard: a script trigger, a health-check
//! monitor, or a group. Groups only ever live at root (single-level nesting).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::entity::Entity;
use super::placement::Placement;

/// Opaque, globally unique item identifier (shared across all kinds)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id for items created by the forms
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Item kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Trigger,
    Monitor,
    Group,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Trigger => "trigger",
            ItemKind::Monitor => "monitor",
            ItemKind::Group => "group",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "trigger" => Some(ItemKind::Trigger),
            "monitor" => Some(ItemKind::Monitor),
            "group" => Some(ItemKind::Group),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpreter used to run a trigger's script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    #[default]
    Shell,
    Javascript,
    Python,
}

/// What a monitor probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MonitorType {
    #[default]
    Process,
    Api,
    Port,
}

/// Last observed monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorStatus {
    Stopped,
    Running,
    Checking,
    Alert,
}

/// Script definition of an execution trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub script_type: ScriptType,
    pub script_content: String,
}

/// Probe configuration and last observation of a health-check monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    pub monitor_type: MonitorType,
    /// Process name, URL or `host:port` depending on `monitor_type`
    pub target: String,
    pub check_interval_secs: u32,
    pub expected_result: Option<String>,
    pub alert_on_failure: bool,
    pub is_active: bool,
    pub last_check_time: Option<i64>,
    pub last_status: Option<MonitorStatus>,
}

impl Monitor {
    pub fn new(monitor_type: MonitorType, target: impl Into<String>) -> Self {
        Self {
            monitor_type,
            target: target.into(),
            check_interval_secs: 60,
            expected_result: None,
            alert_on_failure: true,
            is_active: false,
            last_check_time: None,
            last_status: None,
        }
    }
}

/// Display metadata of a group (name and icon live on the item)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub collapsed: bool,
}

/// Kind-specific item fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Payload {
    Trigger(Trigger),
    Monitor(Monitor),
    Group(Group),
}

impl Payload {
    pub fn kind(&self) -> ItemKind {
        match self {
            Payload::Trigger(_) => ItemKind::Trigger,
            Payload::Monitor(_) => ItemKind::Monitor,
            Payload::Group(_) => ItemKind::Group,
        }
    }
}

/// A dashboard item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub icon: Option<String>,
    /// Containing group (None = root surface)
    pub container: Option<ItemId>,
    /// Position within the container
    pub position: u32,
    pub payload: Payload,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Item {
    fn with_payload(id: ItemId, name: String, payload: Payload) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id,
            name,
            icon: None,
            container: None,
            position: 0,
            payload,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a root-level trigger
    pub fn trigger(id: impl Into<ItemId>, name: impl Into<String>, trigger: Trigger) -> Self {
        Self::with_payload(id.into(), name.into(), Payload::Trigger(trigger))
    }

    /// Create a root-level monitor
    pub fn monitor(id: impl Into<ItemId>, name: impl Into<String>, monitor: Monitor) -> Self {
        Self::with_payload(id.into(), name.into(), Payload::Monitor(monitor))
    }

    /// Create a group; groups never have a container
    pub fn group(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self::with_payload(id.into(), name.into(), Payload::Group(Group::default()))
    }

    /// Place the item in a container at a position
    pub fn placed(mut self, container: Option<ItemId>, position: u32) -> Self {
        self.container = container;
        self.position = position;
        self
    }

    pub fn kind(&self) -> ItemKind {
        self.payload.kind()
    }

    pub fn is_group(&self) -> bool {
        self.kind() == ItemKind::Group
    }

    pub fn is_root(&self) -> bool {
        self.container.is_none()
    }

    pub fn placement(&self) -> Placement {
        Placement {
            container: self.container.clone(),
            position: self.position,
        }
    }

    pub fn set_placement(&mut self, placement: Placement) {
        self.container = placement.container;
        self.position = placement.position;
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
