//! Resource model for stardock
//!
//! A resource is one container instance as reported by the runtime. Resources
//! that carry a stack label are folded into a [`ResourceGroup`] by the
//! aggregator; everything else stays a standalone entry.

use std::fmt;

use serde::{Deserialize, Serialize};

pub type ResourceId = String;

/// Lifecycle state reported by the runtime for a single resource
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Running,
    Exited,
    Created,
    Paused,
    Restarting,
    Removing,
    Dead,
    #[default]
    Unknown,
}

impl LifecycleState {
    /// Parse the runtime's state string. Anything unrecognised is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "exited" => Self::Exited,
            "created" => Self::Created,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "removing" => Self::Removing,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Exited => "exited",
            Self::Created => "created",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Dead => "dead",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One published or exposed port of a resource
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub ip: Option<String>,
    pub private_port: u16,
    pub public_port: Option<u16>,
    pub protocol: Option<String>,
}

impl PortBinding {
    /// Render as `ip:public->private/proto`, dropping the parts that are absent.
    pub fn label(&self) -> String {
        let proto = match self.protocol.as_deref() {
            Some(p) if !p.is_empty() => format!("/{}", p),
            _ => String::new(),
        };

        match self.public_port {
            Some(public) => {
                let host = match self.ip.as_deref() {
                    Some(ip) if !ip.is_empty() => format!("{}:", ip),
                    _ => String::new(),
                };
                format!("{}{}->{}{}", host, public, self.private_port, proto)
            }
            None => format!("{}{}", self.private_port, proto),
        }
    }
}

pub fn ports_label(ports: &[PortBinding]) -> String {
    ports
        .iter()
        .map(PortBinding::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A resource exactly as the runtime client hands it over.
///
/// Every field except `id` may be missing; normalisation into a
/// [`ResourceRecord`] fills in defaults instead of failing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResource {
    pub id: String,
    pub names: Vec<String>,
    pub image: Option<String>,
    pub ports: Vec<PortBinding>,
    pub status: Option<String>,
    pub state: Option<String>,
    /// Value of the stack label, if the resource carries one
    pub group: Option<String>,
}

/// A normalised resource row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub id: ResourceId,
    pub display_name: String,
    pub image_ref: String,
    pub port_bindings: Vec<PortBinding>,
    pub status_text: String,
    pub lifecycle_state: LifecycleState,
    pub group_key: Option<String>,
}

const SHORT_ID_LEN: usize = 12;

impl ResourceRecord {
    pub fn from_raw(raw: RawResource) -> Self {
        let display_name = raw
            .names
            .first()
            .map(|n| n.trim_start_matches('/').to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| short_id(&raw.id));

        let group_key = raw
            .group
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        Self {
            id: raw.id,
            display_name,
            image_ref: raw.image.unwrap_or_default(),
            port_bindings: raw.ports,
            status_text: raw.status.unwrap_or_default(),
            lifecycle_state: raw
                .state
                .as_deref()
                .map(LifecycleState::parse)
                .unwrap_or_default(),
            group_key,
        }
    }

    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle_state.is_running()
    }
}

fn short_id(id: &str) -> String {
    let short: String = id.chars().take(SHORT_ID_LEN).collect();
    if short.is_empty() {
        "<unnamed>".to_string()
    } else {
        short
    }
}

/// Resources sharing one stack label
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub group_id: String,
    pub name: String,
    pub members: Vec<ResourceRecord>,
}

impl ResourceGroup {
    pub fn is_active(&self) -> bool {
        self.members.iter().any(ResourceRecord::is_running)
    }

    pub fn running_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_running()).count()
    }
}

/// A top-level row of a [`Snapshot`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    Standalone(ResourceRecord),
    Group(ResourceGroup),
}

impl Entry {
    /// The name entries are ordered by
    pub fn name(&self) -> &str {
        match self {
            Entry::Standalone(record) => &record.display_name,
            Entry::Group(group) => &group.name,
        }
    }

    /// Running standalone record, or a group with at least one running member
    pub fn is_active(&self) -> bool {
        match self {
            Entry::Standalone(record) => record.is_running(),
            Entry::Group(group) => group.is_active(),
        }
    }

    pub fn as_group(&self) -> Option<&ResourceGroup> {
        match self {
            Entry::Group(group) => Some(group),
            Entry::Standalone(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&ResourceRecord> {
        match self {
            Entry::Standalone(record) => Some(record),
            Entry::Group(_) => None,
        }
    }
}

/// One aggregated, sorted view of every resource at a point in time
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: Vec<Entry>,
}

impl Snapshot {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn group(&self, name: &str) -> Option<&ResourceGroup> {
        self.entries
            .iter()
            .filter_map(Entry::as_group)
            .find(|g| g.name == name)
    }

    /// Look a record up by id, whether standalone or inside a group
    pub fn find_record(&self, id: &str) -> Option<&ResourceRecord> {
        self.records().find(|r| r.id == id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.entries.iter().flat_map(|entry| match entry {
            Entry::Standalone(record) => std::slice::from_ref(record).iter(),
            Entry::Group(group) => group.members.iter(),
        })
    }

    pub fn record_count(&self) -> usize {
        self.records().count()
    }

    pub fn running_count(&self) -> usize {
        self.records().filter(|r| r.is_running()).count()
    }
}
