//! Tablet records as reported by vtctld.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TopologyResult;

/// Role of a tablet in its shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TabletRole {
    #[default]
    Unknown,
    /// Accepts writes. Older vtctld versions report it as `MASTER`.
    Primary,
    Replica,
    /// Read-only serving tablet. `BATCH` is an alias.
    Rdonly,
    Spare,
    Experimental,
    Backup,
    Restore,
    Drained,
}

impl TabletRole {
    /// Decode the topodata protobuf enum value.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::Primary,
            2 => Self::Replica,
            3 => Self::Rdonly,
            4 => Self::Spare,
            5 => Self::Experimental,
            6 => Self::Backup,
            7 => Self::Restore,
            8 => Self::Drained,
            _ => Self::Unknown,
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "PRIMARY" | "MASTER" => Self::Primary,
            "REPLICA" => Self::Replica,
            "RDONLY" | "BATCH" => Self::Rdonly,
            "SPARE" => Self::Spare,
            "EXPERIMENTAL" => Self::Experimental,
            "BACKUP" => Self::Backup,
            "RESTORE" => Self::Restore,
            "DRAINED" => Self::Drained,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Primary => "PRIMARY",
            Self::Replica => "REPLICA",
            Self::Rdonly => "RDONLY",
            Self::Spare => "SPARE",
            Self::Experimental => "EXPERIMENTAL",
            Self::Backup => "BACKUP",
            Self::Restore => "RESTORE",
            Self::Drained => "DRAINED",
        }
    }
}

impl std::fmt::Display for TabletRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TabletRole {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// vtctld emits the role as the protobuf number; other tooling uses the name.
impl<'de> Deserialize<'de> for TabletRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(i64),
            Name(String),
        }

        Ok(match Option::<Raw>::deserialize(deserializer)? {
            Some(Raw::Code(code)) => Self::from_code(code),
            Some(Raw::Name(name)) => Self::from_name(&name),
            None => Self::Unknown,
        })
    }
}

/// A running vttablet and the MySQL instance behind it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tablet {
    #[serde(rename = "mysql_hostname", default, deserialize_with = "null_as_default")]
    pub host: String,
    #[serde(rename = "mysql_port", default, deserialize_with = "null_as_default")]
    pub port: i32,
    #[serde(rename = "type", default)]
    pub role: TabletRole,
}

impl Tablet {
    pub fn is_replica(&self) -> bool {
        self.role == TabletRole::Replica
    }

    /// `host:port` of the MySQL instance.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a vtctld tablet list. All or nothing: a malformed body yields an
/// error and no tablets. A JSON `null` body is an empty list.
pub fn parse_tablets(body: &[u8]) -> TopologyResult<Vec<Tablet>> {
    let tablets: Option<Vec<Tablet>> = serde_json::from_slice(body)?;
    Ok(tablets.unwrap_or_default())
}

/// Keep only `REPLICA` tablets, in their original order.
pub fn filter_replicas(tablets: Vec<Tablet>) -> Vec<Tablet> {
    tablets.into_iter().filter(Tablet::is_replica).collect()
}
