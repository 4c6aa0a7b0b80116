//! Resource classes which back task stages.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Physical resource a stage is modeled as consuming.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Network,
    Cpu,
    Disk,
}

impl ResourceClass {
    /// All resource classes in a fixed order.
    pub const ALL: [ResourceClass; 3] = [ResourceClass::Network, ResourceClass::Cpu, ResourceClass::Disk];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Network => "network",
            ResourceClass::Cpu => "cpu",
            ResourceClass::Disk => "disk",
        }
    }
}

impl Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource classes of the input and output stages of a task.
///
/// The compute stage is always backed by [ResourceClass::Cpu].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResources {
    /// Resource class of the input stage.
    pub input: ResourceClass,
    /// Resource class of the output stage.
    pub output: ResourceClass,
}

impl StageResources {
    pub fn new(input: ResourceClass, output: ResourceClass) -> Self {
        StageResources { input, output }
    }
}

/// Preset task shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Reads input from disk and writes output to disk.
    Map,
    /// Receives input over the network and writes output to disk.
    Reduce,
}

impl TaskKind {
    /// Resource classes corresponding to the preset.
    pub fn resources(&self) -> StageResources {
        match self {
            TaskKind::Map => StageResources::new(ResourceClass::Disk, ResourceClass::Disk),
            TaskKind::Reduce => StageResources::new(ResourceClass::Network, ResourceClass::Disk),
        }
    }

    /// Name used in task summaries.
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::Map => "MapTask",
            TaskKind::Reduce => "ReduceTask",
        }
    }
}
