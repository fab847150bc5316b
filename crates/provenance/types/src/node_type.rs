use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concrete node classes of the provenance graph.
///
/// The hierarchy is closed: a node is either `Data` or a process, and a
/// process is either a calculation (`CalcJob`, `CalcFunction`) or a workflow
/// (`WorkChain`, `WorkFunction`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Data,
    CalcJob,
    CalcFunction,
    WorkChain,
    WorkFunction,
}

/// Abstract role a node plays at either end of a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCapability {
    Data,
    Calculation,
    Workflow,
}

/// Attributes every process node may still change after storing.
const PROCESS_UPDATABLE: &[&str] = &[
    "paused",
    "checkpoints",
    "exception",
    "exit_message",
    "exit_status",
    "process_label",
    "process_state",
    "process_status",
];

/// Extra updatable attributes of calculation jobs (scheduler bookkeeping).
const CALC_JOB_UPDATABLE: &[&str] = &[
    "state",
    "job_id",
    "scheduler_state",
    "scheduler_lastchecktime",
    "last_job_info",
    "detailed_job_info",
    "remote_workdir",
    "retrieve_list",
    "retrieve_temporary_list",
    "imported",
];

/// Scheduler resource options that do not change what a job computes.
const CALC_JOB_HASH_IGNORED: &[&str] = &[
    "queue_name",
    "account",
    "qos",
    "priority",
    "max_wallclock_seconds",
    "max_memory_kb",
];

impl NodeType {
    pub const ALL: [NodeType; 5] = [
        NodeType::Data,
        NodeType::CalcJob,
        NodeType::CalcFunction,
        NodeType::WorkChain,
        NodeType::WorkFunction,
    ];

    pub fn capability(&self) -> NodeCapability {
        match self {
            Self::Data => NodeCapability::Data,
            Self::CalcJob | Self::CalcFunction => NodeCapability::Calculation,
            Self::WorkChain | Self::WorkFunction => NodeCapability::Workflow,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data)
    }

    pub fn is_process(&self) -> bool {
        !self.is_data()
    }

    pub fn is_calculation(&self) -> bool {
        self.capability() == NodeCapability::Calculation
    }

    pub fn is_workflow(&self) -> bool {
        self.capability() == NodeCapability::Workflow
    }

    /// Only process nodes have a sealed state.
    pub fn is_sealable(&self) -> bool {
        self.is_process()
    }

    /// Workflows orchestrate other processes; reusing one from the cache
    /// would skip the calls it makes, so they never take part in caching.
    pub fn is_cachable(&self) -> bool {
        !self.is_workflow()
    }

    /// Type string used as class identity when none is given explicitly.
    pub fn default_type_string(&self) -> &'static str {
        match self {
            Self::Data => "data.Data.",
            Self::CalcJob => "process.calculation.calcjob.CalcJobNode.",
            Self::CalcFunction => "process.calculation.calcfunction.CalcFunctionNode.",
            Self::WorkChain => "process.workflow.workchain.WorkChainNode.",
            Self::WorkFunction => "process.workflow.workfunction.WorkFunctionNode.",
        }
    }

    /// Whether `key` may still be modified on a stored, unsealed node.
    pub fn is_updatable_attribute(&self, key: &str) -> bool {
        match self {
            Self::Data => false,
            Self::CalcJob => PROCESS_UPDATABLE.contains(&key) || CALC_JOB_UPDATABLE.contains(&key),
            _ => PROCESS_UPDATABLE.contains(&key),
        }
    }

    /// Whether `key` is left out of the content hash.
    pub fn is_hash_ignored_attribute(&self, key: &str) -> bool {
        self.is_updatable_attribute(key)
            || (matches!(self, Self::CalcJob) && CALC_JOB_HASH_IGNORED.contains(&key))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::CalcJob => "calc_job",
            Self::CalcFunction => "calc_function",
            Self::WorkChain => "work_chain",
            Self::WorkFunction => "work_function",
        }
    }
}

impl NodeCapability {
    /// Whether a node of `node_type` fulfils this role.
    pub fn accepts(&self, node_type: NodeType) -> bool {
        node_type.capability() == *self
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "Data"),
            Self::CalcJob => write!(f, "CalcJobNode"),
            Self::CalcFunction => write!(f, "CalcFunctionNode"),
            Self::WorkChain => write!(f, "WorkChainNode"),
            Self::WorkFunction => write!(f, "WorkFunctionNode"),
        }
    }
}

impl fmt::Display for NodeCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "Data"),
            Self::Calculation => write!(f, "CalculationNode"),
            Self::Workflow => write!(f, "WorkflowNode"),
        }
    }
}

impl FromStr for NodeType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseError::UnknownNodeType(s.to_string()))
    }
}
