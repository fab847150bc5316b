use crate::error::ParseError;
use crate::node_type::NodeCapability;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Typed edges of the provenance graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Create,
    Return,
    InputCalc,
    InputWork,
    CallCalc,
    CallWork,
}

/// How many links of one type a node may have in one direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one link of the type, whatever its label.
    Unique,
    /// Any number of links, but each (type, label) pair at most once.
    UniquePair,
    /// Any number of links, but each (type, label, peer) triple at most once.
    UniqueTriple,
}

/// Static rule attached to each link type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkRule {
    pub source: NodeCapability,
    pub target: NodeCapability,
    pub outdegree: Cardinality,
    pub indegree: Cardinality,
}

const fn rule(
    source: NodeCapability,
    target: NodeCapability,
    outdegree: Cardinality,
    indegree: Cardinality,
) -> LinkRule {
    LinkRule {
        source,
        target,
        outdegree,
        indegree,
    }
}

use Cardinality::{Unique, UniquePair, UniqueTriple};
use NodeCapability::{Calculation, Data, Workflow};

static CALL_CALC: LinkRule = rule(Workflow, Calculation, UniqueTriple, Unique);
static CALL_WORK: LinkRule = rule(Workflow, Workflow, UniqueTriple, Unique);
static CREATE: LinkRule = rule(Calculation, Data, UniquePair, Unique);
static INPUT_CALC: LinkRule = rule(Data, Calculation, UniqueTriple, UniquePair);
static INPUT_WORK: LinkRule = rule(Data, Workflow, UniqueTriple, UniquePair);
static RETURN: LinkRule = rule(Workflow, Data, UniquePair, UniqueTriple);

impl LinkType {
    pub const ALL: [LinkType; 6] = [
        LinkType::Create,
        LinkType::Return,
        LinkType::InputCalc,
        LinkType::InputWork,
        LinkType::CallCalc,
        LinkType::CallWork,
    ];

    pub fn rule(&self) -> &'static LinkRule {
        match self {
            Self::Create => &CREATE,
            Self::Return => &RETURN,
            Self::InputCalc => &INPUT_CALC,
            Self::InputWork => &INPUT_WORK,
            Self::CallCalc => &CALL_CALC,
            Self::CallWork => &CALL_WORK,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::InputCalc | Self::InputWork)
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Self::CallCalc | Self::CallWork)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Return => "return",
            Self::InputCalc => "input_calc",
            Self::InputWork => "input_work",
            Self::CallCalc => "call_calc",
            Self::CallWork => "call_work",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique => write!(f, "unique"),
            Self::UniquePair => write!(f, "unique_pair"),
            Self::UniqueTriple => write!(f, "unique_triple"),
        }
    }
}

impl FromStr for LinkType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_ascii_lowercase();
        LinkType::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| ParseError::UnknownLinkType(s.to_string()))
    }
}
