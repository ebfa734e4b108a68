//! Schema types for tree serialisation.
//!
//! These types provide a stable binary format independent of the runtime
//! types. The enum discriminants are the format's tag constants: new format
//! versions and node kinds add variants, existing variants are never
//! reordered or removed.
//!
//! Split conditions store only the predictor name; the decoder re-resolves
//! the full attribute through the model carried in the same payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Version-tagged payload for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Payload {
    /// Version 1 payload format.
    V1(PayloadV1),
}

/// Version 1 payload: the model descriptor plus the node tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadV1 {
    pub model: ModelSchema,
    pub root: NodeSchema,
}

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKindSchema {
    Numeric,
    Nominal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub name: String,
    pub kind: AttributeKindSchema,
    /// Nominal label → level index. The reverse vector is rebuilt on read.
    pub levels: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSchema {
    pub target: AttributeSchema,
    pub predictors: Vec<AttributeSchema>,
}

// ============================================================================
// Nodes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodeSchema {
    Leaf {
        stats: StatsSchema,
        weight_on_last_eval: f64,
        is_inactive: bool,
        depth: u32,
    },
    Split {
        condition: ConditionSchema,
        children: Vec<Option<NodeSchema>>,
        fallback: StatsSchema,
        depth: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConditionSchema {
    NominalMultiway { predictor: String },
    NumericBinary { predictor: String, threshold: f64 },
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StatsSchema {
    Classification {
        target: Vec<f64>,
        observers: BTreeMap<String, ClassObserverSchema>,
        active: bool,
    },
    Regression {
        target: TargetStatsSchema,
        observers: BTreeMap<String, RegObserverSchema>,
        active: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassObserverSchema {
    Nominal {
        counts: Vec<Vec<f64>>,
    },
    Numeric {
        per_class: Vec<GaussianSchema>,
        min: f64,
        max: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianSchema {
    pub weight: f64,
    pub mean: f64,
    pub m2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RegObserverSchema {
    Nominal {
        levels: Vec<TargetStatsSchema>,
    },
    Numeric {
        total: TargetStatsSchema,
        candidates: Vec<CandidateSchema>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TargetStatsSchema {
    pub weight: f64,
    pub sum: f64,
    pub sum_sq: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CandidateSchema {
    pub threshold: f64,
    pub left: TargetStatsSchema,
}
