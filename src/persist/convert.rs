//! Conversion between runtime types and schema types.
//!
//! Encoding is total; decoding validates as it goes and re-resolves split
//! condition predictors against the decoded model.

use std::sync::Arc;

use crate::data::{Attribute, Model};
use crate::split::SplitCondition;
use crate::stats::{
    ClassObserver, ClassificationStats, GaussianEstimator, NominalClassObserver,
    NominalRegObserver, NumericClassObserver, NumericRegObserver, ObservationStats,
    RegObserver, RegressionStats, SplitCandidate, TargetStats,
};
use crate::tree::{LeafNode, Node, NodeId, SplitNode};

use super::error::PersistError;
use super::schema::{
    AttributeKindSchema, AttributeSchema, CandidateSchema, ClassObserverSchema, ConditionSchema,
    GaussianSchema, ModelSchema, NodeSchema, RegObserverSchema, StatsSchema, TargetStatsSchema,
};

// =============================================================================
// Model
// =============================================================================

pub(crate) fn model_to_schema(model: &Model) -> ModelSchema {
    ModelSchema {
        target: attribute_to_schema(model.target()),
        predictors: model
            .predictors()
            .iter()
            .map(|attr| attribute_to_schema(attr))
            .collect(),
    }
}

fn attribute_to_schema(attr: &Attribute) -> AttributeSchema {
    AttributeSchema {
        name: attr.name().to_owned(),
        kind: if attr.is_nominal() {
            AttributeKindSchema::Nominal
        } else {
            AttributeKindSchema::Numeric
        },
        levels: attr
            .values()
            .entries()
            .into_iter()
            .map(|(label, index)| (label, index as u32))
            .collect(),
    }
}

pub(crate) fn model_from_schema(schema: ModelSchema) -> Result<Model, PersistError> {
    let target = attribute_from_schema(schema.target)?;
    let predictors = schema
        .predictors
        .into_iter()
        .map(attribute_from_schema)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Model::new(target, predictors))
}

fn attribute_from_schema(schema: AttributeSchema) -> Result<Attribute, PersistError> {
    match schema.kind {
        AttributeKindSchema::Numeric => Ok(Attribute::numeric(schema.name)),
        AttributeKindSchema::Nominal => {
            let mut labels: Vec<Option<String>> = vec![None; schema.levels.len()];
            for (label, index) in schema.levels {
                let slot = labels.get_mut(index as usize).ok_or_else(|| {
                    PersistError::InvalidPayload(format!(
                        "level index {index} out of range for attribute {:?}",
                        schema.name
                    ))
                })?;
                *slot = Some(label);
            }
            let labels = labels
                .into_iter()
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| {
                    PersistError::InvalidPayload(format!(
                        "level indices of attribute {:?} are not contiguous",
                        schema.name
                    ))
                })?;
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            Ok(Attribute::nominal_with_levels(schema.name, &refs))
        }
    }
}

// =============================================================================
// Nodes
// =============================================================================

pub(crate) fn node_to_schema(nodes: &[Node], id: NodeId) -> NodeSchema {
    match &nodes[id as usize] {
        Node::Leaf(leaf) => NodeSchema::Leaf {
            stats: stats_to_schema(&leaf.stats),
            weight_on_last_eval: leaf.weight_on_last_eval,
            is_inactive: leaf.is_inactive,
            depth: leaf.depth,
        },
        Node::Split(split) => NodeSchema::Split {
            condition: condition_to_schema(&split.condition),
            children: split
                .children
                .iter()
                .map(|child| child.map(|c| node_to_schema(nodes, c)))
                .collect(),
            fallback: stats_to_schema(&split.fallback),
            depth: split.depth,
        },
    }
}

pub(crate) fn node_from_schema(
    schema: NodeSchema,
    model: &Model,
    nodes: &mut Vec<Node>,
) -> Result<NodeId, PersistError> {
    let node = match schema {
        NodeSchema::Leaf {
            stats,
            weight_on_last_eval,
            is_inactive,
            depth,
        } => Node::Leaf(LeafNode {
            stats: stats_from_schema(stats),
            weight_on_last_eval,
            is_inactive,
            depth,
        }),
        NodeSchema::Split {
            condition,
            children,
            fallback,
            depth,
        } => {
            let condition = condition_from_schema(condition, model)?;
            let children = children
                .into_iter()
                .map(|child| {
                    child
                        .map(|c| node_from_schema(c, model, nodes))
                        .transpose()
                })
                .collect::<Result<Vec<_>, _>>()?;
            Node::Split(SplitNode {
                condition,
                children,
                fallback: stats_from_schema(fallback),
                depth,
            })
        }
    };

    let id = nodes.len() as NodeId;
    nodes.push(node);
    Ok(id)
}

fn condition_to_schema(condition: &SplitCondition) -> ConditionSchema {
    match condition {
        SplitCondition::NominalMultiway { predictor } => ConditionSchema::NominalMultiway {
            predictor: predictor.name().to_owned(),
        },
        SplitCondition::NumericBinary {
            predictor,
            threshold,
        } => ConditionSchema::NumericBinary {
            predictor: predictor.name().to_owned(),
            threshold: *threshold,
        },
    }
}

fn condition_from_schema(
    schema: ConditionSchema,
    model: &Model,
) -> Result<SplitCondition, PersistError> {
    let resolve = |name: &str| -> Result<Arc<Attribute>, PersistError> {
        model
            .predictor(name)
            .cloned()
            .ok_or_else(|| PersistError::UnknownPredictor {
                name: name.to_owned(),
            })
    };

    match schema {
        ConditionSchema::NominalMultiway { predictor } => Ok(SplitCondition::NominalMultiway {
            predictor: resolve(&predictor)?,
        }),
        ConditionSchema::NumericBinary {
            predictor,
            threshold,
        } => Ok(SplitCondition::NumericBinary {
            predictor: resolve(&predictor)?,
            threshold,
        }),
    }
}

// =============================================================================
// Statistics
// =============================================================================

fn stats_to_schema(stats: &ObservationStats) -> StatsSchema {
    match stats {
        ObservationStats::Classification(stats) => StatsSchema::Classification {
            target: stats.target.clone(),
            observers: stats
                .observers
                .iter()
                .map(|(name, obs)| (name.clone(), class_observer_to_schema(obs)))
                .collect(),
            active: stats.active,
        },
        ObservationStats::Regression(stats) => StatsSchema::Regression {
            target: target_stats_to_schema(&stats.target),
            observers: stats
                .observers
                .iter()
                .map(|(name, obs)| (name.clone(), reg_observer_to_schema(obs)))
                .collect(),
            active: stats.active,
        },
    }
}

fn stats_from_schema(schema: StatsSchema) -> ObservationStats {
    match schema {
        StatsSchema::Classification {
            target,
            observers,
            active,
        } => ObservationStats::Classification(ClassificationStats {
            target,
            observers: observers
                .into_iter()
                .map(|(name, obs)| (name, class_observer_from_schema(obs)))
                .collect(),
            active,
        }),
        StatsSchema::Regression {
            target,
            observers,
            active,
        } => ObservationStats::Regression(RegressionStats {
            target: target_stats_from_schema(target),
            observers: observers
                .into_iter()
                .map(|(name, obs)| (name, reg_observer_from_schema(obs)))
                .collect(),
            active,
        }),
    }
}

fn class_observer_to_schema(observer: &ClassObserver) -> ClassObserverSchema {
    match observer {
        ClassObserver::Nominal(obs) => ClassObserverSchema::Nominal {
            counts: obs.counts.clone(),
        },
        ClassObserver::Numeric(obs) => ClassObserverSchema::Numeric {
            per_class: obs
                .per_class
                .iter()
                .map(|est| {
                    let (weight, mean, m2) = est.parts();
                    GaussianSchema { weight, mean, m2 }
                })
                .collect(),
            min: obs.min,
            max: obs.max,
        },
    }
}

fn class_observer_from_schema(schema: ClassObserverSchema) -> ClassObserver {
    match schema {
        ClassObserverSchema::Nominal { counts } => {
            ClassObserver::Nominal(NominalClassObserver { counts })
        }
        ClassObserverSchema::Numeric {
            per_class,
            min,
            max,
        } => ClassObserver::Numeric(NumericClassObserver {
            per_class: per_class
                .into_iter()
                .map(|g| GaussianEstimator::from_parts(g.weight, g.mean, g.m2))
                .collect(),
            min,
            max,
        }),
    }
}

fn reg_observer_to_schema(observer: &RegObserver) -> RegObserverSchema {
    match observer {
        RegObserver::Nominal(obs) => RegObserverSchema::Nominal {
            levels: obs.levels.iter().map(target_stats_to_schema).collect(),
        },
        RegObserver::Numeric(obs) => RegObserverSchema::Numeric {
            total: target_stats_to_schema(&obs.total),
            candidates: obs
                .candidates
                .iter()
                .map(|c| CandidateSchema {
                    threshold: c.threshold,
                    left: target_stats_to_schema(&c.left),
                })
                .collect(),
        },
    }
}

fn reg_observer_from_schema(schema: RegObserverSchema) -> RegObserver {
    match schema {
        RegObserverSchema::Nominal { levels } => RegObserver::Nominal(NominalRegObserver {
            levels: levels.into_iter().map(target_stats_from_schema).collect(),
        }),
        RegObserverSchema::Numeric { total, candidates } => {
            RegObserver::Numeric(NumericRegObserver {
                total: target_stats_from_schema(total),
                candidates: candidates
                    .into_iter()
                    .map(|c| SplitCandidate {
                        threshold: c.threshold,
                        left: target_stats_from_schema(c.left),
                    })
                    .collect(),
            })
        }
    }
}

fn target_stats_to_schema(stats: &TargetStats) -> TargetStatsSchema {
    let (weight, sum, sum_sq) = stats.parts();
    TargetStatsSchema {
        weight,
        sum,
        sum_sq,
    }
}

fn target_stats_from_schema(schema: TargetStatsSchema) -> TargetStats {
    TargetStats::from_parts(schema.weight, schema.sum, schema.sum_sq)
}
