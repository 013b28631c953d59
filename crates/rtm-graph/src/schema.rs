//! The declarative graph schema
//!
//! Pure data: a table of relationship kinds plus the level hierarchy
//! rules. Changing the table changes system behavior without touching
//! parser or builder code. The schema is supplied to the builder as
//! externally-loaded configuration; [`GraphSchema::standard`] is the
//! built-in table.

use crate::node::NodeKind;
use rtm_ident::ReqLevel;
use serde::{Deserialize, Serialize};

/// How a resolved (source, target) pair maps into the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    /// The source node's field names its ancestors: the target becomes
    /// the parent (a child declares `Implements:` upward)
    Up,
    /// The source node owns the target: the target becomes the child
    /// (a test owns the results produced by it)
    Down,
}

/// Which content field supplies a relation's target identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetField {
    /// Requirement references carrying this verb (`implements`, ...)
    Reference(String),
    /// The `targets` list of a code/test/journey record
    RecordTargets,
    /// A requirement's own assertion list (assertion-scoped identifiers)
    OwnAssertions,
    /// The test results keyed to this test's qualified id
    ResultsOfTest,
}

/// One relationship kind in the schema table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    /// Relationship name, used in diagnostics
    pub name: String,
    /// Node kinds allowed on the declaring side
    pub source_kinds: Vec<NodeKind>,
    /// Node kinds a target may resolve to
    pub target_kinds: Vec<NodeKind>,
    /// Which end of a resolved pair is the parent
    pub direction: EdgeDirection,
    /// Where target identifiers come from
    pub field: TargetField,
    /// Whether matched edges participate in coverage/metrics rollup
    pub rolls_up: bool,
    /// Whether this relationship satisfies the orphan check for the
    /// child-side kind (source kind for `Up`, target kind for `Down`)
    pub satisfies_orphan: bool,
    /// Whether edges of this relationship are evaluated against the
    /// level hierarchy rules
    pub level_checked: bool,
}

impl RelationSpec {
    /// Node kinds on the side that gains a parent through this relation
    #[must_use]
    pub fn child_kinds(&self) -> &[NodeKind] {
        match self.direction {
            EdgeDirection::Up => &self.source_kinds,
            EdgeDirection::Down => &self.target_kinds,
        }
    }
}

/// One allowed (source level -> target levels) pairing for level-checked
/// relationships
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRule {
    /// Level of the declaring requirement
    pub source: ReqLevel,
    /// Levels it may legally target
    pub allowed_targets: Vec<ReqLevel>,
}

/// The full schema: relationship table plus level rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSchema {
    /// Relationship kinds, interpreted in order by the builder
    pub relations: Vec<RelationSpec>,
    /// Level hierarchy rules for level-checked relationships
    pub level_rules: Vec<LevelRule>,
}

impl GraphSchema {
    /// The built-in relationship table
    #[must_use]
    pub fn standard() -> Self {
        Self {
            relations: vec![
                RelationSpec {
                    name: "contains".to_string(),
                    source_kinds: vec![NodeKind::Requirement],
                    target_kinds: vec![NodeKind::Assertion],
                    direction: EdgeDirection::Down,
                    field: TargetField::OwnAssertions,
                    rolls_up: true,
                    satisfies_orphan: true,
                    level_checked: false,
                },
                RelationSpec {
                    name: "implements".to_string(),
                    source_kinds: vec![NodeKind::Requirement],
                    target_kinds: vec![NodeKind::Requirement, NodeKind::Assertion],
                    direction: EdgeDirection::Up,
                    field: TargetField::Reference("implements".to_string()),
                    rolls_up: true,
                    satisfies_orphan: true,
                    level_checked: true,
                },
                RelationSpec {
                    name: "refines".to_string(),
                    source_kinds: vec![NodeKind::Requirement],
                    target_kinds: vec![NodeKind::Requirement, NodeKind::Assertion],
                    direction: EdgeDirection::Up,
                    field: TargetField::Reference("refines".to_string()),
                    rolls_up: false,
                    satisfies_orphan: true,
                    level_checked: false,
                },
                RelationSpec {
                    name: "addresses".to_string(),
                    source_kinds: vec![NodeKind::Requirement],
                    target_kinds: vec![NodeKind::Requirement, NodeKind::Assertion],
                    direction: EdgeDirection::Up,
                    field: TargetField::Reference("addresses".to_string()),
                    rolls_up: false,
                    satisfies_orphan: true,
                    level_checked: false,
                },
                RelationSpec {
                    name: "addresses".to_string(),
                    source_kinds: vec![NodeKind::Journey],
                    target_kinds: vec![NodeKind::Requirement, NodeKind::Assertion],
                    direction: EdgeDirection::Up,
                    field: TargetField::RecordTargets,
                    rolls_up: false,
                    satisfies_orphan: true,
                    level_checked: false,
                },
                RelationSpec {
                    name: "validates".to_string(),
                    source_kinds: vec![NodeKind::Code, NodeKind::Test],
                    target_kinds: vec![NodeKind::Requirement, NodeKind::Assertion],
                    direction: EdgeDirection::Up,
                    field: TargetField::RecordTargets,
                    rolls_up: true,
                    satisfies_orphan: true,
                    level_checked: false,
                },
                RelationSpec {
                    name: "produced-by".to_string(),
                    source_kinds: vec![NodeKind::Test],
                    target_kinds: vec![NodeKind::TestResult],
                    direction: EdgeDirection::Down,
                    field: TargetField::ResultsOfTest,
                    rolls_up: true,
                    satisfies_orphan: false,
                    level_checked: false,
                },
            ],
            level_rules: vec![
                LevelRule {
                    source: ReqLevel::Development,
                    allowed_targets: vec![ReqLevel::Operational, ReqLevel::Product],
                },
                LevelRule {
                    source: ReqLevel::Operational,
                    allowed_targets: vec![ReqLevel::Product],
                },
                LevelRule {
                    source: ReqLevel::Product,
                    allowed_targets: vec![],
                },
            ],
        }
    }

    /// Relation row by builder-assigned index
    ///
    /// # Panics
    /// Panics on an out-of-range index; edge relation indices are only
    /// ever produced by the builder against the same schema.
    #[inline]
    #[must_use]
    pub fn relation(&self, idx: usize) -> &RelationSpec {
        &self.relations[idx]
    }

    /// Whether the relation at `idx` participates in rollup
    #[inline]
    #[must_use]
    pub fn rolls_up(&self, idx: usize) -> bool {
        self.relations.get(idx).is_some_and(|r| r.rolls_up)
    }

    /// Whether an edge from `source` level to `target` level is allowed
    /// under the level rules
    ///
    /// Levels with no rule are unconstrained.
    #[must_use]
    pub fn level_allowed(&self, source: ReqLevel, target: ReqLevel) -> bool {
        match self.level_rules.iter().find(|r| r.source == source) {
            Some(rule) => rule.allowed_targets.contains(&target),
            None => true,
        }
    }

    /// Check the table for programming-contract violations
    ///
    /// This is the only fatal error class in the system: a schema that
    /// fails here indicates misconfiguration, not imperfect input data.
    ///
    /// # Errors
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.relations.is_empty() {
            return Err(SchemaError::EmptyTable);
        }
        for (i, rel) in self.relations.iter().enumerate() {
            if rel.source_kinds.is_empty() {
                return Err(SchemaError::EmptySourceKinds {
                    relation: rel.name.clone(),
                });
            }
            if rel.target_kinds.is_empty() {
                return Err(SchemaError::EmptyTargetKinds {
                    relation: rel.name.clone(),
                });
            }
            self.validate_field(rel)?;
            for other in &self.relations[..i] {
                if other.name == rel.name
                    && other.field == rel.field
                    && other.source_kinds == rel.source_kinds
                {
                    return Err(SchemaError::DuplicateRelation {
                        relation: rel.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Field/kind compatibility rules
    fn validate_field(&self, rel: &RelationSpec) -> Result<(), SchemaError> {
        let ok = match &rel.field {
            TargetField::Reference(_) => rel
                .source_kinds
                .iter()
                .all(|k| *k == NodeKind::Requirement),
            TargetField::RecordTargets => rel.source_kinds.iter().all(|k| {
                matches!(k, NodeKind::Code | NodeKind::Test | NodeKind::Journey)
            }),
            TargetField::OwnAssertions => {
                rel.source_kinds == [NodeKind::Requirement]
                    && rel.target_kinds == [NodeKind::Assertion]
                    && rel.direction == EdgeDirection::Down
            }
            TargetField::ResultsOfTest => {
                rel.source_kinds == [NodeKind::Test]
                    && rel.target_kinds == [NodeKind::TestResult]
                    && rel.direction == EdgeDirection::Down
            }
        };
        if ok {
            Ok(())
        } else {
            Err(SchemaError::FieldKindMismatch {
                relation: rel.name.clone(),
            })
        }
    }
}

impl Default for GraphSchema {
    fn default() -> Self {
        Self::standard()
    }
}

/// Programming-contract violations in a schema table
///
/// The one error category that aborts a build: the system itself is
/// misconfigured rather than the input data being imperfect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The table has no relations at all
    #[error("schema has no relations")]
    EmptyTable,

    /// A relation with no permitted source kinds
    #[error("relation '{relation}' has no source kinds")]
    EmptySourceKinds {
        /// The offending relation
        relation: String,
    },

    /// A relation with no permitted target kinds
    #[error("relation '{relation}' has no target kinds")]
    EmptyTargetKinds {
        /// The offending relation
        relation: String,
    },

    /// Two rows that would interpret the same field twice
    #[error("duplicate relation '{relation}'")]
    DuplicateRelation {
        /// The offending relation
        relation: String,
    },

    /// A target field incompatible with the declared kinds/direction
    #[error("relation '{relation}' pairs a target field with incompatible kinds")]
    FieldKindMismatch {
        /// The offending relation
        relation: String,
    },
}
