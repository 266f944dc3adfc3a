//! Declarative result-binding metadata.
//!
//! A [`ResultMap`] says which column feeds which record member, including
//! nested one-to-one associations and one-to-many collections:
//!
//! ```
//! use sqlmold::ResultMap;
//!
//! let map = ResultMap::new()
//!     .id("user_id", "ID")
//!     .result("user_name", "Name")
//!     .association("Address", ResultMap::new().result("city", "City"))
//!     .collection(
//!         "Orders",
//!         ResultMap::new().id("order_id", "ID").result("amount", "Amount"),
//!     );
//! assert_eq!(map.collections().len(), 1);
//! ```
//!
//! Before the first row is scanned the map is resolved against the target
//! record type and the column list into a plan of column-to-member slots.
//! Plans are cached per (record type, column set) for the lifetime of the
//! map.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use log::debug;

use crate::{
    binder::BindError,
    record::{Kind, RecordType},
};

/// One `column -> member` binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub column: String,
    pub member: String,
}

/// Nested map bound into a member of the parent record.
#[derive(Debug)]
pub struct Nested {
    pub member: String,
    pub map: ResultMap,
}

type PlanKey = (usize, Vec<String>);

#[derive(Debug, Default)]
pub struct ResultMap {
    id: Option<Binding>,
    results: Vec<Binding>,
    associations: Vec<Nested>,
    collections: Vec<Nested>,
    plans: RwLock<HashMap<PlanKey, Arc<RecordPlan>>>,
}

impl ResultMap {
    pub fn new() -> Self {
        ResultMap::default()
    }

    /// Primary key binding, used to merge rows of one-to-many joins.
    pub fn id(mut self, column: impl Into<String>, member: impl Into<String>) -> Self {
        self.id = Some(Binding {
            column: column.into(),
            member: member.into(),
        });
        self
    }

    pub fn result(mut self, column: impl Into<String>, member: impl Into<String>) -> Self {
        self.results.push(Binding {
            column: column.into(),
            member: member.into(),
        });
        self
    }

    /// One-to-one nested record stored in `member`.
    pub fn association(mut self, member: impl Into<String>, map: ResultMap) -> Self {
        self.associations.push(Nested {
            member: member.into(),
            map,
        });
        self
    }

    /// One-to-many nested records appended to the list in `member`.
    pub fn collection(mut self, member: impl Into<String>, map: ResultMap) -> Self {
        self.collections.push(Nested {
            member: member.into(),
            map,
        });
        self
    }

    pub fn id_binding(&self) -> Option<&Binding> {
        self.id.as_ref()
    }

    pub fn results(&self) -> &[Binding] {
        &self.results
    }

    pub fn associations(&self) -> &[Nested] {
        &self.associations
    }

    pub fn collections(&self) -> &[Nested] {
        &self.collections
    }

    /// Resolved plan for `ty` over `columns`, built on first use.
    pub(crate) fn plan(
        &self,
        ty: &Arc<RecordType>,
        columns: &[String],
    ) -> Result<Arc<RecordPlan>, BindError> {
        let key = (Arc::as_ptr(ty) as usize, columns.to_vec());
        if let Some(plan) = self
            .plans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(plan));
        }

        let plan = Arc::new(RecordPlan::build(self, ty, columns)?);
        debug!(
            "binder plan built for {} over {} columns",
            ty.name(),
            columns.len()
        );
        self.plans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&plan));
        Ok(plan)
    }
}

/// Column position feeding a member.
#[derive(Debug)]
pub(crate) struct Slot {
    pub column: usize,
    pub field: usize,
    pub kind: Kind,
}

#[derive(Debug)]
pub(crate) struct NestedPlan {
    pub field: usize,
    pub plan: RecordPlan,
}

/// A [`ResultMap`] resolved against one record type and column list.
///
/// Holds the type so the cache key's address stays valid.
#[derive(Debug)]
pub(crate) struct RecordPlan {
    pub ty: Arc<RecordType>,
    pub id: Option<usize>,
    pub slots: Vec<Slot>,
    pub associations: Vec<NestedPlan>,
    pub collections: Vec<NestedPlan>,
}

impl RecordPlan {
    fn build(map: &ResultMap, ty: &Arc<RecordType>, columns: &[String]) -> Result<Self, BindError> {
        let member_index = |member: &str| {
            ty.field_index(member).ok_or_else(|| BindError::UnknownMember {
                record: ty.name().to_string(),
                member: member.to_string(),
            })
        };

        let id = match &map.id {
            Some(binding) => {
                if !columns.contains(&binding.column) {
                    return Err(BindError::MissingIdColumn {
                        record: ty.name().to_string(),
                        column: binding.column.clone(),
                    });
                }
                Some(member_index(&binding.member)?)
            }
            None => None,
        };

        let mut slots = Vec::new();
        for binding in map.id.iter().chain(map.results.iter()) {
            let field = member_index(&binding.member)?;
            // Bindings for columns absent from this result set are skipped
            if let Some(column) = columns.iter().position(|c| *c == binding.column) {
                slots.push(Slot {
                    column,
                    field,
                    kind: ty.fields()[field].kind().clone(),
                });
            }
        }

        let mut associations = Vec::with_capacity(map.associations.len());
        for nested in &map.associations {
            let field = member_index(&nested.member)?;
            let Kind::Record(nested_ty) = ty.fields()[field].kind() else {
                return Err(BindError::AssociationNotRecord {
                    record: ty.name().to_string(),
                    member: nested.member.clone(),
                    kind: ty.fields()[field].kind().name(),
                });
            };
            associations.push(NestedPlan {
                field,
                plan: RecordPlan::build(&nested.map, nested_ty, columns)?,
            });
        }

        let mut collections = Vec::with_capacity(map.collections.len());
        for nested in &map.collections {
            let field = member_index(&nested.member)?;
            let element_ty = match ty.fields()[field].kind() {
                Kind::List(element) => match element.as_ref() {
                    Kind::Record(element_ty) => Some(element_ty),
                    _ => None,
                },
                _ => None,
            };
            let Some(element_ty) = element_ty else {
                return Err(BindError::CollectionNotList {
                    record: ty.name().to_string(),
                    member: nested.member.clone(),
                    kind: ty.fields()[field].kind().name(),
                });
            };
            collections.push(NestedPlan {
                field,
                plan: RecordPlan::build(&nested.map, element_ty, columns)?,
            });
        }

        Ok(RecordPlan {
            ty: Arc::clone(ty),
            id,
            slots,
            associations,
            collections,
        })
    }
}
