//! Boolean filter trees.

use std::collections::{HashMap, HashSet};

use sqlshape_core::{DbSetting, ParameterBag, Result};

use crate::operator::Conjunction;
use crate::query_field::QueryField;
use crate::shape::{FilterShape, ShapeToken};

/// A node of a filter tree: predicates and child groups joined by one
/// conjunction, optionally negated.
///
/// Every traversal is iterative, so tree depth is bounded only by memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryGroup {
    conjunction: Conjunction,
    fields: Vec<QueryField>,
    groups: Vec<QueryGroup>,
    is_not: bool,
}

impl QueryGroup {
    /// An empty group (no filter).
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            fields: Vec::new(),
            groups: Vec::new(),
            is_not: false,
        }
    }

    /// An empty AND group.
    pub fn empty() -> Self {
        Self::default()
    }

    /// AND of the given predicates.
    pub fn and(fields: Vec<QueryField>) -> Self {
        Self::new(Conjunction::And).with_fields(fields)
    }

    /// OR of the given predicates.
    pub fn or(fields: Vec<QueryField>) -> Self {
        Self::new(Conjunction::Or).with_fields(fields)
    }

    /// Append a predicate.
    pub fn with_field(mut self, field: QueryField) -> Self {
        self.fields.push(field);
        self
    }

    /// Append several predicates.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = QueryField>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Append a child group.
    pub fn with_group(mut self, group: QueryGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Toggle negation (`NOT (...)`).
    pub fn negate(mut self) -> Self {
        self.is_not = !self.is_not;
        self
    }

    pub(crate) fn push_field(&mut self, field: QueryField) {
        self.fields.push(field);
    }

    pub(crate) fn push_group(&mut self, group: QueryGroup) {
        self.groups.push(group);
    }

    pub(crate) fn set_not(&mut self, is_not: bool) {
        self.is_not = is_not;
    }

    pub(crate) fn into_parts(mut self) -> (Vec<QueryField>, Vec<QueryGroup>) {
        (
            std::mem::take(&mut self.fields),
            std::mem::take(&mut self.groups),
        )
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    /// Predicates owned directly by this node.
    pub fn fields(&self) -> &[QueryField] {
        &self.fields
    }

    /// Child groups owned directly by this node.
    pub fn groups(&self) -> &[QueryGroup] {
        &self.groups
    }

    pub fn is_not(&self) -> bool {
        self.is_not
    }

    /// True when the whole tree holds no predicate.
    pub fn is_empty(&self) -> bool {
        self.get_fields().is_empty()
    }

    /// Every predicate of the tree, in rendering order.
    pub fn get_fields(&self) -> Vec<&QueryField> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(group) = stack.pop() {
            out.extend(group.fields.iter());
            stack.extend(group.groups.iter().rev());
        }
        out
    }

    /// Mutable access to every predicate, in rendering order.
    fn fields_mut(&mut self) -> Vec<&mut QueryField> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(group) = stack.pop() {
            let QueryGroup { fields, groups, .. } = group;
            out.extend(fields.iter_mut());
            stack.extend(groups.iter_mut().rev());
        }
        out
    }

    /// Give repeated field names distinct parameter names within this tree.
    ///
    /// The first occurrence keeps the field-derived name, later ones get
    /// `_1`, `_2`, … A name is free only when none of the names it expands
    /// to (`_Left`, `_In_0`, …) is bound by another predicate. Pinned names
    /// are reserved and never changed. Names are compared case-insensitively.
    pub fn fix_parameters(&mut self) {
        let fields = self.fields_mut();
        let mut used = HashSet::new();
        for field in fields.iter().filter(|f| f.is_pinned()) {
            reserve(&mut used, field, field.parameter_name());
        }

        for field in fields {
            if field.is_pinned() {
                continue;
            }
            field.reset();
            let candidate = free_name(field, field.parameter_name(), &used);
            reserve(&mut used, field, &candidate);
            field.rename(candidate);
        }
    }

    /// Unpin and re-derive every parameter name, then re-apply per-tree
    /// uniqueness.
    pub fn reset(&mut self) {
        for field in self.fields_mut() {
            field.reset();
        }
        self.fix_parameters();
    }

    /// Prefix every non-pinned parameter name.
    pub fn prefix_parameters(&mut self, prefix: &str) {
        for field in self.fields_mut() {
            if !field.is_pinned() {
                let name = format!("{prefix}{}", field.parameter_name());
                field.rename(name);
            }
        }
    }

    /// Make parameter names unique across groups combined into one command.
    ///
    /// A parameter that binds a name also bound by another group is
    /// rewritten to `T{index}_{name}` (further suffixed if that is taken
    /// too). Names that collide only inside their own group are left alone.
    /// Running the pass twice is a no-op.
    pub fn fix_for_query_multiple(groups: &mut [QueryGroup]) {
        let mut owners: HashMap<String, HashSet<usize>> = HashMap::new();
        for (index, group) in groups.iter().enumerate() {
            for field in group.get_fields() {
                for name in field.expanded_names(field.parameter_name()) {
                    owners
                        .entry(name.to_ascii_lowercase())
                        .or_default()
                        .insert(index);
                }
            }
        }
        let mut used: HashSet<String> = owners.keys().cloned().collect();

        for (index, group) in groups.iter_mut().enumerate() {
            for field in group.fields_mut() {
                if field.is_pinned() {
                    continue;
                }
                let shared = field
                    .expanded_names(field.parameter_name())
                    .iter()
                    .any(|n| owners.get(&n.to_ascii_lowercase()).is_some_and(|o| o.len() > 1));
                if !shared {
                    continue;
                }
                let base = format!("T{index}_{}", field.parameter_name());
                let candidate = free_name(field, &base, &used);
                reserve(&mut used, field, &candidate);
                field.rename(candidate);
            }
        }
    }

    /// Value-free shape of the tree.
    pub fn shape(&self) -> FilterShape {
        let mut tokens = Vec::new();
        let mut stack = vec![self];
        while let Some(group) = stack.pop() {
            tokens.push(ShapeToken::Group {
                conjunction: group.conjunction,
                is_not: group.is_not,
                fields: group.fields.len(),
                groups: group.groups.len(),
            });
            tokens.extend(group.fields.iter().map(|f| ShapeToken::Field(f.shape())));
            stack.extend(group.groups.iter().rev());
        }
        FilterShape::from_tokens(tokens)
    }

    /// Render the tree as a boolean SQL expression; empty for no filter.
    pub fn get_string(&self, setting: &DbSetting) -> String {
        self.shape().render(setting)
    }

    /// Parameter bag keyed by the current parameter names.
    pub fn map_parameters(&self) -> Result<ParameterBag> {
        let mut bag = ParameterBag::new();
        for field in self.get_fields() {
            for (name, value) in field.parameters() {
                bag.insert(name, value)?;
            }
        }
        Ok(bag)
    }

    /// One parameter bag covering several groups, in group order.
    pub fn as_mapped_object(groups: &[QueryGroup]) -> Result<ParameterBag> {
        let mut bag = ParameterBag::new();
        for group in groups {
            bag.extend(group.map_parameters()?)?;
        }
        Ok(bag)
    }
}

/// `base`, or the first `base_N`, whose expanded names are all unused.
fn free_name(field: &QueryField, base: &str, used: &HashSet<String>) -> String {
    let taken = |name: &str| {
        field
            .expanded_names(name)
            .iter()
            .any(|n| used.contains(&n.to_ascii_lowercase()))
    };
    let mut candidate = base.to_string();
    let mut n = 0;
    while taken(&candidate) {
        n += 1;
        candidate = format!("{base}_{n}");
    }
    candidate
}

fn reserve(used: &mut HashSet<String>, field: &QueryField, base: &str) {
    used.extend(
        field
            .expanded_names(base)
            .into_iter()
            .map(|n| n.to_ascii_lowercase()),
    );
}

impl Drop for QueryGroup {
    // Children are detached onto a stack so no drop recurses into a subtree.
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.groups);
        while let Some(mut group) = stack.pop() {
            stack.append(&mut group.groups);
        }
    }
}
