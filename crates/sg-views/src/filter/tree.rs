//! Hierarchical tri-state option tree for the column filter popup
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Temporal
//! columns are grouped Year -> Month -> Day (-> Hour -> Minute -> Second
//! with time resolution); every other type is a flat list under the root.

use ahash::{AHashMap, AHashSet};
use sg_core::consts::{
    month_name, ADD_CURRENT_TEXT, BLANKS_TEXT, INVALID_TEXT, NO_MATCHES_TEXT, SELECT_ALL_RESULTS_TEXT,
    SELECT_ALL_TEXT, UNKNOWN_TEXT,
};
use sg_core::format::format_grouped_fixed;
use sg_core::{ActionStatus, CellValue, DataType, FilterBucket, Sentinel, TypedValueFormatter};

/// Index of a node in its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckState {
    Unchecked,
    PartiallyChecked,
    Checked,
}

/// What a node stands for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    SelectAll,
    AddToCurrent,
    Year(i32),
    Month(u32),
    Day(u32),
    Hour(u32),
    Minute(u32),
    Second(u32),
    Value(CellValue),
    Blanks,
    Unknown,
    Invalid,
    NoMatches,
}

impl NodeKind {
    fn is_pseudo(&self) -> bool {
        matches!(self, NodeKind::Root | NodeKind::SelectAll | NodeKind::AddToCurrent | NodeKind::NoMatches)
    }
}

/// One entry of the option tree
#[derive(Debug, Clone)]
pub struct FilterNode {
    pub kind: NodeKind,
    pub label: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    state: CheckState,
    checkable: bool,
    /// Raw values represented by a data leaf
    values: Vec<CellValue>,
}

impl FilterNode {
    fn new(kind: NodeKind, label: impl Into<String>, parent: Option<NodeId>, checkable: bool) -> Self {
        Self {
            kind,
            label: label.into(),
            parent,
            children: Vec::new(),
            state: CheckState::Checked,
            checkable,
            values: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn state(&self) -> CheckState {
        self.state
    }

    pub fn is_checkable(&self) -> bool {
        self.checkable
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

/// Option tree built from a column's candidate values
#[derive(Debug, Clone)]
pub struct FilterOptionTree {
    nodes: Vec<FilterNode>,
    dtype: DataType,
    select_all: Option<NodeId>,
    add_to_current: Option<NodeId>,
    blanks: Option<NodeId>,
    unknown: Option<NodeId>,
    invalid: Option<NodeId>,
}

impl FilterOptionTree {
    const ROOT: NodeId = NodeId(0);

    /// Build the tree for `values` (distinct, already ordered for display)
    ///
    /// With a `current_filter` and no active search, nodes whose values the
    /// filter excludes start unchecked so reopening reproduces the filter.
    pub fn build(
        values: &[CellValue],
        dtype: DataType,
        current_filter: Option<&[CellValue]>,
        search_active: bool,
        time_resolution: bool,
    ) -> Self {
        let mut tree = Self {
            nodes: vec![FilterNode::new(NodeKind::Root, "root", None, false)],
            dtype,
            select_all: None,
            add_to_current: None,
            blanks: None,
            unknown: None,
            invalid: None,
        };

        if values.is_empty() {
            tree.push(Self::ROOT, FilterNode::new(NodeKind::NoMatches, NO_MATCHES_TEXT, Some(Self::ROOT), false));
            return tree;
        }

        let filter = current_filter.filter(|f| !f.is_empty());
        let accepted: Option<AHashSet<&CellValue>> = filter.map(|f| f.iter().collect());
        let excluded = |value: &CellValue| match &accepted {
            Some(set) if !search_active => !set.contains(value),
            _ => false,
        };

        let select_all_label = if search_active { SELECT_ALL_RESULTS_TEXT } else { SELECT_ALL_TEXT };
        tree.select_all = Some(tree.push(
            Self::ROOT,
            FilterNode::new(NodeKind::SelectAll, select_all_label, Some(Self::ROOT), true),
        ));
        if filter.is_some() {
            let mut node = FilterNode::new(NodeKind::AddToCurrent, ADD_CURRENT_TEXT, Some(Self::ROOT), true);
            node.state = CheckState::Unchecked;
            tree.add_to_current = Some(tree.push(Self::ROOT, node));
        }

        let (mut has_blanks, mut has_unknown, mut has_invalid) = (false, false, false);
        let mut lookup: AHashMap<(NodeId, NodeKind), NodeId> = AHashMap::new();

        for value in values {
            let path = match TypedValueFormatter::filter_bucket(value, dtype, time_resolution) {
                FilterBucket::Blank => {
                    has_blanks = true;
                    continue;
                }
                FilterBucket::Unknown => {
                    has_unknown = true;
                    continue;
                }
                FilterBucket::Invalid => {
                    has_invalid = true;
                    continue;
                }
                FilterBucket::Day { year, month, day } => {
                    vec![NodeKind::Year(year), NodeKind::Month(month), NodeKind::Day(day)]
                }
                FilterBucket::Moment { year, month, day, hour, minute, second } => vec![
                    NodeKind::Year(year),
                    NodeKind::Month(month),
                    NodeKind::Day(day),
                    NodeKind::Hour(hour),
                    NodeKind::Minute(minute),
                    NodeKind::Second(second),
                ],
                FilterBucket::Value(v) => vec![NodeKind::Value(v)],
            };

            let mut parent = Self::ROOT;
            let mut created = false;
            for kind in path {
                parent = match lookup.get(&(parent, kind.clone())) {
                    Some(&existing) => existing,
                    None => {
                        let label = tree.label_for(&kind);
                        let id = tree.push(parent, FilterNode::new(kind.clone(), label, Some(parent), true));
                        lookup.insert((parent, kind), id);
                        created = true;
                        id
                    }
                };
            }

            // A leaf standing for several values is checked if any of them is accepted
            let leaf = &mut tree.nodes[parent.0];
            let included = !excluded(value);
            if created {
                leaf.state = if included { CheckState::Checked } else { CheckState::Unchecked };
            } else if included {
                leaf.state = CheckState::Checked;
            }
            leaf.values.push(value.clone());
        }

        if has_unknown {
            let in_filter = filter
                .map(|f| f.iter().any(|v| Sentinel::classify(v) == Some(Sentinel::Unknown)))
                .unwrap_or(true);
            tree.unknown = Some(tree.push_pseudo_leaf(NodeKind::Unknown, UNKNOWN_TEXT, in_filter || search_active));
        }
        if has_blanks {
            let in_filter = filter.map(|f| f.iter().any(CellValue::is_null)).unwrap_or(true);
            tree.blanks = Some(tree.push_pseudo_leaf(NodeKind::Blanks, BLANKS_TEXT, in_filter || search_active));
        }
        if has_invalid {
            let in_filter = filter
                .map(|f| f.iter().any(|v| Sentinel::classify(v) == Some(Sentinel::Invalid)))
                .unwrap_or(true);
            tree.invalid = Some(tree.push_pseudo_leaf(NodeKind::Invalid, INVALID_TEXT, in_filter || search_active));
        }

        // Parents are always created before their children, so a reverse
        // sweep visits every child before its parent
        for idx in (1..tree.nodes.len()).rev() {
            if !tree.nodes[idx].children.is_empty() {
                tree.nodes[idx].state = tree.aggregate(NodeId(idx));
            }
        }
        tree.update_select_all();
        tree
    }

    fn push(&mut self, parent: NodeId, node: FilterNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push_pseudo_leaf(&mut self, kind: NodeKind, label: &str, checked: bool) -> NodeId {
        let mut node = FilterNode::new(kind, label, Some(Self::ROOT), true);
        node.state = if checked { CheckState::Checked } else { CheckState::Unchecked };
        self.push(Self::ROOT, node)
    }

    fn label_for(&self, kind: &NodeKind) -> String {
        match kind {
            NodeKind::Year(y) => y.to_string(),
            NodeKind::Month(m) => month_name(*m).map(str::to_string).unwrap_or_else(|| m.to_string()),
            NodeKind::Day(v) | NodeKind::Hour(v) | NodeKind::Minute(v) | NodeKind::Second(v) => v.to_string(),
            NodeKind::Value(value) => value_label(value, self.dtype),
            _ => String::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn dtype(&self) -> DataType {
        self.dtype
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> Option<&FilterNode> {
        self.nodes.get(id.0)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn state(&self, id: NodeId) -> Option<CheckState> {
        self.nodes.get(id.0).map(|n| n.state)
    }

    pub fn label(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.0).map(|n| n.label.as_str())
    }

    pub fn select_all_node(&self) -> Option<NodeId> {
        self.select_all
    }

    pub fn add_to_current_node(&self) -> Option<NodeId> {
        self.add_to_current
    }

    pub fn blanks_node(&self) -> Option<NodeId> {
        self.blanks
    }

    pub fn unknown_node(&self) -> Option<NodeId> {
        self.unknown
    }

    pub fn invalid_node(&self) -> Option<NodeId> {
        self.invalid
    }

    /// Follow display labels down from the root
    pub fn find_path(&self, labels: &[&str]) -> Option<NodeId> {
        let mut current = Self::ROOT;
        for label in labels {
            current = *self
                .children(current)
                .iter()
                .find(|id| self.nodes[id.0].label == *label)?;
        }
        Some(current)
    }

    pub fn is_select_all_checked(&self) -> bool {
        self.select_all.and_then(|id| self.state(id)) == Some(CheckState::Checked)
    }

    pub fn is_add_to_current_checked(&self) -> bool {
        self.add_to_current.and_then(|id| self.state(id)) == Some(CheckState::Checked)
    }

    /// Flip a node; a partially checked node becomes checked
    pub fn toggle(&mut self, id: NodeId) {
        let checked = self.state(id) != Some(CheckState::Checked);
        self.set_checked(id, checked);
    }

    /// Check or uncheck a node, cascading down and recomputing ancestors
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        if !node.checkable {
            return;
        }
        let state = if checked { CheckState::Checked } else { CheckState::Unchecked };

        if Some(id) == self.select_all {
            for idx in 1..self.nodes.len() {
                let node = &mut self.nodes[idx];
                if node.checkable && Some(NodeId(idx)) != self.add_to_current {
                    node.state = state;
                }
            }
            return;
        }

        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let node = &mut self.nodes[next.0];
            if node.checkable {
                node.state = state;
            }
            stack.extend(node.children.iter().copied());
        }

        let mut ancestor = self.nodes[id.0].parent;
        while let Some(parent) = ancestor {
            if parent == Self::ROOT {
                break;
            }
            self.nodes[parent.0].state = self.aggregate(parent);
            ancestor = self.nodes[parent.0].parent;
        }
        self.update_select_all();
    }

    fn aggregate(&self, id: NodeId) -> CheckState {
        combine(self.nodes[id.0].children.iter().map(|c| self.nodes[c.0].state))
    }

    /// Select All mirrors the data nodes under the root
    fn update_select_all(&mut self) {
        let Some(select_all) = self.select_all else {
            return;
        };
        let state = combine(
            self.nodes[Self::ROOT.0]
                .children
                .iter()
                .filter(|id| Some(**id) != self.select_all && Some(**id) != self.add_to_current)
                .map(|id| self.nodes[id.0].state),
        );
        self.nodes[select_all.0].state = state;
    }

    /// Accepted values selected in the tree
    ///
    /// Blanks yield `Null`; Unknown and Invalid expand into their sentinel
    /// values; temporal leaves yield the full values they stand for.
    pub fn get_checked_values(&self) -> Vec<CellValue> {
        let mut out = Vec::new();
        for &id in self.children(Self::ROOT) {
            let node = &self.nodes[id.0];
            if node.kind.is_pseudo() {
                continue;
            }
            match node.kind {
                NodeKind::Blanks => {
                    if node.state == CheckState::Checked {
                        out.push(CellValue::Null);
                    }
                }
                NodeKind::Unknown => {
                    if node.state == CheckState::Checked {
                        out.extend(Sentinel::Unknown.values(self.dtype));
                    }
                }
                NodeKind::Invalid => {
                    if node.state == CheckState::Checked {
                        out.extend(Sentinel::Invalid.values(self.dtype));
                    }
                }
                _ if node.state == CheckState::Unchecked => {}
                _ => self.collect_checked_leaves(id, &mut out),
            }
        }
        out
    }

    fn collect_checked_leaves(&self, id: NodeId, out: &mut Vec<CellValue>) {
        let node = &self.nodes[id.0];
        if node.children.is_empty() {
            if node.state == CheckState::Checked {
                out.extend(node.values.iter().cloned());
            }
            return;
        }
        if node.state == CheckState::Unchecked {
            return;
        }
        for &child in &node.children {
            self.collect_checked_leaves(child, out);
        }
    }
}

fn combine(states: impl Iterator<Item = CheckState>) -> CheckState {
    let (mut all_checked, mut all_unchecked) = (true, true);
    for state in states {
        all_checked &= state == CheckState::Checked;
        all_unchecked &= state == CheckState::Unchecked;
    }
    if all_checked {
        CheckState::Checked
    } else if all_unchecked {
        CheckState::Unchecked
    } else {
        CheckState::PartiallyChecked
    }
}

/// Label of a flat value node
fn value_label(value: &CellValue, dtype: DataType) -> String {
    match (dtype, value) {
        (DataType::Float, v) if v.as_f64().is_some() => format!("{:.2}", v.as_f64().unwrap_or_default()),
        (DataType::Currency, v) if v.as_f64().is_some() => {
            format!("$ {}", format_grouped_fixed(v.as_f64().unwrap_or_default(), 2))
        }
        (DataType::Status, CellValue::Int(code)) => ActionStatus::from_code(*code)
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| code.to_string()),
        (_, other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sg_core::value::{SORT_ASC_UNKNOWN_DATE, UNKNOWN_DATE};

    fn day(y: i32, m: u32, d: u32) -> CellValue {
        CellValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn dates() -> Vec<CellValue> {
        vec![day(2024, 1, 2), day(2024, 1, 1), CellValue::Date(*UNKNOWN_DATE)]
    }

    #[test]
    fn test_date_tree_shape() {
        let tree = FilterOptionTree::build(&dates(), DataType::Date, None, false, false);
        let labels: Vec<&str> = tree.children(tree.root()).iter().filter_map(|id| tree.label(*id)).collect();
        assert_eq!(labels, vec![SELECT_ALL_TEXT, "2024", UNKNOWN_TEXT]);

        let month = tree.find_path(&["2024", "January"]).unwrap();
        assert_eq!(tree.children(month).len(), 2);
        assert!(tree.is_select_all_checked());
        assert!(tree.add_to_current_node().is_none());
    }

    #[test]
    fn test_unchecking_a_day_is_partial_up_the_tree() {
        let mut tree = FilterOptionTree::build(&dates(), DataType::Date, None, false, false);
        let first = tree.find_path(&["2024", "January", "1"]).unwrap();
        tree.set_checked(first, false);

        let month = tree.find_path(&["2024", "January"]).unwrap();
        let year = tree.find_path(&["2024"]).unwrap();
        assert_eq!(tree.state(month), Some(CheckState::PartiallyChecked));
        assert_eq!(tree.state(year), Some(CheckState::PartiallyChecked));
        assert_eq!(tree.state(tree.select_all_node().unwrap()), Some(CheckState::PartiallyChecked));

        let second = tree.find_path(&["2024", "January", "2"]).unwrap();
        tree.set_checked(second, false);
        assert_eq!(tree.state(month), Some(CheckState::Unchecked));
        assert_eq!(tree.state(year), Some(CheckState::Unchecked));
        assert_eq!(tree.state(tree.select_all_node().unwrap()), Some(CheckState::PartiallyChecked));
    }

    #[test]
    fn test_three_children_partial_then_checked() {
        let values: Vec<CellValue> = ["a", "b", "c"].iter().map(|s| CellValue::text(*s)).collect();
        let mut tree = FilterOptionTree::build(&values, DataType::Text, None, false, false);
        let select_all = tree.select_all_node().unwrap();
        tree.set_checked(select_all, false);
        assert_eq!(tree.state(select_all), Some(CheckState::Unchecked));

        let ids: Vec<NodeId> = tree.children(tree.root())[1..].to_vec();
        tree.set_checked(ids[0], true);
        tree.set_checked(ids[1], true);
        assert_eq!(tree.state(select_all), Some(CheckState::PartiallyChecked));
        tree.set_checked(ids[2], true);
        assert_eq!(tree.state(select_all), Some(CheckState::Checked));
    }

    #[test]
    fn test_round_trip_reproduces_filter() {
        let values = vec![day(2024, 1, 2), day(2024, 1, 1), day(2023, 5, 9), CellValue::Null];
        let filter = vec![day(2024, 1, 1), day(2023, 5, 9), CellValue::Null];
        let tree = FilterOptionTree::build(&values, DataType::Date, Some(&filter), false, false);

        assert_eq!(tree.get_checked_values(), filter);
        assert_eq!(tree.state(tree.add_to_current_node().unwrap()), Some(CheckState::Unchecked));
        assert_eq!(tree.state(tree.select_all_node().unwrap()), Some(CheckState::PartiallyChecked));
    }

    #[test]
    fn test_unknown_expands_to_both_sentinels() {
        let tree = FilterOptionTree::build(&dates(), DataType::Date, None, false, false);
        let checked = tree.get_checked_values();
        assert!(checked.contains(&CellValue::Date(*UNKNOWN_DATE)));
        assert!(checked.contains(&CellValue::Date(*SORT_ASC_UNKNOWN_DATE)));
        assert_eq!(checked.len(), 4);
    }

    #[test]
    fn test_select_all_skips_add_to_current() {
        let values = vec![CellValue::Int(1), CellValue::Int(2)];
        let filter = vec![CellValue::Int(1)];
        let mut tree = FilterOptionTree::build(&values, DataType::Int, Some(&filter), false, false);
        let select_all = tree.select_all_node().unwrap();
        tree.set_checked(select_all, true);
        assert!(!tree.is_add_to_current_checked());
        assert_eq!(tree.get_checked_values(), values);

        tree.toggle(tree.add_to_current_node().unwrap());
        assert!(tree.is_add_to_current_checked());
        assert!(tree.is_select_all_checked());
    }

    #[test]
    fn test_search_ignores_current_filter_for_initial_state() {
        let values = vec![CellValue::text("a"), CellValue::text("b")];
        let filter = vec![CellValue::text("a")];
        let tree = FilterOptionTree::build(&values, DataType::Text, Some(&filter), true, false);
        assert_eq!(tree.label(tree.select_all_node().unwrap()), Some(SELECT_ALL_RESULTS_TEXT));
        assert_eq!(tree.get_checked_values(), values);
    }

    #[test]
    fn test_empty_input_has_no_matches_node() {
        let tree = FilterOptionTree::build(&[], DataType::Text, None, false, false);
        let children = tree.children(tree.root());
        assert_eq!(children.len(), 1);
        assert_eq!(tree.label(children[0]), Some(NO_MATCHES_TEXT));
        assert!(!tree.node(children[0]).unwrap().is_checkable());
        assert!(tree.get_checked_values().is_empty());
    }

    #[test]
    fn test_datetime_time_resolution() {
        let at = |h, m, s| CellValue::DateTime(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(h, m, s).unwrap());
        let values = vec![at(10, 0, 0), at(9, 30, 15), at(9, 30, 0)];

        let fine = FilterOptionTree::build(&values, DataType::DateTime, None, false, true);
        assert!(fine.find_path(&["2024", "March", "4", "9", "30", "15"]).is_some());
        assert_eq!(fine.get_checked_values(), values);

        let coarse = FilterOptionTree::build(&values, DataType::DateTime, None, false, false);
        let leaf = coarse.find_path(&["2024", "March", "4"]).unwrap();
        assert_eq!(coarse.node(leaf).unwrap().values().len(), 3);
        assert_eq!(coarse.get_checked_values(), values);
    }

    #[test]
    fn test_value_labels() {
        assert_eq!(value_label(&CellValue::float(3.14159), DataType::Float), "3.14");
        assert_eq!(value_label(&CellValue::float(1234.5), DataType::Currency), "$ 1,234.50");
        assert_eq!(value_label(&CellValue::Int(2), DataType::Status), "In-Progress");
        assert_eq!(value_label(&CellValue::Bool(false), DataType::Bool), "False");
    }
}
