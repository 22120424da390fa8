//! Column filtering: the row mask, the option tree and the popup session

pub mod mask;
pub mod session;
pub mod tree;

pub use mask::{FilterMap, FilterSet, RowFilterMask};
pub use session::{FilterAction, FilterSession, SearchMode};
pub use tree::{CheckState, FilterNode, FilterOptionTree, NodeId, NodeKind};
