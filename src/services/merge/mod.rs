pub mod engine;
pub mod fuzzy;
pub mod normalize;

pub use engine::{merge_sheets, MergeRequest, SheetMerger, GROUP_COLUMN, TAB_NAME_COLUMN};
pub use fuzzy::{build_column_mapping, similarity, ColumnMapping, ColumnMatcher, MergeConfig};
pub use normalize::normalize_column_name;
