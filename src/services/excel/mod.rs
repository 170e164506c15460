pub mod classifier;
pub mod codec;
pub mod detector;
pub mod transform;
pub mod types;
pub mod utils;

pub use detector::{detect_empty_columns, detect_tables, SheetTables, TableDetector};
pub use types::{Cell, DetectionConfig, Row, Sheet, TableRegion, Workbook};
