mod column;
pub use column::{string_type, translate_type, type_label, Column, MAX_VARCHAR_SIZE};

mod diff;
pub use diff::{ColumnsDiff, ColumnsDiffItem};
