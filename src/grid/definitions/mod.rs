// src/grid/definitions/mod.rs

pub mod column_data_type;
pub mod column_definition;
pub mod criteria;
pub mod row;

pub use column_data_type::{parse_column_data_type, ColumnDataType};
pub use column_definition::{resolve_column, ColumnDefinition};
pub use criteria::{
    is_blank, normalize_for_cmp, value_number, value_text, ColumnFilter, Criteria, FilterOperator,
    SortDirection, SortSpec,
};
pub use row::{single_field_patch, FieldMap, Row, RowPatch};
