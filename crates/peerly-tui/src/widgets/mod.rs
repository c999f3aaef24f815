pub mod data_table;
pub mod overlay;
pub mod text_field;
