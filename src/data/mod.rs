//! Data layer for the grid: rows, columns, filters, sorting and the
//! resolved display order
//!
//! Everything here is synchronous and UI-agnostic. The state layer wires
//! these pieces together per grid instance.

pub mod cell_value;
pub mod column;
pub mod data_view;
pub mod field_path;
pub mod filter;
pub mod identity_index;
pub mod row_store;
pub mod sort;
