//! Grid state: selection, paging, load/save lifecycle and the controller
//! that ties them to the row store

pub mod dispatcher;
pub mod grid;
pub mod pagination;
pub mod selection;
pub mod status;
