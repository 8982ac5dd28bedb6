//! Building blocks shared by the feature slices

pub mod enums;
pub mod pagination;
pub mod sql;
pub mod validation;
