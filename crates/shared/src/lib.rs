pub mod domain;
pub mod error;
pub mod grouping;
pub mod lifecycle;
pub mod protocol;
pub mod views;
