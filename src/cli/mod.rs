//! Terminal front-end for the converter operations

pub mod convert;
pub mod currencies;
pub mod setup;
pub mod ui;
