//! Common infrastructure shared across modules

pub mod logger;
