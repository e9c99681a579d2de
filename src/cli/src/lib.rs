//! A3S Pack CLI - inspect and extract the artifacts of package images.

pub mod commands;
pub mod output;
