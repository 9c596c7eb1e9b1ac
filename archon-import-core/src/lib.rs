#![doc = "archon-import-core: core import pipeline for archon-import."]

//! This crate holds the import pipeline and its collaborator contracts: backend validation,
//! repository scanning and the upload/extraction phases, plus the result record they build.
//! Transport to a concrete backend lives in the `archon-import` crate.
//!
//! # Usage
//! Assemble an [`config::ImportConfig`], provide a [`contract::Validator`],
//! [`contract::Scanner`] and [`contract::Uploader`], and call
//! [`import::import_to_project`].

pub mod config;
pub mod contract;
pub mod import;
pub mod progress;
pub mod result;
pub mod scan;
