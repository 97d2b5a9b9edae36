//! Core business logic module
//!
//! This module contains all business logic for treecompose.
//! It has NO I/O operations - those belong in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`platform`] - Architecture, firmware and image format profiles
//! - [`ostree`] - Commit and remote descriptions
//! - [`users`] - User and group records
//! - [`disk`] - Partition table descriptors
//! - [`repos`] - Package repository descriptions
//! - [`runner`] - Build runner descriptors
//! - [`workload`] - Post-boot customizations
//! - [`policy`] - Format and compression decision tables
//! - [`manifest`] - Pipeline graph primitives and serialization
//! - [`image`] - OSTree disk image compiler
//! - [`image_file`] - Image request files
//! - [`global_config`] - Global configuration management

pub mod disk;
pub mod global_config;
pub mod image;
pub mod image_file;
pub mod manifest;
pub mod ostree;
pub mod platform;
pub mod policy;
pub mod repos;
pub mod runner;
pub mod users;
pub mod workload;
