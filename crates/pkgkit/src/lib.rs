//! # pkgkit
//!
//! Pure Rust library for driving system package managers.
//!
//! This crate provides functionality for:
//! - Querying installed and candidate package versions
//! - Installing, upgrading and removing packages with per-command timeouts
//! - Ordering versions with each package system's own rules
//! - Categorizing package manager failures from their stderr
//!
//! ## Example
//!
//! ```no_run
//! use pkgkit::{Backend, PackageRequest, PacmanBackend};
//! use std::time::Duration;
//!
//! let pacman = PacmanBackend::new();
//! if pacman.query("vim").expect("query failed").is_none() {
//!     let request = PackageRequest::new("vim");
//!     pacman
//!         .install(&request, Some(Duration::from_secs(600)))
//!         .expect("install failed");
//! }
//! ```
//!
//! ## Version Ordering
//!
//! Versions are compared the way the package system does, never lexically:
//!
//! ```
//! use pkgkit::version::pacman_vercmp;
//! use std::cmp::Ordering;
//!
//! assert_eq!(pacman_vercmp("1.10-1", "1.9-1"), Ordering::Greater);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod command;
pub mod error;
pub mod types;
pub mod version;

pub use backend::Backend;
pub use backend::pacman::PacmanBackend;
pub use backend::solaris::SolarisBackend;
pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use error::{Error, Result};
pub use types::{InstalledPackage, PackageRequest};
