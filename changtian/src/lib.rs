//! # changtian
//!
//! Command-line companion of the 长天快速世界书 app.
//!
//! `changtian` converts world books written in the app's pseudo-XML notation
//! into Tavo JSON, and drives the Android packaging of the app through
//! Buildozer on CI machines.
//!
//! ## Features
//!
//! - **Conversion**: pseudo-XML world books to Tavo JSON
//! - **Spec files**: lint, inspect and edit `buildozer.spec`
//! - **Build environment**: Android SDK checks, `aidl` lookup, Buildozer SDK link
//! - **Build**: clean and debug builds with a command timeout
//! - **Result check**: APK discovery and build log analysis
//!
//! ## Modules
//!
//! - [`build`] - Environment setup, build execution and result checks
//! - [`config`] - Tool configuration (`.changtian.toml`)
//! - [`convert`] - World book conversion commands
//! - [`ctx`] - Application context and state management
//! - [`spec`] - Spec file commands
//! - [`utils`] - Command execution and filesystem helpers

/// Environment setup, build execution and result checks.
///
/// Wraps the external Buildozer tool and the Android SDK it depends on.
pub mod build;

/// Tool configuration loaded from `.changtian.toml`.
pub mod config;

/// World book conversion commands.
pub mod convert;

/// Application context and state management.
pub mod ctx;

/// Spec file commands.
pub mod spec;

/// Command execution and filesystem helpers.
pub mod utils;

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
