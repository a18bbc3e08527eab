#![forbid(unsafe_code)]
//! Java-style `.properties` resource bundle toolkit for Rust.
//!
//! A bundle family is a set of `base[_language[_COUNTRY[_VARIANT]]].properties`
//! files sharing their keys. This crate parses and regenerates those files,
//! keeps the union of their keys in a [`BundleGroup`], presents the keys as a
//! [`KeyTree`], and reports missing, duplicate, and similar values.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use propbundle::{BundleSession, DirectorySource, Locale, Preferences};
//!
//! let mut source = DirectorySource::new("i18n", "messages");
//! let mut session = BundleSession::load(&source, Preferences::default())?;
//!
//! session.add_key("menu.file.open")?;
//! session.set_value(&Locale::root(), "menu.file.open", "Open")?;
//! session.save(&mut source)?;
//! # Ok::<(), propbundle::Error>(())
//! ```
//!
//! # Features
//!
//! - Lossless-as-possible parse and generate of `.properties` text, including
//!   comments, commented-out entries, continuations, and `\uXXXX` escapes
//! - Change events on bundles, groups, and key trees
//! - Grouped or flat key trees with filtering and keyboard-style navigation
//! - Consistency analysis, statistics, and CSV export

pub mod analysis;
pub mod bundle;
pub mod delta;
pub mod error;
pub mod export;
pub mod formats;
pub mod group;
pub mod locale;
pub mod preferences;
pub mod proximity;
pub mod session;
pub mod source;
pub mod stats;
pub mod traits;
pub mod tree;
pub mod types;
pub mod visit;

// Re-export most used types for easy consumption
pub use crate::{
    analysis::{AnalysisReport, analyze},
    bundle::Bundle,
    delta::{DeltaEvent, DeltaKind, DeltaListener, EventQueue, ListenerId},
    error::Error,
    formats::{FormatOptions, PropertiesFormat},
    group::{BundleGroup, GroupSubject, KeyOperationReport},
    locale::Locale,
    preferences::Preferences,
    session::{BundleSession, SessionEvent, SessionId, SessionListener, SessionRegistry},
    source::{BundleSource, DirectorySource, MemorySource},
    stats::BundleStats,
    traits::BundleFormat,
    tree::{ItemParent, KeyTree, KeyTreeItem, KeyTreeUpdater},
    types::{BundleEntry, KeyOrder},
};
