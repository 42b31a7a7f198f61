//! Core data types shared by every stage of the dependency solver: the
//! version total order, the match spec predicate language, and the package
//! record/namespace/history model they operate on.
//!
//! This crate has no solver logic in it — it only defines what a
//! "candidate" and a "constraint" are, and how to compare and match them.

#![deny(missing_docs)]
#![deny(unsafe_code)]

mod build_spec;
mod channel;
mod history;
mod match_spec;
mod namespace;
mod package_name;
mod record;
mod version;
mod version_spec;

pub use build_spec::{BuildNumberSpec, ParseBuildNumberSpecError};
pub use channel::{Channel, ParseChannelError};
pub use history::{History, HistoryRevision, UserRequest};
pub use match_spec::{MatchSpec, ParseMatchSpecError, StringMatcher};
pub use namespace::Namespace;
pub use package_name::{InvalidPackageNameError, PackageName};
pub use record::{PackageRecord, RecordKey};
pub use version::{ParseVersionError, Version};
pub use version_spec::{
    EqualityOperator, InvalidGlobError, LogicalOperator, ParseVersionSpecError, RangeOperator,
    VersionSpec,
};
