//! tyranno-core: single-source-of-truth project metadata
//!
//! Values such as versions, names and licenses are declared once in a TOML
//! document and referenced elsewhere with placeholders. A placeholder names a
//! path and may pipe the resolved value through a JMESPath query, which can
//! call registered functions:
//!
//! - `${project.version}`
//! - `${.versions ~ semver_max(@) ~}`
//! - `${ . ~ spdx_license(license).header ~}`
//!
//! # Example
//!
//! ```rust
//! use tyranno_core::Project;
//!
//! let toml = r#"
//! versions = ["1.0.0", "2.3.1", "1.9.9"]
//! latest = "${versions ~ semver_max(@) ~}"
//! tag = "v${latest}"
//! "#;
//!
//! let project = Project::from_toml(toml).unwrap();
//! assert_eq!(project.get("tag").unwrap().as_str(), Some("v2.3.1"));
//! ```

pub mod document;
pub mod environment;
pub mod error;
pub mod function;
pub mod http;
pub mod placeholder;
pub mod query;
pub mod resolver;
pub mod value;

mod builtins;
mod project;

pub use document::Document;
pub use environment::Environment;
pub use error::{Error, ErrorKind, Result};
pub use function::{ArgType, FnFunction, Function, FunctionContext, FunctionRegistry, Signature};
pub use http::HttpOptions;
pub use project::{Project, ProjectOptions, CONFIG_FILE_NAMES, DEFAULT_NAMESPACE};
pub use query::QueryEvaluator;
pub use resolver::Resolver;
pub use value::Value;
