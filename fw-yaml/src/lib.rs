pub mod parser;
pub mod validator;
pub mod writer;
pub mod yaml_model;

pub use parser::{ObservedFile, YamlParseError, merge_databases, parse_database_yaml, parse_observed_yaml};
pub use validator::{SchemaIssue, validate_yaml_schema};
pub use writer::{YamlWriteError, write_database_yaml};
