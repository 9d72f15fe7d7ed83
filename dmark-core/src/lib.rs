// dmark core library
//
// Parse-transpile-validate engine for the enhanced markdown dialect:
// recognizes figure/table/cross-reference/callout inline syntax, rewrites it
// to standard markdown + LaTeX for a Pandoc-style pipeline, and validates
// label identity and reference resolution across a whole project.

pub mod config;
pub mod parser;
pub mod similarity;
pub mod transpiler;
pub mod types;
pub mod validator;

// Re-export main types and functions for easy use
pub use config::PreprocessorConfig;
pub use parser::SyntaxParser;
pub use similarity::{EditDistance, SimilarityScorer};
pub use transpiler::Transpiler;
pub use types::*;
pub use validator::{report, Validator, ValidatorError};
