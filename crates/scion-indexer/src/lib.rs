//! Source parsing, import resolution, and graph assembly

pub mod indexer;
pub mod languages;
pub mod parser;
pub mod parser_pool;
pub mod resolver;
pub mod walker;


pub use indexer::{IndexOptions, IndexReport, Indexer, ParseFailure};
pub use languages::parser_for;
pub use parser::{Declaration, Fidelity, Import, LanguageParser, ParseError, ParsedFile};
pub use parser_pool::{Grammar, ParserPool};
pub use resolver::{FileIndex, Resolution};
pub use walker::{DENYLIST, SourceFile, Walker};
