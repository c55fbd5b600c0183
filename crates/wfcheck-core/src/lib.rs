pub mod analyzer;
pub mod cache;
pub mod error;
pub mod fetch;
pub mod model;
pub mod reader;
pub mod yaml;

pub use analyzer::Analyzer;
pub use cache::DocumentCache;
pub use error::{AnalyzeError, FileError, ObjectClass, RootError, SchemaError};
pub use fetch::{GraphqlContentFetcher, ProjectFiles, RestContentFetcher};
pub use model::{ActionMetadata, Workflow};
pub use reader::{read_action, read_workflow, ActionRead, WorkflowRead};
