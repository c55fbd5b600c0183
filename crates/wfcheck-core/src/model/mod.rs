pub mod action;
pub mod job;
pub mod specifier;
pub mod workflow;

pub use action::{ActionInput, ActionMetadata};
pub use job::{Job, RunStep, RunsOn, Scalar, ScalarKind, Step, StepsJob, UsesJob, UsesStep};
pub use specifier::{ActionSpecifier, RepoActionRef, RepoWorkflowRef, WorkflowSpecifier};
pub use workflow::{EventConfig, InputType, Workflow, WorkflowInput};
