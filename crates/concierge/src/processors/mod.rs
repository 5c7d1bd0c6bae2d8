//! Text processing around the agent: input preprocessing before the model sees
//! a user message, checks over tool results, and postprocessing of drafts.

pub mod checker;
pub mod input;
pub mod output;

pub use checker::{CheckerPipeline, CrossBorderCheck, ToolResultCheck};
pub use input::{InputPipeline, InputStage, PreprocessError};
pub use output::{OutputPipeline, OutputStage, Postprocessed, RegenerationRequest, StageError};
