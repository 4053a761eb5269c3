pub mod analyzers;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod reference;
pub mod survey;

pub use error::{Result, SurveyError};
