//! Research module - generated research reports and the report trigger.

mod research_model;
mod research_traits;

pub use research_model::{
    ResearchJob, ResearchReport, ResearchRequest, ResearchSection, ResearchStatus,
};
pub use research_traits::ResearchServiceTrait;
