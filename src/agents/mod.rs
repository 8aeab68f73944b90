//! The five procurement stages: personas, task prompts, contracts and output
//! files. Each module builds its stage; wiring happens in [`crate::pipeline`].

pub mod query_recommender;
pub mod report_author;
pub mod report_critic;
pub mod search_engine;
pub mod web_scraper;

pub use report_critic::ReportCriticStage;
