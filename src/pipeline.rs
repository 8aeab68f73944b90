//! The procurement pipeline: five stages, wired in order, run by a sequential crew.
//!
//! ```text
//! query recommender -> search engine -> web scraper -> report author
//!                                                           |      \
//!                                                           v       v
//!                                                       critique -> revision (author's worker)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::agents::{
    query_recommender, report_author, search_engine, web_scraper, ReportCriticStage,
};
use crate::core::{EndState, KnowledgeSource, Observer, Stage, WiringPlan, DEFAULT_MAX_ITERATIONS};
use crate::crew::{Crew, CrewOutput, Process};
use crate::error::{CrewError, WiringError};
use crate::inputs::RunInputs;
use crate::llm::LlmHandle;
use crate::tools::{ScrapeProvider, SearchProvider};

/// External collaborators of the pipeline.
#[derive(Clone)]
pub struct PipelineDeps {
    /// Query recommender backend.
    pub fast_llm: LlmHandle,
    /// Backend of every other stage.
    pub strong_llm: LlmHandle,
    pub search: Option<Arc<dyn SearchProvider>>,
    pub scrape: Option<Arc<dyn ScrapeProvider>>,
    pub output_dir: PathBuf,
    pub max_iterations: usize,
}

impl PipelineDeps {
    pub fn new(fast_llm: LlmHandle, strong_llm: LlmHandle, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            fast_llm,
            strong_llm,
            search: None,
            scrape: None,
            output_dir: output_dir.into(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_scrape(mut self, scrape: Arc<dyn ScrapeProvider>) -> Self {
        self.scrape = Some(scrape);
        self
    }
}

pub struct ProcurementPipeline {
    query_recommender: Stage,
    search_engine: Stage,
    web_scraper: Stage,
    report_author: Stage,
    report_critic: ReportCriticStage,
    output_dir: PathBuf,
    observer: Option<Observer>,
}

impl ProcurementPipeline {
    /// Build and wire the five stages.
    pub fn assemble(deps: PipelineDeps) -> Result<Self, WiringError> {
        let PipelineDeps {
            fast_llm,
            strong_llm,
            search,
            scrape,
            output_dir,
            max_iterations,
        } = deps;

        let query_recommender = query_recommender::stage(fast_llm, &output_dir);
        let search_engine =
            search_engine::stage(strong_llm.clone(), &output_dir, search, max_iterations);
        let web_scraper =
            web_scraper::stage(strong_llm.clone(), &output_dir, scrape, max_iterations);
        let report_author = report_author::stage(strong_llm.clone(), &output_dir);
        let report_critic = ReportCriticStage::new(strong_llm, &output_dir);

        let search_engine = search_engine.wire([query_recommender.handle().clone()])?;
        let web_scraper = web_scraper.wire([search_engine.handle().clone()])?;
        let report_author = report_author.wire([web_scraper.handle().clone()])?;
        let report_critic = report_critic.set_critique_context(report_author.handle())?;
        let critique = report_critic.critique_task().handle().clone();
        let report_critic = report_critic.set_revision_context(
            report_author.handle(),
            &critique,
            report_author.worker(),
        )?;

        Ok(Self {
            query_recommender,
            search_engine,
            web_scraper,
            report_author,
            report_critic,
            output_dir,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn query_recommender(&self) -> &Stage {
        &self.query_recommender
    }

    pub fn search_engine(&self) -> &Stage {
        &self.search_engine
    }

    pub fn web_scraper(&self) -> &Stage {
        &self.web_scraper
    }

    pub fn report_author(&self) -> &Stage {
        &self.report_author
    }

    pub fn report_critic(&self) -> &ReportCriticStage {
        &self.report_critic
    }

    /// A sequential crew over all six units of work.
    pub fn crew(&self, knowledge: Vec<KnowledgeSource>) -> Result<Crew, WiringError> {
        let mut builder = Crew::builder()
            .process(Process::Sequential)
            .stage(&self.query_recommender)
            .stage(&self.search_engine)
            .stage(&self.web_scraper)
            .stage(&self.report_author)
            .stage(&self.report_critic);
        for source in knowledge {
            builder = builder.knowledge(source);
        }
        if let Some(observer) = &self.observer {
            builder = builder.observer(observer.clone());
        }
        builder.build()
    }

    pub fn plan(&self) -> Result<WiringPlan, WiringError> {
        Ok(self.crew(Vec::new())?.plan())
    }

    /// Run the whole pipeline and return the crew output; `raw` is the revised report.
    pub async fn run(
        &self,
        knowledge: Vec<KnowledgeSource>,
        inputs: &RunInputs,
    ) -> Result<CrewOutput, CrewError> {
        let crew = self.crew(knowledge)?;
        log::info!(
            "Procurement run for '{}' in {} ({} tasks)",
            inputs.product_name,
            inputs.country,
            crew.tasks().len()
        );

        if let Some(observer) = &self.observer {
            observer.start(&[inputs.product_name.clone()]);
        }

        let result = crew.kickoff(inputs).await;

        if let Some(observer) = &self.observer {
            let state = if result.is_ok() {
                EndState::Success
            } else {
                EndState::Fail
            };
            observer.end(state);
        }

        result
    }
}
