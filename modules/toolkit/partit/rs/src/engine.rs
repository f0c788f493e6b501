use std::sync::Arc;

use derive_getters::{Dissolve, Getters};
use derive_more::Constructor;
use ecodkit_core_rs::parallelism;
use eyre::Result;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::Config;
use crate::evidence::Evidence;
use crate::layout::DomainLayout;
use crate::pipeline::Pipeline;
use crate::reference::ReferenceTables;

/// Evidence for one chain, identified by an arbitrary caller tag.
#[derive(Clone, PartialEq, Debug, Constructor, Getters, Dissolve)]
pub struct Job<Tag> {
    tag: Tag,
    chain_length: i64,
    evidence: Vec<Evidence>,
}

/// Batch runner: every chain goes through the same pipeline independently.
pub struct Engine {
    pipeline: Pipeline,
    thread_pool: Option<ThreadPool>,
}

impl Engine {
    pub fn builder(tables: Arc<ReferenceTables>) -> EngineBuilder {
        EngineBuilder {
            config: Config::default(),
            tables,
            thread_pool: None,
            threads: None,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Layouts for all jobs, in the order the jobs were given.
    /// A failed chain doesn't affect the others.
    pub fn run<Tag: Send>(&self, jobs: Vec<Job<Tag>>) -> Vec<(Tag, Result<DomainLayout>)> {
        match &self.thread_pool {
            Some(pool) => pool.install(|| self._run(jobs)),
            None => self._run(jobs),
        }
    }

    fn _run<Tag: Send>(&self, jobs: Vec<Job<Tag>>) -> Vec<(Tag, Result<DomainLayout>)> {
        jobs.into_par_iter()
            .map(|job| {
                let (tag, chain_length, evidence) = job.dissolve();
                let layout = self.pipeline.run(chain_length, evidence);
                if let Err(err) = &layout {
                    log::error!("Failed to partition a chain of length {chain_length}: {err}");
                }
                (tag, layout)
            })
            .collect()
    }
}

pub struct EngineBuilder {
    config: Config,
    tables: Arc<ReferenceTables>,
    thread_pool: Option<ThreadPool>,
    threads: Option<isize>,
}

impl EngineBuilder {
    pub fn set_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn set_thread_pool(mut self, pool: ThreadPool) -> Self {
        self.thread_pool = Some(pool);
        self
    }

    /// Dedicated pool with the given parallelism. Negative values count back from all cores.
    pub fn set_threads(mut self, threads: isize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn build(self) -> Result<Engine> {
        let thread_pool = match (self.thread_pool, self.threads) {
            (Some(pool), _) => Some(pool),
            (None, Some(requested)) => {
                let threads = parallelism::threads(requested)?;
                log::debug!("Starting a pool of {threads} threads");
                Some(ThreadPoolBuilder::new().num_threads(threads).build()?)
            }
            (None, None) => None,
        };

        Ok(Engine {
            pipeline: Pipeline::new(self.config, self.tables),
            thread_pool,
        })
    }
}
