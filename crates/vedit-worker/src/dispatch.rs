//! Task dispatch: resolve a job by name, stage its files and run the handler.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{warn, Instrument};
use vedit_media::{AudioMixOptions, MediaEngine};
use vedit_models::{EncodingConfig, JobId, JobRequest, MediaLocation, TaskKind, TaskOutput};
use vedit_storage::{ObjectStore, StagingContext};

use crate::error::{JobError, JobResult};
use crate::logging::JobLogger;
use crate::tasks::{self, TaskContext};

/// Local paths a handler runs against.
#[derive(Debug)]
struct ResolvedPaths {
    primary: PathBuf,
    secondary: Vec<PathBuf>,
    output: Option<PathBuf>,
}

impl ResolvedPaths {
    fn output(&self) -> JobResult<&Path> {
        self.output
            .as_deref()
            .ok_or_else(|| JobError::unexpected("no output path resolved"))
    }
}

fn local_path(location: &MediaLocation) -> JobResult<PathBuf> {
    location
        .as_local()
        .map(Path::to_path_buf)
        .ok_or_else(|| JobError::value(format!("{} is not a local path", location)))
}

fn remote_key(location: &MediaLocation) -> JobResult<&str> {
    location
        .as_remote()
        .ok_or_else(|| JobError::value(format!("{} is not a remote key", location)))
}

/// Routes job requests to their handlers.
pub struct Dispatcher {
    engine: Arc<dyn MediaEngine>,
    store: Arc<dyn ObjectStore>,
    work_root: PathBuf,
    encoding: EncodingConfig,
}

impl Dispatcher {
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        store: Arc<dyn ObjectStore>,
        work_root: impl Into<PathBuf>,
        encoding: EncodingConfig,
    ) -> Self {
        Self {
            engine,
            store,
            work_root: work_root.into(),
            encoding,
        }
    }

    /// Names of every registered task.
    pub fn task_names() -> impl Iterator<Item = &'static str> {
        TaskKind::ALL.into_iter().map(|kind| kind.as_str())
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Run the task registered under `name` with JSON parameters.
    ///
    /// Unknown names and parameters that do not fit the task are value errors.
    pub async fn invoke(&self, name: &str, params: serde_json::Value) -> JobResult<TaskOutput> {
        let request = JobRequest::from_parts(name, params).map_err(|e| {
            warn!("Rejected {} request: {}", name, e);
            JobError::from(e)
        })?;
        self.execute(&JobId::new(), &request, false).await
    }

    /// Execute one job. Remote jobs are staged in a fresh workspace that is
    /// removed when the job ends; the output is uploaded only on success.
    /// Every job's output must exist and be non-empty to count as a success.
    pub async fn execute(
        &self,
        job_id: &JobId,
        request: &JobRequest,
        keep_local: bool,
    ) -> JobResult<TaskOutput> {
        let log = JobLogger::new(job_id, request.kind());
        let span = log.create_span();

        async {
            request.validate().map_err(|e| log.fail(e))?;

            if request.is_remote() {
                self.execute_remote(request, keep_local, &log).await
            } else {
                let paths = Self::resolve_local(request).map_err(|e| log.fail(e))?;
                self.run_handler(request, &paths, &log).await
            }
        }
        .instrument(span)
        .await
    }

    async fn execute_remote(
        &self,
        request: &JobRequest,
        keep_local: bool,
        log: &JobLogger,
    ) -> JobResult<TaskOutput> {
        let store = self.store.as_ref();
        let primary = request
            .primary_input()
            .ok_or_else(|| log.fail(JobError::value("job has no input")))?;
        let input_key = remote_key(primary).map_err(|e| log.fail(e))?;

        let mut staging = match request.output() {
            Some(output) => {
                let output_key = remote_key(output).map_err(|e| log.fail(e))?;
                StagingContext::prepare(store, &self.work_root, input_key, output_key, keep_local)
                    .await
            }
            None => StagingContext::input_only(store, &self.work_root, input_key, keep_local).await,
        }
        .map_err(|e| log.fail(e))?;

        let mut secondary = Vec::new();
        for location in request.secondary_inputs() {
            let path = match location {
                MediaLocation::Remote(key) => {
                    staging.fetch(store, key).await.map_err(|e| log.fail(e))?
                }
                MediaLocation::Local(path) => path.clone(),
            };
            secondary.push(path);
        }

        let paths = ResolvedPaths {
            primary: staging.input_path().to_path_buf(),
            secondary,
            output: staging.output_path().map(Path::to_path_buf),
        };

        let result = async {
            let output = self.run_handler(request, &paths, log).await?;
            staging.finish(store).await.map_err(|e| log.fail(e))?;
            Ok::<_, JobError>(output)
        }
        .await;

        staging.close().await;
        result
    }

    fn resolve_local(request: &JobRequest) -> JobResult<ResolvedPaths> {
        let primary = request
            .primary_input()
            .ok_or_else(|| JobError::value("job has no input"))?;

        Ok(ResolvedPaths {
            primary: local_path(primary)?,
            secondary: request
                .secondary_inputs()
                .into_iter()
                .map(local_path)
                .collect::<JobResult<_>>()?,
            output: request.output().map(local_path).transpose()?,
        })
    }

    async fn run_handler(
        &self,
        request: &JobRequest,
        paths: &ResolvedPaths,
        log: &JobLogger,
    ) -> JobResult<TaskOutput> {
        let ctx = TaskContext {
            engine: self.engine.as_ref(),
            encoding: &self.encoding,
            log,
        };

        match request {
            JobRequest::Transcode(p) => {
                tasks::transcode(&ctx, &paths.primary, paths.output()?, &p.target_format).await
            }
            JobRequest::Resize(p) => {
                tasks::resize(
                    &ctx,
                    &paths.primary,
                    paths.output()?,
                    p.width,
                    p.height,
                    p.keep_aspect_ratio,
                )
                .await
            }
            JobRequest::MediaInfo(_) => tasks::media_info(&ctx, &paths.primary).await,
            JobRequest::Trim(p) => {
                tasks::trim(&ctx, &paths.primary, paths.output()?, &p.start_time, &p.end_time)
                    .await
            }
            JobRequest::Concatenate(_) => {
                let inputs: Vec<PathBuf> = std::iter::once(paths.primary.clone())
                    .chain(paths.secondary.iter().cloned())
                    .collect();
                tasks::concatenate(&ctx, &inputs, paths.output()?).await
            }
            JobRequest::AddAudio(p) => {
                let audio = paths
                    .secondary
                    .first()
                    .ok_or_else(|| log.fail(JobError::unexpected("no audio path resolved")))?;
                let options = AudioMixOptions {
                    volume: p.volume,
                    loop_audio: p.loop_audio,
                    keep_original_audio: p.keep_original_audio,
                    original_audio_volume: p.original_audio_volume,
                };
                tasks::add_audio(&ctx, &paths.primary, audio, paths.output()?, &options).await
            }
        }
    }
}
