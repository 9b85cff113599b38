//! The claim loop and the per-job-type step pipelines.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reelhouse_core::types::DbId;
use reelhouse_db::models::job::Job;
use reelhouse_db::repositories::{JobRepo, VideoRepo};
use reelhouse_db::DbPool;
use reelhouse_media::{ImageHost, MediaError, StoredFile, TextGenerator, VideoProcessor};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::prompts;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("media service error: {0}")]
    Media(#[from] MediaError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The job cannot succeed as written (missing prompt, video gone,
    /// no caption track yet). Retrying without changing the inputs
    /// would fail the same way.
    #[error("{0}")]
    Invalid(String),
}

/// The fields of a video row the step pipelines need. Captured in the
/// `fetch-video` step so later attempts see the same snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct VideoFacts {
    playback_id: Option<String>,
    track_id: Option<String>,
    thumbnail_key: Option<String>,
}

pub struct Worker {
    pool: DbPool,
    processor: Arc<dyn VideoProcessor>,
    images: Arc<dyn ImageHost>,
    text: Arc<dyn TextGenerator>,
    idle_wait: Duration,
}

impl Worker {
    pub fn new(
        pool: DbPool,
        processor: Arc<dyn VideoProcessor>,
        images: Arc<dyn ImageHost>,
        text: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            pool,
            processor,
            images,
            text,
            idle_wait: Duration::from_secs(2),
        }
    }

    /// How long to sleep when the queue is empty.
    pub fn with_idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    /// Claim and execute jobs until cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!("Worker started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.run_once().await {
                Ok(true) => {}
                Ok(false) => {
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(self.idle_wait) => {}
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "Queue poll failed");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(self.idle_wait) => {}
                    }
                }
            }
        }
        tracing::info!("Worker stopped");
    }

    /// Claim at most one job and run it to completion or failure.
    /// Returns whether a job was claimed.
    pub async fn run_once(&self) -> Result<bool, sqlx::Error> {
        let Some(job) = JobRepo::claim_next(&self.pool).await? else {
            return Ok(false);
        };
        tracing::info!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempt = job.attempts,
            "Claimed job"
        );

        match self.execute(&job).await {
            Ok(()) => {
                JobRepo::complete(&self.pool, job.id).await?;
                tracing::info!(job_id = %job.id, "Job completed");
            }
            Err(err) => {
                tracing::warn!(job_id = %job.id, error = %err, "Job failed");
                JobRepo::fail(&self.pool, job.id, &err.to_string()).await?;
            }
        }
        Ok(true)
    }

    async fn execute(&self, job: &Job) -> Result<(), WorkerError> {
        match job.job_type.as_str() {
            "generate-title" => self.generate_title(job).await,
            "generate-description" => self.generate_description(job).await,
            "generate-thumbnail" => self.generate_thumbnail(job).await,
            other => Err(WorkerError::Invalid(format!("unknown job type: {other}"))),
        }
    }

    async fn generate_title(&self, job: &Job) -> Result<(), WorkerError> {
        let transcript = self.transcript_steps(job).await?;

        let title = self
            .step(job.id, "generate", async {
                Ok(self
                    .text
                    .complete(prompts::TITLE_SYSTEM_PROMPT, &transcript)
                    .await?)
            })
            .await?;
        if title.trim().is_empty() {
            return Err(WorkerError::Invalid("model returned an empty title".into()));
        }

        self.step(job.id, "persist", async {
            let rows =
                VideoRepo::set_generated_title(&self.pool, job.video_id, job.user_id, title.trim())
                    .await?;
            if rows == 0 {
                return Err(WorkerError::Invalid("video no longer exists".into()));
            }
            Ok(rows)
        })
        .await?;
        Ok(())
    }

    async fn generate_description(&self, job: &Job) -> Result<(), WorkerError> {
        let transcript = self.transcript_steps(job).await?;

        let description = self
            .step(job.id, "generate", async {
                Ok(self
                    .text
                    .complete(prompts::DESCRIPTION_SYSTEM_PROMPT, &transcript)
                    .await?)
            })
            .await?;
        if description.trim().is_empty() {
            return Err(WorkerError::Invalid(
                "model returned an empty description".into(),
            ));
        }

        self.step(job.id, "persist", async {
            let rows = VideoRepo::set_generated_description(
                &self.pool,
                job.video_id,
                job.user_id,
                description.trim(),
            )
            .await?;
            if rows == 0 {
                return Err(WorkerError::Invalid("video no longer exists".into()));
            }
            Ok(rows)
        })
        .await?;
        Ok(())
    }

    async fn generate_thumbnail(&self, job: &Job) -> Result<(), WorkerError> {
        let prompt = job
            .payload
            .get("prompt")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WorkerError::Invalid("thumbnail job payload has no prompt".into()))?
            .to_string();

        let facts = self.fetch_video_step(job).await?;

        let image_url = self
            .step(job.id, "generate-image", async {
                Ok(self.text.generate_image(&prompt).await?)
            })
            .await?;

        // The provider URL is short-lived, so host a copy before
        // touching the row.
        let hosted: StoredFile = self
            .step(job.id, "host-image", async {
                Ok(self.images.upload_from_url(&image_url).await?)
            })
            .await?;

        self.step(job.id, "persist", async {
            if let Some(old_key) = &facts.thumbnail_key {
                if let Err(err) = self.images.delete(old_key).await {
                    tracing::warn!(
                        video_id = %job.video_id,
                        key = %old_key,
                        error = %err,
                        "Old thumbnail cleanup failed"
                    );
                }
            }
            let updated = VideoRepo::set_thumbnail(
                &self.pool,
                job.video_id,
                job.user_id,
                &hosted.url,
                &hosted.key,
            )
            .await?;
            if updated.is_none() {
                return Err(WorkerError::Invalid("video no longer exists".into()));
            }
            Ok(true)
        })
        .await?;
        Ok(())
    }

    /// The shared front of the text jobs: snapshot the video, then pull
    /// the caption transcript.
    async fn transcript_steps(&self, job: &Job) -> Result<String, WorkerError> {
        let facts = self.fetch_video_step(job).await?;

        let playback_id = facts
            .playback_id
            .ok_or_else(|| WorkerError::Invalid("video has no playback id yet".into()))?;
        let track_id = facts
            .track_id
            .ok_or_else(|| WorkerError::Invalid("video has no caption track yet".into()))?;

        self.step(job.id, "fetch-transcript", async {
            let text = self
                .processor
                .fetch_transcript(&playback_id, &track_id)
                .await?;
            if text.trim().is_empty() {
                return Err(WorkerError::Invalid("transcript is empty".into()));
            }
            Ok(text)
        })
        .await
    }

    async fn fetch_video_step(&self, job: &Job) -> Result<VideoFacts, WorkerError> {
        self.step(job.id, "fetch-video", async {
            let video = VideoRepo::find_owned(&self.pool, job.video_id, job.user_id)
                .await?
                .ok_or_else(|| WorkerError::Invalid("video not found".into()))?;
            Ok(VideoFacts {
                playback_id: video.playback_id,
                track_id: video.track_id,
                thumbnail_key: video.thumbnail_key,
            })
        })
        .await
    }

    /// Run `work` unless the step already completed in an earlier
    /// attempt, in which case its recorded result is returned instead.
    async fn step<T, F>(&self, job_id: DbId, name: &str, work: F) -> Result<T, WorkerError>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<T, WorkerError>>,
    {
        if let Some(done) = JobRepo::step_result(&self.pool, job_id, name).await? {
            if let Some(value) = done.result {
                tracing::debug!(job_id = %job_id, step = name, "Reusing completed step");
                return Ok(serde_json::from_value(value)?);
            }
        }

        let value = work.await?;
        JobRepo::record_step(&self.pool, job_id, name, Some(serde_json::to_value(&value)?))
            .await?;
        Ok(value)
    }
}
