//! Background worker for metadata generation jobs.
//!
//! Jobs are claimed from the `jobs` table with `FOR UPDATE SKIP LOCKED`
//! and executed as a sequence of named steps. Each completed step is
//! recorded in `job_steps`, so a retried job resumes where the previous
//! attempt failed instead of redoing (and re-billing) earlier work.

pub mod prompts;
pub mod runner;

pub use runner::{Worker, WorkerError};
