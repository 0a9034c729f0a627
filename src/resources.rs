//! Resource-level operations on top of [`AnsClient`]
//!
//! Each helper turns a list of ids into a job batch for one resource kind.
//! Payloads are returned as raw JSON; decoding them into domain types is
//! the caller's business.

use chrono::NaiveDate;
use serde_json::Value;

use crate::api::AnsClient;
use crate::downloader::config::QUESTIONS_PAGE_SIZE;
use crate::downloader::{DownloadResult, Job};
use crate::fetcher::request_key::PageRequest;

impl AnsClient {
    /// Search assignments starting within `[start, end]`
    ///
    /// The API compares strictly, so the filter widens the range by a day on
    /// each side.
    pub async fn find_assignments(&self, start: NaiveDate, end: NaiveDate) -> DownloadResult<Vec<Value>> {
        let period = assignment_period(start, end);
        self.notifier()
            .notify(format!("retrieving assignments: {period}"));

        let resource = self.paged("search/assignments").with_query(period);
        let assignments = self.get_multiple_pages(&resource).await?;
        self.notifier()
            .notify(format!("  found {} assignments", assignments.len()));
        Ok(assignments)
    }

    /// Fetch course records, one per id, in input order
    pub async fn courses(&self, course_ids: &[u64]) -> DownloadResult<Vec<Value>> {
        let total = course_ids.len();
        let jobs = course_ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                Job::single(self.request_key(&format!("courses/{id}"), None, None))
                    .with_progress(format!(" ({}/{total}) course {id}", i + 1))
            })
            .collect();
        self.run(jobs).await
    }

    /// Fetch all results of each assignment.
    ///
    /// Each element of the returned vector is the JSON array of results for
    /// the assignment at the same position.
    pub async fn assignment_results(&self, assignment_ids: &[u64]) -> DownloadResult<Vec<Value>> {
        let total = assignment_ids.len();
        let jobs = assignment_ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                Job::paginated(self.paged(format!("assignments/{id}/results")))
                    .with_progress(format!("[results] {}/{total} assignment {id}", i + 1))
            })
            .collect();
        self.run_chunked(jobs, self.config().chunk_size).await
    }

    /// Fetch the exercises of one assignment
    pub async fn assignment_exercises(&self, assignment_id: u64) -> DownloadResult<Vec<Value>> {
        let resource = self.paged(format!("assignments/{assignment_id}/exercises"));
        let exercises = self.get_multiple_pages(&resource).await?;
        if !exercises.is_empty() {
            self.notifier().notify(format!(
                "[questions {}] assignment {assignment_id}",
                exercises.len()
            ));
        }
        Ok(exercises)
    }

    /// Fetch the questions of each exercise (a single page per exercise)
    pub async fn exercise_questions(&self, exercise_ids: &[u64]) -> DownloadResult<Vec<Value>> {
        let total = exercise_ids.len();
        let jobs = exercise_ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                Job::single(self.request_key(
                    &format!("exercises/{id}/questions"),
                    None,
                    Some(PageRequest::new(QUESTIONS_PAGE_SIZE, 1)),
                ))
                .with_progress(format!("[questions] {}/{total} exercise {id}", i + 1))
            })
            .collect();
        self.run(jobs).await
    }

    /// Fetch full result records (including submissions), chunked
    pub async fn result_details(&self, result_ids: &[u64]) -> DownloadResult<Vec<Value>> {
        let total = result_ids.len();
        let jobs = result_ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                Job::single(self.request_key(&format!("results/{id}"), None, None))
                    .with_progress(format!("[result submissions] {}/{total} result {id}", i + 1))
            })
            .collect();
        self.run_chunked(jobs, self.config().chunk_size).await
    }

    /// Fetch submission records with answer details
    pub async fn submission_details(&self, submission_ids: &[u64]) -> DownloadResult<Vec<Value>> {
        let jobs = submission_ids
            .iter()
            .map(|id| {
                Job::single(self.request_key(&format!("submissions/{id}"), None, None))
                    .with_progress(format!("[answer details] submission {id}"))
            })
            .collect();
        self.run(jobs).await
    }
}

/// Filter expression selecting assignments that start within `[start, end]`
pub fn assignment_period(start: NaiveDate, end: NaiveDate) -> String {
    let from = start.pred_opt().unwrap_or(start);
    let to = end.succ_opt().unwrap_or(end);
    format!("start_at>'{from}' start_at<'{to}'")
}

/// Stable re-ordering by a caller-supplied key
pub fn sorted_by_key<T, K, F>(mut items: Vec<T>, key: F) -> Vec<T>
where
    K: Ord,
    F: FnMut(&T) -> K,
{
    items.sort_by_key(key);
    items
}
