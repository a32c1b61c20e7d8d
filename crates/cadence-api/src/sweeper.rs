//! # Publish Sweeper
//!
//! A background task that publishes every scheduled post whose time has
//! come. Each due post is attempted independently; one failure never stops
//! the rest of the sweep.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use cadence_core::PostStatus;

use crate::publish::{publish_one, PublishOutcome};
use crate::state::AppState;

/// Counts from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub attempted: usize,
    pub published: usize,
    pub failed: usize,
}

/// Publish every scheduled post due at or before `now`, oldest first.
pub async fn sweep_once(state: &AppState, now: DateTime<Utc>) -> SweepReport {
    let mut due = state
        .posts
        .filter(|p| p.status == PostStatus::Scheduled && p.scheduled_at <= now);
    due.sort_by_key(|p| (p.scheduled_at, p.id));

    let mut report = SweepReport::default();
    for post in &due {
        report.attempted += 1;
        match publish_one(state, post, now).await {
            Ok(PublishOutcome::Posted(_)) => report.published += 1,
            Ok(PublishOutcome::Failed(stored)) => {
                tracing::warn!(
                    post_id = %post.id,
                    error = stored.error_message.as_deref().unwrap_or_default(),
                    "scheduled post failed to publish"
                );
                report.failed += 1;
            }
            Ok(PublishOutcome::Blocked { .. }) => report.failed += 1,
            Err(e) => {
                tracing::error!(post_id = %post.id, error = %e, "publish bookkeeping failed");
                report.failed += 1;
            }
        }
    }

    if report.attempted > 0 {
        tracing::info!(
            attempted = report.attempted,
            published = report.published,
            failed = report.failed,
            "publish sweep finished"
        );
    }
    report
}

/// Run [`sweep_once`] every `period` until the runtime shuts down.
pub fn spawn_sweeper(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            sweep_once(&state, Utc::now()).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;

    use cadence_client::mock::MockPublisher;
    use cadence_client::Collaborators;

    use crate::config::AppConfig;
    use crate::state::{PostRecord, PublisherCredentialsRecord};

    fn state(publisher: Arc<MockPublisher>) -> AppState {
        let state = AppState::with_config(
            AppConfig::default(),
            Collaborators::offline(publisher),
            None,
        );
        *state.publisher.write() = Some(PublisherCredentialsRecord {
            access_token: "token".into(),
            person_urn: "urn:li:person:1".into(),
            token_expires_at: None,
            updated_at: Utc::now(),
        });
        state
    }

    fn add(state: &AppState, at: DateTime<Utc>, status: PostStatus, title: &str) {
        let id = state.posts.next_id();
        state.posts.insert(
            id,
            PostRecord {
                id,
                campaign_id: None,
                title: title.into(),
                body: format!("{title} body"),
                hashtags: String::new(),
                scheduled_at: at,
                status,
                auto_scheduled: false,
                auto_image: false,
                auto_hashtags: false,
                external_post_id: None,
                posted_at: None,
                error_message: None,
                created_at: at,
            },
        );
    }

    #[tokio::test]
    async fn publishes_only_due_scheduled_posts_in_time_order() {
        let publisher = Arc::new(MockPublisher::new());
        let state = state(publisher.clone());
        let now = Utc::now();
        add(&state, now - ChronoDuration::minutes(5), PostStatus::Scheduled, "second");
        add(&state, now - ChronoDuration::hours(1), PostStatus::Scheduled, "first");
        add(&state, now, PostStatus::Scheduled, "boundary");
        add(&state, now + ChronoDuration::hours(1), PostStatus::Scheduled, "future");
        add(&state, now - ChronoDuration::hours(2), PostStatus::Failed, "failed");

        let report = sweep_once(&state, now).await;
        assert_eq!(
            report,
            SweepReport {
                attempted: 3,
                published: 3,
                failed: 0
            }
        );
        let order: Vec<String> = publisher
            .published()
            .into_iter()
            .map(|r| r.commentary)
            .collect();
        assert_eq!(order, vec!["first body", "second body", "boundary body"]);
        assert_eq!(
            state.posts.filter(|p| p.status == PostStatus::Scheduled).len(),
            1
        );
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_sweep() {
        let state = state(Arc::new(MockPublisher::failing("rate limited")));
        let now = Utc::now();
        add(&state, now - ChronoDuration::minutes(2), PostStatus::Scheduled, "a");
        add(&state, now - ChronoDuration::minutes(1), PostStatus::Scheduled, "b");

        let report = sweep_once(&state, now).await;
        assert_eq!(report.attempted, 2);
        assert_eq!(report.failed, 2);
        assert!(state
            .posts
            .list()
            .iter()
            .all(|p| p.status == PostStatus::Failed && p.error_message.is_some()));
    }

    #[tokio::test]
    async fn noncompliant_due_post_is_not_published() {
        let publisher = Arc::new(MockPublisher::new());
        let state = state(publisher.clone());
        let now = Utc::now();
        add(&state, now - ChronoDuration::minutes(1), PostStatus::Scheduled, "clean");
        add(&state, now - ChronoDuration::minutes(2), PostStatus::Scheduled, "sec");
        let id = state.posts.filter(|p| p.title == "sec")[0].id;
        state.posts.update(&id, |p| {
            p.body = "The SEC was our client for three years.".into();
        });

        let report = sweep_once(&state, now).await;
        assert_eq!(
            report,
            SweepReport {
                attempted: 2,
                published: 1,
                failed: 1
            }
        );
        assert_eq!(publisher.published().len(), 1);
        assert_eq!(publisher.published()[0].commentary, "clean body");
        let blocked = state.posts.get(&id).unwrap();
        assert_eq!(blocked.status, PostStatus::Failed);
        assert!(blocked.error_message.unwrap().contains("sec-relationship"));

        // A failed post is never picked up by the next sweep.
        assert_eq!(sweep_once(&state, now).await, SweepReport::default());
    }

    #[tokio::test]
    async fn empty_sweep_reports_nothing() {
        let state = state(Arc::new(MockPublisher::new()));
        assert_eq!(sweep_once(&state, Utc::now()).await, SweepReport::default());
    }
}
