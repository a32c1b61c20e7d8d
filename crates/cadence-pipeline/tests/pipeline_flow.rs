//! End-to-end pipeline runs against scripted collaborators.

use std::sync::Arc;

use cadence_client::mock::{
    MockImagePrompter, MockImageRenderer, MockNarrativeOrderer, MockPublisher, MockTagSelector,
};
use cadence_client::Collaborators;
use cadence_core::{ContentType, PostId};
use cadence_pipeline::{
    process_campaign, process_post, schedule_campaign, PipelineOptions, PostInput, ProcessOutcome,
};
use cadence_schedule::{AssignmentSource, NarrativeItem, SlotConfig, SINGLE_ITEM_REASON};
use chrono::{DateTime, Utc};

fn friday() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-10-16T15:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn collaborators(orderer: MockNarrativeOrderer) -> Collaborators {
    Collaborators {
        orderer: Some(Arc::new(orderer)),
        tagger: Some(Arc::new(MockTagSelector::Reply(vec![
            "#GovTech".into(),
            "#Invented".into(),
            "dataanalytics".into(),
        ]))),
        prompter: Some(Arc::new(MockImagePrompter::Reply(
            "Teal grid\u{2014}gold accents, no people".into(),
        ))),
        renderer: Some(Arc::new(MockImageRenderer::returning(vec![0x89, b'P', b'N', b'G']))),
        publisher: Arc::new(MockPublisher::new()),
    }
}

fn post(id: i64, title: &str, body: &str) -> PostInput {
    PostInput {
        id: PostId::new(id),
        title: title.into(),
        body: body.into(),
        hashtags: String::new(),
        has_image: false,
    }
}

fn item(id: i64, ct: ContentType) -> NarrativeItem {
    NarrativeItem {
        id: PostId::new(id),
        title: format!("Post {id}"),
        content_type: ct,
    }
}

#[tokio::test]
async fn full_run_tags_images_and_schedules() {
    let dir = tempfile::tempdir().unwrap();
    let options = PipelineOptions::all(Some(dir.path().to_path_buf()), friday());

    let outcome = process_post(
        &post(7, "Intake, rebuilt", "Our 60% processing time reduction proves it."),
        &[],
        &collaborators(MockNarrativeOrderer::Reverse),
        &options,
    )
    .await;

    let p = outcome.accepted().expect("accepted");
    assert!(p.fixed.body.contains("[METRIC REMOVED]"));
    assert_eq!(p.tags, "#BHTLabs #GovTech #DataAnalytics");

    let image = p.image.as_ref().expect("image");
    assert!(image.filename.starts_with("auto-7-"));
    assert_eq!(image.prompt, "Teal grid: gold accents, no people");
    assert!(dir.path().join(&image.filename).exists());

    // Earliest free Monday slot is fine for a general post.
    assert!(p.scheduled_at.is_some());
}

#[tokio::test]
async fn rejection_skips_collaborators() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = Arc::new(MockImageRenderer::returning(vec![1]));
    let mut collabs = collaborators(MockNarrativeOrderer::Reverse);
    collabs.renderer = Some(renderer.clone());

    let outcome = process_post(
        &post(8, "Status", "BHT Insight is now available to every agency."),
        &[],
        &collabs,
        &PipelineOptions::all(Some(dir.path().to_path_buf()), friday()),
    )
    .await;

    assert!(matches!(outcome, ProcessOutcome::Rejected(_)));
    assert!(renderer.prompts().is_empty());
}

#[tokio::test]
async fn campaign_feeds_each_slot_into_the_next() {
    let options = PipelineOptions {
        auto_image: false,
        ..PipelineOptions::all(None, friday())
    };
    let posts = [
        post(1, "One", "First update."),
        post(2, "Two", "We worked directly with DOJ on this."),
        post(3, "Three", "Third update, and our solution."),
    ];

    let summary = process_campaign(
        &posts,
        &[],
        &collaborators(MockNarrativeOrderer::Reverse),
        &options,
    )
    .await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.auto_fixed, 1);
    assert_eq!(summary.imaged, 0);

    let slots: Vec<_> = summary
        .results
        .iter()
        .filter_map(|r| r.accepted().and_then(|p| p.scheduled_at))
        .collect();
    assert_eq!(slots.len(), 2);
    assert_ne!(slots[0], slots[1]);
}

#[tokio::test]
async fn campaign_order_comes_from_collaborator_when_valid() {
    let items = [
        item(1, ContentType::General),
        item(2, ContentType::General),
        item(3, ContentType::General),
    ];
    let out = schedule_campaign(
        &items,
        &[],
        &collaborators(MockNarrativeOrderer::Reverse),
        &SlotConfig::default(),
        friday(),
    )
    .await;

    let order: Vec<i64> = out.iter().map(|a| a.post_id.get()).collect();
    assert_eq!(order, vec![3, 2, 1]);
    assert!(out.iter().all(|a| a.source == AssignmentSource::Collaborator));
    assert!(out[0].slot < out[1].slot && out[1].slot < out[2].slot);
}

#[tokio::test]
async fn campaign_falls_back_on_bad_or_failed_ordering() {
    let items = [item(1, ContentType::General), item(2, ContentType::General)];
    for orderer in [
        MockNarrativeOrderer::Fixed(vec![PostId::new(2)]),
        MockNarrativeOrderer::Failing,
    ] {
        let out = schedule_campaign(
            &items,
            &[],
            &collaborators(orderer),
            &SlotConfig::default(),
            friday(),
        )
        .await;
        assert_eq!(out[0].post_id, PostId::new(1));
        assert!(out.iter().all(|a| a.source == AssignmentSource::OriginalOrder));
    }
}

#[tokio::test]
async fn single_item_campaign_uses_preference() {
    let items = [item(9, ContentType::Vision)];
    let out = schedule_campaign(
        &items,
        &[],
        &collaborators(MockNarrativeOrderer::Failing),
        &SlotConfig::default(),
        friday(),
    )
    .await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].reason, SINGLE_ITEM_REASON);
    assert_eq!(out[0].source, AssignmentSource::Preference);
}
