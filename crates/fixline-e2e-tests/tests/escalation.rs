//! End-to-end tests for offer escalation, capacity, and re-matching.

mod helpers;

use helpers::*;

use fixline_core::{CancelReason, JobStatus, OfferOutcome, WorkerId};
use fixline_engine::NotifierEvent;

// ============================================================================
// Escalation Order
// ============================================================================

#[tokio::test(start_paused = true)]
async fn decline_escalates_to_next_best_candidate() {
    // Ratings order the candidates: w-best first, then w-next.
    let (engine, _registry, notifier) =
        test_engine(&[electrician("w-next", 4.0, 3), electrician("w-best", 5.0, 3)]);

    let job = engine.submit_job_request(electrical_request()).unwrap();
    engine.confirm_quote(&job.id).unwrap();

    let first = notifier.wait_for_offer(0).await;
    assert_eq!(first, WorkerId::new("w-best"));
    engine.worker_decline(&job.id, &first).unwrap();

    let second = notifier.wait_for_offer(1).await;
    assert_eq!(second, WorkerId::new("w-next"));
    engine.worker_accept(&job.id, &second).unwrap();

    notifier
        .wait_for(|events| {
            events
                .iter()
                .any(|e| matches!(e, NotifierEvent::Assigned { .. }))
        })
        .await;

    let assigned = engine.job(&job.id).unwrap();
    assert_eq!(assigned.assigned_worker, Some(second.clone()));
    let outcomes: Vec<(WorkerId, OfferOutcome)> = assigned
        .offers()
        .iter()
        .map(|o| (o.worker_id.clone(), o.outcome))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (first, OfferOutcome::Declined),
            (second, OfferOutcome::Accepted),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn unanswered_offer_times_out_and_escalates() {
    let (engine, _registry, notifier) =
        test_engine(&[electrician("w-slow", 5.0, 3), electrician("w-ready", 4.0, 3)]);

    let job = engine.submit_job_request(electrical_request()).unwrap();
    engine.confirm_quote(&job.id).unwrap();

    // w-slow never answers; paused time runs the 15-minute deadline out.
    let first = notifier.wait_for_offer(0).await;
    assert_eq!(first, WorkerId::new("w-slow"));

    let second = notifier.wait_for_offer(1).await;
    assert_eq!(second, WorkerId::new("w-ready"));
    engine.worker_accept(&job.id, &second).unwrap();

    notifier
        .wait_for(|events| {
            events
                .iter()
                .any(|e| matches!(e, NotifierEvent::Assigned { .. }))
        })
        .await;

    let assigned = engine.job(&job.id).unwrap();
    assert_eq!(assigned.offers()[0].outcome, OfferOutcome::Expired);
    assert_eq!(assigned.offers()[1].outcome, OfferOutcome::Accepted);
    // the expired offer's deadline is recorded in its decision time
    assert!(assigned.offers()[0].decided_at >= assigned.offers()[0].offered_at);
}

#[tokio::test(start_paused = true)]
async fn exhausting_all_candidates_parks_the_job() {
    let (engine, registry, notifier) =
        test_engine(&[electrician("w-1", 4.5, 3), electrician("w-2", 4.0, 3)]);

    let job = engine.submit_job_request(electrical_request()).unwrap();
    engine.confirm_quote(&job.id).unwrap();

    for n in 0..2 {
        let offered_to = notifier.wait_for_offer(n).await;
        engine.worker_decline(&job.id, &offered_to).unwrap();
    }

    notifier
        .wait_for(|events| {
            events
                .iter()
                .any(|e| matches!(e, NotifierEvent::Unassigned { .. }))
        })
        .await;

    let parked = engine.job(&job.id).unwrap();
    assert_eq!(parked.status(), JobStatus::Unassigned);
    assert_eq!(parked.offers().len(), 2);
    // every reservation was returned
    for worker in ["w-1", "w-2"] {
        assert_eq!(registry.stats(&WorkerId::new(worker)).unwrap().open_jobs, 0);
    }
}

// ============================================================================
// Capacity Under Concurrent Jobs
// ============================================================================

#[tokio::test(start_paused = true)]
async fn full_worker_blocks_second_job_until_completion() {
    let (engine, registry, notifier) = test_engine(&[electrician("w-1", 4.8, 1)]);
    let w = WorkerId::new("w-1");

    // First job takes the worker's only slot.
    let job_a = engine.submit_job_request(electrical_request()).unwrap();
    engine.confirm_quote(&job_a.id).unwrap();
    let offered_to = notifier.wait_for_offer(0).await;
    engine.worker_accept(&job_a.id, &offered_to).unwrap();
    notifier
        .wait_for(|events| {
            events
                .iter()
                .any(|e| matches!(e, NotifierEvent::Assigned { .. }))
        })
        .await;
    assert_eq!(registry.stats(&w).unwrap().open_jobs, 1);

    // Second job finds no capacity and parks, with no offer sent.
    let job_b = engine.submit_job_request(electrical_request()).unwrap();
    engine.confirm_quote(&job_b.id).unwrap();
    notifier
        .wait_for(|events| {
            events
                .iter()
                .any(|e| matches!(e, NotifierEvent::Unassigned { job_id } if job_id == &job_b.id))
        })
        .await;
    assert!(engine.job(&job_b.id).unwrap().offers().is_empty());

    // First job completes; the sweeper re-matches the parked one.
    engine.report_job_started(&job_a.id).unwrap();
    engine.report_job_completed(&job_a.id).unwrap();
    let sweeper = engine.start();

    let offered_again = notifier.wait_for_offer(1).await;
    assert_eq!(offered_again, w);
    engine.worker_accept(&job_b.id, &offered_again).unwrap();
    notifier
        .wait_for(|events| {
            events
                .iter()
                .any(|e| matches!(e, NotifierEvent::Assigned { job_id, .. } if job_id == &job_b.id))
        })
        .await;

    assert_eq!(engine.job(&job_b.id).unwrap().status(), JobStatus::Assigned);
    engine.stop();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }
}

// ============================================================================
// Unassigned Jobs and the Retry Window
// ============================================================================

#[tokio::test(start_paused = true)]
async fn parked_job_is_rematched_when_a_worker_appears() {
    let (engine, registry, notifier) = test_engine(&[]);

    let job = engine.submit_job_request(electrical_request()).unwrap();
    engine.confirm_quote(&job.id).unwrap();
    notifier
        .wait_for(|events| {
            events
                .iter()
                .any(|e| matches!(e, NotifierEvent::Unassigned { .. }))
        })
        .await;

    // A new electrician registers; the sweeper picks the job back up.
    registry.register(electrician("w-late", 4.9, 3)).unwrap();
    let sweeper = engine.start();

    let offered_to = notifier.wait_for_offer(0).await;
    assert_eq!(offered_to, WorkerId::new("w-late"));
    engine.worker_accept(&job.id, &offered_to).unwrap();
    notifier
        .wait_for(|events| {
            events
                .iter()
                .any(|e| matches!(e, NotifierEvent::Assigned { .. }))
        })
        .await;

    assert_eq!(engine.job(&job.id).unwrap().status(), JobStatus::Assigned);
    engine.stop();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }
}

#[tokio::test(start_paused = true)]
async fn unservable_job_is_cancelled_after_the_retry_window() {
    let (engine, _registry, notifier) = test_engine(&[]);

    let job = engine.submit_job_request(electrical_request()).unwrap();
    engine.confirm_quote(&job.id).unwrap();
    let sweeper = engine.start();

    // No worker ever registers; after the retry window the sweeper
    // gives up on the job.
    notifier
        .wait_for(|events| {
            events.iter().any(|e| {
                matches!(
                    e,
                    NotifierEvent::Cancelled {
                        reason: CancelReason::NoWorkerFound,
                        ..
                    }
                )
            })
        })
        .await;

    let cancelled = engine.job(&job.id).unwrap();
    assert_eq!(cancelled.status(), JobStatus::Cancelled);
    assert_eq!(cancelled.cancel_reason, Some(CancelReason::NoWorkerFound));
    engine.stop();
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }
}
