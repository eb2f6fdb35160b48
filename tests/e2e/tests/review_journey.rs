//! Journey: discover cards, review them over simulated weeks, watch the
//! schedule respond.

use chrono::{Duration, TimeZone, Utc};
use recall_e2e_tests::harness::TestDeck;
use recall_core::{Rating, Scheduler};

fn fixed_start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
}

#[test]
fn discover_review_and_reschedule() {
    let deck = TestDeck::new();
    let scheduler = Scheduler::default();

    deck.write_note(
        "rust.md",
        "Q: What does `?` do?\nA: Propagates errors to the caller.\n\n\
         Q: What is a slice?\nA: A view into a contiguous sequence.\n",
    );
    deck.register_notes_source();
    let reports = deck.sync();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].cards_added, 2);

    // Both cards start due (new cards are due the moment they are stored)
    let now = Utc::now();
    let due = deck.store.due_cards(now, None).unwrap();
    assert_eq!(due.len(), 2);
    assert!(due.iter().all(|c| c.is_new()));

    // First exposure: Good pushes the card out by its initial stability
    let first = &due[0];
    let reviewed = deck
        .store
        .apply_review(&first.hash, Rating::Good, &scheduler, now)
        .unwrap();
    assert_eq!(reviewed.stability, 2.5);
    assert_eq!(reviewed.difficulty, 5.0);
    assert_eq!(
        reviewed.due_at,
        now + Duration::hours(60) // 2.5 days
    );

    // Only the unreviewed card remains due right now
    let due = deck.store.due_cards(now, None).unwrap();
    assert_eq!(due.len(), 1);
    assert_ne!(due[0].hash, reviewed.hash);
}

#[test]
fn successful_reviews_stretch_intervals() {
    let deck = TestDeck::new();
    let scheduler = Scheduler::default();

    deck.write_note("one.md", "Q: only card\nA: yes\n");
    deck.register_notes_source();
    deck.sync();

    let hash = deck.store.all_cards().unwrap()[0].hash.clone();
    let mut now = fixed_start();
    let mut previous_interval = Duration::zero();

    // Review Good at each due date; intervals must grow every time
    for _ in 0..6 {
        let card = deck
            .store
            .apply_review(&hash, Rating::Good, &scheduler, now)
            .unwrap();
        let interval = card.due_at - now;
        assert!(
            interval > previous_interval,
            "interval should grow: {:?} vs {:?}",
            interval,
            previous_interval
        );
        previous_interval = interval;
        now = card.due_at;
    }

    // A lapse collapses the schedule back to a short interval
    let lapsed = deck
        .store
        .apply_review(&hash, Rating::Again, &scheduler, now)
        .unwrap();
    assert!(lapsed.due_at - now < previous_interval);
    assert!(lapsed.stability >= scheduler.params().stability_floor);
    assert!(lapsed.difficulty > 5.0, "failure raises difficulty");

    // History recorded every event, newest first
    let history = deck.store.review_history(&hash, 100).unwrap();
    assert_eq!(history.len(), 7);
    assert_eq!(history[0].rating, Rating::Again);
}

#[test]
fn hard_grind_keeps_state_in_bounds() {
    let deck = TestDeck::new();
    let scheduler = Scheduler::default();

    deck.write_note("grind.md", "Q: stubborn card\nA: hard to keep\n");
    deck.register_notes_source();
    deck.sync();

    let hash = deck.store.all_cards().unwrap()[0].hash.clone();
    let mut now = fixed_start();

    // Alternate failures and hard recalls for a long stretch
    for i in 0..40 {
        let rating = if i % 3 == 0 { Rating::Again } else { Rating::Hard };
        let card = deck
            .store
            .apply_review(&hash, rating, &scheduler, now)
            .unwrap();

        assert!(card.stability > 0.0 && card.stability.is_finite());
        assert!((1.0..=10.0).contains(&card.difficulty));
        assert!(card.due_at >= now);
        now = card.due_at + Duration::minutes(5);
    }

    // Constant failure pins difficulty at the ceiling, never past it
    let card = deck.store.get_card(&hash).unwrap().unwrap();
    assert_eq!(card.difficulty, 10.0);
}
