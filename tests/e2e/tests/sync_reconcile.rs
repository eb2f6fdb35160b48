//! Journey: sources change on disk and in git; reconciliation converges the
//! store without touching review state of surviving cards.

use std::fs;

use recall_e2e_tests::harness::TestDeck;
use recall_core::{clone_or_pull, Rating, Scheduler};

#[test]
fn edits_add_and_orphan_cards() {
    let deck = TestDeck::new();

    let note = deck.write_note(
        "deck.md",
        "Q: alpha\nA: first\n\nQ: beta\nA: second\n",
    );
    deck.register_notes_source();

    let reports = deck.sync();
    assert_eq!(reports[0].cards_added, 2);

    // Rewriting one card changes its identity: one orphan out, one card in
    fs::write(&note, "Q: alpha\nA: first\n\nQ: gamma\nA: third\n").unwrap();
    let reports = deck.sync();
    assert_eq!(reports[0].cards_added, 1);
    assert_eq!(reports[0].cards_removed, 1);

    let questions: Vec<String> = deck
        .store
        .all_cards()
        .unwrap()
        .into_iter()
        .map(|c| c.question)
        .collect();
    assert!(questions.contains(&"alpha".to_string()));
    assert!(questions.contains(&"gamma".to_string()));
    assert!(!questions.contains(&"beta".to_string()));
}

#[test]
fn surviving_cards_keep_their_schedule() {
    let deck = TestDeck::new();
    let scheduler = Scheduler::default();

    let note = deck.write_note("deck.md", "Q: keeper\nA: stays\n\nQ: goner\nA: leaves\n");
    deck.register_notes_source();
    deck.sync();

    let keeper_hash = deck
        .store
        .all_cards()
        .unwrap()
        .into_iter()
        .find(|c| c.question == "keeper")
        .unwrap()
        .hash;
    let reviewed = deck
        .store
        .apply_review(&keeper_hash, Rating::Easy, &scheduler, chrono::Utc::now())
        .unwrap();

    // Whitespace-only edits do not change identity; dropping a card does
    fs::write(&note, "Q:   keeper  \nA: stays\n").unwrap();
    let reports = deck.sync();
    assert_eq!(reports[0].cards_added, 0);
    assert_eq!(reports[0].cards_removed, 1);

    let survivor = deck.store.get_card(&keeper_hash).unwrap().unwrap();
    assert_eq!(survivor.stability, reviewed.stability);
    assert_eq!(survivor.due_at, reviewed.due_at);
}

#[test]
fn removing_a_source_removes_its_cards() {
    let deck = TestDeck::new();

    deck.write_note("deck.md", "Q: q\nA: a\n");
    let source = deck.register_notes_source();
    deck.sync();
    assert_eq!(deck.store.stats(chrono::Utc::now()).unwrap().total_cards, 1);

    assert!(deck.store.remove_source(source.id).unwrap());
    assert_eq!(deck.store.stats(chrono::Utc::now()).unwrap().total_cards, 0);
}

#[test]
fn git_mirror_feeds_reconciliation() {
    let deck = TestDeck::new();

    // Stand up a local "remote" with one note
    let upstream_dir = tempfile::TempDir::new().unwrap();
    let upstream = git2::Repository::init(upstream_dir.path()).unwrap();
    fs::write(
        upstream_dir.path().join("cards.md"),
        "Q: from upstream\nA: v1\n",
    )
    .unwrap();
    commit_all(&upstream, "v1");

    // Mirror it, then register the mirror checkout as a source
    let url = upstream_dir.path().to_str().unwrap().to_string();
    let mirror = deck.repos_dir.join("mirror");
    clone_or_pull(&url, &mirror).unwrap();
    deck.register_dir_source(&mirror);

    let reports = deck.sync();
    assert_eq!(reports[0].cards_added, 1);

    // Upstream rewrites the card; pull + sync converges on the new content
    fs::write(
        upstream_dir.path().join("cards.md"),
        "Q: from upstream\nA: v2\n",
    )
    .unwrap();
    commit_all(&upstream, "v2");
    clone_or_pull(&url, &mirror).unwrap();

    let reports = deck.sync();
    assert_eq!(reports[0].cards_added, 1);
    assert_eq!(reports[0].cards_removed, 1);

    let cards = deck.store.all_cards().unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].answer, "v2");
}

fn commit_all(repo: &git2::Repository, message: &str) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = git2::Signature::now("tester", "tester@example.com").unwrap();
    match repo.head() {
        Ok(head) => {
            let parent = head.peel_to_commit().unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
                .unwrap();
        }
        Err(_) => {
            repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[])
                .unwrap();
        }
    }
}
