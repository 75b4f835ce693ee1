use page_sim::{NodeKind, ReadyState, SimDocument, SimMedia};

fn page_with_player() -> (SimDocument, page_sim::NodeId) {
    let mut doc = SimDocument::new("https://video.example.test/watch?v=1");
    let main = doc.append_element(doc.root(), "main").expect("append main");
    let video = doc
        .append_media(main, SimMedia::unloaded())
        .expect("append video");
    (doc, video)
}

#[test]
fn media_becomes_seekable_after_metadata_loads() {
    let (mut doc, video) = page_with_player();

    let media = doc.media_mut(video).expect("video is media");
    media.load_metadata(240.0).expect("finite duration");
    media.set_ready_state(ReadyState::HaveEnoughData);

    let media = doc.media(video).expect("video still attached");
    assert_eq!(media.duration(), 240.0);
    assert_eq!(media.seekable().len(), 1);
    assert_eq!(media.seekable()[0].end, 240.0);
    assert_eq!(media.ready_state().level(), 4);
}

#[test]
fn advance_playback_moves_only_playing_media() {
    let (mut doc, playing) = page_with_player();
    let paused = doc
        .append_media(doc.root(), SimMedia::loaded(90.0).expect("duration"))
        .expect("append paused");
    {
        let media = doc.media_mut(playing).expect("media");
        media.load_metadata(90.0).expect("duration");
        media.seek(10.0).expect("seek");
        media.play();
    }

    doc.advance_playback(500);
    doc.advance_playback(500);

    let playing_position = doc.media(playing).expect("media").position();
    assert!((playing_position - 11.0).abs() < 1e-9);
    assert_eq!(doc.media(paused).expect("media").position(), 0.0);
}

#[test]
fn spa_navigation_replaces_content_and_location() {
    let (mut doc, video) = page_with_player();
    let main = doc.children(doc.root())[0];

    doc.history_mut()
        .push_state("https://video.example.test/watch?v=2");
    doc.remove(main).expect("remove old content");
    let next = doc
        .append_media(doc.root(), SimMedia::loaded(30.0).expect("duration"))
        .expect("append new video");

    assert_eq!(doc.location(), "https://video.example.test/watch?v=2");
    assert!(doc.media(video).is_none());
    assert!(matches!(doc.kind(next), Some(NodeKind::Media(_))));

    assert!(doc.history_mut().back());
    assert_eq!(doc.location(), "https://video.example.test/watch?v=1");
}

#[test]
fn silent_assignment_changes_location_without_new_entry() {
    let (mut doc, _) = page_with_player();

    doc.history_mut()
        .assign_silently("https://video.example.test/shorts/9");

    assert_eq!(doc.location(), "https://video.example.test/shorts/9");
    assert_eq!(doc.history().entries().len(), 1);
}
