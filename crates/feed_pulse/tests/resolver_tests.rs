mod mocks;

use feed_pulse::{
    resolver::{ResolveTranscript, Stage, TranscriptResolver, TRANSCRIPTION_INSTRUCTION},
    types::{TranscriptMethod, TranscriptOutcome},
    AudioInput,
};
use mocks::{
    audio_fetcher::MockAudioFetcher, caption_source::MockCaptionSource,
    transcriber::MockTranscriber,
};
use tempfile::TempDir;

type Resolver = TranscriptResolver<MockCaptionSource, MockAudioFetcher, MockTranscriber>;

fn resolver(
    captions: &MockCaptionSource,
    audio: &MockAudioFetcher,
    transcriber: &MockTranscriber,
    scratch: &TempDir,
) -> Resolver {
    TranscriptResolver::new(
        captions.clone(),
        audio.clone(),
        transcriber.clone(),
        scratch.path(),
    )
}

fn captions_text(content: &str) -> TranscriptOutcome {
    TranscriptOutcome::Text {
        content: content.to_string(),
        method: TranscriptMethod::Captions,
    }
}

#[tokio::test]
async fn test_manual_track_preferred_over_generated() {
    let captions = MockCaptionSource::default()
        .with_track("v1", mocks::track("v1", "en", true), Some("auto words"))
        .with_track("v1", mocks::track("v1", "en", false), Some("manual words"));
    let audio = MockAudioFetcher::default();
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(&captions, &audio, &MockTranscriber::new("x"), &scratch);

    let outcome = resolver.resolve("v1").await;

    assert_eq!(outcome, captions_text("manual words"));
    assert_eq!(captions.fetches(), ["v1/en/manual"]);
    assert_eq!(audio.call_count(), 0);
}

#[tokio::test]
async fn test_generated_track_used_when_manual_missing() {
    let captions = MockCaptionSource::default()
        .with_track("v1", mocks::track("v1", "en-US", true), Some("auto\nwords"));
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(
        &captions,
        &MockAudioFetcher::default(),
        &MockTranscriber::new("x"),
        &scratch,
    );

    assert_eq!(resolver.resolve("v1").await, captions_text("auto words"));
}

#[tokio::test]
async fn test_manual_track_that_fails_falls_back_to_generated() {
    let captions = MockCaptionSource::default()
        .with_track("v1", mocks::track("v1", "en", false), None)
        .with_track("v1", mocks::track("v1", "en", true), Some("auto words"));
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(
        &captions,
        &MockAudioFetcher::default(),
        &MockTranscriber::new("x"),
        &scratch,
    );

    assert_eq!(resolver.resolve("v1").await, captions_text("auto words"));
    assert_eq!(captions.fetches(), ["v1/en/manual", "v1/en/asr"]);
}

#[tokio::test]
async fn test_whitespace_only_track_is_not_a_transcript() {
    let captions = MockCaptionSource::default()
        .with_track("v1", mocks::track("v1", "en", false), Some("  \n "))
        .with_track("v1", mocks::track("v1", "en", true), Some("auto words"));
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(
        &captions,
        &MockAudioFetcher::default(),
        &MockTranscriber::new("x"),
        &scratch,
    );

    assert_eq!(resolver.resolve("v1").await, captions_text("auto words"));
}

#[tokio::test]
async fn test_foreign_track_translated_to_english() {
    let spanish = mocks::track("v1", "es", false);
    let captions = MockCaptionSource::default()
        .with_track("v1", spanish.clone(), Some("hola"))
        .with_translation(&spanish, "hello");
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(
        &captions,
        &MockAudioFetcher::default(),
        &MockTranscriber::new("x"),
        &scratch,
    );

    assert_eq!(resolver.resolve("v1").await, captions_text("hello"));
    assert_eq!(captions.fetches(), ["v1/es/manual->en"]);
}

#[tokio::test]
async fn test_restricted_listing_never_downloads() {
    let captions =
        MockCaptionSource::default().with_list_error("v1", "This video is Members Only");
    let audio = MockAudioFetcher::default();
    let transcriber = MockTranscriber::new("x");
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(&captions, &audio, &transcriber, &scratch);

    let outcome = resolver.resolve("v1").await;

    assert_eq!(
        outcome,
        TranscriptOutcome::RestrictedAccess {
            reason: "This video is Members Only".into()
        }
    );
    assert_eq!(audio.call_count(), 0);
    assert_eq!(transcriber.call_count(), 0);
}

#[tokio::test]
async fn test_generic_listing_error_continues_to_audio() {
    let captions = MockCaptionSource::default().with_list_error("v1", "HTTP Error 429");
    let audio = MockAudioFetcher::default();
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(&captions, &audio, &MockTranscriber::new("spoken"), &scratch);

    let outcome = resolver.resolve("v1").await;

    assert_eq!(
        outcome,
        TranscriptOutcome::Text {
            content: "spoken".into(),
            method: TranscriptMethod::AudioTranscription,
        }
    );
    assert_eq!(audio.call_count(), 1);
}

#[tokio::test]
async fn test_download_restriction_markers() {
    for message in [
        "ERROR: Join this channel to get access to members-only content",
        "This live event is members only",
        "ERROR: Private video. Sign in if you've been granted access",
        "ERROR: Video unavailable",
    ] {
        let captions = MockCaptionSource::default();
        let transcriber = MockTranscriber::new("x");
        let scratch = TempDir::new().unwrap();
        let resolver = resolver(
            &captions,
            &MockAudioFetcher::failing(message),
            &transcriber,
            &scratch,
        );

        let outcome = resolver.resolve("v1").await;

        assert!(
            matches!(outcome, TranscriptOutcome::RestrictedAccess { .. }),
            "{message} should be restricted"
        );
        assert_eq!(transcriber.call_count(), 0);
    }
}

#[tokio::test]
async fn test_generic_failures_yield_one_attempt_per_stage() {
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(
        &MockCaptionSource::default(),
        &MockAudioFetcher::failing("HTTP Error 403: Forbidden"),
        &MockTranscriber::new("x"),
        &scratch,
    );

    let TranscriptOutcome::Unavailable { attempts } = resolver.resolve("v1").await else {
        panic!("expected an unavailable outcome");
    };

    assert_eq!(
        attempts,
        [
            "captions: no caption tracks",
            "audio_transcription: audio download failed: HTTP Error 403: Forbidden",
        ]
    );
}

#[tokio::test]
async fn test_missing_download_skips_transcription() {
    let transcriber = MockTranscriber::new("x");
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(
        &MockCaptionSource::default(),
        &MockAudioFetcher::without_file(),
        &transcriber,
        &scratch,
    );

    let outcome = resolver.resolve("v1").await;

    assert!(matches!(outcome, TranscriptOutcome::Unavailable { .. }));
    assert_eq!(transcriber.call_count(), 0);
}

#[tokio::test]
async fn test_scratch_audio_removed_after_failed_transcription() {
    let audio = MockAudioFetcher::default();
    let transcriber = MockTranscriber::failing("413 Payload Too Large");
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(&MockCaptionSource::default(), &audio, &transcriber, &scratch);

    let TranscriptOutcome::Unavailable { attempts } = resolver.resolve("v1").await else {
        panic!("expected an unavailable outcome");
    };

    assert!(attempts[1].contains("413 Payload Too Large"));
    assert_eq!(*transcriber.file_existed.lock().unwrap(), [true]);
    let paths = audio.downloaded_paths();
    assert_eq!(paths.len(), 1);
    assert!(!paths[0].exists());
}

#[tokio::test]
async fn test_scratch_audio_removed_after_success() {
    let audio = MockAudioFetcher::default();
    let transcriber = MockTranscriber::new("  spoken words \n");
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(&MockCaptionSource::default(), &audio, &transcriber, &scratch);

    let outcome = resolver.resolve("v1").await;

    assert_eq!(
        outcome,
        TranscriptOutcome::Text {
            content: "spoken words".into(),
            method: TranscriptMethod::AudioTranscription,
        }
    );
    assert_eq!(transcriber.calls.lock().unwrap()[0].1, TRANSCRIPTION_INSTRUCTION);
    assert!(!audio.downloaded_paths()[0].exists());
}

#[tokio::test]
async fn test_chunked_transcription_uses_scratch_chunk_dir() {
    let audio = MockAudioFetcher::default();
    let transcriber = MockTranscriber::new("spoken");
    let scratch = TempDir::new().unwrap();
    let resolver =
        resolver(&MockCaptionSource::default(), &audio, &transcriber, &scratch).with_chunking(600);

    resolver.resolve("v1").await;

    let calls = transcriber.calls.lock().unwrap().clone();
    match &calls[0].0 {
        AudioInput::Chunked {
            chunk_duration_seconds,
            chunks_dir_path,
            file_path,
        } => {
            assert_eq!(*chunk_duration_seconds, 600);
            assert_eq!(chunks_dir_path, &scratch.path().join("v1_chunks"));
            assert_eq!(file_path, &scratch.path().join("v1.mp3"));
        }
        other => panic!("expected chunked input, got {other:?}"),
    }
    assert!(!scratch.path().join("v1_chunks").exists());
}

#[tokio::test]
async fn test_captions_only_stage_list_never_downloads() {
    let audio = MockAudioFetcher::default();
    let scratch = TempDir::new().unwrap();
    let resolver = resolver(
        &MockCaptionSource::default(),
        &audio,
        &MockTranscriber::new("x"),
        &scratch,
    )
    .with_stages(vec![Stage::Captions]);

    let outcome = resolver.resolve("v1").await;

    assert_eq!(
        outcome,
        TranscriptOutcome::Unavailable {
            attempts: vec!["captions: no caption tracks".into()]
        }
    );
    assert_eq!(audio.call_count(), 0);
    assert_eq!(resolver.stages(), [Stage::Captions]);
}
