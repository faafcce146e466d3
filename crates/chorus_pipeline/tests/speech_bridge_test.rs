//! Speech continuation bridge tests.

mod test_utils;

use candle_core::{Device, Tensor};
use chorus_core::SpeakerProfile;
use chorus_error::{ChorusErrorKind, SpeechErrorKind};
use chorus_pipeline::{SpeechBridge, reply_embedding};
use std::sync::Arc;
use test_utils::{MockTalker, MockVocoder};

fn snapshot(values: &[f32]) -> Tensor {
    Tensor::new(values, &Device::Cpu).unwrap().reshape((1, values.len())).unwrap()
}

#[test]
fn test_reply_embedding_is_first_plus_last() {
    let snapshots = vec![
        snapshot(&[1.0, 2.0, 3.0]),
        snapshot(&[100.0, 100.0, 100.0]),
        snapshot(&[10.0, 20.0, 30.0]),
    ];

    let embedding = reply_embedding(&snapshots).unwrap();

    assert_eq!(embedding.dims(), &[1, 3]);
    assert_eq!(
        embedding.flatten_all().unwrap().to_vec1::<f32>().unwrap(),
        vec![11.0, 22.0, 33.0]
    );
}

#[tokio::test]
async fn test_continue_reply_passes_embedding_and_speaker() {
    let talker = Arc::new(MockTalker::new());
    let vocoder = Arc::new(MockVocoder::new());
    let bridge = SpeechBridge::new(talker.clone(), vocoder.clone());

    let waveform = bridge
        .continue_reply(
            &[snapshot(&[0.5, 0.5]), snapshot(&[1.5, -0.5])],
            "Hi.",
            SpeakerProfile::new("orion"),
        )
        .await
        .unwrap();

    assert_eq!(*waveform.sample_rate(), 16_000);
    assert_eq!(waveform.samples().len(), 3 * 160);
    assert_eq!(talker.embeddings(), vec![Some(vec![2.0, 0.0])]);
    assert_eq!(
        vocoder.speakers.lock().unwrap().as_slice(),
        &["orion".to_string()]
    );
}

#[tokio::test]
async fn test_withheld_embedding_is_text_to_speech() {
    let talker = Arc::new(MockTalker::new());
    let bridge = SpeechBridge::new(talker.clone(), Arc::new(MockVocoder::new()));

    let waveform = bridge
        .speak("Welcome aboard.", SpeakerProfile::new("luna"))
        .await
        .unwrap();

    assert!(!waveform.samples().is_empty());
    assert_eq!(talker.embeddings(), vec![None]);
}

#[tokio::test]
async fn test_silent_talker_is_an_error() {
    let talker = Arc::new(MockTalker {
        silent: true,
        ..MockTalker::default()
    });
    let vocoder = Arc::new(MockVocoder::new());
    let bridge = SpeechBridge::new(talker, vocoder.clone());

    let err = bridge
        .speak("Anyone there?", SpeakerProfile::new("luna"))
        .await
        .unwrap_err();

    match err.kind() {
        ChorusErrorKind::Speech(e) => assert_eq!(e.kind, SpeechErrorKind::NoAudioTokens),
        other => panic!("unexpected error {}", other),
    }
    assert_eq!(vocoder.call_count(), 0);
}

#[tokio::test]
async fn test_reply_waveform_persists_as_wav() {
    let bridge = SpeechBridge::new(Arc::new(MockTalker::new()), Arc::new(MockVocoder::new()));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("replies/answer.wav");

    let waveform = bridge
        .speak("Done.", SpeakerProfile::new("luna"))
        .await
        .unwrap();
    waveform.write_wav(&path).unwrap();

    let metadata = std::fs::metadata(&path).unwrap();
    // Two bytes per sample plus the RIFF header.
    assert!(metadata.len() > 2 * 5 * 160);
}
