use httpmock::Method::GET;
use httpmock::MockServer;

use voice_reminders::error::VoiceRemindersError;
use voice_reminders::interfaces::speech::SpeechProvider;
use voice_reminders::providers::google_tts::GoogleTranslateTts;
use voice_reminders::speech::Language;

#[tokio::test]
async fn long_text_is_fetched_in_order_and_concatenated() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/translate_tts")
                .query_param("idx", "0")
                .query_param("total", "2")
                .query_param("tl", "mr");
            then.status(200).body("part-one|");
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/translate_tts")
                .query_param("idx", "1")
                .query_param("total", "2")
                .query_param("tl", "mr");
            then.status(200).body("part-two");
        })
        .await;

    let provider = GoogleTranslateTts::new(Some(server.base_url()), None).unwrap();
    let text = "aushadhi ".repeat(15);
    let audio = provider
        .synthesize(&text, &Language::Marathi)
        .await
        .expect("synthesize");

    assert_eq!(audio.as_ref(), b"part-one|part-two");
    first.assert_calls(1);
    second.assert_calls(1);
}

#[tokio::test]
async fn empty_body_is_a_synthesis_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/translate_tts");
            then.status(200);
        })
        .await;

    let provider = GoogleTranslateTts::new(Some(server.base_url()), None).unwrap();
    let err = provider
        .synthesize("Namaste", &Language::Hindi)
        .await
        .unwrap_err();
    assert!(matches!(err, VoiceRemindersError::SynthesisFailed(_)));
}

#[tokio::test]
async fn unreachable_provider_is_a_synthesis_failure() {
    // Nothing listens on the discard port.
    let provider =
        GoogleTranslateTts::new(Some("http://127.0.0.1:9".to_string()), None).unwrap();
    let err = provider
        .synthesize("Namaste", &Language::Hindi)
        .await
        .unwrap_err();
    assert!(format!("{err}").contains("provider unreachable"));
}

#[tokio::test]
async fn blank_text_is_rejected_without_a_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/translate_tts");
            then.status(200).body("audio");
        })
        .await;

    let provider = GoogleTranslateTts::new(Some(server.base_url()), None).unwrap();
    let err = provider.synthesize("  ", &Language::Hindi).await.unwrap_err();
    assert_eq!(format!("{err}"), "speech synthesis failed: no text to speak");
    mock.assert_calls(0);
}
