use std::io::Write;
use std::time::Duration;

use bytes_counter::encoder;
use bytes_counter::Blob;
use bytes_counter::Composite;
use bytes_counter::CounterConfig;
use bytes_counter::SizeEvent;
use bytes_counter::Value;

use crate::common::*;

#[tokio::test]
async fn text_sizes_match_utf8_encoding() {
    let (coordinator, mut events) = native_coordinator(CounterConfig::default());

    for text in ["test", "zażółć gęślą jaźń", "🔥 on €"] {
        coordinator.set_value(text);
        assert_eq!(settled_size(&mut events).await, text.len() as u64);
        assert_eq!(encoder::str_bytes(text), text.len() as u64);
    }
}

#[tokio::test]
async fn multipart_form_is_measured_through_the_native_host() {
    let config = CounterConfig::default();
    let (coordinator, mut events) = native_coordinator(config.clone());

    let mut form = Composite::form();
    form.append("title", "zażółć").append("count", "3");
    coordinator.set_value(form);

    let expected = multipart_text_len(&config, &[("title", "zażółć"), ("count", "3")]);
    assert_eq!(settled_size(&mut events).await, expected);
}

#[tokio::test]
async fn urlencoded_query_is_measured_through_the_native_host() {
    let (coordinator, mut events) = native_coordinator(CounterConfig::default());

    let query = Composite::query_from_pairs([("q", "rust lang"), ("x", "ą")]);
    // q=rust+lang&x=%C4%85
    assert_eq!(coordinator.calculate(query).await, Some(20));

    coordinator.set_value(Composite::query_from_pairs([("a", "1")]));
    assert_eq!(settled_size(&mut events).await, 3);
}

#[tokio::test]
async fn file_backed_blob_reports_its_metadata_size() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all("ą".repeat(512).as_bytes()).unwrap();
    file.flush().unwrap();

    let (coordinator, mut events) = native_coordinator(CounterConfig::default());
    coordinator.set_value(Blob::from_path(file.path()).unwrap());

    assert_eq!(settled_size(&mut events).await, 1024);
}

#[tokio::test]
async fn form_with_file_entry_includes_file_contents() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"0123456789").unwrap();
    file.flush().unwrap();

    let config = CounterConfig::default();
    let (coordinator, _events) = native_coordinator(config.clone());

    let mut with_file = Composite::form();
    with_file.append_file(
        "upload",
        "digits.txt",
        Blob::from_path(file.path()).unwrap().with_media_type("text/plain"),
    );
    let mut with_text = Composite::form();
    with_text.append("upload", "0123456789");

    let file_size = coordinator.calculate(with_file).await.unwrap();
    let text_size = coordinator.calculate(with_text).await.unwrap();
    let headers = "; filename=\"digits.txt\"\r\nContent-Type: text/plain".len() as u64;
    assert_eq!(file_size, text_size + headers);
}

#[tokio::test]
async fn query_with_file_entry_is_a_computation_error() {
    let (coordinator, mut events) = native_coordinator(CounterConfig::default());

    let mut query = Composite::query();
    query.append_file("f", "a.bin", Blob::from_parts([b"abc"]));
    coordinator.set_value(query);

    match tokio::time::timeout(EVENT_TIMEOUT, events.recv()).await {
        Ok(Some(SizeEvent::ComputationError { message })) => {
            assert!(message.contains("Host cannot build a message body"), "{message}");
        }
        other => panic!("expected a computation error, got {other:?}"),
    }
    assert_eq!(coordinator.size(), None);

    coordinator.set_value(Value::Absent);
    assert_eq!(coordinator.size(), Some(0));
}

#[tokio::test]
async fn rapid_assignments_settle_on_the_last_value() {
    let (coordinator, mut events) = native_coordinator(CounterConfig::default());

    for n in 1..=50 {
        coordinator.set_value("x".repeat(n));
    }
    assert_eq!(settled_size(&mut events).await, 50);

    let quiet = tokio::time::timeout(Duration::from_millis(50), events.recv()).await;
    assert!(quiet.is_err(), "unexpected extra event: {quiet:?}");
}

#[tokio::test(start_paused = true)]
async fn override_file_configures_debounce_delay() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "[coordinator]\ndebounce_delay_ms = 250").unwrap();
    file.flush().unwrap();

    let config = CounterConfig::default()
        .with_override_config(file.path().to_str().unwrap())
        .unwrap()
        .validate()
        .unwrap();
    assert_eq!(config.coordinator.debounce_delay_ms, 250);

    let (coordinator, mut events) = native_coordinator(config);
    coordinator.set_value("late");

    tokio::time::advance(Duration::from_millis(200)).await;
    tokio::task::yield_now().await;
    assert!(events.try_recv().is_err());

    assert_eq!(settled_size(&mut events).await, 4);
}
