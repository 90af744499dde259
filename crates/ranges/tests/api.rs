use tlsn_data_fixtures::http::{
    request::{GET_WITH_HEADER, POST_JSON},
    response::OK_JSON,
};
use tlsn_ranges::{
    complement, locate_all, Commit, Direction, ErrorKind, Reveal, Transcript, TranscriptConfig,
};

/// Tests that a prover can withhold a header from the verifier end-to-end.
#[test]
fn test_api() {
    let config = TranscriptConfig::builder()
        .max_sent_data(1024)
        .max_recv_data(1024)
        .build()
        .unwrap();
    let transcript = Transcript::with_config(GET_WITH_HEADER, OK_JSON, &config).unwrap();

    // Prover locates the secret header in the parsed request.
    let request = transcript.parse_sent().unwrap();
    let secret = request.headers_with_name("secret").next().unwrap();

    // Prover commits to everything except the secret header line.
    let mut builder = Commit::builder(&transcript);
    builder
        .all_except(Direction::Sent, [secret.line()])
        .unwrap()
        .all_except(Direction::Received, Vec::<&str>::new())
        .unwrap();
    let commit = builder.build().unwrap();

    let (sent_len, recv_len) = transcript.len();
    assert_eq!(
        commit.sent,
        vec![0..secret.range.start, secret.range.end..sent_len]
    );
    assert_eq!(commit.recv, vec![0..recv_len]);

    // Prover reveals what it committed to.
    let reveal = Reveal::from(commit);
    reveal.validate(&transcript).unwrap();

    // Verifier sees the remaining bytes, the secret shows up as redacted.
    let mut partial = vec![0u8; sent_len];
    for range in &reveal.sent {
        partial[range.clone()].copy_from_slice(&transcript.sent()[range.clone()]);
    }
    let partial = Transcript::new(partial, transcript.recv());

    assert_eq!(partial.redacted(Direction::Sent), vec![secret.range.clone()]);
    assert!(!partial.sent_text().contains("test_secret"));
    assert!(partial.sent_text().contains("host: example.com\r\n"));
}

/// Tests that JSON members of a response body can be revealed selectively.
#[test]
fn test_reveal_json_members() {
    let transcript = Transcript::new(GET_WITH_HEADER, OK_JSON);

    let ranges = transcript.ranges(Direction::Received).unwrap();

    let reveal = Reveal {
        sent: vec![0..transcript.sent().len()],
        recv: vec![
            ranges.info.clone(),
            ranges.json["information.name"].clone(),
            ranges.json["meta.version"].clone(),
        ],
        server_identity: true,
    };
    reveal.validate(&transcript).unwrap();

    let revealed: Vec<&[u8]> = reveal
        .recv
        .iter()
        .map(|range| &OK_JSON[range.clone()])
        .collect();
    assert_eq!(
        revealed,
        vec![
            &b"HTTP/1.1 200 OK\r\n"[..],
            &br#""name":"John Doe""#[..],
            &br#""version":"1.0""#[..],
        ]
    );

    let json = serde_json::to_value(&reveal).unwrap();
    assert_eq!(json["recv"][0], serde_json::json!({ "start": 0, "end": 17 }));
    assert_eq!(json["server_identity"], serde_json::json!(true));
}

/// Tests that the line classifier agrees with the HTTP parser on header
/// lines.
#[test]
fn test_lines_match_headers() {
    let transcript = Transcript::new(POST_JSON, OK_JSON);

    let message = transcript.parse_sent().unwrap();
    let lines = transcript.lines(Direction::Sent).unwrap();

    for header in &message.headers {
        let line = lines
            .iter()
            .find(|commitment| commitment.name.as_deref() == Some(header.name.as_str()))
            .unwrap();

        assert_eq!(line.range, header.range);
    }

    let account = lines
        .iter()
        .find(|commitment| commitment.path.as_deref() == Some("account.pin"))
        .unwrap();
    assert_eq!(&POST_JSON[account.range.clone()], br#""pin":"0000""#);
}

/// Tests that secrets given as literal needles can be withheld without
/// parsing the transcript.
#[test]
fn test_withhold_literal_needles() {
    let secrets = locate_all(POST_JSON, ["Bearer t0ken", r#""pin":"0000""#]).unwrap();

    let reveal = complement(&(0..POST_JSON.len()), &secrets).unwrap();

    let revealed: Vec<u8> = reveal
        .iter()
        .flat_map(|range| POST_JSON[range.clone()].to_vec())
        .collect();
    assert_eq!(
        revealed.len(),
        POST_JSON.len() - secrets.iter().map(|range| range.len()).sum::<usize>()
    );
    assert!(!String::from_utf8_lossy(&revealed).contains("t0ken"));

    let err = locate_all(POST_JSON, ["password"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
