//! Session-level tests over a scripted mock stream.
//!
//! The mock asserts the exact command bytes the session writes and feeds
//! back canned server replies, covering the full cycle surface: greeting,
//! LOGIN, EXAMINE, SEARCH, FETCH and LOGOUT.

#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use ordersentry_imap::{BodySection, Error, FetchSpec, SearchQuery, Session};

#[tokio::test]
async fn full_scan_conversation() {
    let header = b"Subject: Your Order #000021753\r\n";
    let body = b"Credit Card United Kingdom Grand Total (Incl.Tax) \xc2\xa314.19";

    let fetch_reply = format!(
        "* 3 FETCH (BODY[HEADER.FIELDS (FROM TO SUBJECT DATE CONTENT-TYPE)] {{{}}}\r\n",
        header.len()
    );
    let mut fetch_bytes = fetch_reply.into_bytes();
    fetch_bytes.extend_from_slice(header);
    fetch_bytes.extend_from_slice(format!(" BODY[TEXT] {{{}}}\r\n", body.len()).as_bytes());
    fetch_bytes.extend_from_slice(body);
    fetch_bytes.extend_from_slice(b")\r\n");

    let mock = tokio_test::io::Builder::new()
        .read(b"* OK IMAP4rev1 service ready\r\n")
        .write(b"C0001 LOGIN scanner sekrit\r\n")
        .read(b"C0001 OK authenticated\r\n")
        .write(b"C0002 EXAMINE MAGENTO_ORDERS\r\n")
        .read(b"* 12 EXISTS\r\n")
        .read(b"C0002 OK [READ-ONLY] examine completed\r\n")
        .write(b"C0003 SEARCH SINCE 03-Jan-2026 BODY \"Credit Card\"\r\n")
        .read(b"* SEARCH 3\r\n")
        .read(b"C0003 OK search completed\r\n")
        .write(
            b"C0004 FETCH 3 (BODY.PEEK[HEADER.FIELDS (FROM TO SUBJECT DATE CONTENT-TYPE)] BODY.PEEK[TEXT])\r\n",
        )
        .read(&fetch_bytes)
        .read(b"C0004 OK fetch completed\r\n")
        .write(b"C0005 LOGOUT\r\n")
        .read(b"* BYE logging out\r\n")
        .read(b"C0005 OK bye\r\n")
        .build();

    let mut session = Session::login(mock, "scanner", "sekrit").await.unwrap();
    assert!(session.open_box().is_none());

    session.open("MAGENTO_ORDERS").await.unwrap();
    assert_eq!(session.open_box(), Some("MAGENTO_ORDERS"));

    let since = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
    let query = SearchQuery::And(vec![
        SearchQuery::Since(since),
        SearchQuery::Body("Credit Card".to_string()),
    ]);
    let seqs = session.search(&query).await.unwrap();
    assert_eq!(seqs, vec![3]);

    let messages = session
        .fetch(&seqs, &FetchSpec::scan_default())
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].seq, 3);
    assert_eq!(
        messages[0].header_value("Subject").as_deref(),
        Some("Your Order #000021753")
    );
    assert!(
        String::from_utf8_lossy(messages[0].section(BodySection::Text).unwrap())
            .contains("United Kingdom")
    );

    session.close().await;
    assert!(session.is_closed());
}

#[tokio::test]
async fn login_rejection_is_an_auth_error() {
    let mock = tokio_test::io::Builder::new()
        .read(b"* OK ready\r\n")
        .write(b"C0001 LOGIN scanner wrong\r\n")
        .read(b"C0001 NO [AUTHENTICATIONFAILED] invalid credentials\r\n")
        .build();

    let err = Session::login(mock, "scanner", "wrong").await.unwrap_err();
    assert!(matches!(err, Error::Auth(_)), "got {err:?}");
}

#[tokio::test]
async fn examine_failure_leaves_no_box_open() {
    let mock = tokio_test::io::Builder::new()
        .read(b"* OK ready\r\n")
        .write(b"C0001 LOGIN scanner sekrit\r\n")
        .read(b"C0001 OK authenticated\r\n")
        .write(b"C0002 EXAMINE Nonexistent\r\n")
        .read(b"C0002 NO no such mailbox\r\n")
        .build();

    let mut session = Session::login(mock, "scanner", "sekrit").await.unwrap();
    let err = session.open("Nonexistent").await.unwrap_err();
    assert!(matches!(err, Error::No(_)));
    assert!(session.open_box().is_none());
}

#[tokio::test]
async fn search_requires_an_open_box() {
    let mock = tokio_test::io::Builder::new()
        .read(b"* OK ready\r\n")
        .write(b"C0001 LOGIN scanner sekrit\r\n")
        .read(b"C0001 OK authenticated\r\n")
        .build();

    let mut session = Session::login(mock, "scanner", "sekrit").await.unwrap();
    let err = session.search(&SearchQuery::All).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[tokio::test]
async fn greeting_bye_refuses_the_connection() {
    let mock = tokio_test::io::Builder::new()
        .read(b"* BYE too many connections\r\n")
        .build();

    let err = Session::login(mock, "scanner", "sekrit").await.unwrap_err();
    assert!(matches!(err, Error::Bye(_)));
}
