//! Integration tests for the IMAP client engine.
//!
//! A scripted mock stream plays the server side of complete exchanges:
//! greeting, authentication, SELECT, fetches with literals, QRESYNC
//! reopens, IDLE pushes, and conditional stores. Commands the client
//! writes are captured so the wire form can be asserted too.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc;

use mailwren_imap::{
    AppendMessage, Capability, Client, Config, Event, FetchAttribute, FetchItem, FetchItems,
    Flag, Flags, IdleEvent, MailboxEvent, ModSeq, OpenParams, QresyncParams, SessionStart,
    StoreAction, Uid, UidSet, UidValidity,
};

/// Mock stream that returns a scripted server transcript and captures
/// everything the client writes.
struct MockStream {
    responses: Cursor<Vec<u8>>,
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(script: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                responses: Cursor::new(script.to_vec()),
                sent: Arc::clone(&sent),
            },
            sent,
        )
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.responses.position()).unwrap_or(usize::MAX);
        let data = self.responses.get_ref().clone();

        if pos >= data.len() {
            // EOF: read_response turns this into an UnexpectedEof error.
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn config() -> Config {
    Config::new("imap.example.test")
}

async fn connect_script(
    script: &[u8],
) -> (
    Client<MockStream, mailwren_imap::NotAuthenticated>,
    mpsc::Receiver<Event>,
    Arc<Mutex<Vec<u8>>>,
) {
    let (stream, sent) = MockStream::new(script);
    let (start, events) = Client::from_stream(stream, config()).await.unwrap();
    match start {
        SessionStart::NotAuthenticated(client) => (client, events, sent),
        SessionStart::Authenticated(_) => panic!("expected normal greeting"),
    }
}

fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8_lossy(&sent.lock().unwrap()).into_owned()
}

/// Drains pending mailbox events from the receiver.
fn drain_mailbox_events(rx: &mut mpsc::Receiver<Event>) -> Vec<MailboxEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Mailbox(event) = event {
            events.push(event);
        }
    }
    events
}

const SELECT_SCRIPT: &[u8] = b"* 172 EXISTS\r\n\
* 1 RECENT\r\n\
* OK [UIDVALIDITY 3857529045] Ok\r\n\
* OK [UIDNEXT 4392] Ok\r\n\
* OK [HIGHESTMODSEQ 715194045007] Ok\r\n\
* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
* OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Ok\r\n\
A0001 OK [READ-WRITE] SELECT\r\n";

#[tokio::test]
async fn capability_login_select_flow() {
    let mut script = Vec::new();
    script.extend_from_slice(
        b"* OK [CAPABILITY IMAP4rev1 IDLE UIDPLUS CONDSTORE LITERAL+] server ready\r\n",
    );
    script.extend_from_slice(
        b"A0000 OK [CAPABILITY IMAP4rev1 IDLE UIDPLUS CONDSTORE LITERAL+] authenticated\r\n",
    );
    script.extend_from_slice(SELECT_SCRIPT);

    let (client, _events, sent) = connect_script(&script).await;
    assert!(client.capabilities().supports_idle());
    assert!(client.capabilities().supports_uidplus());

    let client = client.login("user", "pass").await.unwrap();
    assert!(client.capabilities().supports_condstore());

    let (client, info) = client.select("INBOX", OpenParams::plain()).await.unwrap();

    assert_eq!(info.exists, 172);
    assert_eq!(info.recent, 1);
    assert_eq!(info.uid_validity, UidValidity::new(3_857_529_045));
    assert_eq!(info.uid_next, Uid::new(4392));
    assert_eq!(info.highest_mod_seq, ModSeq::from_u64(715_194_045_007));
    assert_eq!(info.access, mailwren_imap::FolderAccess::ReadWrite);
    assert!(info.permanent_flags.contains(&Flag::Wildcard));
    assert!(info.flags.contains(&Flag::Answered));

    let wire = sent_text(&sent);
    assert!(wire.contains("A0000 LOGIN user pass\r\n"));
    assert!(wire.contains("A0001 SELECT INBOX\r\n"));
    drop(client);
}

#[tokio::test]
async fn uid_fetch_with_literal_body() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK [CAPABILITY IMAP4rev1 LITERAL+] ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1 LITERAL+] done\r\n");
    script.extend_from_slice(SELECT_SCRIPT);
    script.extend_from_slice(b"* 1 FETCH (UID 101 BODY[] {5}\r\nHello)\r\n");
    script.extend_from_slice(b"A0002 OK FETCH\r\n");

    let (client, mut events, sent) = connect_script(&script).await;
    let client = client.login("user", "pass").await.unwrap();
    let (mut client, _info) = client.select("INBOX", OpenParams::plain()).await.unwrap();
    let _ = drain_mailbox_events(&mut events);

    let uids = UidSet::single(Uid::new(1).unwrap());
    let results = client
        .uid_fetch(
            &uids,
            FetchItems::Items(vec![
                FetchAttribute::Uid,
                FetchAttribute::Body {
                    section: None,
                    peek: false,
                    partial: None,
                },
            ]),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    let (seq, items) = &results[0];
    assert_eq!(seq.get(), 1);
    let body = items
        .iter()
        .find_map(|item| match item {
            FetchItem::Body { data, .. } => data.as_deref(),
            _ => None,
        })
        .unwrap();
    assert_eq!(body, b"Hello");

    let events = drain_mailbox_events(&mut events);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, MailboxEvent::MessageSummaryFetched { seq, .. } if seq.get() == 1))
    );

    assert!(sent_text(&sent).contains("A0002 UID FETCH 1 (UID BODY[])\r\n"));
    assert_eq!(client.known_uids().to_string(), "101");
}

#[tokio::test]
async fn expunge_shifts_sequence_map() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1] done\r\n");
    script.extend_from_slice(
        b"* 3 EXISTS\r\n* OK [UIDVALIDITY 1] Ok\r\nA0001 OK [READ-WRITE] SELECT\r\n",
    );
    script.extend_from_slice(
        b"* 1 FETCH (UID 101)\r\n* 2 FETCH (UID 102)\r\n* 3 FETCH (UID 103)\r\nA0002 OK FETCH\r\n",
    );
    script.extend_from_slice(b"* 2 EXPUNGE\r\nA0003 OK NOOP\r\n");

    let (client, mut events, _sent) = connect_script(&script).await;
    let client = client.login("user", "pass").await.unwrap();
    let (mut client, info) = client.select("INBOX", OpenParams::plain()).await.unwrap();
    assert_eq!(info.exists, 3);

    let _ = client
        .fetch(
            &mailwren_imap::SequenceSet::All,
            FetchItems::Items(vec![FetchAttribute::Uid]),
        )
        .await
        .unwrap();
    assert_eq!(client.known_uids().to_string(), "101:103");
    let _ = drain_mailbox_events(&mut events);

    client.noop().await.unwrap();

    assert_eq!(client.select_info().exists, 2);
    assert_eq!(client.known_uids().to_string(), "101,103");

    let events = drain_mailbox_events(&mut events);
    assert!(events.contains(&MailboxEvent::MessageExpunged {
        seq: mailwren_imap::SeqNum::new(2).unwrap(),
        uid: Uid::new(102),
    }));
}

#[tokio::test]
async fn qresync_reopen_with_earlier_vanished() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1 ENABLE CONDSTORE QRESYNC] done\r\n");
    script.extend_from_slice(b"* ENABLED QRESYNC\r\nA0001 OK ENABLE\r\n");
    script.extend_from_slice(b"* 3 EXISTS\r\n");
    script.extend_from_slice(b"* VANISHED (EARLIER) 41,43:45\r\n");
    script.extend_from_slice(b"* OK [UIDVALIDITY 3857529045] Ok\r\n");
    script.extend_from_slice(b"* OK [HIGHESTMODSEQ 715194045270] Ok\r\n");
    script.extend_from_slice(b"A0002 OK [READ-WRITE] SELECT\r\n");

    let (client, mut events, sent) = connect_script(&script).await;
    let mut client = client.login("user", "pass").await.unwrap();

    let enabled = client.enable(&[Capability::QResync]).await.unwrap();
    assert_eq!(enabled, vec![Capability::QResync]);

    let params = QresyncParams::new(
        UidValidity::new(3_857_529_045).unwrap(),
        ModSeq::from_u64(715_194_045_007).unwrap(),
    );
    let (client, info) = client
        .select("INBOX", OpenParams::qresync(params))
        .await
        .unwrap();

    // EARLIER vanishes never shrink the live count.
    assert_eq!(info.exists, 3);
    assert_eq!(info.highest_mod_seq, ModSeq::from_u64(715_194_045_270));

    let events = drain_mailbox_events(&mut events);
    assert!(events.iter().any(|e| matches!(
        e,
        MailboxEvent::MessagesVanished { uids, earlier: true } if uids.to_string() == "41,43:45"
    )));

    let wire = sent_text(&sent);
    assert!(wire.contains("A0002 SELECT INBOX (QRESYNC (3857529045 715194045007))\r\n"));
    drop(client);
}

#[tokio::test]
async fn idle_reports_arrivals_and_done() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK [CAPABILITY IMAP4rev1 IDLE] ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1 IDLE] done\r\n");
    script.extend_from_slice(SELECT_SCRIPT);
    script.extend_from_slice(b"+ idling\r\n");
    script.extend_from_slice(b"* 173 EXISTS\r\n");
    script.extend_from_slice(b"* 1 RECENT\r\n");
    script.extend_from_slice(b"A0002 OK IDLE terminated\r\n");

    let (client, mut events, sent) = connect_script(&script).await;
    let client = client.login("user", "pass").await.unwrap();
    let (mut client, info) = client.select("INBOX", OpenParams::plain()).await.unwrap();
    assert_eq!(info.exists, 172);
    let _ = drain_mailbox_events(&mut events);

    let mut handle = client.idle().await.unwrap();
    let first = handle.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(first, IdleEvent::Exists(173));
    let second = handle.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(second, IdleEvent::Recent(1));
    handle.done().await.unwrap();

    assert_eq!(client.select_info().exists, 173);
    assert_eq!(client.select_info().recent, 1);

    let events = drain_mailbox_events(&mut events);
    assert!(events.contains(&MailboxEvent::CountChanged(173)));
    assert!(events.contains(&MailboxEvent::MessagesArrived { count: 1 }));
    assert!(events.contains(&MailboxEvent::RecentChanged(1)));

    let wire = sent_text(&sent);
    assert!(wire.contains("A0002 IDLE\r\n"));
    assert!(wire.ends_with("DONE\r\n"));
}

#[tokio::test]
async fn store_unchangedsince_returns_modified_set() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1 CONDSTORE] done\r\n");
    script.extend_from_slice(SELECT_SCRIPT);
    script.extend_from_slice(b"A0002 OK [MODIFIED 102] STORE\r\n");

    let (client, _events, sent) = connect_script(&script).await;
    let client = client.login("user", "pass").await.unwrap();
    let (mut client, _info) = client.select("INBOX", OpenParams::plain()).await.unwrap();

    let uids = UidSet::from_uids([Uid::new(101).unwrap(), Uid::new(102).unwrap()]);
    let modified = client
        .uid_store_unchanged_since(
            &uids,
            StoreAction::AddFlags(Flags::from_vec(vec![Flag::Seen])),
            true,
            ModSeq::from_u64(1000).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(modified.to_string(), "102");
    assert!(
        sent_text(&sent)
            .contains("A0002 UID STORE 101:102 (UNCHANGEDSINCE 1000) +FLAGS.SILENT (\\Seen)\r\n")
    );
}

#[tokio::test]
async fn append_uses_synchronizing_literal_without_literal_plus() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1 UIDPLUS] done\r\n");
    script.extend_from_slice(b"+ Ready for literal data\r\n");
    script.extend_from_slice(b"A0001 OK [APPENDUID 38505 3955] APPEND\r\n");

    let (client, _events, sent) = connect_script(&script).await;
    let mut client = client.login("user", "pass").await.unwrap();

    let appended = client
        .append(
            "saved-messages",
            AppendMessage::new(b"Subject: hi\r\n\r\nbody".to_vec())
                .with_flags(Flags::from_vec(vec![Flag::Seen])),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(appended.uidvalidity.get(), 38505);
    assert_eq!(appended.uids.to_string(), "3955");

    let wire = sent_text(&sent);
    // Synchronizing form: the line ends at {19} and the body follows the
    // continuation.
    assert!(wire.contains("A0001 APPEND saved-messages (\\Seen) {19}\r\n"));
    assert!(wire.contains("Subject: hi\r\n\r\nbody\r\n"));
}

#[tokio::test]
async fn append_streams_nonsync_literal_with_literal_plus() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1 LITERAL+] done\r\n");
    script.extend_from_slice(b"A0001 OK APPEND\r\n");

    let (client, _events, sent) = connect_script(&script).await;
    let mut client = client.login("user", "pass").await.unwrap();

    let appended = client
        .append("saved-messages", AppendMessage::new(b"hello".to_vec()))
        .await
        .unwrap();
    assert!(appended.is_none());

    let wire = sent_text(&sent);
    assert!(wire.contains("A0001 APPEND saved-messages {5+}\r\nhello\r\n"));
}

#[tokio::test]
async fn uid_copy_returns_copyuid_mapping() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1 UIDPLUS] done\r\n");
    script.extend_from_slice(SELECT_SCRIPT);
    script.extend_from_slice(b"A0002 OK [COPYUID 38505 304,319:320 3956:3958] COPY\r\n");

    let (client, _events, _sent) = connect_script(&script).await;
    let client = client.login("user", "pass").await.unwrap();
    let (mut client, _info) = client.select("INBOX", OpenParams::plain()).await.unwrap();

    let uids = UidSet::parse("304,319:320").unwrap();
    let copied = client.uid_copy(&uids, "Archive").await.unwrap();

    assert_eq!(copied.uidvalidity, UidValidity::new(38505));
    assert_eq!(copied.source.len(), copied.dest.len());
    assert_eq!(copied.source.to_string(), "304,319:320");
    assert_eq!(copied.dest.to_string(), "3956:3958");
}

#[tokio::test]
async fn tagged_no_is_nonfatal_failure() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1] done\r\n");
    script.extend_from_slice(b"A0001 NO [ALREADYEXISTS] duplicate mailbox\r\n");
    script.extend_from_slice(b"A0002 OK CREATE\r\n");

    let (client, _events, _sent) = connect_script(&script).await;
    let mut client = client.login("user", "pass").await.unwrap();

    let err = client.create("Archive").await.unwrap_err();
    assert_eq!(
        err.failure_reason(),
        Some(mailwren_imap::FailureReason::AlreadyExists)
    );
    assert!(!err.is_fatal());

    // The connection stays usable after a NO.
    client.create("Archive2").await.unwrap();
}

#[tokio::test]
async fn capability_refetched_when_login_gives_none() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK ready\r\n");
    script.extend_from_slice(b"A0000 OK authenticated\r\n");
    script.extend_from_slice(b"* CAPABILITY IMAP4rev1 MOVE NAMESPACE\r\nA0001 OK done\r\n");

    let (client, _events, sent) = connect_script(&script).await;
    let client = client.login("user", "pass").await.unwrap();

    assert!(client.capabilities().supports_move());
    assert!(sent_text(&sent).contains("A0001 CAPABILITY\r\n"));
}

#[tokio::test]
async fn login_refused_when_logindisabled() {
    let script = b"* OK [CAPABILITY IMAP4rev1 LOGINDISABLED STARTTLS] ready\r\n";
    let (client, _events, sent) = connect_script(script).await;

    assert!(!client.can_login());
    let err = client.login("user", "pass").await.unwrap_err();
    assert!(matches!(err, mailwren_imap::Error::NotSupported(_)));
    // Nothing hit the wire.
    assert!(sent_text(&sent).is_empty());
}

#[tokio::test]
async fn bye_greeting_fails_connect() {
    let (stream, _sent) = MockStream::new(b"* BYE maintenance window\r\n");
    let err = Client::from_stream(stream, config()).await.unwrap_err();
    assert!(matches!(err, mailwren_imap::Error::Bye(_)));
}

#[tokio::test]
async fn preauth_greeting_skips_authentication() {
    let script = b"* PREAUTH [CAPABILITY IMAP4rev1] logged in as operator\r\n";
    let (stream, _sent) = MockStream::new(script);
    let (start, _events) = Client::from_stream(stream, config()).await.unwrap();
    assert!(matches!(start, SessionStart::Authenticated(_)));
}

#[tokio::test]
async fn search_and_esearch_results() {
    let mut script = Vec::new();
    script.extend_from_slice(b"* OK ready\r\n");
    script.extend_from_slice(b"A0000 OK [CAPABILITY IMAP4rev1 ESEARCH] done\r\n");
    script.extend_from_slice(SELECT_SCRIPT);
    script.extend_from_slice(b"* SEARCH 2 84 882\r\nA0002 OK SEARCH\r\n");
    script.extend_from_slice(
        b"* ESEARCH (TAG \"A0003\") UID MIN 2 MAX 47 COUNT 25\r\nA0003 OK SEARCH\r\n",
    );

    let (client, _events, _sent) = connect_script(&script).await;
    let client = client.login("user", "pass").await.unwrap();
    let (mut client, _info) = client.select("INBOX", OpenParams::plain()).await.unwrap();

    let ids = client
        .search(mailwren_imap::SearchCriteria::Unseen)
        .await
        .unwrap();
    assert_eq!(ids, vec![2, 84, 882]);

    let extended = client
        .search_extended(
            mailwren_imap::SearchCriteria::Unseen,
            true,
            vec![
                mailwren_imap::SearchReturn::Min,
                mailwren_imap::SearchReturn::Max,
                mailwren_imap::SearchReturn::Count,
            ],
        )
        .await
        .unwrap();
    assert_eq!(extended.min, Some(2));
    assert_eq!(extended.max, Some(47));
    assert_eq!(extended.count, Some(25));
}
