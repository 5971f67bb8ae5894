//! Command serialization.
//!
//! Commands are encoded into a sequence of line and literal parts. The
//! connection layer decides per literal whether to use the synchronizing
//! `{n}` form (flush, await `+`, send bytes) or the non-synchronizing
//! `{n+}` form, so the encoder never emits the brace prefix itself.

use crate::types::{Flags, Mailbox};

use super::types::{
    AppendMessage, FetchAttribute, FetchItems, NotifyRequest, SearchCriteria, SortKey, StoreAction,
};

/// One phase of an encoded command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandPart {
    /// Text to send on the command line. The final `Line` of a command is
    /// terminated with CRLF by the writer; earlier lines are terminated by
    /// the literal prefix of the following part.
    Line(Vec<u8>),
    /// Raw literal bytes.
    Literal(Vec<u8>),
}

/// A fully encoded command, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    /// Alternating line and literal parts, starting and ending with a line.
    pub parts: Vec<CommandPart>,
}

impl EncodedCommand {
    /// Returns the number of literal phases.
    #[must_use]
    pub fn literal_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, CommandPart::Literal(_)))
            .count()
    }

    /// Renders the command as it would appear with non-synchronizing
    /// literals. Used by tests and for debug logging.
    #[must_use]
    pub fn to_wire_nonsync(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, part) in self.parts.iter().enumerate() {
            match part {
                CommandPart::Line(line) => {
                    out.extend_from_slice(line);
                    if i + 1 == self.parts.len() {
                        out.extend_from_slice(b"\r\n");
                    }
                }
                CommandPart::Literal(data) => {
                    out.extend_from_slice(format!("{{{}+}}\r\n", data.len()).as_bytes());
                    out.extend_from_slice(data);
                }
            }
        }
        out
    }
}

/// Incremental command encoder.
pub struct CommandEncoder {
    parts: Vec<CommandPart>,
    line: Vec<u8>,
}

impl CommandEncoder {
    /// Starts a command with its tag.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        let mut line = Vec::with_capacity(64);
        line.extend_from_slice(tag.as_bytes());
        line.push(b' ');
        Self {
            parts: Vec::new(),
            line,
        }
    }

    /// Starts an untagged line (only DONE uses this).
    #[must_use]
    pub fn untagged() -> Self {
        Self {
            parts: Vec::new(),
            line: Vec::new(),
        }
    }

    /// Appends raw text to the current line.
    pub fn text(&mut self, s: &str) {
        self.line.extend_from_slice(s.as_bytes());
    }

    /// Appends a single byte to the current line.
    pub fn byte(&mut self, b: u8) {
        self.line.push(b);
    }

    /// Appends an astring: atom when possible, quoted when printable,
    /// literal otherwise (8-bit content, CR, or LF).
    pub fn astring(&mut self, s: &str) {
        if !s.is_empty() && s.bytes().all(is_plain_atom_char) {
            self.line.extend_from_slice(s.as_bytes());
        } else if s.bytes().all(is_quotable_char) {
            self.line.push(b'"');
            for b in s.bytes() {
                if b == b'"' || b == b'\\' {
                    self.line.push(b'\\');
                }
                self.line.push(b);
            }
            self.line.push(b'"');
        } else {
            self.literal(s.as_bytes().to_vec());
        }
    }

    /// Appends a mailbox name.
    pub fn mailbox(&mut self, mailbox: &Mailbox) {
        self.astring(mailbox.as_str());
    }

    /// Ends the current line and emits a literal phase.
    pub fn literal(&mut self, data: Vec<u8>) {
        self.parts.push(CommandPart::Line(std::mem::take(&mut self.line)));
        self.parts.push(CommandPart::Literal(data));
    }

    /// Finishes the command.
    #[must_use]
    pub fn finish(mut self) -> EncodedCommand {
        self.parts.push(CommandPart::Line(self.line));
        EncodedCommand { parts: self.parts }
    }

    /// Appends a parenthesized flag list.
    pub fn flag_list(&mut self, flags: &Flags) {
        self.byte(b'(');
        for (i, flag) in flags.iter().enumerate() {
            if i > 0 {
                self.byte(b' ');
            }
            self.text(flag.as_str());
        }
        self.byte(b')');
    }
}

/// Atom-safe bytes for unquoted arguments.
const fn is_plain_atom_char(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'&' | b'\'' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b';'
                | b'<' | b'=' | b'>' | b'?' | b'@' | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}

/// Bytes representable inside a quoted string.
const fn is_quotable_char(b: u8) -> bool {
    b.is_ascii() && b != b'\r' && b != b'\n'
}

/// Writes FETCH items.
pub fn write_fetch_items(enc: &mut CommandEncoder, items: &FetchItems) {
    match items {
        FetchItems::All => enc.text("ALL"),
        FetchItems::Full => enc.text("FULL"),
        FetchItems::Fast => enc.text("FAST"),
        FetchItems::Items(attrs) => {
            if attrs.len() == 1 {
                write_fetch_attribute(enc, &attrs[0]);
            } else {
                enc.byte(b'(');
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        enc.byte(b' ');
                    }
                    write_fetch_attribute(enc, attr);
                }
                enc.byte(b')');
            }
        }
    }
}

/// Writes a single FETCH attribute.
fn write_fetch_attribute(enc: &mut CommandEncoder, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Flags => enc.text("FLAGS"),
        FetchAttribute::InternalDate => enc.text("INTERNALDATE"),
        FetchAttribute::Rfc822Size => enc.text("RFC822.SIZE"),
        FetchAttribute::Envelope => enc.text("ENVELOPE"),
        FetchAttribute::BodyStructure => enc.text("BODYSTRUCTURE"),
        FetchAttribute::Uid => enc.text("UID"),
        FetchAttribute::ModSeq => enc.text("MODSEQ"),
        FetchAttribute::Body {
            section,
            peek,
            partial,
        } => {
            enc.text(if *peek { "BODY.PEEK[" } else { "BODY[" });
            if let Some(s) = section {
                enc.text(s);
            }
            enc.byte(b']');
            if let Some((start, len)) = partial {
                enc.text(&format!("<{start}.{len}>"));
            }
        }
        FetchAttribute::Binary {
            section,
            peek,
            partial,
        } => {
            enc.text(if *peek { "BINARY.PEEK[" } else { "BINARY[" });
            enc.text(section);
            enc.byte(b']');
            if let Some((start, len)) = partial {
                enc.text(&format!("<{start}.{len}>"));
            }
        }
        FetchAttribute::BinarySize { section } => {
            enc.text("BINARY.SIZE[");
            enc.text(section);
            enc.byte(b']');
        }
        FetchAttribute::GmailMsgId => enc.text("X-GM-MSGID"),
        FetchAttribute::GmailThreadId => enc.text("X-GM-THRID"),
        FetchAttribute::GmailLabels => enc.text("X-GM-LABELS"),
        FetchAttribute::Preview => enc.text("PREVIEW"),
        FetchAttribute::SaveDate => enc.text("SAVEDATE"),
        FetchAttribute::EmailId => enc.text("EMAILID"),
        FetchAttribute::ThreadId => enc.text("THREADID"),
    }
}

/// Writes a STORE action with its operands.
pub fn write_store_action(enc: &mut CommandEncoder, action: &StoreAction, silent: bool) {
    let silent_suffix = if silent { ".SILENT" } else { "" };
    match action {
        StoreAction::SetFlags(flags) => {
            enc.text(&format!("FLAGS{silent_suffix} "));
            enc.flag_list(flags);
        }
        StoreAction::AddFlags(flags) => {
            enc.text(&format!("+FLAGS{silent_suffix} "));
            enc.flag_list(flags);
        }
        StoreAction::RemoveFlags(flags) => {
            enc.text(&format!("-FLAGS{silent_suffix} "));
            enc.flag_list(flags);
        }
        StoreAction::SetLabels(labels) => {
            enc.text(&format!("X-GM-LABELS{silent_suffix} "));
            write_label_list(enc, labels);
        }
        StoreAction::AddLabels(labels) => {
            enc.text(&format!("+X-GM-LABELS{silent_suffix} "));
            write_label_list(enc, labels);
        }
        StoreAction::RemoveLabels(labels) => {
            enc.text(&format!("-X-GM-LABELS{silent_suffix} "));
            write_label_list(enc, labels);
        }
    }
}

fn write_label_list(enc: &mut CommandEncoder, labels: &[crate::types::Label]) {
    enc.byte(b'(');
    for (i, label) in labels.iter().enumerate() {
        if i > 0 {
            enc.byte(b' ');
        }
        // System labels like \Inbox are atoms; user labels are astrings.
        if label.as_str().starts_with('\\') {
            enc.text(label.as_str());
        } else {
            enc.astring(label.as_str());
        }
    }
    enc.byte(b')');
}

/// Writes SEARCH criteria.
#[allow(clippy::too_many_lines)]
pub fn write_search_criteria(enc: &mut CommandEncoder, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => enc.text("ALL"),
        SearchCriteria::Answered => enc.text("ANSWERED"),
        SearchCriteria::Unanswered => enc.text("UNANSWERED"),
        SearchCriteria::Deleted => enc.text("DELETED"),
        SearchCriteria::Undeleted => enc.text("UNDELETED"),
        SearchCriteria::Draft => enc.text("DRAFT"),
        SearchCriteria::Undraft => enc.text("UNDRAFT"),
        SearchCriteria::Flagged => enc.text("FLAGGED"),
        SearchCriteria::Unflagged => enc.text("UNFLAGGED"),
        SearchCriteria::Seen => enc.text("SEEN"),
        SearchCriteria::Unseen => enc.text("UNSEEN"),
        SearchCriteria::New => enc.text("NEW"),
        SearchCriteria::Old => enc.text("OLD"),
        SearchCriteria::Recent => enc.text("RECENT"),
        SearchCriteria::Keyword(k) => {
            enc.text("KEYWORD ");
            enc.astring(k);
        }
        SearchCriteria::Unkeyword(k) => {
            enc.text("UNKEYWORD ");
            enc.astring(k);
        }
        SearchCriteria::SequenceSet(set) => enc.text(&set.to_string()),
        SearchCriteria::Uid(set) => {
            enc.text("UID ");
            enc.text(&set.to_string());
        }
        SearchCriteria::Subject(s) => {
            enc.text("SUBJECT ");
            enc.astring(s);
        }
        SearchCriteria::From(s) => {
            enc.text("FROM ");
            enc.astring(s);
        }
        SearchCriteria::To(s) => {
            enc.text("TO ");
            enc.astring(s);
        }
        SearchCriteria::Cc(s) => {
            enc.text("CC ");
            enc.astring(s);
        }
        SearchCriteria::Bcc(s) => {
            enc.text("BCC ");
            enc.astring(s);
        }
        SearchCriteria::Body(s) => {
            enc.text("BODY ");
            enc.astring(s);
        }
        SearchCriteria::Text(s) => {
            enc.text("TEXT ");
            enc.astring(s);
        }
        SearchCriteria::Header(name, value) => {
            enc.text("HEADER ");
            enc.astring(name);
            enc.byte(b' ');
            enc.astring(value);
        }
        SearchCriteria::Since(date) => {
            enc.text("SINCE ");
            enc.text(date);
        }
        SearchCriteria::Before(date) => {
            enc.text("BEFORE ");
            enc.text(date);
        }
        SearchCriteria::On(date) => {
            enc.text("ON ");
            enc.text(date);
        }
        SearchCriteria::SentSince(date) => {
            enc.text("SENTSINCE ");
            enc.text(date);
        }
        SearchCriteria::SentBefore(date) => {
            enc.text("SENTBEFORE ");
            enc.text(date);
        }
        SearchCriteria::SentOn(date) => {
            enc.text("SENTON ");
            enc.text(date);
        }
        SearchCriteria::Larger(size) => enc.text(&format!("LARGER {size}")),
        SearchCriteria::Smaller(size) => enc.text(&format!("SMALLER {size}")),
        SearchCriteria::ModSeq(modseq) => enc.text(&format!("MODSEQ {modseq}")),
        SearchCriteria::GmailRaw(s) => {
            enc.text("X-GM-RAW ");
            enc.astring(s);
        }
        SearchCriteria::And(criteria) => {
            for (i, c) in criteria.iter().enumerate() {
                if i > 0 {
                    enc.byte(b' ');
                }
                write_search_criteria(enc, c);
            }
        }
        SearchCriteria::Or(a, b) => {
            enc.text("OR ");
            write_search_criteria(enc, a);
            enc.byte(b' ');
            write_search_criteria(enc, b);
        }
        SearchCriteria::Not(c) => {
            enc.text("NOT ");
            write_search_criteria(enc, c);
        }
    }
}

/// Writes the sort-key program of a SORT command.
pub fn write_sort_keys(enc: &mut CommandEncoder, keys: &[SortKey]) {
    enc.byte(b'(');
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            enc.byte(b' ');
        }
        enc.text(key.as_str());
    }
    enc.byte(b')');
}

/// Writes one APPEND message: optional flags, optional date, then the
/// body as a literal.
pub fn write_append_message(enc: &mut CommandEncoder, message: &AppendMessage) {
    if let Some(ref flags) = message.flags {
        enc.byte(b' ');
        enc.flag_list(flags);
    }
    if let Some(ref date) = message.internal_date {
        enc.byte(b' ');
        enc.byte(b'"');
        enc.text(date);
        enc.byte(b'"');
    }
    enc.byte(b' ');
    enc.literal(message.body.clone());
}

/// Writes a NOTIFY request.
pub fn write_notify_request(enc: &mut CommandEncoder, request: &NotifyRequest) {
    match request {
        NotifyRequest::None => enc.text("NONE"),
        NotifyRequest::Selected(events) => {
            enc.text("SET (SELECTED (");
            for (i, event) in events.iter().enumerate() {
                if i > 0 {
                    enc.byte(b' ');
                }
                enc.text(event.as_str());
            }
            enc.text("))");
        }
    }
}

/// Filters a flag set for APPEND/STORE: only client-settable flags go on
/// the wire.
pub fn settable_flags(flags: &Flags) -> Flags {
    flags.settable()
}
