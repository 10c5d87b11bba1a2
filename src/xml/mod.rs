//! XML rendering of connection records
//!
//! Output shape (emitted without whitespace):
//!
//! ```text
//! <flow type="new">
//!   <meta direction="original">
//!     <layer3 protonum="2" protoname="ipv4"><src>..</src><dst>..</dst></layer3>
//!     <layer4 protonum="6" protoname="tcp"><sport>..</sport><dport>..</dport></layer4>
//!     <counters><packets>..</packets><bytes>..</bytes></counters>
//!   </meta>
//!   <meta direction="reply">...</meta>
//!   <meta direction="independent">
//!     <timeout>..</timeout><mark>..</mark><use>..</use><assured/><unreplied/>
//!   </meta>
//! </flow>
//! ```
//!
//! Rendering is a pure function of the record; it may run concurrently on
//! distinct records.

mod writer;

use std::fmt::{self, Write};

use tracing::debug;

use crate::attr::{Attr, AttributeId};
use crate::error::{ConntrackError, Result};
use crate::proto::{has_ports, l3_proto_name, l4_proto_name, AF_INET, AF_INET6, UNKNOWN_PROTO_NAME};
use crate::record::{AddressValue, ConnectionRecord, Direction, StatusFlags};

use writer::BoundedWriter;

/// Kind of conntrack event being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    New,
    Update,
    Destroy,
    /// Any other message type; rendered as a bare `<flow>`
    Unknown(u32),
}

impl From<u32> for MessageKind {
    fn from(val: u32) -> Self {
        match val {
            1 => MessageKind::New,
            2 => MessageKind::Update,
            4 => MessageKind::Destroy,
            other => MessageKind::Unknown(other),
        }
    }
}

impl MessageKind {
    fn type_name(self) -> Option<&'static str> {
        match self {
            MessageKind::New => Some("new"),
            MessageKind::Update => Some("update"),
            MessageKind::Destroy => Some("destroy"),
            MessageKind::Unknown(_) => None,
        }
    }
}

/// Why rendering stopped
enum Fault {
    Exhausted,
    Record(ConntrackError),
}

impl From<fmt::Error> for Fault {
    fn from(_: fmt::Error) -> Self {
        Fault::Exhausted
    }
}

impl From<ConntrackError> for Fault {
    fn from(e: ConntrackError) -> Self {
        Fault::Record(e)
    }
}

type Step = std::result::Result<(), Fault>;

/// Render `ct` into `buf`, returning the number of bytes written.
///
/// On `Truncated` the contents of `buf` are unspecified and must be
/// discarded; nothing is written past `buf.len()`.
pub fn render(ct: &ConnectionRecord, kind: MessageKind, buf: &mut [u8]) -> Result<usize> {
    let capacity = buf.len();
    let mut w = BoundedWriter::new(buf);
    match write_flow(&mut w, ct, kind) {
        Ok(()) => Ok(w.len()),
        Err(Fault::Exhausted) => {
            debug!(
                "render truncated after {} of {} bytes",
                w.len(),
                capacity
            );
            Err(ConntrackError::Truncated { capacity })
        }
        Err(Fault::Record(e)) => Err(e),
    }
}

/// Render into a fresh buffer of `capacity` bytes
pub fn render_bounded(ct: &ConnectionRecord, kind: MessageKind, capacity: usize) -> Result<String> {
    let mut buf = vec![0u8; capacity];
    let len = render(ct, kind, &mut buf)?;
    buf.truncate(len);
    // only whole &str pieces are ever copied in
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render without a size bound
pub fn render_string(ct: &ConnectionRecord, kind: MessageKind) -> Result<String> {
    let mut out = String::new();
    match write_flow(&mut out, ct, kind) {
        Ok(()) => Ok(out),
        Err(Fault::Record(e)) => Err(e),
        // String never refuses a write
        Err(Fault::Exhausted) => Err(ConntrackError::Truncated { capacity: out.len() }),
    }
}

fn write_flow<W: Write>(w: &mut W, ct: &ConnectionRecord, kind: MessageKind) -> Step {
    match kind.type_name() {
        Some(name) => write!(w, "<flow type=\"{}\">", name)?,
        None => w.write_str("<flow>")?,
    }

    write_meta(w, ct, Direction::Original)?;
    write_meta(w, ct, Direction::Reply)?;

    // decided once; also gates the closing tag
    let has_independent = ct
        .presence()
        .test_any(&[Attr::Timeout, Attr::Mark, Attr::Use, Attr::Status]);

    if has_independent {
        w.write_str("<meta direction=\"independent\">")?;
    }
    if let Some(timeout) = ct.timeout() {
        write!(w, "<timeout>{}</timeout>", timeout)?;
    }
    if let Some(mark) = ct.mark() {
        write!(w, "<mark>{}</mark>", mark)?;
    }
    if let Some(use_count) = ct.use_count() {
        write!(w, "<use>{}</use>", use_count)?;
    }
    if let Some(status) = ct.status() {
        if status.contains(StatusFlags::ASSURED) {
            w.write_str("<assured/>")?;
        }
        if !status.contains(StatusFlags::SEEN_REPLY) {
            w.write_str("<unreplied/>")?;
        }
    }
    if has_independent {
        w.write_str("</meta>")?;
    }

    w.write_str("</flow>")?;
    Ok(())
}

fn write_meta<W: Write>(w: &mut W, ct: &ConnectionRecord, dir: Direction) -> Step {
    let attrs = dir.tuple_attrs();
    let l3 = ct
        .l3proto(dir)
        .ok_or(ConntrackError::PresenceViolation(attrs.l3proto.name()))?;
    let l4 = ct
        .l4proto(dir)
        .ok_or(ConntrackError::PresenceViolation(attrs.l4proto.name()))?;

    write!(w, "<meta direction=\"{}\">", dir.name())?;

    write!(
        w,
        "<layer3 protonum=\"{}\" protoname=\"{}\">",
        l3,
        l3_proto_name(l3).unwrap_or(UNKNOWN_PROTO_NAME)
    )?;
    write_addr(w, "src", l3, ct.src_addr(dir))?;
    write_addr(w, "dst", l3, ct.dst_addr(dir))?;
    w.write_str("</layer3>")?;

    write!(
        w,
        "<layer4 protonum=\"{}\" protoname=\"{}\">",
        l4,
        l4_proto_name(l4).unwrap_or(UNKNOWN_PROTO_NAME)
    )?;
    if has_ports(l4) {
        if let Some(port) = ct.port_src(dir) {
            write!(w, "<sport>{}</sport>", port)?;
        }
        if let Some(port) = ct.port_dst(dir) {
            write!(w, "<dport>{}</dport>", port)?;
        }
    }
    w.write_str("</layer4>")?;

    if let Some(counters) = ct.counters(dir) {
        write!(
            w,
            "<counters><packets>{}</packets><bytes>{}</bytes></counters>",
            counters.packets, counters.bytes
        )?;
    }

    w.write_str("</meta>")?;
    Ok(())
}

/// Address element, formatted by the tuple's layer 3 family
fn write_addr<W: Write>(w: &mut W, tag: &str, l3: u8, addr: Option<AddressValue>) -> Step {
    let Some(addr) = addr else {
        return Ok(());
    };
    write!(w, "<{}>", tag)?;
    match (l3, addr) {
        (AF_INET, AddressValue::V4(a)) => write!(w, "{}", a)?,
        (AF_INET6, AddressValue::V6(a)) => write!(w, "{}", a)?,
        _ => {}
    }
    write!(w, "</{}>", tag)?;
    Ok(())
}
