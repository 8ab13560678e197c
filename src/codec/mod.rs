//! Byte-exact MQTT 3.1.1 control packet codec.
//!
//! Every function here is a pure, allocation-free transformation between a
//! byte buffer and a typed value: encoders write into a caller-supplied
//! `&mut [u8]` and never truncate (an undersized buffer is
//! [`Error::BufSize`], not a short write), and [`decode`] parses exactly one
//! framed packet into a [`DecodedPacket`]. Nothing in this module touches a
//! [`crate::Client`] or a transport — the instance layer is a thin state
//! machine wrapped around these functions.

mod connect;
mod publish;
mod simple;
mod subscribe;
mod unsubscribe;

pub use connect::{encode_connect, ConnectFields};
pub use publish::{decode_publish, encode_publish};
pub use simple::{
    decode_connack, decode_pingresp, decode_puback, decode_suback, decode_unsuback,
    encode_disconnect, encode_pingreq, encode_puback,
};
pub use subscribe::encode_subscribe;
pub use unsubscribe::encode_unsubscribe;

use crate::error::Error;
use crate::{MAX_PAYLOAD_LEN, MAX_SUBSCRIBE_TOPICS, MAX_TOPIC_LEN};
use heapless::{String, Vec};

/// MQTT CONNECT packet type (fixed-header high nibble `0x1`).
pub const CONNECT: u8 = 0x1;
/// MQTT CONNACK packet type.
pub const CONNACK: u8 = 0x2;
/// MQTT PUBLISH packet type.
pub const PUBLISH: u8 = 0x3;
/// MQTT PUBACK packet type.
pub const PUBACK: u8 = 0x4;
/// MQTT SUBSCRIBE packet type.
pub const SUBSCRIBE: u8 = 0x8;
/// MQTT SUBACK packet type.
pub const SUBACK: u8 = 0x9;
/// MQTT UNSUBSCRIBE packet type.
pub const UNSUBSCRIBE: u8 = 0xA;
/// MQTT UNSUBACK packet type.
pub const UNSUBACK: u8 = 0xB;
/// MQTT PINGREQ packet type.
pub const PINGREQ: u8 = 0xC;
/// MQTT PINGRESP packet type.
pub const PINGRESP: u8 = 0xD;
/// MQTT DISCONNECT packet type.
pub const DISCONNECT: u8 = 0xE;

/// Quality of service level for a PUBLISH message.
///
/// Only the two levels this client supports are representable; QoS 2
/// ("exactly once") is an explicit non-goal, and an illegal raw wire value
/// of 3 can only arise from malformed input, which the codec rejects with
/// [`Error::Parm`] at encode time and [`Error::PacketError`] at decode time.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum QoS {
    /// At most once delivery: fire and forget.
    AtMostOnce = 0,
    /// At least once delivery: acknowledged via PUBACK, possibly duplicated.
    AtLeastOnce = 1,
}

impl QoS {
    /// The raw two-bit wire value for this level.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Construct a [`QoS`] from a raw wire value, rejecting anything but 0 or 1.
    pub fn from_u8(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            _ => Err(Error::Parm),
        }
    }
}

/// An inbound control packet, decoded and owned (no borrow from the input buffer).
#[derive(Debug, Clone)]
pub enum DecodedPacket {
    /// CONNACK: session-present flag and broker return code (0 = accepted).
    ConnAck {
        /// Whether the broker resumed an existing session.
        session_present: bool,
        /// 0 on success; 1-5 are the standard CONNACK refusal codes.
        return_code: u8,
    },
    /// PUBLISH: a message delivered on a topic.
    Publish {
        /// Redelivery flag.
        dup: bool,
        /// Quality of service the message was sent with (raw wire value; may be 2 on a misbehaving broker).
        qos: u8,
        /// Retain flag.
        retain: bool,
        /// Topic the message was published to.
        topic: String<MAX_TOPIC_LEN>,
        /// Message payload.
        payload: Vec<u8, MAX_PAYLOAD_LEN>,
        /// Packet identifier, present only for QoS > 0.
        packet_id: Option<u16>,
    },
    /// PUBACK: acknowledgement of a QoS 1 PUBLISH.
    PubAck {
        /// Packet identifier of the PUBLISH being acknowledged.
        packet_id: u16,
    },
    /// SUBACK: acknowledgement of a SUBSCRIBE, one return code per requested topic.
    SubAck {
        /// Packet identifier of the SUBSCRIBE being acknowledged.
        packet_id: u16,
        /// Per-topic granted QoS (or failure) codes, in request order.
        return_codes: Vec<u8, MAX_SUBSCRIBE_TOPICS>,
    },
    /// UNSUBACK: acknowledgement of an UNSUBSCRIBE.
    UnsubAck {
        /// Packet identifier of the UNSUBSCRIBE being acknowledged.
        packet_id: u16,
    },
    /// PINGRESP: keep-alive acknowledgement.
    PingResp,
}

/// Encode the MQTT variable-length remaining-length field.
///
/// Emits the canonical, shortest legal encoding (1-4 bytes, 7 data bits per
/// byte, high bit as continuation) and returns the number of bytes written.
/// Fails with [`Error::BufSize`] if `buf` is too small or `len` exceeds the
/// 4-byte-encodable maximum (268,435,455).
pub fn encode_remaining_length(buf: &mut [u8], mut len: usize) -> Result<usize, Error> {
    if len > 0x0FFF_FFFF {
        return Err(Error::Parm);
    }
    let mut written = 0;
    loop {
        if written >= buf.len() || written >= 4 {
            return Err(Error::BufSize);
        }
        let mut byte = (len % 128) as u8;
        len /= 128;
        if len > 0 {
            byte |= 0x80;
        }
        buf[written] = byte;
        written += 1;
        if len == 0 {
            break;
        }
    }
    Ok(written)
}

/// Decode the MQTT variable-length remaining-length field.
///
/// Returns `(value, bytes_consumed)`. Refuses any field that claims more
/// than 4 bytes with [`Error::PacketError`].
pub fn decode_remaining_length(buf: &[u8]) -> Result<(usize, usize), Error> {
    let mut value: usize = 0;
    let mut multiplier: usize = 1;
    for (i, &byte) in buf.iter().enumerate() {
        if i >= 4 {
            return Err(Error::PacketError);
        }
        value += (byte & 0x7F) as usize * multiplier;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        multiplier *= 128;
    }
    Err(Error::PacketError)
}

/// Append a two-byte-length-prefixed UTF-8 string to `out`.
fn encode_string(out: &mut Vec<u8, { crate::MAX_ENCODED_PACKET_LEN }>, s: &str) -> Result<(), Error> {
    encode_bytes(out, s.as_bytes())
}

/// Append a two-byte-length-prefixed raw byte string to `out`.
fn encode_bytes(out: &mut Vec<u8, { crate::MAX_ENCODED_PACKET_LEN }>, bytes: &[u8]) -> Result<(), Error> {
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes())
        .map_err(|_| Error::BufSize)?;
    out.extend_from_slice(bytes).map_err(|_| Error::BufSize)?;
    Ok(())
}

/// Copy a built packet from a scratch buffer into the caller's buffer,
/// failing with [`Error::BufSize`] rather than truncating.
fn copy_into(dest: &mut [u8], src: &[u8]) -> Result<usize, Error> {
    if dest.len() < src.len() {
        return Err(Error::BufSize);
    }
    dest[..src.len()].copy_from_slice(src);
    Ok(src.len())
}

/// Decode exactly one framed control packet starting at `buf[0]`.
///
/// `buf` must contain precisely one packet: fixed header, remaining-length
/// field, and a remaining-length's worth of bytes, with nothing left over.
/// Any other framing, or an unrecognised packet type, is [`Error::PacketError`].
pub fn decode(buf: &[u8]) -> Result<DecodedPacket, Error> {
    if buf.len() < 2 {
        return Err(Error::PacketError);
    }
    let type_nibble = buf[0] >> 4;
    let flags = buf[0] & 0x0F;
    let (remaining_len, rl_bytes) = decode_remaining_length(&buf[1..])?;
    let header_len = 1 + rl_bytes;
    if header_len + remaining_len != buf.len() {
        return Err(Error::PacketError);
    }
    let body = &buf[header_len..];

    match type_nibble {
        CONNACK => decode_connack(body),
        PUBLISH => decode_publish(flags, body),
        PUBACK => decode_puback(body),
        SUBACK => decode_suback(body),
        UNSUBACK => decode_unsuback(body),
        PINGRESP => decode_pingresp(body),
        _ => Err(Error::PacketError),
    }
}
