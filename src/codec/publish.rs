//! PUBLISH packet encoding and decoding.

use super::{encode_bytes, encode_remaining_length, encode_string, DecodedPacket};
use crate::error::Error;
use crate::{MAX_ENCODED_PACKET_LEN, MAX_PAYLOAD_LEN, MAX_TOPIC_LEN};
use heapless::{String, Vec};

/// Encode a PUBLISH packet into `out`, returning the number of bytes written.
///
/// `packet_id` must be `Some` for QoS > 0 and is ignored (and need not be
/// supplied) for QoS 0. `qos` must be 0 or 1; any other raw value is
/// [`Error::Parm`] (QoS 2 is an explicit non-goal of this client). The
/// payload is written as a two-byte-length-prefixed byte string, matching
/// every other PUBLISH field.
pub fn encode_publish(
    out: &mut [u8],
    topic: &str,
    payload: &[u8],
    qos: u8,
    dup: bool,
    retain: bool,
    packet_id: Option<u16>,
) -> Result<usize, Error> {
    if qos > 1 {
        return Err(Error::Parm);
    }
    if topic.is_empty() {
        return Err(Error::Parm);
    }
    if qos > 0 && packet_id.is_none() {
        return Err(Error::Parm);
    }

    let mut scratch: Vec<u8, MAX_ENCODED_PACKET_LEN> = Vec::new();
    encode_string(&mut scratch, topic)?;
    if qos > 0 {
        let id = packet_id.expect("checked above");
        scratch
            .extend_from_slice(&id.to_be_bytes())
            .map_err(|_| Error::BufSize)?;
    }
    encode_bytes(&mut scratch, payload)?;

    let mut flags: u8 = 0;
    if dup {
        flags |= 0x08;
    }
    flags |= qos << 1;
    if retain {
        flags |= 0x01;
    }

    let mut header = [0u8; 5];
    header[0] = (super::PUBLISH << 4) | flags;
    let rl_len = encode_remaining_length(&mut header[1..], scratch.len())?;
    let header_len = 1 + rl_len;

    let total = header_len + scratch.len();
    if out.len() < total {
        return Err(Error::BufSize);
    }
    out[..header_len].copy_from_slice(&header[..header_len]);
    out[header_len..total].copy_from_slice(&scratch);
    Ok(total)
}

/// Decode a PUBLISH packet body (everything after the fixed header).
///
/// The payload is read as a two-byte-length-prefixed byte string; its
/// declared length must account for every remaining byte in `body` exactly.
pub fn decode_publish(flags: u8, body: &[u8]) -> Result<DecodedPacket, Error> {
    let dup = flags & 0x08 != 0;
    let qos = (flags >> 1) & 0x03;
    let retain = flags & 0x01 != 0;
    if qos == 3 {
        return Err(Error::PacketError);
    }

    if body.len() < 2 {
        return Err(Error::PacketError);
    }
    let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
    if 2 + topic_len > body.len() {
        return Err(Error::PacketError);
    }
    let topic_bytes = &body[2..2 + topic_len];
    let topic_str = core::str::from_utf8(topic_bytes).map_err(|_| Error::PacketError)?;
    let topic = String::try_from(topic_str).map_err(|_| Error::BufSize)?;

    let mut offset = 2 + topic_len;
    let packet_id = if qos > 0 {
        if offset + 2 > body.len() {
            return Err(Error::PacketError);
        }
        let id = u16::from_be_bytes([body[offset], body[offset + 1]]);
        offset += 2;
        Some(id)
    } else {
        None
    };

    if offset + 2 > body.len() {
        return Err(Error::PacketError);
    }
    let payload_len = u16::from_be_bytes([body[offset], body[offset + 1]]) as usize;
    offset += 2;
    if offset + payload_len != body.len() {
        return Err(Error::PacketError);
    }
    let payload = Vec::from_slice(&body[offset..offset + payload_len]).map_err(|_| Error::BufSize)?;

    Ok(DecodedPacket::Publish {
        dup,
        qos,
        retain,
        topic,
        payload,
        packet_id,
    })
}
