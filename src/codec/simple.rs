//! Fixed-shape packets: PINGREQ, DISCONNECT (encode only) and CONNACK,
//! PUBACK, SUBACK, UNSUBACK, PINGRESP (decode only).

use super::DecodedPacket;
use crate::error::Error;
use crate::MAX_SUBSCRIBE_TOPICS;
use heapless::Vec;

/// Encode a PINGREQ packet (always exactly 2 bytes: `0xC0 0x00`).
pub fn encode_pingreq(out: &mut [u8]) -> Result<usize, Error> {
    encode_fixed(out, super::PINGREQ)
}

/// Encode a DISCONNECT packet (always exactly 2 bytes: `0xE0 0x00`).
pub fn encode_disconnect(out: &mut [u8]) -> Result<usize, Error> {
    encode_fixed(out, super::DISCONNECT)
}

fn encode_fixed(out: &mut [u8], packet_type: u8) -> Result<usize, Error> {
    if out.len() < 2 {
        return Err(Error::BufSize);
    }
    out[0] = packet_type << 4;
    out[1] = 0x00;
    Ok(2)
}

/// Encode a PUBACK packet (always exactly 4 bytes: `0x40 0x02` then the
/// big-endian packet identifier).
pub fn encode_puback(out: &mut [u8], packet_id: u16) -> Result<usize, Error> {
    if out.len() < 4 {
        return Err(Error::BufSize);
    }
    out[0] = super::PUBACK << 4;
    out[1] = 0x02;
    out[2..4].copy_from_slice(&packet_id.to_be_bytes());
    Ok(4)
}

/// Decode a CONNACK body: byte 0 bit 0 is session-present, byte 1 is the return code.
pub fn decode_connack(body: &[u8]) -> Result<DecodedPacket, Error> {
    if body.len() != 2 {
        return Err(Error::PacketError);
    }
    Ok(DecodedPacket::ConnAck {
        session_present: body[0] & 0x01 != 0,
        return_code: body[1],
    })
}

/// Decode a PUBACK body: a bare two-byte packet identifier.
pub fn decode_puback(body: &[u8]) -> Result<DecodedPacket, Error> {
    if body.len() != 2 {
        return Err(Error::PacketError);
    }
    Ok(DecodedPacket::PubAck {
        packet_id: u16::from_be_bytes([body[0], body[1]]),
    })
}

/// Decode a SUBACK body: packet identifier followed by one return code per requested topic.
pub fn decode_suback(body: &[u8]) -> Result<DecodedPacket, Error> {
    if body.len() < 3 {
        return Err(Error::PacketError);
    }
    let packet_id = u16::from_be_bytes([body[0], body[1]]);
    let return_codes: Vec<u8, MAX_SUBSCRIBE_TOPICS> =
        Vec::from_slice(&body[2..]).map_err(|_| Error::BufSize)?;
    Ok(DecodedPacket::SubAck {
        packet_id,
        return_codes,
    })
}

/// Decode an UNSUBACK body: a bare two-byte packet identifier.
pub fn decode_unsuback(body: &[u8]) -> Result<DecodedPacket, Error> {
    if body.len() != 2 {
        return Err(Error::PacketError);
    }
    Ok(DecodedPacket::UnsubAck {
        packet_id: u16::from_be_bytes([body[0], body[1]]),
    })
}

/// Decode a PINGRESP body: always empty.
pub fn decode_pingresp(body: &[u8]) -> Result<DecodedPacket, Error> {
    if !body.is_empty() {
        return Err(Error::PacketError);
    }
    Ok(DecodedPacket::PingResp)
}
