//! CONNECT packet encoding.

use super::{encode_bytes, encode_remaining_length, encode_string, QoS};
use crate::error::Error;
use crate::MAX_ENCODED_PACKET_LEN;
use heapless::Vec;

/// Options needed to build an MQTT CONNECT packet.
///
/// This mirrors [`crate::client::ConnectOptions`] at the codec layer but
/// takes already-validated, already-typed fields; the `Client` is
/// responsible for turning user input into this shape.
pub struct ConnectFields<'a> {
    /// Client identifier; 1-23 bytes recommended by MQTT 3.1.1 but not enforced here.
    pub client_id: &'a str,
    /// Keep-alive interval in seconds (0 disables keep-alive).
    pub keep_alive_secs: u16,
    /// Whether the broker should discard any previous session.
    pub clean_session: bool,
    /// Will topic and message; `None` for no will, or `Some` with both present.
    pub will: Option<(&'a str, &'a [u8], QoS, bool)>,
    /// Optional username.
    pub username: Option<&'a str>,
    /// Optional password.
    pub password: Option<&'a [u8]>,
}

/// Encode a CONNECT packet into `out`, returning the number of bytes written.
///
/// Fails with [`Error::BufSize`] if `out` is too small to hold the encoded
/// packet (the packet is never truncated).
pub fn encode_connect(out: &mut [u8], fields: &ConnectFields) -> Result<usize, Error> {
    let mut scratch: Vec<u8, MAX_ENCODED_PACKET_LEN> = Vec::new();

    // --- Variable header ---
    encode_string(&mut scratch, "MQTT")?;
    scratch.push(4).map_err(|_| Error::BufSize)?; // protocol level: MQTT 3.1.1

    let mut connect_flags: u8 = 0;
    if fields.username.is_some() {
        connect_flags |= 0x80;
    }
    if fields.password.is_some() {
        connect_flags |= 0x40;
    }
    if let Some((_, _, qos, retain)) = &fields.will {
        if *retain {
            connect_flags |= 0x20;
        }
        connect_flags |= (qos.as_u8() & 0x03) << 3;
        connect_flags |= 0x04; // will flag
    }
    if fields.clean_session {
        connect_flags |= 0x02;
    }
    scratch.push(connect_flags).map_err(|_| Error::BufSize)?;
    scratch
        .extend_from_slice(&fields.keep_alive_secs.to_be_bytes())
        .map_err(|_| Error::BufSize)?;

    // --- Payload ---
    if fields.client_id.is_empty() {
        return Err(Error::Parm);
    }
    encode_string(&mut scratch, fields.client_id)?;

    if let Some((topic, message, _, _)) = &fields.will {
        if topic.is_empty() {
            return Err(Error::Parm);
        }
        encode_string(&mut scratch, topic)?;
        encode_bytes(&mut scratch, message)?;
    }

    if let Some(username) = fields.username {
        encode_string(&mut scratch, username)?;
    }
    if let Some(password) = fields.password {
        encode_bytes(&mut scratch, password)?;
    }

    // --- Fixed header ---
    let mut header = [0u8; 5];
    header[0] = (super::CONNECT << 4) | 0x00;
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
