//! UNSUBSCRIBE packet encoding.

use super::{encode_remaining_length, encode_string};
use crate::error::Error;
use crate::MAX_ENCODED_PACKET_LEN;
use heapless::Vec;

/// Encode an UNSUBSCRIBE packet into `out`, returning the number of bytes written.
///
/// `topics` must be non-empty; an empty topic anywhere in the list is
/// [`Error::Parm`].
pub fn encode_unsubscribe(out: &mut [u8], packet_id: u16, topics: &[&str]) -> Result<usize, Error> {
    if topics.is_empty() {
        return Err(Error::Parm);
    }
    for &topic in topics {
        if topic.is_empty() {
            return Err(Error::Parm);
        }
    }

    let mut scratch: Vec<u8, MAX_ENCODED_PACKET_LEN> = Vec::new();
    scratch
        .extend_from_slice(&packet_id.to_be_bytes())
        .map_err(|_| Error::BufSize)?;
    for &topic in topics {
        encode_string(&mut scratch, topic)?;
    }

    let mut header = [0u8; 5];
    header[0] = (super::UNSUBSCRIBE << 4) | 0x02;
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
