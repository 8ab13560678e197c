//! SUBSCRIBE packet encoding.

use super::encode_remaining_length;
use crate::error::Error;
use crate::MAX_ENCODED_PACKET_LEN;
use heapless::Vec;

/// Encode a SUBSCRIBE packet into `out`, returning the number of bytes written.
///
/// `topics` and `qos` must be the same non-empty length (at least one
/// topic); a raw `qos` value greater than 1 is [`Error::Parm`] (QoS 2 is an
/// explicit non-goal of this client).
pub fn encode_subscribe(
    out: &mut [u8],
    packet_id: u16,
    topics: &[&str],
    qos: &[u8],
) -> Result<usize, Error> {
    if topics.is_empty() || topics.len() != qos.len() {
        return Err(Error::Parm);
    }
    for (&topic, &q) in topics.iter().zip(qos.iter()) {
        if topic.is_empty() {
            return Err(Error::Parm);
        }
        if q > 1 {
            return Err(Error::Parm);
        }
    }

    let mut scratch: Vec<u8, MAX_ENCODED_PACKET_LEN> = Vec::new();
    scratch
        .extend_from_slice(&packet_id.to_be_bytes())
        .map_err(|_| Error::BufSize)?;
    for (&topic, &q) in topics.iter().zip(qos.iter()) {
        super::encode_bytes(&mut scratch, topic.as_bytes())?;
        scratch.push(q).map_err(|_| Error::BufSize)?;
    }

    let mut header = [0u8; 5];
    header[0] = (super::SUBSCRIBE << 4) | 0x02;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_topic_subscribe() {
        let mut buf = [0u8; 64];
        let n = encode_subscribe(&mut buf, 1, &["topic", "topic2"], &[0, 1]).unwrap();
        let expected: [u8; 21] = [
            0x82, 0x13, 0x00, 0x01, 0x00, 0x05, b't', b'o', b'p', b'i', b'c', 0x00, 0x00, 0x06,
            b't', b'o', b'p', b'i', b'c', b'2', 0x01,
        ];
        assert_eq!(&buf[..n], &expected[..]);
    }

    #[test]
    fn empty_topic_list_is_parm() {
        let mut buf = [0u8; 64];
        assert_eq!(
            encode_subscribe(&mut buf, 1, &[], &[]),
            Err(Error::Parm)
        );
    }

    #[test]
    fn mismatched_lengths_is_parm() {
        let mut buf = [0u8; 64];
        assert_eq!(
            encode_subscribe(&mut buf, 1, &["a", "b"], &[0]),
            Err(Error::Parm)
        );
    }

    #[test]
    fn qos_above_one_is_parm() {
        let mut buf = [0u8; 64];
        assert_eq!(
            encode_subscribe(&mut buf, 1, &["a"], &[2]),
            Err(Error::Parm)
        );
    }
}
