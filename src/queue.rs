//! Pending-acknowledgement bookkeeping for QoS 1 flows.
//!
//! A QoS 1 PUBLISH or a SUBSCRIBE/UNSUBSCRIBE is "pending" from the moment it
//! is sent until its acknowledgement (PUBACK / SUBACK / UNSUBACK) arrives.
//! [`PendingQueue`] tracks these in a fixed-capacity slot array so a
//! [`crate::Client`] can retransmit on a schedule and eventually give up
//! without ever allocating.

use crate::error::Error;
use crate::{MAX_ENCODED_PACKET_LEN, MAX_PENDING, MAX_RETRIES, RETRY_INTERVAL_MS};
use heapless::Vec;

/// A single in-flight packet awaiting acknowledgement.
#[derive(Debug, Clone)]
pub struct PendingPacket {
    /// Packet identifier used to match the eventual acknowledgement.
    pub packet_id: u16,
    /// Fixed-header packet type (one of [`crate::codec::PUBLISH`],
    /// [`crate::codec::SUBSCRIBE`], [`crate::codec::UNSUBSCRIBE`]).
    pub packet_type: u8,
    /// The tick count (per [`crate::Client::run`]) at which this packet was
    /// last transmitted — the entry's own enqueue or most recent retransmit.
    pub last_tx_ticks: u32,
    /// Number of retransmissions attempted so far.
    pub retries: u8,
    /// The exact bytes last written to the transport, kept so a retry can
    /// resend the identical packet (same DUP-adjusted flags for PUBLISH).
    pub bytes: Vec<u8, MAX_ENCODED_PACKET_LEN>,
}

/// A fixed-capacity set of packets awaiting acknowledgement.
///
/// Order is insertion order; lookups are linear scans, which is appropriate
/// given [`crate::MAX_PENDING`] is expected to be single-digit.
#[derive(Debug)]
pub struct PendingQueue {
    entries: Vec<PendingPacket, MAX_PENDING>,
}

impl PendingQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Number of packets currently awaiting acknowledgement.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue holds no pending packets.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enqueue a newly-sent packet. Fails with [`Error::BufSize`] if the
    /// queue is already at [`crate::MAX_PENDING`] capacity.
    pub fn enqueue(
        &mut self,
        packet_id: u16,
        packet_type: u8,
        now_ticks: u32,
        bytes: &[u8],
    ) -> Result<(), Error> {
        let entry = PendingPacket {
            packet_id,
            packet_type,
            last_tx_ticks: now_ticks,
            retries: 0,
            bytes: Vec::from_slice(bytes).map_err(|_| Error::BufSize)?,
        };
        self.entries.push(entry).map_err(|_| Error::BufSize)
    }

    /// Remove and return the entry matching `packet_id` and `packet_type`,
    /// if any. A mismatched `packet_type` with a matching id is left alone —
    /// packet identifiers are only unique within their own packet type.
    pub fn remove(&mut self, packet_id: u16, packet_type: u8) -> Option<PendingPacket> {
        let position = self
            .entries
            .iter()
            .position(|e| e.packet_id == packet_id && e.packet_type == packet_type)?;
        Some(self.entries.swap_remove(position))
    }

    /// Remove and return the first entry of the given `packet_type`,
    /// regardless of packet identifier. Used for CONNECT, which carries no
    /// packet identifier and of which at most one is ever in flight.
    pub fn remove_by_type(&mut self, packet_type: u8) -> Option<PendingPacket> {
        let position = self.entries.iter().position(|e| e.packet_type == packet_type)?;
        Some(self.entries.swap_remove(position))
    }

    /// Scan every pending entry for retry or expiry against `now_ticks`.
    ///
    /// Calls `on_retry(&bytes)` for any entry due for retransmission (more
    /// than [`crate::RETRY_INTERVAL_MS`] ticks since its last transmission)
    /// and bumps its retry counter and `last_tx_ticks`. An entry whose retry
    /// counter would exceed [`crate::MAX_RETRIES`] is instead dropped from
    /// the queue and its `packet_id` returned in `expired`.
    ///
    /// A pending CONNECT (see [`crate::codec::CONNECT`]) is never retried or
    /// expired here: it carries no retry semantics of its own, only the
    /// single [`crate::CONNECT_TIMEOUT_MS`] deadline the run loop's connect-
    /// timeout step enforces before this scan ever runs.
    ///
    /// `expired` is filled in order encountered; callers with more than one
    /// expiry in a single scan get every one of them. `on_retry` can fail
    /// (the transport write it performs might); the first such failure stops
    /// the scan and is returned, leaving later entries unscanned this round.
    pub fn scan_retries<F>(
        &mut self,
        now_ticks: u32,
        expired: &mut Vec<(u16, u8), MAX_PENDING>,
        mut on_retry: F,
    ) -> Result<(), Error>
    where
        F: FnMut(&[u8]) -> Result<(), Error>,
    {
        let mut i = 0;
        while i < self.entries.len() {
            if self.entries[i].packet_type == crate::codec::CONNECT {
                i += 1;
                continue;
            }
            let due = now_ticks.wrapping_sub(self.entries[i].last_tx_ticks) >= RETRY_INTERVAL_MS;
            if !due {
                i += 1;
                continue;
            }
            if self.entries[i].retries >= MAX_RETRIES {
                let entry = self.entries.swap_remove(i);
                let _ = expired.push((entry.packet_id, entry.packet_type));
                continue;
            }
            self.entries[i].retries += 1;
            self.entries[i].last_tx_ticks = now_ticks;
            on_retry(&self.entries[i].bytes)?;
            i += 1;
        }
        Ok(())
    }
}

impl Default for PendingQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PUBLISH;

    #[test]
    fn enqueue_and_remove_round_trip() {
        let mut queue = PendingQueue::new();
        queue.enqueue(1, PUBLISH, 0, &[1, 2, 3]).unwrap();
        assert_eq!(queue.len(), 1);
        let removed = queue.remove(1, PUBLISH).unwrap();
        assert_eq!(removed.packet_id, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn remove_requires_matching_type() {
        let mut queue = PendingQueue::new();
        queue.enqueue(1, PUBLISH, 0, &[1]).unwrap();
        assert!(queue.remove(1, crate::codec::SUBSCRIBE).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn queue_full_is_bufsize() {
        let mut queue = PendingQueue::new();
        for id in 0..MAX_PENDING as u16 {
            queue.enqueue(id, PUBLISH, 0, &[0]).unwrap();
        }
        assert_eq!(queue.enqueue(999, PUBLISH, 0, &[0]), Err(Error::BufSize));
    }

    #[test]
    fn retry_fires_after_interval_and_bumps_counter() {
        let mut queue = PendingQueue::new();
        queue.enqueue(1, PUBLISH, 0, &[0xAB]).unwrap();

        let mut expired = Vec::new();
        let mut retried = 0;
        queue
            .scan_retries(RETRY_INTERVAL_MS - 1, &mut expired, |_| {
                retried += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(retried, 0, "not due yet");

        queue
            .scan_retries(RETRY_INTERVAL_MS, &mut expired, |bytes| {
                retried += 1;
                assert_eq!(bytes, &[0xAB]);
                Ok(())
            })
            .unwrap();
        assert_eq!(retried, 1);
        assert!(expired.is_empty());
        assert_eq!(queue.entries[0].retries, 1);
        assert_eq!(queue.entries[0].last_tx_ticks, RETRY_INTERVAL_MS);
    }

    #[test]
    fn exhausting_retry_budget_expires_the_entry() {
        let mut queue = PendingQueue::new();
        queue.enqueue(1, PUBLISH, 0, &[0]).unwrap();

        let mut now = 0u32;
        let mut expired: Vec<(u16, u8), MAX_PENDING> = Vec::new();
        for _ in 0..MAX_RETRIES {
            now += RETRY_INTERVAL_MS;
            queue.scan_retries(now, &mut expired, |_| Ok(())).unwrap();
            assert!(expired.is_empty());
        }

        now += RETRY_INTERVAL_MS;
        queue.scan_retries(now, &mut expired, |_| Ok(())).unwrap();
        assert_eq!(&expired[..], &[(1, PUBLISH)]);
        assert!(queue.is_empty());
    }

    #[test]
    fn connect_entries_are_never_retried_or_expired_by_the_scan() {
        use crate::codec::CONNECT;

        let mut queue = PendingQueue::new();
        queue.enqueue(0, CONNECT, 0, &[0x10, 0x00]).unwrap();

        let mut expired: Vec<(u16, u8), MAX_PENDING> = Vec::new();
        let mut retried = 0;
        let mut now = 0u32;
        for _ in 0..(MAX_RETRIES as u32 + 2) {
            now += RETRY_INTERVAL_MS;
            queue
                .scan_retries(now, &mut expired, |_| {
                    retried += 1;
                    Ok(())
                })
                .unwrap();
        }

        assert_eq!(retried, 0, "CONNECT must never be retransmitted by the retry scan");
        assert!(expired.is_empty(), "CONNECT must never expire via the retry scan");
        assert_eq!(queue.len(), 1);
    }
}
