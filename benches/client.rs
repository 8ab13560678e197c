use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use dotenvy::dotenv;
use std::env;
use std::io::{Read as StdRead, Write as StdWrite};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use umqtt_embedded::codec::decode_remaining_length;
use umqtt_embedded::transport::{Close, Connection, Read, Write};
use umqtt_embedded::{Client, ConnectOptions, ConnectionStatus, EventLog, LoggedEvent, QoS};

struct NetConnection {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl NetConnection {
    fn framed_packet_len(&self) -> Option<usize> {
        if self.buf.len() < 2 {
            return None;
        }
        let (remaining_len, rl_bytes) = decode_remaining_length(&self.buf[1..]).ok()?;
        let total = 1 + rl_bytes + remaining_len;
        (self.buf.len() >= total).then_some(total)
    }
}

impl Read for NetConnection {
    type Error = std::io::Error;
    fn read(&mut self, out: &mut [u8]) -> Result<usize, Self::Error> {
        let mut chunk = [0u8; 512];
        match self.stream.read(&mut chunk) {
            Ok(0) => {}
            Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
            Err(e) if matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ) => {}
            Err(e) => return Err(e),
        }
        match self.framed_packet_len() {
            Some(len) => {
                out[..len].copy_from_slice(&self.buf[..len]);
                self.buf.drain(..len);
                Ok(len)
            }
            None => Ok(0),
        }
    }
}

impl Write for NetConnection {
    type Error = std::io::Error;
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf)
    }
    fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush()
    }
}

impl Close for NetConnection {
    type Error = std::io::Error;
    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for NetConnection {}

fn setup_client(client_id: &'static str, topic: &'static str) -> Client<NetConnection, EventLog> {
    dotenv().ok();
    let address = env::var("TEST_MQTT_ADDRESS").unwrap_or("test.mosquitto.org:1883".to_string());
    let stream = TcpStream::connect(address).expect("failed to connect to broker");
    stream
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    stream.set_nodelay(true).unwrap();
    let conn = NetConnection {
        stream,
        buf: Vec::new(),
    };

    let mut client = Client::new(conn, EventLog::default());
    client
        .connect(ConnectOptions {
            client_id,
            keep_alive_secs: 30,
            clean_session: true,
            will: None,
            username: None,
            password: None,
        })
        .expect("failed to start connect");
    run_until(&mut client, Duration::from_secs(10), |c| {
        c.status() == ConnectionStatus::Connected
    });
    assert_eq!(client.status(), ConnectionStatus::Connected);

    client
        .subscribe(&[topic], &[QoS::AtMostOnce])
        .expect("failed to subscribe");
    run_until(&mut client, Duration::from_secs(10), |c| {
        c.handler()
            .events
            .iter()
            .any(|e| matches!(e, LoggedEvent::SubAck { .. }))
    });

    client
}

fn run_until<F>(client: &mut Client<NetConnection, EventLog>, deadline: Duration, mut done: F)
where
    F: FnMut(&Client<NetConnection, EventLog>) -> bool,
{
    let start = Instant::now();
    while start.elapsed() < deadline {
        let _ = client.run(start.elapsed().as_millis() as u32);
        if done(client) {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Measures the cost of `Client::publish` itself: codec encoding, pending-queue
/// bookkeeping, and the transport write, excluding any wait for delivery.
pub fn bench_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish");
    let payload = b"hello from publish";
    group.throughput(Throughput::Bytes(payload.len() as u64));
    group.bench_function("publish", |b| {
        b.iter_batched_ref(
            || setup_client("umqtt-embedded-bench-publish", "umqtt-embedded/bench-topic"),
            |client| {
                client
                    .publish(
                        "umqtt-embedded/bench-topic",
                        payload,
                        QoS::AtMostOnce,
                        false,
                    )
                    .expect("publish should succeed");
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

/// Publish a QoS 0 message to the client's own subscription and drive `run`
/// until the resulting PUBLISH is dispatched back to the event log.
pub fn bench_publish_and_receive_qos0(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_and_receive_qos0");
    let payload = b"hello world from bench";
    group.throughput(Throughput::Bytes(payload.len() as u64 * 50));

    group.bench_function("publish_and_receive_qos0", |b| {
        b.iter_batched_ref(
            || {
                setup_client(
                    "umqtt-embedded-bench-pubrecv-qos0",
                    "umqtt-embedded/bench-topic-qos0",
                )
            },
            |client| {
                for i in 0..50 {
                    let before = client.handler().events.len();
                    client
                        .publish(
                            "umqtt-embedded/bench-topic-qos0",
                            payload,
                            QoS::AtMostOnce,
                            false,
                        )
                        .unwrap_or_else(|e| panic!("publish {i} failed: {e:?}"));
                    run_until(client, Duration::from_secs(5), |c| {
                        c.handler().events.len() > before
                    });
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

/// Same as [`bench_publish_and_receive_qos0`] but at QoS 1, so each round
/// trip also carries a PUBACK and this client's own PUBACK reply.
pub fn bench_publish_and_receive_qos1(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_and_receive_qos1");
    let payload = b"hello world from bench qos1";
    group.throughput(Throughput::Bytes(payload.len() as u64 * 50));

    group.bench_function("publish_and_receive_qos1", |b| {
        b.iter_batched_ref(
            || {
                setup_client(
                    "umqtt-embedded-bench-pubrecv-qos1",
                    "umqtt-embedded/bench-topic-qos1",
                )
            },
            |client| {
                for i in 0..50 {
                    let before = client.handler().events.len();
                    client
                        .publish(
                            "umqtt-embedded/bench-topic-qos1",
                            payload,
                            QoS::AtLeastOnce,
                            false,
                        )
                        .unwrap_or_else(|e| panic!("publish {i} failed: {e:?}"));
                    // Wait for both the PUBACK and the echoed PUBLISH.
                    run_until(client, Duration::from_secs(5), |c| {
                        c.handler().events.len() >= before + 2
                    });
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_publish,
    bench_publish_and_receive_qos0,
    bench_publish_and_receive_qos1
);
criterion_main!(benches);
