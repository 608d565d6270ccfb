//! End-to-end scenarios exercising the full handshake, framing, and
//! dispatch stack over a real loopback TCP connection.

use rand::rngs::OsRng;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey, pkcs1::EncodeRsaPublicKey, traits::PublicKeyParts};
use sha2::Sha256;
use tempfile::tempdir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use waypoint_core::{FileMutexRegistry, Storage};
use waypoint_crypto::SessionKey;
use waypoint_proto::{HistoricEntry, License, RequestHeader, RequestType, MIN_TIMESTAMP};
use waypoint_server::{Config, Server};

struct TestClient {
    stream: TcpStream,
    session_key: SessionKey,
}

impl TestClient {
    async fn connect(addr: std::net::SocketAddr) -> Self {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let public_key = RsaPublicKey::from(&private_key);
        let pem = public_key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF).unwrap();
        let modulus_size = private_key.size();

        let mut stream = TcpStream::connect(addr).await.unwrap();

        stream.write_u32_le(0).await.unwrap();
        stream.write_u32_le(pem.len() as u32).await.unwrap();
        stream.write_all(pem.as_bytes()).await.unwrap();

        let mut wrapped = vec![0u8; modulus_size];
        stream.read_exact(&mut wrapped).await.unwrap();

        let raw = private_key.decrypt(Oaep::new::<Sha256>(), &wrapped).unwrap();
        let mut raw_key = [0u8; 32];
        raw_key.copy_from_slice(&raw);

        Self { stream, session_key: SessionKey::from_raw(raw_key) }
    }

    async fn request(&mut self, request_id: u32, plaintext: &[u8]) -> (u32, Vec<u8>) {
        let sealed = self.session_key.seal(plaintext).unwrap();

        self.stream.write_u32_le(request_id).await.unwrap();
        self.stream.write_u32_le(sealed.len() as u32).await.unwrap();
        self.stream.write_all(&sealed).await.unwrap();

        let reply_id = self.stream.read_u32_le().await.unwrap();
        let reply_len = self.stream.read_u32_le().await.unwrap() as usize;
        let mut reply_sealed = vec![0u8; reply_len];
        self.stream.read_exact(&mut reply_sealed).await.unwrap();

        let payload = self.session_key.open(&reply_sealed).unwrap();
        (reply_id, payload)
    }
}

async fn spawn_server(allowed_ips: Vec<String>) -> (std::net::SocketAddr, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let config = Config {
        root: dir.path().to_string_lossy().to_string(),
        hostname: "127.0.0.1".to_string(),
        port: 0,
        allowed_ips,
    };

    let server = Server::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, dir)
}

fn entry_bytes(timestamp: u32) -> Vec<u8> {
    HistoricEntry::new(timestamp, 1, 0.0, 0.0, 0.0, 0.0, 0.0, 0, 0).as_bytes().to_vec()
}

#[tokio::test]
async fn store_then_read_round_trips_both_records() {
    let (addr, _dir) = spawn_server(vec!["*".to_string()]).await;
    let mut client = TestClient::connect(addr).await;

    let license = License::from_plate(&"A".repeat(40)).unwrap();
    let start = 1_700_000_000;
    let end = 1_700_000_060;
    let body = [entry_bytes(start), entry_bytes(end)].concat();

    let store_header = RequestHeader::new(RequestType::Store, 1, start, end, license).unwrap();
    let mut store_payload = store_header.encode().to_vec();
    store_payload.extend_from_slice(&body);

    let (id, reply) = client.request(1, &store_payload).await;
    assert_eq!(id, 1);
    assert_eq!(reply, waypoint_proto::ACK.to_vec());

    let read_header = RequestHeader::new(RequestType::ReadOne, 1, start, end, license).unwrap();
    let (id, reply) = client.request(2, &read_header.encode()).await;
    assert_eq!(id, 2);
    assert_eq!(reply, body);
}

#[tokio::test]
async fn cross_day_store_reads_span_two_files() {
    let (addr, _dir) = spawn_server(vec!["*".to_string()]).await;
    let mut client = TestClient::connect(addr).await;

    let license = License::from_plate(&"B".repeat(40)).unwrap();
    let day1_ts = 1_704_153_570; // 2024-01-01 23:59:30 UTC
    let day2_ts = 1_704_153_630; // 2024-01-02 00:00:30 UTC

    for ts in [day1_ts, day2_ts] {
        let header = RequestHeader::new(RequestType::Store, 1, ts, ts, license).unwrap();
        let mut payload = header.encode().to_vec();
        payload.extend_from_slice(&entry_bytes(ts));
        let (_, reply) = client.request(ts, &payload).await;
        assert_eq!(reply, waypoint_proto::ACK.to_vec());
    }

    let read_header = RequestHeader::new(RequestType::ReadOne, 1, day1_ts, day2_ts, license).unwrap();
    let (_, reply) = client.request(99, &read_header.encode()).await;

    assert_eq!(reply.len(), HistoricEntry::SIZE * 2);
}

#[tokio::test]
async fn read_all_bundles_every_license_for_the_instant() {
    let (addr, _dir) = spawn_server(vec!["*".to_string()]).await;
    let mut client = TestClient::connect(addr).await;

    let license_a = License::from_plate(&"C".repeat(40)).unwrap();
    let license_b = License::from_plate(&"D".repeat(40)).unwrap();
    let t = 1_700_000_000;

    for (license, ts) in [(license_a, t), (license_b, t + 5)] {
        let header = RequestHeader::new(RequestType::Store, 1, ts, ts, license).unwrap();
        let mut payload = header.encode().to_vec();
        payload.extend_from_slice(&entry_bytes(ts));
        client.request(ts, &payload).await;
    }

    let read_all_header =
        RequestHeader::new(RequestType::ReadAll, 1, t, t, License::EMPTY).unwrap();
    let (_, reply) = client.request(1, &read_all_header.encode()).await;

    let total = u32::from_le_bytes(reply[0..4].try_into().unwrap());
    assert_eq!(total, 2);
}

#[tokio::test]
async fn malformed_header_gets_err_and_connection_stays_open() {
    let (addr, _dir) = spawn_server(vec!["*".to_string()]).await;
    let mut client = TestClient::connect(addr).await;

    let license = License::from_plate(&"E".repeat(40)).unwrap();
    let mut bad_payload = [0u8; RequestHeader::SIZE];
    bad_payload[0] = RequestType::Store.to_wire();
    bad_payload[1] = 0; // server = 0, invalid
    bad_payload[2..6].copy_from_slice(&(MIN_TIMESTAMP + 1).to_le_bytes());
    bad_payload[6..10].copy_from_slice(&(MIN_TIMESTAMP + 1).to_le_bytes());
    bad_payload[10..50].copy_from_slice(license.as_bytes());

    let (id, reply) = client.request(42, &bad_payload).await;
    assert_eq!(id, 42);
    assert_eq!(reply, waypoint_proto::ERR.to_vec());

    // The connection survives: a valid request right after still succeeds.
    let good_header =
        RequestHeader::new(RequestType::Store, 1, MIN_TIMESTAMP + 1, MIN_TIMESTAMP + 1, license)
            .unwrap();
    let mut payload = good_header.encode().to_vec();
    payload.extend_from_slice(&entry_bytes(MIN_TIMESTAMP + 1));
    let (_, reply) = client.request(43, &payload).await;
    assert_eq!(reply, waypoint_proto::ACK.to_vec());
}

#[tokio::test]
async fn oversize_frame_closes_the_connection() {
    let (addr, _dir) = spawn_server(vec!["*".to_string()]).await;
    let mut client = TestClient::connect(addr).await;

    // Declare a length over the cap; the server rejects before reading any
    // body bytes, so none need to be sent.
    client.stream.write_u32_le(1).await.unwrap();
    client.stream.write_u32_le((waypoint_proto::MAX_FRAME_SIZE + 1) as u32).await.unwrap();

    // The server closes the connection before reading the declared length;
    // further reads observe EOF.
    let mut buf = [0u8; 1];
    let result = client.stream.read(&mut buf).await;
    assert!(result.is_err() || result.unwrap() == 0);
}

#[tokio::test]
async fn ip_gating_closes_disallowed_peers_before_handshake() {
    let (addr, _dir) = spawn_server(vec!["10.0.0.5".to_string()]).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_u32_le(0).await.unwrap();

    // 127.0.0.1 is not on the allow-list; the server closes without
    // reading further, so a write here either fails outright or the peer
    // observes EOF on the next read.
    let mut buf = [0u8; 1];
    let result = stream.read(&mut buf).await;
    assert!(result.is_err() || result.unwrap() == 0);
}
