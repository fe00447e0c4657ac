#![allow(dead_code)]

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use rustls::pki_types::{CertificateDer, PrivatePkcs8KeyDer};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_rustls::TlsAcceptor;
use tokio_util::codec::Framed;

use respcounter::codec::RespCodec;
use respcounter::commands::auth::Auth;
use respcounter::commands::get::Get;
use respcounter::commands::incr::Incr;
use respcounter::commands::Command;
use respcounter::frame::Frame;

pub const PASSWORD: &str = "s3cret";

/// The exact bytes a client sends to authenticate with [`PASSWORD`].
pub const AUTH_REQUEST: &[u8] = b"*2\r\n$4\r\nAUTH\r\n$6\r\ns3cret\r\n";

pub fn url(port: u16) -> String {
    format!("redis://default:{}@127.0.0.1:{}", PASSWORD, port)
}

/// What a scripted server does with the single connection it accepts.
#[derive(Default)]
pub struct Script {
    /// Bytes to read from the client before replying.
    pub expect: usize,
    /// Chunks written back, one at a time.
    pub replies: Vec<&'static str>,
    /// Pause before each chunk.
    pub delay: Duration,
    /// Close the connection right after the last chunk instead of waiting for the client.
    pub hang_up: bool,
}

pub struct ScriptedServer {
    pub port: u16,
    /// Resolves to every byte the client sent, once the client closes the connection.
    pub session: JoinHandle<Vec<u8>>,
}

pub async fn scripted_server(script: Script) -> ScriptedServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let session = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        let mut buf = [0u8; 1024];

        while received.len() < script.expect {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return received,
                Ok(n) => received.extend_from_slice(&buf[..n]),
            }
        }

        for chunk in script.replies {
            sleep(script.delay).await;
            if socket.write_all(chunk.as_bytes()).await.is_err() {
                return received;
            }
        }

        if script.hang_up {
            return received;
        }

        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => received.extend_from_slice(&buf[..n]),
            }
        }

        received
    });

    ScriptedServer { port, session }
}

pub type Data = Arc<Mutex<HashMap<String, Bytes>>>;

/// A tiny in-memory store that understands AUTH, INCR and GET.
pub async fn fake_store() -> (u16, Data) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let data: Data = Arc::new(Mutex::new(HashMap::new()));

    tokio::spawn({
        let data = data.clone();
        async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve(socket, data.clone()));
            }
        }
    });

    (port, data)
}

/// The same store behind TLS, presenting a freshly generated self-signed certificate.
pub async fn fake_tls_store() -> (u16, Data) {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let key = PrivatePkcs8KeyDer::from(cert.key_pair.serialize_der());
    let cert_der: CertificateDer<'static> = cert.cert.der().clone();

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .unwrap()
        .with_no_client_auth()
        .with_single_cert(vec![cert_der], key.into())
        .unwrap();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let data: Data = Arc::new(Mutex::new(HashMap::new()));

    tokio::spawn({
        let data = data.clone();
        async move {
            while let Ok((socket, _)) = listener.accept().await {
                let acceptor = acceptor.clone();
                let data = data.clone();
                tokio::spawn(async move {
                    // A client that does not speak TLS just gets disconnected.
                    if let Ok(stream) = acceptor.accept(socket).await {
                        serve(stream, data).await;
                    }
                });
            }
        }
    });

    (port, data)
}

async fn serve<S>(socket: S, data: Data)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(socket, RespCodec::new());
    let mut authenticated = false;

    while let Some(Ok(frame)) = framed.next().await {
        let reply = apply(&data, &mut authenticated, frame);
        if framed.send(reply).await.is_err() {
            break;
        }
    }
}

fn apply(data: &Data, authenticated: &mut bool, frame: Frame) -> Frame {
    let cmd = match parse_command(frame) {
        Ok(cmd) => cmd,
        Err(e) => return Frame::Error(format!("ERR {}", e)),
    };

    match cmd {
        Command::Auth(auth) if auth.password == PASSWORD => {
            *authenticated = true;
            Frame::Simple("OK".to_string())
        }
        Command::Auth(_) => Frame::Error(
            "WRONGPASS invalid username-password pair or user is disabled.".to_string(),
        ),
        _ if !*authenticated => Frame::Error("NOAUTH Authentication required.".to_string()),
        Command::Incr(incr) => {
            let mut data = data.lock().unwrap();
            let current = match data.get(&incr.key) {
                Some(value) => match std::str::from_utf8(value).ok().and_then(|s| s.parse::<i64>().ok()) {
                    Some(n) => n,
                    None => {
                        return Frame::Error(
                            "ERR value is not an integer or out of range".to_string(),
                        )
                    }
                },
                None => 0,
            };
            data.insert(incr.key, Bytes::from((current + 1).to_string()));
            Frame::Integer(current + 1)
        }
        Command::Get(get) => data
            .lock()
            .unwrap()
            .get(&get.key)
            .cloned()
            .map_or(Frame::Null, Frame::Bulk),
    }
}

/// Reads a request the way the store would: an array holding a command name and one argument.
fn parse_command(frame: Frame) -> Result<Command, String> {
    let parts = match frame {
        Frame::Array(parts) => parts,
        frame => return Err(format!("expected an array, got {}", frame)),
    };

    let mut args = Vec::with_capacity(parts.len());
    for part in parts {
        match part {
            Frame::Simple(s) => args.push(s),
            Frame::Bulk(bytes) => {
                args.push(String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string())?)
            }
            frame => return Err(format!("expected a string, got {}", frame)),
        }
    }

    let [name, arg] = <[String; 2]>::try_from(args)
        .map_err(|args| format!("wrong number of arguments ({})", args.len()))?;

    match name.to_lowercase().as_str() {
        "auth" => Ok(Command::Auth(Auth { password: arg })),
        "get" => Ok(Command::Get(Get { key: arg })),
        "incr" => Ok(Command::Incr(Incr { key: arg })),
        other => Err(format!("unknown command '{}'", other)),
    }
}
