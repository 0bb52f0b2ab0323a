use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::packet::{Packet, ProtoRecord, TlsRecord};
use crate::protocols::tls::layout::{
    CONTENT_APPLICATION_DATA, CONTENT_CHANGE_CIPHER_SPEC, CONTENT_HANDSHAKE,
};
use crate::protocols::tls::{TlsRecordView, split_records};

use super::{
    ConnKey, ConnectionArena, DissectContext, Dissector, ProtocolId, packet_endpoints,
};

const DEFAULT_MAX_SESSIONS: usize = 1024;

#[derive(Debug, Error)]
pub enum TlsKeyError {
    #[error("failed to read TLS key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid PEM data in {path}: {source}")]
    Pem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no private key found in {path}")]
    MissingKey { path: PathBuf },
}

/// Private key used to decrypt captured TLS sessions.
#[derive(Clone, PartialEq, Eq)]
pub struct TlsKey {
    der: Vec<u8>,
}

impl std::fmt::Debug for TlsKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsKey")
            .field("der_len", &self.der.len())
            .finish()
    }
}

impl TlsKey {
    /// Load the first private key (PKCS#1, PKCS#8 or SEC1) from a PEM file.
    pub fn load(path: &Path) -> Result<Self, TlsKeyError> {
        let file = File::open(path).map_err(|source| TlsKeyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let key = rustls_pemfile::private_key(&mut reader)
            .map_err(|source| TlsKeyError::Pem {
                path: path.to_path_buf(),
                source,
            })?
            .ok_or_else(|| TlsKeyError::MissingKey {
                path: path.to_path_buf(),
            })?;
        Ok(Self {
            der: key.secret_der().to_vec(),
        })
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

/// Record decryption backend.
///
/// Returns the cleartext application bytes carried by `records`, or `None`
/// while the session is still opaque (no handshake seen, unsupported
/// cipher, wrong key).
pub trait TlsDecryptor: Send {
    fn decrypt(
        &mut self,
        key: &TlsKey,
        conn: &ConnKey,
        records: &[TlsRecordView<'_>],
    ) -> Option<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
struct TlsSession {
    records: u64,
    handshake_records: u64,
    cipher_changed: bool,
    application_records: u64,
}

/// TLS record detection and optional decryption.
pub struct TlsDissector {
    key: Option<Arc<TlsKey>>,
    decryptor: Option<Box<dyn TlsDecryptor>>,
    sessions: ConnectionArena<TlsSession>,
}

impl Default for TlsDissector {
    fn default() -> Self {
        Self {
            key: None,
            decryptor: None,
            sessions: ConnectionArena::with_capacity(DEFAULT_MAX_SESSIONS),
        }
    }
}

impl TlsDissector {
    pub fn with_decryptor(key: Arc<TlsKey>, decryptor: Box<dyn TlsDecryptor>) -> Self {
        Self {
            key: Some(key),
            decryptor: Some(decryptor),
            ..Self::default()
        }
    }

    pub fn tracked_sessions(&self) -> usize {
        self.sessions.len()
    }
}

impl Dissector for TlsDissector {
    fn id(&self) -> ProtocolId {
        ProtocolId::Tls
    }

    fn subdissectors(&self) -> &'static [ProtocolId] {
        &[ProtocolId::Sip, ProtocolId::Ws]
    }

    fn dissect(
        &mut self,
        _ctx: &mut DissectContext,
        packet: &mut Packet,
        data: Vec<u8>,
    ) -> Option<Vec<u8>> {
        let Some((src, dst)) = packet_endpoints(packet) else {
            return Some(data);
        };
        let records = match split_records(&data) {
            Ok(Some(records)) => records,
            Ok(None) => return Some(data),
            Err(err) => {
                trace!(error = %err, "not a tls record");
                return Some(data);
            }
        };
        let Some(&first) = records.first() else {
            return Some(data);
        };
        let conn = ConnKey::new(src, dst);
        let session = self.sessions.entry(conn);
        for record in &records {
            session.records += 1;
            match record.content_type {
                CONTENT_HANDSHAKE => session.handshake_records += 1,
                CONTENT_CHANGE_CIPHER_SPEC => session.cipher_changed = true,
                CONTENT_APPLICATION_DATA => session.application_records += 1,
                _ => {}
            }
        }
        let session = *session;
        let has_application_data = records
            .iter()
            .any(|record| record.content_type == CONTENT_APPLICATION_DATA);

        let cleartext = match (&self.key, self.decryptor.as_mut()) {
            (Some(key), Some(decryptor)) if has_application_data => {
                decryptor.decrypt(key, &conn, &records)
            }
            _ => None,
        };
        packet.set_record(
            ProtocolId::Tls,
            ProtoRecord::Tls(TlsRecord {
                content_type: first.content_type,
                version: first.version,
                decrypted: cleartext.is_some(),
            }),
        );
        match cleartext {
            Some(cleartext) => {
                trace!(
                    conn = %conn,
                    bytes = cleartext.len(),
                    records = session.application_records,
                    "tls records decrypted"
                );
                Some(cleartext)
            }
            None => {
                if has_application_data && self.key.is_some() {
                    debug!(
                        conn = %conn,
                        records = session.records,
                        handshake = session.handshake_records,
                        cipher_changed = session.cipher_changed,
                        "tls application data left encrypted"
                    );
                }
                Some(data)
            }
        }
    }
}
