//! Capture session: source reading, dissection and correlation.
//!
//! [`Capture`] is the synchronous engine: one frame in, pipeline,
//! correlator or stream matcher. [`CaptureSession`] runs it on a worker
//! thread while other threads read the shared [`CallRegistry`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::CallSummary;
use crate::call::CallRegistry;
use crate::config::Settings;
use crate::dissect::{DissectorToggles, Pipeline, TlsDecryptor, TlsDissector, TlsKey, TlsKeyError};
use crate::packet::{Packet, PacketType, Timestamp};
use crate::source::{PacketEvent, PacketSource, SourceError};
use crate::stream::{MediaMatch, match_packet};

const PAUSE_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    TlsKey(#[from] TlsKeyError),
    #[error("capture worker panicked")]
    WorkerPanicked,
}

/// Per-session packet counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStats {
    /// Frames read from the source.
    pub frames: u64,
    /// Frames kept for IP or TCP reassembly.
    pub held: u64,
    pub sip_packets: u64,
    pub rtp_packets: u64,
    pub rtcp_packets: u64,
    /// RTP/RTCP packets attributed to a call stream.
    pub media_matched: u64,
    /// RTP/RTCP packets no active call expected.
    pub media_unmatched: u64,
    /// TLS packets that stayed encrypted.
    pub tls_packets: u64,
    /// Packets that no application layer claimed.
    pub dropped: u64,
    pub first_ts: Option<Timestamp>,
    pub last_ts: Option<Timestamp>,
}

impl CaptureStats {
    fn update_ts_bounds(&mut self, ts: Timestamp) {
        self.first_ts = Some(self.first_ts.map_or(ts, |first| first.min(ts)));
        self.last_ts = Some(self.last_ts.map_or(ts, |last| last.max(ts)));
    }
}

/// Synchronous capture engine.
pub struct Capture {
    pipeline: Pipeline,
    registry: Arc<RwLock<CallRegistry>>,
    stats: CaptureStats,
}

impl Capture {
    /// Build the pipeline and registry described by `settings`.
    ///
    /// A configured key file must load even without a decryption backend;
    /// a broken key is a setup error.
    pub fn new(
        settings: &Settings,
        decryptor: Option<Box<dyn TlsDecryptor>>,
    ) -> Result<Self, CaptureError> {
        let mut pipeline = Pipeline::new(settings.toggles());
        if let Some(path) = &settings.keyfile {
            let key = Arc::new(TlsKey::load(path)?);
            debug!(path = %path.display(), "tls key loaded");
            match decryptor {
                Some(decryptor) => {
                    pipeline.register(Box::new(TlsDissector::with_decryptor(key, decryptor)));
                }
                None => {
                    warn!("tls key configured but no decryption backend available");
                }
            }
        }
        let registry = CallRegistry::new(settings.registry_options());
        Ok(Self {
            pipeline,
            registry: Arc::new(RwLock::new(registry)),
            stats: CaptureStats::default(),
        })
    }

    pub fn registry(&self) -> &Arc<RwLock<CallRegistry>> {
        &self.registry
    }

    pub fn toggles(&self) -> &Arc<DissectorToggles> {
        self.pipeline.toggles()
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    /// Dissect one frame and hand the result to the correlation engines.
    pub fn process(&mut self, event: PacketEvent) {
        let (linktype, frame) = event.into_frame();
        self.stats.frames += 1;
        self.stats.update_ts_bounds(frame.ts());

        let packets = self.pipeline.dissect_frame(linktype, frame);
        if packets.is_empty() {
            self.stats.held += 1;
        }
        for packet in packets {
            self.dispatch(packet);
        }
    }

    fn dispatch(&mut self, packet: Packet) {
        match packet.packet_type() {
            Some(packet_type) if packet_type.is_sip() => {
                self.stats.sip_packets += 1;
                self.registry.write().process_packet(packet);
            }
            Some(packet_type @ (PacketType::Rtp | PacketType::Rtcp)) => {
                if packet_type == PacketType::Rtp {
                    self.stats.rtp_packets += 1;
                } else {
                    self.stats.rtcp_packets += 1;
                }
                match match_packet(&mut self.registry.write(), &packet) {
                    Some(MediaMatch::Matched(_)) => self.stats.media_matched += 1,
                    Some(MediaMatch::Unmatched) | None => self.stats.media_unmatched += 1,
                }
            }
            Some(_) => self.stats.tls_packets += 1,
            None => self.stats.dropped += 1,
        }
    }

    /// Drain a source on the current thread.
    pub fn run(&mut self, source: &mut dyn PacketSource) -> Result<CaptureStats, CaptureError> {
        while let Some(event) = source.next_packet()? {
            self.process(event);
        }
        Ok(self.stats)
    }
}

/// A capture engine running on its own worker thread.
pub struct CaptureSession {
    registry: Arc<RwLock<CallRegistry>>,
    toggles: Arc<DissectorToggles>,
    paused: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    worker: JoinHandle<Result<CaptureStats, CaptureError>>,
}

impl CaptureSession {
    pub fn start<S>(mut source: S, mut capture: Capture) -> Self
    where
        S: PacketSource + Send + 'static,
    {
        let registry = Arc::clone(capture.registry());
        let toggles = Arc::clone(capture.toggles());
        let paused = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(AtomicBool::new(false));
        let worker_paused = Arc::clone(&paused);
        let worker_stop = Arc::clone(&stop);

        let worker = thread::spawn(move || -> Result<CaptureStats, CaptureError> {
            info!("capture started");
            while !worker_stop.load(Ordering::Relaxed) {
                if worker_paused.load(Ordering::Relaxed) {
                    thread::sleep(PAUSE_POLL);
                    continue;
                }
                match source.next_packet()? {
                    Some(event) => capture.process(event),
                    None => break,
                }
            }
            let stats = capture.stats();
            info!(
                frames = stats.frames,
                sip = stats.sip_packets,
                rtp = stats.rtp_packets,
                rtcp = stats.rtcp_packets,
                "capture finished"
            );
            Ok(stats)
        });

        Self {
            registry,
            toggles,
            paused,
            stop,
            worker,
        }
    }

    pub fn registry(&self) -> Arc<RwLock<CallRegistry>> {
        Arc::clone(&self.registry)
    }

    pub fn toggles(&self) -> Arc<DissectorToggles> {
        Arc::clone(&self.toggles)
    }

    /// Point-in-time copy of every call.
    pub fn snapshot(&self) -> Vec<CallSummary> {
        self.registry.read().snapshot()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Ask the worker to stop after the packet in flight.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the worker and return its totals.
    pub fn join(self) -> Result<CaptureStats, CaptureError> {
        self.worker
            .join()
            .map_err(|_| CaptureError::WorkerPanicked)?
    }
}
