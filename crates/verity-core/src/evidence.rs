//! Evidence chain
//!
//! Append-only record of every ground-truth or cross-worker check: which claim,
//! which verifier, what method, the outcome and when. Entries are never
//! mutated or removed; their sequence numbers increase monotonically.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use verity_claim::{Claim, Fingerprint};

/// Short identifier of an evidence entry (16 hex chars)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceId(String);

impl EvidenceId {
    /// Identifier text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EvidenceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EvidenceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which verifier produced an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Path and content checks
    FileSystem,
    /// Parsed source outline
    SourceStructure,
    /// Peer reports
    CrossWorker,
}

impl EvidenceSource {
    /// Stable snake_case name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceSource::FileSystem => "file_system",
            EvidenceSource::SourceStructure => "source_structure",
            EvidenceSource::CrossWorker => "cross_worker",
        }
    }
}

impl Display for EvidenceSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One check of one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Stable identifier
    pub id: EvidenceId,
    /// Canonical JSON of the claim
    pub claim: String,
    /// Claim fingerprint
    pub fingerprint: Fingerprint,
    /// Verifier that ran the check
    pub source: EvidenceSource,
    /// Human-readable check name
    pub method: String,
    /// Outcome
    pub verified: bool,
    /// When the check finished
    pub timestamp: DateTime<Utc>,
    /// Position in the chain
    pub sequence: u64,
}

/// Thread-safe append-only evidence log
#[derive(Debug, Default)]
pub struct EvidenceChain {
    entries: RwLock<Vec<Evidence>>,
}

impl EvidenceChain {
    /// Create empty chain
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check and return its identifier
    ///
    /// The identifier hashes the claim, source, timestamp and sequence number,
    /// so two checks of the same claim in the same instant still differ.
    pub fn append(
        &self,
        claim: &Claim,
        source: EvidenceSource,
        method: impl Into<String>,
        verified: bool,
    ) -> EvidenceId {
        let claim_json = claim.to_canonical_json();
        let fingerprint = claim.fingerprint();
        let method = method.into();
        let timestamp = Utc::now();
        let nanos = timestamp.timestamp_nanos_opt().unwrap_or_default().to_le_bytes();

        let mut guard = self.entries.write();
        let sequence = guard.len() as u64;
        let sequence_bytes = sequence.to_le_bytes();
        let id = EvidenceId(
            Fingerprint::compute_fields([
                claim_json.as_bytes(),
                source.as_str().as_bytes(),
                nanos.as_slice(),
                sequence_bytes.as_slice(),
            ])
            .short(),
        );

        tracing::trace!(%id, %source, %method, verified, "evidence appended");
        guard.push(Evidence {
            id: id.clone(),
            claim: claim_json,
            fingerprint,
            source,
            method,
            verified,
            timestamp,
            sequence,
        });
        id
    }

    /// Every entry about the same assertion as `claim`
    ///
    /// Matches on fingerprint, or on the claim's canonical JSON appearing in
    /// the recorded claim text.
    #[must_use]
    pub fn find_by_claim(&self, claim: &Claim) -> Vec<Evidence> {
        let fingerprint = claim.fingerprint();
        let json = claim.to_canonical_json();
        self.entries
            .read()
            .iter()
            .filter(|e| e.fingerprint == fingerprint || e.claim.contains(&json))
            .cloned()
            .collect()
    }

    /// True if at least one entry verified `claim`
    #[must_use]
    pub fn has_verified(&self, claim: &Claim) -> bool {
        let fingerprint = claim.fingerprint();
        self.entries
            .read()
            .iter()
            .any(|e| e.verified && e.fingerprint == fingerprint)
    }

    /// Entry with this identifier
    #[must_use]
    pub fn find_by_id(&self, id: &EvidenceId) -> Option<Evidence> {
        self.entries.read().iter().find(|e| &e.id == id).cloned()
    }

    /// Snapshot of all entries in append order
    #[must_use]
    pub fn export(&self) -> Vec<Evidence> {
        self.entries.read().clone()
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if nothing was recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
