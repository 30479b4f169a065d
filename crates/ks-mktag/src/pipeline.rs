use std::fmt;
use std::io::Read;
use std::time::{Duration, Instant};

use ks_fsck::{validate, FsckMsgId, Severity, SeverityPolicy};
use ks_store::{NoReplacements, ObjectStore, ReplacementResolver, StoredObject};
use ks_types::{ObjectId, ObjectKind};
use tracing::{debug, info};

use crate::error::{MktagError, MktagResult};
use crate::verify::{ReferenceVerifier, VerifiedReference};

/// The policy tag admission starts from: strict mode, with extra header
/// lines promoted from ignored to reported.
pub fn mktag_policy() -> SeverityPolicy {
    let mut policy = SeverityPolicy::strict();
    policy
        .set(FsckMsgId::ExtraHeaderEntry, Severity::Warn)
        .expect("extraHeaderEntry is neither fatal nor essential");
    policy
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Steps of a single commit. `Done` and `Aborted` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Buffering,
    Validating,
    Verifying,
    Writing,
    Done,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Buffering => "buffering",
            Self::Validating => "validating",
            Self::Verifying => "verifying",
            Self::Writing => "writing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Time spent in one phase.
#[derive(Clone, Debug)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// CommitReport
// ---------------------------------------------------------------------------

/// Everything observable about one commit attempt.
#[derive(Debug)]
pub struct CommitReport {
    /// Phases entered, in order, ending with `Done` or `Aborted`.
    pub phases: Vec<PhaseRecord>,
    /// The committed address, or the reason for aborting.
    pub outcome: MktagResult<ObjectId>,
}

impl CommitReport {
    /// The terminal phase.
    pub fn final_phase(&self) -> Phase {
        self.phases
            .last()
            .map(|record| record.phase)
            .unwrap_or(Phase::Aborted)
    }

    /// Whether the commit got as far as `phase`.
    pub fn reached(&self, phase: Phase) -> bool {
        self.phases.iter().any(|record| record.phase == phase)
    }
}

// ---------------------------------------------------------------------------
// TagCommitter
// ---------------------------------------------------------------------------

/// Drives a candidate tag from raw bytes to a committed object.
///
/// The pipeline is **fail-fast** and strictly sequential:
///
/// ```text
/// Buffering -> Validating -> Verifying -> Writing -> Done
///      \            \            \           \
///       `------------`------------`-----------`--> Aborted
/// ```
///
/// The bytes written are the bytes validated; nothing is normalised or
/// re-serialised in between. At most one write is attempted per commit and a
/// failed write is not retried.
pub struct TagCommitter<S, R = NoReplacements> {
    store: S,
    resolver: R,
    policy: SeverityPolicy,
}

impl<S, R> TagCommitter<S, R>
where
    S: ObjectStore,
    R: ReplacementResolver,
{
    pub fn new(store: S, resolver: R, policy: SeverityPolicy) -> Self {
        Self {
            store,
            resolver,
            policy,
        }
    }

    /// Commit a fully buffered payload and return its address.
    pub fn commit(&self, payload: &[u8]) -> MktagResult<ObjectId> {
        self.run(payload).outcome
    }

    /// Read `reader` to the end, then commit what was read.
    pub fn commit_from_reader<Rd: Read>(&self, reader: Rd) -> MktagResult<ObjectId> {
        self.run_from_reader(reader).outcome
    }

    /// Like [`Self::commit_from_reader`], returning the full report.
    pub fn run_from_reader<Rd: Read>(&self, mut reader: Rd) -> CommitReport {
        let tracker = Tracker::start();
        let mut payload = Vec::new();
        if let Err(e) = reader.read_to_end(&mut payload) {
            return tracker.abort(MktagError::Input(e));
        }
        debug!(bytes = payload.len(), "tag input buffered");
        self.run_buffered(tracker, &payload)
    }

    /// Like [`Self::commit`], returning the full report.
    pub fn run(&self, payload: &[u8]) -> CommitReport {
        self.run_buffered(Tracker::start(), payload)
    }

    /// Validate and verify without writing.
    pub fn check(&self, payload: &[u8]) -> MktagResult<VerifiedReference> {
        let tag = validate(payload, &self.policy)?;
        let verified =
            ReferenceVerifier::new(&self.store, &self.resolver).verify(&tag.object, tag.kind)?;
        Ok(verified)
    }

    fn run_buffered(&self, mut tracker: Tracker, payload: &[u8]) -> CommitReport {
        tracker.advance(Phase::Validating);
        let tag = match validate(payload, &self.policy) {
            Ok(tag) => tag,
            Err(e) => return tracker.abort(e.into()),
        };

        tracker.advance(Phase::Verifying);
        let verifier = ReferenceVerifier::new(&self.store, &self.resolver);
        if let Err(e) = verifier.verify(&tag.object, tag.kind) {
            return tracker.abort(e.into());
        }

        tracker.advance(Phase::Writing);
        let object = StoredObject::new(ObjectKind::Tag, payload.to_vec());
        match self.store.write(&object) {
            Ok(id) => {
                info!(
                    id = %id,
                    tag = %tag.name_lossy(),
                    target = %tag.object.short_hex(),
                    signed = tag.signature().is_some(),
                    "tag committed"
                );
                tracker.finish(id)
            }
            Err(e) => tracker.abort(MktagError::StoreWriteFailure(e)),
        }
    }
}

/// Records phase transitions for one commit.
struct Tracker {
    records: Vec<PhaseRecord>,
    current: Phase,
    entered: Instant,
}

impl Tracker {
    fn start() -> Self {
        Self {
            records: Vec::with_capacity(6),
            current: Phase::Buffering,
            entered: Instant::now(),
        }
    }

    fn advance(&mut self, next: Phase) {
        debug!(from = %self.current, to = %next, "tag commit phase");
        self.records.push(PhaseRecord {
            phase: self.current,
            elapsed: self.entered.elapsed(),
        });
        self.current = next;
        self.entered = Instant::now();
    }

    fn finish(mut self, id: ObjectId) -> CommitReport {
        self.advance(Phase::Done);
        self.close(Ok(id))
    }

    fn abort(mut self, error: MktagError) -> CommitReport {
        debug!(phase = %self.current, category = %error.category(), %error, "tag commit aborted");
        self.advance(Phase::Aborted);
        self.close(Err(error))
    }

    fn close(mut self, outcome: MktagResult<ObjectId>) -> CommitReport {
        self.records.push(PhaseRecord {
            phase: self.current,
            elapsed: Duration::ZERO,
        });
        CommitReport {
            phases: self.records,
            outcome,
        }
    }
}
