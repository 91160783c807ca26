//! Versioned binary encoding for arena snapshots.
//!
//! The core's snapshot types are plain `serde` values; this module is the
//! reference encoding: a `bitcode` payload behind a header carrying a
//! magic number, format version, and the tick at capture time. Decoding
//! validates the header before handing the snapshot back, so version skew
//! surfaces as an error instead of garbage state.

use crate::arena::ArenaSnapshot;
use crate::tick::Ticks;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying an encoded arena snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xCAD3_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while encoding.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur while decoding.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header carried by every encoded snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Magic number for format detection.
    pub magic: u32,
    /// Format version for forward compatibility.
    pub version: u32,
    /// Tick at which the snapshot was taken.
    pub tick: Ticks,
}

impl SnapshotHeader {
    /// Create a header for the current format version.
    pub fn new(tick: Ticks) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    /// Validate the header. Returns `Ok(())` if valid.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DecodeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DecodeError::FutureVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: DeserializeOwned"
))]
struct Envelope<T> {
    header: SnapshotHeader,
    snapshot: ArenaSnapshot<T>,
}

/// Encode a snapshot with a versioned header.
pub fn encode_snapshot<T: Serialize>(
    snapshot: &ArenaSnapshot<T>,
    tick: Ticks,
) -> Result<Vec<u8>, EncodeError>
where
    T: Clone,
{
    let envelope = Envelope {
        header: SnapshotHeader::new(tick),
        snapshot: snapshot.clone(),
    };
    bitcode::serialize(&envelope).map_err(|e| EncodeError::Encode(e.to_string()))
}

/// Decode an encoded snapshot, validating the header first.
pub fn decode_snapshot<T: DeserializeOwned>(
    data: &[u8],
) -> Result<(SnapshotHeader, ArenaSnapshot<T>), DecodeError> {
    let envelope: Envelope<T> =
        bitcode::deserialize(data).map_err(|e| DecodeError::Decode(e.to_string()))?;
    envelope.header.validate()?;
    Ok((envelope.header, envelope.snapshot))
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Arena;
    use crate::test_utils::TestPayload;

    fn populated_arena() -> Arena<TestPayload> {
        let mut arena = Arena::new();
        let h0 = arena.spawn(TestPayload::default()).unwrap();
        let _h1 = arena.spawn(TestPayload {
            health: 55,
            ..Default::default()
        })
        .unwrap();
        arena.despawn(h0);
        arena
    }

    #[test]
    fn encode_decode_round_trip() {
        let arena = populated_arena();
        let snapshot = arena.capture_snapshot();

        let bytes = encode_snapshot(&snapshot, 42).unwrap();
        let (header, decoded) = decode_snapshot::<TestPayload>(&bytes).unwrap();

        assert_eq!(header.magic, SNAPSHOT_MAGIC);
        assert_eq!(header.version, FORMAT_VERSION);
        assert_eq!(header.tick, 42);
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn restore_from_decoded_snapshot_matches_original() {
        let arena = populated_arena();
        let bytes = encode_snapshot(&arena.capture_snapshot(), 7).unwrap();
        let (_, decoded) = decode_snapshot::<TestPayload>(&bytes).unwrap();

        let mut restored: Arena<TestPayload> = Arena::new();
        restored.restore_snapshot(&decoded);
        assert_eq!(restored.capture_snapshot(), arena.capture_snapshot());
        assert_eq!(restored.len(), arena.len());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let arena = populated_arena();
        let snapshot = arena.capture_snapshot();
        let envelope = Envelope {
            header: SnapshotHeader {
                magic: 0xDEAD_BEEF,
                version: FORMAT_VERSION,
                tick: 0,
            },
            snapshot,
        };
        let bytes = bitcode::serialize(&envelope).unwrap();

        let result = decode_snapshot::<TestPayload>(&bytes);
        assert!(matches!(result, Err(DecodeError::InvalidMagic(0xDEAD_BEEF))));
    }

    #[test]
    fn future_version_is_rejected() {
        let arena = populated_arena();
        let snapshot = arena.capture_snapshot();
        let envelope = Envelope {
            header: SnapshotHeader {
                magic: SNAPSHOT_MAGIC,
                version: FORMAT_VERSION + 1,
                tick: 0,
            },
            snapshot,
        };
        let bytes = bitcode::serialize(&envelope).unwrap();

        let result = decode_snapshot::<TestPayload>(&bytes);
        assert!(matches!(result, Err(DecodeError::FutureVersion(v)) if v == FORMAT_VERSION + 1));
    }

    #[test]
    fn truncated_data_is_a_decode_error() {
        let arena = populated_arena();
        let bytes = encode_snapshot(&arena.capture_snapshot(), 0).unwrap();
        let result = decode_snapshot::<TestPayload>(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(DecodeError::Decode(_))));
    }

    #[test]
    fn error_display_messages() {
        let msg = format!("{}", DecodeError::InvalidMagic(0x1234));
        assert!(msg.contains("invalid magic"), "got: {msg}");

        let msg = format!("{}", DecodeError::FutureVersion(9));
        assert!(msg.contains("future version"), "got: {msg}");
    }
}
