use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Custom epoch: 2024-01-01T00:00:00Z in milliseconds since Unix epoch.
const GAMERHUB_EPOCH_MS: u64 = 1_704_067_200_000;

const WORKER_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

struct State {
    last_ms: u64,
    sequence: u64,
}

/// 64-bit time-ordered message ID generator.
///
/// Message IDs double as the within-community ordering and dedup key, so
/// they must be unique and sort by creation time. Layout (MSB → LSB):
/// 42 bits of milliseconds since the GamerHub epoch, 10 bits of worker ID,
/// 12 bits of per-millisecond sequence.
pub struct SnowflakeGenerator {
    worker_id: u64,
    state: Mutex<State>,
}

impl SnowflakeGenerator {
    pub fn new(worker_id: u16) -> Self {
        assert!(
            (worker_id as u64) < (1 << WORKER_BITS),
            "worker_id must fit in {WORKER_BITS} bits"
        );
        Self {
            worker_id: worker_id as u64,
            state: Mutex::new(State {
                last_ms: 0,
                sequence: 0,
            }),
        }
    }

    pub fn generate(&self) -> i64 {
        let mut state = self.state.lock().unwrap();

        let mut now_ms = current_ms();
        if now_ms < state.last_ms {
            // Tolerate small clock steps by reusing the last timestamp; the
            // sequence counter still guarantees uniqueness within it.
            now_ms = state.last_ms;
        }

        if now_ms == state.last_ms {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                // Sequence exhausted for this millisecond; wait it out.
                while now_ms <= state.last_ms {
                    now_ms = current_ms();
                }
            }
        } else {
            state.sequence = 0;
        }

        state.last_ms = now_ms;

        let ts = now_ms - GAMERHUB_EPOCH_MS;
        ((ts << (WORKER_BITS + SEQUENCE_BITS)) | (self.worker_id << SEQUENCE_BITS) | state.sequence)
            as i64
    }
}

fn current_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before Unix epoch")
        .as_millis() as u64
}
