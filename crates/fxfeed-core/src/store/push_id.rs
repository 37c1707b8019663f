//! Chronologically sortable push keys.
//!
//! 20 characters: 8 encode the millisecond timestamp, 12 are random. Keys
//! minted in the same millisecond increment the random part so they still
//! sort in creation order.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use uuid::Uuid;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const RANDOM_LEN: usize = 12;

struct LastKey {
    millis: i64,
    random: [u8; RANDOM_LEN],
}

pub struct PushIdGenerator {
    last: Mutex<LastKey>,
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(LastKey {
                millis: i64::MIN,
                random: [0; RANDOM_LEN],
            }),
        }
    }

    pub fn next_id(&self) -> String {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&self, millis: i64) -> String {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);

        // A clock that steps backwards keeps the previous timestamp.
        let millis = millis.max(last.millis);
        if millis == last.millis {
            for digit in last.random.iter_mut().rev() {
                if *digit == 63 {
                    *digit = 0;
                } else {
                    *digit += 1;
                    break;
                }
            }
        } else {
            last.millis = millis;
            let entropy = Uuid::new_v4().into_bytes();
            for (digit, byte) in last.random.iter_mut().zip(entropy) {
                *digit = byte % 64;
            }
        }

        let mut time_part = [0u8; 8];
        let mut remaining = millis.max(0);
        for slot in time_part.iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }

        time_part
            .iter()
            .copied()
            .chain(last.random.iter().map(|d| PUSH_CHARS[*d as usize]))
            .map(char::from)
            .collect()
    }
}

impl Default for PushIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_alphabet() {
        let id = PushIdGenerator::new().next_id();
        assert_eq!(id.len(), 20);
        assert!(id.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_same_millisecond_keys_increase() {
        let generator = PushIdGenerator::new();
        let ids: Vec<String> = (0..100).map(|_| generator.next_at(1_700_000_000_000)).collect();

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_later_millisecond_sorts_after() {
        let generator = PushIdGenerator::new();
        let a = generator.next_at(1_700_000_000_000);
        let b = generator.next_at(1_700_000_000_001);
        assert!(a < b);
        assert_eq!(&a[..7], &b[..7]);
    }
}
