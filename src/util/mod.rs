use rand::prelude::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};

pub mod hex;
pub(crate) mod pool;
pub(crate) mod stack;

/// Seeded random `(key, value)` pairs with `key_size`-byte keys and 8-byte values.
/// Keys may repeat when the key space is small.
pub fn data(count: usize, key_size: usize, seed: u64) -> Vec<(Vec<u8>, Vec<u8>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let mut key = vec![0u8; key_size];
            rng.fill_bytes(&mut key);
            (key, rng.next_u64().to_be_bytes().to_vec())
        })
        .collect()
}

pub fn shuffle<T>(mut items: Vec<T>, seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data() {
        let a = data(16, 3, 42);
        let b = data(16, 3, 42);
        assert_eq!(a, b);
        assert!(a.iter().all(|(k, v)| k.len() == 3 && v.len() == 8));
        assert_ne!(a, data(16, 3, 43));

        let mut shuffled = shuffle(a.clone(), 1);
        assert_eq!(shuffled.len(), a.len());
        shuffled.sort();
        let mut sorted = a;
        sorted.sort();
        assert_eq!(shuffled, sorted);
    }
}
