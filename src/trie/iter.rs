use std::ops::Bound;

use log::error;

use crate::api::error::Result;
use crate::container::{Container, NodeId};
use crate::search::{self, Direction, Walk};
use crate::trie::arena::Arena;
use crate::trie::node::Node;
use crate::trie::Trie;

/// Walks the sorted leaf chain between two leaves (both inclusive).
pub struct Iter<'a, V, C> {
    arena: &'a Arena<Node<V, C>>,
    front: Option<NodeId>,
    back: Option<NodeId>,
}

impl<'a, V, C> Iter<'a, V, C> {
    fn new(arena: &'a Arena<Node<V, C>>, front: Option<NodeId>, back: Option<NodeId>) -> Self {
        Self { arena, front, back }
    }

    fn empty(arena: &'a Arena<Node<V, C>>) -> Self {
        Self::new(arena, None, None)
    }

    /// Entry of a chained node. A chained node that is not a leaf ends the
    /// iteration and is reported through the log.
    fn visit(&mut self, id: NodeId, node: &'a Node<V, C>) -> Option<(&'a [u8], &'a V)> {
        match node.entry() {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!("Iteration stopped at node {:?}: {}", id, e);
                self.front = None;
                self.back = None;
                None
            }
        }
    }
}

impl<'a, V, C> Iterator for Iter<'a, V, C> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.front?;
        let arena = self.arena;
        let node = &arena[id];
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = node.next;
        }
        self.visit(id, node)
    }
}

impl<'a, V, C> DoubleEndedIterator for Iter<'a, V, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let id = self.back?;
        let arena = self.arena;
        let node = &arena[id];
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = node.prev;
        }
        self.visit(id, node)
    }
}

impl<V, C: Container> Walk for Trie<V, C> {
    type Node = NodeId;

    fn root(&self) -> NodeId {
        self.root
    }

    fn key_size(&self) -> usize {
        self.key_size
    }

    fn child(&self, node: NodeId, symbol: u8) -> Result<Option<NodeId>> {
        Ok(self.container(node)?.get(symbol))
    }

    fn successor(&self, node: NodeId, symbol: u8) -> Result<Option<NodeId>> {
        Ok(self.container(node)?.successor(symbol))
    }

    fn predecessor(&self, node: NodeId, symbol: u8) -> Result<Option<NodeId>> {
        Ok(self.container(node)?.predecessor(symbol))
    }

    fn head(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.container(node)?.head())
    }

    fn tail(&self, node: NodeId) -> Result<Option<NodeId>> {
        Ok(self.container(node)?.tail())
    }
}

impl<V, C: Container> Trie<V, C> {
    /// Value of the smallest key strictly greater than `key`.
    ///
    /// Query keys shorter than the key size are right-padded with the
    /// alphabet's minimal symbol, longer ones are truncated.
    pub fn gt(&self, key: &[u8]) -> Result<Option<&V>> {
        self.seek_value(key, Direction::Forward, false)
    }

    pub fn gte(&self, key: &[u8]) -> Result<Option<&V>> {
        self.seek_value(key, Direction::Forward, true)
    }

    /// Value of the biggest key strictly lesser than `key`.
    pub fn lt(&self, key: &[u8]) -> Result<Option<&V>> {
        self.seek_value(key, Direction::Backward, false)
    }

    pub fn lte(&self, key: &[u8]) -> Result<Option<&V>> {
        self.seek_value(key, Direction::Backward, true)
    }

    /// Entry with the smallest key strictly greater than `key`.
    pub fn successor(&self, key: &[u8]) -> Result<Option<(&[u8], &V)>> {
        self.seek_entry(key, Direction::Forward, false)
    }

    /// Entry with the biggest key strictly lesser than `key`.
    pub fn predecessor(&self, key: &[u8]) -> Result<Option<(&[u8], &V)>> {
        self.seek_entry(key, Direction::Backward, false)
    }

    pub fn first(&self) -> Result<Option<(&[u8], &V)>> {
        self.head.map(|id| self.arena[id].entry()).transpose()
    }

    pub fn last(&self) -> Result<Option<(&[u8], &V)>> {
        self.tail.map(|id| self.arena[id].entry()).transpose()
    }

    /// All entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, V, C> {
        Iter::new(&self.arena, self.head, self.tail)
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &[u8]> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn foreach<F: FnMut(&[u8], &V)>(&self, mut visit: F) {
        for (key, val) in self.iter() {
            visit(key, val);
        }
    }

    /// Entries with keys between the bounds, in ascending order.
    /// `Unbounded` stands for the first/last key of the trie.
    pub fn range<K: AsRef<[u8]>>(
        &self,
        lower: Bound<K>,
        upper: Bound<K>,
    ) -> Result<Iter<'_, V, C>> {
        let lo = self.resolve(lower, Direction::Forward)?;
        let hi = self.resolve(upper, Direction::Backward)?;
        match (lo, hi) {
            (Some(lo), Some(hi)) if self.arena[lo].entry()?.0 <= self.arena[hi].entry()?.0 => {
                Ok(Iter::new(&self.arena, Some(lo), Some(hi)))
            }
            _ => Ok(Iter::empty(&self.arena)),
        }
    }

    /// Eagerly collected values of [`Trie::range`].
    pub fn scan<K: AsRef<[u8]>>(&self, lower: Bound<K>, upper: Bound<K>) -> Result<Vec<&V>> {
        Ok(self.range(lower, upper)?.map(|(_, v)| v).collect())
    }

    fn resolve<K: AsRef<[u8]>>(
        &self,
        bound: Bound<K>,
        direction: Direction,
    ) -> Result<Option<NodeId>> {
        match bound {
            Bound::Included(key) => self.seek(key.as_ref(), direction, true),
            Bound::Excluded(key) => self.seek(key.as_ref(), direction, false),
            Bound::Unbounded => Ok(match direction {
                Direction::Forward => self.head,
                Direction::Backward => self.tail,
            }),
        }
    }

    fn seek(&self, key: &[u8], direction: Direction, inclusive: bool) -> Result<Option<NodeId>> {
        if self.head.is_none() {
            return Ok(None);
        }
        let pad = self.container(self.root)?.pad();
        let key = search::pad(key, self.key_size, pad);
        search::seek(self, &key, direction, inclusive)
    }

    fn seek_entry(
        &self,
        key: &[u8],
        direction: Direction,
        inclusive: bool,
    ) -> Result<Option<(&[u8], &V)>> {
        match self.seek(key, direction, inclusive)? {
            Some(leaf) => Ok(Some(self.arena[leaf].entry()?)),
            None => Ok(None),
        }
    }

    fn seek_value(&self, key: &[u8], direction: Direction, inclusive: bool) -> Result<Option<&V>> {
        Ok(self.seek_entry(key, direction, inclusive)?.map(|(_, v)| v))
    }
}

#[cfg(test)]
mod tests {
    use crate::api::error::Error;
    use crate::container::{ByteMap, Container, DigitMap, HexMap, LinkMap};
    use crate::trie::node::Kind;
    use crate::trie::Trie;
    use crate::util;
    use rand::prelude::*;
    use std::collections::BTreeMap;
    use std::ops::Bound::{self, Excluded, Included, Unbounded};

    fn digits(trie: &mut Trie<String, DigitMap>, keys: &[&str]) {
        for key in keys {
            trie.set(key.as_bytes(), key.to_string()).unwrap();
        }
    }

    #[test]
    fn test_neighbours() {
        let mut trie = Trie::new(3, DigitMap::new);
        digits(&mut trie, &["101", "111", "121", "205", "999"]);

        assert_eq!(trie.gt(b"111").unwrap().unwrap(), "121");
        assert_eq!(trie.gte(b"111").unwrap().unwrap(), "111");
        assert_eq!(trie.gt(b"121").unwrap().unwrap(), "205");
        assert_eq!(trie.gt(b"130").unwrap().unwrap(), "205");
        assert_eq!(trie.gt(b"999").unwrap(), None);
        assert_eq!(trie.gte(b"000").unwrap().unwrap(), "101");

        assert_eq!(trie.lt(b"111").unwrap().unwrap(), "101");
        assert_eq!(trie.lte(b"111").unwrap().unwrap(), "111");
        assert_eq!(trie.lt(b"205").unwrap().unwrap(), "121");
        assert_eq!(trie.lt(b"200").unwrap().unwrap(), "121");
        assert_eq!(trie.lt(b"101").unwrap(), None);
        assert_eq!(trie.lte(b"999").unwrap().unwrap(), "999");
    }

    #[test]
    fn test_padding() {
        let mut trie = Trie::new(4, HexMap::new);
        for key in ["00ff", "0a00", "0a01", "ffff"] {
            trie.set(key.as_bytes(), key).unwrap();
        }
        // "0a" is padded to "0a00"
        assert_eq!(trie.gte(b"0a").unwrap(), Some(&"0a00"));
        assert_eq!(trie.gt(b"0a").unwrap(), Some(&"0a01"));
        assert_eq!(trie.lt(b"0a").unwrap(), Some(&"00ff"));
        // longer keys are truncated
        assert_eq!(trie.lte(b"0a01ffff").unwrap(), Some(&"0a01"));
        assert_eq!(trie.gt(b"").unwrap(), Some(&"00ff"));
    }

    #[test]
    fn test_empty() {
        let trie: Trie<u8, LinkMap> = Trie::new(2, LinkMap::new);
        assert_eq!(trie.gt(b"aa").unwrap(), None);
        assert_eq!(trie.lte(b"aa").unwrap(), None);
        assert!(trie.scan(Bound::<&[u8]>::Unbounded, Unbounded).unwrap().is_empty());
        assert_eq!(trie.iter().next(), None);
    }

    fn reference_gt(reference: &BTreeMap<Vec<u8>, u32>, q: &[u8], inclusive: bool) -> Option<u32> {
        let lower = if inclusive {
            Included(q.to_vec())
        } else {
            Excluded(q.to_vec())
        };
        reference.range((lower, Unbounded)).next().map(|(_, v)| *v)
    }

    fn reference_lt(reference: &BTreeMap<Vec<u8>, u32>, q: &[u8], inclusive: bool) -> Option<u32> {
        let upper = if inclusive {
            Included(q.to_vec())
        } else {
            Excluded(q.to_vec())
        };
        reference.range((Unbounded, upper)).next_back().map(|(_, v)| *v)
    }

    fn check_search<C: Container>(factory: fn() -> C, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let size = 3;
        let mut trie = Trie::new(size, factory);
        let mut reference = BTreeMap::new();
        for (i, (k, _)) in util::data(300, size, seed).into_iter().enumerate() {
            // Narrow alphabet so queries hit and miss at every level.
            let k = k.iter().map(|b| b % 8 * 32).collect::<Vec<_>>();
            trie.set(&k, i as u32).unwrap();
            reference.insert(k, i as u32);
        }

        for _ in 0..1000 {
            let q = (0..size).map(|_| rng.gen::<u8>()).collect::<Vec<_>>();
            assert_eq!(trie.gt(&q).unwrap().copied(), reference_gt(&reference, &q, false));
            assert_eq!(trie.gte(&q).unwrap().copied(), reference_gt(&reference, &q, true));
            assert_eq!(trie.lt(&q).unwrap().copied(), reference_lt(&reference, &q, false));
            assert_eq!(trie.lte(&q).unwrap().copied(), reference_lt(&reference, &q, true));
        }

        for q in reference.keys() {
            assert_eq!(trie.gte(q).unwrap().copied(), reference.get(q).copied());
            assert_eq!(trie.lt(q).unwrap().copied(), reference_lt(&reference, q, false));
        }
    }

    #[test]
    fn test_search_bytemap() {
        check_search(ByteMap::new, 42);
    }

    #[test]
    fn test_search_linkmap() {
        check_search(LinkMap::new, 43);
    }

    #[test]
    fn test_scan() {
        let data = util::data(400, 2, 42);
        let mut trie = Trie::new(2, ByteMap::new);
        let mut reference = BTreeMap::new();
        for (k, v) in data.iter() {
            trie.set(k, v.clone()).unwrap();
            reference.insert(k.clone(), v.clone());
        }

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut a = vec![rng.gen::<u8>(), rng.gen::<u8>()];
            let mut b = vec![rng.gen::<u8>(), rng.gen::<u8>()];
            if a > b {
                std::mem::swap(&mut a, &mut b);
            }
            let found = trie.scan(Included(&a), Excluded(&b)).unwrap();
            let expected = reference
                .range((Included(a.clone()), Excluded(b.clone())))
                .map(|(_, v)| v)
                .collect::<Vec<_>>();
            assert_eq!(found, expected);

            let found = trie.range(Excluded(&a), Included(&b)).unwrap().rev().count();
            let expected = reference.range((Excluded(a.clone()), Included(b.clone()))).count();
            assert_eq!(found, expected);
        }

        // Inverted and out-of-range bounds are empty, not the whole chain.
        assert!(trie.scan(Included(&[9u8, 9]), Excluded(&[1u8, 1])).unwrap().is_empty());
        let above = reference.keys().next_back().unwrap().clone();
        assert!(trie.scan(Excluded(&above), Unbounded).unwrap().is_empty());
        assert_eq!(
            trie.scan(Bound::<&[u8]>::Unbounded, Unbounded).unwrap().len(),
            reference.len()
        );
    }

    #[test]
    fn test_foreach() {
        let mut trie = Trie::new(2, ByteMap::new);
        for k in [b"zz", b"aa", b"mm"] {
            trie.set(k, ()).unwrap();
        }
        let mut seen = Vec::new();
        trie.foreach(|k, _| seen.push(k.to_vec()));
        assert_eq!(seen, vec![b"aa".to_vec(), b"mm".to_vec(), b"zz".to_vec()]);
        assert_eq!(trie.keys().rev().next(), Some(&b"zz"[..]));
        assert_eq!(trie.values().count(), 3);

        let (k, _) = trie.successor(b"aa").unwrap().unwrap();
        assert_eq!(k, b"mm");
        assert!(trie.predecessor(b"aa").unwrap().is_none());
    }

    #[test]
    fn test_empty_container_is_reported() {
        let mut trie = Trie::new(2, ByteMap::new);
        trie.set(b"aa", 1).unwrap();
        trie.set(b"ba", 2).unwrap();

        // Corrupt the structure: drop the only child of "b" behind the trie's back.
        let b = trie.container(trie.root).unwrap().get(b'b').unwrap();
        trie.arena[b].children_mut().unwrap().delete(b'a');

        assert!(matches!(
            trie.gt(b"a\xff"),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_chained_internal_node_is_reported() {
        let mut trie = Trie::new(2, ByteMap::new);
        trie.set(b"aa", 1).unwrap();
        trie.set(b"ab", 2).unwrap();
        trie.set(b"ac", 3).unwrap();

        // Corrupt the structure: turn the last leaf into an internal node.
        let a = trie.container(trie.root).unwrap().get(b'a').unwrap();
        let c = trie.container(a).unwrap().get(b'c').unwrap();
        trie.arena[c].kind = Kind::Internal(ByteMap::new());

        assert!(matches!(trie.last(), Err(Error::InvariantViolation(_))));
        assert_eq!(trie.first().unwrap(), Some((&b"aa"[..], &1)));
        assert_eq!(trie.values().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(trie.iter().rev().count(), 0);
    }
}
