//! Order-statistic treap over (score, player) keys.
//!
//! Every node tracks the size of its subtree, which makes both "how many
//! keys sort before this one" and "the first k keys" logarithmic in the
//! number of members (plus k for the latter).

use podium_core::PlayerId;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sort key: higher scores first, then lower player ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RankKey {
    score: i64,
    player_id: PlayerId,
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .cmp(&self.score)
            .then_with(|| self.player_id.cmp(&other.player_id))
    }
}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

type Link = Option<Box<Node>>;

struct Node {
    key: RankKey,
    priority: u64,
    size: usize,
    left: Link,
    right: Link,
}

impl Node {
    fn new(key: RankKey) -> Box<Self> {
        Box::new(Self {
            key,
            priority: rand::random(),
            size: 1,
            left: None,
            right: None,
        })
    }

    fn refresh_size(&mut self) {
        self.size = 1 + size(&self.left) + size(&self.right);
    }
}

fn size(link: &Link) -> usize {
    link.as_ref().map_or(0, |node| node.size)
}

/// Split into keys `< key` and keys `>= key`.
fn split(link: Link, key: &RankKey) -> (Link, Link) {
    match link {
        None => (None, None),
        Some(mut node) => {
            if node.key < *key {
                let (lower, upper) = split(node.right.take(), key);
                node.right = lower;
                node.refresh_size();
                (Some(node), upper)
            } else {
                let (lower, upper) = split(node.left.take(), key);
                node.left = upper;
                node.refresh_size();
                (lower, Some(node))
            }
        }
    }
}

/// Merge two treaps where every key in `lower` sorts before every key in `upper`.
fn merge(lower: Link, upper: Link) -> Link {
    match (lower, upper) {
        (None, upper) => upper,
        (lower, None) => lower,
        (Some(mut l), Some(mut u)) => {
            if l.priority > u.priority {
                l.right = merge(l.right.take(), Some(u));
                l.refresh_size();
                Some(l)
            } else {
                u.left = merge(Some(l), u.left.take());
                u.refresh_size();
                Some(u)
            }
        }
    }
}

fn remove_key(link: &mut Link, key: &RankKey) -> bool {
    let ordering = match link.as_ref() {
        None => return false,
        Some(node) => key.cmp(&node.key),
    };

    if ordering == Ordering::Equal {
        if let Some(mut node) = link.take() {
            *link = merge(node.left.take(), node.right.take());
        }
        return true;
    }

    let Some(node) = link.as_mut() else {
        return false;
    };
    let removed = match ordering {
        Ordering::Less => remove_key(&mut node.left, key),
        _ => remove_key(&mut node.right, key),
    };
    if removed {
        node.refresh_size();
    }
    removed
}

/// Player scores kept in rank order.
#[derive(Default)]
pub struct OrderedScores {
    root: Link,
    scores: HashMap<PlayerId, i64>,
}

impl OrderedScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from (player, score) pairs. Later duplicates win.
    pub fn from_entries(entries: impl IntoIterator<Item = (PlayerId, i64)>) -> Self {
        let mut ordered = Self::new();
        for (player_id, score) in entries {
            ordered.upsert(player_id, score);
        }
        ordered
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Insert or move a player. Returns the previous score.
    pub fn upsert(&mut self, player_id: PlayerId, score: i64) -> Option<i64> {
        let previous = self.scores.insert(player_id, score);
        if let Some(old) = previous {
            if old == score {
                return previous;
            }
            remove_key(
                &mut self.root,
                &RankKey {
                    score: old,
                    player_id,
                },
            );
        }

        let key = RankKey { score, player_id };
        let (lower, upper) = split(self.root.take(), &key);
        self.root = merge(merge(lower, Some(Node::new(key))), upper);
        previous
    }

    /// Move a player up to `score`; never moves a player down.
    /// Returns the resulting score.
    pub fn raise(&mut self, player_id: PlayerId, score: i64) -> i64 {
        match self.score_of(player_id) {
            Some(current) if current >= score => current,
            _ => {
                self.upsert(player_id, score);
                score
            }
        }
    }

    pub fn remove(&mut self, player_id: PlayerId) -> Option<i64> {
        let score = self.scores.remove(&player_id)?;
        remove_key(&mut self.root, &RankKey { score, player_id });
        Some(score)
    }

    pub fn score_of(&self, player_id: PlayerId) -> Option<i64> {
        self.scores.get(&player_id).copied()
    }

    /// Number of players ranked ahead of `player_id`.
    pub fn rank_of(&self, player_id: PlayerId) -> Option<usize> {
        let score = self.score_of(player_id)?;
        let key = RankKey { score, player_id };

        let mut ahead = 0;
        let mut cursor = &self.root;
        while let Some(node) = cursor {
            match key.cmp(&node.key) {
                Ordering::Less => cursor = &node.left,
                Ordering::Equal => return Some(ahead + size(&node.left)),
                Ordering::Greater => {
                    ahead += size(&node.left) + 1;
                    cursor = &node.right;
                }
            }
        }
        // Unreachable while `scores` and the tree agree.
        None
    }

    /// The first `k` players in rank order.
    pub fn top(&self, k: usize) -> Vec<(PlayerId, i64)> {
        let mut out = Vec::with_capacity(k.min(self.len()));
        let mut stack: Vec<&Node> = Vec::new();
        let mut cursor = self.root.as_deref();

        while out.len() < k {
            while let Some(node) = cursor {
                stack.push(node);
                cursor = node.left.as_deref();
            }
            let Some(node) = stack.pop() else {
                break;
            };
            out.push((node.key.player_id, node.key.score));
            cursor = node.right.as_deref();
        }
        out
    }
}
