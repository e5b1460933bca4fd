use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::mem;

use crate::OrderedMap;
use crate::error::InvariantViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

impl Color {
    fn flip(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

/// Ordered map backed by a left-leaning red-black tree.
pub struct LlrbMap<K: Ord, V> {
    root: Link<K, V>,
    len: usize,
}

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    // color of the link from the parent
    color: Color,
    left: Link<K, V>,
    right: Link<K, V>,
}

impl<K, V> Node<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            color: Color::Red,
            left: None,
            right: None,
        }
    }

    fn matches<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        key.cmp(self.key.borrow()) == Ordering::Equal
    }
}

// Missing children count as black.
fn is_red<K, V>(link: &Link<K, V>) -> bool {
    link.as_ref().is_some_and(|n| n.color == Color::Red)
}

fn is_left_red<K, V>(link: &Link<K, V>) -> bool {
    link.as_ref().is_some_and(|n| is_red(&n.left))
}

fn rotate_left<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut x) = h.right.take() else {
        return h;
    };
    h.right = x.left.take();
    x.color = h.color;
    h.color = Color::Red;
    x.left = Some(h);
    x
}

fn rotate_right<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    let Some(mut x) = h.left.take() else {
        return h;
    };
    h.left = x.right.take();
    x.color = h.color;
    h.color = Color::Red;
    x.right = Some(h);
    x
}

fn flip_colors<K, V>(h: &mut Node<K, V>) {
    h.color = h.color.flip();
    if let Some(left) = h.left.as_deref_mut() {
        left.color = left.color.flip();
    }
    if let Some(right) = h.right.as_deref_mut() {
        right.color = right.color.flip();
    }
}

fn move_red_left<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    flip_colors(&mut h);
    if is_left_red(&h.right) {
        h.right = h.right.take().map(rotate_right);
        h = rotate_left(h);
        flip_colors(&mut h);
    }
    h
}

fn move_red_right<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    flip_colors(&mut h);
    if is_left_red(&h.left) {
        h = rotate_right(h);
        flip_colors(&mut h);
    }
    h
}

fn balance<K, V>(mut h: Box<Node<K, V>>) -> Box<Node<K, V>> {
    if is_red(&h.right) {
        h = rotate_left(h);
    }
    if is_red(&h.left) && is_left_red(&h.left) {
        h = rotate_right(h);
    }
    if is_red(&h.left) && is_red(&h.right) {
        flip_colors(&mut h);
    }
    h
}

fn min<K, V>(mut node: &Node<K, V>) -> &Node<K, V> {
    while let Some(left) = node.left.as_deref() {
        node = left;
    }
    node
}

fn max<K, V>(mut node: &Node<K, V>) -> &Node<K, V> {
    while let Some(right) = node.right.as_deref() {
        node = right;
    }
    node
}

fn put_node<K: Ord, V>(link: Link<K, V>, key: K, value: V) -> (Box<Node<K, V>>, Option<V>) {
    let Some(mut h) = link else {
        return (Box::new(Node::new(key, value)), None);
    };

    let old = match key.cmp(&h.key) {
        Ordering::Less => {
            let (left, old) = put_node(h.left.take(), key, value);
            h.left = Some(left);
            old
        }
        Ordering::Greater => {
            let (right, old) = put_node(h.right.take(), key, value);
            h.right = Some(right);
            old
        }
        Ordering::Equal => Some(mem::replace(&mut h.value, value)),
    };

    if is_red(&h.right) && !is_red(&h.left) {
        h = rotate_left(h);
    }
    if is_red(&h.left) && is_left_red(&h.left) {
        h = rotate_right(h);
    }
    if is_red(&h.left) && is_red(&h.right) {
        flip_colors(&mut h);
    }

    (h, old)
}

// returns the rest of the subtree and the detached minimum node
fn delete_min<K, V>(mut h: Box<Node<K, V>>) -> (Link<K, V>, Box<Node<K, V>>) {
    if h.left.is_none() {
        return (h.right.take(), h);
    }
    if !is_red(&h.left) && !is_left_red(&h.left) {
        h = move_red_left(h);
    }
    match h.left.take() {
        Some(left) => {
            let (left, min) = delete_min(left);
            h.left = left;
            (Some(balance(h)), min)
        }
        None => (h.right.take(), h),
    }
}

fn delete_node<K, V, Q>(mut h: Box<Node<K, V>>, key: &Q) -> (Link<K, V>, Option<V>)
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let removed = if key.cmp(h.key.borrow()) == Ordering::Less {
        if !is_red(&h.left) && !is_left_red(&h.left) {
            h = move_red_left(h);
        }
        match h.left.take() {
            Some(left) => {
                let (left, removed) = delete_node(left, key);
                h.left = left;
                removed
            }
            None => None,
        }
    } else {
        if is_red(&h.left) {
            h = rotate_right(h);
        }
        if h.matches(key) && h.right.is_none() {
            let Node { left, value, .. } = *h;
            return (left, Some(value));
        }
        if !is_red(&h.right) && !is_left_red(&h.right) {
            h = move_red_right(h);
        }
        let Some(right) = h.right.take() else {
            return (Some(balance(h)), None);
        };
        if h.matches(key) {
            let (right, successor) = delete_min(right);
            h.right = right;
            let Node {
                key: next_key,
                value: next_value,
                ..
            } = *successor;
            h.key = next_key;
            Some(mem::replace(&mut h.value, next_value))
        } else {
            let (right, removed) = delete_node(right, key);
            h.right = right;
            removed
        }
    };

    (Some(balance(h)), removed)
}

fn height<K, V>(link: &Link<K, V>) -> isize {
    match link.as_deref() {
        None => -1,
        Some(node) => 1 + height(&node.left).max(height(&node.right)),
    }
}

fn in_order<'a, K, V>(link: &'a Link<K, V>, visit: &mut impl FnMut(&'a Node<K, V>)) {
    if let Some(node) = link.as_deref() {
        in_order(&node.left, visit);
        visit(node);
        in_order(&node.right, visit);
    }
}

fn count<K, V>(link: &Link<K, V>) -> usize {
    link.as_deref()
        .map_or(0, |node| 1 + count(&node.left) + count(&node.right))
}

fn is_bst<K: Ord, V>(link: &Link<K, V>, min: Option<&K>, max: Option<&K>) -> bool {
    let Some(node) = link.as_deref() else {
        return true;
    };
    if min.is_some_and(|min| node.key <= *min) {
        return false;
    }
    if max.is_some_and(|max| node.key >= *max) {
        return false;
    }
    is_bst(&node.left, min, Some(&node.key)) && is_bst(&node.right, Some(&node.key), max)
}

// does every path from `link` to a missing child cross exactly `black` black links?
fn is_balanced<K, V>(link: &Link<K, V>, mut black: usize) -> bool {
    let Some(node) = link.as_deref() else {
        return black == 0;
    };
    if node.color == Color::Black {
        if black == 0 {
            return false;
        }
        black -= 1;
    }
    is_balanced(&node.left, black) && is_balanced(&node.right, black)
}

fn check_23<K, V>(link: &Link<K, V>, parent_red: bool) -> Result<(), InvariantViolation> {
    let Some(node) = link.as_deref() else {
        return Ok(());
    };
    if is_red(&node.right) {
        return Err(InvariantViolation::RightLeaningRed);
    }
    let red = node.color == Color::Red;
    if parent_red && red {
        return Err(InvariantViolation::ConsecutiveReds);
    }
    check_23(&node.left, red)?;
    check_23(&node.right, red)
}

impl<K: Ord, V> LlrbMap<K, V> {
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    pub fn size(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Longest root-to-leaf path counted in links; `-1` for an empty map.
    pub fn height(&self) -> isize {
        height(&self.root)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            match key.cmp(node.key.borrow()) {
                Ordering::Less => cur = node.left.as_deref(),
                Ordering::Greater => cur = node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            }
        }
        None
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = self.root.as_deref_mut();
        while let Some(node) = cur {
            match key.cmp(node.key.borrow()) {
                Ordering::Less => cur = node.left.as_deref_mut(),
                Ordering::Greater => cur = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.value),
            }
        }
        None
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    pub fn min(&self) -> Option<(&K, &V)> {
        self.root
            .as_deref()
            .map(min)
            .map(|node| (&node.key, &node.value))
    }

    pub fn max(&self) -> Option<(&K, &V)> {
        self.root
            .as_deref()
            .map(max)
            .map(|node| (&node.key, &node.value))
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        let (mut root, old) = put_node(self.root.take(), key, value);
        root.color = Color::Black;
        self.root = Some(root);
        if old.is_none() {
            self.len += 1;
        }
        tracing::trace!(size = self.len, overwritten = old.is_some(), "put");
        old
    }

    /// Removes `key`, returning its value. Absent keys leave the tree untouched.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if !self.contains(key) {
            tracing::trace!(size = self.len, "delete: key absent");
            return None;
        }
        let mut root = self.root.take()?;

        // delete always removes from a red subtree, so lend the root one
        if !is_red(&root.left) && !is_red(&root.right) {
            root.color = Color::Red;
        }

        let (root, removed) = delete_node(root, key);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        if let Some(root) = self.root.as_deref_mut() {
            root.color = Color::Black;
        }
        tracing::trace!(size = self.len, "delete");
        removed
    }

    pub fn delete_min(&mut self) -> Option<(K, V)> {
        let mut root = self.root.take()?;
        if !is_red(&root.left) && !is_red(&root.right) {
            root.color = Color::Red;
        }

        let (root, min) = delete_min(root);
        self.root = root;
        self.len -= 1;
        if let Some(root) = self.root.as_deref_mut() {
            root.color = Color::Black;
        }
        let Node { key, value, .. } = *min;
        Some((key, value))
    }

    pub fn clear(&mut self) {
        tracing::debug!(dropped = self.len, "clear");
        self.root = None;
        self.len = 0;
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.len);
        in_order(&self.root, &mut |node| keys.push(&node.key));
        keys
    }

    /// Values in ascending key order.
    pub fn values(&self) -> Vec<&V> {
        let mut values = Vec::with_capacity(self.len);
        in_order(&self.root, &mut |node| values.push(&node.value));
        values
    }

    pub fn is_bst(&self) -> bool {
        is_bst(&self.root, None, None)
    }

    /// Checks that every root-to-leaf path has as many black links as the
    /// leftmost one.
    pub fn is_balanced(&self) -> bool {
        let mut black = 0;
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            if node.color == Color::Black {
                black += 1;
            }
            cur = node.left.as_deref();
        }
        is_balanced(&self.root, black)
    }

    /// Verifies every structural invariant of the tree.
    ///
    /// Intended for tests; a violation is a bug in this module.
    pub fn check(&self) -> Result<(), InvariantViolation> {
        let result = self.validate();
        if let Err(err) = &result {
            tracing::warn!(%err, size = self.len, "llrb invariant check failed");
        }
        result
    }

    fn validate(&self) -> Result<(), InvariantViolation> {
        if !self.is_bst() {
            return Err(InvariantViolation::NotSymmetricOrder);
        }
        if !self.is_balanced() {
            return Err(InvariantViolation::Unbalanced);
        }
        check_23(&self.root, false)?;
        if is_red(&self.root) {
            return Err(InvariantViolation::RedRoot);
        }
        let counted = count(&self.root);
        if counted != self.len {
            return Err(InvariantViolation::SizeMismatch {
                stored: self.len,
                counted,
            });
        }
        Ok(())
    }
}

impl<K: Ord, V> Default for LlrbMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> Extend<(K, V)> for LlrbMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for LlrbMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for LlrbMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        in_order(&self.root, &mut |node| {
            map.entry(&node.key, &node.value);
        });
        map.finish()
    }
}

impl<K: Ord, V> OrderedMap for LlrbMap<K, V> {
    type Key = K;
    type Value = V;

    fn new() -> Self {
        LlrbMap::new()
    }

    fn size(&self) -> usize {
        LlrbMap::size(self)
    }

    fn get(&self, key: &Self::Key) -> Option<&Self::Value> {
        LlrbMap::get(self, key)
    }

    fn contains(&self, key: &Self::Key) -> bool {
        LlrbMap::contains(self, key)
    }

    fn put(&mut self, key: Self::Key, value: Self::Value) -> Option<Self::Value> {
        LlrbMap::put(self, key, value)
    }

    fn delete(&mut self, key: &Self::Key) -> Option<Self::Value> {
        LlrbMap::delete(self, key)
    }

    fn clear(&mut self) {
        LlrbMap::clear(self);
    }
}
