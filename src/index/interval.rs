use crate::core::Span;

/// Static interval tree, built once over a fixed set of intervals.
///
/// Entries are kept sorted by start offset and queried through an implicit
/// balanced tree over that order, with the maximum end offset of every
/// subtree precomputed for pruning.
pub struct IntervalTree<T> {
    entries: Vec<(Span, T)>,
    subtree_max_end: Vec<usize>,
}

impl<T> IntervalTree<T> {
    pub fn new(mut items: Vec<(Span, T)>) -> Self {
        items.sort_by(|a, b| a.0.start.cmp(&b.0.start).then(b.0.end.cmp(&a.0.end)));
        let mut tree = Self {
            subtree_max_end: vec![0; items.len()],
            entries: items,
        };
        if !tree.entries.is_empty() {
            tree.fill_max_end(0, tree.entries.len() - 1);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Span, T)> {
        self.entries.iter()
    }

    /// All intervals containing `pos`, smallest interval first; ties broken
    /// by lower start offset.
    pub fn stab(&self, pos: usize) -> Vec<&(Span, T)> {
        let mut hits = Vec::new();
        if !self.entries.is_empty() {
            self.stab_into(0, self.entries.len() - 1, pos, &mut hits);
        }
        hits.sort_by(|a, b| {
            a.0.len()
                .cmp(&b.0.len())
                .then(a.0.start.cmp(&b.0.start))
        });
        hits
    }

    /// All intervals fully containing `span`, smallest first.
    pub fn containing(&self, span: Span) -> Vec<&(Span, T)> {
        let mut hits = self.stab(span.start);
        hits.retain(|(candidate, _)| candidate.contains(span));
        hits
    }

    fn fill_max_end(&mut self, lo: usize, hi: usize) -> usize {
        let mid = lo + (hi - lo) / 2;
        let mut max_end = self.entries[mid].0.end;
        if mid > lo {
            max_end = max_end.max(self.fill_max_end(lo, mid - 1));
        }
        if mid < hi {
            max_end = max_end.max(self.fill_max_end(mid + 1, hi));
        }
        self.subtree_max_end[mid] = max_end;
        max_end
    }

    fn stab_into<'a>(&'a self, lo: usize, hi: usize, pos: usize, out: &mut Vec<&'a (Span, T)>) {
        let mid = lo + (hi - lo) / 2;
        if self.subtree_max_end[mid] <= pos {
            return;
        }
        if mid > lo {
            self.stab_into(lo, mid - 1, pos, out);
        }
        let entry = &self.entries[mid];
        if entry.0.contains_pos(pos) {
            out.push(entry);
        }
        // right subtree intervals start at or after this one
        if mid < hi && entry.0.start <= pos {
            self.stab_into(mid + 1, hi, pos, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(spans: &[(usize, usize)]) -> IntervalTree<usize> {
        IntervalTree::new(
            spans
                .iter()
                .enumerate()
                .map(|(i, &(s, e))| (Span::new(s, e), i))
                .collect(),
        )
    }

    #[test]
    fn stab_returns_smallest_interval_first() {
        let tree = tree(&[(0, 100), (10, 50), (20, 30)]);
        let hits = tree.stab(25);
        let spans: Vec<Span> = hits.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            spans,
            vec![Span::new(20, 30), Span::new(10, 50), Span::new(0, 100)]
        );
    }

    #[test]
    fn stab_ties_break_on_lower_start() {
        let tree = tree(&[(10, 20), (15, 25)]);
        let hits = tree.stab(16);
        assert_eq!(hits[0].0, Span::new(10, 20));
        assert_eq!(hits[1].0, Span::new(15, 25));
    }

    #[test]
    fn stab_is_end_exclusive() {
        let tree = tree(&[(0, 10)]);
        assert_eq!(tree.stab(0).len(), 1);
        assert_eq!(tree.stab(9).len(), 1);
        assert!(tree.stab(10).is_empty());
    }

    #[test]
    fn containing_requires_full_coverage() {
        let tree = tree(&[(0, 100), (10, 40)]);
        let hits = tree.containing(Span::new(20, 60));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, Span::new(0, 100));
    }

    #[test]
    fn empty_tree_answers_queries() {
        let tree: IntervalTree<usize> = IntervalTree::new(Vec::new());
        assert!(tree.stab(5).is_empty());
        assert!(tree.is_empty());
    }
}
