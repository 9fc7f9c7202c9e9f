//! Splitting the host list into pages and moving between them.

use crate::inventory::Host;

/// Split `hosts` into consecutive pages of `page_size`.
///
/// Every page has exactly `page_size` hosts except possibly the last.
/// A `page_size` of zero is treated as one.
pub fn paginate(hosts: &[Host], page_size: usize) -> Vec<&[Host]> {
    hosts.chunks(page_size.max(1)).collect()
}

/// Page after `index`, wrapping to the first. Returns 0 when there are no pages.
pub fn next(index: usize, page_count: usize) -> usize {
    if page_count == 0 {
        return 0;
    }
    (index + 1) % page_count
}

/// Page before `index`, wrapping to the last. Returns 0 when there are no pages.
pub fn prev(index: usize, page_count: usize) -> usize {
    if page_count == 0 {
        return 0;
    }
    (index % page_count + page_count - 1) % page_count
}

/// Current position in the paginated host list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    page_index: usize,
    page_size: usize,
    total_hosts: usize,
}

impl PageState {
    pub fn new(total_hosts: usize, page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
            total_hosts,
        }
    }

    pub fn index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.total_hosts.div_ceil(self.page_size)
    }

    pub fn next(&mut self) {
        self.page_index = next(self.page_index, self.page_count());
    }

    pub fn prev(&mut self) {
        self.page_index = prev(self.page_index, self.page_count());
    }

    /// Jump to the page containing host number `position`.
    pub fn show_position(&mut self, position: usize) {
        if position < self.total_hosts {
            self.page_index = position / self.page_size;
        }
    }

    /// Range of host indices on the current page.
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = (self.page_index * self.page_size).min(self.total_hosts);
        let end = (start + self.page_size).min(self.total_hosts);
        start..end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ConnectionSpec;
    use proptest::prelude::*;

    fn hosts(n: usize) -> Vec<Host> {
        (0..n)
            .map(|i| Host {
                address: format!("host-{i}"),
                alias: None,
                connection: ConnectionSpec::local(),
            })
            .collect()
    }

    #[test]
    fn test_paginate_uneven() {
        let hosts = hosts(7);
        let pages = paginate(&hosts, 3);
        let sizes: Vec<usize> = pages.iter().map(|p| p.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(pages[2][0].address, "host-6");
    }

    #[test]
    fn test_paginate_empty() {
        assert!(paginate(&[], 5).is_empty());
    }

    #[test]
    fn test_navigation_wraps() {
        assert_eq!(next(2, 3), 0);
        assert_eq!(prev(0, 3), 2);
        assert_eq!(next(0, 1), 0);
        assert_eq!(prev(0, 1), 0);
        assert_eq!(next(0, 0), 0);
        assert_eq!(prev(0, 0), 0);
    }

    #[test]
    fn test_page_state() {
        let mut state = PageState::new(12, 5);
        assert_eq!(state.page_count(), 3);
        assert_eq!(state.range(), 0..5);

        state.prev();
        assert_eq!(state.index(), 2);
        assert_eq!(state.range(), 10..12);

        state.next();
        assert_eq!(state.index(), 0);

        state.show_position(7);
        assert_eq!(state.index(), 1);
        state.show_position(99);
        assert_eq!(state.index(), 1);
    }

    #[test]
    fn test_page_state_empty() {
        let mut state = PageState::new(0, 5);
        assert_eq!(state.page_count(), 0);
        state.next();
        state.prev();
        assert_eq!(state.index(), 0);
        assert_eq!(state.range(), 0..0);
    }

    proptest! {
        #[test]
        fn paginate_preserves_order(n in 0usize..200, k in 1usize..20) {
            let hosts = hosts(n);
            let pages = paginate(&hosts, k);

            prop_assert_eq!(pages.len(), n.div_ceil(k));
            if let Some((last, full)) = pages.split_last() {
                prop_assert!(full.iter().all(|p| p.len() == k));
                prop_assert!(!last.is_empty() && last.len() <= k);
            }
            let flat: Vec<&Host> = pages.iter().flat_map(|p| p.iter()).collect();
            prop_assert_eq!(flat.len(), n);
            prop_assert!(flat.iter().zip(&hosts).all(|(a, b)| *a == b));
        }

        #[test]
        fn next_and_prev_are_inverse(n in 1usize..100, i in 0usize..100) {
            let i = i % n;
            prop_assert_eq!(prev(next(i, n), n), i);
            prop_assert_eq!(next(prev(i, n), n), i);
            prop_assert!(next(i, n) < n);
            prop_assert!(prev(i, n) < n);
        }

        #[test]
        fn n_steps_return_to_start(n in 1usize..50, i in 0usize..50) {
            let start = i % n;
            let mut index = start;
            for _ in 0..n {
                index = next(index, n);
            }
            prop_assert_eq!(index, start);
        }
    }
}
