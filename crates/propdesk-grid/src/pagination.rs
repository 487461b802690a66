//! Page slicing for list views
//!
//! The page size comes from a policy: a fixed count, a count derived from
//! the display density, or everything on one page. The current page is
//! always clamped into `[1, total_pages]`, so navigating past the end (for
//! example after a filter shrinks the set) lands on the last page.

use serde::{Deserialize, Serialize};

/// Rows per page at ultra-compact density
pub const DEFAULT_PAGE_SIZE_ULTRA: usize = 25;
/// Rows per page at compact density
pub const DEFAULT_PAGE_SIZE_COMPACT: usize = 20;
/// Rows per page at normal density
pub const DEFAULT_PAGE_SIZE_NORMAL: usize = 15;
/// Rows per page at comfortable density
pub const DEFAULT_PAGE_SIZE_COMFORTABLE: usize = 12;

/// Display density preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    Ultra,
    Compact,
    #[default]
    Normal,
    Comfortable,
}

impl Density {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ultra => "ultra",
            Self::Compact => "compact",
            Self::Normal => "normal",
            Self::Comfortable => "comfortable",
        }
    }

    pub fn all() -> &'static [Density] {
        &[Self::Ultra, Self::Compact, Self::Normal, Self::Comfortable]
    }

    /// Parse a stored preference or CLI argument
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|d| d.label().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for Density {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Page size for each density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityPageSizes {
    pub ultra: usize,
    pub compact: usize,
    pub normal: usize,
    pub comfortable: usize,
}

impl Default for DensityPageSizes {
    fn default() -> Self {
        Self {
            ultra: DEFAULT_PAGE_SIZE_ULTRA,
            compact: DEFAULT_PAGE_SIZE_COMPACT,
            normal: DEFAULT_PAGE_SIZE_NORMAL,
            comfortable: DEFAULT_PAGE_SIZE_COMFORTABLE,
        }
    }
}

impl DensityPageSizes {
    pub fn page_size(&self, density: Density) -> usize {
        let size = match density {
            Density::Ultra => self.ultra,
            Density::Compact => self.compact,
            Density::Normal => self.normal,
            Density::Comfortable => self.comfortable,
        };
        size.max(1)
    }
}

/// How many items a page holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "value", rename_all = "snake_case")]
pub enum PageSizePolicy {
    Fixed(usize),
    Auto(Density),
    All,
}

impl Default for PageSizePolicy {
    fn default() -> Self {
        Self::Auto(Density::default())
    }
}

/// Current page plus the sizing policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    /// 1-based
    pub current_page: usize,
    pub policy: PageSizePolicy,
    #[serde(default)]
    pub density_sizes: DensityPageSizes,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(PageSizePolicy::default())
    }
}

impl PaginationState {
    pub fn new(policy: PageSizePolicy) -> Self {
        Self {
            current_page: 1,
            policy,
            density_sizes: DensityPageSizes::default(),
        }
    }

    pub fn fixed(page_size: usize) -> Self {
        Self::new(PageSizePolicy::Fixed(page_size))
    }

    pub fn with_density_sizes(mut self, sizes: DensityPageSizes) -> Self {
        self.density_sizes = sizes;
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.current_page = page;
        self
    }

    /// Items per page for a set of `total` items, never zero
    pub fn page_size(&self, total: usize) -> usize {
        match self.policy {
            PageSizePolicy::Fixed(n) => n.max(1),
            PageSizePolicy::Auto(density) => self.density_sizes.page_size(density),
            PageSizePolicy::All => total.max(1),
        }
    }

    /// `ceil(total / page_size)`, at least 1
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size(total)).max(1)
    }

    /// Current page clamped into range for `total` items
    pub fn effective_page(&self, total: usize) -> usize {
        self.current_page.clamp(1, self.total_pages(total))
    }

    /// Store the clamped page
    pub fn clamp(&mut self, total: usize) {
        self.current_page = self.effective_page(total);
    }

    /// Change the sizing policy and go back to the first page
    pub fn set_policy(&mut self, policy: PageSizePolicy) {
        self.policy = policy;
        self.current_page = 1;
    }

    pub fn next(&mut self, total: usize) {
        self.current_page = (self.effective_page(total) + 1).min(self.total_pages(total));
    }

    pub fn prev(&mut self) {
        self.current_page = self.current_page.saturating_sub(1).max(1);
    }

    pub fn first(&mut self) {
        self.current_page = 1;
    }

    pub fn last(&mut self, total: usize) {
        self.current_page = self.total_pages(total);
    }

    pub fn go_to(&mut self, page: usize, total: usize) {
        self.current_page = page.clamp(1, self.total_pages(total));
    }
}

/// One page of a result set
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    /// 1-based index of the first item, 0 when the set is empty
    pub from: usize,
    /// 1-based index of the last item, 0 when the set is empty
    pub to: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn is_first(&self) -> bool {
        self.current_page == 1
    }

    pub fn is_last(&self) -> bool {
        self.current_page == self.total_pages
    }

    /// Status line text, e.g. "21-40 of 47"
    pub fn range_label(&self) -> String {
        format!("{}-{} of {}", self.from, self.to, self.total)
    }
}

/// Slice out the current page
pub fn paginate<T: Clone>(items: &[T], state: &PaginationState) -> Page<T> {
    let total = items.len();
    let page_size = state.page_size(total);
    let total_pages = state.total_pages(total);
    let current_page = state.effective_page(total);

    let start = ((current_page - 1) * page_size).min(total);
    let end = (start + page_size).min(total);

    let (from, to) = if total == 0 { (0, 0) } else { (start + 1, end) };

    Page {
        items: items[start..end].to_vec(),
        current_page,
        total_pages,
        from,
        to,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn numbers(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    #[test]
    fn test_forty_seven_items_by_twenty() {
        let items = numbers(47);
        let mut state = PaginationState::fixed(20);

        let sizes: Vec<usize> = (1..=3)
            .map(|page| {
                state.go_to(page, items.len());
                paginate(&items, &state).items.len()
            })
            .collect();
        assert_eq!(sizes, vec![20, 20, 7]);

        state.go_to(2, items.len());
        let page = paginate(&items, &state);
        assert_eq!((page.from, page.to, page.total), (21, 40, 47));
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.range_label(), "21-40 of 47");
    }

    #[test]
    fn test_empty_set() {
        let items: Vec<usize> = vec![];
        let page = paginate(&items, &PaginationState::fixed(20).with_page(4));
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
        assert_eq!((page.from, page.to, page.total), (0, 0, 0));
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_out_of_range_clamps_to_last() {
        let items = numbers(47);
        let page = paginate(&items, &PaginationState::fixed(20).with_page(9));
        assert_eq!(page.current_page, 3);
        assert_eq!(page.items, (41..=47).collect::<Vec<_>>());

        let page = paginate(&items, &PaginationState::fixed(20).with_page(0));
        assert_eq!(page.current_page, 1);
    }

    #[test]
    fn test_auto_density_sizes() {
        let items = numbers(100);
        for (density, expected) in [
            (Density::Ultra, 25),
            (Density::Compact, 20),
            (Density::Normal, 15),
            (Density::Comfortable, 12),
        ] {
            let state = PaginationState::new(PageSizePolicy::Auto(density));
            assert_eq!(paginate(&items, &state).items.len(), expected);
        }
    }

    #[test]
    fn test_density_sizes_overridable() {
        let sizes = DensityPageSizes {
            normal: 50,
            ..DensityPageSizes::default()
        };
        let state = PaginationState::default().with_density_sizes(sizes);
        assert_eq!(state.page_size(120), 50);
    }

    #[test]
    fn test_all_policy_single_page() {
        let items = numbers(33);
        let page = paginate(&items, &PaginationState::new(PageSizePolicy::All));
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.items.len(), 33);
        assert_eq!((page.from, page.to), (1, 33));
    }

    #[test]
    fn test_navigation_helpers() {
        let total = 47;
        let mut state = PaginationState::fixed(20);
        state.next(total);
        assert_eq!(state.current_page, 2);
        state.next(total);
        state.next(total);
        assert_eq!(state.current_page, 3);
        state.prev();
        assert_eq!(state.current_page, 2);
        state.first();
        state.prev();
        assert_eq!(state.current_page, 1);
        state.last(total);
        assert_eq!(state.current_page, 3);
        state.go_to(17, total);
        assert_eq!(state.current_page, 3);
    }

    #[test]
    fn test_clamp_after_shrink() {
        let mut state = PaginationState::fixed(10).with_page(5);
        state.clamp(23);
        assert_eq!(state.current_page, 3);
    }

    #[test]
    fn test_set_policy_resets_page() {
        let mut state = PaginationState::fixed(10).with_page(4);
        state.set_policy(PageSizePolicy::Auto(Density::Compact));
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn test_density_parse() {
        assert_eq!(Density::parse("Compact"), Some(Density::Compact));
        assert_eq!(Density::parse("dense"), None);
    }
}
