use crate::error::{PagerError, Result};
use std::ops::Index;

/// A single physical page of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRef {
    pub index: usize,
}

/// One logical reading position. In double page mode two physical pages are
/// shown side by side and `secondary` holds the higher numbered one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    pub primary: PageRef,
    pub secondary: Option<PageRef>,
}

impl PageEntry {
    pub fn single(index: usize) -> Self {
        Self {
            primary: PageRef { index },
            secondary: None,
        }
    }

    pub fn spread(primary: usize, secondary: usize) -> Self {
        Self {
            primary: PageRef { index: primary },
            secondary: Some(PageRef { index: secondary }),
        }
    }

    pub fn contains(&self, page_index: usize) -> bool {
        self.primary.index == page_index
            || self.secondary.is_some_and(|page| page.index == page_index)
    }

    /// Label used by the reader, e.g. "3" or "3-4" (1-based).
    pub fn label(&self) -> String {
        match self.secondary {
            Some(secondary) => format!("{}-{}", self.primary.index + 1, secondary.index + 1),
            None => format!("{}", self.primary.index + 1),
        }
    }
}

/// The index a navigation request should target for `page`.
///
/// For spreads the secondary page has to be used, otherwise the reader could
/// not tell that the last page of the chapter is already visible.
pub fn get_next_index_from_page(page: &PageEntry) -> usize {
    page.secondary.map_or(page.primary.index, |secondary| secondary.index)
}

/// How pages get paired in double page mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpreadLayout {
    /// Keep the first page (usually the cover) on its own.
    pub cover_alone: bool,
}

/// Ordered, non-empty list of page entries for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSequence {
    entries: Vec<PageEntry>,
}

impl PageSequence {
    pub fn new(entries: Vec<PageEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(PagerError::EmptySequence);
        }

        let mut last_physical: Option<usize> = None;
        for (position, entry) in entries.iter().enumerate() {
            if last_physical.is_some_and(|last| entry.primary.index <= last) {
                return Err(PagerError::UnorderedPages { position });
            }
            if entry
                .secondary
                .is_some_and(|secondary| secondary.index <= entry.primary.index)
            {
                return Err(PagerError::UnorderedPages { position });
            }
            last_physical = Some(get_next_index_from_page(entry));
        }

        Ok(Self { entries })
    }

    /// One entry per physical page.
    pub fn single(page_count: usize) -> Result<Self> {
        Self::new((0..page_count).map(PageEntry::single).collect())
    }

    /// Pairs pages two by two. A trailing odd page stays alone.
    pub fn spreads(page_count: usize, layout: SpreadLayout) -> Result<Self> {
        let mut entries = Vec::with_capacity(page_count.div_ceil(2) + 1);
        let mut index = 0;

        if layout.cover_alone && page_count > 0 {
            entries.push(PageEntry::single(0));
            index = 1;
        }

        while index < page_count {
            if index + 1 < page_count {
                entries.push(PageEntry::spread(index, index + 1));
                index += 2;
            } else {
                entries.push(PageEntry::single(index));
                index += 1;
            }
        }

        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false, a sequence cannot be constructed empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, pages_index: usize) -> Option<&PageEntry> {
        self.entries.get(pages_index)
    }

    pub fn first(&self) -> &PageEntry {
        &self.entries[0]
    }

    pub fn last(&self) -> &PageEntry {
        &self.entries[self.entries.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageEntry> {
        self.entries.iter()
    }

    /// Number of physical pages covered by the sequence.
    pub fn physical_page_count(&self) -> usize {
        get_next_index_from_page(self.last()) + 1
    }

    /// Locates the entry showing the physical page `page_index`.
    pub fn current_page(&self, page_index: usize) -> Option<CurrentPage> {
        self.entries
            .iter()
            .position(|entry| entry.contains(page_index))
            .map(|pages_index| CurrentPage {
                entry: self.entries[pages_index],
                pages_index,
            })
    }
}

impl Index<usize> for PageSequence {
    type Output = PageEntry;

    fn index(&self, pages_index: usize) -> &PageEntry {
        &self.entries[pages_index]
    }
}

impl<'a> IntoIterator for &'a PageSequence {
    type Item = &'a PageEntry;
    type IntoIter = std::slice::Iter<'a, PageEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// The entry at the reader's position together with where it sits in the
/// sequence. Derived from the current physical page, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentPage {
    pub entry: PageEntry,
    pub pages_index: usize,
}

impl CurrentPage {
    pub fn navigable_index(&self) -> usize {
        get_next_index_from_page(&self.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread_scenario() -> PageSequence {
        PageSequence::new(vec![
            PageEntry::single(0),
            PageEntry::spread(1, 2),
            PageEntry::single(3),
        ])
        .unwrap()
    }

    #[test]
    fn test_next_index_prefers_secondary() {
        let pages = spread_scenario();
        assert_eq!(get_next_index_from_page(&pages[0]), 0);
        assert_eq!(get_next_index_from_page(&pages[1]), 2);
        assert_eq!(get_next_index_from_page(&pages[2]), 3);
    }

    #[test]
    fn test_rejects_empty_sequence() {
        assert_eq!(PageSequence::new(Vec::new()), Err(PagerError::EmptySequence));
        assert_eq!(PageSequence::single(0), Err(PagerError::EmptySequence));
    }

    #[test]
    fn test_rejects_unordered_entries() {
        let result = PageSequence::new(vec![PageEntry::single(2), PageEntry::single(1)]);
        assert_eq!(result, Err(PagerError::UnorderedPages { position: 1 }));

        let result = PageSequence::new(vec![PageEntry::spread(0, 2), PageEntry::single(1)]);
        assert_eq!(result, Err(PagerError::UnorderedPages { position: 1 }));

        let result = PageSequence::new(vec![PageEntry::spread(3, 3)]);
        assert_eq!(result, Err(PagerError::UnorderedPages { position: 0 }));
    }

    #[test]
    fn test_spreads_with_cover_alone() {
        let pages = PageSequence::spreads(6, SpreadLayout { cover_alone: true }).unwrap();
        let labels: Vec<String> = pages.iter().map(PageEntry::label).collect();
        assert_eq!(labels, vec!["1", "2-3", "4-5", "6"]);
        assert_eq!(pages.physical_page_count(), 6);
    }

    #[test]
    fn test_spreads_without_cover() {
        let pages = PageSequence::spreads(5, SpreadLayout::default()).unwrap();
        let labels: Vec<String> = pages.iter().map(PageEntry::label).collect();
        assert_eq!(labels, vec!["1-2", "3-4", "5"]);
    }

    #[test]
    fn test_current_page_finds_secondary() {
        let pages = spread_scenario();

        let current = pages.current_page(2).unwrap();
        assert_eq!(current.pages_index, 1);
        assert_eq!(current.entry, PageEntry::spread(1, 2));
        assert_eq!(current.navigable_index(), 2);

        let current = pages.current_page(1).unwrap();
        assert_eq!(current.pages_index, 1);

        assert!(pages.current_page(4).is_none());
    }
}
