// SPDX-FileCopyrightText: 2025 - 2026 Eli Array Minkoff
//
// SPDX-License-Identifier: 0BSD

use itertools::Itertools;
use std::collections::HashMap;
use std::fmt;

use crate::InterpreterError;

const PAGE_SIZE: usize = 512;
const PAGE_MASK: i64 = 0x1ff;

macro_rules! page_index {
    ($i: expr) => {{
        #[allow(clippy::cast_sign_loss, reason = "masked down anyway")]
        {
            ($i & PAGE_MASK) as usize
        }
    }};
}

static EMPTY: [i64; PAGE_SIZE] = [0; PAGE_SIZE];

/// Sparse intcode memory.
///
/// Addresses are grouped into pages of 512 ints, stored in a hashmap keyed by the address of the
/// page's first int. A page is only allocated once something inside of it is written, and any
/// address that was never written reads as `0`.
pub(crate) struct Memory {
    pages: HashMap<i64, Box<[i64; PAGE_SIZE]>>,
}

impl Memory {
    fn page(&self, addr: i64) -> Option<&[i64; PAGE_SIZE]> {
        self.pages.get(&(addr & !PAGE_MASK)).map(AsRef::as_ref)
    }

    fn nonempty_pages(&self) -> impl Iterator<Item = (&i64, &[i64; PAGE_SIZE])> {
        self.pages
            .iter()
            .map(|(k, v)| (k, v.as_ref()))
            .filter(|&(_, v)| v != &EMPTY)
    }

    /// Read the int at `addr`
    pub(crate) fn read(&self, addr: i64) -> Result<i64, InterpreterError> {
        if addr < 0 {
            return Err(InterpreterError::AddressFault(addr));
        }
        Ok(self.page(addr).map_or(0, |p| p[page_index!(addr)]))
    }

    /// Write `value` to `addr`, allocating a page if needed
    pub(crate) fn write(&mut self, addr: i64, value: i64) -> Result<(), InterpreterError> {
        if addr < 0 {
            return Err(InterpreterError::AddressFault(addr));
        }
        *self.slot(addr) = value;
        Ok(())
    }

    /// Mutable access to `addr`. Caller must have checked that it's non-negative.
    pub(crate) fn slot(&mut self, addr: i64) -> &mut i64 {
        debug_assert!(addr >= 0);
        &mut self
            .pages
            .entry(addr & !PAGE_MASK)
            .or_insert_with(|| Box::new([0; PAGE_SIZE]))[page_index!(addr)]
    }

    /// remove all pages that are filled with zeroes, and shrink the allocation of the page map
    pub(crate) fn prune(&mut self) {
        self.pages.retain(|_, p| p[..] != EMPTY);
        self.pages.shrink_to_fit();
    }

    /// Number of allocated pages
    #[cfg(test)]
    fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl std::ops::Index<i64> for Memory {
    type Output = i64;
    fn index(&self, i: i64) -> &i64 {
        assert!(i >= 0, "intcode address {i} is negative");
        self.page(i).map_or(&0, |p| &p[page_index!(i)])
    }
}

impl std::ops::IndexMut<i64> for Memory {
    fn index_mut(&mut self, i: i64) -> &mut i64 {
        assert!(i >= 0, "intcode address {i} is negative");
        self.slot(i)
    }
}

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        let mut ours = self.nonempty_pages().collect_vec();
        let mut theirs = other.nonempty_pages().collect_vec();
        ours.sort_unstable_by_key(|&(&k, _)| k);
        theirs.sort_unstable_by_key(|&(&k, _)| k);
        ours == theirs
    }
}

impl FromIterator<i64> for Memory {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut pages = HashMap::with_capacity(iter.size_hint().0.div_ceil(PAGE_SIZE));

        for (page_num, chunk) in (&iter.chunks(PAGE_SIZE)).into_iter().enumerate() {
            let mut page = Box::new([0; PAGE_SIZE]);
            page.iter_mut().zip(chunk).for_each(|(slot, val)| *slot = val);
            #[allow(clippy::cast_possible_wrap, reason = "programs never get that large")]
            pages.insert((page_num * PAGE_SIZE) as i64, page);
        }

        Self { pages }
    }
}

impl Clone for Memory {
    fn clone(&self) -> Self {
        // don't copy blank pages
        let pages = self
            .nonempty_pages()
            .map(|(&base, page)| (base, Box::new(*page)))
            .collect();
        Self { pages }
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = fmt.debug_map();
        for (base, page) in self.nonempty_pages().sorted_unstable_by_key(|&(&k, _)| k) {
            map.entry(&format_args!("{{ page 0x{base:04x} }}"), &format_args!("{page:?}"));
        }
        map.finish()
    }
}
