//! Page alignment arithmetic.

use super::layout::page::{SHIFT, SIZE};

/// Address of the page containing `addr`.
pub const fn page_align(addr: u64) -> u64 {
    addr & !(SIZE - 1)
}

/// Offset of `addr` from the start of its page.
pub const fn byte_offset(addr: u64) -> u64 {
    addr & (SIZE - 1)
}

/// Number of pages touched by `size` bytes starting at `addr`.
pub const fn span_pages(addr: u64, size: usize) -> u64 {
    (byte_offset(addr) + size as u64 + (SIZE - 1)) >> SHIFT
}

/// Iterate the page addresses touched by `size` bytes starting at `addr`.
pub fn pages_spanned(addr: u64, size: usize) -> impl Iterator<Item = u64> {
    let first = page_align(addr);
    (0..span_pages(addr, size)).map(move |i| first.wrapping_add(i * SIZE))
}
