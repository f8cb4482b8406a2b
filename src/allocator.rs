//! The global memory allocator.

use core::ptr;

use talc::{ClaimOnOom, Span, Talc, Talck};

// Size (in bytes) of global memory allocator arena. Generous enough for the hold buffer, the log
// backlog, and one kernel ring dump; the daemon must never need to grow at runtime since all of
// its memory is locked.
const ARENA_SIZE: usize = 1 << 22; // 4 MiB

// Talc global memory allocator
static mut ARENA: [u8; ARENA_SIZE] = [0; ARENA_SIZE];

#[global_allocator]
static ALLOCATOR: Talck<spin::Mutex<()>, ClaimOnOom> =
    Talc::new(unsafe { ClaimOnOom::new(Span::from_array(ptr::addr_of!(ARENA).cast_mut())) }).lock();
