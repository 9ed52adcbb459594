//! Venue-specific math and account layouts.

pub mod pumpswap;
