//! # custos-core
//!
//! The trust boundary of the CUSTOS audit pipeline.
//!
//! This crate provides:
//! - The five seam traits (`TimeSource`, `RecordSigner`, `SignatureVerifier`,
//!   `RecordCipher`, `AuditStore`) through which keys, time, and storage reach
//!   the core
//! - Two clocks: `SystemClock` for production and `FixedClock` for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use custos_core::{clock::SystemClock, traits::TimeSource};
//!
//! let record = build_record(fields, SystemClock.now());
//! ```

pub mod clock;
pub mod traits;

pub use clock::{FixedClock, SystemClock};

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::traits::TimeSource;
    use super::FixedClock;

    #[test]
    fn fixed_clock_only_moves_when_told() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn clocks_are_usable_as_trait_objects() {
        let clock: Box<dyn TimeSource> = Box::new(super::SystemClock);
        let before = Utc::now();
        let now = clock.now();
        assert!(now >= before);
    }
}
