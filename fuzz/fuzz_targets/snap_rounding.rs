#![no_main]

use arbitrary::Unstructured;
use libfuzzer_sys::fuzz_target;

use gridsweeper::{arbitrary::precision, arbitrary::segments, SnapRounder};

fn check(u: &mut Unstructured<'_>) -> Result<(), arbitrary::Error> {
    let segs = segments(1000.0, u)?;
    let mut rounder = SnapRounder::new(precision(u)?);
    rounder.process(&segs).unwrap();
    assert!(rounder.validate());
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let _ = check(&mut u);
});
