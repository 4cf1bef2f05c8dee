#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

use gridsweeper::{
    arbitrary::{precision, segments},
    clip, BinaryOp, ClipConfig, WindingRule,
};

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Op {
    Union,
    Intersection,
    Exclusion,
    AWithoutB,
    BWithoutA,
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Rule {
    EvenOdd,
    NonZero,
    Positive,
    Negative,
}

impl From<Op> for BinaryOp {
    fn from(op: Op) -> Self {
        match op {
            Op::Union => BinaryOp::Union,
            Op::Intersection => BinaryOp::Intersection,
            Op::Exclusion => BinaryOp::Exclusion,
            Op::AWithoutB => BinaryOp::AWithoutB,
            Op::BWithoutA => BinaryOp::BWithoutA,
        }
    }
}

impl From<Rule> for WindingRule {
    fn from(rule: Rule) -> Self {
        match rule {
            Rule::EvenOdd => WindingRule::EvenOdd,
            Rule::NonZero => WindingRule::NonZero,
            Rule::Positive => WindingRule::Positive,
            Rule::Negative => WindingRule::Negative,
        }
    }
}

fn check(u: &mut Unstructured<'_>) -> Result<(), arbitrary::Error> {
    let segs = segments(1000.0, u)?;
    let op: Op = u.arbitrary()?;
    let rules: [Rule; 2] = u.arbitrary()?;
    let config = ClipConfig {
        precision: precision(u)?,
        rules: rules.map(WindingRule::from),
        op: op.into(),
    };
    let mesh = clip(&segs, &config).unwrap();
    mesh.check_invariants().unwrap();
    assert_eq!(mesh.chains().count(), 0);
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let _ = check(&mut u);
});
