//! Iteration budget for repair calls.

/// Map source length to a bounded repair-attempt budget. Larger inputs get
/// proportionally more iterations, capped at 30 to bound service load.
pub fn repair_budget(code: &str) -> u32 {
    // Counts newline-separated segments, so "a\n" is two lines like the
    // service expects.
    let lines = code.split('\n').count() as u32;
    if lines <= 10 {
        5
    } else if lines <= 30 {
        9
    } else if lines <= 50 {
        15
    } else {
        (15 + (lines - 50) / 25).min(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_with_lines(n: usize) -> String {
        vec!["x = 1"; n].join("\n")
    }

    #[test]
    fn step_boundaries() {
        assert_eq!(repair_budget(&code_with_lines(1)), 5);
        assert_eq!(repair_budget(&code_with_lines(10)), 5);
        assert_eq!(repair_budget(&code_with_lines(11)), 9);
        assert_eq!(repair_budget(&code_with_lines(30)), 9);
        assert_eq!(repair_budget(&code_with_lines(31)), 15);
        assert_eq!(repair_budget(&code_with_lines(50)), 15);
        assert_eq!(repair_budget(&code_with_lines(75)), 16);
        assert_eq!(repair_budget(&code_with_lines(425)), 30);
    }

    #[test]
    fn capped_at_thirty() {
        assert_eq!(repair_budget(&code_with_lines(10_000)), 30);
    }

    #[test]
    fn monotone_and_bounded() {
        let mut prev = 0;
        for n in 1..=600 {
            let b = repair_budget(&code_with_lines(n));
            assert!((5..=30).contains(&b), "budget {} out of range at {} lines", b, n);
            assert!(b >= prev, "budget decreased at {} lines", n);
            prev = b;
        }
    }

    #[test]
    fn trailing_newline_counts_as_a_line() {
        // Ten statements plus a trailing newline crosses the first step.
        let code = format!("{}\n", code_with_lines(10));
        assert_eq!(repair_budget(&code), 9);
    }
}
