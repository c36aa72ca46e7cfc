//! Natural ("human") string ordering.
//!
//! Runs of ASCII digits compare by numeric value, so `probe0[9]` sorts
//! before `probe0[10]`. Values are compared as digit strings with leading
//! zeros stripped, which keeps arbitrarily long runs overflow-free.

use std::cmp::Ordering;

/// Compares two strings in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let a_end = digit_run_end(a, i);
            let b_end = digit_run_end(b, j);
            let ord = compare_digit_runs(&a[i..a_end], &b[j..b_end]);
            if ord != Ordering::Equal {
                return ord;
            }
            i = a_end;
            j = b_end;
        } else {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                ord => return ord,
            }
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn digit_run_end(s: &[u8], start: usize) -> usize {
    let mut end = start;
    while end < s.len() && s[end].is_ascii_digit() {
        end += 1;
    }
    end
}

fn compare_digit_runs(a: &[u8], b: &[u8]) -> Ordering {
    let a_trim = strip_zeros(a);
    let b_trim = strip_zeros(b);
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        // Equal values: fewer leading zeros first.
        .then_with(|| a.len().cmp(&b.len()))
}

fn strip_zeros(run: &[u8]) -> &[u8] {
    let first_nonzero = run.iter().position(|&c| c != b'0').unwrap_or(run.len());
    &run[first_nonzero..]
}
