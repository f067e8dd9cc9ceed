//! Longest-matching-blocks similarity ratio.
//!
//! Recursively takes the longest common contiguous block, then repeats on the
//! unmatched spans to its left and right. The ratio is `2 * matched / total`,
//! with `1.0` for two empty inputs. No elements are treated as junk.

/// Similarity of two strings in `[0.0, 1.0]`, compared by `char`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_chars(&a, &b);
    2.0 * matched as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Earliest longest block in `a[alo..ahi]` / `b[blo..bhi]` as `(i, j, len)`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
    // row[j + 1]: length of the block ending at a[i], b[j]
    let mut prev = vec![0usize; b.len() + 1];
    let mut row = vec![0usize; b.len() + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            row[j + 1] = if a[i] == b[j] { prev[j] + 1 } else { 0 };
            let k = row[j + 1];
            if k > best_len {
                best_i = i + 1 - k;
                best_j = j + 1 - k;
                best_len = k;
            }
        }
        std::mem::swap(&mut prev, &mut row);
        row[blo] = 0;
    }
    (best_i, best_j, best_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_and_empty() {
        assert!(close(ratio("happy", "happy"), 1.0));
        assert!(close(ratio("", ""), 1.0));
        assert!(close(ratio("abc", ""), 0.0));
    }

    #[test]
    fn one_char_typo_scores_high() {
        // "happ" + "y" matched: 2 * 5 / 11
        assert!(close(ratio("happpy", "happy"), 10.0 / 11.0));
        assert!(ratio("stresed", "stressed") >= 0.9);
    }

    #[test]
    fn recurses_into_both_sides() {
        // "bcd" first, then "a" on the left, nothing on the right
        assert!(close(ratio("abcd", "axbcd"), 8.0 / 9.0));
    }

    #[test]
    fn unrelated_words_score_low() {
        assert!(ratio("die", "tired") < 0.8);
        assert!(ratio("weather", "calm") < 0.5);
    }

    #[test]
    fn symmetric_for_typical_words() {
        for (a, b) in [("gloomy", "glomy"), ("tense", "tenser"), ("okay", "okey")] {
            assert!(close(ratio(a, b), ratio(b, a)));
        }
    }
}
