//! The eight QR data-masking patterns and the penalty-score heuristic used
//! to pick the best one when encoding (ISO/IEC 18004 §7.8).

/// Evaluate mask pattern `pattern` (0-7) at module `(x, y)`.
pub fn applies(pattern: u32, x: i32, y: i32) -> bool {
    match pattern {
        0 => (x + y) % 2 == 0,
        1 => y % 2 == 0,
        2 => x % 3 == 0,
        3 => (x + y) % 3 == 0,
        4 => (y / 2 + x / 3) % 2 == 0,
        5 => (x * y) % 2 + (x * y) % 3 == 0,
        6 => ((x * y) % 2 + (x * y) % 3) % 2 == 0,
        _ => ((x * y) % 3 + (x + y) % 2) % 2 == 0,
    }
}

/// Four structural penalty rules: runs of 5+ same-colour modules, 2x2
/// same-colour blocks, finder-like `1:1:3:1:1` runs, and the overall
/// dark/light balance, each weighted per the standard.
pub fn penalty_score(get: impl Fn(i32, i32) -> bool, size: i32) -> u32 {
    let mut score = 0u32;

    for y in 0..size {
        score += run_penalty(|x| get(x, y), size);
    }
    for x in 0..size {
        score += run_penalty(|y| get(x, y), size);
    }

    for y in 0..size - 1 {
        for x in 0..size - 1 {
            let block = [get(x, y), get(x + 1, y), get(x, y + 1), get(x + 1, y + 1)];
            if block.iter().all(|&b| b) || block.iter().all(|&b| !b) {
                score += 3;
            }
        }
    }

    for y in 0..size {
        score += finder_like_penalty(|x| get(x, y), size);
    }
    for x in 0..size {
        score += finder_like_penalty(|y| get(x, y), size);
    }

    let dark: u32 = (0..size).flat_map(|y| (0..size).map(move |x| (x, y))).filter(|&(x, y)| get(x, y)).count() as u32;
    let total = (size * size) as u32;
    let percent = dark * 100 / total;
    let deviation = percent.abs_diff(50) / 5;
    score += deviation * 10;

    score
}

/// As [`penalty_score`], for a `width`x`height` symbol that isn't
/// necessarily square (rMQR).
pub fn penalty_score_rect(get: impl Fn(i32, i32) -> bool, width: i32, height: i32) -> u32 {
    let mut score = 0u32;

    for y in 0..height {
        score += run_penalty(|x| get(x, y), width);
    }
    for x in 0..width {
        score += run_penalty(|y| get(x, y), height);
    }

    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let block = [get(x, y), get(x + 1, y), get(x, y + 1), get(x + 1, y + 1)];
            if block.iter().all(|&b| b) || block.iter().all(|&b| !b) {
                score += 3;
            }
        }
    }

    for y in 0..height {
        score += finder_like_penalty(|x| get(x, y), width);
    }
    for x in 0..width {
        score += finder_like_penalty(|y| get(x, y), height);
    }

    let dark: u32 = (0..height).flat_map(|y| (0..width).map(move |x| (x, y))).filter(|&(x, y)| get(x, y)).count() as u32;
    let total = (width * height) as u32;
    let percent = dark * 100 / total;
    let deviation = percent.abs_diff(50) / 5;
    score += deviation * 10;

    score
}

fn run_penalty(get: impl Fn(i32) -> bool, size: i32) -> u32 {
    let mut score = 0u32;
    let mut run = 1u32;
    let mut last = get(0);
    for i in 1..size {
        let v = get(i);
        if v == last {
            run += 1;
        } else {
            if run >= 5 {
                score += run - 2;
            }
            run = 1;
            last = v;
        }
    }
    if run >= 5 {
        score += run - 2;
    }
    score
}

fn finder_like_penalty(get: impl Fn(i32) -> bool, size: i32) -> u32 {
    let row: Vec<bool> = (0..size).map(&get).collect();
    let pattern_dark = [true, false, true, true, true, false, true];
    let pattern_light_run = [false, false, false, false];
    let mut score = 0u32;

    for start in 0..row.len() {
        if row[start..].len() >= 7 && row[start..start + 7] == pattern_dark {
            let before_ok = start < 4 || row[start - 4..start] == pattern_light_run;
            let after = start + 7;
            let after_ok = after + 4 > row.len() || row[after..after + 4] == pattern_light_run;
            if before_ok || after_ok {
                score += 40;
            }
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_0_is_checkerboard_diagonal() {
        assert!(applies(0, 0, 0));
        assert!(!applies(0, 0, 1));
    }

    #[test]
    fn uniform_matrix_incurs_run_penalty() {
        let score = penalty_score(|_, _| true, 21);
        assert!(score > 0);
    }

    #[test]
    fn checkerboard_matrix_has_no_run_penalty_but_balance_is_perfect() {
        let score = penalty_score(|x, y| (x + y) % 2 == 0, 20);
        // a perfect checkerboard has balanced darkness and no 5+ runs; only
        // the 2x2 same-colour block rule and finder-like lookalikes can fire.
        assert!(score < 400);
    }
}
