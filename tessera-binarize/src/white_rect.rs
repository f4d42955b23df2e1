//! `DetectWhiteRect`: expand a rectangle outward from a seed point until every
//! side borders pure white (spec §4.4, supplemented from the original
//! `WhiteRectDetector`).

use tessera_common::{BitMatrix, PointF, Quadrilateral};

const INIT_SIZE: i32 = 10;
const CORR: f64 = 1.0;

fn contains_black_point(image: &BitMatrix, a: i32, b: i32, fixed: i32, horizontal: bool) -> bool {
    let a = a.max(0);
    if horizontal {
        if fixed < 0 || fixed >= image.height() as i32 {
            return false;
        }
        let b = b.min(image.width() as i32 - 1);
        (a..=b).any(|x| image.get(x, fixed))
    } else {
        if fixed < 0 || fixed >= image.width() as i32 {
            return false;
        }
        let b = b.min(image.height() as i32 - 1);
        (a..=b).any(|y| image.get(fixed, y))
    }
}

/// Walk the straight segment from `(ax, ay)` to `(bx, by)` and return the first
/// black pixel encountered, if any.
fn black_point_on_segment(image: &BitMatrix, ax: i32, ay: i32, bx: i32, by: i32) -> Option<PointF> {
    let a = PointF::new(ax as f64, ay as f64);
    let b = PointF::new(bx as f64, by as f64);
    let d = b - a;
    let len = d.length();
    if len == 0.0 {
        return None;
    }
    let dir = d.normalized();
    let steps = len.round() as i32;

    let mut p = a;
    for _ in 0..=steps {
        let rounded = p.round();
        if rounded.x >= 0
            && rounded.y >= 0
            && (rounded.x as u32) < image.width()
            && (rounded.y as u32) < image.height()
            && image.get(rounded.x, rounded.y)
        {
            return Some(p);
        }
        p = p + dir;
    }
    None
}

/// Recentre the four found edge-points by a fixed correction, choosing which
/// diagonal layout applies based on which half of the rectangle the bottommost
/// point falls in.
fn center_edges(y: PointF, z: PointF, x: PointF, t: PointF, width: i32) -> Quadrilateral<PointF> {
    if y.x < width as f64 / 2.0 {
        Quadrilateral::new(
            PointF::new(t.x - CORR, t.y + CORR),
            PointF::new(z.x + CORR, z.y + CORR),
            PointF::new(x.x - CORR, x.y - CORR),
            PointF::new(y.x + CORR, y.y - CORR),
        )
    } else {
        Quadrilateral::new(
            PointF::new(t.x + CORR, t.y + CORR),
            PointF::new(z.x + CORR, z.y - CORR),
            PointF::new(x.x - CORR, x.y + CORR),
            PointF::new(y.x - CORR, y.y - CORR),
        )
    }
}

/// Expand a rectangle seeded at `(x, y)` outward on all four sides until each
/// side is entirely white, then fit the four black corner points just inside
/// it. Returns `None` if the seed escapes the image or no black border is ever
/// found.
pub fn detect_white_rect(image: &BitMatrix, x: i32, y: i32) -> Option<Quadrilateral<PointF>> {
    detect_white_rect_sized(image, INIT_SIZE, x, y)
}

/// As [`detect_white_rect`], with an explicit initial half-size for the seed
/// rectangle.
pub fn detect_white_rect_sized(image: &BitMatrix, init_size: i32, x: i32, y: i32) -> Option<Quadrilateral<PointF>> {
    let height = image.height() as i32;
    let width = image.width() as i32;
    let halfsize = init_size / 2;

    let mut left = x - halfsize;
    let mut right = x + halfsize;
    let mut up = y - halfsize;
    let mut down = y + halfsize;
    if up < 0 || left < 0 || down >= height || right >= width {
        return None;
    }

    let mut found_right = false;
    let mut found_bottom = false;
    let mut found_left = false;
    let mut found_top = false;
    let mut found_any = false;

    loop {
        let mut found_this_round = false;

        let mut right_not_white = true;
        while (right_not_white || !found_right) && right < width {
            right_not_white = contains_black_point(image, up, down, right, false);
            if right_not_white {
                right += 1;
                found_this_round = true;
                found_right = true;
            } else if !found_right {
                right += 1;
            }
        }

        let mut bottom_not_white = true;
        while (bottom_not_white || !found_bottom) && down < height {
            bottom_not_white = contains_black_point(image, left, right, down, true);
            if bottom_not_white {
                down += 1;
                found_this_round = true;
                found_bottom = true;
            } else if !found_bottom {
                down += 1;
            }
        }

        let mut left_not_white = true;
        while (left_not_white || !found_left) && left >= 0 {
            left_not_white = contains_black_point(image, up, down, left, false);
            if left_not_white {
                left -= 1;
                found_this_round = true;
                found_left = true;
            } else if !found_left {
                left -= 1;
            }
        }

        let mut top_not_white = true;
        while (top_not_white || !found_top) && up >= 0 {
            top_not_white = contains_black_point(image, left, right, up, true);
            if top_not_white {
                up -= 1;
                found_this_round = true;
                found_top = true;
            } else if !found_top {
                up -= 1;
            }
        }

        if found_this_round {
            found_any = true;
        } else {
            break;
        }
    }

    if up < 0 || left < 0 || down >= height || right >= width || !found_any {
        return None;
    }

    let max_size = right - left;

    let z = (1..max_size).find_map(|i| black_point_on_segment(image, left, down - i, left + i, down))?;
    let t = (1..max_size).find_map(|i| black_point_on_segment(image, left, up + i, left + i, up))?;
    let rightward_x = (1..max_size).find_map(|i| black_point_on_segment(image, right, up + i, right - i, up))?;
    let y_pt = (1..max_size).find_map(|i| black_point_on_segment(image, right, down - i, right - i, down))?;

    Some(center_edges(y_pt, z, rightward_x, t, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_square(size: u32, border: u32) -> BitMatrix {
        let mut m = BitMatrix::new(size, size);
        for y in border..size - border {
            for x in border..size - border {
                m.set(x as i32, y as i32, true);
            }
        }
        m
    }

    #[test]
    fn detects_a_centred_black_square() {
        let m = filled_square(40, 10);
        let quad = detect_white_rect(&m, 20, 20);
        assert!(quad.is_some());
    }

    #[test]
    fn rejects_seed_too_close_to_border() {
        let m = filled_square(40, 10);
        assert!(detect_white_rect(&m, 1, 1).is_none());
    }
}
