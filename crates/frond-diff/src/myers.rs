//! Myers O(ND) sequence difference.
//!
//! Greedy forward variant with a per-round snapshot of the furthest-reaching
//! endpoints, backtracked into an edit sequence. Memory is O(D²) in the
//! worst case, which is fine here: D is the number of changed rows between
//! two UI states, not the document length.

/// One step of the shortest edit sequence, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    /// `old[old_index]` and `new[new_index]` are the same element.
    Keep { old_index: usize, new_index: usize },
    /// `old[old_index]` is absent from the new sequence.
    Remove { old_index: usize },
    /// `new[new_index]` is absent from the old sequence.
    Insert { new_index: usize },
}

/// Compute the shortest edit sequence turning `old` into `new`.
///
/// The result is ordered: old indices of `Keep`/`Remove` steps ascend, as do
/// new indices of `Keep`/`Insert` steps.
pub fn shortest_edit<T: PartialEq>(old: &[T], new: &[T]) -> Vec<Edit> {
    let n = old.len() as isize;
    let m = new.len() as isize;
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    let offset = max;
    let mut v = vec![0isize; 2 * max as usize + 1];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let go_down = k == -d || (k != d && v[idx - 1] < v[idx + 1]);
            let mut x = if go_down { v[idx + 1] } else { v[idx - 1] + 1 };
            let mut y = x - k;
            while x < n && y < m && old[x as usize] == new[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    // Walk the trace backwards from (n, m), emitting steps in reverse.
    let mut edits = Vec::new();
    let mut x = n;
    let mut y = m;
    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let idx = (k + offset) as usize;
        let go_down = k == -d || (k != d && v[idx - 1] < v[idx + 1]);
        let prev_k = if go_down { k + 1 } else { k - 1 };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            x -= 1;
            y -= 1;
            edits.push(Edit::Keep {
                old_index: x as usize,
                new_index: y as usize,
            });
        }
        if d > 0 {
            if x == prev_x {
                edits.push(Edit::Insert {
                    new_index: prev_y as usize,
                });
            } else {
                edits.push(Edit::Remove {
                    old_index: prev_x as usize,
                });
            }
        }
        x = prev_x;
        y = prev_y;
    }

    edits.reverse();
    edits
}
