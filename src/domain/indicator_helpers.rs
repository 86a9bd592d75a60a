//! Shared rolling-window helpers for indicator calculations.
//!
//! Windows follow trailing semantics: the value at `i` covers `i + 1 - window ..= i`
//! and is `None` until the window is full or while any input in it is `None`.

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    rolling(&wrapped, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    rolling(&wrapped, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

fn rolling<F>(values: &[Option<f64>], window: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    if window == 0 {
        return vec![None; values.len()];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut buf: Vec<f64> = Vec::with_capacity(window);

    for i in 0..values.len() {
        if i + 1 < window {
            out.push(None);
            continue;
        }
        buf.clear();
        let complete = values[i + 1 - window..=i].iter().all(|v| match v {
            Some(x) => {
                buf.push(*x);
                true
            }
            None => false,
        });
        out.push(if complete { Some(reduce(&buf)) } else { None });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_mean_warmup_then_values() {
        let values = [Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let out = rolling_mean(&values, 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(2.0));
        assert_eq!(out[3], Some(3.0));
    }

    #[test]
    fn rolling_mean_gap_poisons_window() {
        let values = [Some(1.0), None, Some(3.0), Some(4.0), Some(5.0)];
        let out = rolling_mean(&values, 2);
        assert_eq!(out[1], None);
        assert_eq!(out[2], None);
        assert_eq!(out[3], Some(3.5));
        assert_eq!(out[4], Some(4.5));
    }

    #[test]
    fn rolling_max_and_min() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        let max = rolling_max(&values, 3);
        let min = rolling_min(&values, 3);
        assert_eq!(max, vec![None, None, Some(4.0), Some(4.0), Some(5.0)]);
        assert_eq!(min, vec![None, None, Some(1.0), Some(1.0), Some(1.0)]);
    }

    #[test]
    fn zero_window_is_all_none() {
        assert_eq!(rolling_mean(&[Some(1.0)], 0), vec![None]);
    }

    #[test]
    fn empty_input() {
        assert!(rolling_mean(&[], 14).is_empty());
        assert!(rolling_max(&[], 14).is_empty());
    }
}
