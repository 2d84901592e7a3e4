use ndarray::{Array1, ArrayView1};

pub(crate) fn normalize_vector(vec: &Array1<f64>) -> Array1<f64> {
    let norm: f64 = vec.iter().map(|&x| x * x).sum::<f64>().sqrt();
    if norm > 1e-10 {
        vec / norm
    } else {
        Array1::zeros(vec.len())
    }
}

/// Numerically stable softmax over a row of class scores.
pub(crate) fn softmax(scores: ArrayView1<f64>) -> Array1<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exp = scores.mapv(|s| (s - max).exp());
    let sum = exp.sum();
    exp / sum
}

/// Index of the highest score; the first one wins on ties.
pub(crate) fn argmax(scores: ArrayView1<f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_zero_vector() {
        let v = normalize_vector(&Array1::zeros(3));
        assert_eq!(v, Array1::<f64>::zeros(3));
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(array![1000.0, 1000.0, 999.0].view());
        assert!((p.sum() - 1.0).abs() < 1e-12);
        assert!(p[0] > p[2]);
    }

    #[test]
    fn test_argmax_prefers_first_on_tie() {
        assert_eq!(argmax(array![0.5, 0.5, 0.1].view()), Some(0));
        assert_eq!(argmax(array![0.1, 0.7, 0.2].view()), Some(1));
        assert_eq!(argmax(Array1::<f64>::zeros(0).view()), None);
    }
}
