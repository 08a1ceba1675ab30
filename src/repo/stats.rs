/// Arithmetic mean; `None` for an empty column.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); `None` below two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Pearson correlation coefficient between two equally long columns.
///
/// `None` when there are fewer than two points or either column is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Pairwise Pearson correlations over a fixed set of named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub fields: Vec<&'static str>,
    /// `values[i][j]` correlates `fields[i]` with `fields[j]`; `None` where undefined.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Build the matrix, or `None` when the columns hold fewer than two rows.
    pub fn from_columns(columns: &[(&'static str, Vec<f64>)]) -> Option<Self> {
        let rows = columns.first().map(|(_, values)| values.len())?;
        if rows < 2 {
            return None;
        }

        let values: Vec<Vec<Option<f64>>> = columns
            .iter()
            .map(|(_, xs)| columns.iter().map(|(_, ys)| pearson(xs, ys)).collect())
            .collect();

        Some(Self {
            fields: columns.iter().map(|(name, _)| *name).collect(),
            values,
        })
    }

    #[cfg(test)]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.fields.iter().position(|f| *f == a)?;
        let j = self.fields.iter().position(|f| *f == b)?;
        self.values[i][j]
    }
}

/// Keep points whose coordinates both lie within three standard deviations of
/// their column mean. Fewer than two points are returned unchanged.
pub fn trim_outliers(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    let ys: Vec<f64> = points.iter().map(|(_, y)| *y).collect();

    let (Some(mean_x), Some(sd_x), Some(mean_y), Some(sd_y)) =
        (mean(&xs), sample_std_dev(&xs), mean(&ys), sample_std_dev(&ys))
    else {
        return points.to_vec();
    };

    points
        .iter()
        .copied()
        .filter(|(x, y)| (x - mean_x).abs() <= 3.0 * sd_x && (y - mean_y).abs() <= 3.0 * sd_y)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!(approx(pearson(&xs, &ys).unwrap(), 1.0));
        let inverse = [8.0, 6.0, 4.0, 2.0];
        assert!(approx(pearson(&xs, &inverse).unwrap(), -1.0));
    }

    #[test]
    fn test_pearson_known_value() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 2.0];
        assert!(approx(pearson(&xs, &ys).unwrap(), 0.5));
    }

    #[test]
    fn test_pearson_undefined_cases() {
        assert!(pearson(&[1.0], &[2.0]).is_none());
        assert!(pearson(&[], &[]).is_none());
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(pearson(&[1.0, 2.0], &[1.0]).is_none());
    }

    #[test]
    fn test_matrix_requires_two_rows() {
        let single = [("a", vec![1.0]), ("b", vec![2.0])];
        assert!(CorrelationMatrix::from_columns(&single).is_none());
        let empty: [(&'static str, Vec<f64>); 2] = [("a", vec![]), ("b", vec![])];
        assert!(CorrelationMatrix::from_columns(&empty).is_none());
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let columns = [
            ("a", vec![1.0, 2.0, 3.0]),
            ("b", vec![1.0, 3.0, 2.0]),
            ("c", vec![5.0, 5.0, 5.0]),
        ];
        let matrix = CorrelationMatrix::from_columns(&columns).unwrap();
        assert!(approx(matrix.get("a", "a").unwrap(), 1.0));
        assert_eq!(matrix.get("a", "b"), matrix.get("b", "a"));
        assert!(matrix.get("a", "c").is_none());
        assert!(matrix.get("a", "missing").is_none());
    }

    #[test]
    fn test_sample_std_dev() {
        let sd = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!(approx(sd, (32.0f64 / 7.0).sqrt()));
        assert!(sample_std_dev(&[3.0]).is_none());
    }

    #[test]
    fn test_trim_outliers_drops_extreme_point() {
        let mut points: Vec<(f64, f64)> = (0..20).map(|i| (10.0 + (i % 3) as f64, 2.0)).collect();
        points.push((5000.0, 2.0));
        let trimmed = trim_outliers(&points);
        assert_eq!(trimmed.len(), 20);
        assert!(trimmed.iter().all(|(x, _)| *x < 100.0));
    }

    #[test]
    fn test_trim_outliers_small_input_unchanged() {
        assert_eq!(trim_outliers(&[(1.0, 2.0)]), vec![(1.0, 2.0)]);
        assert!(trim_outliers(&[]).is_empty());
    }
}
