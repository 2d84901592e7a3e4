use std::collections::BTreeMap;
use std::fmt;

use super::category::Category;

/// Precision, recall, F1 and support for one category
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub category: Category,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of evaluation rows whose true category is this one
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-category evaluation of predictions against the held-out labels.
///
/// Categories are the union of the true and predicted labels. Ratios with a
/// zero denominator are reported as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
    pub total: usize,
}

#[derive(Default)]
struct Counts {
    true_positive: usize,
    predicted: usize,
    actual: usize,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 { numerator / denominator } else { 0.0 }
}

impl ClassificationReport {
    /// Builds a report from aligned slices of true and predicted categories.
    ///
    /// # Panics
    /// Panics if the slices have different lengths.
    pub fn from_predictions(actual: &[Category], predicted: &[Category]) -> Self {
        assert_eq!(actual.len(), predicted.len(), "actual and predicted labels must align");

        let mut counts: BTreeMap<&Category, Counts> = BTreeMap::new();
        let mut correct = 0;
        for (truth, guess) in actual.iter().zip(predicted) {
            counts.entry(truth).or_default().actual += 1;
            counts.entry(guess).or_default().predicted += 1;
            if truth == guess {
                correct += 1;
                counts.entry(truth).or_default().true_positive += 1;
            }
        }

        let classes: Vec<ClassMetrics> = counts.into_iter()
            .map(|(category, c)| {
                let precision = ratio(c.true_positive as f64, c.predicted as f64);
                let recall = ratio(c.true_positive as f64, c.actual as f64);
                ClassMetrics {
                    category: category.clone(),
                    precision,
                    recall,
                    f1: ratio(2.0 * precision * recall, precision + recall),
                    support: c.actual,
                }
            })
            .collect();

        let total = actual.len();
        let n_classes = classes.len() as f64;
        let mut macro_avg = Averages::default();
        let mut weighted_avg = Averages::default();
        for metrics in &classes {
            macro_avg.precision += metrics.precision;
            macro_avg.recall += metrics.recall;
            macro_avg.f1 += metrics.f1;
            let weight = metrics.support as f64;
            weighted_avg.precision += metrics.precision * weight;
            weighted_avg.recall += metrics.recall * weight;
            weighted_avg.f1 += metrics.f1 * weight;
        }
        for (avg, denominator) in [(&mut macro_avg, n_classes), (&mut weighted_avg, total as f64)] {
            avg.precision = ratio(avg.precision, denominator);
            avg.recall = ratio(avg.recall, denominator);
            avg.f1 = ratio(avg.f1, denominator);
        }

        Self {
            classes,
            accuracy: ratio(correct as f64, total as f64),
            macro_avg,
            weighted_avg,
            total,
        }
    }

    /// Metrics for a single category, if it occurred in the evaluation
    pub fn class(&self, category: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|m| m.category == category)
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.classes.iter()
            .map(|m| m.category.as_str().chars().count())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(0);

        writeln!(f, "{:>width$} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for m in &self.classes {
            writeln!(
                f, "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.category.as_str(), m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>width$} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, self.total)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f, "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cats(names: &[&str]) -> Vec<Category> {
        names.iter().map(|&n| Category::new(n).unwrap()).collect()
    }

    #[test]
    fn test_metrics() {
        let actual = cats(&["Food", "Food", "Food", "Transport"]);
        let predicted = cats(&["Food", "Food", "Transport", "Transport"]);
        let report = ClassificationReport::from_predictions(&actual, &predicted);

        let food = report.class("Food").unwrap();
        assert_eq!(food.support, 3);
        assert!((food.precision - 1.0).abs() < 1e-12);
        assert!((food.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((food.f1 - 0.8).abs() < 1e-12);

        let transport = report.class("Transport").unwrap();
        assert!((transport.precision - 0.5).abs() < 1e-12);
        assert!((transport.recall - 1.0).abs() < 1e-12);

        assert!((report.accuracy - 0.75).abs() < 1e-12);
        assert!((report.macro_avg.precision - 0.75).abs() < 1e-12);
        assert!((report.weighted_avg.recall - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_never_predicted_class_scores_zero() {
        let actual = cats(&["Food", "Travel"]);
        let predicted = cats(&["Food", "Food"]);
        let report = ClassificationReport::from_predictions(&actual, &predicted);
        let travel = report.class("Travel").unwrap();
        assert_eq!(travel.precision, 0.0);
        assert_eq!(travel.f1, 0.0);
        assert_eq!(travel.support, 1);
    }

    #[test]
    fn test_display_lists_every_class() {
        let labels = cats(&["Food", "Transport"]);
        let text = ClassificationReport::from_predictions(&labels, &labels).to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("Food"));
        assert!(text.contains("Transport"));
        assert!(text.contains("weighted avg"));
    }
}
