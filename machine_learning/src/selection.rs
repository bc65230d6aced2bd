/// Pairs every feature name with its importance, most important first.
///
/// Features with equal importance keep their original relative order.
pub fn rank_features(names: &[String], importances: &[f64]) -> Vec<(String, f64)> {
    let mut ranked: Vec<(String, f64)> = names
        .iter()
        .cloned()
        .zip(importances.iter().copied())
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// The names of the `n` most important features, most important first.
///
/// Keeps every feature when there are fewer than `n`.
pub fn top_features(names: &[String], importances: &[f64], n: usize) -> Vec<String> {
    rank_features(names, importances)
        .into_iter()
        .take(n)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let ranked = rank_features(&names(&["a", "b", "c", "d"]), &[0.1, 0.4, 0.1, 0.4]);
        let order: Vec<&str> = ranked.iter().map(|(n, _)| n.as_str()).collect();

        assert_eq!(order, ["b", "d", "a", "c"]);
    }

    #[test]
    fn top_features_keeps_at_most_n() {
        let all = names(&["a", "b", "c"]);
        assert_eq!(top_features(&all, &[0.2, 0.5, 0.3], 2), ["b", "c"]);
        assert_eq!(top_features(&all, &[0.2, 0.5, 0.3], 20).len(), 3);
    }
}
