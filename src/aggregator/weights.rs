use std::collections::HashMap;

use crate::models::CategoryProfile;

/// Builds the category profile a session draws from.
///
/// Categories are ranked by descending frequency (ties by name) and the
/// first `top_n` are kept. Of those, any category the feed provider cannot
/// serve is silently dropped, so the result may hold fewer than `top_n`
/// entries, or none at all. Weights are the raw counts.
pub fn build_profile(
    frequencies: &HashMap<String, u64>,
    top_n: usize,
    supported: &HashMap<String, String>,
) -> Vec<CategoryProfile> {
    let mut ranked: Vec<(&String, u64)> = frequencies
        .iter()
        .map(|(name, count)| (name, *count))
        .collect();
    ranked.sort_by(|(name_a, count_a), (name_b, count_b)| {
        count_b.cmp(count_a).then_with(|| name_a.cmp(name_b))
    });

    let profile: Vec<CategoryProfile> = ranked
        .into_iter()
        .take(top_n)
        .filter_map(|(name, count)| match supported.get(name) {
            Some(key) => Some(CategoryProfile {
                name: name.clone(),
                upstream_category_key: key.clone(),
                weight: count as f64,
            }),
            None => {
                tracing::debug!(category = %name, "Dropping category the feed cannot serve");
                None
            }
        })
        .collect();

    tracing::debug!(
        input = frequencies.len(),
        kept = profile.len(),
        top_n,
        "Category profile built"
    );

    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported() -> HashMap<String, String> {
        [("Music", "10"), ("Gaming", "20"), ("Comedy", "23"), ("Sports", "17")]
            .into_iter()
            .map(|(name, key)| (name.to_string(), key.to_string()))
            .collect()
    }

    fn freqs(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
        pairs
            .iter()
            .map(|(name, count)| (name.to_string(), *count))
            .collect()
    }

    fn names(profile: &[CategoryProfile]) -> Vec<&str> {
        profile.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_ranked_by_descending_frequency() {
        let profile = build_profile(
            &freqs(&[("Music", 3), ("Gaming", 12), ("Comedy", 7)]),
            5,
            &supported(),
        );
        assert_eq!(names(&profile), vec!["Gaming", "Comedy", "Music"]);
        assert_eq!(profile[0].upstream_category_key, "20");
        assert_eq!(profile[0].weight, 12.0);
    }

    #[test]
    fn test_ties_broken_by_name() {
        let profile = build_profile(
            &freqs(&[("Sports", 4), ("Comedy", 4), ("Music", 4)]),
            2,
            &supported(),
        );
        assert_eq!(names(&profile), vec!["Comedy", "Music"]);
    }

    #[test]
    fn test_unsupported_dropped_after_top_n_cut() {
        // "Education" ranks inside the top 2 but cannot be fetched
        let profile = build_profile(
            &freqs(&[("Education", 50), ("Music", 10), ("Gaming", 5)]),
            2,
            &supported(),
        );
        assert_eq!(names(&profile), vec!["Music"]);
    }

    #[test]
    fn test_weights_are_raw_counts() {
        let profile = build_profile(&freqs(&[("Music", 90), ("Gaming", 10)]), 5, &supported());
        let weights: Vec<f64> = profile.iter().map(|p| p.weight).collect();
        assert_eq!(weights, vec![90.0, 10.0]);
    }

    #[test]
    fn test_empty_inputs_yield_empty_profile() {
        assert!(build_profile(&HashMap::new(), 5, &supported()).is_empty());
        assert!(build_profile(&freqs(&[("Education", 3)]), 5, &supported()).is_empty());
        assert!(build_profile(&freqs(&[("Music", 3)]), 0, &supported()).is_empty());
    }
}
