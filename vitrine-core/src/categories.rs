//! Category popularity aggregation.
//!
//! Pure transformation over a product collection; no I/O and no mutation of
//! the input.

use std::collections::HashMap;

use crate::Product;

/// Count products per category label and order the labels by descending
/// frequency.
///
/// Labels are matched exactly (case-sensitive, no normalization), and the
/// empty string is a valid, distinct label. Ties keep first-seen order: the
/// order in which a label first appears in `products`.
pub fn category_frequencies(products: &[Product]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for product in products {
        let label = product.category.as_str();
        match counts.get_mut(label) {
            Some(count) => *count += 1,
            None => {
                counts.insert(label, 1);
                first_seen.push(label);
            }
        }
    }

    let mut ranked: Vec<(String, usize)> = first_seen
        .into_iter()
        .map(|label| (label.to_string(), counts[label]))
        .collect();
    // sort_by is stable, so equal frequencies keep first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Distinct category labels ordered by popularity.
pub fn popular_categories(products: &[Product]) -> Vec<String> {
    category_frequencies(products)
        .into_iter()
        .map(|(label, _)| label)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rating;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn product(category: &str) -> Product {
        Product {
            id: 1,
            title: "item".to_string(),
            price: 1.0,
            description: String::new(),
            category: category.to_string(),
            image: String::new(),
            rating: Rating { rate: 0.0, count: 0 },
        }
    }

    #[test]
    fn empty_collection_yields_empty_sequence() {
        assert!(popular_categories(&[]).is_empty());
    }

    #[test]
    fn orders_by_descending_frequency() {
        let products = vec![product("a"), product("a"), product("b")];
        assert_eq!(popular_categories(&products), vec!["a", "b"]);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let products = vec![
            product("b"),
            product("a"),
            product("c"),
            product("a"),
            product("b"),
            product("c"),
        ];
        assert_eq!(popular_categories(&products), vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_string_is_a_distinct_category() {
        let products = vec![product(""), product(""), product("misc")];
        assert_eq!(
            category_frequencies(&products),
            vec![("".to_string(), 2), ("misc".to_string(), 1)]
        );
    }

    #[test]
    fn labels_are_case_sensitive() {
        let products = vec![product("Books"), product("books")];
        assert_eq!(popular_categories(&products).len(), 2);
    }

    proptest! {
        #[test]
        fn each_distinct_category_appears_exactly_once(
            labels in proptest::collection::vec("[a-d]{1,2}", 0..40)
        ) {
            let products: Vec<Product> = labels.iter().map(|l| product(l)).collect();
            let ranked = popular_categories(&products);

            let distinct: HashSet<&String> = ranked.iter().collect();
            prop_assert_eq!(distinct.len(), ranked.len());

            let expected: HashSet<String> = labels.into_iter().collect();
            let got: HashSet<String> = ranked.into_iter().collect();
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn frequencies_are_monotonically_non_increasing(
            labels in proptest::collection::vec("[a-d]{1,2}", 0..40)
        ) {
            let products: Vec<Product> = labels.iter().map(|l| product(l)).collect();
            let ranked = category_frequencies(&products);
            for pair in ranked.windows(2) {
                prop_assert!(pair[0].1 >= pair[1].1);
            }
        }
    }
}
