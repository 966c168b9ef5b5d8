//! Budget filter.

/// Keeps the items priced at or below `budget`, preserving order.
///
/// `price` extracts the monthly price of an item.
#[must_use]
pub fn within_budget<T>(items: Vec<T>, budget: f64, price: impl Fn(&T) -> f64) -> Vec<T> {
    let before = items.len();
    let kept: Vec<T> = items.into_iter().filter(|item| price(item) <= budget).collect();

    log::debug!(
        "Budget filter: {} of {before} candidates at or below {budget}",
        kept.len()
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_prices_at_or_below_budget() {
        let prices = vec![100.0, 250.0, 200.0, 200.01];
        let kept = within_budget(prices, 200.0, |p| *p);
        assert_eq!(kept, vec![100.0, 200.0]);
    }

    #[test]
    fn can_drop_everything() {
        let kept = within_budget(vec![500.0, 600.0], 100.0, |p| *p);
        assert!(kept.is_empty());
    }
}
