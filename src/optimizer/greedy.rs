//! Greedy selection by efficiency ratio.

/// Objective per unit of cost; zero-cost items rate 0.
pub fn efficiency(objective: f64, cost: f64) -> f64 {
    if cost == 0.0 {
        0.0
    } else {
        objective / cost
    }
}

/// Admits items in descending efficiency while they fit the remaining
/// budget.
///
/// The sort is stable, so equal efficiencies are visited in input order.
/// Returns admitted indices in admission order.
///
/// # Examples
///
/// ```
/// use u_portfolio::optimizer::greedy_by_efficiency;
///
/// let costs = [100.0, 50.0, 60.0];
/// let scores = [90.0, 40.0, 70.0];
/// assert_eq!(greedy_by_efficiency(&costs, &scores, 110.0), vec![2, 1]);
/// ```
pub fn greedy_by_efficiency(costs: &[f64], objective: &[f64], budget: f64) -> Vec<usize> {
    debug_assert_eq!(costs.len(), objective.len());
    let ratios: Vec<f64> = objective
        .iter()
        .zip(costs)
        .map(|(&s, &c)| efficiency(s, c))
        .collect();

    let mut order: Vec<usize> = (0..ratios.len()).collect();
    order.sort_by(|&a, &b| ratios[b].total_cmp(&ratios[a]));

    let mut remaining = budget;
    let mut admitted = Vec::new();
    for i in order {
        if costs[i] <= remaining {
            remaining -= costs[i];
            admitted.push(i);
        }
    }
    admitted
}
