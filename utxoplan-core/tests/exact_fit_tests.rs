use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use utxoplan_core::{find_exact_fit, FitWindow, SearchBudget, SearchOutcome};

fn window(min_sum: u64, max_sum: u64) -> FitWindow {
    FitWindow { min_sum, max_sum }
}

#[test]
fn window_bounds_follow_fees_and_dust() {
    let w = FitWindow::new(120_000, 1_770, 2_080, 546).unwrap();
    assert_eq!(w, window(121_593, 122_080));

    // Dust dominates a cheap change output
    let w = FitWindow::new(100_000, 300, 400, 546).unwrap();
    assert_eq!(w, window(100_270, 100_546));

    assert!(w.contains(100_270));
    assert!(w.contains(100_546));
    assert!(!w.contains(100_547));
}

#[test]
fn window_overflow_is_an_error() {
    assert!(FitWindow::new(u64::MAX, 10, 10, 546).is_err());
}

#[test]
fn finds_combination_outside_minimal_prefix() {
    let values = [70_000, 40_000, 31_769];
    let w = FitWindow::new(100_000, 1_770, 2_080, 546).unwrap();

    let outcome = find_exact_fit(&values, 2, &w, SearchBudget::default());

    assert_eq!(outcome, SearchOutcome::Found(vec![0, 2]));
}

#[test]
fn reports_not_found_when_nothing_fits() {
    let values = [100_000, 50_000, 30_000];
    let w = FitWindow::new(120_000, 1_770, 2_080, 546).unwrap();

    let outcome = find_exact_fit(&values, 2, &w, SearchBudget::default());

    assert_eq!(outcome, SearchOutcome::NotFound);
}

#[test]
fn backtracks_the_first_position() {
    // Only the two smallest values fit; the largest must be dropped
    let values = [100, 60, 50, 45];

    let outcome = find_exact_fit(&values, 2, &window(95, 96), SearchBudget::default());

    assert_eq!(outcome, SearchOutcome::Found(vec![2, 3]));
}

#[test]
fn equal_values_prefer_first_position() {
    let values = [50, 30, 30, 10];

    let outcome = find_exact_fit(&values, 2, &window(80, 80), SearchBudget::default());

    assert_eq!(outcome, SearchOutcome::Found(vec![0, 1]));
}

#[test]
fn equal_values_are_never_counted_twice() {
    let values = [30, 20];

    // 30 + 30 would fit, but there is only one 30
    let outcome = find_exact_fit(&values, 2, &window(60, 60), SearchBudget::default());

    assert_eq!(outcome, SearchOutcome::NotFound);
}

#[test]
fn partial_sum_at_window_top_is_not_extended() {
    // 60 already reaches the top of the window, so no closing value is tried
    let values = [60, 0];

    let outcome = find_exact_fit(&values, 2, &window(60, 60), SearchBudget::default());

    assert_eq!(outcome, SearchOutcome::NotFound);
}

#[test]
fn single_input_scan_stops_below_window() {
    let values = [100, 60, 50];

    let outcome = find_exact_fit(&values, 1, &window(55, 58), SearchBudget::default());

    assert_eq!(outcome, SearchOutcome::NotFound);
}

#[test]
fn impossible_input_counts_are_not_found() {
    let values = [100, 60];
    assert_eq!(
        find_exact_fit(&values, 3, &window(0, 1_000), SearchBudget::default()),
        SearchOutcome::NotFound
    );
    assert_eq!(
        find_exact_fit(&values, 0, &window(0, 1_000), SearchBudget::default()),
        SearchOutcome::NotFound
    );
}

#[test]
fn budget_caps_the_search() {
    let values = [100, 90, 80, 70, 60, 50];
    let w = window(1, 5);

    assert_eq!(
        find_exact_fit(&values, 2, &w, SearchBudget(0)),
        SearchOutcome::BudgetExhausted
    );
    // One scan of the list, then the budget is gone
    assert_eq!(
        find_exact_fit(&values, 2, &w, SearchBudget(values.len() as u64)),
        SearchOutcome::BudgetExhausted
    );
    assert_eq!(
        find_exact_fit(&values, 2, &w, SearchBudget::default()),
        SearchOutcome::NotFound
    );
}

#[quickcheck]
fn found_combinations_are_valid(raw: Vec<u32>, count: u8, low: u32, width: u16) -> TestResult {
    let mut values: Vec<u64> = raw.into_iter().take(12).map(u64::from).collect();
    if values.is_empty() {
        return TestResult::discard();
    }
    values.sort_by(|a, b| b.cmp(a));

    let input_count = (count as usize % values.len()) + 1;
    let w = window(u64::from(low), u64::from(low) + u64::from(width));

    match find_exact_fit(&values, input_count, &w, SearchBudget::default()) {
        SearchOutcome::Found(indices) => {
            let increasing = indices.windows(2).all(|pair| pair[0] < pair[1]);
            let in_bounds = indices.iter().all(|&i| i < values.len());
            let sum: u64 = indices.iter().map(|&i| values[i]).sum();
            TestResult::from_bool(
                indices.len() == input_count && increasing && in_bounds && w.contains(sum),
            )
        }
        _ => TestResult::passed(),
    }
}

#[quickcheck]
fn search_is_deterministic(raw: Vec<u16>, count: u8, low: u32) -> TestResult {
    let mut values: Vec<u64> = raw.into_iter().take(10).map(u64::from).collect();
    if values.is_empty() {
        return TestResult::discard();
    }
    values.sort_by(|a, b| b.cmp(a));

    let input_count = (count as usize % values.len()) + 1;
    let w = window(u64::from(low % 200_000), u64::from(low % 200_000) + 500);

    let first = find_exact_fit(&values, input_count, &w, SearchBudget::default());
    let second = find_exact_fit(&values, input_count, &w, SearchBudget::default());
    TestResult::from_bool(first == second)
}
