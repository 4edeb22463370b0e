use approx::assert_abs_diff_eq;
use ndarray::{array, Array2, ArrayD, IxDyn};

use vistune_core::error::VistuneError;
use vistune_core::stats::pearson;
use vistune_core::tuning::{population_correlation, population_correlation_dyn};

fn signals() -> Array2<f64> {
    array![
        [1.0, 2.0, 3.0, 4.0, 5.0],
        [2.0, 1.0, 4.0, 3.0, 6.0],
        [0.5, 0.7, 0.2, 0.9, 0.1],
    ]
}

#[test]
fn test_matches_independent_leave_one_out() {
    let data = signals();
    let result = population_correlation(data.view()).unwrap();
    assert_eq!(result.len(), 3);

    for i in 0..3 {
        let others: Vec<usize> = (0..3).filter(|&c| c != i).collect();
        let mean: Vec<f64> = (0..5)
            .map(|t| others.iter().map(|&c| data[[c, t]]).sum::<f64>() / others.len() as f64)
            .collect();
        let own: Vec<f64> = data.row(i).to_vec();
        assert_abs_diff_eq!(result[i], pearson(&own, &mean), epsilon = 1e-12);
    }
}

#[test]
fn test_duplicating_other_cell_keeps_result() {
    // The other rows are equal, so an extra copy leaves their mean unchanged.
    let base = array![[1.0, 3.0, 2.0, 5.0], [2.0, 2.0, 3.0, 4.0], [2.0, 2.0, 3.0, 4.0]];
    let duplicated = array![
        [1.0, 3.0, 2.0, 5.0],
        [2.0, 2.0, 3.0, 4.0],
        [2.0, 2.0, 3.0, 4.0],
        [2.0, 2.0, 3.0, 4.0],
    ];
    let a = population_correlation(base.view()).unwrap();
    let b = population_correlation(duplicated.view()).unwrap();
    assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-12);
}

#[test]
fn test_identical_cells_correlate_perfectly() {
    let row = [0.1, 0.4, 0.2, 0.8, 0.5];
    let data = Array2::from_shape_fn((4, 5), |(_, t)| row[t]);
    let result = population_correlation(data.view()).unwrap();
    for &r in result.iter() {
        assert_abs_diff_eq!(r, 1.0, epsilon = 1e-12);
    }
}

#[test]
fn test_nan_in_other_rows_is_skipped() {
    let data = array![
        [1.0, 2.0, 3.0, 4.0],
        [1.0, f64::NAN, 3.0, 4.0],
        [1.0, 2.0, 3.0, 4.0],
    ];
    let result = population_correlation(data.view()).unwrap();
    assert_abs_diff_eq!(result[0], 1.0, epsilon = 1e-12);
    // Cell 1's own series holds NaN.
    assert!(result[1].is_nan());
}

#[test]
fn test_single_cell_is_rejected() {
    let data = array![[1.0, 2.0, 3.0]];
    let err = population_correlation(data.view()).unwrap_err();
    assert!(matches!(err, VistuneError::Precondition(_)));
}

#[test]
fn test_non_2d_input_is_rejected() {
    let cube = ArrayD::<f64>::zeros(IxDyn(&[2, 3, 4]));
    let err = population_correlation_dyn(&cube).unwrap_err();
    assert!(matches!(err, VistuneError::ShapeMismatch(_)));

    let flat = ArrayD::<f64>::zeros(IxDyn(&[5]));
    assert!(population_correlation_dyn(&flat).is_err());
}

#[test]
fn test_dyn_accepts_2d() {
    let data = signals().into_dyn();
    let result = population_correlation_dyn(&data).unwrap();
    assert_eq!(result.len(), 3);
}
