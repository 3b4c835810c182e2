//! A regression test for the "madrid_centre" example
mod regression;
use regression::run_regression_test;

#[test]
fn test_regression_madrid_centre() {
    run_regression_test("madrid_centre");
}
