pub mod placeholder_estimator;
