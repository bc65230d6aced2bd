#![cfg(test)]

use std::fmt::Write;

use crate::{
    boosting::{BoosterParams, GradientBooster},
    dataset::{Dataset, train_test_split},
    metrics::rmse,
    search::{ParamDistributions, RandomizedSearch},
    selection::top_features,
};

/// A descriptor table where only `MolWeight` and `LogP` drive the target.
fn descriptors_csv(rows: usize) -> String {
    let mut csv = String::from("SMILES,MolWeight,LogP,Noise1,Noise2,LogS\n");
    for i in 0..rows {
        let mol_weight = 50.0 + ((i * 37) % 400) as f32;
        let log_p = -2.0 + ((i * 53) % 80) as f32 / 10.0;
        let noise1 = ((i * 71) % 13) as f32;
        let noise2 = ((i * 29) % 7) as f32;
        let log_s = 0.5 - 0.01 * mol_weight - 0.6 * log_p;

        writeln!(csv, "C{i},{mol_weight},{log_p},{noise1},{noise2},{log_s}").unwrap();
    }

    csv
}

fn small_grid() -> ParamDistributions {
    ParamDistributions {
        n_estimators: vec![30, 60],
        learning_rate: vec![0.1, 0.3],
        max_depth: vec![3, 4],
        subsample: vec![0.8, 1.0],
        colsample_bytree: vec![1.0],
        reg_alpha: vec![0.0],
        reg_lambda: vec![1.0],
    }
}

#[test]
fn test_ml_solubility_pipeline() {
    let csv = descriptors_csv(300);
    let ds = Dataset::from_reader(csv.as_bytes(), "LogS", &["SMILES"]).unwrap();
    let (train, test) = train_test_split(&ds, 0.2, 42).unwrap();
    assert_eq!(test.len(), 60);

    let base = BoosterParams {
        seed: 42,
        ..Default::default()
    };
    let search = RandomizedSearch::new(small_grid(), base, 6, 3, 42).unwrap();
    let result = search.fit(train.x(), train.y()).unwrap();

    let importances = result.best_estimator.feature_importances();
    let top = top_features(train.features(), &importances, 2);
    let mut sorted_top = top.clone();
    sorted_top.sort();
    assert_eq!(sorted_top, ["LogP", "MolWeight"]);

    let train_top = train.select_features(&top).unwrap();
    let test_top = test.select_features(&top).unwrap();
    let model = GradientBooster::fit(train_top.x(), train_top.y(), result.best_params()).unwrap();

    let pred = model.predict(test_top.x()).unwrap();
    let spread = rmse(test.y(), ndarray::Array1::from_elem(test.len(), -2.0).view()).unwrap();
    assert!(rmse(test_top.y(), pred.view()).unwrap() < 0.5 * spread);
}

#[test]
fn test_ml_pipeline_is_reproducible() {
    let csv = descriptors_csv(120);
    let ds = Dataset::from_reader(csv.as_bytes(), "LogS", &["SMILES"]).unwrap();

    let run = || {
        let (train, test) = train_test_split(&ds, 0.2, 42).unwrap();
        let base = BoosterParams {
            seed: 42,
            ..Default::default()
        };

        let result = RandomizedSearch::new(small_grid(), base, 4, 3, 42)
            .unwrap()
            .fit(train.x(), train.y())
            .unwrap();

        let importances = result.best_estimator.feature_importances();
        let top = top_features(train.features(), &importances, 3);
        let test_top = test.select_features(&top).unwrap();
        let train_top = train.select_features(&top).unwrap();

        let model =
            GradientBooster::fit(train_top.x(), train_top.y(), result.best_params()).unwrap();
        (top, model.predict(test_top.x()).unwrap())
    };

    assert_eq!(run(), run());
}
