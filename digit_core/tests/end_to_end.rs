use std::fs;

use digit_recognition_core::{
    accuracy_percent, generate_pools, logging, Checkpointable, Classifier, ConjugateGradient,
    Driver, EngineConfig, MomentumDescent, OptimizerConfig, OutputConfig, PrepareConfig,
    SyntheticConfig, TrainingMode,
};

fn pools() -> digit_recognition_core::DigitPools {
    generate_pools(&SyntheticConfig {
        num_classes: 4,
        side: 7,
        train_per_class: 120,
        test_per_class: 40,
        noise_level: 40.0,
        ..Default::default()
    })
}

fn config() -> EngineConfig {
    EngineConfig {
        data: PrepareConfig {
            num_classes: 4,
            validation_per_class: 40,
            ..Default::default()
        },
        optimizer: OptimizerConfig::ConjugateGradient(ConjugateGradient::with_max_iters(40)),
        ..Default::default()
    }
}

#[test]
fn both_heads_learn_well_separated_prototypes() {
    let driver = Driver::from_pools(&pools(), config()).unwrap();
    let runs = driver.run_all().unwrap();
    assert_eq!(runs.len(), 2);

    for run in &runs {
        assert!(
            run.evaluation.test_accuracy > 90.0,
            "{} reached only {:.2}%",
            run.evaluation.mode,
            run.evaluation.test_accuracy
        );
        for report in &run.training.reports {
            assert!(report.final_loss <= report.initial_loss);
            assert!(report.iterations <= 40);
        }
    }
}

#[test]
fn zero_weight_losses_match_closed_form() {
    let driver = Driver::from_pools(&pools(), config()).unwrap();

    let ovr = driver.run(TrainingMode::OneVsRest).unwrap();
    for report in &ovr.training.reports {
        assert!((report.initial_loss - std::f64::consts::LN_2).abs() < 1e-12);
    }

    let multinomial = driver.run(TrainingMode::Multinomial).unwrap();
    assert!((multinomial.training.reports[0].initial_loss - 4f64.ln()).abs() < 1e-12);
}

#[test]
fn predictions_cover_every_row_with_valid_labels() {
    let driver = Driver::from_pools(&pools(), config()).unwrap();
    let run = driver.run(TrainingMode::OneVsRest).unwrap();
    let test = &driver.dataset().test;

    let predicted = run.classifier().predict(test.data.view()).unwrap();
    assert_eq!(predicted.len(), test.len());
    assert!(predicted.iter().all(|&label| label < 4));
    assert_eq!(
        accuracy_percent(&predicted, &test.labels),
        run.evaluation.test_accuracy
    );
}

#[test]
fn parallel_one_vs_rest_matches_sequential() {
    let sequential = Driver::from_pools(&pools(), config())
        .unwrap()
        .run(TrainingMode::OneVsRest)
        .unwrap();
    let parallel = Driver::from_pools(
        &pools(),
        EngineConfig {
            parallel: true,
            ..config()
        },
    )
    .unwrap()
    .run(TrainingMode::OneVsRest)
    .unwrap();

    assert_eq!(sequential.classifier(), parallel.classifier());
    assert_eq!(sequential.evaluation.test_accuracy, parallel.evaluation.test_accuracy);
}

#[test]
fn momentum_optimizer_also_trains() {
    let driver = Driver::from_pools(
        &pools(),
        EngineConfig {
            modes: vec![TrainingMode::Multinomial],
            optimizer: OptimizerConfig::Momentum(MomentumDescent::new(0.1, 0.9)),
            ..config()
        },
    )
    .unwrap();

    let runs = driver.run_all().unwrap();
    assert_eq!(runs.len(), 1);
    assert!(runs[0].evaluation.train_accuracy > 80.0);
}

#[test]
fn journals_and_checkpoints_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let engine = EngineConfig {
        output: OutputConfig {
            log_dir: Some(dir.path().join("logs")),
            checkpoint_dir: Some(dir.path().join("checkpoints")),
        },
        ..config()
    };
    let driver = Driver::from_pools(&pools(), engine).unwrap();
    let runs = driver.run_all().unwrap();

    let training_log = fs::read_to_string(dir.path().join("logs").join(logging::TRAINING_LOG)).unwrap();
    assert_eq!(training_log.lines().count(), 4 + 1);
    let evaluation_log =
        fs::read_to_string(dir.path().join("logs").join(logging::EVALUATION_LOG)).unwrap();
    assert_eq!(evaluation_log.lines().count(), 2);

    for run in &runs {
        let path = run.checkpoint.as_ref().unwrap();
        let restored = Classifier::load_checkpoint(path).unwrap();
        assert_eq!(&restored, run.classifier());
    }
    assert!(dir.path().join("checkpoints/one_vs_rest.bin").exists());
    assert!(dir.path().join("checkpoints/multinomial.bin").exists());
}

#[test]
fn config_file_drives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    fs::write(
        &path,
        "[data]\nnum_classes = 4\nvalidation_per_class = 40\n\n\
         [training]\nmodes = [\"multinomial\"]\n\n\
         [optimizer]\nmax_iters = 25\n",
    )
    .unwrap();

    let engine = EngineConfig::load_from_file(&path).unwrap();
    let driver = Driver::from_pools(&pools(), engine).unwrap();
    let runs = driver.run_all().unwrap();

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].evaluation.mode, TrainingMode::Multinomial);
    assert!(runs[0].training.reports[0].iterations <= 25);
}
