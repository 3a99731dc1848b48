// Integration tests for run configuration loading and the errors reported
// for configurations that can never produce an event.

use cep_phasespace::config::{RunConfig, DEFAULT_EMC_TOLERANCE, DEFAULT_MAX_MASS_TRIALS};
use cep_phasespace::cuts::GenerationCuts;
use cep_phasespace::decay_tree::DecayTree;
use cep_phasespace::error::KinematicsError;
use cep_phasespace::particle::ParticleInfo;
use cep_phasespace::sampler::{PhaseSpaceSampler, SamplerOptions};
use cep_phasespace::validity::{ForwardRapidityVeto, RejectReason, TrialOutcome};
use cep_phasespace::{ContinuumSampler, FactorizedSampler};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

const CONFIG_JSON: &str = r#"{
    "beams": {
        "beam1": {"e": 6500.0, "px": 0.0, "py": 0.0, "pz": 6499.99993228},
        "beam2": {"e": 6500.0, "px": 0.0, "py": 0.0, "pz": -6499.99993228}
    },
    "cuts": {"kt_max": 3.0, "rap_min": -1.0, "rap_max": 1.0},
    "excitation": 1
}"#;

#[test]
fn test_load_run_config_from_file() {
    let path = std::env::temp_dir().join(format!("cep_phasespace_config_{}.json", std::process::id()));
    std::fs::write(&path, CONFIG_JSON).unwrap();
    let config = RunConfig::from_json_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!((config.sqrt_s() - 13000.0).abs() < 1e-3);
    assert_eq!(config.excitation, 1);
    assert_eq!(config.cuts.kt_max, 3.0);
    assert_eq!(config.cuts.rap_min, -1.0);
    // Unlisted windows keep their defaults
    assert_eq!(config.cuts.forward_pt_max, GenerationCuts::default().forward_pt_max);
    assert_eq!(config.emc_tolerance, DEFAULT_EMC_TOLERANCE);
    assert_eq!(config.max_mass_trials, DEFAULT_MAX_MASS_TRIALS);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = RunConfig::from_json_file("/nonexistent/cep_phasespace.json").unwrap_err();
    assert!(matches!(err, KinematicsError::Io(_)));
}

#[test]
fn test_inverted_window_is_malformed_cut() {
    let json = CONFIG_JSON.replace(r#""kt_max": 3.0"#, r#""kt_min": 4.0, "kt_max": 3.0"#);
    match RunConfig::from_json_str(&json) {
        Err(KinematicsError::MalformedCut { name, min, max }) => {
            assert_eq!(name, "kt");
            assert_eq!((min, max), (4.0, 3.0));
        }
        other => panic!("expected MalformedCut, got {:?}", other),
    }
}

#[test]
fn test_excitation_out_of_range() {
    let json = CONFIG_JSON.replace(r#""excitation": 1"#, r#""excitation": 3"#);
    assert!(matches!(
        RunConfig::from_json_str(&json),
        Err(KinematicsError::InvalidConfig(_))
    ));
}

#[test]
fn test_closed_mass_window_exhausts_iterations() {
    // Requested system mass lies above sqrt(s) minus the forward masses
    let mut cuts = GenerationCuts::default();
    cuts.m_min = 20.0;
    cuts.m_max = 25.0;
    let mut config = RunConfig::symmetric(20.0, 0.938272, cuts);
    config.max_mass_trials = 10;
    let tree = DecayTree::from_stable(vec![ParticleInfo::pion_plus(), ParticleInfo::pion_minus()]);
    let sampler = FactorizedSampler::new(Arc::new(config), tree).unwrap();

    let mut event = sampler.new_event();
    let mut rng = StdRng::seed_from_u64(3);
    match sampler.sample(&mut event, &mut rng) {
        Err(KinematicsError::IterationExhausted { trials, .. }) => assert_eq!(trials, 10),
        other => panic!("expected IterationExhausted, got {:?}", other),
    }
}

#[test]
fn test_veto_removes_every_event() {
    let config = Arc::new(RunConfig::symmetric(13000.0, 0.938272, GenerationCuts::technical_defaults(2)));
    let tree = DecayTree::from_stable(vec![ParticleInfo::pion_plus(), ParticleInfo::pion_minus()]);
    // Forward legs at 13 TeV sit near |y| = 9
    let sampler = ContinuumSampler::new(config, tree)
        .unwrap()
        .with_veto(Arc::new(ForwardRapidityVeto { min_abs_rapidity: 50.0 }));

    let mut event = sampler.new_event();
    let mut rng = StdRng::seed_from_u64(11);
    let mut vetoed = 0;
    for _ in 0..500 {
        match sampler.sample(&mut event, &mut rng).unwrap() {
            TrialOutcome::Accepted => panic!("vetoed configuration accepted"),
            TrialOutcome::Rejected(RejectReason::Veto) => vetoed += 1,
            TrialOutcome::Rejected(_) => {}
        }
    }
    assert!(vetoed > 0);
}
