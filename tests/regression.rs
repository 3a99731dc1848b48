// End-to-end regression of the phase-space estimates at sqrt(s) = 13 TeV.
//
// The continuum and factorized skeletons parametrize the same (K+2)-body
// phase space differently. Restricted to a fiducial region that lies
// inside both generation regions, volume × mean weight of the two must
// agree for every central multiplicity K.

use cep_phasespace::config::RunConfig;
use cep_phasespace::cuts::GenerationCuts;
use cep_phasespace::decay_tree::DecayTree;
use cep_phasespace::event::{AuxIntegrationData, KinematicEvent};
use cep_phasespace::particle::ParticleInfo;
use cep_phasespace::random::draw_uniform;
use cep_phasespace::sampler::{event_weight, PhaseSpaceSampler};
use cep_phasespace::stats::{PhaseSpaceCheck, WeightTally};
use cep_phasespace::validity::TrialOutcome;
use cep_phasespace::weight::{closed_form_phase_space, ps2_massive};
use cep_phasespace::{CollinearSampler, ContinuumSampler, FactorizedSampler};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::f64::consts::PI;
use std::sync::Arc;

const SQRT_S: f64 = 13000.0;
const PROTON_MASS: f64 = 0.938272;

fn photons(k: usize) -> DecayTree {
    DecayTree::from_stable(vec![ParticleInfo::photon(); k])
}

/// Fiducial region of the central products, used as the matrix element.
#[derive(Debug, Clone, Copy)]
struct Region {
    m_min: f64,
    m_max: f64,
    y_max: f64,
    pt_max: f64,
}

impl Region {
    fn indicator(&self, event: &KinematicEvent) -> f64 {
        let m = event.central().m();
        let inside = (self.m_min..=self.m_max).contains(&m)
            && event
                .products()
                .iter()
                .all(|p| p.rapidity().abs() < self.y_max && p.pt() <= self.pt_max);
        if inside {
            1.0
        } else {
            0.0
        }
    }

    /// Generation cuts enclosing the region for both skeletons. Products
    /// with pt <= pt_max differ by at most 2 pt_max, and the system
    /// rapidity never exceeds the largest product rapidity.
    fn enclosing_cuts(&self, kt_max: f64) -> GenerationCuts {
        let mut cuts = GenerationCuts::default();
        cuts.forward_pt_min = 0.1;
        cuts.forward_pt_max = 1.0;
        cuts.kt_min = 0.0;
        cuts.kt_max = kt_max;
        cuts.rap_min = -(self.y_max + 0.1);
        cuts.rap_max = self.y_max + 0.1;
        cuts.y_min = -(self.y_max + 0.1);
        cuts.y_max = self.y_max + 0.1;
        cuts.m_min = self.m_min - 0.1;
        cuts.m_max = self.m_max + 0.1;
        cuts
    }
}

fn estimate<S, F>(sampler: &S, calls: usize, seed: u64, matrix_element: F) -> WeightTally
where
    S: PhaseSpaceSampler,
    F: Fn(&KinematicEvent) -> f64,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let mut event = sampler.new_event();
    let mut aux = AuxIntegrationData::default();
    let mut tally = WeightTally::with_name(sampler.name());
    for _ in 0..calls {
        let randvec = draw_uniform(sampler.dimension(), &mut rng);
        let w = event_weight(sampler, &randvec, &mut event, &mut aux, &mut rng, &matrix_element, 1.0).unwrap();
        assert!(w.is_finite() && w >= 0.0);
        tally.add(aux.outcome(), w);
    }
    tally.log_summary();
    tally
}

fn compare_on_region(k: usize, region: Region, cuts: GenerationCuts, calls: usize) {
    let config = Arc::new(RunConfig::symmetric(SQRT_S, PROTON_MASS, cuts));
    let continuum = ContinuumSampler::new(Arc::clone(&config), photons(k)).unwrap();
    let factorized = FactorizedSampler::new(config, photons(k)).unwrap();

    let a = estimate(&continuum, calls, 2024 + k as u64, |e: &KinematicEvent| region.indicator(e));
    let b = estimate(&factorized, calls, 4202 + k as u64, |e: &KinematicEvent| region.indicator(e));

    assert!(a.mean() > 0.0 && b.mean() > 0.0);
    assert!(a.rel_error() < 0.03, "K = {}: continuum rel. error {}", k, a.rel_error());
    assert!(b.rel_error() < 0.03, "K = {}: factorized rel. error {}", k, b.rel_error());
    let ratio = a.mean() / b.mean();
    assert!(
        (ratio - 1.0).abs() < 0.1,
        "K = {}: continuum {} vs factorized {} (ratio {})",
        k,
        a.mean(),
        b.mean(),
        ratio
    );
}

#[test]
fn test_continuum_matches_factorized_two_body() {
    let region = Region {
        m_min: 4.0,
        m_max: 8.0,
        y_max: 1.5,
        pt_max: 4.0,
    };
    let mut cuts = region.enclosing_cuts(10.0);
    cuts.rap_min = -2.0;
    cuts.rap_max = 2.0;
    cuts.y_min = -2.0;
    cuts.y_max = 2.0;
    cuts.m_min = 3.0;
    cuts.m_max = 10.0;
    compare_on_region(2, region, cuts, 200_000);
}

#[test]
fn test_continuum_matches_factorized_three_body() {
    let region = Region {
        m_min: 4.0,
        m_max: 8.0,
        y_max: 1.5,
        pt_max: 3.0,
    };
    compare_on_region(3, region, region.enclosing_cuts(6.5), 300_000);
}

#[test]
fn test_continuum_matches_factorized_four_body() {
    let region = Region {
        m_min: 4.0,
        m_max: 8.0,
        y_max: 1.5,
        pt_max: 3.0,
    };
    compare_on_region(4, region, region.enclosing_cuts(6.5), 400_000);
}

fn reference_cuts() -> GenerationCuts {
    let mut cuts = GenerationCuts::technical_defaults(2);
    cuts.rap_min = -2.0;
    cuts.rap_max = 2.0;
    cuts.kt_min = 0.0;
    cuts.kt_max = 10.0;
    cuts.y_min = -2.0;
    cuts.y_max = 2.0;
    cuts
}

#[test]
fn test_two_body_decay_weight_is_closed_form() {
    let config = Arc::new(RunConfig::symmetric(SQRT_S, PROTON_MASS, reference_cuts()));
    let massless = 1.0 / (8.0 * PI);

    let factorized = FactorizedSampler::new(Arc::clone(&config), photons(2)).unwrap();
    let mut event = factorized.new_event();
    let mut rng = StdRng::seed_from_u64(77);
    let mut accepted = 0;
    for _ in 0..20_000 {
        if factorized.sample(&mut event, &mut rng).unwrap().is_accepted() {
            accepted += 1;
            let exact = ps2_massive(event.central().m2(), 0.0, 0.0);
            assert!((exact - massless).abs() < 1e-12 * massless);
            assert!((event.decay_phase_space - exact).abs() < 1e-12 * exact);
            // dM²/(2π) of the system rides on the cascade weight
            let expected = 1.0 / (16.0 * PI * PI);
            assert!((event.cascade_weight - expected).abs() < 1e-12 * expected);
        }
    }
    assert!(accepted > 0);

    let collinear = CollinearSampler::new(config, photons(2)).unwrap();
    let mut event = collinear.new_event();
    let mut accepted = 0;
    for _ in 0..20_000 {
        if collinear.sample(&mut event, &mut rng).unwrap().is_accepted() {
            accepted += 1;
            assert!((event.cascade_weight - massless).abs() < 1e-12 * massless);
        }
    }
    assert!(accepted > 0);
}

#[test]
fn test_sampled_decay_phase_space_matches_closed_form() {
    let config = Arc::new(RunConfig::symmetric(SQRT_S, PROTON_MASS, reference_cuts()));
    let sampler = FactorizedSampler::new(config, photons(3)).unwrap();
    let mut event = sampler.new_event();
    let mut rng = StdRng::seed_from_u64(303);
    let mut check = PhaseSpaceCheck::new();
    for _ in 0..100_000 {
        if sampler.sample(&mut event, &mut rng).unwrap().is_accepted() {
            let exact = closed_form_phase_space(event.central().m2(), &[0.0; 3]).unwrap();
            check.add(event.decay_phase_space, exact);
        }
    }
    check.log_summary();
    assert!(check.sampled().calls() > 10_000);
    assert!((check.ratio() - 1.0).abs() < 0.02, "ratio {}", check.ratio());
}

#[test]
fn test_midpoint_random_vector_scenario() {
    let config = Arc::new(RunConfig::symmetric(SQRT_S, PROTON_MASS, reference_cuts()));
    let sampler = ContinuumSampler::new(config, photons(2)).unwrap();
    assert_eq!(sampler.dimension(), 8);

    let mut event = sampler.new_event();
    let mut rng = StdRng::seed_from_u64(0);
    let outcome = sampler.build(&[0.5; 8], &mut event, &mut rng).unwrap();
    assert_eq!(outcome, TrialOutcome::Accepted);

    let diff = event.beams.sum() - event.produced_sum();
    assert!(diff.max_abs() <= 1e-6 * SQRT_S);
    for p in event.products() {
        let y = p.rapidity();
        assert!((-2.0..=2.0).contains(&y), "rapidity {} outside window", y);
    }
    // kt = 5 back to back, both at y = 0
    assert!((event.kt_vectors[0].pt() - 5.0).abs() < 1e-12);
    assert!((event.central().m() - 5.0).abs() < 1e-3);
    assert!(sampler.phase_space_weight(&event) > 0.0);
}

#[test]
fn test_rejected_points_never_carry_weight() {
    // Narrow forward window at low energy: many points cannot be closed
    let mut cuts = GenerationCuts::technical_defaults(4);
    cuts.kt_max = 20.0;
    let config = Arc::new(RunConfig::symmetric(30.0, PROTON_MASS, cuts));
    let tree = DecayTree::from_stable(vec![ParticleInfo::pion_plus(); 4]);
    let sampler = ContinuumSampler::new(config, tree).unwrap();

    let mut rng = StdRng::seed_from_u64(31);
    let mut event = sampler.new_event();
    let mut aux = AuxIntegrationData::default();
    let mut rejected = 0;
    for _ in 0..2000 {
        let randvec = draw_uniform(sampler.dimension(), &mut rng);
        let w = event_weight(&sampler, &randvec, &mut event, &mut aux, &mut rng, |_| 1.0, 1.0).unwrap();
        assert!(w.is_finite());
        if !aux.kinematics_ok {
            rejected += 1;
            assert_eq!(w, 0.0);
        }
    }
    assert!(rejected > 0);
}
