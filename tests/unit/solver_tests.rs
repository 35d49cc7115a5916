use cb_implied_vol::prelude::*;

#[test]
fn test_dated_round_trip_at_default_vol() {
    let config = RunConfig::default();
    let pricer = AmericanOptionPricer::from_config(&config);
    let terms = &config.terms;

    let premium = pricer
        .price(
            280.0,
            terms.conversion_price,
            terms.put_date,
            terms.evaluation_date,
            config.solver.initial_guess,
        )
        .unwrap();
    let params = pricer
        .call_params(280.0, terms.conversion_price, terms.put_date, terms.evaluation_date)
        .unwrap();

    let solver = config.solver.clone().with_initial_guess(0.5);
    let (iv, _) = solve_iv(&pricer, &params, premium, &solver).unwrap();
    assert!((iv - config.solver.initial_guess).abs() < 1e-4);
}

#[test]
fn test_solver_accepts_trait_objects() {
    let models: Vec<Box<dyn PricingModel>> = vec![
        Box::new(BlackScholes),
        Box::new(AmericanOptionPricer::from_config(&RunConfig::default())),
    ];
    let params = IVParams::put(95.0, 100.0, 1.0, 0.04).with_first_exercise(0.5);

    for model in &models {
        let premium = model.premium(&params, 0.35);
        let (iv, _) = solve_iv(model.as_ref(), &params, premium, &SolverConfig::default()).unwrap();
        assert!((iv - 0.35).abs() < 1e-4);
    }
}

#[test]
fn test_deep_itm_zero_premium_is_unresolved() {
    let pricer = AmericanOptionPricer::from_config(&RunConfig::default());
    let params = IVParams::call(1000.0, 295.0, 4.7, 0.011575);

    let outcome: IvOutcome = solve_iv(&pricer, &params, 0.0, &SolverConfig::default()).into();
    assert_eq!(outcome, IvOutcome::Unresolved);
    assert_eq!(outcome.sentinel_percent(), 0.0);
}

#[test]
fn test_early_exercise_premium_for_puts() {
    let pricer = AmericanOptionPricer::from_config(&RunConfig::default());
    let params = IVParams::put(90.0, 100.0, 2.0, 0.05);
    let american = pricer.lattice_price(&params, 0.2);
    let european = BlackScholes::price(&params, 0.2);
    assert!(american > european);
    assert!(american >= params.intrinsic_value());
}

#[test]
fn test_converter_round_trip() {
    let converter = BondToOptionConverter::new(&ConvertibleTerms::default());
    for premium in [0.5, 12.0, 80.0] {
        let bond = converter.bond_price(premium);
        assert!((converter.option_price(bond) - premium).abs() < 1e-9);
    }
}
