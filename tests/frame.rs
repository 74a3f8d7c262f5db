mod common;

use common::{check_aggregate_df, test_df};
use rstest::rstest;
use scenario_frame::{Error, Filter, Frame, MetaValue, Predicate, ScenarioKey};

#[rstest]
fn pivot_round_trip(check_aggregate_df: Frame) {
    let wide = check_aggregate_df.timeseries();
    assert_eq!(wide.years, vec![2005, 2010]);
    assert_eq!(wide.rows.len(), check_aggregate_df.len() / 2);

    let back = wide.unpivot().unwrap();
    assert_eq!(&back, check_aggregate_df.data());
}

#[rstest]
fn pivot_keeps_gaps(test_df: Frame) {
    let sparse = test_df
        .filter(
            &Filter::new()
                .with("scenario", "scen_b")
                .with("year", 2005i64)
                .keep(false),
        )
        .unwrap();
    let wide = sparse.timeseries();
    let scen_b = wide
        .rows
        .iter()
        .find(|r| r.key.scenario == "scen_b")
        .unwrap();
    assert_eq!(scen_b.get(2005), None);
    assert_eq!(scen_b.get(2010), Some(7.0));
    assert_eq!(Frame::from_wide(&wide).unwrap(), sparse);
}

#[rstest]
fn filter_by_pattern_and_year_range(check_aggregate_df: Frame) {
    let df = check_aggregate_df
        .filter(
            &Filter::new()
                .with("variable", Predicate::alternatives("Emissions*|Primary Energy"))
                .with("region", "R5*")
                .with("year", 2006i64..=2010),
        )
        .unwrap();
    assert_eq!(df.regions(), vec!["R5ASIA", "R5REF"]);
    assert_eq!(df.years(), vec![2010]);
    assert_eq!(
        df.variables(),
        vec![
            "Emissions|CO2",
            "Emissions|CO2|Cars",
            "Emissions|CO2|Tar",
            "Primary Energy"
        ]
    );
    assert_eq!(df.len(), 4 * 2 * 4);
}

#[rstest]
fn filter_with_list_of_patterns(check_aggregate_df: Frame) {
    let df = check_aggregate_df
        .filter(&Filter::new().with("variable", ["Emissions|CO2|*", "Primary Energy"]))
        .unwrap();
    assert_eq!(
        df.variables(),
        vec!["Emissions|CO2|Cars", "Emissions|CO2|Tar", "Primary Energy"]
    );
    assert_eq!(df.meta().len(), 4);
}

#[rstest]
fn filter_drops_meta_for_vanished_scenarios(check_aggregate_df: Frame) {
    let mut df = check_aggregate_df;
    df.set_meta_for(true, "exclude", &[ScenarioKey::new("IMG", "a_scen")])
        .unwrap();
    df.set_meta(2i64, "tier").unwrap();

    let img = df.filter(&Filter::new().with("model", "IMG")).unwrap();
    assert_eq!(img.models(), vec!["IMG"]);
    assert_eq!(img.meta().len(), 2);
    assert!(img.meta().is_excluded(&ScenarioKey::new("IMG", "a_scen")));
    assert_eq!(
        img.meta().value(&ScenarioKey::new("IMG", "a_scen_2"), "tier"),
        Some(&MetaValue::Integer(2))
    );
    // The source frame still covers both models.
    assert_eq!(df.meta().len(), 4);
}

#[rstest]
fn filter_rejects_unknown_columns(test_df: Frame) {
    let err = test_df
        .filter(&Filter::new().with("exclude", "true"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidColumn(c) if c == "exclude"));
}
