#![allow(dead_code)]

use rstest::fixture;
use scenario_frame::{Frame, TimeseriesKey, TimeseriesRecord};

pub const MODELS: [&str; 2] = ["MSG-GLB", "IMG"];
pub const SCENARIOS: [&str; 2] = ["a_scen", "a_scen_2"];
pub const REGIONS: [&str; 3] = ["World", "R5ASIA", "R5REF"];
pub const VARIABLES: [(&str, &str); 6] = [
    ("Primary Energy", "EJ/yr"),
    ("Primary Energy|Coal", "EJ/yr"),
    ("Primary Energy|Gas", "EJ/yr"),
    ("Emissions|CO2", "Mt CO2/yr"),
    ("Emissions|CO2|Cars", "Mt CO2/yr"),
    ("Emissions|CO2|Tar", "Mt CO2/yr"),
];
pub const YEARS: [i64; 2] = [2005, 2010];

/// Two models x two scenarios x three regions x six variables x two years,
/// every value distinct.
#[fixture]
pub fn check_aggregate_df() -> Frame {
    let mut records = Vec::new();
    let mut n = 0.0;
    for model in MODELS {
        for scenario in SCENARIOS {
            for region in REGIONS {
                for (variable, unit) in VARIABLES {
                    for year in YEARS {
                        n += 1.0;
                        records.push(TimeseriesRecord::new(
                            TimeseriesKey::new(model, scenario, region, variable, unit, year),
                            n * 1.5,
                        ));
                    }
                }
            }
        }
    }
    Frame::new(records).expect("fixture has unique keys")
}

/// Small frame with one model and two scenarios.
#[fixture]
pub fn test_df() -> Frame {
    let rows = [
        ("scen_a", "Primary Energy", 2005, 1.0),
        ("scen_a", "Primary Energy", 2010, 6.0),
        ("scen_a", "Primary Energy|Coal", 2005, 0.5),
        ("scen_a", "Primary Energy|Coal", 2010, 3.0),
        ("scen_b", "Primary Energy", 2005, 2.0),
        ("scen_b", "Primary Energy", 2010, 7.0),
    ];
    Frame::new(rows.into_iter().map(|(scenario, variable, year, value)| {
        TimeseriesRecord::new(
            TimeseriesKey::new("model_a", scenario, "World", variable, "EJ/yr", year),
            value,
        )
    }))
    .expect("fixture has unique keys")
}
