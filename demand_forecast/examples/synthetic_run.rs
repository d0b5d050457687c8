use chrono::NaiveDate;
use demand_forecast::error::Result;
use demand_forecast::utils::{synthetic_history, SyntheticProfile};
use demand_forecast::{run_pipeline, MemorySink, OnHandInventory, ReferenceOracle, RunConfig, RunId};

fn main() -> Result<()> {
    // Three products: steady, growing with promotions, and too sparse to forecast
    let profiles = vec![
        SyntheticProfile {
            weekly_amplitude: 6.0,
            noise_std: 2.0,
            ..SyntheticProfile::new("steady", 40.0)
        },
        SyntheticProfile {
            daily_growth: 0.05,
            weekly_amplitude: 10.0,
            noise_std: 4.0,
            promo_rate: 0.15,
            promo_lift: 1.6,
            ..SyntheticProfile::new("growing", 60.0)
        },
        SyntheticProfile::new("sparse", 0.2),
    ];

    let start = NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid date");
    let history = synthetic_history(&profiles, start, 900, 7)?;
    let inventory: OnHandInventory = vec![("steady", 300.0), ("growing", 100.0)]
        .into_iter()
        .collect();

    let config = RunConfig::default();
    let oracle = ReferenceOracle::from_kind(config.oracle);
    let mut sink = MemorySink::new();

    let report = run_pipeline(
        &history,
        &inventory,
        &oracle,
        &config,
        &mut sink,
        RunId::new("example")?,
    )?;

    println!("{}", report.summary);
    for rec in &report.recommendations {
        println!(
            "{:<10} purchase {:>8.1}  reorder point {:>8.1}  confidence {}",
            rec.series_key, rec.purchase_quantity, rec.reorder_point, rec.confidence_tier
        );
    }

    Ok(())
}
