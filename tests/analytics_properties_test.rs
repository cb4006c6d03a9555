/// End-to-end properties of the sales analytics pipeline:
/// CSV ingestion, record loading, aggregation, growth, forecasting and risk.

// ---------------------------------------------------------------------------
// Shared fixtures
// ---------------------------------------------------------------------------

#[cfg(test)]
mod fixtures {
    use sales_analytics::services::csv_import_service;
    use sales_analytics::RecordSet;

    pub const SAMPLE_CSV: &str = "\
ORDERNUMBER,QUANTITYORDERED,PRICEEACH,SALES,ORDERDATE,STATUS,PRODUCTLINE,MSRP,PRODUCTCODE,CUSTOMERNAME,COUNTRY,DEALSIZE
10107,30,95.70,2871.00,24/02/2018,Shipped,Motorcycles,95,S10_1678,Land of Toys Inc.,USA,Small
10107,39,99.91,3896.49,24/02/2018,Shipped,Classic Cars,214,S10_1949,Land of Toys Inc.,USA,Medium
10121,34,81.35,2765.90,07/05/2018,Shipped,Motorcycles,95,S10_1678,Reims Collectables,France,Small
10134,41,94.74,3884.34,01/07/2018,Shipped,Motorcycles,95,S10_1678,Lyon Souveniers,France,Medium
10145,45,83.26,3746.70,25/08/2018,Shipped,Motorcycles,95,S10_1678,Toys4GrownUps.com,USA,Medium
10159,49,100.00,5205.27,10/10/2018,Shipped,Classic Cars,214,S10_1949,Corporate Gift Ideas Co.,USA,Medium
10168,36,96.66,3479.76,28/10/2018,Shipped,Motorcycles,95,S10_1678,Technics Stores Inc.,USA,Medium
10180,29,86.13,2497.77,11/11/2018,Shipped,Classic Cars,214,S10_1949,Daedalus Designs Imports,France,Small
10188,48,100.00,5512.32,18/11/2018,Shipped,Motorcycles,95,S10_1678,Land of Toys Inc.,USA,Medium
10201,22,98.57,2168.54,01/12/2018,Shipped,Motorcycles,95,S10_1678,Mini Wheels Co.,USA,Small
10211,41,100.00,4708.44,15/01/2019,In Process,Classic Cars,214,S10_1949,Auto Canal Petit,France,Medium
10223,37,100.00,3965.66,20/02/2019,Shipped,Motorcycles,95,S10_1678,Australian Collectors Co.,Australia,Medium
bad-row,10,10.00,100.00,not a date,Shipped,Motorcycles,95,S10_1678,Nobody,USA,Small
";

    pub fn sample() -> RecordSet {
        let rows = csv_import_service::read_csv(SAMPLE_CSV.as_bytes()).unwrap();
        RecordSet::load(rows).unwrap()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[cfg(test)]
mod loading {
    use super::fixtures::sample;

    #[test]
    fn test_csv_rows_load_and_bad_rows_are_reported() {
        let records = sample();
        assert_eq!(records.row_count(), 12);
        assert_eq!(records.dropped_row_count(), 1);
        assert_eq!(records.dropped_rows()[0].row, 12);
    }

    #[test]
    fn test_profit_is_derived_from_msrp() {
        let records = sample();
        let first = records.rows().next().unwrap();
        // (95 - 95.70) * 30
        assert_eq!(first.estimated_profit.as_ref().unwrap().to_string(), "-21.00");
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[cfg(test)]
mod aggregation {
    use super::fixtures::sample;
    use bigdecimal::BigDecimal;
    use sales_analytics::models::{Dimension, Granularity};
    use sales_analytics::services::aggregation_service::aggregate;
    use sales_analytics::services::indicators::sum_decimals;

    #[test]
    fn test_global_total_equals_row_sum_exactly() {
        let records = sample();
        let row_total = sum_decimals(records.rows().map(|r| &r.sales));
        let aggregates = aggregate(&records, None, Granularity::Month);
        let aggregate_total = sum_decimals(aggregates.iter().map(|a| &a.total_sales));
        assert_eq!(row_total, aggregate_total);
    }

    #[test]
    fn test_dimension_totals_partition_global_total() {
        let records = sample();
        let global = sum_decimals(aggregate(&records, None, Granularity::Month).iter().map(|a| &a.total_sales));
        for dimension in [Dimension::ProductLine, Dimension::Country, Dimension::Customer] {
            let by_dim = aggregate(&records, Some(dimension), Granularity::Month);
            let total: BigDecimal = sum_decimals(by_dim.iter().map(|a| &a.total_sales));
            assert_eq!(total, global, "{}", dimension);
        }
    }

    #[test]
    fn test_order_count_never_exceeds_row_count() {
        let records = sample();
        for a in aggregate(&records, Some(Dimension::Country), Granularity::Month) {
            assert!(a.order_count <= a.row_count);
        }

        let feb = aggregate(&records, None, Granularity::Month)
            .into_iter()
            .find(|a| a.period.to_string() == "2018-02")
            .unwrap();
        // order 10107 has two line items
        assert_eq!(feb.row_count, 2);
        assert_eq!(feb.order_count, 1);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let records = sample();
        let first = aggregate(&records, Some(Dimension::ProductLine), Granularity::Month);
        let second = aggregate(&records, Some(Dimension::ProductLine), Granularity::Month);
        assert_eq!(first, second);
    }
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

#[cfg(test)]
mod growth {
    use bigdecimal::BigDecimal;
    use sales_analytics::models::{Growth, Period};
    use sales_analytics::services::growth_service::compute_growth;

    #[test]
    fn test_growth_with_zero_baseline() {
        let mut period = Period::new(2018, 1).unwrap();
        let series: Vec<(Period, BigDecimal)> = [100, 150, 150, 0, 50]
            .iter()
            .map(|v| {
                let entry = (period, BigDecimal::from(*v));
                period = period.next();
                entry
            })
            .collect();

        let changes: Vec<Option<f64>> = compute_growth(&series)
            .changes()
            .map(|g| match g {
                Growth::Change(c) => Some(c.to_string().parse::<f64>().unwrap()),
                Growth::Undefined => None,
            })
            .collect();

        assert_eq!(changes, vec![None, Some(0.5), Some(0.0), Some(-1.0), None]);
    }
}

// ---------------------------------------------------------------------------
// Forecasting
// ---------------------------------------------------------------------------

#[cfg(test)]
mod forecasting {
    use super::fixtures::sample;
    use bigdecimal::BigDecimal;
    use sales_analytics::models::{ForecastConfig, ForecastMethod, ForecastResult, Period};
    use sales_analytics::services::aggregation_service::monthly_revenue;
    use sales_analytics::services::forecasting_service::forecast;
    use sales_analytics::AnalyticsError;
    use std::str::FromStr;

    fn series(values: &[i64]) -> Vec<(Period, BigDecimal)> {
        let mut period = Period::new(2018, 10).unwrap();
        values
            .iter()
            .map(|v| {
                let entry = (period, BigDecimal::from(*v));
                period = period.next();
                entry
            })
            .collect()
    }

    #[test]
    fn test_naive_average_targets_next_period() {
        let result = forecast(&series(&[100, 200, 300]), ForecastMethod::NaiveAverage, &ForecastConfig::default()).unwrap();
        assert_eq!(result.point_estimate, BigDecimal::from(200));
        assert_eq!(result.target_period.to_string(), "2019-01");
    }

    #[test]
    fn test_linear_trend_on_one_period() {
        let err = forecast(&series(&[100]), ForecastMethod::LinearTrend, &ForecastConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData { .. }));
    }

    #[test]
    fn test_json_round_trip_is_exact() {
        let result = ForecastResult {
            target_period: Period::new(2019, 3).unwrap(),
            point_estimate: BigDecimal::from_str("3965.66").unwrap(),
            method: ForecastMethod::Arima,
            confidence_note: None,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"2019-03\""));
        assert!(json.contains("\"arima\""));

        let back: ForecastResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, result.method);
        assert_eq!(back.target_period, result.target_period);
        assert_eq!(back.point_estimate, result.point_estimate);
    }

    #[test]
    fn test_lstm_same_seed_is_bit_identical() {
        let revenue = monthly_revenue(&sample());
        let config = ForecastConfig::with_seed(11);
        let first = forecast(&revenue, ForecastMethod::Lstm, &config).unwrap();
        let second = forecast(&revenue, ForecastMethod::Lstm, &config).unwrap();
        assert_eq!(first.point_estimate, second.point_estimate);
        assert_eq!(first.confidence_note, second.confidence_note);
    }

    #[test]
    fn test_every_method_forecasts_the_sample() {
        let revenue = monthly_revenue(&sample());
        for method in ForecastMethod::ALL {
            let result = forecast(&revenue, method, &ForecastConfig::default()).unwrap();
            assert_eq!(result.target_period.to_string(), "2019-03", "{}", method);
        }
    }
}

// ---------------------------------------------------------------------------
// Risk
// ---------------------------------------------------------------------------

#[cfg(test)]
mod risk {
    use bigdecimal::BigDecimal;
    use chrono::{Duration, NaiveDate};
    use sales_analytics::models::{EntityType, OrderStatus, RecencyWindow, SalesRecord};
    use sales_analytics::services::risk_service::classify;
    use sales_analytics::RecordSet;

    fn record(customer: &str, date: NaiveDate) -> SalesRecord {
        SalesRecord {
            order_id: customer.to_string(),
            order_date: date,
            product_line: "Trains".to_string(),
            product_code: None,
            customer_name: customer.to_string(),
            country: "Japan".to_string(),
            status: OrderStatus::Shipped,
            quantity_ordered: None,
            price_each: None,
            msrp: None,
            sales: BigDecimal::from(1),
            deal_size: None,
            estimated_profit: None,
        }
    }

    #[test]
    fn test_ninety_day_boundary() {
        let max = NaiveDate::from_ymd_opt(2019, 5, 31).unwrap();
        let records = RecordSet::from_records(vec![
            record("today", max),
            record("ninety", max - Duration::days(90)),
            record("ninety-one", max - Duration::days(91)),
        ]);
        let entities = vec!["ninety".to_string(), "ninety-one".to_string()];

        let flags = classify(&records, &entities, EntityType::Customer, RecencyWindow::Days(90));

        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].entity_id, "ninety-one");
    }
}

// ---------------------------------------------------------------------------
// Full pass
// ---------------------------------------------------------------------------

#[cfg(test)]
mod full_pass {
    use super::fixtures::sample;
    use sales_analytics::{run_analysis, AnalysisConfig};

    #[test]
    fn test_report_serializes_with_section_markers() {
        let mut config = AnalysisConfig::default();
        config.lstm.epochs = 25;
        let report = run_analysis(&sample(), &config);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["recent_growth"]["status"], "ok");
        assert_eq!(json["forecasts"].as_array().unwrap().len(), 5);
        assert_eq!(json["diagnostics"]["dropped_row_count"], 1);
        assert_eq!(json["overall_totals"]["order_count"], 11);
        assert_eq!(json["overall_totals"]["deal_size_counts"]["medium"], 8);
        assert_eq!(json["overall_totals"]["deal_size_counts"]["small"], 4);
        assert!(json["forecasts"][0]["description"].is_string());
        assert!(json["growth"]["points"][0]["change"].is_null());
    }
}
