use chrono::{Days, NaiveDate};
use vitalrs::{
    assess_day, baselines, bio_pillars, compute_ratios, correlation_matrix, deficit_streak,
    fa_score, fa_score_label, pearson, ratio_status, rolling_baseline, weekly_summaries,
};

/// Integration tests covering complete analytics workflows

#[cfg(test)]
mod integration_tests {
    use super::*;
    use vitalrs::config::{AppConfig, RatioThresholds};
    use vitalrs::history::{mineral_window, HistoryRepository, InMemoryHistory, MineralSnapshot};
    use vitalrs::models::{Activity, ActivityType, DailyRecord, DayType, NutrientLogEntry, Nutrients};
    use vitalrs::nutrition::NutritionLog;
    use vitalrs::pillars::PillarState;
    use vitalrs::ratios::{DeficitStreak, Mineral, RatioStatus};
    use vitalrs::score::{FaScoreBand, FaScoreInputs};
    use vitalrs::{BaselineMetric, DigestiveLevel, StableBand, TimeToSleep, WeeklyMetric};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, 24).unwrap()
    }

    /// Four weeks of records where load rises and heart metrics worsen week by week
    fn create_training_block() -> Vec<DailyRecord> {
        (0..28u64)
            .map(|back| {
                let weeks_back = (back / 7) as f64;
                let mut record = DailyRecord::new(today() - Days::new(back));
                record.daily_tss = 40.0 + 10.0 * weeks_back;
                record.atl = Some(30.0 + 5.0 * weeks_back);
                record.ctl = Some(50.0);
                record.resting_hr = Some(48.0 + weeks_back);
                record.hrv = Some(60.0 - 2.0 * weeks_back);
                record
            })
            .collect()
    }

    fn approx(actual: Option<f64>, expected: f64) -> bool {
        actual.is_some_and(|v| (v - expected).abs() < 1e-9)
    }

    #[test]
    fn test_ratio_examples() {
        let ratios = compute_ratios(0.0, 3500.0, 900.0, 700.0);
        assert_eq!(ratios.na_k, None);
        assert!(approx(ratios.ca_mg, 900.0 / 700.0));

        let thresholds = RatioThresholds {
            ideal: 1.0,
            high: 1.3,
        };
        assert_eq!(ratio_status(Some(0.95), &thresholds), RatioStatus::Excellent);
        assert_eq!(ratio_status(Some(1.0), &thresholds), RatioStatus::Attention);
        assert_eq!(ratio_status(Some(1.4), &thresholds), RatioStatus::High);
        assert_eq!(ratio_status(ratios.na_k, &thresholds), RatioStatus::Unknown);
    }

    #[test]
    fn test_score_examples() {
        let clean = FaScoreInputs {
            na: 2500.0,
            k: 4000.0,
            ca: 900.0,
            mg: 700.0,
            taurine_g: 1.0,
            digestive_load: 50.0,
            tss: 30.0,
        };
        assert_eq!(fa_score(&clean), 100);

        let stressed = FaScoreInputs {
            na: 1000.0,
            k: 2000.0,
            ca: 1500.0,
            mg: 300.0,
            taurine_g: 4.0,
            digestive_load: 200.0,
            tss: 150.0,
        };
        let score = fa_score(&stressed);
        assert_eq!(score, 30);
        assert_eq!(fa_score_label(score).band, FaScoreBand::Atencion);
    }

    #[test]
    fn test_pearson_examples() {
        let series = |v: &[f64]| v.iter().copied().map(Some).collect::<Vec<_>>();

        assert!(approx(pearson(&series(&[1.0, 2.0, 3.0, 4.0]), &series(&[1.0, 2.0, 3.0, 4.0])), 1.0));
        assert!(approx(pearson(&series(&[1.0, 2.0, 3.0, 4.0]), &series(&[4.0, 3.0, 2.0, 1.0])), -1.0));
        assert_eq!(pearson(&series(&[5.0, 5.0, 5.0, 5.0]), &series(&[1.0, 2.0, 3.0, 4.0])), Some(0.0));
    }

    /// Weekly aggregation feeding baselines and the correlation matrix
    #[test]
    fn test_weekly_correlation_pipeline() {
        let records = create_training_block();
        let weeks = weekly_summaries(&records, 4, today());

        assert_eq!(weeks.len(), 4);
        assert!(weeks.windows(2).all(|w| w[0].week_end < w[1].week_end));
        // Oldest week carries the highest load
        assert_eq!(weeks[0].total_tss, 7.0 * 70.0);
        assert_eq!(weeks[3].total_tss, 7.0 * 40.0);
        assert_eq!(weeks[3].hrv, Some(60.0));

        let result = baselines(&weeks);
        let recovery = result.recovery.unwrap();
        assert_eq!(recovery.weeks, 2);
        assert!(approx(recovery.resting_hr, 48.5));
        assert!(approx(recovery.hrv, 59.0));
        assert!(approx(result.chronic.unwrap().resting_hr, 49.5));
        assert_eq!(result.historic.unwrap().weeks, 4);

        let matrix = correlation_matrix(&weeks);
        assert!(approx(matrix.get(WeeklyMetric::Tss, WeeklyMetric::Atl), 1.0));
        assert!(approx(matrix.get(WeeklyMetric::Rhr, WeeklyMetric::Hrv), -1.0));
        assert!(approx(matrix.get(WeeklyMetric::Tss, WeeklyMetric::Hrv), -1.0));
        assert_eq!(matrix.get(WeeklyMetric::Ctl, WeeklyMetric::Tss), Some(0.0));
        assert_eq!(matrix.get(WeeklyMetric::Sleep, WeeklyMetric::Hrv), None);
        assert_eq!(matrix.get(WeeklyMetric::Sleep, WeeklyMetric::Sleep), None);

        let strongest = matrix.strongest_pairs(0.99);
        assert!(strongest.iter().all(|p| p.r.abs() >= 0.99));
        assert!(strongest.iter().all(|p| p.first != WeeklyMetric::Ctl && p.second != WeeklyMetric::Ctl));
    }

    #[test]
    fn test_two_weeks_of_records_yield_two_summaries() {
        let records: Vec<_> = create_training_block().into_iter().take(14).collect();
        let weeks = weekly_summaries(&records, 4, today());
        assert_eq!(weeks.len(), 2);
        assert!(weeks[0].week_end < weeks[1].week_end);
    }

    #[test]
    fn test_rolling_baseline_with_band_from_history() {
        let mut records = create_training_block();
        let samples: Vec<f64> = records.iter().filter_map(|r| r.hrv).collect();
        let band = StableBand::from_samples(&samples, 1.0).unwrap();

        // The last week sits above the four-week band
        let latest = rolling_baseline(&records, BaselineMetric::Hrv, Some(band));
        assert_eq!(latest.current, Some(60.0));
        assert!(approx(latest.moving_average, 60.0));
        assert_eq!(latest.samples, 7);
        assert_eq!(latest.is_outside, Some(true));

        records[0].hrv = Some(30.0);
        let dropped = rolling_baseline(&records, BaselineMetric::Hrv, Some(band));
        assert_eq!(dropped.current, Some(30.0));
        assert_eq!(dropped.is_outside, Some(true));
        assert!(dropped.current.unwrap() < band.lower);
    }

    #[test]
    fn test_potassium_deficit_from_repository() {
        let mut repo = InMemoryHistory::new(7).unwrap();
        for back in 1..=2u64 {
            repo.put(
                today() - Days::new(back),
                MineralSnapshot {
                    na: 2500.0,
                    k: 3000.0,
                    mg: 450.0,
                },
            )
            .unwrap();
        }

        let window = mineral_window(&repo, today());
        let streak = deficit_streak(Mineral::K, 3300.0, today(), 2800.0, &window);
        assert_eq!(streak, DeficitStreak { deficit: true, days: 3 });

        let na = deficit_streak(Mineral::Na, 1500.0, today(), 1200.0, &window);
        assert_eq!(na, DeficitStreak::NONE);
    }

    /// Logging a day's food, then assessing it against the stored mineral history
    #[test]
    fn test_daily_assessment_workflow() {
        let config = AppConfig::default();
        let at = |hour: u32| today().and_hms_opt(hour, 0, 0).unwrap();

        let mut log = NutritionLog::new();
        log.add(NutrientLogEntry::new(
            "avena",
            1.0,
            Nutrients {
                calories: 600.0,
                carbs: 90.0,
                fiber: 10.0,
                fat: 10.0,
                na: 600.0,
                k: 1500.0,
                ca: 400.0,
                mg: 250.0,
                ..Nutrients::default()
            },
            at(8),
        ));
        let dinner = NutrientLogEntry::new(
            "hamburguesa",
            1.0,
            Nutrients {
                calories: 1200.0,
                fat: 70.0,
                fiber: 15.0,
                na: 1800.0,
                k: 900.0,
                ca: 300.0,
                mg: 80.0,
                ..Nutrients::default()
            },
            at(22),
        );
        log.add(dinner.clone());

        let mut record = DailyRecord::new(today());
        record.daily_tss = 90.0;
        record.apply_log(log.entries());
        assert_eq!(record.nutrition, log.totals_for(today()));

        let mut repo = InMemoryHistory::new(config.history.retention).unwrap();
        for back in 1..=2u64 {
            repo.put(
                today() - Days::new(back),
                MineralSnapshot {
                    na: 2400.0,
                    k: 2500.0,
                    mg: 300.0,
                },
            )
            .unwrap();
        }
        let window = mineral_window(&repo, today());

        let assessment = assess_day(
            &record,
            log.entries(),
            TimeToSleep::UnderOneHour,
            &window,
            &config,
            DayType::Training,
        );

        // (70 - 20) * 1.2 + 15 * 0.8 = 72, times 1.6
        assert!((assessment.digestion.load - 115.2).abs() < 1e-9);
        assert_eq!(assessment.digestion.level, DigestiveLevel::Low);
        assert!(!assessment.heavy_dinner);
        assert_eq!(assessment.deficits.k, DeficitStreak { deficit: true, days: 3 });
        assert_eq!(assessment.deficits.mg, DeficitStreak { deficit: true, days: 3 });
        assert!(!assessment.deficits.na.deficit);
        // Magnesium -15, potassium -10, digestion -3, TSS -2
        assert_eq!(assessment.score.score, 70);
        assert_eq!(assessment.label.band, FaScoreBand::Estable);

        // Swapping the dinner for a lighter one replaces the whole entry
        let mut lighter = dinner.clone();
        lighter.per_unit.fat = 20.0;
        lighter.per_unit.fiber = 5.0;
        assert!(log.replace(lighter).is_some());
        assert_eq!(log.night_entries(today())[0].per_unit.fat, 20.0);

        repo.put(today(), assessment.mineral_snapshot()).unwrap();
        assert_eq!(repo.get(today()..=today()).len(), 1);
    }

    #[test]
    fn test_regulation_pillar_scenario() {
        let build = |is_virtual: bool| -> Vec<DailyRecord> {
            (0..7u64)
                .map(|back| {
                    let mut record = DailyRecord::new(today() - Days::new(back));
                    if back == 3 {
                        record.activities.push(Activity {
                            activity_type: ActivityType::Ride,
                            moving_time_seconds: 130 * 60,
                            is_stationary: false,
                            is_virtual,
                        });
                    }
                    record
                })
                .collect()
        };

        assert_eq!(bio_pillars(&build(false), today()).regulation, PillarState::Green);
        assert_eq!(bio_pillars(&build(true), today()).regulation, PillarState::Amber);
    }
}
