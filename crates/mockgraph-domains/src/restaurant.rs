//! Restaurant expansion: candidate cities, past openings, market data and
//! the performance of existing locations.

use mockgraph_generate::{
    Domain, FieldPlan, FieldRef, IdPattern, LinkPolicy, Policy, PolicyTable, Result, Rounding,
    Source, TableSpec, Value,
};

use crate::support::{catch_phrase, city_name, iso_date, state_abbr};

pub const NAME: &str = "restaurant";

pub const OUTCOMES: &[&str] = &[
    "highly_successful",
    "successful",
    "moderate",
    "challenging",
    "unsuccessful",
];

const REGIONS: &[&str] = &["Northeast", "Southeast", "Midwest", "Southwest", "West Coast"];
const DENSITIES: &[&str] = &["low", "medium", "high", "very_high"];
const INDUSTRIES: &[&str] = &[
    "technology",
    "healthcare",
    "education",
    "finance",
    "tourism",
    "manufacturing",
    "energy",
    "aerospace",
    "biotech",
    "retail",
    "logistics",
    "agriculture",
    "entertainment",
    "real_estate",
    "consulting",
];
const SUCCESS_FACTORS: &[&str] = &[
    "growing tech sector",
    "favorable demographics",
    "limited direct competition",
    "strong local supplier network",
    "high foot traffic area",
    "excellent visibility",
    "supportive local government",
    "growing population",
    "strong tourism",
    "diverse cuisine scene",
    "high median income",
    "low unemployment",
    "established food culture",
    "strong nightlife",
    "business district location",
];
const CHALLENGES: &[&str] = &[
    "higher than expected rent increases",
    "initial staffing difficulties",
    "permitting delays",
    "supply chain issues",
    "parking challenges",
    "higher competition than expected",
    "slower customer adoption",
    "seasonal fluctuations",
    "local regulations",
    "construction delays",
];
const RENT_TRENDS: &[&str] = &["increasing", "stable", "decreasing", "volatile"];

/// Past expansions only draw from the first cities of the catalog.
const HISTORY_CITY_POOL: usize = 30;

pub fn domain() -> Result<Domain> {
    Ok(Domain::new(NAME, "restaurant expansion site selection")
        .with_table(cities()?)
        .with_table(historical_expansions()?)
        .with_table(market_data())
        .with_table(existing_locations()?))
}

fn cities() -> Result<TableSpec> {
    let plan = FieldPlan::new()
        .id("city_id", IdPattern::parse("{upper:3}")?)
        .derive("city", city_name)
        .hidden()
        .derive("state_code", state_abbr)
        .hidden()
        .derive("name", |draft, _| {
            Ok(Value::Text(format!(
                "{}, {}",
                draft.text("city")?,
                draft.text("state_code")?
            )))
        })
        .copy("state", FieldRef::own("state_code"))
        .draw("population", Policy::int(200_000, 3_000_000))
        .draw("median_income", Policy::int(45_000, 95_000))
        .draw("median_age", Policy::int(28, 42))
        .draw("growth_rate", Policy::real(-0.02, 0.05, 3))
        .draw("existing_locations", Policy::int(0, 5))
        .draw("region", Policy::one_of(REGIONS.iter().copied()))
        .derive("metro_area", |draft, _| {
            Ok(Value::Text(format!("{} Metro Area", draft.text("city")?)))
        })
        .draw("avg_rent_psf", Policy::int(25, 75))
        .draw("restaurant_density", Policy::one_of(DENSITIES.iter().copied()))
        .draw("major_industries", Policy::exactly(INDUSTRIES.iter().copied(), 3))
        .draw("unemployment_rate", Policy::real(0.025, 0.08, 3));
    Ok(TableSpec::new("cities", 50, plan))
}

fn historical_expansions() -> Result<TableSpec> {
    let cost_multiplier = PolicyTable::new("opening_cost")
        .with("highly_successful", Policy::fixed(0.8))
        .with("successful", Policy::fixed(1.0))
        .with_all(&["moderate", "challenging", "unsuccessful"], Policy::fixed(1.3));

    let plan = FieldPlan::new()
        .draw("year", Policy::int(2015, 2024))
        .hidden()
        .draw("result", Policy::one_of(OUTCOMES.iter().copied()))
        .hidden()
        .id("expansion_id", IdPattern::parse("EXP-{field:year}-{upper:3}")?)
        .copy("city_id", FieldRef::parent("city_id"))
        .copy("city_name", FieldRef::parent("name"))
        .derive("opening_date", |draft, sampler| {
            let month = sampler.integer(1, 12)?;
            Ok(Value::Text(iso_date(draft.int("year")?, month, 15)?))
        })
        .scaled(
            "opening_cost",
            Policy::int(350_000, 650_000),
            Source::Conditional {
                driver: FieldRef::own("result"),
                table: cost_multiplier,
            },
            Rounding::Integer,
        )
        .draw("location_size_sqft", Policy::int(2_500, 5_000))
        .draw("time_to_profitability_months", Policy::int(4, 18))
        .scaled(
            "year_1_revenue",
            Source::own("opening_cost"),
            Policy::real(2.5, 5.0, 2),
            Rounding::Integer,
        )
        .scaled(
            "year_2_revenue",
            Source::own("year_1_revenue"),
            Policy::real(1.1, 1.3, 2),
            Rounding::Integer,
        )
        .scaled(
            "year_3_revenue",
            Source::own("year_1_revenue"),
            Policy::real(1.2, 1.5, 2),
            Rounding::Integer,
        )
        .scaled(
            "peak_revenue",
            Source::own("year_1_revenue"),
            Policy::real(1.3, 1.8, 2),
            Rounding::Integer,
        )
        .draw("staff_count", Policy::int(18, 35))
        .draw("avg_customer_rating", Policy::real(3.5, 4.9, 1))
        .draw(
            "success_factors",
            Policy::subset(SUCCESS_FACTORS.iter().copied(), 2, 5),
        )
        .draw("challenges", Policy::subset(CHALLENGES.iter().copied(), 1, 3))
        .copy("outcome", FieldRef::own("result"))
        .draw("roi_3year", Policy::real(-0.1, 0.35, 2))
        .derive("notes", catch_phrase);

    Ok(TableSpec::new("historical_expansions", 200, plan)
        .child_of("cities", LinkPolicy::random_within(HISTORY_CITY_POOL)))
}

fn market_data() -> TableSpec {
    let plan = FieldPlan::new()
        .copy("city_id", FieldRef::parent("city_id"))
        .draw("year", Policy::fixed(2025_i64))
        .draw("restaurant_count", Policy::int(500, 5_000))
        .draw("cuisine_diversity_score", Policy::real(5.0, 9.5, 1))
        .draw("avg_meal_price", Policy::int(15, 45))
        .draw("food_delivery_penetration", Policy::real(0.35, 0.75, 2))
        .draw("competition_score", Policy::real(3.0, 9.0, 1))
        .draw("food_scene_rating", Policy::real(5.0, 9.5, 1))
        .draw("tourism_annual_visitors", Policy::int(1_000_000, 40_000_000))
        .draw(
            "local_supplier_density",
            Policy::one_of(["low", "medium", "high"]),
        )
        .draw("commercial_rent_trend", Policy::one_of(RENT_TRENDS.iter().copied()))
        .draw("construction_costs_psf", Policy::int(150, 300));

    TableSpec::new("market_data", 0, plan).per_parent("cities")
}

fn existing_locations() -> Result<TableSpec> {
    let plan = FieldPlan::new()
        .copy("city_code", FieldRef::parent("city_id"))
        .hidden()
        .id(
            "location_id",
            IdPattern::parse("LOC-{field:city_code}-{seq:3}")?,
        )
        .copy("city_id", FieldRef::parent("city_id"))
        .draw("opening_year", Policy::int(2015, 2023))
        .draw("base_revenue", Policy::int(1_500_000, 3_000_000))
        .hidden()
        .scaled(
            "annual_revenue_2024",
            Source::own("base_revenue"),
            Policy::fixed(1.2),
            Rounding::Integer,
        )
        .scaled(
            "annual_revenue_2023",
            Source::own("base_revenue"),
            Policy::fixed(1.1),
            Rounding::Integer,
        )
        .copy("annual_revenue_2022", FieldRef::own("base_revenue"))
        .draw("profit_margin", Policy::real(0.08, 0.22, 2))
        .draw("customer_rating", Policy::real(3.8, 4.9, 1))
        .draw("repeat_customer_rate", Policy::real(0.40, 0.70, 2))
        .draw("avg_wait_time_minutes", Policy::int(10, 45))
        .draw("staff_retention_rate", Policy::real(0.55, 0.85, 2))
        .draw("food_cost_percentage", Policy::real(0.28, 0.38, 2))
        .draw("labor_cost_percentage", Policy::real(0.25, 0.35, 2));

    Ok(TableSpec::new("existing_locations", 100, plan).child_of("cities", LinkPolicy::Cycle))
}
